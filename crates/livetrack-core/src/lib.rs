pub mod models;
pub mod registry;
pub mod schema;
pub mod spatial;
pub mod store;
pub mod track;

pub use models::{livetrack_url, Pilot, PilotV1, PilotV2, Point, SchemaVersion};
pub use registry::{PilotRegistry, RegistryError};
pub use schema::{admit, admit_all, detect, SchemaError};
pub use spatial::distance_km;
pub use store::{Subscription, Writable};
pub use track::{
    compute_statistics, cumulative_distance, flight_time, format_flight_time, take_off_distance,
    TrackPoint,
};
