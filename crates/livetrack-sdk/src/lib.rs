//! Livetrack SDK - talk to a livetrack server.
//!
//! Producers push pilot lists; viewers follow the live stream.

pub mod client;
pub mod stream;

pub use client::LivetrackClient;
pub use livetrack_core::{Pilot, SchemaVersion};
pub use stream::PilotStream;
