//! The pilot registry: the observable list behind the live view.

use serde_json::Value;
use thiserror::Error;

use crate::models::{Pilot, SchemaVersion};
use crate::schema::{self, SchemaError};
use crate::store::{Subscription, Writable};

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("pilot record {index} rejected: {source}")]
    Rejected {
        index: usize,
        #[source]
        source: SchemaError,
    },
}

impl RegistryError {
    pub fn schema_error(&self) -> &SchemaError {
        match self {
            RegistryError::Rejected { source, .. } => source,
        }
    }
}

/// Ordered list of pilots plus the shape its boundary admits.
///
/// Typed writes (`set`, `update`, `upsert`) take records as given, so
/// duplicates and mixed versions pass through. Raw JSON goes through the
/// `*_json` methods, which check every record against `schema()` first.
/// Clones share the same list; construct one per session and pass it on.
#[derive(Clone)]
pub struct PilotRegistry {
    store: Writable<Vec<Pilot>>,
    schema: SchemaVersion,
}

impl PilotRegistry {
    pub fn new(schema: SchemaVersion) -> Self {
        Self {
            store: Writable::new(Vec::new()),
            schema,
        }
    }

    pub fn schema(&self) -> SchemaVersion {
        self.schema
    }

    pub fn get(&self) -> Vec<Pilot> {
        self.store.get()
    }

    pub fn len(&self) -> usize {
        self.store.get().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn set(&self, pilots: Vec<Pilot>) {
        tracing::debug!(count = pilots.len(), "pilot list replaced");
        self.store.set(pilots);
    }

    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&Vec<Pilot>) -> Vec<Pilot>,
    {
        self.store.update(f);
    }

    /// Replace the first pilot with the same name, or append.
    pub fn upsert(&self, pilot: Pilot) {
        tracing::debug!(pilot = pilot.name(), "pilot upserted");
        self.store.update(move |current| {
            let mut next = current.clone();
            match next.iter_mut().find(|p| p.name() == pilot.name()) {
                Some(existing) => *existing = pilot,
                None => next.push(pilot),
            }
            next
        });
    }

    pub fn clear(&self) {
        self.set(Vec::new());
    }

    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&Vec<Pilot>) + Send + Sync + 'static,
    {
        self.store.subscribe(callback)
    }

    pub fn subscriber_count(&self) -> usize {
        self.store.subscriber_count()
    }

    /// Check raw records against this registry's schema without writing.
    pub fn admit_all(&self, records: Vec<Value>) -> Result<Vec<Pilot>, RegistryError> {
        schema::admit_all(records, self.schema)
            .map_err(|(index, source)| RegistryError::Rejected { index, source })
    }

    /// Admit all records, then replace the list. Nothing is written on error.
    pub fn set_json(&self, records: Vec<Value>) -> Result<usize, RegistryError> {
        let pilots = self.admit_all(records).inspect_err(|err| {
            tracing::warn!(schema = %self.schema, error = %err, "pilot list rejected");
        })?;
        let count = pilots.len();
        self.set(pilots);
        Ok(count)
    }

    /// Admit one record, then upsert it.
    pub fn upsert_json(&self, record: Value) -> Result<Pilot, RegistryError> {
        let pilot = schema::admit(record, self.schema)
            .map_err(|source| RegistryError::Rejected { index: 0, source })
            .inspect_err(|err| {
                tracing::warn!(schema = %self.schema, error = %err, "pilot record rejected");
            })?;
        self.upsert(pilot.clone());
        Ok(pilot)
    }
}

impl Default for PilotRegistry {
    fn default() -> Self {
        Self::new(SchemaVersion::default())
    }
}

impl std::fmt::Debug for PilotRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PilotRegistry")
            .field("schema", &self.schema)
            .field("pilots", &self.len())
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PilotV1, PilotV2};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    fn v2(name: &str, altitude: f64) -> Pilot {
        Pilot::V2(PilotV2 {
            color: "#123456".into(),
            name: name.into(),
            altitude,
            track: format!("trk-{name}"),
            last: "10:00".into(),
        })
    }

    fn v1(name: &str) -> Pilot {
        Pilot::V1(PilotV1 {
            color: "red".into(),
            name: name.into(),
            altitude: 1000.0,
            cum_dist: 3.0,
            take_off_dist: 1.0,
            flight_time: "10m0s".into(),
            last: "10:00".into(),
        })
    }

    fn watch(registry: &PilotRegistry) -> (Arc<Mutex<Vec<Vec<Pilot>>>>, Subscription) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let sub = registry.subscribe(move |pilots| sink.lock().unwrap().push(pilots.clone()));
        (seen, sub)
    }

    #[test]
    fn fresh_registry_is_empty() {
        let registry = PilotRegistry::new(SchemaVersion::V2);
        assert!(registry.is_empty());
        let (seen, _sub) = watch(&registry);
        assert_eq!(*seen.lock().unwrap(), vec![Vec::<Pilot>::new()]);
    }

    #[test]
    fn late_subscriber_sees_last_set() {
        let registry = PilotRegistry::new(SchemaVersion::V2);
        let list = vec![v2("ana", 1200.0), v2("bob", 800.0)];
        registry.set(list.clone());

        let (seen, _sub) = watch(&registry);
        assert_eq!(*seen.lock().unwrap(), vec![list]);
    }

    #[test]
    fn update_applies_function_to_previous_value() {
        let registry = PilotRegistry::new(SchemaVersion::V2);
        registry.set(vec![v2("ana", 1200.0)]);
        let calls = AtomicUsize::new(0);

        let previous = registry.get();
        let raise = |pilots: &Vec<Pilot>| -> Vec<Pilot> {
            pilots
                .iter()
                .map(|p| v2(p.name(), p.altitude() + 100.0))
                .collect()
        };
        let expected = raise(&previous);

        registry.update(|current| {
            calls.fetch_add(1, Ordering::SeqCst);
            raise(current)
        });

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(registry.get(), expected);
    }

    #[test]
    fn fan_out_is_once_per_subscriber_in_order() {
        let registry = PilotRegistry::new(SchemaVersion::V2);
        let log = Arc::new(Mutex::new(Vec::new()));

        let a = Arc::clone(&log);
        let _sub_a = registry.subscribe(move |p| a.lock().unwrap().push(("a", p.len())));
        let b = Arc::clone(&log);
        let _sub_b = registry.subscribe(move |p| b.lock().unwrap().push(("b", p.len())));
        log.lock().unwrap().clear();

        registry.set(vec![v2("ana", 1.0), v2("bob", 2.0), v2("cid", 3.0)]);
        assert_eq!(*log.lock().unwrap(), vec![("a", 3), ("b", 3)]);
    }

    #[test]
    fn double_unsubscribe_leaves_others_alone() {
        let registry = PilotRegistry::new(SchemaVersion::V2);
        let (seen_a, sub_a) = watch(&registry);
        let (seen_b, _sub_b) = watch(&registry);

        sub_a.unsubscribe();
        sub_a.unsubscribe();
        registry.set(vec![v2("ana", 1.0)]);

        assert_eq!(seen_a.lock().unwrap().len(), 1);
        assert_eq!(seen_b.lock().unwrap().len(), 2);
    }

    #[test]
    fn unsubscribe_after_registry_is_dropped() {
        let registry = PilotRegistry::new(SchemaVersion::V1);
        let (_seen, sub) = watch(&registry);
        drop(registry);
        sub.unsubscribe();
        assert!(!sub.is_active());
    }

    #[test]
    fn duplicates_and_mixed_versions_pass_typed_set() {
        let registry = PilotRegistry::new(SchemaVersion::V2);
        registry.set(vec![v2("ana", 1.0), v2("ana", 1.0), v1("bob")]);
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn upsert_replaces_by_name() {
        let registry = PilotRegistry::new(SchemaVersion::V2);
        registry.set(vec![v2("ana", 1.0), v2("bob", 2.0)]);
        registry.upsert(v2("ana", 50.0));
        registry.upsert(v2("cid", 3.0));

        let pilots = registry.get();
        assert_eq!(pilots.len(), 3);
        assert_eq!(pilots[0].altitude(), 50.0);
        assert_eq!(pilots[2].name(), "cid");
    }

    #[test]
    fn v1_json_is_rejected_by_v2_registry() {
        let registry = PilotRegistry::new(SchemaVersion::V2);
        registry.set(vec![v2("keep", 1.0)]);
        let (seen, _sub) = watch(&registry);

        let err = registry
            .set_json(vec![
                json!({"color": "red", "name": "ana", "altitude": 1.0, "track": "t", "last": "x"}),
                json!({"color": "red", "name": "bob", "altitude": 1.0, "cumDist": 2.0,
                       "takeOffDist": 1.0, "flightTime": "1m0s", "last": "x"}),
            ])
            .unwrap_err();

        let RegistryError::Rejected { index, .. } = &err;
        assert_eq!(*index, 1);
        assert!(matches!(
            err.schema_error(),
            SchemaError::ShapeMismatch { expected: SchemaVersion::V2, found: SchemaVersion::V1 }
        ));
        assert_eq!(registry.get()[0].name(), "keep");
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[test]
    fn json_writes_notify_subscribers() {
        let registry = PilotRegistry::new(SchemaVersion::V1);
        let (seen, _sub) = watch(&registry);

        let count = registry
            .set_json(vec![json!({"color": "red", "name": "ana", "altitude": 900,
                                  "cumDist": 2.5, "takeOffDist": 1.5, "flightTime": "3m0s",
                                  "last": "09:00"})])
            .unwrap();
        assert_eq!(count, 1);

        let pilot = registry
            .upsert_json(json!({"color": "red", "name": "ana", "altitude": 1200,
                                "cumDist": 3.5, "takeOffDist": 2.0, "flightTime": "5m0s",
                                "last": "09:02"}))
            .unwrap();
        assert_eq!(pilot.altitude(), 1200.0);

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 3);
        assert_eq!(seen[2].len(), 1);
        assert_eq!(seen[2][0].altitude(), 1200.0);
    }
}
