// ── Generic reactive record collection ──
//
// Concurrent storage with O(1) lookups, creation-ordered snapshots and
// push-based change notification via `watch` channels.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use tokio::sync::watch;

use super::{Repository, SortOrder};
use crate::error::CoreError;
use crate::model::{EntityId, Record};

struct Slot<T> {
    /// Creation sequence; defines `created_date` ordering.
    seq: u64,
    value: Arc<T>,
}

/// A reactive collection for a single record type.
///
/// Uses `DashMap` for concurrent lookups and `watch` channels for
/// push-based change notification. Every mutation bumps a version
/// counter and rebuilds the oldest-first snapshot that subscribers receive.
pub struct EntityCollection<T: Record> {
    by_id: DashMap<EntityId, Slot<T>>,
    next_seq: AtomicU64,
    /// Maximum number of records kept; the oldest are evicted first.
    retention: Option<usize>,
    version: watch::Sender<u64>,
    snapshot: watch::Sender<Arc<Vec<Arc<T>>>>,
}

impl<T: Record> EntityCollection<T> {
    pub fn new() -> Self {
        let (version, _) = watch::channel(0u64);
        let (snapshot, _) = watch::channel(Arc::new(Vec::new()));

        Self {
            by_id: DashMap::new(),
            next_seq: AtomicU64::new(0),
            retention: None,
            version,
            snapshot,
        }
    }

    /// A collection that evicts its oldest records beyond `limit`.
    pub fn with_retention(limit: usize) -> Self {
        Self {
            retention: Some(limit.max(1)),
            ..Self::new()
        }
    }

    /// Insert or replace a record under its current id. Returns `true` if
    /// the id was new. Replacing keeps the original creation order.
    pub fn upsert(&self, record: T) -> bool {
        let id = record.id().clone();
        let value = Arc::new(record);
        let is_new = match self.by_id.get_mut(&id) {
            Some(mut slot) => {
                slot.value = value;
                false
            }
            None => {
                let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
                self.by_id.insert(id, Slot { seq, value });
                true
            }
        };

        self.evict_overflow();
        self.rebuild_snapshot();
        self.bump_version();
        is_new
    }

    /// Remove a record by id. Returns the removed record if it existed.
    pub fn remove(&self, id: &EntityId) -> Option<Arc<T>> {
        let removed = self.by_id.remove(id).map(|(_, slot)| slot.value);
        if removed.is_some() {
            self.rebuild_snapshot();
            self.bump_version();
        }
        removed
    }

    pub fn get(&self, id: &EntityId) -> Option<Arc<T>> {
        self.by_id.get(id).map(|slot| Arc::clone(&slot.value))
    }

    /// Current snapshot, oldest first (cheap `Arc` clone).
    pub fn snapshot(&self) -> Arc<Vec<Arc<T>>> {
        self.snapshot.borrow().clone()
    }

    /// Subscribe to snapshot changes via a `watch::Receiver`.
    pub fn subscribe(&self) -> watch::Receiver<Arc<Vec<Arc<T>>>> {
        self.snapshot.subscribe()
    }

    /// Remove all records.
    pub fn clear(&self) {
        self.by_id.clear();
        self.rebuild_snapshot();
        self.bump_version();
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    pub fn version(&self) -> u64 {
        *self.version.borrow()
    }

    /// All ids currently stored.
    pub fn ids(&self) -> Vec<EntityId> {
        self.by_id.iter().map(|r| r.key().clone()).collect()
    }

    // ── Private helpers ──────────────────────────────────────────────

    fn evict_overflow(&self) {
        let Some(limit) = self.retention else {
            return;
        };
        let len = self.by_id.len();
        if len <= limit {
            return;
        }
        let mut by_age: Vec<(u64, EntityId)> = self
            .by_id
            .iter()
            .map(|r| (r.value().seq, r.key().clone()))
            .collect();
        by_age.sort_unstable_by_key(|(seq, _)| *seq);
        for (_, id) in by_age.into_iter().take(len - limit) {
            self.by_id.remove(&id);
        }
    }

    /// Collect all values in creation order and broadcast to subscribers.
    ///
    /// Collection happens inside `send_modify` so concurrent rebuilds are
    /// serialized and the last one always reflects every completed insert.
    fn rebuild_snapshot(&self) {
        self.snapshot.send_modify(|snap| {
            let mut entries: Vec<(u64, Arc<T>)> = self
                .by_id
                .iter()
                .map(|r| (r.value().seq, Arc::clone(&r.value().value)))
                .collect();
            entries.sort_unstable_by_key(|(seq, _)| *seq);
            *snap = Arc::new(entries.into_iter().map(|(_, v)| v).collect());
        });
    }

    fn bump_version(&self) {
        self.version.send_modify(|v| *v += 1);
    }
}

impl<T: Record> Default for EntityCollection<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Record> Repository<T> for EntityCollection<T> {
    fn create(&self, mut record: T) -> Result<Arc<T>, CoreError> {
        if record.id().is_unassigned() {
            record.assign_id(EntityId::generate());
        } else if self.by_id.contains_key(record.id()) {
            return Err(CoreError::Persistence {
                entity_type: T::KIND.into(),
                message: format!("duplicate id {}", record.id()),
            });
        }
        let id = record.id().clone();
        self.upsert(record);
        self.get(&id).ok_or_else(|| CoreError::Persistence {
            entity_type: T::KIND.into(),
            message: format!("{id} evicted immediately after insert"),
        })
    }

    fn list(&self, order: SortOrder, limit: Option<usize>) -> Vec<Arc<T>> {
        self.filter(&|_| true, order, limit)
    }

    fn filter(
        &self,
        predicate: &dyn Fn(&T) -> bool,
        order: SortOrder,
        limit: Option<usize>,
    ) -> Vec<Arc<T>> {
        let snap = self.snapshot();
        let limit = limit.unwrap_or(usize::MAX);
        let matching = |r: &&Arc<T>| predicate(r);
        match order {
            SortOrder::OldestFirst => snap.iter().filter(matching).take(limit).cloned().collect(),
            SortOrder::NewestFirst => snap
                .iter()
                .rev()
                .filter(matching)
                .take(limit)
                .cloned()
                .collect(),
        }
    }

    fn update(
        &self,
        id: &EntityId,
        patch: &dyn Fn(&mut T) -> Result<(), CoreError>,
    ) -> Result<Arc<T>, CoreError> {
        let updated = {
            let mut slot = self
                .by_id
                .get_mut(id)
                .ok_or_else(|| CoreError::not_found(T::KIND, id))?;
            let mut next = T::clone(&slot.value);
            patch(&mut next)?;
            next.assign_id(id.clone());
            let next = Arc::new(next);
            slot.value = Arc::clone(&next);
            next
        };
        self.rebuild_snapshot();
        self.bump_version();
        Ok(updated)
    }

    fn get(&self, id: &EntityId) -> Option<Arc<T>> {
        EntityCollection::get(self, id)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;

    use crate::model::TelemetryReading;

    fn reading(site: &str, voltage: f64) -> TelemetryReading {
        TelemetryReading::new(site, Utc::now()).with_metric(crate::model::Metric::VoltageKv, voltage)
    }

    #[test]
    fn create_assigns_an_id() {
        let col: EntityCollection<TelemetryReading> = EntityCollection::new();
        let saved = col.create(reading("S1", 120.0)).unwrap();
        assert!(!saved.id.is_unassigned());
        assert!(col.get(&saved.id).is_some());
    }

    #[test]
    fn create_rejects_duplicate_explicit_id() {
        let col: EntityCollection<TelemetryReading> = EntityCollection::new();
        let mut r = reading("S1", 120.0);
        r.id = EntityId::from("R-1");
        col.create(r.clone()).unwrap();
        assert!(matches!(
            col.create(r),
            Err(CoreError::Persistence { .. })
        ));
    }

    #[test]
    fn list_orders_by_creation() {
        let col: EntityCollection<TelemetryReading> = EntityCollection::new();
        for v in [1.0, 2.0, 3.0] {
            col.create(reading("S1", v)).unwrap();
        }

        let newest: Vec<_> = col
            .list(SortOrder::NewestFirst, Some(2))
            .iter()
            .map(|r| r.voltage_kv.unwrap())
            .collect();
        assert_eq!(newest, vec![3.0, 2.0]);

        let oldest: Vec<_> = col
            .list(SortOrder::OldestFirst, None)
            .iter()
            .map(|r| r.voltage_kv.unwrap())
            .collect();
        assert_eq!(oldest, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn filter_applies_predicate_before_limit() {
        let col: EntityCollection<TelemetryReading> = EntityCollection::new();
        col.create(reading("S1", 1.0)).unwrap();
        col.create(reading("S2", 2.0)).unwrap();
        col.create(reading("S1", 3.0)).unwrap();

        let s1 = col.filter(&|r| r.site_id == "S1", SortOrder::NewestFirst, Some(5));
        assert_eq!(s1.len(), 2);
        assert_eq!(s1[0].voltage_kv, Some(3.0));
    }

    #[test]
    fn update_applies_patch_and_keeps_order() {
        let col: EntityCollection<TelemetryReading> = EntityCollection::new();
        let first = col.create(reading("S1", 1.0)).unwrap();
        col.create(reading("S1", 2.0)).unwrap();

        let updated = col
            .update(&first.id, &|r| {
                r.voltage_kv = Some(10.0);
                Ok(())
            })
            .unwrap();
        assert_eq!(updated.voltage_kv, Some(10.0));
        assert_eq!(col.snapshot()[0].voltage_kv, Some(10.0));
    }

    #[test]
    fn update_unknown_id_is_not_found() {
        let col: EntityCollection<TelemetryReading> = EntityCollection::new();
        let result = col.update(&EntityId::from("missing"), &|_| Ok(()));
        assert!(matches!(result, Err(CoreError::NotFound { .. })));
    }

    #[test]
    fn failed_patch_leaves_record_untouched() {
        let col: EntityCollection<TelemetryReading> = EntityCollection::new();
        let saved = col.create(reading("S1", 1.0)).unwrap();
        let result = col.update(&saved.id, &|r| {
            r.voltage_kv = Some(99.0);
            Err(CoreError::ValidationFailed {
                message: "nope".into(),
            })
        });
        assert!(result.is_err());
        assert_eq!(col.get(&saved.id).unwrap().voltage_kv, Some(1.0));
    }

    #[test]
    fn retention_evicts_oldest() {
        let col: EntityCollection<TelemetryReading> = EntityCollection::with_retention(2);
        for v in [1.0, 2.0, 3.0] {
            col.create(reading("S1", v)).unwrap();
        }
        let kept: Vec<_> = col
            .list(SortOrder::OldestFirst, None)
            .iter()
            .map(|r| r.voltage_kv.unwrap())
            .collect();
        assert_eq!(kept, vec![2.0, 3.0]);
    }

    #[test]
    fn remove_and_clear() {
        let col: EntityCollection<TelemetryReading> = EntityCollection::new();
        let a = col.create(reading("S1", 1.0)).unwrap();
        col.create(reading("S1", 2.0)).unwrap();

        assert!(col.remove(&a.id).is_some());
        assert_eq!(col.len(), 1);

        col.clear();
        assert!(col.is_empty());
        assert!(col.snapshot().is_empty());
    }

    #[test]
    fn mutations_bump_version() {
        let col: EntityCollection<TelemetryReading> = EntityCollection::new();
        let before = col.version();
        col.create(reading("S1", 1.0)).unwrap();
        assert!(col.version() > before);
    }
}
