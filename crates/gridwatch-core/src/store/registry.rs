// ── Site registry sync ──
//
// Applies a full fleet definition to the DataStore. Existing sites keep
// their creation order and health state; sites missing from the incoming
// fleet are pruned.

use std::collections::HashSet;

use super::DataStore;
use crate::model::{EntityId, Site};

impl DataStore {
    /// Upsert every incoming site, then prune ids not in the incoming set.
    ///
    /// Avoids the brief empty registry a clear-then-insert would cause.
    /// Health score and status are preserved for sites already known, since
    /// those are maintained outside the fleet definition.
    pub fn apply_fleet(&self, fleet: Vec<Site>) {
        let incoming: HashSet<EntityId> = fleet
            .iter()
            .map(|s| EntityId::Named(s.site_id.clone()))
            .collect();

        for mut site in fleet {
            let id = EntityId::Named(site.site_id.clone());
            if let Some(existing) = self.sites.get(&id) {
                site.health_score = existing.health_score;
                site.status = existing.status;
                site.created_at = existing.created_at;
            }
            site.id = id;
            self.sites.upsert(site);
        }

        for existing in self.sites.ids() {
            if !incoming.contains(&existing) {
                tracing::debug!(site = %existing, "pruning site absent from fleet");
                self.sites.remove(&existing);
            }
        }
    }
}
