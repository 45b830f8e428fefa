//! Stand registry: the stands the editor currently knows about.
//!
//! Two origins are merged: the host-supplied (server-confirmed) list, and
//! stands added locally right after a successful create, before the host has
//! re-fetched. Local entries only bridge that latency. A fresh host list
//! replaces them wholesale.

use crate::id::StandId;
use crate::model::{Stand, StandStatus};

/// Ordered set of stands, host-supplied first, then local additions in
/// insertion order.
#[derive(Debug, Clone, Default)]
pub struct StandRegistry {
    hosted: Vec<Stand>,
    local: Vec<Stand>,
    /// Bumped on every change; renderers compare it to skip redundant redraws.
    revision: u64,
}

impl StandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry seeded with a host list.
    pub fn from_host(stands: Vec<Stand>) -> Self {
        let mut registry = Self::new();
        registry.replace_from_host(stands);
        registry
    }

    /// All stands in render order.
    pub fn all(&self) -> impl Iterator<Item = &Stand> {
        self.hosted.iter().chain(self.local.iter())
    }

    pub fn len(&self) -> usize {
        self.hosted.len() + self.local.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn get(&self, id: StandId) -> Option<&Stand> {
        self.all().find(|s| s.id == id)
    }

    /// Whether some stand already carries this number (trimmed, case-insensitive).
    pub fn has_stand_number(&self, number: &str) -> bool {
        let wanted = number.trim();
        self.all()
            .any(|s| s.stand_number.trim().eq_ignore_ascii_case(wanted))
    }

    /// Number of local entries still waiting for a host refresh.
    pub fn local_count(&self) -> usize {
        self.local.len()
    }

    /// Append a locally-created stand.
    pub fn add_local(&mut self, stand: Stand) {
        log::debug!("registry: local stand {} ({})", stand.stand_number, stand.id);
        self.local.push(stand);
        self.revision += 1;
    }

    /// Adopt a fresh host list verbatim, discarding every local entry.
    pub fn replace_from_host(&mut self, stands: Vec<Stand>) {
        if !self.local.is_empty() {
            log::debug!("registry: dropping {} local stand(s) on host refresh", self.local.len());
        }
        self.hosted = stands;
        self.local.clear();
        self.revision += 1;
    }

    /// Set the status of one stand in place. Returns `false` if unknown.
    pub fn apply_status_change(&mut self, id: StandId, status: StandStatus) -> bool {
        let Some(stand) = self
            .hosted
            .iter_mut()
            .chain(self.local.iter_mut())
            .find(|s| s.id == id)
        else {
            return false;
        };
        if stand.status != status {
            log::debug!("registry: {} {} → {}", stand.stand_number, stand.status, status);
            stand.status = status;
            self.revision += 1;
        }
        true
    }

    /// Remove a stand (after the backend confirmed deletion).
    pub fn remove(&mut self, id: StandId) -> Option<Stand> {
        let removed = if let Some(pos) = self.hosted.iter().position(|s| s.id == id) {
            Some(self.hosted.remove(pos))
        } else if let Some(pos) = self.local.iter().position(|s| s.id == id) {
            Some(self.local.remove(pos))
        } else {
            None
        };
        if removed.is_some() {
            self.revision += 1;
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{StandDimension, StandType};
    use pretty_assertions::assert_eq;

    fn stand(id: StandId, number: &str) -> Stand {
        Stand {
            id,
            stand_number: number.to_string(),
            position_x: 10.0,
            position_y: 20.0,
            width: StandDimension::default(),
            height: StandDimension::default(),
            stand_type: StandType::Painting,
            status: StandStatus::Available,
            hall_map_id: None,
        }
    }

    fn numbers(registry: &StandRegistry) -> Vec<&str> {
        registry.all().map(|s| s.stand_number.as_str()).collect()
    }

    #[test]
    fn host_stands_come_before_local_ones() {
        let mut registry = StandRegistry::from_host(vec![
            stand(StandId::intern("1"), "A1"),
            stand(StandId::intern("2"), "A2"),
        ]);
        registry.add_local(stand(StandId::placeholder(), "B1"));
        registry.add_local(stand(StandId::placeholder(), "B2"));
        assert_eq!(numbers(&registry), vec!["A1", "A2", "B1", "B2"]);
    }

    #[test]
    fn host_refresh_drops_local_entries() {
        let mut registry = StandRegistry::new();
        let local = StandId::placeholder();
        registry.add_local(stand(local, "L1"));
        registry.replace_from_host(vec![stand(StandId::intern("9"), "A9")]);
        assert!(registry.get(local).is_none());
        assert_eq!(numbers(&registry), vec!["A9"]);
        assert_eq!(registry.local_count(), 0);
    }

    #[test]
    fn status_change_applies_to_local_and_hosted() {
        let hosted = StandId::intern("5");
        let local = StandId::placeholder();
        let mut registry = StandRegistry::from_host(vec![stand(hosted, "A5")]);
        registry.add_local(stand(local, "L1"));

        assert!(registry.apply_status_change(hosted, StandStatus::Pending));
        assert!(registry.apply_status_change(local, StandStatus::Maintenance));
        assert!(!registry.apply_status_change(StandId::intern("404"), StandStatus::Booked));
        assert_eq!(registry.get(hosted).unwrap().status, StandStatus::Pending);
        assert_eq!(registry.get(local).unwrap().status, StandStatus::Maintenance);
    }

    #[test]
    fn revision_tracks_changes_only() {
        let id = StandId::intern("77");
        let mut registry = StandRegistry::from_host(vec![stand(id, "C7")]);
        let rev = registry.revision();
        registry.apply_status_change(id, StandStatus::Available);
        assert_eq!(registry.revision(), rev);
        registry.apply_status_change(id, StandStatus::Booked);
        assert_eq!(registry.revision(), rev + 1);
    }

    #[test]
    fn stand_numbers_are_matched_loosely() {
        let registry = StandRegistry::from_host(vec![stand(StandId::intern("1"), "a1")]);
        assert!(registry.has_stand_number(" A1 "));
        assert!(!registry.has_stand_number("A2"));
    }

    #[test]
    fn remove_deletes_from_either_origin() {
        let hosted = StandId::intern("31");
        let local = StandId::placeholder();
        let mut registry = StandRegistry::from_host(vec![stand(hosted, "D1")]);
        registry.add_local(stand(local, "D2"));
        assert!(registry.remove(hosted).is_some());
        assert!(registry.remove(local).is_some());
        assert!(registry.remove(local).is_none());
        assert!(registry.is_empty());
    }
}
