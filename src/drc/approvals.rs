//! Persistent suppression of reviewed findings
//!
//! The set is stored by the caller; this module only matches it against a
//! run's messages.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{debug, warn};

use super::messages::{Approval, RuleCheckMessage};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApprovalSet {
    approvals: BTreeSet<Approval>,
}

impl ApprovalSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if the approval was already present
    pub fn insert(&mut self, approval: Approval) -> bool {
        self.approvals.insert(approval)
    }

    pub fn remove(&mut self, approval: &Approval) -> bool {
        self.approvals.remove(approval)
    }

    pub fn contains(&self, approval: &Approval) -> bool {
        self.approvals.contains(approval)
    }

    pub fn len(&self) -> usize {
        self.approvals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.approvals.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Approval> {
        self.approvals.iter()
    }

    /// Mark every message whose approval is in the set and return the
    /// approvals no message matched any more, in sorted order
    pub fn apply(&self, messages: &mut [RuleCheckMessage]) -> Vec<Approval> {
        let mut used = BTreeSet::new();
        for message in messages.iter_mut() {
            let matched = self.approvals.get(&message.approval);
            message.approved = matched.is_some();
            used.extend(matched);
        }
        let orphans: Vec<Approval> = self
            .approvals
            .iter()
            .filter(|a| !used.contains(a))
            .cloned()
            .collect();
        debug!(approved = used.len(), orphaned = orphans.len(), "applied approvals");
        if !orphans.is_empty() {
            warn!(count = orphans.len(), "approvals no longer match any message");
        }
        orphans
    }

    /// Drop the given approvals, e.g. the orphans returned by [`ApprovalSet::apply`]
    pub fn prune(&mut self, orphans: &[Approval]) -> usize {
        orphans.iter().filter(|a| self.approvals.remove(a)).count()
    }
}

impl FromIterator<Approval> for ApprovalSet {
    fn from_iter<I: IntoIterator<Item = Approval>>(iter: I) -> Self {
        Self { approvals: iter.into_iter().collect() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drc::board::Anchor;
    use crate::drc::settings::DrcSettings;
    use crate::geometry::Point;

    fn message(net: &str) -> RuleCheckMessage {
        let a = Anchor::via("v1", Point::new(0, 0));
        let b = Anchor::via("v2", Point::new(100, 0));
        RuleCheckMessage::missing_connection(&DrcSettings::default(), net, &a, &b)
    }

    #[test]
    fn test_apply_marks_and_reports_orphans() {
        let mut messages = vec![message("GND"), message("VCC")];
        let stale = message("OLD").approval;
        let set: ApprovalSet = [messages[0].approval.clone(), stale.clone()].into_iter().collect();

        let orphans = set.apply(&mut messages);
        assert!(messages[0].approved);
        assert!(!messages[1].approved);
        assert_eq!(orphans, vec![stale]);
    }

    #[test]
    fn test_prune_removes_orphans() {
        let mut set = ApprovalSet::new();
        assert!(set.insert(message("GND").approval));
        assert!(!set.insert(message("GND").approval));
        let orphans = set.apply(&mut []);
        assert_eq!(set.prune(&orphans), 1);
        assert!(set.is_empty());
    }

    #[test]
    fn test_serializes_as_list() {
        let set: ApprovalSet = [message("GND").approval].into_iter().collect();
        let json = serde_json::to_string(&set).unwrap();
        assert!(json.starts_with('['));
        let back: ApprovalSet = serde_json::from_str(&json).unwrap();
        assert_eq!(back, set);
    }
}
