//! Deferred directory renames.
//!
//! Directory jobs run concurrently and must not touch the tree while the
//! walk is still traversing it. Each job only *records* its decision in the
//! [`RenameCollector`]; after the directory phase has drained, the collector
//! is frozen into a [`RenamePlan`] and applied in one go.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use tracing::warn;

/// One pending rename, keyed by the original path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameRecord {
    pub from: PathBuf,
    pub to: PathBuf,
}

/// Lock-guarded table of rename decisions.
#[derive(Debug, Default)]
pub struct RenameCollector {
    records: Mutex<BTreeMap<PathBuf, PathBuf>>,
}

impl RenameCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `from` should become `to`.
    ///
    /// Identity renames are ignored. A second record for the same original
    /// path replaces the first (and is logged, since it means a directory
    /// was submitted twice).
    pub fn record(&self, from: impl Into<PathBuf>, to: impl Into<PathBuf>) {
        let (from, to) = (from.into(), to.into());
        if from == to {
            return;
        }
        // A poisoned lock only means another job panicked mid-insert; the
        // map itself is still consistent.
        let mut records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = records.insert(from.clone(), to) {
            warn!(path = %from.display(), previous = %previous.display(), "rename recorded twice");
        }
    }

    pub fn len(&self) -> usize {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Empty the table into an application order.
    ///
    /// Called once the directory phase has drained, while no job can record
    /// anything else.
    pub fn take_plan(&self) -> RenamePlan {
        let records = std::mem::take(
            &mut *self.records.lock().unwrap_or_else(PoisonError::into_inner),
        );
        RenamePlan::new(
            records
                .into_iter()
                .map(|(from, to)| RenameRecord { from, to })
                .collect(),
        )
    }
}

/// Renames ordered so that nested directories are safe to apply.
///
/// Records are sorted deepest-first. Every record still refers to paths
/// captured before any rename ran, so a child is always moved while its
/// parent still carries its original name; the parent is moved afterwards
/// and takes the already-renamed child with it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenamePlan {
    records: Vec<RenameRecord>,
}

impl RenamePlan {
    fn new(mut records: Vec<RenameRecord>) -> Self {
        records.sort_by(|a, b| {
            depth(&b.from)
                .cmp(&depth(&a.from))
                .then_with(|| a.from.cmp(&b.from))
        });
        Self { records }
    }

    pub fn records(&self) -> &[RenameRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl IntoIterator for RenamePlan {
    type Item = RenameRecord;
    type IntoIter = std::vec::IntoIter<RenameRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

fn depth(path: &Path) -> usize {
    path.components().count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn identity_renames_are_dropped() {
        let collector = RenameCollector::new();
        collector.record("/a/b", "/a/b");
        assert!(collector.is_empty());
    }

    #[test]
    fn plan_orders_deepest_first() {
        let collector = RenameCollector::new();
        collector.record("/root/x{a}", "/root/xa");
        collector.record("/root/x{a}/y{b}/z{c}", "/root/x{a}/y{b}/zc");
        collector.record("/root/x{a}/y{b}", "/root/x{a}/yb");

        let plan = collector.take_plan();
        let order: Vec<_> = plan.records().iter().map(|r| r.from.clone()).collect();
        assert_eq!(
            order,
            vec![
                PathBuf::from("/root/x{a}/y{b}/z{c}"),
                PathBuf::from("/root/x{a}/y{b}"),
                PathBuf::from("/root/x{a}"),
            ]
        );
    }

    #[test]
    fn siblings_at_same_depth_are_sorted_by_path() {
        let collector = RenameCollector::new();
        collector.record("/r/b", "/r/bb");
        collector.record("/r/a", "/r/aa");
        let plan = collector.take_plan();
        assert_eq!(plan.records()[0].from, PathBuf::from("/r/a"));
        assert_eq!(plan.len(), 2);
    }

    #[test]
    fn concurrent_records_are_all_kept() {
        let collector = Arc::new(RenameCollector::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let collector = Arc::clone(&collector);
                thread::spawn(move || {
                    for j in 0..50 {
                        collector.record(format!("/t/{i}/{j}"), format!("/t/{i}/r{j}"));
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(collector.len(), 400);
    }
}
