//! Cycle slip detection from receiver lock counters
use std::collections::{BTreeMap, BTreeSet};

use log::debug;

use crate::prelude::{Epoch, SV};

/// Last lock counters reported for one [SV].
/// A counter that was not reported is not tracked (`None`).
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct LockRecord {
    /// Local lock counter
    pub lock1: Option<f64>,
    /// Remote lock counter
    pub lock2: Option<f64>,
}

fn reported(value: f64) -> Option<f64> {
    if value.is_nan() {
        None
    } else {
        Some(value)
    }
}

/// A counter is continuous when it was not tracked
/// or when it did not change since last epoch.
fn continuous(prev: Option<f64>, current: f64) -> bool {
    match prev {
        Some(prev) => prev == current,
        None => true,
    }
}

impl LockRecord {
    /// Builds the [LockRecord] to carry to next epoch, from this epoch's readings
    pub fn new(lock1: f64, lock2: f64) -> Self {
        Self {
            lock1: reported(lock1),
            lock2: reported(lock2),
        }
    }

    /// True when neither counter is tracked
    pub fn is_untracked(&self) -> bool {
        self.lock1.is_none() && self.lock2.is_none()
    }

    /// Trust decision of one [SV]: both counters need to be reported
    /// this epoch and neither may have changed since last record.
    /// `prev` is `None` for an untracked [SV].
    pub fn is_trusted(prev: Option<&Self>, lock1: f64, lock2: f64) -> bool {
        let has_info = !lock1.is_nan() && !lock2.is_nan();
        let (prev1, prev2) = prev
            .map(|prev| (prev.lock1, prev.lock2))
            .unwrap_or((None, None));
        has_info && continuous(prev1, lock1) && continuous(prev2, lock2)
    }
}

/// [LockState] is the immutable snapshot of lock counters
/// carried from one epoch to the next.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LockState {
    inner: BTreeMap<SV, LockRecord>,
}

impl LockState {
    /// Returns the [LockRecord] of this [SV], if tracked
    pub fn get(&self, sv: &SV) -> Option<&LockRecord> {
        self.inner.get(sv)
    }

    /// Number of tracked [SV]s
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// True when no [SV] is tracked
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Evaluates this epoch's lock counters (per [SV]: local, remote) against
    /// Self. Returns the set of trusted [SV]s along with the next [LockState].
    /// The next state only holds this epoch's reported counters, so an [SV]
    /// (or a single counter) that stops reporting loses its history.
    pub fn step<I>(&self, t: Epoch, locks: I) -> (BTreeSet<SV>, Self)
    where
        I: IntoIterator<Item = (SV, f64, f64)>,
    {
        let mut trusted = BTreeSet::new();
        let mut next = BTreeMap::new();

        for (sv, lock1, lock2) in locks {
            let prev = self.inner.get(&sv);

            if LockRecord::is_trusted(prev, lock1, lock2) {
                trusted.insert(sv);
            } else {
                debug!(
                    "{} ({}) - untrusted: lock1={} lock2={} prev={:?}",
                    t, sv, lock1, lock2, prev
                );
            }

            let record = LockRecord::new(lock1, lock2);
            if !record.is_untracked() {
                next.insert(sv, record);
            }
        }

        (trusted, Self { inner: next })
    }
}
