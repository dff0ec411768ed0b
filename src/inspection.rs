//! Read-only inspection of an ambiguity resolution filter
use std::collections::BTreeMap;

use nalgebra::{DMatrix, DVector};

use crate::prelude::{Epoch, SV};

/// Any ambiguity resolution filter should implement [AmbiguityFilter]
/// to expose its internal state for reporting purposes.
pub trait AmbiguityFilter {
    /// [SV]s currently managed by the filter, reference [SV] first
    fn satellites(&self) -> Vec<SV>;

    /// State estimate
    fn mean(&self) -> DVector<f64>;

    /// State estimate covariance
    fn covariance(&self) -> DMatrix<f64>;
}

/// [FilterSnapshot] of an [AmbiguityFilter] at one epoch
#[derive(Debug, Clone, PartialEq)]
pub struct FilterSnapshot {
    /// Reference [SV] and the other [SV]s, when at least two are managed
    pub sats: Option<(SV, Vec<SV>)>,
    /// Number of managed [SV]s, 0 when fewer than two
    pub num_sats: usize,
    /// State estimate
    pub mean: DVector<f64>,
    /// State estimate covariance
    pub covariance: DMatrix<f64>,
}

impl FilterSnapshot {
    pub fn capture<F: AmbiguityFilter>(filter: &F) -> Self {
        let sats = filter.satellites();

        let (sats, num_sats) = match sats.split_first() {
            Some((reference, others)) if !others.is_empty() => {
                (Some((*reference, others.to_vec())), sats.len())
            },
            _ => (None, 0),
        };

        Self {
            sats,
            num_sats,
            mean: filter.mean(),
            covariance: filter.covariance(),
        }
    }
}

/// [FilterReport] accumulates [FilterSnapshot]s into time series
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterReport {
    inner: BTreeMap<Epoch, FilterSnapshot>,
}

impl FilterReport {
    /// Captures the [AmbiguityFilter] state at `t`
    pub fn capture<F: AmbiguityFilter>(&mut self, t: Epoch, filter: &F) {
        self.inner.insert(t, FilterSnapshot::capture(filter));
    }

    /// Number of captured epochs
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// True when nothing was captured
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Time serie of managed [SV]s (reference, others)
    pub fn sats(&self) -> BTreeMap<Epoch, Option<(SV, Vec<SV>)>> {
        self.inner
            .iter()
            .map(|(t, snapshot)| (*t, snapshot.sats.clone()))
            .collect()
    }

    /// Time serie of the number of managed [SV]s
    pub fn num_sats(&self) -> BTreeMap<Epoch, usize> {
        self.inner
            .iter()
            .map(|(t, snapshot)| (*t, snapshot.num_sats))
            .collect()
    }

    /// Time serie of state estimates
    pub fn mean(&self) -> BTreeMap<Epoch, DVector<f64>> {
        self.inner
            .iter()
            .map(|(t, snapshot)| (*t, snapshot.mean.clone()))
            .collect()
    }

    /// Time serie of state covariances
    pub fn covariance(&self) -> BTreeMap<Epoch, DMatrix<f64>> {
        self.inner
            .iter()
            .map(|(t, snapshot)| (*t, snapshot.covariance.clone()))
            .collect()
    }
}
