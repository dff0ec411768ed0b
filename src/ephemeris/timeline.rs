use std::collections::BTreeMap;

use log::debug;

use crate::{
    error::Error,
    prelude::{Ephemeris, Epoch, SV},
};

/// [EphemerisTimeline] stores the broadcast [Ephemeris] frames
/// of each [SV], indexed by publication [Epoch].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EphemerisTimeline {
    inner: BTreeMap<Epoch, BTreeMap<SV, Ephemeris>>,
}

impl FromIterator<(Epoch, Ephemeris)> for EphemerisTimeline {
    fn from_iter<I: IntoIterator<Item = (Epoch, Ephemeris)>>(iter: I) -> Self {
        let mut s = Self::default();
        for (t, eph) in iter {
            s.insert(t, eph);
        }
        s
    }
}

impl EphemerisTimeline {
    /// Stores a new [Ephemeris] frame at [Epoch], replacing
    /// any previous frame of this [SV] at that same [Epoch].
    pub fn insert(&mut self, t: Epoch, eph: Ephemeris) {
        self.inner.entry(t).or_default().insert(eph.sv, eph);
    }

    /// True when the timeline has no [Epoch]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Number of [Epoch]s in the timeline
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Iterates timeline [Epoch]s in chronological order
    pub fn epochs(&self) -> impl Iterator<Item = &Epoch> + '_ {
        self.inner.keys()
    }

    /// Iterates the [Ephemeris] sets in chronological order
    pub fn iter(&self) -> impl Iterator<Item = (&Epoch, &BTreeMap<SV, Ephemeris>)> + '_ {
        self.inner.iter()
    }

    /// Returns the [Ephemeris] of this [SV] published at this exact [Epoch]
    pub fn get(&self, t: &Epoch, sv: &SV) -> Option<&Ephemeris> {
        self.inner.get(t)?.get(sv)
    }

    /// Returns, for each [SV], the first [Ephemeris] in chronological
    /// order that is not missing. [SV]s that were never broadcast are
    /// absent from the result.
    pub fn first_good(&self) -> BTreeMap<SV, Ephemeris> {
        let mut first = BTreeMap::<SV, Ephemeris>::new();
        for (_, set) in self.inner.iter() {
            for (sv, eph) in set.iter() {
                if !eph.is_missing() && !first.contains_key(sv) {
                    first.insert(*sv, *eph);
                }
            }
        }
        first
    }

    /// Fills every gap of the timeline: each missing [Ephemeris] is replaced
    /// by the previous epoch's (already filled) frame, or by `first_good`
    /// at the very first epoch. After this pass, every [SV] of `first_good`
    /// has a valid frame at every epoch.
    pub fn fill_gaps(self, first_good: &BTreeMap<SV, Ephemeris>) -> Self {
        let mut inner = BTreeMap::<Epoch, BTreeMap<SV, Ephemeris>>::new();
        let mut prev = first_good.clone();

        for (t, mut set) in self.inner.into_iter() {
            for (sv, carried) in prev.iter() {
                let missing = set.get(sv).map(|eph| eph.is_missing()).unwrap_or(true);
                if missing {
                    debug!("{} ({}) - carrying ephemeris forward", t, sv);
                    set.insert(*sv, *carried);
                }
            }
            prev = set
                .iter()
                .filter(|(_, eph)| !eph.is_missing())
                .map(|(sv, eph)| (*sv, *eph))
                .collect();
            inner.insert(t, set);
        }

        Self { inner }
    }

    /// Convenience method to [Self::fill_gaps] with [Self::first_good]
    pub fn gap_filled(self) -> Self {
        let first_good = self.first_good();
        self.fill_gaps(&first_good)
    }

    /// Returns the [Ephemeris] set of the latest epoch strictly prior `t`.
    /// Falls back to the earliest set when `t` precedes the whole timeline,
    /// so a frame published in the future is only used when nothing else exists.
    pub fn as_of(&self, t: Epoch) -> Result<&BTreeMap<SV, Ephemeris>, Error> {
        self.inner
            .range(..t)
            .next_back()
            .or_else(|| self.inner.iter().next())
            .map(|(_, set)| set)
            .ok_or(Error::EmptyEphemerisTimeline)
    }
}
