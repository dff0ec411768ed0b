//! Keyed artifact storage, with load-or-compute cache semantics
use std::collections::{BTreeMap, HashMap};

use log::info;
use nalgebra::Vector3;

use crate::{
    error::Error,
    navigation::PvtSolver,
    observation::ObservationTable,
    pipeline::{Output, Pipeline},
    prelude::{EphemerisTimeline, Epoch, SatelliteStateProvider},
    sdiff::SingleDiffs,
};

/// [Artifact]s exchanged with a [Store]
#[derive(Debug, Clone, PartialEq)]
pub enum Artifact {
    /// Broadcast ephemerides
    Ephemerides(EphemerisTimeline),
    /// One receiver's observations
    Observations(ObservationTable),
    /// Single differences time serie
    SingleDiffs(BTreeMap<Epoch, SingleDiffs>),
    /// ECEF positions time serie
    Positions(BTreeMap<Epoch, Vector3<f64>>),
}

/// Any persistent storage should implement [Store] to
/// be used with [load_or_compute].
pub trait Store {
    /// Returns the [Artifact] stored under `key`
    fn get(&self, key: &str) -> Option<&Artifact>;

    /// Stores an [Artifact] under `key`, replacing any previous content
    fn put(&mut self, key: &str, artifact: Artifact);

    fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }
}

/// Logical names of the [Artifact]s in the [Store]
#[derive(Debug, Clone, PartialEq)]
pub struct StoreKeys {
    pub ephemerides: String,
    pub local: String,
    pub remote: String,
    pub sdiffs: String,
    pub local_ecef: String,
    pub remote_ecef: String,
}

impl Default for StoreKeys {
    fn default() -> Self {
        Self {
            ephemerides: "ephemerides".to_string(),
            local: "local".to_string(),
            remote: "remote".to_string(),
            sdiffs: "sdiffs".to_string(),
            local_ecef: "local_ecef".to_string(),
            remote_ecef: "remote_ecef".to_string(),
        }
    }
}

/// In memory [Store]
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: HashMap<String, Artifact>,
}

impl Store for MemoryStore {
    fn get(&self, key: &str) -> Option<&Artifact> {
        self.inner.get(key)
    }

    fn put(&mut self, key: &str, artifact: Artifact) {
        self.inner.insert(key.to_string(), artifact);
    }
}

fn ephemerides<'a, St: Store>(store: &'a St, key: &str) -> Result<&'a EphemerisTimeline, Error> {
    match store.get(key) {
        Some(Artifact::Ephemerides(timeline)) => Ok(timeline),
        Some(_) => Err(Error::InvalidArtifact(key.to_string())),
        None => Err(Error::MissingArtifact(key.to_string())),
    }
}

fn observations<'a, St: Store>(store: &'a St, key: &str) -> Result<&'a ObservationTable, Error> {
    match store.get(key) {
        Some(Artifact::Observations(table)) => Ok(table),
        Some(_) => Err(Error::InvalidArtifact(key.to_string())),
        None => Err(Error::MissingArtifact(key.to_string())),
    }
}

fn sdiffs<St: Store>(store: &St, key: &str) -> Result<BTreeMap<Epoch, SingleDiffs>, Error> {
    match store.get(key) {
        Some(Artifact::SingleDiffs(sdiffs)) => Ok(sdiffs.clone()),
        Some(_) => Err(Error::InvalidArtifact(key.to_string())),
        None => Err(Error::MissingArtifact(key.to_string())),
    }
}

fn positions<St: Store>(store: &St, key: &str) -> Result<BTreeMap<Epoch, Vector3<f64>>, Error> {
    match store.get(key) {
        Some(Artifact::Positions(positions)) => Ok(positions.clone()),
        Some(_) => Err(Error::InvalidArtifact(key.to_string())),
        None => Err(Error::MissingArtifact(key.to_string())),
    }
}

/// Returns the single differences and positions held by the [Store].
/// They are (re)computed with the [Pipeline] and written back when
/// `overwrite` is set, or when any of the three output keys is missing.
pub fn load_or_compute<St, P, S>(
    store: &mut St,
    keys: &StoreKeys,
    overwrite: bool,
    pipeline: &Pipeline<P, S>,
) -> Result<Output, Error>
where
    St: Store,
    P: SatelliteStateProvider,
    S: PvtSolver,
{
    let cached = store.contains(&keys.sdiffs)
        && store.contains(&keys.local_ecef)
        && store.contains(&keys.remote_ecef);

    if overwrite || !cached {
        info!("computing \"{}\"", keys.sdiffs);

        let output = pipeline.run(
            ephemerides(store, &keys.ephemerides)?.clone(),
            observations(store, &keys.local)?,
            observations(store, &keys.remote)?,
        )?;

        store.put(&keys.sdiffs, Artifact::SingleDiffs(output.sdiffs.clone()));
        store.put(&keys.local_ecef, Artifact::Positions(output.local_ecef.clone()));
        store.put(&keys.remote_ecef, Artifact::Positions(output.remote_ecef.clone()));

        return Ok(output);
    }

    Ok(Output {
        sdiffs: sdiffs(store, &keys.sdiffs)?,
        local_ecef: positions(store, &keys.local_ecef)?,
        remote_ecef: positions(store, &keys.remote_ecef)?,
    })
}
