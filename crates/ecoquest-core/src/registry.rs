//! Stateful plant registry — geofenced check-ins over a persisted snapshot.
//!
//! Wraps the pure classification from `ecoquest-logic` with the storage
//! discipline: the full JSON snapshot is loaded at construction and written
//! back after every mutating operation.

use log::{debug, info};

use ecoquest_logic::constants::points;
use ecoquest_logic::geo::GeoPoint;
use ecoquest_logic::registry::{classify, CheckIn, Classification, PlantRecord};

use crate::store::{SnapshotStore, StoreError, REGISTRY_KEY};

/// Result of recording one observation.
#[derive(Debug, Clone, PartialEq)]
pub enum Observation {
    /// Matched an existing plant; a check-in was appended and persisted.
    CheckIn {
        id: String,
        nickname: String,
        points: u32,
    },
    /// No plant in range. The caller collects a nickname and species, then
    /// passes these back to [`PlantRegistry::register`].
    NewCandidate { fix: GeoPoint, photo: String },
}

/// The plant registry over a snapshot store.
pub struct PlantRegistry<S: SnapshotStore> {
    store: S,
    plants: Vec<PlantRecord>,
}

impl<S: SnapshotStore> PlantRegistry<S> {
    /// Load the registry snapshot; a missing key is an empty registry.
    pub fn open(store: S) -> Result<Self, StoreError> {
        let plants = match store.get(REGISTRY_KEY)? {
            Some(json) => serde_json::from_str(&json)?,
            None => Vec::new(),
        };
        Ok(Self { store, plants })
    }

    /// All registered plants, in registration order.
    pub fn plants(&self) -> &[PlantRecord] {
        &self.plants
    }

    fn persist(&mut self) -> Result<(), StoreError> {
        let json = serde_json::to_string(&self.plants)?;
        self.store.put(REGISTRY_KEY, &json)
    }

    /// Classify an observation. On a match the check-in is appended to the
    /// nearest in-range plant and the snapshot is written back; otherwise
    /// nothing is mutated.
    pub fn record_observation(
        &mut self,
        fix: GeoPoint,
        photo: &str,
        timestamp_ms: i64,
    ) -> Result<Observation, StoreError> {
        match classify(fix, &self.plants) {
            Classification::CheckIn { index, distance_m } => {
                let plant = &mut self.plants[index];
                plant.check_ins.push(CheckIn {
                    timestamp_ms,
                    photo: photo.to_string(),
                    points: points::CHECK_IN,
                });
                let id = plant.id.clone();
                let nickname = plant.nickname.clone();
                debug!("check-in at {distance_m:.2}m against plant {id}");
                self.persist()?;
                Ok(Observation::CheckIn {
                    id,
                    nickname,
                    points: points::CHECK_IN,
                })
            }
            Classification::NewCandidate => Ok(Observation::NewCandidate {
                fix,
                photo: photo.to_string(),
            }),
        }
    }

    /// Create a new plant record from a confirmed candidate. The 25-point
    /// registration bonus stays implicit in total-score computation.
    pub fn register(
        &mut self,
        nickname: &str,
        species: &str,
        photo: &str,
        fix: GeoPoint,
        timestamp_ms: i64,
    ) -> Result<&PlantRecord, StoreError> {
        let record = PlantRecord {
            id: timestamp_ms.to_string(),
            nickname: nickname.to_string(),
            species: species.to_string(),
            origin_photo: photo.to_string(),
            location: fix,
            check_ins: Vec::new(),
        };
        info!("registered plant {} ({})", record.id, record.nickname);
        self.plants.push(record);
        self.persist()?;
        Ok(&self.plants[self.plants.len() - 1])
    }

    /// Remove a plant and its whole history. Returns whether anything was
    /// removed; unknown ids are a no-op.
    pub fn remove(&mut self, id: &str) -> Result<bool, StoreError> {
        let before = self.plants.len();
        self.plants.retain(|p| p.id != id);
        if self.plants.len() == before {
            return Ok(false);
        }
        info!("removed plant {id}");
        self.persist()?;
        Ok(true)
    }
}
