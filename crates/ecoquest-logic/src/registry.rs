//! Plant registry records and check-in classification.
//!
//! Pure decision logic over plain records. The stateful engine in
//! `ecoquest-core` owns persistence, collaborators, and the registration
//! form flow; this module only answers "check-in or new plant?" and keeps
//! score.

use serde::{Deserialize, Serialize};

use crate::constants::geofence::MATCHING_RADIUS_M;
use crate::constants::points;
use crate::geo::{self, GeoPoint};

/// A check-in event appended to a plant's history. Never mutated or
/// removed individually.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckIn {
    pub timestamp_ms: i64,
    pub photo: String,
    pub points: u32,
}

/// A user-registered plant anchored to a GPS coordinate.
///
/// The location is immutable after creation; the check-in history is
/// append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlantRecord {
    pub id: String,
    pub nickname: String,
    pub species: String,
    pub origin_photo: String,
    pub location: GeoPoint,
    pub check_ins: Vec<CheckIn>,
}

impl PlantRecord {
    /// Total score: the registration bonus plus every check-in award.
    pub fn total_points(&self) -> u32 {
        points::NEW_PLANT + self.check_ins.iter().map(|c| c.points).sum::<u32>()
    }
}

/// Outcome of classifying one observation against the stored records.
#[derive(Debug, Clone, PartialEq)]
pub enum Classification {
    /// Within the matching radius of an existing plant. When several are in
    /// range, the nearest wins.
    CheckIn { index: usize, distance_m: f64 },
    /// No plant in range — the caller must collect a nickname and species
    /// before a record is created.
    NewCandidate,
}

/// Classify an observation coordinate against the existing records.
pub fn classify(fix: GeoPoint, plants: &[PlantRecord]) -> Classification {
    match geo::nearest_within(fix, plants.iter().map(|p| p.location), MATCHING_RADIUS_M) {
        Some((index, distance_m)) => Classification::CheckIn { index, distance_m },
        None => Classification::NewCandidate,
    }
}
