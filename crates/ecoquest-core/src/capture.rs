//! Photo-capture flow — camera, classifier, and geolocation collaborators.
//!
//! One capture attempt runs take-photo → species gate → GPS fix →
//! geofenced classification. Every early exit leaves the registry
//! untouched; all failures are recoverable by the caller re-prompting the
//! user, and nothing here retries internally.

use std::fmt;

use log::{debug, warn};

use ecoquest_logic::geo::GeoPoint;

use crate::registry::{Observation, PlantRegistry};
use crate::store::{SnapshotStore, StoreError};

/// Supplies an opaque photo reference. `None` means capture was cancelled.
pub trait PhotoCamera {
    fn capture(&mut self) -> Option<String>;
}

/// Judges whether a photo shows a plant.
pub trait PlantClassifier {
    fn is_plant(&mut self, photo: &str) -> Result<bool, CaptureError>;
}

/// Supplies the current GPS fix.
pub trait LocationSource {
    fn current_fix(&mut self) -> Result<GeoPoint, CaptureError>;
}

/// Outcome of one full capture attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureOutcome {
    /// The user backed out of the camera; nothing happened.
    Cancelled,
    /// The classifier did not recognize a plant; nothing happened.
    NotAPlant,
    /// The observation matched an existing plant or opened a registration.
    Observed(Observation),
}

/// Recoverable failures during the capture flow. No state is mutated.
#[derive(Debug)]
pub enum CaptureError {
    /// The geolocation collaborator could not produce a fix.
    LocationUnavailable,
    /// The species classifier could not be reached.
    Classifier(String),
    /// The snapshot store failed while recording the observation.
    Store(StoreError),
}

impl From<StoreError> for CaptureError {
    fn from(e: StoreError) -> Self {
        CaptureError::Store(e)
    }
}

impl fmt::Display for CaptureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureError::LocationUnavailable => {
                write!(f, "could not get your location; ensure GPS is enabled")
            }
            CaptureError::Classifier(msg) => {
                write!(f, "could not reach the prediction service: {}", msg)
            }
            CaptureError::Store(e) => write!(f, "storage failure: {}", e),
        }
    }
}

impl std::error::Error for CaptureError {}

/// Run one capture attempt end to end.
pub fn run_capture<S, C, P, L>(
    registry: &mut PlantRegistry<S>,
    camera: &mut C,
    classifier: &mut P,
    locator: &mut L,
    timestamp_ms: i64,
) -> Result<CaptureOutcome, CaptureError>
where
    S: SnapshotStore,
    C: PhotoCamera,
    P: PlantClassifier,
    L: LocationSource,
{
    let photo = match camera.capture() {
        Some(photo) => photo,
        None => {
            debug!("capture cancelled");
            return Ok(CaptureOutcome::Cancelled);
        }
    };
    if !classifier.is_plant(&photo)? {
        warn!("photo {photo} rejected by the species classifier");
        return Ok(CaptureOutcome::NotAPlant);
    }
    let fix = locator.current_fix()?;
    let observation = registry.record_observation(fix, &photo, timestamp_ms)?;
    Ok(CaptureOutcome::Observed(observation))
}
