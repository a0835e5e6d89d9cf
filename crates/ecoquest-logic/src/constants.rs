//! Game constants — point values, matching radius, action-point economy.
//!
//! Simple numeric constants with no storage dependency. Both the stateful
//! engines and the native simtest use these.

/// Point awards for the plant registry.
pub mod points {
    /// Awarded once when a new plant is registered. Implicit in total-score
    /// computation, never materialized as a check-in event.
    pub const NEW_PLANT: u32 = 25;
    /// Awarded per check-in against an existing plant.
    pub const CHECK_IN: u32 = 10;
}

/// Geofencing parameters.
pub mod geofence {
    /// Observations strictly closer than this to a stored plant are
    /// check-ins; anything at or beyond it is a new-plant candidate.
    pub const MATCHING_RADIUS_M: f64 = 3.0;
    /// Mean Earth radius for the Haversine formula.
    pub const EARTH_RADIUS_M: f64 = 6_371_000.0;
}

/// Mission action-point economy.
pub mod ap {
    /// Cost of a single grid move.
    pub const MOVE_COST: i32 = 1;
    /// Cost of a successful marker interaction.
    pub const INTERACT_COST: i32 = 1;
    /// Granted for a successful rescue.
    pub const RESCUE_REWARD: i32 = 5;
}

/// Rolling-window size for the mission log; the oldest entries drop first.
pub const LOG_CAP: usize = 100;
