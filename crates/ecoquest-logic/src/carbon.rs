//! Daily carbon-savings estimate from logged eco actions.
//!
//! Simplified factors versus driving a car; real accounting is more
//! complex. Tree savings are annual figures prorated to a per-day value.

use serde::{Deserialize, Serialize};

/// kg of CO2 saved per tree per year.
pub const TREE_KG_PER_YEAR: f64 = 21.0;
/// kg of CO2 saved per km cycled instead of driven.
pub const CYCLE_KG_PER_KM: f64 = 0.21;
/// kg of CO2 saved per km on a bus instead of a car.
pub const BUS_KG_PER_KM: f64 = 0.1;
/// kg of CO2 saved per km on a train instead of a car.
pub const TRAIN_KG_PER_KM: f64 = 0.04;

/// Eco actions logged for a single day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EcoActions {
    pub trees_planted: u32,
    pub km_cycled: u32,
    pub km_by_bus: u32,
    pub km_by_train: u32,
}

/// Estimated kg of CO2 saved today.
pub fn total_saved_kg(actions: &EcoActions) -> f64 {
    let trees = f64::from(actions.trees_planted) * (TREE_KG_PER_YEAR / 365.0);
    let cycle = f64::from(actions.km_cycled) * CYCLE_KG_PER_KM;
    let bus = f64::from(actions.km_by_bus) * BUS_KG_PER_KM;
    let train = f64::from(actions.km_by_train) * TRAIN_KG_PER_KM;
    trees + cycle + bus + train
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nothing_logged_saves_nothing() {
        assert_eq!(total_saved_kg(&EcoActions::default()), 0.0);
    }

    #[test]
    fn known_day_total() {
        // 2 trees/365 days + 10 km cycled + 5 km bus + 20 km train.
        let actions = EcoActions {
            trees_planted: 2,
            km_cycled: 10,
            km_by_bus: 5,
            km_by_train: 20,
        };
        let expected = 2.0 * 21.0 / 365.0 + 10.0 * 0.21 + 5.0 * 0.1 + 20.0 * 0.04;
        assert!((total_saved_kg(&actions) - expected).abs() < 1e-9);
    }

    #[test]
    fn cycling_beats_bus_beats_train_per_km() {
        assert!(CYCLE_KG_PER_KM > BUS_KG_PER_KM);
        assert!(BUS_KG_PER_KM > TRAIN_KG_PER_KM);
    }
}
