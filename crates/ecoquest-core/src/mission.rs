//! Mission engine — persists the state machine across operations.
//!
//! Wraps `ecoquest_logic::mission::MissionState` with the snapshot
//! discipline and the tutorial-seen gate: the full state is written back
//! after every mutating operation, and dismissing the tutorial once is
//! remembered across missions.

use std::fmt;

use log::{debug, info};

use ecoquest_logic::level::LevelDef;
use ecoquest_logic::mission::{
    InteractOutcome, MissionError, MissionState, MoveOutcome, Phase,
};

use crate::store::{SnapshotStore, StoreError, MISSION_KEY, TUTORIAL_SEEN_KEY};

/// A rule rejection or a storage failure. Rule rejections leave both the
/// in-memory state and the snapshot untouched.
#[derive(Debug)]
pub enum EngineError {
    Rule(MissionError),
    Store(StoreError),
}

impl From<MissionError> for EngineError {
    fn from(e: MissionError) -> Self {
        EngineError::Rule(e)
    }
}

impl From<StoreError> for EngineError {
    fn from(e: StoreError) -> Self {
        EngineError::Store(e)
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::Rule(e) => write!(f, "{}", e),
            EngineError::Store(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for EngineError {}

/// One playable mission over a snapshot store.
pub struct MissionEngine<S: SnapshotStore> {
    store: S,
    level: LevelDef,
    state: MissionState,
}

impl<S: SnapshotStore> MissionEngine<S> {
    /// Resume the persisted mission for `level`, or start a fresh one. The
    /// tutorial is shown only if it has never been dismissed.
    pub fn open(store: S, level: LevelDef) -> Result<Self, StoreError> {
        let tutorial_seen =
            matches!(store.get(TUTORIAL_SEEN_KEY)?.as_deref(), Some("true"));
        let state = match store.get(MISSION_KEY)? {
            Some(json) => serde_json::from_str(&json)?,
            None => MissionState::new(&level, tutorial_seen),
        };
        Ok(Self {
            store,
            level,
            state,
        })
    }

    pub fn state(&self) -> &MissionState {
        &self.state
    }

    pub fn level(&self) -> &LevelDef {
        &self.level
    }

    fn persist(&mut self) -> Result<(), StoreError> {
        let json = serde_json::to_string(&self.state)?;
        self.store.put(MISSION_KEY, &json)
    }

    /// Dismiss the tutorial and remember that across missions.
    pub fn dismiss_tutorial(&mut self) -> Result<(), EngineError> {
        self.state.dismiss_tutorial()?;
        self.store.put(TUTORIAL_SEEN_KEY, "true")?;
        self.persist()?;
        Ok(())
    }

    /// Move the player one step.
    pub fn move_player(&mut self, dx: i32, dy: i32) -> Result<MoveOutcome, EngineError> {
        let outcome = self.state.move_player(&self.level, dx, dy)?;
        if matches!(outcome, MoveOutcome::MovedAndExhausted { .. }) {
            info!("mission failed: action points exhausted");
        }
        self.persist()?;
        Ok(outcome)
    }

    /// Interact with the marker under the player.
    pub fn interact(&mut self) -> Result<InteractOutcome, EngineError> {
        let outcome = self.state.interact(&self.level)?;
        match &outcome {
            InteractOutcome::ClueFound {
                clue_id,
                decision_unlocked,
            } => {
                debug!("clue {clue_id} found (decision_unlocked={decision_unlocked})");
            }
            InteractOutcome::ClueFoundAndExhausted { clue_id } => {
                info!("mission failed: last action point spent on clue {clue_id}");
            }
            InteractOutcome::Rescued { .. } => debug!("civilian rescued"),
        }
        self.persist()?;
        Ok(outcome)
    }

    /// Choose a decision option; returns its outcome message.
    pub fn decide(&mut self, option_id: &str) -> Result<String, EngineError> {
        let message = self
            .state
            .decide(&self.level, option_id)?
            .outcome_message
            .clone();
        info!("mission ended by decision {option_id}");
        self.persist()?;
        Ok(message)
    }

    /// Reset the mission to the level's initial configuration.
    pub fn restart(&mut self) -> Result<(), StoreError> {
        self.state.restart(&self.level);
        self.persist()
    }

    /// Whether the mission has ended.
    pub fn is_over(&self) -> bool {
        self.state.phase == Phase::GameOver
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use ecoquest_logic::level::GridPos;

    #[test]
    fn fresh_engine_starts_in_tutorial() {
        let engine = MissionEngine::open(MemoryStore::new(), LevelDef::the_deluge()).unwrap();
        assert_eq!(engine.state().phase, Phase::Tutorial);
    }

    #[test]
    fn tutorial_flag_outlives_the_mission_snapshot() {
        let mut store = MemoryStore::new();
        {
            let mut engine =
                MissionEngine::open(&mut store, LevelDef::the_deluge()).unwrap();
            engine.dismiss_tutorial().unwrap();
        }
        // A brand-new mission on a store that only carries the seen-flag
        // skips the tutorial.
        let mut fresh = MemoryStore::new();
        fresh
            .put(
                TUTORIAL_SEEN_KEY,
                &store.get(TUTORIAL_SEEN_KEY).unwrap().unwrap(),
            )
            .unwrap();
        let engine = MissionEngine::open(fresh, LevelDef::the_deluge()).unwrap();
        assert_eq!(engine.state().phase, Phase::Investigation);
    }

    #[test]
    fn state_survives_reopen() {
        let mut store = MemoryStore::new();
        {
            let mut engine =
                MissionEngine::open(&mut store, LevelDef::the_deluge()).unwrap();
            engine.dismiss_tutorial().unwrap();
            engine.move_player(1, 0).unwrap();
            engine.move_player(0, 1).unwrap();
        }
        let engine = MissionEngine::open(&mut store, LevelDef::the_deluge()).unwrap();
        assert_eq!(engine.state().player, GridPos { x: 1, y: 1 });
        assert_eq!(
            engine.state().action_points,
            LevelDef::the_deluge().initial_ap - 2
        );
    }

    #[test]
    fn rule_rejection_does_not_touch_the_snapshot() {
        let mut store = MemoryStore::new();
        {
            let mut engine =
                MissionEngine::open(&mut store, LevelDef::the_deluge()).unwrap();
            engine.dismiss_tutorial().unwrap();
        }
        let snapshot_before = store.get(MISSION_KEY).unwrap();
        {
            let mut engine =
                MissionEngine::open(&mut store, LevelDef::the_deluge()).unwrap();
            // Still in INVESTIGATION: deciding is a phase violation.
            assert!(matches!(
                engine.decide("d1"),
                Err(EngineError::Rule(MissionError::InvalidPhase { .. }))
            ));
        }
        assert_eq!(store.get(MISSION_KEY).unwrap(), snapshot_before);
    }

    #[test]
    fn restart_persists_the_reset() {
        let mut store = MemoryStore::new();
        {
            let mut engine =
                MissionEngine::open(&mut store, LevelDef::the_deluge()).unwrap();
            engine.dismiss_tutorial().unwrap();
            engine.move_player(1, 1).unwrap();
            engine.restart().unwrap();
        }
        let engine = MissionEngine::open(&mut store, LevelDef::the_deluge()).unwrap();
        assert_eq!(engine.state().player, GridPos { x: 0, y: 0 });
        assert_eq!(
            engine.state().action_points,
            LevelDef::the_deluge().initial_ap
        );
    }
}
