//! Mission state machine — investigation, decision, game over.
//!
//! Turn-based: the player spends an action-point budget moving on a grid
//! and interacting with markers. Enough clues unlock the decision phase;
//! every decision is terminal. Action-point exhaustion ends the mission in
//! failure.
//!
//! Transition checks are atomic with the mutation that triggers them: the
//! machine is never left in a playable zero-AP state, and the clue
//! threshold is applied in the same call that records the clue.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::{ap, LOG_CAP};
use crate::level::{GridPos, LevelDef, MarkerKind};

/// Mission phases. `GameOver` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    Tutorial,
    Investigation,
    Decision,
    GameOver,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Tutorial => "TUTORIAL",
            Self::Investigation => "INVESTIGATION",
            Self::Decision => "DECISION",
            Self::GameOver => "GAME_OVER",
        };
        f.write_str(name)
    }
}

/// Fixed failure message for action-point exhaustion.
pub const EXHAUSTION_MESSAGE: &str =
    "You ran out of Action Points! The disaster has worsened.";

const INTEL_MESSAGE: &str =
    "You've gathered enough intel! It's time to make a critical decision.";

/// Why an operation was rejected. Every rejection leaves the state
/// unchanged and costs nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MissionError {
    /// Operation invoked outside its valid phase.
    InvalidPhase { phase: Phase },
    /// No marker at the player's position.
    NothingHere,
    /// The marker here was already resolved this run.
    AlreadyResolved,
    /// Rescue attempted with no ropes left.
    InsufficientResource,
    /// The chosen option requires a clue that has not been found.
    OptionLocked,
    /// The chosen option id is not in the level's decision table.
    UnknownOption,
}

impl fmt::Display for MissionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidPhase { phase } => {
                write!(f, "operation not valid in phase {phase}")
            }
            Self::NothingHere => write!(f, "nothing to interact with here"),
            Self::AlreadyResolved => write!(f, "this marker is already resolved"),
            Self::InsufficientResource => write!(f, "you need a rope to attempt a rescue"),
            Self::OptionLocked => write!(f, "that option requires a clue you haven't found"),
            Self::UnknownOption => write!(f, "unknown decision option"),
        }
    }
}

impl std::error::Error for MissionError {}

/// What a successful `move_player` did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Moved (possibly clamped at a grid edge); the mission continues.
    Moved { pos: GridPos },
    /// Moved, and the step spent the last action point — phase is now
    /// `GameOver`.
    MovedAndExhausted { pos: GridPos },
}

/// What a successful `interact` did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InteractOutcome {
    /// A new clue was recorded. `decision_unlocked` reports whether the
    /// critical threshold was reached by this clue.
    ClueFound {
        clue_id: String,
        decision_unlocked: bool,
    },
    /// A clue was recorded but the interaction spent the last action point
    /// before the threshold — phase is now `GameOver`.
    ClueFoundAndExhausted { clue_id: String },
    /// A rescue succeeded: one rope spent, bonus action points granted.
    Rescued { ap_reward: i32 },
}

/// Live state of one mission run.
///
/// Invariants: the player stays within the level grid; action points never
/// go negative while the mission is playable; `found_clues` holds distinct
/// ids in discovery order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissionState {
    pub phase: Phase,
    pub player: GridPos,
    pub action_points: i32,
    pub resources: crate::level::Resources,
    pub found_clues: Vec<String>,
    pub resolved_markers: BTreeSet<String>,
    pub log: Vec<String>,
    pub outcome_message: Option<String>,
}

/// Board-style cell name: row letter from `y`, column number from `x`.
fn cell_name(pos: GridPos) -> String {
    let row = (b'A' + pos.y as u8) as char;
    format!("{}{}", row, pos.x + 1)
}

impl MissionState {
    /// Fresh state for a level. Starts in the tutorial unless it has
    /// already been seen.
    pub fn new(level: &LevelDef, tutorial_seen: bool) -> Self {
        let phase = if tutorial_seen {
            Phase::Investigation
        } else {
            Phase::Tutorial
        };
        Self {
            phase,
            player: GridPos { x: 0, y: 0 },
            action_points: level.initial_ap,
            resources: level.initial_resources,
            found_clues: Vec::new(),
            resolved_markers: BTreeSet::new(),
            log: vec![level.briefing.clone()],
            outcome_message: None,
        }
    }

    fn push_log(&mut self, entry: String) {
        self.log.push(entry);
        if self.log.len() > LOG_CAP {
            self.log.remove(0);
        }
    }

    fn require_phase(&self, want: Phase) -> Result<(), MissionError> {
        if self.phase == want {
            Ok(())
        } else {
            Err(MissionError::InvalidPhase { phase: self.phase })
        }
    }

    fn fail_exhausted(&mut self) {
        self.phase = Phase::GameOver;
        self.outcome_message = Some(EXHAUSTION_MESSAGE.to_string());
        self.push_log(EXHAUSTION_MESSAGE.to_string());
    }

    /// Leave the tutorial and begin the investigation.
    pub fn dismiss_tutorial(&mut self) -> Result<(), MissionError> {
        self.require_phase(Phase::Tutorial)?;
        self.phase = Phase::Investigation;
        self.push_log("Tutorial closed. Begin your mission!".to_string());
        Ok(())
    }

    /// Move the player by one step, clamped to the grid.
    ///
    /// Out-of-bounds deltas clamp silently rather than reject, and a
    /// clamped move still costs its action point.
    pub fn move_player(
        &mut self,
        level: &LevelDef,
        dx: i32,
        dy: i32,
    ) -> Result<MoveOutcome, MissionError> {
        self.require_phase(Phase::Investigation)?;
        self.player = GridPos {
            x: (self.player.x + dx).clamp(0, level.grid_size - 1),
            y: (self.player.y + dy).clamp(0, level.grid_size - 1),
        };
        self.action_points -= ap::MOVE_COST;
        self.push_log(format!("Moved to {}. (-1 AP)", cell_name(self.player)));
        if self.action_points <= 0 {
            self.fail_exhausted();
            return Ok(MoveOutcome::MovedAndExhausted { pos: self.player });
        }
        Ok(MoveOutcome::Moved { pos: self.player })
    }

    /// Interact with the marker at the player's current position.
    ///
    /// Failed attempts — no marker underfoot, an already-resolved marker,
    /// or a rescue without ropes — are free.
    pub fn interact(&mut self, level: &LevelDef) -> Result<InteractOutcome, MissionError> {
        self.require_phase(Phase::Investigation)?;
        let marker = level
            .marker_at(self.player)
            .ok_or(MissionError::NothingHere)?;
        if self.resolved_markers.contains(&marker.id) {
            return Err(MissionError::AlreadyResolved);
        }
        match &marker.kind {
            MarkerKind::Clue { clue_id } => {
                self.action_points -= ap::INTERACT_COST;
                self.resolved_markers.insert(marker.id.clone());
                if !self.found_clues.iter().any(|c| c == clue_id) {
                    self.found_clues.push(clue_id.clone());
                }
                self.push_log(format!("CLUE FOUND: {}", marker.description));
                // The threshold outranks exhaustion: reaching the decision
                // phase needs no action points.
                if self.found_clues.len() >= level.critical_clues_needed {
                    self.push_log(INTEL_MESSAGE.to_string());
                    self.phase = Phase::Decision;
                    return Ok(InteractOutcome::ClueFound {
                        clue_id: clue_id.clone(),
                        decision_unlocked: true,
                    });
                }
                if self.action_points <= 0 {
                    self.fail_exhausted();
                    return Ok(InteractOutcome::ClueFoundAndExhausted {
                        clue_id: clue_id.clone(),
                    });
                }
                Ok(InteractOutcome::ClueFound {
                    clue_id: clue_id.clone(),
                    decision_unlocked: false,
                })
            }
            MarkerKind::Rescue => {
                if self.resources.ropes == 0 {
                    return Err(MissionError::InsufficientResource);
                }
                self.resources.ropes -= 1;
                // Cost and reward apply as one net change, so a successful
                // rescue can never strand the mission at zero.
                self.action_points += ap::RESCUE_REWARD - ap::INTERACT_COST;
                self.resolved_markers.insert(marker.id.clone());
                self.push_log(
                    "Used 1 rope. Civilian rescued! You gained 5 AP for your quick action."
                        .to_string(),
                );
                Ok(InteractOutcome::Rescued {
                    ap_reward: ap::RESCUE_REWARD,
                })
            }
        }
    }

    /// Choose a decision option. Every option ends the mission.
    pub fn decide<'a>(
        &mut self,
        level: &'a LevelDef,
        option_id: &str,
    ) -> Result<&'a crate::level::DecisionOption, MissionError> {
        self.require_phase(Phase::Decision)?;
        let option = level
            .decisions
            .iter()
            .find(|o| o.id == option_id)
            .ok_or(MissionError::UnknownOption)?;
        if let Some(required) = &option.required_clue {
            if !self.found_clues.iter().any(|c| c == required) {
                return Err(MissionError::OptionLocked);
            }
        }
        self.phase = Phase::GameOver;
        self.outcome_message = Some(option.outcome_message.clone());
        self.push_log(option.outcome_message.clone());
        Ok(option)
    }

    /// Reset to the level's initial configuration and return to the
    /// investigation phase. The tutorial is not replayed.
    pub fn restart(&mut self, level: &LevelDef) {
        *self = Self::new(level, true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::{DecisionOption, GridMarker, LevelDef, Resources};

    fn test_level() -> LevelDef {
        LevelDef::the_deluge()
    }

    fn started(level: &LevelDef) -> MissionState {
        MissionState::new(level, true)
    }

    /// Walk the player to a target cell, asserting the mission stays
    /// playable on the way.
    fn walk_to(state: &mut MissionState, level: &LevelDef, x: i32, y: i32) {
        while state.player.x != x || state.player.y != y {
            let dx = (x - state.player.x).signum();
            let dy = (y - state.player.y).signum();
            let outcome = state.move_player(level, dx, dy).expect("move");
            assert!(matches!(outcome, MoveOutcome::Moved { .. }));
        }
    }

    // ── Phase gating ────────────────────────────────────────────────────

    #[test]
    fn starts_in_tutorial_on_first_run() {
        let level = test_level();
        let state = MissionState::new(&level, false);
        assert_eq!(state.phase, Phase::Tutorial);
        assert_eq!(state.log, vec![level.briefing.clone()]);
    }

    #[test]
    fn tutorial_blocks_moves() {
        let level = test_level();
        let mut state = MissionState::new(&level, false);
        let err = state.move_player(&level, 1, 0).unwrap_err();
        assert_eq!(
            err,
            MissionError::InvalidPhase {
                phase: Phase::Tutorial
            }
        );
        assert_eq!(state.action_points, level.initial_ap);
    }

    #[test]
    fn dismiss_tutorial_starts_investigation() {
        let level = test_level();
        let mut state = MissionState::new(&level, false);
        state.dismiss_tutorial().unwrap();
        assert_eq!(state.phase, Phase::Investigation);
        assert_eq!(state.dismiss_tutorial(), Err(MissionError::InvalidPhase {
            phase: Phase::Investigation
        }));
    }

    // ── Movement ────────────────────────────────────────────────────────

    #[test]
    fn move_clamps_at_origin_and_still_costs() {
        let level = test_level();
        let mut state = started(&level);
        let outcome = state.move_player(&level, -1, -1).unwrap();
        assert_eq!(
            outcome,
            MoveOutcome::Moved {
                pos: GridPos { x: 0, y: 0 }
            }
        );
        assert_eq!(state.player, GridPos { x: 0, y: 0 });
        assert_eq!(state.action_points, level.initial_ap - 1);
    }

    #[test]
    fn move_clamps_at_far_edge() {
        let level = test_level();
        let mut state = started(&level);
        state.player = GridPos { x: 9, y: 9 };
        state.move_player(&level, 5, 5).unwrap();
        assert_eq!(state.player, GridPos { x: 9, y: 9 });
    }

    #[test]
    fn move_logs_cell_name() {
        let level = test_level();
        let mut state = started(&level);
        state.move_player(&level, 1, 0).unwrap();
        assert_eq!(state.log.last().unwrap(), "Moved to A2. (-1 AP)");
        state.move_player(&level, 0, 1).unwrap();
        assert_eq!(state.log.last().unwrap(), "Moved to B2. (-1 AP)");
    }

    #[test]
    fn last_action_point_ends_the_mission() {
        let level = test_level();
        let mut state = started(&level);
        state.action_points = 1;
        let outcome = state.move_player(&level, 1, 0).unwrap();
        assert!(matches!(outcome, MoveOutcome::MovedAndExhausted { .. }));
        assert_eq!(state.phase, Phase::GameOver);
        assert_eq!(state.action_points, 0);
        assert_eq!(
            state.outcome_message.as_deref(),
            Some(EXHAUSTION_MESSAGE)
        );
        // Terminal: nothing else is accepted.
        assert!(state.move_player(&level, 1, 0).is_err());
        assert!(state.interact(&level).is_err());
    }

    // ── Interaction ─────────────────────────────────────────────────────

    #[test]
    fn interact_on_empty_cell_is_free_rejection() {
        let level = test_level();
        let mut state = started(&level);
        assert_eq!(state.interact(&level), Err(MissionError::NothingHere));
        assert_eq!(state.action_points, level.initial_ap);
    }

    #[test]
    fn first_clue_keeps_investigating_second_unlocks_decision() {
        let level = test_level();
        let mut state = started(&level);

        walk_to(&mut state, &level, 2, 5);
        let outcome = state.interact(&level).unwrap();
        assert_eq!(
            outcome,
            InteractOutcome::ClueFound {
                clue_id: "PIPE_FRACTURE".to_string(),
                decision_unlocked: false,
            }
        );
        assert_eq!(state.phase, Phase::Investigation);

        walk_to(&mut state, &level, 7, 2);
        let outcome = state.interact(&level).unwrap();
        assert_eq!(
            outcome,
            InteractOutcome::ClueFound {
                clue_id: "FOUNDATION_CRACKS".to_string(),
                decision_unlocked: true,
            }
        );
        assert_eq!(state.phase, Phase::Decision);
        assert!(state.action_points > 0, "threshold fired with AP to spare");
    }

    #[test]
    fn resolved_clue_cannot_be_reinteracted() {
        let level = test_level();
        let mut state = started(&level);
        walk_to(&mut state, &level, 2, 5);
        state.interact(&level).unwrap();
        let ap_after = state.action_points;
        assert_eq!(state.interact(&level), Err(MissionError::AlreadyResolved));
        assert_eq!(state.action_points, ap_after);
        assert_eq!(state.found_clues.len(), 1);
    }

    #[test]
    fn rescue_spends_rope_and_nets_bonus() {
        let level = test_level();
        let mut state = started(&level);
        walk_to(&mut state, &level, 5, 7);
        let before = state.action_points;
        let outcome = state.interact(&level).unwrap();
        assert_eq!(outcome, InteractOutcome::Rescued { ap_reward: 5 });
        assert_eq!(state.resources.ropes, 0);
        assert_eq!(state.action_points, before + 4);
    }

    #[test]
    fn rescue_without_rope_is_free_rejection() {
        let level = test_level();
        let mut state = started(&level);
        state.resources.ropes = 0;
        walk_to(&mut state, &level, 5, 7);
        let before = state.action_points;
        assert_eq!(
            state.interact(&level),
            Err(MissionError::InsufficientResource)
        );
        assert_eq!(state.action_points, before);
        assert!(state.resolved_markers.is_empty());
    }

    #[test]
    fn rescue_at_one_ap_keeps_mission_alive() {
        let level = test_level();
        let mut state = started(&level);
        walk_to(&mut state, &level, 5, 7);
        state.action_points = 1;
        state.interact(&level).unwrap();
        assert_eq!(state.phase, Phase::Investigation);
        assert_eq!(state.action_points, 5);
    }

    #[test]
    fn clue_on_last_ap_before_threshold_ends_mission() {
        let level = test_level();
        let mut state = started(&level);
        walk_to(&mut state, &level, 2, 5);
        state.action_points = 1;
        let outcome = state.interact(&level).unwrap();
        assert_eq!(
            outcome,
            InteractOutcome::ClueFoundAndExhausted {
                clue_id: "PIPE_FRACTURE".to_string()
            }
        );
        assert_eq!(state.phase, Phase::GameOver);
    }

    #[test]
    fn threshold_clue_on_last_ap_still_reaches_decision() {
        let level = test_level();
        let mut state = started(&level);
        walk_to(&mut state, &level, 2, 5);
        state.interact(&level).unwrap();
        walk_to(&mut state, &level, 7, 2);
        state.action_points = 1;
        let outcome = state.interact(&level).unwrap();
        assert!(matches!(
            outcome,
            InteractOutcome::ClueFound {
                decision_unlocked: true,
                ..
            }
        ));
        assert_eq!(state.phase, Phase::Decision);
    }

    // ── Decisions ───────────────────────────────────────────────────────

    fn state_in_decision(level: &LevelDef) -> MissionState {
        let mut state = started(level);
        walk_to(&mut state, level, 2, 5);
        state.interact(level).unwrap();
        walk_to(&mut state, level, 7, 2);
        state.interact(level).unwrap();
        assert_eq!(state.phase, Phase::Decision);
        state
    }

    #[test]
    fn locked_option_rejected_without_transition() {
        let level = test_level();
        let mut state = state_in_decision(&level);
        state.found_clues.retain(|c| c != "PIPE_FRACTURE");
        assert_eq!(state.decide(&level, "d3"), Err(MissionError::OptionLocked));
        assert_eq!(state.phase, Phase::Decision);
    }

    #[test]
    fn unlocked_option_ends_the_mission() {
        let level = test_level();
        let mut state = state_in_decision(&level);
        let option = state.decide(&level, "d3").unwrap();
        assert!(option.outcome_message.contains("MISSION COMPLETE"));
        assert_eq!(state.phase, Phase::GameOver);
        assert_eq!(
            state.outcome_message.as_deref(),
            Some(option.outcome_message.as_str())
        );
    }

    #[test]
    fn clue_free_option_always_selectable() {
        let level = test_level();
        let mut state = state_in_decision(&level);
        let option = state.decide(&level, "d1").unwrap();
        assert!(option.outcome_message.contains("MISSION FAILED"));
        assert_eq!(state.phase, Phase::GameOver);
    }

    #[test]
    fn unknown_option_rejected() {
        let level = test_level();
        let mut state = state_in_decision(&level);
        assert_eq!(
            state.decide(&level, "d99"),
            Err(MissionError::UnknownOption)
        );
        assert_eq!(state.phase, Phase::Decision);
    }

    #[test]
    fn decide_outside_decision_phase_rejected() {
        let level = test_level();
        let mut state = started(&level);
        assert_eq!(
            state.decide(&level, "d1"),
            Err(MissionError::InvalidPhase {
                phase: Phase::Investigation
            })
        );
    }

    // ── Restart ─────────────────────────────────────────────────────────

    #[test]
    fn restart_reproduces_fresh_state() {
        let level = test_level();
        let mut state = started(&level);
        walk_to(&mut state, &level, 2, 5);
        state.interact(&level).unwrap();
        walk_to(&mut state, &level, 5, 7);
        state.interact(&level).unwrap();

        state.restart(&level);
        assert_eq!(state, MissionState::new(&level, true));
        assert_eq!(state.log, vec![level.briefing.clone()]);
    }

    // ── Log window ──────────────────────────────────────────────────────

    #[test]
    fn log_drops_oldest_past_cap() {
        let level = test_level();
        let mut state = started(&level);
        state.action_points = 1_000;
        for _ in 0..150 {
            state.move_player(&level, 1, 0).unwrap();
        }
        assert_eq!(state.log.len(), crate::constants::LOG_CAP);
        assert!(!state.log.contains(&level.briefing));
    }

    // ── Degenerate levels ───────────────────────────────────────────────

    #[test]
    fn single_cell_grid_clamps_everywhere() {
        let level = LevelDef {
            name: "Box".to_string(),
            grid_size: 1,
            initial_ap: 3,
            initial_resources: Resources {
                ropes: 0,
                sandbags: 0,
                drones: 0,
            },
            briefing: "Stay put.".to_string(),
            markers: vec![GridMarker {
                id: "c1".to_string(),
                name: "Note".to_string(),
                description: "A note under your feet.".to_string(),
                pos: GridPos { x: 0, y: 0 },
                kind: MarkerKind::Clue {
                    clue_id: "NOTE".to_string(),
                },
            }],
            decision_title: "Now what?".to_string(),
            decisions: vec![DecisionOption {
                id: "d1".to_string(),
                text: "Leave".to_string(),
                required_clue: Some("NOTE".to_string()),
                outcome_message: "You leave.".to_string(),
            }],
            critical_clues_needed: 1,
        };
        assert!(crate::level::validate(&level).is_empty());
        let mut state = MissionState::new(&level, true);
        state.move_player(&level, 3, -7).unwrap();
        assert_eq!(state.player, GridPos { x: 0, y: 0 });
        state.interact(&level).unwrap();
        assert_eq!(state.phase, Phase::Decision);
        state.decide(&level, "d1").unwrap();
        assert_eq!(state.phase, Phase::GameOver);
    }
}
