//! Level definitions for the disaster-investigation missions.
//!
//! A level is static, externally supplied configuration: grid size, the
//! action-point budget, starting resources, tagged grid markers, and the
//! decision table. The state machine reads it and never mutates it.
//!
//! Structural checks take the same shape as the record checks elsewhere:
//! each returns a list of errors rather than failing on the first defect,
//! so a whole catalog can be audited in one pass.

use serde::{Deserialize, Serialize};

/// A grid coordinate. (0,0) is the top-left cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridPos {
    pub x: i32,
    pub y: i32,
}

/// What a marked cell does when interacted with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MarkerKind {
    /// A discoverable fact; `clue_id` feeds the decision table.
    Clue { clue_id: String },
    /// A trapped civilian — costs a rope, grants bonus action points.
    Rescue,
}

/// A static marker placed on the level grid. At most one per cell;
/// resolved at most once per mission run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridMarker {
    pub id: String,
    pub name: String,
    pub description: String,
    pub pos: GridPos,
    #[serde(flatten)]
    pub kind: MarkerKind,
}

/// Consumable resources available during a mission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resources {
    pub ropes: u32,
    pub sandbags: u32,
    pub drones: u32,
}

/// One entry in the level's decision table. Every option is terminal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionOption {
    pub id: String,
    pub text: String,
    /// When set, the option is locked until this clue has been found.
    pub required_clue: Option<String>,
    pub outcome_message: String,
}

/// A complete playable investigation scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelDef {
    pub name: String,
    pub grid_size: i32,
    pub initial_ap: i32,
    pub initial_resources: Resources,
    pub briefing: String,
    pub markers: Vec<GridMarker>,
    pub decision_title: String,
    pub decisions: Vec<DecisionOption>,
    pub critical_clues_needed: usize,
}

impl LevelDef {
    /// The marker occupying `pos`, if any.
    pub fn marker_at(&self, pos: GridPos) -> Option<&GridMarker> {
        self.markers.iter().find(|m| m.pos == pos)
    }

    /// Number of distinct clue ids among the level's markers.
    pub fn distinct_clue_count(&self) -> usize {
        let mut seen: Vec<&str> = Vec::new();
        for m in &self.markers {
            if let MarkerKind::Clue { clue_id } = &m.kind {
                if !seen.contains(&clue_id.as_str()) {
                    seen.push(clue_id);
                }
            }
        }
        seen.len()
    }

    /// The first shipped scenario — a burst water main flooding a district.
    pub fn the_deluge() -> Self {
        Self {
            name: "The Deluge".to_string(),
            grid_size: 10,
            initial_ap: 30,
            initial_resources: Resources {
                ropes: 1,
                sandbags: 2,
                drones: 1,
            },
            briefing: "A critical pipe has burst, and the pumping station is failing. \
                       Find the cause before the district is completely flooded!"
                .to_string(),
            markers: vec![
                GridMarker {
                    id: "c1".to_string(),
                    name: "Damaged Pipe".to_string(),
                    description: "This is the main water pipe. It has a massive structural \
                                  fracture!"
                        .to_string(),
                    pos: GridPos { x: 2, y: 5 },
                    kind: MarkerKind::Clue {
                        clue_id: "PIPE_FRACTURE".to_string(),
                    },
                },
                GridMarker {
                    id: "c2".to_string(),
                    name: "Pumping Station".to_string(),
                    description: "The station is offline. An engineering memo indicates \
                                  foundation cracks."
                        .to_string(),
                    pos: GridPos { x: 7, y: 2 },
                    kind: MarkerKind::Clue {
                        clue_id: "FOUNDATION_CRACKS".to_string(),
                    },
                },
                GridMarker {
                    id: "r1".to_string(),
                    name: "Trapped Civilian".to_string(),
                    description: "A civilian is trapped by rising water!".to_string(),
                    pos: GridPos { x: 5, y: 7 },
                    kind: MarkerKind::Rescue,
                },
            ],
            decision_title: "How do you stop the flood?".to_string(),
            decisions: vec![
                DecisionOption {
                    id: "d1".to_string(),
                    text: "Deploy Sandbags at the Riverbank".to_string(),
                    required_clue: None,
                    outcome_message: "The sandbags slow the water, but it's not enough. The \
                                      district suffers moderate damage. MISSION FAILED."
                        .to_string(),
                },
                DecisionOption {
                    id: "d2".to_string(),
                    text: "Reinforce Pumping Station Foundation".to_string(),
                    required_clue: Some("FOUNDATION_CRACKS".to_string()),
                    outcome_message: "You reinforce the foundation, but the main pipe is \
                                      still broken! MISSION FAILED."
                        .to_string(),
                },
                DecisionOption {
                    id: "d3".to_string(),
                    text: "Divert Water & Patch Main Pipe".to_string(),
                    required_clue: Some("PIPE_FRACTURE".to_string()),
                    outcome_message: "By patching the pipe, you stop the source of the \
                                      flood! The city is safe. MISSION COMPLETE!"
                        .to_string(),
                },
            ],
            critical_clues_needed: 2,
        }
    }
}

// ── Validation ──────────────────────────────────────────────────────────

/// A level validation finding.
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub category: &'static str,
    pub severity: Severity,
    pub message: String,
}

/// Finding severity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Severity {
    Error,
    Warning,
}

/// Check the grid dimensions and action-point budget.
pub fn check_grid(level: &LevelDef) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    if level.grid_size <= 0 {
        errors.push(ValidationError {
            category: "grid",
            severity: Severity::Error,
            message: format!("'{}' has non-positive grid size {}", level.name, level.grid_size),
        });
    }
    if level.grid_size > 26 {
        // Cell names use a single row letter A-Z.
        errors.push(ValidationError {
            category: "grid",
            severity: Severity::Warning,
            message: format!(
                "'{}' grid size {} exceeds the 26 nameable rows",
                level.name, level.grid_size
            ),
        });
    }
    if level.initial_ap <= 0 {
        errors.push(ValidationError {
            category: "grid",
            severity: Severity::Error,
            message: format!(
                "'{}' has non-positive action-point budget {}",
                level.name, level.initial_ap
            ),
        });
    }
    errors
}

/// Check that markers sit inside the grid, one per cell, unique ids.
pub fn check_markers(level: &LevelDef) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    for m in &level.markers {
        let in_bounds = (0..level.grid_size).contains(&m.pos.x)
            && (0..level.grid_size).contains(&m.pos.y);
        if !in_bounds {
            errors.push(ValidationError {
                category: "markers",
                severity: Severity::Error,
                message: format!(
                    "marker '{}' at ({},{}) is outside the {}x{} grid",
                    m.id, m.pos.x, m.pos.y, level.grid_size, level.grid_size
                ),
            });
        }
    }
    for (i, a) in level.markers.iter().enumerate() {
        for b in level.markers.iter().skip(i + 1) {
            if a.pos == b.pos {
                errors.push(ValidationError {
                    category: "markers",
                    severity: Severity::Error,
                    message: format!(
                        "markers '{}' and '{}' share cell ({},{})",
                        a.id, b.id, a.pos.x, a.pos.y
                    ),
                });
            }
            if a.id == b.id {
                errors.push(ValidationError {
                    category: "markers",
                    severity: Severity::Error,
                    message: format!("duplicate marker id '{}'", a.id),
                });
            }
        }
    }
    errors
}

/// Check the decision table: non-empty, unique ids, clue references resolve.
pub fn check_decisions(level: &LevelDef) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    if level.decisions.is_empty() {
        errors.push(ValidationError {
            category: "decisions",
            severity: Severity::Error,
            message: format!("'{}' has no decision options", level.name),
        });
    }
    for (i, a) in level.decisions.iter().enumerate() {
        for b in level.decisions.iter().skip(i + 1) {
            if a.id == b.id {
                errors.push(ValidationError {
                    category: "decisions",
                    severity: Severity::Error,
                    message: format!("duplicate decision id '{}'", a.id),
                });
            }
        }
    }
    let clue_ids: Vec<&str> = level
        .markers
        .iter()
        .filter_map(|m| match &m.kind {
            MarkerKind::Clue { clue_id } => Some(clue_id.as_str()),
            MarkerKind::Rescue => None,
        })
        .collect();
    for d in &level.decisions {
        if let Some(required) = &d.required_clue {
            if !clue_ids.contains(&required.as_str()) {
                errors.push(ValidationError {
                    category: "decisions",
                    severity: Severity::Error,
                    message: format!(
                        "decision '{}' requires unknown clue '{}'",
                        d.id, required
                    ),
                });
            }
        }
    }
    errors
}

/// Check that the clue threshold is achievable.
pub fn check_clue_threshold(level: &LevelDef) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let available = level.distinct_clue_count();
    if level.critical_clues_needed > available {
        errors.push(ValidationError {
            category: "threshold",
            severity: Severity::Error,
            message: format!(
                "'{}' needs {} critical clues but only {} are placed",
                level.name, level.critical_clues_needed, available
            ),
        });
    }
    if level.critical_clues_needed == 0 {
        errors.push(ValidationError {
            category: "threshold",
            severity: Severity::Warning,
            message: format!("'{}' unlocks its decision phase with zero clues", level.name),
        });
    }
    errors
}

/// Run all level checks and return combined findings.
pub fn validate(level: &LevelDef) -> Vec<ValidationError> {
    let mut all = Vec::new();
    all.extend(check_grid(level));
    all.extend(check_markers(level));
    all.extend(check_decisions(level));
    all.extend(check_clue_threshold(level));
    all
}
