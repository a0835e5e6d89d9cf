//! EcoQuest Headless Validation Harness
//!
//! Validates pure game logic and shipped data without any UI or device.
//! Runs entirely in-process — no camera, no GPS, no rendering.
//!
//! Usage:
//!   cargo run -p ecoquest-simtest
//!   cargo run -p ecoquest-simtest -- --verbose

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use ecoquest_core::capture::{
    run_capture, CaptureError, CaptureOutcome, LocationSource, PhotoCamera, PlantClassifier,
};
use ecoquest_core::mission::MissionEngine;
use ecoquest_core::registry::{Observation, PlantRegistry};
use ecoquest_core::store::MemoryStore;
use ecoquest_logic::carbon::{self, EcoActions};
use ecoquest_logic::geo::{self, GeoPoint};
use ecoquest_logic::level::{self, LevelDef, Severity};
use ecoquest_logic::mission::{MissionState, Phase};

// ── Level catalog (same JSON a client would ship) ───────────────────────
const LEVELS_JSON: &str = include_str!("../../../data/levels.json");

// ~111,195 m per degree of latitude on the 6,371 km sphere.
const DEG_PER_METER_LAT: f64 = 1.0 / 111_194.93;

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

fn main() {
    env_logger::init();
    let verbose = std::env::args().any(|a| a == "--verbose");
    println!("=== EcoQuest Validation Harness ===\n");

    let mut results = Vec::new();

    // 1. Level catalog validation
    results.extend(validate_level_catalog(verbose));

    // 2. Geofence distance sweep
    results.extend(validate_geofence(verbose));

    // 3. Registry flow
    results.extend(validate_registry_flow(verbose));

    // 4. Capture flow collaborators
    results.extend(validate_capture_flow(verbose));

    // 5. Scripted mission playthrough
    results.extend(validate_mission_playthrough(verbose));

    // 6. Random-walk mission invariants
    results.extend(validate_mission_random_walks(verbose));

    // 7. Carbon calculator
    results.extend(validate_carbon(verbose));

    // ── Summary ──
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.iter().filter(|r| !r.passed).count();
    let total = results.len();

    for r in &results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    println!(
        "\n=== RESULT: {}/{} passed, {} failed ===",
        passed, total, failed
    );

    if failed > 0 {
        std::process::exit(1);
    }
}

// ── 1. Level catalog ────────────────────────────────────────────────────

fn validate_level_catalog(verbose: bool) -> Vec<TestResult> {
    println!("--- Level Catalog ---");
    let mut results = Vec::new();

    let catalog: Vec<LevelDef> = match serde_json::from_str(LEVELS_JSON) {
        Ok(c) => c,
        Err(e) => {
            results.push(TestResult {
                name: "catalog_parse".into(),
                passed: false,
                detail: format!("JSON parse error: {}", e),
            });
            return results;
        }
    };

    results.push(TestResult {
        name: "catalog_not_empty".into(),
        passed: !catalog.is_empty(),
        detail: format!("{} levels loaded", catalog.len()),
    });

    // Every shipped level passes structural validation.
    let mut error_count = 0;
    for lvl in &catalog {
        let findings = level::validate(lvl);
        let errors: Vec<_> = findings
            .iter()
            .filter(|f| f.severity == Severity::Error)
            .collect();
        error_count += errors.len();
        if verbose {
            println!(
                "  level '{}': {} markers, {} decisions, {} findings",
                lvl.name,
                lvl.markers.len(),
                lvl.decisions.len(),
                findings.len()
            );
        }
        for e in errors {
            println!("    [{}] {}", e.category, e.message);
        }
    }
    results.push(TestResult {
        name: "catalog_levels_valid".into(),
        passed: error_count == 0,
        detail: format!("{} structural errors across catalog", error_count),
    });

    // The first catalog entry must agree with the built-in scenario.
    let builtin = LevelDef::the_deluge();
    let first_matches = catalog.first() == Some(&builtin);
    results.push(TestResult {
        name: "catalog_matches_builtin".into(),
        passed: first_matches,
        detail: if first_matches {
            "catalog[0] == LevelDef::the_deluge()".into()
        } else {
            "catalog[0] drifted from the built-in level".into()
        },
    });

    // Every level must offer at least one decision that needs no clue,
    // so the decision phase can never dead-end.
    let all_have_fallback = catalog
        .iter()
        .all(|l| l.decisions.iter().any(|d| d.required_clue.is_none()));
    results.push(TestResult {
        name: "catalog_fallback_decision".into(),
        passed: all_have_fallback,
        detail: "every level has a clue-free decision option".into(),
    });

    results
}

// ── 2. Geofence ─────────────────────────────────────────────────────────

fn validate_geofence(_verbose: bool) -> Vec<TestResult> {
    println!("--- Geofence & Distance ---");
    let mut results = Vec::new();

    let origin = GeoPoint {
        latitude: 0.0,
        longitude: 0.0,
    };
    let north = |m: f64| GeoPoint {
        latitude: m * DEG_PER_METER_LAT,
        longitude: 0.0,
    };

    // Symmetry and identity
    let a = GeoPoint {
        latitude: 12.9716,
        longitude: 77.5946,
    };
    let b = GeoPoint {
        latitude: 12.2958,
        longitude: 76.6394,
    };
    let symmetric = (geo::distance_meters(a, b) - geo::distance_meters(b, a)).abs() < 1e-9;
    let identity = geo::distance_meters(a, a) == 0.0;
    results.push(TestResult {
        name: "geo_symmetry_identity".into(),
        passed: symmetric && identity,
        detail: format!("d(a,b)={:.1}m, d(a,a)=0", geo::distance_meters(a, b)),
    });

    // Threshold behavior at the 3m matching radius
    let inside = geo::distance_meters(origin, north(2.9));
    let outside = geo::distance_meters(origin, north(3.1));
    results.push(TestResult {
        name: "geo_threshold_calibration".into(),
        passed: inside < 3.0 && outside > 3.0,
        detail: format!("2.9m delta → {:.3}m, 3.1m delta → {:.3}m", inside, outside),
    });

    // Monotonic growth over a sweep
    let mut monotonic = true;
    let mut prev = -1.0;
    for m in [0.0, 0.5, 1.0, 2.0, 3.0, 10.0, 100.0, 10_000.0] {
        let d = geo::distance_meters(origin, north(m));
        if d <= prev {
            monotonic = false;
        }
        prev = d;
    }
    results.push(TestResult {
        name: "geo_monotonic_sweep".into(),
        passed: monotonic,
        detail: "distance grows with separation over 8 steps".into(),
    });

    // Nearest-within picks minimum distance, not insertion order
    let candidates = vec![north(2.8), north(1.2), north(2.9)];
    let nearest = geo::nearest_within(origin, candidates, 3.0);
    results.push(TestResult {
        name: "geo_nearest_wins".into(),
        passed: matches!(nearest, Some((1, _))),
        detail: format!("nearest of three in-range candidates: {:?}", nearest),
    });

    results
}

// ── 3. Registry flow ────────────────────────────────────────────────────

fn validate_registry_flow(_verbose: bool) -> Vec<TestResult> {
    println!("--- Plant Registry ---");
    let mut results = Vec::new();

    let north = |m: f64| GeoPoint {
        latitude: m * DEG_PER_METER_LAT,
        longitude: 0.0,
    };

    let mut store = MemoryStore::new();
    {
        let mut registry = match PlantRegistry::open(&mut store) {
            Ok(r) => r,
            Err(e) => {
                results.push(TestResult {
                    name: "registry_open".into(),
                    passed: false,
                    detail: format!("open failed: {}", e),
                });
                return results;
            }
        };

        // First observation anywhere is a new candidate.
        let obs = registry
            .record_observation(north(0.0), "origin.jpg", 1_000)
            .expect("store");
        results.push(TestResult {
            name: "registry_first_is_candidate".into(),
            passed: matches!(obs, Observation::NewCandidate { .. }),
            detail: format!("{:?}", obs),
        });

        registry
            .register("Sunny", "Sunflower", "origin.jpg", north(0.0), 1_000)
            .expect("store");
        registry
            .register("Mossy", "Fern", "fern.jpg", north(50.0), 2_000)
            .expect("store");

        // 2m north of Sunny: check-in against Sunny, not Mossy.
        let obs = registry
            .record_observation(north(2.0), "revisit.jpg", 3_000)
            .expect("store");
        let hit_sunny = matches!(&obs, Observation::CheckIn { nickname, points, .. }
            if nickname == "Sunny" && *points == 10);
        results.push(TestResult {
            name: "registry_check_in_nearest".into(),
            passed: hit_sunny,
            detail: format!("{:?}", obs),
        });

        // 25 + 10 after one check-in.
        let total = registry.plants()[0].total_points();
        results.push(TestResult {
            name: "registry_point_total".into(),
            passed: total == 35,
            detail: format!("total after 1 check-in = {}", total),
        });

        // 10m away from everything: candidate again, nothing mutated.
        let obs = registry
            .record_observation(north(10.0), "far.jpg", 4_000)
            .expect("store");
        results.push(TestResult {
            name: "registry_gap_is_candidate".into(),
            passed: matches!(obs, Observation::NewCandidate { .. })
                && registry.plants()[0].check_ins.len() == 1,
            detail: "no plant in range, history untouched".into(),
        });

        // Removal drops the record and its history.
        let removed = registry.remove("1000").expect("store");
        results.push(TestResult {
            name: "registry_remove".into(),
            passed: removed && registry.plants().len() == 1,
            detail: format!("{} plants remain", registry.plants().len()),
        });
    }

    // The snapshot survives a reopen.
    let registry = PlantRegistry::open(&mut store).expect("reopen");
    results.push(TestResult {
        name: "registry_snapshot_roundtrip".into(),
        passed: registry.plants().len() == 1 && registry.plants()[0].nickname == "Mossy",
        detail: format!("reopened with {} plants", registry.plants().len()),
    });

    results
}

// ── 4. Capture flow ─────────────────────────────────────────────────────

struct ScriptedCamera(Option<String>);
impl PhotoCamera for ScriptedCamera {
    fn capture(&mut self) -> Option<String> {
        self.0.clone()
    }
}

struct ScriptedClassifier {
    verdict: Option<bool>, // None = transport failure
}
impl PlantClassifier for ScriptedClassifier {
    fn is_plant(&mut self, _photo: &str) -> Result<bool, CaptureError> {
        self.verdict
            .ok_or_else(|| CaptureError::Classifier("prediction server unreachable".into()))
    }
}

struct ScriptedLocator(Option<GeoPoint>);
impl LocationSource for ScriptedLocator {
    fn current_fix(&mut self) -> Result<GeoPoint, CaptureError> {
        self.0.ok_or(CaptureError::LocationUnavailable)
    }
}

fn validate_capture_flow(_verbose: bool) -> Vec<TestResult> {
    println!("--- Capture Flow ---");
    let mut results = Vec::new();

    let origin = GeoPoint {
        latitude: 0.0,
        longitude: 0.0,
    };
    let mut registry = PlantRegistry::open(MemoryStore::new()).expect("open");

    // Cancelled capture: silent no-op.
    let outcome = run_capture(
        &mut registry,
        &mut ScriptedCamera(None),
        &mut ScriptedClassifier { verdict: Some(true) },
        &mut ScriptedLocator(Some(origin)),
        1_000,
    );
    results.push(TestResult {
        name: "capture_cancelled_no_op".into(),
        passed: matches!(outcome, Ok(CaptureOutcome::Cancelled)) && registry.plants().is_empty(),
        detail: "cancel aborts before any collaborator is consulted".into(),
    });

    // Not-a-plant verdict: rejected, no mutation.
    let outcome = run_capture(
        &mut registry,
        &mut ScriptedCamera(Some("shoe.jpg".into())),
        &mut ScriptedClassifier {
            verdict: Some(false),
        },
        &mut ScriptedLocator(Some(origin)),
        1_000,
    );
    results.push(TestResult {
        name: "capture_not_a_plant".into(),
        passed: matches!(outcome, Ok(CaptureOutcome::NotAPlant)),
        detail: "classifier gate rejects non-plants".into(),
    });

    // Classifier outage: recoverable error.
    let outcome = run_capture(
        &mut registry,
        &mut ScriptedCamera(Some("fern.jpg".into())),
        &mut ScriptedClassifier { verdict: None },
        &mut ScriptedLocator(Some(origin)),
        1_000,
    );
    results.push(TestResult {
        name: "capture_classifier_outage".into(),
        passed: matches!(outcome, Err(CaptureError::Classifier(_))),
        detail: "transport failure surfaces to the caller".into(),
    });

    // No GPS fix: recoverable error.
    let outcome = run_capture(
        &mut registry,
        &mut ScriptedCamera(Some("fern.jpg".into())),
        &mut ScriptedClassifier { verdict: Some(true) },
        &mut ScriptedLocator(None),
        1_000,
    );
    results.push(TestResult {
        name: "capture_location_unavailable".into(),
        passed: matches!(outcome, Err(CaptureError::LocationUnavailable))
            && registry.plants().is_empty(),
        detail: "missing fix leaves the registry untouched".into(),
    });

    // Full pipeline lands a classification.
    let outcome = run_capture(
        &mut registry,
        &mut ScriptedCamera(Some("fern.jpg".into())),
        &mut ScriptedClassifier { verdict: Some(true) },
        &mut ScriptedLocator(Some(origin)),
        1_000,
    );
    results.push(TestResult {
        name: "capture_full_pipeline".into(),
        passed: matches!(
            outcome,
            Ok(CaptureOutcome::Observed(Observation::NewCandidate { .. }))
        ),
        detail: "photo + verdict + fix reach the geofence classifier".into(),
    });

    results
}

// ── 5. Scripted mission playthrough ─────────────────────────────────────

/// Step the engine toward a cell with single-axis-per-step diagonal moves.
fn walk(engine: &mut MissionEngine<MemoryStore>, x: i32, y: i32) -> Result<(), String> {
    loop {
        let pos = engine.state().player;
        if pos.x == x && pos.y == y {
            return Ok(());
        }
        let dx = (x - pos.x).signum();
        let dy = (y - pos.y).signum();
        engine
            .move_player(dx, dy)
            .map_err(|e| format!("move failed at {:?}: {}", pos, e))?;
    }
}

fn validate_mission_playthrough(verbose: bool) -> Vec<TestResult> {
    println!("--- Mission Playthrough ---");
    let mut results = Vec::new();

    let level = LevelDef::the_deluge();
    let mut engine = MissionEngine::open(MemoryStore::new(), level).expect("open");

    results.push(TestResult {
        name: "mission_starts_in_tutorial".into(),
        passed: engine.state().phase == Phase::Tutorial,
        detail: format!("phase = {:?}", engine.state().phase),
    });

    engine.dismiss_tutorial().expect("dismiss");

    // Collect the pipe clue.
    let script: Result<(), String> = (|| {
        walk(&mut engine, 2, 5)?;
        engine.interact().map_err(|e| e.to_string())?;
        // Rescue the civilian on the way to the second clue.
        walk(&mut engine, 5, 7)?;
        engine.interact().map_err(|e| e.to_string())?;
        walk(&mut engine, 7, 2)?;
        engine.interact().map_err(|e| e.to_string())?;
        Ok(())
    })();
    results.push(TestResult {
        name: "mission_scripted_route".into(),
        passed: script.is_ok(),
        detail: script.err().unwrap_or_else(|| {
            format!(
                "2 clues + 1 rescue, {} AP left",
                engine.state().action_points
            )
        }),
    });

    results.push(TestResult {
        name: "mission_decision_unlocked".into(),
        passed: engine.state().phase == Phase::Decision
            && engine.state().found_clues.len() == 2,
        detail: format!(
            "phase = {:?}, clues = {:?}",
            engine.state().phase,
            engine.state().found_clues
        ),
    });

    // An unknown option is rejected without ending the mission.
    let rejected = engine.decide("d99").is_err() && engine.state().phase == Phase::Decision;
    results.push(TestResult {
        name: "mission_unknown_option_rejected".into(),
        passed: rejected,
        detail: "decide(d99) is a no-op".into(),
    });

    // The best decision wins the mission.
    let message = engine.decide("d3").expect("decide");
    results.push(TestResult {
        name: "mission_best_decision_wins".into(),
        passed: message.contains("MISSION COMPLETE") && engine.is_over(),
        detail: message.clone(),
    });

    if verbose {
        for entry in &engine.state().log {
            println!("    log: {}", entry);
        }
    }

    // Restart resets exactly to the fresh post-tutorial state.
    engine.restart().expect("restart");
    let fresh = MissionState::new(&LevelDef::the_deluge(), true);
    results.push(TestResult {
        name: "mission_restart_resets".into(),
        passed: *engine.state() == fresh,
        detail: "state == freshly initialized state".into(),
    });

    // Locked decision check: reach the decision phase, then forget the
    // clue the winning option requires.
    let level = LevelDef::the_deluge();
    let mut state = MissionState::new(&level, true);
    let mut reach = |state: &mut MissionState, x: i32, y: i32| {
        while state.player.x != x || state.player.y != y {
            let dx = (x - state.player.x).signum();
            let dy = (y - state.player.y).signum();
            state.move_player(&level, dx, dy).expect("move");
        }
    };
    reach(&mut state, 2, 5);
    state.interact(&level).expect("clue 1");
    reach(&mut state, 7, 2);
    state.interact(&level).expect("clue 2");
    state.found_clues.retain(|c| c != "PIPE_FRACTURE");
    let locked = state.decide(&level, "d3").is_err() && state.phase == Phase::Decision;
    results.push(TestResult {
        name: "mission_locked_option_rejected".into(),
        passed: locked,
        detail: "d3 without PIPE_FRACTURE stays in DECISION".into(),
    });

    results
}

// ── 6. Random-walk invariants ───────────────────────────────────────────

fn validate_mission_random_walks(verbose: bool) -> Vec<TestResult> {
    println!("--- Random-Walk Invariants ---");
    let mut results = Vec::new();

    let level = LevelDef::the_deluge();
    let runs = 50;
    let mut violations = Vec::new();
    let mut terminal_count = 0;
    let mut decision_count = 0;

    for run in 0..runs {
        let mut rng = StdRng::seed_from_u64(0xEC0 + run);
        let mut state = MissionState::new(&level, true);

        for _ in 0..5_000 {
            if state.phase != Phase::Investigation {
                break;
            }
            if rng.gen_bool(0.8) {
                let dx = rng.gen_range(-1..=1);
                let dy = rng.gen_range(-1..=1);
                // Phase was checked above; moves only fail on phase.
                let _ = state.move_player(&level, dx, dy);
            } else {
                // Interactions may be rejected (empty cell, no rope) —
                // rejections must be free.
                let ap_before = state.action_points;
                if state.interact(&level).is_err() && state.action_points != ap_before {
                    violations.push(format!("run {run}: rejected interact charged AP"));
                }
            }

            // Invariants after every step.
            let in_bounds = (0..level.grid_size).contains(&state.player.x)
                && (0..level.grid_size).contains(&state.player.y);
            if !in_bounds {
                violations.push(format!("run {run}: player left the grid"));
            }
            if state.action_points < 0 {
                violations.push(format!("run {run}: negative action points"));
            }
            if state.phase == Phase::Investigation && state.action_points == 0 {
                violations.push(format!("run {run}: playable zero-AP state"));
            }
        }

        match state.phase {
            Phase::GameOver => terminal_count += 1,
            Phase::Decision => decision_count += 1,
            other => violations.push(format!("run {run}: walk ended in {other:?}")),
        }
    }

    results.push(TestResult {
        name: "walk_invariants_hold".into(),
        passed: violations.is_empty(),
        detail: if violations.is_empty() {
            format!("{} runs clean", runs)
        } else {
            violations.join("; ")
        },
    });

    results.push(TestResult {
        name: "walk_always_terminates".into(),
        passed: terminal_count + decision_count == runs as i32,
        detail: format!(
            "{} exhausted, {} reached the decision phase",
            terminal_count, decision_count
        ),
    });

    if verbose {
        println!(
            "  {} of {} random walks stumbled into the decision phase",
            decision_count, runs
        );
    }

    results
}

// ── 7. Carbon calculator ────────────────────────────────────────────────

fn validate_carbon(_verbose: bool) -> Vec<TestResult> {
    println!("--- Carbon Calculator ---");
    let mut results = Vec::new();

    results.push(TestResult {
        name: "carbon_zero_day".into(),
        passed: carbon::total_saved_kg(&EcoActions::default()) == 0.0,
        detail: "no actions, no savings".into(),
    });

    let commuter = EcoActions {
        trees_planted: 0,
        km_cycled: 5,
        km_by_bus: 10,
        km_by_train: 30,
    };
    let saved = carbon::total_saved_kg(&commuter);
    let expected = 5.0 * 0.21 + 10.0 * 0.1 + 30.0 * 0.04;
    results.push(TestResult {
        name: "carbon_commuter_day".into(),
        passed: (saved - expected).abs() < 1e-9,
        detail: format!("{:.2} kg saved", saved),
    });

    // A planted tree amortizes to a small daily figure.
    let one_tree = EcoActions {
        trees_planted: 1,
        ..EcoActions::default()
    };
    let daily = carbon::total_saved_kg(&one_tree);
    results.push(TestResult {
        name: "carbon_tree_prorated".into(),
        passed: daily > 0.05 && daily < 0.06,
        detail: format!("{:.4} kg/day per tree", daily),
    });

    results
}
