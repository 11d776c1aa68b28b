use chrono::{SecondsFormat, Utc};
use clap::Parser;
use gud_server::catalog::Catalog;
use gud_server::constants::ENTRY_POINT;
use gud_server::dispatch::StandardDispatch;
use gud_server::movement::{jump, locate, move_player};
use gud_server::pathfinding::{path_cost, Route};
use gud_server::player::Player;
use gud_server::rng::Rng;
use gud_server::types::{Cardinal, Cell, Direction};
use gud_server::world::{World, WorldConfig};
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// First world seed.
    #[arg(long, default_value_t = 1)]
    seed: u32,
    /// Number of consecutive seeds to simulate.
    #[arg(long, default_value_t = 20)]
    seeds: u32,
    #[arg(long, default_value_t = 4)]
    walkers: usize,
    #[arg(long, default_value_t = 200)]
    steps: usize,
    #[arg(long)]
    run_id: Option<String>,
    #[arg(long)]
    summary_out: Option<PathBuf>,
}

#[derive(Clone, Debug, Serialize)]
struct ScenarioResultLine {
    seed: u32,
    towns: usize,
    #[serde(rename = "walkableCells")]
    walkable_cells: usize,
    moves: usize,
    #[serde(rename = "blockedMoves")]
    blocked_moves: usize,
    encounters: BTreeMap<String, usize>,
    jumps: usize,
    locates: usize,
    #[serde(rename = "unreachableTargets")]
    unreachable_targets: usize,
    #[serde(rename = "longestRoute")]
    longest_route: usize,
    anomalies: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
struct AnomalyRecord {
    step: usize,
    message: String,
}

#[derive(Clone, Debug, Serialize)]
struct ScenarioRunResult {
    #[serde(flatten)]
    result: ScenarioResultLine,
    #[serde(rename = "anomalyRecords")]
    anomaly_records: Vec<AnomalyRecord>,
}

#[derive(Clone, Debug, Serialize)]
struct RunSummary {
    #[serde(rename = "runId")]
    run_id: String,
    #[serde(rename = "startedAt")]
    started_at: String,
    #[serde(rename = "finishedAt")]
    finished_at: String,
    #[serde(rename = "scenarioCount")]
    scenario_count: usize,
    #[serde(rename = "anomalyCount")]
    anomaly_count: usize,
    #[serde(rename = "averageTowns")]
    average_towns: f32,
    scenarios: Vec<ScenarioResultLine>,
}

#[derive(Clone, Debug, Serialize)]
struct StructuredLogLine {
    timestamp: String,
    level: String,
    event: String,
    #[serde(rename = "runId")]
    run_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    step: Option<usize>,
    details: Value,
}

#[derive(Default)]
struct AnomalyLog {
    messages: Vec<String>,
    records: Vec<AnomalyRecord>,
    seen: HashSet<String>,
}

impl AnomalyLog {
    fn push(&mut self, step: usize, message: String) {
        self.records.push(AnomalyRecord {
            step,
            message: message.clone(),
        });
        if self.seen.insert(message.clone()) {
            self.messages.push(message);
        }
    }
}

fn main() {
    let cli = Cli::parse();
    let started_at = now_rfc3339();
    let run_id = cli
        .run_id
        .clone()
        .unwrap_or_else(|| default_run_id(cli.seed, &started_at));
    let catalog = Catalog::default();
    let config = WorldConfig::default();

    let mut has_anomaly = false;
    let mut results = Vec::new();
    let mut total_anomalies = 0usize;

    for seed in cli.seed..cli.seed.saturating_add(cli.seeds) {
        emit_log(
            "info",
            "scenario_started",
            &run_id,
            Some(seed),
            None,
            json!({ "walkers": cli.walkers, "steps": cli.steps }),
        );

        let run = run_scenario(&config, &catalog, seed, cli.walkers, cli.steps);
        for anomaly in &run.anomaly_records {
            emit_log(
                "warn",
                "anomaly_detected",
                &run_id,
                Some(seed),
                Some(anomaly.step),
                json!({ "message": anomaly.message }),
            );
        }
        if !run.result.anomalies.is_empty() {
            has_anomaly = true;
        }
        total_anomalies += run.anomaly_records.len();

        emit_log(
            "info",
            "scenario_finished",
            &run_id,
            Some(seed),
            None,
            json!({
                "towns": run.result.towns,
                "moves": run.result.moves,
                "locates": run.result.locates,
                "anomalyCount": run.anomaly_records.len(),
            }),
        );
        match serde_json::to_string(&run.result) {
            Ok(line) => println!("{line}"),
            Err(error) => eprintln!("failed to serialize result for seed {seed}: {error}"),
        }
        results.push(run.result);
    }

    let summary = build_run_summary(run_id.clone(), started_at, now_rfc3339(), results, total_anomalies);

    let mut summary_out_written: Option<String> = None;
    if let Some(path) = cli.summary_out.as_ref() {
        if let Err(error) = write_summary(path, &summary) {
            emit_log(
                "error",
                "summary_write_failed",
                &run_id,
                None,
                None,
                json!({
                    "path": path.to_string_lossy(),
                    "error": error.to_string(),
                }),
            );
            std::process::exit(2);
        }
        summary_out_written = Some(path.to_string_lossy().to_string());
    }

    emit_log(
        "info",
        "run_finished",
        &run_id,
        None,
        None,
        json!({
            "scenarioCount": summary.scenario_count,
            "anomalyCount": summary.anomaly_count,
            "averageTowns": summary.average_towns,
            "summaryOut": summary_out_written,
        }),
    );

    if has_anomaly {
        std::process::exit(1);
    }
}

fn run_scenario(
    config: &WorldConfig,
    catalog: &Catalog,
    seed: u32,
    walkers: usize,
    steps: usize,
) -> ScenarioRunResult {
    let mut anomalies = AnomalyLog::default();
    let mut result = ScenarioResultLine {
        seed,
        towns: 0,
        walkable_cells: 0,
        moves: 0,
        blocked_moves: 0,
        encounters: BTreeMap::new(),
        jumps: 0,
        locates: 0,
        unreachable_targets: 0,
        longest_route: 0,
        anomalies: Vec::new(),
    };

    let world = match World::build(config, catalog, seed) {
        Ok(world) => world,
        Err(error) => {
            anomalies.push(0, format!("world build failed: {error}"));
            result.anomalies = anomalies.messages;
            return ScenarioRunResult {
                result,
                anomaly_records: anomalies.records,
            };
        }
    };
    result.towns = world.towns().len();
    result.walkable_cells = world
        .towns()
        .iter()
        .map(|town| town.grid().walkable_count())
        .sum();
    for message in collect_world_anomalies(&world) {
        anomalies.push(0, message);
    }

    let mut rng = Rng::new(seed ^ 0x5eed_cafe);
    let mut players: Vec<(Player, StandardDispatch)> = (0..walkers)
        .map(|idx| {
            (
                Player::new(format!("walker-{idx}"), 0),
                StandardDispatch::new(seed.wrapping_add(idx as u32)),
            )
        })
        .collect();

    for step in 0..steps {
        for (player, dispatch) in players.iter_mut() {
            let roll = rng.below(10);
            if roll == 0 {
                let Some(&direction) = rng.pick(&Cardinal::ALL) else {
                    continue;
                };
                if jump(&world, player, direction).is_ok() {
                    result.jumps += 1;
                }
            } else if roll == 1 {
                check_locate(&world, player, &mut rng, step, &mut result, &mut anomalies);
            } else {
                let Some(&direction) = rng.pick(&Direction::ALL) else {
                    continue;
                };
                let distance = rng.int(0, 6) as u32;
                match move_player(&world, player, direction, distance, dispatch) {
                    Ok(report) => {
                        result.moves += 1;
                        if report.blocked {
                            result.blocked_moves += 1;
                        }
                        if let Some(event) = report.event {
                            *result
                                .encounters
                                .entry(event.event_type.label().to_string())
                                .or_insert(0) += 1;
                        }
                    }
                    Err(error) => anomalies.push(step, format!("move failed: {error}")),
                }
            }

            let on_walkable = world
                .town(player.town)
                .map(|town| town.grid().is_walkable(player.position))
                .unwrap_or(false);
            if !on_walkable {
                anomalies.push(
                    step,
                    format!("{} stands on a wall at {}", player.name, player.position),
                );
            }
        }
    }

    result.anomalies = anomalies.messages;
    ScenarioRunResult {
        result,
        anomaly_records: anomalies.records,
    }
}

fn collect_world_anomalies(world: &World) -> Vec<String> {
    let mut out = Vec::new();
    for town in world.towns() {
        let grid = town.grid();
        if !grid.is_walkable(ENTRY_POINT) {
            out.push(format!("{}: entry point is blocked", town.name));
        }
        if grid.reachable_from(ENTRY_POINT).len() != grid.walkable_count() {
            out.push(format!("{}: walkable cells are not connected", town.name));
        }
        {
            let contents = town.contents();
            if contents
                .items
                .iter()
                .any(|item| !grid.is_walkable(item.coordinates))
            {
                out.push(format!("{}: item placed on a wall", town.name));
            }
            if contents
                .events
                .iter()
                .any(|event| !grid.is_walkable(event.coordinates))
            {
                out.push(format!("{}: event placed on a wall", town.name));
            }
        }
        for (direction, target) in town.links() {
            let mirrored = world
                .town(target)
                .and_then(|other| other.adjacent(direction.opposite()));
            if mirrored != Some(town.id) {
                out.push(format!(
                    "{}: {} link is not mirrored",
                    town.name,
                    direction.name()
                ));
            }
        }
    }
    out
}

fn check_locate(
    world: &World,
    player: &Player,
    rng: &mut Rng,
    step: usize,
    result: &mut ScenarioResultLine,
    anomalies: &mut AnomalyLog,
) {
    let Some(town) = world.town(player.town) else {
        return;
    };
    let target = {
        let contents = town.contents();
        rng.pick(&contents.items)
            .map(|item| (item.description.clone(), item.coordinates))
    };
    let Some((name, cell)) = target else {
        return;
    };
    result.locates += 1;
    match locate(world, player, &name) {
        Ok(route) => {
            result.longest_route = result.longest_route.max(route.len());
            if let Some(message) = route_anomaly(&route, player.position) {
                anomalies.push(step, format!("route to {name}: {message}"));
            }
            if route.goal() != Some(cell) && town.find_target(&name) == Some(cell) {
                anomalies.push(step, format!("route to {name} ends at the wrong cell"));
            }
        }
        Err(_) => {
            result.unreachable_targets += 1;
            anomalies.push(step, format!("{name} is unreachable in {}", town.name));
        }
    }
}

fn route_anomaly(route: &Route, start: Cell) -> Option<String> {
    if route.start() != Some(start) {
        return Some("does not begin at the player".to_string());
    }
    match path_cost(&route.cells) {
        Some(cost) if cost == route.cost => None,
        Some(cost) => Some(format!("cost {} differs from walked cost {cost}", route.cost)),
        None => Some("contains a non-adjacent hop".to_string()),
    }
}

fn default_run_id(seed: u32, started_at: &str) -> String {
    format!("sim-{seed}-{started_at}")
}

fn build_run_summary(
    run_id: String,
    started_at: String,
    finished_at: String,
    scenarios: Vec<ScenarioResultLine>,
    anomaly_count: usize,
) -> RunSummary {
    let scenario_count = scenarios.len();
    let average_towns = if scenario_count == 0 {
        0.0
    } else {
        scenarios.iter().map(|scenario| scenario.towns).sum::<usize>() as f32
            / scenario_count as f32
    };
    RunSummary {
        run_id,
        started_at,
        finished_at,
        scenario_count,
        anomaly_count,
        average_towns,
        scenarios,
    }
}

fn emit_log(
    level: &str,
    event: &str,
    run_id: &str,
    seed: Option<u32>,
    step: Option<usize>,
    details: Value,
) {
    let log_line = StructuredLogLine {
        timestamp: now_rfc3339(),
        level: level.to_string(),
        event: event.to_string(),
        run_id: run_id.to_string(),
        seed,
        step,
        details,
    };
    match serde_json::to_string(&log_line) {
        Ok(line) => eprintln!("{line}"),
        Err(error) => eprintln!("failed to serialize log line: {error}"),
    }
}

fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn write_summary(path: &Path, summary: &RunSummary) -> io::Result<()> {
    let summary_text = serde_json::to_string_pretty(summary).map_err(io::Error::other)?;
    std::fs::write(path, summary_text)
}
