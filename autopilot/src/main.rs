use anyhow::{anyhow, Context, Result};
use autopilot::benchmark::{resolve_controllers, run_benchmark, BenchmarkConfig};
use autopilot::config::{default_max_turns, log_filter_from_env, ControllerOptions};
use autopilot::controllers::{
    controller_ids, controller_manifest_entries, create_controller_with, describe_controllers,
};
use autopilot::protocol::{play, ReplyMode};
use autopilot::runner::{run_controller, write_actions};
use autopilot::util::{collect_scenario_paths, load_scenario, scenario_label};
use clap::{Parser, Subcommand};
use std::fs;
use std::io;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Parser, Debug)]
#[command(name = "autopilot")]
#[command(about = "Checkpoint race autopilot: search planner, steering heuristic and benchmarks")]
struct Cli {
    /// Per-turn planning budget in milliseconds (overrides AUTOPILOT_TIME_BUDGET_MS)
    #[arg(long, global = true)]
    time_budget_ms: Option<u64>,
    /// Search depth limit (overrides AUTOPILOT_MAX_DEPTH)
    #[arg(long, global = true)]
    max_depth: Option<u32>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List available controllers
    ListControllers,
    /// Export the controller manifest (including config fingerprints)
    RosterManifest {
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Race one controller over one scenario file
    Run {
        #[arg(long)]
        controller: String,
        #[arg(long)]
        scenario: PathBuf,
        /// Defaults to AUTOPILOT_MAX_TURNS, or 600
        #[arg(long)]
        max_turns: Option<u32>,
        /// Write the chosen actions, one `rotation thrust` pair per line
        #[arg(long)]
        actions_out: Option<PathBuf>,
    },
    /// Race every controller over every scenario in parallel
    Benchmark {
        /// Comma separated ids; all controllers when omitted
        #[arg(long)]
        controllers: Option<String>,
        /// Scenario files or directories of *.txt scenarios
        #[arg(long, num_args = 1.., required = true)]
        scenarios: Vec<PathBuf>,
        #[arg(long)]
        max_turns: Option<u32>,
        #[arg(long)]
        out_dir: Option<PathBuf>,
        #[arg(long)]
        jobs: Option<usize>,
    },
    /// Answer the per-turn protocol on stdin/stdout
    Play {
        #[arg(long, default_value = "best-first")]
        controller: String,
        #[arg(long, value_enum, default_value_t = ReplyMode::Expert)]
        mode: ReplyMode,
        #[arg(long)]
        max_turns: Option<u32>,
    },
    /// Parse a scenario file and print it back in canonical form
    CheckScenario {
        #[arg(long)]
        input: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(log_filter_from_env())
        .with_writer(io::stderr)
        .init();

    let Cli {
        time_budget_ms,
        max_depth,
        command,
    } = Cli::parse();
    let options = ControllerOptions::from_env().merged(time_budget_ms, max_depth);

    match command {
        Commands::ListControllers => {
            for (id, description) in describe_controllers() {
                println!("{id:20} {description}");
            }
        }
        Commands::RosterManifest { output } => {
            let manifest = controller_manifest_entries();
            let encoded = serde_json::to_vec_pretty(&manifest)?;
            if let Some(path) = output {
                if let Some(parent) = path.parent() {
                    fs::create_dir_all(parent)?;
                }
                fs::write(&path, encoded)?;
                println!("wrote={}", path.display());
                println!("controllers={}", manifest.len());
            } else {
                println!("{}", String::from_utf8_lossy(&encoded));
            }
        }
        Commands::Run {
            controller,
            scenario,
            max_turns,
            actions_out,
        } => {
            ensure_controller(&controller)?;
            let label = scenario_label(&scenario);
            let parsed = load_scenario(&scenario)?;
            let max_turns = max_turns.unwrap_or_else(default_max_turns);
            let artifact = run_controller(&controller, &options, &label, &parsed, max_turns)?;

            let metrics = &artifact.metrics;
            println!("controller={}", metrics.controller_id);
            println!("controller_fingerprint={}", metrics.controller_fingerprint);
            println!("scenario={}", metrics.scenario);
            println!("finished={}", metrics.finished);
            println!("turns={}", metrics.turns);
            println!(
                "checkpoints={}/{}",
                metrics.checkpoints_reached, metrics.course_len
            );
            println!("course_correcting_turns={}", metrics.course_correcting_turns);
            println!("all_searched_turns={}", metrics.all_searched_turns);
            println!("decision_ms={:.1}", metrics.decision_ms);
            println!("final_vehicle={}", metrics.final_vehicle);
            if let Some(path) = actions_out {
                write_actions(&path, &artifact.actions)?;
                println!("actions={}", path.display());
            }
        }
        Commands::Benchmark {
            controllers,
            scenarios,
            max_turns,
            out_dir,
            jobs,
        } => {
            let controllers = resolve_controllers(controllers.as_deref())?;
            for controller in &controllers {
                ensure_controller(controller)?;
            }
            let scenarios = collect_scenario_paths(&scenarios)?;
            let out_dir = out_dir
                .unwrap_or_else(|| PathBuf::from(format!("benchmarks/{}", timestamp_suffix())));

            let report = run_benchmark(BenchmarkConfig {
                controllers,
                scenarios,
                options,
                max_turns: max_turns.unwrap_or_else(default_max_turns),
                out_dir: out_dir.clone(),
                jobs,
            })?;

            println!("runs={}", report.run_count);
            println!(
                "jobs={}",
                report
                    .jobs
                    .map(|value| value.to_string())
                    .unwrap_or_else(|| "auto".to_string())
            );
            println!("out_dir={}", out_dir.display());
            println!("rankings:");
            for (idx, row) in report.controller_rankings.iter().enumerate() {
                println!(
                    "  {}. {}  finished={}/{} avg_turns={:.1} max_turns={} course_correcting={:.1} decision_ms={:.1}",
                    idx + 1,
                    row.controller_id,
                    row.finished,
                    row.runs,
                    row.avg_turns,
                    row.max_turns,
                    row.avg_course_correcting_turns,
                    row.avg_decision_ms,
                );
            }
        }
        Commands::Play {
            controller,
            mode,
            max_turns,
        } => {
            let mut instance = create_controller_with(&controller, &options)
                .ok_or_else(|| unknown_controller(&controller))?;
            let stdin = io::stdin();
            let stdout = io::stdout();
            let summary = play(
                instance.as_mut(),
                mode,
                stdin.lock(),
                stdout.lock(),
                max_turns.unwrap_or_else(default_max_turns),
            )
            .context("protocol session failed")?;
            tracing::info!(
                turns = summary.turns,
                course_correcting = summary.course_correcting_turns,
                "session over"
            );
        }
        Commands::CheckScenario { input } => {
            let scenario = load_scenario(&input)?;
            tracing::info!(
                checkpoints = scenario.checkpoints.len(),
                laps = scenario.laps,
                course_len = scenario.course_len(),
                "scenario ok"
            );
            print!("{}", scenario.to_text());
        }
    }

    Ok(())
}

fn ensure_controller(id: &str) -> Result<()> {
    if controller_ids().iter().any(|known| *known == id) {
        Ok(())
    } else {
        Err(unknown_controller(id))
    }
}

fn unknown_controller(id: &str) -> anyhow::Error {
    let available = controller_ids().join(", ");
    anyhow!("unknown controller '{id}'. available: {available}")
}

fn timestamp_suffix() -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    format!("{now}")
}
