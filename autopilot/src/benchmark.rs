use crate::config::ControllerOptions;
use crate::controllers::controller_ids;
use crate::runner::{run_controller, RunMetrics};
use crate::util::{load_scenario, parse_csv_list, scenario_label};
use anyhow::{anyhow, Context, Result};
use race_core::Scenario;
use rayon::prelude::*;
use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// Controller id, scenario label, scenario.
type RunJob<'a> = (&'a str, &'a str, &'a Scenario);

#[derive(Clone, Debug)]
pub struct BenchmarkConfig {
    pub controllers: Vec<String>,
    pub scenarios: Vec<PathBuf>,
    pub options: ControllerOptions,
    pub max_turns: u32,
    pub out_dir: PathBuf,
    pub jobs: Option<usize>,
}

#[derive(Clone, Debug, Serialize)]
pub struct RunRecord {
    pub controller_id: String,
    pub controller_fingerprint: String,
    pub scenario: String,
    pub finished: bool,
    pub turns: u32,
    pub checkpoints_reached: usize,
    pub course_len: usize,
    pub course_correcting_turns: u32,
    pub thrust_turns: u32,
    pub rotate_turns: u32,
    pub decision_ms: f64,
}

#[derive(Clone, Debug, Serialize)]
pub struct ControllerAggregate {
    pub controller_id: String,
    pub controller_fingerprint: String,
    pub runs: usize,
    pub finished: usize,
    pub finish_rate: f64,
    /// Over finished runs only; zero when nothing finished.
    pub avg_turns: f64,
    pub max_turns: u32,
    pub avg_checkpoint_fraction: f64,
    pub avg_course_correcting_turns: f64,
    pub avg_decision_ms: f64,
}

#[derive(Clone, Debug, Serialize)]
pub struct BenchmarkReport {
    pub generated_unix_s: u64,
    pub max_turns: u32,
    pub jobs: Option<usize>,
    pub controllers: Vec<String>,
    pub scenarios: Vec<String>,
    pub run_count: usize,
    pub controller_rankings: Vec<ControllerAggregate>,
    pub runs: Vec<RunRecord>,
}

pub fn resolve_controllers(input: Option<&str>) -> Result<Vec<String>> {
    match input {
        None => Ok(controller_ids().iter().map(|id| (*id).to_string()).collect()),
        Some(raw) => {
            let controllers = parse_csv_list(raw);
            if controllers.is_empty() {
                return Err(anyhow!("--controllers resolved to empty list"));
            }
            Ok(controllers)
        }
    }
}

pub fn run_benchmark(config: BenchmarkConfig) -> Result<BenchmarkReport> {
    if config.scenarios.is_empty() {
        return Err(anyhow!("benchmark requires at least one scenario"));
    }
    if config.controllers.is_empty() {
        return Err(anyhow!("benchmark requires at least one controller"));
    }
    if let Some(jobs) = config.jobs {
        if jobs == 0 {
            return Err(anyhow!("benchmark --jobs must be >= 1 when provided"));
        }
    }
    fs::create_dir_all(&config.out_dir)
        .with_context(|| format!("failed creating {}", config.out_dir.display()))?;

    let mut scenarios: Vec<(String, Scenario)> = Vec::with_capacity(config.scenarios.len());
    for path in &config.scenarios {
        scenarios.push((scenario_label(path), load_scenario(path)?));
    }

    let run_jobs: Vec<RunJob<'_>> = config
        .controllers
        .iter()
        .flat_map(|controller| {
            scenarios
                .iter()
                .map(move |(label, scenario)| (controller.as_str(), label.as_str(), scenario))
        })
        .collect();

    let run_one = |(controller_id, label, scenario): &RunJob<'_>| -> Result<RunMetrics> {
        run_controller(
            controller_id,
            &config.options,
            label,
            scenario,
            config.max_turns,
        )
        .map(|artifact| artifact.metrics)
        .with_context(|| {
            format!("benchmark run failed for controller={controller_id} scenario={label}")
        })
    };

    let run_results: Vec<Result<RunMetrics>> = if let Some(jobs) = config.jobs {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .build()
            .context("failed to build rayon threadpool")?;
        pool.install(|| run_jobs.par_iter().map(run_one).collect())
    } else {
        run_jobs.par_iter().map(run_one).collect()
    };

    let mut runs = Vec::with_capacity(run_results.len());
    for result in run_results {
        runs.push(result?);
    }

    let rankings = rank_controllers(&runs);

    let run_records: Vec<RunRecord> = runs
        .iter()
        .map(|run| RunRecord {
            controller_id: run.controller_id.clone(),
            controller_fingerprint: run.controller_fingerprint.clone(),
            scenario: run.scenario.clone(),
            finished: run.finished,
            turns: run.turns,
            checkpoints_reached: run.checkpoints_reached,
            course_len: run.course_len,
            course_correcting_turns: run.course_correcting_turns,
            thrust_turns: run.thrust_turns,
            rotate_turns: run.rotate_turns,
            decision_ms: run.decision_ms,
        })
        .collect();

    write_runs_csv(&config.out_dir.join("runs.csv"), &run_records)?;
    write_rankings_csv(&config.out_dir.join("rankings.csv"), &rankings)?;

    let report = BenchmarkReport {
        generated_unix_s: SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs(),
        max_turns: config.max_turns,
        jobs: config.jobs,
        controllers: config.controllers,
        scenarios: scenarios.into_iter().map(|(label, _)| label).collect(),
        run_count: run_records.len(),
        controller_rankings: rankings,
        runs: run_records,
    };

    let report_path = config.out_dir.join("summary.json");
    fs::write(
        &report_path,
        serde_json::to_vec_pretty(&report).context("failed to serialize summary json")?,
    )
    .with_context(|| format!("failed writing {}", report_path.display()))?;

    tracing::info!(
        runs = report.run_count,
        out_dir = %config.out_dir.display(),
        "benchmark complete"
    );

    Ok(report)
}

/// Highest finish rate first, then fewest average turns.
fn rank_controllers(runs: &[RunMetrics]) -> Vec<ControllerAggregate> {
    let mut grouped: HashMap<&str, Vec<&RunMetrics>> = HashMap::new();
    for run in runs {
        grouped.entry(run.controller_id.as_str()).or_default().push(run);
    }

    let mut rankings: Vec<ControllerAggregate> = grouped
        .into_iter()
        .map(|(controller_id, runs)| {
            let count = runs.len();
            let finished: Vec<&&RunMetrics> = runs.iter().filter(|r| r.finished).collect();
            let finished_turns: u64 = finished.iter().map(|r| u64::from(r.turns)).sum();
            let avg_turns = if finished.is_empty() {
                0.0
            } else {
                finished_turns as f64 / finished.len() as f64
            };
            let checkpoint_fraction: f64 = runs
                .iter()
                .map(|r| r.checkpoints_reached as f64 / r.course_len.max(1) as f64)
                .sum();
            let course_correcting: u64 = runs
                .iter()
                .map(|r| u64::from(r.course_correcting_turns))
                .sum();

            ControllerAggregate {
                controller_id: controller_id.to_string(),
                controller_fingerprint: runs
                    .first()
                    .map(|r| r.controller_fingerprint.clone())
                    .unwrap_or_else(|| "unknown".to_string()),
                runs: count,
                finished: finished.len(),
                finish_rate: finished.len() as f64 / count as f64,
                avg_turns,
                max_turns: runs.iter().map(|r| r.turns).max().unwrap_or_default(),
                avg_checkpoint_fraction: checkpoint_fraction / count as f64,
                avg_course_correcting_turns: course_correcting as f64 / count as f64,
                avg_decision_ms: runs.iter().map(|r| r.decision_ms).sum::<f64>() / count as f64,
            }
        })
        .collect();

    rankings.sort_by(|a, b| {
        b.finish_rate
            .total_cmp(&a.finish_rate)
            .then_with(|| a.avg_turns.total_cmp(&b.avg_turns))
            .then_with(|| a.controller_id.cmp(&b.controller_id))
    });
    rankings
}

fn write_runs_csv(path: &Path, rows: &[RunRecord]) -> Result<()> {
    let mut csv = String::from(
        "controller_id,controller_fingerprint,scenario,finished,turns,checkpoints_reached,course_len,course_correcting_turns,thrust_turns,rotate_turns,decision_ms\n",
    );
    for row in rows {
        csv.push_str(&format!(
            "{},{},{},{},{},{},{},{},{},{},{:.3}\n",
            row.controller_id,
            row.controller_fingerprint,
            row.scenario,
            row.finished,
            row.turns,
            row.checkpoints_reached,
            row.course_len,
            row.course_correcting_turns,
            row.thrust_turns,
            row.rotate_turns,
            row.decision_ms
        ));
    }
    fs::write(path, csv).with_context(|| format!("failed writing {}", path.display()))
}

fn write_rankings_csv(path: &Path, rows: &[ControllerAggregate]) -> Result<()> {
    let mut csv = String::from(
        "rank,controller_id,controller_fingerprint,runs,finished,finish_rate,avg_turns,max_turns,avg_checkpoint_fraction,avg_course_correcting_turns,avg_decision_ms\n",
    );
    for (idx, row) in rows.iter().enumerate() {
        csv.push_str(&format!(
            "{},{},{},{},{},{:.4},{:.2},{},{:.4},{:.2},{:.3}\n",
            idx + 1,
            row.controller_id,
            row.controller_fingerprint,
            row.runs,
            row.finished,
            row.finish_rate,
            row.avg_turns,
            row.max_turns,
            row.avg_checkpoint_fraction,
            row.avg_course_correcting_turns,
            row.avg_decision_ms
        ));
    }
    fs::write(path, csv).with_context(|| format!("failed writing {}", path.display()))
}
