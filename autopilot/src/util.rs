use anyhow::{anyhow, Context, Result};
use race_core::{parse_scenario, Scenario};
use std::fs;
use std::path::{Path, PathBuf};

pub fn load_scenario(path: &Path) -> Result<Scenario> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed reading scenario {}", path.display()))?;
    parse_scenario(&text).with_context(|| format!("invalid scenario {}", path.display()))
}

/// File stem used to name a scenario in reports.
pub fn scenario_label(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

pub fn parse_csv_list(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

/// Expands each argument: a directory contributes its `*.txt` files in name
/// order, anything else is taken as a scenario file.
pub fn collect_scenario_paths(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for input in inputs {
        if input.is_dir() {
            let mut found: Vec<PathBuf> = fs::read_dir(input)
                .with_context(|| format!("failed listing {}", input.display()))?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "txt"))
                .collect();
            found.sort();
            if found.is_empty() {
                return Err(anyhow!("no .txt scenarios found in {}", input.display()));
            }
            paths.extend(found);
        } else {
            paths.push(input.clone());
        }
    }
    if paths.is_empty() {
        return Err(anyhow!("no scenarios given"));
    }
    Ok(paths)
}
