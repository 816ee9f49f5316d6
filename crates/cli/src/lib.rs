use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use gallery_cache::{Gallery, GalleryConfig, GalleryError, GalleryStats, MemoryBudget};
use serde::Serialize;
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Parser)]
#[command(name = "gallery-cli")]
#[command(about = "Budgeted picture gallery CLI")]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Walk through the three-picture eviction scenario.
    Demo {
        #[arg(long, default_value = "60000")]
        budget: MemoryBudget,
        #[arg(long, default_value_t = 0)]
        latency_ms: u64,
        /// Print the steps as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Register pictures, display them in order, and print a JSON report.
    Run {
        #[arg(long, value_name = "NAME=WxH", required = true)]
        picture: Vec<PictureSpec>,
        #[arg(long, value_name = "NAME")]
        display: Vec<String>,
        /// Overrides the config file and GALLERY_BUDGET.
        #[arg(long)]
        budget: Option<MemoryBudget>,
        /// Overrides the config file and GALLERY_LOAD_LATENCY_MS.
        #[arg(long)]
        latency_ms: Option<u64>,
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,
        /// Unload every picture after the displays.
        #[arg(long)]
        unload_all: bool,
    },
    /// Print CLI version.
    Version,
}

/// A picture given on the command line as `NAME=WIDTHxHEIGHT`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PictureSpec {
    pub name: String,
    pub width: u32,
    pub height: u32,
}

impl FromStr for PictureSpec {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || format!("invalid picture '{s}': expected NAME=WIDTHxHEIGHT");

        let (name, dims) = s.split_once('=').ok_or_else(invalid)?;
        let (width, height) = dims
            .split_once(|c: char| c == 'x' || c == 'X')
            .ok_or_else(invalid)?;

        let name = name.trim();
        if name.is_empty() {
            return Err(invalid());
        }

        Ok(Self {
            name: name.to_string(),
            width: width.trim().parse().map_err(|_| invalid())?,
            height: height.trim().parse().map_err(|_| invalid())?,
        })
    }
}

#[derive(Debug, Serialize)]
struct DemoReport {
    budget: u64,
    steps: Vec<StepReport>,
}

#[derive(Debug, Serialize)]
struct StepReport {
    step: usize,
    action: String,
    memory_used: u64,
    loaded: Vec<String>,
    evicted: Vec<String>,
    access: BTreeMap<String, u64>,
}

#[derive(Debug, Serialize)]
struct RunReport {
    budget: u64,
    displays: Vec<DisplayEntry>,
    unloaded_all: bool,
    stats: GalleryStats,
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum DisplayEntry {
    Displayed {
        filename: String,
        access_count: u64,
        loaded_now: bool,
        evicted: Vec<String>,
        memory_used: u64,
    },
    NotFound {
        filename: String,
    },
    LoadFailed {
        filename: String,
        reason: String,
        evicted: Vec<String>,
    },
}

pub fn run<I, T>(args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = Cli::parse_from(args);

    match cli.command {
        Commands::Demo { budget, latency_ms, json } => run_demo(budget, latency_ms, json),
        Commands::Run { picture, display, budget, latency_ms, config, unload_all } => {
            let config = resolve_config(config.as_deref(), budget, latency_ms)?;
            run_script(&config, &picture, &display, unload_all)
        }
        Commands::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn resolve_config(
    path: Option<&Path>,
    budget: Option<MemoryBudget>,
    latency_ms: Option<u64>,
) -> Result<GalleryConfig> {
    let mut config = match path {
        Some(path) => GalleryConfig::from_file(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => GalleryConfig::from_env().context("invalid gallery environment")?,
    };

    if let Some(budget) = budget {
        config = config.with_budget(budget);
    }
    if let Some(ms) = latency_ms {
        config = config.with_load_latency(Duration::from_millis(ms));
    }

    Ok(config)
}

fn run_demo(budget: MemoryBudget, latency_ms: u64, json: bool) -> Result<()> {
    let config = GalleryConfig::new(budget).with_load_latency(Duration::from_millis(latency_ms));
    let mut gallery = Gallery::with_config(&config);
    for name in ["A", "B", "C"] {
        gallery.register(name, 100, 100);
    }

    let mut steps = Vec::new();
    for (index, target) in ["A", "B", "A", "C"].into_iter().enumerate() {
        let shown = gallery
            .display(target)
            .with_context(|| format!("demo step {} failed", index + 1))?;
        steps.push(step_report(&gallery, index + 1, format!("display {target}"), shown.evicted));
    }

    let evicted = gallery.loaded_filenames();
    gallery.unload_all();
    steps.push(step_report(&gallery, steps.len() + 1, "unload all".to_string(), evicted));

    if json {
        let report = DemoReport { budget: budget.as_bytes(), steps };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("budget: {budget}");
    for step in &steps {
        let access: Vec<String> =
            step.access.iter().map(|(name, count)| format!("{name}={count}")).collect();
        println!(
            "{}. {:<10} usage {:>6}  loaded [{}]  evicted [{}]  access {}",
            step.step,
            step.action,
            step.memory_used,
            step.loaded.join(", "),
            step.evicted.join(", "),
            access.join(" ")
        );
    }

    Ok(())
}

fn step_report(gallery: &Gallery, step: usize, action: String, evicted: Vec<String>) -> StepReport {
    StepReport {
        step,
        action,
        memory_used: gallery.current_memory_usage(),
        loaded: gallery.loaded_filenames(),
        evicted,
        access: gallery
            .handles()
            .map(|h| (h.filename().to_string(), h.access_count()))
            .collect(),
    }
}

fn run_script(
    config: &GalleryConfig,
    pictures: &[PictureSpec],
    displays: &[String],
    unload_all: bool,
) -> Result<()> {
    let mut gallery = Gallery::with_config(config);
    for picture in pictures {
        gallery.register(picture.name.as_str(), picture.width, picture.height);
    }

    let entries: Vec<DisplayEntry> = displays
        .iter()
        .map(|name| match gallery.display(name) {
            Ok(shown) => DisplayEntry::Displayed {
                filename: shown.filename,
                access_count: shown.access_count,
                loaded_now: shown.loaded_now,
                evicted: shown.evicted,
                memory_used: gallery.current_memory_usage(),
            },
            Err(GalleryError::NotFound { filename }) => DisplayEntry::NotFound { filename },
            Err(GalleryError::LoadFailure { filename, reason, evicted }) => {
                DisplayEntry::LoadFailed { filename, reason, evicted }
            }
        })
        .collect();

    if unload_all {
        gallery.unload_all();
    }

    let report = RunReport {
        budget: config.budget.as_bytes(),
        displays: entries,
        unloaded_all: unload_all,
        stats: gallery.stats(),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picture_spec_parses() {
        let picture: PictureSpec = "hd1.jpg=1920x1080".parse().unwrap();
        assert_eq!(picture, PictureSpec { name: "hd1.jpg".to_string(), width: 1920, height: 1080 });

        let picture: PictureSpec = "A = 100X100".parse().unwrap();
        assert_eq!((picture.name.as_str(), picture.width, picture.height), ("A", 100, 100));
    }

    #[test]
    fn picture_spec_rejects_malformed_input() {
        for bad in ["A", "A=100", "=10x10", "A=axb", "A=10x-1"] {
            let err = bad.parse::<PictureSpec>().unwrap_err();
            assert!(err.contains("invalid picture"), "{bad}: {err}");
        }
    }

    #[test]
    fn resolve_config_prefers_flags_over_file() {
        let temp = tempfile::tempdir().expect("temp dir should be created");
        let path = temp.path().join("gallery.toml");
        std::fs::write(&path, "budget = \"1M\"\nload_latency_ms = 7\n").unwrap();

        let config = resolve_config(Some(path.as_path()), None, None).unwrap();
        assert_eq!(config.budget.as_mb(), 1);
        assert_eq!(config.load_latency, Duration::from_millis(7));

        let config =
            resolve_config(Some(path.as_path()), Some(MemoryBudget::from_bytes(60_000)), Some(0)).unwrap();
        assert_eq!(config.budget.as_bytes(), 60_000);
        assert_eq!(config.load_latency, Duration::ZERO);
    }

    #[test]
    fn resolve_config_reports_missing_file() {
        let err = resolve_config(Some(Path::new("/nonexistent/gallery.toml")), None, None)
            .unwrap_err();
        assert!(format!("{err:#}").contains("failed to load config"));
    }
}
