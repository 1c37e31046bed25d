use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;
use warden_engine::adapters::{Dot, Replayer, StepEffect};
use warden_engine::{
    Classification, GraphProjector, RecoveryConfig, RecoveryManager, ResourceState, Scenario,
    Units,
};

/// Warden CLI
/// Deadlock detection and recovery over a resource allocation scenario
#[derive(Parser)]
#[command(name = "warden", version)]
#[command(about = "Banker's safety check and deadlock recovery", long_about = None)]
struct Cli {
    /// Log at debug level (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the state matrices and classify the scenario
    Check {
        /// Scenario JSON file
        file: PathBuf,
    },
    /// Terminate processes until the scenario is safe
    Recover {
        /// Scenario JSON file
        file: PathBuf,
        /// Terminate these processes instead of choosing automatically
        #[arg(short, long = "kill", value_name = "NAME")]
        kill: Vec<String>,
        /// Stop automatic recovery after this many victims
        #[arg(long)]
        max_rounds: Option<usize>,
    },
    /// Emit the resource allocation graph
    Graph {
        /// Scenario JSON file
        file: PathBuf,
        /// Output format
        #[arg(short, long, value_enum, default_value_t = GraphFormat::Dot)]
        format: GraphFormat,
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Apply the scenario's event script step by step
    Replay {
        /// Scenario JSON file
        file: PathBuf,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum GraphFormat {
    /// Graphviz DOT
    Dot,
    /// JSON node/edge lists
    Json,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let output = match cli.command {
        Commands::Check { file } => check(&file)?,
        Commands::Recover {
            file,
            kill,
            max_rounds,
        } => recover(&file, &kill, RecoveryConfig { max_rounds })?,
        Commands::Graph {
            file,
            format,
            output,
        } => {
            let rendered = graph(&file, format)?;
            match output {
                Some(path) => {
                    std::fs::write(&path, &rendered)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    info!("graph written to {}", path.display());
                    String::new()
                }
                None => rendered,
            }
        }
        Commands::Replay { file } => replay(&file)?,
    };

    print!("{output}");
    Ok(())
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Commands
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

fn load(path: &Path) -> Result<(Scenario, ResourceState)> {
    let scenario = Scenario::from_path(path)?;
    let state = scenario
        .build_state()
        .with_context(|| format!("invalid scenario {}", path.display()))?;
    Ok((scenario, state))
}

fn check(path: &Path) -> Result<String> {
    let (_, state) = load(path)?;
    let mut out = render_state(&state);
    out.push_str(&render_status(&state, &state.classify()));
    Ok(out)
}

fn recover(path: &Path, kill: &[String], config: RecoveryConfig) -> Result<String> {
    let (_, mut state) = load(path)?;
    let mut out = String::new();

    let outcome = if kill.is_empty() {
        let log = RecoveryManager::recover_until_safe(&mut state, config)?;
        for victim in &log.victims {
            let _ = writeln!(out, "terminated {} (released {:?})", victim.name, victim.released);
        }
        log.outcome
    } else {
        for name in kill {
            let victim = state
                .terminate_by_name(name)
                .with_context(|| format!("cannot terminate {name}"))?;
            let _ = writeln!(out, "terminated {} (released {:?})", victim.name, victim.released);
        }
        state.classify()
    };

    if out.is_empty() {
        out.push_str("nothing to recover\n");
    }
    out.push_str(&render_status(&state, &outcome));
    Ok(out)
}

fn graph(path: &Path, format: GraphFormat) -> Result<String> {
    let (_, state) = load(path)?;
    let classification = state.classify();
    let graph = GraphProjector::project(&state, &classification.deadlocked);
    Ok(match format {
        GraphFormat::Dot => Dot::new(&graph).to_string(),
        GraphFormat::Json => {
            let mut json = graph.to_json()?;
            json.push('\n');
            json
        }
    })
}

fn replay(path: &Path) -> Result<String> {
    let (scenario, mut state) = load(path)?;
    if scenario.events.is_empty() {
        bail!("scenario {} has no events", path.display());
    }

    let steps = Replayer::new(&mut state).run(&scenario.events);
    let mut out = String::new();
    for step in &steps {
        let event = serde_json::to_string(&step.event)?;
        let line = match &step.result {
            Ok(StepEffect::Applied) => "ok".to_string(),
            Ok(StepEffect::Granted { completion_order }) => {
                format!("granted, safe order {}", join_ids(&state, completion_order))
            }
            Ok(StepEffect::Terminated { victim }) => format!("terminated {}", victim.name),
            Ok(StepEffect::NothingToRecover) => "no deadlock".to_string(),
            Ok(StepEffect::Classified { classification }) => status_line(&state, classification),
            Err(err) => format!("error: {err}"),
        };
        let _ = writeln!(out, "[{}] {} -> {}", step.index, event, line);
    }
    out.push_str(&render_status(&state, &state.classify()));
    Ok(out)
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Rendering
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

fn render_state(state: &ResourceState) -> String {
    let mut out = String::new();
    render_matrix(&mut out, state, "Allocation", state.allocation());
    render_matrix(&mut out, state, "Max", state.max_demand());
    render_matrix(&mut out, state, "Need", &state.need());

    let _ = writeln!(out, "Available");
    let _ = writeln!(out, "  {}", header(state));
    let _ = writeln!(out, "  {}", row(state.available()));
    out.push('\n');
    out
}

fn render_matrix(out: &mut String, state: &ResourceState, title: &str, matrix: &[Vec<Units>]) {
    let width = label_width(state);
    let _ = writeln!(out, "{title}");
    let _ = writeln!(out, "  {:width$} {}", "", header(state));
    for (i, values) in matrix.iter().enumerate() {
        let mut label = state.process_names()[i].clone();
        if state.terminated()[i] {
            label.push_str(" (killed)");
        }
        let _ = writeln!(out, "  {label:width$} {}", row(values));
    }
    out.push('\n');
}

fn label_width(state: &ResourceState) -> usize {
    state
        .process_names()
        .iter()
        .enumerate()
        .map(|(i, name)| name.len() + if state.terminated()[i] { 9 } else { 0 })
        .max()
        .unwrap_or(0)
}

fn header(state: &ResourceState) -> String {
    state
        .resource_names()
        .iter()
        .map(|name| format!("{name:>6}"))
        .collect::<Vec<_>>()
        .join("")
}

fn row(values: &[Units]) -> String {
    values.iter().map(|v| format!("{v:>6}")).collect::<Vec<_>>().join("")
}

fn join_ids(state: &ResourceState, ids: &[warden_engine::ProcessId]) -> String {
    ids.iter()
        .filter_map(|p| state.process_names().get(p.as_usize()))
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(" -> ")
}

fn status_line(state: &ResourceState, classification: &Classification) -> String {
    if classification.is_safe() {
        format!("SAFE, order {}", join_ids(state, classification.live_order()))
    } else {
        format!(
            "DEADLOCK: {}",
            classification.deadlocked_names(state).join(", ")
        )
    }
}

fn render_status(state: &ResourceState, classification: &Classification) -> String {
    if classification.is_safe() {
        format!(
            "System is in a SAFE state.\nSafe sequence: {}\n",
            join_ids(state, classification.live_order())
        )
    } else {
        format!(
            "System is DEADLOCKED.\nDeadlocked processes: {}\n",
            classification.deadlocked_names(state).join(", ")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const DEADLOCKED: &str = r#"{
        "processes": ["P0", "P1", "P2"],
        "resources": ["A", "B", "C"],
        "allocation": [[0, 1, 0], [2, 0, 0], [3, 0, 2]],
        "max_demand": [[5, 1, 2], [3, 2, 2], [4, 0, 2]],
        "available": [0, 0, 0],
        "events": [
            { "op": "classify" },
            { "op": "release", "process": "P1", "units": [5, 0, 0] },
            { "op": "auto_recover" }
        ]
    }"#;

    fn scenario_file(json: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_cli_parses() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_check_reports_deadlock() {
        let file = scenario_file(DEADLOCKED);
        let out = check(file.path()).unwrap();
        assert!(out.contains("Allocation"));
        assert!(out.contains("Need"));
        assert!(out.contains("System is DEADLOCKED."));
        assert!(out.contains("Deadlocked processes: P0, P1, P2"));
    }

    #[test]
    fn test_recover_auto() {
        let file = scenario_file(DEADLOCKED);
        let out = recover(file.path(), &[], RecoveryConfig::default()).unwrap();
        assert!(out.contains("terminated P2 (released [3, 0, 2])"));
        assert!(out.contains("terminated P1"));
        assert!(out.contains("Safe sequence: P0"));
    }

    #[test]
    fn test_recover_by_name() {
        let file = scenario_file(DEADLOCKED);
        let out = recover(file.path(), &["P0".into()], RecoveryConfig::default()).unwrap();
        assert!(out.contains("terminated P0"));
        assert!(out.contains("DEADLOCKED"));

        let err = recover(file.path(), &["nope".into()], RecoveryConfig::default()).unwrap_err();
        assert!(format!("{err:#}").contains("process not found: nope"));
    }

    #[test]
    fn test_graph_formats() {
        let file = scenario_file(DEADLOCKED);
        let dot = graph(file.path(), GraphFormat::Dot).unwrap();
        assert!(dot.contains("fillcolor=red"));
        let json = graph(file.path(), GraphFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["processes"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn test_replay_lists_every_step() {
        let file = scenario_file(DEADLOCKED);
        let out = replay(file.path()).unwrap();
        assert!(out.contains("[0]"));
        assert!(out.contains("DEADLOCK: P0, P1, P2"));
        assert!(out.contains("[1]"));
        assert!(out.contains("error:"));
        assert!(out.contains("[2]"));
        assert!(out.contains("terminated P2"));
    }
}
