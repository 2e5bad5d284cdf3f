//! alphaplan - solve POMDP models and query their alpha-vector policies.
//!
//! The binary wraps the library for shell use:
//! - Running the external solver, simulator and evaluator
//! - Answering action/value queries against a policy file
//! - Stepping a belief through discrete dynamics
//! - Inspecting policies and configuration

use ap_common::{format_error_human, Error, OutputFormat, Result, StructuredError, SCHEMA_VERSION};
use ap_config::{PolicyRunOptions, SolverOptions};
use ap_core::belief::{BeliefUpdater, DiscreteDynamics, DiscreteUpdater};
use ap_core::config::{
    self, get_preset, list_presets, PresetName, ResolvedConfig, CONFIG_SCHEMA_VERSION,
};
use ap_core::exit_codes::ExitCode;
use ap_core::logging::{
    event_names, generate_run_id, init_logging, LogConfig, LogFormat, LogLevel, Stage,
};
use ap_core::model::Model;
use ap_core::policy::{
    utilities, AlphaVectorSet, PolicyExport, PolicyHandle, PolicyInfo, Selection,
    ACTION_INDEX_OFFSET,
};
use ap_core::solver::{Orchestrator, ToolKind, ToolOutput};
use clap::{Args, Parser, Subcommand};
use serde_json::{json, Value};
use std::fmt::Write as _;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;

/// alphaplan - point-based POMDP solving and alpha-vector policy queries
#[derive(Parser)]
#[command(name = "alphaplan")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalOpts,
}

/// Global options available to all commands
#[derive(Args, Debug)]
struct GlobalOpts {
    /// Path to alphaplan.json (overrides ALPHAPLAN_CONFIG and XDG lookup)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "json")]
    format: OutputFormat,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Log format on stderr
    #[arg(long, global = true, value_enum)]
    log_format: Option<LogFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the solver on a model and write a policy file
    Solve(SolveArgs),

    /// Simulate a policy with the external simulator
    Simulate(PolicyRunArgs),

    /// Evaluate a policy with the external evaluator
    Evaluate(PolicyRunArgs),

    /// Best action and value for a belief
    Query(QueryArgs),

    /// Advance a belief by one action/observation step
    Update(UpdateArgs),

    /// Show a policy's provenance and vector table
    Inspect(InspectArgs),

    /// Configuration management
    Config(ConfigArgs),

    /// Print version information
    Version,
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Commands::Solve(_) => "solve",
            Commands::Simulate(_) => "simulate",
            Commands::Evaluate(_) => "evaluate",
            Commands::Query(_) => "query",
            Commands::Update(_) => "update",
            Commands::Inspect(_) => "inspect",
            Commands::Config(_) => "config",
            Commands::Version => "version",
        }
    }
}

// ============================================================================
// Command argument structs
// ============================================================================

#[derive(Args, Debug)]
struct SolveArgs {
    /// Model file
    model: PathBuf,

    /// Where the solver writes the policy
    #[arg(long, short = 'o')]
    output: PathBuf,

    /// Named option bundle (quick, balanced, thorough)
    #[arg(long)]
    preset: Option<PresetName>,

    #[command(flatten)]
    solver: SolverFlags,

    /// Load the written policy and report on it
    #[arg(long)]
    load: bool,
}

/// Solver flags; each overrides the preset and config file value.
#[derive(Args, Debug, Default)]
struct SolverFlags {
    /// Use the solver's fast data structures
    #[arg(long)]
    fast: bool,

    /// Randomize belief point sampling
    #[arg(long)]
    randomization: bool,

    /// Target bound gap at the initial belief
    #[arg(long)]
    precision: Option<f64>,

    /// Solve time limit (seconds)
    #[arg(long)]
    timeout: Option<f64>,

    /// Memory limit (MB)
    #[arg(long)]
    memory: Option<f64>,

    #[arg(long)]
    trial_improvement_factor: Option<f64>,

    /// Write intermediate policies every N seconds
    #[arg(long)]
    policy_interval: Option<f64>,
}

impl SolverFlags {
    fn to_options(&self) -> SolverOptions {
        SolverOptions {
            fast: self.fast,
            randomization: self.randomization,
            precision: self.precision,
            timeout: self.timeout,
            memory: self.memory,
            trial_improvement_factor: self.trial_improvement_factor,
            policy_interval: self.policy_interval,
        }
    }
}

#[derive(Args, Debug)]
struct PolicyRunArgs {
    /// Model file
    model: PathBuf,

    /// Policy file produced by `solve`
    #[arg(long)]
    policy: PathBuf,

    /// Random seed
    #[arg(long, allow_negative_numbers = true)]
    srand: Option<i64>,

    /// Steps per trajectory
    #[arg(long, alias = "simLen")]
    sim_len: Option<u32>,

    /// Number of trajectories
    #[arg(long, alias = "simNum")]
    sim_num: Option<u32>,

    /// File the tool writes its results to
    #[arg(long)]
    output_file: Option<PathBuf>,
}

impl PolicyRunArgs {
    fn to_options(&self) -> PolicyRunOptions {
        PolicyRunOptions {
            srand: self.srand,
            sim_len: self.sim_len,
            sim_num: self.sim_num,
            output_file: self.output_file.clone(),
        }
    }
}

#[derive(Args, Debug)]
struct QueryArgs {
    /// Policy file
    policy: PathBuf,

    /// Belief over hidden states, comma separated (e.g. 0.3,0.7)
    #[arg(long, value_delimiter = ',', required = true, allow_negative_numbers = true)]
    belief: Vec<f64>,

    /// Restrict to vectors for this observed state (zero-based)
    #[arg(long)]
    observed: Option<u32>,

    /// Include the utility of every vector
    #[arg(long)]
    explain: bool,
}

#[derive(Args, Debug)]
struct UpdateArgs {
    /// Dynamics tables (JSON with `transition` and `observation`)
    #[arg(long)]
    dynamics: PathBuf,

    /// Current belief, comma separated; uniform when omitted
    #[arg(long, value_delimiter = ',')]
    belief: Option<Vec<f64>>,

    /// Action taken, one-based as reported by `query`
    #[arg(long)]
    action: u32,

    /// Observation received (zero-based)
    #[arg(long)]
    observation: u32,

    /// Policy to query at the updated belief
    #[arg(long)]
    policy: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct InspectArgs {
    /// Policy file
    policy: PathBuf,

    /// Coefficients shown per vector in markdown output
    #[arg(long, default_value_t = 8)]
    max_coefficients: usize,
}

#[derive(Args, Debug)]
struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Show the effective configuration and where it came from
    Show,
    /// Validate a configuration file
    Validate {
        /// File to validate (default: the resolved config)
        path: Option<PathBuf>,
    },
    /// List solver presets
    Presets,
}

// ============================================================================
// Entry point
// ============================================================================

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            if matches!(
                err.kind(),
                clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion
            ) {
                err.exit();
            }
            let _ = err.print();
            std::process::exit(ExitCode::ArgsError.as_i32());
        }
    };

    let log_config = LogConfig::from_env(
        LogLevel::from_verbosity(cli.global.verbose, cli.global.quiet),
        cli.global.log_format,
    );
    init_logging(&log_config);

    let ctx = Ctx::new(&cli.global);
    let span = tracing::info_span!("run", run_id = %ctx.run_id);
    let _enter = span.enter();
    tracing::debug!(
        target: event_names::RUN_STARTED,
        stage = %Stage::Init,
        command = cli.command.name(),
        "run started"
    );

    let result = match &cli.command {
        Commands::Solve(args) => run_solve(&ctx, args),
        Commands::Simulate(args) => run_policy_tool(&ctx, ToolKind::Simulator, args),
        Commands::Evaluate(args) => run_policy_tool(&ctx, ToolKind::Evaluator, args),
        Commands::Query(args) => run_query(&ctx, args),
        Commands::Update(args) => run_update(&ctx, args),
        Commands::Inspect(args) => run_inspect(&ctx, args),
        Commands::Config(args) => run_config(&ctx, args),
        Commands::Version => print_version(&ctx),
    };

    let exit_code = match result {
        Ok(()) => ExitCode::Clean,
        Err(err) => ctx.report_error(&err),
    };
    tracing::debug!(
        target: event_names::RUN_FINISHED,
        exit_code = exit_code.as_i32(),
        "run finished"
    );

    std::process::exit(exit_code.as_i32());
}

/// Per-invocation output settings.
struct Ctx {
    format: OutputFormat,
    run_id: String,
    use_color: bool,
    config: Option<PathBuf>,
}

impl Ctx {
    fn new(global: &GlobalOpts) -> Self {
        Ctx {
            format: global.format,
            run_id: generate_run_id(),
            use_color: !global.no_color && std::io::stderr().is_terminal(),
            config: global.config.clone(),
        }
    }

    fn load_config(&self) -> Result<ResolvedConfig> {
        Ok(config::load_config(self.config.as_deref())?)
    }

    /// Write a command's payload to stdout in the selected format.
    fn emit(
        &self,
        command: &str,
        result: Value,
        md: impl FnOnce() -> String,
        summary: impl FnOnce() -> String,
    ) -> Result<()> {
        match self.format {
            OutputFormat::Json => {
                let payload = json!({
                    "schema_version": SCHEMA_VERSION,
                    "run_id": self.run_id,
                    "generated_at": chrono::Utc::now().to_rfc3339(),
                    "command": command,
                    "status": "ok",
                    "result": result,
                });
                println!("{}", serde_json::to_string_pretty(&payload)?);
            }
            OutputFormat::Md => print!("{}", md()),
            OutputFormat::Summary => println!("{}", summary()),
        }
        Ok(())
    }

    /// Write `err` to stderr and pick the exit code.
    fn report_error(&self, err: &Error) -> ExitCode {
        let exit_code = ExitCode::from_error(err);
        match exit_code {
            ExitCode::ConfigError => tracing::debug!(
                target: event_names::CONFIG_ERROR,
                code = err.code(),
                error = %err,
                "configuration error"
            ),
            ExitCode::InternalError => tracing::error!(
                target: event_names::INTERNAL_ERROR,
                code = err.code(),
                error = %err,
                "internal error"
            ),
            _ => {}
        }
        match self.format {
            OutputFormat::Json => {
                let structured = StructuredError::from(err);
                let payload = json!({
                    "schema_version": SCHEMA_VERSION,
                    "run_id": self.run_id,
                    "status": "error",
                    "exit_code": exit_code.as_i32(),
                    "exit_code_name": exit_code.code_name(),
                    "error": structured,
                });
                match serde_json::to_string_pretty(&payload) {
                    Ok(text) => eprintln!("{}", text),
                    Err(_) => eprintln!("{}", structured.to_json()),
                }
            }
            OutputFormat::Summary => {
                eprintln!("[{}] error {}: {}", self.run_id, err.code(), err);
            }
            OutputFormat::Md => eprintln!("{}", format_error_human(err, self.use_color)),
        }
        exit_code
    }
}

// ============================================================================
// Command implementations
// ============================================================================

fn run_solve(ctx: &Ctx, args: &SolveArgs) -> Result<()> {
    let resolved = ctx.load_config()?;
    let mut options = resolved.config.solver.clone();
    if let Some(preset) = args.preset {
        options = options.merge(&get_preset(preset));
    }
    let options = options.merge(&args.solver.to_options());

    let model = Model::new(args.model.clone());
    let orchestrator = Orchestrator::system(resolved.tools.clone());
    let (output, info) = if args.load {
        let (handle, output) = orchestrator.solve_and_load(model, &args.output, &options)?;
        (output, Some(handle.info()))
    } else {
        (orchestrator.solve(&model, &args.output, &options)?, None)
    };

    let result = json!({
        "model": args.model,
        "policy": args.output,
        "preset": args.preset.map(|p| p.as_str()),
        "options": options,
        "tool": tool_output_json(&output),
        "policy_info": info.as_deref(),
    });
    ctx.emit(
        "solve",
        result,
        || {
            let mut md = String::from("# Solve\n\n");
            let _ = writeln!(md, "- model: `{}`", args.model.display());
            let _ = writeln!(md, "- policy: `{}`", args.output.display());
            md.push_str(&tool_output_md(&output));
            if let Some(info) = &info {
                md.push('\n');
                md.push_str(&policy_info_md(info));
            }
            md
        },
        || {
            let vectors = info
                .as_ref()
                .map(|i| format!(" ({} vectors)", i.vectors))
                .unwrap_or_default();
            format!(
                "solved {} -> {} in {} ms{}",
                args.model.display(),
                args.output.display(),
                output.duration.as_millis(),
                vectors
            )
        },
    )
}

fn run_policy_tool(ctx: &Ctx, kind: ToolKind, args: &PolicyRunArgs) -> Result<()> {
    let resolved = ctx.load_config()?;
    let model = Model::new(args.model.clone());
    let orchestrator = Orchestrator::system(resolved.tools.clone());
    let (options, output) = match kind {
        ToolKind::Evaluator => {
            let options = resolved.config.evaluator.merge(&args.to_options());
            let output = orchestrator.evaluate(&model, &args.policy, &options)?;
            (options, output)
        }
        _ => {
            let options = resolved.config.simulator.merge(&args.to_options());
            let output = orchestrator.simulate(&model, &args.policy, &options)?;
            (options, output)
        }
    };

    let command = match kind {
        ToolKind::Evaluator => "evaluate",
        _ => "simulate",
    };
    let result = json!({
        "model": args.model,
        "policy": args.policy,
        "options": options,
        "tool": tool_output_json(&output),
    });
    ctx.emit(
        command,
        result,
        || {
            let mut md = format!("# {}\n\n", capitalize(command));
            let _ = writeln!(md, "- model: `{}`", args.model.display());
            let _ = writeln!(md, "- policy: `{}`", args.policy.display());
            md.push_str(&tool_output_md(&output));
            md
        },
        || {
            format!(
                "{} {} with {} in {} ms",
                command,
                args.model.display(),
                args.policy.display(),
                output.duration.as_millis()
            )
        },
    )
}

fn run_query(ctx: &Ctx, args: &QueryArgs) -> Result<()> {
    let handle = PolicyHandle::load(Model::new(args.policy.clone()), &args.policy)?;
    let selection = match args.observed {
        Some(state) => handle.select_observed(&args.belief, state)?,
        None => handle.select(&args.belief)?,
    };
    let info = handle.info();

    let explained = if args.explain {
        let set = handle.vectors();
        let values = utilities(&set, &args.belief)?;
        Some(
            set.iter()
                .zip(values)
                .map(|(v, utility)| {
                    json!({
                        "index": v.index,
                        "action": v.action + ACTION_INDEX_OFFSET,
                        "observable_state": v.observable_state,
                        "utility": utility,
                        "eligible": args.observed.map_or(true, |s| v.observable_state == Some(s)),
                    })
                })
                .collect::<Vec<_>>(),
        )
    } else {
        None
    };

    let mut result = selection_json(&selection);
    result["observed_state"] = json!(args.observed);
    result["belief"] = json!(args.belief);
    result["policy"] = json!({
        "source": info.source,
        "sha256": info.sha256,
        "vectors": info.vectors,
        "dimension": info.dimension,
    });
    if let Some(rows) = &explained {
        result["utilities"] = json!(rows);
    }

    ctx.emit(
        "query",
        result,
        || {
            let mut md = String::from("# Query\n\n");
            let _ = writeln!(md, "- action: {}", selection.action);
            let _ = writeln!(md, "- value: {}", selection.value);
            let _ = writeln!(md, "- vector: {}", selection.vector_index);
            if let Some(rows) = &explained {
                md.push_str("\n| # | action | obs | utility |\n|---|--------|-----|---------|\n");
                for row in rows {
                    let _ = writeln!(
                        md,
                        "| {} | {} | {} | {} |",
                        row["index"],
                        row["action"],
                        row["observable_state"],
                        row["utility"]
                    );
                }
            }
            md
        },
        || {
            format!(
                "action {} (value {}, vector {})",
                selection.action, selection.value, selection.vector_index
            )
        },
    )
}

fn run_update(ctx: &Ctx, args: &UpdateArgs) -> Result<()> {
    let dynamics = DiscreteDynamics::from_json_file(&args.dynamics)?;

    let (prior, posterior, next) = match &args.policy {
        Some(policy) => {
            let model = Model::new(args.dynamics.clone()).with_dynamics(dynamics);
            let handle = PolicyHandle::load(model, policy)?;
            let updater = handle.updater()?;
            let prior = updater.initialize(args.belief.as_deref())?;
            let posterior = updater.update(&prior, args.action, args.observation)?;
            let next = handle.select(&posterior)?;
            (prior, posterior, Some(next))
        }
        None => {
            let updater = DiscreteUpdater::new(Arc::new(dynamics));
            let prior = updater.initialize(args.belief.as_deref())?;
            let posterior = updater.update(&prior, args.action, args.observation)?;
            (prior, posterior, None)
        }
    };

    let result = json!({
        "prior": prior,
        "action": args.action,
        "observation": args.observation,
        "belief": posterior,
        "next": next.as_ref().map(selection_json),
    });
    ctx.emit(
        "update",
        result,
        || {
            let mut md = String::from("# Belief update\n\n");
            let _ = writeln!(md, "- prior: {:?}", prior);
            let _ = writeln!(
                md,
                "- action {}, observation {}",
                args.action, args.observation
            );
            let _ = writeln!(md, "- belief: {:?}", posterior);
            if let Some(next) = &next {
                let _ = writeln!(md, "- next action: {} (value {})", next.action, next.value);
            }
            md
        },
        || {
            let belief = posterior
                .iter()
                .map(|p| format!("{:.4}", p))
                .collect::<Vec<_>>()
                .join(",");
            match &next {
                Some(next) => format!("belief {} -> action {}", belief, next.action),
                None => format!("belief {}", belief),
            }
        },
    )
}

fn run_inspect(ctx: &Ctx, args: &InspectArgs) -> Result<()> {
    let (set, info) = AlphaVectorSet::load_with_info(&args.policy)?;
    let export = PolicyExport::new(&set, info);
    let result = serde_json::to_value(&export)?;
    ctx.emit(
        "inspect",
        result,
        || {
            let mut md = policy_info_md(&export.info);
            md.push('\n');
            md.push_str(&export.to_markdown(args.max_coefficients));
            md
        },
        || {
            format!(
                "{}: {} vectors, {} states, actions {:?}{}",
                args.policy.display(),
                export.info.vectors,
                export.info.dimension,
                export.info.actions,
                if export.info.observable {
                    ", observable"
                } else {
                    ""
                }
            )
        },
    )
}

fn run_config(ctx: &Ctx, args: &ConfigArgs) -> Result<()> {
    match &args.command {
        ConfigCommands::Show => {
            let resolved = ctx.load_config()?;
            let snapshot = resolved.snapshot();
            let result = json!({
                "snapshot": snapshot,
                "config": resolved.config,
            });
            ctx.emit(
                "config show",
                result,
                || {
                    let mut md = String::from("# Configuration\n\n");
                    let _ = writeln!(md, "- source: {}", snapshot.source);
                    if let Some(path) = &snapshot.path {
                        let _ = writeln!(md, "- path: `{}`", path.display());
                    }
                    let _ = writeln!(md, "- solver: `{}`", snapshot.tools.solver.display());
                    let _ = writeln!(md, "- simulator: `{}`", snapshot.tools.simulator.display());
                    let _ = writeln!(md, "- evaluator: `{}`", snapshot.tools.evaluator.display());
                    md
                },
                || format!("config from {}", snapshot.source),
            )
        }
        ConfigCommands::Validate { path } => {
            let (path, hash) = match path {
                Some(path) => {
                    let (_, hash) = config::load_config_file(path)?;
                    (Some(path.clone()), Some(hash))
                }
                None => {
                    let resolved = ctx.load_config()?;
                    (resolved.path, resolved.hash)
                }
            };
            let result = json!({
                "valid": true,
                "path": path,
                "sha256": hash,
                "schema_version": CONFIG_SCHEMA_VERSION,
            });
            let shown = path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "built-in defaults".to_string());
            ctx.emit(
                "config validate",
                result,
                || format!("# Configuration\n\n`{}` is valid.\n", shown),
                || format!("{}: valid", shown),
            )
        }
        ConfigCommands::Presets => {
            let presets = list_presets();
            let result = serde_json::to_value(&presets)?;
            ctx.emit(
                "config presets",
                result,
                || {
                    let mut md = String::from("# Solver presets\n\n");
                    for preset in &presets {
                        let _ = writeln!(md, "- **{}**: {}", preset.name, preset.description);
                    }
                    md
                },
                || {
                    presets
                        .iter()
                        .map(|p| p.name.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                },
            )
        }
    }
}

fn print_version(ctx: &Ctx) -> Result<()> {
    let result = json!({
        "alphaplan_version": env!("CARGO_PKG_VERSION"),
        "rust_version": env!("CARGO_PKG_RUST_VERSION"),
        "config_schema_version": CONFIG_SCHEMA_VERSION,
    });
    ctx.emit(
        "version",
        result,
        || {
            format!(
                "alphaplan {}\nschema version: {}\n",
                env!("CARGO_PKG_VERSION"),
                SCHEMA_VERSION
            )
        },
        || format!("alphaplan {}", env!("CARGO_PKG_VERSION")),
    )
}

// ============================================================================
// Rendering helpers
// ============================================================================

fn selection_json(selection: &Selection) -> Value {
    json!({
        "action": selection.action,
        "value": selection.value,
        "vector_index": selection.vector_index,
    })
}

fn tool_output_json(output: &ToolOutput) -> Value {
    json!({
        "command": output.command,
        "args": output.args,
        "exit_code": output.exit_code,
        "duration_ms": output.duration.as_millis() as u64,
        "stdout": output.stdout_str(),
        "stderr": output.stderr_str(),
    })
}

fn tool_output_md(output: &ToolOutput) -> String {
    let mut md = String::new();
    let _ = writeln!(
        md,
        "- command: `{} {}`",
        output.command,
        output.args.join(" ")
    );
    let _ = writeln!(md, "- duration: {} ms", output.duration.as_millis());
    let stdout = output.stdout_str();
    if !stdout.trim().is_empty() {
        let _ = write!(md, "\n```\n{}\n```\n", stdout.trim_end());
    }
    md
}

fn policy_info_md(info: &PolicyInfo) -> String {
    let mut md = String::from("## Policy\n\n");
    if let Some(source) = &info.source {
        let _ = writeln!(md, "- source: `{}`", source.display());
    }
    if let Some(sha) = &info.sha256 {
        let _ = writeln!(md, "- sha256: `{}`", sha);
    }
    if let Some(model) = &info.model {
        let _ = writeln!(md, "- model: {}", model);
    }
    let _ = writeln!(md, "- vectors: {}", info.vectors);
    let _ = writeln!(md, "- dimension: {}", info.dimension);
    let _ = writeln!(md, "- actions (zero-based): {:?}", info.actions);
    if info.observable {
        let _ = writeln!(md, "- observable states: {:?}", info.observable_states);
    }
    md
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
