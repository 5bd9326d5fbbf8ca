// crates/mesh-procedures-cli/src/main.rs
// ============================================================================
// Module: Mesh Procedures CLI Entry Point
// Description: Command dispatcher for procedure runs, landscapes, and probes.
// Purpose: Drive the data mesh API end to end from files or built-ins.
// Dependencies: clap, mesh-procedures-{api, config, core, fixtures}, serde_json
// ============================================================================

//! ## Overview
//! `mesh-procedures` loads configuration, resolves a procedure (from a file,
//! a built-in, or a landscape), validates it statically, and runs it against
//! the configured API. The summary goes to stdout, per-step progress to
//! stderr, and the process exits non-zero when any result failed.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub(crate) mod output;

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt::Write as _;
use std::fs;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::ArgAction;
use clap::Args;
use clap::CommandFactory;
use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
use mesh_procedures_api::HttpTransport;
use mesh_procedures_api::HttpTransportConfig;
use mesh_procedures_api::WebhookNotifier;
use mesh_procedures_config::MeshProceduresConfig;
use mesh_procedures_config::config_toml_example;
use mesh_procedures_core::ApiCallSink;
use mesh_procedures_core::EntityKind;
use mesh_procedures_core::NoopCallSink;
use mesh_procedures_core::Procedure;
use mesh_procedures_core::ProbeOutcome;
use mesh_procedures_core::ProbeReport;
use mesh_procedures_core::ProcedureExecutor;
use mesh_procedures_core::RunEnvironment;
use mesh_procedures_core::RunNotifier;
use mesh_procedures_core::RunReport;
use mesh_procedures_core::StepRegistry;
use mesh_procedures_core::SystemClock;
use mesh_procedures_core::ValidationReport;
use mesh_procedures_core::run_probes;
use mesh_procedures_core::validate_procedure;
use mesh_procedures_fixtures::FixtureEnv;
use mesh_procedures_fixtures::Landscape;
use mesh_procedures_fixtures::builtin_procedure;
use mesh_procedures_fixtures::builtins::BUILTINS;
use mesh_procedures_fixtures::probe_cases;
use serde::Serialize;
use thiserror::Error;

use crate::output::JsonlCallSink;
use crate::output::ProgressObserver;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI arguments.
#[derive(Parser, Debug)]
#[command(name = "mesh-procedures", disable_help_subcommand = true, disable_version_flag = true)]
struct Cli {
    /// Print the CLI version and exit.
    #[arg(long = "version", action = ArgAction::SetTrue, global = true)]
    show_version: bool,
    /// Selected subcommand.
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Top-level commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a procedure file or a built-in procedure against the API.
    Run(RunCommand),
    /// Expand or run landscape files.
    Landscape {
        /// Selected landscape subcommand.
        #[command(subcommand)]
        command: LandscapeCommand,
    },
    /// Check a procedure without calling the API.
    Validate(ValidateCommand),
    /// List registered step types and their aliases.
    Steps,
    /// Inspect built-in procedures.
    Builtin {
        /// Selected builtin subcommand.
        #[command(subcommand)]
        command: BuiltinCommand,
    },
    /// Send negative and edge-case requests to the create endpoints.
    Probe(ProbeCommand),
    /// Configuration utilities.
    Config {
        /// Selected config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

/// Options shared by every command that runs a procedure.
#[derive(Args, Debug, Default)]
struct RunOptions {
    /// Config file path (defaults to `MESH_PROCEDURES_CONFIG` or mesh-procedures.toml).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Write the run report as JSON.
    #[arg(long, value_name = "PATH")]
    report: Option<PathBuf>,
    /// Write every API call as JSON Lines.
    #[arg(long, value_name = "PATH")]
    transcript: Option<PathBuf>,
    /// Skip the webhook notification.
    #[arg(long = "no-notify", action = ArgAction::SetTrue)]
    no_notify: bool,
    /// Suppress per-step progress on stderr.
    #[arg(long, action = ArgAction::SetTrue)]
    quiet: bool,
}

/// Where a runnable procedure comes from.
#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
struct ProcedureSourceArgs {
    /// Procedure file (.json, .yaml, or .yml).
    #[arg(long, value_name = "PATH")]
    procedure: Option<PathBuf>,
    /// Built-in procedure name.
    #[arg(long, value_name = "NAME")]
    builtin: Option<String>,
}

/// Arguments for `run`.
#[derive(Args, Debug)]
struct RunCommand {
    /// Procedure selection.
    #[command(flatten)]
    source: ProcedureSourceArgs,
    /// Run options.
    #[command(flatten)]
    options: RunOptions,
}

/// Landscape subcommands.
#[derive(Subcommand, Debug)]
enum LandscapeCommand {
    /// Expand a landscape and run the resulting procedure.
    Run(LandscapeRunCommand),
    /// Print the procedure a landscape expands to.
    Expand(LandscapeExpandCommand),
}

/// Arguments for `landscape run`.
#[derive(Args, Debug)]
struct LandscapeRunCommand {
    /// Landscape YAML file.
    #[arg(long, value_name = "PATH")]
    file: PathBuf,
    /// Run options.
    #[command(flatten)]
    options: RunOptions,
}

/// Arguments for `landscape expand`.
#[derive(Args, Debug)]
struct LandscapeExpandCommand {
    /// Landscape YAML file.
    #[arg(long, value_name = "PATH")]
    file: PathBuf,
}

/// Arguments for `validate`.
#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
struct ValidateCommand {
    /// Procedure file (.json, .yaml, or .yml).
    #[arg(long, value_name = "PATH")]
    procedure: Option<PathBuf>,
    /// Built-in procedure name.
    #[arg(long, value_name = "NAME")]
    builtin: Option<String>,
    /// Landscape YAML file.
    #[arg(long, value_name = "PATH")]
    landscape: Option<PathBuf>,
}

/// Builtin subcommands.
#[derive(Subcommand, Debug)]
enum BuiltinCommand {
    /// List built-in procedures.
    List,
    /// Print a built-in procedure as JSON.
    Show(BuiltinShowCommand),
}

/// Arguments for `builtin show`.
#[derive(Args, Debug)]
struct BuiltinShowCommand {
    /// Built-in procedure name.
    name: String,
}

/// Entity kinds accepted by `probe --kind`.
#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
enum KindArg {
    /// Meshes.
    Mesh,
    /// Data systems.
    System,
    /// Sources.
    Source,
    /// Objects.
    Object,
    /// Products.
    Product,
}

impl From<KindArg> for EntityKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Mesh => Self::Mesh,
            KindArg::System => Self::System,
            KindArg::Source => Self::Source,
            KindArg::Object => Self::Object,
            KindArg::Product => Self::Product,
        }
    }
}

/// Arguments for `probe`.
#[derive(Args, Debug)]
struct ProbeCommand {
    /// Config file path.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Entity kinds to probe (repeatable; defaults to all).
    #[arg(long = "kind", value_enum, value_name = "KIND")]
    kinds: Vec<KindArg>,
    /// Write the probe report as JSON.
    #[arg(long, value_name = "PATH")]
    report: Option<PathBuf>,
    /// Write every API call as JSON Lines.
    #[arg(long, value_name = "PATH")]
    transcript: Option<PathBuf>,
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Load and validate a config file.
    Validate(ConfigValidateCommand),
    /// Print a complete example config.
    Example,
}

/// Arguments for `config validate`.
#[derive(Args, Debug)]
struct ConfigValidateCommand {
    /// Config file path.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`].
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();

    if cli.show_version {
        let version = env!("CARGO_PKG_VERSION");
        write_stdout_line(&format!("mesh-procedures {version}"))
            .map_err(|err| CliError::new(output_error("stdout", &err)))?;
        return Ok(ExitCode::SUCCESS);
    }

    let Some(command) = cli.command else {
        show_help()?;
        return Ok(ExitCode::SUCCESS);
    };

    match command {
        Commands::Run(command) => command_run(&command),
        Commands::Landscape {
            command,
        } => command_landscape(command),
        Commands::Validate(command) => command_validate(&command),
        Commands::Steps => command_steps(),
        Commands::Builtin {
            command,
        } => command_builtin(command),
        Commands::Probe(command) => command_probe(&command),
        Commands::Config {
            command,
        } => command_config(command),
    }
}

/// Emits the top-level help message for the CLI.
fn show_help() -> CliResult<()> {
    let mut command = Cli::command();
    command.print_help().map_err(|err| CliError::new(output_error("stdout", &err)))?;
    write_stdout_line("").map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(())
}

// ============================================================================
// SECTION: Run Commands
// ============================================================================

/// Executes the `run` command.
fn command_run(command: &RunCommand) -> CliResult<ExitCode> {
    let env = FixtureEnv::from_env();
    let procedure = resolve_procedure(
        command.source.procedure.as_deref(),
        command.source.builtin.as_deref(),
        None,
        &env,
    )?;
    execute_procedure(&procedure, &command.options)
}

/// Loads config, validates the procedure, runs it, and emits its outputs.
fn execute_procedure(procedure: &Procedure, options: &RunOptions) -> CliResult<ExitCode> {
    let config = load_config(options.config.as_deref())?;
    let executor = ProcedureExecutor::with_builtin_steps(config.executor_settings());
    ensure_valid(procedure, executor.registry())?;
    let transport = build_transport(&config)?;
    let credentials = config.credentials();
    let transcript = open_transcript(options.transcript.as_deref())?;
    let sink: &dyn ApiCallSink = match &transcript {
        Some(transcript) => transcript,
        None => &NoopCallSink,
    };
    let observer = ProgressObserver::new(!options.quiet);

    let report = executor.run(procedure, RunEnvironment {
        transport: &transport,
        credentials: &credentials,
        clock: &SystemClock,
        sink,
        observer: &observer,
    });

    write_stdout_line(&report.summary_text())
        .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    if let Some(path) = &options.report {
        write_json_file(path, &report)?;
    }
    finish_transcript(transcript, options.transcript.as_deref())?;
    if !options.no_notify {
        notify_report(&config, &report);
    }
    Ok(exit_code_for(report.has_failures()))
}

/// Fails when static validation reports issues, listing them on stderr.
fn ensure_valid(procedure: &Procedure, registry: &StepRegistry) -> CliResult<()> {
    let report = validate_procedure(procedure, registry);
    if report.is_valid() {
        return Ok(());
    }
    write_stderr_line(render_validation_text(procedure, &report).trim_end())
        .map_err(|err| CliError::new(output_error("stderr", &err)))?;
    Err(CliError::new(format!(
        "procedure {} failed validation; nothing was sent",
        procedure.display_name()
    )))
}

/// Sends the summary to the configured webhook, warning on failure.
fn notify_report(config: &MeshProceduresConfig, report: &RunReport) {
    let Some(url) = config.report.active_webhook() else {
        return;
    };
    let outcome = WebhookNotifier::new(Some(url), config.report.webhook_target.clone())
        .and_then(|notifier| notifier.notify(report));
    if let Err(err) = outcome {
        let _ = write_stderr_line(&format!("warning: {err}"));
    }
}

// ============================================================================
// SECTION: Landscape Commands
// ============================================================================

/// Dispatches landscape subcommands.
fn command_landscape(command: LandscapeCommand) -> CliResult<ExitCode> {
    match command {
        LandscapeCommand::Run(command) => {
            let procedure = expand_landscape(&command.file, &FixtureEnv::from_env())?;
            execute_procedure(&procedure, &command.options)
        }
        LandscapeCommand::Expand(command) => {
            let procedure = expand_landscape(&command.file, &FixtureEnv::from_env())?;
            write_json_stdout(&procedure)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Loads a landscape file and expands it.
fn expand_landscape(path: &Path, env: &FixtureEnv) -> CliResult<Procedure> {
    Landscape::load(path)
        .and_then(|landscape| landscape.to_procedure(env))
        .map_err(|err| CliError::new(format!("{}: {err}", path.display())))
}

// ============================================================================
// SECTION: Validate Command
// ============================================================================

/// Executes the `validate` command.
fn command_validate(command: &ValidateCommand) -> CliResult<ExitCode> {
    let procedure = resolve_procedure(
        command.procedure.as_deref(),
        command.builtin.as_deref(),
        command.landscape.as_deref(),
        &FixtureEnv::from_env(),
    )?;
    let report = validate_procedure(&procedure, &StepRegistry::builtin());
    write_stdout_line(render_validation_text(&procedure, &report).trim_end())
        .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(exit_code_for(!report.is_valid()))
}

/// Renders validation results.
fn render_validation_text(procedure: &Procedure, report: &ValidationReport) -> String {
    let name = procedure.display_name();
    if report.is_valid() {
        return format!("{name}: {} steps, no issues\n", procedure.steps.len());
    }
    let mut text = format!("{name}: {} issue(s)\n", report.issues.len());
    for issue in &report.issues {
        let _ = writeln!(text, "  {}: {}", issue.label, issue.message);
    }
    text
}

// ============================================================================
// SECTION: Catalog Commands
// ============================================================================

/// Executes the `steps` command.
fn command_steps() -> CliResult<ExitCode> {
    let text = render_steps_text(&StepRegistry::builtin());
    write_stdout_line(text.trim_end()).map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

/// Renders step types followed by aliases.
fn render_steps_text(registry: &StepRegistry) -> String {
    let mut text = String::from("Step types:\n");
    for step_type in registry.step_types() {
        let _ = writeln!(text, "  {step_type}");
    }
    let aliases: Vec<(&str, &str)> = registry.aliases().collect();
    if !aliases.is_empty() {
        text.push_str("Aliases:\n");
        for (alias, target) in aliases {
            let _ = writeln!(text, "  {alias} -> {target}");
        }
    }
    text
}

/// Dispatches builtin subcommands.
fn command_builtin(command: BuiltinCommand) -> CliResult<ExitCode> {
    match command {
        BuiltinCommand::List => {
            write_stdout_line(render_builtin_list_text().trim_end())
                .map_err(|err| CliError::new(output_error("stdout", &err)))?;
            Ok(ExitCode::SUCCESS)
        }
        BuiltinCommand::Show(command) => {
            let procedure = builtin_or_error(&command.name, &FixtureEnv::from_env())?;
            write_json_stdout(&procedure)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Renders the built-in catalog.
fn render_builtin_list_text() -> String {
    let width = BUILTINS.iter().map(|builtin| builtin.name.len()).max().unwrap_or(0);
    BUILTINS
        .iter()
        .map(|builtin| format!("{:<width$}  {}\n", builtin.name, builtin.summary))
        .collect()
}

// ============================================================================
// SECTION: Probe Command
// ============================================================================

/// Executes the `probe` command.
fn command_probe(command: &ProbeCommand) -> CliResult<ExitCode> {
    let config = load_config(command.config.as_deref())?;
    let transport = build_transport(&config)?;
    let credentials = config.credentials();
    let kinds: Vec<EntityKind> = if command.kinds.is_empty() {
        EntityKind::ALL.to_vec()
    } else {
        command.kinds.iter().copied().map(EntityKind::from).collect()
    };
    let cases = probe_cases(&FixtureEnv::from_env(), &kinds);
    let transcript = open_transcript(command.transcript.as_deref())?;
    let sink: &dyn ApiCallSink = match &transcript {
        Some(transcript) => transcript,
        None => &NoopCallSink,
    };

    let report = run_probes(&cases, &transport, &credentials, sink);

    write_stdout_line(render_probe_text(&report).trim_end())
        .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    if let Some(path) = &command.report {
        write_json_file(path, &report)?;
    }
    finish_transcript(transcript, command.transcript.as_deref())?;
    Ok(exit_code_for(!report.logged_in || report.has_failures()))
}

/// Renders one line per probe followed by counts.
fn render_probe_text(report: &ProbeReport) -> String {
    let mut text = String::new();
    if !report.logged_in {
        text.push_str("login failed; every probe was skipped\n");
    }
    for outcome in &report.outcomes {
        let _ = writeln!(text, "{}", render_probe_line(outcome));
    }
    let counts = report.counts();
    let _ = writeln!(
        text,
        "Probes: {} total, {} passed, {} failed, {} skipped",
        counts.total, counts.passed, counts.failed, counts.skipped
    );
    text
}

/// Renders one probe outcome.
fn render_probe_line(outcome: &ProbeOutcome) -> String {
    let status = outcome.http_status.map_or_else(|| "-".to_string(), |code| code.to_string());
    let mut line =
        format!("[{}] {} ({status}): {}", outcome.status.tag(), outcome.case.name, outcome.message);
    if let Some(error) = &outcome.cleanup_error {
        let _ = write!(line, " [cleanup failed: {error}]");
    }
    line
}

// ============================================================================
// SECTION: Config Commands
// ============================================================================

/// Dispatches config subcommands.
fn command_config(command: ConfigCommand) -> CliResult<ExitCode> {
    match command {
        ConfigCommand::Validate(command) => {
            let config = load_config(command.config.as_deref())?;
            let source = config
                .source_path
                .as_ref()
                .map_or_else(|| "built-in defaults".to_string(), |path| path.display().to_string());
            write_stdout_line(&format!("config ok: {source}"))
                .map_err(|err| CliError::new(output_error("stdout", &err)))?;
            Ok(ExitCode::SUCCESS)
        }
        ConfigCommand::Example => {
            write_stdout_line(config_toml_example().trim_end())
                .map_err(|err| CliError::new(output_error("stdout", &err)))?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

// ============================================================================
// SECTION: Shared Helpers
// ============================================================================

/// Loads configuration.
fn load_config(path: Option<&Path>) -> CliResult<MeshProceduresConfig> {
    MeshProceduresConfig::load(path)
        .map_err(|err| CliError::new(format!("failed to load config: {err}")))
}

/// Builds the HTTP transport from API settings.
fn build_transport(config: &MeshProceduresConfig) -> CliResult<HttpTransport> {
    let base_url =
        config.api.parsed_base_url().map_err(|err| CliError::new(err.to_string()))?;
    HttpTransport::new(HttpTransportConfig {
        base_url,
        account: config.api.account.clone(),
        timeout: config.api.timeout(),
        max_response_bytes: config.api.max_response_bytes,
        user_agent: config.api.user_agent.clone(),
    })
    .map_err(|err| CliError::new(format!("failed to build http transport: {err}")))
}

/// Resolves exactly one procedure source.
fn resolve_procedure(
    procedure: Option<&Path>,
    builtin: Option<&str>,
    landscape: Option<&Path>,
    env: &FixtureEnv,
) -> CliResult<Procedure> {
    match (procedure, builtin, landscape) {
        (Some(path), None, None) => Procedure::load(path)
            .map_err(|err| CliError::new(format!("{}: {err}", path.display()))),
        (None, Some(name), None) => builtin_or_error(name, env),
        (None, None, Some(path)) => expand_landscape(path, env),
        _ => Err(CliError::new(
            "exactly one of --procedure, --builtin, or --landscape is required".to_string(),
        )),
    }
}

/// Builds a built-in procedure or lists the valid names.
fn builtin_or_error(name: &str, env: &FixtureEnv) -> CliResult<Procedure> {
    builtin_procedure(name, env).ok_or_else(|| {
        let available: Vec<&str> = BUILTINS.iter().map(|builtin| builtin.name).collect();
        CliError::new(format!(
            "unknown builtin procedure: {name} (available: {})",
            available.join(", ")
        ))
    })
}

/// Opens the transcript file when requested.
fn open_transcript(path: Option<&Path>) -> CliResult<Option<JsonlCallSink>> {
    path.map(|path| {
        JsonlCallSink::create(path).map_err(|err| {
            CliError::new(format!("failed to create transcript {}: {err}", path.display()))
        })
    })
    .transpose()
}

/// Flushes the transcript, if one was opened.
fn finish_transcript(transcript: Option<JsonlCallSink>, path: Option<&Path>) -> CliResult<()> {
    let Some(transcript) = transcript else {
        return Ok(());
    };
    let label = path.map_or_else(String::new, |path| path.display().to_string());
    transcript
        .finish()
        .map(|_| ())
        .map_err(|err| CliError::new(format!("failed to write transcript {label}: {err}")))
}

/// Maps a failure flag to an exit code.
fn exit_code_for(failed: bool) -> ExitCode {
    if failed { ExitCode::FAILURE } else { ExitCode::SUCCESS }
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Serializes a value as pretty JSON.
fn pretty_json<T: Serialize>(value: &T) -> CliResult<String> {
    serde_json::to_string_pretty(value)
        .map_err(|err| CliError::new(format!("failed to serialize json: {err}")))
}

/// Writes a value as pretty JSON to stdout.
fn write_json_stdout<T: Serialize>(value: &T) -> CliResult<()> {
    let text = pretty_json(value)?;
    write_stdout_line(&text).map_err(|err| CliError::new(output_error("stdout", &err)))
}

/// Writes a value as pretty JSON to a file.
fn write_json_file<T: Serialize>(path: &Path, value: &T) -> CliResult<()> {
    let mut text = pretty_json(value)?;
    text.push('\n');
    fs::write(path, text)
        .map_err(|err| CliError::new(format!("failed to write {}: {err}", path.display())))
}

/// Writes a line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes a line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Formats an output error message.
fn output_error(stream: &str, error: &std::io::Error) -> String {
    format!("failed to write to {stream}: {error}")
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
