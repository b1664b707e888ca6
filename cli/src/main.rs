use std::io::Read;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use command_router_core::{
    CommandError, CommandRegistry, TokenizerMode, extract_command_path, list_commands,
    tokenize_with,
};
use command_router_registry::RegistryDefinition;
use serde::Serialize;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "command-router")]
#[command(about = "Tokenize, route and parse command strings against a registry definition")]
struct Cli {
    /// Log pipeline steps to stderr.
    #[arg(long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Split a command string into tokens.
    Tokenize(TokenizeArgs),
    /// Show the command path a string routes to and the leftover tokens.
    Route(PipelineArgs),
    /// Resolve a command string into a handler and typed arguments.
    Parse(PipelineArgs),
    /// List every command in a registry definition.
    List(RegistryArgs),
    /// Validate a registry definition and print its fingerprint.
    Check(RegistryArgs),
}

#[derive(Debug, Args)]
struct TokenizeArgs {
    /// Command string (read from stdin when omitted).
    #[arg(allow_hyphen_values = true)]
    input: Option<String>,
    /// Reject unquoted shell metacharacters.
    #[arg(long)]
    strict: bool,
}

#[derive(Debug, Args)]
struct PipelineArgs {
    /// Registry definition file (.yaml, .yml or .json).
    #[arg(long)]
    registry: PathBuf,
    /// Command string (read from stdin when omitted).
    #[arg(allow_hyphen_values = true)]
    input: Option<String>,
    /// Reject unquoted shell metacharacters, overriding the definition.
    #[arg(long)]
    strict: bool,
}

#[derive(Debug, Args)]
struct RegistryArgs {
    /// Registry definition file (.yaml, .yml or .json).
    #[arg(long)]
    registry: PathBuf,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Command::Tokenize(args) => run_tokenize(args),
        Command::Route(args) => run_route(args),
        Command::Parse(args) => run_parse(args),
        Command::List(args) => run_list(args),
        Command::Check(args) => run_check(args),
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

/// Logs go to stderr so stdout stays machine-readable.
fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run_tokenize(args: TokenizeArgs) -> Result<(), String> {
    let input = read_input(args.input)?;
    match tokenize_with(&input, mode_for(args.strict)) {
        Ok(tokens) => print_json(&tokens),
        Err(err) => report_failure(err.into()),
    }
}

fn run_route(args: PipelineArgs) -> Result<(), String> {
    let (registry, mode) = load_registry(&args.registry, args.strict)?;
    let input = read_input(args.input)?;

    let tokens = match tokenize_with(&input, mode) {
        Ok(tokens) => tokens,
        Err(err) => return report_failure(err.into()),
    };
    print_json(&extract_command_path(&registry, &tokens))
}

fn run_parse(args: PipelineArgs) -> Result<(), String> {
    let (registry, mode) = load_registry(&args.registry, args.strict)?;
    let input = read_input(args.input)?;

    match registry.resolve_with(&input, mode) {
        Ok(invocation) => print_json(&invocation),
        Err(err) => report_failure(err),
    }
}

fn run_list(args: RegistryArgs) -> Result<(), String> {
    let (registry, _) = load_registry(&args.registry, false)?;
    for listing in list_commands(&registry) {
        println!("{}\t{}", listing.name, listing.description);
    }
    Ok(())
}

fn run_check(args: RegistryArgs) -> Result<(), String> {
    let definition = load_definition(&args.registry)?;
    let fingerprint = definition.fingerprint().to_string();
    let version = definition.version.clone();
    let registry = definition
        .into_registry()
        .map_err(|err| format!("Invalid registry '{}': {err}", args.registry.display()))?;

    println!(
        "Validated {} command(s) from '{}' (version {version}).",
        list_commands(&registry).len(),
        args.registry.display()
    );
    println!("fingerprint: {fingerprint}");
    Ok(())
}

fn mode_for(strict: bool) -> TokenizerMode {
    if strict {
        TokenizerMode::Strict
    } else {
        TokenizerMode::Literal
    }
}

fn read_input(input: Option<String>) -> Result<String, String> {
    if let Some(input) = input {
        return Ok(input);
    }
    let mut buffer = String::new();
    std::io::stdin()
        .read_to_string(&mut buffer)
        .map_err(|err| format!("Failed to read stdin: {err}"))?;
    Ok(buffer.trim_end_matches(['\n', '\r']).to_string())
}

fn load_definition(path: &Path) -> Result<RegistryDefinition, String> {
    RegistryDefinition::load(path)
        .map_err(|err| format!("Failed to load '{}': {err}", path.display()))
}

/// `--strict` wins over the definition's own tokenizer setting.
fn load_registry(path: &Path, strict: bool) -> Result<(CommandRegistry, TokenizerMode), String> {
    let definition = load_definition(path)?;
    let mode = if strict {
        TokenizerMode::Strict
    } else {
        definition.tokenizer_mode()
    };
    let registry = definition
        .into_registry()
        .map_err(|err| format!("Invalid registry '{}': {err}", path.display()))?;
    debug!(path = %path.display(), commands = registry.len(), ?mode, "loaded registry");
    Ok((registry, mode))
}

fn print_json<T: Serialize>(value: &T) -> Result<(), String> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|err| format!("Failed to serialize output: {err}"))?;
    println!("{json}");
    Ok(())
}

/// Prints the machine-readable record on stdout, then fails with the
/// human-readable message.
fn report_failure(err: CommandError) -> Result<(), String> {
    print_json(&err.to_record())?;
    Err(err.to_string())
}
