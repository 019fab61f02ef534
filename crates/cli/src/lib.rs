//! Command-line front end: loads documents through an xmlview viewer wired to
//! console collaborators and prints rows, selections or the parsed tree.

mod commands;
mod console;
mod util;

use clap::{Parser, Subcommand, ValueEnum};
use commands::{dump, select, tree};
use tracing_subscriber::EnvFilter;
use util::CliResult;

#[derive(Parser, Debug)]
#[command(name = "xmlview", version, about = "Browse XML documents as a tree of selectable rows")]
struct Cli {
    #[arg(
        long = "log-level",
        global = true,
        value_enum,
        default_value_t = LogLevel::Error,
        help = "Log level written to stderr. RUST_LOG takes precedence when set."
    )]
    log_level: LogLevel,

    #[arg(long = "no-color", global = true, help = "Disable ANSI colors in text output.")]
    no_color: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print every row the viewer renders for a document.
    Tree(tree::TreeArgs),
    /// Select rows by id and print the element details they resolve to.
    Select(select::SelectArgs),
    /// Print the parsed document as normalized XML or JSON.
    Dump(dump::DumpArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn directive(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

pub fn run() -> CliResult<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_level);
    if cli.no_color {
        owo_colors::set_override(false);
    }

    let output = execute(&cli.command)?;
    if !output.is_empty() {
        println!("{output}");
    }
    Ok(())
}

fn execute(command: &Command) -> CliResult<String> {
    match command {
        Command::Tree(args) => tree::run(args),
        Command::Select(args) => select::run(args),
        Command::Dump(args) => dump::run(args),
    }
}

fn init_tracing(level: LogLevel) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.directive()));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).try_init();
}
