use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use cqlite_wire::{TypeFactory, ValueConstructors};
use log::debug;
use std::path::PathBuf;

mod cli;
mod commands;
mod config;
mod formatter;

#[derive(Parser)]
#[command(name = "cqlite-wire")]
#[command(about = "Decode values and result rows encoded in the CQL native protocol")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(author = "CQLite Team")]
struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Verbose output (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output format
    #[arg(long, value_enum, default_value = "plain", global = true)]
    format: cli::OutputFormat,

    /// Native protocol version the data was encoded with
    #[arg(short, long, value_name = "N", global = true)]
    protocol_version: Option<u8>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode a single value
    Decode {
        /// CQL type expression, e.g. "map<text, frozen<list<int>>>"
        type_expr: String,
        /// Value bytes as hex
        hex: String,
    },
    /// Decode a result set of length-prefixed cells
    Rows {
        /// Column types separated by ';', e.g. "int;list<text>"
        #[arg(long)]
        columns: String,
        /// Number of rows to decode
        #[arg(long)]
        count: usize,
        /// Row bytes as hex
        hex: Option<String>,
        /// Read raw row bytes from a file instead
        #[arg(long, value_name = "FILE")]
        file: Option<PathBuf>,
    },
    /// List every type name the resolver accepts
    Names,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match (cli.quiet, cli.verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, 2) => "debug",
        (false, _) => "trace",
    };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    debug!("Starting cqlite-wire v{}", env!("CARGO_PKG_VERSION"));

    let config = config::Config::load(cli.config)?;

    let mut decode_config = config.decode.clone();
    if let Some(protocol_version) = cli.protocol_version {
        decode_config.protocol_version = protocol_version;
    }
    let factory = TypeFactory::from_config(ValueConstructors::native(), &decode_config)
        .with_context(|| "Invalid decode settings")?;
    let protocol_version = decode_config.protocol_version;

    let output = match cli.command {
        Commands::Decode { type_expr, hex } => {
            let raw = cli::parse_hex(&hex)?;
            commands::decode_value(&factory, &type_expr, &raw, protocol_version, cli.format)?
        }
        Commands::Rows {
            columns,
            count,
            hex,
            file,
        } => {
            let columns = cli::parse_columns(&columns)?;
            let raw = cli::read_input(hex.as_deref(), file.as_deref())?;
            commands::decode_rows(
                &factory,
                &columns,
                &raw,
                count,
                protocol_version,
                cli.format,
                &config.output,
            )?
        }
        Commands::Names => commands::list_names(cli.format)?,
    };

    println!("{}", output);
    Ok(())
}
