//! Secretstream command line tool.
//!
//! # Usage
//!
//! ```bash
//! # Create a key
//! secretstream keygen --out stream.key
//!
//! # Encrypt and decrypt files (stdin/stdout when paths are omitted)
//! secretstream encrypt --key stream.key --input notes.txt --output notes.enc
//! secretstream decrypt --key stream.key --input notes.enc --output notes.txt
//! ```

use std::{
    fs::{self, File},
    io::{self, BufReader, BufWriter, Read, Write},
    path::{Path, PathBuf},
};

use clap::{Args as ClapArgs, Parser, Subcommand};
use secretstream::Key;
use secretstream_cli::{CliError, DEFAULT_CHUNK_SIZE, PipeConfig, decrypt, encrypt, keyfile};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Chunked authenticated file encryption
#[derive(Parser, Debug)]
#[command(name = "secretstream")]
#[command(about = "Encrypt and decrypt files as chunked authenticated streams")]
#[command(version)]
struct Args {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a new key file
    Keygen {
        /// Where to write the key (must not exist)
        #[arg(short, long)]
        out: PathBuf,
    },

    /// Encrypt a file or stdin
    Encrypt(PipeArgs),

    /// Decrypt a file or stdin
    Decrypt(PipeArgs),
}

#[derive(ClapArgs, Debug)]
struct PipeArgs {
    /// Path to the hex-encoded key file
    #[arg(short, long)]
    key: PathBuf,

    /// Input file (stdin if omitted)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Output file (stdout if omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Plaintext bytes per frame; must match between encrypt and decrypt
    #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
    chunk_size: usize,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry().with(fmt::layer().with_writer(io::stderr)).with(filter).init();

    match args.command {
        Command::Keygen { out } => {
            let key = Key::generate()?;
            keyfile::store(&out, &key)?;
            tracing::info!("Wrote key to {}", out.display());
        },
        Command::Encrypt(pipe) => run(&pipe, Direction::Encrypt)?,
        Command::Decrypt(pipe) => run(&pipe, Direction::Decrypt)?,
    }

    Ok(())
}

#[derive(Debug, Clone, Copy)]
enum Direction {
    Encrypt,
    Decrypt,
}

fn run(pipe: &PipeArgs, direction: Direction) -> Result<(), CliError> {
    let config = PipeConfig { chunk_size: pipe.chunk_size };
    config.validate()?;
    let key = keyfile::load(&pipe.key)?;

    let input = open_input(pipe.input.as_deref())?;
    let output = open_output(pipe.output.as_deref())?;

    let result = match direction {
        Direction::Encrypt => encrypt(&key, input, output, &config),
        Direction::Decrypt => decrypt(&key, input, output, &config),
    };

    if let (Err(err), Some(path)) = (&result, &pipe.output) {
        tracing::warn!("Removing partial output {}: {err}", path.display());
        if let Err(remove_err) = fs::remove_file(path) {
            tracing::warn!("Failed to remove {}: {remove_err}", path.display());
        }
    }

    result.map(|_| ())
}

fn open_input(path: Option<&Path>) -> Result<Box<dyn Read>, CliError> {
    Ok(match path {
        Some(path) => Box::new(BufReader::new(File::open(path)?)),
        None => Box::new(io::stdin().lock()),
    })
}

fn open_output(path: Option<&Path>) -> Result<Box<dyn Write>, CliError> {
    Ok(match path {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(io::stdout().lock()),
    })
}
