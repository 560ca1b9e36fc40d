use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};

use clap::{Args, Subcommand};

use crate::exit::{io_error, CliResult};
use crate::output::OutputFormat;

pub mod decode;
pub mod encode;
pub mod replay;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Encode environment parameters into a side-channel stream.
    Encode(EncodeArgs),
    /// Print the frames of a side-channel stream.
    Decode(DecodeArgs),
    /// Feed step buffers through a channel manager and print the parameters.
    Replay(ReplayArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Encode(args) => encode::run(args, format),
        Command::Decode(args) => decode::run(args, format),
        Command::Replay(args) => replay::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct EncodeArgs {
    /// Scalar parameter, NAME=VALUE. Repeatable.
    #[arg(long, value_name = "NAME=VALUE", conflicts_with = "file")]
    pub set: Vec<String>,
    /// Uniform sampler, NAME=MIN,MAX. Repeatable.
    #[arg(long, value_name = "NAME=MIN,MAX", conflicts_with = "file")]
    pub uniform: Vec<String>,
    /// Gaussian sampler, NAME=MEAN,STDDEV. Repeatable.
    #[arg(long, value_name = "NAME=MEAN,STDDEV", conflicts_with = "file")]
    pub gaussian: Vec<String>,
    /// Multi-range uniform sampler, NAME=MIN,MAX[,MIN,MAX...]. Repeatable.
    #[arg(long, value_name = "NAME=BOUNDS", conflicts_with = "file")]
    pub multi_range: Vec<String>,
    /// Seed written with every sampler parameter.
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    pub seed: i32,
    /// JSON object mapping parameter names to updates.
    #[arg(long, value_name = "PATH")]
    pub file: Option<PathBuf>,
    /// Write the stream here instead of stdout.
    #[arg(long, short = 'o', value_name = "PATH")]
    pub out: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Stream to read. Default: stdin.
    pub input: Option<PathBuf>,
    /// Largest payload accepted, in bytes.
    #[arg(long, value_name = "BYTES")]
    pub max_payload: Option<usize>,
}

#[derive(Args, Debug)]
pub struct ReplayArgs {
    /// Step buffers, processed in order. Default: one step from stdin.
    pub inputs: Vec<PathBuf>,
    /// Largest payload accepted, in bytes.
    #[arg(long, value_name = "BYTES")]
    pub max_payload: Option<usize>,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Open `path`, or stdin when it is absent or `-`.
pub fn open_input(path: Option<&Path>) -> CliResult<Box<dyn Read>> {
    match path {
        Some(path) if path != Path::new("-") => {
            let file = File::open(path)
                .map_err(|err| io_error(&format!("failed opening {}", path.display()), err))?;
            Ok(Box::new(BufReader::new(file)))
        }
        _ => Ok(Box::new(io::stdin().lock())),
    }
}

/// Read all of `path`, or stdin when it is absent or `-`.
pub fn read_input(path: Option<&Path>) -> CliResult<Vec<u8>> {
    let mut data = Vec::new();
    open_input(path)?
        .read_to_end(&mut data)
        .map_err(|err| io_error("failed reading input", err))?;
    Ok(data)
}
