mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::Command;
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "sidechannels", version, about = "Side-channel stream tooling")]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "warn", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    let result = cmd::run(cli.command, format);

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_encode_subcommand() {
        let cli = Cli::try_parse_from([
            "sidechannels",
            "encode",
            "--set",
            "scale=2.5",
            "--uniform",
            "mass=1,2",
            "--seed",
            "7",
            "--out",
            "/tmp/step.bin",
        ])
        .expect("encode args should parse");

        match cli.command {
            Command::Encode(args) => {
                assert_eq!(args.set, vec!["scale=2.5".to_string()]);
                assert_eq!(args.uniform, vec!["mass=1,2".to_string()]);
                assert_eq!(args.seed, 7);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "sidechannels",
            "decode",
            "step.bin",
            "--format",
            "json",
            "--log-level",
            "debug",
        ])
        .expect("decode args should parse");

        assert!(matches!(cli.command, Command::Decode(_)));
        assert!(matches!(cli.format, Some(OutputFormat::Json)));
    }

    #[test]
    fn rejects_file_mixed_with_flags() {
        let err = Cli::try_parse_from([
            "sidechannels",
            "encode",
            "--file",
            "updates.json",
            "--set",
            "a=1",
        ])
        .expect_err("conflicting args should fail");

        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn parses_replay_with_several_steps() {
        let cli = Cli::try_parse_from(["sidechannels", "replay", "a.bin", "b.bin"])
            .expect("replay args should parse");
        match cli.command {
            Command::Replay(args) => assert_eq!(args.inputs.len(), 2),
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
