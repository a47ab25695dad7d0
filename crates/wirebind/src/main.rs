mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::Command;
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "wirebind", version, about = "Frame and checksum tools for binary device protocols")]
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
    match cmd::run(cli.command, format) {
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
    use crate::cmd::Algorithm;

    #[test]
    fn parses_split_subcommand() {
        let cli = Cli::try_parse_from([
            "wirebind",
            "split",
            "capture.bin",
            "--header",
            "68",
            "--length-offset",
            "1",
            "--length-width",
            "1",
            "--adjust",
            "-2",
        ])
        .expect("split args should parse");

        let Command::Split(args) = cli.command else {
            panic!("expected split");
        };
        assert_eq!(args.header.as_deref(), Some("68"));
        assert_eq!(args.adjust, -2);
        assert_eq!(args.length_width, 1);
    }

    #[test]
    fn parses_checksum_algorithm_list() {
        let cli = Cli::try_parse_from(["wirebind", "checksum", "0102", "-a", "crc16,xor"])
            .expect("checksum args should parse");
        let Command::Checksum(args) = cli.command else {
            panic!("expected checksum");
        };
        assert_eq!(args.algorithm, vec![Algorithm::Crc16, Algorithm::Xor]);
    }

    #[test]
    fn rejects_checksum_data_with_file() {
        let err = Cli::try_parse_from(["wirebind", "checksum", "0102", "--file", "payload.bin"])
            .expect_err("conflicting args should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn checksum_needs_a_payload() {
        let err = Cli::try_parse_from(["wirebind", "checksum"]).expect_err("payload is required");
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }
}
