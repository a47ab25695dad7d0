use clap::{Args, Subcommand, ValueEnum};
use std::path::PathBuf;

use wirebind_frame::DEFAULT_MAX_FRAME_LENGTH;

use crate::exit::{CliError, CliResult, DATA_INVALID};
use crate::output::OutputFormat;

pub mod checksum;
pub mod split;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Split a captured byte stream into length-delimited frames.
    Split(SplitArgs),
    /// Compute protocol checksums over a payload.
    Checksum(ChecksumArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Split(args) => split::run(args, format),
        Command::Checksum(args) => checksum::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct SplitArgs {
    /// Capture file, or `-` for stdin.
    pub input: PathBuf,
    /// Input is hex text (whitespace ignored) instead of raw bytes.
    #[arg(long)]
    pub hex: bool,
    /// Header bytes marking a frame start, in hex (e.g. 68 or aa55).
    #[arg(long, value_name = "HEX")]
    pub header: Option<String>,
    /// Offset of the length field from the frame start.
    #[arg(long, default_value = "0")]
    pub length_offset: usize,
    /// Width of the length field in bytes (1, 2, 3, 4 or 8).
    #[arg(long, default_value = "2")]
    pub length_width: usize,
    /// Added to the length value to get the bytes after the length field.
    #[arg(long, default_value = "0", allow_hyphen_values = true)]
    pub adjust: i64,
    /// Leading bytes removed from each printed frame.
    #[arg(long, default_value = "0")]
    pub strip: usize,
    /// Maximum adjusted frame length.
    #[arg(long, default_value_t = DEFAULT_MAX_FRAME_LENGTH)]
    pub max: usize,
    /// Length field is little-endian.
    #[arg(long)]
    pub little_endian: bool,
    /// Stop after N frames.
    #[arg(long)]
    pub count: Option<usize>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Algorithm {
    /// Modbus CRC-16 (poly 0xA001, init 0xFFFF).
    Crc16,
    /// Low byte of the byte sum.
    Sum,
    /// XOR of all bytes.
    Xor,
    /// Two's-complement signed byte sum.
    Checksum8,
    /// XOR of little-endian 32-bit words.
    Checksum32Le,
    /// XOR of big-endian 32-bit words.
    Checksum32Be,
}

#[derive(Args, Debug)]
pub struct ChecksumArgs {
    /// Payload in hex.
    #[arg(required_unless_present = "file", conflicts_with = "file")]
    pub data: Option<String>,
    /// Read the payload from a file.
    #[arg(long)]
    pub file: Option<PathBuf>,
    /// Algorithms to run (comma-separated). Default: all.
    #[arg(long, short = 'a', value_delimiter = ',')]
    pub algorithm: Vec<Algorithm>,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Decode hex text, ignoring whitespace and an optional `0x` prefix.
pub fn parse_hex(text: &str) -> CliResult<Vec<u8>> {
    let digits: String = text.split_whitespace().collect();
    let digits = digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
        .unwrap_or(&digits);
    hex::decode(digits).map_err(|err| CliError::new(DATA_INVALID, format!("invalid hex input: {err}")))
}
