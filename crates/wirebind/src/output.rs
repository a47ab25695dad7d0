use std::io::{IsTerminal, Write};

use bytes::Bytes;
use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct FrameOutput {
    index: usize,
    size: usize,
    hex: String,
}

pub fn print_frames(frames: &[Bytes], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            for (index, frame) in frames.iter().enumerate() {
                let out = FrameOutput {
                    index,
                    size: frame.len(),
                    hex: hex::encode(frame),
                };
                println!(
                    "{}",
                    serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
                );
            }
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["#", "SIZE", "BYTES"]);
            for (index, frame) in frames.iter().enumerate() {
                table.add_row(vec![index.to_string(), frame.len().to_string(), spaced_hex(frame)]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for (index, frame) in frames.iter().enumerate() {
                println!("frame={index} size={} bytes={}", frame.len(), spaced_hex(frame));
            }
        }
        OutputFormat::Raw => {
            let mut out = std::io::stdout();
            for frame in frames {
                let _ = out.write_all(frame);
            }
            let _ = out.flush();
        }
    }
}

#[derive(Serialize)]
pub struct ChecksumOutput {
    pub algorithm: &'static str,
    pub value: u64,
    /// Value in hex, zero-padded to the checksum width.
    pub hex: String,
}

#[derive(Serialize)]
struct ChecksumReport<'a> {
    input_size: usize,
    checksums: &'a [ChecksumOutput],
}

pub fn print_checksums(input_size: usize, checksums: &[ChecksumOutput], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = ChecksumReport {
                input_size,
                checksums,
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["ALGORITHM", "HEX", "DECIMAL"]);
            for checksum in checksums {
                table.add_row(vec![
                    checksum.algorithm.to_string(),
                    checksum.hex.clone(),
                    checksum.value.to_string(),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty | OutputFormat::Raw => {
            for checksum in checksums {
                println!("{}={}", checksum.algorithm, checksum.hex);
            }
        }
    }
}

fn spaced_hex(data: &[u8]) -> String {
    data.iter()
        .map(|byte| format!("{byte:02x}"))
        .collect::<Vec<_>>()
        .join(" ")
}
