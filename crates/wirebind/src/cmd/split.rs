use std::fs::File;
use std::io::{self, Cursor, Read};

use wirebind_frame::{ByteOrder, FrameConfig, FrameError, FrameReader, Header};

use crate::cmd::{parse_hex, SplitArgs};
use crate::exit::{frame_error, io_error, CliError, CliResult, DATA_INVALID, SUCCESS, USAGE};
use crate::output::{self, OutputFormat};

pub fn run(args: SplitArgs, format: OutputFormat) -> CliResult<i32> {
    let config = frame_config(&args)?;
    let input = open_input(&args)?;
    let mut reader =
        FrameReader::with_config(input, config).map_err(|err| frame_error("invalid framing options", err))?;

    let mut frames = Vec::new();
    let mut oversized = 0usize;
    while args.count.is_none_or(|count| frames.len() < count) {
        match reader.read_frame() {
            Ok(frame) => frames.push(frame),
            Err(FrameError::TooLongFrame { length, max, .. }) => {
                tracing::warn!(length, max, "oversized frame skipped");
                oversized += 1;
            }
            Err(FrameError::ConnectionClosed) => break,
            Err(err) => return Err(frame_error("read frames", err)),
        }
    }

    let trailing = reader.buffered().len();
    if trailing > 0 {
        tracing::warn!(trailing, "input ended inside a frame");
    }
    tracing::info!(frames = frames.len(), oversized, "split complete");

    output::print_frames(&frames, format);
    if oversized > 0 || (trailing > 0 && args.count.is_none()) {
        return Ok(DATA_INVALID);
    }
    Ok(SUCCESS)
}

fn frame_config(args: &SplitArgs) -> CliResult<FrameConfig> {
    let header = match &args.header {
        None => Header::None,
        Some(text) => {
            let bytes = parse_hex(text)?;
            let value = match bytes.as_slice() {
                [one] => u16::from(*one),
                [high, low] => u16::from_be_bytes([*high, *low]),
                _ => {
                    return Err(CliError::new(
                        USAGE,
                        format!("header must be 1 or 2 bytes (got {})", bytes.len()),
                    ))
                }
            };
            Header::from_parts(value, bytes.len()).map_err(|err| frame_error("header", err))?
        }
    };

    Ok(FrameConfig {
        byte_order: if args.little_endian {
            ByteOrder::Little
        } else {
            ByteOrder::Big
        },
        max_frame_length: args.max,
        length_field_offset: args.length_offset,
        length_field_length: args.length_width,
        length_adjustment: args.adjust,
        initial_bytes_to_strip: args.strip,
        fail_fast: true,
        header,
    })
}

fn open_input(args: &SplitArgs) -> CliResult<Box<dyn Read>> {
    let raw: Box<dyn Read> = if args.input.as_os_str() == "-" {
        Box::new(io::stdin())
    } else {
        let file = File::open(&args.input)
            .map_err(|err| io_error(&format!("open {}", args.input.display()), err))?;
        Box::new(file)
    };
    if !args.hex {
        return Ok(raw);
    }

    let mut text = String::new();
    let mut raw = raw;
    raw.read_to_string(&mut text)
        .map_err(|err| io_error("read hex input", err))?;
    Ok(Box::new(Cursor::new(parse_hex(&text)?)))
}
