use std::fs;

use wirebind_frame::checksum::{acc_sum, checksum32, checksum8, modbus_crc16, xor};

use crate::cmd::{parse_hex, Algorithm, ChecksumArgs};
use crate::exit::{io_error, CliResult, SUCCESS};
use crate::output::{self, ChecksumOutput, OutputFormat};

const ALL: [Algorithm; 6] = [
    Algorithm::Crc16,
    Algorithm::Sum,
    Algorithm::Xor,
    Algorithm::Checksum8,
    Algorithm::Checksum32Le,
    Algorithm::Checksum32Be,
];

pub fn run(args: ChecksumArgs, format: OutputFormat) -> CliResult<i32> {
    let payload = match (&args.data, &args.file) {
        (Some(text), _) => parse_hex(text)?,
        (None, Some(path)) => {
            fs::read(path).map_err(|err| io_error(&format!("read {}", path.display()), err))?
        }
        (None, None) => Vec::new(),
    };

    let algorithms = if args.algorithm.is_empty() {
        &ALL[..]
    } else {
        &args.algorithm[..]
    };
    let checksums: Vec<_> = algorithms.iter().map(|&a| compute(a, &payload)).collect();
    output::print_checksums(payload.len(), &checksums, format);
    Ok(SUCCESS)
}

fn compute(algorithm: Algorithm, payload: &[u8]) -> ChecksumOutput {
    let (name, value, width) = match algorithm {
        Algorithm::Crc16 => ("crc16", u64::from(modbus_crc16(payload)), 4),
        Algorithm::Sum => ("sum", u64::from(acc_sum(payload)), 2),
        Algorithm::Xor => ("xor", u64::from(xor(payload)), 2),
        Algorithm::Checksum8 => ("checksum8", u64::from(checksum8(payload)), 2),
        Algorithm::Checksum32Le => ("checksum32-le", u64::from(checksum32(payload, true)), 8),
        Algorithm::Checksum32Be => ("checksum32-be", u64::from(checksum32(payload, false)), 8),
    };
    ChecksumOutput {
        algorithm: name,
        value,
        hex: format!("{value:0width$x}"),
    }
}
