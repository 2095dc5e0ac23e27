use std::io;

use scbi_frame::{Payload, RawFrame, MAX_PAYLOAD};
use tracing::debug;

use crate::cmd::DecodeArgs;
use crate::exit::{io_error, payload_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{hex_bytes, write_decode, DecodeReport, OutputFormat, RecordOutput};

pub fn run(args: DecodeArgs, format: OutputFormat) -> CliResult<i32> {
    let (id_text, inline_data) = match args.identifier.split_once('#') {
        Some((id, data)) => (id, Some(data)),
        None => (args.identifier.as_str(), None),
    };
    if inline_data.is_some() && args.payload.is_some() {
        return Err(CliError::new(
            USAGE,
            "payload given twice (ID#DATA and positional argument)",
        ));
    }

    let id = parse_identifier(id_text)?;
    let data = parse_payload(inline_data.or(args.payload.as_deref()).unwrap_or(""))?;

    let frame = RawFrame::new(id, &data, 0);
    let envelope = frame.envelope();
    debug!(frame = %frame, "decoding frame");

    let (payload, anomaly) = match Payload::parse(&envelope, frame.payload()) {
        Ok(payload) => (payload, None),
        Err(err) => (None, Some(err)),
    };

    let report = DecodeReport {
        identifier: format!("0x{id:08x}"),
        data: hex_bytes(frame.payload()),
        envelope: (&envelope).into(),
        payload: payload.as_ref().map(Into::into),
        records: payload
            .iter()
            .map(|p| RecordOutput::from(p.to_record()))
            .collect(),
        anomaly: anomaly.as_ref().map(ToString::to_string),
    };
    write_decode(&mut io::stdout().lock(), &report, format)
        .map_err(|err| io_error("write failed", err))?;

    match anomaly {
        Some(err) => Err(payload_error("decode anomaly", err)),
        None => Ok(SUCCESS),
    }
}

fn parse_identifier(input: &str) -> CliResult<u32> {
    let trimmed = input.trim();
    let digits: String = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed)
        .chars()
        .filter(|c| *c != '_')
        .collect();

    if digits.is_empty() || digits.len() > 8 {
        return Err(CliError::new(
            USAGE,
            format!("identifier must be 1-8 hex digits: {input}"),
        ));
    }
    u32::from_str_radix(&digits, 16)
        .map_err(|_| CliError::new(USAGE, format!("invalid identifier: {input}")))
}

fn parse_payload(input: &str) -> CliResult<Vec<u8>> {
    let digits: Vec<u8> = input
        .bytes()
        .filter(|b| !b.is_ascii_whitespace() && !matches!(b, b':' | b'-' | b'_'))
        .collect();

    if digits.len() % 2 != 0 {
        return Err(CliError::new(
            USAGE,
            format!("payload must have an even number of hex digits: {input}"),
        ));
    }
    if digits.len() / 2 > MAX_PAYLOAD {
        return Err(CliError::new(
            USAGE,
            format!("payload exceeds {MAX_PAYLOAD} bytes: {input}"),
        ));
    }

    digits
        .chunks(2)
        .map(|pair| {
            std::str::from_utf8(pair)
                .ok()
                .and_then(|text| u8::from_str_radix(text, 16).ok())
                .ok_or_else(|| CliError::new(USAGE, format!("invalid payload hex: {input}")))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifier_forms() {
        assert_eq!(parse_identifier("90010184").unwrap(), 0x9001_0184);
        assert_eq!(parse_identifier("0x9001_0184").unwrap(), 0x9001_0184);
        assert_eq!(parse_identifier("0X1").unwrap(), 1);
    }

    #[test]
    fn identifier_rejects_garbage() {
        assert_eq!(parse_identifier("").unwrap_err().code, USAGE);
        assert_eq!(parse_identifier("123456789").unwrap_err().code, USAGE);
        assert_eq!(parse_identifier("zz").unwrap_err().code, USAGE);
    }

    #[test]
    fn payload_forms() {
        assert_eq!(
            parse_payload("03d70004").unwrap(),
            vec![0x03, 0xD7, 0x00, 0x04]
        );
        assert_eq!(
            parse_payload("03 D7:00-04").unwrap(),
            vec![0x03, 0xD7, 0x00, 0x04]
        );
        assert!(parse_payload("").unwrap().is_empty());
    }

    #[test]
    fn payload_rejects_bad_input() {
        assert!(parse_payload("03d").is_err());
        assert!(parse_payload("0g").is_err());
        assert!(parse_payload("000102030405060708").is_err());
    }
}
