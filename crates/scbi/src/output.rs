use std::io::{self, IsTerminal, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use scbi_bridge::{BridgeError, Publisher};
use scbi_frame::{Envelope, ParameterRecord, Payload, RelayExtFunction};
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
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
struct ReadingOutput<'a> {
    kind: &'a str,
    name: &'a str,
    value: i64,
    timestamp: String,
}

pub fn write_reading<W: Write>(
    out: &mut W,
    kind: &str,
    name: &str,
    value: i64,
    format: OutputFormat,
) -> io::Result<()> {
    match format {
        OutputFormat::Json => {
            let reading = ReadingOutput {
                kind,
                name,
                value,
                timestamp: now_unix_seconds(),
            };
            serde_json::to_writer(&mut *out, &reading)?;
            writeln!(out)
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["KIND", "NAME", "VALUE"])
                .add_row(vec![kind.to_string(), name.to_string(), value.to_string()]);
            writeln!(out, "{table}")
        }
        OutputFormat::Pretty => writeln!(out, "{kind} {name} = {value}"),
    }
}

/// Publishes readings as lines on a writer (stdout for `listen`).
pub struct WriterPublisher<W> {
    out: W,
    format: OutputFormat,
    published: u64,
}

impl WriterPublisher<io::Stdout> {
    pub fn stdout(format: OutputFormat) -> Self {
        Self::new(io::stdout(), format)
    }
}

impl<W: Write> WriterPublisher<W> {
    pub fn new(out: W, format: OutputFormat) -> Self {
        Self {
            out,
            format,
            published: 0,
        }
    }

    pub fn published(&self) -> u64 {
        self.published
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Publisher for WriterPublisher<W> {
    fn publish(&mut self, kind: &str, name: &str, value: i64) -> scbi_bridge::Result<()> {
        write_reading(&mut self.out, kind, name, value, self.format)?;
        self.published = self.published.saturating_add(1);
        Ok(())
    }

    fn maintain(&mut self) -> scbi_bridge::Result<()> {
        self.out.flush().map_err(BridgeError::from)
    }
}

#[derive(Serialize)]
pub struct EnvelopeOutput {
    program: u8,
    program_name: &'static str,
    sender: u8,
    function: u8,
    function_name: &'static str,
    protocol: &'static str,
    message: &'static str,
    error: bool,
    remote_request: bool,
    extended: bool,
}

impl From<&Envelope> for EnvelopeOutput {
    fn from(env: &Envelope) -> Self {
        Self {
            program: u8::from(env.program),
            program_name: env.program.name(),
            sender: env.sender,
            function: u8::from(env.function),
            function_name: env.function.name(),
            protocol: env.protocol.name(),
            message: env.kind.name(),
            error: env.error,
            remote_request: env.remote_request,
            extended: env.extended,
        }
    }
}

#[derive(Serialize)]
#[serde(tag = "layout", rename_all = "snake_case")]
pub enum PayloadOutput {
    Sensor {
        id: u8,
        value: u16,
        sensor_type: String,
        subtype: u8,
    },
    Relay {
        id: u8,
        mode: &'static str,
        is_on: u8,
        ext_functions: Vec<String>,
    },
    Overview {
        id: u8,
        period: String,
        hours: u16,
        heat_yield: u32,
    },
}

impl From<&Payload> for PayloadOutput {
    fn from(payload: &Payload) -> Self {
        match payload {
            Payload::Sensor(s) => PayloadOutput::Sensor {
                id: s.id,
                value: s.value,
                sensor_type: s.sensor_type.slug(),
                subtype: s.subtype,
            },
            Payload::Relay(r) => PayloadOutput::Relay {
                id: r.id,
                mode: r.mode.name(),
                is_on: r.is_on,
                ext_functions: r.ext_functions.map(ext_function_label).to_vec(),
            },
            Payload::Overview(o) => PayloadOutput::Overview {
                id: o.id,
                period: o.period.slug(),
                hours: o.hours,
                heat_yield: o.heat_yield,
            },
        }
    }
}

fn ext_function_label(slot: RelayExtFunction) -> String {
    match slot.name() {
        Some(name) => name.to_string(),
        None => format!("0x{:02x}", slot.code()),
    }
}

#[derive(Serialize)]
pub struct RecordOutput {
    kind: &'static str,
    name: String,
    value: i64,
}

impl From<ParameterRecord> for RecordOutput {
    fn from(record: ParameterRecord) -> Self {
        Self {
            kind: record.kind.as_str(),
            name: record.name,
            value: record.value,
        }
    }
}

/// Offline decode result of one frame.
#[derive(Serialize)]
pub struct DecodeReport {
    pub identifier: String,
    pub data: String,
    pub envelope: EnvelopeOutput,
    pub payload: Option<PayloadOutput>,
    pub records: Vec<RecordOutput>,
    pub anomaly: Option<String>,
}

pub fn write_decode<W: Write>(
    out: &mut W,
    report: &DecodeReport,
    format: OutputFormat,
) -> io::Result<()> {
    match format {
        OutputFormat::Json => {
            serde_json::to_writer(&mut *out, report)?;
            writeln!(out)
        }
        OutputFormat::Table => {
            let env = &report.envelope;
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["FIELD", "VALUE"])
                .add_row(vec!["identifier".to_string(), report.identifier.clone()])
                .add_row(vec![
                    "program".to_string(),
                    format!("0x{:02x} ({})", env.program, env.program_name),
                ])
                .add_row(vec!["sender".to_string(), format!("0x{:02x}", env.sender)])
                .add_row(vec![
                    "function".to_string(),
                    format!("0x{:02x} ({})", env.function, env.function_name),
                ])
                .add_row(vec!["protocol".to_string(), env.protocol.to_string()])
                .add_row(vec!["message".to_string(), env.message.to_string()])
                .add_row(vec!["data".to_string(), report.data.clone()]);
            for record in &report.records {
                table.add_row(vec![
                    format!("{}/{}", record.kind, record.name),
                    record.value.to_string(),
                ]);
            }
            if let Some(anomaly) = &report.anomaly {
                table.add_row(vec!["anomaly".to_string(), anomaly.clone()]);
            }
            writeln!(out, "{table}")
        }
        OutputFormat::Pretty => {
            let env = &report.envelope;
            writeln!(
                out,
                "id={} prog=0x{:02x} ({}) sender=0x{:02x} func=0x{:02x} ({}) prot={} msg={}",
                report.identifier,
                env.program,
                env.program_name,
                env.sender,
                env.function,
                env.function_name,
                env.protocol,
                env.message
            )?;
            if let Some(payload) = &report.payload {
                writeln!(out, "payload: {}", serde_json::to_string(payload)?)?;
            }
            for record in &report.records {
                writeln!(out, "{} {} = {}", record.kind, record.name, record.value)?;
            }
            if let Some(anomaly) = &report.anomaly {
                writeln!(out, "anomaly: {anomaly}")?;
            }
            Ok(())
        }
    }
}

pub fn hex_bytes(data: &[u8]) -> String {
    data.iter()
        .map(|b| format!("{b:02x}"))
        .collect::<Vec<_>>()
        .join(" ")
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_reading_is_one_line() {
        let mut out = Vec::new();
        write_reading(&mut out, "sensor", "temperature_3", 215, OutputFormat::Json).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().count(), 1);
        let value: serde_json::Value = serde_json::from_str(text.trim()).unwrap();
        assert_eq!(value["kind"], "sensor");
        assert_eq!(value["name"], "temperature_3");
        assert_eq!(value["value"], 215);
    }

    #[test]
    fn pretty_reading() {
        let mut out = Vec::new();
        write_reading(&mut out, "relay", "relay_1", 1, OutputFormat::Pretty).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "relay relay_1 = 1\n");
    }

    #[test]
    fn writer_publisher_counts_and_writes() {
        let mut publisher = WriterPublisher::new(Vec::new(), OutputFormat::Pretty);
        publisher.publish("overview", "total_2", 4096).unwrap();
        publisher.maintain().unwrap();

        assert_eq!(publisher.published(), 1);
        assert_eq!(
            String::from_utf8(publisher.into_inner()).unwrap(),
            "overview total_2 = 4096\n"
        );
    }

    #[test]
    fn unknown_ext_function_is_hex() {
        assert_eq!(ext_function_label(RelayExtFunction::Disabled), "disabled");
        assert_eq!(ext_function_label(RelayExtFunction::Function(0xC7)), "0xc7");
    }

    #[test]
    fn hex_bytes_spacing() {
        assert_eq!(hex_bytes(&[0x03, 0xD7, 0x00]), "03 d7 00");
        assert_eq!(hex_bytes(&[]), "");
    }
}
