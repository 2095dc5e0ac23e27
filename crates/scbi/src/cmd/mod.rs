use std::time::Duration;

use clap::{Args, Subcommand};
use scbi_bridge::DEFAULT_QUEUE_CAPACITY;

use crate::exit::{CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod decode;
#[cfg(target_os = "linux")]
pub mod listen;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Read frames from a CAN interface and print decoded readings.
    Listen(ListenArgs),
    /// Decode a single frame given on the command line.
    Decode(DecodeArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        #[cfg(target_os = "linux")]
        Command::Listen(args) => listen::run(args, format),
        #[cfg(not(target_os = "linux"))]
        Command::Listen(args) => Err(CliError::new(
            crate::exit::TRANSPORT_ERROR,
            format!(
                "cannot listen on {}: SocketCAN requires Linux",
                args.interface
            ),
        )),
        Command::Decode(args) => decode::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct ListenArgs {
    /// CAN interface to read from (e.g. can0).
    #[arg(env = "SCBI_INTERFACE")]
    pub interface: String,
    /// Maximum wait for one frame before servicing the publisher (e.g. 1s, 500ms).
    #[arg(long, default_value = "1s")]
    pub timeout: String,
    /// Maximum readings held between decode and publish.
    #[arg(long, default_value_t = DEFAULT_QUEUE_CAPACITY)]
    pub queue_capacity: usize,
    /// Exit after printing N readings.
    #[arg(long)]
    pub count: Option<u64>,
    /// Fail with exit code 124 if --count readings are not seen within this time.
    #[arg(long, requires = "count")]
    pub deadline: Option<String>,
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// 32-bit frame identifier in hex (`90010184`, `0x9001_0184`), or a
    /// candump-style `ID#DATA` frame.
    pub identifier: String,
    /// Payload bytes in hex (`03d7000400000000` or `03 d7 00 04`).
    pub payload: Option<String>,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Parse `500ms`, `2s` or bare seconds.
pub(crate) fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        _ => Ok(Duration::from_secs(value)),
    }
}
