mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::Command;
use crate::logging::{build_dispatch, LogConfig, LogFormat, LogLevel, LogTarget, SyslogFacility};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(
    name = "scbi",
    version,
    about = "Decode SCBI solar-heating controller CAN traffic"
)]
struct Cli {
    /// Output format for readings and decode reports.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log line format.
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level.
    #[arg(long, value_name = "LEVEL", default_value = "info", global = true)]
    log_level: LogLevel,

    /// Log destination.
    #[arg(long, value_name = "TARGET", default_value = "stderr", global = true)]
    log_target: LogTarget,

    /// Syslog facility when logging to syslog.
    #[arg(long, value_name = "FACILITY", default_value = "user", global = true)]
    syslog_facility: SyslogFacility,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    let dispatch = build_dispatch(LogConfig {
        format: cli.log_format,
        level: cli.log_level,
        target: cli.log_target,
        facility: cli.syslog_facility,
    });

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    let result = tracing::dispatcher::with_default(&dispatch, || cmd::run(cli.command, format));

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
    fn parses_listen_subcommand() {
        let cli = Cli::try_parse_from([
            "scbi",
            "listen",
            "can0",
            "--timeout",
            "500ms",
            "--count",
            "3",
        ])
        .expect("listen args should parse");

        match cli.command {
            Command::Listen(args) => {
                assert_eq!(args.interface, "can0");
                assert_eq!(args.count, Some(3));
                assert_eq!(args.queue_capacity, scbi_bridge::DEFAULT_QUEUE_CAPACITY);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn deadline_requires_count() {
        let err = Cli::try_parse_from(["scbi", "listen", "can0", "--deadline", "5s"])
            .expect_err("deadline without count should fail");

        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn parses_global_log_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "scbi",
            "decode",
            "90010184",
            "--log-target",
            "syslog",
            "--syslog-facility",
            "local2",
            "--log-level",
            "debug",
        ])
        .expect("decode args should parse");

        assert!(matches!(cli.command, Command::Decode(_)));
        assert!(matches!(cli.log_target, LogTarget::Syslog));
        assert!(matches!(cli.syslog_facility, SyslogFacility::Local2));
        assert!(matches!(cli.log_level, LogLevel::Debug));
    }

    #[test]
    fn parses_critical_log_level() {
        let cli = Cli::try_parse_from(["scbi", "--log-level", "critical", "version"])
            .expect("critical level should parse");

        assert!(matches!(cli.log_level, LogLevel::Critical));
    }

    #[test]
    fn rejects_unknown_log_level() {
        let err = Cli::try_parse_from(["scbi", "--log-level", "fatal", "version"])
            .expect_err("unknown level should fail");

        assert_eq!(err.kind(), clap::error::ErrorKind::InvalidValue);
    }
}
