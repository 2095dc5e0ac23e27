use std::ffi::{CStr, CString};
use std::io::{self, Write};

use clap::ValueEnum;
use tracing::level_filters::LevelFilter;
use tracing::{Dispatch, Level, Metadata};
use tracing_subscriber::filter::{self, FilterFn};
use tracing_subscriber::fmt::writer::{BoxMakeWriter, MakeWriter, MakeWriterExt};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{Layer, Registry};

/// Field that marks an ERROR event as critical (`error!(critical = true, ..)`).
const CRITICAL_FIELD: &str = "critical";

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LogLevel {
    /// Only ERROR events carrying the `critical` field.
    Critical,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_filter(self) -> LevelFilter {
        match self {
            LogLevel::Critical | LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

/// Where log lines go.
#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LogTarget {
    /// Everything to stderr.
    Stderr,
    /// WARN and ERROR to stderr, the rest to stdout.
    Console,
    /// The system logger.
    Syslog,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum SyslogFacility {
    User,
    Local0,
    Local1,
    Local2,
    Local3,
    Local4,
    Local5,
    Local6,
    Local7,
}

impl SyslogFacility {
    fn as_raw(self) -> libc::c_int {
        match self {
            SyslogFacility::User => libc::LOG_USER,
            SyslogFacility::Local0 => libc::LOG_LOCAL0,
            SyslogFacility::Local1 => libc::LOG_LOCAL1,
            SyslogFacility::Local2 => libc::LOG_LOCAL2,
            SyslogFacility::Local3 => libc::LOG_LOCAL3,
            SyslogFacility::Local4 => libc::LOG_LOCAL4,
            SyslogFacility::Local5 => libc::LOG_LOCAL5,
            SyslogFacility::Local6 => libc::LOG_LOCAL6,
            SyslogFacility::Local7 => libc::LOG_LOCAL7,
        }
    }
}

#[derive(Copy, Clone, Debug)]
pub struct LogConfig {
    pub format: LogFormat,
    pub level: LogLevel,
    pub target: LogTarget,
    pub facility: SyslogFacility,
}

/// Build a log dispatcher for the given settings.
///
/// The caller decides its scope (`tracing::dispatcher::with_default`); no
/// global subscriber is installed.
pub fn build_dispatch(config: LogConfig) -> Dispatch {
    let writer = match config.target {
        LogTarget::Stderr => BoxMakeWriter::new(io::stderr),
        LogTarget::Console => console_writer(io::stderr, io::stdout),
        LogTarget::Syslog => BoxMakeWriter::new(SyslogMakeWriter::open(config.facility)),
    };
    dispatch_with(config, writer)
}

/// WARN and ERROR go to `errors`, everything else to `rest`.
fn console_writer<E, O>(errors: E, rest: O) -> BoxMakeWriter
where
    E: for<'a> MakeWriter<'a> + Send + Sync + 'static,
    O: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    BoxMakeWriter::new(errors.with_max_level(Level::WARN).or_else(rest))
}

fn dispatch_with(config: LogConfig, writer: BoxMakeWriter) -> Dispatch {
    let layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(false);

    // syslogd stamps its own time.
    let layer: Box<dyn Layer<Registry> + Send + Sync> = match (config.target, config.format) {
        (LogTarget::Syslog, LogFormat::Text) => layer.without_time().boxed(),
        (LogTarget::Syslog, LogFormat::Json) => layer.json().without_time().boxed(),
        (_, LogFormat::Text) => layer.boxed(),
        (_, LogFormat::Json) => layer.json().boxed(),
    };

    let filtered = layer.with_filter(level_filter(config.level));
    Dispatch::new(Registry::default().with(filtered))
}

fn level_filter(level: LogLevel) -> FilterFn<impl Fn(&Metadata<'_>) -> bool> {
    let max = level.as_filter();
    let critical_only = matches!(level, LogLevel::Critical);
    filter::filter_fn(move |meta| {
        if critical_only {
            meta.is_event() && is_critical(meta)
        } else {
            meta.level() <= &max
        }
    })
}

fn is_critical(meta: &Metadata<'_>) -> bool {
    *meta.level() == Level::ERROR && meta.fields().field(CRITICAL_FIELD).is_some()
}

const SYSLOG_IDENT: &CStr = c"scbi";

/// Opens the process-wide syslog connection and hands out one writer per event.
#[derive(Clone, Copy, Debug)]
struct SyslogMakeWriter;

impl SyslogMakeWriter {
    fn open(facility: SyslogFacility) -> Self {
        // SAFETY: the ident is a static C string, valid for the process lifetime.
        unsafe {
            libc::openlog(
                SYSLOG_IDENT.as_ptr(),
                libc::LOG_PID | libc::LOG_NDELAY,
                facility.as_raw(),
            );
        }
        Self
    }
}

impl<'a> MakeWriter<'a> for SyslogMakeWriter {
    type Writer = SyslogLine;

    fn make_writer(&'a self) -> Self::Writer {
        SyslogLine::new(libc::LOG_INFO)
    }

    fn make_writer_for(&'a self, meta: &Metadata<'_>) -> Self::Writer {
        SyslogLine::new(syslog_priority(meta))
    }
}

/// Buffers one formatted event and submits it on drop.
struct SyslogLine {
    priority: libc::c_int,
    buf: Vec<u8>,
}

impl SyslogLine {
    fn new(priority: libc::c_int) -> Self {
        Self {
            priority,
            buf: Vec::with_capacity(256),
        }
    }
}

impl Write for SyslogLine {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for SyslogLine {
    fn drop(&mut self) {
        let Some(message) = syslog_message(&self.buf) else {
            return;
        };
        // SAFETY: format and message are NUL-terminated; "%s" consumes exactly one argument.
        unsafe {
            libc::syslog(self.priority, c"%s".as_ptr(), message.as_ptr());
        }
    }
}

fn syslog_priority(meta: &Metadata<'_>) -> libc::c_int {
    if is_critical(meta) {
        libc::LOG_CRIT
    } else {
        priority_for(*meta.level())
    }
}

fn priority_for(level: Level) -> libc::c_int {
    match level {
        Level::ERROR => libc::LOG_ERR,
        Level::WARN => libc::LOG_WARNING,
        Level::INFO => libc::LOG_INFO,
        _ => libc::LOG_DEBUG,
    }
}

/// Strip the trailing newline and interior NULs; `None` for empty lines.
fn syslog_message(buf: &[u8]) -> Option<CString> {
    let line = buf.strip_suffix(b"\n").unwrap_or(buf);
    if line.is_empty() {
        return None;
    }
    let cleaned: Vec<u8> = line.iter().copied().filter(|b| *b != 0).collect();
    CString::new(cleaned).ok()
}
