//! Tracing setup for hosts embedding an editor session.
//!
//! The session logs under a handful of short targets rather than its module
//! paths, so the default filter names them explicitly. Records go to a
//! daily-rolling file and, optionally, line by line to a channel a host can
//! show in a log panel.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};

use tracing::{Level, Subscriber};
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::kernel::services::adapters::paths::APP_NAME;

/// Targets the session emits under: control thread, content I/O,
/// version control and the workspace watcher.
pub const TARGETS: [&str; 4] = ["session", "io", "vcs", "watch"];

const LOG_FILE: &str = "editor-session.log";

#[derive(Debug, Clone)]
pub struct LogOptions {
    /// Where the rolling file goes; the application log directory when unset.
    pub dir: Option<PathBuf>,
    /// Level for [`TARGETS`] when `RUST_LOG` is not set. Everything else
    /// logs at `warn`.
    pub level: Level,
    /// Mirror formatted lines to [`LoggingGuard::take_log_rx`].
    pub mirror: bool,
}

impl Default for LogOptions {
    fn default() -> Self {
        Self {
            dir: None,
            level: Level::INFO,
            mirror: true,
        }
    }
}

pub struct LoggingGuard {
    _guard: WorkerGuard,
    log_dir: PathBuf,
    log_rx: Option<Receiver<String>>,
}

impl LoggingGuard {
    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    /// Formatted log lines. Yields once, and only when mirroring was asked for.
    pub fn take_log_rx(&mut self) -> Option<Receiver<String>> {
        self.log_rx.take()
    }
}

/// `RUST_LOG`-style directives enabling [`TARGETS`] and this crate at `level`.
pub fn default_directives(level: Level) -> String {
    let level = level.to_string().to_ascii_lowercase();
    let mut directives = format!("warn,editor_session={level}");
    for target in TARGETS {
        directives.push_str(&format!(",{target}={level}"));
    }
    directives
}

/// Buffers one event's output and sends it as lines when dropped.
struct LineMirror {
    buf: Vec<u8>,
    tx: Sender<String>,
}

impl Write for LineMirror {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for LineMirror {
    fn drop(&mut self) {
        let text = String::from_utf8_lossy(&self.buf);
        for line in text.lines().filter(|line| !line.is_empty()) {
            let _ = self.tx.send(line.to_string());
        }
    }
}

/// Either side may be absent.
#[derive(Clone)]
struct SessionMakeWriter {
    file: Option<NonBlocking>,
    mirror: Option<Sender<String>>,
}

struct SessionWriter {
    file: Option<NonBlocking>,
    mirror: Option<LineMirror>,
}

impl<'a> MakeWriter<'a> for SessionMakeWriter {
    type Writer = SessionWriter;

    fn make_writer(&'a self) -> Self::Writer {
        SessionWriter {
            file: self.file.clone(),
            mirror: self.mirror.clone().map(|tx| LineMirror {
                buf: Vec::with_capacity(256),
                tx,
            }),
        }
    }
}

impl Write for SessionWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = match self.file.as_mut() {
            Some(file) => file.write(buf)?,
            None => buf.len(),
        };
        if let Some(mirror) = self.mirror.as_mut() {
            mirror.write_all(&buf[..n])?;
        }
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        if let Some(file) = self.file.as_mut() {
            file.flush()?;
        }
        Ok(())
    }
}

fn build_subscriber(
    filter: EnvFilter,
    writer: SessionMakeWriter,
) -> impl Subscriber + Send + Sync + 'static {
    tracing_subscriber::registry().with(filter).with(
        tracing_subscriber::fmt::layer()
            .with_writer(writer)
            .with_ansi(false)
            .with_target(true)
            .with_file(true)
            .with_line_number(true),
    )
}

fn resolve_log_dir(dir: Option<&Path>) -> io::Result<PathBuf> {
    if let Some(dir) = dir {
        std::fs::create_dir_all(dir)?;
        return Ok(dir.to_path_buf());
    }
    crate::kernel::services::adapters::ensure_log_dir().or_else(|_| -> io::Result<PathBuf> {
        let dir = std::env::temp_dir().join(APP_NAME).join("logs");
        std::fs::create_dir_all(&dir)?;
        Ok(dir)
    })
}

/// [`init_with`] using [`LogOptions::default`].
pub fn init() -> Option<LoggingGuard> {
    init_with(LogOptions::default())
}

/// Installs the global subscriber and a panic hook that logs through it.
/// `None` when no log directory is usable or a subscriber is already installed.
pub fn init_with(options: LogOptions) -> Option<LoggingGuard> {
    let log_dir = resolve_log_dir(options.dir.as_deref()).ok()?;

    let (file, guard) = tracing_appender::non_blocking(tracing_appender::rolling::daily(
        &log_dir, LOG_FILE,
    ));
    let (mirror, log_rx) = if options.mirror {
        let (tx, rx) = mpsc::channel::<String>();
        (Some(tx), Some(rx))
    } else {
        (None, None)
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(options.level)));
    let writer = SessionMakeWriter {
        file: Some(file),
        mirror,
    };
    if build_subscriber(filter, writer).try_init().is_err() {
        return None;
    }

    std::panic::set_hook(Box::new(|panic_info| {
        tracing::error!(target: "session", panic = %panic_info, "panic");
    }));
    tracing::info!(target: "session", log_dir = %log_dir.display(), "logging initialized");

    Some(LoggingGuard {
        _guard: guard,
        log_dir,
        log_rx,
    })
}

#[cfg(test)]
#[path = "../tests/unit/logging.rs"]
mod tests;
