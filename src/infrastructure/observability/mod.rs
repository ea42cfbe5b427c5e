//! Failure-reporting sinks for production mode.
//!
//! Every sink is a `tracing-subscriber` layer. The layers are composed into a
//! per-application [`Dispatch`], so two applications built in one process
//! never share sinks. The binary installs the dispatch as the global default.

mod format;
mod mail_sink;
mod rotating;

pub use format::*;
pub use mail_sink::*;
pub use rotating::*;

use crate::config::Config;
use crate::infrastructure::providers::Mail;
use lettre::message::Mailbox;
use std::path::PathBuf;
use tracing::Dispatch;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{Layer, Registry};

pub const LOG_FILE_NAME: &str = "microblog.log";
pub const LOG_FILE_MAX_BYTES: u64 = 10240;
pub const LOG_FILE_BACKUPS: usize = 10;
pub const STARTUP_MESSAGE: &str = "Microblog startup";

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// A destination attached to the application logger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkKind {
    Email,
    Stream,
    RotatingFile(PathBuf),
}

/// Log sinks attached to one application.
#[derive(Clone, Default)]
pub struct Logging {
    dispatch: Option<Dispatch>,
    sinks: Vec<SinkKind>,
}

impl Logging {
    /// No sinks: used in debug and testing mode.
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn dispatch(&self) -> Option<&Dispatch> {
        self.dispatch.as_ref()
    }

    pub fn sinks(&self) -> &[SinkKind] {
        &self.sinks
    }

    pub fn has_sink(&self, kind: &SinkKind) -> bool {
        self.sinks.contains(kind)
    }

    pub fn has_email_sink(&self) -> bool {
        self.has_sink(&SinkKind::Email)
    }

    /// Runs `f` with this application's sinks as the current subscriber.
    pub fn scoped<T>(&self, f: impl FnOnce() -> T) -> T {
        match &self.dispatch {
            Some(dispatch) => tracing::dispatcher::with_default(dispatch, f),
            None => f(),
        }
    }
}

/// Attaches the production sinks and emits the startup marker.
///
/// Order: email sink, then file or stream sink, then the level is raised to
/// info and the marker is logged. A sink that cannot be attached is skipped
/// or replaced; the reason is logged as a warning after the marker.
pub fn configure_production_logging(config: &Config, mail: &Mail) -> Logging {
    let mut layers: Vec<BoxedLayer> = Vec::new();
    let mut sinks = Vec::new();
    let mut warnings = Vec::new();

    match email_layer(config, mail) {
        EmailSink::Attached { layer, rejected } => {
            layers.push(layer);
            sinks.push(SinkKind::Email);
            if !rejected.is_empty() {
                warnings.push(format!(
                    "Failure reports will not be sent to invalid ADMINS entries: {}",
                    rejected.join(", ")
                ));
            }
        }
        EmailSink::Skipped(reason) => warnings.push(format!("Email sink not attached: {}", reason)),
        EmailSink::NotConfigured => {}
    }

    let (layer, sink, fallback_reason) = output_layer(config);
    layers.push(layer);
    sinks.push(sink);
    if let Some(reason) = fallback_reason {
        warnings.push(format!("File logging unavailable, logging to stderr: {}", reason));
    }

    let subscriber = Registry::default().with(layers).with(LevelFilter::INFO);
    let dispatch = Dispatch::new(subscriber);

    tracing::dispatcher::with_default(&dispatch, || {
        tracing::info!("{}", STARTUP_MESSAGE);
        for warning in &warnings {
            tracing::warn!("{}", warning);
        }
    });

    Logging {
        dispatch: Some(dispatch),
        sinks,
    }
}

enum EmailSink {
    Attached {
        layer: BoxedLayer,
        rejected: Vec<String>,
    },
    Skipped(String),
    NotConfigured,
}

/// Admin addresses that fail to parse are left out rather than failing
/// startup.
fn email_layer(config: &Config, mail: &Mail) -> EmailSink {
    let (settings, transport) = match (mail.settings(), mail.transport()) {
        (Some(settings), Some(transport)) => (settings, transport),
        _ => return EmailSink::NotConfigured,
    };

    let (recipients, rejected): (Vec<String>, Vec<String>) = config
        .admins
        .iter()
        .cloned()
        .partition(|address| address.parse::<Mailbox>().is_ok());
    if recipients.is_empty() {
        return EmailSink::Skipped("no valid ADMINS recipients".to_string());
    }

    match FailureReport::new(&settings.no_reply_address(), &recipients) {
        Ok(report) => EmailSink::Attached {
            layer: ErrorMailLayer::spawn(report, transport)
                .with_filter(LevelFilter::ERROR)
                .boxed(),
            rejected,
        },
        Err(e) => EmailSink::Skipped(e.to_string()),
    }
}

/// Rotating file sink, or the stream sink when asked for (or when the log
/// directory cannot be used).
fn output_layer(config: &Config) -> (BoxedLayer, SinkKind, Option<std::io::Error>) {
    if config.log_to_stdout {
        return (stream_layer(), SinkKind::Stream, None);
    }

    let path = config.log_dir.join(LOG_FILE_NAME);
    let writer = std::fs::create_dir_all(&config.log_dir)
        .and_then(|_| RotatingFileWriter::open(&path, LOG_FILE_MAX_BYTES, LOG_FILE_BACKUPS));

    match writer {
        Ok(writer) => {
            let layer = tracing_subscriber::fmt::layer()
                .event_format(RecordFormat)
                .with_ansi(false)
                .with_writer(writer)
                .with_filter(LevelFilter::INFO)
                .boxed();
            (layer, SinkKind::RotatingFile(path), None)
        }
        Err(e) => (stream_layer(), SinkKind::Stream, Some(e)),
    }
}

/// Plain-text records on stderr.
fn stream_layer() -> BoxedLayer {
    tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .with_writer(std::io::stderr)
        .with_filter(LevelFilter::INFO)
        .boxed()
}
