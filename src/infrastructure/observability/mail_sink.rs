use crate::domain::ports::mail_transport::{MailError, MailTransport};
use chrono::Local;
use lettre::message::{header::ContentType, Mailbox};
use lettre::Message;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer};

pub const FAILURE_SUBJECT: &str = "Microblog Failure";

/// Addressing for failure reports.
#[derive(Debug, Clone)]
pub struct FailureReport {
    pub from: Mailbox,
    pub to: Vec<Mailbox>,
    pub subject: String,
}

impl FailureReport {
    pub fn new(from: &str, to: &[String]) -> Result<Self, MailError> {
        let from = from.parse()?;
        let to = to
            .iter()
            .map(|address| address.parse())
            .collect::<Result<Vec<Mailbox>, _>>()?;

        Ok(Self {
            from,
            to,
            subject: FAILURE_SUBJECT.to_string(),
        })
    }

    fn message(&self, body: String) -> Result<Message, MailError> {
        let mut builder = Message::builder()
            .from(self.from.clone())
            .subject(self.subject.clone())
            .header(ContentType::TEXT_PLAIN);
        for recipient in &self.to {
            builder = builder.to(recipient.clone());
        }
        Ok(builder.body(body)?)
    }
}

/// Pending failure reports held while SMTP is slow; further records are
/// dropped and counted.
pub const FAILURE_QUEUE_CAPACITY: usize = 64;

/// Layer that mails every event it sees to the admins.
///
/// Events are queued on a bounded channel and delivered by a background task
/// so the thread that logged the error never waits on SMTP. Install it behind
/// an error-level filter.
pub struct ErrorMailLayer {
    sender: mpsc::Sender<String>,
    dropped: Arc<AtomicUsize>,
}

impl ErrorMailLayer {
    /// Spawns the delivery task. Must be called inside a tokio runtime.
    pub fn spawn(report: FailureReport, transport: Arc<dyn MailTransport>) -> Self {
        Self::spawn_with_capacity(report, transport, FAILURE_QUEUE_CAPACITY)
    }

    pub fn spawn_with_capacity(
        report: FailureReport,
        transport: Arc<dyn MailTransport>,
        capacity: usize,
    ) -> Self {
        let (sender, mut receiver) = mpsc::channel::<String>(capacity.max(1));
        let dropped = Arc::new(AtomicUsize::new(0));
        let dropped_seen = dropped.clone();

        tokio::spawn(async move {
            let mut reported = 0;
            while let Some(body) = receiver.recv().await {
                let result = match report.message(body) {
                    Ok(message) => transport.send(message).await,
                    Err(e) => Err(e),
                };
                if let Err(e) = result {
                    tracing::warn!("Failed to send failure report: {}", e);
                }

                let total = dropped_seen.load(Ordering::Relaxed);
                if total > reported {
                    tracing::warn!(
                        "Dropped {} failure reports: delivery queue full",
                        total - reported
                    );
                    reported = total;
                }
            }
        });

        Self { sender, dropped }
    }

    /// Shared count of records dropped because the queue was full.
    pub fn dropped_counter(&self) -> Arc<AtomicUsize> {
        self.dropped.clone()
    }
}

impl<S> Layer<S> for ErrorMailLayer
where
    S: Subscriber,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);

        let body = format!(
            "{} {}: {}\n[in {}:{}]\n",
            Local::now().format("%Y-%m-%d %H:%M:%S,%3f"),
            metadata.level(),
            visitor,
            metadata.file().unwrap_or("<unknown>"),
            metadata.line().unwrap_or(0)
        );

        match self.sender.try_send(body) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
            }
            // Receiver only goes away with the runtime
            Err(TrySendError::Closed(_)) => {}
        }
    }
}

#[derive(Default)]
struct MessageVisitor {
    message: String,
    fields: Vec<String>,
}

impl Visit for MessageVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.fields.push(format!("{}={}", field.name(), value));
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{:?}", value);
        } else {
            self.fields.push(format!("{}={:?}", field.name(), value));
        }
    }
}

impl fmt::Display for MessageVisitor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        for field in &self.fields {
            write!(f, " {}", field)?;
        }
        Ok(())
    }
}
