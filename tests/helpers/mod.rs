#![allow(dead_code)]
use async_trait::async_trait;
use lettre::Message;
use microblog::domain::ports::mail_transport::{MailError, MailTransport};
use microblog::Config;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

pub const TEST_REDIS_URL: &str = "redis://127.0.0.1:6379/0";

/// Testing-mode configuration with `overrides` applied on top.
pub fn test_config(overrides: &[(&str, &str)]) -> Config {
    let mut values: HashMap<String, String> = [
        ("REDIS_URL", TEST_REDIS_URL),
        ("DATABASE_URL", "sqlite::memory:"),
        ("TESTING", "true"),
        ("TRANSLATIONS_DIR", "tests/fixtures/translations"),
    ]
    .iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();

    for (key, value) in overrides {
        values.insert(key.to_string(), value.to_string());
    }

    Config::from_lookup(|key| values.get(key).cloned()).expect("Failed to build test config")
}

/// Production-mode configuration writing the log file under `log_dir`.
pub fn production_config(log_dir: &std::path::Path, overrides: &[(&str, &str)]) -> Config {
    let log_dir = log_dir.to_string_lossy().to_string();
    let mut pairs: Vec<(&str, &str)> = vec![("TESTING", "false"), ("DEBUG", "false"), ("LOG_DIR", log_dir.as_str())];
    pairs.extend_from_slice(overrides);
    test_config(&pairs)
}

/// Mail transport that hands every message to the test.
pub struct RecordingTransport {
    sender: mpsc::UnboundedSender<Message>,
}

impl RecordingTransport {
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<Message>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Arc::new(Self { sender }), receiver)
    }
}

#[async_trait]
impl MailTransport for RecordingTransport {
    async fn send(&self, message: Message) -> Result<(), MailError> {
        let _ = self.sender.send(message);
        Ok(())
    }
}

/// Next recorded message, rendered as raw RFC 5322 text.
pub async fn next_message(receiver: &mut mpsc::UnboundedReceiver<Message>) -> String {
    let message = tokio::time::timeout(Duration::from_secs(5), receiver.recv())
        .await
        .expect("Timed out waiting for mail")
        .expect("Mail channel closed");
    String::from_utf8(message.formatted()).expect("Mail is not UTF-8")
}
