//! Recent log retrieval for summarization.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, TimeDelta, Utc};
use futures::future::try_join_all;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::client::ClientError;

/// Default look-back for [`recent_logs`].
pub const DEFAULT_LOG_WINDOW: Duration = Duration::from_secs(60 * 60);

/// How many of the most recently written streams are read.
pub const RECENT_STREAM_LIMIT: usize = 5;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LogGroup {
    pub name: String,
    pub stored_bytes: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LogStream {
    pub name: String,
    /// Milliseconds since the epoch
    pub last_event_timestamp: Option<i64>,
}

/// A raw event as stored by the provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LogEvent {
    /// Milliseconds since the epoch
    pub timestamp: i64,
    pub message: String,
}

/// A log line ready for display.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub message: String,
}

/// Read access to an account's logs.
#[async_trait]
pub trait LogProvider: Send + Sync {
    async fn log_groups(&self) -> Result<Vec<LogGroup>, ClientError>;

    /// Up to `limit` streams of `group`, most recent event first.
    async fn latest_streams(&self, group: &str, limit: usize)
        -> Result<Vec<LogStream>, ClientError>;

    /// Events of one stream between `start_ms` and `end_ms`.
    async fn log_events(
        &self,
        group: &str,
        stream: &str,
        start_ms: i64,
        end_ms: i64,
    ) -> Result<Vec<LogEvent>, ClientError>;
}

/// Events from the most recent streams of `group` within `window` of `now`,
/// oldest first.
pub async fn recent_logs<P>(
    provider: &P,
    group: &str,
    window: Duration,
    now: DateTime<Utc>,
) -> Result<Vec<LogEntry>, ClientError>
where
    P: LogProvider + ?Sized,
{
    let window = TimeDelta::from_std(window)
        .map_err(|e| ClientError::InvalidRequest(format!("log window out of range: {}", e)))?;
    let end_ms = now.timestamp_millis();
    let start_ms = (now - window).timestamp_millis();

    let streams = provider.latest_streams(group, RECENT_STREAM_LIMIT).await?;
    debug!(group, streams = streams.len(), "reading recent log streams");

    let batches = try_join_all(
        streams
            .iter()
            .map(|stream| provider.log_events(group, &stream.name, start_ms, end_ms)),
    )
    .await?;

    batches
        .into_iter()
        .flatten()
        .sorted_by_key(|event| event.timestamp)
        .map(|event| -> Result<LogEntry, ClientError> {
            let timestamp = DateTime::from_timestamp_millis(event.timestamp).ok_or_else(|| {
                ClientError::Provider(format!("event timestamp out of range: {}", event.timestamp))
            })?;
            Ok(LogEntry {
                timestamp,
                message: event.message,
            })
        })
        .collect()
}

/// One `[timestamp] message` line per entry.
pub fn format_for_display(entries: &[LogEntry]) -> String {
    entries
        .iter()
        .map(|entry| {
            format!(
                "[{}] {}",
                entry.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
                entry.message
            )
        })
        .join("\n")
}
