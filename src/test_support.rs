//! Scripted transports, readers and cloud providers for unit tests.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::NaiveDate;
use reqwest::StatusCode;
use serde_json::json;
use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::client::ClientError;
use crate::inventory::{
    CacheCluster, CloudInventoryProvider, CostPeriod, DatabaseInstance, Ec2Instance,
    LambdaFunction,
};
use crate::logs::{LogEvent, LogGroup, LogProvider, LogStream};
use crate::model::CompletionRequest;
use crate::transport::{ChunkReader, Transport, TransportResponse};

/// One `data:` event carrying `text` as its content delta.
pub fn delta(text: &str) -> String {
    let chunk = json!({
        "id": "chatcmpl-test",
        "object": "chat.completion.chunk",
        "choices": [{"index": 0, "delta": {"content": text}, "finish_reason": null}]
    });
    format!("data: {}\n\n", chunk)
}

/// A complete event-stream body for `fragments`, optionally ending in `[DONE]`.
pub fn sse_body(fragments: &[&str], done: bool) -> Bytes {
    let mut body = String::from("data: {\"choices\":[{\"delta\":{\"role\":\"assistant\"}}]}\n\n");
    for fragment in fragments {
        body.push_str(&delta(fragment));
    }
    if done {
        body.push_str("data: [DONE]\n\n");
    }
    Bytes::from(body)
}

/// Read and release counters shared between a reader and the test.
#[derive(Debug, Clone, Default)]
pub struct Counts {
    reads: Arc<AtomicUsize>,
    releases: Arc<AtomicUsize>,
}

impl Counts {
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn releases(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }
}

/// Reader that replays fixed chunks and counts reads and releases.
pub struct CountingReader {
    chunks: VecDeque<Bytes>,
    fail_at_end: bool,
    stall_at_end: bool,
    fail_release: bool,
    counts: Counts,
}

impl CountingReader {
    pub fn new(chunks: Vec<Bytes>) -> (Self, Counts) {
        let counts = Counts::default();
        (Self::with_counts(chunks, counts.clone()), counts)
    }

    /// Replays `chunks`, then fails the next read instead of ending.
    pub fn failing_after(chunks: Vec<Bytes>) -> (Self, Counts) {
        let (mut reader, counts) = Self::new(chunks);
        reader.fail_at_end = true;
        (reader, counts)
    }

    pub fn with_failing_release(mut self) -> Self {
        self.fail_release = true;
        self
    }

    fn with_counts(chunks: Vec<Bytes>, counts: Counts) -> Self {
        Self {
            chunks: chunks.into(),
            fail_at_end: false,
            stall_at_end: false,
            fail_release: false,
            counts,
        }
    }
}

#[async_trait]
impl ChunkReader for CountingReader {
    async fn read(&mut self) -> Result<Option<Bytes>, ClientError> {
        self.counts.reads.fetch_add(1, Ordering::SeqCst);
        match self.chunks.pop_front() {
            Some(chunk) => Ok(Some(chunk)),
            None if self.fail_at_end => Err(ClientError::Read("connection reset".to_string())),
            None if self.stall_at_end => futures::future::pending().await,
            None => Ok(None),
        }
    }

    fn release(&mut self) -> Result<(), ClientError> {
        self.counts.releases.fetch_add(1, Ordering::SeqCst);
        if self.fail_release {
            return Err(ClientError::Read("release failed".to_string()));
        }
        Ok(())
    }
}

/// Transport that answers every request with the same status and body.
pub struct ScriptedTransport {
    status: StatusCode,
    chunks: Vec<Bytes>,
    stall: bool,
    requests: Mutex<Vec<CompletionRequest>>,
    counts: Counts,
}

impl ScriptedTransport {
    pub fn ok(chunks: Vec<Bytes>) -> Self {
        Self {
            status: StatusCode::OK,
            chunks,
            stall: false,
            requests: Mutex::new(Vec::new()),
            counts: Counts::default(),
        }
    }

    pub fn with_status(status: StatusCode, body: &str) -> Self {
        Self {
            status,
            ..Self::ok(vec![Bytes::copy_from_slice(body.as_bytes())])
        }
    }

    /// Body never ends after its chunks; reads wait forever.
    pub fn stalling(mut self) -> Self {
        self.stall = true;
        self
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn releases(&self) -> usize {
        self.counts.releases()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    type Reader = CountingReader;

    async fn send(
        &self,
        request: &CompletionRequest,
    ) -> Result<TransportResponse<Self::Reader>, ClientError> {
        self.requests.lock().unwrap().push(request.clone());
        let mut reader = CountingReader::with_counts(self.chunks.clone(), self.counts.clone());
        reader.stall_at_end = self.stall;
        Ok(TransportResponse::new(self.status, reader))
    }
}

/// In-memory cloud account.
#[derive(Default)]
pub struct FakeCloud {
    pub identity: Option<String>,
    pub instances: Vec<Ec2Instance>,
    pub functions: Vec<LambdaFunction>,
    pub databases: Vec<DatabaseInstance>,
    pub clusters: Vec<String>,
    pub caches: Vec<CacheCluster>,
    pub costs: Vec<CostPeriod>,
    pub failing: Vec<&'static str>,
    pub streams: Vec<LogStream>,
    pub events: BTreeMap<String, Vec<LogEvent>>,
    pub event_calls: Mutex<Vec<(String, i64, i64)>>,
}

impl FakeCloud {
    fn check(&self, call: &'static str) -> Result<(), ClientError> {
        if self.failing.contains(&call) {
            return Err(ClientError::Provider(format!("{} unavailable", call)));
        }
        Ok(())
    }
}

pub fn instance(id: &str, instance_type: &str, state: &str, tags: &[(&str, &str)]) -> Ec2Instance {
    Ec2Instance {
        id: id.to_string(),
        instance_type: instance_type.to_string(),
        state: state.to_string(),
        availability_zone: Some("us-east-1a".to_string()),
        private_ip: Some("10.0.0.1".to_string()),
        public_ip: None,
        tags: tags
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
    }
}

#[async_trait]
impl CloudInventoryProvider for FakeCloud {
    async fn verify_access(&self) -> Result<String, ClientError> {
        self.check("verify_access")?;
        self.identity
            .clone()
            .ok_or_else(|| ClientError::Provider("invalid credentials".to_string()))
    }

    async fn ec2_instances(&self) -> Result<Vec<Ec2Instance>, ClientError> {
        self.check("ec2")?;
        Ok(self.instances.clone())
    }

    async fn lambda_functions(&self) -> Result<Vec<LambdaFunction>, ClientError> {
        self.check("lambda")?;
        Ok(self.functions.clone())
    }

    async fn rds_instances(&self) -> Result<Vec<DatabaseInstance>, ClientError> {
        self.check("rds")?;
        Ok(self.databases.clone())
    }

    async fn ecs_clusters(&self) -> Result<Vec<String>, ClientError> {
        self.check("ecs")?;
        Ok(self.clusters.clone())
    }

    async fn elasticache_clusters(&self) -> Result<Vec<CacheCluster>, ClientError> {
        self.check("elasticache")?;
        Ok(self.caches.clone())
    }

    async fn cost_and_usage(
        &self,
        _start: NaiveDate,
        _end: NaiveDate,
    ) -> Result<Vec<CostPeriod>, ClientError> {
        self.check("cost")?;
        Ok(self.costs.clone())
    }
}

#[async_trait]
impl LogProvider for FakeCloud {
    async fn log_groups(&self) -> Result<Vec<LogGroup>, ClientError> {
        self.check("log_groups")?;
        Ok(vec![LogGroup {
            name: "/aws/lambda/api".to_string(),
            stored_bytes: Some(2048),
        }])
    }

    async fn latest_streams(
        &self,
        _group: &str,
        limit: usize,
    ) -> Result<Vec<LogStream>, ClientError> {
        self.check("streams")?;
        Ok(self.streams.iter().take(limit).cloned().collect())
    }

    async fn log_events(
        &self,
        _group: &str,
        stream: &str,
        start_ms: i64,
        end_ms: i64,
    ) -> Result<Vec<LogEvent>, ClientError> {
        self.check("events")?;
        self.event_calls
            .lock()
            .unwrap()
            .push((stream.to_string(), start_ms, end_ms));
        Ok(self.events.get(stream).cloned().unwrap_or_default())
    }
}
