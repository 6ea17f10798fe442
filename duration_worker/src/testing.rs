use std::collections::VecDeque;
use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use md_ffprobe::Prober;
use md_queue::{JobQueue, QueueError, QueuedJob};
use serde_json::{json, Value};

/// Prober that replays canned ffprobe JSON and counts calls.
#[derive(Debug, Default)]
pub struct FakeProber {
    header: Option<String>,
    packets: Option<String>,
    header_calls: AtomicUsize,
    packet_calls: AtomicUsize,
}

impl FakeProber {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_header(self, format_name: &str, duration: &str) -> Self {
        let raw = json!({
            "programs": [],
            "streams": [],
            "format": { "format_name": format_name, "duration": duration }
        });
        self.with_raw_header(&raw.to_string())
    }

    pub fn with_raw_header(mut self, raw: &str) -> Self {
        self.header = Some(raw.to_string());
        self
    }

    pub fn with_packets(mut self, pts_times: &[&str]) -> Self {
        let packets: Vec<_> = pts_times
            .iter()
            .map(|pts_time| json!({ "pts_time": pts_time }))
            .collect();
        self.packets = Some(json!({ "packets": packets }).to_string());
        self
    }

    pub fn header_calls(&self) -> usize {
        self.header_calls.load(Ordering::SeqCst)
    }

    pub fn packet_calls(&self) -> usize {
        self.packet_calls.load(Ordering::SeqCst)
    }
}

impl Prober for FakeProber {
    async fn probe_header(&self, _path: &Path) -> Option<String> {
        self.header_calls.fetch_add(1, Ordering::SeqCst);
        self.header.clone()
    }

    async fn probe_packets(&self, _path: &Path) -> Option<String> {
        self.packet_calls.fetch_add(1, Ordering::SeqCst);
        self.packets.clone()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ack {
    Complete(String, Vec<u8>),
    Failed(String, String),
}

/// In-memory queue that records every terminal call.
#[derive(Debug, Default)]
pub struct FakeQueue {
    pub jobs: VecDeque<QueuedJob>,
    pub acks: Vec<Ack>,
}

impl FakeQueue {
    pub fn with_bodies(bodies: &[&[u8]]) -> Self {
        let jobs = bodies
            .iter()
            .enumerate()
            .map(|(i, body)| QueuedJob {
                key: format!("job:item:{i}"),
                body: body.to_vec(),
            })
            .collect();
        Self {
            jobs,
            acks: Vec::new(),
        }
    }
}

impl JobQueue for FakeQueue {
    async fn next_job(&mut self) -> Result<Option<QueuedJob>, QueueError> {
        Ok(self.jobs.pop_front())
    }

    async fn complete(
        &mut self,
        job: &QueuedJob,
        payload: &[u8],
    ) -> Result<(), QueueError> {
        self.acks
            .push(Ack::Complete(job.key.clone(), payload.to_vec()));
        Ok(())
    }

    async fn fail(
        &mut self,
        job: &QueuedJob,
        message: &str,
    ) -> Result<(), QueueError> {
        self.acks
            .push(Ack::Failed(job.key.clone(), message.to_string()));
        Ok(())
    }
}

/// JSON log lines recorded by a thread-local subscriber.
#[derive(Debug, Clone, Default)]
pub struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    /// Captures everything logged on this thread until the guard is dropped.
    pub fn install() -> (Self, tracing::subscriber::DefaultGuard) {
        let logs = Self::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .json()
            .with_max_level(tracing::Level::TRACE)
            .with_writer(move || writer.clone())
            .finish();

        (logs, tracing::subscriber::set_default(subscriber))
    }

    pub fn entries(&self) -> Vec<Value> {
        let buf = self.0.lock().expect("log buffer");
        String::from_utf8_lossy(&buf)
            .lines()
            .map(|line| serde_json::from_str(line).expect("JSON log line"))
            .collect()
    }
}

impl Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().expect("log buffer").extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
