//! Metrics for the chat pipeline: embed, retrieve, reply.

use metrics::{counter, histogram};
use std::time::{Duration, Instant};

/// How a chat request ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatOutcome {
    /// At least one chunk was returned.
    Answered,
    /// No un-excluded chunk was left.
    Exhausted,
    /// Rejected before any outbound call.
    Invalid,
    /// Embedding, retrieval or timeout failure.
    Failed,
}

impl ChatOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Answered => "answered",
            Self::Exhausted => "exhausted",
            Self::Invalid => "invalid",
            Self::Failed => "failed",
        }
    }
}

/// Timed pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Embedding,
    Retrieval,
}

impl Stage {
    fn metric_name(&self) -> &'static str {
        match self {
            Self::Embedding => "embedding_duration_seconds",
            Self::Retrieval => "retrieval_duration_seconds",
        }
    }
}

/// Chat metrics recorder
pub struct ChatMetrics;

impl ChatMetrics {
    pub fn record_request(outcome: ChatOutcome, chunks_returned: usize) {
        counter!("chat_requests_total", "outcome" => outcome.as_str()).increment(1);
        if outcome == ChatOutcome::Answered {
            histogram!("chat_chunks_returned").record(chunks_returned as f64);
        }
    }

    pub fn record_stage(stage: Stage, duration: Duration, success: bool) {
        histogram!(
            stage.metric_name(),
            "status" => if success { "ok" } else { "error" }
        )
        .record(duration.as_secs_f64());
    }
}

/// Timer guard for a pipeline stage.
///
/// Records as a failure when dropped without [`finish`](Self::finish), which
/// covers early returns through `?`.
pub struct StageTimer {
    start: Instant,
    stage: Stage,
    stopped: bool,
}

impl StageTimer {
    pub fn start(stage: Stage) -> Self {
        Self {
            start: Instant::now(),
            stage,
            stopped: false,
        }
    }

    /// Stop the timer and record the duration. Returns the elapsed time.
    pub fn finish(&mut self, success: bool) -> Duration {
        let elapsed = self.start.elapsed();
        if !self.stopped {
            self.stopped = true;
            ChatMetrics::record_stage(self.stage, elapsed, success);
        }
        elapsed
    }
}

impl Drop for StageTimer {
    fn drop(&mut self) {
        if !self.stopped {
            self.finish(false);
        }
    }
}
