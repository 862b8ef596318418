//! Telemetry for CourseBuddy
//!
//! Collects turn events (oracle calls, retrievals, verification retries)
//! and summarises them for the REPL `/stats` command.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use crate::query::QuestionMode;

/// Why the oracle was called
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallPurpose {
    Answer,
    Classification,
    Verification,
}

/// Telemetry event types
#[derive(Debug, Clone)]
pub enum TelemetryEvent {
    OracleCall {
        purpose: CallPurpose,
        timestamp: Instant,
    },
    Retrieval {
        k: usize,
        chunks: usize,
        timestamp: Instant,
    },
    StateTransition {
        from: String,
        to: String,
        timestamp: Instant,
    },
    VerificationRetry {
        timestamp: Instant,
    },
    Fallback {
        timestamp: Instant,
    },
    TurnCompleted {
        mode: QuestionMode,
        duration_ms: u64,
        timestamp: Instant,
    },
    TurnFailed {
        error: String,
        timestamp: Instant,
    },
}

/// Telemetry statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TelemetryStats {
    pub turns_completed: usize,
    pub turns_failed: usize,
    pub answer_calls: usize,
    pub classification_calls: usize,
    pub verification_calls: usize,
    pub retrievals: usize,
    pub chunks_retrieved: usize,
    pub verification_retries: usize,
    pub fallbacks: usize,
    pub state_transitions: usize,
}

impl TelemetryStats {
    pub fn oracle_calls(&self) -> usize {
        self.answer_calls + self.classification_calls + self.verification_calls
    }
}

/// Shared telemetry collector
#[derive(Clone)]
pub struct TelemetryCollector {
    events: Arc<Mutex<Vec<TelemetryEvent>>>,
    stats: Arc<Mutex<TelemetryStats>>,
    start_time: Instant,
}

/// Lock ignoring poisoning; telemetry must never take a turn down
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl TelemetryCollector {
    pub fn new() -> Self {
        Self {
            events: Arc::new(Mutex::new(Vec::new())),
            stats: Arc::new(Mutex::new(TelemetryStats::default())),
            start_time: Instant::now(),
        }
    }

    /// Record an event
    pub fn record(&self, event: TelemetryEvent) {
        {
            let mut stats = lock(&self.stats);
            match &event {
                TelemetryEvent::OracleCall { purpose, .. } => match purpose {
                    CallPurpose::Answer => stats.answer_calls += 1,
                    CallPurpose::Classification => stats.classification_calls += 1,
                    CallPurpose::Verification => stats.verification_calls += 1,
                },
                TelemetryEvent::Retrieval { chunks, .. } => {
                    stats.retrievals += 1;
                    stats.chunks_retrieved += chunks;
                }
                TelemetryEvent::StateTransition { .. } => stats.state_transitions += 1,
                TelemetryEvent::VerificationRetry { .. } => stats.verification_retries += 1,
                TelemetryEvent::Fallback { .. } => stats.fallbacks += 1,
                TelemetryEvent::TurnCompleted { .. } => stats.turns_completed += 1,
                TelemetryEvent::TurnFailed { .. } => stats.turns_failed += 1,
            }
        }

        lock(&self.events).push(event);
    }

    /// Record `count` oracle calls made for `purpose`
    pub fn oracle_calls(&self, purpose: CallPurpose, count: usize) {
        for _ in 0..count {
            self.record(TelemetryEvent::OracleCall {
                purpose,
                timestamp: Instant::now(),
            });
        }
    }

    pub fn get_stats(&self) -> TelemetryStats {
        lock(&self.stats).clone()
    }

    /// Get elapsed time since start
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    pub fn event_count(&self) -> usize {
        lock(&self.events).len()
    }

    /// Get recent events (last n)
    pub fn recent_events(&self, n: usize) -> Vec<TelemetryEvent> {
        let events = lock(&self.events);
        let start = events.len().saturating_sub(n);
        events[start..].to_vec()
    }

    /// Share of completed turns that ended in the fallback reply
    pub fn fallback_rate(&self) -> f64 {
        let stats = lock(&self.stats);
        if stats.turns_completed == 0 {
            0.0
        } else {
            stats.fallbacks as f64 / stats.turns_completed as f64
        }
    }

    /// Multi-line summary for display
    pub fn summary(&self) -> String {
        let stats = self.get_stats();
        format!(
            "Duration:              {:?}\n\
             Turns completed:       {}\n\
             Turns failed:          {}\n\
             Oracle calls:          {} (answer {}, classification {}, verification {})\n\
             Retrievals:            {} ({} chunks)\n\
             Verification retries:  {}\n\
             Fallback rate:         {:.1}%",
            self.elapsed(),
            stats.turns_completed,
            stats.turns_failed,
            stats.oracle_calls(),
            stats.answer_calls,
            stats.classification_calls,
            stats.verification_calls,
            stats.retrievals,
            stats.chunks_retrieved,
            stats.verification_retries,
            self.fallback_rate() * 100.0
        )
    }
}

impl Default for TelemetryCollector {
    fn default() -> Self {
        Self::new()
    }
}
