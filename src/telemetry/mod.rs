//! Pipeline telemetry
//!
//! Collects request events and running counters. Shared by clone; all
//! state lives behind `Arc<Mutex<...>>`.

use std::sync::{Arc, Mutex};
use std::time::Instant;

/// Telemetry event types
#[derive(Debug, Clone)]
pub enum TelemetryEvent {
    PhaseTransition {
        from: String,
        to: String,
        timestamp: Instant,
    },
    TokenRelayed {
        timestamp: Instant,
    },
    RetrievalCompleted {
        hits: usize,
        generation: u64,
        timestamp: Instant,
    },
    AnswerCompleted {
        token_count: usize,
        duration_ms: u64,
        timestamp: Instant,
    },
    RequestFailed {
        kind: String,
        timestamp: Instant,
    },
    RequestCancelled {
        timestamp: Instant,
    },
}

/// Running counters
#[derive(Debug, Clone, Default)]
pub struct TelemetryStats {
    pub tokens_relayed: usize,
    pub retrievals: usize,
    pub answers_completed: usize,
    pub requests_failed: usize,
    pub requests_cancelled: usize,
    pub phase_transitions: usize,
}

/// Telemetry collector
#[derive(Clone)]
pub struct TelemetryCollector {
    events: Arc<Mutex<Vec<TelemetryEvent>>>,
    stats: Arc<Mutex<TelemetryStats>>,
    start_time: Instant,
}

impl TelemetryCollector {
    pub fn new() -> Self {
        Self {
            events: Arc::new(Mutex::new(Vec::new())),
            stats: Arc::new(Mutex::new(TelemetryStats::default())),
            start_time: Instant::now(),
        }
    }

    /// Record an event and update counters
    pub fn record(&self, event: TelemetryEvent) {
        {
            let mut stats = self.stats.lock().unwrap_or_else(|p| p.into_inner());
            match &event {
                TelemetryEvent::PhaseTransition { .. } => stats.phase_transitions += 1,
                TelemetryEvent::TokenRelayed { .. } => stats.tokens_relayed += 1,
                TelemetryEvent::RetrievalCompleted { .. } => stats.retrievals += 1,
                TelemetryEvent::AnswerCompleted { .. } => stats.answers_completed += 1,
                TelemetryEvent::RequestFailed { .. } => stats.requests_failed += 1,
                TelemetryEvent::RequestCancelled { .. } => stats.requests_cancelled += 1,
            }
        }

        let mut events = self.events.lock().unwrap_or_else(|p| p.into_inner());
        events.push(event);
    }

    pub fn phase_transition(&self, from: impl Into<String>, to: impl Into<String>) {
        self.record(TelemetryEvent::PhaseTransition {
            from: from.into(),
            to: to.into(),
            timestamp: Instant::now(),
        });
    }

    pub fn stats(&self) -> TelemetryStats {
        self.stats
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .clone()
    }

    pub fn events(&self) -> Vec<TelemetryEvent> {
        self.events
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .clone()
    }

    pub fn uptime_ms(&self) -> u64 {
        self.start_time.elapsed().as_millis() as u64
    }
}

impl Default for TelemetryCollector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_track_events() {
        let telemetry = TelemetryCollector::new();

        telemetry.record(TelemetryEvent::TokenRelayed {
            timestamp: Instant::now(),
        });
        telemetry.record(TelemetryEvent::TokenRelayed {
            timestamp: Instant::now(),
        });
        telemetry.phase_transition("Idle", "Composing");
        telemetry.record(TelemetryEvent::RequestCancelled {
            timestamp: Instant::now(),
        });

        let stats = telemetry.stats();
        assert_eq!(stats.tokens_relayed, 2);
        assert_eq!(stats.phase_transitions, 1);
        assert_eq!(stats.requests_cancelled, 1);
        assert_eq!(telemetry.events().len(), 4);
    }

    #[test]
    fn test_clones_share_state() {
        let telemetry = TelemetryCollector::new();
        let clone = telemetry.clone();

        clone.record(TelemetryEvent::TokenRelayed {
            timestamp: Instant::now(),
        });

        assert_eq!(telemetry.stats().tokens_relayed, 1);
    }
}
