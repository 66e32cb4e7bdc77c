//! # Mutation Capture
//!
//! Pulls native records off the surface and decides when they form a batch.
//!
//! ```text
//!            start()                start_cache()
//!  Stopped ──────────▶ Observing ─────────────────▶ Caching
//!     ▲                   ▲  ▲                          │
//!     │ stop()            │  └── destroy_cache() ───────┤
//!     └───────────────────┴───── flush after deadline ──┘
//! ```
//!
//! While observing, every poll hands out whatever the surface queued. While
//! caching, records are buffered until `submit_cache` has armed a deadline
//! and the deadline has passed. A flush that finds the surface mid-composition
//! is skipped outright; the cache stays armed for the next `submit_cache`.
//!
//! Time is passed in by the caller so hosts drive the debounce from their own
//! event loop.

use scribe_surface::{MutationKind, MutationRecord, Surface};
use std::time::{Duration, Instant};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    Stopped,
    Observing,
    Caching,
}

/// A native record plus, for character data, the node's text as it was when
/// the batch was handed out.
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedRecord {
    pub record: MutationRecord,
    pub text: Option<String>,
}

#[derive(Debug)]
pub struct MutationCapture {
    state: CaptureState,
    cache: Vec<MutationRecord>,
    flush_at: Option<Instant>,
    debounce: Duration,
}

impl MutationCapture {
    pub fn new(debounce: Duration) -> Self {
        Self {
            state: CaptureState::Stopped,
            cache: Vec::new(),
            flush_at: None,
            debounce,
        }
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    pub fn is_caching(&self) -> bool {
        self.state == CaptureState::Caching
    }

    /// Records buffered by the current cache.
    pub fn cached(&self) -> usize {
        self.cache.len()
    }

    pub fn flush_deadline(&self) -> Option<Instant> {
        self.flush_at
    }

    pub fn start(&mut self, surface: &mut Surface) {
        if self.state != CaptureState::Stopped {
            return;
        }
        surface.take_records();
        surface.observe(true);
        self.state = CaptureState::Observing;
        debug!("Mutation capture started");
    }

    /// Stop observing and drop everything not yet handed out.
    pub fn stop(&mut self, surface: &mut Surface) {
        surface.observe(false);
        let dropped = surface.take_records().len() + self.cache.len();
        self.cache.clear();
        self.flush_at = None;
        self.state = CaptureState::Stopped;
        debug!(dropped, "Mutation capture stopped");
    }

    /// Begin buffering. Anything a previous cache still held is discarded.
    pub fn start_cache(&mut self) {
        if self.state == CaptureState::Stopped {
            return;
        }
        self.cache.clear();
        self.flush_at = None;
        self.state = CaptureState::Caching;
    }

    /// Arm a flush of the cache `debounce` after `now`.
    pub fn submit_cache(&mut self, now: Instant) {
        if self.state == CaptureState::Caching {
            self.flush_at = Some(now + self.debounce);
        }
    }

    /// Discard the cache without emitting it and go back to plain observing.
    pub fn destroy_cache(&mut self) {
        if self.state != CaptureState::Caching {
            return;
        }
        let dropped = self.cache.len();
        self.cache.clear();
        self.flush_at = None;
        self.state = CaptureState::Observing;
        debug!(dropped, "Mutation cache destroyed");
    }

    /// Move queued surface records along. Returns a batch when one is ready.
    pub fn poll(&mut self, surface: &mut Surface, now: Instant) -> Option<Vec<CapturedRecord>> {
        match self.state {
            CaptureState::Stopped => None,
            CaptureState::Observing => {
                let records = surface.take_records();
                if records.is_empty() {
                    None
                } else {
                    Some(snapshot(surface, records))
                }
            }
            CaptureState::Caching => {
                self.cache.extend(surface.take_records());
                let deadline = self.flush_at?;
                if now < deadline {
                    return None;
                }
                self.flush_at = None;
                if surface.is_composing() {
                    debug!(cached = self.cache.len(), "Composition active, cache flush skipped");
                    return None;
                }

                let records = std::mem::take(&mut self.cache);
                self.state = CaptureState::Observing;
                debug!(records = records.len(), "Mutation cache flushed");
                if records.is_empty() {
                    None
                } else {
                    Some(snapshot(surface, records))
                }
            }
        }
    }
}

fn snapshot(surface: &Surface, records: Vec<MutationRecord>) -> Vec<CapturedRecord> {
    records
        .into_iter()
        .map(|record| {
            let text = match record.kind {
                MutationKind::CharacterData => surface.text(record.target).map(str::to_string),
                _ => None,
            };
            CapturedRecord { record, text }
        })
        .collect()
}
