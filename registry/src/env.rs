//! Host capabilities injected into every registry operation.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;

use crate::auth::AuthVerifier;
use crate::events::{EventRecord, EventSink};
use crate::types::Timestamp;

/// Source of the current ledger time.
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// Wall clock in unix seconds.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Utc::now().timestamp().max(0) as Timestamp
    }
}

/// Clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock(Arc<AtomicU64>);

impl ManualClock {
    pub fn new(now: Timestamp) -> Self {
        Self(Arc::new(AtomicU64::new(now)))
    }

    pub fn set(&self, now: Timestamp) {
        self.0.store(now, Ordering::SeqCst);
    }

    pub fn advance(&self, secs: u64) {
        self.0.fetch_add(secs, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        self.0.load(Ordering::SeqCst)
    }
}

/// Capabilities a single call runs against: who may call, what time it is,
/// and where events go.
pub struct Env<'a> {
    verifier: &'a dyn AuthVerifier,
    clock: &'a dyn Clock,
    events: &'a mut dyn EventSink,
}

impl<'a> Env<'a> {
    pub fn new(
        verifier: &'a dyn AuthVerifier,
        clock: &'a dyn Clock,
        events: &'a mut dyn EventSink,
    ) -> Self {
        Self {
            verifier,
            clock,
            events,
        }
    }

    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    pub(crate) fn verifier(&self) -> &dyn AuthVerifier {
        self.verifier
    }

    pub(crate) fn publish(&mut self, record: EventRecord) {
        self.events.publish(record);
    }
}
