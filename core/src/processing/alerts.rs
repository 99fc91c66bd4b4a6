use crate::prelude::{AlertKind, HapticSink};
use crate::processing::roster::AlertIntent;
use crate::telemetry::log::LogManager;

const DISTANCE_PATTERN: [u32; 3] = [500, 200, 500];
const BATTERY_PATTERN: [u32; 5] = [100, 100, 100, 100, 500];
const TEST_PATTERN: [u32; 3] = [50, 50, 50];

/// Vibration pattern (alternating on/off milliseconds) for an alert kind.
pub fn pattern(kind: AlertKind) -> &'static [u32] {
    match kind {
        AlertKind::Distance => &DISTANCE_PATTERN,
        AlertKind::Battery => &BATTERY_PATTERN,
        AlertKind::Test => &TEST_PATTERN,
    }
}

/// Sink for hosts without a vibration motor.
pub struct SilentSink;

impl HapticSink for SilentSink {
    fn vibrate(&self, _pattern: &[u32]) {}
}

/// Forwards alert kinds to a haptic sink. No throttling: every intent fires.
pub struct AlertDispatcher<S> {
    sink: S,
    logger: LogManager,
}

impl<S: HapticSink> AlertDispatcher<S> {
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            logger: LogManager::new("alerts"),
        }
    }

    pub fn notify(&self, kind: AlertKind) {
        self.sink.vibrate(pattern(kind));
    }

    /// Fires every intent from a tick, in order. Returns how many fired.
    pub fn dispatch(&self, intents: &[AlertIntent]) -> usize {
        for intent in intents {
            self.logger.record(&format!(
                "{:?} alert for {} ({})",
                intent.kind, intent.member_name, intent.member_id
            ));
            self.notify(intent.kind);
        }
        intents.len()
    }

    /// User-requested haptic check; never raised by the engine.
    pub fn test(&self) {
        self.logger.record("test alert");
        self.notify(AlertKind::Test);
    }
}
