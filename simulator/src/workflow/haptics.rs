use log::info;
use meshcore::HapticSink;

/// Stand-in for a vibration motor: writes each pattern to the log.
pub struct LogSink;

impl HapticSink for LogSink {
    fn vibrate(&self, pattern: &[u32]) {
        info!("[haptics] vibrate {:?}", pattern);
    }
}
