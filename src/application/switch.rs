//! Process-wide reporting on/off switch.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Atomically read flag deciding whether events are reported at all.
///
/// Checked first on every event, so it stays a single atomic load. Clones
/// share the flag, which lets a configuration watcher flip it without
/// holding the worker.
#[derive(Debug, Clone)]
pub struct ReportingSwitch {
    enabled: Arc<AtomicBool>,
}

impl ReportingSwitch {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled: Arc::new(AtomicBool::new(enabled)),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    /// Set the flag, returning the previous value.
    pub fn set(&self, enabled: bool) -> bool {
        self.enabled.swap(enabled, Ordering::AcqRel)
    }
}

impl Default for ReportingSwitch {
    fn default() -> Self {
        Self::new(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle() {
        let switch = ReportingSwitch::default();
        assert!(switch.is_enabled());

        assert!(switch.set(false));
        assert!(!switch.is_enabled());
        assert!(!switch.set(true));
        assert!(switch.is_enabled());
    }

    #[test]
    fn test_clones_share_state() {
        let switch = ReportingSwitch::new(true);
        let watcher = switch.clone();
        watcher.set(false);
        assert!(!switch.is_enabled());
    }
}
