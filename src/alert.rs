//! Alert bus - transient user notifications
//!
//! Pages publish success/info/error notifications here; the TUI drains them
//! into toasts each frame. Clonable handle over shared storage, same shape
//! as the log buffer, so page components and the UI loop can both hold one.

use crate::rest::error::RestError;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Keep a short backlog; alerts are transient by design
const MAX_ALERTS: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertLevel {
    Success,
    Info,
    Error,
}

#[derive(Debug, Clone)]
pub struct Alert {
    pub level: AlertLevel,
    pub message: String,
}

/// Clonable alert channel shared by all pages and the TUI
#[derive(Clone, Default)]
pub struct AlertBus {
    alerts: Arc<Mutex<VecDeque<Alert>>>,
}

impl AlertBus {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, level: AlertLevel, message: String) {
        let mut alerts = self.alerts.lock().unwrap();
        if alerts.len() >= MAX_ALERTS {
            alerts.pop_front();
        }
        alerts.push_back(Alert { level, message });
    }

    pub fn success(&self, message: impl Into<String>) {
        self.push(AlertLevel::Success, message.into());
    }

    pub fn info(&self, message: impl Into<String>) {
        self.push(AlertLevel::Info, message.into());
    }

    pub fn error(&self, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!("{}", message);
        self.push(AlertLevel::Error, message);
    }

    /// Surface a REST failure. Authorization rejections are traced only;
    /// outer infrastructure owns those, not the page.
    pub fn exception(&self, context: &str, err: &RestError) {
        if !err.is_user_visible() {
            tracing::warn!("{}: {}", context, err);
            return;
        }
        self.error(format!("{}: {}", context, err.user_message()));
    }

    /// Discard pending alerts (called on navigation, as the original does)
    pub fn clear(&self) {
        self.alerts.lock().unwrap().clear();
    }

    /// Take the next alert to display, oldest first
    pub fn pop(&self) -> Option<Alert> {
        self.alerts.lock().unwrap().pop_front()
    }

    pub fn is_empty(&self) -> bool {
        self.alerts.lock().unwrap().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alerts_drain_in_order() {
        let bus = AlertBus::new();
        bus.success("saved");
        bus.error("failed");
        assert_eq!(bus.pop().unwrap().message, "saved");
        assert_eq!(bus.pop().unwrap().level, AlertLevel::Error);
        assert!(bus.pop().is_none());
    }

    #[test]
    fn test_forbidden_exception_is_swallowed() {
        let bus = AlertBus::new();
        bus.exception("Loading users", &RestError::Forbidden);
        assert!(bus.is_empty());
    }

    #[test]
    fn test_business_exception_carries_server_message() {
        let bus = AlertBus::new();
        bus.exception(
            "Saving domain",
            &RestError::Business("Cannot disable the current domain".to_string()),
        );
        let alert = bus.pop().unwrap();
        assert!(alert.message.contains("Cannot disable the current domain"));
    }

    #[test]
    fn test_clear_discards_backlog() {
        let bus = AlertBus::new();
        bus.info("one");
        bus.clear();
        assert!(bus.is_empty());
    }
}
