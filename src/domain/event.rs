//! Error events as delivered to telemetry consumers.
//!
//! An [`ErrorEvent`] is created by application code when something fails and
//! handed to the event bus. Consumers only read it, apart from the `reported`
//! flag, which moves from `false` to `true` at most once.

use crate::domain::category::ErrorCategory;
use serde::Serialize;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::SystemTime;

/// Component name used when the producer did not supply one.
pub const UNKNOWN_COMPONENT: &str = "unknown";

/// A single structured context value attached to an event.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ContextValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
}

impl ContextValue {
    /// Borrow the text, if this is a text value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ContextValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for ContextValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContextValue::Text(s) => f.write_str(s),
            ContextValue::Integer(i) => write!(f, "{}", i),
            ContextValue::Float(v) => write!(f, "{}", v),
            ContextValue::Bool(b) => write!(f, "{}", b),
        }
    }
}

impl From<String> for ContextValue {
    fn from(value: String) -> Self {
        ContextValue::Text(value)
    }
}

impl From<&str> for ContextValue {
    fn from(value: &str) -> Self {
        ContextValue::Text(value.to_string())
    }
}

impl From<i64> for ContextValue {
    fn from(value: i64) -> Self {
        ContextValue::Integer(value)
    }
}

impl From<u32> for ContextValue {
    fn from(value: u32) -> Self {
        ContextValue::Integer(i64::from(value))
    }
}

impl From<f64> for ContextValue {
    fn from(value: f64) -> Self {
        ContextValue::Float(value)
    }
}

impl From<bool> for ContextValue {
    fn from(value: bool) -> Self {
        ContextValue::Bool(value)
    }
}

/// Context map carried by events, ordered for deterministic output.
pub type Context = BTreeMap<String, ContextValue>;

/// Errors that know how to describe themselves to telemetry.
///
/// Every method has a default, so any error type can opt in with an empty
/// `impl Reportable for MyError {}` and override only what it knows.
pub trait Reportable: Error {
    /// Component that produced the error.
    fn component(&self) -> Option<&str> {
        None
    }

    /// Category of the error.
    fn category(&self) -> Option<ErrorCategory> {
        None
    }

    /// Additional structured context.
    fn context(&self) -> Context {
        Context::new()
    }
}

/// An error occurrence published for telemetry.
#[derive(Debug)]
pub struct ErrorEvent {
    message: String,
    component: String,
    category: ErrorCategory,
    context: Context,
    timestamp: SystemTime,
    reported: AtomicBool,
}

impl ErrorEvent {
    /// Create an event with no context, timestamped now.
    pub fn new(
        component: impl Into<String>,
        category: impl Into<ErrorCategory>,
        message: impl Into<String>,
    ) -> Self {
        let component = component.into();
        Self {
            message: message.into(),
            component: if component.is_empty() {
                UNKNOWN_COMPONENT.to_string()
            } else {
                component
            },
            category: category.into(),
            context: Context::new(),
            timestamp: SystemTime::now(),
            reported: AtomicBool::new(false),
        }
    }

    /// Build an event from an error that carries its own telemetry metadata.
    pub fn from_reportable<E>(err: &E) -> Self
    where
        E: Reportable + ?Sized,
    {
        let mut event = Self::new(
            err.component().unwrap_or(UNKNOWN_COMPONENT),
            err.category().unwrap_or_default(),
            err.to_string(),
        );
        event.context = err.context();
        event
    }

    /// Build an event from a plain error with no telemetry metadata.
    pub fn from_error(err: &dyn Error) -> Self {
        Self::new(UNKNOWN_COMPONENT, ErrorCategory::Generic, err.to_string())
    }

    /// Attach a context entry.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<ContextValue>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Override the creation timestamp.
    pub fn with_timestamp(mut self, timestamp: SystemTime) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn component(&self) -> &str {
        &self.component
    }

    pub fn category(&self) -> &ErrorCategory {
        &self.category
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    pub fn timestamp(&self) -> SystemTime {
        self.timestamp
    }

    /// Whether a consumer has already delivered this event.
    pub fn is_reported(&self) -> bool {
        self.reported.load(Ordering::Acquire)
    }

    /// Mark the event as delivered.
    ///
    /// Returns `true` only for the call that performed the transition.
    pub fn mark_reported(&self) -> bool {
        self.reported
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

impl Clone for ErrorEvent {
    fn clone(&self) -> Self {
        Self {
            message: self.message.clone(),
            component: self.component.clone(),
            category: self.category.clone(),
            context: self.context.clone(),
            timestamp: self.timestamp,
            reported: AtomicBool::new(self.is_reported()),
        }
    }
}
