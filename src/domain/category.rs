//! Error categories and the severity levels they map to.
//!
//! Categories are the coarse classification attached to every error event.
//! They drive the severity reported to the backend and the human-readable
//! part of a diagnostic title.

use serde::Serialize;
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// Severity level attached to a diagnostic report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Debug,
    Info,
    Warning,
    Error,
    Fatal,
}

impl Severity {
    /// Lowercase name as understood by telemetry backends.
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Debug => "debug",
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
            Severity::Fatal => "fatal",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classification of an error event.
///
/// Known categories have a stable kebab-case name (see [`ErrorCategory::as_str`]).
/// Anything else round-trips through [`ErrorCategory::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum ErrorCategory {
    ModelInit,
    ModelLoad,
    Validation,
    FileIo,
    Network,
    Audio,
    Rtsp,
    Database,
    Http,
    Configuration,
    System,
    MqttConnection,
    MqttPublish,
    MqttAuth,
    ImageFetch,
    ImageCache,
    ImageProvider,
    NotFound,
    Timeout,
    #[default]
    Generic,
    Other(String),
}

impl ErrorCategory {
    /// Stable wire name of the category.
    pub fn as_str(&self) -> &str {
        match self {
            ErrorCategory::ModelInit => "model-initialization",
            ErrorCategory::ModelLoad => "model-loading",
            ErrorCategory::Validation => "validation",
            ErrorCategory::FileIo => "file-io",
            ErrorCategory::Network => "network",
            ErrorCategory::Audio => "audio-processing",
            ErrorCategory::Rtsp => "rtsp-connection",
            ErrorCategory::Database => "database",
            ErrorCategory::Http => "http-request",
            ErrorCategory::Configuration => "configuration",
            ErrorCategory::System => "system-resource",
            ErrorCategory::MqttConnection => "mqtt-connection",
            ErrorCategory::MqttPublish => "mqtt-publish",
            ErrorCategory::MqttAuth => "mqtt-authentication",
            ErrorCategory::ImageFetch => "image-fetch",
            ErrorCategory::ImageCache => "image-cache",
            ErrorCategory::ImageProvider => "image-provider",
            ErrorCategory::NotFound => "not-found",
            ErrorCategory::Timeout => "timeout",
            ErrorCategory::Generic => "generic",
            ErrorCategory::Other(name) => name,
        }
    }

    /// Severity reported for events of this category.
    ///
    /// Transient, usually environmental failures are warnings; failures that
    /// break core functionality are errors.
    pub fn severity(&self) -> Severity {
        match self {
            ErrorCategory::ModelInit
            | ErrorCategory::ModelLoad
            | ErrorCategory::Validation
            | ErrorCategory::Database
            | ErrorCategory::Configuration
            | ErrorCategory::System => Severity::Error,
            ErrorCategory::Network
            | ErrorCategory::Rtsp
            | ErrorCategory::FileIo
            | ErrorCategory::Audio
            | ErrorCategory::Http => Severity::Warning,
            ErrorCategory::NotFound => Severity::Info,
            _ => Severity::Error,
        }
    }

    /// Human-readable label used in diagnostic titles.
    pub fn title(&self) -> String {
        let known = match self {
            ErrorCategory::Validation => "Validation Error",
            ErrorCategory::ImageFetch => "Image Fetch Error",
            ErrorCategory::ImageCache => "Image Cache Error",
            ErrorCategory::ImageProvider => "Image Provider Error",
            ErrorCategory::Network => "Network Error",
            ErrorCategory::Database => "Database Error",
            ErrorCategory::FileIo => "File I/O Error",
            ErrorCategory::ModelInit => "Model Initialization Error",
            ErrorCategory::ModelLoad => "Model Loading Error",
            ErrorCategory::Configuration => "Configuration Error",
            ErrorCategory::System => "System Error",
            other => return other.as_str().to_string(),
        };
        known.to_string()
    }

    /// Whether this category covers MQTT broker connectivity.
    pub fn is_mqtt_session(&self) -> bool {
        matches!(self, ErrorCategory::MqttConnection | ErrorCategory::MqttAuth)
    }
}

impl FromStr for ErrorCategory {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "model-initialization" => ErrorCategory::ModelInit,
            "model-loading" => ErrorCategory::ModelLoad,
            "validation" => ErrorCategory::Validation,
            "file-io" => ErrorCategory::FileIo,
            "network" => ErrorCategory::Network,
            "audio-processing" => ErrorCategory::Audio,
            "rtsp-connection" => ErrorCategory::Rtsp,
            "database" => ErrorCategory::Database,
            "http-request" => ErrorCategory::Http,
            "configuration" => ErrorCategory::Configuration,
            "system-resource" => ErrorCategory::System,
            "mqtt-connection" => ErrorCategory::MqttConnection,
            "mqtt-publish" => ErrorCategory::MqttPublish,
            "mqtt-authentication" => ErrorCategory::MqttAuth,
            "image-fetch" => ErrorCategory::ImageFetch,
            "image-cache" => ErrorCategory::ImageCache,
            "image-provider" => ErrorCategory::ImageProvider,
            "not-found" => ErrorCategory::NotFound,
            "timeout" => ErrorCategory::Timeout,
            "generic" | "" => ErrorCategory::Generic,
            other => ErrorCategory::Other(other.to_string()),
        })
    }
}

impl From<&str> for ErrorCategory {
    fn from(s: &str) -> Self {
        match s.parse() {
            Ok(category) => category,
            Err(never) => match never {},
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
