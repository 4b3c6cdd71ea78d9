//! Error handling for robot configuration files

use std::io;
use crate::frame_system::FrameSystemError;

/// Unified error to report failures while reading the robot configuration
/// and building the frame system from it.
#[derive(Debug)]
pub enum ConfigError {
    IoError(io::Error),
    ParseError(String),
    /// The part is described inconsistently (part name, reason).
    InvalidPart { part: String, reason: String },
    Frame(FrameSystemError),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match *self {
            ConfigError::IoError(ref err) =>
                write!(f, "IO Error: {}", err),
            ConfigError::ParseError(ref msg) =>
                write!(f, "Parse Error: {}", msg),
            ConfigError::InvalidPart { ref part, ref reason } =>
                write!(f, "Invalid part '{}': {}", part, reason),
            ConfigError::Frame(ref err) =>
                write!(f, "Frame System Error: {}", err),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match *self {
            ConfigError::IoError(ref err) => Some(err),
            ConfigError::Frame(ref err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for ConfigError {
    fn from(err: io::Error) -> Self {
        ConfigError::IoError(err)
    }
}

impl From<FrameSystemError> for ConfigError {
    fn from(err: FrameSystemError) -> Self {
        ConfigError::Frame(err)
    }
}
