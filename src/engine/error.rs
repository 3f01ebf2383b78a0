use std::fmt;

pub const NO_CARS_AVAILABLE: &str =
    "Booking with the given time and duration is not possible - no cars are available.";
pub const CAR_RESERVED: &str = "The car is either in use or reserved ahead.";
pub const DURATION_INVALID: &str = "Duration must be between 5 minutes and 2 hours.";
pub const TIME_INVALID: &str = "The reservation can be taken from 5 minutes up to 24 hours ahead.";

/// Why a requested window was refused before allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    Duration,
    Time,
}

impl ValidationError {
    /// Name of the offending request field.
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::Duration => "duration",
            ValidationError::Time => "start",
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::Duration => f.write_str(DURATION_INVALID),
            ValidationError::Time => f.write_str(TIME_INVALID),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Coarse outcome class, used by callers that map errors onto a protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Conflict,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    Validation(ValidationError),
    NotFound(String),
    AlreadyExists(String),
    CarReserved(String),
    NoCarsAvailable,
    LimitExceeded(&'static str),
}

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::Validation(_) | EngineError::LimitExceeded(_) => ErrorKind::Validation,
            EngineError::NotFound(_) => ErrorKind::NotFound,
            EngineError::AlreadyExists(_)
            | EngineError::CarReserved(_)
            | EngineError::NoCarsAvailable => ErrorKind::Conflict,
        }
    }
}

impl From<ValidationError> for EngineError {
    fn from(e: ValidationError) -> Self {
        EngineError::Validation(e)
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::Validation(e) => write!(f, "{e}"),
            EngineError::NotFound(id) => write!(f, "car not found: {id}"),
            EngineError::AlreadyExists(id) => write!(f, "car already exists: {id}"),
            EngineError::CarReserved(_) => f.write_str(CAR_RESERVED),
            EngineError::NoCarsAvailable => f.write_str(NO_CARS_AVAILABLE),
            EngineError::LimitExceeded(msg) => write!(f, "limit exceeded: {msg}"),
        }
    }
}

impl std::error::Error for EngineError {}
