// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub const AUTH_REQUIRED_MESSAGE: &str = "authentication required -- sign in and retry";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    InvalidMoney,
    NegativeMoney,
    MissingPropertyType,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidMoney => f.write_str("invalid price value"),
            Self::NegativeMoney => f.write_str("price cannot be negative"),
            Self::MissingPropertyType => f.write_str("property type is required"),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Failure of a panel operation, classified by where it was detected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PanelError {
    /// No caller token; raised before any network call.
    #[error("{}", AUTH_REQUIRED_MESSAGE)]
    AuthRequired,
    /// Bad local input; raised before any network call.
    #[error("{0}")]
    ValidationFailed(String),
    /// The server answered with an unsuccessful envelope.
    #[error("{0}")]
    RemoteRejected(String),
    /// Network failure, timeout, or a non-success HTTP status.
    #[error("{0}")]
    TransportFailure(String),
}

impl PanelError {
    pub fn message(&self) -> String {
        self.to_string()
    }

    pub const fn reached_network(&self) -> bool {
        matches!(self, Self::RemoteRejected(_) | Self::TransportFailure(_))
    }
}

impl From<ValidationError> for PanelError {
    fn from(error: ValidationError) -> Self {
        Self::ValidationFailed(error.to_string())
    }
}
