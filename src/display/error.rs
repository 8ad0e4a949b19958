/*
 *  display/error.rs
 *
 *  oppa-dmd - dot matrix driver
 *  (c) 2020-26 Stuart Hunter
 *
 *  Unified error types for display subsystem
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *  Public License.
 *
 */

use thiserror::Error;

/// Unified error type for all display operations
#[derive(Debug, Error)]
pub enum DisplayError {
    /// GPIO subsystem or pin setup failed
    #[error("Display initialization failed: {0}")]
    InitializationFailed(String),

    /// A pin write was rejected by the GPIO backend
    #[error("GPIO error: {0}")]
    Gpio(String),

    /// Frame buffer is not exactly rows * columns / 8 bytes
    #[error("Invalid frame length: expected {expected} bytes, got {actual}")]
    InvalidFrameLength { expected: usize, actual: usize },

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Unsupported operation for this display
    #[error("Operation not supported by this display")]
    UnsupportedOperation,

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl DisplayError {
    /// Wrap any embedded-hal pin error, naming the signal that failed.
    pub(crate) fn gpio<E: core::fmt::Debug>(signal: &str, err: E) -> Self {
        DisplayError::Gpio(format!("{signal}: {err:?}"))
    }
}

/// Factory error types
#[derive(Debug, Error)]
pub enum DisplayFactoryError {
    /// No GPIO backend specified in configuration
    #[error("No GPIO backend specified in configuration")]
    NoBackendSpecified,

    /// Backend exists but was not compiled in
    #[error("GPIO backend not available: {0}")]
    BackendUnavailable(String),

    /// Display driver initialization failed
    #[error("Driver initialization failed: {0}")]
    DriverInitFailed(#[from] DisplayError),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

// Conversion from DisplayFactoryError to DisplayError
impl From<DisplayFactoryError> for DisplayError {
    fn from(err: DisplayFactoryError) -> Self {
        match err {
            DisplayFactoryError::DriverInitFailed(e) => e,
            DisplayFactoryError::NoBackendSpecified =>
                DisplayError::InvalidConfiguration("No GPIO backend specified".to_string()),
            DisplayFactoryError::BackendUnavailable(name) =>
                DisplayError::InvalidConfiguration(format!("GPIO backend not available: {name}")),
            DisplayFactoryError::ConfigError(msg) =>
                DisplayError::InvalidConfiguration(msg),
        }
    }
}
