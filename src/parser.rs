//! JSON parser for raw telemetry logs.

use serde_json::Value;

use crate::analyzers::AnalysisError;
use crate::analyzers::normalize::normalize_log;
use crate::analyzers::types::TelemetryLog;

/// Decodes raw bytes into loosely-typed JSON.
///
/// # Errors
///
/// Returns [`AnalysisError::Parse`] if the bytes are not valid JSON.
pub fn parse_raw(bytes: &[u8]) -> Result<Value, AnalysisError> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Decodes and validates a log in one step.
///
/// # Errors
///
/// Returns [`AnalysisError::Parse`] for malformed JSON and
/// [`AnalysisError::Validation`] for well-formed JSON with bad fields.
pub fn parse_log(bytes: &[u8]) -> Result<TelemetryLog, AnalysisError> {
    let raw = parse_raw(bytes)?;
    Ok(normalize_log(&raw)?)
}
