//! Battery health analysis.
//!
//! This module validates a raw telemetry log, segments it into charge blocks
//! for State of Health, counts equivalent full cycles, flags per-sample
//! voltage and temperature anomalies, and assembles the results into a
//! [`types::Report`].

pub mod aggregate;
pub mod analyzer;
pub mod anomaly;
pub mod cycles;
pub mod error;
pub mod normalize;
pub mod segment;
pub mod soh;
pub mod types;
pub mod utility;

pub use analyzer::{analyze, analyze_log};
pub use error::{AnalysisError, ValidationError};
