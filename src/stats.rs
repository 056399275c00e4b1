use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::analyzers::types::Report;

/// One row of the batch summary CSV.
#[derive(Debug, Default, Serialize)]
pub struct ReportSummary {
    pub timestamp: DateTime<Utc>,
    pub source: Option<String>,
    pub vin: Option<String>,
    pub samples: usize,

    pub soh: Option<f64>,
    pub overall_cycles: f64,
    pub charge_cycles: f64,
    pub discharge_cycles: f64,

    // anomaly counts
    pub voltage_range: usize,
    pub voltage_difference: usize,
    pub temperature_range: usize,
    pub temperature_difference: usize,

    // error tracking
    pub error_type: Option<String>,
    pub error_message: Option<String>,
}

impl ReportSummary {
    pub fn from_report(report: &Report, samples: usize) -> Self {
        let voltage = &report.anomalies.voltage;
        let temperature = &report.anomalies.temperature;

        ReportSummary {
            timestamp: Utc::now(),
            vin: Some(report.vehicle_info.vin.clone()),
            samples,
            soh: report.soh,
            overall_cycles: report.cdc_data.overall_cycles,
            charge_cycles: report.cdc_data.charge_cycles,
            discharge_cycles: report.cdc_data.discharge_cycles,
            voltage_range: voltage.voltage_range_anomalies.len(),
            voltage_difference: voltage.voltage_difference_anomalies.len(),
            temperature_range: temperature.temperature_range_anomalies.len(),
            temperature_difference: temperature.temperature_difference_anomalies.len(),
            ..Default::default()
        }
    }

    /// Create an error record with timestamp and error information
    pub fn from_error(error_type: &str, error_message: &str) -> Self {
        ReportSummary {
            timestamp: Utc::now(),
            error_type: Some(error_type.to_string()),
            error_message: Some(error_message.to_string()),
            ..Default::default()
        }
    }

    /// Set the path or URL the log was read from
    pub fn with_source(mut self, source: &str) -> Self {
        self.source = Some(source.to_string());
        self
    }

    pub fn total_anomalies(&self) -> usize {
        self.voltage_range + self.voltage_difference + self.temperature_range + self.temperature_difference
    }
}
