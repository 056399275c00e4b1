//! Data types shared by the analysis pipeline.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Operating state reported with every telemetry sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Event {
    Drive,
    Charge,
    Rest,
}

impl Event {
    /// Parses the literal used in raw logs. Anything else is rejected.
    pub fn from_literal(s: &str) -> Option<Self> {
        match s {
            "drive" => Some(Event::Drive),
            "charge" => Some(Event::Charge),
            "rest" => Some(Event::Rest),
            _ => None,
        }
    }
}

/// Static description of the vehicle a log belongs to.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VehicleInfo {
    pub vin: String,
    pub make: Option<String>,
    pub model: Option<String>,
    pub year: Option<i64>,
    pub design_capacity_kwh: f64,
    pub nominal_pack_voltage: f64,
}

impl VehicleInfo {
    /// Rated pack capacity in amp-hours, used to turn pack current into a C-rate.
    pub fn rated_current_a(&self) -> f64 {
        self.design_capacity_kwh * 1000.0 / self.nominal_pack_voltage
    }
}

/// One validated telemetry sample.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub timestamp: DateTime<Utc>,
    pub event: Event,
    pub soc: f64,
    pub energy_in_kwh: f64,
    pub pack_current: f64,
    pub cell_voltages: Vec<f64>,
    pub cell_temps_c: Vec<f64>,
}

/// A fully normalized log: vehicle metadata plus its ordered samples.
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryLog {
    pub vehicle: VehicleInfo,
    pub samples: Vec<Sample>,
}

/// A contiguous run of `charge` samples, trimmed at saturation.
///
/// `start..end` indexes the kept samples in the source sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct ChargeBlock {
    pub start: usize,
    pub end: usize,
    pub delta_soc: f64,
    pub energy_in_total: f64,
}

impl ChargeBlock {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Kind of threshold a sample violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyCategory {
    VoltageRange,
    VoltageDifference,
    TemperatureRange,
    TemperatureDifference,
}

/// A single flagged reading.
///
/// Range records name the offending cell; difference records describe the
/// whole sample and leave `cells` empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnomalyRecord {
    pub timestamp: DateTime<Utc>,
    pub category: AnomalyCategory,
    pub value: f64,
    pub threshold: f64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub cells: Vec<usize>,
    pub comment: String,
}

/// Equivalent-full-cycle figures.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct CycleCounts {
    pub overall_cycles: f64,
    pub charge_cycles: f64,
    pub discharge_cycles: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct VoltageAnomalies {
    pub voltage_range_anomalies: Vec<AnomalyRecord>,
    pub voltage_difference_anomalies: Vec<AnomalyRecord>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct TemperatureAnomalies {
    pub temperature_range_anomalies: Vec<AnomalyRecord>,
    pub temperature_difference_anomalies: Vec<AnomalyRecord>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Anomalies {
    pub voltage: VoltageAnomalies,
    pub temperature: TemperatureAnomalies,
}

impl Anomalies {
    pub fn total(&self) -> usize {
        self.voltage.voltage_range_anomalies.len()
            + self.voltage.voltage_difference_anomalies.len()
            + self.temperature.temperature_range_anomalies.len()
            + self.temperature.temperature_difference_anomalies.len()
    }
}

/// Complete analysis result for one log, serialized as the report JSON.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub vehicle_info: VehicleInfo,
    pub soh: Option<f64>,
    pub cdc_data: CycleCounts,
    pub anomalies: Anomalies,
}
