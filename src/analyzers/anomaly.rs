//! Per-sample voltage and temperature checks.
//!
//! Range checks flag every cell strictly outside its bounds. Spread checks
//! flag a sample once when `max - min` strictly exceeds the limit. Voltage
//! spread limits depend on whether the pack is at rest or under load.

use chrono::{DateTime, Utc};

use crate::analyzers::types::{
    AnomalyCategory, AnomalyRecord, Sample, TemperatureAnomalies, VehicleInfo, VoltageAnomalies,
};
use crate::analyzers::utility::{min_max, quantize};
use crate::config::AnalysisConfig;

/// Load classification used to pick the voltage imbalance limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    AtRest,
    UnderLoad,
}

impl LoadState {
    /// `c_rate <= threshold` is at rest.
    pub fn classify(c_rate: f64, config: &AnalysisConfig) -> Self {
        if c_rate <= config.c_rate_load_threshold {
            LoadState::AtRest
        } else {
            LoadState::UnderLoad
        }
    }

    pub fn imbalance_limit_mv(self, config: &AnalysisConfig) -> f64 {
        match self {
            LoadState::AtRest => config.imbalance_mv_at_rest,
            LoadState::UnderLoad => config.imbalance_mv_under_load,
        }
    }

    fn label(self) -> &'static str {
        match self {
            LoadState::AtRest => "at rest",
            LoadState::UnderLoad => "under load",
        }
    }
}

/// Pack current normalized by the rated capacity in amp-hours.
pub fn c_rate(pack_current: f64, vehicle: &VehicleInfo) -> f64 {
    pack_current.abs() / vehicle.rated_current_a()
}

/// Cell voltage spread in millivolts, at microvolt resolution.
pub fn voltage_spread_mv(cell_voltages: &[f64]) -> f64 {
    min_max(cell_voltages).map_or(0.0, |(lo, hi)| quantize((hi - lo) * 1000.0, 3))
}

/// Cell temperature spread in °C.
pub fn temperature_spread_c(cell_temps_c: &[f64]) -> f64 {
    min_max(cell_temps_c).map_or(0.0, |(lo, hi)| quantize(hi - lo, 6))
}

/// Runs voltage checks over every sample, in log order.
pub fn detect_voltage_anomalies(
    samples: &[Sample],
    vehicle: &VehicleInfo,
    config: &AnalysisConfig,
) -> VoltageAnomalies {
    let mut out = VoltageAnomalies::default();
    for sample in samples {
        out.voltage_range_anomalies.extend(voltage_range(sample, config));
        if let Some(record) = voltage_difference(sample, vehicle, config) {
            out.voltage_difference_anomalies.push(record);
        }
    }
    out
}

/// Runs temperature checks over every sample, in log order.
pub fn detect_temperature_anomalies(
    samples: &[Sample],
    config: &AnalysisConfig,
) -> TemperatureAnomalies {
    let mut out = TemperatureAnomalies::default();
    for sample in samples {
        out.temperature_range_anomalies
            .extend(temperature_range(sample, config));
        if let Some(record) = temperature_difference(sample, config) {
            out.temperature_difference_anomalies.push(record);
        }
    }
    out
}

pub fn voltage_range(sample: &Sample, config: &AnalysisConfig) -> Vec<AnomalyRecord> {
    range_records(
        sample.timestamp,
        &sample.cell_voltages,
        config.min_cell_voltage,
        config.max_cell_voltage,
        AnomalyCategory::VoltageRange,
        "voltage",
    )
}

pub fn voltage_difference(
    sample: &Sample,
    vehicle: &VehicleInfo,
    config: &AnalysisConfig,
) -> Option<AnomalyRecord> {
    let spread = voltage_spread_mv(&sample.cell_voltages);
    let load = LoadState::classify(c_rate(sample.pack_current, vehicle), config);
    let limit = load.imbalance_limit_mv(config);

    (spread > limit).then(|| AnomalyRecord {
        timestamp: sample.timestamp,
        category: AnomalyCategory::VoltageDifference,
        value: spread,
        threshold: limit,
        cells: Vec::new(),
        comment: format!("Cell voltage difference exceeds threshold {}", load.label()),
    })
}

pub fn temperature_range(sample: &Sample, config: &AnalysisConfig) -> Vec<AnomalyRecord> {
    range_records(
        sample.timestamp,
        &sample.cell_temps_c,
        config.min_cell_temp_c,
        config.max_cell_temp_c,
        AnomalyCategory::TemperatureRange,
        "temperature",
    )
}

pub fn temperature_difference(sample: &Sample, config: &AnalysisConfig) -> Option<AnomalyRecord> {
    let spread = temperature_spread_c(&sample.cell_temps_c);
    let limit = config.max_cells_temp_difference;

    (spread > limit).then(|| AnomalyRecord {
        timestamp: sample.timestamp,
        category: AnomalyCategory::TemperatureDifference,
        value: spread,
        threshold: limit,
        cells: Vec::new(),
        comment: "Cell temperature difference too high".to_string(),
    })
}

fn range_records(
    timestamp: DateTime<Utc>,
    values: &[f64],
    min: f64,
    max: f64,
    category: AnomalyCategory,
    quantity: &str,
) -> Vec<AnomalyRecord> {
    values
        .iter()
        .enumerate()
        .filter_map(|(cell, &value)| {
            let (threshold, direction) = if value > max {
                (max, "high")
            } else if value < min {
                (min, "low")
            } else {
                return None;
            };
            Some(AnomalyRecord {
                timestamp,
                category,
                value,
                threshold,
                cells: vec![cell],
                comment: format!("Cell {quantity} too {direction}"),
            })
        })
        .collect()
}
