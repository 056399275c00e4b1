use serde_json::Value;
use tracing::debug;

use crate::analyzers::aggregate::assemble_report;
use crate::analyzers::anomaly::{detect_temperature_anomalies, detect_voltage_anomalies};
use crate::analyzers::cycles::count_cycles;
use crate::analyzers::error::ValidationError;
use crate::analyzers::normalize::normalize_log;
use crate::analyzers::segment::charge_blocks;
use crate::analyzers::soh::estimate_soh;
use crate::analyzers::types::{Report, TelemetryLog};
use crate::config::AnalysisConfig;

/// Validates a raw log and derives its health report.
///
/// # Errors
///
/// Returns a [`ValidationError`] naming the first malformed field. No partial
/// report is produced.
#[tracing::instrument(skip_all)]
pub fn analyze(raw: &Value, config: &AnalysisConfig) -> Result<Report, ValidationError> {
    let log = normalize_log(raw)?;
    Ok(analyze_log(&log, config))
}

/// Derives a report from an already-normalized log.
///
/// The segmenter, cycle counter, and anomaly detectors each read the same
/// sample slice independently.
pub fn analyze_log(log: &TelemetryLog, config: &AnalysisConfig) -> Report {
    let vehicle = &log.vehicle;
    let samples = &log.samples;

    let blocks = charge_blocks(samples, config);
    let soh = estimate_soh(&blocks, vehicle.design_capacity_kwh);

    let cycles = count_cycles(samples);

    let voltage = detect_voltage_anomalies(samples, vehicle, config);
    let temperature = detect_temperature_anomalies(samples, config);

    debug!(
        vin = %vehicle.vin,
        samples = samples.len(),
        valid_blocks = blocks.len(),
        soh = ?soh,
        voltage_range = voltage.voltage_range_anomalies.len(),
        voltage_difference = voltage.voltage_difference_anomalies.len(),
        temperature_range = temperature.temperature_range_anomalies.len(),
        temperature_difference = temperature.temperature_difference_anomalies.len(),
        "Log analyzed"
    );

    assemble_report(vehicle, soh, cycles, voltage, temperature)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw_log(entries: Vec<Value>) -> Value {
        json!({
            "vehicle": {
                "vin": "WVWZZZE1ZNP000042",
                "make": "Volkswagen",
                "model": "ID.4",
                "year": 2022,
                "design_capacity_kwh": 82.0,
                "nominal_pack_voltage": 350.0
            },
            "logs": entries
        })
    }

    fn entry(minute: u32, event: &str, soc: f64, energy: f64, current: f64) -> Value {
        json!({
            "ts": format!("2025-03-01T08:{minute:02}:00Z"),
            "event": event,
            "soc": soc,
            "energy_in_kwh": energy,
            "pack_current": current,
            "cell_voltages": [3.90, 3.91, 3.92],
            "cell_temps_c": [25.0, 26.0, 27.0]
        })
    }

    #[test]
    fn test_end_to_end_scenario() {
        let raw = raw_log(vec![
            entry(0, "charge", 50.0, 0.0, 60.0),
            entry(1, "charge", 57.0, 5.74, 60.0),
            entry(2, "charge", 64.0, 5.74, 60.0),
            entry(3, "charge", 70.0, 4.92, 60.0),
            entry(4, "rest", 70.0, 0.0, 0.0),
            entry(5, "drive", 67.0, 0.0, -80.0),
            entry(6, "drive", 64.0, 0.0, -80.0),
            entry(7, "drive", 62.0, 0.0, -80.0),
            entry(8, "rest", 61.0, 0.0, 1.0),
            entry(9, "rest", 60.0, 0.0, 1.0),
        ]);
        let report = analyze(&raw, &AnalysisConfig::default()).unwrap();

        assert_eq!(report.soh, Some(100.0));
        assert_eq!(report.cdc_data.overall_cycles, 0.3);
        assert_eq!(report.cdc_data.charge_cycles, 0.2);
        assert_eq!(report.cdc_data.discharge_cycles, 0.1);
        assert_eq!(report.anomalies.total(), 0);
        assert_eq!(report.vehicle_info.vin, "WVWZZZE1ZNP000042");
    }

    #[test]
    fn test_only_tiny_blocks_yields_absent_soh() {
        let raw = raw_log(vec![
            entry(0, "charge", 50.0, 0.0, 30.0),
            entry(1, "charge", 54.9, 4.0, 30.0),
            entry(2, "drive", 50.0, 0.0, -40.0),
        ]);
        let report = analyze(&raw, &AnalysisConfig::default()).unwrap();

        assert_eq!(report.soh, None);
        assert!(report.cdc_data.overall_cycles > 0.0);
    }

    #[test]
    fn test_empty_log() {
        let report = analyze(&raw_log(vec![]), &AnalysisConfig::default()).unwrap();
        assert_eq!(report.soh, None);
        assert_eq!(report.cdc_data.overall_cycles, 0.0);
        assert_eq!(report.anomalies.total(), 0);
    }

    #[test]
    fn test_validation_error_aborts() {
        let mut bad = entry(1, "charge", 55.0, 1.0, 30.0);
        bad["cell_voltages"] = json!("3.9,3.9");
        let raw = raw_log(vec![entry(0, "charge", 50.0, 0.0, 30.0), bad]);

        let err = analyze(&raw, &AnalysisConfig::default()).unwrap_err();
        assert_eq!(err.index(), Some(1));
        assert_eq!(err.field(), "cell_voltages");
    }

    #[test]
    fn test_idempotent_output() {
        let raw = raw_log(vec![
            entry(0, "charge", 20.0, 0.0, 100.0),
            entry(1, "charge", 45.0, 21.0, 100.0),
            entry(2, "drive", 40.0, 0.0, -90.0),
        ]);
        let config = AnalysisConfig::default();
        let first = serde_json::to_string(&analyze(&raw, &config).unwrap()).unwrap();
        let second = serde_json::to_string(&analyze(&raw, &config).unwrap()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_config_override_changes_result() {
        let raw = raw_log(vec![entry(0, "rest", 50.0, 0.0, 0.0)]);
        let strict = AnalysisConfig {
            imbalance_mv_at_rest: 10.0,
            ..AnalysisConfig::default()
        };

        let default_report = analyze(&raw, &AnalysisConfig::default()).unwrap();
        let strict_report = analyze(&raw, &strict).unwrap();
        assert!(default_report.anomalies.voltage.voltage_difference_anomalies.is_empty());
        assert_eq!(strict_report.anomalies.voltage.voltage_difference_anomalies.len(), 1);
    }
}
