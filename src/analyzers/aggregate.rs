use crate::analyzers::types::{
    Anomalies, CycleCounts, Report, TemperatureAnomalies, VehicleInfo, VoltageAnomalies,
};
use crate::analyzers::utility::round2;

/// Merges stage outputs into a [`Report`].
///
/// SoH and cycle figures are published at two decimals. Discharge cycles are
/// re-derived from the rounded overall and charge figures so the three
/// published numbers stay additive.
pub fn assemble_report(
    vehicle: &VehicleInfo,
    soh: Option<f64>,
    cycles: CycleCounts,
    voltage: VoltageAnomalies,
    temperature: TemperatureAnomalies,
) -> Report {
    let overall_cycles = round2(cycles.overall_cycles);
    let charge_cycles = round2(cycles.charge_cycles);

    Report {
        vehicle_info: vehicle.clone(),
        soh: soh.map(round2),
        cdc_data: CycleCounts {
            overall_cycles,
            charge_cycles,
            discharge_cycles: round2(overall_cycles - charge_cycles),
        },
        anomalies: Anomalies {
            voltage,
            temperature,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::test_support::vehicle;

    #[test]
    fn test_rounding_and_residual() {
        let cycles = CycleCounts {
            overall_cycles: 0.30000000000000004,
            charge_cycles: 0.19999999999999998,
            discharge_cycles: 0.10000000000000006,
        };
        let report = assemble_report(
            &vehicle(82.0, 350.0),
            Some(99.999999),
            cycles,
            VoltageAnomalies::default(),
            TemperatureAnomalies::default(),
        );

        assert_eq!(report.soh, Some(100.0));
        assert_eq!(report.cdc_data.overall_cycles, 0.3);
        assert_eq!(report.cdc_data.charge_cycles, 0.2);
        assert_eq!(report.cdc_data.discharge_cycles, 0.1);
    }

    #[test]
    fn test_absent_soh_stays_absent() {
        let report = assemble_report(
            &vehicle(82.0, 350.0),
            None,
            CycleCounts::default(),
            VoltageAnomalies::default(),
            TemperatureAnomalies::default(),
        );
        assert_eq!(report.soh, None);
        assert_eq!(report.anomalies.total(), 0);
    }
}
