//! Equivalent-full-cycle counting over the raw sample sequence.

use crate::analyzers::types::{CycleCounts, Event, Sample};

/// Unrounded cycle totals.
///
/// Every SoC change counts toward `overall_cycles`; only increases on a
/// `charge` sample count toward `charge_cycles`. Discharge is the residual.
pub fn count_cycles(samples: &[Sample]) -> CycleCounts {
    let mut overall = 0.0;
    let mut charge = 0.0;

    for pair in samples.windows(2) {
        let delta = pair[1].soc - pair[0].soc;
        overall += delta.abs() / 100.0;
        if delta > 0.0 && pair[1].event == Event::Charge {
            charge += delta / 100.0;
        }
    }

    CycleCounts {
        overall_cycles: overall,
        charge_cycles: charge,
        discharge_cycles: overall - charge,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::test_support::sample;

    #[test]
    fn test_empty_and_single_sample() {
        assert_eq!(count_cycles(&[]), CycleCounts::default());
        assert_eq!(
            count_cycles(&[sample(Event::Charge, 50.0, 0.0)]),
            CycleCounts::default()
        );
    }

    #[test]
    fn test_charge_then_drive() {
        let samples = vec![
            sample(Event::Charge, 50.0, 0.0),
            sample(Event::Charge, 70.0, 16.4),
            sample(Event::Drive, 60.0, 0.0),
        ];
        let c = count_cycles(&samples);

        assert!((c.overall_cycles - 0.3).abs() < 1e-9);
        assert!((c.charge_cycles - 0.2).abs() < 1e-9);
        assert!((c.discharge_cycles - 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_regen_during_drive_is_not_charge() {
        let samples = vec![sample(Event::Drive, 60.0, 0.0), sample(Event::Drive, 62.0, 0.0)];
        let c = count_cycles(&samples);
        assert!((c.overall_cycles - 0.02).abs() < 1e-9);
        assert_eq!(c.charge_cycles, 0.0);
    }

    #[test]
    fn test_drop_during_charge_is_discharge() {
        let samples = vec![sample(Event::Charge, 80.0, 0.0), sample(Event::Charge, 79.0, 0.0)];
        let c = count_cycles(&samples);
        assert_eq!(c.charge_cycles, 0.0);
        assert!((c.discharge_cycles - 0.01).abs() < 1e-9);
    }

    #[test]
    fn test_post_saturation_noise_is_counted() {
        let samples = vec![
            sample(Event::Charge, 90.0, 0.0),
            sample(Event::Charge, 100.0, 0.0),
            sample(Event::Charge, 99.0, 0.0),
            sample(Event::Charge, 100.0, 0.0),
        ];
        let c = count_cycles(&samples);
        assert!((c.overall_cycles - 0.12).abs() < 1e-9);
        assert!((c.charge_cycles - 0.11).abs() < 1e-9);
    }

    #[test]
    fn test_additivity() {
        let socs = [50.0, 55.5, 53.2, 80.0, 79.9, 60.1, 61.0];
        let events = [Event::Rest, Event::Charge, Event::Charge, Event::Charge, Event::Drive, Event::Drive, Event::Charge];
        let samples: Vec<_> = socs
            .iter()
            .zip(events)
            .map(|(&soc, event)| sample(event, soc, 0.0))
            .collect();
        let c = count_cycles(&samples);
        assert!((c.overall_cycles - (c.charge_cycles + c.discharge_cycles)).abs() < 1e-12);
    }
}
