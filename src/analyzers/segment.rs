//! Charge-block segmentation.
//!
//! A block opens on a `charge` sample that follows a non-charge sample (or
//! starts the log) and closes on the next non-charge sample. The first sample
//! at or above 100% SoC is the last one kept; later samples in the same run
//! are ignored.

use crate::analyzers::types::{ChargeBlock, Event, Sample};
use crate::analyzers::utility::quantize;
use crate::config::AnalysisConfig;

/// Splits `samples` into charge blocks and keeps those with enough SoC gain.
pub fn charge_blocks(samples: &[Sample], config: &AnalysisConfig) -> Vec<ChargeBlock> {
    all_charge_blocks(samples)
        .into_iter()
        .filter(|block| block.delta_soc >= config.min_delta_soc)
        .collect()
}

/// Every charge block in the log, before the ΔSoC filter.
pub fn all_charge_blocks(samples: &[Sample]) -> Vec<ChargeBlock> {
    let mut blocks = Vec::new();
    let mut i = 0;

    while i < samples.len() {
        if samples[i].event != Event::Charge {
            i += 1;
            continue;
        }

        let start = i;
        let mut end = i;
        let mut saturated = false;
        while i < samples.len() && samples[i].event == Event::Charge {
            if !saturated {
                end = i + 1;
                saturated = samples[i].soc >= 100.0;
            }
            i += 1;
        }

        blocks.push(block_from(samples, start, end));
    }

    blocks
}

fn block_from(samples: &[Sample], start: usize, end: usize) -> ChargeBlock {
    let kept = &samples[start..end];
    let first_soc = kept.first().map_or(0.0, |s| s.soc);
    let last_soc = kept.last().map_or(0.0, |s| s.soc);

    ChargeBlock {
        start,
        end,
        delta_soc: quantize(last_soc - first_soc, 6),
        energy_in_total: kept.iter().map(|s| s.energy_in_kwh).sum(),
    }
}
