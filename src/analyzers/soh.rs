use tracing::debug;

use crate::analyzers::types::ChargeBlock;
use crate::analyzers::utility::mean;

/// Capacity estimate (kWh) implied by one block: energy added per unit SoC gained.
pub fn block_capacity_kwh(block: &ChargeBlock) -> f64 {
    block.energy_in_total / (block.delta_soc / 100.0)
}

/// SoH percentage implied by one block.
pub fn block_soh(block: &ChargeBlock, design_capacity_kwh: f64) -> f64 {
    block_capacity_kwh(block) / design_capacity_kwh * 100.0
}

/// Unweighted mean of per-block SoH. `None` when no block qualifies.
///
/// Callers pass only blocks that passed the ΔSoC filter, so `delta_soc` is positive.
pub fn estimate_soh(blocks: &[ChargeBlock], design_capacity_kwh: f64) -> Option<f64> {
    let estimates: Vec<f64> = blocks
        .iter()
        .map(|block| block_soh(block, design_capacity_kwh))
        .collect();

    debug!(blocks = estimates.len(), ?estimates, "Per-block SoH estimates");
    mean(&estimates)
}
