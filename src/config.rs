//! Analysis thresholds.
//!
//! [`AnalysisConfig`] is passed by reference into every stage of the
//! pipeline. Defaults match common lithium-ion pack limits; any subset can be
//! overridden from a JSON file:
//! ```json
//! {
//!   "max_cell_voltage": 4.15,
//!   "imbalance_mv_at_rest": 25.0
//! }
//! ```

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig {
    pub max_cell_voltage: f64,
    pub min_cell_voltage: f64,
    /// Allowed cell spread in millivolts while the pack is idle.
    pub imbalance_mv_at_rest: f64,
    /// Allowed cell spread in millivolts while current is flowing.
    pub imbalance_mv_under_load: f64,
    /// C-rate above which a sample counts as under load.
    pub c_rate_load_threshold: f64,
    pub max_cell_temp_c: f64,
    pub min_cell_temp_c: f64,
    pub max_cells_temp_difference: f64,
    /// Smallest SoC gain (percent) a charge block needs to be used for SoH.
    pub min_delta_soc: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            max_cell_voltage: 4.2,
            min_cell_voltage: 2.5,
            imbalance_mv_at_rest: 30.0,
            imbalance_mv_under_load: 60.0,
            c_rate_load_threshold: 0.1,
            max_cell_temp_c: 55.0,
            min_cell_temp_c: 0.0,
            max_cells_temp_difference: 5.0,
            min_delta_soc: 5.0,
        }
    }
}

impl AnalysisConfig {
    /// Loads overrides from a JSON file at `path`. Missing keys keep their defaults.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file '{path}'"))?;
        Self::from_json(&content).with_context(|| format!("invalid config file '{path}'"))
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let config: AnalysisConfig = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects threshold sets that cannot describe a real pack.
    pub fn validate(&self) -> Result<()> {
        let all = [
            self.max_cell_voltage,
            self.min_cell_voltage,
            self.imbalance_mv_at_rest,
            self.imbalance_mv_under_load,
            self.c_rate_load_threshold,
            self.max_cell_temp_c,
            self.min_cell_temp_c,
            self.max_cells_temp_difference,
            self.min_delta_soc,
        ];
        if all.iter().any(|v| !v.is_finite()) {
            bail!("thresholds must be finite numbers");
        }
        if self.min_cell_voltage >= self.max_cell_voltage {
            bail!(
                "min_cell_voltage ({}) must be below max_cell_voltage ({})",
                self.min_cell_voltage,
                self.max_cell_voltage
            );
        }
        if self.min_cell_temp_c >= self.max_cell_temp_c {
            bail!(
                "min_cell_temp_c ({}) must be below max_cell_temp_c ({})",
                self.min_cell_temp_c,
                self.max_cell_temp_c
            );
        }
        if self.imbalance_mv_at_rest < 0.0
            || self.imbalance_mv_under_load < 0.0
            || self.max_cells_temp_difference < 0.0
            || self.c_rate_load_threshold < 0.0
        {
            bail!("spread limits and the load threshold must be non-negative");
        }
        if self.min_delta_soc <= 0.0 || self.min_delta_soc > 100.0 {
            bail!("min_delta_soc must be within (0, 100]");
        }
        Ok(())
    }
}
