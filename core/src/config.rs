use crate::{
    bus::DEFAULT_MAX_DISPATCH_DEPTH,
    error::{SimError, SimResult},
    types::{SimTime, Vec2},
};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const CONFIG_FILE: &str = "sim_config.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccrualConfig {
    /// Simulated time between payouts. A payout fires once elapsed time
    /// strictly exceeds this value.
    pub interval:        SimTime,
    pub town_income:     i64,
    pub city_income:     i64,
    pub metro_income:    i64,
    pub officer_upkeep:  i64,
    pub starting_amount: i64,
}

impl Default for AccrualConfig {
    fn default() -> Self {
        Self {
            interval:        10.0,
            town_income:     100,
            city_income:     500,
            metro_income:    1000,
            officer_upkeep:  20,
            starting_amount: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrowthConfig {
    /// Per-tick chance of founding a new town.
    pub found_chance:        f64,
    pub promote_town_chance: f64,
    pub promote_city_chance: f64,
    pub max_settlements:     usize,
    /// Settlements are laid out on a grid of square tiles.
    pub tile_size:           f32,
    pub grid_columns:        u32,
}

impl Default for GrowthConfig {
    fn default() -> Self {
        Self {
            found_chance:        0.05,
            promote_town_chance: 0.02,
            promote_city_chance: 0.01,
            max_settlements:     64,
            tile_size:           32.0,
            grid_columns:        16,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HudLayout {
    pub line_origin:    Vec2,
    pub line_spacing:   f32,
    pub money_position: Vec2,
    pub z_order:        i32,
}

impl Default for HudLayout {
    fn default() -> Self {
        Self {
            line_origin:    Vec2::new(16.0, 560.0),
            line_spacing:   20.0,
            money_position: Vec2::new(16.0, 16.0),
            z_order:        100,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BusConfig {
    pub max_dispatch_depth: usize,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self { max_dispatch_depth: DEFAULT_MAX_DISPATCH_DEPTH }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub accrual: AccrualConfig,
    pub growth:  GrowthConfig,
    pub hud:     HudLayout,
    pub bus:     BusConfig,
}

impl SimConfig {
    /// Load `sim_config.json` from the data directory.
    /// Missing sections fall back to their defaults.
    pub fn load(data_dir: impl AsRef<Path>) -> SimResult<Self> {
        let path = data_dir.as_ref().join(CONFIG_FILE);
        let display = path.display().to_string();
        let content = std::fs::read_to_string(&path).map_err(|e| SimError::Config {
            path:   display.clone(),
            reason: e.to_string(),
        })?;
        Self::from_json(&content).map_err(|e| SimError::Config {
            path:   display,
            reason: e.to_string(),
        })
    }

    pub fn from_json(content: &str) -> SimResult<Self> {
        let config: SimConfig = serde_json::from_str(content)?;
        if !(config.accrual.interval.is_finite() && config.accrual.interval >= 0.0) {
            return Err(anyhow::anyhow!(
                "accrual.interval must be a non-negative number, got {}",
                config.accrual.interval
            )
            .into());
        }
        Ok(config)
    }
}
