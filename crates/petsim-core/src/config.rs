//! Configuration loading and typed config structures for the pet simulation.
//!
//! The canonical configuration lives in `petsim-config.yaml` at the project
//! root. Every field is optional in the file; anything left out takes the
//! default shown on its `default_*` function. Agent-side sections
//! (`movement`, `needs`, `activity`) reuse the structs from
//! `petsim-agents`.

use std::path::Path;

use petsim_agents::{ActivityConfig, MovementConfig, NeedsConfig};
use petsim_ledger::InventoryCaps;
use petsim_types::{ResourceKind, Supply};
use rust_decimal::Decimal;
use serde::Deserialize;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level simulation configuration.
///
/// Mirrors the structure of `petsim-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SimulationConfig {
    /// Seed, tick rate, arena size.
    #[serde(default)]
    pub world: WorldConfig,

    /// Walking speed and pursuit radii.
    #[serde(default)]
    pub movement: MovementConfig,

    /// Per-need decay, thresholds, and seeking.
    #[serde(default)]
    pub needs: NeedsConfig,

    /// Autonomous idle bursts.
    #[serde(default)]
    pub activity: ActivityConfig,

    /// Item lifetimes and reach.
    #[serde(default)]
    pub resources: ResourcesConfig,

    /// Wallet, prices, and inventory caps.
    #[serde(default)]
    pub economy: EconomyConfig,

    /// Delays for follow-ups, recovery, and the watchdog.
    #[serde(default)]
    pub timing: TimingConfig,

    /// Who owns purchases.
    #[serde(default)]
    pub reconciliation: ReconciliationConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl SimulationConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override YAML values:
    /// - `PETSIM_SEED` overrides `world.seed`
    /// - `PETSIM_LOG_LEVEL` overrides `logging.level`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Self = serde_yml::from_str(&contents)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_yml::from_str(yaml)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Override selected values with environment variables when set.
    ///
    /// Unparseable values are ignored.
    pub fn apply_env_overrides(&mut self) {
        if let Some(seed) = std::env::var("PETSIM_SEED")
            .ok()
            .and_then(|val| val.parse().ok())
        {
            self.world.seed = seed;
        }
        if let Ok(val) = std::env::var("PETSIM_LOG_LEVEL") {
            self.logging.level = val;
        }
    }
}

/// World-level configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WorldConfig {
    /// Random seed for reproducibility.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Real-time milliseconds per tick.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Arena width in pixels.
    #[serde(default = "default_arena_width")]
    pub arena_width: f64,

    /// Stop after this many ticks (0 = unbounded).
    #[serde(default)]
    pub max_ticks: u64,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            seed: default_seed(),
            tick_interval_ms: default_tick_interval_ms(),
            arena_width: default_arena_width(),
            max_ticks: 0,
        }
    }
}

/// Item lifetimes and reach.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ResourcesConfig {
    /// Lifetime of dropped food.
    #[serde(default = "default_food_ttl_ms")]
    pub food_ttl_ms: u64,

    /// Lifetime of emitted waste.
    #[serde(default = "default_waste_ttl_ms")]
    pub waste_ttl_ms: u64,

    /// Lifetime of dropped toys.
    #[serde(default = "default_toy_ttl_ms")]
    pub toy_ttl_ms: u64,

    /// Lifetime of items created by the remote authority without a TTL.
    #[serde(default = "default_remote_item_ttl_ms")]
    pub remote_item_ttl_ms: u64,

    /// Reach of the arrival consumption check and the cleanup tool.
    #[serde(default = "default_interaction_radius")]
    pub interaction_radius: f64,
}

impl ResourcesConfig {
    /// Lifetime for a locally created item of `kind`.
    pub const fn ttl_for(&self, kind: ResourceKind) -> u64 {
        match kind {
            ResourceKind::Food => self.food_ttl_ms,
            ResourceKind::Waste => self.waste_ttl_ms,
            ResourceKind::Toy => self.toy_ttl_ms,
        }
    }
}

impl Default for ResourcesConfig {
    fn default() -> Self {
        Self {
            food_ttl_ms: default_food_ttl_ms(),
            waste_ttl_ms: default_waste_ttl_ms(),
            toy_ttl_ms: default_toy_ttl_ms(),
            remote_item_ttl_ms: default_remote_item_ttl_ms(),
            interaction_radius: default_interaction_radius(),
        }
    }
}

/// Unit prices in tokens.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PricesConfig {
    /// Price of one food.
    #[serde(default = "default_food_price")]
    pub food: Decimal,

    /// Price of one cleaning tool.
    #[serde(default = "default_cleaning_tool_price")]
    pub cleaning_tool: Decimal,

    /// Price of one toy.
    #[serde(default = "default_toy_price")]
    pub toy: Decimal,
}

impl PricesConfig {
    /// Price for one supply line.
    pub const fn price(&self, supply: Supply) -> Decimal {
        match supply {
            Supply::Food => self.food,
            Supply::CleaningTool => self.cleaning_tool,
            Supply::Toy => self.toy,
        }
    }
}

impl Default for PricesConfig {
    fn default() -> Self {
        Self {
            food: default_food_price(),
            cleaning_tool: default_cleaning_tool_price(),
            toy: default_toy_price(),
        }
    }
}

/// Wallet and inventory parameters.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EconomyConfig {
    /// Opening balance of the local ledger.
    #[serde(default = "default_starting_balance")]
    pub starting_balance: Decimal,

    /// Unit prices.
    #[serde(default)]
    pub prices: PricesConfig,

    /// Inventory caps.
    #[serde(default)]
    pub caps: InventoryCaps,
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            starting_balance: default_starting_balance(),
            prices: PricesConfig::default(),
            caps: InventoryCaps::default(),
        }
    }
}

/// Deterministic delays.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TimingConfig {
    /// Delay between consuming an item and re-evaluating.
    #[serde(default = "default_post_consume_ms")]
    pub post_consume_ms: u64,

    /// Delay between losing a pursued item and re-evaluating.
    #[serde(default = "default_recovery_grace_ms")]
    pub recovery_grace_ms: u64,

    /// Delay between a forced reset and its follow-up check.
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,

    /// Watchdog period in simulated milliseconds.
    #[serde(default = "default_watchdog_interval_ms")]
    pub watchdog_interval_ms: u64,

    /// How long a pet may stay resolving without a pursuit before the
    /// watchdog forces it back to walking.
    #[serde(default = "default_stuck_threshold_ms")]
    pub stuck_threshold_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            post_consume_ms: default_post_consume_ms(),
            recovery_grace_ms: default_recovery_grace_ms(),
            settle_ms: default_settle_ms(),
            watchdog_interval_ms: default_watchdog_interval_ms(),
            stuck_threshold_ms: default_stuck_threshold_ms(),
        }
    }
}

/// Who settles purchases.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthorityPolicy {
    /// Local state is authoritative: purchases settle immediately.
    #[default]
    Local,
    /// The remote authority settles purchases; local state waits for it.
    Server,
}

/// Reconciliation settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ReconciliationConfig {
    /// Purchase settlement policy.
    #[serde(default)]
    pub policy: AuthorityPolicy,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions for serde
// ---------------------------------------------------------------------------

const fn default_seed() -> u64 {
    42
}

const fn default_tick_interval_ms() -> u64 {
    16
}

const fn default_arena_width() -> f64 {
    800.0
}

const fn default_food_ttl_ms() -> u64 {
    20_000
}

const fn default_waste_ttl_ms() -> u64 {
    60_000
}

const fn default_toy_ttl_ms() -> u64 {
    30_000
}

const fn default_remote_item_ttl_ms() -> u64 {
    300_000
}

const fn default_interaction_radius() -> f64 {
    40.0
}

fn default_food_price() -> Decimal {
    Decimal::from(5_u32)
}

fn default_cleaning_tool_price() -> Decimal {
    Decimal::from(10_u32)
}

fn default_toy_price() -> Decimal {
    Decimal::from(8_u32)
}

fn default_starting_balance() -> Decimal {
    Decimal::from(100_u32)
}

const fn default_post_consume_ms() -> u64 {
    2000
}

const fn default_recovery_grace_ms() -> u64 {
    30
}

const fn default_settle_ms() -> u64 {
    500
}

const fn default_watchdog_interval_ms() -> u64 {
    5000
}

const fn default_stuck_threshold_ms() -> u64 {
    5000
}

fn default_log_level() -> String {
    "info".to_owned()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use petsim_types::{Activity, NeedKind};

    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = SimulationConfig::default();
        assert_eq!(config.world.seed, 42);
        assert_eq!(config.world.tick_interval_ms, 16);
        assert_eq!(config.resources.ttl_for(ResourceKind::Food), 20_000);
        assert_eq!(config.economy.starting_balance, Decimal::from(100_u32));
        assert_eq!(config.economy.prices.price(Supply::CleaningTool), Decimal::from(10_u32));
        assert_eq!(config.timing.recovery_grace_ms, 30);
        assert_eq!(config.reconciliation.policy, AuthorityPolicy::Local);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn empty_yaml_yields_defaults() {
        let config: SimulationConfig = serde_yml::from_str("{}").unwrap();
        assert_eq!(config, SimulationConfig::default());
    }

    #[test]
    fn parse_partial_yaml() {
        let yaml = r"
world:
  seed: 7
  arena_width: 1200
needs:
  happiness:
    threshold: 50
economy:
  starting_balance: 12.5
  prices:
    toy: 3
  caps:
    food: 2
timing:
  watchdog_interval_ms: 1000
reconciliation:
  policy: server
";
        let config: SimulationConfig = serde_yml::from_str(yaml).unwrap();
        assert_eq!(config.world.seed, 7);
        assert!((config.world.arena_width - 1200.0).abs() < f64::EPSILON);
        assert_eq!(config.world.tick_interval_ms, 16);
        assert!((config.needs.get(NeedKind::Happiness).threshold - 50.0).abs() < f64::EPSILON);
        assert_eq!(config.needs.hunger.resolving_activity, Activity::Consuming);
        assert_eq!(config.economy.starting_balance, Decimal::new(125, 1));
        assert_eq!(config.economy.prices.toy, Decimal::from(3_u32));
        assert_eq!(config.economy.prices.food, Decimal::from(5_u32));
        assert_eq!(config.economy.caps.food, 2);
        assert_eq!(config.economy.caps.toy, 5);
        assert_eq!(config.timing.watchdog_interval_ms, 1000);
        assert_eq!(config.reconciliation.policy, AuthorityPolicy::Server);
    }

    #[test]
    fn invalid_yaml_is_an_error() {
        let result: Result<SimulationConfig, _> = serde_yml::from_str("world: [1, 2");
        assert!(result.is_err());
    }

    #[test]
    fn missing_file_is_io_error() {
        let result = SimulationConfig::from_file(Path::new("/nonexistent/petsim-config.yaml"));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }
}
