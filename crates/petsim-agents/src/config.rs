//! Tunable parameters for pet movement, needs, and idle activity.
//!
//! These structs deserialize directly from the `movement`, `needs`, and
//! `activity` sections of `petsim-config.yaml`. Every field has a default,
//! so a missing section (or a missing field) falls back to the values the
//! game ships with.
//!
//! Fields omitted inside a `needs.<axis>` block keep that axis's own
//! default, so `happiness: { threshold: 50 }` still seeks toys.

use petsim_types::{Activity, NeedKind, ResourceKind};
use serde::{Deserialize, Deserializer};

/// Movement parameters shared by every pet.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MovementConfig {
    /// Walking speed in pixels per second.
    #[serde(default = "default_speed")]
    pub speed: f64,

    /// Distance at which a pursued target counts as reached.
    #[serde(default = "default_arrival_radius")]
    pub arrival_radius: f64,

    /// Horizontal offsets below this do not turn the pet around.
    #[serde(default = "default_dead_zone")]
    pub dead_zone: f64,

    /// Width of a pet's bounding box; half of it keeps the pet inside the walls.
    #[serde(default = "default_body_width")]
    pub body_width: f64,

    /// Inbound positions closer than this to the local one are ignored.
    #[serde(default = "default_sync_threshold")]
    pub sync_threshold: f64,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            speed: default_speed(),
            arrival_radius: default_arrival_radius(),
            dead_zone: default_dead_zone(),
            body_width: default_body_width(),
            sync_threshold: default_sync_threshold(),
        }
    }
}

/// Waste (or any other item) a need produces as a side effect.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EmissionConfig {
    /// Kind of item produced.
    pub kind: ResourceKind,

    /// Minimum milliseconds between two emissions.
    pub interval_ms: u64,

    /// Level lost by the pet each time it emits.
    pub cost: f64,
}

/// Parameters of one need axis.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NeedConfig {
    /// Level lost per hour of simulated time.
    #[serde(default = "default_hunger_decay")]
    pub decay_per_hour: f64,

    /// Below this level the pet looks for a resource (or emits).
    #[serde(default = "default_hunger_threshold")]
    pub threshold: f64,

    /// Level gained when the need is resolved.
    #[serde(default = "default_hunger_restore")]
    pub restore: f64,

    /// Resource kind this need pursues, if any.
    #[serde(default = "default_hunger_seeks")]
    pub seeks: Option<ResourceKind>,

    /// Activity held while a consumed resource is being enjoyed.
    #[serde(default = "default_hunger_resolving")]
    pub resolving_activity: Activity,

    /// Minimum milliseconds between two throttled seek attempts.
    #[serde(default = "default_seek_interval_ms")]
    pub seek_interval_ms: u64,

    /// Spontaneous item production while below threshold.
    #[serde(default)]
    pub emission: Option<EmissionConfig>,
}

impl NeedConfig {
    /// Default parameters for the given axis.
    pub fn for_kind(kind: NeedKind) -> Self {
        match kind {
            NeedKind::Hunger => default_hunger(),
            NeedKind::Cleanliness => default_cleanliness(),
            NeedKind::Happiness => default_happiness(),
        }
    }
}

impl Default for NeedConfig {
    fn default() -> Self {
        default_hunger()
    }
}

/// Parameters for all three need axes.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "NeedsPatch")]
pub struct NeedsConfig {
    /// Feeding system.
    pub hunger: NeedConfig,

    /// Cleanliness system.
    pub cleanliness: NeedConfig,

    /// Happiness system.
    pub happiness: NeedConfig,
}

/// A `needs.<axis>` block as written in the file: only the present fields.
#[derive(Debug, Clone, Default, Deserialize)]
struct NeedPatch {
    decay_per_hour: Option<f64>,
    threshold: Option<f64>,
    restore: Option<f64>,
    #[serde(default, deserialize_with = "present")]
    seeks: Option<Option<ResourceKind>>,
    resolving_activity: Option<Activity>,
    seek_interval_ms: Option<u64>,
    #[serde(default, deserialize_with = "present")]
    emission: Option<Option<EmissionConfig>>,
}

impl NeedPatch {
    fn apply(self, base: NeedConfig) -> NeedConfig {
        NeedConfig {
            decay_per_hour: self.decay_per_hour.unwrap_or(base.decay_per_hour),
            threshold: self.threshold.unwrap_or(base.threshold),
            restore: self.restore.unwrap_or(base.restore),
            seeks: self.seeks.unwrap_or(base.seeks),
            resolving_activity: self.resolving_activity.unwrap_or(base.resolving_activity),
            seek_interval_ms: self.seek_interval_ms.unwrap_or(base.seek_interval_ms),
            emission: self.emission.unwrap_or(base.emission),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
struct NeedsPatch {
    #[serde(default)]
    hunger: NeedPatch,
    #[serde(default)]
    cleanliness: NeedPatch,
    #[serde(default)]
    happiness: NeedPatch,
}

impl From<NeedsPatch> for NeedsConfig {
    fn from(patch: NeedsPatch) -> Self {
        Self {
            hunger: patch.hunger.apply(default_hunger()),
            cleanliness: patch.cleanliness.apply(default_cleanliness()),
            happiness: patch.happiness.apply(default_happiness()),
        }
    }
}

/// Distinguishes an explicit `null` (`Some(None)`) from an absent field (`None`).
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl NeedsConfig {
    /// Parameters of one axis.
    pub const fn get(&self, kind: NeedKind) -> &NeedConfig {
        match kind {
            NeedKind::Hunger => &self.hunger,
            NeedKind::Cleanliness => &self.cleanliness,
            NeedKind::Happiness => &self.happiness,
        }
    }
}

impl Default for NeedsConfig {
    fn default() -> Self {
        Self {
            hunger: default_hunger(),
            cleanliness: default_cleanliness(),
            happiness: default_happiness(),
        }
    }
}

/// Autonomous idle-activity parameters.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ActivityConfig {
    /// Shortest walk before an idle burst, in milliseconds.
    #[serde(default = "default_min_idle_ms")]
    pub min_idle_ms: u64,

    /// Longest walk before an idle burst, in milliseconds.
    #[serde(default = "default_max_idle_ms")]
    pub max_idle_ms: u64,

    /// How long an idle burst lasts before reverting to walking.
    #[serde(default = "default_idle_duration_ms")]
    pub idle_duration_ms: u64,

    /// Activities an idle burst picks from.
    #[serde(default = "default_idle_choices")]
    pub idle_choices: Vec<Activity>,
}

impl Default for ActivityConfig {
    fn default() -> Self {
        Self {
            min_idle_ms: default_min_idle_ms(),
            max_idle_ms: default_max_idle_ms(),
            idle_duration_ms: default_idle_duration_ms(),
            idle_choices: default_idle_choices(),
        }
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

const fn default_speed() -> f64 {
    50.0
}

const fn default_arrival_radius() -> f64 {
    20.0
}

const fn default_dead_zone() -> f64 {
    5.0
}

const fn default_body_width() -> f64 {
    80.0
}

const fn default_sync_threshold() -> f64 {
    5.0
}

const fn default_hunger_decay() -> f64 {
    3000.0
}

const fn default_hunger_threshold() -> f64 {
    80.0
}

const fn default_hunger_restore() -> f64 {
    20.0
}

#[allow(clippy::unnecessary_wraps)]
const fn default_hunger_seeks() -> Option<ResourceKind> {
    Some(ResourceKind::Food)
}

const fn default_hunger_resolving() -> Activity {
    Activity::Consuming
}

const fn default_seek_interval_ms() -> u64 {
    1000
}

fn default_hunger() -> NeedConfig {
    NeedConfig {
        decay_per_hour: default_hunger_decay(),
        threshold: default_hunger_threshold(),
        restore: default_hunger_restore(),
        seeks: default_hunger_seeks(),
        resolving_activity: default_hunger_resolving(),
        seek_interval_ms: default_seek_interval_ms(),
        emission: None,
    }
}

fn default_cleanliness() -> NeedConfig {
    NeedConfig {
        decay_per_hour: 1500.0,
        threshold: 80.0,
        restore: 20.0,
        seeks: None,
        resolving_activity: Activity::Walking,
        seek_interval_ms: default_seek_interval_ms(),
        emission: Some(EmissionConfig {
            kind: ResourceKind::Waste,
            interval_ms: 15_000,
            cost: 5.0,
        }),
    }
}

fn default_happiness() -> NeedConfig {
    NeedConfig {
        decay_per_hour: 1200.0,
        threshold: 60.0,
        restore: 25.0,
        seeks: Some(ResourceKind::Toy),
        resolving_activity: Activity::Playing,
        seek_interval_ms: default_seek_interval_ms(),
        emission: None,
    }
}

const fn default_min_idle_ms() -> u64 {
    15_000
}

const fn default_max_idle_ms() -> u64 {
    25_000
}

const fn default_idle_duration_ms() -> u64 {
    3000
}

fn default_idle_choices() -> Vec<Activity> {
    vec![Activity::Playing, Activity::Sleeping]
}
