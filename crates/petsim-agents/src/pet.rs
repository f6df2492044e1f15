//! The pet entity: position, activity, needs, and control flags.
//!
//! A [`Pet`] carries state only. Its methods keep the flag invariants
//! consistent but never reach into the resource pool: when a pursuit ends,
//! the method hands back a [`PursuitEnded`] notice and the caller routes it
//! to the pool so the claim is released.
//!
//! # Invariants
//!
//! - A pursuit implies the pet is externally directed.
//! - Exactly one [`Activity`] holds at any instant.
//! - Edge memory is cleared whenever a pursuit starts or ends.

use petsim_types::{
    Activity, AgentId, EdgeSide, Facing, ItemId, MAX_NEED, MIN_NEED, NeedKind, NeedLevels,
    PetSnapshot, ResourceKind,
};

use crate::error::AgentError;

/// A directed walk toward a claimed item.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pursuit {
    /// The claimed item.
    pub item: ItemId,
    /// Its kind, used to route arrival to the right need system.
    pub kind: ResourceKind,
    /// Horizontal target.
    pub x: f64,
}

/// Emitted when a pursuit ends; the pool releases the matching claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PursuitEnded {
    /// The pet that stopped pursuing.
    pub agent: AgentId,
    /// The item it had claimed.
    pub item: ItemId,
}

/// A pet enjoying a consumed resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolving {
    /// The need that was replenished.
    pub need: NeedKind,
    /// Simulation time the resolving activity began.
    pub since_ms: u64,
}

/// Per-pet mutable state.
#[derive(Debug, Clone, PartialEq)]
pub struct Pet {
    id: AgentId,
    x: f64,
    facing: Facing,
    speed: f64,
    activity: Activity,
    externally_directed: bool,
    chasing: bool,
    pursuit: Option<Pursuit>,
    needs: NeedLevels,
    last_edge: Option<EdgeSide>,
    resolving: Option<Resolving>,
}

impl Pet {
    /// A walking pet at `x` with full needs.
    pub fn new(id: AgentId, x: f64, speed: f64) -> Self {
        Self {
            id,
            x,
            facing: Facing::default(),
            speed,
            activity: Activity::DEFAULT_LOCOMOTION,
            externally_directed: false,
            chasing: false,
            pursuit: None,
            needs: NeedLevels::full(),
            last_edge: None,
            resolving: None,
        }
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    /// The pet's identifier.
    pub const fn id(&self) -> AgentId {
        self.id
    }

    /// Horizontal position.
    pub const fn x(&self) -> f64 {
        self.x
    }

    /// Facing direction.
    pub const fn facing(&self) -> Facing {
        self.facing
    }

    /// Walking speed in pixels per second.
    pub const fn speed(&self) -> f64 {
        self.speed
    }

    /// Current activity.
    pub const fn activity(&self) -> Activity {
        self.activity
    }

    /// Whether the pet is under explicit command or mid-pursuit.
    pub const fn is_externally_directed(&self) -> bool {
        self.externally_directed
    }

    /// The chasing flag. Normally mirrors `pursuit().is_some()`.
    pub const fn is_chasing(&self) -> bool {
        self.chasing
    }

    /// The current pursuit, if any.
    pub const fn pursuit(&self) -> Option<&Pursuit> {
        self.pursuit.as_ref()
    }

    /// Whether a pursuit is active.
    pub const fn is_pursuing(&self) -> bool {
        self.pursuit.is_some()
    }

    /// Current need levels.
    pub const fn needs(&self) -> &NeedLevels {
        &self.needs
    }

    /// Mutable need levels (values are clamped on write).
    pub const fn needs_mut(&mut self) -> &mut NeedLevels {
        &mut self.needs
    }

    /// The edge last bounced off while pacing.
    pub const fn last_edge(&self) -> Option<EdgeSide> {
        self.last_edge
    }

    /// Resolving state, if the pet is enjoying a consumed resource.
    pub const fn resolving(&self) -> Option<&Resolving> {
        self.resolving.as_ref()
    }

    // -----------------------------------------------------------------------
    // Transitions
    // -----------------------------------------------------------------------

    /// Autonomous transition. Leaves `externally_directed` untouched.
    pub fn set_activity(&mut self, activity: Activity) {
        if activity != self.activity {
            self.resolving = None;
        }
        self.activity = activity;
    }

    /// Explicit transition. Locomotion releases external control; anything
    /// else takes it. An explicit command supersedes any pursuit, whose end
    /// is reported back.
    pub fn set_directed_activity(&mut self, activity: Activity) -> Option<PursuitEnded> {
        let ended = self.end_pursuit();
        self.activity = activity;
        self.resolving = None;
        self.externally_directed = !activity.is_locomotion();
        ended
    }

    /// Start walking toward a claimed item.
    pub fn begin_pursuit(&mut self, item: ItemId, kind: ResourceKind, x: f64) {
        self.pursuit = Some(Pursuit { item, kind, x });
        self.chasing = true;
        self.externally_directed = true;
        self.activity = Activity::DEFAULT_LOCOMOTION;
        self.resolving = None;
        self.last_edge = None;
        self.facing = self.facing.toward(self.x, x);
    }

    /// Stop pursuing. Returns the notice the pool needs to release the
    /// claim, or `None` if there was no pursuit.
    pub fn end_pursuit(&mut self) -> Option<PursuitEnded> {
        self.chasing = false;
        let pursuit = self.pursuit.take()?;
        self.last_edge = None;
        Some(PursuitEnded {
            agent: self.id,
            item: pursuit.item,
        })
    }

    /// Enter the resolving activity after consuming an item for `need`.
    pub fn begin_resolving(&mut self, need: NeedKind, activity: Activity, now_ms: u64) {
        self.activity = activity;
        self.externally_directed = self.pursuit.is_some() || !activity.is_locomotion();
        self.resolving = Some(Resolving {
            need,
            since_ms: now_ms,
        });
    }

    /// Drop every control flag and return to default locomotion.
    pub fn force_locomotion(&mut self) -> Option<PursuitEnded> {
        let ended = self.end_pursuit();
        self.externally_directed = false;
        self.chasing = false;
        self.activity = Activity::DEFAULT_LOCOMOTION;
        self.resolving = None;
        self.last_edge = None;
        ended
    }

    /// Move the pursuit target (the item itself moved).
    pub const fn retarget(&mut self, x: f64) {
        if let Some(pursuit) = self.pursuit.as_mut() {
            pursuit.x = x;
        }
    }

    /// Raw chasing flag write, used when a remote source reports a chase
    /// that cannot be mapped to a local claim. The watchdog repairs the
    /// mismatch.
    pub const fn set_chasing_flag(&mut self, chasing: bool) {
        self.chasing = chasing;
    }

    // -----------------------------------------------------------------------
    // Kinematics
    // -----------------------------------------------------------------------

    /// Place the pet.
    pub const fn set_x(&mut self, x: f64) {
        self.x = x;
    }

    /// Turn the pet.
    pub const fn set_facing(&mut self, facing: Facing) {
        self.facing = facing;
    }

    /// Change walking speed.
    pub const fn set_speed(&mut self, speed: f64) {
        self.speed = speed;
    }

    /// Record (or clear) the edge last bounced off.
    pub const fn set_last_edge(&mut self, edge: Option<EdgeSide>) {
        self.last_edge = edge;
    }

    /// Host-facing view of the pet.
    pub fn snapshot(&self, is_active: bool) -> PetSnapshot {
        PetSnapshot {
            id: self.id,
            x: self.x,
            facing: self.facing,
            activity: self.activity,
            needs: self.needs,
            pursuing: self.pursuit.map(|p| p.item),
            externally_directed: self.externally_directed,
            is_active,
        }
    }
}

// ---------------------------------------------------------------------------
// Validation of externally supplied values
// ---------------------------------------------------------------------------

/// Accept a finite coordinate.
pub fn check_position(x: f64) -> Result<f64, AgentError> {
    if x.is_finite() {
        Ok(x)
    } else {
        Err(AgentError::InvalidPosition { x })
    }
}

/// Accept a finite, non-negative speed.
pub fn check_speed(speed: f64) -> Result<f64, AgentError> {
    if speed.is_finite() && speed >= 0.0 {
        Ok(speed)
    } else {
        Err(AgentError::InvalidSpeed { speed })
    }
}

/// Accept a level inside `[0, 100]`.
pub fn check_level(kind: NeedKind, level: f64) -> Result<f64, AgentError> {
    if level.is_finite() && (MIN_NEED..=MAX_NEED).contains(&level) {
        Ok(level)
    } else {
        Err(AgentError::InvalidNeedLevel { kind, level })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn pet() -> Pet {
        Pet::new(AgentId::new(), 400.0, 50.0)
    }

    fn invariant_holds(pet: &Pet) -> bool {
        !pet.is_pursuing() || pet.is_externally_directed()
    }

    #[test]
    fn new_pet_walks_undirected() {
        let pet = pet();
        assert_eq!(pet.activity(), Activity::Walking);
        assert!(!pet.is_externally_directed());
        assert!(!pet.is_pursuing());
        assert!((pet.needs().hunger - MAX_NEED).abs() < f64::EPSILON);
    }

    #[test]
    fn autonomous_activity_keeps_direction_flag() {
        let mut pet = pet();
        pet.set_activity(Activity::Sleeping);
        assert!(!pet.is_externally_directed());
        pet.set_directed_activity(Activity::Sleeping);
        pet.set_activity(Activity::Playing);
        assert!(pet.is_externally_directed());
    }

    #[test]
    fn directed_locomotion_clears_flag() {
        let mut pet = pet();
        pet.set_directed_activity(Activity::Sleeping);
        assert!(pet.is_externally_directed());
        pet.set_directed_activity(Activity::Walking);
        assert!(!pet.is_externally_directed());
    }

    #[test]
    fn pursuit_forces_direction_and_walking() {
        let mut pet = pet();
        pet.set_activity(Activity::Sleeping);
        pet.set_last_edge(Some(EdgeSide::Left));
        let item = ItemId::new();
        pet.begin_pursuit(item, ResourceKind::Food, 100.0);
        assert!(pet.is_pursuing());
        assert!(pet.is_chasing());
        assert!(pet.is_externally_directed());
        assert_eq!(pet.activity(), Activity::Walking);
        assert_eq!(pet.facing(), Facing::Left);
        assert!(pet.last_edge().is_none());
        assert!(invariant_holds(&pet));
    }

    #[test]
    fn end_pursuit_reports_item_once() {
        let mut pet = pet();
        let item = ItemId::new();
        pet.begin_pursuit(item, ResourceKind::Food, 100.0);
        let ended = pet.end_pursuit().unwrap();
        assert_eq!(ended.item, item);
        assert_eq!(ended.agent, pet.id());
        assert!(!pet.is_chasing());
        assert!(pet.end_pursuit().is_none());
    }

    #[test]
    fn directed_command_supersedes_pursuit() {
        let mut pet = pet();
        let item = ItemId::new();
        pet.begin_pursuit(item, ResourceKind::Toy, 700.0);
        let ended = pet.set_directed_activity(Activity::Walking);
        assert_eq!(ended.map(|e| e.item), Some(item));
        assert!(!pet.is_pursuing());
        assert!(invariant_holds(&pet));
    }

    #[test]
    fn force_locomotion_resets_everything() {
        let mut pet = pet();
        pet.begin_pursuit(ItemId::new(), ResourceKind::Food, 10.0);
        pet.end_pursuit();
        pet.begin_resolving(NeedKind::Hunger, Activity::Consuming, 10);
        pet.set_chasing_flag(true);
        pet.force_locomotion();
        assert_eq!(pet.activity(), Activity::Walking);
        assert!(!pet.is_externally_directed());
        assert!(!pet.is_chasing());
        assert!(pet.resolving().is_none());
    }

    #[test]
    fn resolving_cleared_by_activity_change() {
        let mut pet = pet();
        pet.begin_resolving(NeedKind::Hunger, Activity::Consuming, 5);
        assert_eq!(pet.resolving().map(|r| r.since_ms), Some(5));
        pet.set_activity(Activity::Consuming);
        assert!(pet.resolving().is_some());
        pet.set_activity(Activity::Walking);
        assert!(pet.resolving().is_none());
    }

    #[test]
    fn snapshot_reflects_state() {
        let mut pet = pet();
        let item = ItemId::new();
        pet.begin_pursuit(item, ResourceKind::Food, 420.0);
        let snap = pet.snapshot(true);
        assert_eq!(snap.pursuing, Some(item));
        assert!(snap.is_active);
        assert!(snap.externally_directed);
    }

    #[test]
    fn validation_rejects_bad_values() {
        assert!(check_position(f64::INFINITY).is_err());
        assert!(check_speed(-1.0).is_err());
        assert!(check_level(NeedKind::Hunger, 101.0).is_err());
        assert!((check_level(NeedKind::Hunger, 55.0).unwrap() - 55.0).abs() < f64::EPSILON);
    }
}
