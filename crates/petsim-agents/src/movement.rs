//! Per-pet horizontal translation: pacing between the walls, or walking
//! toward a pursued item.
//!
//! Movement only moves. Reaching a target is reported as
//! [`MovementOutcome::ReachedTarget`]; deciding what that means (eat,
//! play, give up) is up to the need systems.

use petsim_types::{EdgeSide, Facing, ItemId};

use crate::config::MovementConfig;
use crate::pet::Pet;

/// Walkable span of the arena for a pet's centre.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Arena {
    min_x: f64,
    max_x: f64,
}

impl Arena {
    /// Arena of `width` pixels for pets `body_width` wide.
    pub fn new(width: f64, body_width: f64) -> Self {
        let half = (body_width / 2.0).max(0.0);
        let min_x = half;
        let max_x = width - half;
        if max_x < min_x {
            let centre = width / 2.0;
            return Self {
                min_x: centre,
                max_x: centre,
            };
        }
        Self { min_x, max_x }
    }

    /// Leftmost centre position.
    pub const fn min_x(&self) -> f64 {
        self.min_x
    }

    /// Rightmost centre position.
    pub const fn max_x(&self) -> f64 {
        self.max_x
    }

    /// Middle of the arena.
    pub fn centre(&self) -> f64 {
        f64::midpoint(self.min_x, self.max_x)
    }

    /// Clamp `x` into the walkable span. NaN maps to the centre.
    pub fn clamp(&self, x: f64) -> f64 {
        if x.is_nan() {
            return self.centre();
        }
        x.clamp(self.min_x, self.max_x)
    }
}

/// What a movement step did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MovementOutcome {
    /// The pet did not move.
    Idle,
    /// The pet moved.
    Moved,
    /// The pet is within arrival radius of its pursued item.
    ReachedTarget {
        /// The pursued item.
        item: ItemId,
        /// Its target coordinate.
        x: f64,
    },
}

/// Movement component owned one-to-one by each pet slot.
#[derive(Debug, Clone, PartialEq)]
pub struct Movement {
    arrival_radius: f64,
    dead_zone: f64,
    arena: Arena,
}

impl Movement {
    /// Movement for the given arena.
    pub const fn new(config: &MovementConfig, arena: Arena) -> Self {
        Self {
            arrival_radius: config.arrival_radius,
            dead_zone: config.dead_zone,
            arena,
        }
    }

    /// The arena this movement keeps the pet in.
    pub const fn arena(&self) -> &Arena {
        &self.arena
    }

    /// Advance `pet` by `dt_secs` of simulated time.
    pub fn update(&self, pet: &mut Pet, dt_secs: f64) -> MovementOutcome {
        if let Some(pursuit) = pet.pursuit().copied() {
            return self.pursue(pet, pursuit.item, pursuit.x, dt_secs);
        }
        if pet.is_externally_directed() || !pet.activity().is_locomotion() {
            return MovementOutcome::Idle;
        }
        self.pace(pet, dt_secs)
    }

    fn pursue(&self, pet: &mut Pet, item: ItemId, target_x: f64, dt_secs: f64) -> MovementOutcome {
        let goal = self.arena.clamp(target_x);
        let dx = goal - pet.x();
        if dx.abs() <= self.arrival_radius {
            return MovementOutcome::ReachedTarget { item, x: target_x };
        }
        if dx.abs() > self.dead_zone {
            pet.set_facing(pet.facing().toward(pet.x(), goal));
        }
        let step = (pet.speed() * dt_secs.max(0.0)).min(dx.abs());
        let next = self.arena.clamp(step.copysign(dx) + pet.x());
        pet.set_x(next);
        if (goal - next).abs() <= self.arrival_radius {
            return MovementOutcome::ReachedTarget { item, x: target_x };
        }
        MovementOutcome::Moved
    }

    fn pace(&self, pet: &mut Pet, dt_secs: f64) -> MovementOutcome {
        let step = pet.speed() * dt_secs.max(0.0) * pet.facing().sign();
        let next = self.arena.clamp(pet.x() + step);
        pet.set_x(next);

        if next >= self.arena.max_x()
            && pet.facing() == Facing::Right
            && pet.last_edge() != Some(EdgeSide::Right)
        {
            pet.set_facing(Facing::Left);
            pet.set_last_edge(Some(EdgeSide::Right));
        } else if next <= self.arena.min_x()
            && pet.facing() == Facing::Left
            && pet.last_edge() != Some(EdgeSide::Left)
        {
            pet.set_facing(Facing::Right);
            pet.set_last_edge(Some(EdgeSide::Left));
        }
        MovementOutcome::Moved
    }
}
