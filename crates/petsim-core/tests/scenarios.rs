//! End-to-end scenarios for the pet simulation core.
//!
//! Each test drives a [`ReconciliationAdapter`] through its public surface
//! only: commands, inbound events, and ticks.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use petsim_core::{
    ApplyOutcome, ContentionArbiter, PetManager, ReconciliationAdapter, SimulationConfig,
};
use petsim_core::{ClaimError, CommandError, ReconcileError};
use petsim_types::{
    Activity, AgentId, Command, CommandOutcome, EntityFields, EntityKind, InboundEvent, ItemId,
    Notification, ResourceKind, Supply,
};
use rust_decimal::Decimal;
use uuid::Uuid;

// =============================================================================
// Helpers
// =============================================================================

fn local_adapter(config: SimulationConfig) -> ReconciliationAdapter {
    ReconciliationAdapter::new(PetManager::with_local_ledger(config))
}

/// Create (or patch) a pet through the authority path.
fn upsert_pet(adapter: &mut ReconciliationAdapter, id: Uuid, x: f64, hunger: f64) -> AgentId {
    adapter
        .apply(InboundEvent::EntityUpserted {
            kind: EntityKind::Pet,
            id,
            fields: EntityFields {
                x: Some(x),
                hunger: Some(hunger),
                ..EntityFields::default()
            },
        })
        .unwrap();
    AgentId(id)
}

fn drop_food(adapter: &mut ReconciliationAdapter, x: f64) -> ItemId {
    match adapter
        .execute(Command::PurchaseAndDrop {
            kind: ResourceKind::Food,
            x,
        })
        .unwrap()
    {
        CommandOutcome::Dropped { item } => item,
        other => Err(other).unwrap(),
    }
}

fn pursuit_of(adapter: &ReconciliationAdapter, pet: AgentId) -> Option<ItemId> {
    adapter
        .manager()
        .pet(pet)
        .and_then(|state| state.pursuit())
        .map(|pursuit| pursuit.item)
}

fn remove_item(adapter: &mut ReconciliationAdapter, item: ItemId) -> ApplyOutcome {
    adapter
        .apply(InboundEvent::EntityRemoved {
            kind: EntityKind::Item {
                kind: ResourceKind::Food,
            },
            id: item.into_inner(),
        })
        .unwrap()
}

// =============================================================================
// Claim uniqueness
// =============================================================================

#[test]
fn claim_on_claimed_item_always_fails() {
    let mut arbiter = ContentionArbiter::new();
    let item = ItemId::new();
    let first = AgentId::new();
    arbiter.claim(item, first).unwrap();
    for _ in 0..10 {
        let other = AgentId::new();
        assert_eq!(
            arbiter.claim(item, other),
            Err(ClaimError::AlreadyClaimed {
                item,
                holder: first
            })
        );
    }
    assert_eq!(arbiter.len(), 1);
}

#[test]
fn two_hungry_pets_one_food() {
    let mut adapter = local_adapter(SimulationConfig::default());
    let left = upsert_pet(&mut adapter, Uuid::from_u128(1), 100.0, 30.0);
    let right = upsert_pet(&mut adapter, Uuid::from_u128(2), 700.0, 30.0);
    let food = drop_food(&mut adapter, 400.0);

    let holders: Vec<AgentId> = [left, right]
        .into_iter()
        .filter(|pet| pursuit_of(&adapter, *pet) == Some(food))
        .collect();
    assert_eq!(holders.len(), 1);
    assert_eq!(
        adapter.manager().pool().arbiter().holder_of(food),
        holders.first().copied()
    );

    // Keep ticking: one pet eats, the other never claims anything.
    let winner = holders[0];
    let loser = if winner == left { right } else { left };
    for _ in 0..600 {
        adapter.tick(16).unwrap();
        assert!(adapter.manager().pool().arbiter().len() <= 1);
        assert_eq!(pursuit_of(&adapter, loser), None);
    }
    assert!(adapter.manager().pool().get(food).is_none());
    let consumed: Vec<Notification> = adapter
        .drain_notifications()
        .into_iter()
        .filter(|n| matches!(n, Notification::Consumed { .. }))
        .collect();
    assert_eq!(consumed.len(), 1);
    assert!(matches!(
        consumed.first(),
        Some(Notification::Consumed { agent, .. }) if *agent == winner
    ));
}

// =============================================================================
// Bounded recovery
// =============================================================================

#[test]
fn destroyed_target_returns_pet_to_walking_within_grace() {
    let config = SimulationConfig::default();
    let grace = config.timing.recovery_grace_ms;
    let mut adapter = local_adapter(config);
    let pet = upsert_pet(&mut adapter, Uuid::from_u128(7), 100.0, 30.0);
    let food = drop_food(&mut adapter, 700.0);
    adapter.tick(16).unwrap();
    assert_eq!(pursuit_of(&adapter, pet), Some(food));

    assert_eq!(remove_item(&mut adapter, food), ApplyOutcome::Removed);
    adapter.tick(grace).unwrap();

    let state = adapter.manager().pet(pet).unwrap();
    assert!(!state.is_pursuing());
    assert!(!state.is_externally_directed());
    assert_eq!(state.activity(), Activity::Walking);
    assert!(adapter.manager().pool().arbiter().is_empty());
    assert_eq!(adapter.manager().pool().arbiter().holder_of(food), None);
}

#[test]
fn destroyed_target_moves_pet_to_next_item_within_grace() {
    let config = SimulationConfig::default();
    let grace = config.timing.recovery_grace_ms;
    let mut adapter = local_adapter(config);
    let pet = upsert_pet(&mut adapter, Uuid::from_u128(8), 100.0, 30.0);
    let first = drop_food(&mut adapter, 700.0);
    let second = drop_food(&mut adapter, 500.0);
    assert_eq!(pursuit_of(&adapter, pet), Some(first));

    remove_item(&mut adapter, first);
    adapter.tick(grace).unwrap();

    assert_eq!(pursuit_of(&adapter, pet), Some(second));
    let claims = adapter.manager().pool().arbiter().claims();
    assert_eq!(claims, vec![(second, pet)]);
}

#[test]
fn expiry_mid_pursuit_leaves_no_stale_claim() {
    let mut config = SimulationConfig::default();
    config.resources.food_ttl_ms = 200;
    let mut adapter = local_adapter(config);
    let pet = upsert_pet(&mut adapter, Uuid::from_u128(9), 100.0, 30.0);
    let food = drop_food(&mut adapter, 700.0);

    for _ in 0..20 {
        adapter.tick(16).unwrap();
    }
    assert!(adapter.manager().pool().get(food).is_none());
    assert!(adapter.manager().pool().arbiter().is_empty());
    let state = adapter.manager().pet(pet).unwrap();
    assert!(!state.is_pursuing());
    assert_eq!(state.activity(), Activity::Walking);
}

// =============================================================================
// Idempotent reconciliation
// =============================================================================

#[test]
fn unknown_pet_upsert_creates_once_with_default_needs() {
    let mut adapter = local_adapter(SimulationConfig::default());
    let id = Uuid::from_u128(42);
    let event = InboundEvent::EntityUpserted {
        kind: EntityKind::Pet,
        id,
        fields: EntityFields {
            x: Some(321.0),
            ..EntityFields::default()
        },
    };

    assert_eq!(adapter.apply(event.clone()), Ok(ApplyOutcome::Created));
    let once = adapter.manager().agent_snapshots();
    assert_eq!(adapter.apply(event), Ok(ApplyOutcome::Updated));
    let twice = adapter.manager().agent_snapshots();

    assert_eq!(once, twice);
    assert_eq!(twice.len(), 1);
    let pet = &twice[0];
    assert_eq!(pet.id, AgentId(id));
    assert!((pet.x - 321.0).abs() < f64::EPSILON);
    assert!((pet.needs.hunger - 100.0).abs() < f64::EPSILON);
    assert!((pet.needs.cleanliness - 100.0).abs() < f64::EPSILON);
    assert!((pet.needs.happiness - 100.0).abs() < f64::EPSILON);
    assert!(pet.is_active);
}

#[test]
fn remote_item_upsert_is_idempotent() {
    let mut adapter = local_adapter(SimulationConfig::default());
    let id = Uuid::from_u128(77);
    let event = InboundEvent::EntityUpserted {
        kind: EntityKind::Item {
            kind: ResourceKind::Toy,
        },
        id,
        fields: EntityFields {
            x: Some(250.0),
            ..EntityFields::default()
        },
    };
    adapter.apply(event.clone()).unwrap();
    let once = adapter.manager().resource_snapshot();
    adapter.apply(event).unwrap();
    assert_eq!(adapter.manager().resource_snapshot(), once);
    assert_eq!(once.len(), 1);
}

// =============================================================================
// Purchases and inventory
// =============================================================================

#[test]
fn insufficient_balance_fails_without_side_effects() {
    let mut config = SimulationConfig::default();
    config.economy.starting_balance = Decimal::from(4_u32);
    let mut adapter = local_adapter(config);

    let result = adapter.execute(Command::PurchaseAndDrop {
        kind: ResourceKind::Food,
        x: 300.0,
    });

    assert!(matches!(
        result,
        Err(ReconcileError::Command {
            source: CommandError::InsufficientBalance { .. }
        })
    ));
    assert_eq!(adapter.manager().balance(), Decimal::from(4_u32));
    assert!(adapter.manager().resource_snapshot().is_empty());
    assert_eq!(adapter.manager().inventory().count(Supply::Food), 0);
    assert!(adapter.drain_intents().is_empty());
    assert!(adapter
        .drain_notifications()
        .iter()
        .any(|n| matches!(n, Notification::InsufficientBalance { .. })));
}

#[test]
fn inventory_never_goes_negative() {
    let mut adapter = local_adapter(SimulationConfig::default());
    let caps = adapter.manager().config().economy.caps;

    for _ in 0..caps.food {
        adapter.manager_mut().buy(Supply::Food).unwrap();
    }
    assert!(matches!(
        adapter.manager_mut().buy(Supply::Food),
        Err(CommandError::InventoryFull { .. })
    ));
    assert_eq!(adapter.manager().inventory().count(Supply::Food), caps.food);

    for _ in 0..caps.food {
        drop_food(&mut adapter, 400.0);
    }
    assert_eq!(adapter.manager().inventory().count(Supply::Food), 0);

    adapter.manager_mut().overwrite_balance(Decimal::ZERO).unwrap();
    assert!(
        adapter
            .execute(Command::PurchaseAndDrop {
                kind: ResourceKind::Food,
                x: 400.0,
            })
            .is_err()
    );
    assert!(
        adapter
            .execute(Command::UseCleanupTool { x: 400.0, y: 0.0 })
            .is_ok()
    );
    for supply in Supply::ALL {
        assert_eq!(adapter.manager().inventory().count(supply), 0);
    }
}

// =============================================================================
// Decay
// =============================================================================

#[test]
fn hunger_never_rises_without_consumption() {
    let mut adapter = local_adapter(SimulationConfig::default());
    let pet = upsert_pet(&mut adapter, Uuid::from_u128(3), 300.0, 90.0);
    let mut previous = adapter.manager().pet(pet).unwrap().needs().hunger;
    for _ in 0..500 {
        adapter.tick(100).unwrap();
        let hunger = adapter.manager().pet(pet).unwrap().needs().hunger;
        assert!(hunger <= previous);
        assert!(hunger >= 0.0);
        previous = hunger;
    }
    assert!(previous < 90.0);
}

#[test]
fn decay_does_not_depend_on_tick_rate() {
    let mut coarse = local_adapter(SimulationConfig::default());
    let mut fine = local_adapter(SimulationConfig::default());
    let a = upsert_pet(&mut coarse, Uuid::from_u128(5), 300.0, 95.0);
    let b = upsert_pet(&mut fine, Uuid::from_u128(5), 300.0, 95.0);

    coarse.tick(10_000).unwrap();
    for _ in 0..1_000 {
        fine.tick(10).unwrap();
    }
    let coarse_level = coarse.manager().pet(a).unwrap().needs().hunger;
    let fine_level = fine.manager().pet(b).unwrap().needs().hunger;
    assert!((coarse_level - fine_level).abs() < 1e-6);
}

// =============================================================================
// Determinism
// =============================================================================

#[test]
fn same_seed_same_behaviour() {
    let run = || {
        let mut adapter = local_adapter(SimulationConfig::default());
        upsert_pet(&mut adapter, Uuid::from_u128(11), 200.0, 100.0);
        upsert_pet(&mut adapter, Uuid::from_u128(12), 600.0, 100.0);
        let mut activities = Vec::new();
        for _ in 0..2_500 {
            adapter.tick(16).unwrap();
            activities.push(
                adapter
                    .manager()
                    .agent_snapshots()
                    .into_iter()
                    .map(|pet| pet.activity)
                    .collect::<Vec<_>>(),
            );
        }
        (activities, adapter.manager().agent_snapshots())
    };
    let (first_activities, first_final) = run();
    let (second_activities, second_final) = run();
    assert_eq!(first_activities, second_activities);
    assert_eq!(first_final, second_final);
    assert!(
        first_activities
            .iter()
            .flatten()
            .any(|activity| *activity != Activity::Walking)
    );
}
