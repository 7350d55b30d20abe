mod common;

use common::*;
use oracle_registry::{Caller, RegistryError, RegistryEvent};

#[test]
fn test_deregister_lowers_threshold_with_count() {
    let (mut registry, _) = registry_with_oracles(2, &[0xa1, 0xb2]);
    assert_eq!(registry.state().oracle_count(), 2);
    assert_eq!(registry.state().effective_threshold(), 2);

    let record = registry.deregister_oracle(&admin(), id(0xa1)).unwrap();
    assert_eq!(
        record.event,
        RegistryEvent::OracleDeregistered {
            oracle: id(0xa1),
            oracle_count: 1,
            effective_threshold: 1,
        }
    );
    assert_eq!(registry.state().oracle_count(), 1);
    assert_eq!(registry.state().effective_threshold(), 1);
}

#[test]
fn test_deregister_unknown_identity_leaves_state_untouched() {
    let (mut registry, _) = registry_with_oracles(2, &[1, 2, 3]);
    let events_before = registry.events().len();

    assert_eq!(
        registry.deregister_oracle(&admin(), id(0x77)),
        Err(RegistryError::NotRegistered)
    );
    assert_eq!(registry.state().oracle_count(), 3);
    assert_eq!(registry.state().effective_threshold(), 2);
    assert_eq!(registry.events().len(), events_before);
}

#[test]
fn test_deregister_twice_is_rejected_the_second_time() {
    let (mut registry, _) = registry_with_oracles(3, &[1, 2, 3]);

    registry.deregister_oracle(&admin(), id(2)).unwrap();
    assert_eq!(registry.state().oracle_count(), 2);

    assert_eq!(
        registry.deregister_oracle(&admin(), id(2)),
        Err(RegistryError::NotRegistered)
    );
    assert_eq!(registry.state().oracle_count(), 2);
    assert_eq!(registry.state().effective_threshold(), 2);
}

#[test]
fn test_deregister_to_zero_floors_count_and_threshold() {
    let (mut registry, _) = registry_with_oracles(2, &[1, 2]);
    registry.deregister_oracle(&admin(), id(1)).unwrap();
    registry.deregister_oracle(&admin(), id(2)).unwrap();

    assert_eq!(registry.state().oracle_count(), 0);
    assert_eq!(registry.state().effective_threshold(), 0);
    assert!(registry.active_oracles().is_empty());

    assert_eq!(
        registry.deregister_oracle(&admin(), id(1)),
        Err(RegistryError::NotRegistered)
    );
    assert_eq!(registry.state().oracle_count(), 0);
}

#[test]
fn test_reregistration_reactivates_existing_record() {
    let (mut registry, clock) = registry_with_oracles(2, &[1]);
    let registered_at = registry.oracle(&id(1)).unwrap().registered_at;

    clock.advance(100);
    registry.deregister_oracle(&admin(), id(1)).unwrap();
    let deregistered_at = START + 100;

    clock.advance(50);
    let record = registry
        .register_oracle(&admin(), id(1), "oracle-1-renamed")
        .unwrap();
    assert!(matches!(
        record.event,
        RegistryEvent::OracleRegistered {
            reactivated: true,
            oracle_count: 1,
            effective_threshold: 1,
            ..
        }
    ));

    let oracle = registry.oracle(&id(1)).unwrap();
    assert!(oracle.active);
    assert_eq!(oracle.registered_at, registered_at);
    assert_eq!(oracle.last_deregistered_at, Some(deregistered_at));
    assert_eq!(oracle.last_activated_at, START + 150);
    assert_eq!(oracle.activations, 2);
    assert_eq!(oracle.name, "oracle-1-renamed");
    assert_eq!(registry.state().oracles().len(), 1);
}

#[test]
fn test_register_twice_while_active_is_rejected() {
    let (mut registry, _) = registry_with_oracles(2, &[1]);
    assert_eq!(
        registry.register_oracle(&admin(), id(1), "again"),
        Err(RegistryError::AlreadyRegistered)
    );
    assert_eq!(registry.state().oracle_count(), 1);
}

#[test]
fn test_oracle_limit_counts_only_active_members() {
    let (mut registry, _) = registry_with_oracles(2, &[0, 1, 2, 3, 4, 5, 6, 7, 8, 9]);
    assert_eq!(
        registry.register_oracle(&admin(), id(10), "overflow"),
        Err(RegistryError::OracleLimitReached { max: 10 })
    );

    registry.deregister_oracle(&admin(), id(3)).unwrap();
    registry.register_oracle(&admin(), id(10), "replacement").unwrap();
    assert_eq!(registry.state().oracle_count(), 10);
}

#[test]
fn test_non_admin_cannot_manage_membership() {
    let (mut registry, _) = registry_with_oracles(2, &[1]);
    let stranger = caller(0x55);

    assert_eq!(
        registry.register_oracle(&stranger, id(2), "x"),
        Err(RegistryError::Unauthorized)
    );
    assert_eq!(
        registry.deregister_oracle(&stranger, id(1)),
        Err(RegistryError::Unauthorized)
    );
    assert_eq!(
        registry.set_required_consensus(&stranger, 1),
        Err(RegistryError::Unauthorized)
    );
    // An oracle is not an admin either.
    assert_eq!(
        registry.add_admin_signer(&caller(1), id(1)),
        Err(RegistryError::Unauthorized)
    );
    assert_eq!(registry.state().oracle_count(), 1);
}

#[test]
fn test_added_admin_can_manage_membership() {
    let (mut registry, _) = registry(2);
    registry.add_admin_signer(&admin(), id(0xae)).unwrap();
    assert_eq!(registry.state().admin_signers(), &[id(ADMIN), id(0xae)]);

    registry
        .register_oracle(&caller(0xae), id(1), "by-second-admin")
        .unwrap();
    assert!(registry.state().oracles().is_active(&id(1)));
}

#[test]
fn test_raising_required_consensus_is_capped_by_membership() {
    let (mut registry, _) = registry_with_oracles(2, &[1, 2, 3]);
    let record = registry.set_required_consensus(&admin(), 5).unwrap();
    assert_eq!(
        record.event,
        RegistryEvent::ConsensusThresholdUpdated {
            old_required: 2,
            new_required: 5,
            effective_threshold: 3,
        }
    );

    registry.register_oracle(&admin(), id(4), "d").unwrap();
    assert_eq!(registry.state().effective_threshold(), 4);
}

#[test]
fn test_failed_calls_emit_nothing_and_successes_emit_one() {
    let (mut registry, _) = registry(2);
    assert_eq!(registry.events().len(), 1);

    registry.register_oracle(&admin(), id(1), "a").unwrap();
    assert_eq!(registry.events().len(), 2);

    let failures: Vec<Result<_, _>> = vec![
        registry.register_oracle(&admin(), id(1), "a"),
        registry.deregister_oracle(&admin(), id(9)),
        registry.set_required_consensus(&admin(), 0),
        registry.set_required_signatures(&admin(), 5),
        registry.set_override_cooldown(&admin(), 10),
        registry.add_admin_signer(&admin(), id(ADMIN)),
        registry.register_oracle(&Caller::new(id(0x55), vec![1, 2, 3]), id(2), "b"),
    ];
    assert!(failures.iter().all(Result::is_err));
    assert_eq!(registry.events().len(), 2);

    let sequences: Vec<u64> = registry
        .events()
        .records()
        .iter()
        .map(|record| record.sequence)
        .collect();
    assert_eq!(sequences, vec![0, 1]);
    assert_eq!(registry.state().next_sequence(), 2);
}

#[test]
fn test_initialized_event_opens_the_log() {
    let (registry, _) = registry(3);
    let first = &registry.events().records()[0];
    assert_eq!(first.sequence, 0);
    assert_eq!(first.timestamp, START);
    assert_eq!(
        first.event,
        RegistryEvent::Initialized {
            admin: id(ADMIN),
            required_consensus: 3,
            max_oracles: 10,
        }
    );
}
