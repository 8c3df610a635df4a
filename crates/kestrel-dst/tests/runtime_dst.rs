//! DST tests for the actor runtime
//!
//! TigerStyle: Deterministic testing of mailboxes, lifecycle, and the tick
//! scheduler, with invariants checked after every simulated step.

use kestrel_core::{ActorId, Error, Message};
use kestrel_dst::{
    Accounting, DeterministicRng, InvariantChecker, SimConfig, Simulation, SimulationError,
    SystemState,
};
use kestrel_runtime::{Actor, ActorState, Event, Mailbox, Runtime, RuntimeBuilder, StopHandle};
use std::sync::Arc;

fn id(n: u128) -> ActorId {
    ActorId::new(n)
}

// =============================================================================
// Basic Scenarios
// =============================================================================

#[test]
fn test_dst_mailbox_capacity_three() {
    let mailbox = Mailbox::with_capacity(3);
    let sender = id(1);

    assert!(mailbox.send(Message::new(sender, 10)));
    assert!(mailbox.send(Message::new(sender, 11)));
    assert!(mailbox.send(Message::new(sender, 12)));
    assert!(!mailbox.send(Message::new(sender, 13)));

    let payloads: Vec<u64> = (0..3)
        .filter_map(|_| mailbox.recv())
        .map(|m| m.payload())
        .collect();
    assert_eq!(payloads, vec![10, 11, 12]);
    assert!(mailbox.is_empty());
}

#[test]
fn test_dst_actor_process_one() {
    let actor = Actor::new(id(1), 10);
    for payload in 1..=3 {
        assert!(actor.enqueue(Message::new(id(2), payload)));
    }

    let results: Vec<bool> = (0..4).map(|_| actor.process_one()).collect();
    assert_eq!(results, vec![true, true, true, false]);
    assert_eq!(actor.processed_count(), 3);
    assert_eq!(actor.state(), ActorState::Running);
}

#[test]
fn test_dst_runtime_two_actors() {
    let one = Actor::new(id(1), 16);
    let two = Actor::new(id(2), 16);

    let mut runtime = Runtime::new();
    runtime.register(&one).unwrap();
    runtime.register(&two).unwrap();

    assert!(runtime.send_msg(id(1), id(2), 42));
    assert!(runtime.send_msg(id(2), id(1), 100));
    assert_eq!(runtime.run_ticks(5), 2);
    assert_eq!(runtime.total_messages_sent(), 2);
    assert!(!runtime.is_running());
}

#[test]
fn test_dst_duplicate_registration() {
    let actor = Actor::new(id(1), 4);
    let mut runtime = Runtime::new();

    runtime.register(&actor).unwrap();
    let err = runtime.register(&actor).unwrap_err();
    assert!(matches!(err, Error::ActorAlreadyRegistered { .. }));
    assert_eq!(runtime.registered_count(), 1);
}

#[test]
fn test_dst_send_to_unknown_actor() {
    let actor = Actor::new(id(1), 4);
    let mut runtime = Runtime::new();
    runtime.register(&actor).unwrap();

    assert!(!runtime.send_msg(id(99), id(1), 42));
    assert_eq!(runtime.total_messages_sent(), 0);
}

// =============================================================================
// Randomized Simulation
// =============================================================================

#[test]
fn test_dst_simulation_from_env() {
    let config = SimConfig::from_env_or_random().with_steps(2_000);
    let seed = config.seed;

    let result = Simulation::new(config).run();
    assert!(result.is_ok(), "seed {} failed: {:?}", seed, result.err());
}

#[test]
fn test_dst_same_seed_same_report() {
    let config = SimConfig::new(0xDEAD_BEEF)
        .with_steps(3_000)
        .with_actors(8)
        .with_mailbox_capacity(4);

    let first = Simulation::new(config.clone()).run().unwrap();
    let second = Simulation::new(config).run().unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_dst_small_mailboxes_reject_under_load() {
    let config = SimConfig::new(11)
        .with_steps(2_000)
        .with_actors(2)
        .with_mailbox_capacity(1)
        .with_send_probability(0.95);

    let report = Simulation::new(config).run().unwrap();
    assert!(report.rejected_full > 0);
    assert!(report.processed <= report.accepted);
}

#[test]
fn test_dst_all_unknown_targets() {
    let config = SimConfig::new(5)
        .with_steps(500)
        .with_send_probability(1.0)
        .with_unknown_target_probability(1.0);

    let report = Simulation::new(config).run().unwrap();
    assert_eq!(report.accepted, 0);
    assert_eq!(report.unknown_target, 500);
    assert!(report.final_states.iter().all(|s| *s == ActorState::Idle));
}

#[test]
fn test_dst_many_seeds() {
    let rng = DeterministicRng::new(2024);
    for _ in 0..20 {
        let seed = rng.next_u64();
        let config = SimConfig::new(seed).with_steps(300).with_mailbox_capacity(2);
        if let Err(SimulationError::InvariantViolation { step, violation, .. }) =
            Simulation::new(config).run()
        {
            panic!("seed {} step {}: {}", seed, step, violation);
        }
    }
}

// =============================================================================
// Concurrency
// =============================================================================

#[test]
fn test_dst_concurrent_senders_then_ticks() {
    let actors: Vec<Actor> = (1..=4).map(|n| Actor::new(id(n), 128)).collect();

    std::thread::scope(|scope| {
        for sender in 10..14u128 {
            let actors = &actors;
            scope.spawn(move || {
                for (i, actor) in actors.iter().enumerate() {
                    for payload in 1..=8u64 {
                        assert!(actor.enqueue(Message::new(id(sender), payload + i as u64)));
                    }
                }
            });
        }
    });

    let mut runtime = Runtime::new();
    for actor in &actors {
        runtime.register(actor).unwrap();
    }

    let processed = runtime.run_ticks(64);
    assert_eq!(processed, 4 * 32);
    assert!(actors.iter().all(|a| a.state() == ActorState::Running));

    let state = SystemState::capture(
        &runtime,
        &actors,
        Accounting {
            accepted_sends: 128,
            ticks_executed: 64,
            last_run_ticks: 64,
            last_run_processed: processed,
        },
    );
    // Sends bypassed the runtime, so only check occupancy and conservation
    let checker = InvariantChecker::new()
        .with_invariant(kestrel_dst::MailboxBounded)
        .with_invariant(kestrel_dst::MessageConservation)
        .with_invariant(kestrel_dst::TickBounded);
    assert!(checker.verify_all(&state).is_ok());
}

#[test]
fn test_dst_stop_from_handler_mid_run() {
    let stop = StopHandle::new();
    let handle = stop.clone();
    let stopper = Actor::with_handler(
        id(1),
        8,
        Arc::new(move |_: &Message| -> Option<Event> {
            handle.stop();
            None
        }),
    );
    let worker = Actor::new(id(2), 8);

    let mut runtime = RuntimeBuilder::new()
        .with_stop_handle(stop)
        .build()
        .unwrap();
    runtime.register(&stopper).unwrap();
    runtime.register(&worker).unwrap();

    assert!(runtime.send_msg(id(1), id(2), 1));
    for payload in 1..=4 {
        assert!(runtime.send_msg(id(2), id(1), payload));
    }

    let processed = runtime.run_ticks(100);
    assert!(processed <= 2);
    assert_eq!(runtime.total_ticks(), 1);
    assert!(!runtime.is_running());
    assert!(worker.pending_count() >= 3);
}
