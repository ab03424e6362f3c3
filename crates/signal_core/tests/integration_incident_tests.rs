mod support;

use bevy_ecs::world::Mut;
use signal_core::incidents::{
    IncidentConfig, IncidentEvent, IncidentInjector, IncidentKind, IncidentLog,
};
use signal_core::intersection::{Direction, DirectionCounts};
use signal_core::queues::VehicleQueues;
use signal_core::strategy::StrategyKind;
use signal_core::telemetry::SimTelemetry;

use support::schedule::ScheduleRunner;
use support::world::TestWorldBuilder;

#[test]
fn roadblock_halves_north_and_nothing_else() {
    let mut world = TestWorldBuilder::new()
        .with_incidents(IncidentConfig {
            probability: 0.0,
            ..IncidentConfig::default()
        })
        .build();
    world
        .resource_mut::<VehicleQueues>()
        .add_arrivals(&DirectionCounts::new(20, 6, 9, 3));

    let record = world.resource_scope(|world, mut injector: Mut<IncidentInjector>| {
        let mut queues = world.resource_mut::<VehicleQueues>();
        injector.inject(IncidentKind::Roadblock, Direction::North, &mut queues, 0)
    });

    assert_eq!(
        world.resource::<VehicleQueues>().counts(),
        DirectionCounts::new(10, 6, 9, 3)
    );
    assert_eq!(record.event, IncidentEvent::Roadblock);
    assert_eq!((record.queue_before, record.queue_after), (20, 10));
}

#[test]
fn accident_restores_after_twenty_ticks_in_a_run() {
    let mut world = TestWorldBuilder::new()
        .with_incidents(IncidentConfig {
            probability: 0.0,
            ..IncidentConfig::default()
        })
        .with_duration_secs(100)
        .build();
    let mut runner = ScheduleRunner::new();
    runner.start(&mut world);
    runner.run_ticks(&mut world, 5);

    // West is red during the first north-south green, so nothing drains it.
    world
        .resource_mut::<VehicleQueues>()
        .add_arrivals(&DirectionCounts::new(0, 0, 0, 15));
    world.resource_scope(|world, mut injector: Mut<IncidentInjector>| {
        let mut queues = world.resource_mut::<VehicleQueues>();
        injector.inject(IncidentKind::Accident, Direction::West, &mut queues, 5);
    });
    assert_eq!(world.resource::<VehicleQueues>().get(Direction::West), 0);

    runner.run_ticks(&mut world, 19);
    assert_eq!(world.resource::<VehicleQueues>().get(Direction::West), 0);
    runner.run_ticks(&mut world, 1);
    assert_eq!(world.resource::<VehicleQueues>().get(Direction::West), 15);

    let cleared = world
        .resource::<IncidentLog>()
        .records
        .iter()
        .filter(|r| r.event == IncidentEvent::AccidentCleared)
        .count();
    assert_eq!(cleared, 1);
    assert!(world.resource::<IncidentInjector>().pending().is_empty());
}

#[test]
fn vehicles_are_conserved_over_a_run() {
    for kind in StrategyKind::ALL {
        let mut world = TestWorldBuilder::new()
            .with_seed(99)
            .with_strategy(kind)
            .with_generated_traffic()
            .with_incidents(IncidentConfig {
                probability: 0.2,
                ambient_probability: 0.05,
                ..IncidentConfig::default()
            })
            .with_duration_secs(900)
            .build();
        ScheduleRunner::new().run_full(&mut world);

        let processed = world.resource::<SimTelemetry>().processed_vehicles;
        let queues = world.resource::<VehicleQueues>();
        assert!(queues.arrived_from_snapshots() > 0);
        assert!(queues.added_by_incidents() > 0, "{kind}: no incidents fired");
        assert_eq!(
            processed + queues.counts().total(),
            queues.net_added(),
            "{kind}: vehicles lost or created"
        );
    }
}

#[test]
fn disabled_incidents_leave_queues_alone() {
    let mut world = TestWorldBuilder::new()
        .with_generated_traffic()
        .with_duration_secs(600)
        .build();
    ScheduleRunner::new().run_full(&mut world);
    assert!(world.get_resource::<IncidentInjector>().is_none());
    assert!(world.resource::<IncidentLog>().records.is_empty());
    let queues = world.resource::<VehicleQueues>();
    assert_eq!(queues.added_by_incidents(), 0);
    assert_eq!(queues.removed_by_incidents(), 0);
}
