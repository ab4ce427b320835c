use sandbox_physics::{
    BodyFlags, BodySpec, Color, Endpoint, Environment, LinkSpec, ModeState, SandboxConfig, SimEvent, Simulation,
    Vector2, Zone,
};

const DT: f64 = 0.01;

fn celestial() -> Simulation {
    let env = Environment::default()
        .with_mode(Zone::Celestial)
        .with_view_altitude(1.0e8);
    let mut sim = Simulation::new(SandboxConfig::default().with_environment(env));
    sim.step(DT);
    assert_eq!(sim.mode(), ModeState::Celestial);
    sim
}

fn following() -> BodyFlags {
    BodyFlags {
        following: true,
        ..BodyFlags::default()
    }
}

#[test]
fn transition_is_held_below_the_threshold() {
    let mut sim = Simulation::default();
    let id = sim.create_body(BodySpec::new(Vector2::new(0.0, 100.0), 1.0, 1.0)).unwrap();

    sim.environment_mut().mode = Zone::Celestial;
    sim.environment_mut().view_altitude = 1.0e6;
    for _ in 0..5 {
        let events = sim.step(DT);
        assert!(!events.iter().any(|e| matches!(e, SimEvent::ModeChanged { .. })));
        assert_eq!(sim.mode(), ModeState::Transitioning);
    }
    let body = sim.body(id).unwrap();
    assert!(body.gravitation, "gravitation is forced on while transitioning");
    assert_eq!(body.zone, Zone::Ground);
    // still falling under ground gravity
    assert!(body.velocity.y < 0.0);

    sim.environment_mut().view_altitude = 1.5e7;
    let events = sim.step(DT);
    assert!(events.contains(&SimEvent::ModeChanged {
        from: Zone::Ground,
        to: Zone::Celestial
    }));
    assert_eq!(sim.mode(), ModeState::Celestial);
}

#[test]
fn cancelling_a_transition_restores_ground_behavior() {
    let mut sim = Simulation::default();
    let id = sim.create_body(BodySpec::new(Vector2::new(0.0, 100.0), 1.0, 1.0)).unwrap();
    sim.environment_mut().mode = Zone::Celestial;
    sim.step(DT);
    assert!(sim.body(id).unwrap().gravitation);

    sim.environment_mut().mode = Zone::Ground;
    let events = sim.step(DT);
    assert!(events.is_empty());
    assert_eq!(sim.mode(), ModeState::Ground);
    assert!(!sim.body(id).unwrap().gravitation);
}

#[test]
fn commit_migrates_followed_bodies_and_cuts_spanning_links() {
    let mut sim = Simulation::default();
    let tracked = sim
        .create_body(BodySpec::new(Vector2::new(0.0, 100.0), 1.0, 1.0).with_flags(following()))
        .unwrap();
    let left_behind = sim.create_body(BodySpec::new(Vector2::new(10.0, 100.0), 1.0, 1.0)).unwrap();
    let rope = sim
        .create_link(LinkSpec::rope(Endpoint::Body(tracked), Endpoint::Body(left_behind), 20.0))
        .unwrap();

    sim.environment_mut().mode = Zone::Celestial;
    sim.environment_mut().view_altitude = 2.0e7;
    let events = sim.step(DT);

    assert!(events.contains(&SimEvent::Removed(rope)));
    assert!(sim.link(rope).is_none());
    let tracked_body = sim.body(tracked).unwrap();
    assert_eq!(tracked_body.zone, Zone::Celestial);
    assert!(tracked_body.gravitation);
    let left = sim.body(left_behind).unwrap();
    assert_eq!(left.zone, Zone::Ground);
    assert!(!left.gravitation);
    let frozen = left.position;

    // ground is not simulated while celestial
    sim.step(DT);
    assert_eq!(sim.body(left_behind).unwrap().position, frozen);
    // nor is there downward gravity
    assert_eq!(sim.body(tracked).unwrap().velocity.y, 0.0);

    sim.environment_mut().mode = Zone::Ground;
    let events = sim.step(DT);
    assert!(events.contains(&SimEvent::ModeChanged {
        from: Zone::Celestial,
        to: Zone::Ground
    }));
    let back = sim.body(tracked).unwrap();
    assert_eq!(back.zone, Zone::Ground);
    assert!(!back.gravitation);
    assert!(back.natural_forces.is_empty());
}

#[test]
fn new_elements_join_the_committed_zone() {
    let mut sim = celestial();
    let id = sim.create_body(BodySpec::new(Vector2::zero(), 1.0, 1.0)).unwrap();
    assert_eq!(sim.body(id).unwrap().zone, Zone::Celestial);
    assert!(sim.body(id).unwrap().gravitation);
}

#[test]
fn overlapping_celestial_bodies_merge() {
    let mut sim = celestial();
    let a = sim
        .create_body(
            BodySpec::new(Vector2::new(0.0, 0.0), 3.0, 2.0)
                .with_velocity(Vector2::new(1.0, 0.0))
                .with_color(Color::rgb(200, 0, 0))
                .with_charge(1e-9),
        )
        .unwrap();
    let b = sim
        .create_body(
            BodySpec::new(Vector2::new(5.0, 0.0), 4.0, 1.0)
                .with_velocity(Vector2::new(0.0, 3.0))
                .with_color(Color::rgb(0, 0, 200))
                .with_charge(2e-9)
                .with_flags(following()),
        )
        .unwrap();

    let events = sim.step(DT);
    assert_eq!(
        events,
        vec![SimEvent::Merged { survivor: a, absorbed: b }, SimEvent::Removed(b)]
    );
    assert!(sim.body(b).is_none());
    assert_eq!(sim.bodies().count(), 1);

    let merged = sim.body(a).unwrap();
    assert_eq!(merged.mass(), 3.0);
    assert!((merged.radius() - 5.0).abs() < 1e-12);
    assert!((merged.electric_charge - 3e-9).abs() < 1e-20);
    assert!(merged.flags.following);
    // radius-weighted: 3/7 red, 4/7 blue
    assert_eq!(merged.color, Color::rgb(86, 0, 114));

    // merged at the center of mass, then advanced one frame at the merged velocity
    let velocity = Vector2::new(2.0 / 3.0, 1.0);
    assert!((merged.velocity - velocity).mag() < 1e-12);
    let expected = Vector2::new(5.0 / 3.0, 0.0) + velocity * DT;
    assert!((merged.position - expected).mag() < 1e-9, "{:?}", merged.position);
}

#[test]
fn merge_chains_collapse_in_one_frame() {
    let mut sim = celestial();
    for x in [0.0, 3.0, 6.0] {
        sim.create_body(BodySpec::new(Vector2::new(x, 0.0), 2.0, 1.0)).unwrap();
    }
    let events = sim.step(DT);
    let merges = events.iter().filter(|e| matches!(e, SimEvent::Merged { .. })).count();
    assert_eq!(merges, 2);
    assert_eq!(sim.bodies().count(), 1);
    let survivor = sim.bodies().next().unwrap();
    assert_eq!(survivor.mass(), 3.0);
    assert!((survivor.radius() - 12f64.sqrt()).abs() < 1e-12);
    assert!((survivor.position.x - 3.0).abs() < 1e-9);
}

#[test]
fn merges_drop_links_of_the_absorbed_body() {
    let mut sim = celestial();
    let a = sim.create_body(BodySpec::new(Vector2::new(0.0, 0.0), 2.0, 1.0)).unwrap();
    let b = sim.create_body(BodySpec::new(Vector2::new(3.0, 0.0), 2.0, 1.0)).unwrap();
    let c = sim.create_body(BodySpec::new(Vector2::new(30.0, 0.0), 2.0, 1.0)).unwrap();
    let kept = sim
        .create_link(LinkSpec::rope(Endpoint::Body(a), Endpoint::Body(c), 50.0))
        .unwrap();
    let dropped = sim
        .create_link(LinkSpec::rope(Endpoint::Body(b), Endpoint::Body(c), 50.0))
        .unwrap();

    let events = sim.step(DT);
    assert!(events.contains(&SimEvent::Removed(dropped)));
    assert!(sim.link(kept).is_some());
    assert!(sim.link(dropped).is_none());
}

#[test]
fn merged_body_feels_the_field_in_the_merge_frame() {
    let mut sim = celestial();
    let a = sim.create_body(BodySpec::new(Vector2::new(0.0, 0.0), 1.0, 1.0)).unwrap();
    sim.create_body(BodySpec::new(Vector2::new(1.0, 0.0), 1.0, 1.0)).unwrap();
    sim.create_body(BodySpec::new(Vector2::new(1000.0, 0.0), 1.0, 1e18)).unwrap();

    let events = sim.step(DT);
    assert_eq!(events.iter().filter(|e| matches!(e, SimEvent::Merged { .. })).count(), 1);

    let g = 6.674e-11 * 1e18;
    let expected = (g / (1000.0f64.powi(2) + 1e-9) + g / (999.0f64.powi(2) + 1e-9)) / 2.0;
    let merged = sim.body(a).unwrap();
    assert!((merged.acceleration.x - expected).abs() < 1e-9 * expected, "{:?}", merged.acceleration);
    assert!(merged.acceleration.y.abs() < 1e-9);
    assert!(merged.velocity.x > 0.0);
}
