use sandbox_physics::{
    BodySpec, ElementId, Endpoint, LinkKind, LinkSpec, ObstacleSpec, SandboxConfig, SandboxError, Simulation,
    Snapshot, ValidationError, Vector2, Zone,
};

fn scene() -> (Simulation, ElementId, ElementId, ElementId, ElementId) {
    let mut sim = Simulation::default();
    let post = sim
        .create_obstacle(ObstacleSpec::rect(Vector2::new(-5.0, 40.0), Vector2::new(5.0, 45.0)))
        .unwrap();
    let a = sim.create_body(BodySpec::new(Vector2::new(0.0, 30.0), 1.0, 2.0)).unwrap();
    let b = sim
        .create_body(BodySpec::new(Vector2::new(4.0, 30.0), 1.5, 1.0).with_charge(1e-6))
        .unwrap();
    let anchor = sim.anchor_at(post, Vector2::new(0.0, 40.0)).unwrap();
    sim.create_link(LinkSpec::rope(Endpoint::Anchor(anchor), Endpoint::Body(a), 10.0))
        .unwrap();
    let rod = sim
        .create_link(LinkSpec::rod(Endpoint::Body(a), Endpoint::Body(b), 4.0))
        .unwrap();
    (sim, post, a, b, rod)
}

#[test]
fn round_trip_preserves_ids_and_links() {
    let (mut sim, post, a, b, rod) = scene();
    for _ in 0..10 {
        sim.step(1.0 / 60.0);
    }
    sim.apply_force(a, Vector2::new(1.0, 2.0), false).unwrap();

    let json = sim.snapshot().to_json().unwrap();
    let snapshot = Snapshot::from_json(&json).unwrap();
    let mut restored = Simulation::restore(SandboxConfig::default(), &snapshot).unwrap();

    assert_eq!(restored.snapshot(), sim.snapshot());
    assert_eq!(restored.body(a).unwrap().position, sim.body(a).unwrap().position);
    assert_eq!(restored.body(b).unwrap().electric_charge, 1e-6);
    assert_eq!(restored.body(a).unwrap().artificial_forces, vec![Vector2::new(1.0, 2.0)]);
    assert!(restored.obstacle(post).is_some());

    let link = restored.link(rod).unwrap();
    assert_eq!(link.start, Endpoint::Body(a));
    assert_eq!(link.end, Endpoint::Body(b));
    assert_eq!(link.kind, LinkKind::Rod { length: 4.0 });

    // ids keep counting from where the saved run left off
    let fresh = restored.create_body(BodySpec::default()).unwrap();
    assert!(fresh.0 >= snapshot.next_id);

    // and both copies evolve identically
    sim.step(1.0 / 60.0);
    restored.step(1.0 / 60.0);
    assert_eq!(restored.body(b).unwrap().position, sim.body(b).unwrap().position);
}

#[test]
fn dangling_links_are_dropped() {
    let (sim, _, _, b, rod) = scene();
    let mut snapshot = sim.snapshot();
    snapshot.bodies.retain(|record| record.id != b.0);

    let restored = Simulation::restore(SandboxConfig::default(), &snapshot).unwrap();
    assert!(restored.link(rod).is_none());
    assert_eq!(restored.links().count(), 1);
    assert!(restored.body(b).is_none());
}

#[test]
fn invalid_bodies_fail_the_restore() {
    let (sim, ..) = scene();
    let mut snapshot = sim.snapshot();
    snapshot.bodies[0].mass = -1.0;

    let err = Simulation::restore(SandboxConfig::default(), &snapshot).unwrap_err();
    assert!(matches!(err, SandboxError::Validation(ValidationError::InvalidMass(m)) if m == -1.0));
}

#[test]
fn restore_resumes_in_the_saved_mode() {
    let mut snapshot = Simulation::default().snapshot();
    snapshot.mode = Zone::Celestial;
    let mut sim = Simulation::restore(SandboxConfig::default(), &snapshot).unwrap();
    assert!(sim.step(0.1).is_empty());
    assert_eq!(sim.active_zone(), Zone::Celestial);
}

#[test]
fn malformed_json_is_a_config_error() {
    assert!(matches!(Snapshot::from_json("{\"bodies\": 3}"), Err(SandboxError::Config(_))));
}
