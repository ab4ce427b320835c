use crate::{
    body::{BodySpec, Color},
    config::SandboxConfig,
    obstacle::ObstacleSpec,
    registry::{ElementId, Zone},
    simulation::Simulation,
    vector::Vector2,
};

/// Body state copied out to the host.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BodyState {
    pub id: u64,
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    pub ax: f64,
    pub ay: f64,
    pub radius: f64,
    pub mass: f64,
    pub r: u8,
    pub g: u8,
    pub b: u8,
    /// 0 ground, 1 celestial.
    pub zone: u8,
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn Sandbox_Create(seed: u64) -> *mut Simulation {
    let config = SandboxConfig::default().with_seed(seed);
    Box::into_raw(Box::new(Simulation::new(config)))
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn Sandbox_Destroy(handle: *mut Simulation) {
    if !handle.is_null() {
        unsafe { drop(Box::from_raw(handle)) };
    }
}

/// Returns the number of events the step produced.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn Sandbox_Step(handle: *mut Simulation, dt: f64) -> usize {
    let sim = unsafe { handle.as_mut() };
    sim.map_or(0, |sim| sim.step(dt).len())
}

/// Returns the new body's id, or 0 if the parameters are invalid.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn Sandbox_AddBody(
    handle: *mut Simulation,
    x: f64,
    y: f64,
    vx: f64,
    vy: f64,
    mass: f64,
    radius: f64,
    charge: f64,
) -> u64 {
    let Some(sim) = (unsafe { handle.as_mut() }) else {
        return 0;
    };
    let spec = BodySpec::new(Vector2::new(x, y), radius, mass)
        .with_velocity(Vector2::new(vx, vy))
        .with_charge(charge);
    sim.create_body(spec).map_or(0, |id| id.0)
}

/// `vertices` points to 8 doubles: x0, y0, ..., x3, y3. Returns the id, or 0.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn Sandbox_AddObstacle(
    handle: *mut Simulation,
    vertices: *const f64,
    r: u8,
    g: u8,
    b: u8,
) -> u64 {
    let Some(sim) = (unsafe { handle.as_mut() }) else {
        return 0;
    };
    if vertices.is_null() {
        return 0;
    }
    let raw = unsafe { std::slice::from_raw_parts(vertices, 8) };
    let quad = [0, 1, 2, 3].map(|i| Vector2::new(raw[2 * i], raw[2 * i + 1]));
    let spec = ObstacleSpec::new(quad).with_color(Color::rgb(r, g, b));
    sim.create_obstacle(spec).map_or(0, |id| id.0)
}

/// Returns false if the id is not a body.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn Sandbox_ApplyForce(handle: *mut Simulation, id: u64, fx: f64, fy: f64) -> bool {
    let sim = unsafe { handle.as_mut() };
    sim.is_some_and(|sim| sim.apply_force(ElementId(id), Vector2::new(fx, fy), false).is_ok())
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn Sandbox_ApplyVelocity(handle: *mut Simulation, id: u64, vx: f64, vy: f64) -> bool {
    let sim = unsafe { handle.as_mut() };
    sim.is_some_and(|sim| sim.apply_velocity(ElementId(id), Vector2::new(vx, vy)).is_ok())
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn Sandbox_ClearForces(handle: *mut Simulation, id: u64) -> bool {
    let sim = unsafe { handle.as_mut() };
    sim.is_some_and(|sim| sim.clear_forces(ElementId(id)).is_ok())
}

/// Returns how many elements were removed, links included.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn Sandbox_DeleteElement(handle: *mut Simulation, id: u64) -> usize {
    let sim = unsafe { handle.as_mut() };
    sim.and_then(|sim| sim.delete_element(ElementId(id)).ok())
        .map_or(0, |removed| removed.len())
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn Sandbox_GetBodyCount(handle: *const Simulation) -> usize {
    let sim = unsafe { handle.as_ref() };
    sim.map_or(0, |sim| sim.bodies().count())
}

/// Fills `out` with the state of body `id`. Returns false if it doesn't exist.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn Sandbox_GetBodyState(handle: *const Simulation, id: u64, out: *mut BodyState) -> bool {
    let (Some(sim), Some(out)) = (unsafe { handle.as_ref() }, unsafe { out.as_mut() }) else {
        return false;
    };
    let Some(body) = sim.body(ElementId(id)) else {
        return false;
    };
    *out = BodyState {
        id,
        x: body.position.x,
        y: body.position.y,
        vx: body.velocity.x,
        vy: body.velocity.y,
        ax: body.acceleration.x,
        ay: body.acceleration.y,
        radius: body.radius(),
        mass: body.mass(),
        r: body.color.r,
        g: body.color.g,
        b: body.color.b,
        zone: match body.zone {
            Zone::Ground => 0,
            Zone::Celestial => 1,
        },
    };
    true
}

/// `celestial` requests the celestial regime; it commits once `altitude` crosses the threshold.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn Sandbox_SetEnvironment(
    handle: *mut Simulation,
    gravity_scale: f64,
    air_resistance: f64,
    collision_factor: f64,
    celestial: bool,
    altitude: f64,
) {
    if let Some(sim) = unsafe { handle.as_mut() } {
        let env = sim.environment_mut();
        env.gravity_scale = gravity_scale;
        env.air_resistance = air_resistance;
        env.collision_factor = collision_factor;
        env.mode = if celestial { Zone::Celestial } else { Zone::Ground };
        env.view_altitude = altitude;
    }
}
