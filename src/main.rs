use std::f64::consts::{FRAC_PI_2, TAU};

use anyhow::Result;
use log::info;

use sandbox2d::core::math::{Vec2, Vec2Ext};
use sandbox2d::engine::physics::body::presets;
use sandbox2d::engine::physics::{Anchor, Connection, ObjectHandle, World, WorldConfig};
use sandbox2d::engine::step_clock::StepClock;

/// Frames simulated by the headless demo
const DEMO_FRAMES: u32 = 600;

/// Arena half size; walls sit on this radius
const ARENA_RADIUS: f64 = 50.0;

const CLUSTER_COUNT: usize = 10;

/// Four fixed walls, ten circle clusters on a ring, and a spring holding the
/// first cluster to the arena center
fn build_scene(world: &mut World) -> Result<ObjectHandle> {
    for i in 0..4 {
        let angle = i as f64 * FRAC_PI_2;
        let at = Vec2::X.rotated(angle) * ARENA_RADIUS;
        world.add_object(presets::wall(at.x, at.y, 5.0, 90.0, angle))?;
    }

    let mut first = None;
    for i in 0..CLUSTER_COUNT {
        let along = i as f64 * TAU / CLUSTER_COUNT as f64;
        let at = Vec2::X.rotated(along) * 25.0;
        let mut cluster = presets::circle_cluster(at.x, at.y, 1 + i % 3, 1 + (i / 3) % 3, 1.5 + 0.5 * (i % 2) as f64);
        cluster.set_name(format!("cluster-{}", i));
        cluster.set_velocity(Vec2::Y.rotated(along) * (5.0 + i as f64));
        cluster.set_angular_velocity(if i % 2 == 0 { 0.5 } else { -0.5 });

        let handle = world.add_object(cluster)?;
        first.get_or_insert(handle);
    }

    let held = first.ok_or_else(|| anyhow::anyhow!("scene has no clusters"))?;
    world.add_connection(Connection::new(
        Anchor::object(held, Vec2::new(3.0, 0.0)),
        Anchor::world(Vec2::ZERO),
    ))?;
    Ok(held)
}

fn main() -> Result<()> {
    // Initialize logger
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    info!("Starting sandbox2d...");

    let mut world = World::new(WorldConfig::default());
    let held = build_scene(&mut world)?;
    info!(
        "Scene ready: {} objects, {} connections",
        world.object_count(),
        world.connection_count()
    );

    let mut clock = StepClock::new();
    for frame in 1..=DEMO_FRAMES {
        // Uneven frame pacing, as a real display loop would produce
        let frame_time = clock.fixed_timestep() * if frame % 7 == 0 { 2.5 } else { 1.0 };
        for _ in 0..clock.advance(frame_time) {
            world.step(clock.fixed_timestep())?;
        }

        if frame == DEMO_FRAMES / 2 {
            if let Some(target) = world.nearest_object(Vec2::ZERO, true) {
                let at = world.object(target).map(|o| o.position()).unwrap_or(Vec2::ZERO);
                world.deform_at(target, at + Vec2::new(1.0, 0.0))?;
                info!("Deformed {} next to its center", target);
            }
        }

        if frame % 120 == 0 {
            let position = world.object(held).map(|o| o.position()).unwrap_or(Vec2::ZERO);
            info!(
                "Frame {}: {} steps, {} contacts, held cluster at ({:.2}, {:.2})",
                frame,
                world.step_count(),
                world.contacts().len(),
                position.x,
                position.y
            );
        }
    }

    let debug = world.debug_geometry();
    info!(
        "Done after {:.1}s simulated: {} debug segments ({} bytes)",
        clock.step_count() as f64 * clock.fixed_timestep(),
        debug.segment_count(),
        debug.as_bytes().len()
    );

    Ok(())
}
