use std::f64::consts::FRAC_PI_2;

use approx::assert_relative_eq;
use sandbox_physics::config::MIN_VISIBLE_ALPHA;
use sandbox_physics::optics::reflectance;
use sandbox_physics::*;

const TILT: f64 = 0.1;

/// Two tall mirrors facing each other across the origin.
fn mirror_corridor(settings: SimulationSettings) -> World {
    let mut world = World::new(settings);
    for x in [-5.0, 5.0] {
        let mut mirror = Body::wall(Shape::rect(1.0, 200.0).unwrap(), DVec2::new(x, 0.0));
        mirror.material = Material::mirror();
        world.add(mirror).unwrap();
    }
    world
}

fn add_laser(world: &mut World, at: DVec2, direction: f64) -> (EntityId, EntityId) {
    let source = world
        .add(Body::new(Shape::rect(0.1, 0.1).unwrap(), at))
        .unwrap();
    let laser = world.add(Laser::new(source, DVec2::ZERO, direction)).unwrap();
    (source, laser)
}

fn rays(world: &World, laser: EntityId) -> Vec<LaserRay> {
    world.get(laser).unwrap().as_laser().unwrap().rays().to_vec()
}

#[test]
fn opaque_mirror_reflects_everything() {
    let mut world = mirror_corridor(SimulationSettings::vacuum());
    let (_, laser) = add_laser(&mut world, DVec2::ZERO, TILT);
    world.step(0.0);

    let rays = rays(&world, laser);
    assert!(rays.len() > 2);
    assert_relative_eq!(rays[0].length, 4.5 / TILT.cos(), epsilon = 1e-9);

    let bounce = &rays[1];
    assert_eq!(bounce.parent, Some(0));
    assert_eq!(bounce.depth, 1);
    assert_relative_eq!(bounce.direction().x, -TILT.cos(), epsilon = 1e-9);
    assert_relative_eq!(bounce.direction().y, TILT.sin(), epsilon = 1e-9);
    assert_relative_eq!(bounce.color.a, rays[0].color.a);
    assert!(rays.iter().all(|r| r.parent.map_or(true, |p| p < rays.len())));
}

#[test]
fn depth_limit_stops_recursion() {
    let mut settings = SimulationSettings::vacuum();
    settings.max_ray_depth = 3;
    let mut world = mirror_corridor(settings);
    let (_, laser) = add_laser(&mut world, DVec2::ZERO, TILT);

    let report = world.step(0.0);

    let rays = rays(&world, laser);
    assert_eq!(rays.len(), 4);
    assert_eq!(report.rays, 4);
    let depths: Vec<u32> = rays.iter().map(|r| r.depth).collect();
    assert_eq!(depths, vec![0, 1, 2, 3]);
}

#[test]
fn ray_budget_is_shared_by_all_lasers() {
    let mut settings = SimulationSettings::vacuum();
    settings.ray_budget = 5;
    let mut world = mirror_corridor(settings);
    let (_, first) = add_laser(&mut world, DVec2::ZERO, TILT);
    let (_, second) = add_laser(&mut world, DVec2::new(0.0, -20.0), TILT);

    let report = world.step(0.0);

    assert_eq!(report.rays, 5);
    assert_eq!(rays(&world, first).len(), 5);
    assert!(rays(&world, second).is_empty());
}

#[test]
fn glass_splits_light_and_tints_transmission() {
    let mut world = World::new(SimulationSettings::vacuum());
    let mut slab = Body::wall(Shape::rect(2.0, 10.0).unwrap(), DVec2::ZERO);
    slab.material = Material::glass();
    slab.color = Color::WHITE.with_alpha(0.5);
    world.add(slab).unwrap();
    let (_, laser) = add_laser(&mut world, DVec2::new(-10.0, 0.0), 0.0);

    world.step(0.0);

    let rays = rays(&world, laser);
    assert_relative_eq!(rays[0].length, 9.0, epsilon = 1e-9);
    let children: Vec<&LaserRay> = rays.iter().filter(|r| r.parent == Some(0)).collect();
    assert_eq!(children.len(), 2);

    let reflected = children
        .iter()
        .find(|r| r.refractive_index == 1.0)
        .expect("reflected ray");
    let transmitted = children
        .iter()
        .find(|r| r.refractive_index == 1.5)
        .expect("transmitted ray");
    let r = reflectance(1.5);
    assert_relative_eq!(reflected.color.a as f64, r, epsilon = 1e-6);
    assert_relative_eq!(transmitted.color.a as f64, (1.0 - r) * 0.5, epsilon = 1e-6);
    assert_relative_eq!(transmitted.direction().x, 1.0, epsilon = 1e-9);
}

#[test]
fn glass_leaves_budget_for_other_lasers() {
    let mut world = World::new(SimulationSettings::vacuum());
    let mut slab = Body::wall(Shape::rect(2.0, 10.0).unwrap(), DVec2::ZERO);
    slab.material = Material::glass();
    world.add(slab).unwrap();
    let (_, into_glass) = add_laser(&mut world, DVec2::new(-10.0, 0.0), TILT);
    let (_, into_void) = add_laser(&mut world, DVec2::new(0.0, -20.0), -FRAC_PI_2);

    let report = world.step(0.0);

    let glass_rays = rays(&world, into_glass);
    assert!(glass_rays.len() > 2);
    assert!(glass_rays.len() < 100, "glass used {} rays", glass_rays.len());
    assert!(glass_rays.iter().all(|r| r.color.a >= MIN_VISIBLE_ALPHA));
    assert_eq!(rays(&world, into_void).len(), 1);
    assert_eq!(report.rays, glass_rays.len() + 1);
}

#[test]
fn clockwise_glass_still_reflects_outside() {
    let mut world = World::new(SimulationSettings::vacuum());
    let clockwise = Shape::Polygon {
        vertices: vec![
            DVec2::new(-1.0, -5.0),
            DVec2::new(-1.0, 5.0),
            DVec2::new(1.0, 5.0),
            DVec2::new(1.0, -5.0),
        ],
    };
    let mut slab = Body::wall(clockwise, DVec2::ZERO);
    slab.material = Material::glass();
    world.add(slab).unwrap();
    let (_, laser) = add_laser(&mut world, DVec2::new(-10.0, 0.0), TILT);

    world.step(0.0);

    let rays = rays(&world, laser);
    let children: Vec<&LaserRay> = rays.iter().filter(|r| r.parent == Some(0)).collect();
    assert_eq!(children.len(), 2);
    let reflected = children
        .iter()
        .find(|r| r.direction().x < 0.0)
        .expect("reflected ray");
    let transmitted = children
        .iter()
        .find(|r| r.direction().x > 0.0)
        .expect("transmitted ray");
    assert_eq!(reflected.refractive_index, 1.0);
    assert_eq!(transmitted.refractive_index, 1.5);
}

#[test]
fn disabled_laser_emits_nothing() {
    let mut world = World::new(SimulationSettings::vacuum());
    let (_, laser) = add_laser(&mut world, DVec2::ZERO, 0.0);
    world.step(0.0);
    assert_eq!(rays(&world, laser).len(), 1);

    world
        .set_property(laser, "enabled", PropertyValue::Flag(false))
        .unwrap();
    let report = world.step(0.0);

    assert_eq!(report.rays, 0);
    assert!(rays(&world, laser).is_empty());
}

#[test]
fn beam_turns_with_its_body() {
    let mut world = World::new(SimulationSettings::vacuum());
    let source = world
        .add(Body::new(Shape::rect(0.5, 0.5).unwrap(), DVec2::ZERO))
        .unwrap();
    let laser = world
        .add(
            Laser::new(source, DVec2::new(1.0, 0.0), 0.0)
                .with_fade_distance(50.0)
                .unwrap(),
        )
        .unwrap();
    world.body_mut(source).unwrap().angle = FRAC_PI_2;

    world.step(0.0);

    let rays = rays(&world, laser);
    assert_eq!(rays.len(), 1);
    assert_relative_eq!(rays[0].origin.x, 0.0, epsilon = 1e-9);
    assert_relative_eq!(rays[0].origin.y, 1.0, epsilon = 1e-9);
    assert_relative_eq!(rays[0].angle, FRAC_PI_2, epsilon = 1e-12);
    assert_relative_eq!(rays[0].length, 50.0);
}
