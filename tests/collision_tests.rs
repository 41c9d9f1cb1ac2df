use approx::assert_abs_diff_eq;
use sandbox_physics::collision::{detect, AxisMode};
use sandbox_physics::*;

fn rect(width: f64, height: f64) -> Shape {
    Shape::rect(width, height).unwrap()
}

fn elastic(shape: Shape, position: DVec2, velocity: DVec2) -> Body {
    let mut body = Body::new(shape, position);
    body.velocity = velocity;
    body.material.restitution = 1.0;
    body.material.friction = 0.0;
    body
}

#[test]
fn tangent_outlines_report_no_collision() {
    let a = rect(1.0, 1.0).world_vertices(DVec2::ZERO, 0.0);
    let b = rect(1.0, 1.0).world_vertices(DVec2::new(1.0, 0.0), 0.0);

    assert!(detect(&a, DVec2::ZERO, &b, DVec2::new(1.0, 0.0), AxisMode::BoxPair).is_none());
    assert!(detect(&a, DVec2::ZERO, &b, DVec2::new(1.0, 0.0), AxisMode::AllEdges).is_none());
}

#[test]
fn applying_mtv_leaves_outlines_touching() {
    let position_a = DVec2::ZERO;
    let position_b = DVec2::new(0.9, 0.2);
    let a = rect(1.0, 1.0).world_vertices(position_a, 0.0);
    let b = rect(1.0, 1.0).world_vertices(position_b, 0.0);

    let mtv = detect(&a, position_a, &b, position_b, AxisMode::BoxPair).expect("overlap");
    assert_abs_diff_eq!(mtv.x, -0.1, epsilon = 1e-12);
    assert_abs_diff_eq!(mtv.y, 0.0, epsilon = 1e-12);

    let moved = position_a + mtv;
    let a = rect(1.0, 1.0).world_vertices(moved, 0.0);
    let residual = detect(&a, moved, &b, position_b, AxisMode::BoxPair).map_or(0.0, |v| v.length());
    assert!(residual < 1e-12);
}

#[test]
fn equal_boxes_swap_velocities_on_elastic_impact() {
    let mut world = World::new(SimulationSettings::vacuum());
    let a = world
        .add(elastic(rect(1.0, 1.0), DVec2::new(-0.95, 0.0), DVec2::new(1.0, 0.0)))
        .unwrap();
    let b = world
        .add(elastic(rect(1.0, 0.8), DVec2::new(1.0, 0.0), DVec2::ZERO))
        .unwrap();

    let mut contacts = 0;
    for _ in 0..200 {
        contacts += world.step(0.01).contacts.len();
    }

    assert_eq!(contacts, 1);
    let a = world.body(a).unwrap();
    let b = world.body(b).unwrap();
    assert_abs_diff_eq!(a.velocity.x, 0.0, epsilon = 1e-9);
    assert_abs_diff_eq!(b.velocity.x, 1.0, epsilon = 1e-9);
    assert!(b.position.x - a.position.x >= 1.0 - 1e-9);
}

#[test]
fn box_comes_to_rest_on_a_wall() {
    let mut settings = SimulationSettings::vacuum();
    settings.gravity_enabled = true;
    let mut world = World::new(settings);
    world
        .add(Body::wall(rect(20.0, 1.0), DVec2::ZERO))
        .unwrap();
    let id = world
        .add(Body::new(rect(1.0, 1.0), DVec2::new(0.0, 1.5)))
        .unwrap();

    for _ in 0..300 {
        world.step(0.01);
    }

    let body = world.body(id).unwrap();
    assert!(body.position.y > 0.99, "sank into the floor: {}", body.position.y);
    assert!(body.position.y < 1.05, "still bouncing: {}", body.position.y);
}

#[test]
fn walls_never_move() {
    let mut world = World::default();
    let wall = world
        .add(Body::wall(rect(4.0, 1.0), DVec2::ZERO))
        .unwrap();
    world
        .add(elastic(rect(1.0, 1.0), DVec2::new(0.0, 0.9), DVec2::new(0.0, -3.0)))
        .unwrap();

    for _ in 0..50 {
        world.step(0.01);
    }

    let wall = world.body(wall).unwrap();
    assert_eq!(wall.position, DVec2::ZERO);
    assert_eq!(wall.velocity, DVec2::ZERO);
    assert_eq!(wall.angle, 0.0);
}

#[test]
fn disjoint_masks_pass_through_each_other() {
    let mut world = World::new(SimulationSettings::vacuum());
    let mut a = Body::new(rect(1.0, 1.0), DVec2::ZERO);
    a.collision_mask = 0b01;
    let mut b = Body::new(rect(1.0, 1.0), DVec2::new(0.5, 0.0));
    b.collision_mask = 0b10;
    world.add(a).unwrap();
    world.add(b).unwrap();

    assert!(world.step(0.01).contacts.is_empty());
}

#[test]
fn exempt_mask_disables_self_collision() {
    let mut settings = SimulationSettings::vacuum();
    settings.self_collision_exempt_mask = 0b100;
    let mut world = World::new(settings);
    for x in [0.0, 0.5] {
        let mut body = Body::new(rect(1.0, 1.0), DVec2::new(x, 0.0));
        body.collision_mask = 0b100;
        world.add(body).unwrap();
    }

    assert!(world.step(0.01).contacts.is_empty());
}

#[test]
fn overlapping_bodies_are_separated_evenly_at_rest() {
    let mut world = World::new(SimulationSettings::vacuum());
    let a = world
        .add(Body::new(rect(1.0, 1.0), DVec2::ZERO))
        .unwrap();
    let b = world
        .add(Body::new(rect(1.0, 1.0), DVec2::new(0.6, 0.0)))
        .unwrap();

    let report = world.step(0.01);

    assert_eq!(report.contacts.len(), 1);
    let contact = &report.contacts[0];
    assert_eq!((contact.body_a, contact.body_b), (a, b));
    assert_abs_diff_eq!(contact.depth, 0.4, epsilon = 1e-12);
    assert_abs_diff_eq!(world.body(a).unwrap().position.x, -0.2, epsilon = 1e-12);
    assert_abs_diff_eq!(world.body(b).unwrap().position.x, 0.8, epsilon = 1e-12);
}

#[test]
fn hinged_bodies_do_not_collide() {
    let mut world = World::new(SimulationSettings::vacuum());
    let a = world
        .add(Body::new(rect(1.0, 1.0), DVec2::ZERO))
        .unwrap();
    let b = world
        .add(Body::new(rect(1.0, 1.0), DVec2::new(0.8, 0.0)))
        .unwrap();
    world
        .add_hinge(a, Some(b), DVec2::new(0.4, 0.0), false)
        .unwrap();

    assert!(world.step(0.01).contacts.is_empty());
}
