use sandbox_physics::*;

fn main() -> Result<()> {
    let mut world = World::default();
    let dt = world.settings().time_step();

    world.add(Body::wall(Shape::rect(40.0, 1.0)?, DVec2::new(0.0, -0.5)))?;

    let mut boxes = Vec::new();
    for level in 0..5 {
        let shape = Shape::rect(1.0, 1.0)?;
        let position = DVec2::new(0.1 * level as f64, 1.0 + 1.5 * level as f64);
        boxes.push(world.add(Body::new(shape, position))?);
    }
    let ball = world.add(Body::new(Shape::circle(0.5)?, DVec2::new(3.0, 6.0)))?;
    world.add(Tracer::new(ball, DVec2::ZERO, 64)?)?;

    let mut contacts = 0;
    for _ in 0..600 {
        contacts += world.step(dt).contacts.len();
    }

    println!("Simulated {:.2}s with {} contacts", world.sim_duration(), contacts);
    for id in &boxes {
        if let Some(body) = world.body(*id) {
            println!("  box {:?} rests at {:?}", id, body.position);
        }
    }
    println!("Energy after settling: {:?}", world.energy());
    Ok(())
}
