use sandbox_physics::*;

fn main() -> Result<()> {
    let mut world = World::new(SimulationSettings::vacuum());

    let (prism, _) = Shape::polygon(vec![
        DVec2::new(-1.5, -1.0),
        DVec2::new(1.5, -1.0),
        DVec2::new(0.0, 1.6),
    ])?;
    let mut glass = Body::wall(prism, DVec2::ZERO);
    glass.material = Material::glass();
    glass.color = Color::WHITE.with_alpha(0.8);
    world.add(glass)?;

    let mut mirror = Body::wall(Shape::rect(0.2, 8.0)?, DVec2::new(6.0, 0.0));
    mirror.material = Material::mirror();
    world.add(mirror)?;

    let source = world.add(Body::wall(Shape::rect(0.4, 0.4)?, DVec2::new(-6.0, -0.3)))?;
    let laser = world.add(Laser::new(source, DVec2::new(0.2, 0.0), 0.05).with_color(Color::RED))?;

    let report = world.step(0.0);
    println!("Traced {} rays", report.rays);

    if let Some(laser) = world.get(laser).and_then(Entity::as_laser) {
        for ray in laser.rays() {
            println!(
                "  depth {} from {:?} to {:?} (n = {}, alpha = {:.3})",
                ray.depth,
                ray.origin,
                ray.end(),
                ray.refractive_index,
                ray.color.a
            );
        }
    }
    Ok(())
}
