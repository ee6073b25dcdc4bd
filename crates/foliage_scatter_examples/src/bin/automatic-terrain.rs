use std::collections::HashSet;

use foliage_scatter::prelude::*;
use foliage_scatter_examples::{
    init_tracing, render_placements_to_png, rolling_hills, InstanceStyle, RenderConfig,
    TerrainConfig,
};
use glam::{Vec2, Vec3};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn main() -> anyhow::Result<()> {
    init_tracing();
    let terrain = TerrainConfig::default();

    let mut scene = MemoryScene::new();
    let ground = scene.spawn_mesh("Terrain", rolling_hills(&terrain)?);

    // Boulders the grass has to keep clear of.
    for (x, z, r) in [(-20.0, 10.0, 4.0), (15.0, -12.0, 6.0), (25.0, 25.0, 3.0)] {
        scene.spawn_sphere("Boulder", Vec3::new(x, 0.0, z), r);
    }

    let grass = scene.register_prefab("Grass", None);
    let shrub = scene.register_prefab("Shrub", Some(0.8));

    let mut session = PlacementSession::new();
    session.add_rule(
        PlacementMode::Automatic,
        Some(ground),
        PlacementRule::new(grass)
            .with_quantity(QuantityMode::FixedCount(1500))
            .with_avoid_overlap(true)
            .with_random_size(true),
    );
    session.add_rule(
        PlacementMode::Automatic,
        Some(ground),
        PlacementRule::new(shrub)
            .with_quantity(QuantityMode::FixedCount(120))
            .with_avoid_overlap(true)
            .with_overlap_radius(1.0)
            .with_min_separation(4.0)
            .with_depth(0.1),
    );

    let mut rng = StdRng::seed_from_u64(42);
    let mut sink = VecSink::new();
    let report = session.place_all_rules_with_events(&mut scene, &mut rng, &mut sink);
    for (reason, count) in report.rejections.iter() {
        tracing::info!("Rejected {count} candidate(s): {reason}.");
    }
    tracing::info!(
        "{} batch(es) committed.",
        sink.count(PlacementEventKind::BatchCommitted)
    );

    let grass_set: HashSet<EntityId> = scene.instances_of(grass).into_iter().collect();
    let mut cfg = RenderConfig::new((800, 800), Vec2::splat(terrain.size))
        .with_background([120, 170, 90])
        .with_height_shading(-terrain.amplitude, terrain.amplitude);
    cfg.set_style(grass, InstanceStyle::Dot { color: [40, 90, 20] })
        .set_style(
            shrub,
            InstanceStyle::Circle {
                color: [20, 60, 20],
                radius: 5,
            },
        );

    render_placements_to_png(
        &scene,
        &report.placements,
        |e| Some(if grass_set.contains(&e) { grass } else { shrub }),
        &cfg,
        "automatic-terrain.png",
    )?;
    Ok(())
}
