use foliage_scatter::prelude::*;
use foliage_scatter_examples::{init_tracing, render_placements_to_png, RenderConfig};
use glam::{Vec2, Vec3};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn main() -> anyhow::Result<()> {
    init_tracing();
    let mut scene = MemoryScene::new();

    // A field of small ground tiles, one candidate per tile and prefab.
    let mut tiles = Vec::new();
    for z in -4..=4 {
        for x in -4..=4 {
            let tile = scene.spawn_plane("Tile", 2.0);
            scene.set_position(tile, Vec3::new(x as f32 * 5.0, 0.0, z as f32 * 5.0));
            tiles.push(tile);
        }
    }
    scene.spawn_sphere("Rock", Vec3::new(0.0, 0.0, 0.0), 6.0);

    let prefabs = [
        scene.register_prefab("Tuft", None),
        scene.register_prefab("Pebble", None),
    ];

    let config = OneShotConfig::new(true).with_overlap_radius(0.75);
    let mut rng = StdRng::seed_from_u64(2024);
    let report = scatter_once(&mut scene, &tiles, &prefabs, &config, &mut rng);
    tracing::info!(
        "Placed {} of {} (overlap rejections: {}).",
        report.placed(),
        report.attempts,
        report.rejections.get(RejectReason::Overlap)
    );

    let cfg = RenderConfig::new((600, 600), Vec2::splat(50.0)).with_background([250, 250, 245]);
    render_placements_to_png(&scene, &report.placements, |_| None, &cfg, "runtime-oneshot.png")?;
    Ok(())
}
