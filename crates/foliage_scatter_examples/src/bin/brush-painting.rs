use foliage_scatter::prelude::*;
use foliage_scatter_examples::{
    init_tracing, render_placements_to_png, rolling_hills, InstanceStyle, RenderConfig,
    TerrainConfig,
};
use glam::{Vec2, Vec3};
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Simulated pointer: a downward ray dragged along a sine path at 60 Hz.
fn pointer_path(samples: usize) -> Vec<PointerInput> {
    let dt = 1.0 / 60.0;
    (0..samples)
        .map(|i| {
            let t = i as f32 / samples as f32;
            let x = -40.0 + 80.0 * t;
            let z = 15.0 * (t * std::f32::consts::TAU).sin();
            let phase = match i {
                0 => PointerPhase::Down,
                _ if i + 1 == samples => PointerPhase::Up,
                _ => PointerPhase::Drag,
            };
            PointerInput::new(Vec3::new(x, 50.0, z), Vec3::NEG_Y, phase, i as f64 * dt)
        })
        .collect()
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let terrain = TerrainConfig {
        amplitude: 2.0,
        ..Default::default()
    };

    let mut scene = MemoryScene::new();
    let ground = scene.spawn_mesh("Terrain", rolling_hills(&terrain)?);
    let flower = scene.register_prefab("Flower", None);
    let fern = scene.register_prefab("Fern", None);

    let mut session = PlacementSession::new();
    session.add_rule(
        PlacementMode::Manual,
        Some(ground),
        PlacementRule::new(flower).with_random_size(true),
    );
    let fern_rule = session.add_rule(PlacementMode::Manual, Some(ground), PlacementRule::new(fern));

    let brush = BrushSettings::new(5.0, 12)
        .with_mode(BrushMode::Advanced)
        .with_softness(0.6)
        .with_flow(0.7)
        .with_separation(0.8)
        .with_align_to_normal(true);
    brush.validate()?;
    let mut painter = BrushPainter::new(brush);

    let mut rng = StdRng::seed_from_u64(7);
    let mut report = PlacementReport::new();
    let mut strokes = 0;
    for input in pointer_path(240) {
        let Some(mut stroke) = painter.update(&scene, &input) else {
            continue;
        };
        strokes += 1;
        report.merge(session.paint(&mut scene, &mut stroke, &painter.settings, &mut rng));
    }
    tracing::info!(
        "{strokes} stroke event(s) placed {} instance(s).",
        report.placed()
    );

    let removed = session.undo_last_batch(&mut scene, fern_rule);
    tracing::info!("Undid the last fern batch ({removed} instance(s)).");

    let placements: Vec<Placement> = report
        .placements
        .into_iter()
        .filter(|p| scene.is_alive(p.entity))
        .collect();

    let flowers = scene.instances_of(flower);
    let mut cfg = RenderConfig::new((800, 800), Vec2::splat(terrain.size))
        .with_background([150, 180, 110]);
    cfg.set_style(
        flower,
        InstanceStyle::Circle {
            color: [200, 60, 120],
            radius: 2,
        },
    )
    .set_style(
        fern,
        InstanceStyle::Circle {
            color: [30, 90, 40],
            radius: 2,
        },
    );

    render_placements_to_png(
        &scene,
        &placements,
        |e| Some(if flowers.contains(&e) { flower } else { fern }),
        &cfg,
        "brush-painting.png",
    )?;
    Ok(())
}
