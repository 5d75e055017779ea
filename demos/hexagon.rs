//! Grows a surface over a hexagonal height field and prints the result.
//!
//! Run with `RUST_LOG=afront=debug cargo run --example hexagon` to watch the
//! front advance.

use afront::math::Point3;
use afront::mesh::ExtractMesh;
use afront::operations::query::CheckFront;
use afront::operations::{GrowFront, GrowthParams, HeightFieldCandidates};
use afront::topology::FrontStore;

fn main() -> afront::Result<()> {
    // Default: WARN for everything, INFO for afront.
    // Override with RUST_LOG env var (e.g. RUST_LOG=afront=debug).
    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing_subscriber::filter::LevelFilter::WARN.into())
        .add_directive("afront=info".parse().unwrap_or_default());
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    // Two rings around a raised centre.
    let mut points = vec![Point3::new(0.0, 0.0, 0.4)];
    for ring in 1..=2 {
        let r = f64::from(ring);
        for k in 0..6 * ring {
            let t = std::f64::consts::TAU * f64::from(k) / f64::from(6 * ring);
            points.push(Point3::new(r * t.cos(), r * t.sin(), 0.4 / (1.0 + r)));
        }
    }

    let mut store = FrontStore::new();
    let (_, candidates) = HeightFieldCandidates::new(points).execute(&mut store)?;
    println!("{} candidates", candidates.len());

    let result = GrowFront::new(candidates)
        .with_params(GrowthParams::default())
        .execute(&mut store)?;
    CheckFront::new().execute(&store)?;

    println!(
        "{} facets, {} front(s), {} shell(s), stop: {:?}, complete: {}",
        result.facets.len(),
        result.fronts,
        result.shells,
        result.stop,
        result.is_complete()
    );
    for (i, border) in result.loops.iter().enumerate() {
        println!(
            "loop {i}: {} vertices, {}",
            border.vertices.len(),
            if border.closed { "closed" } else { "open" }
        );
    }
    for diagnostic in &result.diagnostics {
        println!("diagnostic: {diagnostic:?}");
    }

    let mesh = ExtractMesh::new().execute(&store)?;
    println!(
        "mesh: {} vertices, {} triangles",
        mesh.vertices.len(),
        mesh.triangle_count()
    );
    Ok(())
}
