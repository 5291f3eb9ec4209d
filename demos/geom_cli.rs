//! geom_cli — a native demo/debug binary in the spirit of `mesh_cli`: it
//! runs canned scenarios through the preprocessing core and dumps
//! stats/OBJ-style output for manual inspection. It does **not** implement
//! a real DXF parser or glTF writer (both are external collaborators) — it
//! only exercises the core with synthetic `EntitySource` impls.

use std::f64::consts::PI;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use dxf2glb_core::entity::{ArcEntity, CircleEntity, Entity, LwPolylineEntity, MeshEntity, SplineEntity};
use dxf2glb_core::{Mesh, MeshOptimizationOptions, OptimizedGeometry, PreprocessorOptions, Vec3};

const USAGE: &str = r#"geom_cli (dxf2glb-core)

USAGE:
  geom_cli list
  geom_cli run <scenario|all> [--out-dir <dir>] [--obj <path>] [--json <path>]

SCENARIOS:
  noisy_polyline       long near-colinear polyline, RDP before/after
  arc_fan              arcs and circles of varying radius on one layer
  spline_wiggle        a cubic spline sampled and simplified
  grid_mesh            a dense vertex grid, junk-filtered and decimated
"#;

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if let Err(err) = run(&args) {
        eprintln!("geom_cli error: {err}");
        std::process::exit(1);
    }
}

fn run(args: &[String]) -> io::Result<()> {
    match args.first().map(String::as_str) {
        Some("list") => {
            println!("{USAGE}");
            Ok(())
        }
        Some("run") => run_scenarios(&args[1..]),
        _ => {
            println!("{USAGE}");
            Ok(())
        }
    }
}

fn run_scenarios(args: &[String]) -> io::Result<()> {
    let scenario = args.first().cloned().unwrap_or_else(|| "all".to_string());
    let mut out_dir: Option<PathBuf> = None;
    let mut obj_path: Option<PathBuf> = None;
    let mut json_path: Option<PathBuf> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--out-dir" => {
                out_dir = args.get(i + 1).map(PathBuf::from);
                i += 2;
            }
            "--obj" => {
                obj_path = args.get(i + 1).map(PathBuf::from);
                i += 2;
            }
            "--json" => {
                json_path = args.get(i + 1).map(PathBuf::from);
                i += 2;
            }
            _ => i += 1,
        }
    }

    let scenarios: Vec<(&str, fn() -> Vec<Entity>)> = vec![
        ("noisy_polyline", noisy_polyline_scenario),
        ("arc_fan", arc_fan_scenario),
        ("spline_wiggle", spline_wiggle_scenario),
        ("grid_mesh", grid_mesh_scenario),
    ];

    let selected: Vec<_> = if scenario == "all" {
        scenarios
    } else {
        scenarios.into_iter().filter(|(name, _)| *name == scenario).collect()
    };

    if selected.is_empty() {
        eprintln!("unknown scenario: {scenario}");
        std::process::exit(1);
    }

    for (name, build) in selected {
        let entities = build();
        let result = dxf2glb_core::process(entities, &PreprocessorOptions::default(), &MeshOptimizationOptions::default())
            .map_err(io::Error::other)?;
        print_stats(name, &result);

        if let Some(dir) = &out_dir {
            std::fs::create_dir_all(dir)?;
            write_obj(&dir.join(format!("{name}.obj")), &result)?;
            write_json(&dir.join(format!("{name}.json")), &result)?;
        }
        if let Some(path) = &obj_path {
            write_obj(path, &result)?;
        }
        if let Some(path) = &json_path {
            write_json(path, &result)?;
        }
    }

    Ok(())
}

fn print_stats(name: &str, result: &OptimizedGeometry) {
    println!(
        "{name}: {} polylines, {} meshes ({} triangles), {:.2}% vertex reduction",
        result.stats.optimized_polylines,
        result.stats.mesh_count,
        result.stats.triangle_count,
        result.stats.reduction_percent()
    );
}

fn write_obj(path: &PathBuf, result: &OptimizedGeometry) -> io::Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    let mut vertex_offset = 1usize;

    for polyline in &result.polylines {
        writeln!(writer, "o {}", polyline.layer)?;
        for p in &polyline.points {
            writeln!(writer, "v {} {} {}", p.x, p.y, p.z)?;
        }
        for i in 0..polyline.points.len().saturating_sub(1) {
            writeln!(writer, "l {} {}", vertex_offset + i, vertex_offset + i + 1)?;
        }
        vertex_offset += polyline.points.len();
    }

    for mesh in &result.meshes {
        writeln!(writer, "o {}", mesh.layer)?;
        for v in &mesh.vertices {
            writeln!(writer, "v {} {} {}", v.x, v.y, v.z)?;
        }
        for tri in mesh.triangle_indices.chunks_exact(3) {
            writeln!(
                writer,
                "f {} {} {}",
                vertex_offset + tri[0] as usize,
                vertex_offset + tri[1] as usize,
                vertex_offset + tri[2] as usize
            )?;
        }
        vertex_offset += mesh.vertices.len();
    }

    Ok(())
}

fn write_json(path: &PathBuf, result: &OptimizedGeometry) -> io::Result<()> {
    let json = dxf2glb_core::json::to_string_pretty(result).map_err(io::Error::other)?;
    std::fs::write(path, json)
}

fn noisy_polyline_scenario() -> Vec<Entity> {
    let points: Vec<(f64, f64)> = (0..2000)
        .map(|i| {
            let t = i as f64 * 0.02;
            (t, t.sin() * 2.0 + (t * 11.0).sin() * 0.02)
        })
        .collect();
    vec![Entity::LwPolyline(LwPolylineEntity {
        layer: "contour".to_string(),
        points,
        elevation: 0.0,
        is_closed: false,
    })]
}

fn arc_fan_scenario() -> Vec<Entity> {
    let mut entities = Vec::new();
    for i in 0..12 {
        let radius = 1.0 + i as f64 * 0.5;
        entities.push(Entity::Arc(ArcEntity {
            layer: "fan".to_string(),
            center: Vec3::ZERO,
            radius,
            start_angle: 0.0,
            end_angle: PI * (0.25 + i as f64 * 0.05),
            normal: Vec3::Z,
        }));
    }
    entities.push(Entity::Circle(CircleEntity {
        layer: "fan".to_string(),
        center: Vec3::new(5.0, 0.0, 0.0),
        radius: 2.0,
        normal: Vec3::Z,
    }));
    entities
}

fn spline_wiggle_scenario() -> Vec<Entity> {
    vec![Entity::Spline(SplineEntity {
        layer: "wiggle".to_string(),
        control_points: vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 3.0, 0.0),
            Vec3::new(2.0, -3.0, 0.0),
            Vec3::new(3.0, 2.0, 0.0),
            Vec3::new(4.0, 0.0, 0.0),
        ],
        degree: 3,
    })]
}

fn grid_mesh_scenario() -> Vec<Entity> {
    let n = 20usize;
    let mut vertices = Vec::with_capacity(n * n);
    for i in 0..n {
        for j in 0..n {
            vertices.push(Vec3::new(i as f64 / (n - 1) as f64, j as f64 / (n - 1) as f64, 0.0));
        }
    }
    let mut indices = Vec::new();
    for i in 0..n - 1 {
        for j in 0..n - 1 {
            let a = (i * n + j) as u32;
            let b = ((i + 1) * n + j) as u32;
            let c = ((i + 1) * n + j + 1) as u32;
            let d = (i * n + j + 1) as u32;
            indices.extend_from_slice(&[a, b, c, a, c, d]);
        }
    }
    vec![Entity::Mesh(MeshEntity {
        mesh: Mesh::new("terrain", vertices, indices),
    })]
}
