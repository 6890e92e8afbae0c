//! mesh-layout CLI - vertex clustering and cache-friendly vertex reordering.
//!
//! Usage: mesh-layout --in <FILE> [--out <FILE>] [--mode <0|1>] [OPTIONS]
//!
//! Mode 0 clusters the vertices and writes the mesh colored by cluster.
//! Mode 1 clusters, optimizes the per-cluster order and writes the mesh with
//! its vertices rearranged.
//!
//! Set `RUST_LOG=debug` for per-split diagnostics.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use clap::error::ErrorKind;
use clap::Parser;

use mesh_layout::algo::cluster::{
    cluster_vertices_with_progress, ClusterAssignment, ClusterOptions, LeafReason,
};
use mesh_layout::algo::colormap::cluster_colors;
use mesh_layout::algo::graph::{connected_components, EdgeSet};
use mesh_layout::algo::layout::{optimize_layout_with_progress, LayoutOptions};
use mesh_layout::algo::Progress;
use mesh_layout::io;
use mesh_layout::mesh::TriangleMesh;

#[derive(Parser)]
#[command(name = "mesh-layout")]
#[command(
    author,
    version,
    about = "Spectral vertex clustering and layout optimization",
    long_about = None
)]
struct Cli {
    /// Input mesh file (.ply)
    #[arg(long = "in", value_name = "FILE")]
    input: PathBuf,

    /// Output mesh file
    #[arg(long = "out", value_name = "FILE", default_value = "out.ply")]
    output: PathBuf,

    /// 0 = cluster and colorize, 1 = optimize layout
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u8).range(0..=1))]
    mode: u8,

    /// Eigensolver iteration budget per bisection
    #[arg(long, default_value_t = 100_000, alias = "max_iterations")]
    max_iterations: usize,

    /// Eigensolver tolerance
    #[arg(long, default_value_t = 1e-5)]
    error: f64,

    /// Maximum bisection depth
    #[arg(long, default_value_t = 10, alias = "max_deph")]
    max_depth: usize,

    /// Clusters stop splitting at this many vertices
    #[arg(long, default_value_t = 100, alias = "max_cluster_size")]
    max_cluster_size: usize,

    /// Octree buckets hold fewer than this many vertices
    #[arg(long, default_value_t = 10_000, alias = "max_spectral_size")]
    max_spectral_size: usize,

    /// Largest cluster ordered by exhaustive search
    #[arg(long, default_value_t = 8)]
    max_exhaustive_size: usize,

    /// Use single-threaded layout optimization (for benchmarking)
    #[arg(long)]
    sequential: bool,
}

fn main() {
    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Stderr)
        .init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
                _ => 1,
            };
            let _ = e.print();
            std::process::exit(code);
        }
    };

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let cluster_options = ClusterOptions::default()
        .with_max_depth(cli.max_depth)
        .with_max_cluster_size(cli.max_cluster_size)
        .with_max_spectral_size(cli.max_spectral_size)
        .with_max_iterations(cli.max_iterations)
        .with_tolerance(cli.error);
    cluster_options.validate()?;

    let layout_options = LayoutOptions::default()
        .with_max_exhaustive_size(cli.max_exhaustive_size)
        .with_parallel(!cli.sequential);

    let mut mesh = io::load(&cli.input)?;
    print_mesh_info(&cli.input, &mesh);

    let start = Instant::now();
    let assignment = cluster_vertices_with_progress(&mesh, &cluster_options, &create_progress())?;
    let cluster_elapsed = start.elapsed();
    print_cluster_report(&mesh, &assignment);
    println!("Clustering time: {:.2?}", cluster_elapsed);

    match cli.mode {
        0 => {
            mesh.set_colors(cluster_colors(&assignment))?;
        }
        _ => {
            let mode = if cli.sequential { "sequential" } else { "parallel" };
            println!(
                "Optimizing layout (exhaustive up to {} vertices, {})...",
                cli.max_exhaustive_size, mode
            );
            let start = Instant::now();
            let layout = optimize_layout_with_progress(
                mesh.faces(),
                &assignment,
                &layout_options,
                &create_progress(),
            );
            mesh.rearrange_vertices(&layout.old_to_new())?;
            println!("Layout time: {:.2?}", start.elapsed());
        }
    }

    io::save(&mesh, &cli.output)?;
    println!("Saved: {} ({:.2?} total)", cli.output.display(), start.elapsed());

    Ok(())
}

fn print_mesh_info(path: &Path, mesh: &TriangleMesh) {
    println!("File: {}", path.display());
    println!("Vertices: {}", mesh.num_vertices());
    println!("Faces: {}", mesh.num_faces());
    if let Some((min, max)) = mesh.bounding_box() {
        println!(
            "Bounding box: ({:.3}, {:.3}, {:.3}) to ({:.3}, {:.3}, {:.3})",
            min.x, min.y, min.z, max.x, max.y, max.z
        );
    }
}

fn print_cluster_report(mesh: &TriangleMesh, assignment: &ClusterAssignment) {
    let stats = assignment.stats();
    println!("Clusters: {}", stats.num_clusters);
    println!(
        "Cluster size: min={}, max={}, avg={:.2}",
        stats.min_size, stats.max_size, stats.mean_size
    );

    let unsplittable = assignment
        .leaves()
        .iter()
        .filter(|leaf| matches!(leaf.reason, LeafReason::Unsplittable(_)))
        .count();
    if unsplittable > 0 {
        println!("Unsplittable clusters: {}", unsplittable);
    }

    // Components of the graph with inter-cluster edges removed.
    let ids = assignment.cluster_ids();
    let mut edges = EdgeSet::from_faces(mesh.faces());
    edges.retain(|a, b| ids[a] == ids[b]);
    let all: Vec<usize> = (0..mesh.num_vertices()).collect();

    let mut components_per_cluster = vec![0usize; stats.num_clusters];
    for component in connected_components(&edges, &all) {
        components_per_cluster[ids[component[0]]] += 1;
    }
    let disconnected = components_per_cluster.iter().filter(|&&c| c > 1).count();
    println!("Disconnected clusters: {}", disconnected);
}

/// Create a progress reporter that displays a progress bar on the terminal.
fn create_progress() -> Progress {
    let max_percent = AtomicUsize::new(0);

    Progress::new(move |current, total, message| {
        if total == 0 {
            return;
        }

        let raw_percent = if current >= total {
            100
        } else {
            ((current * 100) + (total / 2)) / total
        };

        // Monotonic: parallel workers may report out of order.
        let previous = max_percent.fetch_max(raw_percent, Ordering::Relaxed);
        if raw_percent <= previous {
            return;
        }

        let bar_width = 30;
        let filled = (raw_percent * bar_width) / 100;
        let bar = "=".repeat(filled);
        let space = " ".repeat(bar_width - filled);

        eprint!("\r[{}{}] {:3}% {}", bar, space, raw_percent, message);
        let _ = std::io::stderr().flush();

        if raw_percent == 100 {
            eprintln!();
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["mesh-layout", "--in", "bunny.ply"]).unwrap();
        assert_eq!(cli.input, PathBuf::from("bunny.ply"));
        assert_eq!(cli.output, PathBuf::from("out.ply"));
        assert_eq!(cli.mode, 1);
        assert_eq!(cli.max_iterations, 100_000);
        assert_eq!(cli.max_depth, 10);
        assert_eq!(cli.max_cluster_size, 100);
        assert_eq!(cli.max_spectral_size, 10_000);
        assert!(!cli.sequential);
    }

    #[test]
    fn test_underscore_aliases() {
        let cli = Cli::try_parse_from([
            "mesh-layout",
            "--in",
            "bunny.ply",
            "--max_iterations",
            "50",
            "--max_deph",
            "4",
            "--max_cluster_size",
            "20",
            "--max_spectral_size",
            "300",
        ])
        .unwrap();
        assert_eq!(cli.max_iterations, 50);
        assert_eq!(cli.max_depth, 4);
        assert_eq!(cli.max_cluster_size, 20);
        assert_eq!(cli.max_spectral_size, 300);
    }

    #[test]
    fn test_rejects_bad_mode_and_missing_input() {
        assert!(Cli::try_parse_from(["mesh-layout", "--in", "a.ply", "--mode", "2"]).is_err());
        assert!(Cli::try_parse_from(["mesh-layout"]).is_err());
    }
}
