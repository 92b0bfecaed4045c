//! Canopy CLI - urban tree-planting site analysis

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use canopy_algorithms::exclusion::{build_exclusion_zone, ExclusionInputs};
use canopy_algorithms::grid::generate_candidates;
use canopy_algorithms::heat::{
    build_multifactor_heat, classify_ndvi, mask_to_area, mosaic, ndvi, resample_bilinear,
};
use canopy_algorithms::plantable::extract_plantable_area;
use canopy_algorithms::rescore::{rescale_heat_scores, rescore, top_n};
use canopy_algorithms::scoring::{Scorer, ScoringLayers};
use canopy_core::config::PlannerConfig;
use canopy_core::io::{
    read_area, read_buildings, read_candidates, read_fire_routes, read_geotiff, read_land_use,
    read_trees, write_area, write_candidate_table, write_candidates, write_geotiff,
};
use canopy_core::vector::{Building, FireRoute, LandUseZone, TreeRecord};
use canopy_core::Raster;

// ─── CLI structure ──────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "canopy")]
#[command(author, version, about = "Urban tree-planting site analysis", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Pipeline configuration file (JSON); defaults apply when omitted
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the combined exclusion zone from the input layers
    Exclusion {
        /// Building footprints (GeoJSON)
        #[arg(long)]
        buildings: Option<PathBuf>,
        /// Land-use zones, source of roads and water (GeoJSON)
        #[arg(long)]
        land_use: Option<PathBuf>,
        /// Fire-brigade access routes (GeoJSON)
        #[arg(long)]
        fire_routes: Option<PathBuf>,
        /// Municipal tree register (GeoJSON points)
        #[arg(long)]
        trees: Option<PathBuf>,
        /// Output exclusion zone (GeoJSON)
        output: PathBuf,
    },
    /// Extract the plantable area: green space minus the exclusion zone
    Plantable {
        /// Land-use zones (GeoJSON)
        #[arg(long)]
        land_use: PathBuf,
        /// Exclusion zone artifact (GeoJSON)
        #[arg(long)]
        exclusion: PathBuf,
        /// Output plantable area (GeoJSON)
        output: PathBuf,
    },
    /// Heat raster construction
    Heat {
        #[command(subcommand)]
        model: HeatCommands,
    },
    /// Generate the candidate lattice over the plantable area
    Candidates {
        /// Plantable area artifact (GeoJSON)
        #[arg(long)]
        plantable: PathBuf,
        /// Lattice spacing in meters (config value when omitted)
        #[arg(long)]
        spacing: Option<f64>,
        /// Output candidate points (GeoJSON)
        output: PathBuf,
    },
    /// Score and rank candidates
    Score {
        /// Candidate points artifact (GeoJSON)
        #[arg(long)]
        candidates: PathBuf,
        /// Heat raster (GeoTIFF)
        #[arg(long)]
        heat: Option<PathBuf>,
        /// Building footprints (GeoJSON)
        #[arg(long)]
        buildings: Option<PathBuf>,
        /// Tree register (GeoJSON points)
        #[arg(long)]
        trees: Option<PathBuf>,
        /// Land-use zones (GeoJSON)
        #[arg(long)]
        land_use: Option<PathBuf>,
        /// Green-space polygons for the available-space sub-score (GeoJSON)
        #[arg(long)]
        green_spaces: Option<PathBuf>,
        /// Output scored candidates (GeoJSON)
        output: PathBuf,
        /// Also export the ranking as CSV
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    /// Swap the heat raster under existing scores and re-rank
    Rescore {
        /// Scored candidates artifact (GeoJSON)
        #[arg(long)]
        candidates: PathBuf,
        /// Replacement heat raster (GeoTIFF)
        #[arg(long)]
        heat: PathBuf,
        /// Output rescored candidates (GeoJSON)
        output: PathBuf,
    },
    /// Stretch heat sub-scores to the full 0-100 range and re-rank
    Rescale {
        /// Scored candidates artifact (GeoJSON)
        #[arg(long)]
        candidates: PathBuf,
        /// Output rescaled candidates (GeoJSON)
        output: PathBuf,
    },
    /// Keep only the top-ranked candidates
    Top {
        /// Scored candidates artifact (GeoJSON)
        #[arg(long)]
        candidates: PathBuf,
        /// How many to keep (config value when omitted)
        #[arg(short, long)]
        n: Option<usize>,
        /// Output (GeoJSON)
        output: PathBuf,
    },
    /// Show information about a raster file
    Info {
        /// Input raster file
        input: PathBuf,
    },
}

#[derive(Subcommand)]
enum HeatCommands {
    /// Banded heat raster from NDVI (NIR and red bands)
    Ndvi {
        /// NIR band file (GeoTIFF), repeatable for tiled imagery
        #[arg(long, required = true)]
        nir: Vec<PathBuf>,
        /// Red band file (GeoTIFF), repeatable for tiled imagery
        #[arg(long, required = true)]
        red: Vec<PathBuf>,
        /// Clip to this boundary (GeoJSON), outside becomes nodata
        #[arg(long)]
        boundary: Option<PathBuf>,
        /// Output heat raster (GeoTIFF)
        output: PathBuf,
    },
    /// Continuous multi-factor heat raster
    Multifactor {
        /// Building footprints (GeoJSON)
        #[arg(long)]
        buildings: PathBuf,
        /// Land-use zones (GeoJSON)
        #[arg(long)]
        land_use: PathBuf,
        /// Banded NDVI heat raster, the vegetation-deficit factor (GeoTIFF)
        #[arg(long)]
        vegetation: PathBuf,
        /// Reference raster defining the output grid (GeoTIFF)
        #[arg(long)]
        reference: PathBuf,
        /// Output heat raster (GeoTIFF)
        output: PathBuf,
    },
    /// Resample a heat raster onto another raster's grid
    Resample {
        /// Input raster (GeoTIFF)
        input: PathBuf,
        /// Reference raster defining the target grid (GeoTIFF)
        #[arg(long)]
        reference: PathBuf,
        /// Output raster (GeoTIFF)
        output: PathBuf,
    },
}

// ─── Helpers ────────────────────────────────────────────────────────────

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");
}

fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap(),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

fn load_config(path: Option<&PathBuf>) -> Result<PlannerConfig> {
    match path {
        Some(p) => {
            let config = PlannerConfig::from_json_file(p)
                .with_context(|| format!("Failed to load config from {}", p.display()))?;
            info!("Config: {}", p.display());
            Ok(config)
        }
        None => Ok(PlannerConfig::default()),
    }
}

fn read_raster(path: &PathBuf) -> Result<Raster<f64>> {
    let pb = spinner("Reading raster...");
    let raster: Raster<f64> = read_geotiff(path)
        .with_context(|| format!("Failed to read raster {}", path.display()))?;
    pb.finish_and_clear();
    info!("Input: {} x {}", raster.cols(), raster.rows());
    Ok(raster)
}

fn write_raster(raster: &Raster<f64>, path: &PathBuf) -> Result<()> {
    let pb = spinner("Writing output...");
    write_geotiff(raster, path)
        .with_context(|| format!("Failed to write raster {}", path.display()))?;
    pb.finish_and_clear();
    Ok(())
}

fn load_buildings(path: Option<&PathBuf>) -> Result<Option<Vec<Building>>> {
    path.map(|p| {
        read_buildings(p).with_context(|| format!("Failed to read buildings {}", p.display()))
    })
    .transpose()
}

fn load_land_use(path: Option<&PathBuf>) -> Result<Option<Vec<LandUseZone>>> {
    path.map(|p| {
        read_land_use(p).with_context(|| format!("Failed to read land use {}", p.display()))
    })
    .transpose()
}

fn load_trees(path: Option<&PathBuf>) -> Result<Option<Vec<TreeRecord>>> {
    path.map(|p| read_trees(p).with_context(|| format!("Failed to read trees {}", p.display())))
        .transpose()
}

fn load_fire_routes(path: Option<&PathBuf>) -> Result<Option<Vec<FireRoute>>> {
    path.map(|p| {
        read_fire_routes(p).with_context(|| format!("Failed to read fire routes {}", p.display()))
    })
    .transpose()
}

fn done(name: &str, path: &PathBuf, elapsed: std::time::Duration) {
    println!("{} saved to: {}", name, path.display());
    println!("  Processing time: {:.2?}", elapsed);
}

// ─── Main ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);
    let config = load_config(cli.config.as_ref())?;

    match cli.command {
        // ── Exclusion ────────────────────────────────────────────────
        Commands::Exclusion {
            buildings,
            land_use,
            fire_routes,
            trees,
            output,
        } => {
            let buildings = load_buildings(buildings.as_ref())?;
            let land_use = load_land_use(land_use.as_ref())?;
            let fire_routes = load_fire_routes(fire_routes.as_ref())?;
            let trees = load_trees(trees.as_ref())?;

            let inputs = ExclusionInputs {
                buildings: buildings.as_deref(),
                land_use: land_use.as_deref(),
                fire_routes: fire_routes.as_deref(),
                trees: trees.as_deref(),
            };

            let start = Instant::now();
            let zone = build_exclusion_zone(&inputs, &config)
                .context("Failed to build exclusion zone")?;
            let elapsed = start.elapsed();

            write_area(&output, &zone).context("Failed to write exclusion zone")?;
            done("Exclusion zone", &output, elapsed);
        }

        // ── Plantable ────────────────────────────────────────────────
        Commands::Plantable {
            land_use,
            exclusion,
            output,
        } => {
            let land_use = read_land_use(&land_use).context("Failed to read land use")?;
            let exclusion = read_area(&exclusion).context("Failed to read exclusion zone")?;

            let start = Instant::now();
            let plantable = extract_plantable_area(&land_use, &exclusion);
            let elapsed = start.elapsed();

            write_area(&output, &plantable).context("Failed to write plantable area")?;
            done("Plantable area", &output, elapsed);
        }

        // ── Heat ─────────────────────────────────────────────────────
        Commands::Heat { model } => match model {
            HeatCommands::Ndvi {
                nir,
                red,
                boundary,
                output,
            } => {
                let nir_tiles: Vec<Raster<f64>> =
                    nir.iter().map(read_raster).collect::<Result<_>>()?;
                let red_tiles: Vec<Raster<f64>> =
                    red.iter().map(read_raster).collect::<Result<_>>()?;

                let start = Instant::now();
                let nir_band = if nir_tiles.len() == 1 {
                    nir_tiles.into_iter().next().unwrap()
                } else {
                    mosaic(&nir_tiles).context("Failed to mosaic NIR tiles")?
                };
                let red_band = if red_tiles.len() == 1 {
                    red_tiles.into_iter().next().unwrap()
                } else {
                    mosaic(&red_tiles).context("Failed to mosaic red tiles")?
                };

                let index = ndvi(&nir_band, &red_band).context("Failed to compute NDVI")?;
                let mut banded =
                    classify_ndvi(&index, &config.ndvi).context("Failed to classify NDVI")?;

                if let Some(boundary_path) = boundary {
                    let area =
                        read_area(&boundary_path).context("Failed to read boundary")?;
                    banded = mask_to_area(&banded, &area).context("Failed to mask raster")?;
                }
                let elapsed = start.elapsed();

                write_raster(&banded, &output)?;
                done("Heat raster (NDVI-banded)", &output, elapsed);
            }

            HeatCommands::Multifactor {
                buildings,
                land_use,
                vegetation,
                reference,
                output,
            } => {
                let buildings = read_buildings(&buildings).context("Failed to read buildings")?;
                let land_use = read_land_use(&land_use).context("Failed to read land use")?;
                let vegetation = read_raster(&vegetation)?;
                let reference = read_raster(&reference)?;

                let start = Instant::now();
                let heat =
                    build_multifactor_heat(&buildings, &land_use, &vegetation, &reference, &config)
                        .context("Failed to build multi-factor heat raster")?;
                let elapsed = start.elapsed();

                write_raster(&heat, &output)?;
                done("Heat raster (multi-factor)", &output, elapsed);
            }

            HeatCommands::Resample {
                input,
                reference,
                output,
            } => {
                let source = read_raster(&input)?;
                let reference = read_raster(&reference)?;

                let start = Instant::now();
                let resampled = resample_bilinear(&source, &reference)
                    .context("Failed to resample raster")?;
                let elapsed = start.elapsed();

                write_raster(&resampled, &output)?;
                done("Resampled raster", &output, elapsed);
            }
        },

        // ── Candidates ───────────────────────────────────────────────
        Commands::Candidates {
            plantable,
            spacing,
            output,
        } => {
            let plantable = read_area(&plantable).context("Failed to read plantable area")?;
            let spacing = spacing.unwrap_or(config.grid_spacing);

            let start = Instant::now();
            let candidates =
                generate_candidates(&plantable, spacing).context("Failed to generate grid")?;
            let elapsed = start.elapsed();

            write_candidates(&output, &candidates).context("Failed to write candidates")?;
            println!("Candidates: {}", candidates.len());
            done("Candidate grid", &output, elapsed);
        }

        // ── Score ────────────────────────────────────────────────────
        Commands::Score {
            candidates,
            heat,
            buildings,
            trees,
            land_use,
            green_spaces,
            output,
            csv,
        } => {
            let candidates =
                read_candidates(&candidates).context("Failed to read candidates")?;
            let heat = heat.as_ref().map(read_raster).transpose()?;
            let buildings = load_buildings(buildings.as_ref())?;
            let trees = load_trees(trees.as_ref())?;
            let land_use = load_land_use(land_use.as_ref())?;
            let green_areas = green_spaces
                .as_ref()
                .map(|p| read_area(p).context("Failed to read green spaces"))
                .transpose()?;
            let green_polygons = green_areas.as_ref().map(|mp| mp.0.as_slice());

            let layers = ScoringLayers {
                heat: heat.as_ref(),
                buildings: buildings.as_deref(),
                trees: trees.as_deref(),
                land_use: land_use.as_deref(),
                green_spaces: green_polygons,
            };

            let start = Instant::now();
            let scorer = Scorer::new(&layers, &config);
            let scored = scorer
                .score_candidates(candidates)
                .context("Failed to score candidates")?;
            let elapsed = start.elapsed();

            write_candidates(&output, &scored).context("Failed to write scored candidates")?;
            if let Some(csv_path) = csv {
                write_candidate_table(&csv_path, &scored)
                    .context("Failed to write CSV table")?;
                println!("Ranking table saved to: {}", csv_path.display());
            }
            if let Some(best) = scored.first().and_then(|c| c.final_score()) {
                println!("Top score: {:.2}", best);
            }
            done("Scored candidates", &output, elapsed);
        }

        // ── Rescore ──────────────────────────────────────────────────
        Commands::Rescore {
            candidates,
            heat,
            output,
        } => {
            let mut scored = read_candidates(&candidates).context("Failed to read candidates")?;
            let heat = read_raster(&heat)?;

            let start = Instant::now();
            rescore(&mut scored, &heat, &config.weights)
                .context("Failed to rescore candidates")?;
            let elapsed = start.elapsed();

            write_candidates(&output, &scored).context("Failed to write candidates")?;
            done("Rescored candidates", &output, elapsed);
        }

        // ── Rescale ──────────────────────────────────────────────────
        Commands::Rescale { candidates, output } => {
            let mut scored = read_candidates(&candidates).context("Failed to read candidates")?;

            let start = Instant::now();
            rescale_heat_scores(&mut scored, &config.weights)
                .context("Failed to rescale heat scores")?;
            let elapsed = start.elapsed();

            write_candidates(&output, &scored).context("Failed to write candidates")?;
            done("Rescaled candidates", &output, elapsed);
        }

        // ── Top ──────────────────────────────────────────────────────
        Commands::Top {
            candidates,
            n,
            output,
        } => {
            let scored = read_candidates(&candidates).context("Failed to read candidates")?;
            let n = n.unwrap_or(config.top_n);

            let start = Instant::now();
            let best = top_n(&scored, n);
            let elapsed = start.elapsed();

            write_candidates(&output, &best).context("Failed to write candidates")?;
            println!("Kept: {}", best.len());
            done("Top candidates", &output, elapsed);
        }

        // ── Info ─────────────────────────────────────────────────────
        Commands::Info { input } => {
            let raster = read_raster(&input)?;
            let (rows, cols) = raster.shape();
            let bounds = raster.bounds();

            println!("File: {}", input.display());
            println!("Dimensions: {} x {} ({} cells)", cols, rows, raster.len());
            println!("Cell size: {}", raster.cell_size());
            println!(
                "Bounds: ({:.3}, {:.3}) - ({:.3}, {:.3})",
                bounds.0, bounds.1, bounds.2, bounds.3
            );
            if let Some(crs) = raster.crs() {
                println!("CRS: {}", crs);
            }
            if let Some(nodata) = raster.nodata() {
                println!("NoData: {}", nodata);
            }
            if let Some(stats) = raster.statistics() {
                println!("\nStatistics:");
                println!("  Min: {:.4}", stats.min);
                println!("  Max: {:.4}", stats.max);
                println!("  Mean: {:.4}", stats.mean);
                println!(
                    "  Valid cells: {} ({:.1}%)",
                    stats.count,
                    100.0 * stats.count as f64 / raster.len() as f64
                );
            }
        }
    }

    Ok(())
}
