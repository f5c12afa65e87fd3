//! # ozimap CLI
//!
//! Command-line interface for the ozimap library: renders a region from a
//! static map provider into an image plus an OziExplorer `.map` file.

use std::path::PathBuf;

use clap::{ArgAction, Parser};
use log::error;
use ozimap::{
    BuildOptions, MapConfig, MapPlan, MapType, OverwriteBehavior, Result, SourceConfig,
};

mod cli;

/// Command-line interface for ozimap
#[derive(Parser)]
#[command(name = "ozimap")]
#[command(about = "Create OziExplorer maps from static map images")]
#[command(long_about = "Renders a region into one image and a calibrated OziExplorer .map file:
  ozimap -c 55.93,37.76 -z 12 -w 1000 -h 1000 moscow.map
  ozimap -n 56.0,38.0 -s 55.5,37.0 -w 2000 -h 2000 area.map area.png
  ozimap -u 800,600,'http://maps.google.com/maps?ll=55.94,37.78&z=13' view.map

The region needs a size (corners, -p, -x, -u, or -z with -w/-h), a zoom
(-z, or -w and -h to pick one) and a center (-c, -u, or a corner).

File Overwrite Behavior:
  By default, you'll be prompted if an output file exists
  --force                          # Overwrite without asking
  --no-clobber                     # Never overwrite, fail if a file exists")]
#[command(version = env!("OZIMAP_VERSION"))]
#[command(disable_help_flag = true)]
struct Cli {
    /// Calibration file to create
    map_file: PathBuf,

    /// Image file to create (default: map file name with the image type's extension)
    image_file: Option<PathBuf>,

    #[command(flatten)]
    image: cli::ImageArgs,

    #[command(flatten)]
    region: cli::RegionArgs,

    /// Two-letter language code for map labels
    #[arg(short = 'l', long)]
    language: Option<String>,

    /// Map type: roadmap, mobile, satellite, terrain, hybrid, mapmaker-roadmap or mapmaker-hybrid
    #[arg(short = 'm', long = "map-type", default_value = "roadmap")]
    map_type: MapType,

    /// Static map API key
    #[arg(long, env = "OZIMAP_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Static map endpoint
    #[arg(long, value_name = "URL", default_value = "http://maps.google.com/staticmap")]
    base_url: String,

    /// Calibration template with %NAME% placeholders (default: built-in)
    #[arg(long, value_name = "PATH")]
    template: Option<PathBuf>,

    /// Text for the map's copyright line
    #[arg(long, default_value = ozimap::DEFAULT_COPYRIGHT)]
    copyright: String,

    /// Don't download anything, create a blank image
    #[arg(long)]
    no_download: bool,

    /// Maximum concurrent tile requests
    #[arg(long, default_value_t = 8, value_parser = clap::value_parser!(u32).range(1..=64))]
    connections: u32,

    /// Show the resolved region and tile requests without downloading or writing
    #[arg(long)]
    dry_run: bool,

    /// Print the dry-run plan as JSON on stdout
    #[arg(long, requires = "dry_run")]
    json: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Force overwrite existing files without prompting
    #[arg(short, long, conflicts_with = "no_clobber")]
    force: bool,

    /// Never overwrite existing files (fail if a destination exists)
    #[arg(long)]
    no_clobber: bool,

    /// Print help
    #[arg(short = '?', long, action = ArgAction::Help)]
    help: Option<bool>,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("❌ Error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging to stderr, RUST_LOG takes precedence
    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .target(env_logger::Target::Stderr)
        .init();

    if cli.verbose {
        eprintln!("🗺️  ozimap v{} starting...", env!("OZIMAP_VERSION"));
    }

    let config = map_config(&cli)?;

    if cli.dry_run {
        let plan = ozimap::plan(&config)?;
        if cli.json {
            let json = serde_json::to_string_pretty(&plan)
                .map_err(|e| ozimap::Error::InvalidInput(format!("cannot serialize plan: {e}")))?;
            println!("{json}");
        } else {
            print_plan(&plan);
        }
        return Ok(());
    }

    eprintln!("📁 Saving to: {} and {}", config.map_path.display(), config.image_path.display());

    let progress_manager = (!cli.no_download)
        .then(|| cli::ProgressManager::new(&format!("🌐 Fetching {} tiles", config.source.map_type)));

    let options = BuildOptions {
        download: !cli.no_download,
        max_connections: cli.connections as usize,
        overwrite: overwrite_behavior(&cli),
        progress: progress_manager.as_ref().map(|manager| manager.callback()),
    };

    let result = ozimap::build_map(&config, options).await;
    if let Some(manager) = &progress_manager {
        match &result {
            Ok(_) => manager.finish(),
            Err(_) => manager.abandon(),
        }
    }

    let summary = result?;
    eprintln!(
        "✅ Created {} ({} px, zoom {}, {} tiles)",
        summary.map_path.display(),
        summary.region.image_size,
        summary.region.zoom,
        summary.tile_count
    );
    Ok(())
}

/// Determine overwrite behavior from CLI flags
fn overwrite_behavior(cli: &Cli) -> OverwriteBehavior {
    if cli.force {
        OverwriteBehavior::Force
    } else if cli.no_clobber {
        OverwriteBehavior::NeverOverwrite
    } else {
        OverwriteBehavior::Prompt
    }
}

/// Assemble the immutable build configuration from the parsed arguments
fn map_config(cli: &Cli) -> Result<MapConfig> {
    let region = cli.region.to_input(&cli.image)?;

    let source = SourceConfig {
        base_url: cli.base_url.clone(),
        api_key: cli.api_key.clone(),
        map_type: cli.map_type,
        language: cli.language.clone().or(region.language),
        format: cli.image.format,
    };

    let mut config = MapConfig::new(&cli.map_file, region.spec, source)
        .with_copyright(cli.copyright.clone())
        .with_template(cli.template.clone());
    if let Some(image_file) = &cli.image_file {
        config = config.with_image_path(image_file);
    }
    Ok(config)
}

fn print_plan(plan: &MapPlan) {
    println!("🔍 [DRY RUN] Would create {} and {}", plan.map_path.display(), plan.image_path.display());
    println!(
        "Region: zoom {}, {}x{} px, {:.2} m/px",
        plan.zoom, plan.image_width, plan.image_height, plan.meters_per_pixel
    );
    println!("  center      {:.6},{:.6}", plan.center.lat, plan.center.lon);
    println!("  north-west  {:.6},{:.6}", plan.north_west.lat, plan.north_west.lon);
    println!("  south-east  {:.6},{:.6}", plan.south_east.lat, plan.south_east.lon);
    println!("Tiles: {}", plan.tiles.len());
    for tile in &plan.tiles {
        println!(
            "  [{},{}] at {},{} {}x{}: {}",
            tile.row, tile.column, tile.x, tile.y, tile.width, tile.height, tile.url
        );
    }
}
