use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use log::error;
use mapgps::commands::{self, flush_notices};
use mapgps::{
    export_session, load_config, open_document, EditorSession, ExportTarget, HeadlessSurface,
    LatLng, Result,
};

/// Inspect and edit GPS route and spot annotations in GeoJSON files
#[derive(Parser, Debug)]
#[command(name = "mapgps", version, about)]
struct Cli {
    /// Editor configuration file (JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct OutputArgs {
    /// Write to this file
    #[arg(long, short, conflicts_with = "out_dir")]
    output: Option<PathBuf>,

    /// Write an auto-named export into this directory
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,
}

impl OutputArgs {
    fn target(&self) -> ExportTarget {
        match &self.output {
            Some(path) => ExportTarget::File(path.clone()),
            None => ExportTarget::Directory(self.out_dir.clone()),
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print point, route and spot counts
    Stats {
        input: PathBuf,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// List routes, optionally filtered by endpoint prefix and endpoint id
    Routes {
        input: PathBuf,
        /// First character of either endpoint id
        #[arg(long)]
        prefix: Option<char>,
        /// Id of either endpoint
        #[arg(long)]
        end: Option<String>,
    },
    /// List named spots
    Spots { input: PathBuf },
    /// Renumber a route's waypoints by proximity
    Optimize {
        input: PathBuf,
        route_id: String,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Remove every waypoint of a route
    ClearRoute {
        input: PathBuf,
        route_id: String,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Add a spot at a position
    AddSpot {
        input: PathBuf,
        #[arg(allow_negative_numbers = true)]
        lat: f64,
        #[arg(allow_negative_numbers = true)]
        lng: f64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Rename a spot
    RenameSpot {
        input: PathBuf,
        name: String,
        new_name: String,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Delete a spot by name
    DeleteSpot {
        input: PathBuf,
        name: String,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Re-export a document with a dated file name
    Export {
        input: PathBuf,
        #[command(flatten)]
        output: OutputArgs,
    },
}

fn open(input: &Path, config: Option<&Path>) -> Result<EditorSession<HeadlessSurface>> {
    let mut session = open_document(input, load_config(config)?)?;
    flush_notices(&mut session);
    Ok(session)
}

fn save(session: &mut EditorSession<HeadlessSurface>, output: &OutputArgs) -> Result<()> {
    let path = export_session(session, &output.target())?;
    flush_notices(session);
    println!("{}", path.display());
    Ok(())
}

fn run(cli: Cli) -> Result<()> {
    let config = cli.config.as_deref();
    match cli.command {
        Command::Stats { input, json } => {
            let session = open(&input, config)?;
            let report = commands::stats_report(&session);
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("Points: {}", report.stats.point_count);
                println!("Routes: {}", report.stats.route_count);
                println!("Spots:  {}", report.stats.spot_count);
                if let Some([south, west, north, east]) = report.bounds {
                    println!("Bounds: {:.6},{:.6} - {:.6},{:.6}", south, west, north, east);
                }
            }
        }
        Command::Routes { input, prefix, end } => {
            let session = open(&input, config)?;
            for option in session.route_options(prefix, end.as_deref()) {
                println!("{}\t{}\t{}", option.route_id, option.label, option.waypoint_count);
            }
        }
        Command::Spots { input } => {
            let session = open(&input, config)?;
            let Some(store) = session.store() else {
                return Ok(());
            };
            for spot in session.spots().spots() {
                let category = store
                    .get(spot.feature)
                    .and_then(|f| f.category())
                    .unwrap_or("");
                println!("{}\t{}", spot.name, category);
            }
        }
        Command::Optimize {
            input,
            route_id,
            output,
        } => {
            let mut session = open(&input, config)?;
            commands::optimize(&mut session, &route_id)?;
            save(&mut session, &output)?;
        }
        Command::ClearRoute {
            input,
            route_id,
            output,
        } => {
            let mut session = open(&input, config)?;
            commands::clear_route(&mut session, &route_id)?;
            save(&mut session, &output)?;
        }
        Command::AddSpot {
            input,
            lat,
            lng,
            name,
            category,
            output,
        } => {
            let mut session = open(&input, config)?;
            commands::add_spot(
                &mut session,
                LatLng::new(lat, lng),
                name.as_deref(),
                category.as_deref(),
            )?;
            save(&mut session, &output)?;
        }
        Command::RenameSpot {
            input,
            name,
            new_name,
            output,
        } => {
            let mut session = open(&input, config)?;
            commands::rename_spot(&mut session, &name, &new_name)?;
            save(&mut session, &output)?;
        }
        Command::DeleteSpot {
            input,
            name,
            output,
        } => {
            let mut session = open(&input, config)?;
            commands::delete_spot(&mut session, &name)?;
            save(&mut session, &output)?;
        }
        Command::Export { input, output } => {
            let mut session = open(&input, config)?;
            save(&mut session, &output)?;
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    mapgps::init_logging();
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
