use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use roadgrowth::{generate, Buildings, Config};

#[derive(Parser)]
struct Args {
    /// Seed for the whole run.
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// A JSON file with configuration overrides.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Also place buildings along the roads.
    #[arg(long)]
    buildings: bool,

    #[arg(short, long, default_value = "city.svg")]
    output: PathBuf,
}

pub fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();

    let config: Config = match &args.config {
        Some(path) => {
            let input = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
            serde_json::from_str(&input)?
        }
        None => Config::default(),
    };

    let mut city = generate(args.seed, &config)?;
    println!(
        "{} segments ({} accepted, {} rejected, {} splits)",
        city.network.len(),
        city.stats.accepted,
        city.stats.rejected,
        city.stats.splits,
    );

    let buildings = if args.buildings {
        let mut buildings = Buildings::new(config.buildings.clone());
        let placed = buildings.populate(&mut city.network, &mut city.rng)?;
        println!("{placed} buildings");
        Some(buildings)
    } else {
        None
    };

    let document = city.network.dump_svg(buildings.as_ref());
    svg::save(&args.output, &document)?;
    Ok(())
}
