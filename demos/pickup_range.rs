use clap::Parser;

use roadgrowth::{generate, Buildings, Config, End, Point};

/// Grows a small town, places buildings, and lists the buildings within
/// pickup range of the far end of every highway segment.
#[derive(Parser)]
struct Args {
    #[arg(long, default_value_t = 0)]
    seed: u64,

    #[arg(long, default_value_t = 400)]
    segments: usize,

    /// Overrides the configured pickup range.
    #[arg(long)]
    range: Option<f64>,
}

pub fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let config = Config {
        segment_count_limit: args.segments,
        ..Config::default()
    };
    config.validate()?;
    let range = args.range.unwrap_or(config.buildings.pickup_range);

    let mut city = generate(args.seed, &config)?;
    let mut buildings = Buildings::new(config.buildings.clone());
    buildings.populate(&mut city.network, &mut city.rng)?;

    for (idx, seg) in city.network.segments().iter() {
        if !seg.highway() {
            continue;
        }
        let stop: Point = seg.point_at(End::End);
        let nearby = buildings.in_range_of(&city.network, stop, range)?;
        if nearby.is_empty() {
            continue;
        }
        let kinds: Vec<_> = nearby.iter().map(|&b| buildings.get(b).kind()).collect();
        println!("{idx:?} at ({:.0}, {:.0}): {kinds:?}", stop.x, stop.y);
    }
    Ok(())
}
