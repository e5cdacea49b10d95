#![deny(missing_docs)]
#![doc = include_str!("../README.md")]

#[macro_use]
mod typed_vec;

#[cfg(any(test, feature = "arbitrary"))]
pub mod arbitrary;
pub mod buildings;
pub mod collision;
mod config;
mod generator;
mod geom;
pub mod network;
pub mod population;
pub mod quadtree;
mod queue;
mod revision;
pub mod rng;
mod segment;

#[cfg(feature = "generators")]
pub mod generators;

use rand::Rng;

pub use buildings::{Building, BuildingIdx, BuildingKind, BuildingVec, Buildings};
pub use collision::{Collider, Collision, Shape, ShapeKind};
pub use config::{BuildingConfig, Config};
pub use generator::{Generation, GenerationStats, Generator};
pub use geom::{
    distance_to_line, intersect_segments, min_degree_difference, Aabb, Intersection, LineDistance, Point, Projection,
};
pub use network::RoadNetwork;
pub use population::{Heatmap, PopulationDensity};
pub use quadtree::{Entry, Owner, QuadTree, QuadTreeParams};
pub use revision::Revision;
pub use rng::GenRng;
pub use segment::{End, Links, SegIdx, Segment, SegmentVec};

/// Something went wrong while growing or querying a network.
///
/// Apart from configuration errors, these all mean that the link bookkeeping
/// is broken; none of them are caused by degenerate geometry.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum Error {
    /// A segment has no links at all, so there's no telling which of its
    /// ends faces the root.
    #[error("segment {0:?} has no links")]
    Unlinked(SegIdx),
    /// A segment was expected to be linked to a neighbor, but isn't.
    #[error("segment {segment:?} is not linked to {neighbor:?}")]
    MissingLink {
        /// The segment whose links were searched.
        segment: SegIdx,
        /// The neighbor that wasn't found.
        neighbor: SegIdx,
    },
    /// There's no collision test for this pair of shapes.
    #[error("can't collide a {0} with a {1}")]
    UnsupportedCollision(ShapeKind, ShapeKind),
    /// The configuration doesn't make sense.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// A `Result` defaulting to this crate's [`Error`].
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Grows a road network from a seed, using the default [`Heatmap`] for
/// population.
///
/// The same seed and configuration always give the same network.
pub fn generate(seed: u64, config: &Config) -> Result<Generation<Heatmap>> {
    let mut rng = rng::seeded(seed);
    let heatmap = Heatmap::new(rng.gen());
    Generator::new(config.clone(), heatmap, rng)?.run()
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn small() -> Config {
        Config {
            segment_count_limit: 150,
            ..Config::default()
        }
    }

    #[test]
    fn generation_is_deterministic() {
        let a = generate(5, &small()).unwrap();
        let b = generate(5, &small()).unwrap();
        let ends = |g: &Generation<Heatmap>| -> Vec<(Point, Point)> {
            g.network.segments().values().map(|s| (s.start(), s.end())).collect()
        };
        assert_eq!(ends(&a), ends(&b));
        assert_eq!(a.stats, b.stats);
    }

    #[test]
    fn bad_config_is_reported() {
        let config = Config {
            default_segment_length: -1.0,
            ..Config::default()
        };
        assert_matches!(generate(0, &config), Err(Error::InvalidConfig(_)));
    }

    #[test]
    fn error_messages() {
        let e = Error::MissingLink {
            segment: SegIdx(3),
            neighbor: SegIdx(8),
        };
        assert_eq!(e.to_string(), "segment s_3 is not linked to s_8");
        assert_eq!(
            Error::UnsupportedCollision(ShapeKind::Circle, ShapeKind::Circle).to_string(),
            "can't collide a circle with a circle"
        );
    }
}
