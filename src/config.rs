//! Tunable parameters for generation and building placement.

use crate::{quadtree::QuadTreeParams, Error};

/// Parameters for [`Generator`](crate::Generator).
///
/// Every field has a default, so a serialized config only needs to mention
/// what it changes. Angles are in degrees, lengths in world units.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Config {
    /// Length of a normal road segment.
    pub default_segment_length: f64,
    /// Length of a highway segment.
    pub highway_segment_length: f64,
    /// Width of a normal road.
    pub default_segment_width: f64,
    /// Width of a highway.
    pub highway_segment_width: f64,
    /// Jitter limit for branches turning off at right angles.
    pub branch_angle_deviation: f64,
    /// Jitter limit for the alternative heading a highway tries when going
    /// straight.
    pub straight_angle_deviation: f64,
    /// Chance of each side branch off a normal road (or a highway, for normal
    /// branches).
    pub default_branch_probability: f64,
    /// Chance of each highway side branch.
    pub highway_branch_probability: f64,
    /// Population a highway needs before it branches.
    pub highway_branch_population_threshold: f64,
    /// Population a road needs before it continues or branches into normal
    /// roads.
    pub normal_branch_population_threshold: f64,
    /// Extra scheduling delay for normal roads branching off a highway.
    pub normal_branch_time_delay_from_highway: f64,
    /// Crossings at a shallower angle than this are rejected.
    pub minimum_intersection_deviation: f64,
    /// Generation stops after this many committed segments.
    pub segment_count_limit: usize,
    /// How close a road end has to be to something to snap onto it.
    pub road_snap_distance: f64,
    /// Shape of the spatial index.
    pub quadtree: QuadTreeParams,
    /// Whether the two root segments are highways. Defaults to `true`, so
    /// growth starts out along the highways whatever the population near the
    /// origin; with `false` the roots are ordinary roads and only spread where
    /// the population map is above
    /// [`normal_branch_population_threshold`](Config::normal_branch_population_threshold).
    pub root_is_highway: bool,
    /// Building placement parameters.
    pub buildings: BuildingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            default_segment_length: 300.0,
            highway_segment_length: 400.0,
            default_segment_width: 6.0,
            highway_segment_width: 16.0,
            branch_angle_deviation: 3.0,
            straight_angle_deviation: 15.0,
            default_branch_probability: 0.4,
            highway_branch_probability: 0.05,
            highway_branch_population_threshold: 0.1,
            normal_branch_population_threshold: 0.1,
            normal_branch_time_delay_from_highway: 5.0,
            minimum_intersection_deviation: 30.0,
            segment_count_limit: 5000,
            road_snap_distance: 50.0,
            quadtree: QuadTreeParams::default(),
            root_is_highway: true,
            buildings: BuildingConfig::default(),
        }
    }
}

/// Parameters for [`Buildings`](crate::Buildings).
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct BuildingConfig {
    /// How many times a building may be pushed out of collisions before it's
    /// given up on.
    pub placement_loop_limit: usize,
    /// Only every this-many-th segment gets buildings.
    pub segment_stride: usize,
    /// Placement attempts per chosen segment.
    pub per_segment: usize,
    /// Buildings are scattered this far from the segment midpoint.
    pub placement_radius: f64,
    /// Default radius for [`Buildings::in_range_of`](crate::Buildings::in_range_of).
    pub pickup_range: f64,
}

impl Default for BuildingConfig {
    fn default() -> Self {
        BuildingConfig {
            placement_loop_limit: 3,
            segment_stride: 10,
            per_segment: 10,
            placement_radius: 400.0,
            pickup_range: 150.0,
        }
    }
}

impl Config {
    /// The segment length for a highway or a normal road.
    pub fn segment_length(&self, highway: bool) -> f64 {
        if highway {
            self.highway_segment_length
        } else {
            self.default_segment_length
        }
    }

    /// The segment width for a highway or a normal road.
    pub fn segment_width(&self, highway: bool) -> f64 {
        if highway {
            self.highway_segment_width
        } else {
            self.default_segment_width
        }
    }

    /// Checks that the parameters make sense.
    pub fn validate(&self) -> Result<(), Error> {
        let positive = [
            ("default_segment_length", self.default_segment_length),
            ("highway_segment_length", self.highway_segment_length),
            ("default_segment_width", self.default_segment_width),
            ("highway_segment_width", self.highway_segment_width),
            ("quadtree.bounds.width", self.quadtree.bounds.width),
            ("quadtree.bounds.height", self.quadtree.bounds.height),
        ];
        for (name, value) in positive {
            if value.is_nan() || value <= 0.0 {
                return Err(Error::InvalidConfig(format!("{name} must be positive, not {value}")));
            }
        }

        let probabilities = [
            ("default_branch_probability", self.default_branch_probability),
            ("highway_branch_probability", self.highway_branch_probability),
        ];
        for (name, value) in probabilities {
            if !(0.0..=1.0).contains(&value) {
                return Err(Error::InvalidConfig(format!("{name} must be in [0, 1], not {value}")));
            }
        }

        let non_negative = [
            ("branch_angle_deviation", self.branch_angle_deviation),
            ("straight_angle_deviation", self.straight_angle_deviation),
            ("minimum_intersection_deviation", self.minimum_intersection_deviation),
            ("road_snap_distance", self.road_snap_distance),
            ("normal_branch_time_delay_from_highway", self.normal_branch_time_delay_from_highway),
            ("buildings.placement_radius", self.buildings.placement_radius),
            ("buildings.pickup_range", self.buildings.pickup_range),
        ];
        for (name, value) in non_negative {
            if value.is_nan() || value < 0.0 {
                return Err(Error::InvalidConfig(format!("{name} must not be negative, not {value}")));
            }
        }

        if self.quadtree.max_objects == 0 {
            return Err(Error::InvalidConfig("quadtree.max_objects must be non-zero".to_owned()));
        }
        if self.buildings.segment_stride == 0 {
            return Err(Error::InvalidConfig("buildings.segment_stride must be non-zero".to_owned()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn defaults_are_valid() {
        Config::default().validate().unwrap();
    }

    #[test]
    fn partial_json_fills_in_defaults() {
        let config: Config = serde_json::from_str(
            r#"{ "segment_count_limit": 200, "buildings": { "per_segment": 3 } }"#,
        )
        .unwrap();
        assert_eq!(config.segment_count_limit, 200);
        assert_eq!(config.buildings.per_segment, 3);
        assert_eq!(config.buildings.placement_loop_limit, 3);
        assert_eq!(config.highway_segment_length, 400.0);
        assert_eq!(config.quadtree, QuadTreeParams::default());
    }

    #[test]
    fn rejects_nonsense() {
        let bad = Config {
            highway_branch_probability: 1.5,
            ..Config::default()
        };
        assert_matches!(bad.validate(), Err(Error::InvalidConfig(msg)) if msg.contains("highway_branch_probability"));

        let bad = Config {
            default_segment_length: f64::NAN,
            ..Config::default()
        };
        assert_matches!(bad.validate(), Err(Error::InvalidConfig(_)));

        let mut bad = Config::default();
        bad.quadtree.max_objects = 0;
        assert_matches!(bad.validate(), Err(Error::InvalidConfig(_)));
    }
}
