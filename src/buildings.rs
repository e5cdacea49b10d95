//! Scattering buildings along finished roads.
//!
//! Buildings share the road network's spatial index. A new building is
//! pushed out of whatever it overlaps a few times; if it still overlaps
//! something after that, it's dropped.

use rand::Rng;

use crate::{
    collision::{Collider, Collision, Shape, ShapeUpdate},
    config::BuildingConfig,
    geom::Point,
    network::RoadNetwork,
    quadtree::Owner,
    segment::SegIdx,
    Result,
};

typed_vec!(
    /// A vector of buildings, indexed by [`BuildingIdx`].
    BuildingVec,
    /// A handle to a placed building.
    BuildingIdx,
    "b"
);

/// What a building is for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum BuildingKind {
    /// Houses; small.
    Residential,
    /// Warehouses and the like; large.
    Import,
}

impl BuildingKind {
    /// The distance from the center of this kind of building to its corners.
    pub fn diagonal(self) -> f64 {
        match self {
            BuildingKind::Residential => 80.0,
            BuildingKind::Import => 150.0,
        }
    }

    /// A fill color for drawing.
    pub fn color(self) -> &'static str {
        match self {
            BuildingKind::Residential => "#5b8cc9",
            BuildingKind::Import => "#d98b3a",
        }
    }
}

/// A rectangular building.
#[derive(Clone, Debug)]
pub struct Building {
    center: Point,
    dir: f64,
    diagonal: f64,
    kind: BuildingKind,
    aspect_degree: f64,
    collider: Collider,
}

impl Building {
    /// Creates a building centered at `center`, rotated to the heading `dir`.
    ///
    /// The building's corners are `diagonal` away from its center, and
    /// `aspect_ratio` is the ratio of its width to its depth.
    pub fn new(center: Point, dir: f64, diagonal: f64, kind: BuildingKind, aspect_ratio: f64) -> Self {
        let aspect_degree = aspect_ratio.atan().to_degrees();
        let corners = corners(center, dir, diagonal, aspect_degree);
        Building {
            center,
            dir,
            diagonal,
            kind,
            aspect_degree,
            collider: Collider::new(None, Shape::Rect { corners }),
        }
    }

    /// A building of random kind and proportions, at the origin.
    ///
    /// Two in five are imports.
    pub fn from_probability<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let kind = if rng.gen::<f64>() < 0.4 {
            BuildingKind::Import
        } else {
            BuildingKind::Residential
        };
        let aspect_ratio = rng.gen_range(0.5..2.0);
        Building::new(Point::ZERO, 0.0, kind.diagonal(), kind, aspect_ratio)
    }

    /// The center.
    pub fn center(&self) -> Point {
        self.center
    }

    /// The heading, in degrees.
    pub fn dir(&self) -> f64 {
        self.dir
    }

    /// The kind of building.
    pub fn kind(&self) -> BuildingKind {
        self.kind
    }

    /// The corners, in order around the outline.
    pub fn corners(&self) -> [Point; 4] {
        corners(self.center, self.dir, self.diagonal, self.aspect_degree)
    }

    /// The collider.
    pub fn collider(&self) -> &Collider {
        &self.collider
    }

    /// Moves the building.
    pub fn set_center(&mut self, center: Point) {
        self.center = center;
        self.update_corners();
    }

    /// Turns the building.
    pub fn set_dir(&mut self, dir: f64) {
        self.dir = dir;
        self.update_corners();
    }

    fn update_corners(&mut self) {
        self.collider.update(ShapeUpdate {
            corners: Some(self.corners()),
            ..Default::default()
        });
    }
}

fn corners(center: Point, dir: f64, diagonal: f64, aspect: f64) -> [Point; 4] {
    [
        center.along_heading(aspect + dir, diagonal),
        center.along_heading(-aspect + dir, diagonal),
        center.along_heading(180.0 + aspect + dir, diagonal),
        center.along_heading(180.0 - aspect + dir, diagonal),
    ]
}

/// All placed buildings.
#[derive(Clone, Debug, Default)]
pub struct Buildings {
    config: BuildingConfig,
    buildings: BuildingVec<Building>,
}

impl Buildings {
    /// Creates an empty set of buildings.
    pub fn new(config: BuildingConfig) -> Self {
        Buildings {
            config,
            buildings: BuildingVec::default(),
        }
    }

    /// The building at `idx`.
    ///
    /// # Panics
    ///
    /// Panics if `idx` doesn't come from this set.
    pub fn get(&self, idx: BuildingIdx) -> &Building {
        &self.buildings[idx]
    }

    /// The number of buildings.
    pub fn len(&self) -> usize {
        self.buildings.len()
    }

    /// Are there no buildings?
    pub fn is_empty(&self) -> bool {
        self.buildings.is_empty()
    }

    /// All buildings, in placement order.
    pub fn values(&self) -> impl Iterator<Item = &Building> + '_ {
        self.buildings.values()
    }

    /// All buildings with their indices.
    pub fn iter(&self) -> impl Iterator<Item = (BuildingIdx, &Building)> + '_ {
        self.buildings.iter()
    }

    fn collider_of<'a>(&'a self, network: &'a RoadNetwork, owner: Owner) -> &'a Collider {
        match owner {
            Owner::Segment(s) => network.segment(s).collider(),
            Owner::Building(b) => self.buildings[b].collider(),
        }
    }

    /// Tries to place `count` buildings within `radius` of the middle of
    /// `seg`, lined up with it.
    ///
    /// Each building comes from `template`, and is then nudged out of any
    /// roads or buildings it overlaps (including ones placed earlier in the
    /// same call). Buildings that can't be made to fit are dropped. The ones
    /// that fit are added to the network's index, and their indices returned.
    pub fn place_around_segment<R: Rng + ?Sized>(
        &mut self,
        network: &mut RoadNetwork,
        seg: SegIdx,
        count: usize,
        radius: f64,
        mut template: impl FnMut(&mut R) -> Building,
        rng: &mut R,
    ) -> Result<Vec<BuildingIdx>> {
        let segment = network.segment(seg);
        let (midpoint, dir) = (segment.midpoint(), segment.dir());
        let mut placed: Vec<Building> = Vec::new();

        for _ in 0..count {
            let angle = rng.gen::<f64>() * 360.0;
            let distance = rng.gen::<f64>() * radius;
            let mut building = template(rng);
            building.set_center(midpoint.along_heading(angle, distance));
            building.set_dir(dir);

            let mut permitted = false;
            for pass in 0..self.config.placement_loop_limit {
                let last_pass = pass + 1 == self.config.placement_loop_limit;
                let mut collisions = 0;
                let nearby = network.index().retrieve(&building.collider().limits());
                let others = nearby
                    .iter()
                    .map(|entry| self.collider_of(network, entry.owner))
                    .chain(placed.iter().map(Building::collider));

                for other in others {
                    let Some(collision) = building.collider().collide(other)? else {
                        continue;
                    };
                    collisions += 1;
                    if last_pass {
                        break;
                    }
                    if let Collision::Displacement(d) = collision {
                        building.set_center(building.center() + d);
                    }
                }

                if collisions == 0 {
                    permitted = true;
                    break;
                }
            }

            if permitted {
                placed.push(building);
            }
        }

        let indices: Vec<_> = placed.into_iter().map(|b| self.insert(network, b)).collect();
        tracing::trace!(?seg, placed = indices.len(), "placed buildings");
        Ok(indices)
    }

    /// Adds a building exactly where it is, without checking for overlaps.
    pub fn insert(&mut self, network: &mut RoadNetwork, mut building: Building) -> BuildingIdx {
        let idx = BuildingIdx(self.buildings.len());
        building.collider.set_owner(Owner::Building(idx));
        if let Some(entry) = building.collider().entry() {
            network.index_mut().insert(entry);
        }
        self.buildings.push(building)
    }

    /// Places buildings along every `segment_stride`-th segment of the
    /// network, returning how many were placed.
    pub fn populate<R: Rng + ?Sized>(&mut self, network: &mut RoadNetwork, rng: &mut R) -> Result<usize> {
        let before = self.len();
        let (stride, count, radius) = (
            self.config.segment_stride,
            self.config.per_segment,
            self.config.placement_radius,
        );
        for i in (0..network.len()).step_by(stride.max(1)) {
            self.place_around_segment(network, SegIdx(i), count, radius, |rng| Building::from_probability(rng), rng)?;
        }
        tracing::debug!(buildings = self.len() - before, "populated network");
        Ok(self.len() - before)
    }

    /// The buildings touching the disc of radius `range` around `location`.
    pub fn in_range_of(&self, network: &RoadNetwork, location: Point, range: f64) -> Result<Vec<BuildingIdx>> {
        let probe = Collider::new(
            None,
            Shape::Circle {
                center: location,
                radius: range,
            },
        );
        let mut found = Vec::new();
        for entry in network.index().retrieve(&probe.limits()) {
            let Owner::Building(b) = entry.owner else {
                continue;
            };
            if probe.collide(self.buildings[b].collider())?.is_some() {
                found.push(b);
            }
        }
        Ok(found)
    }

    /// Like [`Buildings::in_range_of`], with the configured pickup range.
    pub fn in_pickup_range(&self, network: &RoadNetwork, location: Point) -> Result<Vec<BuildingIdx>> {
        self.in_range_of(network, location, self.config.pickup_range)
    }
}
