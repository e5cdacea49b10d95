//! Road segments: endpoints, cached derived geometry, and adjacency lists.

use crate::{
    collision::{Collider, Shape, ShapeUpdate},
    geom::{Aabb, Point},
    quadtree::Owner,
    revision::{Cached, Revision},
};

typed_vec!(
    /// A vector of segments, indexed by [`SegIdx`].
    SegmentVec,
    /// A handle to a committed segment.
    SegIdx,
    "s"
);

/// One of the two physical ends of a segment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum End {
    /// The segment's `start` point.
    Start,
    /// The segment's `end` point.
    End,
}

/// The neighbors of a segment, split by which end they attach to.
///
/// "Backward" is the end nearer to where growth came from. That's usually the
/// start, but the lists don't record which physical end they belong to; see
/// [`RoadNetwork::start_is_backwards`](crate::RoadNetwork::start_is_backwards).
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Links {
    /// Neighbors at the backward end.
    pub backward: Vec<SegIdx>,
    /// Neighbors at the forward end.
    pub forward: Vec<SegIdx>,
}

impl Links {
    /// Total number of neighbor references.
    pub fn len(&self) -> usize {
        self.backward.len() + self.forward.len()
    }

    /// Are there no links at all?
    pub fn is_empty(&self) -> bool {
        self.backward.is_empty() && self.forward.is_empty()
    }

    /// Does either list mention `seg`?
    pub fn contains(&self, seg: SegIdx) -> bool {
        self.backward.contains(&seg) || self.forward.contains(&seg)
    }

    /// The list that mentions `seg`, searching the backward list first.
    pub fn list_containing(&self, seg: SegIdx) -> Option<&Vec<SegIdx>> {
        if self.backward.contains(&seg) {
            Some(&self.backward)
        } else if self.forward.contains(&seg) {
            Some(&self.forward)
        } else {
            None
        }
    }

    /// Mutable version of [`Links::list_containing`].
    pub fn list_containing_mut(&mut self, seg: SegIdx) -> Option<&mut Vec<SegIdx>> {
        if self.backward.contains(&seg) {
            Some(&mut self.backward)
        } else if self.forward.contains(&seg) {
            Some(&mut self.forward)
        } else {
            None
        }
    }
}

/// A straight piece of road.
///
/// The endpoints can only be changed through [`Segment::set_start`] and
/// [`Segment::set_end`], which keep the collider and the cached direction and
/// length in sync.
#[derive(Clone, Debug)]
pub struct Segment {
    start: Point,
    end: Point,
    width: f64,
    highway: bool,
    severed: bool,
    t: f64,
    revision: Revision,
    dir: Cached<f64>,
    length: Cached<f64>,
    collider: Collider,
    pub(crate) links: Links,
}

impl Segment {
    /// Creates an unlinked segment between two points.
    ///
    /// `t` is the segment's scheduling time: segments with smaller `t` are
    /// evaluated first.
    pub fn new(start: Point, end: Point, t: f64, highway: bool, width: f64) -> Self {
        Segment {
            start,
            end,
            width,
            highway,
            severed: false,
            t,
            revision: Revision::default(),
            dir: Cached::new(),
            length: Cached::new(),
            collider: Collider::new(None, Shape::Line { start, end, width }),
            links: Links::default(),
        }
    }

    /// Creates a segment starting at `start`, heading in direction `dir`
    /// (degrees clockwise from the positive `y` axis).
    pub fn using_direction(
        start: Point,
        dir: f64,
        length: f64,
        t: f64,
        highway: bool,
        width: f64,
    ) -> Self {
        Segment::new(start, start.along_heading(dir, length), t, highway, width)
    }

    /// A copy of this segment's geometry and flags, with no links and no owner.
    pub fn twin(&self) -> Self {
        let mut twin = Segment::new(self.start, self.end, self.t, self.highway, self.width);
        twin.severed = self.severed;
        twin
    }

    /// The start point.
    pub fn start(&self) -> Point {
        self.start
    }

    /// The end point.
    pub fn end(&self) -> Point {
        self.end
    }

    /// The point at one of the two ends.
    pub fn point_at(&self, end: End) -> Point {
        match end {
            End::Start => self.start,
            End::End => self.end,
        }
    }

    /// The midpoint.
    pub fn midpoint(&self) -> Point {
        (self.start + self.end) * 0.5
    }

    /// The road width.
    pub fn width(&self) -> f64 {
        self.width
    }

    /// Is this a highway?
    pub fn highway(&self) -> bool {
        self.highway
    }

    /// Was this segment cut short by an intersection or a snap?
    pub fn severed(&self) -> bool {
        self.severed
    }

    /// The scheduling time.
    pub fn t(&self) -> f64 {
        self.t
    }

    /// The neighbor lists.
    pub fn links(&self) -> &Links {
        &self.links
    }

    /// The thick-line collider covering this segment.
    pub fn collider(&self) -> &Collider {
        &self.collider
    }

    /// The bounding box of the collider.
    pub fn limits(&self) -> Aabb {
        self.collider.limits()
    }

    /// The number of endpoint changes so far.
    pub fn revision(&self) -> Revision {
        self.revision
    }

    /// The heading from start to end, in degrees clockwise from the positive
    /// `y` axis, in `[-180, 180]`.
    pub fn dir(&self) -> f64 {
        self.dir.get_or_compute(self.revision, || {
            let up = Point::new(0.0, 1.0);
            let v = self.end - self.start;
            -up.cross(v).signum() * up.angle_between(v)
        })
    }

    /// The distance from start to end.
    pub fn length(&self) -> f64 {
        self.length
            .get_or_compute(self.revision, || self.start.distance(self.end))
    }

    /// Moves the start point.
    pub fn set_start(&mut self, start: Point) {
        self.start = start;
        self.revision.bump();
        self.collider.update(ShapeUpdate {
            start: Some(start),
            ..Default::default()
        });
    }

    /// Moves the end point.
    pub fn set_end(&mut self, end: Point) {
        self.end = end;
        self.revision.bump();
        self.collider.update(ShapeUpdate {
            end: Some(end),
            ..Default::default()
        });
    }

    pub(crate) fn set_severed(&mut self) {
        self.severed = true;
    }

    pub(crate) fn set_owner(&mut self, idx: SegIdx) {
        self.collider.set_owner(Owner::Segment(idx));
    }
}
