//! Shape-versus-shape collision tests.
//!
//! Rectangles are tested against each other with the separating axis theorem,
//! which also yields the minimum translation that pushes the first rectangle
//! out of the second. Lines are thick: before testing, a line is widened into
//! the rectangle it sweeps. Circles only ever meet rectangles (or lines), and
//! those tests answer yes or no without a direction.

use crate::{
    geom::{distance_to_line, Aabb, Point, Projection},
    quadtree::{Entry, Owner},
    revision::{Cached, Revision},
    Error,
};

/// The kind of a [`Shape`], without its data.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ShapeKind {
    /// See [`Shape::Rect`].
    Rect,
    /// See [`Shape::Line`].
    Line,
    /// See [`Shape::Circle`].
    Circle,
}

impl std::fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ShapeKind::Rect => "rect",
            ShapeKind::Line => "line",
            ShapeKind::Circle => "circle",
        };
        f.write_str(name)
    }
}

/// The geometry owned by a [`Collider`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Shape {
    /// A (possibly rotated) rectangle, with its corners in order around the
    /// boundary.
    Rect {
        /// The corners, each adjacent to the next (cyclically).
        corners: [Point; 4],
    },
    /// A thick line segment.
    Line {
        /// One end.
        start: Point,
        /// The other end.
        end: Point,
        /// The full thickness, centered on the segment.
        width: f64,
    },
    /// A disc.
    Circle {
        /// The center.
        center: Point,
        /// The radius.
        radius: f64,
    },
}

impl Shape {
    /// What kind of shape this is.
    pub fn kind(&self) -> ShapeKind {
        match self {
            Shape::Rect { .. } => ShapeKind::Rect,
            Shape::Line { .. } => ShapeKind::Line,
            Shape::Circle { .. } => ShapeKind::Circle,
        }
    }

    fn bounding_box(&self) -> Aabb {
        match *self {
            Shape::Rect { corners } => Aabb::enclosing(corners),
            Shape::Line { start, end, width } => match line_corners(start, end, width) {
                Some(corners) => Aabb::enclosing(corners),
                None => Aabb::around(start, width / 2.0),
            },
            Shape::Circle { center, radius } => Aabb::around(center, radius),
        }
    }
}

/// A partial update to a collider's shape. Fields that are `None`, or that
/// don't apply to the collider's shape, are left alone.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ShapeUpdate {
    /// New line start.
    pub start: Option<Point>,
    /// New line end.
    pub end: Option<Point>,
    /// New rectangle corners.
    pub corners: Option<[Point; 4]>,
}

/// The outcome of a positive collision test.
///
/// What a collision means depends on the shapes involved: rectangle and line
/// pairs report how to move the first shape out of the second, while pairs
/// involving a circle only report that they touch.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Collision {
    /// Translating the first shape by this vector separates it from the second
    /// along their axis of least overlap.
    Displacement(Point),
    /// The shapes touch or one encloses the other; there is no direction.
    Touching,
}

/// A shape, the handle of whatever it belongs to, and its cached bounding box.
#[derive(Clone, Debug)]
pub struct Collider {
    owner: Option<Owner>,
    shape: Shape,
    revision: Revision,
    limits: Cached<Aabb>,
}

impl Collider {
    /// Creates a new collider.
    ///
    /// Colliders without an owner (like a query region) can be collided against
    /// but have no index [`Entry`].
    pub fn new(owner: Option<Owner>, shape: Shape) -> Self {
        Collider {
            owner,
            shape,
            revision: Revision::default(),
            limits: Cached::new(),
        }
    }

    /// What this collider belongs to.
    pub fn owner(&self) -> Option<Owner> {
        self.owner
    }

    pub(crate) fn set_owner(&mut self, owner: Owner) {
        self.owner = Some(owner);
    }

    /// The current shape.
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// The number of shape updates so far.
    pub fn revision(&self) -> Revision {
        self.revision
    }

    /// Merges the supplied fields into the shape and marks the bounding box as
    /// stale.
    pub fn update(&mut self, update: ShapeUpdate) {
        match &mut self.shape {
            Shape::Line { start, end, .. } => {
                *start = update.start.unwrap_or(*start);
                *end = update.end.unwrap_or(*end);
            }
            Shape::Rect { corners } => {
                *corners = update.corners.unwrap_or(*corners);
            }
            Shape::Circle { .. } => {}
        }
        self.revision.bump();
    }

    /// The axis-aligned bounding box of the shape, recomputed only after the
    /// shape changes.
    pub fn limits(&self) -> Aabb {
        self.limits
            .get_or_compute(self.revision, || self.shape.bounding_box())
    }

    /// The spatial index entry for this collider, if it has an owner.
    pub fn entry(&self) -> Option<Entry> {
        self.owner.map(|owner| Entry {
            bounds: self.limits(),
            owner,
        })
    }

    /// Tests this collider against another one.
    ///
    /// Returns `Ok(None)` when the shapes don't touch, including when one of
    /// them is a zero-length line. Two circles can't be tested against each
    /// other, and that pairing is an error rather than a silent miss.
    pub fn collide(&self, other: &Collider) -> Result<Option<Collision>, Error> {
        let pair = (self.shape.kind(), other.shape.kind());
        if pair == (ShapeKind::Circle, ShapeKind::Circle) {
            return Err(Error::UnsupportedCollision(pair.0, pair.1));
        }

        let a = self.limits();
        let b = other.limits();
        if a.max_x() < b.x || b.max_x() < a.x || a.max_y() < b.y || b.max_y() < a.y {
            return Ok(None);
        }

        let collision = match (self.shape, other.shape) {
            (Shape::Circle { center, radius }, rect) | (rect, Shape::Circle { center, radius }) => {
                let Some(corners) = as_rect(&rect) else {
                    return Ok(None);
                };
                rect_circle(&corners, center, radius).then_some(Collision::Touching)
            }
            (a, b) => {
                let (Some(a), Some(b)) = (as_rect(&a), as_rect(&b)) else {
                    return Ok(None);
                };
                rect_rect(&a, &b).map(Collision::Displacement)
            }
        };
        Ok(collision)
    }
}

/// The corners of a rectangle or widened line; `None` for circles and
/// zero-length lines.
fn as_rect(shape: &Shape) -> Option<[Point; 4]> {
    match *shape {
        Shape::Rect { corners } => Some(corners),
        Shape::Line { start, end, width } => line_corners(start, end, width),
        Shape::Circle { .. } => None,
    }
}

/// Widens a line into a rectangle by offsetting both ends by half the width,
/// perpendicular to the line.
fn line_corners(start: Point, end: Point, width: f64) -> Option<[Point; 4]> {
    let perp = (end - start).perp();
    let len = perp.length();
    if len == 0.0 {
        return None;
    }
    let half = perp * (0.5 * width / len);
    Some([start + half, start - half, end - half, end + half])
}

/// The indices of the first minimum and the first maximum.
fn extremes(projections: &[Projection; 4]) -> (usize, usize) {
    let mut min = 0;
    let mut max = 0;
    for (i, p) in projections.iter().enumerate().skip(1) {
        if p.dot < projections[min].dot {
            min = i;
        }
        if p.dot > projections[max].dot {
            max = i;
        }
    }
    (min, max)
}

/// Separating-axis test between two rectangles.
///
/// Returns the vector that moves `a` out of `b` along the axis with the least
/// overlap, or `None` if some axis separates them. Candidate axes are the two
/// edge directions of `a` followed by the two of `b`; on ties the earliest
/// axis wins.
pub fn rect_rect(a: &[Point; 4], b: &[Point; 4]) -> Option<Point> {
    let axes = [a[3] - a[0], a[3] - a[2], b[0] - b[1], b[0] - b[3]];
    let mut min_overlap: Option<Point> = None;

    for axis in axes {
        // A degenerate edge gives no axis to separate on.
        if axis.length2() == 0.0 {
            continue;
        }

        let proj_a = a.map(|c| c.project(axis));
        let proj_b = b.map(|c| c.project(axis));
        let (min_a, max_a) = extremes(&proj_a);
        let (min_b, max_b) = extremes(&proj_b);

        if proj_a[max_a].dot < proj_b[min_b].dot || proj_b[max_b].dot < proj_a[min_a].dot {
            return None;
        }

        let diff1 = proj_a[max_a].projected - proj_b[min_b].projected;
        let diff2 = proj_b[max_b].projected - proj_a[min_a].projected;
        let overlap = if diff1.length2() < diff2.length2() {
            diff1
        } else {
            -diff2
        };

        if min_overlap.map_or(true, |m| overlap.length2() < m.length2()) {
            min_overlap = Some(overlap);
        }
    }

    min_overlap.map(|v| -v)
}

/// Does the circle touch the rectangle's boundary, or lie inside it?
pub fn rect_circle(corners: &[Point; 4], center: Point, radius: f64) -> bool {
    let r2 = radius * radius;

    if corners.iter().any(|c| c.distance2(center) <= r2) {
        return true;
    }

    for i in 0..4 {
        let d = distance_to_line(center, corners[i], corners[(i + 1) % 4]);
        if d.line_proj2 > 0.0 && d.line_proj2 < d.length2 && d.distance2 <= r2 {
            return true;
        }
    }

    let axes = [corners[3] - corners[0], corners[3] - corners[2]];
    let projections = [
        (center - corners[0]).project(axes[0]),
        (center - corners[2]).project(axes[1]),
    ];
    projections
        .iter()
        .zip(axes)
        .all(|(p, axis)| p.dot >= 0.0 && p.projected.length2() <= axis.length2())
}


/// Checks on the collision tests, driven by arbitrary input.
///
/// These are shared between the unit tests and the fuzz targets.
#[cfg(any(test, feature = "arbitrary"))]
pub mod arbtests {
    use arbitrary::Unstructured;

    use super::*;
    use crate::arbitrary::{another_rect, rect};

    const MARGIN: f64 = 1e-6;

    fn strictly_inside(corners: &[Point; 4], p: Point) -> bool {
        [corners[1] - corners[0], corners[3] - corners[0]]
            .into_iter()
            .all(|edge| {
                let len = edge.length();
                let t = (p - corners[0]).dot(edge) / len;
                MARGIN < t && t < len - MARGIN
            })
    }

    /// The separating-axis test gives the same answer in both argument
    /// orders whenever the answer is clear-cut, and its displacement
    /// (slightly overshot) always separates the rectangles.
    pub fn rect_rect_agrees(u: &mut Unstructured<'_>) -> arbitrary::Result<()> {
        let a = rect(u)?;
        let b = another_rect(u, &a)?;

        let (box_a, box_b) = (Aabb::enclosing(a), Aabb::enclosing(b));
        if box_a.max_x() + MARGIN < box_b.x
            || box_b.max_x() + MARGIN < box_a.x
            || box_a.max_y() + MARGIN < box_b.y
            || box_b.max_y() + MARGIN < box_a.y
        {
            assert_eq!(rect_rect(&a, &b), None);
            assert_eq!(rect_rect(&b, &a), None);
        }

        let center_b = (b[0] + b[2]) * 0.5;
        if strictly_inside(&a, center_b) {
            assert!(rect_rect(&a, &b).is_some());
            assert!(rect_rect(&b, &a).is_some());
        }

        if let Some(d) = rect_rect(&a, &b) {
            if d.length() > 1e-3 {
                let moved = a.map(|c| c + d * 1.01);
                assert_eq!(rect_rect(&moved, &b), None);
            }
        }
        Ok(())
    }

    #[cfg(test)]
    mod tests {
        #[test]
        fn rect_rect_agrees() {
            arbtest::arbtest(super::rect_rect_agrees);
        }
    }
}
