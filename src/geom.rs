//! Geometric primitives: points (which double as vectors), axis-aligned boxes,
//! projections and line-segment intersection.

use std::ops::{Add, Mul, Neg, Sub};

/// Squared distance below which two points are considered the same junction.
const COINCIDENT_EPSILON: f64 = 1e-8;

/// Parameter-space slack used by [`intersect_segments`] when ignoring endpoints.
const OMIT_ENDS_TOLERANCE: f64 = 0.001;

/// A two-dimensional point, also used as a displacement vector.
#[derive(Clone, Copy, PartialEq, Default, serde::Serialize, serde::Deserialize)]
pub struct Point {
    /// Horizontal coordinate.
    pub x: f64,
    /// Vertical coordinate.
    ///
    /// Headings are measured clockwise from the positive `y` axis, so with the
    /// usual screen convention a heading of zero points down.
    pub y: f64,
}

impl std::fmt::Debug for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:?}, {:?})", self.x, self.y)
    }
}

impl Point {
    /// The origin, or the zero vector.
    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

    /// Create a new point.
    pub fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }

    /// The point `length` away from `self` along the heading `dir` (in degrees,
    /// clockwise from the positive `y` axis).
    pub fn along_heading(self, dir: f64, length: f64) -> Self {
        let rad = dir.to_radians();
        Point {
            x: self.x + length * rad.sin(),
            y: self.y + length * rad.cos(),
        }
    }

    /// The dot product.
    pub fn dot(self, other: Point) -> f64 {
        self.x * other.x + self.y * other.y
    }

    /// The `z` component of the three-dimensional cross product.
    pub fn cross(self, other: Point) -> f64 {
        self.x * other.y - self.y * other.x
    }

    /// Squared euclidean length.
    pub fn length2(self) -> f64 {
        self.dot(self)
    }

    /// Euclidean length.
    pub fn length(self) -> f64 {
        self.length2().sqrt()
    }

    /// Squared distance between two points.
    pub fn distance2(self, other: Point) -> f64 {
        (other - self).length2()
    }

    /// Distance between two points.
    pub fn distance(self, other: Point) -> f64 {
        (other - self).length()
    }

    /// Are the two points close enough to be the same junction?
    pub fn coincides(self, other: Point) -> bool {
        self.distance2(other) < COINCIDENT_EPSILON
    }

    /// The unsigned angle between two vectors, in degrees.
    ///
    /// Returns NaN if either vector has zero length.
    pub fn angle_between(self, other: Point) -> f64 {
        (self.dot(other) / (self.length() * other.length()))
            .clamp(-1.0, 1.0)
            .acos()
            .to_degrees()
    }

    /// Projects `self` onto `onto`.
    ///
    /// A zero-length `onto` projects everything to the zero vector.
    pub fn project(self, onto: Point) -> Projection {
        let dot = self.dot(onto);
        let onto_len2 = onto.length2();
        let projected = if onto_len2 == 0.0 {
            Point::ZERO
        } else {
            onto * (dot / onto_len2)
        };
        Projection { dot, projected }
    }

    /// The vector rotated by 90 degrees, `(-y, x)`.
    pub fn perp(self) -> Point {
        Point::new(-self.y, self.x)
    }

    /// Convert to a `kurbo` point.
    pub fn to_kurbo(self) -> kurbo::Point {
        kurbo::Point::new(self.x, self.y)
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Point {
    type Output = Point;

    fn mul(self, rhs: f64) -> Point {
        Point::new(self.x * rhs, self.y * rhs)
    }
}

impl Neg for Point {
    type Output = Point;

    fn neg(self) -> Point {
        Point::new(-self.x, -self.y)
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

impl From<kurbo::Point> for Point {
    fn from(p: kurbo::Point) -> Self {
        Self { x: p.x, y: p.y }
    }
}

/// The result of [`Point::project`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Projection {
    /// The dot product of the projected vector with the axis.
    pub dot: f64,
    /// The projection itself, a multiple of the axis.
    pub projected: Point,
}

/// Where two line segments cross.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Intersection {
    /// The crossing point.
    pub point: Point,
    /// The crossing's parameter along the first segment, in `[0, 1]`.
    pub t: f64,
}

/// Intersects the segments `p -> p2` and `q -> q2`.
///
/// Parallel segments never intersect, and that includes collinear segments
/// that overlap. If `omit_ends` is set, crossings within a small tolerance
/// (in parameter space) of any of the four endpoints are ignored, so that
/// segments meeting at a junction don't count as crossing.
pub fn intersect_segments(
    p: Point,
    p2: Point,
    q: Point,
    q2: Point,
    omit_ends: bool,
) -> Option<Intersection> {
    let r = p2 - p;
    let s = q2 - q;

    let denominator = r.cross(s);
    if denominator == 0.0 {
        return None;
    }

    let qp = q - p;
    let u = qp.cross(r) / denominator;
    let t = qp.cross(s) / denominator;

    let inside = |x: f64| {
        if omit_ends {
            x > OMIT_ENDS_TOLERANCE && x < 1.0 - OMIT_ENDS_TOLERANCE
        } else {
            (0.0..=1.0).contains(&x)
        }
    };

    (inside(t) && inside(u)).then(|| Intersection {
        point: p + r * t,
        t,
    })
}

/// The closest point to `p` on the (infinite) line through `a` and `b`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LineDistance {
    /// Squared distance from `p` to the line.
    pub distance2: f64,
    /// The foot of the perpendicular from `p`.
    pub point_on_line: Point,
    /// Signed squared distance from `a` to the foot; negative when the foot
    /// lies behind `a`.
    pub line_proj2: f64,
    /// Squared length of `a -> b`.
    pub length2: f64,
}

impl LineDistance {
    /// Does the foot of the perpendicular land within the segment `a -> b`?
    pub fn within_segment(&self) -> bool {
        self.line_proj2 >= 0.0 && self.line_proj2 <= self.length2
    }
}

/// Measures the distance from `p` to the line through `a` and `b`.
pub fn distance_to_line(p: Point, a: Point, b: Point) -> LineDistance {
    let ab = b - a;
    let proj = (p - a).project(ab);
    let foot = a + proj.projected;
    LineDistance {
        distance2: foot.distance2(p),
        point_on_line: foot,
        line_proj2: proj.dot.signum() * proj.projected.length2(),
        length2: ab.length2(),
    }
}

/// The smallest difference between two headings (in degrees), treating
/// headings 180 degrees apart as the same line. The result is in `[0, 90]`.
pub fn min_degree_difference(d1: f64, d2: f64) -> f64 {
    let diff = (d1 - d2).abs() % 180.0;
    diff.min((diff - 180.0).abs())
}

/// An axis-aligned box, stored as its top-left corner and its extent.
#[derive(Clone, Copy, Debug, PartialEq, Default, serde::Serialize, serde::Deserialize)]
pub struct Aabb {
    /// Smallest `x` coordinate.
    pub x: f64,
    /// Smallest `y` coordinate.
    pub y: f64,
    /// Horizontal extent, never negative.
    pub width: f64,
    /// Vertical extent, never negative.
    pub height: f64,
}

impl Aabb {
    /// Create a new box.
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Aabb {
            x,
            y,
            width,
            height,
        }
    }

    /// The smallest box containing all the points.
    ///
    /// Returns the default (empty, at the origin) box for no points.
    pub fn enclosing(points: impl IntoIterator<Item = Point>) -> Self {
        let mut points = points.into_iter();
        let Some(first) = points.next() else {
            return Aabb::default();
        };
        let (min, max) = points.fold((first, first), |(min, max), p| {
            (
                Point::new(min.x.min(p.x), min.y.min(p.y)),
                Point::new(max.x.max(p.x), max.y.max(p.y)),
            )
        });
        Aabb::new(min.x, min.y, max.x - min.x, max.y - min.y)
    }

    /// The square of half-width `radius` around `center`.
    pub fn around(center: Point, radius: f64) -> Self {
        Aabb::new(center.x - radius, center.y - radius, radius * 2.0, radius * 2.0)
    }

    /// Largest `x` coordinate.
    pub fn max_x(&self) -> f64 {
        self.x + self.width
    }

    /// Largest `y` coordinate.
    pub fn max_y(&self) -> f64 {
        self.y + self.height
    }

    /// Do the boxes share any point (boundaries included)?
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.x <= other.max_x()
            && other.x <= self.max_x()
            && self.y <= other.max_y()
            && other.y <= self.max_y()
    }

    /// Convert to a `kurbo` rectangle.
    pub fn to_kurbo(self) -> kurbo::Rect {
        kurbo::Rect::new(self.x, self.y, self.max_x(), self.max_y())
    }
}

impl From<kurbo::Rect> for Aabb {
    fn from(r: kurbo::Rect) -> Self {
        let r = r.abs();
        Aabb::new(r.x0, r.y0, r.width(), r.height())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use proptest::prelude::*;

    pub fn reasonable_point() -> BoxedStrategy<Point> {
        (-1e4..1e4, -1e4..1e4)
            .prop_map(|(x, y)| Point::new(x, y))
            .boxed()
    }

    #[test]
    fn crossing_segments() {
        let i = intersect_segments(
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(4.0, -5.0),
            Point::new(4.0, 5.0),
            true,
        )
        .unwrap();
        assert!(i.point.coincides(Point::new(4.0, 0.0)));
        assert!((i.t - 0.4).abs() < 1e-12);
    }

    #[test]
    fn parallel_and_collinear_segments_never_intersect() {
        let p = Point::new(0.0, 0.0);
        let p2 = Point::new(10.0, 0.0);
        assert!(intersect_segments(p, p2, Point::new(0.0, 1.0), Point::new(10.0, 1.0), false).is_none());
        // Overlapping collinear segments are reported as not intersecting.
        assert!(intersect_segments(p, p2, Point::new(5.0, 0.0), Point::new(15.0, 0.0), false).is_none());
    }

    #[test]
    fn omit_ends_ignores_junctions() {
        let p = Point::new(0.0, 0.0);
        let p2 = Point::new(10.0, 0.0);
        let q = Point::new(10.0, 0.0);
        let q2 = Point::new(10.0, 10.0);
        assert!(intersect_segments(p, p2, q, q2, false).is_some());
        assert!(intersect_segments(p, p2, q, q2, true).is_none());
    }

    #[test]
    fn headings() {
        let origin = Point::ZERO;
        let down = origin.along_heading(0.0, 1.0);
        assert!((down.x).abs() < 1e-12 && (down.y - 1.0).abs() < 1e-12);
        let right = origin.along_heading(90.0, 2.0);
        assert!((right.x - 2.0).abs() < 1e-12 && right.y.abs() < 1e-12);
    }

    #[test]
    fn degree_difference_folds_to_a_right_angle() {
        assert_eq!(min_degree_difference(10.0, 190.0), 0.0);
        assert_eq!(min_degree_difference(0.0, 90.0), 90.0);
        assert_eq!(min_degree_difference(0.0, 100.0), 80.0);
        assert_eq!(min_degree_difference(-45.0, 45.0), 90.0);
        assert_eq!(min_degree_difference(350.0, 10.0), 20.0);
    }

    #[test]
    fn line_distance() {
        let d = distance_to_line(
            Point::new(5.0, 3.0),
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
        );
        assert_eq!(d.point_on_line, Point::new(5.0, 0.0));
        assert_eq!(d.distance2, 9.0);
        assert_eq!(d.line_proj2, 25.0);
        assert_eq!(d.length2, 100.0);
        assert!(d.within_segment());

        let behind = distance_to_line(
            Point::new(-5.0, 3.0),
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
        );
        assert_eq!(behind.line_proj2, -25.0);
        assert!(!behind.within_segment());
    }

    #[test]
    fn enclosing_box() {
        let b = Aabb::enclosing([
            Point::new(3.0, -1.0),
            Point::new(-2.0, 4.0),
            Point::new(0.0, 0.0),
        ]);
        assert_eq!(b, Aabb::new(-2.0, -1.0, 5.0, 5.0));
        assert_eq!(Aabb::from(b.to_kurbo()), b);
    }

    proptest! {
        #[test]
        fn intersection_lies_on_both_segments(
            p in reasonable_point(),
            p2 in reasonable_point(),
            q in reasonable_point(),
            q2 in reasonable_point(),
        ) {
            if let Some(i) = intersect_segments(p, p2, q, q2, false) {
                let scale = 1.0 + p.length().max(p2.length()).max(q.length()).max(q2.length());
                let on_first = distance_to_line(i.point, p, p2).distance2.sqrt();
                let on_second = distance_to_line(i.point, q, q2).distance2.sqrt();
                prop_assert!(on_first <= 1e-6 * scale);
                prop_assert!(on_second <= 1e-6 * scale);
                prop_assert!((0.0..=1.0).contains(&i.t));
            }
        }
    }
}
