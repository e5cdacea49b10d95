//! Utilities for fuzz and/or property testing using `arbitrary`.

use arbitrary::Unstructured;

use crate::{Aabb, Point};

/// Generate an arbitrary float in some range.
pub fn float_in_range(start: f64, end: f64, u: &mut Unstructured<'_>) -> Result<f64, arbitrary::Error> {
    let num: u32 = u.arbitrary()?;
    let t = num as f64 / u32::MAX as f64;
    Ok((1.0 - t) * start + t * end)
}

/// Generate a float in some range, but give it a chance to be close to another float.
fn another_float_in_range(orig: f64, start: f64, end: f64, u: &mut Unstructured<'_>) -> Result<f64, arbitrary::Error> {
    let close: bool = u.arbitrary()?;
    if close {
        let ulps: i32 = u.int_in_range(-32..=32)?;
        let scale = 1.0f64 + ulps as f64 * f64::EPSILON;
        Ok((orig * scale).clamp(start, end))
    } else {
        float_in_range(start, end, u)
    }
}

/// Generate an arbitrary point inside `bounds`.
pub fn point_in(bounds: &Aabb, u: &mut Unstructured<'_>) -> Result<Point, arbitrary::Error> {
    Ok(Point::new(
        float_in_range(bounds.x, bounds.max_x(), u)?,
        float_in_range(bounds.y, bounds.max_y(), u)?,
    ))
}

/// Generate an arbitrary box inside `bounds`.
///
/// Small boxes are much more likely than large ones, and some boxes are
/// degenerate (zero width or height).
pub fn aabb_in(bounds: &Aabb, u: &mut Unstructured<'_>) -> Result<Aabb, arbitrary::Error> {
    let corner = point_in(bounds, u)?;
    let scale: u8 = u.int_in_range(0..=16)?;
    let max_size = bounds.width.min(bounds.height) / f64::from(1u32 << scale);
    let w = float_in_range(0.0, max_size, u)?.min(bounds.max_x() - corner.x);
    let h = float_in_range(0.0, max_size, u)?.min(bounds.max_y() - corner.y);
    Ok(Aabb::new(corner.x, corner.y, w, h))
}

/// Generate another box inside `bounds`, with a chance of sharing an edge
/// coordinate with `first`.
///
/// Boxes that exactly touch are where the strict and non-strict comparisons
/// in the index differ.
pub fn another_aabb_in(bounds: &Aabb, first: &Aabb, u: &mut Unstructured<'_>) -> Result<Aabb, arbitrary::Error> {
    let mut ret = aabb_in(bounds, u)?;
    let x = another_float_in_range(first.max_x(), bounds.x, bounds.max_x(), u)?;
    let y = another_float_in_range(first.max_y(), bounds.y, bounds.max_y(), u)?;
    ret.x = x.min(bounds.max_x() - ret.width);
    ret.y = y.min(bounds.max_y() - ret.height);
    Ok(ret)
}

/// Generate the corners of an arbitrary (possibly rotated) rectangle, in
/// order around its outline.
pub fn rect(u: &mut Unstructured<'_>) -> Result<[Point; 4], arbitrary::Error> {
    let center = Point::new(float_in_range(-1e3, 1e3, u)?, float_in_range(-1e3, 1e3, u)?);
    let half_width = float_in_range(0.5, 200.0, u)?;
    let half_height = float_in_range(0.5, 200.0, u)?;
    let angle = float_in_range(0.0, 360.0, u)?;
    Ok(rect_around(center, half_width, half_height, angle))
}

/// Generate another rectangle, with a chance of sharing its orientation or
/// center with `first`.
pub fn another_rect(u: &mut Unstructured<'_>, first: &[Point; 4]) -> Result<[Point; 4], arbitrary::Error> {
    let first_center = (first[0] + first[2]) * 0.5;
    let first_angle = (first[1] - first[0]).angle_between(Point::new(0.0, 1.0));

    let same_center: bool = u.arbitrary()?;
    let same_angle: bool = u.arbitrary()?;
    let center = if same_center {
        first_center
    } else {
        Point::new(
            another_float_in_range(first_center.x, -1e3, 1e3, u)?,
            another_float_in_range(first_center.y, -1e3, 1e3, u)?,
        )
    };
    let angle = if same_angle {
        first_angle
    } else {
        float_in_range(0.0, 360.0, u)?
    };
    let half_width = float_in_range(0.5, 200.0, u)?;
    let half_height = float_in_range(0.5, 200.0, u)?;
    Ok(rect_around(center, half_width, half_height, angle))
}

fn rect_around(center: Point, half_width: f64, half_height: f64, angle: f64) -> [Point; 4] {
    let along = Point::ZERO.along_heading(angle, 1.0);
    let across = along.perp();
    let w = along * half_width;
    let h = across * half_height;
    [center + w + h, center + w - h, center - w - h, center - w + h]
}
