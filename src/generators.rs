//! Utilities for generating benchmarks and test cases.

use crate::{Aabb, Point};

/// Generate an `n` by `n` grid of square boxes.
///
/// The top-left of the first box is at `(x0, y0)`. Each box has size `size x
/// size`, and the distance between the top-left corners of neighboring boxes
/// (both horizontally and vertically) is `offset`.
pub fn box_grid((x0, y0): (f64, f64), size: f64, offset: f64, n: usize) -> Vec<Aabb> {
    let mut ret = Vec::with_capacity(n * n);
    for i in 0..n {
        let x = x0 + i as f64 * offset;
        for j in 0..n {
            let y = y0 + j as f64 * offset;
            ret.push(Aabb::new(x, y, size, size));
        }
    }
    ret
}

/// Generate `n` boxes scattered over `bounds`, with sizes ranging from tiny
/// to about a tenth of the region.
///
/// The boxes are placed along a low-discrepancy sequence, so they cover the
/// region evenly without looking like a grid. The output depends only on `n`
/// and `bounds`.
pub fn box_field(bounds: &Aabb, n: usize) -> Vec<Aabb> {
    // Additive recurrence with the plastic number; see "The Unreasonable
    // Effectiveness of Quasirandom Sequences".
    const G: f64 = 1.324_717_957_244_746;
    let (a1, a2) = (1.0 / G, 1.0 / (G * G));

    (0..n)
        .map(|i| {
            let i = i as f64;
            let u = (0.5 + a1 * i).fract();
            let v = (0.5 + a2 * i).fract();
            // Most boxes are small, like roads; a few are large.
            let s = (0.5 + 0.618_033_988_749_895 * i).fract().powi(4) * 0.1;
            let w = bounds.width * s;
            let h = bounds.height * s;
            Aabb::new(
                bounds.x + u * (bounds.width - w),
                bounds.y + v * (bounds.height - h),
                w,
                h,
            )
        })
        .collect()
}

/// Generate an `n` by `n` grid of rectangles, each rotated by `angle` degrees
/// about its center.
///
/// Each rectangle is `width x height` before rotation, and neighboring
/// centers are `offset` apart. If `offset` is small enough, neighbors
/// overlap.
pub fn rect_grid(width: f64, height: f64, offset: f64, angle: f64, n: usize) -> Vec<[Point; 4]> {
    let along = Point::ZERO.along_heading(angle, width / 2.0);
    let across = Point::ZERO.along_heading(angle + 90.0, height / 2.0);

    let mut ret = Vec::with_capacity(n * n);
    for i in 0..n {
        for j in 0..n {
            let c = Point::new(i as f64 * offset, j as f64 * offset);
            ret.push([
                c + along + across,
                c + along - across,
                c - along - across,
                c - along + across,
            ]);
        }
    }
    ret
}

/// Like [`rect_grid`], but every other rectangle is turned a further 45
/// degrees, so that neighbors never share edge directions.
pub fn staggered_rect_grid(width: f64, height: f64, offset: f64, n: usize) -> Vec<[Point; 4]> {
    let straight = rect_grid(width, height, offset, 0.0, n);
    let turned = rect_grid(width, height, offset, 45.0, n);
    straight
        .into_iter()
        .zip(turned)
        .enumerate()
        .map(|(k, (s, t))| if (k / n + k % n) % 2 == 0 { s } else { t })
        .collect()
}
