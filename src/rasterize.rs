//! Polygon rasterization into the normalized mask space.
//!
//! Scanline fill with the nonzero winding rule, sampling at pixel centers.
//! Nonzero matches what most 2D rendering backends do, so the live mask
//! preview agrees with whatever the shell draws on screen.

use crate::constants::mask::{FOREGROUND_VALUE, HEIGHT, WIDTH};
use crate::geometry::{Polygon, MIN_POLYGON_VERTICES};
use crate::mask::{empty_buffer, MaskBuffer};

/// Fill `polygon` into a 640x480 mask: interior pixels become 255, the
/// rest 0. Fewer than three vertices is a no-op region and yields an
/// all-background mask, not an error.
pub fn rasterize(polygon: &Polygon) -> MaskBuffer {
    let mut out = empty_buffer();
    let verts = polygon.vertices();
    if verts.len() < MIN_POLYGON_VERTICES {
        return out;
    }

    let n = verts.len();
    // Crossing records for one scanline: x of the intersection and the
    // edge direction (+1 upward, -1 downward) for winding accumulation.
    let mut crossings: Vec<(f32, i32)> = Vec::with_capacity(n);

    for y in 0..HEIGHT as usize {
        let yc = y as f32 + 0.5;
        crossings.clear();

        for i in 0..n {
            let a = verts[i];
            let b = verts[(i + 1) % n];
            let dir = if a.y <= yc && b.y > yc {
                1
            } else if b.y <= yc && a.y > yc {
                -1
            } else {
                continue;
            };
            let t = (yc - a.y) / (b.y - a.y);
            crossings.push((a.x + (b.x - a.x) * t, dir));
        }
        if crossings.is_empty() {
            continue;
        }

        crossings.sort_by(|l, r| l.0.total_cmp(&r.0));

        let mut winding = 0;
        let mut span_start = 0.0_f32;
        for &(x, dir) in &crossings {
            if winding != 0 {
                fill_span(&mut out, y, span_start, x);
            }
            winding += dir;
            span_start = x;
        }
    }

    out
}

/// Fill pixels of row `y` whose centers fall in `[x0, x1)`.
fn fill_span(out: &mut MaskBuffer, y: usize, x0: f32, x1: f32) {
    let start = (x0 - 0.5).ceil().max(0.0) as usize;
    let end = ((x1 - 0.5).ceil().min(WIDTH as f32)) as usize;
    for x in start..end {
        out[(y, x)] = FOREGROUND_VALUE;
    }
}
