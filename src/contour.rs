//! Contour extraction: raster mask to editable polygon.
//!
//! Pipeline: binarize, collect boundary pixels (8-neighbor test), order
//! them by nearest-neighbor chaining within a small fixed radius, then
//! simplify with Douglas-Peucker. The chaining is a deliberate
//! approximation of full boundary following: it accepts partial chains on
//! concave or multi-component masks, and that behavior is part of the
//! contract with downstream consumers.

use std::collections::HashMap;

use crate::constants::contour::{CHAIN_RADIUS, SIMPLIFY_TOLERANCE};
use crate::geometry::{point_to_segment, Point, Polygon, MIN_POLYGON_VERTICES};
use crate::mask::Binarized;

/// Extract a simplified boundary polygon from a binarized mask.
///
/// Zero foreground pixels yield an empty polygon; callers fall back to a
/// bounding-box quad or refuse to enter edit mode. Masks too small to have
/// a meaningful boundary chain yield the foreground bounding box as a
/// 4-vertex quad rather than a degenerate polygon.
pub fn extract_contour(mask: &Binarized) -> Polygon {
    if mask.foreground_count == 0 {
        return Polygon::new();
    }

    let boundary = boundary_pixels(mask);
    if boundary.len() < MIN_POLYGON_VERTICES {
        return foreground_bbox_quad(mask);
    }

    let chain = chain_boundary(&boundary);
    let simplified = douglas_peucker(&chain, SIMPLIFY_TOLERANCE);
    if simplified.len() < MIN_POLYGON_VERTICES {
        return foreground_bbox_quad(mask);
    }

    log::debug!(
        "Contour: {} boundary px -> chain {} -> {} vertices",
        boundary.len(),
        chain.len(),
        simplified.len()
    );
    Polygon::from_vertices(simplified)
}

/// Foreground pixels that touch the background or the image border.
fn boundary_pixels(mask: &Binarized) -> Vec<Point> {
    let w = mask.width() as i32;
    let h = mask.height() as i32;
    let mut out = Vec::new();

    let set = |x: i32, y: i32| -> bool {
        x >= 0 && y >= 0 && x < w && y < h && mask.is_set(x as usize, y as usize)
    };

    for y in 0..h {
        for x in 0..w {
            if !set(x, y) {
                continue;
            }
            let mut on_boundary = false;
            'neighbors: for dy in -1..=1 {
                for dx in -1..=1 {
                    if (dx != 0 || dy != 0) && !set(x + dx, y + dy) {
                        on_boundary = true;
                        break 'neighbors;
                    }
                }
            }
            if on_boundary {
                out.push(Point::new(x as f32, y as f32));
            }
        }
    }
    out
}

/// Order boundary pixels into a chain: starting from the first pixel in
/// scan order, repeatedly hop to the nearest unvisited boundary pixel
/// within [`CHAIN_RADIUS`]. Terminates when no candidate remains, which may
/// leave part of the boundary unvisited.
///
/// A bucket grid keyed by `coordinate / CHAIN_RADIUS` keeps each lookup to
/// a constant number of cells, so large boundary sets stay interactive.
fn chain_boundary(boundary: &[Point]) -> Vec<Point> {
    let cell = CHAIN_RADIUS as i32;
    let key = |p: &Point| -> (i32, i32) {
        ((p.x as i32).div_euclid(cell), (p.y as i32).div_euclid(cell))
    };

    let mut grid: HashMap<(i32, i32), Vec<usize>> = HashMap::new();
    for (i, p) in boundary.iter().enumerate() {
        grid.entry(key(p)).or_default().push(i);
    }

    let mut visited = vec![false; boundary.len()];
    let mut chain = Vec::with_capacity(boundary.len());
    let mut current = 0usize;
    visited[0] = true;
    chain.push(boundary[0]);

    let radius_sq = CHAIN_RADIUS * CHAIN_RADIUS;
    loop {
        let p = boundary[current];
        let (cx, cy) = key(&p);
        let mut best: Option<(usize, f32)> = None;

        for gy in (cy - 1)..=(cy + 1) {
            for gx in (cx - 1)..=(cx + 1) {
                let Some(indices) = grid.get(&(gx, gy)) else {
                    continue;
                };
                for &i in indices {
                    if visited[i] {
                        continue;
                    }
                    let q = boundary[i];
                    let dx = q.x - p.x;
                    let dy = q.y - p.y;
                    let d_sq = dx * dx + dy * dy;
                    if d_sq <= radius_sq && best.map_or(true, |(_, bd)| d_sq < bd) {
                        best = Some((i, d_sq));
                    }
                }
            }
        }

        match best {
            Some((i, _)) => {
                visited[i] = true;
                chain.push(boundary[i]);
                current = i;
            }
            None => break,
        }
    }

    chain
}

/// Douglas-Peucker polyline simplification at a fixed perpendicular
/// distance tolerance. Endpoints are always kept.
fn douglas_peucker(points: &[Point], tolerance: f32) -> Vec<Point> {
    if points.len() <= 2 {
        return points.to_vec();
    }

    let mut keep = vec![false; points.len()];
    keep[0] = true;
    keep[points.len() - 1] = true;

    let mut stack = vec![(0usize, points.len() - 1)];
    while let Some((start, end)) = stack.pop() {
        if end <= start + 1 {
            continue;
        }
        let a = &points[start];
        let b = &points[end];
        let mut max_dist = 0.0_f32;
        let mut max_idx = start;
        for (i, p) in points.iter().enumerate().take(end).skip(start + 1) {
            let (d, _) = point_to_segment(p, a, b);
            if d > max_dist {
                max_dist = d;
                max_idx = i;
            }
        }
        if max_dist > tolerance {
            keep[max_idx] = true;
            stack.push((start, max_idx));
            stack.push((max_idx, end));
        }
    }

    points
        .iter()
        .zip(keep.iter())
        .filter_map(|(p, &k)| k.then_some(*p))
        .collect()
}

/// Bounding box of the foreground as a 4-vertex quad, extended by one
/// pixel so a single-pixel mask still has area.
fn foreground_bbox_quad(mask: &Binarized) -> Polygon {
    let mut min_x = usize::MAX;
    let mut min_y = usize::MAX;
    let mut max_x = 0usize;
    let mut max_y = 0usize;
    for ((y, x), &set) in mask.foreground.indexed_iter() {
        if set {
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }
    }
    if min_x == usize::MAX {
        return Polygon::new();
    }
    let (x0, y0) = (min_x as f32, min_y as f32);
    let (x1, y1) = ((max_x + 1) as f32, (max_y + 1) as f32);
    Polygon::from_vertices(vec![
        Point::new(x0, y0),
        Point::new(x1, y0),
        Point::new(x1, y1),
        Point::new(x0, y1),
    ])
}

// ============================================================================
// Tests
// ============================================================================
