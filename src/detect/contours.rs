//! Contour extraction on binary difference images.
//!
//! Border following is done by `imageproc`; this module keeps only outermost
//! borders, compresses straight chain runs to their end points, and measures
//! the resulting polygons.

use image::GrayImage;
use imageproc::contours::{find_contours, BorderType};
use imageproc::point::Point;

use crate::detect::result::Region;

/// Outermost borders of every bright component, in raster discovery order.
///
/// Holes and borders nested inside holes are dropped.
pub(crate) fn external_contours(binary: &GrayImage) -> Vec<Vec<Point<i32>>> {
    find_contours::<i32>(binary)
        .into_iter()
        .filter(|contour| matches!(contour.border_type, BorderType::Outer))
        .filter(|contour| contour.parent.is_none())
        .map(|contour| compress_chain(contour.points))
        .collect()
}

/// Drop points that continue the previous chain step unchanged, keeping only
/// the end points of horizontal, vertical, and diagonal runs.
fn compress_chain(mut points: Vec<Point<i32>>) -> Vec<Point<i32>> {
    points.dedup();
    if points.len() > 1 && points.first() == points.last() {
        points.pop();
    }
    let n = points.len();
    if n < 3 {
        return points;
    }
    (0..n)
        .filter(|&i| {
            let prev = points[(i + n - 1) % n];
            let cur = points[i];
            let next = points[(i + 1) % n];
            (cur.x - prev.x, cur.y - prev.y) != (next.x - cur.x, next.y - cur.y)
        })
        .map(|i| points[i])
        .collect()
}

/// Enclosed polygon area (shoelace formula).
pub(crate) fn polygon_area(points: &[Point<i32>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let twice: i64 = points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(a, b)| a.x as i64 * b.y as i64 - b.x as i64 * a.y as i64)
        .sum();
    twice.abs() as f64 / 2.0
}

/// Tight axis-aligned box around the points, inclusive of edge pixels.
pub(crate) fn bounding_region(points: &[Point<i32>]) -> Option<Region> {
    let first = points.first()?;
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
    for p in points {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }
    if min_x < 0 || min_y < 0 {
        return None;
    }
    Some(Region::new(
        min_x as u32,
        min_y as u32,
        (max_x - min_x + 1) as u32,
        (max_y - min_y + 1) as u32,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn binary_with_rects(width: u32, height: u32, rects: &[(u32, u32, u32, u32)]) -> GrayImage {
        let mut img = GrayImage::new(width, height);
        for &(x, y, w, h) in rects {
            for yy in y..y + h {
                for xx in x..x + w {
                    img.put_pixel(xx, yy, Luma([255]));
                }
            }
        }
        img
    }

    #[test]
    fn filled_rectangle_compresses_to_corners() {
        let img = binary_with_rects(40, 30, &[(5, 4, 10, 8)]);
        let contours = external_contours(&img);
        assert_eq!(contours.len(), 1);
        assert_eq!(contours[0].len(), 4);
        assert_eq!(polygon_area(&contours[0]), 9.0 * 7.0);
        assert_eq!(bounding_region(&contours[0]), Some(Region::new(5, 4, 10, 8)));
    }

    #[test]
    fn hollow_ring_yields_only_outer_border() {
        let mut img = binary_with_rects(30, 30, &[(2, 2, 20, 20)]);
        for y in 6..18 {
            for x in 6..18 {
                img.put_pixel(x, y, Luma([0]));
            }
        }
        // Island inside the hole must not surface either.
        img.put_pixel(11, 11, Luma([255]));
        let contours = external_contours(&img);
        assert_eq!(contours.len(), 1);
        assert_eq!(bounding_region(&contours[0]), Some(Region::new(2, 2, 20, 20)));
    }

    #[test]
    fn contours_follow_raster_discovery_order() {
        let img = binary_with_rects(60, 60, &[(30, 40, 5, 5), (40, 2, 5, 5), (2, 20, 5, 5)]);
        let origins: Vec<(u32, u32)> = external_contours(&img)
            .iter()
            .filter_map(|c| bounding_region(c))
            .map(|r| (r.x, r.y))
            .collect();
        assert_eq!(origins, vec![(40, 2), (2, 20), (30, 40)]);
    }

    #[test]
    fn degenerate_polygons_have_no_area() {
        assert_eq!(polygon_area(&[Point::new(1, 1)]), 0.0);
        assert_eq!(polygon_area(&[Point::new(1, 1), Point::new(4, 1)]), 0.0);
        assert_eq!(bounding_region(&[]), None);
    }
}
