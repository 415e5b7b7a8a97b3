// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Contour extraction and measurement

use crate::types::{Point2D, RawContour};
use image::GrayImage;
use imageproc::contours::{find_contours, BorderType};
use imageproc::geometry::convex_hull;

/// Outer borders of the top-level foreground components (non-zero pixels).
///
/// Holes and components nested inside holes are skipped.
pub fn external_contours(binary: &GrayImage) -> Vec<RawContour> {
    find_contours::<i32>(binary)
        .into_iter()
        .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
        .map(|c| RawContour::new(c.points))
        .collect()
}

/// Outer border of every foreground component, including components that
/// sit inside the hole of another one
pub fn component_outlines(binary: &GrayImage) -> Vec<RawContour> {
    find_contours::<i32>(binary)
        .into_iter()
        .filter(|c| c.border_type == BorderType::Outer)
        .map(|c| RawContour::new(c.points))
        .collect()
}

/// Area of the convex hull of a contour
pub fn hull_area(contour: &RawContour) -> f64 {
    let hull: Vec<Point2D> = convex_hull(contour.points.as_slice())
        .into_iter()
        .map(Point2D::from)
        .collect();
    polygon_area(&hull)
}

/// Enclosed area of a closed polygon (shoelace formula)
pub fn polygon_area(points: &[Point2D]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }

    let mut area = 0.0;
    let n = points.len();
    for i in 0..n {
        let j = (i + 1) % n;
        area += points[i].x * points[j].y;
        area -= points[j].x * points[i].y;
    }

    (area / 2.0).abs()
}

/// Perimeter of a closed polygon
pub fn arc_length(points: &[Point2D]) -> f64 {
    match points.len() {
        0 | 1 => 0.0,
        n => (0..n).map(|i| points[i].distance_to(&points[(i + 1) % n])).sum(),
    }
}

/// Area-weighted centroid, `None` for a polygon without area
pub fn centroid(points: &[Point2D]) -> Option<Point2D> {
    let n = points.len();
    if n < 3 {
        return None;
    }

    let (mut cx, mut cy, mut signed) = (0.0, 0.0, 0.0);
    for i in 0..n {
        let (p, q) = (points[i], points[(i + 1) % n]);
        let cross = p.x * q.y - q.x * p.y;
        signed += cross;
        cx += (p.x + q.x) * cross;
        cy += (p.y + q.y) * cross;
    }

    if signed.abs() < 1e-9 {
        return None;
    }
    let factor = 1.0 / (3.0 * signed);
    Some(Point2D::new(cx * factor, cy * factor))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use image::Luma;

    fn square(size: f64) -> Vec<Point2D> {
        vec![
            Point2D::new(0.0, 0.0),
            Point2D::new(size, 0.0),
            Point2D::new(size, size),
            Point2D::new(0.0, size),
        ]
    }

    #[test]
    fn test_polygon_area_and_perimeter() {
        assert_relative_eq!(polygon_area(&square(10.0)), 100.0);
        assert_relative_eq!(arc_length(&square(10.0)), 40.0);
        assert_eq!(polygon_area(&square(10.0)[..2]), 0.0);
    }

    #[test]
    fn test_centroid() {
        let c = centroid(&square(10.0)).unwrap();
        assert_relative_eq!(c.x, 5.0);
        assert_relative_eq!(c.y, 5.0);

        let flat = vec![Point2D::new(0.0, 0.0), Point2D::new(5.0, 0.0), Point2D::new(10.0, 0.0)];
        assert!(centroid(&flat).is_none());
    }

    fn ring_with_blob() -> GrayImage {
        // Ring 10..=29 with a nested blob inside the hole
        let mut img = GrayImage::new(40, 40);
        for y in 10..30 {
            for x in 10..30 {
                if x < 13 || x > 26 || y < 13 || y > 26 {
                    img.put_pixel(x, y, Luma([255]));
                }
            }
        }
        for y in 18..22 {
            for x in 18..22 {
                img.put_pixel(x, y, Luma([255]));
            }
        }
        img
    }

    #[test]
    fn test_external_contours_skip_holes() {
        let contours = external_contours(&ring_with_blob());
        assert_eq!(contours.len(), 1);

        let points = contours[0].to_points();
        assert_relative_eq!(polygon_area(&points), 19.0 * 19.0);
    }

    #[test]
    fn test_component_outlines_include_nested_blobs() {
        let outlines = component_outlines(&ring_with_blob());
        assert_eq!(outlines.len(), 2);

        let mut areas: Vec<f64> = outlines.iter().map(|c| polygon_area(&c.to_points())).collect();
        areas.sort_by(f64::total_cmp);
        assert_relative_eq!(areas[0], 9.0);
        assert_relative_eq!(areas[1], 19.0 * 19.0);
    }

    #[test]
    fn test_hull_area_fills_concavities() {
        // L shape: the hull adds the missing corner triangle
        let mut img = GrayImage::new(20, 20);
        for y in 2..12 {
            for x in 2..12 {
                if x < 5 || y > 8 {
                    img.put_pixel(x, y, Luma([255]));
                }
            }
        }
        let contour = &external_contours(&img)[0];

        assert_relative_eq!(polygon_area(&contour.to_points()), 32.5);
        assert_relative_eq!(hull_area(contour), 81.0 - 24.5);
    }
}
