// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Candidate room regions
//!
//! Two independent locators produce raw closed contours:
//!
//! - **Wall reconstruction**: straight wall segments are found on a wall mask,
//!   redrawn on a clean canvas, closed so door gaps seal, and the resulting
//!   enclosures are traced.
//! - **Seed-anchored fill**: a flood fill starting next to a room label spreads
//!   through open floor until it hits walls; the filled region is traced.

use crate::config::{FloodFillConfig, LineDetectionConfig};
use crate::contours::{external_contours, polygon_area};
use crate::image_ops::{close, fill_rect, in_range, kernel_radius, threshold};
use crate::line_ops::{detect_lines, draw_thick_line};
use crate::types::{BoundingBox, DetectedLine, RawContour, SeedHint};
use image::{GrayImage, Luma};

/// Wall segments found on a likely-wall mask
pub fn detect_wall_lines(wall_mask: &GrayImage, config: &LineDetectionConfig) -> Vec<DetectedLine> {
    detect_lines(wall_mask, config)
}

/// Redraw segments on a blank canvas and close the gaps between them
pub fn reconstruct_walls(
    lines: &[DetectedLine],
    width: u32,
    height: u32,
    config: &LineDetectionConfig,
) -> GrayImage {
    let mut canvas = GrayImage::new(width, height);
    for line in lines {
        draw_thick_line(&mut canvas, line, config.stroke_width, 255);
    }
    close(&canvas, kernel_radius(config.closing_kernel))
}

/// Strategy A end to end: wall mask to raw contours
pub fn locate_from_walls(wall_mask: &GrayImage, config: &LineDetectionConfig) -> Vec<RawContour> {
    let lines = detect_wall_lines(wall_mask, config);
    let canvas = reconstruct_walls(&lines, wall_mask.width(), wall_mask.height(), config);
    external_contours(&canvas)
}

/// Binarize for flood filling: open floor 255, walls 0
pub fn binarize_for_fill(grayscale: &GrayImage, config: &FloodFillConfig) -> GrayImage {
    threshold(grayscale, config.light_threshold)
}

/// Pick the flood-fill start for a hint.
///
/// Labels sit inside rooms but their glyphs are dark, so the pixels one hint
/// height above and below and one hint width left and right of the centre
/// are probed first. The first probe inside the image on a light pixel wins.
/// Otherwise the centre is used even when it lies on a wall; `None` only when
/// the centre itself is outside the image.
pub fn choose_seed(binary: &GrayImage, hint: &SeedHint) -> Option<(u32, u32)> {
    let (cx, cy) = hint.center();
    let probes = [
        (cx, cy - hint.h),
        (cx, cy + hint.h),
        (cx - hint.w, cy),
        (cx + hint.w, cy),
    ];

    probes
        .into_iter()
        .filter_map(|(x, y)| in_bounds(binary, x, y))
        .find(|&(x, y)| binary.get_pixel(x, y).0[0] == 255)
        .or_else(|| in_bounds(binary, cx, cy))
}

/// 4-connected fill of the region sharing the seed's value
pub fn flood_fill(image: &mut GrayImage, seed: (u32, u32), fill_value: u8) {
    let (width, height) = image.dimensions();
    let target = image.get_pixel(seed.0, seed.1).0[0];
    if target == fill_value {
        return;
    }

    let mut stack = vec![seed];
    while let Some((x, y)) = stack.pop() {
        if image.get_pixel(x, y).0[0] != target {
            continue;
        }
        image.put_pixel(x, y, Luma([fill_value]));

        if x > 0 {
            stack.push((x - 1, y));
        }
        if x + 1 < width {
            stack.push((x + 1, y));
        }
        if y > 0 {
            stack.push((x, y - 1));
        }
        if y + 1 < height {
            stack.push((x, y + 1));
        }
    }
}

/// Strategy B for one hint: the largest contour of the filled region,
/// with the label's own box merged in. `None` when nothing was filled.
pub fn locate_from_seed(
    binary: &GrayImage,
    hint: &SeedHint,
    config: &FloodFillConfig,
) -> Option<RawContour> {
    let seed = choose_seed(binary, hint)?;
    tracing::trace!(x = seed.0, y = seed.1, "Flood fill seed");

    let mut filled = binary.clone();
    flood_fill(&mut filled, seed, config.fill_value);

    // The label patch reaches one pixel past the box on the right and bottom
    let mut mask = in_range(&filled, config.fill_value, config.fill_value);
    let patch = BoundingBox::new(hint.x, hint.y, hint.w + 1, hint.h + 1);
    fill_rect(&mut mask, &patch, 255);

    largest_contour(external_contours(&mask))
}

fn largest_contour(contours: Vec<RawContour>) -> Option<RawContour> {
    let mut best: Option<(f64, RawContour)> = None;
    for contour in contours {
        let area = polygon_area(&contour.to_points());
        if best.as_ref().map_or(true, |(a, _)| area > *a) {
            best = Some((area, contour));
        }
    }
    best.map(|(_, contour)| contour)
}

fn in_bounds(image: &GrayImage, x: i32, y: i32) -> Option<(u32, u32)> {
    if x >= 0 && y >= 0 && (x as u32) < image.width() && (y as u32) < image.height() {
        Some((x as u32, y as u32))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Point2D;

    /// White plan with two rooms split by a vertical wall at x = 100..=102
    fn two_room_plan() -> GrayImage {
        let mut img = GrayImage::from_pixel(200, 120, Luma([255]));
        for y in 0..120 {
            for x in 0..200 {
                let outer = x < 3 || x >= 197 || y < 3 || y >= 117;
                let middle = (100..103).contains(&x);
                if outer || middle {
                    img.put_pixel(x, y, Luma([0]));
                }
            }
        }
        img
    }

    fn bbox_of(contour: &RawContour) -> BoundingBox {
        BoundingBox::from_points(&contour.to_points()).unwrap()
    }

    #[test]
    fn test_seed_probes_above_label_first() {
        let binary = binarize_for_fill(&two_room_plan(), &FloodFillConfig::default());
        let hint = SeedHint::new(40, 50, 20, 10);
        assert_eq!(choose_seed(&binary, &hint), Some((50, 45)));
    }

    #[test]
    fn test_seed_falls_back_to_center() {
        let binary = GrayImage::new(30, 30);
        let hint = SeedHint::new(10, 10, 10, 10);
        assert_eq!(choose_seed(&binary, &hint), Some((15, 15)));

        // Probes outside a tiny image, centre inside
        let binary = GrayImage::from_pixel(4, 4, Luma([255]));
        let hint = SeedHint::new(0, 0, 4, 4);
        assert_eq!(choose_seed(&binary, &hint), Some((2, 2)));
    }

    #[test]
    fn test_seed_skips_dark_probes() {
        let mut binary = GrayImage::from_pixel(40, 40, Luma([255]));
        // Above and below are walls
        binary.put_pixel(20, 10, Luma([0]));
        binary.put_pixel(20, 30, Luma([0]));
        let hint = SeedHint::new(15, 15, 10, 10);
        assert_eq!(choose_seed(&binary, &hint), Some((10, 20)));
    }

    #[test]
    fn test_hint_outside_image_has_no_seed() {
        let binary = GrayImage::from_pixel(20, 20, Luma([255]));
        let hint = SeedHint::new(100, 100, 4, 4);
        assert!(choose_seed(&binary, &hint).is_none());
        assert!(locate_from_seed(&binary, &hint, &FloodFillConfig::default()).is_none());
    }

    #[test]
    fn test_flood_fill_stays_inside_walls() {
        let mut binary = binarize_for_fill(&two_room_plan(), &FloodFillConfig::default());
        flood_fill(&mut binary, (50, 60), 128);

        assert_eq!(binary.get_pixel(3, 3).0[0], 128);
        assert_eq!(binary.get_pixel(99, 116).0[0], 128);
        assert_eq!(binary.get_pixel(101, 60).0[0], 0);
        assert_eq!(binary.get_pixel(150, 60).0[0], 255);
    }

    #[test]
    fn test_locate_from_seed_returns_room_interior() {
        let binary = binarize_for_fill(&two_room_plan(), &FloodFillConfig::default());
        let hint = SeedHint::new(140, 50, 20, 10);

        let contour = locate_from_seed(&binary, &hint, &FloodFillConfig::default()).unwrap();
        assert_eq!(bbox_of(&contour), BoundingBox::new(103, 3, 94, 114));
    }

    #[test]
    fn test_label_patch_includes_far_edge() {
        // Open floor in columns 0..30, wall from column 30 on
        let binary = GrayImage::from_fn(60, 40, |x, _| Luma([if x < 30 { 255 } else { 0 }]));
        let hint = SeedHint::new(20, 10, 10, 8);

        let contour = locate_from_seed(&binary, &hint, &FloodFillConfig::default()).unwrap();
        let points = contour.to_points();
        assert!(points.iter().any(|p| p.x == 30.0 && p.y == 18.0));
        assert_eq!(bbox_of(&contour), BoundingBox::new(0, 0, 31, 40));
    }

    #[test]
    fn test_locate_from_walls_finds_enclosure() {
        let mut mask = GrayImage::new(300, 200);
        let outline = [
            DetectedLine::new(Point2D::new(50.0, 40.0), Point2D::new(250.0, 40.0)),
            DetectedLine::new(Point2D::new(250.0, 40.0), Point2D::new(250.0, 160.0)),
            DetectedLine::new(Point2D::new(250.0, 160.0), Point2D::new(50.0, 160.0)),
            DetectedLine::new(Point2D::new(50.0, 160.0), Point2D::new(50.0, 40.0)),
        ];
        for line in &outline {
            draw_thick_line(&mut mask, line, 2, 255);
        }

        let contours = locate_from_walls(&mask, &LineDetectionConfig::default());
        assert_eq!(contours.len(), 1);

        let bbox = bbox_of(&contours[0]);
        assert!((bbox.x - 49).abs() <= 3 && (bbox.y - 39).abs() <= 3);
        assert!((bbox.w - 203).abs() <= 6 && (bbox.h - 123).abs() <= 6);
    }

    #[test]
    fn test_reconstruct_walls_seals_door_gap() {
        let lines = [
            DetectedLine::new(Point2D::new(10.0, 20.0), Point2D::new(60.0, 20.0)),
            DetectedLine::new(Point2D::new(66.0, 20.0), Point2D::new(120.0, 20.0)),
        ];
        let canvas = reconstruct_walls(&lines, 140, 40, &LineDetectionConfig::default());
        for x in 10..=120 {
            assert_eq!(canvas.get_pixel(x, 20).0[0], 255, "gap at x={x}");
        }
    }
}
