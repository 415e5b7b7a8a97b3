// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Optional raster cleaning before room extraction
//!
//! Scanned plans carry captions, page numbers, room labels and drawing
//! symbols that would otherwise be traced as walls. Cleaning runs, in order:
//!
//! 1. rotation to landscape
//! 2. contrast enhancement (histogram equalization, bilateral smoothing,
//!    Canny edges darkened)
//! 3. text removal
//! 4. symbol exclusion: wiring, door swings and stair runs
//! 5. wall reinforcement (row and column dilation, then closing)
//! 6. page margin blanking
//!
//! Steps 2, 4 and 5 can be switched off in [`CleanupConfig`].

use crate::config::{CleanupConfig, SymbolConfig};
use crate::contours::{arc_length, component_outlines, hull_area, polygon_area};
use crate::image_ops::{
    bilateral, canny_edges, close, dilate, dilate_directional, equalize, fill_rect,
    threshold_inverted,
};
use crate::types::{BoundingBox, RawContour};
use image::{imageops, GrayImage, Luma};
use imageproc::drawing::draw_polygon_mut;
use imageproc::point::Point;

/// Full cleaning pass
pub fn clean_floor_plan(grayscale: &GrayImage, config: &CleanupConfig) -> GrayImage {
    let mut image = if config.ensure_landscape {
        ensure_landscape(grayscale)
    } else {
        grayscale.clone()
    };

    if config.enhance_contrast {
        image = enhance_contrast(&image, config);
    }
    let removed = remove_text_regions(&mut image, config);
    let symbols = if config.exclude_symbols {
        remove_symbols(&mut image, config)
    } else {
        0
    };
    if config.reinforce_walls {
        reinforce_walls(&mut image, config);
    }
    clear_page_margins(&mut image, config);
    tracing::debug!(removed, symbols, "Cleaned floor plan");

    image
}

/// Rotate a portrait raster a quarter turn clockwise
pub fn ensure_landscape(grayscale: &GrayImage) -> GrayImage {
    if grayscale.height() > grayscale.width() {
        imageops::rotate90(grayscale)
    } else {
        grayscale.clone()
    }
}

/// Stretch the gray levels, smooth while keeping stroke borders and paint
/// the traced borders with `edge_gray` so faint walls read as ink
pub fn enhance_contrast(grayscale: &GrayImage, config: &CleanupConfig) -> GrayImage {
    let equalized = equalize(grayscale);
    let mut smoothed = bilateral(
        &equalized,
        config.bilateral_window,
        config.bilateral_sigma,
        config.bilateral_sigma,
    );
    let edges = dilate(
        &canny_edges(&smoothed, config.enhance_canny_low, config.enhance_canny_high),
        1,
    );

    for (pixel, edge) in smoothed.pixels_mut().zip(edges.pixels()) {
        if edge.0[0] > 0 {
            pixel.0[0] = pixel.0[0].min(config.edge_gray);
        }
    }
    smoothed
}

/// Paint small compact ink components white; returns how many were erased
pub fn remove_text_regions(image: &mut GrayImage, config: &CleanupConfig) -> usize {
    let ink = threshold_inverted(image, config.ink_threshold);

    let mut text_mask = GrayImage::new(image.width(), image.height());
    let mut removed = 0;
    for contour in component_outlines(&ink) {
        let points = contour.to_points();
        let area = polygon_area(&points);
        let Some(bbox) = BoundingBox::from_points(&points) else {
            continue;
        };
        let aspect = bbox.aspect_ratio();
        if area > config.min_text_area
            && area < config.max_text_area
            && aspect > config.min_text_aspect
            && aspect < config.max_text_aspect
        {
            fill_rect(&mut text_mask, &bbox, 255);
            removed += 1;
        }
    }

    let text_mask = dilate(&text_mask, config.erase_radius);
    paint_white(image, &text_mask);

    removed
}

/// Drawing symbol that is not part of the building structure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Symbol {
    /// Thin electrical run
    Wiring,
    /// Door leaf arc
    DoorSwing,
    /// Run of parallel treads
    Stairs,
}

/// Recognize a symbol from the outline of one ink component
pub fn classify_symbol(
    contour: &RawContour,
    ink: &GrayImage,
    rules: &SymbolConfig,
) -> Option<Symbol> {
    let points = contour.to_points();
    let bbox = BoundingBox::from_points(&points)?;
    let area = polygon_area(&points);
    let long = bbox.w.max(bbox.h);
    let short = bbox.w.min(bbox.h);

    if short < rules.wiring_max_thickness
        && area > 0.0
        && arc_length(&points) / area > rules.wiring_min_perimeter_ratio
    {
        return Some(Symbol::Wiring);
    }

    if long < rules.door_max_long_side && short < rules.door_max_short_side {
        let hull = hull_area(contour);
        if hull > 0.0 {
            let solidity = area / hull;
            if solidity > rules.door_min_solidity && solidity < rules.door_max_solidity {
                return Some(Symbol::DoorSwing);
            }
        }
    }

    let elongation = long as f64 / short.max(1) as f64;
    if elongation > rules.stair_min_elongation
        && elongation < rules.stair_max_elongation
        && long < rules.stair_max_side
        && ink_transitions(ink, &bbox) as f64 > long as f64 / rules.stair_transition_divisor
    {
        return Some(Symbol::Stairs);
    }

    None
}

/// Erase wiring, door swings and stair runs; returns how many were found
pub fn remove_symbols(image: &mut GrayImage, config: &CleanupConfig) -> usize {
    let ink = threshold_inverted(image, config.ink_threshold);

    let mut exclusion = GrayImage::new(image.width(), image.height());
    let mut found = 0;
    for contour in component_outlines(&ink) {
        if let Some(symbol) = classify_symbol(&contour, &ink, &config.symbols) {
            tracing::trace!(?symbol, points = contour.len(), "Excluding symbol");
            fill_contour(&mut exclusion, &contour);
            found += 1;
        }
    }

    let exclusion = dilate(&exclusion, config.symbols.exclusion_radius);
    paint_white(image, &exclusion);

    found
}

/// Thicken ink along rows and columns, then close small gaps, painting the
/// result black
pub fn reinforce_walls(image: &mut GrayImage, config: &CleanupConfig) {
    let ink = threshold_inverted(image, config.ink_threshold);
    let rows = dilate_directional(&ink, config.reinforce_length, true);
    let columns = dilate_directional(&ink, config.reinforce_length, false);

    let mut walls = rows;
    for (pixel, column) in walls.pixels_mut().zip(columns.pixels()) {
        pixel.0[0] = pixel.0[0].max(column.0[0]);
    }
    let walls = close(&walls, config.reinforce_close_radius);

    for (pixel, wall) in image.pixels_mut().zip(walls.pixels()) {
        if wall.0[0] > 0 {
            *pixel = Luma([0]);
        }
    }
}

/// Dense/sparse switches of the ink profile along the long side of `bbox`.
/// A row or column is dense when more than half of it is ink.
fn ink_transitions(ink: &GrayImage, bbox: &BoundingBox) -> usize {
    let horizontal = bbox.w > bbox.h;
    let (length, across) = if horizontal {
        (bbox.w, bbox.h)
    } else {
        (bbox.h, bbox.w)
    };

    let mut transitions = 0;
    let mut previous = None;
    for i in 0..length {
        let inked = (0..across)
            .filter(|&j| {
                let (x, y) = if horizontal {
                    (bbox.x + i, bbox.y + j)
                } else {
                    (bbox.x + j, bbox.y + i)
                };
                ink.get_pixel_checked(x as u32, y as u32)
                    .is_some_and(|p| p.0[0] > 0)
            })
            .count();
        let dense = inked as f64 * 255.0 / across as f64 > 127.0;
        if previous.is_some_and(|p| p != dense) {
            transitions += 1;
        }
        previous = Some(dense);
    }
    transitions
}

/// Fill the region enclosed by a contour; degenerate contours fill their box
fn fill_contour(mask: &mut GrayImage, contour: &RawContour) {
    let mut points: Vec<Point<i32>> = contour.points.clone();
    while points.len() > 1 && points.first() == points.last() {
        points.pop();
    }

    if points.len() >= 3 {
        draw_polygon_mut(mask, &points, Luma([255]));
    } else if let Some(bbox) = BoundingBox::from_points(&contour.to_points()) {
        fill_rect(mask, &bbox, 255);
    }
}

fn paint_white(image: &mut GrayImage, mask: &GrayImage) {
    for (pixel, m) in image.pixels_mut().zip(mask.pixels()) {
        if m.0[0] == 255 {
            *pixel = Luma([255]);
        }
    }
}

/// Blank top, bottom, left and right page bands
pub fn clear_page_margins(image: &mut GrayImage, config: &CleanupConfig) {
    let (width, height) = image.dimensions();
    let top = (height as f64 * config.top_margin) as u32;
    let bottom = height - (height as f64 * config.bottom_margin) as u32;
    let left = (width as f64 * config.side_margin) as u32;
    let right = width - (width as f64 * config.side_margin) as u32;

    for (x, y, pixel) in image.enumerate_pixels_mut() {
        if y < top || y >= bottom || x < left || x >= right {
            *pixel = Luma([255]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fill(img: &mut GrayImage, x0: u32, y0: u32, x1: u32, y1: u32) {
        for y in y0..y1 {
            for x in x0..x1 {
                img.put_pixel(x, y, Luma([0]));
            }
        }
    }

    #[test]
    fn test_portrait_is_rotated() {
        let portrait = GrayImage::new(30, 50);
        assert_eq!(ensure_landscape(&portrait).dimensions(), (50, 30));

        let landscape = GrayImage::new(50, 30);
        assert_eq!(ensure_landscape(&landscape).dimensions(), (50, 30));
    }

    #[test]
    fn test_text_removed_walls_kept() {
        let mut img = GrayImage::from_pixel(400, 300, Luma([255]));
        // Label
        fill(&mut img, 180, 140, 200, 150);
        // Wall
        fill(&mut img, 100, 75, 300, 78);

        let removed = remove_text_regions(&mut img, &CleanupConfig::default());
        assert_eq!(removed, 1);
        assert_eq!(img.get_pixel(190, 145).0[0], 255);
        assert_eq!(img.get_pixel(200, 76).0[0], 0);
    }

    #[test]
    fn test_margins_are_blanked() {
        let mut img = GrayImage::new(100, 100);
        clear_page_margins(&mut img, &CleanupConfig::default());

        assert_eq!(img.get_pixel(50, 5).0[0], 255);
        assert_eq!(img.get_pixel(50, 95).0[0], 255);
        assert_eq!(img.get_pixel(2, 50).0[0], 255);
        assert_eq!(img.get_pixel(97, 50).0[0], 255);
        assert_eq!(img.get_pixel(50, 50).0[0], 0);
    }

    /// Room outline with 3 px walls, corners exclusive
    fn room(img: &mut GrayImage, x0: u32, y0: u32, x1: u32, y1: u32) {
        fill(img, x0, y0, x1, y0 + 3);
        fill(img, x0, y1 - 3, x1, y1);
        fill(img, x0, y0, x0 + 3, y1);
        fill(img, x1 - 3, y0, x1, y1);
    }

    /// Quarter ring of door swing radius 12..=16 around the hinge
    fn door_swing(img: &mut GrayImage, hinge_x: u32, hinge_y: u32) {
        for dy in 0..20u32 {
            for dx in 0..20u32 {
                let r2 = dx * dx + dy * dy;
                if (144..=256).contains(&r2) {
                    img.put_pixel(hinge_x + dx, hinge_y + dy, Luma([0]));
                }
            }
        }
    }

    /// Framed run of 2 px treads, 91 x 25 px
    fn stair_run(img: &mut GrayImage, x0: u32, y0: u32) {
        room(img, x0, y0, x0 + 91, y0 + 25);
        for k in 1..=10 {
            let x = x0 + 8 * k;
            fill(img, x, y0, x + 2, y0 + 25);
        }
    }

    #[test]
    fn test_symbols_are_excluded_walls_kept() {
        let mut img = GrayImage::from_pixel(400, 300, Luma([255]));
        room(&mut img, 40, 40, 360, 260);
        // Wiring run, 2 px thick
        fill(&mut img, 100, 100, 180, 102);
        door_swing(&mut img, 250, 150);
        stair_run(&mut img, 100, 180);

        let found = remove_symbols(&mut img, &CleanupConfig::default());
        assert_eq!(found, 3);

        assert_eq!(img.get_pixel(140, 101).0[0], 255, "wiring left");
        assert_eq!(img.get_pixel(264, 150).0[0], 255, "door swing left");
        assert_eq!(img.get_pixel(108, 190).0[0], 255, "stair tread left");
        assert_eq!(img.get_pixel(41, 150).0[0], 0);
        assert_eq!(img.get_pixel(200, 258).0[0], 0);
    }

    #[test]
    fn test_symbol_rules() {
        let rules = SymbolConfig::default();
        let classify = |img: &GrayImage| {
            let ink = threshold_inverted(img, 180);
            let outlines = component_outlines(&ink);
            assert_eq!(outlines.len(), 1);
            classify_symbol(&outlines[0], &ink, &rules)
        };

        let mut img = GrayImage::from_pixel(120, 60, Luma([255]));
        door_swing(&mut img, 10, 10);
        assert_eq!(classify(&img), Some(Symbol::DoorSwing));

        let mut img = GrayImage::from_pixel(120, 60, Luma([255]));
        stair_run(&mut img, 10, 10);
        assert_eq!(classify(&img), Some(Symbol::Stairs));

        // Solid wall piece: elongated but without treads
        let mut img = GrayImage::from_pixel(120, 60, Luma([255]));
        fill(&mut img, 10, 10, 90, 13);
        assert_eq!(classify(&img), None);

        // Compact block: too solid for a door swing
        let mut img = GrayImage::from_pixel(120, 60, Luma([255]));
        fill(&mut img, 10, 10, 25, 25);
        assert_eq!(classify(&img), None);
    }

    #[test]
    fn test_reinforce_walls_extends_along_axes() {
        let mut img = GrayImage::from_pixel(100, 100, Luma([255]));
        fill(&mut img, 50, 20, 53, 80);

        reinforce_walls(&mut img, &CleanupConfig::default());

        assert_eq!(img.get_pixel(51, 17).0[0], 0);
        assert_eq!(img.get_pixel(51, 82).0[0], 0);
        assert_eq!(img.get_pixel(51, 16).0[0], 255);
        assert_eq!(img.get_pixel(47, 50).0[0], 0);
        assert_eq!(img.get_pixel(55, 50).0[0], 0);
        assert_eq!(img.get_pixel(46, 50).0[0], 255);
    }

    #[test]
    fn test_enhancement_turns_faint_strokes_into_ink() {
        let mut img = GrayImage::from_pixel(200, 100, Luma([255]));
        for y in 48..51 {
            for x in 20..180 {
                img.put_pixel(x, y, Luma([200]));
            }
        }
        let config = CleanupConfig::default();

        let enhanced = enhance_contrast(&img, &config);
        assert!(enhanced.get_pixel(100, 49).0[0] <= config.ink_threshold);
        assert_eq!(enhanced.get_pixel(100, 10).0[0], 255);
    }

    #[test]
    fn test_full_pass_drops_labels_and_wiring() {
        let mut img = GrayImage::from_pixel(400, 300, Luma([255]));
        room(&mut img, 60, 60, 340, 240);
        fill(&mut img, 180, 140, 200, 150);
        fill(&mut img, 100, 100, 180, 102);

        let config = CleanupConfig {
            enhance_contrast: false,
            ..CleanupConfig::default()
        };
        let cleaned = clean_floor_plan(&img, &config);

        assert_eq!(cleaned.dimensions(), (400, 300));
        assert_eq!(cleaned.get_pixel(190, 145).0[0], 255);
        assert_eq!(cleaned.get_pixel(140, 101).0[0], 255);
        assert_eq!(cleaned.get_pixel(61, 150).0[0], 0);
        // Reinforced: 3 px beyond the stroke
        assert_eq!(cleaned.get_pixel(57, 150).0[0], 0);
    }
}
