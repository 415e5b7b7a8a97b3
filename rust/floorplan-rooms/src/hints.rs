// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Seed hints from text-like ink blobs

use crate::config::HintConfig;
use crate::contours::{component_outlines, polygon_area};
use crate::image_ops::threshold_inverted;
use crate::types::{BoundingBox, SeedHint};
use image::GrayImage;

/// Bounding boxes of small, compact ink components that look like labels
pub fn detect_text_regions(grayscale: &GrayImage, config: &HintConfig) -> Vec<SeedHint> {
    let (width, height) = grayscale.dimensions();
    let ink = threshold_inverted(grayscale, config.ink_threshold);

    let max_w = config.max_width_fraction * width as f64;
    let max_h = config.max_height_fraction * height as f64;

    component_outlines(&ink)
        .into_iter()
        .filter_map(|contour| {
            let points = contour.to_points();
            let area = polygon_area(&points);
            if area <= config.min_area || area >= config.max_area {
                return None;
            }

            let bbox = BoundingBox::from_points(&points)?;
            let aspect = bbox.aspect_ratio();
            let accepted = (bbox.w as f64) < max_w
                && (bbox.h as f64) < max_h
                && aspect > config.min_aspect
                && aspect < config.max_aspect;

            accepted.then(|| SeedHint::new(bbox.x, bbox.y, bbox.w, bbox.h))
        })
        .collect()
}
