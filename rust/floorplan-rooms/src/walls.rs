// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Wall isolation for line-based room reconstruction

use crate::config::WallIsolationConfig;
use crate::image_ops::{canny_edges, close, dilate, gaussian_blur, mask_margins, threshold_inverted};
use image::GrayImage;

/// Produce the likely-wall mask (255 = wall) of a grayscale floor plan
pub fn isolate_walls(grayscale: &GrayImage, config: &WallIsolationConfig) -> GrayImage {
    // Step 1: Ink becomes foreground
    let ink = threshold_inverted(grayscale, config.ink_threshold);

    // Step 2: Join hairline breaks in the strokes
    let closed = close(&ink, config.close_radius);

    // Step 3: Smooth, then trace stroke borders
    let blurred = gaussian_blur(&closed, config.blur_sigma);
    let edges = canny_edges(&blurred, config.canny_low, config.canny_high);

    // Step 4: Thicken edges so both sides of a wall merge
    let mut walls = dilate(&edges, config.dilate_radius);

    // Step 5: Drop frames, title blocks and scanner borders
    let margin = margin_pixels(walls.width(), walls.height(), config.margin_fraction);
    mask_margins(&mut walls, margin, 0);

    walls
}

fn margin_pixels(width: u32, height: u32, fraction: f64) -> u32 {
    (width.min(height) as f64 * fraction) as u32
}
