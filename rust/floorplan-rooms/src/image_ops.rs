// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Raster filters shared by the locators and the cleanup stage
//!
//! Binary masks use 255 for foreground and 0 for background.

use crate::types::BoundingBox;
use image::{GrayImage, Luma};
use imageproc::distance_transform::Norm;
use imageproc::morphology::{grayscale_dilate, Mask};

/// Binarize: pixels strictly brighter than `level` become 255, the rest 0
pub fn threshold(image: &GrayImage, level: u8) -> GrayImage {
    map_pixels(image, |v| if v > level { 255 } else { 0 })
}

/// Inverse binarization: pixels at or below `level` (ink) become 255
pub fn threshold_inverted(image: &GrayImage, level: u8) -> GrayImage {
    map_pixels(image, |v| if v > level { 0 } else { 255 })
}

/// Mask of pixels whose value lies in `lo..=hi`
pub fn in_range(image: &GrayImage, lo: u8, hi: u8) -> GrayImage {
    map_pixels(image, |v| if (lo..=hi).contains(&v) { 255 } else { 0 })
}

/// Gaussian smoothing; a non-positive sigma returns the input unchanged
pub fn gaussian_blur(image: &GrayImage, sigma: f32) -> GrayImage {
    if sigma <= 0.0 {
        return image.clone();
    }
    imageproc::filter::gaussian_blur_f32(image, sigma)
}

/// Canny edge detection
pub fn canny_edges(image: &GrayImage, low_threshold: f32, high_threshold: f32) -> GrayImage {
    imageproc::edges::canny(image, low_threshold, high_threshold)
}

/// Dilation with a `(2r+1) x (2r+1)` square element
pub fn dilate(image: &GrayImage, radius: u8) -> GrayImage {
    if radius == 0 {
        return image.clone();
    }
    imageproc::morphology::dilate(image, Norm::LInf, radius)
}

/// Erosion with a `(2r+1) x (2r+1)` square element
pub fn erode(image: &GrayImage, radius: u8) -> GrayImage {
    if radius == 0 {
        return image.clone();
    }
    imageproc::morphology::erode(image, Norm::LInf, radius)
}

/// Closing (dilate then erode) with a square element: bridges small gaps
pub fn close(image: &GrayImage, radius: u8) -> GrayImage {
    erode(&dilate(image, radius), radius)
}

/// Dilation with a straight `length`-pixel element along rows
/// (`horizontal`) or columns
pub fn dilate_directional(image: &GrayImage, length: u32, horizontal: bool) -> GrayImage {
    let length = length.clamp(1, 511);
    let center = (length / 2) as u8;
    let (element, mask) = if horizontal {
        (GrayImage::from_pixel(length, 1, Luma([255])), (center, 0))
    } else {
        (GrayImage::from_pixel(1, length, Luma([255])), (0, center))
    };
    let mask = Mask::from_image(&element, mask.0, mask.1);
    grayscale_dilate(image, &mask)
}

/// Global histogram equalization
pub fn equalize(image: &GrayImage) -> GrayImage {
    imageproc::contrast::equalize_histogram(image)
}

/// Edge-preserving smoothing over a `window` x `window` neighbourhood
pub fn bilateral(
    image: &GrayImage,
    window: u32,
    sigma_color: f32,
    sigma_spatial: f32,
) -> GrayImage {
    if image.width() == 0 || image.height() == 0 {
        return image.clone();
    }
    imageproc::filter::bilateral_filter(image, window, sigma_color, sigma_spatial)
}

/// Radius of the square element with side `kernel` (7 -> 3)
pub fn kernel_radius(kernel: u32) -> u8 {
    (kernel / 2).min(u8::MAX as u32) as u8
}

/// Overwrite a border of `margin` pixels on every side with `value`
pub fn mask_margins(image: &mut GrayImage, margin: u32, value: u8) {
    let (width, height) = image.dimensions();
    for (x, y, pixel) in image.enumerate_pixels_mut() {
        if x < margin || y < margin || x + margin >= width || y + margin >= height {
            *pixel = Luma([value]);
        }
    }
}

/// Fill a box, corners inclusive, clipped to the image
pub fn fill_rect(image: &mut GrayImage, bbox: &BoundingBox, value: u8) {
    if bbox.w <= 0 || bbox.h <= 0 {
        return;
    }
    let (width, height) = image.dimensions();
    let x0 = bbox.x.max(0);
    let y0 = bbox.y.max(0);
    let x1 = (bbox.x + bbox.w - 1).min(width as i32 - 1);
    let y1 = (bbox.y + bbox.h - 1).min(height as i32 - 1);

    for y in y0..=y1 {
        for x in x0..=x1 {
            image.put_pixel(x as u32, y as u32, Luma([value]));
        }
    }
}

/// Number of pixels that are not 0
pub fn count_nonzero(image: &GrayImage) -> usize {
    image.pixels().filter(|p| p.0[0] != 0).count()
}

fn map_pixels(image: &GrayImage, f: impl Fn(u8) -> u8) -> GrayImage {
    let mut result = GrayImage::new(image.width(), image.height());
    for (x, y, pixel) in image.enumerate_pixels() {
        result.put_pixel(x, y, Luma([f(pixel.0[0])]));
    }
    result
}
