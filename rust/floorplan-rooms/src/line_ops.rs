// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Line segment detection and rasterization

use crate::config::LineDetectionConfig;
use crate::types::{DetectedLine, Point2D};
use image::{GrayImage, Luma};

/// Distance (pixels) within which an edge point is attributed to a peak line
const POINT_TOLERANCE: f64 = 2.0;

/// Detect line segments with a probabilistic Hough transform.
///
/// Every foreground pixel (> 128) votes for all `(theta, rho)` cells it lies
/// on. Peaks with at least `vote_threshold` votes are visited strongest
/// first; the still unused points near each peak line are ordered along the
/// line and split wherever consecutive points are further apart than
/// `max_line_gap`. Pieces at least `min_line_length` long become segments and
/// their points are consumed, which also withdraws their votes from every
/// cell. A peak whose live count has fallen below `vote_threshold` is skipped
/// and does not count against `max_peaks`.
pub fn detect_lines(mask: &GrayImage, config: &LineDetectionConfig) -> Vec<DetectedLine> {
    let width = mask.width() as i64;
    let height = mask.height() as i64;
    if width == 0 || height == 0 {
        return Vec::new();
    }

    let theta_resolution = config.theta_resolution_deg.to_radians();
    let num_thetas = ((std::f64::consts::PI / theta_resolution).round() as usize).max(1);
    let (cos_table, sin_table): (Vec<f64>, Vec<f64>) = (0..num_thetas)
        .map(|i| {
            let theta = i as f64 * theta_resolution;
            (theta.cos(), theta.sin())
        })
        .unzip();

    let rho_resolution = config.rho_resolution;
    let max_rho = ((width * width + height * height) as f64).sqrt();
    let num_rhos = (2.0 * max_rho / rho_resolution) as usize + 1;

    let mut edge_points: Vec<(i32, i32)> = Vec::new();
    for (x, y, pixel) in mask.enumerate_pixels() {
        if pixel.0[0] > 128 {
            edge_points.push((x as i32, y as i32));
        }
    }

    let cell_of = |t: usize, (x, y): (i32, i32)| -> Option<usize> {
        let rho = x as f64 * cos_table[t] + y as f64 * sin_table[t];
        let r = ((rho + max_rho) / rho_resolution) as usize;
        (r < num_rhos).then_some(t * num_rhos + r)
    };

    let mut accumulator = vec![0u32; num_thetas * num_rhos];
    for &point in &edge_points {
        for t in 0..num_thetas {
            if let Some(cell) = cell_of(t, point) {
                accumulator[cell] += 1;
            }
        }
    }

    let mut peaks: Vec<(usize, usize, u32)> = Vec::new();
    for t in 0..num_thetas {
        for r in 0..num_rhos {
            let votes = accumulator[t * num_rhos + r];
            if votes >= config.vote_threshold {
                peaks.push((t, r, votes));
            }
        }
    }
    peaks.sort_by(|a, b| b.2.cmp(&a.2));

    let mut used = vec![false; edge_points.len()];
    let mut lines = Vec::new();

    let mut examined = 0usize;

    for &(t, r, _) in &peaks {
        if accumulator[t * num_rhos + r] < config.vote_threshold {
            continue;
        }
        if examined == config.max_peaks {
            break;
        }
        examined += 1;

        let (cos_t, sin_t) = (cos_table[t], sin_table[t]);
        let rho = r as f64 * rho_resolution - max_rho;

        let mut on_line: Vec<(f64, usize)> = edge_points
            .iter()
            .enumerate()
            .filter(|&(i, &(x, y))| {
                !used[i] && (x as f64 * cos_t + y as f64 * sin_t - rho).abs() < POINT_TOLERANCE
            })
            .map(|(i, &(x, y))| (x as f64 * -sin_t + y as f64 * cos_t, i))
            .collect();

        if on_line.len() < 2 {
            continue;
        }
        on_line.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut segment_start = 0;
        for i in 1..=on_line.len() {
            let split = i == on_line.len() || {
                let (x0, y0) = edge_points[on_line[i - 1].1];
                let (x1, y1) = edge_points[on_line[i].1];
                let (dx, dy) = ((x1 - x0) as f64, (y1 - y0) as f64);
                (dx * dx + dy * dy).sqrt() > config.max_line_gap
            };
            if !split {
                continue;
            }

            let piece = &on_line[segment_start..i];
            if piece.len() >= 2 {
                let (sx, sy) = edge_points[piece[0].1];
                let (ex, ey) = edge_points[piece[piece.len() - 1].1];
                let line = DetectedLine::new(
                    Point2D::new(sx as f64, sy as f64),
                    Point2D::new(ex as f64, ey as f64),
                );
                if line.length() >= config.min_line_length {
                    for &(_, idx) in piece {
                        used[idx] = true;
                        for theta in 0..num_thetas {
                            if let Some(cell) = cell_of(theta, edge_points[idx]) {
                                accumulator[cell] = accumulator[cell].saturating_sub(1);
                            }
                        }
                    }
                    lines.push(line);
                }
            }
            segment_start = i;
        }
    }

    lines
}

/// Rasterize a segment as a thick stroke.
///
/// The stroke is a disk of diameter `width` swept along the Bresenham path,
/// clipped to the image.
pub fn draw_thick_line(image: &mut GrayImage, line: &DetectedLine, width: u32, value: u8) {
    let radius = (width / 2) as i32;
    let (img_w, img_h) = (image.width() as i32, image.height() as i32);

    let (x0, y0) = (line.start.x.round() as i32, line.start.y.round() as i32);
    let (x1, y1) = (line.end.x.round() as i32, line.end.y.round() as i32);
    let dx = (x1 - x0).abs();
    let dy = (y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx - dy;
    let (mut x, mut y) = (x0, y0);

    loop {
        for oy in -radius..=radius {
            for ox in -radius..=radius {
                if ox * ox + oy * oy > radius * radius {
                    continue;
                }
                let (px, py) = (x + ox, y + oy);
                if px >= 0 && px < img_w && py >= 0 && py < img_h {
                    image.put_pixel(px as u32, py as u32, Luma([value]));
                }
            }
        }

        if x == x1 && y == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 > -dy {
            err -= dy;
            x += sx;
        }
        if e2 < dx {
            err += dx;
            y += sy;
        }
    }
}
