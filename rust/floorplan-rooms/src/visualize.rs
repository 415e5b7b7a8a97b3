// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Debug renderings of extracted rooms
//!
//! The raster overlay tints every room polygon; the SVG overlay adds the
//! `room_A`, `room_B`, ... tags and a type/area caption per room. Tags are
//! assigned here by display order and are not part of the room data.

use crate::contours::centroid;
use crate::image_ops::fill_rect;
use crate::types::{Point2D, Room, RoomSet};
use image::{GrayImage, Luma, Rgb, RgbImage};
use imageproc::drawing::{draw_line_segment_mut, draw_polygon_mut};
use imageproc::point::Point;

/// Fill opacity of room polygons
pub const FILL_ALPHA: f32 = 0.3;

/// Room colours, cycled by index
pub const PALETTE: [[u8; 3]; 14] = [
    [255, 0, 0],
    [0, 255, 0],
    [0, 0, 255],
    [255, 0, 255],
    [0, 255, 255],
    [255, 255, 0],
    [128, 0, 128],
    [0, 128, 0],
    [128, 0, 0],
    [0, 0, 128],
    [128, 128, 0],
    [0, 128, 128],
    [255, 165, 0],
    [75, 0, 130],
];

pub fn room_color(index: usize) -> [u8; 3] {
    PALETTE[index % PALETTE.len()]
}

/// `room_A` ... `room_Z`, then `room_AA`, `room_AB`, ...
pub fn room_tag(index: usize) -> String {
    let mut letters = Vec::new();
    let mut n = index + 1;
    while n > 0 {
        n -= 1;
        letters.push((b'A' + (n % 26) as u8) as char);
        n /= 26;
    }
    let tag: String = letters.into_iter().rev().collect();
    format!("room_{tag}")
}

/// `office (296.5m²)`: type and area in square metres at 100 px² per m²
pub fn room_caption(room: &Room) -> String {
    format!("{} ({:.1}m²)", room.room_type, room.area / 100.0)
}

/// Where a room's tag is placed: polygon centroid, or bbox centre when the
/// polygon encloses no area
pub fn tag_anchor(room: &Room) -> Point2D {
    centroid(&room.polygon).unwrap_or_else(|| {
        let (cx, cy) = room.bbox.center();
        Point2D::new(cx as f64, cy as f64)
    })
}

/// Floor plan in colour with every room tinted and outlined
pub fn render_overlay(base: &GrayImage, rooms: &[Room]) -> RgbImage {
    let mut canvas = RgbImage::from_fn(base.width(), base.height(), |x, y| {
        let v = base.get_pixel(x, y).0[0];
        Rgb([v, v, v])
    });

    for (i, room) in rooms.iter().enumerate() {
        let color = room_color(i);
        let region = room_mask(room, base.width(), base.height());
        for (pixel, inside) in canvas.pixels_mut().zip(region.pixels()) {
            if inside.0[0] != 0 {
                *pixel = blend(*pixel, color);
            }
        }

        let n = room.polygon.len();
        for k in 0..n {
            let (a, b) = (room.polygon[k], room.polygon[(k + 1) % n]);
            draw_line_segment_mut(
                &mut canvas,
                (a.x as f32, a.y as f32),
                (b.x as f32, b.y as f32),
                Rgb(color),
            );
        }
    }

    canvas
}

/// SVG overlay: polygons, tags and captions over an optional background
pub fn render_svg(set: &RoomSet, background_href: Option<&str>) -> String {
    let (w, h) = (set.width, set.height);
    let mut svg = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">
<defs>
  <style>
    .room {{ fill-opacity: {FILL_ALPHA}; stroke-width: 2; }}
    .tag-box {{ fill: #ffffff; }}
    .tag {{ font-family: sans-serif; font-size: 14px; font-weight: bold; text-anchor: middle; dominant-baseline: middle; }}
    .caption {{ font-family: sans-serif; font-size: 10px; fill: #000000; }}
  </style>
</defs>
"#
    );

    if let Some(href) = background_href {
        svg.push_str(&format!(
            "<image href=\"{}\" width=\"{w}\" height=\"{h}\"/>\n",
            xml_escape(href)
        ));
    }

    for (i, room) in set.rooms.iter().enumerate() {
        let [r, g, b] = room_color(i);
        let fill = format!("#{r:02x}{g:02x}{b:02x}");
        let points: Vec<String> = room
            .polygon
            .iter()
            .map(|p| format!("{:.1},{:.1}", p.x, p.y))
            .collect();

        let tag = room_tag(i);
        let anchor = tag_anchor(room);
        let box_w = tag.len() as f64 * 9.0 + 10.0;

        svg.push_str(&format!(
            r#"<g id="{tag}" data-room-id="{id}">
  <polygon points="{points}" class="room" fill="{fill}" stroke="{fill}"/>
  <rect x="{bx:.1}" y="{by:.1}" width="{box_w:.1}" height="22" class="tag-box"/>
  <text x="{ax:.1}" y="{ay:.1}" class="tag" fill="{fill}">{tag}</text>
  <text x="{cx}" y="{cy}" class="caption">{caption}</text>
</g>
"#,
            id = xml_escape(&room.id),
            points = points.join(" "),
            bx = anchor.x - box_w / 2.0,
            by = anchor.y - 11.0,
            ax = anchor.x,
            ay = anchor.y,
            cx = room.bbox.x + 5,
            cy = room.bbox.y + room.bbox.h - 10,
            caption = xml_escape(&room_caption(room)),
        ));
    }

    svg.push_str("</svg>\n");
    svg
}

fn room_mask(room: &Room, width: u32, height: u32) -> GrayImage {
    let mut mask = GrayImage::new(width, height);

    let mut points: Vec<Point<i32>> = Vec::with_capacity(room.polygon.len());
    for p in &room.polygon {
        let q = Point::new(p.x.round() as i32, p.y.round() as i32);
        if points.last() != Some(&q) {
            points.push(q);
        }
    }
    while points.len() > 1 && points.first() == points.last() {
        points.pop();
    }

    if points.len() >= 3 {
        draw_polygon_mut(&mut mask, &points, Luma([255]));
    } else {
        fill_rect(&mut mask, &room.bbox, 255);
    }
    mask
}

fn blend(pixel: Rgb<u8>, color: [u8; 3]) -> Rgb<u8> {
    let mix = |base: u8, tint: u8| {
        (base as f32 * (1.0 - FILL_ALPHA) + tint as f32 * FILL_ALPHA).round() as u8
    };
    Rgb([
        mix(pixel.0[0], color[0]),
        mix(pixel.0[1], color[1]),
        mix(pixel.0[2], color[2]),
    ])
}

fn xml_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
