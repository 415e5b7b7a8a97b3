// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Raw contours to filtered, simplified room candidates

use crate::config::PolygonConfig;
use crate::contours::{arc_length, polygon_area};
use crate::types::{BoundingBox, Point2D, RawContour, RoomCandidate};
use uuid::Uuid;

/// Shape a raw contour into a candidate, or reject it.
///
/// The area of the unsimplified contour must lie strictly inside the area
/// band; the aspect ratio of the simplified polygon's bounding box must lie
/// strictly inside the aspect band.
pub fn build_candidate(
    contour: &RawContour,
    total_area: f64,
    config: &PolygonConfig,
) -> Option<RoomCandidate> {
    let points = contour.to_points();
    let area = polygon_area(&points);
    if area <= config.min_area_fraction * total_area || area >= config.max_area_fraction * total_area {
        return None;
    }

    let epsilon = config.simplify_fraction * arc_length(&points);
    let polygon = simplify_closed(&points, epsilon);
    let bbox = BoundingBox::from_points(&polygon)?;
    let aspect_ratio = bbox.aspect_ratio();
    if aspect_ratio <= config.min_aspect || aspect_ratio >= config.max_aspect {
        return None;
    }

    Some(RoomCandidate {
        id: new_room_id(),
        polygon,
        bbox,
        area,
        aspect_ratio,
    })
}

/// `room-` followed by the first 8 hex characters of a random UUID
pub fn new_room_id() -> String {
    let uuid = Uuid::new_v4().simple().to_string();
    format!("room-{}", &uuid[..8])
}

/// Douglas-Peucker simplification of a closed ring.
///
/// The ring is cut at the first point and at the point furthest from it; both
/// open chains are simplified and rejoined. The result does not repeat its
/// first point.
pub fn simplify_closed(points: &[Point2D], epsilon: f64) -> Vec<Point2D> {
    if points.len() < 4 {
        return points.to_vec();
    }

    let first = points[0];
    let split = points
        .iter()
        .enumerate()
        .skip(1)
        .max_by(|a, b| first.distance_to(a.1).total_cmp(&first.distance_to(b.1)))
        .map(|(i, _)| i)
        .unwrap_or(points.len() / 2);

    let mut ring = points.to_vec();
    ring.push(first);

    let mut result = douglas_peucker(&ring[..=split], epsilon);
    let tail = douglas_peucker(&ring[split..], epsilon);
    result.extend_from_slice(&tail[1..]);
    result.pop();
    result
}

/// Douglas-Peucker simplification of an open chain
fn douglas_peucker(points: &[Point2D], epsilon: f64) -> Vec<Point2D> {
    if points.len() < 3 {
        return points.to_vec();
    }

    let first = &points[0];
    let last = &points[points.len() - 1];

    let mut max_dist = 0.0;
    let mut max_idx = 0;
    for (i, point) in points.iter().enumerate().skip(1).take(points.len() - 2) {
        let dist = perpendicular_distance(point, first, last);
        if dist > max_dist {
            max_dist = dist;
            max_idx = i;
        }
    }

    if max_dist > epsilon {
        let mut result = douglas_peucker(&points[..=max_idx], epsilon);
        let right = douglas_peucker(&points[max_idx..], epsilon);
        result.extend_from_slice(&right[1..]);
        result
    } else {
        vec![*first, *last]
    }
}

fn perpendicular_distance(point: &Point2D, line_start: &Point2D, line_end: &Point2D) -> f64 {
    let dx = line_end.x - line_start.x;
    let dy = line_end.y - line_start.y;
    let length_sq = dx * dx + dy * dy;

    if length_sq < 1e-10 {
        return point.distance_to(line_start);
    }

    ((point.x - line_start.x) * dy - (point.y - line_start.y) * dx).abs() / length_sq.sqrt()
}
