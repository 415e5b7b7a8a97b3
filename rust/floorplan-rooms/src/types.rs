// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Core types for room extraction

use crate::config::Strategy;
use imageproc::point::Point;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// A 2D point (simplified for serialization)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: &Point2D) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }
}

impl From<Point<i32>> for Point2D {
    fn from(p: Point<i32>) -> Self {
        Self::new(p.x as f64, p.y as f64)
    }
}

/// Detected line segment from the Hough transform
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct DetectedLine {
    pub start: Point2D,
    pub end: Point2D,
}

impl DetectedLine {
    pub fn new(start: Point2D, end: Point2D) -> Self {
        Self { start, end }
    }

    pub fn length(&self) -> f64 {
        self.start.distance_to(&self.end)
    }
}

/// Axis-aligned pixel bounding box.
///
/// Follows the inclusive pixel convention: a box covering columns 10..=19
/// has `x = 10` and `w = 10`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct BoundingBox {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl BoundingBox {
    pub fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    /// Bounding box of a point set, `None` when the set is empty
    pub fn from_points(points: &[Point2D]) -> Option<Self> {
        let first = points.first()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
        for p in &points[1..] {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }

        let x = min_x.floor() as i32;
        let y = min_y.floor() as i32;
        Some(Self {
            x,
            y,
            w: max_x.floor() as i32 - x + 1,
            h: max_y.floor() as i32 - y + 1,
        })
    }

    pub fn area(&self) -> f64 {
        self.w.max(0) as f64 * self.h.max(0) as f64
    }

    /// Width divided by height; 0 for a degenerate box
    pub fn aspect_ratio(&self) -> f64 {
        if self.h <= 0 {
            0.0
        } else {
            self.w as f64 / self.h as f64
        }
    }

    /// Area shared by two boxes
    pub fn intersection_area(&self, other: &BoundingBox) -> f64 {
        let overlap_x = ((self.x + self.w).min(other.x + other.w) - self.x.max(other.x)).max(0);
        let overlap_y = ((self.y + self.h).min(other.y + other.h) - self.y.max(other.y)).max(0);
        overlap_x as f64 * overlap_y as f64
    }

    pub fn center(&self) -> (i32, i32) {
        (self.x + self.w / 2, self.y + self.h / 2)
    }
}

/// Bounding box of a text label believed to sit inside a room
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct SeedHint {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl SeedHint {
    pub fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    pub fn bbox(&self) -> BoundingBox {
        BoundingBox::new(self.x, self.y, self.w, self.h)
    }

    /// Center pixel, using integer division like the box itself
    pub fn center(&self) -> (i32, i32) {
        self.bbox().center()
    }
}

/// Closed boundary produced by the region locator, not yet simplified
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawContour {
    pub points: Vec<Point<i32>>,
}

impl RawContour {
    pub fn new(points: Vec<Point<i32>>) -> Self {
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn to_points(&self) -> Vec<Point2D> {
        self.points.iter().map(|&p| Point2D::from(p)).collect()
    }
}

/// Room type label assigned by the classifier
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum RoomType {
    Office,
    Hall,
    Hallway,
    Classroom,
    Conference,
    Laboratory,
    Storage,
    Corridor,
    Restroom,
    Utility,
    Reception,
}

impl RoomType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoomType::Office => "office",
            RoomType::Hall => "hall",
            RoomType::Hallway => "hallway",
            RoomType::Classroom => "classroom",
            RoomType::Conference => "conference",
            RoomType::Laboratory => "laboratory",
            RoomType::Storage => "storage",
            RoomType::Corridor => "corridor",
            RoomType::Restroom => "restroom",
            RoomType::Utility => "utility",
            RoomType::Reception => "reception",
        }
    }

    /// Label with a leading capital, used in generated room names
    pub fn title(&self) -> String {
        let label = self.as_str();
        let mut chars = label.chars();
        match chars.next() {
            Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
            None => String::new(),
        }
    }
}

impl fmt::Display for RoomType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rule picking one floor token when several occur in a file name
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FloorMatch {
    /// Earliest token of the configured list
    #[default]
    ListOrder,
    /// Token occurring first in the file stem
    EarliestInStem,
}

/// Floor level inferred from the source file name
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct FloorType(String);

impl FloorType {
    pub const UNKNOWN: &'static str = "unknown";

    pub fn unknown() -> Self {
        Self(Self::UNKNOWN.to_string())
    }

    /// Match the lowercased file stem against `tokens`.
    ///
    /// With [`FloorMatch::ListOrder`] the first token of the list found
    /// anywhere in the stem wins; with [`FloorMatch::EarliestInStem`] the
    /// token starting leftmost in the stem wins, ties going to list order.
    pub fn from_source(source: &str, tokens: &[String], matching: FloorMatch) -> Self {
        let stem = Path::new(source)
            .file_stem()
            .map(|s| s.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        let mut found = tokens
            .iter()
            .filter(|token| !token.is_empty())
            .map(|token| token.to_lowercase())
            .filter_map(|token| stem.find(&token).map(|at| (at, token)));

        let token = match matching {
            FloorMatch::ListOrder => found.next(),
            FloorMatch::EarliestInStem => found.fold(None, |best, (at, token)| match best {
                Some((best_at, _)) if best_at <= at => best,
                _ => Some((at, token)),
            }),
        };

        token.map(|(_, token)| Self(token)).unwrap_or_else(Self::unknown)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FloorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Simplified polygon that passed the area and aspect filters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomCandidate {
    pub id: String,
    /// Simplified closed polygon (first point is not repeated)
    pub polygon: Vec<Point2D>,
    pub bbox: BoundingBox,
    /// Enclosed area of the raw contour in square pixels
    pub area: f64,
    pub aspect_ratio: f64,
}

/// Classified room carrying its geometry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Room {
    pub id: String,
    pub name: String,
    pub room_type: RoomType,
    pub polygon: Vec<Point2D>,
    pub bbox: BoundingBox,
    pub area: f64,
    pub aspect_ratio: f64,
    /// Fixed heuristic constant, not a calibrated probability
    pub confidence: f64,
}

impl Room {
    pub fn from_candidate(
        candidate: RoomCandidate,
        room_type: RoomType,
        name: String,
        confidence: f64,
    ) -> Self {
        Self {
            id: candidate.id,
            name,
            room_type,
            polygon: candidate.polygon,
            bbox: candidate.bbox,
            area: candidate.area,
            aspect_ratio: candidate.aspect_ratio,
            confidence,
        }
    }

    pub fn summary(&self) -> RoomSummary {
        RoomSummary::from(self)
    }
}

/// Geometry-free view of a room, as persisted
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoomSummary {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub room_type: RoomType,
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    pub area: f64,
    pub aspect_ratio: f64,
    pub confidence: f64,
}

impl From<&Room> for RoomSummary {
    fn from(room: &Room) -> Self {
        Self {
            id: room.id.clone(),
            name: room.name.clone(),
            room_type: room.room_type,
            x: room.bbox.x,
            y: room.bbox.y,
            width: room.bbox.w,
            height: room.bbox.h,
            area: room.area,
            aspect_ratio: room.aspect_ratio,
            confidence: room.confidence,
        }
    }
}

/// Deduplicated rooms of one image
#[derive(Debug, Clone)]
pub struct RoomSet {
    pub source: String,
    pub width: u32,
    pub height: u32,
    pub floor: FloorType,
    pub strategy: Strategy,
    /// Ordered by descending area
    pub rooms: Vec<Room>,
    pub processing_complete: bool,
}

impl RoomSet {
    pub fn total_area(&self) -> f64 {
        self.width as f64 * self.height as f64
    }

    /// External record with polygons stripped
    pub fn to_record(&self) -> RoomSetRecord {
        RoomSetRecord {
            source: self.source.clone(),
            width: self.width,
            height: self.height,
            floor: self.floor.clone(),
            rooms: self.rooms.iter().map(RoomSummary::from).collect(),
            processing_complete: self.processing_complete,
            enhanced_detection: self.strategy == Strategy::WallReconstruction,
        }
    }
}

/// Persisted form of a [`RoomSet`]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RoomSetRecord {
    pub source: String,
    pub width: u32,
    pub height: u32,
    pub floor: FloorType,
    pub rooms: Vec<RoomSummary>,
    pub processing_complete: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub enhanced_detection: bool,
}
