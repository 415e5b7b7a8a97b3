// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Duplicate room suppression

use crate::types::Room;

/// Keep the larger of any two rooms whose bounding boxes overlap too much.
///
/// Rooms are visited by descending area (ties keep input order). A room is
/// accepted unless its bbox intersection with an already accepted room
/// exceeds `threshold` times the smaller of the two room areas. Only
/// bounding boxes are compared, so L-shaped rooms may be over-suppressed.
pub fn resolve_overlaps(mut rooms: Vec<Room>, threshold: f64) -> Vec<Room> {
    rooms.sort_by(|a, b| b.area.total_cmp(&a.area));

    let mut accepted: Vec<Room> = Vec::with_capacity(rooms.len());
    for room in rooms {
        let duplicate = accepted.iter().any(|kept| {
            let shared = room.bbox.intersection_area(&kept.bbox);
            shared > threshold * room.area.min(kept.area)
        });
        if !duplicate {
            accepted.push(room);
        }
    }

    accepted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BoundingBox, RoomType};

    fn room(name: &str, x: i32, y: i32, w: i32, h: i32) -> Room {
        Room {
            id: format!("room-{name}"),
            name: name.to_string(),
            room_type: RoomType::Office,
            polygon: Vec::new(),
            bbox: BoundingBox::new(x, y, w, h),
            area: (w * h) as f64,
            aspect_ratio: w as f64 / h as f64,
            confidence: 0.85,
        }
    }

    fn names(rooms: &[Room]) -> Vec<&str> {
        rooms.iter().map(|r| r.name.as_str()).collect()
    }

    #[test]
    fn test_larger_room_wins() {
        let small = room("small", 10, 10, 90, 90);
        let large = room("large", 0, 0, 100, 100);

        let kept = resolve_overlaps(vec![small, large], 0.6);
        assert_eq!(names(&kept), ["large"]);
    }

    #[test]
    fn test_moderate_overlap_is_kept() {
        // Shared strip 20x100 = 2000, smaller area 10000: 0.2 of it
        let a = room("a", 0, 0, 100, 100);
        let b = room("b", 80, 0, 120, 100);

        let kept = resolve_overlaps(vec![a, b], 0.6);
        assert_eq!(names(&kept), ["b", "a"]);
    }

    #[test]
    fn test_threshold_is_inclusive_for_keeping() {
        // Intersection 60x100 = 6000 == 0.6 * 10000
        let a = room("a", 0, 0, 100, 100);
        let b = room("b", 40, 0, 110, 100);
        assert_eq!(resolve_overlaps(vec![a.clone(), b.clone()], 0.6).len(), 2);
        assert_eq!(resolve_overlaps(vec![a, b], 0.59).len(), 1);
    }

    #[test]
    fn test_sort_is_stable_and_descending() {
        let rooms = vec![
            room("first", 0, 0, 10, 10),
            room("big", 100, 100, 50, 50),
            room("second", 300, 300, 10, 10),
        ];

        let kept = resolve_overlaps(rooms, 0.7);
        assert_eq!(names(&kept), ["big", "first", "second"]);
    }

    #[test]
    fn test_result_satisfies_overlap_invariant() {
        let rooms: Vec<Room> = (0..12)
            .map(|i| room(&format!("r{i}"), i * 15, (i % 3) * 20, 40 + i * 3, 50))
            .collect();

        let kept = resolve_overlaps(rooms, 0.6);
        for (i, a) in kept.iter().enumerate() {
            for b in &kept[i + 1..] {
                assert!(a.bbox.intersection_area(&b.bbox) <= 0.6 * a.area.min(b.area));
                assert!(a.area >= b.area);
            }
        }
    }
}
