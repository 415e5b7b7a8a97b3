// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Room extraction from raster floor plans
//!
//! This crate turns a scanned or rendered floor plan into a list of rooms:
//! 1. Locating candidate regions, either by reconstructing walls from
//!    straight line segments or by flood filling outward from room labels
//! 2. Shaping each region into a simplified polygon with bbox and area
//! 3. Classifying rooms from relative size and proportions
//! 4. Dropping lower-priority duplicates that overlap a larger room
//!
//! # Usage
//!
//! ```rust,ignore
//! use floorplan_rooms::{FloorPlanInput, Pipeline, PipelineConfig};
//!
//! let pipeline = Pipeline::new(PipelineConfig::seed_anchored())?;
//! let set = pipeline.run(FloorPlanInput::new("ground_floor.png", grayscale))?;
//!
//! for room in &set.rooms {
//!     println!("{} {} {:?}", room.name, room.room_type, room.bbox);
//! }
//! let json = serde_json::to_string_pretty(&set.to_record())?;
//! ```

pub mod batch;
pub mod classifier;
pub mod cleanup;
pub mod config;
pub mod contours;
pub mod error;
pub mod hints;
pub mod image_ops;
pub mod line_ops;
pub mod locator;
pub mod overlap;
pub mod pipeline;
pub mod polygon;
pub mod types;
pub mod visualize;
pub mod walls;

// Re-export commonly used types and functions
pub use batch::{process_folder, BatchReport};
pub use classifier::classify;
pub use config::{BatchConfig, ClassifierConfig, PipelineConfig, Strategy};
pub use error::{PipelineFailure, Result, RoomError};
pub use overlap::resolve_overlaps;
pub use pipeline::{FloorPlanInput, Pipeline, Stage};
pub use types::{
    BoundingBox, FloorMatch, FloorType, Point2D, Room, RoomCandidate, RoomSet, RoomSetRecord,
    RoomSummary, RoomType, SeedHint,
};

use image::{DynamicImage, GrayImage, RgbaImage};

/// Extract rooms from a grayscale image with a strategy's default settings
pub fn detect_rooms(
    grayscale: &GrayImage,
    strategy: Strategy,
) -> std::result::Result<RoomSet, PipelineFailure> {
    let pipeline =
        Pipeline::for_strategy(strategy).map_err(|e| PipelineFailure::new(Stage::Loaded, e))?;
    pipeline.run(FloorPlanInput::new("floorplan", grayscale.clone()))
}

/// Extract rooms from raw RGBA bytes (e.g. a rendered canvas)
pub fn detect_rooms_from_rgba(
    rgba: &[u8],
    width: u32,
    height: u32,
    strategy: Strategy,
) -> std::result::Result<RoomSet, PipelineFailure> {
    let image = RgbaImage::from_raw(width, height, rgba.to_vec()).ok_or_else(|| {
        PipelineFailure::new(
            Stage::Loaded,
            RoomError::Input(format!(
                "expected {} RGBA bytes for {width}x{height}, got {}",
                width as usize * height as usize * 4,
                rgba.len()
            )),
        )
    })?;
    let grayscale = DynamicImage::ImageRgba8(image).to_luma8();
    detect_rooms(&grayscale, strategy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn create_simple_floor_plan_image() -> GrayImage {
        let mut img = GrayImage::from_pixel(400, 300, Luma([255]));

        // Single room outlined by 3 px walls
        for y in 75..225 {
            for x in 100..300 {
                if x < 103 || x >= 297 || y < 78 || y >= 222 {
                    img.put_pixel(x, y, Luma([0]));
                }
            }
        }

        img
    }

    #[test]
    fn test_full_pipeline() {
        let img = create_simple_floor_plan_image();
        let set = detect_rooms(&img, Strategy::WallReconstruction).unwrap();

        assert!(set.processing_complete);
        assert_eq!(set.rooms.len(), 1);
        assert_eq!(set.rooms[0].room_type, RoomType::Office);
    }

    #[test]
    fn test_rgba_input() {
        let img = create_simple_floor_plan_image();
        let rgba: Vec<u8> = img.pixels().flat_map(|p| [p.0[0], p.0[0], p.0[0], 255]).collect();

        let set = detect_rooms_from_rgba(&rgba, 400, 300, Strategy::WallReconstruction).unwrap();
        assert_eq!(set.rooms.len(), 1);

        let failure = detect_rooms_from_rgba(&rgba[..100], 400, 300, Strategy::SeedAnchored).unwrap_err();
        assert_eq!(failure.stage, Stage::Loaded);
    }
}
