// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-image orchestration
//!
//! A run walks a fixed sequence of stages and either completes with a
//! [`RoomSet`] or stops in the failed state, reported as a
//! [`PipelineFailure`] naming the stage. Finding no rooms is a normal,
//! completed outcome.

use crate::classifier::classify;
use crate::config::{PipelineConfig, RoomNaming, Strategy};
use crate::contours::external_contours;
use crate::error::{PipelineFailure, RoomError};
use crate::hints::detect_text_regions;
use crate::locator::{binarize_for_fill, detect_wall_lines, locate_from_seed, reconstruct_walls};
use crate::overlap::resolve_overlaps;
use crate::polygon::build_candidate;
use crate::types::{FloorType, RawContour, Room, RoomCandidate, RoomSet, RoomType, SeedHint};
use crate::walls::isolate_walls;
use image::GrayImage;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Instant;
use uuid::Uuid;

/// Stages of one pipeline run, in the order they are reached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stage {
    Loaded,
    WallsIsolated,
    LinesDetected,
    ContoursExtracted,
    HintsCollected,
    PerHintFloodFilled,
    CandidatesBuilt,
    Classified,
    Deduplicated,
    Completed,
}

/// One floor plan to process
#[derive(Debug, Clone)]
pub struct FloorPlanInput {
    /// File name or other identifier; also used to infer the floor
    pub source: String,
    pub image: GrayImage,
    /// Label boxes for seed-anchored fill; detected when absent
    pub hints: Option<Vec<SeedHint>>,
    /// Likely-wall mask for wall reconstruction; derived when absent
    pub wall_mask: Option<GrayImage>,
}

impl FloorPlanInput {
    pub fn new(source: impl Into<String>, image: GrayImage) -> Self {
        Self {
            source: source.into(),
            image,
            hints: None,
            wall_mask: None,
        }
    }

    /// Decode an image file and convert it to grayscale; the file name
    /// becomes the source
    pub fn from_path(path: impl AsRef<Path>) -> crate::Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(RoomError::Input(format!("{} is not a readable file", path.display())));
        }
        let image = image::open(path)?.to_luma8();
        let source = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self::new(source, image))
    }

    pub fn with_hints(mut self, hints: Vec<SeedHint>) -> Self {
        self.hints = Some(hints);
        self
    }

    pub fn with_wall_mask(mut self, wall_mask: GrayImage) -> Self {
        self.wall_mask = Some(wall_mask);
        self
    }
}

/// Room extraction pipeline for one configuration.
///
/// Immutable after construction, so one instance can serve many images
/// from many threads.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Validate the configuration and build a pipeline
    pub fn new(config: PipelineConfig) -> crate::Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn for_strategy(strategy: Strategy) -> crate::Result<Self> {
        Self::new(PipelineConfig::for_strategy(strategy))
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Decode `path` and run on it; decoding failures end at [`Stage::Loaded`]
    pub fn run_path(&self, path: impl AsRef<Path>) -> Result<RoomSet, PipelineFailure> {
        let input =
            FloorPlanInput::from_path(path).map_err(|e| PipelineFailure::new(Stage::Loaded, e))?;
        self.run(input)
    }

    /// Extract the rooms of one floor plan
    pub fn run(&self, input: FloorPlanInput) -> Result<RoomSet, PipelineFailure> {
        let started = Instant::now();
        let FloorPlanInput {
            source,
            image,
            hints,
            wall_mask,
        } = input;

        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(PipelineFailure::new(
                Stage::Loaded,
                RoomError::Input(format!("{source} has an empty raster ({width}x{height})")),
            ));
        }
        if let Some(mask) = &wall_mask {
            if mask.dimensions() != (width, height) {
                return Err(PipelineFailure::new(
                    Stage::Loaded,
                    RoomError::Input(format!(
                        "wall mask is {}x{}, image is {width}x{height}",
                        mask.width(),
                        mask.height()
                    )),
                ));
            }
        }

        let total_area = width as f64 * height as f64;
        tracing::info!(
            source = %source,
            width,
            height,
            strategy = ?self.config.strategy,
            "Starting room extraction"
        );
        enter(Stage::Loaded);

        let contours = match self.config.strategy {
            Strategy::WallReconstruction => self.locate_by_walls(&image, wall_mask),
            Strategy::SeedAnchored => self.locate_by_seeds(&image, hints),
        };

        let candidates: Vec<RoomCandidate> = contours
            .iter()
            .filter_map(|contour| build_candidate(contour, total_area, &self.config.polygon))
            .collect();
        enter(Stage::CandidatesBuilt);
        tracing::debug!(
            contours = contours.len(),
            candidates = candidates.len(),
            "Filtered candidates"
        );

        let rooms: Vec<Room> = candidates
            .into_iter()
            .enumerate()
            .map(|(i, candidate)| {
                let room_type = classify(
                    candidate.area,
                    candidate.aspect_ratio,
                    total_area,
                    &self.config.classifier,
                );
                let name = self.room_name(i + 1, room_type);
                Room::from_candidate(candidate, room_type, name, self.config.confidence)
            })
            .collect();
        enter(Stage::Classified);

        let before = rooms.len();
        let rooms = resolve_overlaps(rooms, self.config.overlap_threshold);
        enter(Stage::Deduplicated);
        tracing::debug!(removed = before - rooms.len(), "Resolved overlapping rooms");

        let floor =
            FloorType::from_source(&source, &self.config.floor_tokens, self.config.floor_match);
        enter(Stage::Completed);
        tracing::info!(
            source = %source,
            rooms = rooms.len(),
            floor = %floor,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Room extraction complete"
        );

        Ok(RoomSet {
            source,
            width,
            height,
            floor,
            strategy: self.config.strategy,
            rooms,
            processing_complete: true,
        })
    }

    fn locate_by_walls(&self, image: &GrayImage, wall_mask: Option<GrayImage>) -> Vec<RawContour> {
        let wall_mask = wall_mask.unwrap_or_else(|| isolate_walls(image, &self.config.walls));
        enter(Stage::WallsIsolated);

        let lines = detect_wall_lines(&wall_mask, &self.config.lines);
        enter(Stage::LinesDetected);
        tracing::debug!(lines = lines.len(), "Detected wall segments");

        let canvas = reconstruct_walls(&lines, image.width(), image.height(), &self.config.lines);
        let contours = external_contours(&canvas);
        enter(Stage::ContoursExtracted);

        contours
    }

    fn locate_by_seeds(&self, image: &GrayImage, hints: Option<Vec<SeedHint>>) -> Vec<RawContour> {
        let hints = hints.unwrap_or_else(|| detect_text_regions(image, &self.config.hints));
        enter(Stage::HintsCollected);
        tracing::debug!(hints = hints.len(), "Collected seed hints");

        let binary = binarize_for_fill(image, &self.config.flood_fill);
        let contours: Vec<RawContour> = hints
            .iter()
            .filter_map(|hint| {
                let contour = locate_from_seed(&binary, hint, &self.config.flood_fill);
                if contour.is_none() {
                    tracing::debug!(?hint, "No region for hint");
                }
                contour
            })
            .collect();
        enter(Stage::PerHintFloodFilled);

        contours
    }

    fn room_name(&self, index: usize, room_type: RoomType) -> String {
        match self.config.naming {
            RoomNaming::Sequential => format!("Room {index}"),
            RoomNaming::TypedSuffix => {
                let suffix = Uuid::new_v4().simple().to_string();
                format!("Room {} {}", room_type.title(), &suffix[..4])
            }
        }
    }
}

fn enter(stage: Stage) {
    tracing::debug!(?stage, "Pipeline stage");
}
