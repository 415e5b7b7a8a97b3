// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Folder processing and result persistence
//!
//! Images are processed in parallel, one image per task. A failing image is
//! recorded in the report and never stops the batch.

use crate::cleanup::{clean_floor_plan, ensure_landscape};
use crate::config::{BatchConfig, Strategy};
use crate::error::{PipelineFailure, Result, RoomError};
use crate::hints::detect_text_regions;
use crate::pipeline::{FloorPlanInput, Pipeline, Stage};
use crate::types::RoomSet;
use crate::visualize::{render_overlay, render_svg};
use image::GrayImage;
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Why one image of a batch produced no output
#[derive(Error, Debug)]
pub enum ItemError {
    #[error(transparent)]
    Pipeline(#[from] PipelineFailure),

    #[error("Failed to write results: {0}")]
    Persist(#[source] RoomError),
}

/// Files written for one image
#[derive(Debug, Clone, PartialEq)]
pub struct PersistedFiles {
    pub rooms_json: PathBuf,
    pub visualization: Option<PathBuf>,
    pub svg_overlay: Option<PathBuf>,
}

/// Result of one processed image
#[derive(Debug)]
pub struct ProcessedImage {
    pub set: RoomSet,
    pub files: PersistedFiles,
}

#[derive(Debug)]
pub struct BatchItem {
    pub path: PathBuf,
    pub result: std::result::Result<ProcessedImage, ItemError>,
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub items: Vec<BatchItem>,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.items.iter().filter(|item| item.result.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.items.len() - self.succeeded()
    }

    pub fn total_rooms(&self) -> usize {
        self.items
            .iter()
            .filter_map(|item| item.result.as_ref().ok())
            .map(|processed| processed.set.rooms.len())
            .sum()
    }
}

/// Floor-plan images directly inside `dir`, sorted by file name
pub fn list_images(dir: &Path, config: &BatchConfig) -> Result<Vec<PathBuf>> {
    let mut images = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        if !config.skip_prefix.is_empty() && name.starts_with(&config.skip_prefix) {
            continue;
        }
        if let Some(needle) = &config.name_contains {
            if !name.contains(needle.as_str()) {
                continue;
            }
        }

        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        if config.extensions.iter().any(|e| e.eq_ignore_ascii_case(&extension)) {
            images.push(path);
        }
    }

    images.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(images)
}

/// Process every image of a folder in parallel
pub fn process_folder(pipeline: &Pipeline, dir: &Path, config: &BatchConfig) -> Result<BatchReport> {
    let images = list_images(dir, config)?;
    fs::create_dir_all(&config.output_dir)?;
    tracing::info!(
        folder = %dir.display(),
        images = images.len(),
        output_dir = %config.output_dir.display(),
        "Starting batch"
    );

    let items: Vec<BatchItem> = images
        .into_par_iter()
        .map(|path| {
            let result = process_file(pipeline, &path, config);
            if let Err(e) = &result {
                tracing::warn!(path = %path.display(), error = %e, "Skipping image");
            }
            BatchItem { path, result }
        })
        .collect();

    let report = BatchReport { items };
    tracing::info!(
        succeeded = report.succeeded(),
        failed = report.failed(),
        rooms = report.total_rooms(),
        "Batch complete"
    );
    Ok(report)
}

/// Load, optionally clean, extract and persist one image
pub fn process_file(
    pipeline: &Pipeline,
    path: &Path,
    config: &BatchConfig,
) -> std::result::Result<ProcessedImage, ItemError> {
    let input =
        FloorPlanInput::from_path(path).map_err(|e| PipelineFailure::new(Stage::Loaded, e))?;
    let input = if config.clean {
        prepare_clean_input(pipeline, input)
    } else {
        input
    };

    let image = input.image.clone();
    let set = pipeline.run(input)?;
    let files = persist(&set, &image, path, config).map_err(ItemError::Persist)?;
    Ok(ProcessedImage { set, files })
}

/// Clean the raster; labels are located before they are erased so seed
/// hints survive cleaning
pub fn prepare_clean_input(pipeline: &Pipeline, input: FloorPlanInput) -> FloorPlanInput {
    let config = pipeline.config();
    let oriented = if config.cleanup.ensure_landscape {
        ensure_landscape(&input.image)
    } else {
        input.image
    };

    let hints = match (input.hints, config.strategy) {
        (Some(hints), _) => Some(hints),
        (None, Strategy::SeedAnchored) => Some(detect_text_regions(&oriented, &config.hints)),
        (None, Strategy::WallReconstruction) => None,
    };

    let mut cleanup = config.cleanup.clone();
    cleanup.ensure_landscape = false;

    FloorPlanInput {
        source: input.source,
        image: clean_floor_plan(&oriented, &cleanup),
        hints,
        wall_mask: input.wall_mask,
    }
}

/// File stem used for every output of `source`
fn output_stem(source: &Path) -> String {
    source
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "floorplan".to_string())
}

/// Write the room record and, when enabled, the visualizations
pub fn persist(
    set: &RoomSet,
    image: &GrayImage,
    source: &Path,
    config: &BatchConfig,
) -> Result<PersistedFiles> {
    fs::create_dir_all(&config.output_dir)?;
    let stem = output_stem(source);

    let json_name = match set.strategy {
        Strategy::WallReconstruction => format!("{stem}_enhanced_rooms.json"),
        Strategy::SeedAnchored => format!("{stem}_rooms.json"),
    };
    let rooms_json = config.output_dir.join(json_name);
    fs::write(&rooms_json, serde_json::to_string_pretty(&set.to_record())?)?;

    let (visualization, svg_overlay) = if config.visualize {
        let png = config.output_dir.join(format!("{stem}_visualization.png"));
        render_overlay(image, &set.rooms).save(&png)?;

        let svg = config.output_dir.join(format!("{stem}_overlay.svg"));
        let background = png.file_name().map(|n| n.to_string_lossy().to_string());
        fs::write(&svg, render_svg(set, background.as_deref()))?;

        (Some(png), Some(svg))
    } else {
        (None, None)
    };

    tracing::debug!(json = %rooms_json.display(), "Saved room data");
    Ok(PersistedFiles {
        rooms_json,
        visualization,
        svg_overlay,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FloorType, RoomSetRecord};
    use image::Luma;

    fn plan() -> GrayImage {
        let mut img = GrayImage::from_pixel(400, 300, Luma([255]));
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
    fn test_list_images_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b_first.PNG", "a_ground.jpg", "placeholder_1.png", "notes.txt", "c.jpeg"] {
            fs::write(dir.path().join(name), b"x").unwrap();
        }
        fs::create_dir(dir.path().join("nested.png")).unwrap();

        let config = BatchConfig::new(dir.path().join("out"));
        let names: Vec<String> = list_images(dir.path(), &config)
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();

        assert_eq!(names, ["a_ground.jpg", "b_first.PNG", "c.jpeg"]);
    }

    #[test]
    fn test_list_images_name_filter() {
        let dir = tempfile::tempdir().unwrap();
        let names = [
            "ground_processed.png",
            "ground.png",
            "first_processed.txt",
            "attic_processed.jpg",
        ];
        for name in names {
            fs::write(dir.path().join(name), b"x").unwrap();
        }

        let config = BatchConfig {
            name_contains: Some("processed".into()),
            ..BatchConfig::new(dir.path().join("out"))
        };
        let names: Vec<String> = list_images(dir.path(), &config)
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();

        assert_eq!(names, ["attic_processed.jpg", "ground_processed.png"]);
    }

    #[test]
    fn test_persist_file_names_follow_strategy() {
        let dir = tempfile::tempdir().unwrap();
        let config = BatchConfig::new(dir.path());
        let mut set = RoomSet {
            source: "first_floor.png".into(),
            width: 400,
            height: 300,
            floor: FloorType::unknown(),
            strategy: Strategy::WallReconstruction,
            rooms: Vec::new(),
            processing_complete: true,
        };

        let files = persist(&set, &plan(), Path::new("first_floor.png"), &config).unwrap();
        assert!(files.rooms_json.ends_with("first_floor_enhanced_rooms.json"));
        assert!(files.visualization.unwrap().exists());
        assert!(files.svg_overlay.unwrap().exists());

        set.strategy = Strategy::SeedAnchored;
        let config = BatchConfig {
            visualize: false,
            ..config
        };
        let files = persist(&set, &plan(), Path::new("first_floor.png"), &config).unwrap();
        assert!(files.rooms_json.ends_with("first_floor_rooms.json"));
        assert!(files.visualization.is_none());
    }

    #[test]
    fn test_folder_continues_after_bad_image() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        plan().save(input.path().join("ground_floor.png")).unwrap();
        fs::write(input.path().join("broken.png"), b"not a png").unwrap();

        let pipeline = Pipeline::for_strategy(Strategy::WallReconstruction).unwrap();
        let config = BatchConfig::new(output.path());
        let report = process_folder(&pipeline, input.path(), &config).unwrap();

        assert_eq!(report.items.len(), 2);
        assert_eq!(report.succeeded(), 1);
        assert_eq!(report.failed(), 1);

        let broken = report.items.iter().find(|i| i.path.ends_with("broken.png")).unwrap();
        match &broken.result {
            Err(ItemError::Pipeline(failure)) => assert_eq!(failure.stage, Stage::Loaded),
            other => panic!("expected a load failure, got {other:?}"),
        }

        let json = fs::read_to_string(output.path().join("ground_floor_enhanced_rooms.json")).unwrap();
        let record: RoomSetRecord = serde_json::from_str(&json).unwrap();
        assert!(record.processing_complete);
        assert!(record.enhanced_detection);
        assert_eq!(record.floor.as_str(), "ground");
        assert_eq!(record.rooms.len(), 1);
    }

    #[test]
    fn test_clean_input_keeps_labels_as_hints() {
        let mut img = plan();
        for y in 140..150 {
            for x in 180..200 {
                img.put_pixel(x, y, Luma([0]));
            }
        }
        let pipeline = Pipeline::for_strategy(Strategy::SeedAnchored).unwrap();

        let input = prepare_clean_input(&pipeline, FloorPlanInput::new("plan.png", img));
        assert_eq!(input.hints.as_ref().map(Vec::len), Some(1));
        // Label erased from the raster itself
        assert_eq!(input.image.get_pixel(190, 145).0[0], 255);
    }
}
