// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Pipeline configuration
//!
//! Every heuristic threshold lives here as data. The two region-locating
//! strategies use different, independently tuned values; both are kept as
//! presets ([`PipelineConfig::wall_reconstruction`] and
//! [`PipelineConfig::seed_anchored`]) rather than merged into one.

use crate::error::{Result, RoomError};
use crate::types::{FloorMatch, RoomType};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Which region locator feeds the pipeline
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Hough lines on a wall mask, closed and traced (strategy A)
    WallReconstruction,
    /// Flood fill anchored on text-label hints (strategy B)
    SeedAnchored,
}

/// How accepted rooms are named
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RoomNaming {
    /// `Room 1`, `Room 2`, ... in candidate order
    Sequential,
    /// `Room Office 3f9a`: type title plus a random 4-hex suffix
    TypedSuffix,
}

/// Wall isolation: raster to likely-wall mask
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WallIsolationConfig {
    /// Pixels at or below this gray level are treated as ink
    pub ink_threshold: u8,
    /// Radius of the square closing applied to the ink mask
    pub close_radius: u8,
    /// Gaussian smoothing sigma before edge detection
    pub blur_sigma: f32,
    pub canny_low: f32,
    pub canny_high: f32,
    /// Radius of the square dilation joining broken edges
    pub dilate_radius: u8,
    /// Fraction of min(width, height) blanked at every border
    pub margin_fraction: f64,
}

impl Default for WallIsolationConfig {
    fn default() -> Self {
        Self {
            ink_threshold: 150,
            close_radius: 1,
            blur_sigma: 1.1, // equivalent of a 5x5 kernel
            canny_low: 50.0,
            canny_high: 150.0,
            dilate_radius: 1,
            margin_fraction: 0.05,
        }
    }
}

/// Probabilistic Hough parameters and wall canvas reconstruction
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LineDetectionConfig {
    /// Accumulator votes needed for a peak
    pub vote_threshold: u32,
    /// Minimum segment length in pixels
    pub min_line_length: f64,
    /// Largest gap bridged inside one segment
    pub max_line_gap: f64,
    /// Angular resolution in degrees
    pub theta_resolution_deg: f64,
    /// Distance resolution in pixels
    pub rho_resolution: f64,
    /// Peaks examined, strongest first
    pub max_peaks: usize,
    /// Stroke width used to rasterize segments
    pub stroke_width: u32,
    /// Side of the square closing element (odd)
    pub closing_kernel: u32,
}

impl Default for LineDetectionConfig {
    fn default() -> Self {
        Self {
            vote_threshold: 50,
            min_line_length: 50.0,
            max_line_gap: 10.0,
            theta_resolution_deg: 1.0,
            rho_resolution: 1.0,
            max_peaks: 500,
            stroke_width: 2,
            closing_kernel: 7,
        }
    }
}

/// Seed-anchored flood fill
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FloodFillConfig {
    /// Pixels brighter than this are open floor, the rest are walls
    pub light_threshold: u8,
    /// Sentinel written by the fill
    pub fill_value: u8,
}

impl Default for FloodFillConfig {
    fn default() -> Self {
        Self {
            light_threshold: 200,
            fill_value: 128,
        }
    }
}

/// Text-like component filter used to derive seed hints
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HintConfig {
    /// Pixels at or below this gray level are treated as ink
    pub ink_threshold: u8,
    pub min_area: f64,
    pub max_area: f64,
    /// Maximum glyph-group width as a fraction of image width
    pub max_width_fraction: f64,
    /// Maximum glyph-group height as a fraction of image height
    pub max_height_fraction: f64,
    pub min_aspect: f64,
    pub max_aspect: f64,
}

impl Default for HintConfig {
    fn default() -> Self {
        Self {
            ink_threshold: 150,
            min_area: 100.0,
            max_area: 5000.0,
            max_width_fraction: 0.2,
            max_height_fraction: 0.2,
            min_aspect: 0.2,
            max_aspect: 5.0,
        }
    }
}

/// Raster cleaning applied before extraction when requested
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CleanupConfig {
    /// Rotate portrait rasters a quarter turn clockwise
    pub ensure_landscape: bool,
    /// Equalize the histogram and darken Canny edges before text removal
    pub enhance_contrast: bool,
    /// Edge-preserving smoothing window and sigma (color and spatial)
    pub bilateral_window: u32,
    pub bilateral_sigma: f32,
    pub enhance_canny_low: f32,
    pub enhance_canny_high: f32,
    /// Gray level painted over enhanced edges
    pub edge_gray: u8,
    /// Pixels at or below this gray level are treated as ink
    pub ink_threshold: u8,
    /// Text-like components have an area strictly inside this band
    pub min_text_area: f64,
    pub max_text_area: f64,
    pub min_text_aspect: f64,
    pub max_text_aspect: f64,
    /// Growth of the erased text boxes
    pub erase_radius: u8,
    /// Blanked page margins as fractions of the image size
    pub top_margin: f64,
    pub bottom_margin: f64,
    pub side_margin: f64,
    /// Erase wiring, door swings and stair runs
    pub exclude_symbols: bool,
    pub symbols: SymbolConfig,
    /// Thicken remaining ink along rows and columns, then close small gaps
    pub reinforce_walls: bool,
    /// Length of the 1 x n and n x 1 wall dilation
    pub reinforce_length: u32,
    /// Radius of the square closing after reinforcement
    pub reinforce_close_radius: u8,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            ensure_landscape: true,
            ink_threshold: 180,
            min_text_area: 50.0,
            max_text_area: 1000.0,
            min_text_aspect: 0.2,
            max_text_aspect: 5.0,
            erase_radius: 4,
            top_margin: 0.1,
            bottom_margin: 0.1,
            side_margin: 0.05,
            enhance_contrast: true,
            bilateral_window: 9,
            bilateral_sigma: 75.0,
            enhance_canny_low: 50.0,
            enhance_canny_high: 150.0,
            edge_gray: 106,
            exclude_symbols: true,
            symbols: SymbolConfig::default(),
            reinforce_walls: true,
            reinforce_length: 7,
            reinforce_close_radius: 2,
        }
    }
}

/// Shape rules of non-structural symbols. Bounding-box sizes are in pixels
/// and every bound is exclusive.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SymbolConfig {
    /// Wiring has a box side thinner than this
    pub wiring_max_thickness: i32,
    /// and a perimeter-to-area ratio above this
    pub wiring_min_perimeter_ratio: f64,
    /// Door swings fit in a box smaller than these sides
    pub door_max_long_side: i32,
    pub door_max_short_side: i32,
    /// Contour area over convex hull area of an arc
    pub door_min_solidity: f64,
    pub door_max_solidity: f64,
    /// Stair runs are elongated (either orientation) and small
    pub stair_min_elongation: f64,
    pub stair_max_elongation: f64,
    pub stair_max_side: i32,
    /// A run needs more ink transitions than its length over this divisor
    pub stair_transition_divisor: f64,
    /// Growth of the exclusion mask before erasing
    pub exclusion_radius: u8,
}

impl Default for SymbolConfig {
    fn default() -> Self {
        Self {
            wiring_max_thickness: 3,
            wiring_min_perimeter_ratio: 1.0,
            door_max_long_side: 50,
            door_max_short_side: 20,
            door_min_solidity: 0.3,
            door_max_solidity: 0.7,
            stair_min_elongation: 3.0,
            stair_max_elongation: 30.0,
            stair_max_side: 100,
            stair_transition_divisor: 10.0,
            exclusion_radius: 2,
        }
    }
}

/// Area and shape acceptance band of the polygon builder.
/// All bounds are exclusive.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PolygonConfig {
    /// Minimum area as a fraction of the image area
    pub min_area_fraction: f64,
    /// Maximum area as a fraction of the image area
    pub max_area_fraction: f64,
    pub min_aspect: f64,
    pub max_aspect: f64,
    /// Douglas-Peucker tolerance as a fraction of the contour perimeter
    pub simplify_fraction: f64,
}

/// Near-square rule of a classifier tier (exclusive bounds)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SquareRule {
    pub min_aspect: f64,
    pub max_aspect: f64,
    pub label: RoomType,
}

/// Elongated rule of a classifier tier (exclusive lower bound)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ElongatedRule {
    pub min_aspect: f64,
    pub label: RoomType,
}

/// One relative-area band of the classifier
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClassifierTier {
    /// Tier applies when `area / total_area` is strictly greater than this.
    /// `None` matches everything and must be last.
    pub min_rel: Option<f64>,
    pub square: Option<SquareRule>,
    pub elongated: Option<ElongatedRule>,
    pub fallback: RoomType,
}

impl ClassifierTier {
    fn new(min_rel: Option<f64>, fallback: RoomType) -> Self {
        Self {
            min_rel,
            square: None,
            elongated: None,
            fallback,
        }
    }

    fn square(mut self, min_aspect: f64, max_aspect: f64, label: RoomType) -> Self {
        self.square = Some(SquareRule {
            min_aspect,
            max_aspect,
            label,
        });
        self
    }

    fn elongated(mut self, min_aspect: f64, label: RoomType) -> Self {
        self.elongated = Some(ElongatedRule { min_aspect, label });
        self
    }
}

/// Ordered band table, evaluated top to bottom
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClassifierConfig {
    pub tiers: Vec<ClassifierTier>,
}

impl ClassifierConfig {
    /// Bands used with wall reconstruction
    pub fn wall_reconstruction() -> Self {
        use RoomType::*;
        Self {
            tiers: vec![
                ClassifierTier::new(Some(0.15), Classroom).square(0.75, 1.5, Office),
                ClassifierTier::new(Some(0.05), Classroom)
                    .square(0.75, 1.5, Conference)
                    .elongated(3.0, Hallway),
                ClassifierTier::new(Some(0.01), Restroom).square(0.75, 1.5, Storage),
                ClassifierTier::new(None, Utility).elongated(3.0, Hallway),
            ],
        }
    }

    /// Bands used with seed-anchored flood fill
    pub fn seed_anchored() -> Self {
        use RoomType::*;
        Self {
            tiers: vec![
                ClassifierTier::new(Some(0.25), Hall).elongated(3.0, Hallway),
                ClassifierTier::new(Some(0.15), Classroom)
                    .square(0.7, 1.3, Conference)
                    .elongated(2.0, Hallway),
                ClassifierTier::new(Some(0.05), Laboratory)
                    .square(0.7, 1.3, Office)
                    .elongated(3.0, Hallway),
                ClassifierTier::new(Some(0.02), Office)
                    .square(0.7, 1.3, Storage)
                    .elongated(2.5, Corridor),
                ClassifierTier::new(None, Storage)
                    .square(0.7, 1.3, Utility)
                    .elongated(3.0, Corridor),
            ],
        }
    }

    fn validate(&self) -> Result<()> {
        if self.tiers.is_empty() {
            return Err(config_error("classifier needs at least one tier"));
        }

        let last = self.tiers.len() - 1;
        let mut previous: Option<f64> = None;
        for (i, tier) in self.tiers.iter().enumerate() {
            match tier.min_rel {
                Some(rel) => {
                    if !(0.0..=1.0).contains(&rel) {
                        return Err(config_error(format!("tier {i}: min_rel {rel} outside [0, 1]")));
                    }
                    if previous.is_some_and(|p| rel >= p) {
                        return Err(config_error(format!(
                            "tier {i}: min_rel {rel} must be below the previous tier"
                        )));
                    }
                    previous = Some(rel);
                }
                None if i != last => {
                    return Err(config_error(format!("tier {i}: only the last tier may omit min_rel")));
                }
                None => {}
            }

            if let Some(square) = &tier.square {
                if square.min_aspect < 0.0 || square.min_aspect >= square.max_aspect {
                    return Err(config_error(format!("tier {i}: invalid square aspect band")));
                }
            }
            if let Some(elongated) = &tier.elongated {
                if elongated.min_aspect < 0.0 {
                    return Err(config_error(format!("tier {i}: negative elongated aspect")));
                }
            }
        }

        Ok(())
    }
}

/// Complete configuration of one pipeline variant
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PipelineConfig {
    pub strategy: Strategy,
    pub walls: WallIsolationConfig,
    pub lines: LineDetectionConfig,
    pub flood_fill: FloodFillConfig,
    pub hints: HintConfig,
    pub cleanup: CleanupConfig,
    pub polygon: PolygonConfig,
    pub classifier: ClassifierConfig,
    /// Maximum bbox overlap as a fraction of the smaller room's area
    pub overlap_threshold: f64,
    pub naming: RoomNaming,
    /// Confidence stamped on every room
    pub confidence: f64,
    /// Floor tokens searched for in the file name
    pub floor_tokens: Vec<String>,
    /// Which token wins when several occur in the file name
    pub floor_match: FloorMatch,
}

impl PipelineConfig {
    /// Strategy A: line-based wall reconstruction
    pub fn wall_reconstruction() -> Self {
        Self {
            strategy: Strategy::WallReconstruction,
            walls: WallIsolationConfig::default(),
            lines: LineDetectionConfig::default(),
            flood_fill: FloodFillConfig::default(),
            hints: HintConfig::default(),
            cleanup: CleanupConfig::default(),
            polygon: PolygonConfig {
                min_area_fraction: 0.003,
                max_area_fraction: 0.5,
                min_aspect: 0.2,
                max_aspect: 5.0,
                simplify_fraction: 0.01,
            },
            classifier: ClassifierConfig::wall_reconstruction(),
            overlap_threshold: 0.6,
            naming: RoomNaming::TypedSuffix,
            confidence: 0.85,
            floor_tokens: floor_tokens(&[
                "ground",
                "mezzanine",
                "second",
                "third",
                "fourth",
                "fifth",
            ]),
            floor_match: FloorMatch::ListOrder,
        }
    }

    /// Strategy B: flood fill seeded from room labels
    pub fn seed_anchored() -> Self {
        Self {
            strategy: Strategy::SeedAnchored,
            polygon: PolygonConfig {
                min_area_fraction: 0.003,
                max_area_fraction: 0.6,
                min_aspect: 0.1,
                max_aspect: 10.0,
                simplify_fraction: 0.01,
            },
            classifier: ClassifierConfig::seed_anchored(),
            overlap_threshold: 0.7,
            naming: RoomNaming::Sequential,
            floor_tokens: floor_tokens(&[
                "ground",
                "mezzanine",
                "first",
                "second",
                "third",
                "fourth",
                "fifth",
            ]),
            floor_match: FloorMatch::EarliestInStem,
            ..Self::wall_reconstruction()
        }
    }

    /// Preset for a strategy
    pub fn for_strategy(strategy: Strategy) -> Self {
        match strategy {
            Strategy::WallReconstruction => Self::wall_reconstruction(),
            Strategy::SeedAnchored => Self::seed_anchored(),
        }
    }

    /// Load and validate a JSON configuration file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject threshold combinations that cannot produce a meaningful run
    pub fn validate(&self) -> Result<()> {
        let polygon = &self.polygon;
        if polygon.min_area_fraction < 0.0
            || polygon.max_area_fraction > 1.0
            || polygon.min_area_fraction >= polygon.max_area_fraction
        {
            return Err(config_error(format!(
                "area band [{}, {}] must satisfy 0 <= min < max <= 1",
                polygon.min_area_fraction, polygon.max_area_fraction
            )));
        }
        if polygon.min_aspect < 0.0 || polygon.min_aspect >= polygon.max_aspect {
            return Err(config_error(format!(
                "aspect band ({}, {}) must satisfy 0 <= min < max",
                polygon.min_aspect, polygon.max_aspect
            )));
        }
        if !(0.0..1.0).contains(&polygon.simplify_fraction) {
            return Err(config_error("simplify_fraction must be in [0, 1)"));
        }

        if !(0.0..=1.0).contains(&self.overlap_threshold) {
            return Err(config_error(format!(
                "overlap_threshold {} outside [0, 1]",
                self.overlap_threshold
            )));
        }
        if !(0.0..=1.0).contains(&self.confidence) {
            return Err(config_error(format!("confidence {} outside [0, 1]", self.confidence)));
        }

        let lines = &self.lines;
        if lines.min_line_length <= 0.0 || lines.max_line_gap < 0.0 {
            return Err(config_error("line lengths must be positive"));
        }
        if lines.theta_resolution_deg <= 0.0 || lines.theta_resolution_deg > 90.0 {
            return Err(config_error("theta_resolution_deg must be in (0, 90]"));
        }
        if lines.rho_resolution <= 0.0 {
            return Err(config_error("rho_resolution must be positive"));
        }
        if lines.stroke_width == 0 {
            return Err(config_error("stroke_width must be at least 1"));
        }
        if lines.closing_kernel == 0 || lines.closing_kernel % 2 == 0 {
            return Err(config_error("closing_kernel must be an odd size"));
        }

        let walls = &self.walls;
        if walls.blur_sigma < 0.0 || walls.canny_low > walls.canny_high {
            return Err(config_error("invalid wall isolation filter parameters"));
        }
        if !(0.0..0.5).contains(&walls.margin_fraction) {
            return Err(config_error("margin_fraction must be in [0, 0.5)"));
        }

        let hints = &self.hints;
        if hints.min_area < 0.0 || hints.min_area >= hints.max_area {
            return Err(config_error("hint area band must satisfy 0 <= min < max"));
        }
        if hints.min_aspect < 0.0 || hints.min_aspect >= hints.max_aspect {
            return Err(config_error("hint aspect band must satisfy 0 <= min < max"));
        }

        let cleanup = &self.cleanup;
        let margins = [cleanup.top_margin, cleanup.bottom_margin, cleanup.side_margin];
        if margins.iter().any(|m| !(0.0..0.5).contains(m)) {
            return Err(config_error("cleanup margins must be in [0, 0.5)"));
        }
        if cleanup.min_text_area >= cleanup.max_text_area
            || cleanup.min_text_aspect >= cleanup.max_text_aspect
        {
            return Err(config_error("cleanup text bands must satisfy min < max"));
        }
        if cleanup.enhance_canny_low > cleanup.enhance_canny_high {
            return Err(config_error("enhance_canny_low must not exceed enhance_canny_high"));
        }
        if cleanup.bilateral_window == 0 || cleanup.bilateral_sigma <= 0.0 {
            return Err(config_error("bilateral window and sigma must be positive"));
        }
        if cleanup.reinforce_length == 0 || cleanup.reinforce_length > 511 {
            return Err(config_error("reinforce_length must be in [1, 511]"));
        }
        let symbols = &cleanup.symbols;
        if symbols.door_min_solidity >= symbols.door_max_solidity
            || symbols.stair_min_elongation >= symbols.stair_max_elongation
        {
            return Err(config_error("symbol bands must satisfy min < max"));
        }
        if symbols.stair_transition_divisor <= 0.0 {
            return Err(config_error("stair_transition_divisor must be positive"));
        }

        if self.flood_fill.fill_value == 0 || self.flood_fill.fill_value == 255 {
            return Err(config_error("fill_value must differ from both binary levels"));
        }

        self.classifier.validate()
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::wall_reconstruction()
    }
}

/// Settings of a batch run over many images
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BatchConfig {
    /// Where room records and visualizations are written
    pub output_dir: PathBuf,
    /// Also write raster and SVG visualizations
    pub visualize: bool,
    /// Clean rasters (orientation, text, symbols, margins) before extraction
    pub clean: bool,
    /// Image extensions picked up when scanning a folder
    pub extensions: Vec<String>,
    /// File-name prefix of images to skip
    pub skip_prefix: String,
    /// Only pick up images whose file name contains this text
    pub name_contains: Option<String>,
}

impl BatchConfig {
    /// Environment variable overriding the default output directory
    pub const OUTPUT_DIR_ENV: &'static str = "FLOORPLAN_OUTPUT_DIR";

    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            visualize: true,
            clean: false,
            extensions: ["jpg", "jpeg", "png"].iter().map(|s| s.to_string()).collect(),
            skip_prefix: "placeholder".into(),
            name_contains: None,
        }
    }

    /// Output directory from `FLOORPLAN_OUTPUT_DIR`, or `./room_detection`
    pub fn from_env() -> Self {
        let output_dir = std::env::var(Self::OUTPUT_DIR_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("room_detection"));
        Self::new(output_dir)
    }
}

fn floor_tokens(tokens: &[&str]) -> Vec<String> {
    tokens.iter().map(|s| s.to_string()).collect()
}

fn config_error(message: impl Into<String>) -> RoomError {
    RoomError::Configuration(message.into())
}
