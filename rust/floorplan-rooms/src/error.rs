// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for room extraction

use crate::pipeline::Stage;
use thiserror::Error;

/// Result type for room extraction operations
pub type Result<T> = std::result::Result<T, RoomError>;

/// Errors that can occur while extracting rooms
#[derive(Error, Debug)]
pub enum RoomError {
    #[error("Invalid input image: {0}")]
    Input(String),

    #[error("Failed to decode image: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A pipeline run that ended in the `Failed` state
#[derive(Error, Debug)]
#[error("Room extraction failed at stage {stage:?}: {source}")]
pub struct PipelineFailure {
    /// Stage the failure originated in
    pub stage: Stage,
    #[source]
    pub source: RoomError,
}

impl PipelineFailure {
    pub fn new(stage: Stage, source: RoomError) -> Self {
        Self { stage, source }
    }
}
