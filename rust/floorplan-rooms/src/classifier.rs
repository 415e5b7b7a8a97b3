// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Room type from relative size and proportions
//!
//! A coarse band table, not a learned model: the first tier whose lower
//! bound the relative area exceeds decides, and inside it a near-square
//! rule, then an elongated rule, then the tier's fallback.

use crate::config::{ClassifierConfig, ClassifierTier};
use crate::types::RoomType;

/// Label for a room of `area` with the given bbox aspect ratio
pub fn classify(
    area: f64,
    aspect_ratio: f64,
    total_area: f64,
    config: &ClassifierConfig,
) -> RoomType {
    let rel = if total_area > 0.0 { area / total_area } else { 0.0 };

    let tier = config
        .tiers
        .iter()
        .find(|tier| tier.min_rel.map_or(true, |min| rel > min))
        .or(config.tiers.last());

    match tier {
        Some(tier) => classify_in_tier(aspect_ratio, tier),
        None => RoomType::Utility,
    }
}

fn classify_in_tier(aspect_ratio: f64, tier: &ClassifierTier) -> RoomType {
    if let Some(square) = &tier.square {
        if aspect_ratio > square.min_aspect && aspect_ratio < square.max_aspect {
            return square.label;
        }
    }
    if let Some(elongated) = &tier.elongated {
        if aspect_ratio > elongated.min_aspect {
            return elongated.label;
        }
    }
    tier.fallback
}

#[cfg(test)]
mod tests {
    use super::*;
    use RoomType::*;

    const TOTAL: f64 = 10_000.0;

    fn walls() -> ClassifierConfig {
        ClassifierConfig::wall_reconstruction()
    }

    fn seeds() -> ClassifierConfig {
        ClassifierConfig::seed_anchored()
    }

    #[test]
    fn test_wall_reconstruction_bands() {
        let config = walls();
        assert_eq!(classify(2000.0, 1.0, TOTAL, &config), Office);
        assert_eq!(classify(2000.0, 4.0, TOTAL, &config), Classroom);
        assert_eq!(classify(1000.0, 1.2, TOTAL, &config), Conference);
        assert_eq!(classify(1000.0, 3.5, TOTAL, &config), Hallway);
        assert_eq!(classify(1000.0, 0.5, TOTAL, &config), Classroom);
        assert_eq!(classify(300.0, 1.0, TOTAL, &config), Storage);
        assert_eq!(classify(300.0, 4.0, TOTAL, &config), Restroom);
        assert_eq!(classify(50.0, 4.0, TOTAL, &config), Hallway);
        assert_eq!(classify(50.0, 1.0, TOTAL, &config), Utility);
    }

    #[test]
    fn test_seed_anchored_bands() {
        let config = seeds();
        assert_eq!(classify(3000.0, 1.0, TOTAL, &config), Hall);
        assert_eq!(classify(3000.0, 3.5, TOTAL, &config), Hallway);
        assert_eq!(classify(2000.0, 1.0, TOTAL, &config), Conference);
        assert_eq!(classify(2000.0, 2.5, TOTAL, &config), Hallway);
        assert_eq!(classify(2000.0, 1.5, TOTAL, &config), Classroom);
        assert_eq!(classify(1000.0, 1.0, TOTAL, &config), Office);
        assert_eq!(classify(1000.0, 2.0, TOTAL, &config), Laboratory);
        assert_eq!(classify(300.0, 1.0, TOTAL, &config), Storage);
        assert_eq!(classify(300.0, 2.6, TOTAL, &config), Corridor);
        assert_eq!(classify(300.0, 1.5, TOTAL, &config), Office);
        assert_eq!(classify(100.0, 1.0, TOTAL, &config), Utility);
        assert_eq!(classify(100.0, 3.1, TOTAL, &config), Corridor);
        assert_eq!(classify(100.0, 2.0, TOTAL, &config), Storage);
    }

    #[test]
    fn test_relative_area_boundaries_fall_to_lower_tier() {
        // rel == 0.15 exactly is not "> 0.15"
        assert_eq!(classify(1500.0, 1.0, TOTAL, &walls()), Conference);
        assert_eq!(classify(1500.0, 1.0, TOTAL, &seeds()), Office);
        // rel == 0.25 exactly
        assert_eq!(classify(2500.0, 1.0, TOTAL, &seeds()), Conference);
    }

    #[test]
    fn test_aspect_boundaries_are_exclusive() {
        let config = walls();
        assert_eq!(classify(2000.0, 0.75, TOTAL, &config), Classroom);
        assert_eq!(classify(2000.0, 1.5, TOTAL, &config), Classroom);
        assert_eq!(classify(1000.0, 3.0, TOTAL, &config), Classroom);

        let config = seeds();
        assert_eq!(classify(1000.0, 1.3, TOTAL, &config), Laboratory);
        assert_eq!(classify(1000.0, 0.7, TOTAL, &config), Laboratory);
    }

    #[test]
    fn test_deterministic_and_degenerate_inputs() {
        let config = walls();
        let first = classify(777.0, 1.1, TOTAL, &config);
        for _ in 0..10 {
            assert_eq!(classify(777.0, 1.1, TOTAL, &config), first);
        }
        assert_eq!(classify(100.0, 0.0, 0.0, &config), Utility);
        assert_eq!(classify(100.0, 1.0, TOTAL, &ClassifierConfig { tiers: vec![] }), Utility);
    }
}
