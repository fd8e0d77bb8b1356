use serde_derive::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::camera::CameraMovementConfig;
use crate::detector::DetectorConfig;
use crate::error::Error;
use crate::perspective::ViewTransformerConfig;
use crate::possession::PossessionConfig;
use crate::speed::{SpeedAndDistanceConfig, SpeedAndDistanceEstimator};

/// Where an expensive stage keeps its results between runs.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct CacheEntry {
    // reuse `path` when it holds results for the same number of frames
    pub read: bool,
    pub path: Option<PathBuf>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct CacheConfig {
    pub tracks: CacheEntry,
    pub camera_movement: CacheEntry,
}

/// Settings of every analysis stage. Missing sections and fields take their
/// defaults, so a file only needs to mention what it changes.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct AnalysisConfig {
    pub detection: DetectorConfig,
    pub camera: CameraMovementConfig,
    pub perspective: ViewTransformerConfig,
    pub speed: SpeedAndDistanceConfig,
    pub possession: PossessionConfig,
    pub cache: CacheConfig,
}

impl AnalysisConfig {
    pub fn from_file(path: &Path) -> Result<Self, Error> {
        if !path.exists() {
            return Err(Error::missing("configuration", path));
        }

        let file = std::fs::File::open(path)?;
        let config: AnalysisConfig = serde_json::from_reader(std::io::BufReader::new(file))?;
        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), Error> {
        let detection = &self.detection;
        if detection.batch_size == 0 {
            return Err(Error::InvalidConfig("detection batch size must be at least one frame".into()));
        }

        if !(0.0..=1.0).contains(&detection.confidence_threshold) {
            return Err(Error::InvalidConfig(format!(
                "confidence threshold {} is not a probability",
                detection.confidence_threshold
            )));
        }

        let camera = &self.camera;
        if !(camera.minimum_distance >= 0.0) {
            return Err(Error::InvalidConfig(format!(
                "minimum camera movement must not be negative, got {}",
                camera.minimum_distance
            )));
        }

        if camera.stable_regions.is_empty() {
            return Err(Error::InvalidConfig("no stable regions to sample camera movement from".into()));
        }

        if let Some(region) = camera.stable_regions.iter().find(|r| r.columns.0 >= r.columns.1) {
            return Err(Error::InvalidConfig(format!("empty stable region {:?}", region)));
        }

        if camera.max_corners == 0 || camera.block_size == 0 || camera.flow.window_size == 0 {
            return Err(Error::InvalidConfig(
                "corner count, block size and flow window must be non-zero".into(),
            ));
        }

        let perspective = &self.perspective;
        if !(perspective.court_length > 0.0 && perspective.court_width > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "court dimensions must be positive, got {} x {}",
                perspective.court_length, perspective.court_width
            )));
        }

        SpeedAndDistanceEstimator::new(&self.speed)?;
        self.possession.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::possession::PossessionPolicy;
    use std::io::Write;

    #[test]
    fn defaults_are_valid() {
        let config = AnalysisConfig::default();

        assert!(config.validate().is_ok());
        assert_eq!(config.detection.batch_size, 20);
        assert_eq!(config.speed.frame_window, 5);
        assert_eq!(config.possession.max_player_ball_distance, 70.0);
        assert_eq!(config.perspective.court_width, 68.0);
        assert_eq!(config.camera.stable_regions[1].columns, (900, 1050));
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"speed": {{"frame_rate": 30.0}}, "possession": {{"policy": "break_streak"}},
               "cache": {{"tracks": {{"read": true, "path": "stubs/tracks.json"}}}}}}"#
        )
        .unwrap();

        let config = AnalysisConfig::from_file(file.path()).unwrap();

        assert_eq!(config.speed.frame_rate, 30.0);
        assert_eq!(config.speed.frame_window, 5);
        assert_eq!(config.possession.policy, PossessionPolicy::BreakStreak);
        assert!(config.cache.tracks.read);
        assert_eq!(config.cache.tracks.path, Some(PathBuf::from("stubs/tracks.json")));
        assert_eq!(config.cache.camera_movement, CacheEntry::default());
        assert_eq!(config.camera, CameraMovementConfig::default());
    }

    #[test]
    fn missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = AnalysisConfig::from_file(&dir.path().join("absent.json")).unwrap_err();

        assert!(matches!(err, Error::MissingInput { what: "configuration", .. }));
    }

    #[test]
    fn rejects_nonsense() {
        let mut config = AnalysisConfig::default();
        config.speed.frame_window = 0;
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));

        let mut config = AnalysisConfig::default();
        config.speed.frame_rate = -1.0;
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));

        let mut config = AnalysisConfig::default();
        config.detection.batch_size = 0;
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));

        let mut config = AnalysisConfig::default();
        config.possession.max_player_ball_distance = 0.0;
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }
}
