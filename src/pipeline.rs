use log::info;
use serde_derive::{Deserialize, Serialize};

use crate::camera::{add_adjust_positions_to_tracks, CameraMovement, CameraMovementEstimator};
use crate::config::AnalysisConfig;
use crate::detector::Detector;
use crate::error::Error;
use crate::frame::Frame;
use crate::interpolation::interpolate_ball_tracks;
use crate::perspective::ViewTransformer;
use crate::possession::{assign_possession, PossessionLog};
use crate::speed::SpeedAndDistanceEstimator;
use crate::store::TrackStore;
use crate::team::{assign_teams, TeamClassifier};
use crate::tracker::{MultiObjectTracker, ObjectTracker};

/// Everything a renderer needs to annotate the video.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Analysis {
    pub tracks: TrackStore,
    pub camera_movement: CameraMovement,
    pub possession: PossessionLog,
}

/// The analysis stages, built once from a validated configuration.
pub struct Pipeline {
    config: AnalysisConfig,
    camera: CameraMovementEstimator,
    view: ViewTransformer,
    speed: SpeedAndDistanceEstimator,
}

impl Pipeline {
    pub fn new(config: AnalysisConfig) -> Result<Self, Error> {
        config.validate()?;

        let camera = CameraMovementEstimator::new(config.camera.clone());
        let view = ViewTransformer::new(&config.perspective)?;
        let speed = SpeedAndDistanceEstimator::new(&config.speed)?;

        Ok(Self {
            config,
            camera,
            view,
            speed,
        })
    }

    /// Builds the stages from `config` and analyses `frames` in one go.
    pub fn run<D, T, C>(
        frames: &[Frame],
        detector: D,
        tracker: T,
        classifier: &mut C,
        config: AnalysisConfig,
    ) -> Result<Analysis, Error>
    where
        D: Detector,
        T: MultiObjectTracker,
        C: TeamClassifier + ?Sized,
    {
        Self::new(config)?.analyze(frames, detector, tracker, classifier)
    }

    pub fn analyze<D, T, C>(
        &self,
        frames: &[Frame],
        detector: D,
        tracker: T,
        classifier: &mut C,
    ) -> Result<Analysis, Error>
    where
        D: Detector,
        T: MultiObjectTracker,
        C: TeamClassifier + ?Sized,
    {
        let cache = &self.config.cache;

        let mut object_tracker = ObjectTracker::new(detector, tracker, self.config.detection.clone());
        let mut tracks =
            object_tracker.get_object_tracks(frames, cache.tracks.read, cache.tracks.path.as_deref())?;

        interpolate_ball_tracks(&mut tracks);
        tracks.add_position_to_tracks();

        let camera_movement = self.camera.get_camera_movement(
            frames,
            cache.camera_movement.read,
            cache.camera_movement.path.as_deref(),
        )?;
        add_adjust_positions_to_tracks(&mut tracks, &camera_movement)?;

        self.view.add_transformed_position_to_tracks(&mut tracks);
        self.speed.add_speed_and_distance_to_tracks(&mut tracks);

        assign_teams(&mut tracks, frames, classifier)?;
        let possession = assign_possession(&mut tracks, &self.config.possession);

        info!("analysed {} frames", tracks.len());

        Ok(Analysis {
            tracks,
            camera_movement,
            possession,
        })
    }
}
