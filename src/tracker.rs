use log::{info, warn};
use std::path::Path;

use crate::cache;
use crate::detection::{DetectedClass, Detection, TrackedDetection};
use crate::detector::{detect_frames, Detector, DetectorConfig};
use crate::error::Error;
use crate::frame::Frame;
use crate::store::TrackStore;
use crate::track::{ObjectClass, BALL_TRACK_ID};

/// Multi-object tracker giving stable ids to players and referees.
///
/// `update` is called once per frame, in frame order.
pub trait MultiObjectTracker {
    fn update(&mut self, detections: &[Detection]) -> Result<Vec<TrackedDetection>, Error>;
}

pub struct ObjectTracker<D, T> {
    detector: D,
    tracker: T,
    config: DetectorConfig,
}

impl<D: Detector, T: MultiObjectTracker> ObjectTracker<D, T> {
    pub fn new(detector: D, tracker: T, config: DetectorConfig) -> Self {
        Self {
            detector,
            tracker,
            config,
        }
    }

    /// Detects and tracks every object in `frames`.
    ///
    /// With `read_from_cache` set, a cache at `cache_path` built from the same
    /// number of frames is returned as is. Freshly computed tracks are written
    /// to `cache_path` when one is given.
    pub fn get_object_tracks(
        &mut self,
        frames: &[Frame],
        read_from_cache: bool,
        cache_path: Option<&Path>,
    ) -> Result<TrackStore, Error> {
        if let (true, Some(path)) = (read_from_cache, cache_path) {
            match cache::load_checked::<TrackStore>(path, frames.len()) {
                Ok(Some(tracks)) if tracks.is_consistent() && tracks.len() == frames.len() => {
                    info!("loaded tracks for {} frames from {}", tracks.len(), path.display());
                    return Ok(tracks);
                }
                Ok(Some(_)) => warn!("ignoring inconsistent track cache {}", path.display()),
                Ok(None) => {}
                Err(err) => warn!("ignoring track cache: {}", err),
            }
        }

        let detections = detect_frames(&mut self.detector, frames, &self.config)?;
        let tracks = build_tracks(&mut self.tracker, &detections)?;
        info!("tracked objects over {} frames", tracks.len());

        if let Some(path) = cache_path {
            cache::store_checked(path, frames.len(), &tracks)?;
        }

        Ok(tracks)
    }
}

/// Turns per-frame detections into a [`TrackStore`].
///
/// Goalkeepers are tracked as players. The ball bypasses the tracker: the most
/// confident ball detection of each frame is stored under [`BALL_TRACK_ID`].
pub fn build_tracks<T: MultiObjectTracker + ?Sized>(
    tracker: &mut T,
    detections: &[Vec<Detection>],
) -> Result<TrackStore, Error> {
    let mut tracks = TrackStore::with_frames(detections.len());

    for (frame_num, frame_detections) in detections.iter().enumerate() {
        let people: Vec<Detection> = frame_detections
            .iter()
            .filter(|det| det.class != DetectedClass::Ball)
            .map(|det| Detection {
                class: det.class.remapped(),
                ..*det
            })
            .collect();

        for tracked in tracker.update(&people)? {
            let class = match tracked.class.remapped() {
                DetectedClass::Player => ObjectClass::Player,
                DetectedClass::Referee => ObjectClass::Referee,
                _ => continue,
            };

            tracks.insert(class, frame_num, tracked.track_id, tracked.bbox);
        }

        let ball = frame_detections
            .iter()
            .filter(|det| det.class == DetectedClass::Ball)
            .max_by(|a, b| a.confidence.total_cmp(&b.confidence));

        if let Some(ball) = ball {
            tracks.insert(ObjectClass::Ball, frame_num, BALL_TRACK_ID, ball.ltrb());
        }
    }

    Ok(tracks)
}
