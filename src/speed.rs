use log::debug;
use serde_derive::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::Error;
use crate::math;
use crate::store::{FrameTracks, TrackStore};
use crate::track::{ObjectClass, TrackId};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct SpeedAndDistanceConfig {
    // frames per measurement window
    pub frame_window: usize,

    // frames per second
    pub frame_rate: f32,
}

impl Default for SpeedAndDistanceConfig {
    fn default() -> Self {
        Self {
            frame_window: 5,
            frame_rate: 24.0,
        }
    }
}

struct Measurement {
    track_id: TrackId,
    frames: std::ops::RangeInclusive<usize>,
    speed: f32,
    distance: f32,
}

/// Uninterrupted runs of appearances, `(track_id, first_frame, last_frame)`.
/// A track that vanishes and comes back starts a new run.
fn lifetimes(frames: &[FrameTracks]) -> Vec<(TrackId, usize, usize)> {
    let mut open: BTreeMap<TrackId, usize> = BTreeMap::new();
    let mut runs = Vec::new();

    for (frame_num, tracks) in frames.iter().enumerate() {
        open.retain(|id, first| {
            let alive = tracks.contains_key(id);
            if !alive {
                runs.push((*id, *first, frame_num - 1));
            }

            alive
        });

        for id in tracks.keys() {
            open.entry(*id).or_insert(frame_num);
        }
    }

    runs.extend(open.into_iter().map(|(id, first)| (id, first, frames.len() - 1)));
    runs
}

/// Speed (km/h) and cumulative distance (m) of players and referees, measured
/// on court coordinates over fixed windows of frames. Every lifetime of a
/// track is windowed from its own first frame.
pub struct SpeedAndDistanceEstimator {
    frame_window: usize,
    frame_rate: f32,
}

impl SpeedAndDistanceEstimator {
    pub fn new(config: &SpeedAndDistanceConfig) -> Result<Self, Error> {
        if config.frame_window == 0 {
            return Err(Error::InvalidConfig("frame window must be at least one frame".into()));
        }

        if !(config.frame_rate > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "frame rate must be positive, got {}",
                config.frame_rate
            )));
        }

        Ok(Self {
            frame_window: config.frame_window,
            frame_rate: config.frame_rate,
        })
    }

    fn measure(&self, frames: &[FrameTracks]) -> Vec<Measurement> {
        let mut measurements = Vec::new();

        for (track_id, first_frame, last_frame) in lifetimes(frames) {
            let mut total_distance = 0.0f32;

            for start in (first_frame..=last_frame).step_by(self.frame_window) {
                let end = (start + self.frame_window).min(last_frame);
                if end <= start {
                    continue;
                }

                let first = frames[start].get(&track_id).and_then(|t| t.position_transformed);
                let last = frames[end].get(&track_id).and_then(|t| t.position_transformed);
                let (p, q) = match (first, last) {
                    (Some(p), Some(q)) => (p, q),
                    _ => continue,
                };

                let distance_covered = math::measure_distance(&p, &q);
                let time_elapsed = (end - start) as f32 / self.frame_rate;
                let speed_kmh = distance_covered / time_elapsed * 3.6;
                total_distance += distance_covered;

                // the last window of a lifetime also covers its closing frame
                let written = if end == last_frame { end } else { end - 1 };
                measurements.push(Measurement {
                    track_id,
                    frames: start..=written,
                    speed: speed_kmh,
                    distance: total_distance,
                });
            }
        }

        measurements
    }

    pub fn add_speed_and_distance_to_tracks(&self, tracks: &mut TrackStore) {
        for class in ObjectClass::ALL.iter().copied().filter(|c| c.has_motion_metrics()) {
            let measurements = self.measure(tracks.frames(class));
            debug!("{}: {} speed windows", class, measurements.len());

            let frames = tracks.frames_mut(class);
            for m in measurements {
                for frame_num in m.frames {
                    if let Some(attrs) = frames[frame_num].get_mut(&m.track_id) {
                        attrs.speed = Some(m.speed);
                        attrs.distance = Some(m.distance);
                    }
                }
            }
        }
    }
}
