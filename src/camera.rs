use log::{debug, info, warn};
use nalgebra as na;
use serde_derive::{Deserialize, Serialize};
use std::path::Path;

use crate::cache;
use crate::error::Error;
use crate::flow::{gradients, LucasKanade, LucasKanadeConfig, PointTracker};
use crate::frame::Frame;
use crate::store::TrackStore;

/// Image rectangle expected to contain only static background.
///
/// Column range is half-open; `rows: None` spans the full height.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct StableRegion {
    pub columns: (usize, usize),
    #[serde(default)]
    pub rows: Option<(usize, usize)>,
}

impl StableRegion {
    pub fn columns(start: usize, end: usize) -> Self {
        Self {
            columns: (start, end),
            rows: None,
        }
    }

    #[inline]
    fn contains(&self, row: usize, col: usize) -> bool {
        let (c0, c1) = self.columns;
        let rows_ok = self.rows.map_or(true, |(r0, r1)| row >= r0 && row < r1);

        col >= c0 && col < c1 && rows_ok
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct CameraMovementConfig {
    // px, smaller median flow is treated as tracking noise
    pub minimum_distance: f32,
    pub stable_regions: Vec<StableRegion>,
    pub max_corners: usize,
    pub quality_level: f32,
    pub min_corner_distance: f32,
    pub block_size: usize,
    pub flow: LucasKanadeConfig,
}

impl Default for CameraMovementConfig {
    fn default() -> Self {
        Self {
            minimum_distance: 5.0,
            stable_regions: vec![StableRegion::columns(0, 20), StableRegion::columns(900, 1050)],
            max_corners: 100,
            quality_level: 0.3,
            min_corner_distance: 3.0,
            block_size: 7,
            flow: LucasKanadeConfig::default(),
        }
    }
}

/// Apparent background displacement per frame, relative to the previous frame.
/// Frame 0 is always zero.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(transparent)]
pub struct CameraMovement(Vec<na::Vector2<f32>>);

impl CameraMovement {
    pub fn new(per_frame: Vec<na::Vector2<f32>>) -> Self {
        Self(per_frame)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[inline]
    pub fn per_frame(&self) -> &[na::Vector2<f32>] {
        &self.0
    }

    /// Running total of the movement, relative to frame 0.
    pub fn cumulative(&self) -> Vec<na::Vector2<f32>> {
        self.0
            .iter()
            .scan(na::Vector2::zeros(), |total, step| {
                *total += step;
                Some(*total)
            })
            .collect()
    }
}

fn median(values: &mut [f32]) -> f32 {
    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;

    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}

/// Camera movement as a pure 2D translation: the median flow of corners
/// picked in regions that only show static background.
pub struct CameraMovementEstimator<P = LucasKanade> {
    config: CameraMovementConfig,
    tracker: P,
}

impl CameraMovementEstimator<LucasKanade> {
    pub fn new(config: CameraMovementConfig) -> Self {
        let tracker = LucasKanade::new(config.flow.clone());

        Self { config, tracker }
    }
}

impl<P: PointTracker> CameraMovementEstimator<P> {
    pub fn with_tracker(config: CameraMovementConfig, tracker: P) -> Self {
        Self { config, tracker }
    }

    /// Shi-Tomasi corners inside the stable regions, strongest first.
    pub fn features(&self, frame: &Frame) -> Vec<na::Point2<f32>> {
        let (h, w) = frame.image.dim();
        let half = (self.config.block_size / 2).max(1);
        if h <= 2 * half || w <= 2 * half {
            return vec![];
        }

        let (ix, iy) = gradients(&frame.image);
        let mut response = ndarray::Array2::<f32>::zeros((h, w));
        let mut max_response = 0.0f32;

        for r in half..h - half {
            for c in half..w - half {
                if !self.config.stable_regions.iter().any(|reg| reg.contains(r, c)) {
                    continue;
                }

                let (mut a, mut b, mut d) = (0.0f32, 0.0f32, 0.0f32);
                for rr in r - half..=r + half {
                    for cc in c - half..=c + half {
                        let (gx, gy) = (ix[(rr, cc)], iy[(rr, cc)]);
                        a += gx * gx;
                        b += gx * gy;
                        d += gy * gy;
                    }
                }

                let min_eig = (a + d) / 2.0 - (((a - d) / 2.0).powi(2) + b * b).sqrt();
                response[(r, c)] = min_eig;
                max_response = max_response.max(min_eig);
            }
        }

        if max_response <= 0.0 {
            return vec![];
        }

        let threshold = max_response * self.config.quality_level;
        let mut candidates = Vec::new();

        for r in half..h - half {
            for c in half..w - half {
                let v = response[(r, c)];
                if v < threshold || v <= 0.0 {
                    continue;
                }

                let local_max = (r - 1..=r + 1)
                    .flat_map(|rr| (c - 1..=c + 1).map(move |cc| (rr, cc)))
                    .all(|(rr, cc)| response[(rr, cc)] <= v);

                if local_max {
                    candidates.push((v, na::Point2::new(c as f32, r as f32)));
                }
            }
        }

        candidates.sort_by(|a, b| b.0.total_cmp(&a.0));

        let mut corners: Vec<na::Point2<f32>> = Vec::with_capacity(self.config.max_corners);
        for (_, p) in candidates {
            if corners.len() >= self.config.max_corners {
                break;
            }

            if corners
                .iter()
                .all(|q| na::distance(q, &p) >= self.config.min_corner_distance)
            {
                corners.push(p);
            }
        }

        corners
    }

    /// Estimates the per-frame camera movement over `frames`.
    ///
    /// Movement below `minimum_distance` is discarded as noise and the sample
    /// points are kept. Accepted movement re-seeds the sample points on the
    /// current frame. When every sample point is lost the previous frame's
    /// movement is repeated; a long run of such frames drifts by that amount
    /// per frame.
    pub fn estimate(&self, frames: &[Frame]) -> CameraMovement {
        let mut movement = vec![na::Vector2::zeros(); frames.len()];
        let first = match frames.first() {
            Some(first) => first,
            None => return CameraMovement(movement),
        };

        let mut old_features = self.features(first);
        let mut last = na::Vector2::zeros();

        for frame_num in 1..frames.len() {
            let (prev, next) = (&frames[frame_num - 1], &frames[frame_num]);
            let tracked = self.tracker.track(prev, next, &old_features);

            let (mut xs, mut ys): (Vec<f32>, Vec<f32>) = old_features
                .iter()
                .zip(tracked)
                .filter_map(|(old, new)| new.map(|new| new - old))
                .map(|flow| (flow.x, flow.y))
                .unzip();

            if xs.is_empty() {
                warn!("frame {}: no stable points survived, holding camera movement {:?}", frame_num, last);
                movement[frame_num] = last;
                old_features = self.features(next);
                continue;
            }

            let step = na::Vector2::new(median(&mut xs), median(&mut ys));

            if step.norm() > self.config.minimum_distance {
                debug!("frame {}: camera moved {:?}", frame_num, step);
                movement[frame_num] = step;
                old_features = self.features(next);
            }

            last = movement[frame_num];
        }

        CameraMovement(movement)
    }

    /// Estimates camera movement, or loads it from `cache_path` when
    /// `read_from_cache` is set and the cache covers the same number of frames.
    pub fn get_camera_movement(
        &self,
        frames: &[Frame],
        read_from_cache: bool,
        cache_path: Option<&Path>,
    ) -> Result<CameraMovement, Error> {
        if let (true, Some(path)) = (read_from_cache, cache_path) {
            match cache::load_checked::<CameraMovement>(path, frames.len()) {
                Ok(Some(movement)) if movement.len() == frames.len() => {
                    info!("loaded camera movement for {} frames from {}", movement.len(), path.display());
                    return Ok(movement);
                }
                Ok(Some(_)) => warn!("ignoring truncated camera movement cache {}", path.display()),
                Ok(None) => {}
                Err(err) => warn!("ignoring camera movement cache: {}", err),
            }
        }

        let movement = self.estimate(frames);
        info!("estimated camera movement over {} frames", movement.len());

        if let Some(path) = cache_path {
            cache::store_checked(path, frames.len(), &movement)?;
        }

        Ok(movement)
    }
}

/// Writes `position_adjusted = position - cumulative movement` for every object.
pub fn add_adjust_positions_to_tracks(tracks: &mut TrackStore, movement: &CameraMovement) -> Result<(), Error> {
    if movement.len() != tracks.len() {
        return Err(Error::FrameCountMismatch {
            expected: tracks.len(),
            found: movement.len(),
        });
    }

    let cumulative = movement.cumulative();

    for (_, frame_num, _, attrs) in tracks.iter_mut() {
        attrs.position_adjusted = attrs.position.map(|p| p - cumulative[frame_num]);
    }

    Ok(())
}
