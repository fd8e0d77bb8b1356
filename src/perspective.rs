use log::debug;
use nalgebra as na;
use serde_derive::{Deserialize, Serialize};

use crate::error::Error;
use crate::math;
use crate::store::TrackStore;

/// Calibration of the visible court area.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ViewTransformerConfig {
    /// Court corners in the image: bottom-left, top-left, top-right, bottom-right.
    pub pixel_vertices: [[f32; 2]; 4],

    // meters
    pub court_length: f32,
    pub court_width: f32,
}

impl Default for ViewTransformerConfig {
    fn default() -> Self {
        Self {
            pixel_vertices: [[110.0, 1035.0], [265.0, 275.0], [910.0, 260.0], [1640.0, 915.0]],
            court_length: 23.32,
            court_width: 68.0,
        }
    }
}

/// Maps image positions on the court plane to top-down court coordinates in meters.
#[derive(Debug, Clone)]
pub struct ViewTransformer {
    pixel_vertices: [na::Point2<f32>; 4],
    target_vertices: [na::Point2<f32>; 4],
    homography: na::Matrix3<f64>,
}

impl ViewTransformer {
    pub fn new(config: &ViewTransformerConfig) -> Result<Self, Error> {
        if !(config.court_length > 0.0 && config.court_width > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "court dimensions must be positive, got {} x {}",
                config.court_length, config.court_width
            )));
        }

        let pixel_vertices = config.pixel_vertices.map(|[x, y]| na::Point2::new(x, y));
        let target_vertices = [
            na::Point2::new(0.0, config.court_width),
            na::Point2::new(0.0, 0.0),
            na::Point2::new(config.court_length, 0.0),
            na::Point2::new(config.court_length, config.court_width),
        ];

        let homography = math::perspective_transform(&pixel_vertices, &target_vertices).ok_or_else(|| {
            Error::DegenerateCalibration(format!("pixel vertices {:?}", config.pixel_vertices))
        })?;

        Ok(Self {
            pixel_vertices,
            target_vertices,
            homography,
        })
    }

    #[inline]
    pub fn pixel_vertices(&self) -> &[na::Point2<f32>; 4] {
        &self.pixel_vertices
    }

    #[inline]
    pub fn target_vertices(&self) -> &[na::Point2<f32>; 4] {
        &self.target_vertices
    }

    #[inline]
    pub fn homography(&self) -> &na::Matrix3<f64> {
        &self.homography
    }

    /// Court coordinates of `point`, `None` outside the calibrated quadrilateral.
    pub fn transform(&self, point: na::Point2<f32>) -> Option<na::Point2<f32>> {
        if !math::point_in_polygon(point, &self.pixel_vertices) {
            return None;
        }

        math::apply_homography(&self.homography, point)
    }

    pub fn add_transformed_position_to_tracks(&self, tracks: &mut TrackStore) {
        let mut off_court = 0usize;

        for (_, _, _, attrs) in tracks.iter_mut() {
            attrs.position_transformed = attrs.position_adjusted.and_then(|p| self.transform(p));

            if attrs.position_adjusted.is_some() && attrs.position_transformed.is_none() {
                off_court += 1;
            }
        }

        debug!("{} positions fell outside the court", off_court);
    }
}
