use nalgebra as na;
use serde_derive::{Deserialize, Serialize};
use std::fmt;

use crate::bbox::{BBox, Ltrb};
use crate::team::Team;

pub type TrackId = u32;

/// The ball is never handed to the tracker, every ball entry lives under this id.
pub const BALL_TRACK_ID: TrackId = 1;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum ObjectClass {
    Player,
    Referee,
    Ball,
}

impl ObjectClass {
    pub const ALL: [ObjectClass; 3] = [ObjectClass::Player, ObjectClass::Referee, ObjectClass::Ball];

    /// Pixel anchor of an object: feet for people, center for the ball.
    #[inline]
    pub fn anchor(self, bbox: &BBox<Ltrb>) -> na::Point2<f32> {
        match self {
            ObjectClass::Ball => bbox.center(),
            ObjectClass::Player | ObjectClass::Referee => bbox.foot_position(),
        }
    }

    #[inline]
    pub fn has_motion_metrics(self) -> bool {
        !matches!(self, ObjectClass::Ball)
    }
}

impl fmt::Display for ObjectClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ObjectClass::Player => "players",
            ObjectClass::Referee => "referees",
            ObjectClass::Ball => "ball",
        };

        f.write_str(name)
    }
}

/// Attributes of one object in one frame. Everything past `bbox` is filled in
/// by successive stages; `None` means the stage produced no value.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TrackAttributes {
    pub bbox: BBox<Ltrb>,

    // in px
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<na::Point2<f32>>,

    // in px, camera motion removed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position_adjusted: Option<na::Point2<f32>>,

    // in meters, court coordinates
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position_transformed: Option<na::Point2<f32>>,

    // km/h
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<f32>,

    // meters, cumulative
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<f32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team: Option<Team>,

    #[serde(default)]
    pub has_ball: bool,
}

impl TrackAttributes {
    pub fn new(bbox: BBox<Ltrb>) -> Self {
        Self {
            bbox,
            position: None,
            position_adjusted: None,
            position_transformed: None,
            speed: None,
            distance: None,
            team: None,
            has_ball: false,
        }
    }
}
