use serde_derive::{Deserialize, Serialize};

use crate::bbox::{BBox, Ltrb, Xywh};
use crate::track::TrackId;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum DetectedClass {
    Player,
    Goalkeeper,
    Referee,
    Ball,
}

impl DetectedClass {
    /// Goalkeepers get no analytics of their own and are tracked as players.
    #[inline]
    pub fn remapped(self) -> Self {
        match self {
            DetectedClass::Goalkeeper => DetectedClass::Player,
            other => other,
        }
    }
}

/// Contains (x,y) of the center and (width,height) of bbox
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Detection {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
    #[serde(rename = "p")]
    pub confidence: f32,
    #[serde(rename = "c")]
    pub class: DetectedClass,
}

impl Detection {
    pub fn from_ltrb(bbox: &BBox<Ltrb>, confidence: f32, class: DetectedClass) -> Self {
        let xywh = bbox.as_xywh();

        Self {
            x: xywh.cx(),
            y: xywh.cy(),
            w: xywh.width(),
            h: xywh.height(),
            confidence,
            class,
        }
    }

    #[inline(always)]
    pub fn bbox(&self) -> BBox<Xywh> {
        BBox::xywh(self.x, self.y, self.w, self.h)
    }

    #[inline(always)]
    pub fn ltrb(&self) -> BBox<Ltrb> {
        self.bbox().as_ltrb()
    }
}

/// Detection after the tracker has given it a stable identity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackedDetection {
    pub bbox: BBox<Ltrb>,
    pub class: DetectedClass,
    pub track_id: TrackId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn goalkeeper_is_a_player() {
        assert_eq!(DetectedClass::Goalkeeper.remapped(), DetectedClass::Player);
        assert_eq!(DetectedClass::Referee.remapped(), DetectedClass::Referee);
        assert_eq!(DetectedClass::Ball.remapped(), DetectedClass::Ball);
    }

    #[test]
    fn compact_json_keys() {
        let det = Detection::from_ltrb(&BBox::ltrb(0.0, 0.0, 4.0, 2.0), 0.5, DetectedClass::Ball);
        let json = serde_json::to_string(&det).unwrap();

        assert_eq!(json, r#"{"x":2.0,"y":1.0,"w":4.0,"h":2.0,"p":0.5,"c":"ball"}"#);
        assert_eq!(det.ltrb(), BBox::ltrb(0.0, 0.0, 4.0, 2.0));
    }
}
