use serde_derive::{Deserialize, Serialize};
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use crate::bbox::{BBox, Ltrb};
use crate::track::{ObjectClass, TrackAttributes, TrackId, BALL_TRACK_ID};

/// Objects of one class seen in one frame, ordered by track id.
pub type FrameTracks = BTreeMap<TrackId, TrackAttributes>;

/// Per-class, per-frame track history shared by every pipeline stage.
///
/// All three class sequences always have the same length: one entry per
/// processed frame, empty when nothing of that class was seen.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct TrackStore {
    players: Vec<FrameTracks>,
    referees: Vec<FrameTracks>,
    ball: Vec<FrameTracks>,
}

fn tagged<'a>(
    class: ObjectClass,
    frames: &'a mut [FrameTracks],
) -> impl Iterator<Item = (ObjectClass, usize, TrackId, &'a mut TrackAttributes)> + 'a {
    frames.iter_mut().enumerate().flat_map(move |(frame_num, tracks)| {
        tracks
            .iter_mut()
            .map(move |(id, attrs)| (class, frame_num, *id, attrs))
    })
}

impl TrackStore {
    pub fn with_frames(num_frames: usize) -> Self {
        Self {
            players: vec![FrameTracks::new(); num_frames],
            referees: vec![FrameTracks::new(); num_frames],
            ball: vec![FrameTracks::new(); num_frames],
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.players.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// True when every class holds one entry per frame.
    pub fn is_consistent(&self) -> bool {
        self.referees.len() == self.players.len() && self.ball.len() == self.players.len()
    }

    pub fn push_frame(&mut self) -> usize {
        self.players.push(FrameTracks::new());
        self.referees.push(FrameTracks::new());
        self.ball.push(FrameTracks::new());

        self.players.len() - 1
    }

    #[inline]
    pub fn frames(&self, class: ObjectClass) -> &[FrameTracks] {
        match class {
            ObjectClass::Player => &self.players,
            ObjectClass::Referee => &self.referees,
            ObjectClass::Ball => &self.ball,
        }
    }

    #[inline]
    pub fn frames_mut(&mut self, class: ObjectClass) -> &mut [FrameTracks] {
        match class {
            ObjectClass::Player => &mut self.players,
            ObjectClass::Referee => &mut self.referees,
            ObjectClass::Ball => &mut self.ball,
        }
    }

    #[inline]
    pub fn get(&self, class: ObjectClass, frame_num: usize, track_id: TrackId) -> Option<&TrackAttributes> {
        self.frames(class).get(frame_num)?.get(&track_id)
    }

    /// Records `bbox` for a track, growing every class sequence so that
    /// `frame_num` exists.
    pub fn insert(
        &mut self,
        class: ObjectClass,
        frame_num: usize,
        track_id: TrackId,
        bbox: BBox<Ltrb>,
    ) -> &mut TrackAttributes {
        while self.len() <= frame_num {
            self.push_frame();
        }

        let attrs = TrackAttributes::new(bbox);

        match self.frames_mut(class)[frame_num].entry(track_id) {
            Entry::Occupied(mut entry) => {
                entry.insert(attrs);
                entry.into_mut()
            }
            Entry::Vacant(entry) => entry.insert(attrs),
        }
    }

    pub fn iter_mut(
        &mut self,
    ) -> impl Iterator<Item = (ObjectClass, usize, TrackId, &mut TrackAttributes)> + '_ {
        let Self {
            players,
            referees,
            ball,
        } = self;

        tagged(ObjectClass::Player, players)
            .chain(tagged(ObjectClass::Referee, referees))
            .chain(tagged(ObjectClass::Ball, ball))
    }

    /// Writes the pixel anchor of every object: feet for people, center for the ball.
    pub fn add_position_to_tracks(&mut self) {
        for (class, _, _, attrs) in self.iter_mut() {
            attrs.position = Some(class.anchor(&attrs.bbox));
        }
    }

    pub fn ball_bboxes(&self) -> Vec<Option<BBox<Ltrb>>> {
        self.ball
            .iter()
            .map(|frame| frame.get(&BALL_TRACK_ID).map(|ball| ball.bbox))
            .collect()
    }

    /// Replaces the ball sequence. Entries whose box is unchanged keep the
    /// attributes computed for them so far.
    pub fn set_ball_bboxes(&mut self, bboxes: &[Option<BBox<Ltrb>>]) {
        while self.len() < bboxes.len() {
            self.push_frame();
        }

        for (frame, bbox) in self.ball.iter_mut().zip(bboxes) {
            match bbox {
                Some(bbox) => {
                    let unchanged = frame
                        .get(&BALL_TRACK_ID)
                        .map_or(false, |ball| ball.bbox == *bbox);

                    if !unchanged {
                        frame.insert(BALL_TRACK_ID, TrackAttributes::new(*bbox));
                    }
                }
                None => {
                    frame.remove(&BALL_TRACK_ID);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra as na;

    #[test]
    fn insert_keeps_classes_aligned() {
        let mut store = TrackStore::default();
        store.insert(ObjectClass::Referee, 3, 7, BBox::ltrb(0.0, 0.0, 1.0, 1.0));

        assert_eq!(store.len(), 4);
        assert!(store.is_consistent());
        assert!(store.frames(ObjectClass::Player)[3].is_empty());
        assert!(store.get(ObjectClass::Referee, 3, 7).is_some());
    }

    #[test]
    fn positions_use_class_anchor() {
        let mut store = TrackStore::with_frames(1);
        store.insert(ObjectClass::Player, 0, 4, BBox::ltrb(10.0, 10.0, 20.0, 40.0));
        store.insert(ObjectClass::Ball, 0, BALL_TRACK_ID, BBox::ltrb(10.0, 10.0, 20.0, 40.0));

        store.add_position_to_tracks();

        assert_eq!(
            store.get(ObjectClass::Player, 0, 4).unwrap().position,
            Some(na::Point2::new(15.0, 40.0))
        );
        assert_eq!(
            store.get(ObjectClass::Ball, 0, BALL_TRACK_ID).unwrap().position,
            Some(na::Point2::new(15.0, 25.0))
        );
    }

    #[test]
    fn ball_replacement_preserves_measured_entries() {
        let mut store = TrackStore::with_frames(3);
        let measured = BBox::ltrb(0.0, 0.0, 2.0, 2.0);
        store.insert(ObjectClass::Ball, 0, BALL_TRACK_ID, measured).speed = Some(1.0);

        let filled = BBox::ltrb(1.0, 1.0, 3.0, 3.0);
        store.set_ball_bboxes(&[Some(measured), Some(filled), None]);

        assert_eq!(store.get(ObjectClass::Ball, 0, BALL_TRACK_ID).unwrap().speed, Some(1.0));
        assert_eq!(store.get(ObjectClass::Ball, 1, BALL_TRACK_ID).unwrap().bbox, filled);
        assert!(store.get(ObjectClass::Ball, 2, BALL_TRACK_ID).is_none());
        assert_eq!(store.ball_bboxes(), vec![Some(measured), Some(filled), None]);
    }

    #[test]
    fn json_keeps_track_ids() {
        let mut store = TrackStore::with_frames(2);
        store.insert(ObjectClass::Player, 1, 12, BBox::ltrb(0.0, 0.0, 5.0, 9.0));

        let json = serde_json::to_string(&store).unwrap();
        let back: TrackStore = serde_json::from_str(&json).unwrap();

        assert_eq!(back, store);
    }
}
