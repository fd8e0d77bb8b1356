use log::info;
use serde_derive::{Deserialize, Serialize};

use crate::bbox::{BBox, Ltrb};
use crate::error::Error;
use crate::frame::Frame;
use crate::store::TrackStore;
use crate::track::{ObjectClass, TrackId};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct Team(pub u8);

/// Tells the two sides apart from how a player looks, usually shirt color.
pub trait TeamClassifier {
    /// Learns the team appearances from the players of one frame.
    fn calibrate(&mut self, frame: &Frame, players: &[(TrackId, BBox<Ltrb>)]) -> Result<(), Error>;

    fn classify(&mut self, frame: &Frame, bbox: &BBox<Ltrb>, track_id: TrackId) -> Result<Team, Error>;
}

pub fn assign_teams<C: TeamClassifier + ?Sized>(
    tracks: &mut TrackStore,
    frames: &[Frame],
    classifier: &mut C,
) -> Result<(), Error> {
    if frames.len() != tracks.len() {
        return Err(Error::FrameCountMismatch {
            expected: tracks.len(),
            found: frames.len(),
        });
    }

    let (first_frame, first_players) = match (frames.first(), tracks.frames(ObjectClass::Player).first()) {
        (Some(frame), Some(players)) => (frame, players),
        _ => return Ok(()),
    };

    let calibration: Vec<_> = first_players.iter().map(|(id, t)| (*id, t.bbox)).collect();
    classifier.calibrate(first_frame, &calibration)?;

    for (frame, players) in frames.iter().zip(tracks.frames_mut(ObjectClass::Player)) {
        for (track_id, player) in players.iter_mut() {
            player.team = Some(classifier.classify(frame, &player.bbox, *track_id)?);
        }
    }

    info!("assigned teams over {} frames", frames.len());

    Ok(())
}
