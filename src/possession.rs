use log::{debug, info};
use serde_derive::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::bbox::{BBox, Ltrb};
use crate::error::Error;
use crate::math;
use crate::store::{FrameTracks, TrackStore};
use crate::team::Team;
use crate::track::{ObjectClass, TrackId};

/// What a frame without a possessing player contributes to the log.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PossessionPolicy {
    /// The frame is recorded as "no possession" and counts for nobody.
    BreakStreak,

    /// The team that last had the ball keeps it.
    CarryForward,
}

impl Default for PossessionPolicy {
    fn default() -> Self {
        PossessionPolicy::CarryForward
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct PossessionConfig {
    // px, between the ball center and the nearer foot corner
    pub max_player_ball_distance: f32,
    pub policy: PossessionPolicy,
}

impl Default for PossessionConfig {
    fn default() -> Self {
        Self {
            max_player_ball_distance: 70.0,
            policy: PossessionPolicy::default(),
        }
    }
}

impl PossessionConfig {
    pub fn validate(&self) -> Result<(), Error> {
        if !(self.max_player_ball_distance > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "possession distance must be positive, got {}",
                self.max_player_ball_distance
            )));
        }

        Ok(())
    }
}

pub struct PlayerBallAssigner {
    max_player_ball_distance: f32,
}

impl PlayerBallAssigner {
    pub fn new(max_player_ball_distance: f32) -> Self {
        Self {
            max_player_ball_distance,
        }
    }

    /// The player closest to the ball, if any is within reach.
    ///
    /// Players are visited in track id order and only a strictly smaller
    /// distance replaces the current best, so ties go to the lowest id.
    pub fn assign_ball_to_player(&self, players: &FrameTracks, ball_bbox: &BBox<Ltrb>) -> Option<TrackId> {
        let ball_position = ball_bbox.center();
        let mut best: Option<(TrackId, f32)> = None;

        for (track_id, player) in players {
            let left = math::measure_distance(&player.bbox.bottom_left(), &ball_position);
            let right = math::measure_distance(&player.bbox.bottom_right(), &ball_position);
            let distance = left.min(right);

            if distance >= self.max_player_ball_distance {
                continue;
            }

            if best.map_or(true, |(_, d)| distance < d) {
                best = Some((*track_id, distance));
            }
        }

        best.map(|(track_id, _)| track_id)
    }
}

/// Team in control of the ball, one entry per frame.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(transparent)]
pub struct PossessionLog(Vec<Option<Team>>);

impl PossessionLog {
    pub fn new(entries: Vec<Option<Team>>) -> Self {
        Self(entries)
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
    pub fn entries(&self) -> &[Option<Team>] {
        &self.0
    }

    fn attributed(&self, frame_num: usize) -> impl Iterator<Item = Team> + '_ {
        let end = (frame_num + 1).min(self.0.len());
        self.0[..end].iter().flatten().copied()
    }

    /// Fraction of the attributed frames among `0..=frame_num` that belong
    /// to `team`. Zero while nobody has had the ball.
    pub fn team_share(&self, team: Team, frame_num: usize) -> f32 {
        let (mut owned, mut total) = (0usize, 0usize);

        for t in self.attributed(frame_num) {
            total += 1;
            if t == team {
                owned += 1;
            }
        }

        if total == 0 {
            return 0.0;
        }

        owned as f32 / total as f32
    }

    /// Share of every team that has had the ball up to `frame_num`.
    pub fn shares_at(&self, frame_num: usize) -> BTreeMap<Team, f32> {
        let mut counts: BTreeMap<Team, usize> = BTreeMap::new();
        for team in self.attributed(frame_num) {
            *counts.entry(team).or_insert(0) += 1;
        }

        let total: usize = counts.values().sum();

        counts
            .into_iter()
            .map(|(team, n)| (team, n as f32 / total as f32))
            .collect()
    }
}

/// Marks the possessing player of every frame with `has_ball` and logs the
/// possessing team.
///
/// Frames without a ball box count as frames without a possessing player.
/// A possessing player without a team label leaves the frame unattributed.
pub fn assign_possession(tracks: &mut TrackStore, config: &PossessionConfig) -> PossessionLog {
    let assigner = PlayerBallAssigner::new(config.max_player_ball_distance);
    let ball_bboxes = tracks.ball_bboxes();
    let mut entries = Vec::with_capacity(tracks.len());
    let mut last_team = None;

    for (frame_num, players) in tracks.frames_mut(ObjectClass::Player).iter_mut().enumerate() {
        let assigned = ball_bboxes
            .get(frame_num)
            .copied()
            .flatten()
            .and_then(|ball| assigner.assign_ball_to_player(players, &ball));

        let team = match assigned.and_then(|id| players.get_mut(&id)) {
            Some(player) => {
                player.has_ball = true;
                player.team
            }
            None => None,
        };

        debug!("frame {}: ball with {:?} ({:?})", frame_num, assigned, team);

        let entry = match (team, config.policy) {
            (Some(team), _) => Some(team),
            (None, PossessionPolicy::CarryForward) => last_team,
            (None, PossessionPolicy::BreakStreak) => None,
        };

        last_team = entry.or(last_team);
        entries.push(entry);
    }

    info!(
        "ball possession attributed in {} of {} frames",
        entries.iter().filter(|e| e.is_some()).count(),
        entries.len()
    );

    PossessionLog::new(entries)
}
