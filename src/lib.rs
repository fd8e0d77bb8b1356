pub mod bbox;
pub mod cache;
pub mod camera;
pub mod config;
pub mod detection;
pub mod detector;
pub mod error;
pub mod flow;
pub mod frame;
pub mod interpolation;
pub mod math;
pub mod perspective;
pub mod pipeline;
pub mod possession;
pub mod speed;
pub mod store;
pub mod team;
pub mod track;
pub mod tracker;

#[cfg(feature = "opencv")]
pub mod video;

pub use bbox::{BBox, Ltrb, Xywh};
pub use camera::{CameraMovement, CameraMovementEstimator};
pub use config::AnalysisConfig;
pub use detection::{DetectedClass, Detection, TrackedDetection};
pub use detector::Detector;
pub use error::Error;
pub use frame::Frame;
pub use perspective::ViewTransformer;
pub use pipeline::{Analysis, Pipeline};
pub use possession::{PossessionLog, PossessionPolicy};
pub use speed::SpeedAndDistanceEstimator;
pub use store::{FrameTracks, TrackStore};
pub use team::{Team, TeamClassifier};
pub use track::{ObjectClass, TrackAttributes, TrackId, BALL_TRACK_ID};
pub use tracker::{MultiObjectTracker, ObjectTracker};
