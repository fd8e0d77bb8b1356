use log::debug;
use serde_derive::{Deserialize, Serialize};

use crate::detection::Detection;
use crate::error::Error;
use crate::frame::Frame;

/// Object detector: one list of detections per input frame.
pub trait Detector {
    fn detect(&mut self, frames: &[Frame], confidence_threshold: f32) -> Result<Vec<Vec<Detection>>, Error>;
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct DetectorConfig {
    pub confidence_threshold: f32,

    // frames per detector call, bounds peak memory
    pub batch_size: usize,
}

impl DetectorConfig {
    pub fn new(confidence_threshold: f32, batch_size: usize) -> Self {
        Self {
            confidence_threshold,
            batch_size,
        }
    }
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self::new(0.1, 20)
    }
}

/// Runs `detector` over `frames` chunk by chunk, keeping frame order.
pub fn detect_frames<D: Detector + ?Sized>(
    detector: &mut D,
    frames: &[Frame],
    config: &DetectorConfig,
) -> Result<Vec<Vec<Detection>>, Error> {
    let batch_size = config.batch_size.max(1);
    let mut detections = Vec::with_capacity(frames.len());

    for (batch_num, batch) in frames.chunks(batch_size).enumerate() {
        let batch_detections = detector.detect(batch, config.confidence_threshold)?;

        if batch_detections.len() != batch.len() {
            return Err(Error::Collaborator(format!(
                "detector returned {} results for a batch of {} frames",
                batch_detections.len(),
                batch.len()
            )));
        }

        debug!(
            "batch {}: {} detections",
            batch_num,
            batch_detections.iter().map(Vec::len).sum::<usize>()
        );
        detections.extend(batch_detections);
    }

    Ok(detections)
}
