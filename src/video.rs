use log::info;
use opencv::{
    core::Mat,
    imgproc,
    prelude::*,
    videoio::{self, VideoCapture},
};
use std::path::Path;

use crate::error::Error;
use crate::frame::Frame;

/// Decodes every frame of the video at `path` into grayscale.
pub fn read_video(path: &Path) -> Result<Vec<Frame>, Error> {
    if !path.exists() {
        return Err(Error::missing("source video", path));
    }

    let mut cap = VideoCapture::from_file(&path.to_string_lossy(), videoio::CAP_ANY)?;
    if !cap.is_opened()? {
        return Err(Error::Collaborator(format!("cannot open video {}", path.display())));
    }

    let mut frames = Vec::new();
    let mut mat = Mat::default();

    while cap.read(&mut mat)? && mat.rows() > 0 {
        let mut gray = Mat::default();
        imgproc::cvt_color(&mat, &mut gray, imgproc::COLOR_BGR2GRAY, 0)?;

        frames.push(Frame::from_luma(gray.cols() as u32, gray.rows() as u32, gray.data_bytes()?)?);
    }

    info!("read {} frames from {}", frames.len(), path.display());

    Ok(frames)
}
