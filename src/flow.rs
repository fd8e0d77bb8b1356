use nalgebra as na;
use ndarray::prelude::*;
use serde_derive::{Deserialize, Serialize};

use crate::frame::Frame;
use crate::math;

/// Follows sample points from one frame into the next.
pub trait PointTracker {
    /// Returns the position of every point in `next`, `None` for lost points.
    fn track(&self, prev: &Frame, next: &Frame, points: &[na::Point2<f32>]) -> Vec<Option<na::Point2<f32>>>;
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct LucasKanadeConfig {
    // side of the square integration window, px
    pub window_size: usize,
    pub max_level: usize,
    pub max_iterations: usize,
    pub epsilon: f32,

    // points whose window is flatter than this (mean structure tensor) are lost
    pub min_eigenvalue: f32,
}

impl Default for LucasKanadeConfig {
    fn default() -> Self {
        Self {
            window_size: 15,
            max_level: 2,
            max_iterations: 10,
            epsilon: 0.03,
            min_eigenvalue: 1e-2,
        }
    }
}

/// Bilinear lookup, `None` outside the image.
pub(crate) fn sample(image: &Array2<f32>, x: f32, y: f32) -> Option<f32> {
    let (h, w) = image.dim();
    if w < 2 || h < 2 {
        return None;
    }

    if !(x >= 0.0 && y >= 0.0 && x <= (w - 1) as f32 && y <= (h - 1) as f32) {
        return None;
    }

    let x0 = (x.floor() as usize).min(w - 2);
    let y0 = (y.floor() as usize).min(h - 2);
    let (fx, fy) = (x - x0 as f32, y - y0 as f32);

    let top = math::lerp(image[(y0, x0)], image[(y0, x0 + 1)], fx);
    let bottom = math::lerp(image[(y0 + 1, x0)], image[(y0 + 1, x0 + 1)], fx);

    Some(math::lerp(top, bottom, fy))
}

/// Central differences, one-sided at the border.
pub(crate) fn gradients(image: &Array2<f32>) -> (Array2<f32>, Array2<f32>) {
    let (h, w) = image.dim();

    let ix = Array2::from_shape_fn((h, w), |(r, c)| {
        let (l, rr) = (c.saturating_sub(1), (c + 1).min(w - 1));
        (image[(r, rr)] - image[(r, l)]) * 0.5
    });

    let iy = Array2::from_shape_fn((h, w), |(r, c)| {
        let (t, b) = (r.saturating_sub(1), (r + 1).min(h - 1));
        (image[(b, c)] - image[(t, c)]) * 0.5
    });

    (ix, iy)
}

fn downsample(image: &Array2<f32>) -> Array2<f32> {
    let (h, w) = image.dim();

    Array2::from_shape_fn((h / 2, w / 2), |(r, c)| {
        let (r2, c2) = (2 * r, 2 * c);
        (image[(r2, c2)] + image[(r2 + 1, c2)] + image[(r2, c2 + 1)] + image[(r2 + 1, c2 + 1)]) * 0.25
    })
}

struct Level {
    image: Array2<f32>,
    ix: Array2<f32>,
    iy: Array2<f32>,
}

/// Pyramidal Lucas-Kanade point tracker over grayscale frames.
pub struct LucasKanade {
    config: LucasKanadeConfig,
}

impl Default for LucasKanade {
    fn default() -> Self {
        Self::new(LucasKanadeConfig::default())
    }
}

impl LucasKanade {
    pub fn new(config: LucasKanadeConfig) -> Self {
        Self { config }
    }

    fn pyramid(&self, image: &Array2<f32>) -> Vec<Array2<f32>> {
        let mut levels = vec![image.clone()];

        while levels.len() <= self.config.max_level {
            let top = &levels[levels.len() - 1];
            let (h, w) = top.dim();

            if h.min(w) / 2 < self.config.window_size {
                break;
            }

            let next = downsample(top);
            levels.push(next);
        }

        levels
    }

    fn track_point(&self, prev: &[Level], next: &[Array2<f32>], point: na::Point2<f32>) -> Option<na::Point2<f32>> {
        let radius = (self.config.window_size / 2) as i32;
        let mut guess = na::Vector2::<f32>::zeros();

        for level in (0..prev.len()).rev() {
            let scale = (1u32 << level) as f32;
            let p = na::Point2::new(point.x / scale, point.y / scale);
            let lvl = &prev[level];

            let mut patch = Vec::with_capacity(((2 * radius + 1) * (2 * radius + 1)) as usize);
            let (mut gxx, mut gxy, mut gyy) = (0.0f32, 0.0f32, 0.0f32);

            for dy in -radius..=radius {
                for dx in -radius..=radius {
                    let (x, y) = (p.x + dx as f32, p.y + dy as f32);

                    if let (Some(i), Some(ix), Some(iy)) =
                        (sample(&lvl.image, x, y), sample(&lvl.ix, x, y), sample(&lvl.iy, x, y))
                    {
                        gxx += ix * ix;
                        gxy += ix * iy;
                        gyy += iy * iy;
                        patch.push((dx as f32, dy as f32, i, ix, iy));
                    }
                }
            }

            if patch.is_empty() {
                return None;
            }

            let n = patch.len() as f32;
            let min_eig = ((gxx + gyy) - ((gxx - gyy).powi(2) + 4.0 * gxy * gxy).sqrt()) / (2.0 * n);
            let det = gxx * gyy - gxy * gxy;

            if min_eig < self.config.min_eigenvalue || det.abs() <= f32::EPSILON {
                return None;
            }

            let mut v = na::Vector2::<f32>::zeros();

            for _ in 0..self.config.max_iterations {
                let (mut bx, mut by) = (0.0f32, 0.0f32);

                for &(dx, dy, i, ix, iy) in &patch {
                    let x = p.x + guess.x + v.x + dx;
                    let y = p.y + guess.y + v.y + dy;

                    if let Some(j) = sample(&next[level], x, y) {
                        let diff = i - j;
                        bx += diff * ix;
                        by += diff * iy;
                    }
                }

                let eta = na::Vector2::new((gyy * bx - gxy * by) / det, (gxx * by - gxy * bx) / det);
                v += eta;

                if eta.norm() < self.config.epsilon {
                    break;
                }
            }

            guess = if level > 0 { (guess + v) * 2.0 } else { guess + v };
        }

        let tracked = point + guess;
        let (h, w) = next[0].dim();

        if tracked.x < 0.0 || tracked.y < 0.0 || tracked.x > (w - 1) as f32 || tracked.y > (h - 1) as f32 {
            return None;
        }

        Some(tracked)
    }
}

impl PointTracker for LucasKanade {
    fn track(&self, prev: &Frame, next: &Frame, points: &[na::Point2<f32>]) -> Vec<Option<na::Point2<f32>>> {
        if prev.image.dim() != next.image.dim() {
            return vec![None; points.len()];
        }

        let prev_levels: Vec<Level> = self
            .pyramid(&prev.image)
            .into_iter()
            .map(|image| {
                let (ix, iy) = gradients(&image);
                Level { image, ix, iy }
            })
            .collect();
        let next_levels = self.pyramid(&next.image);

        points
            .iter()
            .map(|&p| self.track_point(&prev_levels, &next_levels, p))
            .collect()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Smooth texture shifted by (sx, sy): content at (x, y) moves to (x + sx, y + sy).
    pub(crate) fn texture(width: usize, height: usize, sx: f32, sy: f32) -> Frame {
        Frame::new(Array2::from_shape_fn((height, width), |(r, c)| {
            let (x, y) = (c as f32 - sx, r as f32 - sy);
            128.0 + 50.0 * (x / 5.0).sin() + 50.0 * (y / 6.0).cos()
        }))
    }

    #[test]
    fn bilinear_sampling() {
        let image = ndarray::array![[0.0, 10.0], [20.0, 30.0]];

        assert_eq!(sample(&image, 0.5, 0.5), Some(15.0));
        assert_eq!(sample(&image, 1.0, 1.0), Some(30.0));
        assert_eq!(sample(&image, 1.5, 0.0), None);
        assert_eq!(sample(&image, -0.1, 0.0), None);
    }

    #[test]
    fn follows_a_translation() {
        let prev = texture(120, 120, 0.0, 0.0);
        let next = texture(120, 120, 3.0, -2.0);
        let points = [
            na::Point2::new(60.0, 60.0),
            na::Point2::new(40.0, 50.0),
            na::Point2::new(80.0, 70.0),
        ];

        let tracked = LucasKanade::default().track(&prev, &next, &points);

        for (p, t) in points.iter().zip(tracked) {
            let t = t.expect("point lost");
            let flow = t - p;

            assert!((flow.x - 3.0).abs() < 0.3, "flow {:?}", flow);
            assert!((flow.y + 2.0).abs() < 0.3, "flow {:?}", flow);
        }
    }

    #[test]
    fn flat_windows_are_lost() {
        let flat = Frame::new(Array2::from_elem((60, 60), 100.0));
        let tracked = LucasKanade::default().track(&flat, &flat, &[na::Point2::new(30.0, 30.0)]);

        assert_eq!(tracked, vec![None]);
    }
}
