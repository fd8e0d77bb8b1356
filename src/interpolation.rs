use log::debug;
use num_traits::Float;

use crate::bbox::{BBox, Ltrb};
use crate::math;
use crate::store::TrackStore;

/// Fills the gaps of a series.
///
/// Interior gaps are linearly interpolated between the nearest known values,
/// leading gaps copy the first known value and trailing gaps the last one.
/// A series without any known value stays empty.
pub fn interpolate_series<F: Float>(values: &[Option<F>]) -> Vec<Option<F>> {
    let known: Vec<(usize, F)> = values
        .iter()
        .enumerate()
        .filter_map(|(i, v)| v.map(|v| (i, v)))
        .collect();

    let (first, last) = match (known.first(), known.last()) {
        (Some(first), Some(last)) => (*first, *last),
        _ => return vec![None; values.len()],
    };

    let mut filled = vec![None; values.len()];
    filled[..first.0].iter_mut().for_each(|v| *v = Some(first.1));
    filled[last.0..].iter_mut().for_each(|v| *v = Some(last.1));

    for pair in known.windows(2) {
        let ((i, a), (j, b)) = (pair[0], pair[1]);
        let span = F::from(j - i).unwrap_or_else(F::one);

        for (k, slot) in filled.iter_mut().enumerate().take(j).skip(i) {
            *slot = Some(if k == i {
                a
            } else {
                let factor = F::from(k - i).unwrap_or_else(F::zero) / span;
                math::lerp(a, b, factor)
            });
        }
    }

    filled
}

/// Repairs missing ball boxes by interpolating each coordinate independently.
pub fn interpolate_ball_positions(bboxes: &[Option<BBox<Ltrb>>]) -> Vec<Option<BBox<Ltrb>>> {
    let columns: Vec<Vec<Option<f32>>> = (0..4)
        .map(|c| {
            let series: Vec<_> = bboxes.iter().map(|b| b.map(|b| b.as_slice()[c])).collect();
            interpolate_series(&series)
        })
        .collect();

    (0..bboxes.len())
        .map(|i| {
            match (columns[0][i], columns[1][i], columns[2][i], columns[3][i]) {
                (Some(x1), Some(y1), Some(x2), Some(y2)) => Some(BBox::ltrb(x1, y1, x2, y2)),
                _ => None,
            }
        })
        .collect()
}

/// Replaces the ball sequence of `tracks` with its gap-free version.
pub fn interpolate_ball_tracks(tracks: &mut TrackStore) {
    let measured = tracks.ball_bboxes();
    let filled = interpolate_ball_positions(&measured);
    let missing = measured.iter().filter(|b| b.is_none()).count();

    debug!("filled {} of {} ball frames", missing, measured.len());
    tracks.set_ball_bboxes(&filled);
}
