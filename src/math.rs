use nalgebra as na;
use num_traits::Float;

#[inline]
pub fn measure_distance(p1: &na::Point2<f32>, p2: &na::Point2<f32>) -> f32 {
    na::distance(p1, p2)
}

#[inline]
pub fn measure_xy_distance(p1: &na::Point2<f32>, p2: &na::Point2<f32>) -> na::Vector2<f32> {
    p1 - p2
}

#[inline]
pub fn lerp<F: Float>(a: F, b: F, factor: F) -> F {
    a * (F::one() - factor) + b * factor
}

fn on_segment(p: na::Point2<f32>, a: na::Point2<f32>, b: na::Point2<f32>) -> bool {
    let ab = b - a;
    let ap = p - a;
    let cross = ab.x * ap.y - ab.y * ap.x;
    let tolerance = f32::EPSILON * ab.norm() * ap.norm().max(1.0);

    cross.abs() <= tolerance
        && p.x >= a.x.min(b.x) - tolerance
        && p.x <= a.x.max(b.x) + tolerance
        && p.y >= a.y.min(b.y) - tolerance
        && p.y <= a.y.max(b.y) + tolerance
}

/// Even-odd test with the polygon outline counted as inside.
pub fn point_in_polygon(p: na::Point2<f32>, poly: &[na::Point2<f32>]) -> bool {
    let n = poly.len();
    if n < 3 {
        return false;
    }

    let mut inside = false;
    let mut p1 = poly[n - 1];

    for &p2 in poly {
        if on_segment(p, p1, p2) {
            return true;
        }

        if (p1.y > p.y) != (p2.y > p.y) {
            let xints = (p.y - p1.y) * (p2.x - p1.x) / (p2.y - p1.y) + p1.x;

            if p.x < xints {
                inside = !inside;
            }
        }

        p1 = p2;
    }

    inside
}

fn has_collinear_triple(points: &[na::Point2<f32>; 4]) -> bool {
    const TRIPLES: [(usize, usize, usize); 4] = [(0, 1, 2), (0, 1, 3), (0, 2, 3), (1, 2, 3)];

    TRIPLES.iter().any(|&(i, j, k)| {
        let (a, b, c) = (points[i], points[j], points[k]);
        let cross = (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x);

        cross.abs() <= f32::EPSILON
    })
}

/// Projective transform mapping four source points onto four destination points.
///
/// Solves the usual 8x8 system with `h33` fixed to one. Returns `None` when
/// the correspondences are degenerate (three collinear points, repeated
/// vertices).
pub fn perspective_transform(
    src: &[na::Point2<f32>; 4],
    dst: &[na::Point2<f32>; 4],
) -> Option<na::Matrix3<f64>> {
    if has_collinear_triple(src) || has_collinear_triple(dst) {
        return None;
    }

    let mut a = na::SMatrix::<f64, 8, 8>::zeros();
    let mut b = na::SVector::<f64, 8>::zeros();

    for (i, (s, d)) in src.iter().zip(dst.iter()).enumerate() {
        let (x, y) = (s.x as f64, s.y as f64);
        let (u, v) = (d.x as f64, d.y as f64);
        let (r1, r2) = (2 * i, 2 * i + 1);

        a[(r1, 0)] = x;
        a[(r1, 1)] = y;
        a[(r1, 2)] = 1.0;
        a[(r1, 6)] = -x * u;
        a[(r1, 7)] = -y * u;
        b[r1] = u;

        a[(r2, 3)] = x;
        a[(r2, 4)] = y;
        a[(r2, 5)] = 1.0;
        a[(r2, 6)] = -x * v;
        a[(r2, 7)] = -y * v;
        b[r2] = v;
    }

    let h = a.lu().solve(&b)?;
    if h.iter().any(|v| !v.is_finite()) {
        return None;
    }

    let m = na::Matrix3::new(h[0], h[1], h[2], h[3], h[4], h[5], h[6], h[7], 1.0);
    if m.determinant().abs() < 1e-12 {
        return None;
    }

    Some(m)
}

pub fn apply_homography(h: &na::Matrix3<f64>, p: na::Point2<f32>) -> Option<na::Point2<f32>> {
    let v = h * na::Vector3::new(p.x as f64, p.y as f64, 1.0);

    if v.z.abs() < f64::EPSILON {
        return None;
    }

    Some(na::Point2::new((v.x / v.z) as f32, (v.y / v.z) as f32))
}
