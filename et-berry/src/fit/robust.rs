//! 鲁棒共识平面拟合 (随机最小子集 + 内点计数 + 精确重拟合).

use nalgebra::{DMatrix, DVector, Matrix3, Vector3};
use rand::seq::index::sample;
use rand_chacha::ChaCha8Rng;

use crate::consts::{MIN_CONSENSUS, MIN_FIT_POINTS, RANSAC_TRIALS};
use crate::error::{MaskError, MaskResult};
use crate::geom::Plane;

/// 内点距离阈值的下限, 防止完全共面数据导致零阈值.
const MIN_THRESHOLD: f64 = 1e-12;

/// z 值的中位数绝对偏差 (MAD), 作为数据驱动的内点距离阈值.
fn mad_threshold(points: &[[f64; 3]]) -> f64 {
    let mut zs: Vec<f64> = points.iter().map(|p| p[2]).collect();
    zs.sort_unstable_by(f64::total_cmp);
    let median = zs[zs.len() / 2];

    let mut dev: Vec<f64> = zs.iter().map(|z| (z - median).abs()).collect();
    dev.sort_unstable_by(f64::total_cmp);
    dev[dev.len() / 2].max(MIN_THRESHOLD)
}

/// 过三个点精确求解 z = a x + b y + c. 三点共线 (系数矩阵奇异) 时返回 `None`.
fn plane_through(p0: &[f64; 3], p1: &[f64; 3], p2: &[f64; 3]) -> Option<(f64, f64, f64)> {
    #[rustfmt::skip]
    let m = Matrix3::new(
        p0[0], p0[1], 1.0,
        p1[0], p1[1], 1.0,
        p2[0], p2[1], 1.0,
    );
    let rhs = Vector3::new(p0[2], p1[2], p2[2]);
    m.lu().solve(&rhs).map(|v| (v[0], v[1], v[2]))
}

/// 在下标集 `idx` 给出的共识集上做最小二乘重拟合.
fn least_squares(points: &[[f64; 3]], idx: &[usize]) -> MaskResult<(f64, f64, f64)> {
    let mut a = DMatrix::<f64>::zeros(idx.len(), 3);
    let mut b = DVector::<f64>::zeros(idx.len());
    for (row, &i) in idx.iter().enumerate() {
        a[(row, 0)] = points[i][0];
        a[(row, 1)] = points[i][1];
        a[(row, 2)] = 1.0;
        b[row] = points[i][2];
    }
    let sol = a
        .svd(true, true)
        .solve(&b, MIN_THRESHOLD)
        .map_err(|_| MaskError::NoConsensus)?;
    Ok((sol[0], sol[1], sol[2]))
}

/// 以随机最小子集共识方式鲁棒拟合平面 z = a x + b y + c.
///
/// 固定试验 [`RANSAC_TRIALS`] 次: 每次随机取 3 个互异点精确解出候选平面,
/// 统计有符号距离绝对值不超过阈值的内点个数, 保留共识集最大的候选.
/// 内点阈值取全部 z 值的中位数绝对偏差 (MAD). 最后在最优共识集上做
/// 精确最小二乘重拟合. 相同的点序列与 rng 状态产生完全一致的结果.
///
/// # 错误
///
/// 点数不足 [`MIN_FIT_POINTS`] 时返回 [`MaskError::TooFewPoints`];
/// 所有试验子集共线或最优共识集小于 [`MIN_CONSENSUS`] 时返回
/// [`MaskError::NoConsensus`].
pub fn fit_plane_robust(points: &[[f64; 3]], rng: &mut ChaCha8Rng) -> MaskResult<Plane> {
    if points.len() < MIN_FIT_POINTS {
        return Err(MaskError::TooFewPoints {
            have: points.len(),
            need: MIN_FIT_POINTS,
        });
    }

    let threshold = mad_threshold(points);
    let mut best: Vec<usize> = vec![];

    for _ in 0..RANSAC_TRIALS {
        let pick = sample(rng, points.len(), MIN_FIT_POINTS);
        let Some((a, b, c)) = plane_through(
            &points[pick.index(0)],
            &points[pick.index(1)],
            &points[pick.index(2)],
        ) else {
            continue; // 退化子集, 该次试验作废.
        };

        let candidate = Plane::from_coefficients(a, b, c);
        let inliers: Vec<usize> = points
            .iter()
            .enumerate()
            .filter(|(_, p)| candidate.signed_distance(**p).abs() <= threshold)
            .map(|(i, _)| i)
            .collect();
        if inliers.len() > best.len() {
            best = inliers;
        }
    }

    if best.len() < MIN_CONSENSUS {
        return Err(MaskError::NoConsensus);
    }
    let (a, b, c) = least_squares(points, &best)?;
    Ok(Plane::from_coefficients(a, b, c))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn float_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    /// 平面 z = 0.5 x + 0.25 y + 3 上的格点.
    fn on_plane_grid() -> Vec<[f64; 3]> {
        let mut pts = vec![];
        for x in 0..6 {
            for y in 0..5 {
                let (x, y) = (x as f64, y as f64);
                pts.push([x, y, 0.5 * x + 0.25 * y + 3.0]);
            }
        }
        pts
    }

    #[test]
    fn test_recovers_plane_with_outliers() {
        let mut pts = on_plane_grid();
        // 远超 MAD 阈值的外点.
        pts.push([1.0, 1.0, 80.0]);
        pts.push([4.0, 2.0, -70.0]);
        pts.push([2.0, 3.0, 95.0]);

        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let plane = fit_plane_robust(&pts, &mut rng).unwrap();
        let (a, b, c) = plane.coefficients();
        assert!(float_eq(a, 0.5), "a = {a}");
        assert!(float_eq(b, 0.25), "b = {b}");
        assert!(float_eq(c, 3.0), "c = {c}");
    }

    #[test]
    fn test_deterministic_given_rng() {
        let pts = on_plane_grid();
        let p1 = fit_plane_robust(&pts, &mut ChaCha8Rng::seed_from_u64(9)).unwrap();
        let p2 = fit_plane_robust(&pts, &mut ChaCha8Rng::seed_from_u64(9)).unwrap();
        assert_eq!(p1, p2);
    }

    #[test]
    fn test_too_few_points() {
        let pts = [[0.0, 0.0, 0.0], [1.0, 0.0, 1.0]];
        let err = fit_plane_robust(&pts, &mut ChaCha8Rng::seed_from_u64(0)).unwrap_err();
        assert_eq!(err, MaskError::TooFewPoints { have: 2, need: 3 });
    }

    #[test]
    fn test_collinear_points_no_consensus() {
        // x-y 投影共线: 任何三点子集的系数矩阵都奇异.
        let pts: Vec<[f64; 3]> = (0..8).map(|i| [i as f64, i as f64, 1.0]).collect();
        let err = fit_plane_robust(&pts, &mut ChaCha8Rng::seed_from_u64(0)).unwrap_err();
        assert_eq!(err, MaskError::NoConsensus);
    }
}
