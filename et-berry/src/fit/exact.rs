//! 可信点云的精确最优平面拟合 (主轴分解).

use nalgebra::{Matrix3, Vector3};

use crate::error::{MaskError, MaskResult};
use crate::geom::Plane;

/// 精确拟合所需的最少点数.
const MIN_EXACT_POINTS: usize = 2;

/// 特征值视为简并并列的相对容差.
const EIGEN_TIE_EPS: f64 = 1e-9;

/// 对可信点云做精确最优平面拟合.
///
/// 将点云平移到质心后计算协方差矩阵, 对其做对称特征分解,
/// 取最小特征值对应的特征向量 (方差最小的主轴) 为平面法向,
/// 平面过质心. 点被完全信任, 不做任何外点剔除.
///
/// # 错误
///
/// 点数不足时返回 [`MaskError::TooFewPoints`]; 点云退化导致法向
/// 近乎水平 (z 分量过小) 时返回 [`MaskError::DegenerateNormal`].
pub fn fit_plane_exact(points: &[[f64; 3]]) -> MaskResult<Plane> {
    if points.len() < MIN_EXACT_POINTS {
        return Err(MaskError::TooFewPoints {
            have: points.len(),
            need: MIN_EXACT_POINTS,
        });
    }

    let n = points.len() as f64;
    let mut centroid = Vector3::zeros();
    for p in points {
        centroid += Vector3::new(p[0], p[1], p[2]);
    }
    centroid /= n;

    let mut cov = Matrix3::zeros();
    for p in points {
        let d = Vector3::new(p[0], p[1], p[2]) - centroid;
        cov += d * d.transpose();
    }
    cov /= n;

    let eig = cov.symmetric_eigen();
    let mut min_i = 0;
    for i in 1..3 {
        if eig.eigenvalues[i] < eig.eigenvalues[min_i] {
            min_i = i;
        }
    }

    // 最小特征值可能二重简并 (如每侧仅两个点的点云: 零特征空间是
    // 垂直于两点连线的整个平面), 法向在其中不唯一. 在近似最小的
    // 特征值中选 z 分量绝对值最大的特征向量, 让水平点云得到水平平面,
    // 而不是随分解的任意基取向.
    let tol = EIGEN_TIE_EPS * (eig.eigenvalues.amax() + 1.0);
    let mut pick = min_i;
    for i in 0..3 {
        if eig.eigenvalues[i] - eig.eigenvalues[min_i] <= tol
            && eig.eigenvectors[(2, i)].abs() > eig.eigenvectors[(2, pick)].abs()
        {
            pick = i;
        }
    }
    let normal = eig.eigenvectors.column(pick);

    Plane::from_normal_point(
        [normal[0], normal[1], normal[2]],
        [centroid[0], centroid[1], centroid[2]],
    )
}
