//! 边界高度场与上下边界对.

use ndarray::Array2;

use crate::geom::Plane;
use crate::{Idx2d, Idx3d};

mod auto;
mod manual;

pub use auto::{refine_boundaries, RefineParams};
pub use manual::manual_boundaries;

/// 平面的 Z 高度场.
///
/// 形状为 (H, W), 每个元素是平面在该 (x, y) 处的高度, 值域裁剪到
/// [0, Zd]. 创建后不再修改.
#[derive(Debug, Clone, PartialEq)]
pub struct HeightField {
    data: Array2<f64>,
}

impl HeightField {
    /// 在 (H, W) 网格上求值平面高度, 并裁剪到 [0, z_max].
    pub fn from_plane(plane: &Plane, slice_shape: Idx2d, z_max: f64) -> Self {
        let data = Array2::from_shape_fn(slice_shape, |(y, x)| {
            plane.z_at(x as f64, y as f64).clamp(0.0, z_max)
        });
        Self { data }
    }

    /// (H, W) 位置处的高度.
    #[inline]
    pub fn get(&self, pos: Idx2d) -> f64 {
        self.data[pos]
    }

    /// 高度场形状 (H, W).
    #[inline]
    pub fn shape(&self) -> Idx2d {
        self.data.dim()
    }
}

/// 上下边界高度场对.
///
/// 预期不变式为 top(x, y) >= bottom(x, y), 但不做强制:
/// 违反处的掩膜列为空, 而非错误.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryPair {
    /// 上边界高度场.
    pub top: HeightField,

    /// 下边界高度场.
    pub bottom: HeightField,
}

impl BoundaryPair {
    /// 由上下平面在体积形状上求值得到边界对.
    ///
    /// `z_offset` 为对称 z 偏移: 为正时上边界上移, 下边界下移,
    /// lamella 向外扩张; 为负时收缩. 两个高度场都裁剪到 [0, Zd].
    pub fn from_planes(top: &Plane, bottom: &Plane, shape: Idx3d, z_offset: f64) -> Self {
        let (zd, h, w) = shape;
        let z_max = zd as f64;
        Self {
            top: HeightField::from_plane(&top.shifted(z_offset), (h, w), z_max),
            bottom: HeightField::from_plane(&bottom.shifted(-z_offset), (h, w), z_max),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_height_field_clipped() {
        // z = 2 x - 5 在 x 较小处为负, 较大处超过 z_max.
        let plane = Plane::from_coefficients(2.0, 0.0, -5.0);
        let hf = HeightField::from_plane(&plane, (4, 12), 10.0);
        assert_eq!(hf.shape(), (4, 12));
        assert_eq!(hf.get((0, 0)), 0.0);
        assert_eq!(hf.get((3, 4)), 3.0);
        assert_eq!(hf.get((0, 11)), 10.0);
    }

    #[test]
    fn test_boundary_pair_offset() {
        let top = Plane::from_coefficients(0.0, 0.0, 12.0);
        let bottom = Plane::from_coefficients(0.0, 0.0, 8.0);
        let pair = BoundaryPair::from_planes(&top, &bottom, (20, 3, 3), 2.0);
        // 偏移为正: 上边界上移, 下边界下移.
        assert_eq!(pair.top.get((1, 1)), 14.0);
        assert_eq!(pair.bottom.get((1, 1)), 6.0);

        let shrunk = BoundaryPair::from_planes(&top, &bottom, (20, 3, 3), -1.0);
        assert_eq!(shrunk.top.get((0, 0)), 11.0);
        assert_eq!(shrunk.bottom.get((0, 0)), 9.0);
    }
}
