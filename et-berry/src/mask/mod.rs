//! 三维二值掩膜: 栅格化, 边框清零, 厚度测量与掩膜乘积.

use ndarray::{s, Array3, ArrayView3, Axis};

use crate::boundary::BoundaryPair;
use crate::consts::mask_value::{MASK_EXCLUDED, MASK_INCLUDED};
use crate::{Idx2d, Idx3d};

/// lamella 二值掩膜.
///
/// 形状与原体积一致, 体素值为 [`MASK_INCLUDED`] 或 [`MASK_EXCLUDED`].
#[derive(Debug, Clone, PartialEq)]
pub struct LamellaMask {
    data: Array3<u8>,
}

/// 厚度测量结果. 提供像素尺寸时两个分量都已按其换算.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ThicknessReport {
    /// 含对称 z 偏移的厚度 (掩膜列中活跃体素个数).
    pub with_offset: f64,

    /// 逆转对称 z 偏移 (减去两倍偏移) 后的厚度.
    pub without_offset: f64,
}

impl LamellaMask {
    /// 由上下边界对栅格化掩膜.
    ///
    /// 对每个 (x, y) 列, 将 z 下标位于半开区间
    /// [round(bottom), round(top)) 内的体素置为 [`MASK_INCLUDED`],
    /// 其余为 [`MASK_EXCLUDED`]. 取整使用最近整数约定 (`f64::round`).
    /// 上边界不高于下边界的列为空列.
    pub fn rasterize(shape: Idx3d, boundaries: &BoundaryPair) -> Self {
        let (zd, hd, wd) = shape;
        let mut data = Array3::from_elem(shape, MASK_EXCLUDED);

        for y in 0..hd {
            for x in 0..wd {
                // 高度场已裁剪到 [0, Zd], round 后仍可能等于 Zd.
                let lo = boundaries.bottom.get((y, x)).round() as usize;
                let hi = (boundaries.top.get((y, x)).round() as usize).min(zd);
                for z in lo..hi {
                    data[(z, y, x)] = MASK_INCLUDED;
                }
            }
        }
        Self { data }
    }

    /// 将每个水平切片沿 H 和 W 方向宽度为 `width` 的边框清零.
    ///
    /// `width == 0` 时为空操作; 内部区域不受影响.
    pub fn zero_border(&mut self, width: usize) {
        if width == 0 {
            return;
        }
        let (_, hd, wd) = self.shape();
        let (h_edge, w_edge) = (width.min(hd), width.min(wd));

        for mut slice in self.data.axis_iter_mut(Axis(0)) {
            slice.slice_mut(s![..h_edge, ..]).fill(MASK_EXCLUDED);
            slice
                .slice_mut(s![hd - h_edge.., ..])
                .fill(MASK_EXCLUDED);
            slice.slice_mut(s![.., ..w_edge]).fill(MASK_EXCLUDED);
            slice
                .slice_mut(s![.., wd - w_edge..])
                .fill(MASK_EXCLUDED);
        }
    }

    /// 在 `at` 处 (缺省为几何中心 (H/2, W/2)) 测量掩膜的 z 向厚度.
    ///
    /// `z_offset` 为生成掩膜时使用的对称偏移: `with_offset` 是该列
    /// 活跃体素个数, `without_offset` 在其基础上减去两倍偏移以逆转
    /// 对称扩张/收缩. 提供 `pixel_size` 时两个结果都按其换算为物理单位.
    pub fn thickness_at(
        &self,
        at: Option<Idx2d>,
        z_offset: f64,
        pixel_size: Option<f64>,
    ) -> ThicknessReport {
        let (_, hd, wd) = self.shape();
        let (y, x) = at.unwrap_or((hd / 2, wd / 2));
        let count = self
            .data
            .slice(s![.., y, x])
            .iter()
            .filter(|&&v| v == MASK_INCLUDED)
            .count() as f64;

        let scale = pixel_size.unwrap_or(1.0);
        ThicknessReport {
            with_offset: count * scale,
            without_offset: (count - 2.0 * z_offset) * scale,
        }
    }

    /// 掩膜与体积的逐体素乘积.
    ///
    /// 两者形状必须一致, 否则 panic.
    pub fn apply(&self, vol: ArrayView3<f32>) -> Array3<f32> {
        assert_eq!(vol.dim(), self.shape(), "体积与掩膜形状不一致");
        let mut out = vol.to_owned();
        out.zip_mut_with(&self.data, |v, &m| *v *= m as f32);
        out
    }

    /// 活跃体素总数.
    #[inline]
    pub fn count_included(&self) -> usize {
        self.data.iter().filter(|&&v| v == MASK_INCLUDED).count()
    }

    /// 掩膜形状 (z, H, W).
    #[inline]
    pub fn shape(&self) -> Idx3d {
        self.data.dim()
    }

    /// 获得数据的一份不可变 shallow copy.
    #[inline]
    pub fn data(&self) -> ArrayView3<'_, u8> {
        self.data.view()
    }
}
