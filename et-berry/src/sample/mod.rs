//! 体积内部可复现随机取样与局部方差估计.

use ndarray::{s, ArrayView3};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::error::{MaskError, MaskResult};
use crate::Idx3d;

cfg_if::cfg_if! {
    if #[cfg(feature = "rayon")] {
        use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
    }
}

/// 在体积内部均匀采样 `count` 个坐标.
///
/// 每个坐标分量落在 `[box_size / 2, dim - box_size / 2)` 内, 保证以其为
/// 中心的 `box_size`^3 邻域完全位于体积内部. 相同的
/// (shape, count, box_size, seed) 产生完全一致的坐标序列 (确定性契约).
///
/// # 错误
///
/// 任一维度长度不大于 `box_size` 时返回 [`MaskError::BoxExceedsVolume`];
/// `count == 0` 时返回 [`MaskError::ZeroSamples`].
pub fn interior_points(
    shape: Idx3d,
    count: u32,
    box_size: usize,
    seed: u64,
) -> MaskResult<Vec<Idx3d>> {
    if count == 0 {
        return Err(MaskError::ZeroSamples);
    }
    let (zd, hd, wd) = shape;
    for dim in [zd, hd, wd] {
        if dim <= box_size {
            return Err(MaskError::BoxExceedsVolume { dim, box_size });
        }
    }

    let half = box_size / 2;
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut ans = Vec::with_capacity(count as usize);
    for _ in 0..count {
        // 每个点固定按 z, h, w 顺序消耗随机流, 保证序列可复现.
        let z = rng.gen_range(half..zd - half);
        let h = rng.gen_range(half..hd - half);
        let w = rng.gen_range(half..wd - half);
        ans.push((z, h, w));
    }
    Ok(ans)
}

/// 计算以 `pos` 为中心 (整数半宽) 的 `box_size`^3 邻域块的总体方差
/// (除以体素个数, 而非个数减一).
fn block_variance(vol: &ArrayView3<f32>, (z, h, w): Idx3d, box_size: usize) -> f64 {
    let half = box_size / 2;
    let block = vol.slice(s![
        z - half..z - half + box_size,
        h - half..h - half + box_size,
        w - half..w - half + box_size
    ]);

    let n = block.len() as f64;
    let (mut sum, mut sq) = (0.0f64, 0.0f64);
    for &v in block.iter() {
        let v = v as f64;
        sum += v;
        sq += v * v;
    }
    let mean = sum / n;
    sq / n - mean * mean
}

/// 对每个坐标计算其邻域块的局部方差, 返回值与坐标一一对应.
///
/// 调用者须保证每个坐标的邻域块完全在体积内部, 即坐标来自
/// [`interior_points`] 且 `box_size` 一致. 各点之间不共享任何状态;
/// 开启 `rayon` feature 时按点并行, 每个点内部的累加顺序不变,
/// 结果与串行逐位一致.
pub fn local_variances(vol: ArrayView3<f32>, points: &[Idx3d], box_size: usize) -> Vec<f64> {
    cfg_if::cfg_if! {
        if #[cfg(feature = "rayon")] {
            points
                .par_iter()
                .map(|&p| block_variance(&vol, p, box_size))
                .collect()
        } else {
            points
                .iter()
                .map(|&p| block_variance(&vol, p, box_size))
                .collect()
        }
    }
}
