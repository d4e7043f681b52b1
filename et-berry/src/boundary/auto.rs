//! 自动边界估计: 采样 + 方差百分位过滤 + 迭代鲁棒平面精化.

use log::debug;
use ndarray::ArrayView3;
use ordered_float::OrderedFloat;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::consts::{
    ABOVE_IS_NEGATIVE, DEFAULT_BOX_SIZE, DEFAULT_ITERATIONS, DEFAULT_PERCENTILE,
    DEFAULT_SAMPLE_COUNT, MIN_FIT_POINTS,
};
use crate::error::{MaskError, MaskResult};
use crate::fit::fit_plane_robust;
use crate::geom::Plane;
use crate::sample::{interior_points, local_variances};
use crate::Idx3d;

use super::BoundaryPair;

/// 自动边界估计参数.
#[derive(Copy, Clone, Debug)]
pub struct RefineParams {
    /// 随机采样点个数.
    pub samples: u32,

    /// 局部方差邻域盒边长 (体素).
    pub box_size: usize,

    /// 高级模式精化迭代次数.
    pub iterations: u32,

    /// 是否使用简单模式 (中心平面 ± 厚度 / 2), 否则使用高级
    /// (上下平面独立迭代精化) 模式.
    pub simple: bool,

    /// 简单模式的 lamella 总厚度 (体素). `None` 时取体积 z 长度的一半.
    pub thickness: Option<f64>,

    /// 方差百分位阈值, 单位为百分比. 保留方差不低于该百分位的点.
    pub percentile: f64,

    /// 对称 z 偏移 (体素). 为正时掩膜向外扩张, 为负时收缩.
    pub z_offset: f64,

    /// 随机数种子. 采样与拟合共用该种子派生的随机流.
    pub seed: u64,
}

impl Default for RefineParams {
    fn default() -> Self {
        Self {
            samples: DEFAULT_SAMPLE_COUNT,
            box_size: DEFAULT_BOX_SIZE,
            iterations: DEFAULT_ITERATIONS,
            simple: false,
            thickness: None,
            percentile: DEFAULT_PERCENTILE,
            z_offset: 0.0,
            seed: 0,
        }
    }
}

/// 点是否位于平面上方. 符号约定见 [`ABOVE_IS_NEGATIVE`].
#[inline]
fn is_above(plane: &Plane, p: [f64; 3]) -> bool {
    let d = plane.signed_distance(p);
    if ABOVE_IS_NEGATIVE {
        d < 0.0
    } else {
        d > 0.0
    }
}

/// 点是否位于平面下方.
#[inline]
fn is_below(plane: &Plane, p: [f64; 3]) -> bool {
    let d = plane.signed_distance(p);
    if ABOVE_IS_NEGATIVE {
        d > 0.0
    } else {
        d < 0.0
    }
}

/// 精化循环的显式状态.
///
/// 初始为单一中心平面; 第一次转移将点集按上下分裂并拟合出平面对,
/// 之后每次转移都对平面对应用同一个转移函数. 这样 "第一轮是单平面,
/// 之后是平面对" 不需要按轮数特判.
enum RefineState {
    /// 中心平面与全部保留点.
    Single {
        /// 中心平面.
        plane: Plane,
        /// 方差过滤后保留的全部点.
        points: Vec<[f64; 3]>,
    },

    /// 上下平面与各自的边界候选点子集.
    Pair {
        /// 上平面与其候选点.
        top: (Plane, Vec<[f64; 3]>),
        /// 下平面与其候选点.
        bottom: (Plane, Vec<[f64; 3]>),
    },
}

impl RefineState {
    /// 统一转移函数.
    ///
    /// 单平面状态: 按到中心平面的有符号距离把点分成上下两个子集,
    /// 并对两个子集分别做鲁棒拟合, 进入平面对状态.
    /// 平面对状态: 对每侧独立做一次 [`Self::tighten`] 收紧.
    fn step(self, rng: &mut ChaCha8Rng) -> MaskResult<Self> {
        match self {
            Self::Single { plane, points } => {
                let (above, below): (Vec<_>, Vec<_>) =
                    points.into_iter().partition(|&p| is_above(&plane, p));
                debug!("initial split: {} above, {} below", above.len(), below.len());

                let top = fit_plane_robust(&above, rng)?;
                let bottom = fit_plane_robust(&below, rng)?;
                Ok(Self::Pair {
                    top: (top, above),
                    bottom: (bottom, below),
                })
            }
            Self::Pair { top, bottom } => {
                let top = Self::tighten(top, is_above, rng)?;
                let bottom = Self::tighten(bottom, is_below, rng)?;
                Ok(Self::Pair { top, bottom })
            }
        }
    }

    /// 对单侧平面做一次收紧: 丢弃落在自己平面内侧的点后重拟合,
    /// 使平面向点集的包络边界移动.
    ///
    /// 重拟合会把平面重新放回剩余点的中间, 因此外侧点会逐轮减少;
    /// 剩余外侧点不足以再拟合时, 平面已经收敛到包络,
    /// 保持当前平面与点集不变, 而不是让拟合以点数不足失败.
    fn tighten(
        (plane, points): (Plane, Vec<[f64; 3]>),
        outside: fn(&Plane, [f64; 3]) -> bool,
        rng: &mut ChaCha8Rng,
    ) -> MaskResult<(Plane, Vec<[f64; 3]>)> {
        let kept: Vec<_> = points
            .iter()
            .copied()
            .filter(|&p| outside(&plane, p))
            .collect();
        if kept.len() < MIN_FIT_POINTS {
            debug!(
                "side exhausted ({} of {} left), keeping converged plane",
                kept.len(),
                points.len()
            );
            return Ok((plane, points));
        }
        debug!("refine step: {} of {} kept", kept.len(), points.len());

        let refit = fit_plane_robust(&kept, rng)?;
        Ok((refit, kept))
    }
}

/// 方差百分位过滤: 保留方差不低于 `percentile` 百分位的采样点,
/// 并把保留点的坐标转换成拟合用的 (x, y, z) 格式.
///
/// 高局部方差对应 lamella 内部的结构化信号, 低方差对应平滑的
/// 背景/真空 -- 这是一个启发式阈值, 不保证完全分离.
fn percentile_filter(coords: &[Idx3d], vars: &[f64], percentile: f64) -> Vec<[f64; 3]> {
    debug_assert_eq!(coords.len(), vars.len());
    debug_assert!(!coords.is_empty());

    let mut sorted: Vec<OrderedFloat<f64>> = vars.iter().copied().map(OrderedFloat).collect();
    sorted.sort_unstable();
    let rank = ((percentile / 100.0).clamp(0.0, 1.0) * (sorted.len() - 1) as f64).round() as usize;
    let threshold = sorted[rank].0;

    coords
        .iter()
        .zip(vars)
        .filter(|(_, &v)| v >= threshold)
        .map(|(&(z, h, w), _)| [w as f64, h as f64, z as f64])
        .collect()
}

/// 自动估计上下边界.
///
/// 共享阶段: 可复现随机采样 -> 逐点局部方差 -> 方差百分位过滤 ->
/// 鲁棒拟合一张中心平面. 简单模式由中心平面 ± 厚度/2 直接展开出
/// 上下边界; 高级模式从 [`RefineState`] 的单平面状态出发, 应用
/// `iterations` 次转移收敛到独立的上下平面. 某一侧的外侧候选点
/// 先于迭代次数耗尽时, 该侧停在已收敛的平面上, 不视为错误.
/// 两种模式最后都按 `z_offset` 对称偏移并裁剪到 [0, Zd].
///
/// 相同的种子, 百分位, 迭代次数与数据保证输出完全一致.
///
/// # 错误
///
/// 采样参数不合法时返回 `InvalidConfiguration` 类错误; 方差过滤后
/// 剩余点不足以稳定拟合 (如近乎均匀的体积) 时, 底层拟合的
/// `FitFailure` 类错误原样向上传播. 调用者可降低百分位或增大采样数
/// 后重试.
pub fn refine_boundaries(vol: ArrayView3<f32>, params: &RefineParams) -> MaskResult<BoundaryPair> {
    let shape = vol.dim();
    let coords = interior_points(shape, params.samples, params.box_size, params.seed)?;
    let vars = local_variances(vol, &coords, params.box_size);
    let retained = percentile_filter(&coords, &vars, params.percentile);
    debug!(
        "retained {} of {} samples above the {}th variance percentile",
        retained.len(),
        coords.len(),
        params.percentile
    );

    // 拟合使用由同一种子派生的独立随机流, 与采样流互不干扰.
    let mut rng = ChaCha8Rng::seed_from_u64(params.seed.wrapping_add(1));
    let center = fit_plane_robust(&retained, &mut rng)?;

    let (zd, ..) = shape;
    if params.simple {
        let thickness = params.thickness.unwrap_or(zd as f64 / 2.0);
        if thickness > zd as f64 {
            return Err(MaskError::ThicknessExceedsVolume {
                thickness,
                z_dim: zd,
            });
        }
        let top = center.shifted(thickness / 2.0);
        let bottom = center.shifted(-thickness / 2.0);
        return Ok(BoundaryPair::from_planes(&top, &bottom, shape, params.z_offset));
    }

    let mut state = RefineState::Single {
        plane: center,
        points: retained,
    };
    for _ in 0..params.iterations {
        state = state.step(&mut rng)?;
    }

    match state {
        RefineState::Pair {
            top: (top, _),
            bottom: (bottom, _),
        } => Ok(BoundaryPair::from_planes(&top, &bottom, shape, params.z_offset)),
        // iterations == 0: 保持单平面, 上下边界重合于中心平面.
        RefineState::Single { plane, .. } => {
            Ok(BoundaryPair::from_planes(&plane, &plane, shape, params.z_offset))
        }
    }
}
