//! 通用常量与默认参数.

/// 掩膜体素值.
pub mod mask_value {
    /// 被排除 (背景/真空/基底) 的体素值.
    pub const MASK_EXCLUDED: u8 = 0;

    /// 被保留 (lamella 内部) 的体素值.
    pub const MASK_INCLUDED: u8 = 1;

    /// 体素是否被保留?
    #[inline]
    pub const fn is_included(p: u8) -> bool {
        matches!(p, MASK_INCLUDED)
    }

    /// 体素是否被排除?
    #[inline]
    pub const fn is_excluded(p: u8) -> bool {
        matches!(p, MASK_EXCLUDED)
    }
}

/// 自动模式默认随机采样点个数.
pub const DEFAULT_SAMPLE_COUNT: u32 = 20_000;

/// 局部方差邻域盒默认边长 (体素).
pub const DEFAULT_BOX_SIZE: usize = 5;

/// 高级模式默认精化迭代次数.
pub const DEFAULT_ITERATIONS: u32 = 3;

/// 方差百分位过滤默认阈值. 保留方差不低于该百分位的采样点,
/// 即默认保留方差最高的 5% 的点.
pub const DEFAULT_PERCENTILE: f64 = 95.0;

/// 鲁棒拟合的随机最小子集试验次数.
pub const RANSAC_TRIALS: u32 = 100;

/// 拟合平面 z = a x + b y + c 所需的最少点数.
pub const MIN_FIT_POINTS: usize = 3;

/// 最小可行共识集大小. 最优共识集小于该值时拟合失败.
pub const MIN_CONSENSUS: usize = 3;

/// 上/下分类的符号约定.
///
/// 对固定参数化为 (a, b, -1) 的法向, 点到平面的有符号距离分子为
/// `a x + b y - z + c`, 因此 z 大于平面高度的点距离为负. 体积按存储
/// 约定 z 随切片序号增长, 故 **距离 < 0 即位于平面上方**.
/// 若目标数据的物理方向与该存储约定相反, 翻转本常量即可,
/// 其余代码不做任何隐式方向假设.
pub const ABOVE_IS_NEGATIVE: bool = true;
