//! 运行时错误.

use std::error::Error;
use std::fmt;

/// 错误类别. 每个 [`MaskError`] 变体唯一对应一个类别.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    /// 输入数据不合法 (控制点表等).
    InvalidInput,

    /// 参数配置不合法 (采样盒, 采样个数, 厚度等).
    InvalidConfiguration,

    /// 平面拟合失败 (点不足或退化).
    FitFailure,
}

/// 边界估计与掩膜计算的运行时错误.
///
/// 任何前置条件被违反都会立即中止本次运行, 核心不做自动恢复.
#[derive(Debug, Clone, PartialEq)]
pub enum MaskError {
    /// 控制点个数不是 4 的正倍数.
    PointsNotQuadruple(usize),

    /// 控制点表的第 (参数) 行 (1-based) 无法解析.
    MalformedPointRow(usize),

    /// 控制点表中没有任何点.
    EmptyPointTable,

    /// 采样邻域盒在某个维度上放不下.
    BoxExceedsVolume {
        /// 放不下的维度长度.
        dim: usize,
        /// 邻域盒边长.
        box_size: usize,
    },

    /// 采样点个数为 0.
    ZeroSamples,

    /// 简单模式的 lamella 总厚度超过体积 z 方向长度.
    ThicknessExceedsVolume {
        /// 要求的总厚度 (体素).
        thickness: f64,
        /// 体积 z 方向长度.
        z_dim: usize,
    },

    /// 拟合点不足.
    TooFewPoints {
        /// 目前已有的点数.
        have: usize,
        /// 实际拟合需要的最少点数.
        need: usize,
    },

    /// 共识拟合找不到最小可行共识集 (所有试验子集退化, 或内点过少).
    NoConsensus,

    /// 平面法向的 z 分量过小, 高度场 Z(x, y) 不再是单值函数.
    DegenerateNormal,
}

impl MaskError {
    /// 该错误所属的类别.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::PointsNotQuadruple(_) | Self::MalformedPointRow(_) | Self::EmptyPointTable => {
                ErrorKind::InvalidInput
            }
            Self::BoxExceedsVolume { .. }
            | Self::ZeroSamples
            | Self::ThicknessExceedsVolume { .. } => ErrorKind::InvalidConfiguration,
            Self::TooFewPoints { .. } | Self::NoConsensus | Self::DegenerateNormal => {
                ErrorKind::FitFailure
            }
        }
    }
}

impl fmt::Display for MaskError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PointsNotQuadruple(n) => {
                write!(f, "control point count {n} is not a positive multiple of 4")
            }
            Self::MalformedPointRow(line) => {
                write!(f, "control point table line {line} is malformed")
            }
            Self::EmptyPointTable => write!(f, "control point table contains no points"),
            Self::BoxExceedsVolume { dim, box_size } => write!(
                f,
                "sampling box of size {box_size} does not fit a volume dimension of {dim}"
            ),
            Self::ZeroSamples => write!(f, "sample count must be positive"),
            Self::ThicknessExceedsVolume { thickness, z_dim } => write!(
                f,
                "slab thickness {thickness} exceeds the volume z extent {z_dim}"
            ),
            Self::TooFewPoints { have, need } => {
                write!(f, "plane fit needs at least {need} points, got {have}")
            }
            Self::NoConsensus => write!(
                f,
                "no viable consensus set found; try a lower percentile or more samples"
            ),
            Self::DegenerateNormal => {
                write!(f, "fitted plane is nearly vertical, z is not single-valued")
            }
        }
    }
}

impl Error for MaskError {}

/// 核心计算的统一返回类型.
pub type MaskResult<T> = Result<T, MaskError>;
