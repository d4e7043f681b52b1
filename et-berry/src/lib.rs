#![warn(missing_docs)] // <= 合适时移除它.

//! 核心库. 提供冷冻电镜断层体积 (tomogram) 中 lamella 薄片区域的
//! 边界估计与三维二值掩膜计算.
//!
//! lamella 是体积内一块由上下两张近似平面包夹的薄板状有效信号区域.
//! 下游分析前需要先排除真空/基底等背景体素, 本 crate 负责计算对应掩膜:
//!
//! 1. 手动模式: 由操作员控制点直接拟合上下边界平面. 控制点每四个一组,
//!    组内前两个属上边界点云, 后两个属下边界点云.
//! 2. 自动模式: 可复现随机采样 + 局部方差百分位过滤 + 鲁棒共识平面拟合.
//!    简单模式由中心平面 ± 厚度/2 直接展开; 高级模式迭代精化出独立的
//!    上下两张平面.
//! 3. 两种模式共享的几何工具 (平面表示, 点面距离, 高度场求值),
//!    以及掩膜栅格化, 边框清零与厚度测量.
//!
//! # 坐标约定
//!
//! 三维数据一律按 (z, H, W) 轴序访问; 平面与控制点以 (x, y, z) 表示,
//! 其中 x ≡ W, y ≡ H. 上/下分类的符号约定集中在
//! [`consts::ABOVE_IS_NEGATIVE`], 不在其它任何位置隐式假设.
//!
//! # 执行模型
//!
//! 单次调用即单趟批量计算: 采样 -> 方差估计 -> 拟合 -> 栅格化 -> 边框
//! 清零 -> (可选) 厚度测量, 全程顺序执行. 唯一按点可并行的步骤是局部
//! 方差计算 (`rayon` feature), 且并行结果与串行逐位一致.
//!
//! # 注意
//!
//! 1. 掩膜总是先在内存中完整算出, 之后才写任何输出文件. 因此 I/O
//!    晚期失败不会留下残缺的掩膜.
//! 2. 违反前置条件的调用立即以 [`MaskError`] 中止, 核心不做任何
//!    自动回退 (手动点表损坏不会悄悄切换到自动模式).

/// 二维索引 (H, W).
pub type Idx2d = (usize, usize);

/// 三维索引 (z, H, W).
pub type Idx3d = (usize, usize, usize);

pub mod consts;

mod error;

pub use error::{ErrorKind, MaskError, MaskResult};

/// 3D 断层体积基础数据结构与 NIfTI 读写.
pub mod data;

pub use data::{Tomogram, VoxelMeta};

pub mod geom;

pub mod sample;

pub mod fit;

mod points;

pub use points::ControlPointSet;

pub mod boundary;

pub use boundary::{
    manual_boundaries, refine_boundaries, BoundaryPair, HeightField, RefineParams,
};

pub mod mask;

pub use mask::{LamellaMask, ThicknessReport};

pub mod prelude;
