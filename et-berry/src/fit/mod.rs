//! 平面拟合.
//!
//! 给定一系列散点 (x, y, z), 该模块可以拟合出一张 z = a x + b y + c
//! 形式的平面: 对带外点的散点用鲁棒共识拟合, 对可信点云用精确主轴拟合.

mod exact;
mod robust;

pub use exact::fit_plane_exact;
pub use robust::fit_plane_robust;
