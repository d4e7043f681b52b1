//! 手动边界构建: 由操作员控制点直接得到上下平面.

use log::debug;

use crate::error::MaskResult;
use crate::fit::fit_plane_exact;
use crate::points::ControlPointSet;
use crate::Idx3d;

use super::BoundaryPair;

/// 由控制点集合构建上下边界.
///
/// 按四元组规则把控制点拆分为上下两个点云, 分别做精确主轴平面拟合.
/// 控制点被完全信任: 不做外点剔除, 也不迭代. `z_offset` 的含义与
/// 自动模式一致 (为正时 lamella 向外扩张).
///
/// # 错误
///
/// 任一点云退化 (点不足或法向近乎水平) 时, 对应的 `FitFailure`
/// 类错误向上传播.
pub fn manual_boundaries(
    points: &ControlPointSet,
    shape: Idx3d,
    z_offset: f64,
) -> MaskResult<BoundaryPair> {
    let (top_cloud, bottom_cloud) = points.split_clouds();
    debug!(
        "manual mode: {} top points, {} bottom points",
        top_cloud.len(),
        bottom_cloud.len()
    );

    let top = fit_plane_exact(&top_cloud)?;
    let bottom = fit_plane_exact(&bottom_cloud)?;
    Ok(BoundaryPair::from_planes(&top, &bottom, shape, z_offset))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MaskError;

    #[test]
    fn test_manual_two_flat_planes() {
        // 两个四元组, 上点云全在 z = 30, 下点云全在 z = 10.
        let pts = ControlPointSet::new(vec![
            [0.0, 0.0, 30.0],
            [40.0, 0.0, 30.0],
            [0.0, 0.0, 10.0],
            [40.0, 0.0, 10.0],
            [0.0, 40.0, 30.0],
            [40.0, 40.0, 30.0],
            [0.0, 40.0, 10.0],
            [40.0, 40.0, 10.0],
        ])
        .unwrap();

        let pair = manual_boundaries(&pts, (50, 41, 41), 0.0).unwrap();
        for at in [(0, 0), (20, 20), (40, 40)] {
            assert!((pair.top.get(at) - 30.0).abs() < 1e-9);
            assert!((pair.bottom.get(at) - 10.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_manual_single_quartet() {
        // 最小合法输入: 一个四元组, 每侧点云只有两个点.
        let pts = ControlPointSet::new(vec![
            [0.0, 0.0, 30.0],
            [10.0, 0.0, 30.0],
            [0.0, 0.0, 10.0],
            [10.0, 0.0, 10.0],
        ])
        .unwrap();

        let pair = manual_boundaries(&pts, (40, 11, 11), 0.0).unwrap();
        for at in [(0, 0), (5, 5), (10, 10)] {
            assert!((pair.top.get(at) - 30.0).abs() < 1e-9);
            assert!((pair.bottom.get(at) - 10.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_manual_offset_applied() {
        let pts = ControlPointSet::new(vec![
            [0.0, 0.0, 30.0],
            [40.0, 0.0, 30.0],
            [0.0, 0.0, 10.0],
            [40.0, 0.0, 10.0],
            [0.0, 40.0, 30.0],
            [40.0, 40.0, 30.0],
            [0.0, 40.0, 10.0],
            [40.0, 40.0, 10.0],
        ])
        .unwrap();

        let pair = manual_boundaries(&pts, (50, 41, 41), 3.0).unwrap();
        assert!((pair.top.get((20, 20)) - 33.0).abs() < 1e-9);
        assert!((pair.bottom.get((20, 20)) - 7.0).abs() < 1e-9);
    }

    #[test]
    fn test_quadruple_rule_enforced_upstream() {
        // 个数不是 4 的倍数在 ControlPointSet 构造时即失败,
        // manual_boundaries 只接受合法集合.
        let err = ControlPointSet::new(vec![[0.0, 0.0, 0.0]; 6]).unwrap_err();
        assert_eq!(err, MaskError::PointsNotQuadruple(6));
        assert_eq!(err.kind(), crate::ErrorKind::InvalidInput);
    }
}
