//! 端到端: 合成噪声板体积上的自动边界估计与掩膜栅格化.

use et_berry::prelude::*;
use ndarray::Array3;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// 50 x 40 x 40 体积: 单位方差噪声限制在 z ∈ [20, 30), 其余为零.
fn noise_slab_volume() -> Array3<f32> {
    let mut rng = ChaCha8Rng::seed_from_u64(2024);
    let mut vol = Array3::<f32>::zeros((50, 40, 40));
    for ((z, _, _), v) in vol.indexed_iter_mut() {
        if (20..30).contains(&z) {
            // 均匀分布 [-√3, √3) 的方差为 1.
            *v = rng.gen_range(-1.732_f32..1.732);
        }
    }
    vol
}

#[test]
fn advanced_mode_converges_to_slab_with_defaults() {
    let vol = noise_slab_volume();

    // 全默认参数, 只遍历种子: 任何种子都必须收敛, 不允许失败.
    for seed in [0, 7, 42] {
        let params = RefineParams {
            seed,
            ..Default::default()
        };
        let pair = refine_boundaries(vol.view(), &params).unwrap();

        // 收敛的上下平面靠近真实边界 z = 30 / z = 20 (允许数个体素
        // 误差; 邻域盒必须整体落在噪声内才能得到满方差, 因此保留点
        // 的 z 范围天然偏向内侧约半个盒宽).
        let top = pair.top.get((20, 20));
        let bottom = pair.bottom.get((20, 20));
        assert!((top - 30.0).abs() <= 4.0, "seed {seed}: top = {top}");
        assert!((bottom - 20.0).abs() <= 4.0, "seed {seed}: bottom = {bottom}");
        assert!(top > bottom, "seed {seed}");

        // 体积中心列的 z 向掩膜和接近板厚 (同样受内侧偏置影响).
        let mask = LamellaMask::rasterize(vol.dim(), &pair);
        let report = mask.thickness_at(None, 0.0, None);
        assert!(
            (4.0..=9.0).contains(&report.with_offset),
            "seed {seed}: center column sum = {}",
            report.with_offset
        );
    }
}

#[test]
fn advanced_mode_is_reproducible() {
    let vol = noise_slab_volume();
    let params = RefineParams::default();
    let a = refine_boundaries(vol.view(), &params).unwrap();
    let b = refine_boundaries(vol.view(), &params).unwrap();
    assert_eq!(a, b);

    let mask_a = LamellaMask::rasterize(vol.dim(), &a);
    let mask_b = LamellaMask::rasterize(vol.dim(), &b);
    assert_eq!(mask_a, mask_b);
}

#[test]
fn near_uniform_volume_is_a_recoverable_failure() {
    // 方差处处相同的体积: 百分位过滤退化, 但保留点仍可能拟合出
    // 一张平面. 真正保证失败的是点数不足的配置.
    let vol = Array3::<f32>::zeros((30, 30, 30));
    let params = RefineParams {
        samples: 2,
        box_size: 4,
        ..Default::default()
    };
    let err = refine_boundaries(vol.view(), &params).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::FitFailure);
}

#[test]
fn manual_and_raster_end_to_end() {
    let vol = noise_slab_volume();

    // 控制点直接标出 z = 30 / z = 20 两张平面.
    let pts = ControlPointSet::new(vec![
        [0.0, 0.0, 30.0],
        [39.0, 0.0, 30.0],
        [0.0, 0.0, 20.0],
        [39.0, 0.0, 20.0],
        [0.0, 39.0, 30.0],
        [39.0, 39.0, 30.0],
        [0.0, 39.0, 20.0],
        [39.0, 39.0, 20.0],
    ])
    .unwrap();

    let pair = manual_boundaries(&pts, vol.dim(), 0.0).unwrap();
    let mut mask = LamellaMask::rasterize(vol.dim(), &pair);
    assert_eq!(mask.count_included(), 10 * 40 * 40);

    mask.zero_border(2);
    assert_eq!(mask.count_included(), 10 * 36 * 36);

    let report = mask.thickness_at(None, 0.0, Some(1.5));
    assert_eq!(report.with_offset, 15.0);
    assert_eq!(report.without_offset, 15.0);

    // 掩膜乘积把板外清零, 板内保持原值.
    let product = mask.apply(vol.view());
    assert_eq!(product[(5, 20, 20)], 0.0);
    assert_eq!(product[(25, 20, 20)], vol[(25, 20, 20)]);
    assert_eq!(product[(25, 0, 0)], 0.0); // 边框已清零.
}
