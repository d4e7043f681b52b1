//! 平面几何组件: 平面表示, 点面距离与高度求值.

use crate::error::{MaskError, MaskResult};

/// 一般法向允许的最小 |z| 分量. 低于该值视为退化.
const MIN_NORMAL_Z: f64 = 1e-9;

/// 以 "法向 + 平面上一点" 表示的边界平面.
///
/// 法向固定参数化为 `(a, b, -1)`, 因此 z 总能写成 (x, y) 的单值函数
/// `z = a x + b y + c`. 由一般法向构造时会归一化到该参数化,
/// 并拒绝 z 分量过小的法向.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Plane {
    /// 法向 (a, b, -1).
    normal: [f64; 3],

    /// 平面上一点 (0, 0, c).
    point: [f64; 3],
}

impl Plane {
    /// 由系数构造平面, 满足 z = a x + b y + c.
    #[inline]
    pub fn from_coefficients(a: f64, b: f64, c: f64) -> Self {
        Self {
            normal: [a, b, -1.0],
            point: [0.0, 0.0, c],
        }
    }

    /// 由一般法向 `n` 和平面上一点 `p` 构造平面.
    ///
    /// 若 `|n_z|` 过小 (平面近乎竖直, 高度场不再是单值函数),
    /// 返回 [`MaskError::DegenerateNormal`].
    pub fn from_normal_point(n: [f64; 3], p: [f64; 3]) -> MaskResult<Self> {
        let [nx, ny, nz] = n;
        if nz.abs() < MIN_NORMAL_Z {
            return Err(MaskError::DegenerateNormal);
        }
        let a = -nx / nz;
        let b = -ny / nz;
        let c = p[2] - a * p[0] - b * p[1];
        Ok(Self::from_coefficients(a, b, c))
    }

    /// 平面系数 (a, b, c), 满足 z = a x + b y + c.
    #[inline]
    pub fn coefficients(&self) -> (f64, f64, f64) {
        (self.normal[0], self.normal[1], self.point[2])
    }

    /// 平面法向 (a, b, -1).
    #[inline]
    pub fn normal(&self) -> [f64; 3] {
        self.normal
    }

    /// 平面在 (x, y) 处的高度.
    #[inline]
    pub fn z_at(&self, x: f64, y: f64) -> f64 {
        let (a, b, c) = self.coefficients();
        a * x + b * y + c
    }

    /// 点 `p` = (x, y, z) 到平面的有符号距离.
    ///
    /// 以 (a, b, -1) 法向为正方向: z 大于平面高度的点距离为负.
    /// 参见 [`crate::consts::ABOVE_IS_NEGATIVE`].
    #[inline]
    pub fn signed_distance(&self, p: [f64; 3]) -> f64 {
        let [a, b, _] = self.normal;
        let numerator = a * p[0] + b * p[1] - p[2] + self.point[2];
        numerator / (a * a + b * b + 1.0).sqrt()
    }

    /// 沿 z 方向平移 `dz` 后的新平面.
    #[inline]
    pub fn shifted(&self, dz: f64) -> Self {
        let (a, b, c) = self.coefficients();
        Self::from_coefficients(a, b, c + dz)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MaskError;

    fn float_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_z_at() {
        let p = Plane::from_coefficients(2.0, -1.0, 3.0);
        assert!(float_eq(p.z_at(0.0, 0.0), 3.0));
        assert!(float_eq(p.z_at(1.0, 0.0), 5.0));
        assert!(float_eq(p.z_at(1.0, 2.0), 3.0));
    }

    #[test]
    fn test_signed_distance_sign() {
        // 水平面 z = 4. z 更大的点在上方, 距离为负.
        let p = Plane::from_coefficients(0.0, 0.0, 4.0);
        assert!(p.signed_distance([0.0, 0.0, 7.0]) < 0.0);
        assert!(p.signed_distance([0.0, 0.0, 1.0]) > 0.0);
        assert!(float_eq(p.signed_distance([5.0, 5.0, 4.0]), 0.0));
        // 水平面的有符号距离即高度差的相反数.
        assert!(float_eq(p.signed_distance([0.0, 0.0, 7.0]), -3.0));
    }

    #[test]
    fn test_from_normal_point() {
        // 法向 (0, 0, 2), 过点 (1, 1, 5) => z = 5.
        let p = Plane::from_normal_point([0.0, 0.0, 2.0], [1.0, 1.0, 5.0]).unwrap();
        let (a, b, c) = p.coefficients();
        assert!(float_eq(a, 0.0) && float_eq(b, 0.0) && float_eq(c, 5.0));

        // 倾斜法向 (-1, 0, 1), 过原点 => z = x.
        let p = Plane::from_normal_point([-1.0, 0.0, 1.0], [0.0, 0.0, 0.0]).unwrap();
        assert!(float_eq(p.z_at(3.0, 9.0), 3.0));
    }

    #[test]
    fn test_degenerate_normal() {
        let err = Plane::from_normal_point([1.0, 0.0, 0.0], [0.0, 0.0, 0.0]).unwrap_err();
        assert_eq!(err, MaskError::DegenerateNormal);
    }

    #[test]
    fn test_shifted() {
        let p = Plane::from_coefficients(1.0, 0.0, 2.0).shifted(3.0);
        assert!(float_eq(p.z_at(0.0, 0.0), 5.0));
        assert!(float_eq(p.z_at(1.0, 0.0), 6.0));
    }
}
