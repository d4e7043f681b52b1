//! 操作员控制点集合及其纯文本点表解析.

use std::io::BufRead;

use itertools::Itertools;

use crate::error::{MaskError, MaskResult};

/// 有序控制点集合.
///
/// 点以 (x, y, z) 存储, 个数必须是 4 的正倍数: 每个四元组内,
/// 第 1-2 个点属于上边界点云, 第 3-4 个点属于下边界点云.
/// 二进制模型文件到纯文本点表的转换由外部工具完成, 核心只接受
/// 已解析的点列表, 绝不自行调用外部进程.
#[derive(Debug, Clone, PartialEq)]
pub struct ControlPointSet {
    points: Vec<[f64; 3]>,
}

impl ControlPointSet {
    /// 由已解析的点列表构造.
    ///
    /// 个数为 0 或不是 4 的倍数时返回 [`MaskError::PointsNotQuadruple`].
    pub fn new(points: Vec<[f64; 3]>) -> MaskResult<Self> {
        if points.is_empty() || points.len() % 4 != 0 {
            return Err(MaskError::PointsNotQuadruple(points.len()));
        }
        Ok(Self { points })
    }

    /// 从纯文本点表解析控制点.
    ///
    /// 每行一个点, 列以空白分隔, 取每行 **最后三列** 作为 x y z:
    /// `model2point` 之类的转换工具输出的表可能携带前导的
    /// object/contour 编号列. 空行与 `#` 开头的行被忽略.
    ///
    /// # 错误
    ///
    /// 某行列数不足或数字无法解析时, 返回带 1-based 行号的
    /// [`MaskError::MalformedPointRow`]; 表中没有任何点时返回
    /// [`MaskError::EmptyPointTable`]; 点数不是 4 的倍数时返回
    /// [`MaskError::PointsNotQuadruple`].
    pub fn from_reader<R: BufRead>(reader: R) -> MaskResult<Self> {
        let mut points = vec![];
        for (i, line) in reader.lines().enumerate() {
            let lineno = i + 1;
            let line = line.map_err(|_| MaskError::MalformedPointRow(lineno))?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let cols: Vec<&str> = line.split_whitespace().collect();
            if cols.len() < 3 {
                return Err(MaskError::MalformedPointRow(lineno));
            }
            let mut p = [0.0f64; 3];
            for (k, s) in cols[cols.len() - 3..].iter().enumerate() {
                p[k] = s
                    .parse()
                    .map_err(|_| MaskError::MalformedPointRow(lineno))?;
            }
            points.push(p);
        }
        if points.is_empty() {
            return Err(MaskError::EmptyPointTable);
        }
        Self::new(points)
    }

    /// 点的个数. 构造保证其为 4 的正倍数.
    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// 是否为空. 构造保证非空, 该方法按惯例保留.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// 以切片访问全部点.
    #[inline]
    pub fn as_slice(&self) -> &[[f64; 3]] {
        &self.points
    }

    /// 按固定的四元组规则拆分为 (上点云, 下点云).
    pub fn split_clouds(&self) -> (Vec<[f64; 3]>, Vec<[f64; 3]>) {
        let mut top = Vec::with_capacity(self.points.len() / 2);
        let mut bottom = Vec::with_capacity(self.points.len() / 2);
        for (p0, p1, p2, p3) in self.points.iter().tuples() {
            top.push(*p0);
            top.push(*p1);
            bottom.push(*p2);
            bottom.push(*p3);
        }
        (top, bottom)
    }
}
