//! 3D 断层体积 (tomogram) 基础数据结构与 NIfTI 读写.
//!
//! 体积文件使用携带物理像素尺寸元数据的标准科学 3D 图像容器 (NIfTI).
//! 核心算法一律通过 [`ndarray`] 视图访问数据, 不直接接触文件.

use std::ops::Index;
use std::path::Path;

use ndarray::{Array3, ArrayView3};
use nifti::writer::WriterOptions;
use nifti::{IntoNdArray, NiftiHeader, NiftiObject, ReaderOptions};

use crate::mask::LamellaMask;
use crate::Idx3d;

/// `NiftiHeader` 是栈上大对象, 移动该对象的开销很可观.
/// 因此我们将其分配到堆上.
type BoxedHeader = Box<NiftiHeader>;

/// 将 (W, H, z) 转换成 (z, H, W). 以后均按照该模式访问.
#[inline]
fn get_shape_from_header(h: &NiftiHeader) -> Idx3d {
    // [W, H, z]. 体素个数数组.
    let [_, w, h, z, ..] = h.dim;
    (z as usize, h as usize, w as usize)
}

/// 3D 体积文件 header 的共用属性.
pub trait VoxelMeta {
    /// 获取 header 部分.
    fn header(&self) -> &NiftiHeader;

    /// 获取数据形状 (z, H, W).
    #[inline]
    fn shape(&self) -> Idx3d {
        get_shape_from_header(self.header())
    }

    /// 获取数据体素个数.
    #[inline]
    fn size(&self) -> usize {
        let (z, h, w) = self.shape();
        z * h * w
    }

    /// 获取单个体素分辨率 [z, h, w], 以文件声明的物理单位计.
    #[inline]
    fn pix_dim(&self) -> [f64; 3] {
        let [_, w, h, z, ..] = self.header().pixdim;
        [z as f64, h as f64, w as f64]
    }

    /// 获取水平切片方向的像素尺寸. 断层体积通常各向同性,
    /// 该值即单个像素边长.
    #[inline]
    fn pixel_size(&self) -> f64 {
        self.header().pixdim[1] as f64
    }
}

/// 3D 断层体积, 包括 header 和标量强度数据. 强度以 `f32` 保存,
/// 加载后只读.
#[derive(Debug, Clone)]
pub struct Tomogram {
    header: BoxedHeader,
    data: Array3<f32>,
}

impl VoxelMeta for Tomogram {
    #[inline]
    fn header(&self) -> &NiftiHeader {
        &self.header
    }
}

impl Index<Idx3d> for Tomogram {
    type Output = f32;

    #[inline]
    fn index(&self, index: Idx3d) -> &Self::Output {
        &self.data[index]
    }
}

impl Tomogram {
    /// 打开 nii 文件格式的 3D 断层体积. `path` 为本地路径.
    /// 如果打开成功, 则返回 `Ok(Self)`, 否则返回 `Err`.
    pub fn open<P: AsRef<Path>>(path: P) -> nifti::Result<Self> {
        let obj = ReaderOptions::new().read_file(path.as_ref())?;
        let header = Box::new(obj.header().clone());

        // [W, H, z] -> [z, H, W].
        let data = obj
            .into_volume()
            .into_ndarray::<f32>()?
            .permuted_axes([2, 1, 0].as_slice());

        // The nature of nifti data field layout.
        debug_assert!(data.is_standard_layout());

        // 该操作不会生成 `Err`, 可直接 unwrap.
        let data =
            Array3::<f32>::from_shape_vec(get_shape_from_header(&header), data.into_raw_vec())
                .unwrap();

        Ok(Self { header, data })
    }

    /// 根据裸数据和体素分辨率直接创建实体.
    ///
    /// `data` 按 (z, H, W) 组织, `pix_dim` 按 \[z, h, w\] 给出.
    /// 主要用于实验与测试.
    pub fn from_array(data: Array3<f32>, pix_dim: [f32; 3]) -> Self {
        let mut header = Box::<NiftiHeader>::default();
        let (z, h, w) = data.dim();
        header.dim = [3, w as u16, h as u16, z as u16, 1, 1, 1, 1];
        let [pz, ph, pw] = pix_dim;
        header.pixdim[1] = pw;
        header.pixdim[2] = ph;
        header.pixdim[3] = pz;
        Self { header, data }
    }

    /// 获得数据的一份不可变 shallow copy.
    #[inline]
    pub fn data(&self) -> ArrayView3<'_, f32> {
        self.data.view()
    }

    /// 以本体积的 header 为参照, 将掩膜写出为 nii 文件,
    /// 保留像素尺寸等元数据. 写出前还原为 nifti 惯用的 [W, H, z] 轴序.
    pub fn save_mask<P: AsRef<Path>>(&self, path: P, mask: &LamellaMask) -> nifti::Result<()> {
        let whz = mask.data().permuted_axes([2, 1, 0]);
        WriterOptions::new(path.as_ref())
            .reference_header(&self.header)
            .write_nifti(&whz)?;
        Ok(())
    }

    /// 以本体积的 header 为参照, 将派生体积 (如掩膜乘积) 写出为 nii
    /// 文件. `data` 按 (z, H, W) 组织, 形状必须与本体积一致, 否则 panic.
    pub fn save_volume<P: AsRef<Path>>(&self, path: P, data: &Array3<f32>) -> nifti::Result<()> {
        assert_eq!(data.dim(), self.shape(), "派生体积与原体积形状不一致");
        let whz = data.view().permuted_axes([2, 1, 0]);
        WriterOptions::new(path.as_ref())
            .reference_header(&self.header)
            .write_nifti(&whz)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;

    #[test]
    fn test_from_array_meta() {
        let vol = Tomogram::from_array(Array3::zeros((10, 20, 30)), [4.0, 2.0, 2.0]);
        assert_eq!(vol.shape(), (10, 20, 30));
        assert_eq!(vol.size(), 6000);
        assert_eq!(vol.pix_dim(), [4.0, 2.0, 2.0]);
        assert_eq!(vol.pixel_size(), 2.0);
    }

    #[test]
    fn test_index_order() {
        let mut data = Array3::zeros((4, 5, 6));
        data[(1, 2, 3)] = 7.5;
        let vol = Tomogram::from_array(data, [1.0, 1.0, 1.0]);
        assert_eq!(vol[(1, 2, 3)], 7.5);
        assert_eq!(vol.data()[(1, 2, 3)], 7.5);
    }
}
