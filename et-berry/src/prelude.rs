//! 常用功能的一站式导入.

pub use crate::{Idx2d, Idx3d};

pub use crate::boundary::{
    manual_boundaries, refine_boundaries, BoundaryPair, HeightField, RefineParams,
};
pub use crate::consts::mask_value::{MASK_EXCLUDED, MASK_INCLUDED};
pub use crate::data::{Tomogram, VoxelMeta};
pub use crate::error::{ErrorKind, MaskError, MaskResult};
pub use crate::geom::Plane;
pub use crate::mask::{LamellaMask, ThicknessReport};
pub use crate::points::ControlPointSet;
