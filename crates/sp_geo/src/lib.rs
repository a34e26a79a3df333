// crates/sp_geo/src/lib.rs

//! 网格几何引擎
//!
//! 为 Serafin 网格上的积分计算提供几何基础：
//!
//! - `geometry`: 点、向量与三角形/多边形工具函数
//! - `spatial_index`: 包围盒 R-tree
//! - `interpolator`: 三角形重心坐标插值
//! - `mesh_index`: 一次构建、多处共享的网格三角形索引
//! - `polygon`: 多边形与三角形求交
//! - `polyline`: 折线与三角形求交
//!
//! # 示例
//!
//! ```
//! use sp_geo::prelude::*;
//!
//! let mesh = MeshIndex::new(
//!     &[0.0, 1.0, 1.0, 0.0],
//!     &[0.0, 0.0, 1.0, 1.0],
//!     &[[0, 1, 2], [0, 2, 3]],
//! )
//! .unwrap();
//!
//! let polygon = Polygon::new(vec![
//!     Point2D::new(0.0, 0.0),
//!     Point2D::new(0.5, 0.0),
//!     Point2D::new(0.5, 1.0),
//!     Point2D::new(0.0, 1.0),
//! ])
//! .unwrap();
//!
//! let covered: f64 = mesh
//!     .elements_overlapping(&polygon.bounds())
//!     .iter()
//!     .map(|tri| polygon.intersection(&tri.ccw_vertices()).area())
//!     .sum();
//! assert!((covered - 0.5).abs() < 1e-12);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod geometry;
pub mod interpolator;
pub mod mesh_index;
pub mod polygon;
pub mod polyline;
pub mod spatial_index;

/// 预导入模块
pub mod prelude {
    pub use crate::error::{GeoError, GeoResult};
    pub use crate::geometry::Point2D;
    pub use crate::interpolator::{Interpolator, LocateTolerance, PointWeights};
    pub use crate::mesh_index::{MeshIndex, MeshTriangle};
    pub use crate::polygon::{ClipRegion, Polygon};
    pub use crate::polyline::{Polyline, SectionClip};
    pub use crate::spatial_index::{BoundingBox, SpatialIndex};
}

pub use error::{GeoError, GeoResult};
pub use geometry::Point2D;
pub use interpolator::{Interpolator, LocateTolerance, PointWeights};
pub use mesh_index::{MeshIndex, MeshTriangle};
pub use polygon::{ClipRegion, Polygon};
pub use polyline::{Polyline, SectionClip};
pub use spatial_index::{BoundingBox, SpatialIndex};
