// crates/sp_calc/src/lib.rs

//! Serafin 网格上的体积与通量积分
//!
//! - `volume`: 多边形内体积（净体积、严格包含、正负拆分）
//! - `flux`: 断面通量（线积分、法向通量、面积通量、质量通量）
//! - `calculator`: 绑定文件头与变量，逐帧输出时间序列
//!
//! 两个引擎都借用同一个 [`sp_geo::MeshIndex`]，几何预处理只做一次。
//!
//! # 示例
//!
//! ```
//! use sp_calc::prelude::*;
//! use sp_geo::{MeshIndex, Point2D, Polygon};
//!
//! let mesh = MeshIndex::new(
//!     &[0.0, 1.0, 1.0, 0.0],
//!     &[0.0, 0.0, 1.0, 1.0],
//!     &[[0, 1, 2], [0, 2, 3]],
//! )
//! .unwrap();
//! let polygon = Polygon::new(vec![
//!     Point2D::new(-1.0, -1.0),
//!     Point2D::new(2.0, -1.0),
//!     Point2D::new(2.0, 2.0),
//!     Point2D::new(-1.0, 2.0),
//! ])
//! .unwrap();
//!
//! let engine = VolumeEngine::new(&mesh, VolumeMode::Net, &[polygon]);
//! let result = engine.compute(&[0.0, 0.0, 1.0, 1.0]).unwrap();
//! assert!((result[0].net - 0.5).abs() < 1e-12);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod calculator;
pub mod error;
pub mod flux;
pub mod volume;

/// 预导入模块
pub mod prelude {
    pub use crate::calculator::{FluxCalculator, FluxRow, Reference, VolumeCalculator, VolumeRow};
    pub use crate::error::{CalcError, CalcResult};
    pub use crate::flux::{FluxEngine, FluxMode, FluxPoint};
    pub use crate::volume::{VolumeEngine, VolumeMode, VolumeResult};
}

pub use calculator::{FluxCalculator, FluxRow, Reference, VolumeCalculator, VolumeRow};
pub use error::{CalcError, CalcResult};
pub use flux::{FluxEngine, FluxMode, FluxPoint};
pub use volume::{VolumeEngine, VolumeMode, VolumeResult};
