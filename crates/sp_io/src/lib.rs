// crates/sp_io/src/lib.rs

//! Serafin 二进制结果文件编解码
//!
//! Serafin 是 TELEMAC 系列求解器输出的 Fortran 顺序无格式文件：
//! 非结构三角形 (2D) 或三棱柱 (3D) 网格，每个节点上每个时刻有一组标量值。
//!
//! # 模块
//!
//! - `header`: 文件头、尺寸推导与变更辅助
//! - `reader`: 文件头解析校验与帧数据随机读取
//! - `writer`: 文件头与帧数据顺序写入
//! - `record`: Fortran 记录标记与大端编解码
//! - `language`: 变量标识语言表
//! - `precision`: 单/双精度
//! - `transform`: 网格平面坐标变换
//! - `config`: 编解码配置
//!
//! # 示例
//!
//! ```
//! use sp_io::prelude::*;
//! use std::io::Cursor;
//!
//! let config = SerafinConfig::default();
//! let mut header = SerafinHeader::from_mesh_2d(
//!     "demo",
//!     vec![0.0, 1.0, 0.0],
//!     vec![0.0, 0.0, 1.0],
//!     &[[0, 1, 2]],
//!     &config,
//! )
//! .unwrap();
//! header.add_variable_from_id("H").unwrap();
//!
//! let mut writer = SerafinWriter::from_writer(Vec::new(), "demo.slf");
//! writer.write_header(&header).unwrap();
//! writer.write_entire_frame(&header, 0.0, &[vec![1.0, 2.0, 3.0]]).unwrap();
//! let bytes = writer.finish().unwrap();
//!
//! let mut reader = SerafinReader::from_reader(Cursor::new(bytes), "demo.slf", config).unwrap();
//! reader.read_header().unwrap();
//! assert_eq!(reader.read_var_in_frame(0, "H").unwrap(), vec![1.0, 2.0, 3.0]);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod header;
pub mod language;
pub mod precision;
pub mod reader;
pub mod record;
pub mod transform;
pub mod writer;

/// 预导入模块
pub mod prelude {
    pub use crate::config::SerafinConfig;
    pub use crate::error::{ErrorKind, SerafinError, SerafinResult};
    pub use crate::header::{SerafinHeader, VariableInfo};
    pub use crate::language::{Language, VariableTable};
    pub use crate::precision::FloatPrecision;
    pub use crate::reader::SerafinReader;
    pub use crate::transform::{AffineTransform, MeshTransformation};
    pub use crate::writer::SerafinWriter;
}

pub use config::SerafinConfig;
pub use error::{ErrorKind, SerafinError, SerafinResult};
pub use header::{SerafinHeader, VariableInfo};
pub use language::{Language, VariableSpec, VariableTable};
pub use precision::FloatPrecision;
pub use reader::SerafinReader;
pub use transform::{AffineTransform, MeshTransformation};
pub use writer::SerafinWriter;
