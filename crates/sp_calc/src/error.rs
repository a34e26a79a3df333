// crates/sp_calc/src/error.rs

//! 计算层错误类型
//!
//! 编解码错误与几何错误经 `#[from]` 汇入 [`CalcError`]，向上统一传播。

use sp_geo::GeoError;
use sp_io::{ErrorKind, SerafinError};
use thiserror::Error;

/// 计算模块结果类型
pub type CalcResult<T> = Result<T, CalcError>;

/// 计算错误
#[derive(Error, Debug)]
pub enum CalcError {
    /// 请求的变量不在文件头中
    #[error("变量 {var_id} 不存在, 可用变量: {available:?}")]
    MissingVariable {
        /// 变量标识
        var_id: String,
        /// 文件头中的变量标识
        available: Vec<String>,
    },

    /// 计算只支持 2D 网格
    #[error("{operation} 不支持 3D 文件")]
    Unsupported3d {
        /// 操作名
        operation: &'static str,
    },

    /// 节点值数组长度与网格不符
    #[error("{field} 长度不匹配: 期望 {expected}, 实际 {actual}")]
    ValueLength {
        /// 字段名
        field: &'static str,
        /// 期望长度
        expected: usize,
        /// 实际长度
        actual: usize,
    },

    /// 结果写出失败
    #[error("写出 {target} 失败: {source}")]
    Io {
        /// 目标名
        target: String,
        /// 底层错误
        #[source]
        source: std::io::Error,
    },

    /// 编解码错误
    #[error(transparent)]
    Serafin(#[from] SerafinError),

    /// 几何错误
    #[error(transparent)]
    Geo(#[from] GeoError),
}

impl CalcError {
    /// 由文件头中的变量列表构造缺失变量错误
    pub fn missing_variable(var_id: &str, available: &[&str]) -> Self {
        Self::MissingVariable {
            var_id: var_id.to_string(),
            available: available.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// 检查节点值数组长度
    pub fn check_length(field: &'static str, expected: usize, actual: usize) -> CalcResult<()> {
        if expected == actual {
            Ok(())
        } else {
            Err(Self::ValueLength {
                field,
                expected,
                actual,
            })
        }
    }

    /// 构造写出错误
    pub fn io(target: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            target: target.into(),
            source,
        }
    }

    /// 错误类别；几何错误与调用方参数错误均归为请求错误
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Serafin(err) => err.kind(),
            Self::Io { .. } => ErrorKind::Io,
            Self::MissingVariable { .. }
            | Self::Unsupported3d { .. }
            | Self::ValueLength { .. }
            | Self::Geo(_) => ErrorKind::Request,
        }
    }
}
