// crates/sp_io/src/precision.rs

//! 浮点精度
//!
//! Serafin 文件的浮点宽度由标题块末尾 8 字节的文件类型决定：
//! `SERAFIND` 表示双精度，其余一律按单精度处理。

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// 双精度文件类型字面量
pub const FILE_TYPE_DOUBLE: &[u8; 8] = b"SERAFIND";

/// 单精度文件类型字面量
pub const FILE_TYPE_SINGLE: &[u8; 8] = b"SERAFIN ";

/// 文件浮点精度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FloatPrecision {
    /// 4 字节浮点
    #[default]
    Single,
    /// 8 字节浮点
    Double,
}

impl FloatPrecision {
    /// 根据文件类型字段判定精度
    pub fn from_file_type(file_type: &[u8]) -> Self {
        if file_type == FILE_TYPE_DOUBLE {
            Self::Double
        } else {
            Self::Single
        }
    }

    /// 精度名称
    pub fn name(&self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::Double => "double",
        }
    }

    /// 每个浮点值占用的字节数
    #[inline]
    pub fn size_bytes(&self) -> usize {
        match self {
            Self::Single => 4,
            Self::Double => 8,
        }
    }

    /// 写入时使用的文件类型字面量
    pub fn file_type(&self) -> &'static [u8; 8] {
        match self {
            Self::Single => FILE_TYPE_SINGLE,
            Self::Double => FILE_TYPE_DOUBLE,
        }
    }

    /// 是否为双精度
    #[inline]
    pub fn is_double(&self) -> bool {
        matches!(self, Self::Double)
    }
}

impl std::fmt::Display for FloatPrecision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// 精度解析错误
#[derive(Debug, Clone)]
pub struct PrecisionParseError(String);

impl FromStr for FloatPrecision {
    type Err = PrecisionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "single" | "float" | "f32" => Ok(Self::Single),
            "double" | "f64" => Ok(Self::Double),
            _ => Err(PrecisionParseError(s.to_string())),
        }
    }
}

impl std::fmt::Display for PrecisionParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "无效的精度值: '{}', 期望 'single' 或 'double'", self.0)
    }
}

impl std::error::Error for PrecisionParseError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_file_type() {
        assert_eq!(FloatPrecision::from_file_type(b"SERAFIND"), FloatPrecision::Double);
        assert_eq!(FloatPrecision::from_file_type(b"SERAFIN "), FloatPrecision::Single);
        assert_eq!(FloatPrecision::from_file_type(b"        "), FloatPrecision::Single);
    }

    #[test]
    fn test_size_and_literal() {
        assert_eq!(FloatPrecision::Single.size_bytes(), 4);
        assert_eq!(FloatPrecision::Double.size_bytes(), 8);
        assert_eq!(FloatPrecision::Double.file_type(), b"SERAFIND");
    }

    #[test]
    fn test_parse() {
        assert_eq!("F64".parse::<FloatPrecision>().unwrap(), FloatPrecision::Double);
        assert!("half".parse::<FloatPrecision>().is_err());
    }
}
