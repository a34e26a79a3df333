// crates/sp_io/src/config.rs

//! 编解码配置
//!
//! 读取器和新建文件头所需的全部外部参数集中在 [`SerafinConfig`] 中，
//! 在构造时显式传入。

use crate::language::{Language, VariableTable};
use crate::precision::FloatPrecision;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Serafin 编解码配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerafinConfig {
    /// 文件语言（决定变量名查表的列）
    #[serde(default)]
    pub language: Language,
    /// 新建文件头的浮点精度
    #[serde(default)]
    pub precision: FloatPrecision,
    /// 变量标识查找表
    #[serde(skip)]
    pub table: Arc<VariableTable>,
}

impl Default for SerafinConfig {
    fn default() -> Self {
        Self {
            language: Language::default(),
            precision: FloatPrecision::default(),
            table: VariableTable::shared(),
        }
    }
}

impl SerafinConfig {
    /// 指定语言的默认配置
    pub fn with_language(language: Language) -> Self {
        Self {
            language,
            ..Self::default()
        }
    }

    /// 替换精度
    #[must_use]
    pub fn precision(mut self, precision: FloatPrecision) -> Self {
        self.precision = precision;
        self
    }

    /// 替换变量表
    #[must_use]
    pub fn table(mut self, table: Arc<VariableTable>) -> Self {
        self.table = table;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SerafinConfig::default();
        assert_eq!(config.language, Language::Fr);
        assert_eq!(config.precision, FloatPrecision::Single);
        assert!(!config.table.is_empty());
    }

    #[test]
    fn test_deserialize_uses_builtin_table() {
        let config: SerafinConfig =
            serde_json::from_str(r#"{"language":"en","precision":"double"}"#).unwrap();
        assert_eq!(config.language, Language::En);
        assert!(config.precision.is_double());
        assert_eq!(config.table.len(), VariableTable::builtin().len());
    }
}
