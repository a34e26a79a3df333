// crates/sp_io/src/language.rs

//! 变量标识语言表
//!
//! Serafin 文件只保存 16 字节的变量名和单位，变量的短标识（如 `U`、`H`）
//! 需要根据文件语言查表得到。查表对象在构造读取器时显式传入，不存在全局状态。
//!
//! 表格式（每维度一张表，分号分隔，首行为表头）：
//!
//! ```text
//! varID;fr;en;unit
//! H;HAUTEUR D'EAU;WATER DEPTH;M
//! ```

use crate::error::{SerafinError, SerafinResult};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;

/// 变量名/单位字段宽度
pub const NAME_WIDTH: usize = 16;

/// 文件语言
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// 法语（TELEMAC 默认）
    #[default]
    Fr,
    /// 英语
    En,
}

impl Language {
    /// 从语言代码解析
    pub fn from_code(code: &str) -> SerafinResult<Self> {
        match code.trim().to_lowercase().as_str() {
            "fr" => Ok(Self::Fr),
            "en" => Ok(Self::En),
            other => Err(SerafinError::request(
                "language",
                format!("不支持的语言代码 '{other}', 期望 'fr' 或 'en'"),
            )),
        }
    }

    /// 语言代码
    pub fn code(&self) -> &'static str {
        match self {
            Self::Fr => "fr",
            Self::En => "en",
        }
    }
}

impl FromStr for Language {
    type Err = SerafinError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_code(s)
    }
}

/// 单个变量定义
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableSpec {
    /// 短标识
    pub id: String,
    /// 法语名称
    pub name_fr: String,
    /// 英语名称
    pub name_en: String,
    /// 单位
    pub unit: String,
}

impl VariableSpec {
    /// 指定语言的名称
    pub fn name(&self, language: Language) -> &str {
        match language {
            Language::Fr => &self.name_fr,
            Language::En => &self.name_en,
        }
    }
}

const BUILTIN_2D: &[(&str, &str, &str, &str)] = &[
    ("U", "VITESSE U", "VELOCITY U", "M/S"),
    ("V", "VITESSE V", "VELOCITY V", "M/S"),
    ("C", "CELERITE", "CELERITY", "M/S"),
    ("H", "HAUTEUR D'EAU", "WATER DEPTH", "M"),
    ("S", "SURFACE LIBRE", "FREE SURFACE", "M"),
    ("B", "FOND", "BOTTOM", "M"),
    ("F", "FROUDE", "FROUDE NUMBER", ""),
    ("Q", "DEBIT SCALAIRE", "SCALAR FLOWRATE", "M2/S"),
    ("I", "DEBIT SUIVANT X", "FLOWRATE ALONG X", "M2/S"),
    ("J", "DEBIT SUIVANT Y", "FLOWRATE ALONG Y", "M2/S"),
    ("M", "VITESSE SCALAIRE", "SCALAR VELOCITY", "M/S"),
    ("X", "VENT X", "WIND ALONG X", "M/S"),
    ("Y", "VENT Y", "WIND ALONG Y", "M/S"),
    ("P", "PRESSION ATMOS.", "AIR PRESSURE", "PASCAL"),
    ("W", "FROTTEMENT", "BOTTOM FRICTION", ""),
    ("A", "DERIVE EN X", "DRIFT ALONG X", "M"),
    ("G", "DERIVE EN Y", "DRIFT ALONG Y", "M"),
    ("L", "COURANT", "COURANT NUMBER", ""),
    ("RB", "RHO EQUIVALENT", "RHO EQUIVALENT", "KG/M3"),
];

const BUILTIN_3D: &[(&str, &str, &str, &str)] = &[
    ("Z", "COTE Z", "ELEVATION Z", "M"),
    ("U", "VITESSE U", "VELOCITY U", "M/S"),
    ("V", "VITESSE V", "VELOCITY V", "M/S"),
    ("W", "VITESSE W", "VELOCITY W", "M/S"),
    ("NUX", "NUX POUR VITESSE", "NUX FOR VELOCITY", "M2/S"),
    ("NUY", "NUY POUR VITESSE", "NUY FOR VELOCITY", "M2/S"),
    ("NUZ", "NUZ POUR VITESSE", "NUZ FOR VELOCITY", "M2/S"),
    ("RHO", "DENSITE RELATIVE", "RELATIVE DENSITY", ""),
];

/// 变量标识查找表
///
/// 2D 与 3D 文件使用不同的表（如 `W` 在 2D 中是底摩擦，在 3D 中是垂向流速）。
/// 通过 `Arc` 在多个读取器之间共享，构造后不可变。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableTable {
    entries_2d: Vec<VariableSpec>,
    entries_3d: Vec<VariableSpec>,
}

impl VariableTable {
    /// 内置 TELEMAC 变量表
    pub fn builtin() -> Self {
        let convert = |rows: &[(&str, &str, &str, &str)]| {
            rows.iter()
                .map(|&(id, fr, en, unit)| VariableSpec {
                    id: id.to_string(),
                    name_fr: fr.to_string(),
                    name_en: en.to_string(),
                    unit: unit.to_string(),
                })
                .collect()
        };
        Self {
            entries_2d: convert(BUILTIN_2D),
            entries_3d: convert(BUILTIN_3D),
        }
    }

    /// 内置表的共享句柄
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::builtin())
    }

    /// 从 2D/3D 两段分号分隔文本构造
    pub fn from_csv(text_2d: &str, text_3d: &str) -> SerafinResult<Self> {
        Ok(Self {
            entries_2d: parse_table(text_2d, "2D")?,
            entries_3d: parse_table(text_3d, "3D")?,
        })
    }

    fn entries(&self, is_2d: bool) -> &[VariableSpec] {
        if is_2d {
            &self.entries_2d
        } else {
            &self.entries_3d
        }
    }

    /// 根据文件中的变量名查找标识
    ///
    /// 名称比较忽略首尾空白与大小写。
    pub fn find_id(&self, name: &str, language: Language, is_2d: bool) -> Option<&str> {
        let name = name.trim();
        self.entries(is_2d)
            .iter()
            .find(|spec| spec.name(language).eq_ignore_ascii_case(name))
            .map(|spec| spec.id.as_str())
    }

    /// 根据标识查找定义
    pub fn spec(&self, var_id: &str, is_2d: bool) -> Option<&VariableSpec> {
        self.entries(is_2d).iter().find(|spec| spec.id == var_id)
    }

    /// 表中变量数（2D, 3D）
    pub fn len(&self) -> (usize, usize) {
        (self.entries_2d.len(), self.entries_3d.len())
    }

    /// 两张表是否都为空
    pub fn is_empty(&self) -> bool {
        self.entries_2d.is_empty() && self.entries_3d.is_empty()
    }
}

impl Default for VariableTable {
    fn default() -> Self {
        Self::builtin()
    }
}

fn parse_table(text: &str, label: &str) -> SerafinResult<Vec<VariableSpec>> {
    let source = format!("变量表 {label}");
    let mut entries = Vec::new();

    for (line_no, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let fields: Vec<&str> = trimmed.split(';').map(str::trim).collect();
        if fields.len() < 4 {
            return Err(SerafinError::validation(
                &source,
                format!("第 {} 行: 期望 4 列, 实际 {} 列", line_no + 1, fields.len()),
            ));
        }
        // 表头
        if fields[0].eq_ignore_ascii_case("varid") {
            continue;
        }
        entries.push(VariableSpec {
            id: fields[0].to_string(),
            name_fr: fields[1].to_string(),
            name_en: fields[2].to_string(),
            unit: fields[3].to_string(),
        });
    }

    Ok(entries)
}

/// 将文本填充/截断为固定宽度字节
pub fn pad_bytes(text: &str, width: usize) -> Vec<u8> {
    let mut bytes: Vec<u8> = text.bytes().take(width).collect();
    bytes.resize(width, b' ');
    bytes
}

/// 解码定宽字节为去除首尾空白的文本
pub fn decode_name(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).trim().to_string()
}
