// crates/sp_io/src/error.rs

//! Serafin 编解码错误类型
//!
//! 编解码边界只有两类错误：
//! - **校验错误** (`Validation`)：文件字节本身与格式约定不一致，对当前文件是致命的
//! - **请求错误** (`Request` / `AlreadyExists`)：调用方请求了合法文件不支持的操作
//!
//! 底层 IO 错误单独包装为 `Io`，并保留文件名上下文。

use thiserror::Error;

/// Serafin 模块结果类型
pub type SerafinResult<T> = Result<T, SerafinError>;

/// 错误类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// 文件内容不符合格式约定
    Validation,
    /// 调用方请求不被支持
    Request,
    /// 底层 IO 失败
    Io,
}

/// Serafin 错误枚举
#[derive(Error, Debug)]
pub enum SerafinError {
    /// 文件校验失败
    #[error("Serafin 校验失败 [{file}]: {message}")]
    Validation {
        /// 文件名或数据源描述
        file: String,
        /// 错误描述（包含期望值与实际值）
        message: String,
    },

    /// 无效请求
    #[error("Serafin 请求无效 [{file}]: {message}")]
    Request {
        /// 文件名或数据源描述
        file: String,
        /// 错误描述
        message: String,
    },

    /// 写入目标已存在且未允许覆盖
    #[error("目标文件已存在: {path} (未允许覆盖)")]
    AlreadyExists {
        /// 目标路径
        path: String,
    },

    /// 底层 IO 错误
    #[error("IO 错误 [{file}]: {source}")]
    Io {
        /// 文件名或数据源描述
        file: String,
        /// 底层错误
        #[source]
        source: std::io::Error,
    },
}

impl SerafinError {
    /// 构造校验错误
    pub fn validation(file: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            file: file.into(),
            message: message.into(),
        }
    }

    /// 构造期望值/实际值不一致的校验错误
    pub fn mismatch(
        file: impl Into<String>,
        what: &str,
        expected: impl std::fmt::Display,
        actual: impl std::fmt::Display,
    ) -> Self {
        Self::validation(file, format!("{what}: 期望 {expected}, 实际 {actual}"))
    }

    /// 构造请求错误
    pub fn request(file: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Request {
            file: file.into(),
            message: message.into(),
        }
    }

    /// 变量不存在
    pub fn unknown_variable(file: impl Into<String>, var_id: &str) -> Self {
        Self::request(file, format!("变量 '{var_id}' 不存在"))
    }

    /// 文件头尚未读取
    pub fn header_not_read(file: impl Into<String>) -> Self {
        Self::request(file, "文件头尚未读取，请先调用 read_header()")
    }

    /// 包装 IO 错误
    pub fn io(file: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            file: file.into(),
            source,
        }
    }

    /// 错误类别
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation { .. } => ErrorKind::Validation,
            Self::Request { .. } | Self::AlreadyExists { .. } => ErrorKind::Request,
            Self::Io { .. } => ErrorKind::Io,
        }
    }

    /// 是否为校验错误
    #[inline]
    pub fn is_validation(&self) -> bool {
        self.kind() == ErrorKind::Validation
    }

    /// 是否为请求错误
    #[inline]
    pub fn is_request(&self) -> bool {
        self.kind() == ErrorKind::Request
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind() {
        let err = SerafinError::validation("a.slf", "magic");
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(err.is_validation());

        let err = SerafinError::AlreadyExists {
            path: "out.slf".into(),
        };
        assert!(err.is_request());

        let err = SerafinError::io("a.slf", std::io::Error::other("boom"));
        assert_eq!(err.kind(), ErrorKind::Io);
    }

    #[test]
    fn test_mismatch_message_has_context() {
        let err = SerafinError::mismatch("r2d.slf", "魔数", 1, 2);
        let msg = err.to_string();
        assert!(msg.contains("r2d.slf"));
        assert!(msg.contains("期望 1"));
        assert!(msg.contains("实际 2"));
    }
}
