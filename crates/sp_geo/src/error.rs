// crates/sp_geo/src/error.rs

//! 几何引擎错误类型
//!
//! # 错误分类
//!
//! - **输入错误**：坐标数组长度不一致、连接表节点越界
//! - **几何错误**：零面积三角形、无法剖分的多边形、退化折线

use thiserror::Error;

/// Geo 模块结果类型
pub type GeoResult<T> = Result<T, GeoError>;

/// 几何引擎错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeoError {
    /// 坐标数组长度不一致
    #[error("坐标长度不一致: x {x_len} 个, y {y_len} 个")]
    CoordinateMismatch {
        /// x 数组长度
        x_len: usize,
        /// y 数组长度
        y_len: usize,
    },

    /// 连接表引用了不存在的节点
    #[error("单元 {element} 引用节点 {node}, 超出节点数 {nb_nodes}")]
    NodeOutOfRange {
        /// 单元序号
        element: usize,
        /// 节点索引（0 起始）
        node: usize,
        /// 节点总数
        nb_nodes: usize,
    },

    /// 零面积三角形无法构造重心坐标
    #[error("退化三角形 {nodes:?}: 有向面积 {signed_area:e}")]
    DegenerateTriangle {
        /// 三个节点索引
        nodes: [usize; 3],
        /// 有向面积的两倍
        signed_area: f64,
    },

    /// 多边形无效
    #[error("无效多边形: {reason}")]
    InvalidPolygon {
        /// 原因
        reason: String,
    },

    /// 折线无效
    #[error("无效折线: {reason}")]
    InvalidPolyline {
        /// 原因
        reason: String,
    },
}

impl GeoError {
    /// 构造多边形错误
    pub fn invalid_polygon(reason: impl Into<String>) -> Self {
        Self::InvalidPolygon {
            reason: reason.into(),
        }
    }

    /// 构造折线错误
    pub fn invalid_polyline(reason: impl Into<String>) -> Self {
        Self::InvalidPolyline {
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = GeoError::NodeOutOfRange {
            element: 3,
            node: 12,
            nb_nodes: 10,
        };
        let msg = err.to_string();
        assert!(msg.contains("单元 3"));
        assert!(msg.contains("12"));

        let err = GeoError::invalid_polygon("少于 3 个顶点");
        assert!(err.to_string().contains("少于 3 个顶点"));
    }
}
