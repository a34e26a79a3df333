// crates/sp_geo/src/interpolator.rs

//! 三角形重心坐标插值
//!
//! 每个 [`Interpolator`] 对应一个三角形，构造时预计算面积法所需的差分量，
//! 查询点时只做几次乘加。
//!
//! 面积法:
//!
//! ```text
//! D  = (y2 - y3)(x1 - x3) + (x3 - x2)(y1 - y3)
//! λ1 = [(y2 - y3)(x  - x3) + (x3 - x2)(y  - y3)] / D
//! λ2 = [(y3 - y1)(x  - x3) + (x1 - x3)(y  - y3)] / D
//! λ3 = 1 - λ1 - λ2
//! ```
//!
//! 按此顺序计算时，三个顶点处的权重精确等于单位向量。

use crate::error::{GeoError, GeoResult};
use crate::geometry::Point2D;
use serde::{Deserialize, Serialize};

// ============================================================
// 容差配置
// ============================================================

/// 定位容差配置
///
/// 控制几何判断的容差阈值，用于处理浮点精度问题。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocateTolerance {
    /// 内部点判断容差
    ///
    /// 重心坐标大于 `-inside_tol` 且小于 `1 + inside_tol` 时视为在三角形内。
    pub inside_tol: f64,

    /// 退化三角形判断容差（相对）
    ///
    /// 有向面积的两倍小于 `degenerate_tol × 最长边²` 时视为退化。
    pub degenerate_tol: f64,
}

impl Default for LocateTolerance {
    fn default() -> Self {
        Self::STANDARD
    }
}

impl LocateTolerance {
    /// 高精度容差
    pub const HIGH_PRECISION: Self = Self {
        inside_tol: 1e-14,
        degenerate_tol: 1e-15,
    };

    /// 标准容差（默认）
    pub const STANDARD: Self = Self {
        inside_tol: 1e-10,
        degenerate_tol: 1e-12,
    };

    /// 宽松容差
    pub const RELAXED: Self = Self {
        inside_tol: 1e-8,
        degenerate_tol: 1e-10,
    };
}

// ============================================================
// 插值器
// ============================================================

/// 单个三角形的重心坐标插值器
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interpolator {
    nodes: [usize; 3],
    x3: f64,
    y3: f64,
    dy23: f64,
    dx32: f64,
    dy31: f64,
    dx13: f64,
    denom: f64,
    inside_tol: f64,
}

impl Interpolator {
    /// 以默认容差构造
    pub fn new(nodes: [usize; 3], vertices: &[Point2D; 3]) -> GeoResult<Self> {
        Self::with_tolerance(nodes, vertices, LocateTolerance::default())
    }

    /// 以指定容差构造，零面积三角形返回 [`GeoError::DegenerateTriangle`]
    pub fn with_tolerance(
        nodes: [usize; 3],
        vertices: &[Point2D; 3],
        tolerance: LocateTolerance,
    ) -> GeoResult<Self> {
        let [p1, p2, p3] = *vertices;
        let dy23 = p2.y - p3.y;
        let dx32 = p3.x - p2.x;
        let dy31 = p3.y - p1.y;
        let dx13 = p1.x - p3.x;
        let denom = dy23 * (p1.x - p3.x) + dx32 * (p1.y - p3.y);

        let longest_sq = [
            (p2 - p1).dot(&(p2 - p1)),
            (p3 - p2).dot(&(p3 - p2)),
            (p1 - p3).dot(&(p1 - p3)),
        ]
        .into_iter()
        .fold(0.0, f64::max);
        if !denom.is_finite()
            || denom.abs() <= tolerance.degenerate_tol * longest_sq
            || longest_sq == 0.0
        {
            return Err(GeoError::DegenerateTriangle {
                nodes,
                signed_area: denom,
            });
        }

        Ok(Self {
            nodes,
            x3: p3.x,
            y3: p3.y,
            dy23,
            dx32,
            dy31,
            dx13,
            denom,
            inside_tol: tolerance.inside_tol,
        })
    }

    /// 三个节点索引
    #[inline]
    pub fn nodes(&self) -> [usize; 3] {
        self.nodes
    }

    /// 三角形有向面积（顶点逆时针时为正）
    #[inline]
    pub fn signed_area(&self) -> f64 {
        0.5 * self.denom
    }

    /// 重心坐标 [λ1, λ2, λ3]，和为 1
    #[inline]
    #[must_use]
    pub fn barycentric(&self, q: Point2D) -> [f64; 3] {
        let dx = q.x - self.x3;
        let dy = q.y - self.y3;
        let l1 = (self.dy23 * dx + self.dx32 * dy) / self.denom;
        let l2 = (self.dy31 * dx + self.dx13 * dy) / self.denom;
        [l1, l2, 1.0 - l1 - l2]
    }

    /// 点是否在三角形内（含边界，带容差）
    #[inline]
    pub fn is_inside(&self, q: Point2D) -> bool {
        let tol = self.inside_tol;
        self.barycentric(q)
            .iter()
            .all(|&l| l >= -tol && l <= 1.0 + tol)
    }

    /// 用三个顶点值插值（三角形外为线性外推）
    #[inline]
    #[must_use]
    pub fn interpolate(&self, q: Point2D, vertex_values: &[f64; 3]) -> f64 {
        let l = self.barycentric(q);
        l[0] * vertex_values[0] + l[1] * vertex_values[1] + l[2] * vertex_values[2]
    }

    /// 从全网格节点值中取三个顶点值并插值
    #[inline]
    #[must_use]
    pub fn interpolate_field(&self, q: Point2D, values: &[f64]) -> f64 {
        let [a, b, c] = self.nodes;
        self.interpolate(q, &[values[a], values[b], values[c]])
    }

    /// 点的插值权重
    #[must_use]
    pub fn weights(&self, q: Point2D) -> PointWeights {
        PointWeights {
            nodes: self.nodes,
            weights: self.barycentric(q),
        }
    }
}

/// 单点的节点插值权重
///
/// 预先计算一次，之后对每个时刻的节点值只做一次点积。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointWeights {
    /// 三个节点索引
    pub nodes: [usize; 3],
    /// 对应权重
    pub weights: [f64; 3],
}

impl PointWeights {
    /// 零权重（不贡献任何值）
    pub const ZERO: Self = Self {
        nodes: [0, 0, 0],
        weights: [0.0, 0.0, 0.0],
    };

    /// 对全网格节点值求插值
    #[inline]
    #[must_use]
    pub fn evaluate(&self, values: &[f64]) -> f64 {
        self.nodes
            .iter()
            .zip(self.weights.iter())
            .map(|(&n, &w)| w * values[n])
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tri() -> [Point2D; 3] {
        [
            Point2D::new(1.0, 1.0),
            Point2D::new(4.0, 2.0),
            Point2D::new(2.0, 5.0),
        ]
    }

    #[test]
    fn test_vertices_give_unit_weights() {
        let vertices = tri();
        let interp = Interpolator::new([0, 1, 2], &vertices).unwrap();
        assert_eq!(interp.barycentric(vertices[0]), [1.0, 0.0, 0.0]);
        assert_eq!(interp.barycentric(vertices[1]), [0.0, 1.0, 0.0]);
        assert_eq!(interp.barycentric(vertices[2]), [0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_interior_weights() {
        let interp = Interpolator::new([0, 1, 2], &tri()).unwrap();
        let l = interp.barycentric(Point2D::new(2.5, 2.5));
        assert!(l.iter().all(|&w| w > 0.0 && w < 1.0));
        assert!((l.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        assert!(interp.is_inside(Point2D::new(2.5, 2.5)));
        assert!(!interp.is_inside(Point2D::new(0.0, 0.0)));
    }

    #[test]
    fn test_linear_field_reproduced_and_extrapolated() {
        let vertices = tri();
        let f = |p: Point2D| 2.0 * p.x - 3.0 * p.y + 0.5;
        let values = [f(vertices[0]), f(vertices[1]), f(vertices[2])];
        let interp = Interpolator::new([0, 1, 2], &vertices).unwrap();
        for q in [Point2D::new(2.0, 2.5), Point2D::new(-3.0, 7.0)] {
            assert!((interp.interpolate(q, &values) - f(q)).abs() < 1e-10);
        }
    }

    #[test]
    fn test_clockwise_triangle_works() {
        let mut vertices = tri();
        vertices.swap(1, 2);
        let interp = Interpolator::new([0, 2, 1], &vertices).unwrap();
        assert!(interp.signed_area() < 0.0);
        assert!(interp.is_inside(Point2D::new(2.5, 2.5)));
    }

    #[test]
    fn test_degenerate_triangle_rejected() {
        let vertices = [
            Point2D::new(0.0, 0.0),
            Point2D::new(1.0, 1.0),
            Point2D::new(2.0, 2.0),
        ];
        let err = Interpolator::new([3, 4, 5], &vertices).unwrap_err();
        assert!(matches!(err, GeoError::DegenerateTriangle { nodes: [3, 4, 5], .. }));

        let point = [Point2D::ZERO; 3];
        assert!(Interpolator::new([0, 1, 2], &point).is_err());
    }

    #[test]
    fn test_point_weights_evaluate() {
        let interp = Interpolator::new([2, 0, 1], &tri()).unwrap();
        let values = [10.0, 20.0, 30.0];
        let q = Point2D::new(2.5, 2.5);
        let w = interp.weights(q);
        let direct = interp.interpolate(q, &[30.0, 10.0, 20.0]);
        assert!((w.evaluate(&values) - direct).abs() < 1e-12);
        assert_eq!(PointWeights::ZERO.evaluate(&values), 0.0);
    }
}
