// crates/sp_geo/src/geometry.rs

//! 平面几何基础类型
//!
//! 网格节点、多边形顶点、折线点统一使用 [`Point2D`]，坐标单位与 Serafin
//! 文件中的投影坐标一致。

use serde::{Deserialize, Serialize};
use std::ops::{Add, Mul, Neg, Sub};

/// 2D 点/向量
///
/// # 示例
///
/// ```
/// use sp_geo::geometry::Point2D;
///
/// let a = Point2D::new(1.0, 0.0);
/// let b = Point2D::new(0.0, 2.0);
/// assert_eq!(a.cross(&b), 2.0);
/// assert_eq!(Point2D::new(3.0, 4.0).length(), 5.0);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point2D {
    /// X 坐标
    pub x: f64,
    /// Y 坐标
    pub y: f64,
}

impl Point2D {
    /// 零点常量
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    /// 创建新的 2D 点
    #[inline]
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// 点积
    #[inline]
    #[must_use]
    pub fn dot(&self, other: &Self) -> f64 {
        self.x * other.x + self.y * other.y
    }

    /// 叉积（z 分量）
    #[inline]
    #[must_use]
    pub fn cross(&self, other: &Self) -> f64 {
        self.x * other.y - self.y * other.x
    }

    /// 向量长度
    #[inline]
    #[must_use]
    pub fn length(&self) -> f64 {
        self.x.hypot(self.y)
    }

    /// 到另一点的距离
    #[inline]
    #[must_use]
    pub fn distance_to(&self, other: &Self) -> f64 {
        (*other - *self).length()
    }

    /// 顺时针旋转 90°: (x, y) -> (y, -x)
    ///
    /// 沿折线前进方向时指向右侧。
    #[inline]
    #[must_use]
    pub fn rotate_cw(&self) -> Self {
        Self::new(self.y, -self.x)
    }

    /// 线性插值: self + t * (other - self)
    #[inline]
    #[must_use]
    pub fn lerp(&self, other: &Self, t: f64) -> Self {
        Self::new(
            self.x + t * (other.x - self.x),
            self.y + t * (other.y - self.y),
        )
    }

    /// 两点中点
    #[inline]
    #[must_use]
    pub fn midpoint(&self, other: &Self) -> Self {
        self.lerp(other, 0.5)
    }

    /// 是否为有限值
    #[inline]
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// 两点在容差内重合
    #[inline]
    #[must_use]
    pub fn approx_eq(&self, other: &Self, tol: f64) -> bool {
        (self.x - other.x).abs() <= tol && (self.y - other.y).abs() <= tol
    }
}

impl Add for Point2D {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y)
    }
}

impl Sub for Point2D {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y)
    }
}

impl Neg for Point2D {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y)
    }
}

impl Mul<f64> for Point2D {
    type Output = Self;

    #[inline]
    fn mul(self, scalar: f64) -> Self {
        Self::new(self.x * scalar, self.y * scalar)
    }
}

impl From<(f64, f64)> for Point2D {
    fn from((x, y): (f64, f64)) -> Self {
        Self::new(x, y)
    }
}

impl From<[f64; 2]> for Point2D {
    fn from([x, y]: [f64; 2]) -> Self {
        Self::new(x, y)
    }
}

// ============================================================================
// 三角形/多边形工具函数
// ============================================================================

/// 三点有向面积的两倍（逆时针为正）
#[inline]
#[must_use]
pub fn orient2d(a: &Point2D, b: &Point2D, c: &Point2D) -> f64 {
    (b.x - a.x) * (c.y - a.y) - (c.x - a.x) * (b.y - a.y)
}

/// 三角形面积（非负）
#[inline]
#[must_use]
pub fn triangle_area(tri: &[Point2D; 3]) -> f64 {
    0.5 * orient2d(&tri[0], &tri[1], &tri[2]).abs()
}

/// 三角形重心
#[inline]
#[must_use]
pub fn triangle_centroid(tri: &[Point2D; 3]) -> Point2D {
    Point2D::new(
        (tri[0].x + tri[1].x + tri[2].x) / 3.0,
        (tri[0].y + tri[1].y + tri[2].y) / 3.0,
    )
}

/// 调整为逆时针顶点顺序
#[inline]
#[must_use]
pub fn to_ccw(tri: [Point2D; 3]) -> [Point2D; 3] {
    if orient2d(&tri[0], &tri[1], &tri[2]) < 0.0 {
        [tri[0], tri[2], tri[1]]
    } else {
        tri
    }
}

/// 闭合环（首尾不重复）的有向面积，逆时针为正
#[must_use]
pub fn ring_signed_area(ring: &[Point2D]) -> f64 {
    let n = ring.len();
    if n < 3 {
        return 0.0;
    }
    let origin = ring[0];
    let mut twice = 0.0;
    for i in 1..n - 1 {
        twice += orient2d(&origin, &ring[i], &ring[i + 1]);
    }
    0.5 * twice
}

/// 闭合环的面积形心
///
/// 面积为零时返回顶点平均值。
#[must_use]
pub fn ring_centroid(ring: &[Point2D]) -> Point2D {
    let n = ring.len();
    if n == 0 {
        return Point2D::ZERO;
    }
    let origin = ring[0];
    let mut twice_area = 0.0;
    let mut cx = 0.0;
    let mut cy = 0.0;
    for i in 1..n.saturating_sub(1) {
        let a = orient2d(&origin, &ring[i], &ring[i + 1]);
        twice_area += a;
        cx += a * (origin.x + ring[i].x + ring[i + 1].x);
        cy += a * (origin.y + ring[i].y + ring[i + 1].y);
    }
    if twice_area.abs() <= f64::MIN_POSITIVE {
        let inv = 1.0 / n as f64;
        let sum = ring.iter().fold(Point2D::ZERO, |acc, p| acc + *p);
        return sum * inv;
    }
    Point2D::new(cx / (3.0 * twice_area), cy / (3.0 * twice_area))
}

/// 两线段是否真相交（交点在两线段内部，不含端点接触与共线重叠）
#[must_use]
pub fn segments_cross(a: &Point2D, b: &Point2D, c: &Point2D, d: &Point2D) -> bool {
    let d1 = orient2d(c, d, a);
    let d2 = orient2d(c, d, b);
    let d3 = orient2d(a, b, c);
    let d4 = orient2d(a, b, d);
    ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
}

/// 点是否位于线段上（含端点）
#[must_use]
pub fn point_on_segment(p: &Point2D, a: &Point2D, b: &Point2D, tol: f64) -> bool {
    let ab = *b - *a;
    let len = ab.length();
    if len <= tol {
        return p.distance_to(a) <= tol;
    }
    let dist = orient2d(a, b, p).abs() / len;
    if dist > tol {
        return false;
    }
    let t = (*p - *a).dot(&ab) / (len * len);
    t >= -tol / len && t <= 1.0 + tol / len
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vector_ops() {
        let a = Point2D::new(3.0, 4.0);
        assert!((a.length() - 5.0).abs() < 1e-12);
        assert_eq!(a.rotate_cw(), Point2D::new(4.0, -3.0));
        assert_eq!(a + Point2D::new(1.0, 1.0), Point2D::new(4.0, 5.0));
        assert_eq!(-a, Point2D::new(-3.0, -4.0));
        assert_eq!(a.lerp(&Point2D::ZERO, 0.5), Point2D::new(1.5, 2.0));
    }

    #[test]
    fn test_orientation_and_area() {
        let tri = [
            Point2D::new(0.0, 0.0),
            Point2D::new(1.0, 0.0),
            Point2D::new(0.0, 1.0),
        ];
        assert!(orient2d(&tri[0], &tri[1], &tri[2]) > 0.0);
        assert!((triangle_area(&tri) - 0.5).abs() < 1e-12);
        let c = triangle_centroid(&tri);
        assert!((c.x - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_ring_area_and_centroid() {
        let square = [
            Point2D::new(0.0, 0.0),
            Point2D::new(2.0, 0.0),
            Point2D::new(2.0, 2.0),
            Point2D::new(0.0, 2.0),
        ];
        assert!((ring_signed_area(&square) - 4.0).abs() < 1e-12);
        let c = ring_centroid(&square);
        assert!((c.x - 1.0).abs() < 1e-12);
        assert!((c.y - 1.0).abs() < 1e-12);

        let mut cw = square;
        cw.reverse();
        assert!((ring_signed_area(&cw) + 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_segments_cross() {
        let a = Point2D::new(0.0, 0.0);
        let b = Point2D::new(2.0, 2.0);
        let c = Point2D::new(0.0, 2.0);
        let d = Point2D::new(2.0, 0.0);
        assert!(segments_cross(&a, &b, &c, &d));
        // 端点接触不算
        assert!(!segments_cross(&a, &b, &b, &d));
    }

    #[test]
    fn test_point_on_segment() {
        let a = Point2D::new(0.0, 0.0);
        let b = Point2D::new(2.0, 0.0);
        assert!(point_on_segment(&Point2D::new(1.0, 0.0), &a, &b, 1e-9));
        assert!(point_on_segment(&b, &a, &b, 1e-9));
        assert!(!point_on_segment(&Point2D::new(3.0, 0.0), &a, &b, 1e-9));
        assert!(!point_on_segment(&Point2D::new(1.0, 0.1), &a, &b, 1e-9));
    }
}
