// crates/sp_geo/src/polygon.rs

//! 多边形与三角形裁剪
//!
//! 多边形在构造时用耳切法剖分为若干凸三角形，并对剖分结果建立包围盒索引。
//! 与网格三角形求交时，只需把候选剖分三角形逐个用 Sutherland–Hodgman
//! 算法裁剪到网格三角形内：两个凸多边形求交是精确的，结果为若干凸片。
//!
//! 求交结果用 [`ClipRegion`] 显式区分空、单片、多片三种情况。

use crate::error::{GeoError, GeoResult};
use crate::geometry::{
    orient2d, point_on_segment, ring_centroid, ring_signed_area, segments_cross, to_ccw,
    triangle_area, triangle_centroid, Point2D,
};
use crate::spatial_index::{BoundingBox, SpatialIndex};

/// 相对线性容差（乘以多边形外包尺度）
const LINEAR_EPS: f64 = 1e-10;

/// 多边形与三角形求交结果
#[derive(Debug, Clone, PartialEq)]
pub enum ClipRegion {
    /// 无交集（或交集面积可忽略）
    Empty,
    /// 单个凸片（逆时针顶点）
    Single(Vec<Point2D>),
    /// 多个互不重叠的凸片
    Multi(Vec<Vec<Point2D>>),
}

impl ClipRegion {
    fn from_parts(mut parts: Vec<Vec<Point2D>>) -> Self {
        match parts.len() {
            0 => Self::Empty,
            1 => Self::Single(parts.remove(0)),
            _ => Self::Multi(parts),
        }
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// 所有凸片
    pub fn parts(&self) -> &[Vec<Point2D>] {
        match self {
            Self::Empty => &[],
            Self::Single(ring) => std::slice::from_ref(ring),
            Self::Multi(rings) => rings,
        }
    }

    /// 总面积
    pub fn area(&self) -> f64 {
        self.parts().iter().map(|r| ring_signed_area(r).abs()).sum()
    }

    /// 面积加权形心，空区域返回 `None`
    pub fn centroid(&self) -> Option<Point2D> {
        let mut total = 0.0;
        let mut acc = Point2D::ZERO;
        for ring in self.parts() {
            let a = ring_signed_area(ring).abs();
            acc = acc + ring_centroid(ring) * a;
            total += a;
        }
        (total > 0.0).then(|| acc * (1.0 / total))
    }

    /// 对每个凸片求 面积 × f(形心) 之和
    ///
    /// 对线性场 f，结果即为 f 在交集上的精确积分。
    pub fn integrate<F: Fn(Point2D) -> f64>(&self, f: F) -> f64 {
        self.parts()
            .iter()
            .map(|ring| ring_signed_area(ring).abs() * f(ring_centroid(ring)))
            .sum()
    }
}

/// 简单多边形（无洞）
///
/// 顶点按逆时针存储，首尾不重复。
#[derive(Debug, Clone)]
pub struct Polygon {
    ring: Vec<Point2D>,
    attribute: Option<f64>,
    bounds: BoundingBox,
    area: f64,
    tol: f64,
    pieces: Vec<[Point2D; 3]>,
    index: SpatialIndex<usize>,
}

impl Polygon {
    /// 由顶点序列构造
    ///
    /// 接受顺时针或逆时针、首尾闭合或不闭合的输入；连续重复点被去除。
    pub fn new(points: Vec<Point2D>) -> GeoResult<Self> {
        if points.iter().any(|p| !p.is_finite()) {
            return Err(GeoError::invalid_polygon("顶点坐标含非有限值"));
        }
        let mut ring: Vec<Point2D> = Vec::with_capacity(points.len());
        for p in points {
            if ring.last() != Some(&p) {
                ring.push(p);
            }
        }
        while ring.len() > 1 && ring.first() == ring.last() {
            ring.pop();
        }
        if ring.len() < 3 {
            return Err(GeoError::invalid_polygon(format!(
                "至少需要 3 个不同顶点, 实际 {}",
                ring.len()
            )));
        }

        let bounds = BoundingBox::from_points(&ring)
            .ok_or_else(|| GeoError::invalid_polygon("空顶点序列"))?;
        let extent = bounds.extent();
        let tol = LINEAR_EPS * extent.max(f64::MIN_POSITIVE);

        let signed = ring_signed_area(&ring);
        if signed.abs() <= tol * extent {
            return Err(GeoError::invalid_polygon("面积为零"));
        }
        if signed < 0.0 {
            ring.reverse();
        }

        let pieces = ear_clip(&ring, tol * extent)?;
        let items = pieces
            .iter()
            .enumerate()
            .filter_map(|(i, tri)| BoundingBox::from_points(tri).map(|b| (b, i)))
            .collect();

        Ok(Self {
            ring,
            attribute: None,
            bounds,
            area: signed.abs(),
            tol,
            pieces,
            index: SpatialIndex::bulk_load(items),
        })
    }

    /// 附加属性值
    #[must_use]
    pub fn with_attribute(mut self, value: f64) -> Self {
        self.attribute = Some(value);
        self
    }

    /// 属性值
    pub fn attribute(&self) -> Option<f64> {
        self.attribute
    }

    /// 逆时针顶点
    pub fn points(&self) -> &[Point2D] {
        &self.ring
    }

    /// 包围盒
    pub fn bounds(&self) -> BoundingBox {
        self.bounds
    }

    /// 面积
    pub fn area(&self) -> f64 {
        self.area
    }

    /// 耳切剖分得到的三角形
    pub fn triangles(&self) -> &[[Point2D; 3]] {
        &self.pieces
    }

    fn edges(&self) -> impl Iterator<Item = (Point2D, Point2D)> + '_ {
        let n = self.ring.len();
        (0..n).map(move |i| (self.ring[i], self.ring[(i + 1) % n]))
    }

    /// 点是否在多边形内（边界上视为在内）
    pub fn contains_point(&self, p: Point2D) -> bool {
        if !self.bounds.expand(self.tol).contains_point(&p) {
            return false;
        }
        let mut inside = false;
        for (a, b) in self.edges() {
            if point_on_segment(&p, &a, &b, self.tol) {
                return true;
            }
            if (a.y > p.y) != (b.y > p.y) {
                let x_cross = a.x + (p.y - a.y) * (b.x - a.x) / (b.y - a.y);
                if p.x < x_cross {
                    inside = !inside;
                }
            }
        }
        inside
    }

    /// 三角形是否完全位于多边形内（边界接触视为在内）
    pub fn contains_triangle(&self, tri: &[Point2D; 3]) -> bool {
        let tri = to_ccw(*tri);
        let Some(tri_bounds) = BoundingBox::from_points(&tri) else {
            return false;
        };
        if !self.bounds.expand(self.tol).intersects(&tri_bounds) {
            return false;
        }
        if !tri.iter().all(|p| self.contains_point(*p)) {
            return false;
        }
        if !self.contains_point(triangle_centroid(&tri)) {
            return false;
        }

        let tri_edges = [(tri[0], tri[1]), (tri[1], tri[2]), (tri[2], tri[0])];
        for (a, b) in self.edges() {
            let Some(edge_bounds) = BoundingBox::from_points(&[a, b]) else {
                continue;
            };
            if !edge_bounds.intersects(&tri_bounds) {
                continue;
            }
            if tri_edges.iter().any(|(c, d)| segments_cross(&a, &b, c, d)) {
                return false;
            }
            // 多边形边界穿入三角形内部
            if strictly_inside(&tri, &a, self.tol) || strictly_inside(&tri, &a.midpoint(&b), self.tol)
            {
                return false;
            }
        }
        true
    }

    /// 与三角形求交
    pub fn intersection(&self, tri: &[Point2D; 3]) -> ClipRegion {
        let window = to_ccw(*tri);
        let Some(tri_bounds) = BoundingBox::from_points(&window) else {
            return ClipRegion::Empty;
        };
        if !self.bounds.intersects(&tri_bounds) {
            return ClipRegion::Empty;
        }
        let min_area = triangle_area(&window) * 1e-12;
        if self.contains_triangle(&window) {
            return ClipRegion::Single(window.to_vec());
        }

        let mut candidates: Vec<usize> = self.index.query_intersecting(&tri_bounds).copied().collect();
        candidates.sort_unstable();

        let parts = candidates
            .into_iter()
            .map(|i| clip_convex(&self.pieces[i], &window))
            .filter(|ring| ring.len() >= 3 && ring_signed_area(ring).abs() > min_area)
            .collect();
        ClipRegion::from_parts(parts)
    }
}

/// 点是否严格位于逆时针三角形内部（距各边大于 `tol`）
fn strictly_inside(tri: &[Point2D; 3], p: &Point2D, tol: f64) -> bool {
    (0..3).all(|i| {
        let a = tri[i];
        let b = tri[(i + 1) % 3];
        let len = a.distance_to(&b);
        len > 0.0 && orient2d(&a, &b, p) / len > tol
    })
}

/// Sutherland–Hodgman：将凸多边形 `subject` 裁剪到逆时针凸三角形 `window` 内
pub(crate) fn clip_convex(subject: &[Point2D], window: &[Point2D; 3]) -> Vec<Point2D> {
    let mut output = subject.to_vec();
    for i in 0..3 {
        if output.is_empty() {
            break;
        }
        let a = window[i];
        let b = window[(i + 1) % 3];
        let input = std::mem::take(&mut output);

        let mut prev = input[input.len() - 1];
        let mut prev_side = orient2d(&a, &b, &prev);
        for &cur in &input {
            let cur_side = orient2d(&a, &b, &cur);
            if cur_side >= 0.0 {
                if prev_side < 0.0 && cur_side > 0.0 {
                    output.push(prev.lerp(&cur, prev_side / (prev_side - cur_side)));
                }
                output.push(cur);
            } else if prev_side > 0.0 {
                output.push(prev.lerp(&cur, prev_side / (prev_side - cur_side)));
            }
            prev = cur;
            prev_side = cur_side;
        }
    }
    output.dedup();
    while output.len() > 1 && output.first() == output.last() {
        output.pop();
    }
    output
}

/// 耳切法剖分逆时针简单多边形
fn ear_clip(ring: &[Point2D], area_eps: f64) -> GeoResult<Vec<[Point2D; 3]>> {
    let n = ring.len();
    let mut triangles = Vec::with_capacity(n - 2);
    let mut remaining: Vec<usize> = (0..n).collect();

    while remaining.len() > 3 {
        let len = remaining.len();
        let mut clipped = false;

        for i in 0..len {
            let prev = remaining[(i + len - 1) % len];
            let curr = remaining[i];
            let next = remaining[(i + 1) % len];
            let (p0, p1, p2) = (ring[prev], ring[curr], ring[next]);
            let cross = orient2d(&p0, &p1, &p2);

            // 共线顶点直接移除
            if cross.abs() <= area_eps {
                remaining.remove(i);
                clipped = true;
                break;
            }
            if cross > 0.0 && is_ear(ring, &remaining, [prev, curr, next]) {
                triangles.push([p0, p1, p2]);
                remaining.remove(i);
                clipped = true;
                break;
            }
        }

        if !clipped {
            return Err(GeoError::invalid_polygon("耳切剖分失败, 多边形可能自相交"));
        }
    }

    if let [a, b, c] = remaining[..] {
        if orient2d(&ring[a], &ring[b], &ring[c]) > area_eps {
            triangles.push([ring[a], ring[b], ring[c]]);
        }
    }
    Ok(triangles)
}

fn is_ear(ring: &[Point2D], remaining: &[usize], ear: [usize; 3]) -> bool {
    let [a, b, c] = ear.map(|i| ring[i]);
    remaining.iter().all(|&i| {
        if ear.contains(&i) {
            return true;
        }
        let p = ring[i];
        if p == a || p == b || p == c {
            return true;
        }
        // 顶点落在候选耳内（含边界）则不是耳
        !(orient2d(&a, &b, &p) >= 0.0 && orient2d(&b, &c, &p) >= 0.0 && orient2d(&c, &a, &p) >= 0.0)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pts(coords: &[(f64, f64)]) -> Vec<Point2D> {
        coords.iter().map(|&c| Point2D::from(c)).collect()
    }

    fn unit_square() -> Polygon {
        Polygon::new(pts(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)])).unwrap()
    }

    /// L 形（非凸）
    fn l_shape() -> Polygon {
        Polygon::new(pts(&[
            (0.0, 0.0),
            (2.0, 0.0),
            (2.0, 1.0),
            (1.0, 1.0),
            (1.0, 2.0),
            (0.0, 2.0),
            (0.0, 0.0),
        ]))
        .unwrap()
    }

    #[test]
    fn test_construction_normalizes_ring() {
        let cw = Polygon::new(pts(&[(0.0, 0.0), (0.0, 1.0), (1.0, 1.0), (1.0, 0.0), (0.0, 0.0)]))
            .unwrap();
        assert_eq!(cw.points().len(), 4);
        assert!(ring_signed_area(cw.points()) > 0.0);
        assert!((cw.area() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_invalid_polygons() {
        assert!(Polygon::new(pts(&[(0.0, 0.0), (1.0, 0.0)])).is_err());
        assert!(Polygon::new(pts(&[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0)])).is_err());
        assert!(Polygon::new(pts(&[(0.0, 0.0), (f64::NAN, 0.0), (0.0, 1.0)])).is_err());
    }

    #[test]
    fn test_ear_clip_area_preserved() {
        let poly = l_shape();
        let sum: f64 = poly.triangles().iter().map(triangle_area).sum();
        assert!((sum - 3.0).abs() < 1e-12);
        assert_eq!(poly.triangles().len(), 4);
    }

    #[test]
    fn test_contains_point() {
        let poly = l_shape();
        assert!(poly.contains_point(Point2D::new(0.5, 1.5)));
        assert!(!poly.contains_point(Point2D::new(1.5, 1.5)));
        // 边界与顶点
        assert!(poly.contains_point(Point2D::new(1.0, 1.5)));
        assert!(poly.contains_point(Point2D::new(2.0, 0.0)));
    }

    #[test]
    fn test_contains_triangle() {
        let poly = l_shape();
        let inside = [
            Point2D::new(0.0, 0.0),
            Point2D::new(1.0, 0.0),
            Point2D::new(0.0, 1.0),
        ];
        assert!(poly.contains_triangle(&inside));

        // 三个顶点都在内，但斜边穿过凹口
        let across = [
            Point2D::new(2.0, 0.5),
            Point2D::new(0.5, 2.0),
            Point2D::new(0.5, 0.5),
        ];
        assert!(!poly.contains_triangle(&across));
    }

    #[test]
    fn test_intersection_full_and_empty() {
        let square = unit_square();
        let tri = [
            Point2D::new(0.0, 0.0),
            Point2D::new(1.0, 0.0),
            Point2D::new(1.0, 1.0),
        ];
        match square.intersection(&tri) {
            ClipRegion::Single(ring) => assert_eq!(ring.len(), 3),
            other => panic!("期望单片, 实际 {other:?}"),
        }

        let far = [
            Point2D::new(5.0, 5.0),
            Point2D::new(6.0, 5.0),
            Point2D::new(5.0, 6.0),
        ];
        assert!(square.intersection(&far).is_empty());
    }

    #[test]
    fn test_intersection_partial_area_and_centroid() {
        let square = unit_square();
        // 一半在正方形外
        let tri = [
            Point2D::new(0.0, 0.0),
            Point2D::new(2.0, 0.0),
            Point2D::new(0.0, 2.0),
        ];
        let region = square.intersection(&tri);
        assert!(!region.is_empty());
        // 正方形被斜线 x + y = 2 截去的部分面积为 0
        assert!((region.area() - 1.0).abs() < 1e-12);
        let c = region.centroid().unwrap();
        assert!((c.x - 0.5).abs() < 1e-12);
        assert!((c.y - 0.5).abs() < 1e-12);

        let shifted = [
            Point2D::new(0.5, 0.0),
            Point2D::new(1.5, 0.0),
            Point2D::new(0.5, 1.0),
        ];
        // 三角形落在正方形内的部分: 梯形 x∈[0.5,1]
        let region = square.intersection(&shifted);
        assert!((region.area() - 0.375).abs() < 1e-12);
    }

    #[test]
    fn test_intersection_with_concave_polygon() {
        let poly = l_shape();
        let tri = [
            Point2D::new(0.0, 0.0),
            Point2D::new(2.0, 0.0),
            Point2D::new(0.0, 2.0),
        ];
        // L 形与大三角形的交 = 三角形 (面积 2) 减去凹口内 1.0<x,y 的部分 (面积 0)
        let region = poly.intersection(&tri);
        assert!((region.area() - 2.0).abs() < 1e-12);

        let big = [
            Point2D::new(-1.0, -1.0),
            Point2D::new(5.0, -1.0),
            Point2D::new(-1.0, 5.0),
        ];
        let region = poly.intersection(&big);
        assert!((region.area() - 3.0).abs() < 1e-12);
        assert!(matches!(region, ClipRegion::Multi(_)));
    }

    #[test]
    fn test_integrate_linear_field() {
        let square = unit_square();
        let tri = [
            Point2D::new(-1.0, -1.0),
            Point2D::new(3.0, -1.0),
            Point2D::new(-1.0, 3.0),
        ];
        let region = square.intersection(&tri);
        // ∫∫ (x + 2y) over unit square = 0.5 + 1.0
        let value = region.integrate(|p| p.x + 2.0 * p.y);
        assert!((value - 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_clip_convex_disjoint() {
        let subject = pts(&[(0.0, 0.0), (1.0, 0.0), (0.0, 1.0)]);
        let window = [
            Point2D::new(2.0, 2.0),
            Point2D::new(3.0, 2.0),
            Point2D::new(2.0, 3.0),
        ];
        assert!(clip_convex(&subject, &window).is_empty());
    }
}
