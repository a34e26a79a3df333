// crates/sp_geo/src/spatial_index.rs

//! 包围盒空间索引
//!
//! 基于 R-tree 的轴对齐包围盒索引。网格三角形与多边形剖分三角形都以
//! 包围盒入树，查询时先用包围盒剪枝，再由调用方做精确几何判断。
//!
//! # 示例
//!
//! ```
//! use sp_geo::spatial_index::{BoundingBox, SpatialIndex};
//!
//! let index = SpatialIndex::bulk_load(vec![
//!     (BoundingBox::new(0.0, 0.0, 1.0, 1.0), 0usize),
//!     (BoundingBox::new(5.0, 5.0, 6.0, 6.0), 1usize),
//! ]);
//!
//! let hits: Vec<_> = index.query_intersecting(&BoundingBox::new(0.5, 0.5, 2.0, 2.0)).collect();
//! assert_eq!(hits, vec![&0]);
//! ```

use crate::geometry::Point2D;
use rstar::{PointDistance, RTree, RTreeObject, AABB};
use serde::{Deserialize, Serialize};

/// 边界框
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// 最小 x
    pub min_x: f64,
    /// 最小 y
    pub min_y: f64,
    /// 最大 x
    pub max_x: f64,
    /// 最大 y
    pub max_y: f64,
}

impl BoundingBox {
    /// 由两个角点构造，坐标顺序任意
    #[must_use]
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x: min_x.min(max_x),
            min_y: min_y.min(max_y),
            max_x: min_x.max(max_x),
            max_y: min_y.max(max_y),
        }
    }

    /// 退化为单点的包围盒
    #[must_use]
    pub fn at(p: Point2D) -> Self {
        Self::new(p.x, p.y, p.x, p.y)
    }

    /// 点集的包围盒，空点集返回 `None`
    #[must_use]
    pub fn from_points(points: &[Point2D]) -> Option<Self> {
        points.iter().map(|&p| Self::at(p)).reduce(|a, b| a.merge(&b))
    }

    /// 点是否落在闭区域内
    #[must_use]
    pub fn contains_point(&self, point: &Point2D) -> bool {
        (self.min_x..=self.max_x).contains(&point.x) && (self.min_y..=self.max_y).contains(&point.y)
    }

    /// 是否相交，边界接触也算
    #[must_use]
    pub fn intersects(&self, other: &Self) -> bool {
        self.min_x <= other.max_x
            && other.min_x <= self.max_x
            && self.min_y <= other.max_y
            && other.min_y <= self.max_y
    }

    /// 并集
    #[must_use]
    pub fn merge(&self, other: &Self) -> Self {
        Self {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    /// 较长边的长度，用作几何容差的尺度
    #[must_use]
    pub fn extent(&self) -> f64 {
        (self.max_x - self.min_x).max(self.max_y - self.min_y)
    }

    /// 四周各外扩 `margin`
    #[must_use]
    pub fn expand(&self, margin: f64) -> Self {
        Self::new(
            self.min_x - margin,
            self.min_y - margin,
            self.max_x + margin,
            self.max_y + margin,
        )
    }

    fn to_aabb(self) -> AABB<[f64; 2]> {
        AABB::from_corners([self.min_x, self.min_y], [self.max_x, self.max_y])
    }
}

// ============================================================================
// R-tree 包装
// ============================================================================

/// 索引条目：包围盒 + 载荷
#[derive(Debug, Clone)]
struct BoxEntry<T> {
    bbox: BoundingBox,
    data: T,
}

impl<T> RTreeObject for BoxEntry<T> {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.bbox.to_aabb()
    }
}

impl<T> PointDistance for BoxEntry<T> {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let b = &self.bbox;
        let dx = (b.min_x - point[0]).max(0.0).max(point[0] - b.max_x);
        let dy = (b.min_y - point[1]).max(0.0).max(point[1] - b.max_y);
        dx * dx + dy * dy
    }

    fn contains_point(&self, point: &[f64; 2]) -> bool {
        self.bbox.contains_point(&Point2D::new(point[0], point[1]))
    }
}

/// 包围盒空间索引
///
/// 构造后只读，可在线程间共享。
#[derive(Clone)]
pub struct SpatialIndex<T> {
    tree: RTree<BoxEntry<T>>,
}

impl<T> std::fmt::Debug for SpatialIndex<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpatialIndex")
            .field("len", &self.tree.size())
            .finish()
    }
}

impl<T> Default for SpatialIndex<T> {
    fn default() -> Self {
        Self { tree: RTree::new() }
    }
}

impl<T> SpatialIndex<T> {
    /// 批量构建
    #[must_use]
    pub fn bulk_load(items: Vec<(BoundingBox, T)>) -> Self {
        let entries: Vec<BoxEntry<T>> = items
            .into_iter()
            .map(|(bbox, data)| BoxEntry { bbox, data })
            .collect();
        Self {
            tree: RTree::bulk_load(entries),
        }
    }

    /// 查询包围盒与 `bbox` 相交的条目
    pub fn query_intersecting<'a>(&'a self, bbox: &BoundingBox) -> impl Iterator<Item = &'a T> + 'a {
        self.tree
            .locate_in_envelope_intersecting(&bbox.to_aabb())
            .map(|entry| &entry.data)
    }

    /// 查询包围盒包含点的条目
    pub fn query_point(&self, point: Point2D) -> impl Iterator<Item = &T> + '_ {
        self.tree
            .locate_all_at_point(&[point.x, point.y])
            .map(|entry| &entry.data)
    }

    /// 条目数
    #[must_use]
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    /// 是否为空
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bbox_from_points() {
        let pts = [
            Point2D::new(1.0, 5.0),
            Point2D::new(-2.0, 3.0),
            Point2D::new(4.0, -1.0),
        ];
        let b = BoundingBox::from_points(&pts).unwrap();
        assert_eq!(b, BoundingBox::new(-2.0, -1.0, 4.0, 5.0));
        assert!(BoundingBox::from_points(&[]).is_none());
    }

    #[test]
    fn test_bbox_ops() {
        let a = BoundingBox::new(0.0, 0.0, 1.0, 1.0);
        let b = BoundingBox::new(1.0, 1.0, 2.0, 2.0);
        assert!(a.intersects(&b));
        assert!(!a.intersects(&BoundingBox::new(1.5, 1.5, 2.0, 2.0)));
        assert_eq!(a.merge(&b), BoundingBox::new(0.0, 0.0, 2.0, 2.0));
        assert_eq!(BoundingBox::new(0.0, 0.0, 3.0, 1.0).extent(), 3.0);
        assert!(a.expand(0.1).contains_point(&Point2D::new(1.05, -0.05)));
    }

    #[test]
    fn test_query_intersecting_includes_touching() {
        let index = SpatialIndex::bulk_load(vec![
            (BoundingBox::new(0.0, 0.0, 1.0, 1.0), 'a'),
            (BoundingBox::new(1.0, 0.0, 2.0, 1.0), 'b'),
            (BoundingBox::new(3.0, 0.0, 4.0, 1.0), 'c'),
        ]);
        let mut hits: Vec<char> = index
            .query_intersecting(&BoundingBox::new(0.5, 0.5, 1.0, 0.6))
            .copied()
            .collect();
        hits.sort_unstable();
        assert_eq!(hits, vec!['a', 'b']);
        assert_eq!(index.len(), 3);
    }

    #[test]
    fn test_query_point() {
        let index = SpatialIndex::bulk_load(vec![
            (BoundingBox::new(0.0, 0.0, 2.0, 2.0), 1),
            (BoundingBox::new(1.0, 1.0, 3.0, 3.0), 2),
        ]);
        let mut hits: Vec<i32> = index.query_point(Point2D::new(1.5, 1.5)).copied().collect();
        hits.sort_unstable();
        assert_eq!(hits, vec![1, 2]);
        assert_eq!(index.query_point(Point2D::new(2.5, 0.5)).count(), 0);
    }
}
