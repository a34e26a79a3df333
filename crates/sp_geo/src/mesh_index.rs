// crates/sp_geo/src/mesh_index.rs

//! 网格三角形索引
//!
//! 由节点坐标与 2D 连接表一次性构建：每个单元一个 [`MeshTriangle`]
//! （按节点三元组可查），外加三角形包围盒的 R-tree。插值、体积、通量
//! 计算共用同一个索引，调用方负责缓存并以引用共享。

use crate::error::{GeoError, GeoResult};
use crate::geometry::{point_on_segment, to_ccw, triangle_area, triangle_centroid, Point2D};
use crate::interpolator::{Interpolator, LocateTolerance, PointWeights};
use crate::spatial_index::{BoundingBox, SpatialIndex};
use sp_io::SerafinHeader;
use std::collections::HashMap;
use tracing::{debug, info};

/// 判定线段落在单元边上的相对容差
const EDGE_EPS: f64 = 1e-9;

/// 网格中的一个三角形单元
#[derive(Debug, Clone)]
pub struct MeshTriangle {
    element: usize,
    nodes: [usize; 3],
    vertices: [Point2D; 3],
    bounds: BoundingBox,
    area: f64,
    interpolator: Option<Interpolator>,
}

impl MeshTriangle {
    /// 单元序号（连接表中的行号）
    #[inline]
    pub fn element(&self) -> usize {
        self.element
    }

    /// 节点索引（0 起始，保持连接表中的顺序）
    #[inline]
    pub fn nodes(&self) -> [usize; 3] {
        self.nodes
    }

    /// 顶点坐标，与 [`nodes`](Self::nodes) 一一对应
    #[inline]
    pub fn vertices(&self) -> &[Point2D; 3] {
        &self.vertices
    }

    /// 逆时针顶点
    pub fn ccw_vertices(&self) -> [Point2D; 3] {
        to_ccw(self.vertices)
    }

    /// 包围盒
    #[inline]
    pub fn bounds(&self) -> BoundingBox {
        self.bounds
    }

    /// 面积（非负）
    #[inline]
    pub fn area(&self) -> f64 {
        self.area
    }

    /// 重心
    pub fn centroid(&self) -> Point2D {
        triangle_centroid(&self.vertices)
    }

    /// 是否退化（零面积）
    #[inline]
    pub fn is_degenerate(&self) -> bool {
        self.interpolator.is_none()
    }

    /// 插值器，退化三角形为 `None`
    #[inline]
    pub fn interpolator(&self) -> Option<&Interpolator> {
        self.interpolator.as_ref()
    }

    /// 线段 a→b 整段落在某条边上时，返回该边的两个节点（升序）
    pub fn edge_containing(&self, a: &Point2D, b: &Point2D) -> Option<[usize; 2]> {
        (0..3).find_map(|i| {
            let j = (i + 1) % 3;
            let (e0, e1) = (&self.vertices[i], &self.vertices[j]);
            let tol = EDGE_EPS * e0.distance_to(e1);
            (point_on_segment(a, e0, e1, tol) && point_on_segment(b, e0, e1, tol))
                .then(|| edge_key(self.nodes[i], self.nodes[j]))
        })
    }

    /// 三条边的节点对（各自升序）
    pub fn edges(&self) -> [[usize; 2]; 3] {
        let [a, b, c] = self.nodes;
        [edge_key(a, b), edge_key(b, c), edge_key(c, a)]
    }
}

#[inline]
fn edge_key(a: usize, b: usize) -> [usize; 2] {
    if a <= b {
        [a, b]
    } else {
        [b, a]
    }
}

/// 网格三角形空间索引
#[derive(Debug, Clone)]
pub struct MeshIndex {
    triangles: Vec<MeshTriangle>,
    by_key: HashMap<[usize; 3], usize>,
    tree: SpatialIndex<usize>,
    nb_nodes: usize,
    bounds: Option<BoundingBox>,
    tolerance: LocateTolerance,
}

impl MeshIndex {
    /// 以默认容差构建
    pub fn new(x: &[f64], y: &[f64], triangles: &[[usize; 3]]) -> GeoResult<Self> {
        Self::with_tolerance(x, y, triangles, LocateTolerance::default())
    }

    /// 以指定容差构建
    ///
    /// 连接表为 0 起始节点索引。零面积三角形保留在索引中但没有插值器，
    /// 后续计算会跳过它们。
    pub fn with_tolerance(
        x: &[f64],
        y: &[f64],
        triangles: &[[usize; 3]],
        tolerance: LocateTolerance,
    ) -> GeoResult<Self> {
        if x.len() != y.len() {
            return Err(GeoError::CoordinateMismatch {
                x_len: x.len(),
                y_len: y.len(),
            });
        }
        let nb_nodes = x.len();

        let mut tris = Vec::with_capacity(triangles.len());
        let mut by_key = HashMap::with_capacity(triangles.len());
        let mut degenerate = 0usize;

        for (element, &nodes) in triangles.iter().enumerate() {
            if let Some(&node) = nodes.iter().find(|&&n| n >= nb_nodes) {
                return Err(GeoError::NodeOutOfRange {
                    element,
                    node,
                    nb_nodes,
                });
            }
            let vertices = nodes.map(|n| Point2D::new(x[n], y[n]));
            let interpolator = match Interpolator::with_tolerance(nodes, &vertices, tolerance) {
                Ok(interp) => Some(interp),
                Err(err) => {
                    debug!(element, %err, "跳过退化三角形");
                    degenerate += 1;
                    None
                }
            };
            let [a, b, c] = vertices;
            let bounds = BoundingBox::at(a).merge(&BoundingBox::at(b)).merge(&BoundingBox::at(c));
            by_key.entry(nodes).or_insert(element);
            tris.push(MeshTriangle {
                element,
                nodes,
                vertices,
                bounds,
                area: triangle_area(&vertices),
                interpolator,
            });
        }

        let bounds = tris
            .iter()
            .map(|t| t.bounds)
            .reduce(|a, b| a.merge(&b));
        let items = tris.iter().enumerate().map(|(i, t)| (t.bounds, i)).collect();
        let tree = SpatialIndex::bulk_load(items);

        info!(
            nb_nodes,
            nb_triangles = tris.len(),
            degenerate,
            "网格索引构建完成"
        );

        Ok(Self {
            triangles: tris,
            by_key,
            tree,
            nb_nodes,
            bounds,
            tolerance,
        })
    }

    /// 从 Serafin 头构建
    ///
    /// 3D 文件使用底层平面的连接表与前 `nb_nodes_2d` 个节点坐标。
    pub fn from_header(header: &SerafinHeader) -> GeoResult<Self> {
        let n2d = header.nb_nodes_2d();
        let x = &header.x()[..n2d.min(header.x().len())];
        let y = &header.y()[..n2d.min(header.y().len())];
        Self::new(x, y, &header.ikle_2d())
    }

    /// 三角形数
    #[inline]
    pub fn len(&self) -> usize {
        self.triangles.len()
    }

    /// 是否没有三角形
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// 节点数
    #[inline]
    pub fn nb_nodes(&self) -> usize {
        self.nb_nodes
    }

    /// 网格包围盒，空网格为 `None`
    pub fn bounds(&self) -> Option<BoundingBox> {
        self.bounds
    }

    /// 构建时使用的容差
    pub fn tolerance(&self) -> LocateTolerance {
        self.tolerance
    }

    /// 全部三角形（按单元序号）
    pub fn triangles(&self) -> &[MeshTriangle] {
        &self.triangles
    }

    /// 按节点三元组查找三角形
    pub fn triangle(&self, key: [usize; 3]) -> Option<&MeshTriangle> {
        self.by_key.get(&key).map(|&i| &self.triangles[i])
    }

    /// 包围盒与 `bbox` 相交的候选三角形，按单元序号升序
    pub fn elements_overlapping(&self, bbox: &BoundingBox) -> Vec<&MeshTriangle> {
        let mut ids: Vec<usize> = self.tree.query_intersecting(bbox).copied().collect();
        ids.sort_unstable();
        ids.into_iter().map(|i| &self.triangles[i]).collect()
    }

    /// 定位点所在的三角形
    ///
    /// 点落在公共边上时返回单元序号最小的三角形。
    pub fn locate(&self, p: Point2D) -> Option<&MeshTriangle> {
        self.tree
            .query_point(p)
            .copied()
            .filter(|&i| {
                self.triangles[i]
                    .interpolator
                    .as_ref()
                    .is_some_and(|interp| interp.is_inside(p))
            })
            .min()
            .map(|i| &self.triangles[i])
    }

    /// 为一组点预计算插值权重，网格外的点为 `None`
    pub fn point_interpolators(&self, points: &[Point2D]) -> Vec<Option<PointWeights>> {
        points.iter().map(|&p| self.point_weights(p)).collect()
    }

    /// 并行版本的 [`point_interpolators`](Self::point_interpolators)
    #[cfg(feature = "parallel")]
    pub fn locate_batch_parallel(&self, points: &[Point2D]) -> Vec<Option<PointWeights>> {
        use rayon::prelude::*;
        points.par_iter().map(|&p| self.point_weights(p)).collect()
    }

    fn point_weights(&self, p: Point2D) -> Option<PointWeights> {
        let tri = self.locate(p)?;
        tri.interpolator.as_ref().map(|interp| interp.weights(p))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 单位正方形，两个三角形
    fn square() -> MeshIndex {
        let x = [0.0, 1.0, 1.0, 0.0];
        let y = [0.0, 0.0, 1.0, 1.0];
        MeshIndex::new(&x, &y, &[[0, 1, 2], [0, 2, 3]]).unwrap()
    }

    #[test]
    fn test_build_and_lookup() {
        let mesh = square();
        assert_eq!(mesh.len(), 2);
        assert_eq!(mesh.nb_nodes(), 4);
        assert_eq!(mesh.bounds(), Some(BoundingBox::new(0.0, 0.0, 1.0, 1.0)));

        let tri = mesh.triangle([0, 2, 3]).unwrap();
        assert!((tri.area() - 0.5).abs() < 1e-12);
        assert!(mesh.triangle([1, 2, 3]).is_none());
    }

    #[test]
    fn test_invalid_input() {
        let err = MeshIndex::new(&[0.0, 1.0], &[0.0], &[]).unwrap_err();
        assert_eq!(err, GeoError::CoordinateMismatch { x_len: 2, y_len: 1 });

        let err = MeshIndex::new(&[0.0, 1.0, 0.0], &[0.0, 0.0, 1.0], &[[0, 1, 3]]).unwrap_err();
        assert!(matches!(err, GeoError::NodeOutOfRange { element: 0, node: 3, .. }));
    }

    #[test]
    fn test_degenerate_triangle_kept_without_interpolator() {
        let x = [0.0, 1.0, 2.0, 0.0];
        let y = [0.0, 0.0, 0.0, 1.0];
        let mesh = MeshIndex::new(&x, &y, &[[0, 1, 2], [0, 1, 3]]).unwrap();
        assert_eq!(mesh.len(), 2);
        assert!(mesh.triangles()[0].is_degenerate());
        assert!(!mesh.triangles()[1].is_degenerate());
    }

    #[test]
    fn test_elements_overlapping() {
        let mesh = square();
        let hits = mesh.elements_overlapping(&BoundingBox::new(0.8, 0.0, 0.9, 0.1));
        assert_eq!(hits.len(), 2);
        let hits = mesh.elements_overlapping(&BoundingBox::new(2.0, 2.0, 3.0, 3.0));
        assert!(hits.is_empty());
    }

    #[test]
    fn test_edge_containing() {
        let mesh = square();
        let [lower, upper] = [&mesh.triangles()[0], &mesh.triangles()[1]];
        let (a, b) = (Point2D::new(0.2, 0.2), Point2D::new(0.7, 0.7));
        // 对角线为两个三角形共有
        assert_eq!(lower.edge_containing(&a, &b), Some([0, 2]));
        assert_eq!(upper.edge_containing(&b, &a), Some([0, 2]));
        assert!(lower.edges().contains(&[0, 2]));

        assert_eq!(
            lower.edge_containing(&Point2D::new(1.0, 0.1), &Point2D::new(1.0, 0.9)),
            Some([1, 2])
        );
        assert_eq!(lower.edge_containing(&a, &Point2D::new(0.9, 0.1)), None);
    }

    #[test]
    fn test_locate_and_weights() {
        let mesh = square();
        let tri = mesh.locate(Point2D::new(0.9, 0.1)).unwrap();
        assert_eq!(tri.nodes(), [0, 1, 2]);
        let tri = mesh.locate(Point2D::new(0.1, 0.9)).unwrap();
        assert_eq!(tri.nodes(), [0, 2, 3]);
        // 对角线上取序号最小者
        let tri = mesh.locate(Point2D::new(0.5, 0.5)).unwrap();
        assert_eq!(tri.nodes(), [0, 1, 2]);

        let values = [0.0, 1.0, 3.0, 2.0];
        let weights = mesh.point_interpolators(&[Point2D::new(0.25, 0.75), Point2D::new(5.0, 5.0)]);
        assert!(weights[1].is_none());
        let w = weights[0].unwrap();
        // f = x + 2y
        assert!((w.evaluate(&values) - 1.75).abs() < 1e-12);
    }
}
