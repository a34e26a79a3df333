// crates/sp_calc/src/volume.rs

//! 多边形内体积积分
//!
//! 节点值在每个三角形上线性分布，三角形上的体积（截断三棱柱）为
//! `面积 × 三节点均值`。多边形只部分覆盖的三角形先求交，再对每个凸片取
//! `面积 × 形心处插值`，对线性场同样是精确积分。
//!
//! 三种模式：
//!
//! - [`VolumeMode::NetStrict`]: 只计完全落在多边形内的三角形，预先化为
//!   节点权重，每帧只需一次点积
//! - [`VolumeMode::Net`]: 另加部分覆盖三角形的裁剪贡献
//! - [`VolumeMode::Positive`]: 在 Net 基础上拆分正负体积
//!
//! 几何预处理（包含关系、求交、插值权重）对每个多边形只做一次，
//! 之后可以对任意多帧重复计算。

use crate::error::{CalcError, CalcResult};
use serde::{Deserialize, Serialize};
use sp_geo::geometry::triangle_area;
use sp_geo::{ClipRegion, Interpolator, MeshIndex, MeshTriangle, Point2D, PointWeights, Polygon};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// 体积计算模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VolumeMode {
    /// 完全包含与部分覆盖的三角形都计入
    Net,
    /// 只计完全包含的三角形
    NetStrict,
    /// Net 体积及其正负拆分
    Positive,
}

impl VolumeMode {
    /// 模式名
    pub fn name(&self) -> &'static str {
        match self {
            Self::Net => "net",
            Self::NetStrict => "net_strict",
            Self::Positive => "positive",
        }
    }
}

impl fmt::Display for VolumeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for VolumeMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "net" => Ok(Self::Net),
            "net_strict" | "strict" => Ok(Self::NetStrict),
            "positive" => Ok(Self::Positive),
            other => Err(format!("未知体积模式: {}", other)),
        }
    }
}

/// 单个多边形的体积结果
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VolumeResult {
    /// 净体积
    pub net: f64,
    /// 正体积（仅 [`VolumeMode::Positive`]）
    pub positive: Option<f64>,
    /// 负体积 = 净体积 − 正体积（仅 [`VolumeMode::Positive`]）
    pub negative: Option<f64>,
}

impl VolumeResult {
    fn net_only(net: f64) -> Self {
        Self {
            net,
            positive: None,
            negative: None,
        }
    }

    fn split(net: f64, positive: f64) -> Self {
        Self {
            net,
            positive: Some(positive),
            negative: Some(net - positive),
        }
    }
}

/// 部分覆盖的三角形
#[derive(Debug, Clone)]
struct PartialCover {
    element: usize,
    region: ClipRegion,
    /// 每个凸片一个，权重已乘以凸片面积
    weights: Vec<PointWeights>,
}

/// 预处理后的多边形
#[derive(Debug, Clone)]
struct PreparedPolygon {
    polygon: Polygon,
    /// 完全包含三角形的节点权重（Σ 面积/3），按节点升序
    strict_weights: Vec<(usize, f64)>,
    contained: Vec<usize>,
    partial: Vec<PartialCover>,
}

impl PreparedPolygon {
    fn build(mesh: &MeshIndex, polygon: &Polygon, mode: VolumeMode) -> Self {
        let mut weights: BTreeMap<usize, f64> = BTreeMap::new();
        let mut contained = Vec::new();
        let mut partial = Vec::new();

        for tri in mesh.elements_overlapping(&polygon.bounds()) {
            if tri.is_degenerate() {
                debug!(nodes = ?tri.nodes(), "体积计算跳过退化三角形");
                continue;
            }
            let element = tri.element();
            let window = tri.ccw_vertices();
            if polygon.contains_triangle(&window) {
                let share = tri.area() / 3.0;
                for node in tri.nodes() {
                    *weights.entry(node).or_insert(0.0) += share;
                }
                contained.push(element);
                continue;
            }
            if mode == VolumeMode::NetStrict {
                continue;
            }
            let region = polygon.intersection(&window);
            if region.is_empty() {
                continue;
            }
            let Some(interp) = tri.interpolator() else {
                continue;
            };
            let part_weights = region
                .parts()
                .iter()
                .map(|ring| {
                    let sub = ClipRegion::Single(ring.clone());
                    let area = sub.area();
                    let mut w = sub
                        .centroid()
                        .map(|c| interp.weights(c))
                        .unwrap_or(PointWeights::ZERO);
                    w.weights = w.weights.map(|x| x * area);
                    w
                })
                .collect();
            partial.push(PartialCover {
                element,
                region,
                weights: part_weights,
            });
        }

        Self {
            polygon: polygon.clone(),
            strict_weights: weights.into_iter().collect(),
            contained,
            partial,
        }
    }

    fn strict_volume(&self, values: &[f64]) -> f64 {
        self.strict_weights.iter().map(|&(n, w)| w * values[n]).sum()
    }

    fn partial_volume(&self, values: &[f64]) -> f64 {
        self.partial
            .iter()
            .flat_map(|p| p.weights.iter())
            .map(|w| w.evaluate(values))
            .sum()
    }

    fn positive_volume(&self, mesh: &MeshIndex, values: &[f64]) -> f64 {
        let elements = mesh.triangles();
        let full: f64 = self
            .contained
            .iter()
            .map(|&e| positive_in_triangle(&elements[e], values))
            .sum();
        let clipped: f64 = self
            .partial
            .iter()
            .map(|p| {
                let net: f64 = p.weights.iter().map(|w| w.evaluate(values)).sum();
                positive_in_clipped(&elements[p.element], values, net, &self.polygon, &p.region)
            })
            .sum();
        full + clipped
    }
}

/// 三角形节点按值排序后的 (值, 坐标)
fn sorted_nodes(tri: &MeshTriangle, values: &[f64]) -> [(f64, Point2D); 3] {
    let nodes = tri.nodes();
    let vertices = tri.vertices();
    let mut sorted = [0, 1, 2].map(|k| (values[nodes[k]], vertices[k]));
    sorted.sort_by(|a, b| a.0.total_cmp(&b.0));
    sorted
}

/// 单一符号节点处的截断子三角形：顶点为 apex 与两条边上的零点
fn apex_triangle(apex: (f64, Point2D), others: [(f64, Point2D); 2]) -> [Point2D; 3] {
    let (va, pa) = apex;
    let cut = others.map(|(vo, po)| pa.lerp(&po, va / (va - vo)));
    [pa, cut[0], cut[1]]
}

enum SignSplit {
    AllNonNegative,
    AllNonPositive,
    /// 唯一正节点处的子三角形及其顶点值
    OnePositive([Point2D; 3], f64),
    /// 唯一负节点处的子三角形及其顶点值
    TwoPositive([Point2D; 3], f64),
}

fn classify(tri: &MeshTriangle, values: &[f64]) -> SignSplit {
    let [bottom, middle, top] = sorted_nodes(tri, values);
    if bottom.0 >= 0.0 {
        SignSplit::AllNonNegative
    } else if top.0 <= 0.0 {
        SignSplit::AllNonPositive
    } else if middle.0 <= 0.0 {
        SignSplit::OnePositive(apex_triangle(top, [middle, bottom]), top.0)
    } else {
        SignSplit::TwoPositive(apex_triangle(bottom, [middle, top]), bottom.0)
    }
}

fn triangle_net(tri: &MeshTriangle, values: &[f64]) -> f64 {
    let [a, b, c] = tri.nodes();
    tri.area() * (values[a] + values[b] + values[c]) / 3.0
}

/// 完全包含的三角形上的正体积
fn positive_in_triangle(tri: &MeshTriangle, values: &[f64]) -> f64 {
    match classify(tri, values) {
        SignSplit::AllNonNegative => triangle_net(tri, values),
        SignSplit::AllNonPositive => 0.0,
        SignSplit::OnePositive(sub, v) => triangle_area(&sub) * v / 3.0,
        SignSplit::TwoPositive(sub, v) => triangle_net(tri, values) - triangle_area(&sub) * v / 3.0,
    }
}

/// 部分覆盖的三角形上的正体积
fn positive_in_clipped(
    tri: &MeshTriangle,
    values: &[f64],
    net: f64,
    polygon: &Polygon,
    region: &ClipRegion,
) -> f64 {
    match classify(tri, values) {
        SignSplit::AllNonNegative => net,
        SignSplit::AllNonPositive => 0.0,
        SignSplit::OnePositive(sub, v) => {
            if region_covers(region, tri) {
                triangle_area(&sub) * v / 3.0
            } else {
                clipped_apex_volume(polygon, &sub, v)
            }
        }
        SignSplit::TwoPositive(sub, v) => net - clipped_apex_volume(polygon, &sub, v),
    }
}

fn region_covers(region: &ClipRegion, tri: &MeshTriangle) -> bool {
    (region.area() - tri.area()).abs() <= 1e-12 * tri.area()
}

/// 子三角形与多边形交集上的积分，子三角形上的场在 apex 为 v、切点为 0
fn clipped_apex_volume(polygon: &Polygon, sub: &[Point2D; 3], v: f64) -> f64 {
    let Ok(interp) = Interpolator::new([0, 1, 2], sub) else {
        return 0.0;
    };
    let field = [v, 0.0, 0.0];
    polygon
        .intersection(sub)
        .integrate(|c| interp.interpolate(c, &field))
}

/// 多边形体积计算引擎
///
/// 借用一个已构建的 [`MeshIndex`]，多个引擎可共享同一索引。
#[derive(Debug, Clone)]
pub struct VolumeEngine<'m> {
    mesh: &'m MeshIndex,
    mode: VolumeMode,
    polygons: Vec<PreparedPolygon>,
}

impl<'m> VolumeEngine<'m> {
    /// 预处理一组多边形
    pub fn new(mesh: &'m MeshIndex, mode: VolumeMode, polygons: &[Polygon]) -> Self {
        let prepared = polygons
            .iter()
            .map(|p| PreparedPolygon::build(mesh, p, mode))
            .collect::<Vec<_>>();
        debug!(
            mode = %mode,
            nb_polygons = prepared.len(),
            contained = prepared.iter().map(|p| p.contained.len()).sum::<usize>(),
            partial = prepared.iter().map(|p| p.partial.len()).sum::<usize>(),
            "体积引擎预处理完成"
        );
        Self {
            mesh,
            mode,
            polygons: prepared,
        }
    }

    /// 计算模式
    pub fn mode(&self) -> VolumeMode {
        self.mode
    }

    /// 多边形数
    pub fn len(&self) -> usize {
        self.polygons.len()
    }

    /// 是否没有多边形
    pub fn is_empty(&self) -> bool {
        self.polygons.is_empty()
    }

    /// 完全包含于第 `i` 个多边形的三角形数
    pub fn nb_contained(&self, i: usize) -> Option<usize> {
        self.polygons.get(i).map(|p| p.contained.len())
    }

    /// 与第 `i` 个多边形部分相交的三角形数
    pub fn nb_partial(&self, i: usize) -> Option<usize> {
        self.polygons.get(i).map(|p| p.partial.len())
    }

    /// 对一组节点值计算每个多边形的体积
    pub fn compute(&self, values: &[f64]) -> CalcResult<Vec<VolumeResult>> {
        CalcError::check_length("节点值", self.mesh.nb_nodes(), values.len())?;
        let results = self
            .polygons
            .iter()
            .map(|p| match self.mode {
                VolumeMode::NetStrict => VolumeResult::net_only(p.strict_volume(values)),
                VolumeMode::Net => {
                    VolumeResult::net_only(p.strict_volume(values) + p.partial_volume(values))
                }
                VolumeMode::Positive => {
                    let net = p.strict_volume(values) + p.partial_volume(values);
                    VolumeResult::split(net, p.positive_volume(self.mesh, values))
                }
            })
            .collect();
        Ok(results)
    }
}
