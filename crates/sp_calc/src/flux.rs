// crates/sp_calc/src/flux.rs

//! 断面通量积分
//!
//! 折线与每个候选三角形求交得到有序点链。链上每个点记录：
//!
//! - 该点所在三角形的插值权重
//! - 以该点为终点的子线段的法向 `(dy, −dx)`，模长即子线段长度；
//!   链首点没有前一段，法向为零
//!
//! 子线段内各物理量均为线性场，四种求积公式分别对 1～4 个线性场之积
//! 精确积分。落在两个单元共边上的子线段只计入序号较小的单元。

use crate::error::{CalcError, CalcResult};
use serde::{Deserialize, Serialize};
use sp_geo::{MeshIndex, MeshTriangle, Point2D, PointWeights, Polyline};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// 通量求积模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FluxMode {
    /// 标量沿线积分 ∫ f dl，字段 `[f]`
    LineIntegral,
    /// 向量法向通量 ∫ v·n dl，字段 `[vx, vy]`
    LineFlux,
    /// 流速乘水深 ∫ (v·n) h dl，字段 `[vx, vy, h]`
    AreaFlux,
    /// 再乘浓度 ∫ (v·n) h c dl，字段 `[vx, vy, h, c]`
    MassFlux,
}

impl FluxMode {
    /// 所需节点场个数
    pub fn nb_fields(&self) -> usize {
        match self {
            Self::LineIntegral => 1,
            Self::LineFlux => 2,
            Self::AreaFlux => 3,
            Self::MassFlux => 4,
        }
    }

    /// 模式名
    pub fn name(&self) -> &'static str {
        match self {
            Self::LineIntegral => "line_integral",
            Self::LineFlux => "line_flux",
            Self::AreaFlux => "area_flux",
            Self::MassFlux => "mass_flux",
        }
    }
}

impl fmt::Display for FluxMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FluxMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "line_integral" => Ok(Self::LineIntegral),
            "line_flux" => Ok(Self::LineFlux),
            "area_flux" => Ok(Self::AreaFlux),
            "mass_flux" => Ok(Self::MassFlux),
            other => Err(format!("未知通量模式: {}", other)),
        }
    }
}

/// 断面链上的一个点
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FluxPoint {
    /// 坐标
    pub point: Point2D,
    /// 插值权重
    pub weights: PointWeights,
    /// 以此点为终点的子线段法向（链首为零）
    pub normal: Point2D,
}

/// 预处理后的断面：若干有序点链
#[derive(Debug, Clone, Default)]
struct PreparedSection {
    chains: Vec<Vec<FluxPoint>>,
}

impl PreparedSection {
    fn build(mesh: &MeshIndex, section: &Polyline) -> Self {
        let mut candidates: Vec<&MeshTriangle> = Vec::new();
        for tri in mesh.elements_overlapping(&section.bounds()) {
            if tri.is_degenerate() {
                debug!(nodes = ?tri.nodes(), "通量计算跳过退化三角形");
                continue;
            }
            candidates.push(tri);
        }

        // 落在共边上的子线段只计入序号最小的相邻单元
        let mut owners: HashMap<[usize; 2], usize> = HashMap::new();
        for tri in &candidates {
            for edge in tri.edges() {
                let owner = owners.entry(edge).or_insert(tri.element());
                *owner = (*owner).min(tri.element());
            }
        }

        let mut chains = Vec::new();
        for tri in candidates {
            let Some(interp) = tri.interpolator() else {
                continue;
            };
            let point = |p: Point2D, prev: Option<Point2D>| FluxPoint {
                point: p,
                weights: interp.weights(p),
                normal: prev.map_or(Point2D::ZERO, |q| (p - q).rotate_cw()),
            };

            let clip = section.linestring_intersection(tri.vertices());
            for chain in clip.chains() {
                let mut run: Vec<FluxPoint> = Vec::with_capacity(chain.len());
                for (k, &p) in chain.iter().enumerate() {
                    let not_owned = k > 0
                        && tri
                            .edge_containing(&chain[k - 1], &p)
                            .is_some_and(|edge| owners.get(&edge) != Some(&tri.element()));
                    if not_owned {
                        if run.len() >= 2 {
                            chains.push(std::mem::take(&mut run));
                        }
                        run.clear();
                    }
                    let prev = run.last().map(|q| q.point);
                    run.push(point(p, prev));
                }
                if run.len() >= 2 {
                    chains.push(run);
                }
            }
        }
        Self { chains }
    }

    /// 逐子线段累加
    fn accumulate<F: Fn(&FluxPoint, &FluxPoint) -> f64>(&self, segment: F) -> f64 {
        self.chains
            .iter()
            .flat_map(|chain| chain.windows(2))
            .map(|w| segment(&w[0], &w[1]))
            .sum()
    }
}

/// 断面通量计算引擎
#[derive(Debug, Clone)]
pub struct FluxEngine<'m> {
    mesh: &'m MeshIndex,
    sections: Vec<PreparedSection>,
}

impl<'m> FluxEngine<'m> {
    /// 预处理一组断面
    pub fn new(mesh: &'m MeshIndex, sections: &[Polyline]) -> Self {
        let prepared: Vec<PreparedSection> = sections
            .iter()
            .map(|s| PreparedSection::build(mesh, s))
            .collect();
        debug!(
            nb_sections = prepared.len(),
            nb_chains = prepared.iter().map(|s| s.chains.len()).sum::<usize>(),
            "通量引擎预处理完成"
        );
        Self {
            mesh,
            sections: prepared,
        }
    }

    /// 断面数
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    /// 是否没有断面
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// 第 `i` 个断面的点链
    pub fn chains(&self, i: usize) -> Option<&[Vec<FluxPoint>]> {
        self.sections.get(i).map(|s| s.chains.as_slice())
    }

    fn check(&self, field: &'static str, values: &[f64]) -> CalcResult<()> {
        CalcError::check_length(field, self.mesh.nb_nodes(), values.len())
    }

    /// 按模式计算，`fields` 个数须等于 [`FluxMode::nb_fields`]
    pub fn compute(&self, mode: FluxMode, fields: &[&[f64]]) -> CalcResult<Vec<f64>> {
        match (mode, fields) {
            (FluxMode::LineIntegral, [f]) => self.line_integral(f),
            (FluxMode::LineFlux, [vx, vy]) => self.line_flux(vx, vy),
            (FluxMode::AreaFlux, [vx, vy, h]) => self.area_flux(vx, vy, h),
            (FluxMode::MassFlux, [vx, vy, h, c]) => self.mass_flux(vx, vy, h, c),
            _ => Err(CalcError::ValueLength {
                field: "通量场个数",
                expected: mode.nb_fields(),
                actual: fields.len(),
            }),
        }
    }

    /// Σ (f_p + f_{p+1}) · |段长| / 2
    pub fn line_integral(&self, f: &[f64]) -> CalcResult<Vec<f64>> {
        self.check("f", f)?;
        Ok(self
            .sections
            .iter()
            .map(|s| {
                s.accumulate(|a, b| {
                    (a.weights.evaluate(f) + b.weights.evaluate(f)) * b.normal.length() / 2.0
                })
            })
            .collect())
    }

    /// Σ (v_p + v_{p+1})·n / 2
    pub fn line_flux(&self, vx: &[f64], vy: &[f64]) -> CalcResult<Vec<f64>> {
        self.check("vx", vx)?;
        self.check("vy", vy)?;
        Ok(self
            .sections
            .iter()
            .map(|s| {
                s.accumulate(|a, b| {
                    let (a0, a1) = normal_components(a, b, vx, vy);
                    (a0 + a1) / 2.0
                })
            })
            .collect())
    }

    /// Σ [2(a_p h_p + a_{p+1} h_{p+1}) + (a_p h_{p+1} + a_{p+1} h_p)] / 6，a = v·n
    pub fn area_flux(&self, vx: &[f64], vy: &[f64], h: &[f64]) -> CalcResult<Vec<f64>> {
        self.check("vx", vx)?;
        self.check("vy", vy)?;
        self.check("h", h)?;
        Ok(self
            .sections
            .iter()
            .map(|s| {
                s.accumulate(|a, b| {
                    let (a0, a1) = normal_components(a, b, vx, vy);
                    let (h0, h1) = (a.weights.evaluate(h), b.weights.evaluate(h));
                    (2.0 * (a0 * h0 + a1 * h1) + (a0 * h1 + a1 * h0)) / 6.0
                })
            })
            .collect())
    }

    /// 三个线性场之积的闭合三次求积，/72
    pub fn mass_flux(&self, vx: &[f64], vy: &[f64], h: &[f64], c: &[f64]) -> CalcResult<Vec<f64>> {
        self.check("vx", vx)?;
        self.check("vy", vy)?;
        self.check("h", h)?;
        self.check("c", c)?;
        Ok(self
            .sections
            .iter()
            .map(|s| {
                s.accumulate(|a, b| {
                    let (a0, a1) = normal_components(a, b, vx, vy);
                    let (h0, h1) = (a.weights.evaluate(h), b.weights.evaluate(h));
                    let (c0, c1) = (a.weights.evaluate(c), b.weights.evaluate(c));
                    cubic_rule(a0, a1, h0, h1, c0, c1)
                })
            })
            .collect())
    }
}

/// 子线段两端的 v·n，n 为该子线段的法向（存于终点）
fn normal_components(a: &FluxPoint, b: &FluxPoint, vx: &[f64], vy: &[f64]) -> (f64, f64) {
    let n = b.normal;
    let va = Point2D::new(a.weights.evaluate(vx), a.weights.evaluate(vy));
    let vb = Point2D::new(b.weights.evaluate(vx), b.weights.evaluate(vy));
    (va.dot(&n), vb.dot(&n))
}

/// ∫₀¹ a(t) h(t) c(t) dt 的精确值
///
/// 端点同号项系数 18，混合项系数 6，合计除以 72。
fn cubic_rule(a0: f64, a1: f64, h0: f64, h1: f64, c0: f64, c1: f64) -> f64 {
    let ends = a0 * h0 * c0 + a1 * h1 * c1;
    let mixed = a0 * h0 * c1 + a0 * h1 * c0 + a1 * h0 * c0 + a0 * h1 * c1 + a1 * h0 * c1 + a1 * h1 * c0;
    (18.0 * ends + 6.0 * mixed) / 72.0
}
