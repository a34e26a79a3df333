// crates/sp_geo/src/polyline.rs

//! 折线（断面）与三角形裁剪
//!
//! 每条线段用 Cyrus–Beck 参数裁剪到逆时针三角形内，首尾相接的裁剪段再
//! 合并为有序点链。结果用 [`SectionClip`] 区分空、单链、多链。

use crate::error::{GeoError, GeoResult};
use crate::geometry::{to_ccw, Point2D};
use crate::spatial_index::BoundingBox;

/// 裁剪参数的相对容差
const PARAM_EPS: f64 = 1e-12;

/// 折线与三角形求交结果
#[derive(Debug, Clone, PartialEq)]
pub enum SectionClip {
    /// 不相交，或只在单点接触
    Empty,
    /// 一条有序点链
    Single(Vec<Point2D>),
    /// 多条点链（折线多次进出同一三角形）
    Multi(Vec<Vec<Point2D>>),
}

impl SectionClip {
    fn from_chains(mut chains: Vec<Vec<Point2D>>) -> Self {
        match chains.len() {
            0 => Self::Empty,
            1 => Self::Single(chains.remove(0)),
            _ => Self::Multi(chains),
        }
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// 所有点链
    pub fn chains(&self) -> &[Vec<Point2D>] {
        match self {
            Self::Empty => &[],
            Self::Single(chain) => std::slice::from_ref(chain),
            Self::Multi(chains) => chains,
        }
    }

    /// 所有点链的总长度
    pub fn length(&self) -> f64 {
        self.chains().iter().map(|c| chain_length(c)).sum()
    }
}

fn chain_length(points: &[Point2D]) -> f64 {
    points.windows(2).map(|w| w[0].distance_to(&w[1])).sum()
}

/// 开放折线
#[derive(Debug, Clone)]
pub struct Polyline {
    points: Vec<Point2D>,
    attribute: Option<f64>,
    bounds: BoundingBox,
    length: f64,
}

impl Polyline {
    /// 由顶点序列构造，连续重复点被去除，至少需要两个不同顶点
    pub fn new(points: Vec<Point2D>) -> GeoResult<Self> {
        if points.iter().any(|p| !p.is_finite()) {
            return Err(GeoError::invalid_polyline("顶点坐标含非有限值"));
        }
        let mut clean: Vec<Point2D> = Vec::with_capacity(points.len());
        for p in points {
            if clean.last() != Some(&p) {
                clean.push(p);
            }
        }
        if clean.len() < 2 {
            return Err(GeoError::invalid_polyline(format!(
                "至少需要 2 个不同顶点, 实际 {}",
                clean.len()
            )));
        }
        let bounds = BoundingBox::from_points(&clean)
            .ok_or_else(|| GeoError::invalid_polyline("空顶点序列"))?;
        let length = chain_length(&clean);

        Ok(Self {
            points: clean,
            attribute: None,
            bounds,
            length,
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

    /// 顶点
    pub fn points(&self) -> &[Point2D] {
        &self.points
    }

    /// 包围盒
    pub fn bounds(&self) -> BoundingBox {
        self.bounds
    }

    /// 总长度
    pub fn length(&self) -> f64 {
        self.length
    }

    /// 线段迭代器
    pub fn segments(&self) -> impl Iterator<Item = (Point2D, Point2D)> + '_ {
        self.points.windows(2).map(|w| (w[0], w[1]))
    }

    /// 与三角形求交，返回沿折线方向排列的点链
    pub fn linestring_intersection(&self, tri: &[Point2D; 3]) -> SectionClip {
        let window = to_ccw(*tri);
        let Some(tri_bounds) = BoundingBox::from_points(&window) else {
            return SectionClip::Empty;
        };
        if !self.bounds.intersects(&tri_bounds) {
            return SectionClip::Empty;
        }

        let mut chains: Vec<Vec<Point2D>> = Vec::new();
        for (a, b) in self.segments() {
            let Some(seg_bounds) = BoundingBox::from_points(&[a, b]) else {
                continue;
            };
            if !seg_bounds.intersects(&tri_bounds) {
                continue;
            }
            let Some((start, end)) = clip_segment(&window, a, b) else {
                continue;
            };
            match chains.last_mut() {
                Some(chain) if chain.last() == Some(&start) => chain.push(end),
                _ => chains.push(vec![start, end]),
            }
        }
        SectionClip::from_chains(chains)
    }
}

/// Cyrus–Beck 裁剪线段 a→b 到逆时针三角形
///
/// 参数落在端点处时直接返回原端点，保证相邻线段的裁剪段首尾精确相接。
fn clip_segment(window: &[Point2D; 3], a: Point2D, b: Point2D) -> Option<(Point2D, Point2D)> {
    let d = b - a;
    let scale = d.length();
    if scale == 0.0 {
        return None;
    }
    let mut t0 = 0.0_f64;
    let mut t1 = 1.0_f64;

    for i in 0..3 {
        let e0 = window[i];
        let e1 = window[(i + 1) % 3];
        let edge = e1 - e0;
        // 逆时针三角形的内法向
        let inward = Point2D::new(-edge.y, edge.x);
        let num = inward.dot(&(a - e0));
        let den = inward.dot(&d);
        let tol = PARAM_EPS * edge.length() * scale;

        if den.abs() <= tol {
            if num < -tol {
                return None;
            }
        } else {
            let t = -num / den;
            if den > 0.0 {
                t0 = t0.max(t);
            } else {
                t1 = t1.min(t);
            }
        }
    }

    if t1 - t0 <= PARAM_EPS {
        return None;
    }
    let start = if t0 <= 0.0 { a } else { a.lerp(&b, t0) };
    let end = if t1 >= 1.0 { b } else { a.lerp(&b, t1) };
    (start != end).then_some((start, end))
}
