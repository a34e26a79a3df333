// crates/sp_io/src/transform.rs

//! 网格平面坐标变换
//!
//! 按顺序组合平移、旋转、缩放为单个仿射矩阵后作用于节点坐标。
//!
//! ```
//! use sp_io::transform::{AffineTransform, MeshTransformation};
//!
//! let steps = [
//!     MeshTransformation::Translation { dx: 10.0, dy: 0.0 },
//!     MeshTransformation::Scaling { sx: 2.0, sy: 2.0 },
//! ];
//! let affine = AffineTransform::from_steps(&steps);
//! assert_eq!(affine.apply(1.0, 1.0), (22.0, 2.0));
//! ```

use serde::{Deserialize, Serialize};

/// 仿射变换矩阵
///
/// - x' = a*x + b*y + c
/// - y' = d*x + e*y + f
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AffineTransform {
    /// x 方向缩放系数
    pub a: f64,
    /// x 方向倾斜系数
    pub b: f64,
    /// x 平移量
    pub c: f64,
    /// y 方向倾斜系数
    pub d: f64,
    /// y 方向缩放系数
    pub e: f64,
    /// y 平移量
    pub f: f64,
}

impl Default for AffineTransform {
    fn default() -> Self {
        Self::identity()
    }
}

impl AffineTransform {
    /// 恒等变换
    #[must_use]
    pub fn identity() -> Self {
        Self {
            a: 1.0,
            b: 0.0,
            c: 0.0,
            d: 0.0,
            e: 1.0,
            f: 0.0,
        }
    }

    /// 平移
    #[must_use]
    pub fn translation(tx: f64, ty: f64) -> Self {
        Self {
            c: tx,
            f: ty,
            ..Self::identity()
        }
    }

    /// 缩放
    #[must_use]
    pub fn scale(sx: f64, sy: f64) -> Self {
        Self {
            a: sx,
            e: sy,
            ..Self::identity()
        }
    }

    /// 绕原点旋转（弧度，逆时针）
    #[must_use]
    pub fn rotation(angle: f64) -> Self {
        let (sin_a, cos_a) = angle.sin_cos();
        Self {
            a: cos_a,
            b: -sin_a,
            c: 0.0,
            d: sin_a,
            e: cos_a,
            f: 0.0,
        }
    }

    /// 按顺序组合变换步骤（先应用第一个）
    #[must_use]
    pub fn from_steps(steps: &[MeshTransformation]) -> Self {
        steps
            .iter()
            .fold(Self::identity(), |acc, step| step.to_affine().compose(&acc))
    }

    /// 应用正向变换
    #[inline]
    #[must_use]
    pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        (
            self.a * x + self.b * y + self.c,
            self.d * x + self.e * y + self.f,
        )
    }

    /// 组合两个变换：结果先应用 other，再应用 self
    #[must_use]
    pub fn compose(&self, other: &Self) -> Self {
        Self {
            a: self.a * other.a + self.b * other.d,
            b: self.a * other.b + self.b * other.e,
            c: self.a * other.c + self.b * other.f + self.c,
            d: self.d * other.a + self.e * other.d,
            e: self.d * other.b + self.e * other.e,
            f: self.d * other.c + self.e * other.f + self.f,
        }
    }

    /// 行列式
    #[must_use]
    pub fn determinant(&self) -> f64 {
        self.a * self.e - self.b * self.d
    }

    /// 是否为恒等变换
    #[must_use]
    pub fn is_identity(&self) -> bool {
        (self.a - 1.0).abs() < 1e-10
            && self.b.abs() < 1e-10
            && self.c.abs() < 1e-10
            && self.d.abs() < 1e-10
            && (self.e - 1.0).abs() < 1e-10
            && self.f.abs() < 1e-10
    }
}

/// 单个网格变换步骤
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MeshTransformation {
    /// 平移
    Translation {
        /// x 平移量
        dx: f64,
        /// y 平移量
        dy: f64,
    },
    /// 绕原点逆时针旋转
    Rotation {
        /// 角度（弧度）
        angle: f64,
    },
    /// 缩放
    Scaling {
        /// x 缩放系数
        sx: f64,
        /// y 缩放系数
        sy: f64,
    },
    /// 任意仿射矩阵
    Affine(AffineTransform),
}

impl MeshTransformation {
    /// 转为仿射矩阵
    pub fn to_affine(&self) -> AffineTransform {
        match *self {
            Self::Translation { dx, dy } => AffineTransform::translation(dx, dy),
            Self::Rotation { angle } => AffineTransform::rotation(angle),
            Self::Scaling { sx, sy } => AffineTransform::scale(sx, sy),
            Self::Affine(affine) => affine,
        }
    }
}
