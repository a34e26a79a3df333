// crates/sp_io/src/header.rs

//! Serafin 文件头
//!
//! 文件头描述网格与变量列表，并推导出头部字节数、单帧字节数与帧数。
//! 构造后只能通过显式的变更方法修改；`Clone` 为深拷贝，克隆体与原对象不共享可变数组。
//!
//! # 字节布局
//!
//! ```text
//! [80]  标题(72) + 文件类型(8)
//! [8]   nb_var, nb_var_quadratic
//! [32]  × nb_var  名称(16) + 单位(16)
//! [40]  IPARAM (10 × i32)
//! [24]  日期 (仅当 IPARAM[9] == 1)
//! [16]  nb_elements, nb_nodes, nodes_per_elem, 1
//! [4 × nb_elements × nodes_per_elem]  IKLE
//! [4 × nb_nodes]  IPOBO
//! [fs × nb_nodes] X
//! [fs × nb_nodes] Y
//! ```
//!
//! 每个方括号块前后各有 4 字节记录标记。

use crate::config::SerafinConfig;
use crate::error::{SerafinError, SerafinResult};
use crate::language::{decode_name, pad_bytes, Language, VariableTable, NAME_WIDTH};
use crate::precision::FloatPrecision;
use crate::record::framed_size;
use crate::transform::{AffineTransform, MeshTransformation};
use std::sync::Arc;

/// 标题宽度
pub const TITLE_WIDTH: usize = 72;
/// 文件类型宽度
pub const FILE_TYPE_WIDTH: usize = 8;
/// IPARAM 个数
pub const NB_PARAMS: usize = 10;
/// IPARAM 中平面数的位置
pub const PARAM_PLANES: usize = 6;
/// IPARAM 中日期标志的位置
pub const PARAM_DATE: usize = 9;
/// 几何尺寸块中的固定魔数
pub const GEOMETRY_MAGIC: i32 = 1;

/// 变量描述
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableInfo {
    /// 短标识（查表失败时为原始名称）
    pub id: String,
    /// 16 字节名称
    pub name: Vec<u8>,
    /// 16 字节单位
    pub unit: Vec<u8>,
}

impl VariableInfo {
    /// 由文本构造（自动填充为 16 字节）
    pub fn new(id: impl Into<String>, name: &str, unit: &str) -> Self {
        Self {
            id: id.into(),
            name: pad_bytes(name, NAME_WIDTH),
            unit: pad_bytes(unit, NAME_WIDTH),
        }
    }

    /// 去除空白的名称
    pub fn name_str(&self) -> String {
        decode_name(&self.name)
    }

    /// 去除空白的单位
    pub fn unit_str(&self) -> String {
        decode_name(&self.unit)
    }
}

/// Serafin 文件头
#[derive(Debug, Clone, PartialEq)]
pub struct SerafinHeader {
    pub(crate) title: Vec<u8>,
    pub(crate) file_type: Vec<u8>,
    pub(crate) precision: FloatPrecision,
    pub(crate) language: Language,
    pub(crate) table: Arc<VariableTable>,
    pub(crate) variables: Vec<VariableInfo>,
    pub(crate) params: [i32; NB_PARAMS],
    pub(crate) date: Option<[i32; 6]>,
    pub(crate) nb_elements: usize,
    pub(crate) nb_nodes: usize,
    pub(crate) nb_nodes_per_elem: usize,
    pub(crate) nb_planes: usize,
    pub(crate) ikle: Vec<i32>,
    pub(crate) ipobo: Vec<i32>,
    pub(crate) x: Vec<f64>,
    pub(crate) y: Vec<f64>,
    pub(crate) header_size: u64,
    pub(crate) frame_size: u64,
    pub(crate) nb_frames: usize,
}

impl SerafinHeader {
    // ========================================================================
    // 构造
    // ========================================================================

    /// 由二维三角网格构造文件头（不含变量）
    ///
    /// `triangles` 为从 0 开始的节点索引；IPOBO 置零。
    pub fn from_mesh_2d(
        title: &str,
        x: Vec<f64>,
        y: Vec<f64>,
        triangles: &[[usize; 3]],
        config: &SerafinConfig,
    ) -> SerafinResult<Self> {
        let ikle = triangles
            .iter()
            .flat_map(|t| t.iter().copied())
            .collect::<Vec<_>>();
        Self::from_parts(title, x, y, &ikle, 3, 0, config)
    }

    /// 由三维棱柱网格构造文件头（不含变量）
    ///
    /// 节点按平面分层排列，`prisms` 为从 0 开始的 6 节点索引。
    pub fn from_mesh_3d(
        title: &str,
        x: Vec<f64>,
        y: Vec<f64>,
        prisms: &[[usize; 6]],
        nb_planes: usize,
        config: &SerafinConfig,
    ) -> SerafinResult<Self> {
        let ikle = prisms
            .iter()
            .flat_map(|p| p.iter().copied())
            .collect::<Vec<_>>();
        Self::from_parts(title, x, y, &ikle, 6, nb_planes, config)
    }

    fn from_parts(
        title: &str,
        x: Vec<f64>,
        y: Vec<f64>,
        ikle_zero_based: &[usize],
        nb_nodes_per_elem: usize,
        nb_planes: usize,
        config: &SerafinConfig,
    ) -> SerafinResult<Self> {
        const SOURCE: &str = "<新建文件头>";
        if x.len() != y.len() {
            return Err(SerafinError::request(
                SOURCE,
                format!("坐标长度不一致: x {} 个, y {} 个", x.len(), y.len()),
            ));
        }
        let nb_nodes = x.len();
        let mut ikle = Vec::with_capacity(ikle_zero_based.len());
        for &node in ikle_zero_based {
            if node >= nb_nodes {
                return Err(SerafinError::request(
                    SOURCE,
                    format!("连接表节点索引 {node} 超出节点数 {nb_nodes}"),
                ));
            }
            ikle.push(to_i32(node + 1, SOURCE)?);
        }

        let mut params = [0i32; NB_PARAMS];
        params[0] = 1;
        params[PARAM_PLANES] = to_i32(nb_planes, SOURCE)?;

        let mut header = Self {
            title: pad_bytes(title, TITLE_WIDTH),
            file_type: config.precision.file_type().to_vec(),
            precision: config.precision,
            language: config.language,
            table: Arc::clone(&config.table),
            variables: Vec::new(),
            params,
            date: None,
            nb_elements: ikle.len() / nb_nodes_per_elem,
            nb_nodes,
            nb_nodes_per_elem,
            nb_planes,
            ikle,
            ipobo: vec![0; nb_nodes],
            x,
            y,
            header_size: 0,
            frame_size: 0,
            nb_frames: 0,
        };
        header
            .validate_geometry(SOURCE)
            .map_err(|e| SerafinError::request(SOURCE, e.to_string()))?;
        header.compute_sizes();
        Ok(header)
    }

    // ========================================================================
    // 校验与尺寸推导
    // ========================================================================

    /// 校验维度相关的几何约束
    pub(crate) fn validate_geometry(&self, file: &str) -> SerafinResult<()> {
        if self.is_2d() {
            if self.nb_nodes_per_elem != 3 {
                return Err(SerafinError::mismatch(
                    file,
                    "2D 单元节点数",
                    3,
                    self.nb_nodes_per_elem,
                ));
            }
        } else {
            if self.nb_planes < 2 {
                return Err(SerafinError::mismatch(
                    file,
                    "3D 平面数下限",
                    2,
                    self.nb_planes,
                ));
            }
            if self.nb_nodes_per_elem != 6 {
                return Err(SerafinError::mismatch(
                    file,
                    "3D 单元节点数",
                    6,
                    self.nb_nodes_per_elem,
                ));
            }
            if self.nb_elements % (self.nb_planes - 1) != 0 {
                return Err(SerafinError::validation(
                    file,
                    format!(
                        "3D 单元数 {} 不能被层数 {} 整除",
                        self.nb_elements,
                        self.nb_planes - 1
                    ),
                ));
            }
            if self.nb_nodes % self.nb_planes != 0 {
                return Err(SerafinError::validation(
                    file,
                    format!(
                        "3D 节点数 {} 不能被平面数 {} 整除",
                        self.nb_nodes, self.nb_planes
                    ),
                ));
            }
        }
        Ok(())
    }

    /// 重新计算头部与单帧字节数
    pub(crate) fn compute_sizes(&mut self) {
        let fs = self.precision.size_bytes();
        let nb_var = self.variables.len();
        let mut size = framed_size(TITLE_WIDTH + FILE_TYPE_WIDTH)
            + framed_size(8)
            + nb_var * framed_size(2 * NAME_WIDTH)
            + framed_size(4 * NB_PARAMS);
        if self.date.is_some() {
            size += framed_size(24);
        }
        size += framed_size(16)
            + framed_size(4 * self.nb_elements * self.nb_nodes_per_elem)
            + framed_size(4 * self.nb_nodes)
            + 2 * framed_size(fs * self.nb_nodes);

        self.header_size = size as u64;
        self.frame_size = (framed_size(fs) + nb_var * framed_size(fs * self.nb_nodes)) as u64;
    }

    /// 由文件总字节数推导帧数，要求整除
    pub(crate) fn set_frame_count(&mut self, file: &str, file_size: u64) -> SerafinResult<()> {
        if file_size < self.header_size {
            return Err(SerafinError::mismatch(
                file,
                "文件长度下限（头部字节数）",
                self.header_size,
                file_size,
            ));
        }
        let remaining = file_size - self.header_size;
        if remaining % self.frame_size != 0 {
            return Err(SerafinError::validation(
                file,
                format!(
                    "帧数据长度 {remaining} 不能被单帧字节数 {} 整除",
                    self.frame_size
                ),
            ));
        }
        self.nb_frames = usize::try_from(remaining / self.frame_size)
            .map_err(|_| SerafinError::validation(file, "帧数超出平台范围"))?;
        Ok(())
    }

    // ========================================================================
    // 访问器
    // ========================================================================

    /// 去除空白的标题
    pub fn title(&self) -> String {
        decode_name(&self.title)
    }

    /// 8 字节文件类型
    pub fn file_type(&self) -> &[u8] {
        &self.file_type
    }

    /// 浮点精度
    pub fn precision(&self) -> FloatPrecision {
        self.precision
    }

    /// 单个浮点值的字节数
    pub fn float_size(&self) -> usize {
        self.precision.size_bytes()
    }

    /// 是否为双精度
    pub fn is_double_precision(&self) -> bool {
        self.precision.is_double()
    }

    /// 文件语言
    pub fn language(&self) -> Language {
        self.language
    }

    /// 变量表
    pub fn table(&self) -> &VariableTable {
        &self.table
    }

    /// 是否为二维文件
    pub fn is_2d(&self) -> bool {
        self.nb_planes == 0
    }

    /// 变量描述列表
    pub fn variables(&self) -> &[VariableInfo] {
        &self.variables
    }

    /// 变量数
    pub fn nb_var(&self) -> usize {
        self.variables.len()
    }

    /// 变量标识列表
    pub fn var_ids(&self) -> Vec<&str> {
        self.variables.iter().map(|v| v.id.as_str()).collect()
    }

    /// 变量在帧中的位置
    pub fn var_index(&self, var_id: &str) -> Option<usize> {
        self.variables.iter().position(|v| v.id == var_id)
    }

    /// 是否包含变量
    pub fn has_variable(&self, var_id: &str) -> bool {
        self.var_index(var_id).is_some()
    }

    /// IPARAM
    pub fn params(&self) -> &[i32; NB_PARAMS] {
        &self.params
    }

    /// 日期 [年, 月, 日, 时, 分, 秒]
    pub fn date(&self) -> Option<[i32; 6]> {
        self.date
    }

    /// 单元数
    pub fn nb_elements(&self) -> usize {
        self.nb_elements
    }

    /// 节点数
    pub fn nb_nodes(&self) -> usize {
        self.nb_nodes
    }

    /// 每单元节点数
    pub fn nb_nodes_per_elem(&self) -> usize {
        self.nb_nodes_per_elem
    }

    /// 平面数（2D 为 0）
    pub fn nb_planes(&self) -> usize {
        self.nb_planes
    }

    /// 单层节点数
    pub fn nb_nodes_2d(&self) -> usize {
        if self.is_2d() {
            self.nb_nodes
        } else {
            self.nb_nodes / self.nb_planes
        }
    }

    /// 单层单元数
    pub fn nb_elements_2d(&self) -> usize {
        if self.is_2d() {
            self.nb_elements
        } else {
            self.nb_elements / (self.nb_planes - 1)
        }
    }

    /// 原始连接表（展平，1 起始）
    pub fn ikle(&self) -> &[i32] {
        &self.ikle
    }

    /// 底层二维三角形连接表（0 起始）
    pub fn ikle_2d(&self) -> Vec<[usize; 3]> {
        let npe = self.nb_nodes_per_elem;
        self.ikle
            .chunks_exact(npe)
            .take(self.nb_elements_2d())
            .map(|row| {
                [
                    zero_based(row[0]),
                    zero_based(row[1]),
                    zero_based(row[2]),
                ]
            })
            .collect()
    }

    /// 边界节点编号表
    pub fn ipobo(&self) -> &[i32] {
        &self.ipobo
    }

    /// 节点 x 坐标
    pub fn x(&self) -> &[f64] {
        &self.x
    }

    /// 节点 y 坐标
    pub fn y(&self) -> &[f64] {
        &self.y
    }

    /// 头部字节数（含记录标记）
    pub fn header_size(&self) -> u64 {
        self.header_size
    }

    /// 单帧字节数（含记录标记）
    pub fn frame_size(&self) -> u64 {
        self.frame_size
    }

    /// 帧数（仅对读取得到的文件头有意义）
    pub fn nb_frames(&self) -> usize {
        self.nb_frames
    }

    /// 写入 `nb_frames` 帧后的文件总字节数
    pub fn expected_file_size(&self, nb_frames: usize) -> u64 {
        self.header_size + self.frame_size * nb_frames as u64
    }

    // ========================================================================
    // 变更辅助（不涉及磁盘）
    // ========================================================================

    /// 深拷贝
    #[must_use]
    pub fn copy(&self) -> Self {
        self.clone()
    }

    /// 去除垂向维度的二维副本
    ///
    /// 保留变量列表，取底层三角形及前 `nb_nodes_2d` 个节点的坐标与 IPOBO。
    pub fn copy_as_2d(&self) -> SerafinResult<Self> {
        if self.is_2d() {
            return Err(SerafinError::request(
                self.title(),
                "copy_as_2d 仅适用于 3D 文件头",
            ));
        }
        let nb_nodes_2d = self.nb_nodes_2d();
        let ikle_2d = self.ikle_2d();

        let mut header = self.clone();
        header.nb_planes = 0;
        header.params[PARAM_PLANES] = 0;
        header.nb_nodes_per_elem = 3;
        header.nb_nodes = nb_nodes_2d;
        header.nb_elements = ikle_2d.len();
        header.ikle = ikle_2d
            .iter()
            .flat_map(|t| t.iter().map(|&n| one_based(n)))
            .collect();
        header.ipobo.truncate(nb_nodes_2d);
        header.x.truncate(nb_nodes_2d);
        header.y.truncate(nb_nodes_2d);
        header.nb_frames = 0;
        header.compute_sizes();
        Ok(header)
    }

    /// 双精度转单精度
    pub fn to_single_precision(&mut self) -> SerafinResult<()> {
        if !self.is_double_precision() {
            return Err(SerafinError::request(
                self.title(),
                "to_single_precision 仅适用于双精度文件头",
            ));
        }
        self.precision = FloatPrecision::Single;
        self.file_type = FloatPrecision::Single.file_type().to_vec();
        self.nb_frames = 0;
        self.compute_sizes();
        Ok(())
    }

    /// 清空变量列表
    pub fn empty_variables(&mut self) {
        self.variables.clear();
        self.compute_sizes();
    }

    /// 按标识添加变量，名称与单位取自变量表
    pub fn add_variable_from_id(&mut self, var_id: &str) -> SerafinResult<()> {
        let spec = self.table.spec(var_id, self.is_2d()).ok_or_else(|| {
            SerafinError::request(self.title(), format!("变量表中没有标识 '{var_id}'"))
        })?;
        let info = VariableInfo::new(var_id, spec.name(self.language), &spec.unit);
        self.push_variable(info)
    }

    /// 添加自定义变量
    pub fn add_variable_str(&mut self, var_id: &str, name: &str, unit: &str) -> SerafinResult<()> {
        self.push_variable(VariableInfo::new(var_id, name, unit))
    }

    fn push_variable(&mut self, info: VariableInfo) -> SerafinResult<()> {
        if self.has_variable(&info.id) {
            return Err(SerafinError::request(
                self.title(),
                format!("变量 '{}' 已存在", info.id),
            ));
        }
        self.variables.push(info);
        self.compute_sizes();
        Ok(())
    }

    /// 按顺序对节点平面坐标施加变换（原地）
    pub fn transform_mesh(&mut self, steps: &[MeshTransformation]) {
        let affine = AffineTransform::from_steps(steps);
        if affine.is_identity() {
            return;
        }
        for (x, y) in self.x.iter_mut().zip(self.y.iter_mut()) {
            let (nx, ny) = affine.apply(*x, *y);
            *x = nx;
            *y = ny;
        }
    }

    /// 返回变换后的副本
    #[must_use]
    pub fn transformed_mesh(&self, steps: &[MeshTransformation]) -> Self {
        let mut header = self.clone();
        header.transform_mesh(steps);
        header
    }

    /// 设置标题
    pub fn set_title(&mut self, title: &str) {
        self.title = pad_bytes(title, TITLE_WIDTH);
    }

    /// 设置或清除日期
    pub fn set_date(&mut self, date: Option<[i32; 6]>) {
        self.date = date;
        self.params[PARAM_DATE] = i32::from(date.is_some());
        self.compute_sizes();
    }

    /// 可读摘要
    pub fn summary(&self) -> String {
        let mut lines = vec![
            format!("标题: {}", self.title()),
            format!(
                "格式: {} ({} 精度), 语言: {}",
                String::from_utf8_lossy(&self.file_type).trim(),
                self.precision,
                self.language.code()
            ),
        ];
        lines.push(if self.is_2d() {
            "维度: 2D".to_string()
        } else {
            format!(
                "维度: 3D, 平面数 {}, 单层节点 {}, 单层单元 {}",
                self.nb_planes,
                self.nb_nodes_2d(),
                self.nb_elements_2d()
            )
        });
        lines.push(format!(
            "节点: {}, 单元: {}, 每单元节点: {}",
            self.nb_nodes, self.nb_elements, self.nb_nodes_per_elem
        ));
        lines.push(format!("变量 ({}):", self.nb_var()));
        lines.extend(
            self.variables
                .iter()
                .map(|var| format!("  {:<4} {:<16} [{}]", var.id, var.name_str(), var.unit_str())),
        );
        if let Some([year, month, day, hour, minute, second]) = self.date {
            lines.push(format!(
                "日期: {year:04}-{month:02}-{day:02} {hour:02}:{minute:02}:{second:02}"
            ));
        }
        lines.push(format!(
            "头部 {} 字节, 单帧 {} 字节, {} 帧",
            self.header_size, self.frame_size, self.nb_frames
        ));
        lines.join("\n")
    }
}

/// 磁盘上的 1 起始索引转 0 起始（调用前已校验范围）
#[inline]
#[allow(clippy::cast_sign_loss)]
fn zero_based(node: i32) -> usize {
    (node - 1) as usize
}

#[inline]
#[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
fn one_based(node: usize) -> i32 {
    (node + 1) as i32
}

fn to_i32(value: usize, file: &str) -> SerafinResult<i32> {
    i32::try_from(value)
        .map_err(|_| SerafinError::request(file, format!("数值 {value} 超出 i32 范围")))
}
