// crates/sp_calc/src/calculator.rs

//! 按时间序列批量计算
//!
//! 计算器把变量、模式与一组多边形/断面绑定到一个文件头，随后逐帧读取
//! [`SerafinReader`] 并输出每帧一行结果，可写成分隔符文本。

use crate::error::{CalcError, CalcResult};
use crate::flux::{FluxEngine, FluxMode};
use crate::volume::{VolumeEngine, VolumeMode, VolumeResult};
use serde::{Deserialize, Serialize};
use sp_geo::{MeshIndex, Polygon, Polyline};
use sp_io::{SerafinHeader, SerafinReader};
use std::io::{Read, Seek, Write};
use tracing::{debug, info};

/// 体积计算的参考值
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Reference {
    /// 直接积分变量本身
    #[default]
    None,
    /// 减去第一帧的值
    InitialValues,
    /// 减去另一个变量（如水位减底高程）
    Variable(String),
}

/// 体积计算的一行结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeRow {
    /// 时刻
    pub time: f64,
    /// 每个多边形一个结果
    pub results: Vec<VolumeResult>,
}

/// 通量计算的一行结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FluxRow {
    /// 时刻
    pub time: f64,
    /// 每个断面一个结果
    pub values: Vec<f64>,
}

/// 计算前的公共检查：仅 2D，网格与文件头一致，变量存在
fn check_header(
    header: &SerafinHeader,
    mesh: &MeshIndex,
    operation: &'static str,
    var_ids: &[&str],
) -> CalcResult<()> {
    if !header.is_2d() {
        return Err(CalcError::Unsupported3d { operation });
    }
    CalcError::check_length("网格节点数", header.nb_nodes(), mesh.nb_nodes())?;
    for var_id in var_ids {
        if !header.has_variable(var_id) {
            return Err(CalcError::missing_variable(var_id, &header.var_ids()));
        }
    }
    Ok(())
}

fn default_names(prefix: &str, n: usize) -> Vec<String> {
    (1..=n).map(|i| format!("{}{}", prefix, i)).collect()
}

/// 采样的帧序号
fn sampled_frames(nb_frames: usize, every: usize) -> impl Iterator<Item = usize> {
    (0..nb_frames).step_by(every.max(1))
}

fn subtract(values: &mut [f64], offset: &[f64]) {
    for (v, o) in values.iter_mut().zip(offset) {
        *v -= o;
    }
}

fn write_line<W: Write>(writer: &mut W, target: &str, cells: &[String], delimiter: char) -> CalcResult<()> {
    let line = cells.join(&delimiter.to_string());
    writeln!(writer, "{}", line).map_err(|e| CalcError::io(target, e))
}

// ============================================================
// 体积
// ============================================================

/// 多边形体积时间序列计算器
#[derive(Debug, Clone)]
pub struct VolumeCalculator<'m> {
    engine: VolumeEngine<'m>,
    var_id: String,
    reference: Reference,
    sampling: usize,
    names: Vec<String>,
}

impl<'m> VolumeCalculator<'m> {
    /// 绑定变量与多边形
    pub fn new(
        header: &SerafinHeader,
        mesh: &'m MeshIndex,
        mode: VolumeMode,
        var_id: &str,
        polygons: &[Polygon],
    ) -> CalcResult<Self> {
        check_header(header, mesh, "体积计算", &[var_id])?;
        Ok(Self {
            engine: VolumeEngine::new(mesh, mode, polygons),
            var_id: var_id.to_string(),
            reference: Reference::None,
            sampling: 1,
            names: default_names("Polygon", polygons.len()),
        })
    }

    /// 设置参考值；参考变量须在文件头中
    pub fn with_reference(mut self, header: &SerafinHeader, reference: Reference) -> CalcResult<Self> {
        if let Reference::Variable(id) = &reference {
            if !header.has_variable(id) {
                return Err(CalcError::missing_variable(id, &header.var_ids()));
            }
        }
        self.reference = reference;
        Ok(self)
    }

    /// 每隔 `every` 帧取一帧
    #[must_use]
    pub fn with_sampling(mut self, every: usize) -> Self {
        self.sampling = every.max(1);
        self
    }

    /// 多边形名称（用于表头），个数不符时忽略
    #[must_use]
    pub fn with_names(mut self, names: Vec<String>) -> Self {
        if names.len() == self.engine.len() {
            self.names = names;
        }
        self
    }

    /// 计算模式
    pub fn mode(&self) -> VolumeMode {
        self.engine.mode()
    }

    /// 逐帧计算
    pub fn run<R: Read + Seek>(&self, reader: &mut SerafinReader<R>) -> CalcResult<Vec<VolumeRow>> {
        let times = reader.get_time()?.to_vec();
        let initial = match &self.reference {
            Reference::InitialValues if !times.is_empty() => {
                Some(reader.read_var_in_frame(0, &self.var_id)?)
            }
            _ => None,
        };

        let mut rows = Vec::new();
        for t in sampled_frames(times.len(), self.sampling) {
            let mut values = reader.read_var_in_frame(t, &self.var_id)?;
            match &self.reference {
                Reference::None => {}
                Reference::InitialValues => {
                    if let Some(init) = &initial {
                        subtract(&mut values, init);
                    }
                }
                Reference::Variable(id) => {
                    let other = reader.read_var_in_frame(t, id)?;
                    subtract(&mut values, &other);
                }
            }
            let results = self.engine.compute(&values)?;
            debug!(frame = t, time = times[t], "体积计算完成一帧");
            rows.push(VolumeRow {
                time: times[t],
                results,
            });
        }
        info!(
            source = reader.source(),
            var = %self.var_id,
            mode = %self.engine.mode(),
            nb_rows = rows.len(),
            "体积时间序列计算完成"
        );
        Ok(rows)
    }

    /// 写出分隔符文本；Positive 模式每个多边形输出 净/正/负 三列
    pub fn write_csv<W: Write>(&self, rows: &[VolumeRow], writer: &mut W, delimiter: char) -> CalcResult<()> {
        let split = self.engine.mode() == VolumeMode::Positive;
        let mut head = vec!["time".to_string()];
        for name in &self.names {
            head.push(name.clone());
            if split {
                head.push(format!("{} (+)", name));
                head.push(format!("{} (-)", name));
            }
        }
        write_line(writer, "volume csv", &head, delimiter)?;

        for row in rows {
            let mut cells = vec![row.time.to_string()];
            for r in &row.results {
                cells.push(r.net.to_string());
                if split {
                    cells.push(r.positive.unwrap_or(f64::NAN).to_string());
                    cells.push(r.negative.unwrap_or(f64::NAN).to_string());
                }
            }
            write_line(writer, "volume csv", &cells, delimiter)?;
        }
        Ok(())
    }
}

// ============================================================
// 通量
// ============================================================

/// 断面通量时间序列计算器
#[derive(Debug, Clone)]
pub struct FluxCalculator<'m> {
    engine: FluxEngine<'m>,
    mode: FluxMode,
    var_ids: Vec<String>,
    sampling: usize,
    names: Vec<String>,
}

impl<'m> FluxCalculator<'m> {
    /// 绑定变量与断面，`var_ids` 个数须与模式一致
    pub fn new(
        header: &SerafinHeader,
        mesh: &'m MeshIndex,
        mode: FluxMode,
        var_ids: &[&str],
        sections: &[Polyline],
    ) -> CalcResult<Self> {
        CalcError::check_length("通量变量个数", mode.nb_fields(), var_ids.len())?;
        check_header(header, mesh, "通量计算", var_ids)?;
        Ok(Self {
            engine: FluxEngine::new(mesh, sections),
            mode,
            var_ids: var_ids.iter().map(|s| s.to_string()).collect(),
            sampling: 1,
            names: default_names("Section", sections.len()),
        })
    }

    /// 每隔 `every` 帧取一帧
    #[must_use]
    pub fn with_sampling(mut self, every: usize) -> Self {
        self.sampling = every.max(1);
        self
    }

    /// 断面名称（用于表头），个数不符时忽略
    #[must_use]
    pub fn with_names(mut self, names: Vec<String>) -> Self {
        if names.len() == self.engine.len() {
            self.names = names;
        }
        self
    }

    /// 计算模式
    pub fn mode(&self) -> FluxMode {
        self.mode
    }

    /// 逐帧计算
    pub fn run<R: Read + Seek>(&self, reader: &mut SerafinReader<R>) -> CalcResult<Vec<FluxRow>> {
        let times = reader.get_time()?.to_vec();
        let mut rows = Vec::new();
        for t in sampled_frames(times.len(), self.sampling) {
            let fields = self
                .var_ids
                .iter()
                .map(|id| reader.read_var_in_frame(t, id))
                .collect::<Result<Vec<_>, _>>()?;
            let refs: Vec<&[f64]> = fields.iter().map(Vec::as_slice).collect();
            let values = self.engine.compute(self.mode, &refs)?;
            debug!(frame = t, time = times[t], "通量计算完成一帧");
            rows.push(FluxRow {
                time: times[t],
                values,
            });
        }
        info!(
            source = reader.source(),
            mode = %self.mode,
            nb_rows = rows.len(),
            "通量时间序列计算完成"
        );
        Ok(rows)
    }

    /// 写出分隔符文本
    pub fn write_csv<W: Write>(&self, rows: &[FluxRow], writer: &mut W, delimiter: char) -> CalcResult<()> {
        let mut head = vec!["time".to_string()];
        head.extend(self.names.iter().cloned());
        write_line(writer, "flux csv", &head, delimiter)?;
        for row in rows {
            let mut cells = vec![row.time.to_string()];
            cells.extend(row.values.iter().map(f64::to_string));
            write_line(writer, "flux csv", &cells, delimiter)?;
        }
        Ok(())
    }
}
