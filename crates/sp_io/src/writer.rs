// crates/sp_io/src/writer.rs

//! Serafin 写入器
//!
//! 顺序写入：先 [`SerafinWriter::write_header`]，再逐帧
//! [`SerafinWriter::write_entire_frame`]，最后 [`SerafinWriter::finish`] 刷新缓冲。

use crate::error::{SerafinError, SerafinResult};
use crate::header::{SerafinHeader, GEOMETRY_MAGIC, NB_PARAMS, PARAM_DATE, PARAM_PLANES};
use crate::record::{encode_floats, encode_i32s, write_record};
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;
use tracing::debug;

/// Serafin 写入器
pub struct SerafinWriter<W: Write> {
    writer: W,
    target: String,
    frames_written: usize,
}

impl SerafinWriter<BufWriter<File>> {
    /// 创建输出文件
    ///
    /// `overwrite == false` 且目标已存在时返回 [`SerafinError::AlreadyExists`]，不截断原文件。
    pub fn create(path: impl AsRef<Path>, overwrite: bool) -> SerafinResult<Self> {
        let path = path.as_ref();
        let target = path.display().to_string();
        let mut options = OpenOptions::new();
        options.write(true);
        if overwrite {
            options.create(true).truncate(true);
        } else {
            options.create_new(true);
        }
        let file = options.open(path).map_err(|e| {
            if e.kind() == io::ErrorKind::AlreadyExists {
                SerafinError::AlreadyExists {
                    path: target.clone(),
                }
            } else {
                SerafinError::io(&target, e)
            }
        })?;
        Ok(Self::from_writer(BufWriter::new(file), target))
    }
}

impl<W: Write> SerafinWriter<W> {
    /// 包装任意输出
    pub fn from_writer(writer: W, target: impl Into<String>) -> Self {
        Self {
            writer,
            target: target.into(),
            frames_written: 0,
        }
    }

    /// 已写入帧数
    pub fn frames_written(&self) -> usize {
        self.frames_written
    }

    /// 写入文件头
    pub fn write_header(&mut self, header: &SerafinHeader) -> SerafinResult<()> {
        let mut title = header.title.clone();
        title.extend_from_slice(&header.file_type);
        self.record(&title)?;

        let nb_var = self.to_i32(header.nb_var())?;
        self.record(&encode_i32s(&[nb_var, 0]))?;
        for var in header.variables() {
            let mut block = var.name.clone();
            block.extend_from_slice(&var.unit);
            self.record(&block)?;
        }

        // 平面数与日期标志以结构化字段为准
        let mut params: [i32; NB_PARAMS] = *header.params();
        params[PARAM_PLANES] = self.to_i32(header.nb_planes())?;
        params[PARAM_DATE] = i32::from(header.date().is_some());
        self.record(&encode_i32s(&params))?;
        if let Some(date) = header.date() {
            self.record(&encode_i32s(&date))?;
        }

        let dims = [
            self.to_i32(header.nb_elements())?,
            self.to_i32(header.nb_nodes())?,
            self.to_i32(header.nb_nodes_per_elem())?,
            GEOMETRY_MAGIC,
        ];
        self.record(&encode_i32s(&dims))?;
        self.record(&encode_i32s(header.ikle()))?;
        self.record(&encode_i32s(header.ipobo()))?;

        let precision = header.precision();
        self.record(&encode_floats(header.x(), precision))?;
        self.record(&encode_floats(header.y(), precision))?;

        debug!(
            file = %self.target,
            header_size = header.header_size(),
            nb_var = header.nb_var(),
            "Serafin 文件头写入完成"
        );
        Ok(())
    }

    /// 写入一帧：时间值加每个变量的全部节点值
    pub fn write_entire_frame<V: AsRef<[f64]>>(
        &mut self,
        header: &SerafinHeader,
        time: f64,
        values: &[V],
    ) -> SerafinResult<()> {
        if values.len() != header.nb_var() {
            return Err(SerafinError::request(
                &self.target,
                format!(
                    "帧变量数不一致: 期望 {}, 实际 {}",
                    header.nb_var(),
                    values.len()
                ),
            ));
        }
        for (var, row) in header.variables().iter().zip(values) {
            let row = row.as_ref();
            if row.len() != header.nb_nodes() {
                return Err(SerafinError::request(
                    &self.target,
                    format!(
                        "变量 '{}' 节点值个数不一致: 期望 {}, 实际 {}",
                        var.id,
                        header.nb_nodes(),
                        row.len()
                    ),
                ));
            }
        }

        let precision = header.precision();
        self.record(&encode_floats(&[time], precision))?;
        for row in values {
            self.record(&encode_floats(row.as_ref(), precision))?;
        }
        self.frames_written += 1;
        Ok(())
    }

    /// 刷新缓冲并返回底层输出
    pub fn finish(mut self) -> SerafinResult<W> {
        self.writer
            .flush()
            .map_err(|e| SerafinError::io(&self.target, e))?;
        Ok(self.writer)
    }

    fn record(&mut self, payload: &[u8]) -> SerafinResult<()> {
        write_record(&mut self.writer, payload).map_err(|e| SerafinError::io(&self.target, e))
    }

    fn to_i32(&self, value: usize) -> SerafinResult<i32> {
        i32::try_from(value).map_err(|_| {
            SerafinError::request(&self.target, format!("数值 {value} 超出 i32 范围"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SerafinConfig;

    fn triangle_header() -> SerafinHeader {
        let mut header = SerafinHeader::from_mesh_2d(
            "tri",
            vec![0.0, 1.0, 0.0],
            vec![0.0, 0.0, 1.0],
            &[[0, 1, 2]],
            &SerafinConfig::default(),
        )
        .unwrap();
        header.add_variable_from_id("B").unwrap();
        header
    }

    #[test]
    fn test_written_size_matches_header() {
        let header = triangle_header();
        let mut writer = SerafinWriter::from_writer(Vec::new(), "mem");
        writer.write_header(&header).unwrap();
        writer
            .write_entire_frame(&header, 0.0, &[vec![1.0, 2.0, 3.0]])
            .unwrap();
        writer
            .write_entire_frame(&header, 1.0, &[[4.0, 5.0, 6.0]])
            .unwrap();
        assert_eq!(writer.frames_written(), 2);
        let bytes = writer.finish().unwrap();
        assert_eq!(bytes.len() as u64, header.expected_file_size(2));
    }

    #[test]
    fn test_frame_shape_checked() {
        let header = triangle_header();
        let mut writer = SerafinWriter::from_writer(Vec::new(), "mem");
        writer.write_header(&header).unwrap();

        let err = writer
            .write_entire_frame(&header, 0.0, &[vec![1.0, 2.0]])
            .unwrap_err();
        assert!(err.is_request());
        let err = writer
            .write_entire_frame::<Vec<f64>>(&header, 0.0, &[])
            .unwrap_err();
        assert!(err.is_request());
    }

    #[test]
    fn test_create_refuses_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.slf");
        std::fs::write(&path, b"keep").unwrap();

        let err = SerafinWriter::create(&path, false).err().unwrap();
        assert!(matches!(err, SerafinError::AlreadyExists { .. }));
        assert!(err.is_request());
        assert_eq!(std::fs::read(&path).unwrap(), b"keep");

        let writer = SerafinWriter::create(&path, true).unwrap();
        writer.finish().unwrap();
        assert!(std::fs::read(&path).unwrap().is_empty());
    }
}
