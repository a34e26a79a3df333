// crates/sp_io/src/reader.rs

//! Serafin 读取器
//!
//! 文件头一次性解析并校验，帧数据按需随机读取：读取某变量某时刻的值时直接
//! 定位到计算出的字节偏移，不扫描前面的帧。

use crate::config::SerafinConfig;
use crate::error::{SerafinError, SerafinResult};
use crate::header::{
    SerafinHeader, VariableInfo, FILE_TYPE_WIDTH, GEOMETRY_MAGIC, NB_PARAMS, PARAM_DATE,
    PARAM_PLANES, TITLE_WIDTH,
};
use crate::language::{decode_name, NAME_WIDTH};
use crate::precision::FloatPrecision;
use crate::record::{decode_floats, decode_i32s, framed_size, read_record_exact};
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

/// Serafin 读取器
///
/// 泛型于 `R: Read + Seek`，既可读磁盘文件也可读内存缓冲。
/// 文件句柄随读取器一起释放。
pub struct SerafinReader<R: Read + Seek> {
    reader: R,
    source: String,
    config: SerafinConfig,
    file_size: u64,
    header: Option<SerafinHeader>,
    time: Option<Vec<f64>>,
}

impl SerafinReader<BufReader<File>> {
    /// 打开磁盘文件
    pub fn open(path: impl AsRef<Path>, config: SerafinConfig) -> SerafinResult<Self> {
        let path = path.as_ref();
        let source = path.display().to_string();
        let file = File::open(path).map_err(|e| SerafinError::io(&source, e))?;
        Self::from_reader(BufReader::new(file), source, config)
    }
}

impl<R: Read + Seek> SerafinReader<R> {
    /// 包装任意可定位数据源
    pub fn from_reader(
        mut reader: R,
        source: impl Into<String>,
        config: SerafinConfig,
    ) -> SerafinResult<Self> {
        let source = source.into();
        let file_size = reader
            .seek(SeekFrom::End(0))
            .map_err(|e| SerafinError::io(&source, e))?;
        reader
            .seek(SeekFrom::Start(0))
            .map_err(|e| SerafinError::io(&source, e))?;
        Ok(Self {
            reader,
            source,
            config,
            file_size,
            header: None,
            time: None,
        })
    }

    /// 数据源名称
    pub fn source(&self) -> &str {
        &self.source
    }

    /// 数据源总字节数
    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    /// 已读取的文件头
    pub fn header(&self) -> SerafinResult<&SerafinHeader> {
        self.header
            .as_ref()
            .ok_or_else(|| SerafinError::header_not_read(&self.source))
    }

    /// 取出文件头，读取器随之失效
    pub fn into_header(self) -> SerafinResult<SerafinHeader> {
        self.header
            .ok_or_else(|| SerafinError::header_not_read(&self.source))
    }

    // ========================================================================
    // 文件头
    // ========================================================================

    /// 解析并校验文件头
    pub fn read_header(&mut self) -> SerafinResult<&SerafinHeader> {
        if self.file_size == 0 {
            return Err(SerafinError::validation(&self.source, "空文件"));
        }
        self.time = None;
        self.reader
            .seek(SeekFrom::Start(0))
            .map_err(|e| SerafinError::io(&self.source, e))?;

        let header = self.parse_header()?;
        debug!(
            file = %self.source,
            header_size = header.header_size(),
            frame_size = header.frame_size(),
            nb_frames = header.nb_frames(),
            "Serafin 文件头解析完成"
        );
        Ok(self.header.insert(header))
    }

    fn parse_header(&mut self) -> SerafinResult<SerafinHeader> {
        let file = self.source.clone();
        let r = &mut self.reader;

        // 标题 + 文件类型
        let block = read_record_exact(r, &file, "标题", TITLE_WIDTH + FILE_TYPE_WIDTH)?;
        let title = block[..TITLE_WIDTH].to_vec();
        let file_type = block[TITLE_WIDTH..].to_vec();
        let precision = FloatPrecision::from_file_type(&file_type);

        // 变量数
        let counts = decode_i32s(&read_record_exact(r, &file, "变量数", 8)?);
        let nb_var = to_count(counts[0], &file, "变量数")?;
        if counts[1] != 0 {
            return Err(SerafinError::mismatch(&file, "二次变量数", 0, counts[1]));
        }

        // 变量名块必须装得进剩余字节
        let prefix = framed_size(TITLE_WIDTH + FILE_TYPE_WIDTH) + framed_size(8);
        let names_len = (nb_var as u64).saturating_mul(framed_size(2 * NAME_WIDTH) as u64);
        let available = self.file_size.saturating_sub(prefix as u64);
        if names_len > available {
            return Err(SerafinError::mismatch(
                &file,
                "变量名块字节数上限",
                available,
                names_len,
            ));
        }

        // 变量名与单位（标识待维度确定后查表）
        let mut raw_vars = Vec::new();
        for _ in 0..nb_var {
            let block = read_record_exact(r, &file, "变量名", 2 * NAME_WIDTH)?;
            raw_vars.push((block[..NAME_WIDTH].to_vec(), block[NAME_WIDTH..].to_vec()));
        }

        // IPARAM
        let values = decode_i32s(&read_record_exact(r, &file, "IPARAM", 4 * NB_PARAMS)?);
        let mut params = [0i32; NB_PARAMS];
        params.copy_from_slice(&values);
        let nb_planes = to_count(params[PARAM_PLANES], &file, "平面数")?;

        let date = if params[PARAM_DATE] == 1 {
            let values = decode_i32s(&read_record_exact(r, &file, "日期", 24)?);
            let mut date = [0i32; 6];
            date.copy_from_slice(&values);
            Some(date)
        } else {
            None
        };

        // 几何尺寸
        let dims = decode_i32s(&read_record_exact(r, &file, "几何尺寸", 16)?);
        let nb_elements = to_count(dims[0], &file, "单元数")?;
        let nb_nodes = to_count(dims[1], &file, "节点数")?;
        let nb_nodes_per_elem = to_count(dims[2], &file, "每单元节点数")?;
        if dims[3] != GEOMETRY_MAGIC {
            return Err(SerafinError::mismatch(&file, "几何块魔数", GEOMETRY_MAGIC, dims[3]));
        }

        let mut header = SerafinHeader {
            title,
            file_type,
            precision,
            language: self.config.language,
            table: Arc::clone(&self.config.table),
            variables: Vec::new(),
            params,
            date,
            nb_elements,
            nb_nodes,
            nb_nodes_per_elem,
            nb_planes,
            ikle: Vec::new(),
            ipobo: Vec::new(),
            x: Vec::new(),
            y: Vec::new(),
            header_size: 0,
            frame_size: 0,
            nb_frames: 0,
        };
        header.validate_geometry(&file)?;

        // 变量标识
        let is_2d = header.is_2d();
        for (name, unit) in raw_vars {
            let decoded = decode_name(&name);
            let id = match self.config.table.find_id(&decoded, header.language, is_2d) {
                Some(id) => id.to_string(),
                None => {
                    warn!(
                        file = %file,
                        name = %decoded,
                        language = header.language.code(),
                        "未知变量名，使用原始名称作为标识"
                    );
                    decoded
                }
            };
            header.variables.push(VariableInfo { id, name, unit });
        }

        // 先按已知尺寸核对文件长度，避免为截断文件分配大数组
        header.compute_sizes();
        if self.file_size < header.header_size {
            return Err(SerafinError::mismatch(
                &file,
                "文件长度下限（头部字节数）",
                header.header_size,
                self.file_size,
            ));
        }

        let ikle_len = nb_elements * nb_nodes_per_elem;
        let ikle = decode_i32s(&read_record_exact(r, &file, "IKLE", 4 * ikle_len)?);
        if let Some(bad) = ikle
            .iter()
            .find(|&&n| n < 1 || n as i64 > nb_nodes as i64)
        {
            return Err(SerafinError::validation(
                &file,
                format!("IKLE 节点编号 {bad} 超出范围 1..={nb_nodes}"),
            ));
        }
        header.ikle = ikle;
        header.ipobo = decode_i32s(&read_record_exact(r, &file, "IPOBO", 4 * nb_nodes)?);

        let fs = precision.size_bytes();
        header.x = decode_floats(&read_record_exact(r, &file, "X", fs * nb_nodes)?, precision);
        header.y = decode_floats(&read_record_exact(r, &file, "Y", fs * nb_nodes)?, precision);

        header.set_frame_count(&file, self.file_size)?;
        Ok(header)
    }

    // ========================================================================
    // 帧数据
    // ========================================================================

    /// 所有帧的时间值（首次调用后缓存）
    pub fn get_time(&mut self) -> SerafinResult<&[f64]> {
        if self.time.is_none() {
            let header = self.header()?;
            let precision = header.precision();
            let starts: Vec<u64> = (0..header.nb_frames())
                .map(|t| frame_offset(header, t))
                .collect();

            let mut time = Vec::with_capacity(starts.len());
            for start in starts {
                self.seek(start)?;
                let block = read_record_exact(
                    &mut self.reader,
                    &self.source,
                    "时间",
                    precision.size_bytes(),
                )?;
                time.push(decode_floats(&block, precision)[0]);
            }
            self.time = Some(time);
        }
        Ok(self.time.as_deref().unwrap_or_default())
    }

    /// 读取某帧某变量的全部节点值
    pub fn read_var_in_frame(&mut self, time_index: usize, var_id: &str) -> SerafinResult<Vec<f64>> {
        let header = self.header()?;
        let pos = header
            .var_index(var_id)
            .ok_or_else(|| SerafinError::unknown_variable(&self.source, var_id))?;
        self.check_time_index(time_index)?;

        let header = self.header()?;
        let fs = header.float_size();
        let nb_nodes = header.nb_nodes();
        let precision = header.precision();
        let offset = frame_offset(header, time_index)
            + framed_size(fs) as u64
            + (pos * framed_size(fs * nb_nodes)) as u64;

        self.seek(offset)?;
        let block = read_record_exact(&mut self.reader, &self.source, var_id, fs * nb_nodes)?;
        Ok(decode_floats(&block, precision))
    }

    /// 读取某帧全部变量（按变量顺序）
    pub fn read_vars_in_frame(&mut self, time_index: usize) -> SerafinResult<Vec<Vec<f64>>> {
        self.check_time_index(time_index)?;
        let header = self.header()?;
        let fs = header.float_size();
        let nb_nodes = header.nb_nodes();
        let precision = header.precision();
        let ids: Vec<String> = header.var_ids().iter().map(|s| s.to_string()).collect();
        let offset = frame_offset(header, time_index) + framed_size(fs) as u64;

        self.seek(offset)?;
        let mut values = Vec::with_capacity(ids.len());
        for id in &ids {
            let block = read_record_exact(&mut self.reader, &self.source, id, fs * nb_nodes)?;
            values.push(decode_floats(&block, precision));
        }
        Ok(values)
    }

    /// 读取某帧某变量并按平面重排为 `[nb_planes][nb_nodes_2d]`（仅 3D）
    pub fn read_var_in_frame_as_3d(
        &mut self,
        time_index: usize,
        var_id: &str,
    ) -> SerafinResult<Vec<Vec<f64>>> {
        let nb_nodes_2d = self.require_3d("read_var_in_frame_as_3d")?.nb_nodes_2d();
        let values = self.read_var_in_frame(time_index, var_id)?;
        Ok(values.chunks_exact(nb_nodes_2d).map(<[f64]>::to_vec).collect())
    }

    /// 读取某帧某变量在指定平面上的值（仅 3D，平面 0 为底层）
    pub fn read_var_in_frame_layer(
        &mut self,
        time_index: usize,
        var_id: &str,
        plane: usize,
    ) -> SerafinResult<Vec<f64>> {
        let header = self.require_3d("read_var_in_frame_layer")?;
        let nb_planes = header.nb_planes();
        let nb_nodes_2d = header.nb_nodes_2d();
        if plane >= nb_planes {
            return Err(SerafinError::request(
                &self.source,
                format!("平面索引 {plane} 超出范围 (共 {nb_planes} 个平面)"),
            ));
        }
        let values = self.read_var_in_frame(time_index, var_id)?;
        Ok(values[plane * nb_nodes_2d..(plane + 1) * nb_nodes_2d].to_vec())
    }

    fn require_3d(&self, operation: &str) -> SerafinResult<&SerafinHeader> {
        let header = self.header()?;
        if header.is_2d() {
            return Err(SerafinError::request(
                &self.source,
                format!("{operation} 仅适用于 3D 文件"),
            ));
        }
        Ok(header)
    }

    fn check_time_index(&self, time_index: usize) -> SerafinResult<()> {
        let nb_frames = self.header()?.nb_frames();
        if time_index >= nb_frames {
            return Err(SerafinError::request(
                &self.source,
                format!("时间索引 {time_index} 超出范围 (共 {nb_frames} 帧)"),
            ));
        }
        Ok(())
    }

    fn seek(&mut self, offset: u64) -> SerafinResult<()> {
        self.reader
            .seek(SeekFrom::Start(offset))
            .map_err(|e| SerafinError::io(&self.source, e))?;
        Ok(())
    }
}

/// 第 `t` 帧起始字节偏移
#[inline]
fn frame_offset(header: &SerafinHeader, t: usize) -> u64 {
    header.header_size() + t as u64 * header.frame_size()
}

fn to_count(value: i32, file: &str, what: &str) -> SerafinResult<usize> {
    usize::try_from(value)
        .map_err(|_| SerafinError::validation(file, format!("{what} 为负数: {value}")))
}
