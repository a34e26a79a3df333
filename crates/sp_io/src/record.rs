// crates/sp_io/src/record.rs

//! Fortran 顺序无格式记录
//!
//! 每个逻辑块前后各有一个 4 字节大端整数记录标记，其值等于块的字节数：
//!
//! ```text
//! +-----------+------------------+-----------+
//! | len (4B)  | payload (len B)  | len (4B)  |
//! +-----------+------------------+-----------+
//! ```
//!
//! 所有数值均为大端字节序。

use crate::error::{SerafinError, SerafinResult};
use crate::precision::FloatPrecision;
use std::io::{self, Read, Write};

/// 记录标记字节数
pub const MARKER_SIZE: usize = 4;

/// 带前后标记的记录总字节数
#[inline]
pub const fn framed_size(payload: usize) -> usize {
    payload + 2 * MARKER_SIZE
}

/// 写入一条记录
pub fn write_record<W: Write>(writer: &mut W, payload: &[u8]) -> io::Result<()> {
    let len = i32::try_from(payload.len())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "记录长度超出 i32 范围"))?;
    let marker = len.to_be_bytes();
    writer.write_all(&marker)?;
    writer.write_all(payload)?;
    writer.write_all(&marker)?;
    Ok(())
}

fn read_marker<R: Read>(reader: &mut R, file: &str, what: &str) -> SerafinResult<i64> {
    let mut buf = [0u8; MARKER_SIZE];
    reader
        .read_exact(&mut buf)
        .map_err(|e| map_read_error(e, file, what))?;
    Ok(i64::from(i32::from_be_bytes(buf)))
}

/// 读取一条长度已知的记录，并校验前后标记
pub fn read_record_exact<R: Read>(
    reader: &mut R,
    file: &str,
    what: &str,
    expected_len: usize,
) -> SerafinResult<Vec<u8>> {
    let head = read_marker(reader, file, what)?;
    if head != expected_len as i64 {
        return Err(SerafinError::mismatch(
            file,
            &format!("{what} 记录长度"),
            expected_len,
            head,
        ));
    }

    let mut payload = vec![0u8; expected_len];
    reader
        .read_exact(&mut payload)
        .map_err(|e| map_read_error(e, file, what))?;

    let tail = read_marker(reader, file, what)?;
    if tail != head {
        return Err(SerafinError::mismatch(
            file,
            &format!("{what} 记录尾标记"),
            head,
            tail,
        ));
    }
    Ok(payload)
}

fn map_read_error(err: io::Error, file: &str, what: &str) -> SerafinError {
    if err.kind() == io::ErrorKind::UnexpectedEof {
        SerafinError::validation(file, format!("文件截断: 读取 {what} 时到达文件末尾"))
    } else {
        SerafinError::io(file, err)
    }
}

/// 解码大端 i32 数组
pub fn decode_i32s(bytes: &[u8]) -> Vec<i32> {
    bytes
        .chunks_exact(4)
        .map(|c| i32::from_be_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}

/// 编码大端 i32 数组
pub fn encode_i32s(values: &[i32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(values.len() * 4);
    for v in values {
        bytes.extend_from_slice(&v.to_be_bytes());
    }
    bytes
}

/// 按精度解码大端浮点数组
pub fn decode_floats(bytes: &[u8], precision: FloatPrecision) -> Vec<f64> {
    match precision {
        FloatPrecision::Single => bytes
            .chunks_exact(4)
            .map(|c| f64::from(f32::from_be_bytes([c[0], c[1], c[2], c[3]])))
            .collect(),
        FloatPrecision::Double => bytes
            .chunks_exact(8)
            .map(|c| {
                let mut buf = [0u8; 8];
                buf.copy_from_slice(c);
                f64::from_be_bytes(buf)
            })
            .collect(),
    }
}

/// 按精度编码大端浮点数组
#[allow(clippy::cast_possible_truncation)]
pub fn encode_floats(values: &[f64], precision: FloatPrecision) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(values.len() * precision.size_bytes());
    match precision {
        FloatPrecision::Single => {
            for &v in values {
                bytes.extend_from_slice(&(v as f32).to_be_bytes());
            }
        }
        FloatPrecision::Double => {
            for &v in values {
                bytes.extend_from_slice(&v.to_be_bytes());
            }
        }
    }
    bytes
}
