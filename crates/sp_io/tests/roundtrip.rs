// crates/sp_io/tests/roundtrip.rs

//! 读写往返测试
//!
//! 在临时目录中写出文件头与若干帧，再读回比较。

use sp_io::prelude::*;
use std::io::Cursor;

// ============================================================
// 辅助
// ============================================================

fn config(precision: FloatPrecision) -> SerafinConfig {
    SerafinConfig::default().precision(precision)
}

/// 4 节点单位正方形，2 个三角形，3 个变量
fn square_header(precision: FloatPrecision) -> SerafinHeader {
    let mut header = SerafinHeader::from_mesh_2d(
        "unit square",
        vec![0.0, 1.0, 1.0, 0.0],
        vec![0.0, 0.0, 1.0, 1.0],
        &[[0, 1, 2], [0, 2, 3]],
        &config(precision),
    )
    .unwrap();
    for id in ["U", "V", "H"] {
        header.add_variable_from_id(id).unwrap();
    }
    header
}

/// 单位直角三角形拉伸为 3 个平面
fn prism_header(precision: FloatPrecision) -> SerafinHeader {
    let mut x = Vec::new();
    let mut y = Vec::new();
    for _ in 0..3 {
        x.extend_from_slice(&[0.0, 1.0, 0.0]);
        y.extend_from_slice(&[0.0, 0.0, 1.0]);
    }
    let prisms = [[0, 1, 2, 3, 4, 5], [3, 4, 5, 6, 7, 8]];
    let mut header =
        SerafinHeader::from_mesh_3d("column", x, y, &prisms, 3, &config(precision)).unwrap();
    header.add_variable_from_id("Z").unwrap();
    header.add_variable_from_id("U").unwrap();
    header
}

fn frame_values(header: &SerafinHeader, t: usize) -> Vec<Vec<f64>> {
    (0..header.nb_var())
        .map(|v| {
            (0..header.nb_nodes())
                .map(|n| 0.25 * (t * 100 + v * 10 + n) as f64 - 3.5)
                .collect()
        })
        .collect()
}

fn write_file(path: &std::path::Path, header: &SerafinHeader, nb_frames: usize) {
    let mut writer = SerafinWriter::create(path, false).unwrap();
    writer.write_header(header).unwrap();
    for t in 0..nb_frames {
        writer
            .write_entire_frame(header, t as f64 * 60.0, &frame_values(header, t))
            .unwrap();
    }
    writer.finish().unwrap();
}

fn check_roundtrip(header: SerafinHeader) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("result.slf");
    write_file(&path, &header, 3);

    let file_size = std::fs::metadata(&path).unwrap().len();
    assert_eq!(file_size, header.expected_file_size(3));

    let mut reader = SerafinReader::open(&path, SerafinConfig::default()).unwrap();
    let read = reader.read_header().unwrap().clone();
    assert_eq!(read.nb_frames(), 3);
    assert_eq!(read.x(), header.x());
    assert_eq!(read.y(), header.y());
    assert_eq!(read.ikle(), header.ikle());
    assert_eq!(read.ipobo(), header.ipobo());
    assert_eq!(read.var_ids(), header.var_ids());
    assert_eq!(read.precision(), header.precision());
    assert_eq!(read.header_size(), header.header_size());
    assert_eq!(read.frame_size(), header.frame_size());
    assert_eq!(read.is_2d(), header.is_2d());

    assert_eq!(reader.get_time().unwrap(), &[0.0, 60.0, 120.0]);
    for t in 0..3 {
        let expected = frame_values(&header, t);
        for (v, id) in header.var_ids().iter().enumerate() {
            let values = reader.read_var_in_frame(t, id).unwrap();
            assert_eq!(values, expected[v]);
        }
        assert_eq!(reader.read_vars_in_frame(t).unwrap(), expected);
    }
}

// ============================================================
// 往返
// ============================================================

#[test]
fn test_roundtrip_2d_single() {
    check_roundtrip(square_header(FloatPrecision::Single));
}

#[test]
fn test_roundtrip_2d_double() {
    check_roundtrip(square_header(FloatPrecision::Double));
}

#[test]
fn test_roundtrip_3d_single() {
    check_roundtrip(prism_header(FloatPrecision::Single));
}

#[test]
fn test_roundtrip_3d_double() {
    check_roundtrip(prism_header(FloatPrecision::Double));
}

#[test]
fn test_double_precision_values_survive() {
    let header = square_header(FloatPrecision::Double);
    let values = vec![vec![0.1, 0.2, 0.3, 1.0 / 3.0]; 3];
    let mut writer = SerafinWriter::from_writer(Vec::new(), "mem");
    writer.write_header(&header).unwrap();
    writer.write_entire_frame(&header, 0.5, &values).unwrap();
    let bytes = writer.finish().unwrap();

    let mut reader =
        SerafinReader::from_reader(Cursor::new(bytes), "mem", SerafinConfig::default()).unwrap();
    reader.read_header().unwrap();
    assert!(reader.header().unwrap().is_double_precision());
    assert_eq!(reader.read_var_in_frame(0, "H").unwrap(), values[2]);
}

#[test]
fn test_date_and_title_roundtrip() {
    let mut header = square_header(FloatPrecision::Single);
    header.set_title("Sortie TELEMAC");
    header.set_date(Some([2019, 6, 21, 12, 30, 0]));

    let mut writer = SerafinWriter::from_writer(Vec::new(), "mem");
    writer.write_header(&header).unwrap();
    let bytes = writer.finish().unwrap();
    assert_eq!(bytes.len() as u64, header.header_size());

    let mut reader =
        SerafinReader::from_reader(Cursor::new(bytes), "mem", SerafinConfig::default()).unwrap();
    let read = reader.read_header().unwrap();
    assert_eq!(read.title(), "Sortie TELEMAC");
    assert_eq!(read.date(), Some([2019, 6, 21, 12, 30, 0]));
    assert_eq!(read.nb_frames(), 0);
}

// ============================================================
// 3D 访问器
// ============================================================

#[test]
fn test_3d_layer_accessors() {
    let header = prism_header(FloatPrecision::Single);
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("column.slf");
    write_file(&path, &header, 2);

    let mut reader = SerafinReader::open(&path, SerafinConfig::default()).unwrap();
    reader.read_header().unwrap();
    let full = reader.read_var_in_frame(1, "Z").unwrap();

    let planes = reader.read_var_in_frame_as_3d(1, "Z").unwrap();
    assert_eq!(planes.len(), 3);
    assert!(planes.iter().all(|p| p.len() == 3));
    assert_eq!(planes.concat(), full);

    let top = reader.read_var_in_frame_layer(1, "Z", 2).unwrap();
    assert_eq!(top, full[6..9].to_vec());
    assert!(reader
        .read_var_in_frame_layer(1, "Z", 3)
        .unwrap_err()
        .is_request());
}

#[test]
fn test_copy_as_2d_writes_valid_file() {
    let header = prism_header(FloatPrecision::Double);
    let mut flat = header.copy_as_2d().unwrap();
    flat.to_single_precision().unwrap();
    assert!(header.is_double_precision());

    let mut writer = SerafinWriter::from_writer(Vec::new(), "flat");
    writer.write_header(&flat).unwrap();
    writer
        .write_entire_frame(&flat, 0.0, &[vec![1.0; 3], vec![2.0; 3]])
        .unwrap();
    let bytes = writer.finish().unwrap();

    let mut reader =
        SerafinReader::from_reader(Cursor::new(bytes), "flat", SerafinConfig::default()).unwrap();
    let read = reader.read_header().unwrap();
    assert!(read.is_2d());
    assert_eq!(read.nb_nodes(), 3);
    assert_eq!(read.ikle_2d(), vec![[0, 1, 2]]);
    // 2D 表中 Z 不存在，读回后使用原始名称
    assert_eq!(read.var_ids(), vec!["COTE Z", "U"]);
}

// ============================================================
// 错误分类
// ============================================================

#[test]
fn test_magic_two_is_validation_error() {
    let header = square_header(FloatPrecision::Single);
    let mut writer = SerafinWriter::from_writer(Vec::new(), "mem");
    writer.write_header(&header).unwrap();
    let mut bytes = writer.finish().unwrap();

    // 几何尺寸块: 88 + 16 + 3*40 + 48 = 272, 魔数位于其载荷第 12 字节
    let magic_at = 272 + 4 + 12;
    assert_eq!(&bytes[magic_at..magic_at + 4], &1i32.to_be_bytes());
    bytes[magic_at..magic_at + 4].copy_from_slice(&2i32.to_be_bytes());

    let mut reader =
        SerafinReader::from_reader(Cursor::new(bytes), "mem", SerafinConfig::default()).unwrap();
    let err = reader.read_header().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[test]
fn test_oversized_counts_are_validation_errors() {
    let header = square_header(FloatPrecision::Single);
    let mut writer = SerafinWriter::from_writer(Vec::new(), "mem");
    writer.write_header(&header).unwrap();
    writer
        .write_entire_frame(&header, 0.0, &frame_values(&header, 0))
        .unwrap();
    let bytes = writer.finish().unwrap();

    // 变量数位于 88 + 4；单元数、节点数位于几何尺寸块 272 + 4 起
    for at in [92, 276, 280] {
        let mut patched = bytes.clone();
        patched[at..at + 4].copy_from_slice(&i32::MAX.to_be_bytes());
        let mut reader =
            SerafinReader::from_reader(Cursor::new(patched), "mem", SerafinConfig::default())
                .unwrap();
        let err = reader.read_header().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation, "偏移 {at}");
    }
}

#[test]
fn test_truncated_header_is_validation_error() {
    let header = square_header(FloatPrecision::Single);
    let mut writer = SerafinWriter::from_writer(Vec::new(), "mem");
    writer.write_header(&header).unwrap();
    let mut bytes = writer.finish().unwrap();
    bytes.truncate(bytes.len() - 10);

    let mut reader =
        SerafinReader::from_reader(Cursor::new(bytes), "mem", SerafinConfig::default()).unwrap();
    assert!(reader.read_header().unwrap_err().is_validation());
}

#[test]
fn test_existing_target_not_truncated() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("result.slf");
    write_file(&path, &square_header(FloatPrecision::Single), 1);
    let before = std::fs::read(&path).unwrap();

    let err = SerafinWriter::create(&path, false).err().unwrap();
    assert!(err.is_request());
    assert_eq!(std::fs::read(&path).unwrap(), before);
}

#[test]
fn test_english_language_lookup() {
    let header = square_header(FloatPrecision::Single);
    let mut writer = SerafinWriter::from_writer(Vec::new(), "mem");
    writer.write_header(&header).unwrap();
    let bytes = writer.finish().unwrap();

    // 法语名称在英语表中查不到
    let english = SerafinConfig::with_language(Language::En);
    let mut reader = SerafinReader::from_reader(Cursor::new(bytes), "mem", english).unwrap();
    let read = reader.read_header().unwrap();
    assert_eq!(read.var_ids(), vec!["VITESSE U", "VITESSE V", "HAUTEUR D'EAU"]);
}
