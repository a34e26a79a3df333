// crates/sp_geo/tests/mesh_queries.rs

//! 网格索引与多边形/折线裁剪的组合测试

use sp_geo::prelude::*;
use sp_io::{SerafinConfig, SerafinHeader};

/// n×n 的规则网格，每个方格两个三角形
fn grid(n: usize) -> (Vec<f64>, Vec<f64>, Vec<[usize; 3]>) {
    let mut x = Vec::new();
    let mut y = Vec::new();
    for j in 0..=n {
        for i in 0..=n {
            x.push(i as f64);
            y.push(j as f64);
        }
    }
    let id = |i: usize, j: usize| j * (n + 1) + i;
    let mut tris = Vec::new();
    for j in 0..n {
        for i in 0..n {
            tris.push([id(i, j), id(i + 1, j), id(i + 1, j + 1)]);
            tris.push([id(i, j), id(i + 1, j + 1), id(i, j + 1)]);
        }
    }
    (x, y, tris)
}

#[test]
fn test_polygon_coverage_sums_to_polygon_area() {
    let (x, y, tris) = grid(6);
    let mesh = MeshIndex::new(&x, &y, &tris).unwrap();
    let polygon = Polygon::new(vec![
        Point2D::new(0.5, 0.5),
        Point2D::new(5.2, 1.1),
        Point2D::new(3.0, 2.5),
        Point2D::new(4.7, 5.4),
        Point2D::new(1.3, 4.9),
    ])
    .unwrap();

    let covered: f64 = mesh
        .elements_overlapping(&polygon.bounds())
        .iter()
        .map(|tri| polygon.intersection(&tri.ccw_vertices()).area())
        .sum();
    assert!((covered - polygon.area()).abs() < 1e-9);
}

#[test]
fn test_polyline_clips_sum_to_length() {
    let (x, y, tris) = grid(5);
    let mesh = MeshIndex::new(&x, &y, &tris).unwrap();
    let line = Polyline::new(vec![
        Point2D::new(0.3, 0.2),
        Point2D::new(2.7, 3.9),
        Point2D::new(4.6, 1.35),
    ])
    .unwrap();

    // 本例折线不沿网格边走，各三角形的裁剪长度之和等于折线长度
    let clipped: f64 = mesh
        .elements_overlapping(&line.bounds())
        .iter()
        .map(|tri| line.linestring_intersection(tri.vertices()).length())
        .sum();
    assert!((clipped - line.length()).abs() < 1e-9);
}

#[test]
fn test_index_from_3d_header_uses_bottom_plane() {
    let x2 = [0.0, 1.0, 1.0, 0.0];
    let y2 = [0.0, 0.0, 1.0, 1.0];
    let x: Vec<f64> = x2.iter().chain(x2.iter()).copied().collect();
    let y: Vec<f64> = y2.iter().chain(y2.iter()).copied().collect();
    let prisms = [[0, 1, 2, 4, 5, 6], [0, 2, 3, 4, 6, 7]];
    let header = SerafinHeader::from_mesh_3d("prisms", x, y, &prisms, 2, &SerafinConfig::default()).unwrap();

    let mesh = MeshIndex::from_header(&header).unwrap();
    assert_eq!(mesh.len(), 2);
    assert_eq!(mesh.nb_nodes(), 4);
    assert!(mesh.triangle([0, 2, 3]).is_some());
}

#[test]
fn test_point_weights_serialize() {
    let (x, y, tris) = grid(2);
    let mesh = MeshIndex::new(&x, &y, &tris).unwrap();
    let weights = mesh.point_interpolators(&[Point2D::new(1.5, 0.5)]);
    let w = weights[0].unwrap();

    let json = serde_json::to_string(&w).unwrap();
    let back: PointWeights = serde_json::from_str(&json).unwrap();
    assert_eq!(back.nodes, w.nodes);

    // f = x: 节点值即 x 坐标
    assert!((w.evaluate(&x) - 1.5).abs() < 1e-12);
}
