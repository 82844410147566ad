// src/models/geometry.rs

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, ToSchema)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, ToSchema)]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vector3 {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn one() -> Self {
        Self::new(1.0, 1.0, 1.0)
    }
}

/// Área de um polígono simples pela fórmula do laço (shoelace).
/// Polígonos com menos de 3 vértices têm área 0.
pub fn polygon_area(points: &[Point2D]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let twice_area: f64 = points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(a, b)| a.x * b.y - b.x * a.y)
        .sum();
    0.5 * twice_area.abs()
}

/// Centroide dos vértices (média simples), usado para ancorar sugestões.
pub fn vertex_centroid(points: &[Point2D]) -> Option<Point2D> {
    if points.is_empty() {
        return None;
    }
    let n = points.len() as f64;
    let (sx, sy) = points
        .iter()
        .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
    Some(Point2D::new(sx / n, sy / n))
}

// Valor livre das propriedades customizadas de um móvel posicionado
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Bool(bool),
    Number(f64),
    Text(String),
    Map(BTreeMap<String, PropertyValue>),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect() -> Vec<Point2D> {
        vec![
            Point2D::new(0.0, 0.0),
            Point2D::new(4.0, 0.0),
            Point2D::new(4.0, 3.0),
            Point2D::new(0.0, 3.0),
        ]
    }

    #[test]
    fn rectangle_area_is_twelve() {
        assert_eq!(polygon_area(&rect()), 12.0);
    }

    #[test]
    fn winding_order_does_not_change_area() {
        let mut clockwise = rect();
        clockwise.reverse();
        assert_eq!(polygon_area(&clockwise), 12.0);
    }

    #[test]
    fn degenerate_polygons_have_no_area() {
        assert_eq!(polygon_area(&[]), 0.0);
        assert_eq!(
            polygon_area(&[Point2D::new(0.0, 0.0), Point2D::new(5.0, 5.0)]),
            0.0
        );
    }

    #[test]
    fn centroid_of_rectangle() {
        assert_eq!(vertex_centroid(&rect()), Some(Point2D::new(2.0, 1.5)));
        assert_eq!(vertex_centroid(&[]), None);
    }

    #[test]
    fn property_values_deserialize_by_shape() {
        let json = serde_json::json!({ "finish": "matte", "legs": 4.0, "foldable": true, "extra": { "a": 1.0 } });
        let props: BTreeMap<String, PropertyValue> = serde_json::from_value(json).unwrap();
        assert_eq!(props["finish"], PropertyValue::Text("matte".into()));
        assert_eq!(props["legs"], PropertyValue::Number(4.0));
        assert_eq!(props["foldable"], PropertyValue::Bool(true));
        assert!(matches!(props["extra"], PropertyValue::Map(_)));
    }
}
