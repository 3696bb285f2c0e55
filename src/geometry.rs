//! Geometry helpers shared by the store and its consumers.

use crate::model::Position;

/// Arithmetic-mean centroid of a coordinate list.
///
/// A single coordinate is returned verbatim. The centroid carries a `z`
/// component only when every input coordinate does.
pub fn simple_centroid(coordinates: &[Position]) -> Position {
    if coordinates.len() == 1 {
        return coordinates[0];
    }
    if coordinates.is_empty() {
        return Position::new(0.0, 0.0);
    }

    let mut sum_x = 0.0;
    let mut sum_y = 0.0;
    let mut sum_z = 0.0;
    let mut has_z = true;
    for position in coordinates {
        sum_x += position.x;
        sum_y += position.y;
        match position.z {
            Some(z) => sum_z += z,
            None => has_z = false,
        }
    }

    let count = coordinates.len() as f64;
    let mut centroid = Position::new(sum_x / count, sum_y / count);
    if has_z {
        centroid.z = Some(sum_z / count);
    }
    centroid
}

/// Euclidean distance between two positions in the image plane.
pub fn point_distance(a: Position, b: Position) -> f64 {
    let dx = a.x - b.x;
    let dy = a.y - b.y;
    (dx * dx + dy * dy).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_coordinate_is_returned_verbatim() {
        let position = Position::with_z(3.0, 4.0, 5.0);
        assert_eq!(simple_centroid(&[position]), position);
    }

    #[test]
    fn test_centroid_is_component_mean() {
        let centroid = simple_centroid(&[
            Position::new(0.0, 0.0),
            Position::new(10.0, 0.0),
            Position::new(10.0, 30.0),
            Position::new(0.0, 30.0),
        ]);
        assert_eq!(centroid, Position::new(5.0, 15.0));
    }

    #[test]
    fn test_centroid_carries_z_only_when_all_coordinates_do() {
        let with_z = simple_centroid(&[Position::with_z(0.0, 0.0, 2.0), Position::with_z(2.0, 2.0, 4.0)]);
        assert_eq!(with_z.z, Some(3.0));

        let mixed = simple_centroid(&[Position::with_z(0.0, 0.0, 2.0), Position::new(2.0, 2.0)]);
        assert_eq!(mixed.z, None);
    }

    #[test]
    fn test_point_distance() {
        let distance = point_distance(Position::new(0.0, 0.0), Position::new(3.0, 4.0));
        assert!((distance - 5.0).abs() < 1e-9);
    }
}
