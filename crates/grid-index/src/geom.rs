//! Exact geometry predicates applied after R-tree envelope pruning.
//!
//! The index only answers two query shapes: a rectangle built from a tile's
//! bounding box, and a single point. Envelope pruning can report bbox-only
//! false positives; these predicates filter them out.

use mosaic_common::BoundingBox;

/// Ray-casting point-in-polygon test over an exterior ring.
///
/// Points on an edge count as inside; the grid is a partition and a
/// boundary point must resolve to at least one cell.
pub fn point_in_polygon(x: f64, y: f64, polygon: &[(f64, f64)]) -> bool {
    let n = polygon.len();
    if n < 3 {
        return false;
    }

    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let (xi, yi) = polygon[i];
        let (xj, yj) = polygon[j];

        if point_on_segment(x, y, (xi, yi), (xj, yj)) {
            return true;
        }

        if (yi > y) != (yj > y) {
            let x_cross = (xj - xi) * (y - yi) / (yj - yi) + xi;
            if x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Whether a polygon intersects an axis-aligned rectangle.
pub fn polygon_intersects_rect(polygon: &[(f64, f64)], rect: &BoundingBox) -> bool {
    // Any polygon vertex inside the rectangle.
    if polygon.iter().any(|&(x, y)| rect.contains_point(x, y)) {
        return true;
    }

    // Any rectangle corner inside the polygon (rectangle fully contained).
    let corners = [
        (rect.min_x, rect.min_y),
        (rect.max_x, rect.min_y),
        (rect.max_x, rect.max_y),
        (rect.min_x, rect.max_y),
    ];
    if corners.iter().any(|&(x, y)| point_in_polygon(x, y, polygon)) {
        return true;
    }

    // Any polygon edge crossing a rectangle edge.
    let n = polygon.len();
    for i in 0..n {
        let a = polygon[i];
        let b = polygon[(i + 1) % n];
        for k in 0..4 {
            let c = corners[k];
            let d = corners[(k + 1) % 4];
            if segments_intersect(a, b, c, d) {
                return true;
            }
        }
    }

    false
}

/// Segment intersection including collinear overlap and shared endpoints.
fn segments_intersect(a: (f64, f64), b: (f64, f64), c: (f64, f64), d: (f64, f64)) -> bool {
    let d1 = cross(c, d, a);
    let d2 = cross(c, d, b);
    let d3 = cross(a, b, c);
    let d4 = cross(a, b, d);

    if ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
    {
        return true;
    }

    (d1 == 0.0 && point_on_segment(a.0, a.1, c, d))
        || (d2 == 0.0 && point_on_segment(b.0, b.1, c, d))
        || (d3 == 0.0 && point_on_segment(c.0, c.1, a, b))
        || (d4 == 0.0 && point_on_segment(d.0, d.1, a, b))
}

fn cross(o: (f64, f64), a: (f64, f64), b: (f64, f64)) -> f64 {
    (a.0 - o.0) * (b.1 - o.1) - (a.1 - o.1) * (b.0 - o.0)
}

fn point_on_segment(x: f64, y: f64, a: (f64, f64), b: (f64, f64)) -> bool {
    cross(a, b, (x, y)) == 0.0
        && x >= a.0.min(b.0)
        && x <= a.0.max(b.0)
        && y >= a.1.min(b.1)
        && y <= a.1.max(b.1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Vec<(f64, f64)> {
        vec![(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)]
    }

    #[test]
    fn test_point_in_polygon() {
        let poly = square();
        assert!(point_in_polygon(5.0, 5.0, &poly));
        assert!(!point_in_polygon(15.0, 5.0, &poly));
        assert!(!point_in_polygon(-1.0, -1.0, &poly));
        // Boundary counts as inside.
        assert!(point_in_polygon(0.0, 5.0, &poly));
        assert!(point_in_polygon(10.0, 10.0, &poly));
    }

    #[test]
    fn test_point_in_triangle() {
        let tri = vec![(0.0, 0.0), (10.0, 0.0), (5.0, 10.0)];
        assert!(point_in_polygon(5.0, 3.0, &tri));
        assert!(!point_in_polygon(1.0, 9.0, &tri));
    }

    #[test]
    fn test_rect_overlapping_polygon() {
        let poly = square();
        assert!(polygon_intersects_rect(
            &poly,
            &BoundingBox::new(5.0, 5.0, 15.0, 15.0)
        ));
        assert!(!polygon_intersects_rect(
            &poly,
            &BoundingBox::new(11.0, 11.0, 20.0, 20.0)
        ));
    }

    #[test]
    fn test_rect_inside_polygon() {
        // No polygon vertex is inside the rectangle and no edges cross;
        // only the corner-in-polygon check catches full containment.
        let poly = square();
        assert!(polygon_intersects_rect(
            &poly,
            &BoundingBox::new(4.0, 4.0, 6.0, 6.0)
        ));
    }

    #[test]
    fn test_polygon_inside_rect() {
        let poly = square();
        assert!(polygon_intersects_rect(
            &poly,
            &BoundingBox::new(-5.0, -5.0, 15.0, 15.0)
        ));
    }

    #[test]
    fn test_edge_crossing_without_contained_vertices() {
        // A tall thin rectangle crossing the middle of the square: edges
        // intersect but neither contains the other's corners.
        let poly = square();
        assert!(polygon_intersects_rect(
            &poly,
            &BoundingBox::new(4.0, -5.0, 6.0, 15.0)
        ));
    }

    #[test]
    fn test_diagonal_polygon_bbox_false_positive() {
        // A triangle whose bbox overlaps the rectangle while the shape
        // itself does not.
        let tri = vec![(0.0, 0.0), (10.0, 0.0), (0.0, 10.0)];
        let rect = BoundingBox::new(8.0, 8.0, 9.5, 9.5);
        assert!(!polygon_intersects_rect(&tri, &rect));
    }
}
