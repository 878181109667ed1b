//! Pure geometry in content coordinate space
//!
//! Content space is the fixed pixel grid of the loaded image or page:
//! - Origin (0, 0) at the top-left of the raster
//! - X increases to the right, Y increases downward
//! - Units are content pixels, independent of pan/zoom

/// A point in content coordinate space
#[derive(Debug, Clone, Copy, PartialEq, Default, serde::Serialize, serde::Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    /// Create a new point
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point
    pub fn distance_to(&self, other: &Point) -> f64 {
        distance_between(self, other)
    }

    /// Midpoint between two points
    pub fn midpoint(&self, other: &Point) -> Point {
        Point::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }
}

/// Euclidean distance in content pixels
pub fn distance_between(p1: &Point, p2: &Point) -> f64 {
    let dx = p1.x - p2.x;
    let dy = p1.y - p2.y;
    (dx * dx + dy * dy).sqrt()
}

/// Polygon area in square content pixels (shoelace formula)
///
/// The ring wraps implicitly from the last point to the first, so a closing
/// duplicate contributes nothing. Fewer than three points yield zero.
pub fn polygon_area(points: &[Point]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }

    let mut area = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        area += points[i].x * points[j].y;
        area -= points[j].x * points[i].y;
    }
    (area / 2.0).abs()
}

/// Whether two points lie strictly closer than `threshold`
pub fn is_point_close(p1: &Point, p2: &Point, threshold: f64) -> bool {
    distance_between(p1, p2) < threshold
}

/// Whether `point` lies within `tolerance` of the segment `start..end`
pub fn point_near_segment(point: &Point, start: &Point, end: &Point, tolerance: f64) -> bool {
    let dx = end.x - start.x;
    let dy = end.y - start.y;
    let length_sq = dx * dx + dy * dy;

    if length_sq < 1e-12 {
        return point.distance_to(start) <= tolerance;
    }

    // Project onto the segment
    let t = (((point.x - start.x) * dx + (point.y - start.y) * dy) / length_sq).clamp(0.0, 1.0);

    let closest = Point::new(start.x + t * dx, start.y + t * dy);
    point.distance_to(&closest) <= tolerance
}

/// Average of segment midpoints along a path
///
/// Used as the anchor for measurement labels. A single point is its own
/// anchor; an empty path anchors at the origin.
pub fn path_center(points: &[Point]) -> Point {
    match points.len() {
        0 => Point::default(),
        1 => points[0],
        n => {
            let (sum_x, sum_y) = points
                .windows(2)
                .map(|w| w[0].midpoint(&w[1]))
                .fold((0.0, 0.0), |(sx, sy), m| (sx + m.x, sy + m.y));
            let segments = (n - 1) as f64;
            Point::new(sum_x / segments, sum_y / segments)
        }
    }
}
