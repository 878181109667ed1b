//! Viewport transform and coordinate mapping
//!
//! Pointer positions arrive in screen space. Measurements live in the
//! content space of the loaded page, which is independent of pan and zoom:
//!
//! `content = (screen - origin - translate) / scale`
//!
//! Pan and zoom belong to the host; it feeds each new [`PanZoom`] into the
//! [`CoordinateMapper`].

use takeoff_core::Point;

/// Pan/zoom transform as published by the pan/zoom provider
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PanZoom {
    pub scale: f64,
    pub translate_x: f64,
    pub translate_y: f64,
}

impl Default for PanZoom {
    fn default() -> Self {
        Self {
            scale: 1.0,
            translate_x: 0.0,
            translate_y: 0.0,
        }
    }
}

impl PanZoom {
    pub fn new(scale: f64, translate_x: f64, translate_y: f64) -> Self {
        Self {
            scale,
            translate_x,
            translate_y,
        }
    }
}

/// Maps screen positions to content space and back
///
/// Holds nothing but the last transform it was given and the screen
/// position of the content container.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CoordinateMapper {
    origin: Point,
    transform: PanZoom,
}

impl CoordinateMapper {
    /// Create a mapper for a container whose top-left corner is at `origin`
    pub fn new(origin: Point) -> Self {
        Self {
            origin,
            transform: PanZoom::default(),
        }
    }

    pub fn origin(&self) -> Point {
        self.origin
    }

    pub fn set_origin(&mut self, origin: Point) {
        self.origin = origin;
    }

    pub fn transform(&self) -> PanZoom {
        self.transform
    }

    /// Read the latest transform from the pan/zoom provider
    ///
    /// A non-positive or non-finite scale is ignored so mapping never divides
    /// by zero.
    pub fn set_transform(&mut self, transform: PanZoom) {
        if !transform.scale.is_finite() || transform.scale <= 0.0 {
            tracing::warn!(scale = transform.scale, "ignoring invalid zoom factor");
            return;
        }
        self.transform = transform;
    }

    /// Screen position to content space
    pub fn to_content(&self, screen: Point) -> Point {
        let t = &self.transform;
        Point::new(
            (screen.x - self.origin.x - t.translate_x) / t.scale,
            (screen.y - self.origin.y - t.translate_y) / t.scale,
        )
    }

    /// Content position to screen space
    pub fn to_screen(&self, content: Point) -> Point {
        let t = &self.transform;
        Point::new(
            content.x * t.scale + t.translate_x + self.origin.x,
            content.y * t.scale + t.translate_y + self.origin.y,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Point, b: Point) -> bool {
        (a.x - b.x).abs() < 1e-9 && (a.y - b.y).abs() < 1e-9
    }

    #[test]
    fn test_identity_mapping() {
        let mapper = CoordinateMapper::default();
        assert_eq!(mapper.to_content(Point::new(12.0, 34.0)), Point::new(12.0, 34.0));
    }

    #[test]
    fn test_mapping_with_origin_pan_and_zoom() {
        let mut mapper = CoordinateMapper::new(Point::new(10.0, 20.0));
        mapper.set_transform(PanZoom::new(2.0, 30.0, -40.0));

        let content = mapper.to_content(Point::new(140.0, 180.0));
        assert!(approx(content, Point::new(50.0, 100.0)));
        assert!(approx(mapper.to_screen(content), Point::new(140.0, 180.0)));
    }

    #[test]
    fn test_invalid_zoom_ignored() {
        let mut mapper = CoordinateMapper::default();
        mapper.set_transform(PanZoom::new(2.0, 0.0, 0.0));
        mapper.set_transform(PanZoom::new(0.0, 5.0, 5.0));
        assert_eq!(mapper.transform(), PanZoom::new(2.0, 0.0, 0.0));
    }
}
