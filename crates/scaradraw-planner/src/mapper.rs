//! Image-space to arm-space coordinate mapping
//!
//! The image is scaled uniformly so its longer side spans `workspace_size`
//! millimeters, centered on the shoulder, with the y axis flipped.

use crate::error::{ParameterError, PlannerResult};
use scaradraw_core::Point2D;

/// Default side length of the square drawing area, in millimeters
pub const DEFAULT_WORKSPACE_SIZE: f64 = 300.0;

/// Map an image-space point into arm space
///
/// `scale = workspace_size / max(w, h)`, `x' = (x - w/2) * scale`,
/// `y' = (h/2 - y) * scale`. The image center maps to `(0, 0)`.
pub fn map_to_arm_space(
    point: Point2D,
    image_width: u32,
    image_height: u32,
    workspace_size: f64,
) -> Point2D {
    let width = f64::from(image_width);
    let height = f64::from(image_height);
    let scale = workspace_size / width.max(height).max(1.0);

    Point2D::new(
        (point.x - width / 2.0) * scale,
        (height / 2.0 - point.y) * scale,
    )
}

/// Mapping for one source image, with an optional arm-space offset
///
/// The offset is applied after scaling and lets a drawing be moved away from
/// the unreachable disc around the shoulder.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateMapper {
    image_width: u32,
    image_height: u32,
    workspace_size: f64,
    offset: Point2D,
}

impl CoordinateMapper {
    /// Create a mapper for an image of the given size
    pub fn new(image_width: u32, image_height: u32, workspace_size: f64) -> PlannerResult<Self> {
        if image_width == 0 || image_height == 0 {
            return Err(ParameterError::InvalidDimensions(format!(
                "{}x{}",
                image_width, image_height
            ))
            .into());
        }
        if !workspace_size.is_finite() || workspace_size <= 0.0 {
            return Err(ParameterError::NotPositive {
                name: "workspace_size".to_string(),
                value: workspace_size,
            }
            .into());
        }

        Ok(Self {
            image_width,
            image_height,
            workspace_size,
            offset: Point2D::origin(),
        })
    }

    /// Translate every mapped point by `offset` (arm space, mm)
    pub fn with_offset(mut self, offset: Point2D) -> Self {
        self.offset = offset;
        self
    }

    /// Millimeters per pixel
    pub fn scale(&self) -> f64 {
        self.workspace_size / f64::from(self.image_width.max(self.image_height))
    }

    pub fn image_size(&self) -> (u32, u32) {
        (self.image_width, self.image_height)
    }

    /// Map an image-space point into arm space
    pub fn map(&self, point: Point2D) -> Point2D {
        let mapped = map_to_arm_space(
            point,
            self.image_width,
            self.image_height,
            self.workspace_size,
        );
        Point2D::new(mapped.x + self.offset.x, mapped.y + self.offset.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_center_maps_to_origin() {
        let p = map_to_arm_space(Point2D::new(200.0, 200.0), 400, 400, 300.0);
        assert_eq!(p, Point2D::new(0.0, 0.0));

        let p = map_to_arm_space(Point2D::new(320.0, 240.0), 640, 480, 300.0);
        assert_eq!(p.x, 0.0);
        assert_eq!(p.y, 0.0);
    }

    #[test]
    fn test_corners_and_axis_flip() {
        // 400px image in a 300mm workspace: 0.75 mm/px
        let top_left = map_to_arm_space(Point2D::new(0.0, 0.0), 400, 400, 300.0);
        assert_eq!(top_left, Point2D::new(-150.0, 150.0));

        let bottom_right = map_to_arm_space(Point2D::new(400.0, 400.0), 400, 400, 300.0);
        assert_eq!(bottom_right, Point2D::new(150.0, -150.0));
    }

    #[test]
    fn test_longer_side_sets_scale() {
        let mapper = CoordinateMapper::new(600, 300, 300.0).unwrap();
        assert_eq!(mapper.scale(), 0.5);
        assert_eq!(mapper.map(Point2D::new(600.0, 150.0)), Point2D::new(150.0, 0.0));
    }

    #[test]
    fn test_offset_applied_after_scaling() {
        let mapper = CoordinateMapper::new(400, 400, 300.0)
            .unwrap()
            .with_offset(Point2D::new(0.0, 100.0));
        assert_eq!(mapper.map(Point2D::new(200.0, 200.0)), Point2D::new(0.0, 100.0));
    }

    #[test]
    fn test_invalid_mapper_parameters() {
        assert!(CoordinateMapper::new(0, 400, 300.0).is_err());
        assert!(CoordinateMapper::new(400, 400, 0.0).is_err());
        assert!(CoordinateMapper::new(400, 400, f64::NAN).is_err());
    }
}
