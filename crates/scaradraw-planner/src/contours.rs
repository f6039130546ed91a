//! Contour input produced by the external vision step
//!
//! A contour is an already simplified, ordered vertex list in image space.
//! Contours arrive pre-sorted by descending area; the planner keeps that order.
//!
//! JSON form:
//!
//! ```json
//! {
//!   "image_width": 400,
//!   "image_height": 400,
//!   "contours": [ { "points": [[10, 10], [50, 10], [50, 50]] } ]
//! }
//! ```

use crate::error::{ParameterError, PlannerError, PlannerResult};
use scaradraw_core::Point2D;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One traced contour in image space
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Contour {
    /// Ordered vertices, `[x, y]` pairs on the wire
    #[serde(with = "point_pairs")]
    pub points: Vec<Point2D>,
}

impl Contour {
    /// Create a contour from its vertices
    pub fn new(points: Vec<Point2D>) -> Self {
        Self { points }
    }

    /// Number of vertices
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Check if the contour has no vertices
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Perimeter of the closed polygon, including the closing edge
    pub fn perimeter(&self) -> f64 {
        match self.points.len() {
            0 | 1 => 0.0,
            n => {
                let open: f64 = self
                    .points
                    .windows(2)
                    .map(|pair| pair[0].distance_to(&pair[1]))
                    .sum();
                open + self.points[n - 1].distance_to(&self.points[0])
            }
        }
    }
}

impl From<Vec<(f64, f64)>> for Contour {
    fn from(points: Vec<(f64, f64)>) -> Self {
        Self::new(points.into_iter().map(Point2D::from).collect())
    }
}

/// The full output of the vision step for one image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContourSet {
    /// Source image width in pixels
    pub image_width: u32,
    /// Source image height in pixels
    pub image_height: u32,
    /// Contours in drawing order
    #[serde(default)]
    pub contours: Vec<Contour>,
}

impl ContourSet {
    /// Create a contour set for an image of the given size
    pub fn new(image_width: u32, image_height: u32, contours: Vec<Contour>) -> Self {
        Self {
            image_width,
            image_height,
            contours,
        }
    }

    /// Parse a contour set from JSON text
    pub fn from_json(json: &str) -> PlannerResult<Self> {
        let set: ContourSet = serde_json::from_str(json)?;
        set.validate()?;
        Ok(set)
    }

    /// Load a contour set from a JSON file
    pub fn load(path: impl AsRef<Path>) -> PlannerResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            PlannerError::LoadError(format!("{}: {}", path.display(), e))
        })?;
        let set = Self::from_json(&content)?;
        tracing::debug!(
            "Loaded {} contours ({}x{}) from {}",
            set.contours.len(),
            set.image_width,
            set.image_height,
            path.display()
        );
        Ok(set)
    }

    /// Total number of vertices across all contours
    pub fn vertex_count(&self) -> usize {
        self.contours.iter().map(Contour::len).sum()
    }

    /// Reject zero-sized images and non-finite vertices
    pub fn validate(&self) -> PlannerResult<()> {
        if self.image_width == 0 || self.image_height == 0 {
            return Err(ParameterError::InvalidDimensions(format!(
                "image must be at least 1x1 pixels, got {}x{}",
                self.image_width, self.image_height
            ))
            .into());
        }

        for (i, contour) in self.contours.iter().enumerate() {
            if let Some(p) = contour
                .points
                .iter()
                .find(|p| !p.x.is_finite() || !p.y.is_finite())
            {
                return Err(ParameterError::InvalidValue {
                    name: format!("contours[{}]", i),
                    reason: format!("non-finite vertex {:?}", p),
                }
                .into());
            }
        }

        Ok(())
    }
}

mod point_pairs {
    use scaradraw_core::Point2D;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(points: &[Point2D], serializer: S) -> Result<S::Ok, S::Error> {
        let pairs: Vec<[f64; 2]> = points.iter().map(|p| [p.x, p.y]).collect();
        pairs.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Point2D>, D::Error> {
        let pairs = Vec::<[f64; 2]>::deserialize(deserializer)?;
        Ok(pairs.into_iter().map(Point2D::from).collect())
    }
}
