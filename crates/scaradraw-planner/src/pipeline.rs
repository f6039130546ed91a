//! One-call planning: contours -> strokes -> optimize -> compile

use crate::compiler::{CompiledTrajectory, TrajectoryCompiler, DEFAULT_TRAVEL_THRESHOLD};
use crate::contours::ContourSet;
use crate::error::{ParameterError, PlannerResult};
use crate::export::export_trajectory;
use crate::mapper::DEFAULT_WORKSPACE_SIZE;
use crate::strokes::{optimize_path, StrokeBuilder, DEFAULT_MAX_POINTS, DEFAULT_MIN_PERIMETER};
use scaradraw_core::{AppEvent, ArmGeometry, EventBus, Point2D, TrajectoryEvent};
use std::path::Path;
use std::sync::Arc;

/// Planner parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlannerSettings {
    /// Side of the square drawing area (mm)
    pub workspace_size: f64,
    /// Minimum closed contour perimeter (px)
    pub min_perimeter: f64,
    /// Upper bound on moves after optimization
    pub max_points: usize,
    /// Jump treated as travel for raw point lists (px)
    pub travel_threshold: f64,
    /// Arm-space translation applied after mapping (mm)
    pub origin_offset: Point2D,
}

impl Default for PlannerSettings {
    fn default() -> Self {
        Self {
            workspace_size: DEFAULT_WORKSPACE_SIZE,
            min_perimeter: DEFAULT_MIN_PERIMETER,
            max_points: DEFAULT_MAX_POINTS,
            travel_threshold: DEFAULT_TRAVEL_THRESHOLD,
            origin_offset: Point2D::origin(),
        }
    }
}

impl PlannerSettings {
    /// Validate the settings
    pub fn validate(&self) -> PlannerResult<()> {
        if !self.workspace_size.is_finite() || self.workspace_size <= 0.0 {
            return Err(ParameterError::NotPositive {
                name: "workspace_size".to_string(),
                value: self.workspace_size,
            }
            .into());
        }
        if self.max_points == 0 {
            return Err(ParameterError::InvalidValue {
                name: "max_points".to_string(),
                reason: "must be at least 1".to_string(),
            }
            .into());
        }
        for (name, value) in [
            ("min_perimeter", self.min_perimeter),
            ("travel_threshold", self.travel_threshold),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ParameterError::InvalidValue {
                    name: name.to_string(),
                    reason: format!("must be a non-negative distance, got {}", value),
                }
                .into());
            }
        }
        Ok(())
    }
}

/// Runs the whole planning chain for one arm
#[derive(Debug, Clone)]
pub struct DrawingPipeline {
    settings: PlannerSettings,
    compiler: TrajectoryCompiler,
    events: Option<Arc<EventBus>>,
}

impl DrawingPipeline {
    /// Create a pipeline, rejecting invalid settings
    pub fn new(geometry: ArmGeometry, settings: PlannerSettings) -> PlannerResult<Self> {
        settings.validate()?;
        let compiler = TrajectoryCompiler::new(geometry, settings.workspace_size)
            .with_origin_offset(settings.origin_offset)
            .with_travel_threshold(settings.travel_threshold);

        Ok(Self {
            settings,
            compiler,
            events: None,
        })
    }

    /// Publish a `TrajectoryEvent::Compiled` for every plan
    pub fn with_events(mut self, events: Arc<EventBus>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn settings(&self) -> &PlannerSettings {
        &self.settings
    }

    pub fn geometry(&self) -> &ArmGeometry {
        self.compiler.geometry()
    }

    /// Plan a trajectory from traced contours
    pub fn plan(&self, contours: &ContourSet) -> PlannerResult<CompiledTrajectory> {
        contours.validate()?;
        let commands = StrokeBuilder::new(self.settings.min_perimeter).build(&contours.contours);
        let commands = optimize_path(&commands, self.settings.max_points);
        let trajectory =
            self.compiler
                .compile(&commands, contours.image_width, contours.image_height)?;
        self.announce(&trajectory);
        Ok(trajectory)
    }

    /// Plan a trajectory from a flat point list, splitting strokes on jumps
    pub fn plan_raw(
        &self,
        points: &[Point2D],
        image_width: u32,
        image_height: u32,
    ) -> PlannerResult<CompiledTrajectory> {
        let indices = crate::strokes::resample_indices(points.len(), self.settings.max_points);
        let points: Vec<Point2D> = indices.into_iter().map(|i| points[i]).collect();
        let trajectory = self
            .compiler
            .compile_raw(&points, image_width, image_height)?;
        self.announce(&trajectory);
        Ok(trajectory)
    }

    /// Write `trajectory` to `path` and publish a `TrajectoryEvent::Exported`
    pub fn export(&self, trajectory: &CompiledTrajectory, path: impl AsRef<Path>) -> PlannerResult<()> {
        let path = path.as_ref();
        export_trajectory(path, &trajectory.waypoints)?;
        if let Some(events) = &self.events {
            events.notify(AppEvent::Trajectory(TrajectoryEvent::Exported {
                path: path.display().to_string(),
                waypoints: trajectory.len(),
            }));
        }
        Ok(())
    }

    fn announce(&self, trajectory: &CompiledTrajectory) {
        if let Some(events) = &self.events {
            events.notify(AppEvent::Trajectory(TrajectoryEvent::Compiled {
                waypoints: trajectory.len(),
                strokes: trajectory.stroke_count(),
                dropped: trajectory.dropped(),
            }));
        }
    }
}
