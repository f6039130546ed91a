//! Trajectory compiler: command stream to arm-space waypoints
//!
//! Every `Move` is mapped into arm space and tested against the reachable
//! annulus. Unreachable points are dropped, never clamped, and recorded as
//! warnings against their move index.
//!
//! A waypoint's pen state describes the segment travelled *into* it. The first
//! vertex of a stroke is therefore emitted twice: once pen-up (travel to the
//! stroke start) and once pen-down (lower the tool in place). A trailing
//! pen-up waypoint at the last position lifts the tool when drawing ends.

use crate::mapper::CoordinateMapper;
use crate::strokes::PathCommand;
use scaradraw_core::{is_reachable, ArmGeometry, PenState, Point2D, Waypoint};

/// Default image-space jump, in pixels, treated as a travel move by
/// [`TrajectoryCompiler::compile_raw`]
pub const DEFAULT_TRAVEL_THRESHOLD: f64 = 10.0;

/// A point dropped during compilation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrajectoryWarning {
    /// Index of the move (or raw point) in the input
    pub index: usize,
    /// Mapped arm-space position that failed the reachability test
    pub position: Point2D,
}

/// Output of a compilation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompiledTrajectory {
    /// Waypoints in drawing order
    pub waypoints: Vec<Waypoint>,
    /// Unreachable points that were dropped
    pub warnings: Vec<TrajectoryWarning>,
}

impl CompiledTrajectory {
    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    /// Number of dropped points
    pub fn dropped(&self) -> usize {
        self.warnings.len()
    }

    /// Number of maximal runs of pen-down waypoints
    pub fn stroke_count(&self) -> usize {
        let mut strokes = 0;
        let mut previous = PenState::Up;
        for waypoint in &self.waypoints {
            if waypoint.pen.is_down() && !previous.is_down() {
                strokes += 1;
            }
            previous = waypoint.pen;
        }
        strokes
    }

    /// Number of pen state changes, starting from a lifted tool
    pub fn pen_transitions(&self) -> usize {
        let mut transitions = 0;
        let mut previous = PenState::Up;
        for waypoint in &self.waypoints {
            if waypoint.pen != previous {
                transitions += 1;
            }
            previous = waypoint.pen;
        }
        transitions
    }
}

/// Accumulates waypoints and keeps stroke entry/exit consistent
#[derive(Debug, Default)]
struct WaypointWriter {
    waypoints: Vec<Waypoint>,
}

impl WaypointWriter {
    fn travel_to(&mut self, position: Point2D) {
        self.waypoints.push(Waypoint::new(position, PenState::Up));
    }

    fn begin_stroke_at(&mut self, position: Point2D) {
        self.travel_to(position);
        self.waypoints.push(Waypoint::new(position, PenState::Down));
    }

    fn draw_to(&mut self, position: Point2D) {
        self.waypoints.push(Waypoint::new(position, PenState::Down));
    }

    fn lift(&mut self) {
        if let Some(last) = self.waypoints.last().copied() {
            if last.pen.is_down() {
                self.travel_to(last.position);
            }
        }
    }

    fn finish(mut self) -> Vec<Waypoint> {
        self.lift();
        self.waypoints
    }
}

/// Compiles image-space commands into reachable arm-space waypoints
#[derive(Debug, Clone, Copy)]
pub struct TrajectoryCompiler {
    geometry: ArmGeometry,
    workspace_size: f64,
    origin_offset: Point2D,
    travel_threshold: f64,
}

impl TrajectoryCompiler {
    /// Create a compiler for the given arm and workspace size (mm)
    pub fn new(geometry: ArmGeometry, workspace_size: f64) -> Self {
        Self {
            geometry,
            workspace_size,
            origin_offset: Point2D::origin(),
            travel_threshold: DEFAULT_TRAVEL_THRESHOLD,
        }
    }

    /// Translate the drawing in arm space after mapping
    pub fn with_origin_offset(mut self, offset: Point2D) -> Self {
        self.origin_offset = offset;
        self
    }

    /// Jump distance (pixels) that [`compile_raw`](Self::compile_raw) treats as travel
    pub fn with_travel_threshold(mut self, threshold: f64) -> Self {
        self.travel_threshold = threshold;
        self
    }

    pub fn geometry(&self) -> &ArmGeometry {
        &self.geometry
    }

    fn mapper(&self, image_width: u32, image_height: u32) -> crate::PlannerResult<CoordinateMapper> {
        Ok(CoordinateMapper::new(image_width, image_height, self.workspace_size)?
            .with_offset(self.origin_offset))
    }

    fn reject(&self, warnings: &mut Vec<TrajectoryWarning>, index: usize, position: Point2D) {
        tracing::warn!(
            "Dropping unreachable point {} at {} ({:.1}mm from shoulder, reach {:.1}..{:.1}mm)",
            index,
            position,
            position.magnitude(),
            self.geometry.min_reach(),
            self.geometry.max_reach()
        );
        warnings.push(TrajectoryWarning { index, position });
    }

    /// Compile a pen/move command stream
    ///
    /// Pen commands set the pen state for the moves that follow; the tool
    /// starts lifted. Warning indices count `Move` commands only.
    pub fn compile(
        &self,
        commands: &[PathCommand],
        image_width: u32,
        image_height: u32,
    ) -> crate::PlannerResult<CompiledTrajectory> {
        let mapper = self.mapper(image_width, image_height)?;
        let mut writer = WaypointWriter::default();
        let mut warnings = Vec::new();
        let mut pen = PenState::Up;
        let mut in_stroke = false;
        let mut move_index = 0usize;

        for command in commands {
            match command {
                PathCommand::PenDown => {
                    pen = PenState::Down;
                    in_stroke = false;
                }
                PathCommand::PenUp => {
                    pen = PenState::Up;
                    in_stroke = false;
                    writer.lift();
                }
                PathCommand::Move(point) => {
                    let index = move_index;
                    move_index += 1;

                    let position = mapper.map(*point);
                    if !is_reachable(position.x, position.y, &self.geometry) {
                        self.reject(&mut warnings, index, position);
                        continue;
                    }

                    match pen {
                        PenState::Up => writer.travel_to(position),
                        PenState::Down if !in_stroke => {
                            writer.begin_stroke_at(position);
                            in_stroke = true;
                        }
                        PenState::Down => writer.draw_to(position),
                    }
                }
            }
        }

        let trajectory = CompiledTrajectory {
            waypoints: writer.finish(),
            warnings,
        };
        tracing::info!(
            "Compiled {} moves into {} waypoints ({} strokes, {} dropped)",
            move_index,
            trajectory.len(),
            trajectory.stroke_count(),
            trajectory.dropped()
        );
        Ok(trajectory)
    }

    /// Compile a raw point list that carries no pen commands
    ///
    /// A jump longer than the travel threshold between consecutive raw points
    /// (measured in image space) is treated as a pen-up travel. This is a
    /// heuristic: a genuine long straight edge is also lifted.
    pub fn compile_raw(
        &self,
        points: &[Point2D],
        image_width: u32,
        image_height: u32,
    ) -> crate::PlannerResult<CompiledTrajectory> {
        let mapper = self.mapper(image_width, image_height)?;
        let mut writer = WaypointWriter::default();
        let mut warnings = Vec::new();
        let mut previous: Option<Point2D> = None;
        let mut in_stroke = false;

        for (index, point) in points.iter().enumerate() {
            let jump = previous.is_none_or(|p| p.distance_to(point) > self.travel_threshold);
            previous = Some(*point);
            if jump {
                in_stroke = false;
            }

            let position = mapper.map(*point);
            if !is_reachable(position.x, position.y, &self.geometry) {
                self.reject(&mut warnings, index, position);
                continue;
            }

            if in_stroke {
                writer.draw_to(position);
            } else {
                writer.lift();
                writer.begin_stroke_at(position);
                in_stroke = true;
            }
        }

        Ok(CompiledTrajectory {
            waypoints: writer.finish(),
            warnings,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compiler() -> TrajectoryCompiler {
        TrajectoryCompiler::new(ArmGeometry::default(), 300.0)
    }

    #[test]
    fn test_unreachable_move_dropped_with_one_warning() {
        // 400px image at 0.75 mm/px: (-200, 200) lands 300mm from the shoulder
        let commands = vec![
            PathCommand::PenDown,
            PathCommand::Move(Point2D::new(200.0, 100.0)),
            PathCommand::Move(Point2D::new(-200.0, 200.0)),
            PathCommand::Move(Point2D::new(300.0, 100.0)),
        ];
        let trajectory = compiler().compile(&commands, 400, 400).unwrap();

        assert_eq!(trajectory.dropped(), 1);
        assert_eq!(trajectory.warnings[0].index, 1);
        assert_eq!(trajectory.warnings[0].position, Point2D::new(-300.0, 0.0));
        assert!(trajectory
            .waypoints
            .iter()
            .all(|w| w.position.magnitude() <= 260.0));
    }

    #[test]
    fn test_stroke_entry_and_exit() {
        let commands = vec![
            PathCommand::PenDown,
            PathCommand::Move(Point2D::new(200.0, 100.0)),
            PathCommand::Move(Point2D::new(300.0, 100.0)),
            PathCommand::PenUp,
            PathCommand::PenDown,
            PathCommand::Move(Point2D::new(100.0, 300.0)),
            PathCommand::Move(Point2D::new(100.0, 250.0)),
        ];
        let trajectory = compiler().compile(&commands, 400, 400).unwrap();
        let pens: Vec<PenState> = trajectory.waypoints.iter().map(|w| w.pen).collect();

        use PenState::{Down, Up};
        assert_eq!(pens, vec![Up, Down, Down, Up, Up, Down, Down, Up]);
        assert_eq!(trajectory.waypoints[0].position, Point2D::new(0.0, 75.0));
        assert_eq!(trajectory.stroke_count(), 2);
        assert_eq!(trajectory.pen_transitions(), 4);
    }

    #[test]
    fn test_every_down_waypoint_is_reachable() {
        let commands: Vec<PathCommand> = std::iter::once(PathCommand::PenDown)
            .chain((0..=40).map(|i| PathCommand::Move(Point2D::new(i as f64 * 10.0, 200.0))))
            .collect();
        let trajectory = compiler().compile(&commands, 400, 400).unwrap();
        let geometry = ArmGeometry::default();

        assert!(trajectory.dropped() > 0);
        for waypoint in trajectory.waypoints.iter().filter(|w| w.pen.is_down()) {
            assert!(is_reachable(waypoint.position.x, waypoint.position.y, &geometry));
        }
    }

    #[test]
    fn test_raw_points_split_on_jumps() {
        let points = vec![
            Point2D::new(100.0, 100.0),
            Point2D::new(105.0, 100.0),
            Point2D::new(110.0, 100.0),
            Point2D::new(300.0, 100.0),
            Point2D::new(305.0, 100.0),
        ];
        let trajectory = compiler().compile_raw(&points, 400, 400).unwrap();
        let pens: Vec<PenState> = trajectory.waypoints.iter().map(|w| w.pen).collect();

        use PenState::{Down, Up};
        assert_eq!(
            pens,
            vec![Up, Down, Down, Down, Up, Up, Down, Down, Up]
        );
        assert_eq!(trajectory.stroke_count(), 2);
        assert_eq!(trajectory.waypoints.last().map(|w| w.pen), Some(Up));
    }

    #[test]
    fn test_empty_input() {
        let trajectory = compiler().compile(&[], 400, 400).unwrap();
        assert!(trajectory.is_empty());
        assert_eq!(trajectory.stroke_count(), 0);
    }

    #[test]
    fn test_zero_image_rejected() {
        assert!(compiler().compile(&[], 0, 400).is_err());
    }
}
