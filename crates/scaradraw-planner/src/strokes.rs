//! Stroke builder: contours to an ordered pen/move command stream
//!
//! Each accepted contour becomes one stroke: `PenDown` followed by one `Move`
//! per vertex, with a `PenUp` between consecutive strokes. The tool starts
//! lifted, so the first stroke needs no leading `PenUp`.

use crate::contours::Contour;
use scaradraw_core::{PenState, Point2D};
use std::fmt;

/// Default minimum closed perimeter for a contour to be drawn, in pixels
pub const DEFAULT_MIN_PERIMETER: f64 = 20.0;

/// Default upper bound on the number of moves after optimization
pub const DEFAULT_MAX_POINTS: usize = 200;

/// One entry of the planned command stream (image space)
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathCommand {
    /// Move the tool to a vertex
    Move(Point2D),
    /// Lift the tool
    PenUp,
    /// Lower the tool
    PenDown,
}

impl PathCommand {
    /// The target point, for `Move` commands
    pub fn point(&self) -> Option<Point2D> {
        match self {
            PathCommand::Move(p) => Some(*p),
            _ => None,
        }
    }
}

impl fmt::Display for PathCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathCommand::Move(p) => write!(f, "MOVE {}", p),
            PathCommand::PenUp => write!(f, "PEN_UP"),
            PathCommand::PenDown => write!(f, "PEN_DOWN"),
        }
    }
}

/// Builds the command stream from ordered contours
#[derive(Debug, Clone, Copy)]
pub struct StrokeBuilder {
    min_perimeter: f64,
}

impl Default for StrokeBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_PERIMETER)
    }
}

impl StrokeBuilder {
    pub fn new(min_perimeter: f64) -> Self {
        Self { min_perimeter }
    }

    pub fn min_perimeter(&self) -> f64 {
        self.min_perimeter
    }

    /// Turn contours into `{PenDown, Move..}` strokes separated by `PenUp`
    ///
    /// Contours whose closed perimeter is below the threshold, and empty
    /// contours, are skipped without touching pen state.
    pub fn build(&self, contours: &[Contour]) -> Vec<PathCommand> {
        let mut commands = Vec::new();
        let mut accepted = 0usize;

        for (i, contour) in contours.iter().enumerate() {
            if contour.is_empty() || contour.perimeter() < self.min_perimeter {
                tracing::trace!(
                    "Skipping contour {} (perimeter {:.1} < {})",
                    i,
                    contour.perimeter(),
                    self.min_perimeter
                );
                continue;
            }

            if accepted > 0 {
                commands.push(PathCommand::PenUp);
            }
            commands.push(PathCommand::PenDown);
            commands.extend(contour.points.iter().copied().map(PathCommand::Move));
            accepted += 1;
        }

        tracing::debug!(
            "Built {} strokes from {} contours ({} commands)",
            accepted,
            contours.len(),
            commands.len()
        );
        commands
    }
}

/// Evenly spaced indices into `0..n`, at most `max_points` of them
///
/// `round(linspace(0, n - 1, max_points))`. When `n <= max_points` every index
/// is returned. Indices are strictly increasing.
pub fn resample_indices(n: usize, max_points: usize) -> Vec<usize> {
    if n <= max_points {
        return (0..n).collect();
    }
    match max_points {
        0 => Vec::new(),
        1 => vec![0],
        m => {
            let step = (n - 1) as f64 / (m - 1) as f64;
            (0..m)
                .map(|i| ((i as f64 * step).round() as usize).min(n - 1))
                .collect()
        }
    }
}

/// Reduce the number of `Move`s to at most `max_points`
///
/// The moves are flattened in order, resampled with [`resample_indices`] and
/// the pen commands rebuilt around the survivors: a stroke boundary between
/// two kept moves is preserved, but a stroke whose vertices were all dropped
/// disappears, and the kept vertices of a stroke are joined directly.
pub fn optimize_path(commands: &[PathCommand], max_points: usize) -> Vec<PathCommand> {
    // (point, pen, stroke number)
    let mut moves: Vec<(Point2D, PenState, usize)> = Vec::new();
    let mut pen = PenState::Up;
    let mut stroke = 0usize;
    for command in commands {
        match command {
            PathCommand::PenDown => {
                pen = PenState::Down;
                stroke += 1;
            }
            PathCommand::PenUp => pen = PenState::Up,
            PathCommand::Move(p) => moves.push((*p, pen, stroke)),
        }
    }

    if moves.len() <= max_points {
        return commands.to_vec();
    }

    let mut optimized = Vec::with_capacity(max_points + max_points / 4);
    let mut current: Option<(PenState, usize)> = None;
    for index in resample_indices(moves.len(), max_points) {
        let (point, pen, stroke) = moves[index];
        let previous_pen = current.map_or(PenState::Up, |(pen, _)| pen);
        let same_stroke = current == Some((pen, stroke));

        if !same_stroke {
            match pen {
                PenState::Down => {
                    if previous_pen.is_down() {
                        optimized.push(PathCommand::PenUp);
                    }
                    optimized.push(PathCommand::PenDown);
                }
                PenState::Up => {
                    if previous_pen.is_down() {
                        optimized.push(PathCommand::PenUp);
                    }
                }
            }
            current = Some((pen, stroke));
        }
        optimized.push(PathCommand::Move(point));
    }

    tracing::debug!(
        "Optimized path from {} to {} moves",
        moves.len(),
        max_points
    );
    optimized
}

/// Count the `Move`s in a command stream
pub fn move_count(commands: &[PathCommand]) -> usize {
    commands
        .iter()
        .filter(|c| matches!(c, PathCommand::Move(_)))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn polygon(n: usize, radius: f64, cx: f64, cy: f64) -> Contour {
        let points = (0..n)
            .map(|i| {
                let a = i as f64 / n as f64 * std::f64::consts::TAU;
                Point2D::new(cx + radius * a.cos(), cy + radius * a.sin())
            })
            .collect();
        Contour::new(points)
    }

    fn count(commands: &[PathCommand], wanted: PathCommand) -> usize {
        commands
            .iter()
            .filter(|c| std::mem::discriminant(*c) == std::mem::discriminant(&wanted))
            .count()
    }

    #[test]
    fn test_two_contours_make_two_strokes() {
        let contours = vec![polygon(5, 50.0, 100.0, 100.0), polygon(8, 40.0, 250.0, 250.0)];
        let commands = StrokeBuilder::default().build(&contours);

        assert_eq!(count(&commands, PathCommand::PenUp), 1);
        assert_eq!(count(&commands, PathCommand::PenDown), 2);
        assert_eq!(move_count(&commands), 13);
        assert_eq!(commands[0], PathCommand::PenDown);
        assert_eq!(commands[6], PathCommand::PenUp);
        assert_eq!(commands[7], PathCommand::PenDown);
    }

    #[test]
    fn test_small_contours_do_not_affect_pen_state() {
        let contours = vec![
            polygon(4, 1.0, 10.0, 10.0),
            polygon(6, 30.0, 100.0, 100.0),
            Contour::default(),
        ];
        let commands = StrokeBuilder::default().build(&contours);

        // The tiny first contour is skipped, so no leading PenUp appears
        assert_eq!(commands[0], PathCommand::PenDown);
        assert_eq!(count(&commands, PathCommand::PenUp), 0);
        assert_eq!(move_count(&commands), 6);
    }

    #[test]
    fn test_perimeter_at_threshold_is_drawn() {
        let square = Contour::from(vec![(10.0, 10.0), (15.0, 10.0), (15.0, 15.0), (10.0, 15.0)]);
        assert_eq!(square.perimeter(), 20.0);

        let commands = StrokeBuilder::new(20.0).build(&[square.clone()]);
        assert_eq!(commands[0], PathCommand::PenDown);
        assert_eq!(move_count(&commands), 4);

        let commands = StrokeBuilder::new(20.000001).build(&[square]);
        assert!(commands.is_empty());
    }

    #[test]
    fn test_resample_indices() {
        assert_eq!(resample_indices(5, 10), vec![0, 1, 2, 3, 4]);
        assert_eq!(resample_indices(10, 4), vec![0, 3, 6, 9]);
        assert_eq!(resample_indices(7, 1), vec![0]);
        assert!(resample_indices(7, 0).is_empty());
    }

    #[test]
    fn test_optimize_keeps_short_paths() {
        let commands = StrokeBuilder::default().build(&[polygon(5, 50.0, 100.0, 100.0)]);
        assert_eq!(optimize_path(&commands, 200), commands);
    }

    #[test]
    fn test_optimize_preserves_stroke_boundaries() {
        let contours = vec![polygon(100, 50.0, 100.0, 100.0), polygon(100, 50.0, 300.0, 100.0)];
        let commands = StrokeBuilder::default().build(&contours);
        let optimized = optimize_path(&commands, 20);

        assert_eq!(move_count(&optimized), 20);
        assert_eq!(optimized[0], PathCommand::PenDown);
        assert_eq!(count(&optimized, PathCommand::PenDown), 2);
        assert_eq!(count(&optimized, PathCommand::PenUp), 1);
    }

    proptest! {
        #[test]
        fn prop_optimize_selects_exactly_max_points_in_order(
            n in 2usize..600,
            max_points in 1usize..300,
        ) {
            prop_assume!(max_points < n);
            let points: Vec<Point2D> = (0..n).map(|i| Point2D::new(i as f64, 0.0)).collect();
            let mut commands = vec![PathCommand::PenDown];
            commands.extend(points.iter().copied().map(PathCommand::Move));

            let optimized = optimize_path(&commands, max_points);
            let xs: Vec<f64> = optimized.iter().filter_map(PathCommand::point).map(|p| p.x).collect();

            prop_assert_eq!(xs.len(), max_points);
            prop_assert_eq!(xs[0], 0.0);
            prop_assert!(xs.windows(2).all(|w| w[0] < w[1]));
            if max_points > 1 {
                prop_assert_eq!(xs[max_points - 1], (n - 1) as f64);
            }
        }
    }
}
