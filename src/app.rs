//! Command handlers behind the `scaradraw` binary
//!
//! Each handler returns `anyhow::Result` so failures reach the terminal with
//! the context of what was being attempted.

use anyhow::Context;
use scaradraw_communication::{
    connect_shared, disconnect_shared, list_ports, shared_sink, SerialSink, SharedSink,
    SimulatedSink,
};
use scaradraw_core::{
    AppEvent, ErrorEvent, EventBus, EventCategory, EventFilter, MotionEvent, SequencerState,
    Waypoint,
};
use scaradraw_motion::{MotionSequencer, RunReport, SequencerHandle};
use scaradraw_planner::{CompiledTrajectory, ContourSet, DrawingPipeline};
use scaradraw_settings::Config;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;

/// Progress is logged every this many waypoints
const PROGRESS_LOG_INTERVAL: usize = 25;

/// How long to wait for the progress logger to drain after a run
const PROGRESS_DRAIN: Duration = Duration::from_secs(1);

/// Load `path`, or the platform config file when none is given
///
/// A missing platform file means defaults.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    match path {
        Some(path) => Config::load_from_file(path)
            .with_context(|| format!("loading configuration from {}", path.display())),
        None => match Config::default_path() {
            Ok(path) => Config::load_or_default(&path)
                .with_context(|| format!("loading configuration from {}", path.display())),
            Err(e) => {
                tracing::warn!("{}; using default configuration", e);
                Ok(Config::default())
            }
        },
    }
}

/// Build the planning pipeline described by `config`
pub fn pipeline(config: &Config, events: Arc<EventBus>) -> anyhow::Result<DrawingPipeline> {
    let geometry = config.arm_geometry()?;
    let pipeline = DrawingPipeline::new(geometry, config.planner_settings())
        .context("invalid planner settings")?;
    Ok(pipeline.with_events(events))
}

/// Read a contour file and compile it
pub fn plan_file(pipeline: &DrawingPipeline, contours: &Path) -> anyhow::Result<CompiledTrajectory> {
    let set = ContourSet::load(contours)
        .with_context(|| format!("reading contours from {}", contours.display()))?;
    tracing::info!(
        "Loaded {} contours ({} vertices) from a {}x{} image",
        set.contours.len(),
        set.vertex_count(),
        set.image_width,
        set.image_height
    );
    pipeline
        .plan(&set)
        .with_context(|| format!("planning {}", contours.display()))
}

/// One-paragraph description of a compiled trajectory
pub fn summarize(trajectory: &CompiledTrajectory) -> String {
    let mut summary = format!(
        "{} waypoints, {} strokes, {} pen transitions",
        trajectory.len(),
        trajectory.stroke_count(),
        trajectory.pen_transitions()
    );
    if trajectory.dropped() > 0 {
        summary.push_str(&format!(
            "\n{} unreachable points dropped",
            trajectory.dropped()
        ));
        for warning in trajectory.warnings.iter().take(5) {
            summary.push_str(&format!(
                "\n  command {} at ({:.1}, {:.1})",
                warning.index, warning.position.x, warning.position.y
            ));
        }
        if trajectory.warnings.len() > 5 {
            summary.push_str("\n  ...");
        }
    }
    summary
}

/// The simulated sink, or the serial port named by `port` or the config
pub fn open_sink(config: &Config, port: Option<&str>, simulate: bool) -> SharedSink {
    if simulate {
        shared_sink(SimulatedSink::new())
    } else {
        shared_sink(SerialSink::new(config.serial_params(port)))
    }
}

/// Print controller-like serial ports
pub fn print_ports() -> anyhow::Result<()> {
    let ports = list_ports().context("enumerating serial ports")?;
    if ports.is_empty() {
        println!("No controller ports found");
    }
    for port in ports {
        match port.manufacturer {
            Some(manufacturer) => {
                println!("{}\t{} ({})", port.port_name, port.description, manufacturer)
            }
            None => println!("{}\t{}", port.port_name, port.description),
        }
    }
    Ok(())
}

/// Connect `sink`, play `waypoints` back and disconnect
///
/// The first Ctrl-C cancels at the next waypoint, the second sends the
/// emergency stop.
pub async fn play(
    waypoints: Vec<Waypoint>,
    sink: SharedSink,
    config: &Config,
    events: Arc<EventBus>,
) -> anyhow::Result<RunReport> {
    let geometry = config.arm_geometry()?;
    connect_shared(&sink, Some(&events)).context("connecting to the drawing controller")?;
    let diagnostics = events.subscribe(
        EventFilter::Categories(vec![EventCategory::Error]),
        |event| {
            if let AppEvent::Error(error) = event {
                log_diagnostic(&error);
            }
        },
    );

    let sequencer = MotionSequencer::new(
        geometry,
        sink.clone(),
        config.protocol(),
        config.sequencer_config(),
    )
    .with_events(events.clone());

    let progress = tokio::spawn(log_progress(events.receiver()));
    let interrupts = watch_interrupts(sequencer.handle());

    let outcome = sequencer
        .spawn(Arc::new(waypoints))
        .await
        .context("sequencer worker stopped unexpectedly");

    interrupts.abort();
    if tokio::time::timeout(PROGRESS_DRAIN, progress).await.is_err() {
        tracing::debug!("Progress logger did not finish in time");
    }
    if let Err(e) = disconnect_shared(&sink, Some(&events)) {
        tracing::warn!("Failed to disconnect: {}", e);
    }
    events.unsubscribe(diagnostics);

    let report = outcome?.context("motion run failed")?;
    Ok(report)
}

fn watch_interrupts(handle: SequencerHandle) -> JoinHandle<()> {
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Unable to listen for Ctrl-C: {}", e);
            return;
        }
        tracing::warn!("Interrupt: stopping after the current waypoint (Ctrl-C again to halt now)");
        handle.cancel();

        if tokio::signal::ctrl_c().await.is_ok() {
            halt(handle).await;
        }
    })
}

/// Send the emergency stop from a blocking worker
///
/// The stop waits on the sink lock, which the motion worker holds while a
/// command is in flight.
async fn halt(handle: SequencerHandle) {
    match tokio::task::spawn_blocking(move || handle.emergency_stop()).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::error!("Emergency stop failed: {}", e),
        Err(e) => tracing::error!("Emergency stop worker failed: {}", e),
    }
}

fn log_diagnostic(error: &ErrorEvent) {
    match error {
        ErrorEvent::Warning { code, message } => tracing::warn!("[{}] {}", code, message),
        ErrorEvent::Error {
            code,
            message,
            recoverable,
        } => {
            if *recoverable {
                tracing::warn!("[{}] {}", code, message);
            } else {
                tracing::error!("[{}] {}; acknowledge the fault before the next run", code, message);
            }
        }
        ErrorEvent::Critical { code, message } => tracing::error!("[{}] {}", code, message),
    }
}

async fn log_progress(mut receiver: broadcast::Receiver<AppEvent>) {
    loop {
        match receiver.recv().await {
            Ok(AppEvent::Motion(MotionEvent::Progress { completed, total })) => {
                if completed % PROGRESS_LOG_INTERVAL == 0 || completed == total {
                    tracing::info!("Progress {}/{}", completed, total);
                }
            }
            Ok(AppEvent::Motion(MotionEvent::WaypointSkipped { index, position })) => {
                tracing::warn!(
                    "Waypoint {} at ({:.1}, {:.1}) is out of reach",
                    index,
                    position.x,
                    position.y
                );
            }
            Ok(AppEvent::Motion(MotionEvent::RunFinished {
                state,
                sent,
                skipped,
            })) => {
                if state == SequencerState::Completed {
                    tracing::info!("Drawing finished: {} sent, {} skipped", sent, skipped);
                } else {
                    tracing::warn!("Drawing {}: {} sent, {} skipped", state, sent, skipped);
                }
                break;
            }
            Ok(_) => {}
            Err(RecvError::Lagged(missed)) => {
                tracing::debug!("Progress logger missed {} events", missed);
            }
            Err(RecvError::Closed) => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scaradraw_communication::{AbsoluteAngleProtocol, MotionSink};
    use scaradraw_core::{ArmGeometry, Point2D};
    use scaradraw_planner::TrajectoryWarning;
    use tempfile::TempDir;

    const CONTOURS: &str = r#"{
        "image_width": 400,
        "image_height": 400,
        "contours": [
            {"points": [[60, 60], [140, 60], [160, 120], [100, 160], [40, 120]]},
            {"points": [[250, 250], [300, 250], [340, 280], [340, 320],
                        [300, 350], [250, 350], [220, 320], [220, 280]]}
        ]
    }"#;

    fn fast_config() -> Config {
        let mut config = Config::default();
        config.motion.pacing_ms = 0;
        config
    }

    #[test]
    fn test_summary_lists_dropped_points() {
        let trajectory = CompiledTrajectory {
            waypoints: vec![Waypoint::up(150.0, 0.0), Waypoint::down(150.0, 0.0)],
            warnings: vec![TrajectoryWarning {
                index: 4,
                position: Point2D::new(300.0, 12.24),
            }],
        };

        let summary = summarize(&trajectory);
        assert!(summary.starts_with("2 waypoints, 1 strokes"));
        assert!(summary.contains("1 unreachable points dropped"));
        assert!(summary.contains("command 4 at (300.0, 12.2)"));
    }

    #[test]
    fn test_open_sink_simulated() {
        let sink = open_sink(&Config::default(), None, true);
        assert_eq!(sink.lock().name(), "simulation");

        let sink = open_sink(&Config::default(), Some("/dev/ttyUSB3"), false);
        assert_eq!(sink.lock().name(), "/dev/ttyUSB3");
    }

    #[test]
    fn test_load_config_from_explicit_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("arm.toml");
        std::fs::write(&path, "[motion]\npacing_ms = 5\n").unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.motion.pacing_ms, 5);

        let missing = dir.path().join("missing.toml");
        assert!(load_config(Some(&missing)).is_err());
    }

    #[test]
    fn test_plan_file_and_export() {
        let dir = TempDir::new().unwrap();
        let contours = dir.path().join("contours.json");
        std::fs::write(&contours, CONTOURS).unwrap();

        let config = fast_config();
        let pipeline = pipeline(&config, Arc::new(EventBus::new())).unwrap();
        let trajectory = plan_file(&pipeline, &contours).unwrap();
        assert_eq!(trajectory.stroke_count(), 2);
        assert!(summarize(&trajectory).starts_with(&format!("{} waypoints", trajectory.len())));

        let export = dir.path().join("robot_path.txt");
        pipeline.export(&trajectory, &export).unwrap();
        let text = std::fs::read_to_string(&export).unwrap();
        assert_eq!(text.lines().count(), trajectory.len() + 2);
    }

    #[test]
    fn test_plan_file_reports_missing_input() {
        let dir = TempDir::new().unwrap();
        let pipeline = pipeline(&fast_config(), Arc::new(EventBus::new())).unwrap();
        let error = plan_file(&pipeline, &dir.path().join("nope.json")).unwrap_err();
        assert!(error.to_string().contains("reading contours"));
    }

    #[tokio::test]
    async fn test_simulated_run_draws_every_waypoint() {
        let dir = TempDir::new().unwrap();
        let contours = dir.path().join("contours.json");
        std::fs::write(&contours, CONTOURS).unwrap();

        let config = fast_config();
        let events = Arc::new(EventBus::new());
        let pipeline = pipeline(&config, events.clone()).unwrap();
        let trajectory = plan_file(&pipeline, &contours).unwrap();
        let expected = trajectory.len();

        let sink = SimulatedSink::new();
        let log = sink.log();
        let report = play(trajectory.waypoints, shared_sink(sink), &config, events.clone())
            .await
            .unwrap();

        assert_eq!(report.state, SequencerState::Completed);
        assert_eq!(report.sent, expected);
        let commands = log.commands();
        assert_eq!(commands.first().map(String::as_str), Some("HOME"));
        assert_eq!(commands.last().map(String::as_str), Some("HOME"));
        assert_eq!(commands.len(), expected + 4);
        assert_eq!(events.handler_count(), 0);
    }

    #[tokio::test]
    async fn test_halt_waits_off_the_runtime() {
        let simulated = SimulatedSink::new();
        let log = simulated.log();
        let sink = shared_sink(simulated);
        sink.lock().connect().unwrap();
        let sequencer = MotionSequencer::new(
            ArmGeometry::default(),
            sink.clone(),
            Arc::new(AbsoluteAngleProtocol),
            fast_config().sequencer_config(),
        );

        // The motion worker holds the sink while a command is in flight.
        let busy = sink.lock();
        let halting = tokio::spawn(halt(sequencer.handle()));
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!halting.is_finished());

        drop(busy);
        halting.await.unwrap();
        assert_eq!(log.commands().last().map(String::as_str), Some("STOP"));
        assert_eq!(log.count("STOP"), 1);
    }
}
