//! The motion sequencer
//!
//! Steps through a compiled trajectory, solving joint angles per waypoint and
//! sending one encoded command per reachable waypoint to the sink.
//!
//! ## State machine
//!
//! ```text
//! Idle -> Running -> Completed
//!                 -> Stopped      (cancel via Cancelling, or emergency stop)
//!                 -> Faulted      (transport failure)
//! Faulted -> Idle                 (acknowledge only)
//! ```
//!
//! A run executes on the caller's thread (or a blocking tokio worker via
//! [`MotionSequencer::spawn`]). Cancellation is polled once per waypoint and
//! interrupts the pacing delay. An emergency stop goes straight to the sink
//! from the calling thread; the run loop checks for it under the sink lock, so
//! no motion command can follow the halt command.
//!
//! The displayed state can reach `Stopped` before the loop has noticed the
//! emergency stop; a separate liveness flag keeps a second run out until the
//! first one has returned.

use crate::frame::arm_frame;
use crate::report::RunReport;
use crate::signal::StopSignal;
use parking_lot::{Mutex, RwLock};
use scaradraw_communication::{MotionProtocol, SharedSink};
use scaradraw_core::{
    inverse_kinematics_with_branch, AppEvent, ArmGeometry, ConnectionError, ElbowBranch,
    ErrorEvent, EventBus, JointAngles, MotionError, MotionEvent, SequencerState, Waypoint,
    WaypointIndex,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Default delay between waypoints
pub const DEFAULT_PACING: Duration = Duration::from_millis(50);

/// Sequencer tuning
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SequencerConfig {
    /// Delay after each sent waypoint; interrupted by stop requests
    pub pacing: Duration,
    /// Inverse kinematics branch
    pub elbow_branch: ElbowBranch,
}

impl Default for SequencerConfig {
    fn default() -> Self {
        Self {
            pacing: DEFAULT_PACING,
            elbow_branch: ElbowBranch::default(),
        }
    }
}

/// State shared between the sequencer and its handles
struct Shared {
    state: Mutex<SequencerState>,
    signal: StopSignal,
    halt_sent: AtomicBool,
    /// Set while a `run` is executing, independent of the displayed state
    active: AtomicBool,
    sink: SharedSink,
    protocol: Arc<dyn MotionProtocol>,
    events: RwLock<Option<Arc<EventBus>>>,
}

impl Shared {
    fn notify(&self, event: AppEvent) {
        let events = self.events.read().clone();
        if let Some(events) = events {
            events.notify(event);
        }
    }

    fn publish(&self, event: MotionEvent) {
        self.notify(AppEvent::Motion(event));
    }

    /// Move to `to`, returning the previous state
    fn transition(&self, to: SequencerState) -> SequencerState {
        let from = std::mem::replace(&mut *self.state.lock(), to);
        if from != to {
            tracing::info!("Sequencer {} -> {}", from, to);
            self.publish(MotionEvent::StateChanged { from, to });
        }
        from
    }

    fn emergency_stop(&self) -> Result<(), ConnectionError> {
        self.signal.request_emergency_stop();
        if self.halt_sent.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        tracing::warn!("Emergency stop");
        let result = self.sink.lock().send(&self.protocol.emergency_stop());
        if let Err(e) = &result {
            tracing::error!("Failed to send emergency stop: {}", e);
        }

        let from = {
            let mut state = self.state.lock();
            let from = *state;
            if from.is_active() {
                *state = SequencerState::Stopped;
            }
            from
        };
        if from.is_active() {
            tracing::info!("Sequencer {} -> {}", from, SequencerState::Stopped);
            self.publish(MotionEvent::StateChanged {
                from,
                to: SequencerState::Stopped,
            });
        }
        result
    }
}

/// Cloneable control surface for a sequencer, usable from any thread
#[derive(Clone)]
pub struct SequencerHandle {
    shared: Arc<Shared>,
}

impl SequencerHandle {
    /// Request a cooperative stop at the next waypoint boundary
    pub fn cancel(&self) {
        tracing::info!("Cancellation requested");
        self.shared.signal.request_cancel();
    }

    /// Send the halt command now and force the run into `Stopped`
    ///
    /// The halt command is sent at most once per run; repeated calls only
    /// re-raise the flag.
    pub fn emergency_stop(&self) -> Result<(), ConnectionError> {
        self.shared.emergency_stop()
    }

    pub fn state(&self) -> SequencerState {
        *self.shared.state.lock()
    }
}

impl std::fmt::Debug for SequencerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SequencerHandle")
            .field("state", &self.state())
            .finish()
    }
}

/// Tally kept during a run
#[derive(Debug, Default)]
struct Tally {
    sent: usize,
    skipped_indices: Vec<usize>,
}

/// Clears the liveness flag when a run returns, however it returns
struct ActiveRun<'a>(&'a AtomicBool);

impl Drop for ActiveRun<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Result of trying to deliver one command
enum Delivery {
    Sent,
    Halted,
}

/// Drives a sink through a trajectory
#[derive(Clone)]
pub struct MotionSequencer {
    geometry: ArmGeometry,
    config: SequencerConfig,
    shared: Arc<Shared>,
}

impl std::fmt::Debug for MotionSequencer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MotionSequencer")
            .field("geometry", &self.geometry)
            .field("config", &self.config)
            .field("protocol", &self.shared.protocol.name())
            .field("state", &self.state())
            .finish()
    }
}

impl MotionSequencer {
    /// Create a sequencer in the `Idle` state
    pub fn new(
        geometry: ArmGeometry,
        sink: SharedSink,
        protocol: Arc<dyn MotionProtocol>,
        config: SequencerConfig,
    ) -> Self {
        Self {
            geometry,
            config,
            shared: Arc::new(Shared {
                state: Mutex::new(SequencerState::Idle),
                signal: StopSignal::new(),
                halt_sent: AtomicBool::new(false),
                active: AtomicBool::new(false),
                sink,
                protocol,
                events: RwLock::new(None),
            }),
        }
    }

    /// Publish state, progress and frame events on `events`
    pub fn with_events(self, events: Arc<EventBus>) -> Self {
        *self.shared.events.write() = Some(events);
        self
    }

    pub fn handle(&self) -> SequencerHandle {
        SequencerHandle {
            shared: self.shared.clone(),
        }
    }

    pub fn state(&self) -> SequencerState {
        *self.shared.state.lock()
    }

    /// Check if a run is still executing
    pub fn is_active(&self) -> bool {
        self.shared.active.load(Ordering::SeqCst)
    }

    pub fn geometry(&self) -> &ArmGeometry {
        &self.geometry
    }

    pub fn config(&self) -> &SequencerConfig {
        &self.config
    }

    /// Clear a finished or faulted run, returning to `Idle`
    ///
    /// Returns the state that was acknowledged. Has no effect while a run is
    /// active, including a run already forced to `Stopped` by an emergency
    /// stop that has not returned yet.
    pub fn acknowledge(&self) -> SequencerState {
        let current = self.state();
        if current.is_terminal() && !self.is_active() {
            self.shared.transition(SequencerState::Idle);
        }
        current
    }

    /// Execute a trajectory to completion, cancellation or fault
    ///
    /// Unreachable waypoints are skipped and counted; they never fail the run.
    pub fn run(&self, waypoints: &[Waypoint]) -> Result<RunReport, MotionError> {
        let _active = self.begin()?;

        let mut tally = Tally::default();
        let outcome = self.execute(waypoints, &mut tally);

        let total = waypoints.len();
        let skipped = tally.skipped_indices.len();
        match outcome {
            Ok(state) => {
                let state = self.finish(state);
                self.shared.publish(MotionEvent::RunFinished {
                    state,
                    sent: tally.sent,
                    skipped,
                });
                tracing::info!(
                    "Run {}: {} of {} waypoints sent, {} skipped",
                    state,
                    tally.sent,
                    total,
                    skipped
                );
                Ok(RunReport {
                    state,
                    total,
                    sent: tally.sent,
                    skipped,
                    skipped_indices: tally.skipped_indices,
                })
            }
            Err(error) => {
                tracing::error!("Run aborted: {}", error);
                self.shared.transition(SequencerState::Faulted);
                self.shared.publish(MotionEvent::RunFinished {
                    state: SequencerState::Faulted,
                    sent: tally.sent,
                    skipped,
                });
                self.shared.notify(AppEvent::Error(ErrorEvent::Error {
                    code: "MOTION_TRANSPORT".to_string(),
                    message: error.to_string(),
                    recoverable: false,
                }));
                Err(error)
            }
        }
    }

    /// Run on a blocking tokio worker
    pub fn spawn(
        &self,
        waypoints: Arc<Vec<Waypoint>>,
    ) -> tokio::task::JoinHandle<Result<RunReport, MotionError>> {
        let sequencer = self.clone();
        tokio::task::spawn_blocking(move || sequencer.run(&waypoints))
    }

    /// Check preconditions, claim the sequencer and enter `Running`
    fn begin(&self) -> Result<ActiveRun<'_>, MotionError> {
        if self
            .shared
            .active
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(MotionError::AlreadyRunning);
        }
        let active = ActiveRun(&self.shared.active);

        let mut state = self.shared.state.lock();
        match *state {
            SequencerState::Running | SequencerState::Cancelling => {
                return Err(MotionError::AlreadyRunning)
            }
            SequencerState::Faulted => return Err(MotionError::FaultNotAcknowledged),
            _ => {}
        }

        {
            let sink = self.shared.sink.lock();
            if !sink.is_ready() {
                tracing::warn!("Sink {} is not ready", sink.name());
                return Err(MotionError::NotReady { sink: sink.name() });
            }
        }

        self.shared.signal.reset();
        self.shared.halt_sent.store(false, Ordering::SeqCst);
        let from = std::mem::replace(&mut *state, SequencerState::Running);
        drop(state);

        tracing::info!("Sequencer {} -> {}", from, SequencerState::Running);
        self.shared.publish(MotionEvent::StateChanged {
            from,
            to: SequencerState::Running,
        });
        Ok(active)
    }

    /// Settle the terminal state, honouring an emergency stop that raced the loop
    fn finish(&self, state: SequencerState) -> SequencerState {
        if self.shared.signal.is_emergency_stop() {
            let current = self.state();
            if current != SequencerState::Stopped {
                self.shared.transition(SequencerState::Stopped);
            }
            return SequencerState::Stopped;
        }
        self.shared.transition(state);
        state
    }

    fn deliver(
        &self,
        index: WaypointIndex,
        command: &str,
        tally: &Tally,
    ) -> Result<Delivery, MotionError> {
        let mut sink = self.shared.sink.lock();
        if self.shared.signal.is_emergency_stop() {
            return Ok(Delivery::Halted);
        }

        sink.send(command)
            .map(|_| Delivery::Sent)
            .map_err(|source| MotionError::TransportFault {
                index,
                sent: tally.sent,
                skipped: tally.skipped_indices.len(),
                source,
            })
    }

    fn execute(
        &self,
        waypoints: &[Waypoint],
        tally: &mut Tally,
    ) -> Result<SequencerState, MotionError> {
        let protocol = self.shared.protocol.clone();
        let signal = &self.shared.signal;
        let total = waypoints.len();
        let mut previous = JointAngles::home();

        tracing::info!(
            "Starting run of {} waypoints ({} protocol)",
            total,
            protocol.name()
        );

        for command in [protocol.home(), protocol.pen_up()] {
            if let Delivery::Halted = self.deliver(WaypointIndex::Priming, &command, tally)? {
                return Ok(SequencerState::Stopped);
            }
        }

        for (index, waypoint) in waypoints.iter().enumerate() {
            if signal.is_emergency_stop() {
                return Ok(SequencerState::Stopped);
            }
            if signal.is_cancel_requested() {
                return self.park_after_cancel(tally);
            }

            let position = waypoint.position;
            let angles = match inverse_kinematics_with_branch(
                position.x,
                position.y,
                &self.geometry,
                self.config.elbow_branch,
            ) {
                Ok(angles) => angles,
                Err(e) => {
                    tracing::warn!("Skipping waypoint {}: {}", index, e);
                    tally.skipped_indices.push(index);
                    self.shared
                        .publish(MotionEvent::WaypointSkipped { index, position });
                    continue;
                }
            };

            let command = protocol.encode(waypoint, &angles, &previous);
            tracing::debug!("Waypoint {}/{}: {} {}", index + 1, total, angles, waypoint.pen);
            if let Delivery::Halted = self.deliver(WaypointIndex::At(index), &command, tally)? {
                return Ok(SequencerState::Stopped);
            }
            tally.sent += 1;
            previous = angles;

            self.shared.publish(MotionEvent::Frame(arm_frame(
                &self.geometry,
                &angles,
                waypoint.pen,
                index,
                total,
            )));
            self.shared.publish(MotionEvent::Progress {
                completed: index + 1,
                total,
            });

            if !self.config.pacing.is_zero() {
                signal.wait_timeout(self.config.pacing);
            }
        }

        if signal.is_emergency_stop() {
            return Ok(SequencerState::Stopped);
        }
        if signal.is_cancel_requested() {
            return self.park_after_cancel(tally);
        }

        for command in [protocol.pen_up(), protocol.home()] {
            if let Delivery::Halted = self.deliver(WaypointIndex::Parking, &command, tally)? {
                return Ok(SequencerState::Stopped);
            }
        }
        Ok(SequencerState::Completed)
    }

    fn park_after_cancel(&self, tally: &Tally) -> Result<SequencerState, MotionError> {
        self.shared.transition(SequencerState::Cancelling);
        let command = self.shared.protocol.pen_up();
        self.deliver(WaypointIndex::Parking, &command, tally)?;
        Ok(SequencerState::Stopped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scaradraw_communication::{shared_sink, AbsoluteAngleProtocol, MotionSink, SimulatedSink};

    fn sequencer(sink: SimulatedSink) -> MotionSequencer {
        let shared = shared_sink(sink);
        shared.lock().connect().unwrap();
        MotionSequencer::new(
            ArmGeometry::default(),
            shared,
            Arc::new(AbsoluteAngleProtocol),
            SequencerConfig {
                pacing: Duration::ZERO,
                ..Default::default()
            },
        )
    }

    #[test]
    fn test_priming_and_parking_around_waypoints() {
        let sink = SimulatedSink::new();
        let log = sink.log();
        let sequencer = sequencer(sink);

        let report = sequencer
            .run(&[Waypoint::up(260.0, 0.0), Waypoint::down(260.0, 0.0)])
            .unwrap();

        assert_eq!(report.state, SequencerState::Completed);
        assert_eq!(report.sent, 2);
        assert_eq!(
            log.commands(),
            vec!["HOME", "PU", "0.00,0.00,0", "0.00,0.00,1", "PU", "HOME"]
        );
    }

    #[test]
    fn test_acknowledge_returns_to_idle() {
        let sequencer = sequencer(SimulatedSink::new());
        sequencer.run(&[]).unwrap();
        assert_eq!(sequencer.state(), SequencerState::Completed);
        assert_eq!(sequencer.acknowledge(), SequencerState::Completed);
        assert_eq!(sequencer.state(), SequencerState::Idle);
        // nothing to acknowledge
        assert_eq!(sequencer.acknowledge(), SequencerState::Idle);
    }

    #[test]
    fn test_emergency_stop_while_idle_sends_halt_once() {
        let sink = SimulatedSink::new();
        let log = sink.log();
        let sequencer = sequencer(sink);
        let handle = sequencer.handle();

        handle.emergency_stop().unwrap();
        handle.emergency_stop().unwrap();
        assert_eq!(log.commands(), vec!["STOP"]);
        assert_eq!(handle.state(), SequencerState::Idle);
    }
}
