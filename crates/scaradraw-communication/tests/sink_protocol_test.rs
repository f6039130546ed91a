use scaradraw_communication::{
    connect_shared, shared_sink, MotionProtocol, ProtocolKind, SimulatedSink, StepDeltaProtocol,
};
use scaradraw_core::{inverse_kinematics, ArmGeometry, JointAngles, Waypoint};

#[test]
fn test_absolute_commands_reach_simulated_sink() {
    let geometry = ArmGeometry::default();
    let simulated = SimulatedSink::new();
    let log = simulated.log();
    let sink = shared_sink(simulated);
    connect_shared(&sink, None).unwrap();

    let protocol = ProtocolKind::Absolute.build(10.0);
    let waypoint = Waypoint::down(260.0, 0.0);
    let angles = inverse_kinematics(260.0, 0.0, &geometry).unwrap();

    let mut guard = sink.lock();
    guard.send(&protocol.home()).unwrap();
    guard.send(&protocol.encode(&waypoint, &angles, &JointAngles::home())).unwrap();
    guard.send(&protocol.emergency_stop()).unwrap();
    drop(guard);

    assert_eq!(log.commands(), vec!["HOME", "0.00,0.00,1", "STOP"]);
}

#[test]
fn test_step_delta_run_returns_home_without_drift() {
    let geometry = ArmGeometry::default();
    let protocol = StepDeltaProtocol::new(7.3);
    let targets = [(150.0, 40.0), (120.0, 80.5), (60.25, 170.0), (-30.0, 200.0)];

    let mut previous = JointAngles::home();
    let (mut sum1, mut sum2) = (0i64, 0i64);
    for (x, y) in targets {
        let angles = inverse_kinematics(x, y, &geometry).unwrap();
        let (d1, d2) = protocol.deltas(&angles, &previous);
        sum1 += d1;
        sum2 += d2;
        previous = angles;
    }
    let (back1, back2) = protocol.deltas(&JointAngles::home(), &previous);

    assert_eq!(sum1 + back1, 0);
    assert_eq!(sum2 + back2, 0);
}
