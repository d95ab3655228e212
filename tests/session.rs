use gate_lab::circuit::{ComponentKind, InputPort, OutputPort, Plug, Position, Signal};
use gate_lab::error::Error;
use gate_lab::session::{CircuitSession, ClickOutcome, Mode};

#[test]
fn click_to_connect() {
    let mut session = CircuitSession::new("clicks".to_string());
    let a = session.add_input(50.0, 50.0, "A".to_string(), Signal::High);
    let b = session.add_input(50.0, 250.0, "B".to_string(), Signal::High);
    let and = session.add_gate(ComponentKind::AndGate, 400.0, 150.0).unwrap();
    let z = session.add_output(1350.0, 150.0, "Z".to_string());

    let out_a = OutputPort::new(a, 0);
    assert_eq!(
        session.click_output(out_a).unwrap(),
        ClickOutcome::StartedConnecting(out_a)
    );
    assert_eq!(session.get_mode(), Mode::Connecting(out_a));

    // No plug given: the first free one is used
    let ClickOutcome::Connected(c) = session.click_input(and, None).unwrap() else {
        panic!("Expected a connection");
    };
    assert_eq!(c.target(), InputPort::new(and, 0));
    assert_eq!(session.get_mode(), Mode::Idle);

    session.click_output(OutputPort::new(b, 0)).unwrap();
    let ClickOutcome::Connected(c) = session.click_input(and, None).unwrap() else {
        panic!("Expected a connection");
    };
    assert_eq!(c.target(), InputPort::new(and, 1));

    session.click_output(OutputPort::new(and, 0)).unwrap();
    session.click_input(z, None).unwrap();
    assert_eq!(session.get_result(z).unwrap(), Signal::High);
}

#[test]
fn full_gate_is_ignored() {
    let mut session = CircuitSession::default();
    let a = session.add_input(0.0, 0.0, "A".to_string(), Signal::Low);
    let b = session.add_input(0.0, 0.0, "B".to_string(), Signal::Low);
    let c = session.add_input(0.0, 0.0, "C".to_string(), Signal::Low);
    let or = session.add_gate(ComponentKind::OrGate, 0.0, 0.0).unwrap();
    session
        .request_connect(OutputPort::new(a, 0), InputPort::new(or, 0))
        .unwrap();
    session
        .request_connect(OutputPort::new(b, 0), InputPort::new(or, 1))
        .unwrap();

    let out_c = OutputPort::new(c, 0);
    session.click_output(out_c).unwrap();
    assert_eq!(session.click_input(or, None).unwrap(), ClickOutcome::Ignored);
    assert_eq!(
        session.click_input(or, Some(1)).unwrap(),
        ClickOutcome::Ignored
    );
    // Still waiting for a target
    assert_eq!(session.get_mode(), Mode::Connecting(out_c));
    assert_eq!(session.cancel(), ClickOutcome::Cancelled);
    assert_eq!(session.get_mode(), Mode::Idle);
    assert_eq!(session.cancel(), ClickOutcome::Ignored);
}

#[test]
fn clicking_a_wired_output_disconnects() {
    let mut session = CircuitSession::default();
    let a = session.add_input(0.0, 0.0, "A".to_string(), Signal::High);
    let z = session.add_output(0.0, 0.0, "Z".to_string());
    let out_a = OutputPort::new(a, 0);
    session
        .request_connect(out_a, InputPort::new(z, 0))
        .unwrap();
    assert_eq!(session.get_result(z).unwrap(), Signal::High);

    let ClickOutcome::Disconnected(c) = session.click_output(out_a).unwrap() else {
        panic!("Expected a disconnection");
    };
    assert_eq!(c.src(), out_a);
    assert_eq!(session.get_mode(), Mode::Idle);
    assert_eq!(session.get_result(z).unwrap(), Signal::Undefined);
}

#[test]
fn clicking_the_pending_output_cancels() {
    let mut session = CircuitSession::default();
    let a = session.add_input(0.0, 0.0, "A".to_string(), Signal::High);
    let b = session.add_input(0.0, 0.0, "B".to_string(), Signal::High);
    let out_a = OutputPort::new(a, 0);
    let out_b = OutputPort::new(b, 0);
    session.click_output(out_a).unwrap();
    assert_eq!(
        session.click_output(out_b).unwrap(),
        ClickOutcome::StartedConnecting(out_b)
    );
    assert_eq!(session.click_output(out_b).unwrap(), ClickOutcome::Cancelled);
    assert_eq!(session.get_mode(), Mode::Idle);
}

#[test]
fn loop_gesture_is_an_error() {
    let mut session = CircuitSession::default();
    let not = session.add_gate(ComponentKind::NotGate, 0.0, 0.0).unwrap();
    let out = OutputPort::new(not, 0);
    session.click_output(out).unwrap();
    assert!(matches!(
        session.click_input(not, None),
        Err(Error::CycleAttempt(..))
    ));
    assert_eq!(session.get_mode(), Mode::Connecting(out));
}

#[test]
fn deleting_a_gate_reevaluates() {
    let mut session = CircuitSession::default();
    let a = session.add_input(0.0, 0.0, "A".to_string(), Signal::Low);
    let not = session.add_gate(ComponentKind::NotGate, 0.0, 0.0).unwrap();
    let z = session.add_output(0.0, 0.0, "Z".to_string());
    session
        .request_connect(OutputPort::new(a, 0), InputPort::new(not, 0))
        .unwrap();
    session
        .request_connect(OutputPort::new(not, 0), InputPort::new(z, 0))
        .unwrap();
    assert_eq!(session.get_result(z).unwrap(), Signal::High);

    let or = session.add_gate(ComponentKind::OrGate, 0.0, 0.0).unwrap();
    session.click_output(OutputPort::new(or, 0)).unwrap();
    session.delete_component(or).unwrap();
    // The pending wire went with its source
    assert_eq!(session.get_mode(), Mode::Idle);

    let removed = session.delete_component(not).unwrap();
    assert_eq!(removed.get_position(), Some(Position::new(0.0, 0.0)));
    assert_eq!(session.get_result(z).unwrap(), Signal::Undefined);
    assert_eq!(session.get_netlist().connections().count(), 0);
    assert!(matches!(
        session.delete_component(z),
        Err(Error::ProtectedNode(_))
    ));
}

#[test]
fn toggling_inputs_propagates() {
    let mut session = CircuitSession::default();
    let a = session.add_input(0.0, 0.0, "A".to_string(), Signal::Low);
    let z = session.add_output(0.0, 0.0, "Z".to_string());
    session
        .request_connect(OutputPort::new(a, 0), InputPort::new(z, 0))
        .unwrap();
    assert_eq!(session.toggle_input(a).unwrap(), Signal::High);
    assert_eq!(session.get_result(z).unwrap(), Signal::High);
    assert_eq!(session.toggle_input(a).unwrap(), Signal::Low);
    assert_eq!(session.get_result(z).unwrap(), Signal::Low);
    assert!(matches!(
        session.toggle_input(z),
        Err(Error::WrongKind { .. })
    ));

    assert!(
        session
            .request_disconnect(Plug::Input(InputPort::new(z, 0)))
            .unwrap()
            .is_some()
    );
    assert!(
        session
            .request_disconnect(Plug::Input(InputPort::new(z, 0)))
            .unwrap()
            .is_none()
    );
}

#[test]
fn probe_through_connector() {
    let mut session = CircuitSession::default();
    let a = session.add_input(0.0, 0.0, "A".to_string(), Signal::Low);
    let split = session.add_connector(0.0, 0.0);
    let or = session.add_gate(ComponentKind::OrGate, 0.0, 0.0).unwrap();
    let not = session.add_gate(ComponentKind::NotGate, 0.0, 0.0).unwrap();
    let z = session.add_output(0.0, 0.0, "Z".to_string());
    session
        .request_connect(OutputPort::new(a, 0), InputPort::new(split, 0))
        .unwrap();
    session
        .request_connect(OutputPort::new(split, 0), InputPort::new(or, 0))
        .unwrap();
    session
        .request_connect(OutputPort::new(split, 2), InputPort::new(not, 0))
        .unwrap();
    session
        .request_connect(OutputPort::new(not, 0), InputPort::new(or, 1))
        .unwrap();
    session
        .request_connect(OutputPort::new(or, 0), InputPort::new(z, 0))
        .unwrap();
    assert_eq!(session.probe(z).unwrap(), "(A+!A)");
    assert_eq!(session.get_result(z).unwrap(), Signal::High);

    let y = session.add_output(0.0, 0.0, "Y".to_string());
    assert_eq!(
        session.probe(y).unwrap_err().to_string(),
        "Part of your circuit is not connected to an input!"
    );
}
