use gate_lab::circuit::{ComponentKind, InputPort, OutputPort};
use gate_lab::error::Error;
use gate_lab::exercise::Exercise;
use gate_lab::session::CircuitSession;

/// (A * !B) + (!A * B), using connectors to reuse each input twice
fn xor_solution(session: &mut CircuitSession) -> Result<(), Error> {
    let (a, b, z) = match (
        session.find_node("A"),
        session.find_node("B"),
        session.find_node("Z"),
    ) {
        (Some(a), Some(b), Some(z)) => (a, b, z),
        _ => return Err(Error::Inconsistent("missing XOR nodes".to_string())),
    };

    let split_a = session.add_connector(200.0, 50.0);
    let split_b = session.add_connector(200.0, 250.0);
    let not_a = session.add_gate(ComponentKind::NotGate, 400.0, 50.0)?;
    let not_b = session.add_gate(ComponentKind::NotGate, 400.0, 250.0)?;
    let left = session.add_gate(ComponentKind::AndGate, 700.0, 50.0)?;
    let right = session.add_gate(ComponentKind::AndGate, 700.0, 250.0)?;
    let or = session.add_gate(ComponentKind::OrGate, 1000.0, 150.0)?;

    let wires = [
        (OutputPort::new(a, 0), InputPort::new(split_a, 0)),
        (OutputPort::new(b, 0), InputPort::new(split_b, 0)),
        (OutputPort::new(split_a, 0), InputPort::new(not_a, 0)),
        (OutputPort::new(split_b, 0), InputPort::new(not_b, 0)),
        (OutputPort::new(split_a, 1), InputPort::new(left, 0)),
        (OutputPort::new(not_b, 0), InputPort::new(left, 1)),
        (OutputPort::new(not_a, 0), InputPort::new(right, 0)),
        (OutputPort::new(split_b, 1), InputPort::new(right, 1)),
        (OutputPort::new(left, 0), InputPort::new(or, 0)),
        (OutputPort::new(right, 0), InputPort::new(or, 1)),
        (OutputPort::new(or, 0), InputPort::new(z, 0)),
    ];
    for (driver, input) in wires {
        session.request_connect(driver, input)?;
    }
    Ok(())
}

fn main() -> Result<(), Error> {
    pretty_env_logger::init();

    let exercise = Exercise::get(8)?;
    let mut session = CircuitSession::new("xor".to_string());
    exercise.instantiate(&mut session);
    xor_solution(&mut session)?;

    print!("{}", session.get_netlist());
    if let Some(z) = session.find_node("Z") {
        println!("Z = {}", session.probe(z)?);
    }
    print!("{}", session.run_truth_table()?);

    let comparison = exercise.grade(&mut session)?;
    println!("{exercise}: {}", comparison.verdict());
    Ok(())
}
