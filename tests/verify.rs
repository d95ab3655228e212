use gate_lab::assert_table_eq;
use gate_lab::circuit::{ComponentId, ComponentKind, InputPort, OutputPort, Signal};
use gate_lab::error::Error;
use gate_lab::exercise::Exercise;
use gate_lab::session::CircuitSession;
use gate_lab::truth_table::{MAX_INPUTS, Verdict, check, generate_assignments};

fn node(session: &CircuitSession, label: &str) -> ComponentId {
    session.find_node(label).unwrap()
}

fn wire(session: &mut CircuitSession, from: (ComponentId, usize), to: (ComponentId, usize)) {
    session
        .request_connect(OutputPort::new(from.0, from.1), InputPort::new(to.0, to.1))
        .unwrap();
}

fn gate(session: &mut CircuitSession, kind: ComponentKind) -> ComponentId {
    session.add_gate(kind, 0.0, 0.0).unwrap()
}

#[test]
fn enumeration_order() {
    let rows: Vec<String> = generate_assignments(3).map(|a| a.to_string()).collect();
    assert_eq!(
        rows,
        vec!["000", "001", "010", "011", "100", "101", "110", "111"]
    );
}

#[test]
fn three_input_and() {
    let exercise = Exercise::get(1).unwrap();
    let mut session = CircuitSession::new("and3".to_string());
    exercise.instantiate(&mut session);
    let (a, b, c, z) = (
        node(&session, "A"),
        node(&session, "B"),
        node(&session, "C"),
        node(&session, "Z"),
    );
    let ab = gate(&mut session, ComponentKind::AndGate);
    let abc = gate(&mut session, ComponentKind::AndGate);
    wire(&mut session, (a, 0), (ab, 0));
    wire(&mut session, (b, 0), (ab, 1));
    wire(&mut session, (ab, 0), (abc, 0));
    wire(&mut session, (c, 0), (abc, 1));
    wire(&mut session, (abc, 0), (z, 0));

    let table = session.run_truth_table().unwrap();
    assert_table_eq!(
        table.to_string(),
        "A B C Z
         0 0 0 0
         0 0 1 0
         0 1 0 0
         0 1 1 0
         1 0 0 0
         1 0 1 0
         1 1 0 0
         1 1 1 1"
    );
    let comparison = exercise.grade(&mut session).unwrap();
    assert!(comparison.passed());
    assert_eq!(comparison.verdict(), Verdict::Correct);
}

/// (A * !B) + (!A * B)
fn build_xor(session: &mut CircuitSession) {
    let (a, b, z) = (node(session, "A"), node(session, "B"), node(session, "Z"));
    let sa = session.add_connector(0.0, 0.0);
    let sb = session.add_connector(0.0, 0.0);
    let na = gate(session, ComponentKind::NotGate);
    let nb = gate(session, ComponentKind::NotGate);
    let left = gate(session, ComponentKind::AndGate);
    let right = gate(session, ComponentKind::AndGate);
    let or = gate(session, ComponentKind::OrGate);
    wire(session, (a, 0), (sa, 0));
    wire(session, (b, 0), (sb, 0));
    wire(session, (sa, 0), (na, 0));
    wire(session, (sb, 0), (nb, 0));
    wire(session, (sa, 1), (left, 0));
    wire(session, (nb, 0), (left, 1));
    wire(session, (na, 0), (right, 0));
    wire(session, (sb, 1), (right, 1));
    wire(session, (left, 0), (or, 0));
    wire(session, (right, 0), (or, 1));
    wire(session, (or, 0), (z, 0));
}

#[test]
fn xor_via_gates() {
    let exercise = Exercise::get(8).unwrap();
    let mut session = CircuitSession::new("xor".to_string());
    exercise.instantiate(&mut session);
    build_xor(&mut session);

    let table = session.run_truth_table().unwrap();
    assert_eq!(table.to_bits(), vec!["000", "011", "101", "110"]);
    assert_eq!(
        session.probe(node(&session, "Z")).unwrap(),
        "((A*!B)+(!A*B))"
    );
    assert_eq!(
        exercise.grade(&mut session).unwrap().verdict(),
        Verdict::Correct
    );

    // The same circuit is not a less-than comparator
    let lt = Exercise::get(10).unwrap();
    let comparison = lt.grade(&mut session).unwrap();
    assert!(!comparison.passed());
    assert_eq!(comparison.mismatches().len(), 1);
    assert_eq!(comparison.verdict(), Verdict::Incorrect);
}

#[test]
fn evaluation_is_idempotent() {
    let exercise = Exercise::get(8).unwrap();
    let mut session = CircuitSession::default();
    exercise.instantiate(&mut session);
    build_xor(&mut session);
    let a = node(&session, "A");
    let z = node(&session, "Z");

    session.set_input(a, Signal::High).unwrap();
    session.evaluate_all().unwrap();
    let first = session.get_result(z).unwrap();
    session.evaluate_all().unwrap();
    assert_eq!(session.get_result(z).unwrap(), first);
    assert_eq!(first, Signal::High);

    // Grading leaves the live inputs where they were
    exercise.grade(&mut session).unwrap();
    assert_eq!(
        session.get_netlist().get(a).unwrap().get_value(),
        Some(Signal::High)
    );
    assert_eq!(session.get_result(z).unwrap(), Signal::High);
}

#[test]
fn unfinished_circuit_is_incomplete() {
    let exercise = Exercise::get(6).unwrap();
    let mut session = CircuitSession::default();
    exercise.instantiate(&mut session);
    let (a, z) = (node(&session, "A"), node(&session, "Z"));
    let not = gate(&mut session, ComponentKind::NotGate);
    let and = gate(&mut session, ComponentKind::AndGate);
    wire(&mut session, (a, 0), (not, 0));
    wire(&mut session, (not, 0), (and, 0));
    wire(&mut session, (and, 0), (z, 0));

    let comparison = exercise.grade(&mut session).unwrap();
    // !A * X is undefined whenever A is low
    assert_eq!(comparison.undefined_cells(), 4);
    assert_eq!(comparison.verdict(), Verdict::Incomplete);
    // Read as 0, row 000 disagrees with the expected 1
    assert!(!comparison.passed());
}

#[test]
fn full_adder() {
    let exercise = Exercise::get(14).unwrap();
    let mut session = CircuitSession::default();
    exercise.instantiate(&mut session);
    let (cin, a, b) = (node(&session, "Cin"), node(&session, "A"), node(&session, "B"));
    let (cout, s) = (node(&session, "Cout"), node(&session, "S"));

    // xor(x, y) = (x + y) * !(x * y), reusing x and y through connectors
    let xor = |session: &mut CircuitSession, x: (ComponentId, usize), y: (ComponentId, usize)| {
        let sx = session.add_connector(0.0, 0.0);
        let sy = session.add_connector(0.0, 0.0);
        let or = gate(session, ComponentKind::OrGate);
        let and = gate(session, ComponentKind::AndGate);
        let nand = gate(session, ComponentKind::NotGate);
        let out = gate(session, ComponentKind::AndGate);
        wire(session, x, (sx, 0));
        wire(session, y, (sy, 0));
        wire(session, (sx, 0), (or, 0));
        wire(session, (sy, 0), (or, 1));
        wire(session, (sx, 1), (and, 0));
        wire(session, (sy, 1), (and, 1));
        wire(session, (and, 0), (nand, 0));
        wire(session, (or, 0), (out, 0));
        wire(session, (nand, 0), (out, 1));
        // Spare copies of x and y on plug 3 of each connector
        ((sx, 2), (sy, 2), (out, 0))
    };

    let (a2, b2, ab) = xor(&mut session, (a, 0), (b, 0));
    let split_ab = session.add_connector(0.0, 0.0);
    wire(&mut session, ab, (split_ab, 0));
    let (cin2, ab2, sum) = xor(&mut session, (cin, 0), (split_ab, 0));
    wire(&mut session, sum, (s, 0));

    // cout = a*b + cin*(a^b)
    let generate = gate(&mut session, ComponentKind::AndGate);
    let prop = gate(&mut session, ComponentKind::AndGate);
    let carry = gate(&mut session, ComponentKind::OrGate);
    wire(&mut session, a2, (generate, 0));
    wire(&mut session, b2, (generate, 1));
    wire(&mut session, cin2, (prop, 0));
    wire(&mut session, ab2, (prop, 1));
    wire(&mut session, (generate, 0), (carry, 0));
    wire(&mut session, (prop, 0), (carry, 1));
    wire(&mut session, (carry, 0), (cout, 0));

    let comparison = exercise.grade(&mut session).unwrap();
    assert!(comparison.mismatches().is_empty(), "{:?}", comparison.mismatches());
    assert_eq!(comparison.verdict(), Verdict::Correct);
}

#[test]
fn decoder() {
    let exercise = Exercise::get(16).unwrap();
    let mut session = CircuitSession::default();
    exercise.instantiate(&mut session);
    let (a1, a0) = (node(&session, "A1"), node(&session, "A0"));
    let s1 = session.add_connector(0.0, 0.0);
    let s0 = session.add_connector(0.0, 0.0);
    let n1 = gate(&mut session, ComponentKind::NotGate);
    let n0 = gate(&mut session, ComponentKind::NotGate);
    let sn1 = session.add_connector(0.0, 0.0);
    let sn0 = session.add_connector(0.0, 0.0);
    wire(&mut session, (a1, 0), (s1, 0));
    wire(&mut session, (a0, 0), (s0, 0));
    wire(&mut session, (s1, 0), (n1, 0));
    wire(&mut session, (s0, 0), (n0, 0));
    wire(&mut session, (n1, 0), (sn1, 0));
    wire(&mut session, (n0, 0), (sn0, 0));

    // The lab numbers the lines from the top: 00 selects D3
    let lines = [
        ("D3", (sn1, 0), (sn0, 0)),
        ("D2", (sn1, 1), (s0, 1)),
        ("D1", (s1, 1), (sn0, 1)),
        ("D0", (s1, 2), (s0, 2)),
    ];
    for (label, hi, lo) in lines {
        let and = gate(&mut session, ComponentKind::AndGate);
        wire(&mut session, hi, (and, 0));
        wire(&mut session, lo, (and, 1));
        let out = node(&session, label);
        wire(&mut session, (and, 0), (out, 0));
    }

    assert_eq!(
        exercise.grade(&mut session).unwrap().verdict(),
        Verdict::Correct
    );
}

#[test]
fn encoder_only_checks_one_hot_rows() {
    let exercise = Exercise::get(17).unwrap();
    let mut session = CircuitSession::default();
    exercise.instantiate(&mut session);
    let (d1, d2, d3) = (node(&session, "D1"), node(&session, "D2"), node(&session, "D3"));
    let (o1, o0) = (node(&session, "A1"), node(&session, "A0"));
    let s3 = session.add_connector(0.0, 0.0);
    let hi = gate(&mut session, ComponentKind::OrGate);
    let lo = gate(&mut session, ComponentKind::OrGate);
    wire(&mut session, (d3, 0), (s3, 0));
    wire(&mut session, (d2, 0), (hi, 0));
    wire(&mut session, (s3, 0), (hi, 1));
    wire(&mut session, (d1, 0), (lo, 0));
    wire(&mut session, (s3, 1), (lo, 1));
    wire(&mut session, (hi, 0), (o1, 0));
    wire(&mut session, (lo, 0), (o0, 0));

    let table = session.run_truth_table().unwrap();
    assert_eq!(table.len(), 16);
    let comparison = check(&table, &exercise.expected().unwrap()).unwrap();
    assert_eq!(comparison.rows_checked(), 4);
    assert_eq!(comparison.verdict(), Verdict::Correct);
}

#[test]
fn run_table_checks_node_kinds() {
    let mut session = CircuitSession::default();
    let a = session.add_input(0.0, 0.0, "A".to_string(), Signal::Low);
    let z = session.add_output(0.0, 0.0, "Z".to_string());
    assert!(matches!(
        session.run_table(&[z], &[a]),
        Err(Error::WrongKind { .. })
    ));
    // Nothing wired: the output is undefined in every row
    let table = session.run_truth_table().unwrap();
    assert_table_eq!(table.to_string(), "A Z\n0 X\n1 X");
}

#[test]
fn wide_circuits_are_refused() {
    let mut session = CircuitSession::default();
    for i in 0..=MAX_INPUTS {
        session.add_input(0.0, 0.0, format!("I{i}"), Signal::High);
    }
    session.add_output(0.0, 0.0, "Z".to_string());
    assert!(matches!(
        session.run_truth_table(),
        Err(Error::TooManyInputs(n)) if n == MAX_INPUTS + 1
    ));
    // The live values are untouched
    let first = session.inputs()[0];
    assert_eq!(session.get_netlist().get(first).unwrap().get_value(), Some(Signal::High));
}

#[test]
fn every_exercise_sets_up() {
    for exercise in Exercise::all() {
        let mut session = CircuitSession::default();
        exercise.instantiate(&mut session);
        let expected = exercise.expected().unwrap();
        assert_eq!(session.inputs().len(), expected.get_num_inputs(), "{exercise}");
        assert_eq!(session.outputs().len(), expected.get_num_outputs(), "{exercise}");
        // An empty circuit never grades as correct
        let comparison = exercise.grade(&mut session).unwrap();
        assert_eq!(comparison.verdict(), Verdict::Incomplete, "{exercise}");
    }
}

#[cfg(feature = "serde")]
#[test]
fn exercise_from_json() {
    let json = r#"{
        "number": 19,
        "title": "Buffer",
        "inputs": [{ "label": "A", "x": 50.0, "y": 50.0 }],
        "outputs": [{ "label": "Z", "x": 1300.0, "y": 50.0 }],
        "rows": ["00", "11"]
    }"#;
    let exercise = Exercise::from_json(json.as_bytes()).unwrap();
    let mut session = CircuitSession::default();
    exercise.instantiate(&mut session);
    let (a, z) = (node(&session, "A"), node(&session, "Z"));
    wire(&mut session, (a, 0), (z, 0));
    assert_eq!(
        exercise.grade(&mut session).unwrap().verdict(),
        Verdict::Correct
    );

    let bad = r#"{ "number": 20, "title": "Bad", "inputs": [], "outputs": [], "rows": ["0"] }"#;
    assert!(matches!(
        Exercise::from_json(bad.as_bytes()),
        Err(Error::TableShape { .. })
    ));

    let clash = r#"{
        "number": 21,
        "title": "Clash",
        "inputs": [{ "label": "A", "x": 50.0, "y": 50.0 }],
        "outputs": [{ "label": "A", "x": 1300.0, "y": 50.0 }],
        "rows": ["00", "11"]
    }"#;
    assert!(matches!(
        Exercise::from_json(clash.as_bytes()),
        Err(Error::DuplicateLabel(label)) if label == "A"
    ));
}
