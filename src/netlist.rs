/*!

  API for the circuit graph: the components on the canvas and the wires between their plugs.

*/

use crate::{
    circuit::{
        Component, ComponentId, ComponentKind, Connection, InputPort, OutputPort, Plug, Primitive,
        Signal,
    },
    error::Error,
    eval,
    graph::{Analysis, TopologicalOrder},
};
use log::{debug, warn};
use std::collections::BTreeMap;

/// A circuit graph.
///
/// Every wire is recorded once as an edge `{driver, input}` keyed by the
/// input plug, with a reverse index from the driving output plug. Both
/// sides are always updated together, so neither component can hold half a
/// connection. Components refer to each other only through [ComponentId]s.
#[derive(Debug, Clone)]
pub struct Netlist {
    /// The name of the circuit
    name: String,
    /// The id that the next inserted component receives
    next_id: usize,
    /// The live components, in insertion order
    objects: BTreeMap<ComponentId, Component>,
    /// Maps each driven input plug to its driver
    wires: BTreeMap<InputPort, OutputPort>,
    /// Maps each used output plug to the input plug it feeds
    fan_out: BTreeMap<OutputPort, InputPort>,
}

impl Netlist {
    /// Creates a new, empty circuit with the given name
    pub fn new(name: String) -> Self {
        Self {
            name,
            next_id: 0,
            objects: BTreeMap::new(),
            wires: BTreeMap::new(),
            fan_out: BTreeMap::new(),
        }
    }

    /// Returns the name of the circuit
    pub fn get_name(&self) -> &str {
        &self.name
    }

    fn insert_object(&mut self, primitive: Primitive) -> ComponentId {
        let id = ComponentId::new(self.next_id);
        self.next_id += 1;
        debug!("Inserting {} as {}", primitive.kind(), id);
        self.objects.insert(id, Component::new(id, primitive));
        id
    }

    /// Adds an unconnected component of the given kind
    pub fn insert_component(&mut self, kind: ComponentKind) -> ComponentId {
        self.insert_object(Primitive::new(kind))
    }

    /// Inserts a labelled input node holding `value`
    pub fn insert_input(&mut self, label: String, value: Signal) -> ComponentId {
        let id = self.insert_object(Primitive::InputNode { value });
        if let Some(obj) = self.objects.get_mut(&id) {
            obj.set_label(label);
        }
        id
    }

    /// Inserts a labelled output node
    pub fn insert_output(&mut self, label: String) -> ComponentId {
        let id = self.insert_component(ComponentKind::OutputNode);
        if let Some(obj) = self.objects.get_mut(&id) {
            obj.set_label(label);
        }
        id
    }

    /// Inserts a component and wires `operands` to its input plugs, in order.
    /// Nothing is inserted if any of the wires is rejected.
    pub fn insert_gate(
        &mut self,
        kind: ComponentKind,
        operands: &[OutputPort],
    ) -> Result<ComponentId, Error> {
        if operands.len() != kind.num_inputs() {
            return Err(Error::OperandCount {
                expected: kind.num_inputs(),
                found: operands.len(),
            });
        }
        let id = self.insert_component(kind);
        for (i, operand) in operands.iter().enumerate() {
            if let Err(e) = self.connect(*operand, InputPort::new(id, i)) {
                self.remove_component(id)?;
                return Err(e);
            }
        }
        Ok(id)
    }

    /// Returns the component with the given id
    pub fn get(&self, id: ComponentId) -> Option<&Component> {
        self.objects.get(&id)
    }

    /// Returns the component with the given id mutably, to update its label or position
    pub fn get_mut(&mut self, id: ComponentId) -> Option<&mut Component> {
        self.objects.get_mut(&id)
    }

    /// Returns the component with the given id, or an error if it was never inserted or was removed
    pub fn req(&self, id: ComponentId) -> Result<&Component, Error> {
        self.objects.get(&id).ok_or(Error::UnknownComponent(id))
    }

    /// Returns `true` if the component is live
    pub fn contains(&self, id: ComponentId) -> bool {
        self.objects.contains_key(&id)
    }

    /// Returns the number of live components
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Returns `true` if the circuit has no components
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Wires `driver` to `input`.
    ///
    /// The wire is rejected, leaving the circuit untouched, if `input` already
    /// has a driver, if `driver` already has a consumer, or if the wire would
    /// close a loop. On success the driver's value is pushed downstream.
    pub fn connect(&mut self, driver: OutputPort, input: InputPort) -> Result<Connection, Error> {
        self.req(driver.component())?.get_output(driver.index())?;
        self.req(input.component())?.get_input(input.index())?;

        if let Some(existing) = self.wires.get(&input) {
            warn!("Rejecting {driver} -> {input}: input is driven by {existing}");
            return Err(Error::OccupiedInput(input, *existing));
        }
        if let Some(existing) = self.fan_out.get(&driver) {
            warn!("Rejecting {driver} -> {input}: output already drives {existing}");
            return Err(Error::OccupiedOutput(driver, *existing));
        }
        if self.reaches(input.component(), driver.component()) {
            warn!("Rejecting {driver} -> {input}: it would form a cycle");
            return Err(Error::CycleAttempt(driver, input));
        }

        self.wires.insert(input, driver);
        self.fan_out.insert(driver, input);
        debug!("Connected {driver} -> {input}");

        eval::propagate_from(self, driver.component())?;
        Ok(Connection::new(driver, input))
    }

    /// Removes the wire into `input`. Returns [None] if the plug was not driven.
    /// The input register goes back to [Signal::Undefined] and the change is pushed downstream.
    pub fn disconnect_input(&mut self, input: InputPort) -> Option<Connection> {
        let driver = self.wires.remove(&input)?;
        self.fan_out.remove(&driver);
        debug!("Disconnected {driver} -> {input}");

        if let Some(obj) = self.objects.get_mut(&input.component()) {
            obj.primitive_mut().clear_input(input.index());
        }
        if let Err(e) = eval::propagate_from(self, input.component()) {
            warn!("Propagation after disconnecting {input} failed: {e}");
        }
        Some(Connection::new(driver, input))
    }

    /// Removes the wire out of `output`. Returns [None] if the plug drove nothing.
    pub fn disconnect_output(&mut self, output: OutputPort) -> Option<Connection> {
        let input = *self.fan_out.get(&output)?;
        self.disconnect_input(input)
    }

    /// Removes the wire attached to either kind of plug
    pub fn disconnect(&mut self, plug: Plug) -> Option<Connection> {
        match plug {
            Plug::Input(input) => self.disconnect_input(input),
            Plug::Output(output) => self.disconnect_output(output),
        }
    }

    /// Severs every wire attached to the component, returning the removed wires
    pub fn disconnect_all(&mut self, id: ComponentId) -> Vec<Connection> {
        let Some(obj) = self.objects.get(&id) else {
            return Vec::new();
        };
        let plugs: Vec<Plug> = obj
            .inputs()
            .map(Plug::from)
            .chain(obj.outputs().map(Plug::from))
            .collect();
        plugs
            .into_iter()
            .filter_map(|plug| self.disconnect(plug))
            .collect()
    }

    /// Disconnects every plug of the component and then removes it.
    pub fn remove_component(&mut self, id: ComponentId) -> Result<Component, Error> {
        self.req(id)?;
        let severed = self.disconnect_all(id);
        debug!("Removing {} after severing {} wires", id, severed.len());
        self.objects.remove(&id).ok_or(Error::UnknownComponent(id))
    }

    /// Returns the output plug driving `input`
    pub fn get_driver(&self, input: InputPort) -> Option<OutputPort> {
        self.wires.get(&input).copied()
    }

    /// Returns the input plug fed by `output`
    pub fn get_consumer(&self, output: OutputPort) -> Option<InputPort> {
        self.fan_out.get(&output).copied()
    }

    /// Returns the drivers of each input plug of the component, in plug order
    pub fn drivers(&self, id: ComponentId) -> impl Iterator<Item = Option<OutputPort>> + '_ {
        let n = self.objects.get(&id).map_or(0, |o| o.get_num_input_ports());
        (0..n).map(move |i| self.get_driver(InputPort::new(id, i)))
    }

    /// Returns the wires leaving the component, in output plug order
    pub fn consumers(&self, id: ComponentId) -> impl Iterator<Item = Connection> + '_ {
        self.fan_out
            .range(OutputPort::new(id, 0)..=OutputPort::new(id, usize::MAX))
            .map(|(o, i)| Connection::new(*o, *i))
    }

    /// Returns `true` if every input plug of the component is driven
    pub fn is_fully_connected(&self, id: ComponentId) -> bool {
        self.drivers(id).all(|d| d.is_some())
    }

    /// Returns `true` if `to` is downstream of (or equal to) `from`
    pub fn reaches(&self, from: ComponentId, to: ComponentId) -> bool {
        self.dfs(from).any(|id| id == to)
    }

    /// Sets the value held by an input node and pushes it downstream
    pub fn set_input_value(&mut self, id: ComponentId, value: Signal) -> Result<(), Error> {
        let obj = self.objects.get_mut(&id).ok_or(Error::UnknownComponent(id))?;
        match obj.primitive_mut() {
            Primitive::InputNode { value: held } => *held = value,
            other => {
                return Err(Error::WrongKind {
                    id,
                    found: other.kind(),
                    expected: ComponentKind::InputNode,
                });
            }
        }
        eval::propagate_from(self, id)?;
        Ok(())
    }

    /// Returns the value displayed by an output node
    pub fn get_result(&self, id: ComponentId) -> Result<Signal, Error> {
        match self.req(id)?.primitive() {
            Primitive::OutputNode { result } => Ok(*result),
            other => Err(Error::WrongKind {
                id,
                found: other.kind(),
                expected: ComponentKind::OutputNode,
            }),
        }
    }

    /// Stores `value` in the register behind `input`
    pub(crate) fn receive(&mut self, input: InputPort, value: Signal) -> Result<(), Error> {
        self.objects
            .get_mut(&input.component())
            .ok_or(Error::UnknownComponent(input.component()))?
            .primitive_mut()
            .receive_input(input.index(), value)
    }

    /// Recomputes every component from the current input node values
    pub fn evaluate(&mut self) -> Result<(), Error> {
        eval::evaluate_all(self).map(|_| ())
    }

    /// Constructs an analysis of the circuit.
    pub fn get_analysis<'a, A: Analysis<'a>>(&'a self) -> Result<A, Error> {
        A::build(self)
    }

    /// Verifies that the edge index is symmetric, that every wire lands on a
    /// real plug, and that the circuit is acyclic.
    pub fn verify(&self) -> Result<(), Error> {
        if self.wires.len() != self.fan_out.len() {
            return Err(Error::Inconsistent(format!(
                "{} wires but {} fan-out entries",
                self.wires.len(),
                self.fan_out.len()
            )));
        }
        for (input, driver) in self.wires.iter() {
            if self.fan_out.get(driver) != Some(input) {
                return Err(Error::Inconsistent(format!(
                    "{driver} -> {input} is missing from the fan-out index"
                )));
            }
            self.req(driver.component())?.get_output(driver.index())?;
            self.req(input.component())?.get_input(input.index())?;
        }
        self.get_analysis::<TopologicalOrder>()?;
        Ok(())
    }
}

impl Netlist {
    /// Returns an iterator over the components in insertion order.
    pub fn objects(&self) -> impl Iterator<Item = &Component> {
        self.objects.values()
    }

    /// Returns an iterator over the components that satisfy `filter`.
    pub fn matches<F>(&self, filter: F) -> impl Iterator<Item = &Component>
    where
        F: Fn(&ComponentKind) -> bool,
    {
        self.objects().filter(move |o| filter(&o.kind()))
    }

    /// Returns an iterator over the input nodes
    pub fn inputs(&self) -> impl Iterator<Item = &Component> {
        self.objects().filter(|o| o.is_an_input())
    }

    /// Returns an iterator over the output nodes
    pub fn outputs(&self) -> impl Iterator<Item = &Component> {
        self.objects().filter(|o| o.is_an_output())
    }

    /// Returns an iterator over the wires, ordered by the input plug they drive.
    pub fn connections(&self) -> impl Iterator<Item = Connection> + '_ {
        self.wires.iter().map(|(i, o)| Connection::new(*o, *i))
    }

    /// Returns a depth-first iterator over the components downstream of `from`.
    pub fn dfs(&self, from: ComponentId) -> iter::DFSIterator<'_> {
        iter::DFSIterator::new(self, from)
    }
}

/// Filter components by kind. Use it like you would `matches!`.
/// Example: ```filter_nodes!(netlist, ComponentKind::AndGate | ComponentKind::OrGate);```
#[macro_export]
macro_rules! filter_nodes {
    ($netlist:ident, $pattern:pat $(if $guard:expr)? $(,)?) => {
        $netlist.matches(|f| match f {
            $pattern $(if $guard)? => true,
            _ => false
        })
    };
}

/// A collection of iterators for the circuit
pub mod iter {

    use super::Netlist;
    use crate::circuit::ComponentId;
    use std::collections::HashSet;

    /// A depth-first iterator over the components downstream of a starting component.
    /// Each component is yielded once, in pre-order.
    /// # Examples
    ///
    /// ```
    /// use gate_lab::circuit::{ComponentKind, Signal};
    /// use gate_lab::netlist::Netlist;
    /// use gate_lab::netlist::iter::DFSIterator;
    ///
    /// let mut netlist = Netlist::new("example".to_string());
    /// let a = netlist.insert_input("a".to_string(), Signal::Low);
    /// let mut nodes = Vec::new();
    /// let mut dfs = DFSIterator::new(&netlist, a);
    /// while let Some(n) = dfs.next() {
    ///     if dfs.check_cycles() {
    ///         panic!("Cycle detected in the circuit");
    ///     }
    ///     nodes.push(n);
    /// }
    /// assert_eq!(nodes, vec![a]);
    /// ```
    pub struct DFSIterator<'a> {
        netlist: &'a Netlist,
        stack: Vec<(ComponentId, bool)>,
        visited: HashSet<ComponentId>,
        finished: HashSet<ComponentId>,
        cycles: bool,
    }

    impl<'a> DFSIterator<'a> {
        /// Create a new DFS iterator for the circuit starting at `from`.
        pub fn new(netlist: &'a Netlist, from: ComponentId) -> Self {
            Self {
                netlist,
                stack: vec![(from, false)],
                visited: HashSet::new(),
                finished: HashSet::new(),
                cycles: false,
            }
        }
    }

    impl DFSIterator<'_> {
        /// Check if the DFS traversal has encountered a cycle yet.
        pub fn check_cycles(&self) -> bool {
            self.cycles
        }

        /// Consumes the iterator to detect cycles in the circuit.
        pub fn detect_cycles(mut self) -> bool {
            while self.next().is_some() {
                if self.cycles {
                    return true;
                }
            }
            self.cycles
        }
    }

    impl Iterator for DFSIterator<'_> {
        type Item = ComponentId;

        fn next(&mut self) -> Option<Self::Item> {
            while let Some((id, expanded)) = self.stack.pop() {
                if expanded {
                    self.finished.insert(id);
                    continue;
                }
                if !self.netlist.contains(id) || !self.visited.insert(id) {
                    continue;
                }
                self.stack.push((id, true));
                let succs: Vec<ComponentId> = self
                    .netlist
                    .consumers(id)
                    .map(|c| c.target().component())
                    .collect();
                // Reversed so that lower output plugs are walked first
                for succ in succs.into_iter().rev() {
                    if self.visited.contains(&succ) {
                        if !self.finished.contains(&succ) {
                            self.cycles = true;
                        }
                    } else {
                        self.stack.push((succ, false));
                    }
                }
                return Some(id);
            }
            None
        }
    }
}

impl std::fmt::Display for Netlist {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "circuit {} (", self.name)?;
        let indent = " ".repeat(2);
        for obj in self.objects() {
            write!(f, "{indent}{obj}")?;
            let drivers: Vec<String> = self
                .drivers(obj.get_id())
                .map(|d| d.map_or("-".to_string(), |o| o.to_string()))
                .collect();
            if !drivers.is_empty() {
                write!(f, " <- ({})", drivers.join(", "))?;
            }
            let values: Vec<String> = obj
                .outputs()
                .filter_map(|o| obj.current_output(o.index()).ok())
                .map(|s| s.to_string())
                .collect();
            match obj.get_value() {
                Some(v) if obj.is_an_output() => writeln!(f, " = {v}")?,
                _ => writeln!(f, " = {}", values.join(""))?,
            }
        }
        writeln!(f, ");")?;
        for c in self.connections() {
            writeln!(f, "{indent}wire {c};")?;
        }
        writeln!(f, "end")
    }
}

/// A type alias for the circuit graph, under the name used by the lab
pub type CircuitGraph = Netlist;
