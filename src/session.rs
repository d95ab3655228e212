/*!

  The interactive layer: one circuit being edited, plus the state of the
  current gesture.

  A UI reports clicks on plugs and requests for new components. The session
  turns them into circuit edits and re-evaluates the circuit after each one,
  so output nodes always show the values for the current input nodes.

*/

use crate::circuit::{
    Component, ComponentId, ComponentKind, Connection, InputPort, OutputPort, Plug, Position,
    Primitive, Signal,
};
use crate::error::Error;
use crate::netlist::Netlist;
use crate::truth_table::{TruthTable, run_all};
use log::{info, warn};

/// What the session is waiting for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// No gesture in progress
    #[default]
    Idle,
    /// An output plug was picked and the next input plug click completes the wire
    Connecting(OutputPort),
}

/// The effect of a click on a plug
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickOutcome {
    /// The output plug was picked as the source of a new wire
    StartedConnecting(OutputPort),
    /// A wire was made
    Connected(Connection),
    /// A wire was removed
    Disconnected(Connection),
    /// The pending wire was dropped
    Cancelled,
    /// Nothing to do
    Ignored,
}

/// A circuit under construction, owned by a single editing session
#[derive(Debug, Clone)]
pub struct CircuitSession {
    netlist: Netlist,
    inputs: Vec<ComponentId>,
    outputs: Vec<ComponentId>,
    mode: Mode,
}

impl Default for CircuitSession {
    fn default() -> Self {
        Self::new("circuit".to_string())
    }
}

impl CircuitSession {
    /// Starts a session on an empty circuit
    pub fn new(name: String) -> Self {
        Self {
            netlist: Netlist::new(name),
            inputs: Vec::new(),
            outputs: Vec::new(),
            mode: Mode::Idle,
        }
    }

    /// Returns the circuit being edited
    pub fn get_netlist(&self) -> &Netlist {
        &self.netlist
    }

    /// Returns the current gesture state
    pub fn get_mode(&self) -> Mode {
        self.mode
    }

    /// Returns the input nodes in the order they were added
    pub fn inputs(&self) -> &[ComponentId] {
        &self.inputs
    }

    /// Returns the output nodes in the order they were added
    pub fn outputs(&self) -> &[ComponentId] {
        &self.outputs
    }

    /// Finds the input or output node with the given label
    pub fn find_node(&self, label: &str) -> Option<ComponentId> {
        self.inputs
            .iter()
            .chain(self.outputs.iter())
            .copied()
            .find(|id| {
                self.netlist
                    .get(*id)
                    .and_then(|o| o.get_label())
                    .is_some_and(|l| l == label)
            })
    }

    fn place(&mut self, id: ComponentId, x: f64, y: f64) {
        if let Some(obj) = self.netlist.get_mut(id) {
            obj.set_position(Position::new(x, y));
        }
    }

    /// Adds a labelled input node at `(x, y)` holding `value`
    pub fn add_input(&mut self, x: f64, y: f64, label: String, value: Signal) -> ComponentId {
        let id = self.netlist.insert_input(label, value);
        self.place(id, x, y);
        self.inputs.push(id);
        id
    }

    /// Adds a labelled output node at `(x, y)`
    pub fn add_output(&mut self, x: f64, y: f64, label: String) -> ComponentId {
        let id = self.netlist.insert_output(label);
        self.place(id, x, y);
        self.outputs.push(id);
        id
    }

    /// Adds an unconnected gate at `(x, y)`. Connectors are accepted too.
    pub fn add_gate(&mut self, kind: ComponentKind, x: f64, y: f64) -> Result<ComponentId, Error> {
        if kind.is_node() {
            return Err(Error::NotAGate(kind));
        }
        let id = self.netlist.insert_component(kind);
        self.place(id, x, y);
        Ok(id)
    }

    /// Adds an unconnected connector at `(x, y)`
    pub fn add_connector(&mut self, x: f64, y: f64) -> ComponentId {
        let id = self.netlist.insert_component(ComponentKind::Connector);
        self.place(id, x, y);
        id
    }

    /// Wires `driver` to `input` and re-evaluates
    pub fn request_connect(
        &mut self,
        driver: OutputPort,
        input: InputPort,
    ) -> Result<Connection, Error> {
        let c = self.netlist.connect(driver, input)?;
        self.evaluate_all()?;
        Ok(c)
    }

    /// Removes the wire on `plug`, if any, and re-evaluates
    pub fn request_disconnect(&mut self, plug: Plug) -> Result<Option<Connection>, Error> {
        let c = self.netlist.disconnect(plug);
        self.evaluate_all()?;
        Ok(c)
    }

    /// Deletes a gate or connector after severing its wires.
    /// Input and output nodes belong to the exercise and cannot be deleted.
    pub fn delete_component(&mut self, id: ComponentId) -> Result<Component, Error> {
        if self.netlist.req(id)?.kind().is_node() {
            warn!("Refusing to delete node {id}");
            return Err(Error::ProtectedNode(id));
        }
        if matches!(self.mode, Mode::Connecting(pending) if pending.component() == id) {
            self.mode = Mode::Idle;
        }
        let obj = self.netlist.remove_component(id)?;
        self.evaluate_all()?;
        Ok(obj)
    }

    /// Sets the value of an input node and propagates it
    pub fn set_input(&mut self, id: ComponentId, value: Signal) -> Result<(), Error> {
        self.netlist.set_input_value(id, value)
    }

    /// Flips an input node between low and high, returning its new value
    pub fn toggle_input(&mut self, id: ComponentId) -> Result<Signal, Error> {
        let value = match self.netlist.req(id)?.primitive() {
            Primitive::InputNode { value } => !*value,
            other => {
                return Err(Error::WrongKind {
                    id,
                    found: other.kind(),
                    expected: ComponentKind::InputNode,
                });
            }
        };
        // An undefined input toggles to high
        let value = if value.is_defined() { value } else { Signal::High };
        self.set_input(id, value)?;
        Ok(value)
    }

    /// Re-evaluates the whole circuit from its input nodes
    pub fn evaluate_all(&mut self) -> Result<(), Error> {
        self.netlist.evaluate()
    }

    /// Returns the value shown by an output node
    pub fn get_result(&self, id: ComponentId) -> Result<Signal, Error> {
        self.netlist.get_result(id)
    }

    /// Runs the truth table over every input node and output node, in the order they were added
    pub fn run_truth_table(&mut self) -> Result<TruthTable, Error> {
        let inputs = self.inputs.clone();
        let outputs = self.outputs.clone();
        self.run_table(&inputs, &outputs)
    }

    /// Runs the truth table over the given nodes
    pub fn run_table(
        &mut self,
        inputs: &[ComponentId],
        outputs: &[ComponentId],
    ) -> Result<TruthTable, Error> {
        run_all(&mut self.netlist, inputs, outputs)
    }

    /// Returns the boolean expression computed at a component, such as `(!A*B)`.
    /// AND is written `*`, OR `+` and NOT `!`. Input nodes appear by label.
    pub fn probe(&self, id: ComponentId) -> Result<String, Error> {
        let obj = self.netlist.req(id)?;
        let mut operands = Vec::with_capacity(obj.get_num_input_ports());
        for (i, driver) in self.netlist.drivers(id).enumerate() {
            let Some(driver) = driver else {
                warn!("Probe of {id} stopped at undriven plug {}", i + 1);
                return Err(Error::NotConnectedToInput(id));
            };
            operands.push(self.probe(driver.component())?);
        }
        let expr = match obj.kind() {
            ComponentKind::InputNode => obj
                .get_label()
                .map_or_else(|| id.to_string(), |l| l.to_string()),
            ComponentKind::NotGate => format!("!{}", operands[0]),
            ComponentKind::AndGate => format!("({}*{})", operands[0], operands[1]),
            ComponentKind::OrGate => format!("({}+{})", operands[0], operands[1]),
            ComponentKind::Connector | ComponentKind::OutputNode => operands.remove(0),
        };
        Ok(expr)
    }

    /// Handles a click on an output plug.
    ///
    /// While idle, a free plug starts a new wire and a wired plug is disconnected.
    /// While connecting, clicking the pending plug again cancels, and clicking
    /// another free plug picks it instead.
    pub fn click_output(&mut self, port: OutputPort) -> Result<ClickOutcome, Error> {
        self.netlist.req(port.component())?.get_output(port.index())?;
        let occupied = self.netlist.get_consumer(port).is_some();
        match self.mode {
            Mode::Connecting(pending) if pending == port => Ok(self.cancel()),
            Mode::Connecting(_) if occupied => {
                warn!("Ignoring click on {port}: it already drives a wire");
                Ok(ClickOutcome::Ignored)
            }
            Mode::Idle if occupied => match self.request_disconnect(Plug::Output(port))? {
                Some(c) => Ok(ClickOutcome::Disconnected(c)),
                None => Ok(ClickOutcome::Ignored),
            },
            _ => {
                self.mode = Mode::Connecting(port);
                Ok(ClickOutcome::StartedConnecting(port))
            }
        }
    }

    /// Handles a click on an input side of `component`.
    ///
    /// Completes the pending wire when connecting. With no plug given, the
    /// first free input plug is used. A click on an occupied plug leaves the
    /// pending wire in place and is ignored.
    pub fn click_input(
        &mut self,
        component: ComponentId,
        plug: Option<usize>,
    ) -> Result<ClickOutcome, Error> {
        let Mode::Connecting(driver) = self.mode else {
            return Ok(ClickOutcome::Ignored);
        };
        let obj = self.netlist.req(component)?;
        let target = match plug {
            Some(i) => Some(obj.get_input(i)?),
            None => obj
                .inputs()
                .find(|p| self.netlist.get_driver(*p).is_none()),
        };
        let Some(target) = target else {
            warn!("Ignoring click on {component}: no free input plug");
            return Ok(ClickOutcome::Ignored);
        };
        match self.request_connect(driver, target) {
            Ok(c) => {
                self.mode = Mode::Idle;
                Ok(ClickOutcome::Connected(c))
            }
            Err(e) if e.is_illegal_connection() => Ok(ClickOutcome::Ignored),
            Err(e) => Err(e),
        }
    }

    /// Drops the pending wire, if any
    pub fn cancel(&mut self) -> ClickOutcome {
        match std::mem::take(&mut self.mode) {
            Mode::Idle => ClickOutcome::Ignored,
            Mode::Connecting(port) => {
                info!("Cancelled wire from {port}");
                ClickOutcome::Cancelled
            }
        }
    }
}
