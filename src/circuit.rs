/*!

  Signals, plugs and the components that can be placed in a circuit.

*/

use crate::error::Error;

/// The tri-state logic value carried on a wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
pub enum Signal {
    /// A logical 0
    Low,
    /// A logical 1
    High,
    /// Not yet driven by a connected, evaluated source
    #[default]
    Undefined,
}

impl Signal {
    /// Returns the signal for a boolean
    pub fn from_bit(bit: bool) -> Self {
        if bit { Signal::High } else { Signal::Low }
    }

    /// Returns the boolean value, or [None] if the signal is undefined
    pub fn as_bit(self) -> Option<bool> {
        match self {
            Signal::Low => Some(false),
            Signal::High => Some(true),
            Signal::Undefined => None,
        }
    }

    /// Reads the signal the way the lab records results: undefined counts as 0.
    pub fn as_bit_or_low(self) -> bool {
        self.as_bit().unwrap_or(false)
    }

    /// Returns `true` if the signal is [Signal::Low] or [Signal::High]
    pub fn is_defined(self) -> bool {
        !matches!(self, Signal::Undefined)
    }

    /// Returns the numeric level of the signal: 0, 1, or -1 when undefined
    pub fn level(self) -> i8 {
        match self {
            Signal::Low => 0,
            Signal::High => 1,
            Signal::Undefined => -1,
        }
    }
}

impl From<bool> for Signal {
    fn from(bit: bool) -> Self {
        Signal::from_bit(bit)
    }
}

impl TryFrom<char> for Signal {
    type Error = Error;

    fn try_from(c: char) -> Result<Self, Self::Error> {
        match c {
            '0' => Ok(Signal::Low),
            '1' => Ok(Signal::High),
            'X' | 'x' => Ok(Signal::Undefined),
            _ => Err(Error::InvalidCell(c)),
        }
    }
}

impl std::ops::Not for Signal {
    type Output = Signal;

    fn not(self) -> Self::Output {
        match self {
            Signal::Low => Signal::High,
            Signal::High => Signal::Low,
            Signal::Undefined => Signal::Undefined,
        }
    }
}

impl std::ops::BitAnd for Signal {
    type Output = Signal;

    /// A single low input forces the result low, even next to an undefined one.
    fn bitand(self, rhs: Self) -> Self::Output {
        match (self, rhs) {
            (Signal::Low, _) | (_, Signal::Low) => Signal::Low,
            (Signal::High, Signal::High) => Signal::High,
            _ => Signal::Undefined,
        }
    }
}

impl std::ops::BitOr for Signal {
    type Output = Signal;

    /// A single high input forces the result high, even next to an undefined one.
    fn bitor(self, rhs: Self) -> Self::Output {
        match (self, rhs) {
            (Signal::High, _) | (_, Signal::High) => Signal::High,
            (Signal::Low, Signal::Low) => Signal::Low,
            _ => Signal::Undefined,
        }
    }
}

impl std::fmt::Display for Signal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Signal::Low => write!(f, "0"),
            Signal::High => write!(f, "1"),
            Signal::Undefined => write!(f, "X"),
        }
    }
}

/// A stable handle to a component in a [crate::netlist::Netlist].
/// Ids are handed out by a monotonically increasing counter and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
pub struct ComponentId(usize);

impl ComponentId {
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    /// Returns the raw counter value of this id
    pub fn index(&self) -> usize {
        self.0
    }
}

impl std::fmt::Display for ComponentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// An input plug (a.k.a. plugin) of a component. Indices start at 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
pub struct InputPort {
    component: ComponentId,
    index: usize,
}

impl InputPort {
    /// Names input plug `index` of `component`
    pub fn new(component: ComponentId, index: usize) -> Self {
        Self { component, index }
    }

    /// Returns the component owning this plug
    pub fn component(&self) -> ComponentId {
        self.component
    }

    /// Returns the plug index on the component
    pub fn index(&self) -> usize {
        self.index
    }
}

impl std::fmt::Display for InputPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.in{}", self.component, self.index + 1)
    }
}

/// An output plug (a.k.a. plugout) of a component. Indices start at 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
pub struct OutputPort {
    component: ComponentId,
    index: usize,
}

impl OutputPort {
    /// Names output plug `index` of `component`
    pub fn new(component: ComponentId, index: usize) -> Self {
        Self { component, index }
    }

    /// Returns the component owning this plug
    pub fn component(&self) -> ComponentId {
        self.component
    }

    /// Returns the plug index on the component
    pub fn index(&self) -> usize {
        self.index
    }
}

impl std::fmt::Display for OutputPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.out{}", self.component, self.index + 1)
    }
}

/// Either side of a wire, used to select what to disconnect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Plug {
    /// An input plug
    Input(InputPort),
    /// An output plug
    Output(OutputPort),
}

impl Plug {
    /// Returns the component owning this plug
    pub fn component(&self) -> ComponentId {
        match self {
            Plug::Input(p) => p.component(),
            Plug::Output(p) => p.component(),
        }
    }
}

impl From<InputPort> for Plug {
    fn from(port: InputPort) -> Self {
        Plug::Input(port)
    }
}

impl From<OutputPort> for Plug {
    fn from(port: OutputPort) -> Self {
        Plug::Output(port)
    }
}

/// A wire from an output plug to an input plug
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
pub struct Connection {
    driver: OutputPort,
    input: InputPort,
}

impl Connection {
    pub(crate) fn new(driver: OutputPort, input: InputPort) -> Self {
        Self { driver, input }
    }

    /// Return the driver of the connection
    pub fn src(&self) -> OutputPort {
        self.driver
    }

    /// Returns the input port of the connection
    pub fn target(&self) -> InputPort {
        self.input
    }
}

impl std::fmt::Display for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} -> {}", self.driver, self.input)
    }
}

/// The kinds of component that can be placed on the canvas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
pub enum ComponentKind {
    /// A user-set source value
    InputNode,
    /// A terminal node displaying its result
    OutputNode,
    /// An inverter
    NotGate,
    /// A 2-input AND
    AndGate,
    /// A 2-input OR
    OrGate,
    /// A 1-input, 3-output fan-out splitter
    Connector,
}

impl ComponentKind {
    /// Returns the number of input plugs for this kind
    pub fn num_inputs(&self) -> usize {
        match self {
            ComponentKind::InputNode => 0,
            ComponentKind::OutputNode | ComponentKind::NotGate | ComponentKind::Connector => 1,
            ComponentKind::AndGate | ComponentKind::OrGate => 2,
        }
    }

    /// Returns the number of output plugs for this kind
    pub fn num_outputs(&self) -> usize {
        match self {
            ComponentKind::OutputNode => 0,
            ComponentKind::Connector => 3,
            _ => 1,
        }
    }

    /// Returns `true` for the logic gates
    pub fn is_gate(&self) -> bool {
        matches!(
            self,
            ComponentKind::NotGate | ComponentKind::AndGate | ComponentKind::OrGate
        )
    }

    /// Returns `true` for input and output nodes
    pub fn is_node(&self) -> bool {
        matches!(self, ComponentKind::InputNode | ComponentKind::OutputNode)
    }

    /// The display name given to new components of this kind
    pub fn default_name(&self) -> &'static str {
        match self {
            ComponentKind::InputNode => "Input Node",
            ComponentKind::OutputNode => "Output Node",
            ComponentKind::NotGate => "Not Gate",
            ComponentKind::AndGate => "And Gate",
            ComponentKind::OrGate => "Or Gate",
            ComponentKind::Connector => "Connector",
        }
    }
}

impl std::fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ComponentKind::InputNode => write!(f, "input"),
            ComponentKind::OutputNode => write!(f, "output"),
            ComponentKind::NotGate => write!(f, "not"),
            ComponentKind::AndGate => write!(f, "and"),
            ComponentKind::OrGate => write!(f, "or"),
            ComponentKind::Connector => write!(f, "connector"),
        }
    }
}

/// The evaluation state of a component: its held value or input registers.
/// Outputs are always computed from the registers, so a register update is
/// immediately visible on every output plug.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
pub enum Primitive {
    /// Holds a user-set value
    InputNode {
        /// The value driven onto the output plug
        value: Signal,
    },
    /// Stores the last value pushed into it
    OutputNode {
        /// The displayed result
        result: Signal,
    },
    /// Inverts its single input
    NotGate {
        /// The input register
        input: Signal,
    },
    /// Low-dominant AND of two registers
    AndGate {
        /// The input registers for plugs 0 and 1
        inputs: [Signal; 2],
    },
    /// High-dominant OR of two registers
    OrGate {
        /// The input registers for plugs 0 and 1
        inputs: [Signal; 2],
    },
    /// Repeats its input on all three outputs
    Connector {
        /// The input register
        input: Signal,
    },
}

impl Primitive {
    /// Creates the initial state for `kind`. Input nodes start low, everything else undefined.
    pub fn new(kind: ComponentKind) -> Self {
        match kind {
            ComponentKind::InputNode => Primitive::InputNode { value: Signal::Low },
            ComponentKind::OutputNode => Primitive::OutputNode {
                result: Signal::Undefined,
            },
            ComponentKind::NotGate => Primitive::NotGate {
                input: Signal::Undefined,
            },
            ComponentKind::AndGate => Primitive::AndGate {
                inputs: [Signal::Undefined; 2],
            },
            ComponentKind::OrGate => Primitive::OrGate {
                inputs: [Signal::Undefined; 2],
            },
            ComponentKind::Connector => Primitive::Connector {
                input: Signal::Undefined,
            },
        }
    }

    /// Returns the kind of this primitive
    pub fn kind(&self) -> ComponentKind {
        match self {
            Primitive::InputNode { .. } => ComponentKind::InputNode,
            Primitive::OutputNode { .. } => ComponentKind::OutputNode,
            Primitive::NotGate { .. } => ComponentKind::NotGate,
            Primitive::AndGate { .. } => ComponentKind::AndGate,
            Primitive::OrGate { .. } => ComponentKind::OrGate,
            Primitive::Connector { .. } => ComponentKind::Connector,
        }
    }

    fn register_mut(&mut self, plug: usize) -> Option<&mut Signal> {
        match self {
            Primitive::InputNode { .. } => None,
            Primitive::OutputNode { result: r }
            | Primitive::NotGate { input: r }
            | Primitive::Connector { input: r } => (plug == 0).then_some(r),
            Primitive::AndGate { inputs } | Primitive::OrGate { inputs } => inputs.get_mut(plug),
        }
    }

    /// Returns the value currently held in input register `plug`
    pub fn input_value(&self, plug: usize) -> Option<Signal> {
        match self {
            Primitive::InputNode { .. } => None,
            Primitive::OutputNode { result: r }
            | Primitive::NotGate { input: r }
            | Primitive::Connector { input: r } => (plug == 0).then_some(*r),
            Primitive::AndGate { inputs } | Primitive::OrGate { inputs } => {
                inputs.get(plug).copied()
            }
        }
    }

    /// Stores `value` into input register `plug`
    pub fn receive_input(&mut self, plug: usize, value: Signal) -> Result<(), Error> {
        let kind = self.kind();
        let register = self
            .register_mut(plug)
            .ok_or(Error::NoSuchInput { kind, index: plug })?;
        *register = value;
        Ok(())
    }

    /// Resets input register `plug` to [Signal::Undefined]. Out of range plugs are ignored.
    pub(crate) fn clear_input(&mut self, plug: usize) {
        if let Some(register) = self.register_mut(plug) {
            *register = Signal::Undefined;
        }
    }

    /// Computes the value on output plug `plug`
    pub fn current_output(&self, plug: usize) -> Result<Signal, Error> {
        let kind = self.kind();
        if plug >= kind.num_outputs() {
            return Err(Error::NoSuchOutput { kind, index: plug });
        }
        Ok(match self {
            Primitive::InputNode { value } => *value,
            // Unreachable: output nodes have no output plugs
            Primitive::OutputNode { result } => *result,
            Primitive::NotGate { input } => !*input,
            Primitive::AndGate { inputs } => inputs[0] & inputs[1],
            Primitive::OrGate { inputs } => inputs[0] | inputs[1],
            Primitive::Connector { input } => *input,
        })
    }
}

/// A position on the canvas. The core stores it for the UI and never reads it.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
pub struct Position {
    /// Horizontal coordinate
    pub x: f64,
    /// Vertical coordinate
    pub y: f64,
}

impl Position {
    /// Creates a new position
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A component placed in a circuit
#[derive(Debug, Clone)]
pub struct Component {
    id: ComponentId,
    name: String,
    label: Option<String>,
    position: Option<Position>,
    primitive: Primitive,
}

impl Component {
    pub(crate) fn new(id: ComponentId, primitive: Primitive) -> Self {
        Self {
            id,
            name: primitive.kind().default_name().to_string(),
            label: None,
            position: None,
            primitive,
        }
    }

    /// Returns the id of the component
    pub fn get_id(&self) -> ComponentId {
        self.id
    }

    /// Returns the display name of the component, like "And Gate"
    pub fn get_name(&self) -> &str {
        &self.name
    }

    /// Returns the text label of an input/output node, like "A"
    pub fn get_label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Sets the text label
    pub fn set_label(&mut self, label: String) {
        self.label = Some(label);
    }

    /// Returns the canvas position, if the UI supplied one
    pub fn get_position(&self) -> Option<Position> {
        self.position
    }

    /// Sets the canvas position
    pub fn set_position(&mut self, position: Position) {
        self.position = Some(position);
    }

    /// Returns the kind of component
    pub fn kind(&self) -> ComponentKind {
        self.primitive.kind()
    }

    /// Returns the evaluation state
    pub fn primitive(&self) -> &Primitive {
        &self.primitive
    }

    pub(crate) fn primitive_mut(&mut self) -> &mut Primitive {
        &mut self.primitive
    }

    /// Returns `true` if this is an input node
    pub fn is_an_input(&self) -> bool {
        self.kind() == ComponentKind::InputNode
    }

    /// Returns `true` if this is an output node
    pub fn is_an_output(&self) -> bool {
        self.kind() == ComponentKind::OutputNode
    }

    /// Returns the number of input plugs
    pub fn get_num_input_ports(&self) -> usize {
        self.kind().num_inputs()
    }

    /// Returns the number of output plugs
    pub fn get_num_output_ports(&self) -> usize {
        self.kind().num_outputs()
    }

    /// Returns an iterator over the input plugs of this component
    pub fn inputs(&self) -> impl Iterator<Item = InputPort> + use<> {
        let id = self.id;
        (0..self.get_num_input_ports()).map(move |i| InputPort::new(id, i))
    }

    /// Returns an iterator over the output plugs of this component
    pub fn outputs(&self) -> impl Iterator<Item = OutputPort> + use<> {
        let id = self.id;
        (0..self.get_num_output_ports()).map(move |i| OutputPort::new(id, i))
    }

    /// Returns input plug `index`, or an error if it doesn't exist
    pub fn get_input(&self, index: usize) -> Result<InputPort, Error> {
        if index < self.get_num_input_ports() {
            Ok(InputPort::new(self.id, index))
        } else {
            Err(Error::NoSuchInput {
                kind: self.kind(),
                index,
            })
        }
    }

    /// Returns output plug `index`, or an error if it doesn't exist
    pub fn get_output(&self, index: usize) -> Result<OutputPort, Error> {
        if index < self.get_num_output_ports() {
            Ok(OutputPort::new(self.id, index))
        } else {
            Err(Error::NoSuchOutput {
                kind: self.kind(),
                index,
            })
        }
    }

    /// Computes the value on output plug `plug`
    pub fn current_output(&self, plug: usize) -> Result<Signal, Error> {
        self.primitive.current_output(plug)
    }

    /// Returns the value held by an input node or displayed by an output node
    pub fn get_value(&self) -> Option<Signal> {
        match &self.primitive {
            Primitive::InputNode { value } => Some(*value),
            Primitive::OutputNode { result } => Some(*result),
            _ => None,
        }
    }
}

impl std::fmt::Display for Component {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.label {
            Some(label) => write!(f, "{} {} {}", self.kind(), label, self.id),
            None => write!(f, "{} {}", self.kind(), self.id),
        }
    }
}
