/*!

  Errors raised while building, evaluating and grading circuits.

*/

use crate::circuit::{ComponentId, ComponentKind, InputPort, OutputPort};
use thiserror::Error;

/// The error type for every fallible operation in the crate
#[derive(Debug, Error)]
pub enum Error {
    /// The id does not name a live component
    #[error("No component with id {0}")]
    UnknownComponent(ComponentId),

    /// The component kind has no such input plug
    #[error("A {kind} component has no input plug {index}")]
    NoSuchInput {
        /// The kind of the component
        kind: ComponentKind,
        /// The requested plug index
        index: usize,
    },

    /// The component kind has no such output plug
    #[error("A {kind} component has no output plug {index}")]
    NoSuchOutput {
        /// The kind of the component
        kind: ComponentKind,
        /// The requested plug index
        index: usize,
    },

    /// The input plug already has a driver
    #[error("Input {0} is already driven by {1}")]
    OccupiedInput(InputPort, OutputPort),

    /// The output plug already has a consumer
    #[error("Output {0} already drives {1}")]
    OccupiedOutput(OutputPort, InputPort),

    /// A gate was inserted with the wrong number of operands
    #[error("Expected {expected} operands, got {found}")]
    OperandCount {
        /// The number of input plugs of the gate
        expected: usize,
        /// The number of operands supplied
        found: usize,
    },

    /// The requested wire would close a loop
    #[error("Connecting {0} to {1} would form a cycle")]
    CycleAttempt(OutputPort, InputPort),

    /// An analysis found a loop in the circuit
    #[error("Cycle detected in the circuit")]
    CycleDetected,

    /// The component is not of the expected kind
    #[error("Component {id} is a {found} node, expected {expected}")]
    WrongKind {
        /// The offending component
        id: ComponentId,
        /// Its actual kind
        found: ComponentKind,
        /// The kind the operation needs
        expected: ComponentKind,
    },

    /// Input and output nodes are placed with a label, not as gates
    #[error("A {0} node is not a gate")]
    NotAGate(ComponentKind),

    /// A probed chain ends on an undriven plug
    #[error("Part of your circuit is not connected to an input!")]
    NotConnectedToInput(ComponentId),

    /// Input and output nodes belong to the exercise and stay put
    #[error("You cannot delete an input/output node.")]
    ProtectedNode(ComponentId),

    /// Two tables, or a table and a row, disagree on their columns
    #[error("Truth table shape mismatch: expected {expected} columns, got {found}")]
    TableShape {
        /// The width the table requires
        expected: usize,
        /// The width that was supplied
        found: usize,
    },

    /// A truth table cell is not 0, 1 or X
    #[error("Invalid truth table cell '{0}'")]
    InvalidCell(char),

    /// The inputs cannot be enumerated
    #[error("Cannot enumerate the assignments of {0} inputs")]
    TooManyInputs(usize),

    /// No exercise with this number
    #[error("No exercise numbered {0}")]
    UnknownExercise(usize),

    /// Two nodes of an exercise share a label
    #[error("Label {0} names more than one node")]
    DuplicateLabel(String),

    /// The edge index and the component table disagree
    #[error("Circuit is inconsistent: {0}")]
    Inconsistent(String),

    /// Failed to read or write JSON
    #[cfg(feature = "serde")]
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Returns `true` for rejected connections to an occupied plug.
    /// A UI typically ignores these gestures.
    pub fn is_illegal_connection(&self) -> bool {
        matches!(self, Error::OccupiedInput(..) | Error::OccupiedOutput(..))
    }
}
