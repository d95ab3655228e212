/*!

  The catalogue of lab exercises.

  Each exercise fixes the labelled input and output nodes of a circuit and the
  truth table the finished circuit must reproduce. Rows are written as strings,
  input cells first, in the order of the binary enumeration.

*/

use crate::circuit::Signal;
use crate::error::Error;
use crate::session::CircuitSession;
use crate::truth_table::{Comparison, TruthTable, check};
use log::info;
use std::collections::HashSet;

/// A labelled node placed by an exercise
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
pub struct NodeSpec {
    /// The label shown on the node and used as the column name
    pub label: String,
    /// Horizontal canvas position
    pub x: f64,
    /// Vertical canvas position
    pub y: f64,
}

/// A predefined scenario: node layout plus expected truth table
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
pub struct Exercise {
    number: usize,
    title: String,
    inputs: Vec<NodeSpec>,
    outputs: Vec<NodeSpec>,
    rows: Vec<String>,
}

struct Def {
    title: &'static str,
    inputs: &'static [(&'static str, f64, f64)],
    outputs: &'static [(&'static str, f64, f64)],
    rows: &'static [&'static str],
}

const IN3: &[(&str, f64, f64)] = &[("A", 50.0, 50.0), ("B", 50.0, 250.0), ("C", 50.0, 450.0)];
const IN4: &[(&str, f64, f64)] = &[
    ("A", 0.0, 50.0),
    ("B", 0.0, 150.0),
    ("C", 0.0, 250.0),
    ("D", 0.0, 350.0),
];
const IN2: &[(&str, f64, f64)] = &[("A", 50.0, 50.0), ("B", 50.0, 250.0)];
const IN2X2: &[(&str, f64, f64)] = &[
    ("A1", 50.0, 150.0),
    ("A0", 50.0, 50.0),
    ("B1", 50.0, 350.0),
    ("B0", 50.0, 250.0),
];
const Z3: &[(&str, f64, f64)] = &[("Z", 1350.0, 250.0)];
const Z2: &[(&str, f64, f64)] = &[("Z", 1350.0, 150.0)];
const Z4: &[(&str, f64, f64)] = &[("Z", 1300.0, 200.0)];

const ALL_LOW_BUT_LAST_4: &[&str] = &[
    "00000", "00010", "00100", "00110", "01000", "01010", "01100", "01110", "10000", "10010",
    "10100", "10110", "11000", "11010", "11100", "11111",
];

const CATALOGUE: &[Def] = &[
    Def {
        title: "3-input AND",
        inputs: IN3,
        outputs: Z3,
        rows: &["0000", "0010", "0100", "0110", "1000", "1010", "1100", "1111"],
    },
    Def {
        title: "4-input AND",
        inputs: IN4,
        outputs: &[("Z", 1350.0, 200.0)],
        rows: ALL_LOW_BUT_LAST_4,
    },
    Def {
        title: "3-input OR",
        inputs: IN3,
        outputs: Z3,
        rows: &["0000", "0011", "0101", "0111", "1001", "1011", "1101", "1111"],
    },
    Def {
        title: "3-input NAND",
        inputs: IN3,
        outputs: Z3,
        rows: &["0001", "0011", "0101", "0111", "1001", "1011", "1101", "1110"],
    },
    Def {
        title: "4-input NAND",
        inputs: IN4,
        outputs: Z4,
        rows: &[
            "00001", "00011", "00101", "00111", "01001", "01011", "01101", "01111", "10001",
            "10011", "10101", "10111", "11001", "11011", "11101", "11110",
        ],
    },
    Def {
        title: "3-input NOR",
        inputs: IN3,
        outputs: Z3,
        rows: &["0001", "0010", "0100", "0110", "1000", "1010", "1100", "1110"],
    },
    Def {
        title: "4-input NOR",
        inputs: IN4,
        outputs: Z4,
        rows: &[
            "00001", "00010", "00100", "00110", "01000", "01010", "01100", "01110", "10000",
            "10010", "10100", "10110", "11000", "11010", "11100", "11110",
        ],
    },
    Def {
        title: "XOR",
        inputs: IN2,
        outputs: Z2,
        rows: &["000", "011", "101", "110"],
    },
    Def {
        title: "2-bit equality comparator",
        inputs: IN2X2,
        outputs: Z4,
        rows: &[
            "00001", "00010", "00100", "00110", "01000", "01011", "01100", "01110", "10000",
            "10010", "10101", "10110", "11000", "11010", "11100", "11111",
        ],
    },
    Def {
        title: "1-bit less-than comparator",
        inputs: IN2,
        outputs: Z2,
        rows: &["000", "011", "100", "110"],
    },
    Def {
        title: "2-bit less-than comparator",
        inputs: IN2X2,
        outputs: Z4,
        rows: &[
            "00000", "00011", "00101", "00111", "01000", "01010", "01101", "01111", "10000",
            "10010", "10100", "10111", "11000", "11010", "11100", "11110",
        ],
    },
    Def {
        title: "1-bit greater-than comparator",
        inputs: IN2,
        outputs: Z2,
        rows: &["000", "010", "101", "110"],
    },
    Def {
        title: "2-bit greater-than comparator",
        inputs: IN2X2,
        outputs: &[("O", 1300.0, 200.0)],
        rows: &[
            "00000", "00010", "00100", "00110", "01001", "01010", "01100", "01110", "10001",
            "10011", "10100", "10110", "11001", "11011", "11101", "11110",
        ],
    },
    Def {
        title: "1-bit full adder",
        inputs: &[("Cin", 50.0, 50.0), ("A", 50.0, 150.0), ("B", 50.0, 250.0)],
        outputs: &[("Cout", 1300.0, 50.0), ("S", 1300.0, 150.0)],
        rows: &[
            "00000", "00101", "01001", "01110", "10001", "10110", "11010", "11111",
        ],
    },
    Def {
        title: "2-bit saturating adder",
        inputs: &[
            ("A1", 50.0, 50.0),
            ("A0", 50.0, 150.0),
            ("B1", 50.0, 300.0),
            ("B0", 50.0, 400.0),
        ],
        outputs: &[
            ("Ov", 1250.0, 150.0),
            ("S1", 1250.0, 250.0),
            ("S0", 1250.0, 350.0),
        ],
        rows: &[
            "0000000", "0001001", "0010010", "0011011", "0100001", "0101010", "0110011",
            "0111111", "1000001", "1001011", "1010111", "1011111", "1100011", "1101111",
            "1110111", "1111111",
        ],
    },
    Def {
        title: "2-to-4 decoder",
        inputs: &[("A1", 50.0, 50.0), ("A0", 50.0, 150.0)],
        outputs: &[
            ("D3", 1300.0, 150.0),
            ("D2", 1300.0, 250.0),
            ("D1", 1300.0, 350.0),
            ("D0", 1300.0, 450.0),
        ],
        rows: &["001000", "010100", "100010", "110001"],
    },
    Def {
        title: "4-to-2 encoder",
        inputs: &[
            ("D0", 50.0, 50.0),
            ("D1", 50.0, 150.0),
            ("D2", 50.0, 250.0),
            ("D3", 50.0, 350.0),
        ],
        outputs: &[("A1", 1300.0, 150.0), ("A0", 1300.0, 250.0)],
        // Only the one-hot inputs are specified
        rows: &["100000", "010001", "001010", "000111"],
    },
    Def {
        title: "1-to-8 demultiplexer",
        inputs: &[("A2", 50.0, 105.0), ("A1", 50.0, 55.0), ("A0", 50.0, 5.0)],
        outputs: &[
            ("D7", 1125.0, 450.0),
            ("D6", 1125.0, 400.0),
            ("D5", 1125.0, 350.0),
            ("D4", 1125.0, 300.0),
            ("D3", 1125.0, 250.0),
            ("D2", 1125.0, 200.0),
            ("D1", 1125.0, 150.0),
            ("D0", 1125.0, 100.0),
        ],
        rows: &[
            "00000000001",
            "00100000010",
            "01000000100",
            "01100001000",
            "10000010000",
            "10100100000",
            "11001000000",
            "11110000000",
        ],
    },
];

fn to_specs(nodes: &[(&str, f64, f64)]) -> Vec<NodeSpec> {
    nodes
        .iter()
        .map(|(label, x, y)| NodeSpec {
            label: label.to_string(),
            x: *x,
            y: *y,
        })
        .collect()
}

impl Exercise {
    /// Returns the number of built-in exercises
    pub fn count() -> usize {
        CATALOGUE.len()
    }

    /// Returns built-in exercise `number`, counting from 1
    pub fn get(number: usize) -> Result<Self, Error> {
        let def = number
            .checked_sub(1)
            .and_then(|i| CATALOGUE.get(i))
            .ok_or(Error::UnknownExercise(number))?;
        Ok(Self {
            number,
            title: def.title.to_string(),
            inputs: to_specs(def.inputs),
            outputs: to_specs(def.outputs),
            rows: def.rows.iter().map(|r| r.to_string()).collect(),
        })
    }

    /// Returns every built-in exercise, in order
    pub fn all() -> impl Iterator<Item = Self> {
        (1..=CATALOGUE.len()).filter_map(|n| Self::get(n).ok())
    }

    /// Reads an exercise from JSON, checking that its labels are distinct and its rows fit its nodes
    #[cfg(feature = "serde")]
    pub fn from_json<R: std::io::Read>(reader: R) -> Result<Self, Error> {
        let exercise: Self = serde_json::from_reader(reader)?;
        exercise.expected()?;
        Ok(exercise)
    }

    /// Returns the exercise number
    pub fn get_number(&self) -> usize {
        self.number
    }

    /// Returns a short description, like "XOR"
    pub fn get_title(&self) -> &str {
        &self.title
    }

    /// Returns the input nodes, in column order
    pub fn get_inputs(&self) -> &[NodeSpec] {
        &self.inputs
    }

    /// Returns the output nodes, in column order
    pub fn get_outputs(&self) -> &[NodeSpec] {
        &self.outputs
    }

    /// Builds the expected truth table, rejecting labels used by more than one node
    pub fn expected(&self) -> Result<TruthTable, Error> {
        let header: Vec<String> = self
            .inputs
            .iter()
            .chain(self.outputs.iter())
            .map(|n| n.label.clone())
            .collect();
        let mut seen = HashSet::new();
        if let Some(label) = header.iter().find(|l| !seen.insert(l.as_str())) {
            return Err(Error::DuplicateLabel(label.clone()));
        }
        TruthTable::from_rows(header, self.inputs.len(), self.outputs.len(), &self.rows)
    }

    /// Places the exercise's input and output nodes into `session`.
    /// Input nodes start low.
    pub fn instantiate(&self, session: &mut CircuitSession) {
        for n in self.inputs.iter() {
            session.add_input(n.x, n.y, n.label.clone(), Signal::Low);
        }
        for n in self.outputs.iter() {
            session.add_output(n.x, n.y, n.label.clone());
        }
        info!("Set up exercise {}: {}", self.number, self.title);
    }

    /// Runs the truth table of the circuit in `session` and compares it against the expected one.
    /// The session's nodes are matched to the exercise's columns by label.
    pub fn grade(&self, session: &mut CircuitSession) -> Result<Comparison, Error> {
        let find = |session: &CircuitSession, label: &str| {
            session
                .find_node(label)
                .ok_or_else(|| Error::Inconsistent(format!("no node labelled {label}")))
        };
        let inputs = self
            .inputs
            .iter()
            .map(|n| find(session, &n.label))
            .collect::<Result<Vec<_>, _>>()?;
        let outputs = self
            .outputs
            .iter()
            .map(|n| find(session, &n.label))
            .collect::<Result<Vec<_>, _>>()?;

        let result = session.run_table(&inputs, &outputs)?;
        let comparison = check(&result, &self.expected()?)?;
        info!(
            "Exercise {} ({}) graded {}",
            self.number,
            self.title,
            comparison.verdict()
        );
        Ok(comparison)
    }
}

impl std::fmt::Display for Exercise {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Exercise {}: {}", self.number, self.title)
    }
}
