/*!

  Truth tables: exhaustive input enumeration, result collection and grading.

*/

use crate::circuit::{ComponentId, ComponentKind, Signal};
use crate::error::Error;
use crate::netlist::Netlist;
use bitvec::vec::BitVec;
use log::{debug, info};

/// One row of input values, most significant bit first
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
pub struct Assignment(BitVec);

impl Assignment {
    /// Returns the binary representation of `index`, zero-padded to `width` bits
    pub fn from_index(index: usize, width: usize) -> Self {
        Self((0..width).rev().map(|b| (index >> b) & 1 == 1).collect())
    }

    /// Returns the number of bits
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` for the empty assignment of a circuit with no inputs
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the value of bit `i`, counting from the most significant
    pub fn get(&self, i: usize) -> Option<Signal> {
        self.0.get(i).map(|b| Signal::from_bit(*b))
    }

    /// Returns an iterator over the bits as signals
    pub fn signals(&self) -> impl Iterator<Item = Signal> + '_ {
        self.0.iter().map(|b| Signal::from_bit(*b))
    }
}

impl std::fmt::Display for Assignment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for b in self.0.iter() {
            write!(f, "{}", if *b { '1' } else { '0' })?;
        }
        Ok(())
    }
}

/// Lazily enumerates every `n`-bit assignment from 0 to 2^n - 1.
/// Row `i` is the binary representation of `i`.
///
/// # Panics
///
/// Panics if `n` is too large for the row count to fit in a `usize`.
pub fn generate_assignments(n: usize) -> impl Iterator<Item = Assignment> {
    assert!(
        n < usize::BITS as usize,
        "Cannot enumerate 2^{n} assignments"
    );
    (0..1usize << n).map(move |i| Assignment::from_index(i, n))
}

/// A truth table: input columns followed by output columns.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
pub struct TruthTable {
    header: Vec<String>,
    num_inputs: usize,
    num_outputs: usize,
    rows: Vec<Vec<Signal>>,
}

impl TruthTable {
    /// Creates an empty table. The header names every input column then every output column.
    pub fn new(header: Vec<String>, num_inputs: usize, num_outputs: usize) -> Result<Self, Error> {
        if header.len() != num_inputs + num_outputs {
            return Err(Error::TableShape {
                expected: num_inputs + num_outputs,
                found: header.len(),
            });
        }
        Ok(Self {
            header,
            num_inputs,
            num_outputs,
            rows: Vec::new(),
        })
    }

    /// Builds a table from rows written as strings of `0`, `1` and `X`, like `"0110"`
    pub fn from_rows<S: AsRef<str>>(
        header: Vec<String>,
        num_inputs: usize,
        num_outputs: usize,
        rows: &[S],
    ) -> Result<Self, Error> {
        let mut table = Self::new(header, num_inputs, num_outputs)?;
        for row in rows {
            let row = row
                .as_ref()
                .chars()
                .filter(|c| !c.is_whitespace())
                .map(Signal::try_from)
                .collect::<Result<Vec<_>, _>>()?;
            table.push_row(row)?;
        }
        Ok(table)
    }

    /// Appends a row, which must span every column
    pub fn push_row(&mut self, row: Vec<Signal>) -> Result<(), Error> {
        if row.len() != self.width() {
            return Err(Error::TableShape {
                expected: self.width(),
                found: row.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    /// Returns the column names
    pub fn get_header(&self) -> &[String] {
        &self.header
    }

    /// Returns the number of input columns
    pub fn get_num_inputs(&self) -> usize {
        self.num_inputs
    }

    /// Returns the number of output columns
    pub fn get_num_outputs(&self) -> usize {
        self.num_outputs
    }

    /// Returns the number of columns
    pub fn width(&self) -> usize {
        self.num_inputs + self.num_outputs
    }

    /// Returns the number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns `true` if the table has no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns an iterator over the rows
    pub fn rows(&self) -> impl Iterator<Item = &[Signal]> {
        self.rows.iter().map(|r| r.as_slice())
    }

    /// Returns row `i`
    pub fn get_row(&self, i: usize) -> Option<&[Signal]> {
        self.rows.get(i).map(|r| r.as_slice())
    }

    /// Returns the output cells of the first row whose input cells equal `inputs`
    pub fn lookup(&self, inputs: &[Signal]) -> Option<&[Signal]> {
        self.rows()
            .find(|r| &r[..self.num_inputs] == inputs)
            .map(|r| &r[self.num_inputs..])
    }

    /// Returns `true` if the table lists one row per input combination
    pub fn is_complete(&self) -> bool {
        self.num_inputs < usize::BITS as usize && self.rows.len() == 1usize << self.num_inputs
    }

    /// Returns the rows as bit strings, reading undefined cells as 0
    pub fn to_bits(&self) -> Vec<String> {
        self.rows
            .iter()
            .map(|r| {
                r.iter()
                    .map(|s| if s.as_bit_or_low() { '1' } else { '0' })
                    .collect()
            })
            .collect()
    }
}

impl std::fmt::Display for TruthTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let widths: Vec<usize> = self.header.iter().map(|h| h.len().max(1)).collect();
        let header: Vec<String> = self
            .header
            .iter()
            .zip(widths.iter().copied())
            .map(|(h, w)| format!("{h:>w$}"))
            .collect();
        writeln!(f, "{}", header.join(" "))?;
        for row in self.rows.iter() {
            let cells: Vec<String> = row
                .iter()
                .zip(widths.iter().copied())
                .map(|(s, w)| format!("{:>w$}", s.to_string()))
                .collect();
            writeln!(f, "{}", cells.join(" "))?;
        }
        Ok(())
    }
}

fn column_name(netlist: &Netlist, id: ComponentId) -> Result<String, Error> {
    let obj = netlist.req(id)?;
    Ok(obj
        .get_label()
        .map_or_else(|| id.to_string(), |l| l.to_string()))
}

/// The most input nodes [run_all] will sweep, i.e. about a million rows
pub const MAX_INPUTS: usize = 20;

fn require_kind(netlist: &Netlist, id: ComponentId, expected: ComponentKind) -> Result<(), Error> {
    let found = netlist.req(id)?.kind();
    if found != expected {
        return Err(Error::WrongKind {
            id,
            found,
            expected,
        });
    }
    Ok(())
}

/// Sweeps every assignment of `inputs`, recording the results on `outputs`.
///
/// Row `i` sets the input nodes, in order, to the bits of `i` and reads each
/// output node after propagation. Undefined results are kept as
/// [Signal::Undefined]. The input nodes get their previous values back
/// afterwards, so the live view is unchanged.
///
/// # Errors
///
/// Returns [Error::TooManyInputs] for more than [MAX_INPUTS] inputs, since the
/// table doubles with every input.
pub fn run_all(
    netlist: &mut Netlist,
    inputs: &[ComponentId],
    outputs: &[ComponentId],
) -> Result<TruthTable, Error> {
    for id in inputs {
        require_kind(netlist, *id, ComponentKind::InputNode)?;
    }
    for id in outputs {
        require_kind(netlist, *id, ComponentKind::OutputNode)?;
    }
    if inputs.len() > MAX_INPUTS {
        return Err(Error::TooManyInputs(inputs.len()));
    }

    let header = inputs
        .iter()
        .chain(outputs.iter())
        .map(|id| column_name(netlist, *id))
        .collect::<Result<Vec<_>, _>>()?;
    let mut table = TruthTable::new(header, inputs.len(), outputs.len())?;

    let saved = inputs
        .iter()
        .map(|id| Ok(netlist.req(*id)?.get_value().unwrap_or_default()))
        .collect::<Result<Vec<Signal>, Error>>()?;

    info!(
        "Running {} rows over {} inputs and {} outputs of {}",
        1usize << inputs.len(),
        inputs.len(),
        outputs.len(),
        netlist.get_name()
    );

    for assignment in generate_assignments(inputs.len()) {
        for (id, value) in inputs.iter().zip(assignment.signals()) {
            netlist.set_input_value(*id, value)?;
        }
        let mut row: Vec<Signal> = assignment.signals().collect();
        for id in outputs {
            row.push(netlist.get_result(*id)?);
        }
        let results: String = row[inputs.len()..].iter().map(|s| s.to_string()).collect();
        debug!("{assignment} -> {results}");
        table.push_row(row)?;
    }

    for (id, value) in inputs.iter().zip(saved) {
        netlist.set_input_value(*id, value)?;
    }
    Ok(table)
}

/// A row where the circuit disagrees with the expected table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowDiff {
    /// The input cells of the row
    pub inputs: Vec<Signal>,
    /// The expected output cells
    pub expected: Vec<Signal>,
    /// The recorded output cells, or [None] if the result lacks this row
    pub actual: Option<Vec<Signal>>,
}

impl std::fmt::Display for RowDiff {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let cells = |s: &[Signal]| s.iter().map(|c| c.to_string()).collect::<String>();
        match &self.actual {
            Some(actual) => write!(
                f,
                "{}: expected {}, got {}",
                cells(&self.inputs),
                cells(&self.expected),
                cells(actual)
            ),
            None => write!(f, "{}: missing row", cells(&self.inputs)),
        }
    }
}

/// The overall outcome of grading a circuit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Every compared row matches
    Correct,
    /// Some row differs
    Incorrect,
    /// Some output was never driven, so the circuit is not finished
    Incomplete,
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Verdict::Correct => write!(f, "correct"),
            Verdict::Incorrect => write!(f, "incorrect"),
            Verdict::Incomplete => write!(f, "incomplete"),
        }
    }
}

/// The per-row result of comparing a recorded table against an expected one
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comparison {
    rows_checked: usize,
    mismatches: Vec<RowDiff>,
    undefined_cells: usize,
}

impl Comparison {
    /// Returns the number of expected rows that were compared
    pub fn rows_checked(&self) -> usize {
        self.rows_checked
    }

    /// Returns the rows that differ, reading undefined results as 0
    pub fn mismatches(&self) -> &[RowDiff] {
        &self.mismatches
    }

    /// Returns the number of undefined output cells where the expected cell is defined
    pub fn undefined_cells(&self) -> usize {
        self.undefined_cells
    }

    /// Returns `true` if every cell matches with undefined results read as 0.
    /// This is the lenient check: an unfinished circuit whose missing outputs are
    /// all expected to be 0 still passes. Use [Comparison::verdict] to tell them apart.
    pub fn passed(&self) -> bool {
        self.mismatches.is_empty()
    }

    /// Returns the strict outcome, with unfinished circuits reported separately
    pub fn verdict(&self) -> Verdict {
        if self.undefined_cells > 0 {
            Verdict::Incomplete
        } else if !self.mismatches.is_empty() {
            Verdict::Incorrect
        } else {
            Verdict::Correct
        }
    }
}

fn cell_matches(actual: Signal, expected: Signal) -> bool {
    match expected {
        Signal::Undefined => true,
        _ => actual.as_bit_or_low() == expected.as_bit_or_low(),
    }
}

/// Compares a recorded table against an expected one.
///
/// Rows are paired by their input cells, so the expected table may list only
/// some of the input combinations. The rest are don't-care. An `X` in an
/// expected output cell matches anything.
pub fn check(result: &TruthTable, expected: &TruthTable) -> Result<Comparison, Error> {
    if result.num_inputs != expected.num_inputs {
        return Err(Error::TableShape {
            expected: expected.num_inputs,
            found: result.num_inputs,
        });
    }
    if result.num_outputs != expected.num_outputs {
        return Err(Error::TableShape {
            expected: expected.width(),
            found: result.width(),
        });
    }

    let n = expected.num_inputs;
    let mut mismatches = Vec::new();
    let mut undefined_cells = 0;

    for row in expected.rows() {
        let (inputs, want) = row.split_at(n);
        match result.lookup(inputs) {
            Some(got) => {
                undefined_cells += got
                    .iter()
                    .zip(want)
                    .filter(|(a, e)| e.is_defined() && !a.is_defined())
                    .count();
                if !got.iter().zip(want).all(|(a, e)| cell_matches(*a, *e)) {
                    mismatches.push(RowDiff {
                        inputs: inputs.to_vec(),
                        expected: want.to_vec(),
                        actual: Some(got.to_vec()),
                    });
                }
            }
            None => mismatches.push(RowDiff {
                inputs: inputs.to_vec(),
                expected: want.to_vec(),
                actual: None,
            }),
        }
    }

    let comparison = Comparison {
        rows_checked: expected.len(),
        mismatches,
        undefined_cells,
    };
    info!(
        "Checked {} rows: {} mismatched, {} undefined cells, {}",
        comparison.rows_checked,
        comparison.mismatches.len(),
        comparison.undefined_cells,
        comparison.verdict()
    );
    Ok(comparison)
}
