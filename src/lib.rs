#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs, unreachable_pub)]
/*!

`gate-lab`

A combinational logic circuit builder. Place input nodes, gates, connectors and
output nodes, wire output plugs to input plugs, and watch values propagate.
Circuits are graded by sweeping every input assignment and comparing the
resulting truth table with an exercise's expected one.

*/
#![doc = "## Simple Example\n```"]
#![doc = include_str!("main.rs")]
#![doc = "\n```"]

pub mod circuit;
pub mod error;
pub mod eval;
pub mod exercise;
pub mod graph;
pub mod netlist;
pub mod session;
pub mod truth_table;
pub mod util;
