/*!

  Push-based evaluation of a circuit.

  Each component computes its outputs from its input registers and pushes them into the
  registers of the components it drives. Visiting components in topological order means
  every register is final before its owner is visited, so one pass settles the circuit.

*/

use crate::circuit::ComponentId;
use crate::error::Error;
use crate::graph::TopologicalOrder;
use crate::netlist::Netlist;
use log::trace;
use std::collections::HashSet;

/// A schedule of components to visit when pushing values through a circuit.
/// The schedule becomes stale when the circuit is modified.
#[derive(Debug, Clone)]
pub struct Evaluator {
    order: Vec<ComponentId>,
}

impl Evaluator {
    /// Schedules every component of the circuit
    pub fn new(netlist: &Netlist) -> Result<Self, Error> {
        let order = netlist.get_analysis::<TopologicalOrder>()?.into_order();
        Ok(Self { order })
    }

    /// Schedules only `seed` and the components downstream of it
    pub fn seeded(netlist: &Netlist, seed: ComponentId) -> Result<Self, Error> {
        let reachable: HashSet<ComponentId> = netlist.dfs(seed).collect();
        let order = netlist
            .get_analysis::<TopologicalOrder>()?
            .into_order()
            .into_iter()
            .filter(|id| reachable.contains(id))
            .collect();
        Ok(Self { order })
    }

    /// Returns the visiting order
    pub fn order(&self) -> &[ComponentId] {
        &self.order
    }

    /// Visits the schedule, pushing each output plug's value to its consumer.
    /// Returns the number of values pushed.
    pub fn run(&self, netlist: &mut Netlist) -> Result<usize, Error> {
        let mut pushed = 0;
        for id in self.order.iter() {
            let Some(obj) = netlist.get(*id) else {
                continue;
            };
            let mut updates = Vec::new();
            for c in netlist.consumers(*id) {
                let value = obj.current_output(c.src().index())?;
                updates.push((c, value));
            }
            for (c, value) in updates {
                trace!("{} carries {}", c, value);
                netlist.receive(c.target(), value)?;
                pushed += 1;
            }
        }
        Ok(pushed)
    }
}

/// Re-evaluates the whole circuit from its input nodes.
pub fn evaluate_all(netlist: &mut Netlist) -> Result<usize, Error> {
    Evaluator::new(netlist)?.run(netlist)
}

/// Re-evaluates `seed` and everything downstream of it
pub fn propagate_from(netlist: &mut Netlist, seed: ComponentId) -> Result<usize, Error> {
    Evaluator::seeded(netlist, seed)?.run(netlist)
}
