/*!

  Analyses over the circuit graph.

*/

#[cfg(feature = "graph")]
use crate::circuit::Connection;
use crate::circuit::{ComponentId, InputPort};
use crate::error::Error;
use crate::netlist::Netlist;
#[cfg(feature = "graph")]
use petgraph::graph::DiGraph;
use std::collections::{BTreeSet, HashMap};

/// A common trait of analyses than can be performed on a circuit.
/// An analysis becomes stale when the circuit is modified.
pub trait Analysis<'a>
where
    Self: Sized + 'a,
{
    /// Construct the analysis to the current state of the circuit.
    fn build(netlist: &'a Netlist) -> Result<Self, Error>;
}

/// A table that maps components to the components they drive
pub struct FanOutTable<'a> {
    // A reference to the underlying circuit
    _netlist: &'a Netlist,
    /// Maps a component to the input plugs it drives, in output plug order
    node_fan_out: HashMap<ComponentId, Vec<InputPort>>,
}

impl FanOutTable<'_> {
    /// Returns an iterator to the components that use `node`.
    /// A component driving two plugs of the same gate appears twice.
    pub fn get_node_users(&self, node: ComponentId) -> impl Iterator<Item = ComponentId> {
        self.get_port_users(node).map(|p| p.component())
    }

    /// Returns an iterator to the input plugs driven by `node`.
    pub fn get_port_users(&self, node: ComponentId) -> impl Iterator<Item = InputPort> {
        self.node_fan_out
            .get(&node)
            .into_iter()
            .flat_map(|users| users.iter().copied())
    }

    /// Returns `true` if any output plug of the component is wired
    pub fn node_has_uses(&self, node: ComponentId) -> bool {
        self.node_fan_out.get(&node).is_some_and(|u| !u.is_empty())
    }
}

impl<'a> Analysis<'a> for FanOutTable<'a> {
    fn build(netlist: &'a Netlist) -> Result<Self, Error> {
        let mut node_fan_out: HashMap<ComponentId, Vec<InputPort>> = HashMap::new();

        for obj in netlist.objects() {
            let users: Vec<InputPort> = netlist
                .consumers(obj.get_id())
                .map(|c| c.target())
                .collect();
            node_fan_out.insert(obj.get_id(), users);
        }

        Ok(FanOutTable {
            _netlist: netlist,
            node_fan_out,
        })
    }
}

/// A topological order of the components: every driver comes before the components it drives.
/// Ties are broken by id, so the order is stable for a given circuit.
pub struct TopologicalOrder<'a> {
    _netlist: &'a Netlist,
    order: Vec<ComponentId>,
}

impl TopologicalOrder<'_> {
    /// Returns the components in dependency order
    pub fn get_order(&self) -> &[ComponentId] {
        &self.order
    }

    /// Consumes the analysis, returning the order
    pub fn into_order(self) -> Vec<ComponentId> {
        self.order
    }
}

impl<'a> Analysis<'a> for TopologicalOrder<'a> {
    fn build(netlist: &'a Netlist) -> Result<Self, Error> {
        let mut in_degree: HashMap<ComponentId, usize> = netlist
            .objects()
            .map(|o| (o.get_id(), netlist.drivers(o.get_id()).flatten().count()))
            .collect();

        let mut ready: BTreeSet<ComponentId> = in_degree
            .iter()
            .filter(|(_, d)| **d == 0)
            .map(|(id, _)| *id)
            .collect();

        let mut order = Vec::with_capacity(netlist.len());
        while let Some(id) = ready.pop_first() {
            order.push(id);
            for c in netlist.consumers(id) {
                let succ = c.target().component();
                if let Some(d) = in_degree.get_mut(&succ) {
                    *d -= 1;
                    if *d == 0 {
                        ready.insert(succ);
                    }
                }
            }
        }

        if order.len() != netlist.len() {
            return Err(Error::CycleDetected);
        }

        Ok(TopologicalOrder {
            _netlist: netlist,
            order,
        })
    }
}

/// Computes the logic depth of every component.
/// Input nodes sit at depth 0, each gate adds one level, and connectors and output nodes add none.
/// An undriven input plug counts as depth 0.
pub struct CombDepth<'a> {
    // A reference to the underlying circuit
    _netlist: &'a Netlist,
    // Maps a component to its logic level
    comb_depth: HashMap<ComponentId, usize>,
    /// The maximum depth of the circuit
    max_depth: usize,
}

impl CombDepth<'_> {
    /// Returns the logic level of a component in the circuit.
    pub fn get_comb_depth(&self, node: ComponentId) -> Option<usize> {
        self.comb_depth.get(&node).cloned()
    }

    /// Returns the maximum logic level of the circuit.
    pub fn get_max_depth(&self) -> usize {
        self.max_depth
    }
}

impl<'a> Analysis<'a> for CombDepth<'a> {
    fn build(netlist: &'a Netlist) -> Result<Self, Error> {
        let order = TopologicalOrder::build(netlist)?.into_order();
        let mut comb_depth: HashMap<ComponentId, usize> = HashMap::new();

        for id in order {
            let obj = netlist.req(id)?;
            let base = netlist
                .drivers(id)
                .flatten()
                .filter_map(|d| comb_depth.get(&d.component()))
                .max()
                .cloned()
                .unwrap_or(0);
            let step = usize::from(obj.kind().is_gate());
            comb_depth.insert(id, base + step);
        }

        let max_depth = comb_depth.values().max().cloned().unwrap_or(0);

        Ok(CombDepth {
            _netlist: netlist,
            comb_depth,
            max_depth,
        })
    }
}

/// Returns a petgraph representation of the circuit as a directed multi-graph with type [DiGraph<ComponentId, Connection>].
#[cfg(feature = "graph")]
pub struct MultiDiGraph<'a> {
    _netlist: &'a Netlist,
    graph: DiGraph<ComponentId, Connection>,
}

#[cfg(feature = "graph")]
impl MultiDiGraph<'_> {
    /// Return a reference to the graph constructed by this analysis
    pub fn get_graph(&self) -> &DiGraph<ComponentId, Connection> {
        &self.graph
    }

    /// Renders the graph in graphviz dot format
    pub fn to_dot(&self) -> String {
        use petgraph::dot::{Config, Dot};
        format!("{:?}", Dot::with_config(&self.graph, &[Config::EdgeNoLabel]))
    }
}

#[cfg(feature = "graph")]
impl<'a> Analysis<'a> for MultiDiGraph<'a> {
    fn build(netlist: &'a Netlist) -> Result<Self, Error> {
        netlist.verify()?;
        let mut mapping = HashMap::new();
        let mut graph = DiGraph::new();

        for obj in netlist.objects() {
            let id = graph.add_node(obj.get_id());
            mapping.insert(obj.get_id(), id);
        }

        for connection in netlist.connections() {
            let s_id = mapping[&connection.src().component()];
            let t_id = mapping[&connection.target().component()];
            graph.add_edge(s_id, t_id, connection);
        }

        Ok(Self {
            _netlist: netlist,
            graph,
        })
    }
}
