use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::mesh::{NodeId, Point3};

/// Analysis that produced a result set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResultKind {
    /// Static (elastic stiffness) load case
    Static,
    /// Eigenmode of a modal analysis
    Modal,
}

impl ResultKind {
    /// Prefix of the host-facing result name
    pub fn label(self) -> &'static str {
        match self {
            ResultKind::Static => "Elastic",
            ResultKind::Modal => "Modal",
        }
    }
}

/// One increment worth of per-node results (load case, eigenmode or time step).
///
/// `number` and `time` are `None` when the source does not carry them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultSet {
    pub name: String,
    pub kind: ResultKind,
    pub number: Option<u32>,
    pub time: Option<f64>,
    pub displacements: BTreeMap<NodeId, Point3>,
    pub stress: BTreeMap<NodeId, [f64; 6]>,
    pub strain: BTreeMap<NodeId, [f64; 6]>,
    pub temperature: BTreeMap<NodeId, f64>,
    pub mass_flow: BTreeMap<NodeId, f64>,
    pub network_pressure: BTreeMap<NodeId, f64>,
}

impl ResultSet {
    pub fn new(name: impl Into<String>, kind: ResultKind) -> Self {
        Self {
            name: name.into(),
            kind,
            number: None,
            time: None,
            displacements: BTreeMap::new(),
            stress: BTreeMap::new(),
            strain: BTreeMap::new(),
            temperature: BTreeMap::new(),
            mass_flow: BTreeMap::new(),
            network_pressure: BTreeMap::new(),
        }
    }

    /// Whether the set carries 1D-flow data that needs the inout-nodes companion.
    pub fn has_flow_data(&self) -> bool {
        !self.mass_flow.is_empty() || !self.network_pressure.is_empty()
    }

    /// Whether displacements cover exactly the nodes `1..=node_count`.
    pub fn is_dense_over(&self, node_count: usize) -> bool {
        self.displacements.len() == node_count
            && (1..=node_count).all(|id| {
                NodeId::try_from(id).is_ok_and(|id| self.displacements.contains_key(&id))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_set_has_no_metadata() {
        let set = ResultSet::new("Elastic0", ResultKind::Static);
        assert_eq!(set.number, None);
        assert_eq!(set.time, None);
        assert!(set.displacements.is_empty());
        assert!(!set.has_flow_data());
    }

    #[test]
    fn density_requires_every_node_id() {
        let mut set = ResultSet::new("Modal0", ResultKind::Modal);
        set.displacements.insert(1, [0.0; 3]);
        set.displacements.insert(3, [0.0; 3]);
        assert!(!set.is_dense_over(2));
        set.displacements.insert(2, [0.0; 3]);
        assert!(!set.is_dense_over(2));
        assert!(set.is_dense_over(3));
    }

    #[test]
    fn mass_flow_marks_flow_data() {
        let mut set = ResultSet::new("Results", ResultKind::Static);
        set.mass_flow.insert(4, 0.25);
        assert!(set.has_flow_data());
    }
}
