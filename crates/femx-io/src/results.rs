//! Per-block displacement accumulation.

use std::collections::BTreeMap;

use femx_model::{NodeId, Point3, ResultKind, ResultSet};

/// Scratch map for one displacement block. Each block gets its own.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplacementBlock {
    kind: ResultKind,
    values: BTreeMap<NodeId, Point3>,
}

impl DisplacementBlock {
    pub fn kind(&self) -> ResultKind {
        self.kind
    }

    /// Record a row; a repeated node id overwrites the earlier row.
    pub fn insert(&mut self, node: NodeId, displacement: Point3) -> Option<Point3> {
        self.values.insert(node, displacement)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Turns displacement blocks into dense, named result sets.
#[derive(Debug, Clone)]
pub struct ResultSetBuilder {
    node_count: usize,
    results: Vec<ResultSet>,
    static_sets: usize,
    modal_sets: usize,
}

impl ResultSetBuilder {
    pub fn new(node_count: usize) -> Self {
        Self {
            node_count,
            results: Vec::new(),
            static_sets: 0,
            modal_sets: 0,
        }
    }

    pub fn node_count(&self) -> usize {
        self.node_count
    }

    /// Whether `node` lies in `1..=node_count`.
    pub fn accepts(&self, node: NodeId) -> bool {
        usize::try_from(node).is_ok_and(|n| (1..=self.node_count).contains(&n))
    }

    pub fn open_block(&self, kind: ResultKind) -> DisplacementBlock {
        DisplacementBlock {
            kind,
            values: BTreeMap::new(),
        }
    }

    /// Backfill missing nodes with zero and append the block as a result set.
    pub fn finish_block(&mut self, block: DisplacementBlock) -> &ResultSet {
        let ordinal = match block.kind {
            ResultKind::Static => &mut self.static_sets,
            ResultKind::Modal => &mut self.modal_sets,
        };
        let name = format!("{}{}", block.kind.label(), ordinal);
        *ordinal += 1;

        let mut set = ResultSet::new(name, block.kind);
        set.displacements = block.values;
        for node in 1..=self.node_count {
            if let Ok(node) = NodeId::try_from(node) {
                set.displacements.entry(node).or_insert([0.0; 3]);
            }
        }
        self.results.push(set);
        &self.results[self.results.len() - 1]
    }

    pub fn count(&self, kind: ResultKind) -> usize {
        match kind {
            ResultKind::Static => self.static_sets,
            ResultKind::Modal => self.modal_sets,
        }
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn into_results(self) -> Vec<ResultSet> {
        self.results
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finished_block_is_dense_and_zero_filled() {
        let mut builder = ResultSetBuilder::new(3);
        let mut block = builder.open_block(ResultKind::Static);
        block.insert(1, [0.1, 0.0, 0.0]);
        block.insert(3, [0.3, 0.0, -0.3]);
        let set = builder.finish_block(block);

        assert!(set.is_dense_over(3));
        assert_eq!(set.displacements[&2], [0.0, 0.0, 0.0]);
        assert_eq!(set.displacements[&3], [0.3, 0.0, -0.3]);
        assert_eq!(set.number, None);
    }

    #[test]
    fn names_count_per_kind() {
        let mut builder = ResultSetBuilder::new(1);
        for kind in [ResultKind::Static, ResultKind::Static, ResultKind::Modal] {
            let block = builder.open_block(kind);
            builder.finish_block(block);
        }
        let block = builder.open_block(ResultKind::Modal);
        builder.finish_block(block);

        let names: Vec<_> = builder
            .into_results()
            .into_iter()
            .map(|set| set.name)
            .collect();
        assert_eq!(names, ["Elastic0", "Elastic1", "Modal0", "Modal1"]);
    }

    #[test]
    fn blocks_do_not_share_values() {
        let mut builder = ResultSetBuilder::new(2);
        let mut first = builder.open_block(ResultKind::Modal);
        first.insert(1, [1.0, 1.0, 1.0]);
        builder.finish_block(first);
        let second = builder.open_block(ResultKind::Modal);
        assert!(second.is_empty());
        builder.finish_block(second);

        let results = builder.into_results();
        assert_eq!(results[1].displacements[&1], [0.0, 0.0, 0.0]);
    }

    #[test]
    fn accepts_only_declared_node_range() {
        let builder = ResultSetBuilder::new(3);
        assert!(builder.accepts(1));
        assert!(builder.accepts(3));
        assert!(!builder.accepts(0));
        assert!(!builder.accepts(4));
        assert!(!builder.accepts(-2));
    }
}
