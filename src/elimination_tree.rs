//! The input side of the core: an already-built elimination tree, borrowed
//! read-only for the duration of [`crate::build_junction_tree`].

use std::rc::Rc;

use crate::errors::PreconditionViolation;
use crate::factor::SymbolicKeys;
use crate::key::Key;
use crate::traversal::ForestNode;

/// One node of an elimination tree: a single eliminated `key`, the numeric
/// factors assigned to it, and its children.
///
/// A well-formed elimination tree satisfies: each factor is attached to
/// exactly one node — the deepest node whose key is among the factor's keys.
/// Constructing nodes via [`EliminationTree::from_roots`] checks the cheaper
/// half of that invariant (a factor's keys must include its own node's key);
/// it cannot check "deepest", since that depends on the rest of the tree the
/// upstream variable-ordering stage is responsible for building correctly.
#[derive(Clone, Debug)]
pub struct EliminationTreeNode<F> {
    /// The variable eliminated at this node.
    pub key: Key,
    /// Factors assigned to this node; each must mention `key`.
    pub factors: Vec<Rc<F>>,
    /// Children, eliminated before this node.
    pub children: Vec<EliminationTreeNode<F>>,
}

impl<F: SymbolicKeys> EliminationTreeNode<F> {
    /// Builds a node, rejecting factors that do not mention `key`.
    pub fn new(
        key: Key,
        factors: Vec<Rc<F>>,
        children: Vec<EliminationTreeNode<F>>,
    ) -> Result<Self, PreconditionViolation> {
        for factor in &factors {
            if !factor.keys().contains(&key) {
                return Err(PreconditionViolation::FactorMissingKey {
                    node_key: key,
                    factor_keys: factor.keys().to_vec(),
                });
            }
        }
        Ok(Self {
            key,
            factors,
            children,
        })
    }
}

/// A forest of elimination trees plus the factors the upstream stage could
/// not assign to any node (e.g. unary factors on keys eliminated elsewhere).
#[derive(Clone, Debug, Default)]
pub struct EliminationTree<F> {
    /// Top-level nodes, in no particular required order.
    pub roots: Vec<EliminationTreeNode<F>>,
    /// Factors the upstream stage could not assign to any node.
    pub remaining_factors: Vec<Rc<F>>,
}

impl<'a, F> ForestNode<'a> for EliminationTreeNode<F> {
    fn children(&'a self) -> &'a [Self] {
        &self.children
    }
}

impl<F: SymbolicKeys> EliminationTree<F> {
    /// Builds a forest from already-validated nodes.
    pub fn from_roots(roots: Vec<EliminationTreeNode<F>>, remaining_factors: Vec<Rc<F>>) -> Self {
        Self {
            roots,
            remaining_factors,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbolic::SymbolicFactor;

    fn k(v: u64) -> Key {
        Key(v)
    }

    #[test]
    fn node_rejects_factor_missing_its_own_key() {
        let factor = Rc::new(SymbolicFactor::new([k(2), k(3)]));
        let err = EliminationTreeNode::new(k(1), vec![factor], vec![]).unwrap_err();
        match err {
            PreconditionViolation::FactorMissingKey { node_key, .. } => {
                assert_eq!(node_key, k(1));
            }
        }
    }

    #[test]
    fn node_accepts_factor_containing_its_key() {
        let factor = Rc::new(SymbolicFactor::new([k(1), k(2)]));
        let node = EliminationTreeNode::new(k(1), vec![factor], vec![]).unwrap();
        assert_eq!(node.key, k(1));
    }
}
