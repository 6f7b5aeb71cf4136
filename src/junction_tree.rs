//! The junction-tree constructor: the heart of this crate.
//!
//! Supplies a pre-visitor and a post-visitor to [`crate::traversal`]'s
//! generic depth-first forest driver. On descent the pre-visitor allocates
//! a fresh clique and links it under its parent's clique. On ascent the
//! post-visitor runs symbolic elimination over the node's own factors plus
//! every child's symbolic residual, then absorbs every child whose
//! conditional's parent count exceeds the current clique's by exactly the
//! clique's current frontal count.

use std::cell::RefCell;
use std::rc::Rc;

use crate::elimination_tree::{EliminationTree, EliminationTreeNode};
use crate::errors::JunctionTreeError;
use crate::factor::SymbolicKeys;
use crate::key::Key;
use crate::symbolic::{eliminate_symbolic_keys, SymbolicConditional, SymbolicFactor};
use crate::traversal::depth_first_forest;

/// One clique of the output junction tree.
#[derive(Clone, Debug)]
pub struct JunctionTreeNode<F> {
    /// Keys jointly eliminated in this clique. Lists the key of the
    /// elimination-tree node that created this clique first, followed by
    /// the keys contributed by every absorbed subtree, in the *reverse* of
    /// absorption order (see the key-ordering resolution in `DESIGN.md`).
    pub ordered_frontal_keys: Vec<Key>,
    /// Numeric factors assigned to this clique, in source order with
    /// merge-time concatenation.
    pub factors: Vec<Rc<F>>,
    /// Child cliques that were not absorbed into this one.
    pub children: Vec<JunctionTreeNode<F>>,
    /// Monotone integer estimate used later for scheduling: the max of this
    /// clique's own `conditional.size() * factor_count` and the
    /// `problem_size` of every subtree absorbed into it.
    pub problem_size: u64,
}

/// The output forest: top-level cliques plus factors the elimination tree
/// never assigned to any node.
#[derive(Clone, Debug)]
pub struct JunctionTree<F> {
    /// Top-level cliques, in the same order as the input forest's roots.
    pub roots: Vec<JunctionTreeNode<F>>,
    /// Factors the elimination tree never assigned to any node, passed
    /// through unchanged.
    pub remaining_factors: Vec<Rc<F>>,
}

/// Mutable clique under construction. Frozen into an immutable
/// [`JunctionTreeNode`] once the traversal completes.
struct CliqueBuilder<F> {
    ordered_frontal_keys: Vec<Key>,
    factors: Vec<Rc<F>>,
    children: Vec<Rc<RefCell<CliqueBuilder<F>>>>,
    problem_size: u64,
}

impl<F> Clone for CliqueBuilder<F> {
    fn clone(&self) -> Self {
        Self {
            ordered_frontal_keys: self.ordered_frontal_keys.clone(),
            factors: self.factors.clone(),
            children: self.children.clone(),
            problem_size: self.problem_size,
        }
    }
}

/// Per-node traversal data: this node's own clique, plus the symbolic
/// conditionals and residual factors its children report upward as they
/// complete. A raw back-reference to the parent's data is unnecessary here
/// since the generic driver hands each visitor the parent data directly;
/// see the design note in `traversal.rs`.
struct TraversalData<F> {
    clique: Rc<RefCell<CliqueBuilder<F>>>,
    child_conditionals: RefCell<Vec<SymbolicConditional>>,
    child_residuals: RefCell<Vec<SymbolicFactor>>,
}

impl<F> TraversalData<F> {
    fn new_dummy_root() -> Self {
        Self {
            clique: Rc::new(RefCell::new(CliqueBuilder {
                ordered_frontal_keys: Vec::new(),
                factors: Vec::new(),
                children: Vec::new(),
                problem_size: 0,
            })),
            child_conditionals: RefCell::new(Vec::new()),
            child_residuals: RefCell::new(Vec::new()),
        }
    }
}

/// Builds a junction tree from an already-built elimination tree.
///
/// The elimination tree is borrowed read-only for the duration of
/// construction; its factors are shared (by `Rc`) with the output cliques,
/// never copied or mutated.
pub fn build_junction_tree<F: SymbolicKeys>(
    tree: &EliminationTree<F>,
) -> Result<JunctionTree<F>, JunctionTreeError> {
    let span = tracing::info_span!(
        "build_junction_tree",
        roots = tree.roots.len(),
        remaining_factors = tree.remaining_factors.len()
    );
    let _enter = span.enter();

    let root_data = TraversalData::new_dummy_root();

    let mut pre_visit = |node: &EliminationTreeNode<F>,
                          parent_data: &TraversalData<F>|
     -> Result<TraversalData<F>, JunctionTreeError> {
        tracing::trace!(key = node.key.0, "pre-visit");
        let clique = Rc::new(RefCell::new(CliqueBuilder {
            ordered_frontal_keys: vec![node.key],
            factors: node.factors.clone(),
            children: Vec::new(),
            problem_size: 0,
        }));
        parent_data
            .clique
            .borrow_mut()
            .children
            .push(Rc::clone(&clique));
        Ok(TraversalData {
            clique,
            child_conditionals: RefCell::new(Vec::new()),
            child_residuals: RefCell::new(Vec::new()),
        })
    };

    let mut post_visit = |node: &EliminationTreeNode<F>,
                          parent_data: &TraversalData<F>,
                          my_data: TraversalData<F>|
     -> Result<(), JunctionTreeError> {
        // Step 1: symbolic elimination over this node's own factors plus
        // every child's residual, child order preserved.
        let child_residuals = my_data.child_residuals.borrow();
        let factor_key_slices = node
            .factors
            .iter()
            .map(|f| f.keys())
            .chain(child_residuals.iter().map(|r| r.keys()));
        let (cond, residual) = eliminate_symbolic_keys(factor_key_slices, &[node.key]);
        let nr_children = child_residuals.len();
        drop(child_residuals);

        tracing::trace!(
            key = node.key.0,
            nr_parents = cond.nr_parents(),
            "eliminated"
        );

        parent_data.child_conditionals.borrow_mut().push(cond.clone());
        parent_data.child_residuals.borrow_mut().push(residual);

        // Step 2: merge bookkeeping, against the original parent and frontal
        // counts. Per the worked Y-shape example (spec scenario 2), every
        // child in this loop is judged against the *same* pre-loop
        // `my_nr_parents + my_nr_frontals`, not a running total — two
        // siblings that each independently close off this node's separator
        // both merge, rather than only the first.
        let my_nr_frontals: usize = 1;
        let my_nr_parents = cond.nr_parents();
        let mut combined_problem_size =
            cond.size() as u64 * (node.factors.len() + nr_children) as u64;

        let child_conditionals = my_data.child_conditionals.borrow().clone();
        let mut clique = my_data.clique.borrow_mut();

        if clique.children.len() != child_conditionals.len() {
            let msg = format!(
                "clique has {} children but {} child conditionals were recorded for node {}",
                clique.children.len(),
                child_conditionals.len(),
                node.key
            );
            tracing::warn!("{msg}");
            return Err(JunctionTreeError::Internal(msg));
        }

        // Step 3: merge loop, left to right. `i - nr_merged` indexes into the
        // surviving prefix of original children; absorbed grandchildren are
        // appended to the tail below and never shift that prefix.
        //
        // Each absorbed child's already-finalized frontal-key list is kept
        // aside rather than spliced in immediately: stitching them onto
        // `clique.ordered_frontal_keys` happens once, after the loop, in the
        // reverse of absorption order (see the final step below) so that
        // `ordered_frontal_keys[0]` ends up as this node's own key, per the
        // crate's documented resolution of the key-order open question.
        let mut nr_merged = 0usize;
        let mut absorbed_frontals: Vec<Vec<Key>> = Vec::new();
        for (i, child_cond) in child_conditionals.iter().enumerate() {
            if child_cond.nr_parents() == my_nr_parents + my_nr_frontals {
                let idx = i - nr_merged;
                let child_rc = clique.children.remove(idx);
                let child = Rc::try_unwrap(child_rc)
                    .map(RefCell::into_inner)
                    .unwrap_or_else(|rc| rc.borrow().clone());

                absorbed_frontals.push(child.ordered_frontal_keys);
                clique.factors.extend(child.factors);
                clique.children.extend(child.children);
                combined_problem_size = combined_problem_size.max(child.problem_size);
                nr_merged += 1;
            }
        }

        // Step 4 & 5: splice absorbed frontal keys in reverse absorption
        // order, then record the size.
        for frontal in absorbed_frontals.into_iter().rev() {
            clique.ordered_frontal_keys.extend(frontal);
        }
        clique.problem_size = combined_problem_size;

        Ok(())
    };

    depth_first_forest(&tree.roots, &root_data, &mut pre_visit, &mut post_visit)?;

    let roots = root_data
        .clique
        .borrow_mut()
        .children
        .drain(..)
        .map(freeze)
        .collect();

    Ok(JunctionTree {
        roots,
        remaining_factors: tree.remaining_factors.clone(),
    })
}

fn freeze<F>(node: Rc<RefCell<CliqueBuilder<F>>>) -> JunctionTreeNode<F> {
    let builder = Rc::try_unwrap(node)
        .map(RefCell::into_inner)
        .unwrap_or_else(|rc| rc.borrow().clone());
    JunctionTreeNode {
        ordered_frontal_keys: builder.ordered_frontal_keys,
        factors: builder.factors,
        children: builder.children.into_iter().map(freeze).collect(),
        problem_size: builder.problem_size,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbolic::SymbolicFactor;

    fn k(v: u64) -> Key {
        Key(v)
    }

    fn leaf(key: Key, factors: Vec<SymbolicFactor>) -> EliminationTreeNode<SymbolicFactor> {
        EliminationTreeNode::new(key, factors.into_iter().map(Rc::new).collect(), Vec::new())
            .unwrap()
    }

    fn node(
        key: Key,
        factors: Vec<SymbolicFactor>,
        children: Vec<EliminationTreeNode<SymbolicFactor>>,
    ) -> EliminationTreeNode<SymbolicFactor> {
        EliminationTreeNode::new(key, factors.into_iter().map(Rc::new).collect(), children)
            .unwrap()
    }

    #[test]
    fn empty_forest_yields_empty_output() {
        let tree: EliminationTree<SymbolicFactor> = EliminationTree::from_roots(Vec::new(), Vec::new());
        let jt = build_junction_tree(&tree).unwrap();
        assert!(jt.roots.is_empty());
        assert!(jt.remaining_factors.is_empty());
    }

    #[test]
    fn single_node_single_factor() {
        let n = leaf(k(1), vec![SymbolicFactor::new([k(1)])]);
        let tree = EliminationTree::from_roots(vec![n], Vec::new());
        let jt = build_junction_tree(&tree).unwrap();
        assert_eq!(jt.roots.len(), 1);
        let root = &jt.roots[0];
        assert_eq!(root.ordered_frontal_keys, vec![k(1)]);
        assert_eq!(root.factors.len(), 1);
        assert!(root.children.is_empty());
    }

    #[test]
    fn remaining_factors_pass_through_verbatim() {
        let remaining = vec![Rc::new(SymbolicFactor::new([k(9)]))];
        let tree: EliminationTree<SymbolicFactor> =
            EliminationTree::from_roots(Vec::new(), remaining.clone());
        let jt = build_junction_tree(&tree).unwrap();
        assert_eq!(jt.remaining_factors.len(), 1);
        assert_eq!(jt.remaining_factors[0].keys(), remaining[0].keys());
    }

    #[test]
    fn chain_fully_merges_into_one_clique() {
        // A single factor over all three keys, attached to the deepest node
        // (1, the leaf), is the "every node's conditional has exactly one
        // more parent than its child's" staircase case: eliminating 1 from
        // {1,2,3} leaves parents {2,3} (nrParents=2); node 2 (no own
        // factors) eliminates down to parents {3} (nrParents=1) and merges
        // node 1 (2 == myNrParents(1)+myNrFrontals(1)); node 3, the root (no
        // own factors), eliminates to no parents and merges node 2's
        // already-merged clique (1 == myNrParents(0)+myNrFrontals(1)).
        let leaf1 = leaf(k(1), vec![SymbolicFactor::new([k(1), k(2), k(3)])]);
        let mid2 = node(k(2), vec![], vec![leaf1]);
        let root3 = node(k(3), vec![], vec![mid2]);
        let tree = EliminationTree::from_roots(vec![root3], Vec::new());

        let jt = build_junction_tree(&tree).unwrap();
        assert_eq!(jt.roots.len(), 1);
        let clique = &jt.roots[0];
        assert!(clique.children.is_empty());
        assert_eq!(clique.factors.len(), 1);
        assert_eq!(clique.ordered_frontal_keys, vec![k(3), k(2), k(1)]);
    }

    #[test]
    fn y_shape_both_children_merge() {
        let l1 = leaf(k(1) /* X */, vec![SymbolicFactor::new([k(1), k(3)])]);
        let l2 = leaf(k(2) /* Y */, vec![SymbolicFactor::new([k(2), k(3)])]);
        let root = node(k(3) /* Z */, vec![], vec![l1, l2]);
        let tree = EliminationTree::from_roots(vec![root], Vec::new());

        let jt = build_junction_tree(&tree).unwrap();
        assert_eq!(jt.roots.len(), 1);
        let clique = &jt.roots[0];
        assert!(clique.children.is_empty());
        // Z first, then absorbed children in reverse absorption order (Y, X).
        assert_eq!(clique.ordered_frontal_keys, vec![k(3), k(2), k(1)]);
        assert_eq!(clique.factors.len(), 2);
    }

    #[test]
    fn y_shape_one_child_does_not_merge() {
        // L1(key=X=1, factors=[{X,Z},{X,W}]) -> conditional X|Z,W (nrParents=2)
        // L2(key=Y=2, factors=[{Y,Z}])       -> conditional Y|Z   (nrParents=1)
        // R(key=Z=3)
        let l1 = leaf(
            k(1),
            vec![
                SymbolicFactor::new([k(1), k(3)]),
                SymbolicFactor::new([k(1), k(4)]),
            ],
        );
        let l2 = leaf(k(2), vec![SymbolicFactor::new([k(2), k(3)])]);
        let root = node(k(3), vec![], vec![l1, l2]);
        let tree = EliminationTree::from_roots(vec![root], Vec::new());

        let jt = build_junction_tree(&tree).unwrap();
        let clique = &jt.roots[0];
        assert_eq!(clique.ordered_frontal_keys, vec![k(3), k(1)]);
        assert_eq!(clique.children.len(), 1);
        assert_eq!(clique.children[0].ordered_frontal_keys, vec![k(2)]);
    }

    #[test]
    fn two_root_forest_preserves_input_order() {
        let a = leaf(k(1), vec![SymbolicFactor::new([k(1)])]);
        let b = leaf(k(2), vec![SymbolicFactor::new([k(2)])]);
        let tree = EliminationTree::from_roots(vec![a, b], Vec::new());

        let jt = build_junction_tree(&tree).unwrap();
        assert_eq!(jt.roots.len(), 2);
        assert_eq!(jt.roots[0].ordered_frontal_keys, vec![k(1)]);
        assert_eq!(jt.roots[1].ordered_frontal_keys, vec![k(2)]);
    }

    #[test]
    fn only_the_merging_middle_child_is_absorbed() {
        // Root Z=3 has three children. B=2 and C=4 connect to Z alone
        // (nrParents=1 each, residual={3}), leaking no extra keys into the
        // root's own conditional. A=1 connects to Z plus one extra key 7
        // (nrParents=2, residual={3,7}) — that extra 7 is exactly what the
        // root's own conditional picks up (myNrParents=1, since B and C's
        // residuals contribute nothing beyond Z, which is eliminated here).
        // Threshold = myNrParents(1) + myNrFrontals(1) = 2, matching only A's
        // nrParents; B and C's nrParents(1) falls short and neither merges.
        let no_merge_1 = leaf(k(2), vec![SymbolicFactor::new([k(2), k(3)])]);
        let merges = leaf(k(1), vec![SymbolicFactor::new([k(1), k(3), k(7)])]);
        let no_merge_2 = leaf(k(4), vec![SymbolicFactor::new([k(4), k(3)])]);
        let root = node(k(3), vec![], vec![no_merge_1, merges, no_merge_2]);
        let tree = EliminationTree::from_roots(vec![root], Vec::new());

        let jt = build_junction_tree(&tree).unwrap();
        let clique = &jt.roots[0];
        assert_eq!(clique.ordered_frontal_keys, vec![k(3), k(1)]);
        assert_eq!(clique.children.len(), 2);
        assert_eq!(clique.children[0].ordered_frontal_keys, vec![k(2)]);
        assert_eq!(clique.children[1].ordered_frontal_keys, vec![k(4)]);
    }

    #[test]
    fn problem_size_propagates_from_absorbed_child() {
        // A wide leaf (5 factors all pinned on key 1) gives itself a large
        // problem_size with no merge involved: size(6) * factor_count(5) = 30.
        let wide_leaf = leaf(
            k(1),
            vec![
                SymbolicFactor::new([k(1), k(2)]),
                SymbolicFactor::new([k(1), k(3)]),
                SymbolicFactor::new([k(1), k(4)]),
                SymbolicFactor::new([k(1), k(5)]),
                SymbolicFactor::new([k(1), k(6)]),
            ],
        );
        // mid(key=2) has no own factors; eliminating 2 from the wide leaf's
        // residual {2,3,4,5,6} leaves parents {3,4,5,6} (nrParents=4). Since
        // myNrParents(4) + myNrFrontals(1) == 5 == wide_leaf's own
        // nrParents, it merges, but mid's own combined size (5*1=5) is far
        // smaller than the absorbed leaf's problem_size (30).
        let mid = node(k(2), vec![], vec![wide_leaf]);
        let tree = EliminationTree::from_roots(vec![mid], Vec::new());

        let jt = build_junction_tree(&tree).unwrap();
        let clique = &jt.roots[0];
        assert!(clique.children.is_empty(), "wide leaf should have merged");
        assert_eq!(clique.problem_size, 30);
    }
}
