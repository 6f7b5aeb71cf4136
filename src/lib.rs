//! Builds a junction (clique) tree from an elimination tree by bottom-up
//! symbolic elimination and clique merging.
//!
//! The input is an [`EliminationTree`]: a forest where each node carries one
//! key and the factors assigned to it. [`build_junction_tree`] walks it
//! post-order, eliminating each node's key against its own factors and its
//! children's symbolic residuals, then absorbing any child clique whose
//! separator is now exactly the current clique's separator plus its own
//! frontal keys. The result is a [`JunctionTree`] of [`JunctionTreeNode`]
//! cliques, each with an ordered frontal-key list, a collected factor list,
//! and a `problem_size` estimate propagated from every absorbed subtree.
//!
//! This crate never inspects factor values: it works purely at the level of
//! key sets, through the one-method [`SymbolicKeys`] trait. Plugging in a
//! concrete probabilistic factor type, and doing anything numeric with the
//! resulting tree, is left to the caller.
#![warn(
    missing_docs,
    clippy::unwrap_in_result,
    clippy::unwrap_used,
    clippy::panic,
    clippy::panic_in_result_fn,
    clippy::float_cmp,
    clippy::float_cmp_const,
    clippy::missing_panics_doc,
    clippy::todo
)]

mod elimination_tree;
mod errors;
mod factor;
mod junction_tree;
mod key;
mod symbolic;
mod traversal;

pub use elimination_tree::{EliminationTree, EliminationTreeNode};
pub use errors::{JunctionTreeError, PreconditionViolation};
pub use factor::SymbolicKeys;
pub use junction_tree::{build_junction_tree, JunctionTree, JunctionTreeNode};
pub use key::Key;
pub use symbolic::{eliminate_symbolic, SymbolicConditional, SymbolicFactor};
