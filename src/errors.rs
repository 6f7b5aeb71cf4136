use crate::key::Key;

/// Input to [`crate::build_junction_tree`] violates a precondition the core
/// relies on. Always fatal; the core does not attempt partial construction.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum PreconditionViolation {
    /// A factor was attached to a node whose key does not appear among the
    /// factor's own keys.
    #[error(
        "factor with keys {factor_keys:?} attached to node {node_key}, which is not among them"
    )]
    FactorMissingKey { node_key: Key, factor_keys: Vec<Key> },
}

/// The two fatal failure modes of the core (spec §7): a malformed input
/// tree, or an internal assertion about traversal/visitor pairing.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum JunctionTreeError {
    /// See [`PreconditionViolation`].
    #[error(transparent)]
    PreconditionViolation(#[from] PreconditionViolation),

    /// The number of clique children did not match the number of recorded
    /// child symbolic conditionals when entering the merge loop. This
    /// indicates a bug in the traversal driver or visitor pairing, not a
    /// malformed input.
    #[error("internal invariant violated: {0}")]
    Internal(String),
}
