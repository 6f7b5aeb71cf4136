use core::fmt;

/// An opaque handle identifying a variable in the factor graph.
///
/// Mirrors the role of a node index in an arena-backed tree: callers obtain
/// `Key`s from whatever variable-ordering stage built the elimination tree
/// and never construct them from raw semantics the core cares about.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Key(
    /// The raw variable index.
    pub u64,
);

impl From<u64> for Key {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
