use crate::key::Key;

/// The one-method contract the junction-tree core requires of a factor type.
///
/// Any concrete numeric factor plugs into [`crate::build_junction_tree`] by
/// implementing this trait; the core never evaluates, linearizes, or
/// otherwise inspects content beyond the set of keys a factor involves.
pub trait SymbolicKeys {
    /// Returns the keys this factor involves, in no particular guaranteed
    /// order (callers that need first-appearance order should dedupe at the
    /// point of use, as [`crate::symbolic::eliminate_symbolic`] does).
    fn keys(&self) -> &[Key];
}

impl SymbolicKeys for crate::symbolic::SymbolicFactor {
    fn keys(&self) -> &[Key] {
        &self.keys
    }
}

impl<F: SymbolicKeys + ?Sized> SymbolicKeys for std::rc::Rc<F> {
    fn keys(&self) -> &[Key] {
        F::keys(self)
    }
}
