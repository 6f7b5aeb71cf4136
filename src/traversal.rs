//! Generic depth-first forest traversal with pre/post visitors.
//!
//! This is the driver the junction-tree constructor (`junction_tree.rs`)
//! supplies its visitors to. It knows nothing about cliques, keys, or
//! symbolic elimination — only about walking a forest and threading a
//! per-node data value whose lifetime brackets the subtree, mirroring the
//! shape of the teacher's post-order traverser state machine but expressed
//! as plain recursion with callbacks rather than an explicit resumable
//! iterator, since the core never needs to pause a traversal mid-walk.

/// Walks `forest` depth-first, left to right.
///
/// For each node, `pre_visit(node, parent_data)` runs on descent and its
/// return value becomes the `child_data` passed to every visit of that
/// node's children. After all descendants have been processed,
/// `post_visit(node, parent_data, child_data)` runs on ascent — it is given
/// both its own accumulated data and (by shared reference) the parent's, so
/// a node can report results upward the way the junction-tree constructor
/// reports a child's symbolic conditional to its parent. `root_data` is
/// passed as the synthetic parent data for every root.
///
/// A visitor failure aborts the traversal and is reported upward unmodified;
/// the driver itself never fails.
pub fn depth_first_forest<'a, N, D, E>(
    forest: &'a [N],
    root_data: &D,
    pre_visit: &mut impl FnMut(&'a N, &D) -> Result<D, E>,
    post_visit: &mut impl FnMut(&'a N, &D, D) -> Result<(), E>,
) -> Result<(), E>
where
    N: ForestNode<'a>,
{
    for node in forest {
        visit(node, root_data, pre_visit, post_visit)?;
    }
    Ok(())
}

/// What the traversal driver needs from a forest node: its children, in
/// left-to-right order.
pub trait ForestNode<'a>: Sized {
    fn children(&'a self) -> &'a [Self];
}

fn visit<'a, N, D, E>(
    node: &'a N,
    parent_data: &D,
    pre_visit: &mut impl FnMut(&'a N, &D) -> Result<D, E>,
    post_visit: &mut impl FnMut(&'a N, &D, D) -> Result<(), E>,
) -> Result<(), E>
where
    N: ForestNode<'a>,
{
    let child_data = pre_visit(node, parent_data)?;
    for child in node.children() {
        visit(child, &child_data, pre_visit, post_visit)?;
    }
    post_visit(node, parent_data, child_data)
}
