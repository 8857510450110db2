//! Nested-set forest reconstruction.
//!
//! A set of `(left, right)` coordinate pairs encodes a forest iff every two
//! intervals are either disjoint or strictly nested. [`build_forest`]
//! rebuilds the tree structure from the pairs, or reports that no such
//! forest exists.

/// The `(left, right)` coordinate pair of one node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Interval {
    pub left: i32,
    pub right: i32,
}

impl Interval {
    pub fn new(left: i32, right: i32) -> Self {
        Interval { left, right }
    }
}

/// A reconstructed node with its direct children in left-coordinate order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeNode {
    pub interval: Interval,
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    fn leaf(interval: Interval) -> Self {
        TreeNode {
            interval,
            children: Vec::new(),
        }
    }
}

/// Rebuild the forest encoded by `intervals`.
///
/// Returns the roots in left-coordinate order, or `None` when the pairs are
/// not a valid nested set: a coordinate pair with `left >= right`, two
/// intervals that overlap without one containing the other, or duplicate
/// pairs. The empty input is vacuously valid and yields an empty forest.
pub fn build_forest(intervals: &[Interval]) -> Option<Vec<TreeNode>> {
    // Sorting by left ascending, right descending makes every node appear
    // immediately before all of its descendants, siblings in left order.
    let mut sorted = intervals.to_vec();
    sorted.sort_by(|a, b| a.left.cmp(&b.left).then(b.right.cmp(&a.right)));

    let mut roots: Vec<TreeNode> = Vec::new();
    let mut stack: Vec<TreeNode> = Vec::new();

    for interval in sorted {
        if interval.left >= interval.right {
            return None;
        }

        // Ancestors of the new node are exactly the stack entries whose
        // interval still spans it; everything ending before it is complete.
        while stack
            .last()
            .map(|top| top.interval.right < interval.left)
            .unwrap_or(false)
        {
            if let Some(done) = stack.pop() {
                attach(done, &mut stack, &mut roots);
            }
        }

        match stack.last() {
            None => stack.push(TreeNode::leaf(interval)),
            Some(top) if interval.right < top.interval.right => {
                stack.push(TreeNode::leaf(interval));
            }
            // Overlap without containment, shared endpoint, or duplicate.
            Some(_) => return None,
        }
    }

    while let Some(done) = stack.pop() {
        attach(done, &mut stack, &mut roots);
    }

    Some(roots)
}

fn attach(node: TreeNode, stack: &mut Vec<TreeNode>, roots: &mut Vec<TreeNode>) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(node),
        None => roots.push(node),
    }
}
