//! Tree depth limiting.

use crate::error::{Error, Result};
use crate::nodes::Node;

/// Compute the depth of the tree under `root` and compare it to `max`.
///
/// The root is at depth 0.  Returns the depth when it is at most `max`, and
/// [`Error::ComplexityExceeded`] otherwise.  The walk uses an explicit
/// stack, so arbitrarily deep trees are measured without recursion.
///
/// ```rust
/// # use zmark::{check_depth, parse_document, Arena, Error, Options};
/// let arena = Arena::new();
/// let root = parse_document(&arena, "> > quoted", &Options::default());
///
/// // document > block_quote > block_quote > paragraph > text
/// assert_eq!(check_depth(root, 4), Ok(4));
/// assert_eq!(
///     check_depth(root, 3),
///     Err(Error::ComplexityExceeded { depth: 4, max: 3 })
/// );
/// ```
pub fn check_depth<'a>(root: Node<'a>, max: usize) -> Result<usize> {
    let depth = tree_depth(root);
    if depth > max {
        return Err(Error::ComplexityExceeded { depth, max });
    }
    Ok(depth)
}

/// The maximum depth of any node below `root`.
pub fn tree_depth<'a>(root: Node<'a>) -> usize {
    let mut deepest = 0;
    let mut stack = vec![(root, 0)];

    while let Some((node, depth)) = stack.pop() {
        deepest = deepest.max(depth);
        for child in node.children() {
            stack.push((child, depth + 1));
        }
    }

    deepest
}
