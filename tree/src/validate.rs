use core::fmt;

use crate::node::RawNode;
use crate::RedBlackTree;

/// A broken red-black tree property found by [`RedBlackTree::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvariantViolation {
    /// The root is red.
    RedRoot,
    /// A red node has a red child.
    RedRedEdge,
    /// Two paths from the same node down to a missing child pass through a
    /// different number of black nodes.
    BlackHeightMismatch { left: usize, right: usize },
    /// The in-order sequence decreases somewhere.
    OutOfOrder,
    /// A child doesn't point back at its parent, or the root has a parent.
    BrokenParentLink,
    /// The stored length disagrees with the number of reachable nodes.
    LenMismatch { len: usize, nodes: usize },
}

impl fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RedRoot => write!(f, "root is red"),
            Self::RedRedEdge => write!(f, "red node has a red child"),
            Self::BlackHeightMismatch { left, right } => {
                write!(f, "black height mismatch: left {left}, right {right}")
            }
            Self::OutOfOrder => write!(f, "keys are not in order"),
            Self::BrokenParentLink => write!(f, "parent link doesn't match child link"),
            Self::LenMismatch { len, nodes } => {
                write!(f, "len is {len} but tree has {nodes} nodes")
            }
        }
    }
}

impl std::error::Error for InvariantViolation {}

impl<K: Ord> RedBlackTree<K> {
    /// Checks every red-black and ordering property of the whole tree.
    ///
    /// Returns the number of black nodes on any path from the root down to a
    /// missing child, 0 for an empty tree.
    pub fn validate(&self) -> Result<usize, InvariantViolation> {
        let Some(root) = self.root else {
            return match self.len {
                0 => Ok(0),
                len => Err(InvariantViolation::LenMismatch { len, nodes: 0 }),
            };
        };

        unsafe {
            if root.parent().is_some() {
                return Err(InvariantViolation::BrokenParentLink);
            }
            if root.is_red() {
                return Err(InvariantViolation::RedRoot);
            }
        }

        let mut prev = None;
        let mut nodes = 0;
        let black_height = unsafe { check(root, &mut prev, &mut nodes)? };

        if nodes != self.len {
            return Err(InvariantViolation::LenMismatch {
                len: self.len,
                nodes,
            });
        }

        Ok(black_height)
    }
}

/// Walks the subtree in order and returns its black height counting `node`.
unsafe fn check<'a, K: Ord>(
    node: RawNode<K>,
    prev: &mut Option<&'a K>,
    nodes: &mut usize,
) -> Result<usize, InvariantViolation> {
    unsafe {
        let mut subtree = |child: Option<RawNode<K>>, prev: &mut Option<&'a K>| match child {
            Some(child) => {
                if !child.parent().is_some_and(|p| p.same(node)) {
                    return Err(InvariantViolation::BrokenParentLink);
                }
                if node.is_red() && child.is_red() {
                    return Err(InvariantViolation::RedRedEdge);
                }
                check(child, prev, nodes)
            }
            None => Ok(0),
        };

        let left = subtree(node.left(), prev)?;

        let key: &'a K = node.key();
        if prev.is_some_and(|p| p > key) {
            return Err(InvariantViolation::OutOfOrder);
        }
        *prev = Some(key);

        let right = subtree(node.right(), prev)?;

        if left != right {
            return Err(InvariantViolation::BlackHeightMismatch { left, right });
        }

        *nodes += 1;
        Ok(left + usize::from(node.color().is_black()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Color;

    #[test]
    fn empty_tree_is_valid() {
        let tree = RedBlackTree::<i32>::new();
        assert_eq!(tree.validate(), Ok(0));
    }

    #[test]
    fn black_height() {
        let tree: RedBlackTree<i32> = [2, 1, 3].into_iter().collect();
        assert_eq!(tree.validate(), Ok(1));

        let tree: RedBlackTree<i32> = (0..100).collect();
        assert!(tree.validate().unwrap() >= 3);
    }

    #[test]
    fn detects_red_root() {
        let tree: RedBlackTree<i32> = [2, 1, 3].into_iter().collect();
        unsafe { tree.root.unwrap().set_color(Color::Red) };
        assert_eq!(tree.validate(), Err(InvariantViolation::RedRoot));
    }

    #[test]
    fn detects_red_red_edge() {
        let tree: RedBlackTree<i32> = [2, 1, 3, 4].into_iter().collect();
        // 3 is black with red child 4
        let mut three = tree.root.and_then(|r| unsafe { r.right() }).unwrap();
        unsafe { three.set_color(Color::Red) };
        assert_eq!(tree.validate(), Err(InvariantViolation::RedRedEdge));
    }

    #[test]
    fn detects_black_height_mismatch() {
        let tree: RedBlackTree<i32> = [2, 1, 3].into_iter().collect();
        let mut one = tree.root.and_then(|r| unsafe { r.left() }).unwrap();
        unsafe { one.set_color(Color::Black) };
        assert_eq!(
            tree.validate(),
            Err(InvariantViolation::BlackHeightMismatch { left: 1, right: 0 })
        );
    }

    #[test]
    fn detects_out_of_order() {
        let tree: RedBlackTree<i32> = [2, 1, 3].into_iter().collect();
        let mut one = tree.root.and_then(|r| unsafe { r.left() }).unwrap();
        let mut three = tree.root.and_then(|r| unsafe { r.right() }).unwrap();
        unsafe { one.swap_keys(&mut three) };
        assert_eq!(tree.validate(), Err(InvariantViolation::OutOfOrder));
    }

    #[test]
    fn detects_len_mismatch() {
        let mut tree: RedBlackTree<i32> = [2, 1, 3].into_iter().collect();
        tree.len = 4;
        assert_eq!(
            tree.validate(),
            Err(InvariantViolation::LenMismatch { len: 4, nodes: 3 })
        );
        tree.len = 3;
    }

    #[test]
    fn display() {
        let err = InvariantViolation::BlackHeightMismatch { left: 2, right: 1 };
        assert_eq!(err.to_string(), "black height mismatch: left 2, right 1");
        let err: Box<dyn std::error::Error> = Box::new(InvariantViolation::RedRoot);
        assert_eq!(err.to_string(), "root is red");
    }
}
