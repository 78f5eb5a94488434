//! An ordered set backed by a red-black tree.
//!
//! Insertion, lookup and deletion take `O(log n)` time. The tree stores keys
//! only, ordered by their [`Ord`] implementation. Equal keys are all kept.
//!
//! ```
//! use rbtree::RedBlackTree;
//!
//! let mut tree: RedBlackTree<i32> = [7, 3, 18, 10].into_iter().collect();
//! tree.insert(8);
//! assert_eq!(tree.inorder(), [&3, &7, &8, &10, &18]);
//!
//! assert_eq!(tree.delete(&10), Some(10));
//! assert_eq!(tree.delete(&10), None);
//! assert!(tree.search(&10).is_none());
//! assert_eq!(tree.search(&7).map(|n| *n.key()), Some(7));
//! ```
//!
//! The tree is not synchronized, callers that share it must serialize access
//! themselves.

mod node;
mod red_black_tree;
mod traversal;
mod validate;

pub use node::{Color, NodeRef};
pub use red_black_tree::RedBlackTree;
pub use validate::InvariantViolation;

#[cfg(test)]
pub(crate) fn init_test_logging() {
    // several tests race to install the logger, only the first one wins
    let _ = simplelog::TestLogger::init(simplelog::LevelFilter::Trace, simplelog::Config::default());
}
