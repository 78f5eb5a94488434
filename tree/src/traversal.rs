use std::collections::VecDeque;

use crate::node::RawNode;
use crate::RedBlackTree;

impl<K> RedBlackTree<K> {
    /// All keys in sorted order.
    ///
    /// The tree can't be mutated while the returned references are alive.
    pub fn inorder(&self) -> Vec<&K> {
        let mut keys = Vec::with_capacity(self.len);
        self.inorder_for_each(|k| keys.push(k));
        keys
    }

    /// Calls `f` with every key in sorted order.
    pub fn inorder_for_each<'a, F>(&'a self, mut f: F)
    where
        F: FnMut(&'a K),
    {
        let Some(root) = self.root else {
            return;
        };

        let mut f = |node: RawNode<K>| f(unsafe { node.key() });
        unsafe { Self::inorder_for_each_core(root, &mut f) }
    }

    unsafe fn inorder_for_each_core<F>(node: RawNode<K>, f: &mut F)
    where
        F: FnMut(RawNode<K>),
    {
        if let Some(l) = unsafe { node.left() } {
            unsafe { Self::inorder_for_each_core(l, f) };
        }
        f(node);
        if let Some(r) = unsafe { node.right() } {
            unsafe { Self::inorder_for_each_core(r, f) };
        }
    }

    /// Keys in breadth-first order, root first, each level left to right.
    pub fn level_order(&self) -> Vec<&K> {
        let mut keys = Vec::with_capacity(self.len);
        let mut queue = VecDeque::with_capacity(self.len.min(64));
        queue.extend(self.root);

        while let Some(node) = queue.pop_front() {
            unsafe {
                keys.push(node.key());
                queue.extend(node.left());
                queue.extend(node.right());
            }
        }

        keys
    }
}
