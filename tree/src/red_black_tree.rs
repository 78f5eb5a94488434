use core::fmt;
use std::borrow::Borrow;
use std::cmp::Ordering;
use std::marker::PhantomData;
use std::mem;

use log::{debug, trace};

use crate::node::{Color, Node, NodePos, NodeRef, RawNode, Side};

/// A red-black tree based ordered set.
///
/// Keys that compare equal are all kept, new ones are placed to the right of
/// the existing ones. Lookups and removals act on one of them.
pub struct RedBlackTree<K> {
    // INVARIANTS:
    //  * `root` is `None` iff `len == 0`
    //  * every node reachable from `root` is owned by the tree through the
    //    child links, parent links never own anything
    pub(crate) root: Option<RawNode<K>>,
    pub(crate) len: usize,
    pub(crate) marker: PhantomData<Box<Node<K>>>,
}

impl<K> Drop for RedBlackTree<K> {
    fn drop(&mut self) {
        self.clear();
    }
}

impl<K> Default for RedBlackTree<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K> fmt::Debug for RedBlackTree<K>
where
    K: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedBlackTree")
            .field("len", &self.len)
            .field("root", &self.root())
            .field("nodes", &self.inorder())
            .finish()
    }
}

impl<K: Ord> Extend<K> for RedBlackTree<K> {
    fn extend<I: IntoIterator<Item = K>>(&mut self, iter: I) {
        for key in iter {
            self.insert(key);
        }
    }
}

impl<K: Ord> FromIterator<K> for RedBlackTree<K> {
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        let mut tree = Self::new();
        tree.extend(iter);
        tree
    }
}

impl<K> RedBlackTree<K> {
    pub fn new() -> Self {
        Self {
            root: None,
            len: 0,
            marker: PhantomData,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Handle to the root node, `None` for an empty tree.
    pub fn root(&self) -> Option<NodeRef<'_, K>> {
        self.root.map(|root| unsafe { NodeRef::new(root) })
    }

    /// Removes and drops every key.
    pub fn clear(&mut self) {
        unsafe fn inner<K>(node: RawNode<K>) {
            if let Some(l) = unsafe { node.left() } {
                unsafe { inner(l) };
            }
            if let Some(r) = unsafe { node.right() } {
                unsafe { inner(r) };
            }
            let _: Box<Node<K>> = unsafe { node.into_box() };
        }

        self.len = 0;
        if let Some(root) = self.root.take() {
            unsafe { inner(root) };
        }
    }

    /// Finds a node holding `key`.
    pub fn search<Q>(&self, key: &Q) -> Option<NodeRef<'_, K>>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.search_raw(key).map(|node| unsafe { NodeRef::new(node) })
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&K>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.search_raw(key).map(|node| unsafe { node.key() })
    }

    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.search_raw(key).is_some()
    }

    fn search_raw<Q>(&self, key: &Q) -> Option<RawNode<K>>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut x = self.root?;
        loop {
            match key.cmp(unsafe { x.key() }.borrow()) {
                Ordering::Less => x = unsafe { x.left() }?,
                Ordering::Equal => return Some(x),
                Ordering::Greater => x = unsafe { x.right() }?,
            }
        }
    }

    pub fn min(&self) -> Option<&K> {
        self.root.map(|root| unsafe { Self::successor(root).key() })
    }

    pub fn max(&self) -> Option<&K> {
        let mut x = self.root?;
        while let Some(right) = unsafe { x.right() } {
            x = right;
        }
        Some(unsafe { x.key() })
    }

    /// Leftmost node of the subtree rooted at `node`.
    ///
    /// Called with the right child of a node this gives its in-order successor.
    unsafe fn successor(node: RawNode<K>) -> RawNode<K> {
        let mut x = node;
        while let Some(left) = unsafe { x.left() } {
            x = left;
        }

        x
    }

    /// The node that will physically take `node`'s place when it's removed:
    /// the in-order successor if `node` has two children, the only child if it
    /// has one, `None` for a leaf.
    unsafe fn bst_replace(node: RawNode<K>) -> Option<RawNode<K>> {
        unsafe {
            match (node.left(), node.right()) {
                (Some(_), Some(right)) => Some(Self::successor(right)),
                (child @ Some(_), None) | (None, child) => child,
            }
        }
    }

    fn rotate_left(&mut self, node: RawNode<K>) {
        self.rotate(node, Side::Right);
    }

    fn rotate_right(&mut self, node: RawNode<K>) {
        self.rotate(node, Side::Left);
    }

    /// Lifts the child of `node` on `side` into the place of `node`, which
    /// becomes that child's child on the other side. Lifting the right child
    /// is a left rotation:
    ///
    /// ```text
    ///    p                       p
    ///    |                       |
    /// +-node-+               +-lift-+
    /// |      |      -->      |      |
    /// a  +-lift-+        +-node-+   c
    ///    |      |        |      |
    ///    b      c        a      b
    /// ```
    ///
    /// In-order sequence and colors are unchanged.
    fn rotate(&mut self, mut node: RawNode<K>, side: Side) {
        unsafe {
            let Some(mut lift) = node.child(side) else {
                unreachable!("rotation without a child to lift");
            };

            // b moves across from lift to node
            let inner = lift.child(side.opposite());
            node.set_child(side, inner);
            if let Some(mut inner) = inner {
                inner.set_parent(Some(node));
            }

            self.relink(node, Some(lift));
            lift.set_child(side.opposite(), Some(node));
            node.set_parent(Some(lift));
        }
    }

    /// Makes the parent of `old` (or the root slot) point to `new` and gives
    /// `new` the parent of `old`. The links of `old` itself are left as they are.
    unsafe fn relink(&mut self, old: RawNode<K>, new: Option<RawNode<K>>) {
        unsafe {
            let parent = old.parent();
            match (old.pos().side(), parent) {
                (Some(side), Some(mut parent)) => parent.set_child(side, new),
                _ => self.root = new,
            }
            if let Some(mut new) = new {
                new.set_parent(parent);
            }
        }
    }

    /// Plain binary search tree insert. The new node is a red leaf.
    fn bst_insert(&mut self, key: K) -> RawNode<K>
    where
        K: Ord,
    {
        let Some(mut cur) = self.root else {
            let root = RawNode::new_leaf(key, None);
            self.root = Some(root);
            self.len += 1;
            return root;
        };

        // Move left/right down the tree until we find empty slot.
        // Keys that are not smaller go right, so equal keys keep insertion order.
        loop {
            unsafe {
                if key < *cur.key() {
                    match cur.left() {
                        Some(left) => cur = left,
                        None => {
                            let new_node = RawNode::new_leaf(key, Some(cur));
                            cur.set_left(Some(new_node));
                            self.len += 1;
                            return new_node;
                        }
                    }
                } else {
                    match cur.right() {
                        Some(right) => cur = right,
                        None => {
                            let new_node = RawNode::new_leaf(key, Some(cur));
                            cur.set_right(Some(new_node));
                            self.len += 1;
                            return new_node;
                        }
                    }
                }
            }
        }
    }

    pub fn insert(&mut self, key: K)
    where
        K: Ord,
    {
        let new_node = self.bst_insert(key);
        self.fix_double_red(new_node);
    }

    fn fix_double_red(&mut self, new_node: RawNode<K>) {
        let mut node = new_node;
        unsafe {
            loop {
                debug_assert!(node.is_red());

                let Some(mut parent) = node.parent() else {
                    node.set_color(Color::Black);
                    break;
                };
                if parent.color().is_black() {
                    break;
                }

                // parent is red and thus not the root, so grand parent exists
                let Some(mut grand_parent) = node.grand_parent() else {
                    unreachable!("red node at the root");
                };
                debug_assert!(grand_parent.color().is_black());

                match node.uncle() {
                    Some(mut uncle) if uncle.is_red() => {
                        //     +--- gp:b ---+               +--- gp:r ---+
                        //     |            |               |            |
                        //  + p:r +      + u:r +   -->   + p:b +      + u:b +
                        //  |     |      |     |         |     |      |     |
                        // n:r    a      b     c        n:r    a      b     c
                        //
                        // black height is unchanged but gp may now have a red parent
                        trace!("double red: red uncle, recoloring");
                        parent.set_color(Color::Black);
                        uncle.set_color(Color::Black);
                        grand_parent.set_color(Color::Red);
                        node = grand_parent;
                        continue;
                    }
                    _ => {}
                }

                // Black or missing uncle. One or two rotations put the red pair
                // under a black node without changing black heights, which ends
                // the fixup.
                match (parent.pos(), node.pos()) {
                    (NodePos::Left, NodePos::Left) => {
                        //           +-- gp:b --+            +----- p:b -----+
                        //           |          |            |               |
                        //      +-- p:r --+    u:b  -->   +- n:r -+     +- gp:r -+
                        //      |         |               |       |     |        |
                        //  +- n:r -+     c               a       b     c       u:b
                        //  |       |
                        //  a       b
                        trace!("double red: left-left, rotating right");
                        parent.swap_colors(&mut grand_parent);
                        self.rotate_right(grand_parent);
                    }
                    (NodePos::Left, NodePos::Right) => {
                        trace!("double red: left-right, rotating left then right");
                        self.rotate_left(parent);
                        node.swap_colors(&mut grand_parent);
                        self.rotate_right(grand_parent);
                    }
                    (NodePos::Right, NodePos::Right) => {
                        trace!("double red: right-right, rotating left");
                        parent.swap_colors(&mut grand_parent);
                        self.rotate_left(grand_parent);
                    }
                    (NodePos::Right, NodePos::Left) => {
                        trace!("double red: right-left, rotating right then left");
                        self.rotate_right(parent);
                        node.swap_colors(&mut grand_parent);
                        self.rotate_left(grand_parent);
                    }
                    _ => unreachable!("parent of a double red is never the root"),
                }
                break;
            }
        }
    }

    /// Removes one key equal to `key` and returns it.
    ///
    /// Removing a key that isn't present does nothing and returns `None`.
    pub fn delete<Q>(&mut self, key: &Q) -> Option<K>
    where
        K: Borrow<Q> + Ord,
        Q: Ord + ?Sized,
    {
        let node = self.search_raw(key)?;
        Some(unsafe { self.delete_node(node) })
    }

    unsafe fn delete_node(&mut self, target: RawNode<K>) -> K {
        //       ┌────────── 34 ─────────┐
        //       │                       │
        // ┌──── 2 ────┐                 58 ────┐
        // │           │                        │
        // 1      ┌─── 9 ────┐              ┌── 77 ──┐
        //        │          │              │        │
        //     ┌─ 6       ┌─ 20 ─┐      ┌─ 71 ─┐     82
        //     │          │      │      │      │
        //     5         12 ─┐   24    67      75
        //                   │
        //                   13
        //
        // Deleting 9 moves 12 into its node and continues by deleting the node
        // that held 12, which has at most one child. The loop runs at most twice.
        let mut node = target;
        unsafe {
            loop {
                let Some(mut replacement) = Self::bst_replace(node) else {
                    // leaf
                    if node.parent().is_none() {
                        debug!("removed the last node");
                    } else if node.color().is_black() {
                        // Removing a black leaf leaves its parent one black short on
                        // this side. Fix it while the leaf still marks the position.
                        self.fix_double_black(node);
                    }
                    self.relink(node, None);

                    self.len -= 1;
                    return node.into_box().key;
                };

                if node.left().is_some() && node.right().is_some() {
                    node.swap_keys(&mut replacement);
                    node = replacement;
                    continue;
                }

                // exactly one child
                if node.parent().is_none() {
                    // A single child of the root must be a red leaf. The root keeps
                    // its place and color and takes over the child's key.
                    debug!("root absorbs its only child");
                    debug_assert!(replacement.left().is_none() && replacement.right().is_none());
                    node.set_left(None);
                    node.set_right(None);
                    let child = replacement.into_box();
                    self.len -= 1;
                    return mem::replace(&mut (*node.as_ptr()).key, child.key);
                }

                self.relink(node, Some(replacement));

                if node.color().is_black() && replacement.color().is_black() {
                    self.fix_double_black(replacement);
                } else {
                    replacement.set_color(Color::Black);
                }

                self.len -= 1;
                return node.into_box().key;
            }
        }
    }

    /// `node` is one black short compared to its sibling's subtree.
    fn fix_double_black(&mut self, mut node: RawNode<K>) {
        unsafe {
            loop {
                let Some(mut parent) = node.parent() else {
                    // the deficit is shared by every path, nothing to fix
                    break;
                };

                let Some(mut sibling) = node.sibling() else {
                    // Can't happen while black heights are balanced.
                    trace!("double black: no sibling, moving up");
                    node = parent;
                    continue;
                };

                if sibling.is_red() {
                    //     ┌─── p:b ───┐                    ┌─── s:b ───┐
                    //     │           │                    │           │
                    // ┌─ x:b ─┐   ┌─ s:r ─┐   ──►      ┌─ p:r ─┐      d:b
                    // │       │   │       │            │       │
                    // a       b  c:b     d:b       ┌─ x:b ─┐  c:b
                    //                              │       │
                    //                              a       b
                    // x gets a black sibling, try again
                    trace!("double black: red sibling, rotating parent");
                    parent.set_color(Color::Red);
                    sibling.set_color(Color::Black);
                    match sibling.pos() {
                        NodePos::Left => self.rotate_right(parent),
                        _ => self.rotate_left(parent),
                    }
                    continue;
                }

                if sibling.has_red_child() {
                    let parent_color = parent.color();
                    let sibling_pos = sibling.pos();
                    match sibling.left().filter(|n| n.is_red()) {
                        Some(mut red) => {
                            if sibling_pos == NodePos::Left {
                                trace!("double black: red left-left nephew");
                                red.set_color(Color::Black);
                                sibling.set_color(parent_color);
                                self.rotate_right(parent);
                            } else {
                                trace!("double black: red right-left nephew");
                                red.set_color(parent_color);
                                self.rotate_right(sibling);
                                self.rotate_left(parent);
                            }
                        }
                        None => {
                            let Some(mut red) = sibling.right() else {
                                unreachable!("sibling with a red child has no children");
                            };
                            if sibling_pos == NodePos::Right {
                                trace!("double black: red right-right nephew");
                                red.set_color(Color::Black);
                                sibling.set_color(parent_color);
                                self.rotate_left(parent);
                            } else {
                                trace!("double black: red left-right nephew");
                                red.set_color(parent_color);
                                self.rotate_left(sibling);
                                self.rotate_right(parent);
                            }
                        }
                    }
                    parent.set_color(Color::Black);
                    break;
                }

                // Black sibling with black children: take one black off the
                // sibling's side and push the deficit up to the parent.
                trace!("double black: black sibling, recoloring");
                sibling.set_color(Color::Red);
                if parent.is_red() {
                    parent.set_color(Color::Black);
                    break;
                }
                node = parent;
            }
        }
    }
}
