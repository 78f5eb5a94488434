use core::fmt;
use std::marker::PhantomData;
use std::ptr::{self, NonNull};

/// Color of a node. Missing children count as black.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    Red,
    Black,
}

impl Color {
    /// Returns `true` if the color is [`Red`].
    ///
    /// [`Red`]: Color::Red
    #[must_use]
    pub fn is_red(&self) -> bool {
        matches!(self, Self::Red)
    }

    /// Returns `true` if the color is [`Black`].
    ///
    /// [`Black`]: Color::Black
    #[must_use]
    pub fn is_black(&self) -> bool {
        matches!(self, Self::Black)
    }
}

pub(crate) struct Node<K> {
    pub(crate) key: K,
    pub(crate) color: Color,
    // non-owning, only used to walk up the tree
    pub(crate) parent: Option<RawNode<K>>,
    pub(crate) left: Option<RawNode<K>>,
    pub(crate) right: Option<RawNode<K>>,
}

impl<K> fmt::Debug for Node<K>
where
    K: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // links are shown by key only, following them would print the whole tree
        let key_of = |link: Option<RawNode<K>>| link.map(|n| unsafe { n.key() });
        f.debug_struct("Node")
            .field("key", &self.key)
            .field("color", &self.color)
            .field("parent", &key_of(self.parent))
            .field("left", &key_of(self.left))
            .field("right", &key_of(self.right))
            .finish()
    }
}

/// Which side of its parent a node hangs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NodePos {
    Root,
    Left,
    Right,
}

impl NodePos {
    #[inline]
    pub(crate) fn side(self) -> Option<Side> {
        match self {
            Self::Root => None,
            Self::Left => Some(Side::Left),
            Self::Right => Some(Side::Right),
        }
    }
}

/// A child slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Side {
    Left,
    Right,
}

impl Side {
    #[inline]
    pub(crate) fn opposite(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }
}

/// Generates a getter and a setter for each link field of `Node`.
macro_rules! link_accessors {
    ($($field:ident / $setter:ident),* $(,)?) => {$(
        #[inline]
        pub(crate) unsafe fn $field(&self) -> Option<RawNode<K>> {
            unsafe { (*self.as_ptr()).$field }
        }

        #[inline]
        pub(crate) unsafe fn $setter(&mut self, link: Option<RawNode<K>>) {
            unsafe { (*self.as_ptr()).$field = link }
        }
    )*};
}

/// Copyable handle to a heap allocated `Node`.
///
/// It neither owns nor borrows: the tree owns every node through the child
/// links and frees it with [`RawNode::into_box`]. All accessors are `unsafe`,
/// the caller guarantees the node is still alive.
#[derive(Debug, PartialEq, Eq)]
#[repr(transparent)]
pub(crate) struct RawNode<K> {
    ptr: NonNull<Node<K>>,
}

impl<K> Clone for RawNode<K> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K> Copy for RawNode<K> {}

impl<K> RawNode<K> {
    /// Allocates a new red leaf.
    pub(crate) fn new_leaf(key: K, parent: Option<RawNode<K>>) -> Self {
        let node = Node {
            key,
            color: Color::Red,
            parent,
            left: None,
            right: None,
        };
        Self {
            ptr: NonNull::from(Box::leak(Box::new(node))),
        }
    }

    /// Takes back ownership of the allocation. The node must already be
    /// unlinked from the tree.
    #[inline]
    pub(crate) unsafe fn into_box(self) -> Box<Node<K>> {
        unsafe { Box::from_raw(self.as_ptr()) }
    }

    #[inline]
    pub(crate) fn as_ptr(&self) -> *mut Node<K> {
        self.ptr.as_ptr()
    }

    #[inline]
    pub(crate) fn same(&self, other: RawNode<K>) -> bool {
        ptr::eq(self.as_ptr(), other.as_ptr())
    }

    #[inline]
    pub(crate) unsafe fn as_ref<'a>(&self) -> &'a Node<K> {
        unsafe { self.ptr.as_ref() }
    }

    #[inline]
    pub(crate) unsafe fn key<'a>(&self) -> &'a K {
        unsafe { &(*self.as_ptr()).key }
    }

    /// Exchanges the keys of two nodes, leaving links and colors alone.
    #[inline]
    pub(crate) unsafe fn swap_keys(&mut self, other: &mut RawNode<K>) {
        unsafe {
            ptr::swap(
                ptr::addr_of_mut!((*self.as_ptr()).key),
                ptr::addr_of_mut!((*other.as_ptr()).key),
            )
        }
    }

    link_accessors!(parent / set_parent, left / set_left, right / set_right);

    #[inline]
    pub(crate) unsafe fn child(&self, side: Side) -> Option<RawNode<K>> {
        unsafe {
            match side {
                Side::Left => self.left(),
                Side::Right => self.right(),
            }
        }
    }

    #[inline]
    pub(crate) unsafe fn set_child(&mut self, side: Side, link: Option<RawNode<K>>) {
        unsafe {
            match side {
                Side::Left => self.set_left(link),
                Side::Right => self.set_right(link),
            }
        }
    }

    #[inline]
    pub(crate) unsafe fn color(&self) -> Color {
        unsafe { (*self.as_ptr()).color }
    }

    #[inline]
    pub(crate) unsafe fn set_color(&mut self, color: Color) {
        unsafe { (*self.as_ptr()).color = color }
    }

    #[inline]
    pub(crate) unsafe fn is_red(&self) -> bool {
        unsafe { self.color().is_red() }
    }

    #[inline]
    pub(crate) unsafe fn swap_colors(&mut self, other: &mut RawNode<K>) {
        unsafe {
            ptr::swap(
                ptr::addr_of_mut!((*self.as_ptr()).color),
                ptr::addr_of_mut!((*other.as_ptr()).color),
            )
        }
    }

    #[inline]
    pub(crate) unsafe fn pos(&self) -> NodePos {
        let Some(parent) = (unsafe { self.parent() }) else {
            return NodePos::Root;
        };
        match unsafe { parent.left() } {
            Some(left) if left.same(*self) => NodePos::Left,
            _ => {
                debug_assert!(unsafe { parent.right() }.is_some_and(|r| r.same(*self)));
                NodePos::Right
            }
        }
    }

    #[inline]
    pub(crate) unsafe fn grand_parent(&self) -> Option<RawNode<K>> {
        unsafe { self.parent()?.parent() }
    }

    /// The other child of this node's parent.
    #[inline]
    pub(crate) unsafe fn sibling(&self) -> Option<RawNode<K>> {
        unsafe {
            let side = self.pos().side()?;
            self.parent()?.child(side.opposite())
        }
    }

    /// The sibling of this node's parent.
    #[inline]
    pub(crate) unsafe fn uncle(&self) -> Option<RawNode<K>> {
        unsafe { self.parent()?.sibling() }
    }

    /// Color of an optional child, absent children being black.
    #[inline]
    pub(crate) unsafe fn color_of(node: Option<RawNode<K>>) -> Color {
        node.map_or(Color::Black, |n| unsafe { n.color() })
    }

    #[inline]
    pub(crate) unsafe fn has_red_child(&self) -> bool {
        [Side::Left, Side::Right]
            .into_iter()
            .any(|side| unsafe { Self::color_of(self.child(side)).is_red() })
    }
}

/// Read-only handle to a node inside a [`RedBlackTree`].
///
/// The handle borrows the tree, so the tree cannot be mutated while it is
/// alive.
///
/// Deleting a key that sits in a node with two children moves its in-order
/// successor's key into that node. Node identity is therefore not preserved
/// across deletions, only keys are.
///
/// [`RedBlackTree`]: crate::RedBlackTree
pub struct NodeRef<'a, K> {
    raw: RawNode<K>,
    marker: PhantomData<&'a Node<K>>,
}

impl<K> Clone for NodeRef<'_, K> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K> Copy for NodeRef<'_, K> {}

impl<'a, K> NodeRef<'a, K> {
    /// # Safety
    /// `raw` must point to a live node of a tree that is borrowed for `'a`.
    pub(crate) unsafe fn new(raw: RawNode<K>) -> Self {
        Self {
            raw,
            marker: PhantomData,
        }
    }

    /// The stored key.
    pub fn key(&self) -> &'a K {
        unsafe { self.raw.key() }
    }

    /// Color of the node.
    pub fn color(&self) -> Color {
        unsafe { self.raw.color() }
    }

    /// Returns `true` if the node is red.
    pub fn is_red(&self) -> bool {
        self.color().is_red()
    }

    /// Returns `true` if the node is black.
    pub fn is_black(&self) -> bool {
        self.color().is_black()
    }

    /// Parent node, `None` for the root.
    pub fn parent(&self) -> Option<NodeRef<'a, K>> {
        unsafe { self.raw.parent().map(|n| NodeRef::new(n)) }
    }

    /// Left child, `None` if missing.
    pub fn left(&self) -> Option<NodeRef<'a, K>> {
        unsafe { self.raw.left().map(|n| NodeRef::new(n)) }
    }

    /// Right child, `None` if missing.
    pub fn right(&self) -> Option<NodeRef<'a, K>> {
        unsafe { self.raw.right().map(|n| NodeRef::new(n)) }
    }
}

impl<K> fmt::Debug for NodeRef<'_, K>
where
    K: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(unsafe { self.raw.as_ref() }, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Builds
    //      2
    //    /   \
    //   1     3
    // by hand and frees it at the end.
    fn with_small_tree(f: impl FnOnce(RawNode<i32>, RawNode<i32>, RawNode<i32>)) {
        let mut root = RawNode::new_leaf(2, None);
        let one = RawNode::new_leaf(1, Some(root));
        let mut three = RawNode::new_leaf(3, Some(root));
        unsafe {
            root.set_left(Some(one));
            root.set_right(Some(three));
            root.set_color(Color::Black);
            three.set_color(Color::Black);
        }

        f(root, one, three);

        unsafe {
            drop(one.into_box());
            drop(three.into_box());
            drop(root.into_box());
        }
    }

    #[test]
    fn new_leaf_is_red() {
        let node = RawNode::new_leaf(5, None);
        unsafe {
            assert!(node.is_red());
            assert_eq!(node.pos(), NodePos::Root);
            assert!(node.left().is_none() && node.right().is_none());
            drop(node.into_box());
        }
    }

    #[test]
    fn navigation() {
        with_small_tree(|root, one, three| unsafe {
            assert_eq!(one.pos(), NodePos::Left);
            assert_eq!(three.pos(), NodePos::Right);
            assert!(one.sibling().unwrap().same(three));
            assert!(three.sibling().unwrap().same(one));
            assert!(root.sibling().is_none());
            assert!(one.uncle().is_none());
            assert!(one.grand_parent().is_none());
            assert!(root.has_red_child());
            assert!(!three.has_red_child());
        });
    }

    #[test]
    fn swap_keys_keeps_links() {
        with_small_tree(|mut root, mut one, _| unsafe {
            root.swap_keys(&mut one);
            assert_eq!(*root.key(), 1);
            assert_eq!(*one.key(), 2);
            assert!(root.left().unwrap().same(one));
            assert!(root.color().is_black());
            assert!(one.color().is_red());
        });
    }

    #[test]
    fn children_by_side() {
        with_small_tree(|mut root, one, three| unsafe {
            assert_eq!(Side::Left.opposite(), Side::Right);
            assert_eq!(Side::Right.opposite(), Side::Left);
            assert_eq!(one.pos().side(), Some(Side::Left));
            assert_eq!(root.pos().side(), None);
            assert!(root.child(Side::Left).unwrap().same(one));
            assert!(root.child(Side::Right).unwrap().same(three));

            root.set_child(Side::Left, None);
            assert!(root.left().is_none());
            assert!(root.right().unwrap().same(three));
            root.set_child(Side::Left, Some(one));
            assert!(one.sibling().unwrap().same(three));
        });
    }

    #[test]
    fn swap_colors() {
        with_small_tree(|mut root, mut one, _| unsafe {
            root.swap_colors(&mut one);
            assert!(root.is_red());
            assert!(one.color().is_black());
        });
    }

    #[test]
    fn debug_shows_links_by_key() {
        with_small_tree(|root, one, _| {
            let root = unsafe { NodeRef::new(root) };
            assert_eq!(
                format!("{root:?}"),
                "Node { key: 2, color: Black, parent: None, left: Some(1), right: Some(3) }"
            );
            let one = unsafe { NodeRef::new(one) };
            assert_eq!(
                format!("{one:?}"),
                "Node { key: 1, color: Red, parent: Some(2), left: None, right: None }"
            );
        });
    }

    #[test]
    fn node_ref_reads() {
        with_small_tree(|root, _, _| {
            let handle = unsafe { NodeRef::new(root) };
            assert_eq!(*handle.key(), 2);
            assert!(handle.is_black());
            assert_eq!(handle.left().map(|n| *n.key()), Some(1));
            assert_eq!(handle.right().map(|n| *n.key()), Some(3));
            assert!(handle.left().unwrap().is_red());
            assert_eq!(handle.left().unwrap().parent().map(|n| *n.key()), Some(2));
            assert!(handle.parent().is_none());
        });
    }
}
