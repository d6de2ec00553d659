use crate::arena::TypedArena;
use crate::error::{Error, Result};
use crate::red_black_tree::compare::{Compare, Natural};
use crate::red_black_tree::cursor::{Cursor, Position};
use crate::red_black_tree::node::{Color, Node, NodeId, Side};
use log::debug;
use std::alloc::{self, Layout};
use std::cmp::Ordering;
use std::fmt;
use std::iter::FromIterator;
use std::mem;
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
use std::vec;

/// Number of nodes reserved per arena chunk when no chunk size is configured.
pub const DEFAULT_CHUNK_SIZE: usize = 64;

static NEXT_TREE_ID: AtomicUsize = AtomicUsize::new(0);

fn next_tree_id() -> usize {
    NEXT_TREE_ID.fetch_add(1, AtomicOrdering::Relaxed)
}

// Where a value belongs in the tree: at an existing node, or below a parent (`None` for an empty
// tree).
enum Slot {
    Occupied(NodeId),
    Vacant(Option<(NodeId, Side)>),
}

/// A red-black tree of unique values ordered by a comparator.
///
/// Nodes live in a `TypedArena` and are linked by arena entries. Every node also keeps a link to
/// its parent, which gives cursors stackless in-order traversal in both directions. The tree is
/// the engine behind `RedBlackSet` and `RedBlackMap`, but can be used on its own.
///
/// Erasing a node with two children splices its in-order successor into its place, so erasing
/// never moves an element between nodes. Only the position of the erased element is invalidated.
///
/// # Examples
///
/// ```
/// use rb_collections::red_black_tree::RedBlackTree;
///
/// let mut tree = RedBlackTree::new();
/// for value in &[4, 1, 5, 2, 3] {
///     tree.insert(*value);
/// }
///
/// assert_eq!(tree.iter().collect::<Vec<&u32>>(), vec![&1, &2, &3, &4, &5]);
///
/// let (position, inserted) = tree.insert(3);
/// assert!(!inserted);
/// assert_eq!(tree.erase(position), Some(3));
/// assert!(!tree.contains(&3));
/// assert_eq!(tree.len(), 4);
/// ```
pub struct RedBlackTree<T, C = Natural> {
    id: usize,
    arena: TypedArena<Node<T>>,
    root: Option<NodeId>,
    len: usize,
    comparator: C,
}

impl<T> RedBlackTree<T, Natural> {
    /// Constructs a new, empty `RedBlackTree<T>` ordered by `T`'s `Ord` implementation.
    ///
    /// # Examples
    ///
    /// ```
    /// use rb_collections::red_black_tree::RedBlackTree;
    ///
    /// let tree: RedBlackTree<u32> = RedBlackTree::new();
    /// ```
    pub fn new() -> Self {
        Self::with_comparator(Natural)
    }
}

impl<T, C> RedBlackTree<T, C> {
    /// Constructs a new, empty tree ordered by `comparator`.
    ///
    /// # Examples
    ///
    /// ```
    /// use rb_collections::red_black_tree::RedBlackTree;
    ///
    /// let mut tree = RedBlackTree::with_comparator(|left: &u32, right: &u32| right.cmp(left));
    /// tree.insert(1);
    /// tree.insert(2);
    /// assert_eq!(tree.min(), Some(&2));
    /// ```
    pub fn with_comparator(comparator: C) -> Self {
        Self::with_config(comparator, DEFAULT_CHUNK_SIZE)
    }

    /// Constructs a new, empty tree ordered by `comparator` whose node storage grows by
    /// `chunk_size` nodes at a time.
    pub fn with_config(comparator: C, chunk_size: usize) -> Self {
        RedBlackTree {
            id: next_tree_id(),
            arena: TypedArena::new(chunk_size),
            root: None,
            len: 0,
            comparator,
        }
    }

    /// Returns the comparator that orders the tree.
    pub fn comparator(&self) -> &C {
        &self.comparator
    }

    /// Returns the number of elements in the tree.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the tree is empty.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the theoretical maximum number of elements, bounded by addressable storage divided
    /// by the size of a node.
    pub fn max_size(&self) -> usize {
        TypedArena::<Node<T>>::max_capacity()
    }

    fn node(&self, id: NodeId) -> &Node<T> {
        &self.arena[id]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node<T> {
        &mut self.arena[id]
    }

    fn is_red(&self, id: Option<NodeId>) -> bool {
        match id {
            None => false,
            Some(id) => self.node(id).color == Color::Red,
        }
    }

    fn set_color(&mut self, id: NodeId, color: Color) {
        self.node_mut(id).color = color;
    }

    // precondition: `child` is a child of `parent`
    fn side_of(&self, child: NodeId, parent: NodeId) -> Side {
        if self.node(parent).left == Some(child) {
            Side::Left
        } else {
            Side::Right
        }
    }

    fn extreme(&self, mut id: NodeId, side: Side) -> NodeId {
        while let Some(child) = self.node(id).child(side) {
            id = child;
        }
        id
    }

    // Walks one step in order towards `side`: `Side::Right` yields the successor and `Side::Left`
    // the predecessor. Returns `None` past the last (or first) node.
    fn step(&self, id: NodeId, side: Side) -> Option<NodeId> {
        if let Some(child) = self.node(id).child(side) {
            return Some(self.extreme(child, side.opposite()));
        }
        let mut curr = id;
        let mut parent = self.node(curr).parent;
        while let Some(parent_id) = parent {
            if self.node(parent_id).child(side) != Some(curr) {
                break;
            }
            curr = parent_id;
            parent = self.node(curr).parent;
        }
        parent
    }

    pub(crate) fn successor(&self, node: Option<NodeId>) -> Option<NodeId> {
        node.and_then(|id| self.step(id, Side::Right))
    }

    // Stepping back from the end lands on the maximum of the live root.
    pub(crate) fn predecessor(&self, node: Option<NodeId>) -> Option<NodeId> {
        match node {
            None => self.root.map(|root| self.extreme(root, Side::Right)),
            Some(id) => self.step(id, Side::Left),
        }
    }

    fn first(&self) -> Option<NodeId> {
        self.root.map(|root| self.extreme(root, Side::Left))
    }

    fn last(&self) -> Option<NodeId> {
        self.root.map(|root| self.extreme(root, Side::Right))
    }

    pub(crate) fn value(&self, id: NodeId) -> &T {
        &self.node(id).value
    }

    pub(crate) fn position(&self, node: Option<NodeId>) -> Position {
        Position::new(self.id, node)
    }

    // The live node behind `position`, if it was handed out by this tree and not erased since.
    fn resolve(&self, position: Position) -> Option<NodeId> {
        if position.tree() != self.id {
            return None;
        }
        position.node().filter(|id| self.arena.get(id).is_some())
    }

    /// Returns a cursor at the smallest element, or the end cursor if the tree is empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use rb_collections::red_black_tree::RedBlackTree;
    ///
    /// let mut tree = RedBlackTree::new();
    /// assert!(tree.begin() == tree.end());
    ///
    /// tree.insert(2);
    /// tree.insert(1);
    /// assert_eq!(tree.begin().get(), Some(&1));
    /// ```
    pub fn begin(&self) -> Cursor<'_, T, C> {
        Cursor::new(self, self.first())
    }

    /// Returns the end cursor, which sits one past the largest element and is never
    /// dereferenceable.
    pub fn end(&self) -> Cursor<'_, T, C> {
        Cursor::new(self, None)
    }

    /// Returns a cursor at `position`. A position whose element has been erased, or that belongs
    /// to another tree, yields the end cursor.
    pub fn cursor(&self, position: Position) -> Cursor<'_, T, C> {
        Cursor::new(self, self.resolve(position))
    }

    /// Returns the element at `position`, or `None` for the end position, an erased element or a
    /// position of another tree.
    pub fn get(&self, position: Position) -> Option<&T> {
        self.cursor(position).get()
    }

    pub(crate) fn get_mut(&mut self, position: Position) -> Option<&mut T> {
        let id = self.resolve(position)?;
        self.arena.get_mut(&id).map(|node| &mut node.value)
    }

    /// Returns the smallest element of the tree. Returns `None` if the tree is empty.
    pub fn min(&self) -> Option<&T> {
        self.first().map(|id| self.value(id))
    }

    /// Returns the largest element of the tree. Returns `None` if the tree is empty.
    pub fn max(&self) -> Option<&T> {
        self.last().map(|id| self.value(id))
    }

    // Rotates `id` down towards `side`; its child on the opposite side takes its place.
    fn rotate(&mut self, id: NodeId, side: Side) {
        let pivot = self
            .node(id)
            .child(side.opposite())
            .expect("Expected pivot child node to be `Some`.");
        let inner = self.node(pivot).child(side);

        *self.node_mut(id).child_mut(side.opposite()) = inner;
        if let Some(inner) = inner {
            self.node_mut(inner).parent = Some(id);
        }

        let parent = self.node(id).parent;
        self.node_mut(pivot).parent = parent;
        self.replace_child(parent, id, Some(pivot));

        *self.node_mut(pivot).child_mut(side) = Some(id);
        self.node_mut(id).parent = Some(pivot);
    }

    fn replace_child(&mut self, parent: Option<NodeId>, old: NodeId, new: Option<NodeId>) {
        match parent {
            None => self.root = new,
            Some(parent) => {
                let side = self.side_of(old, parent);
                *self.node_mut(parent).child_mut(side) = new;
            },
        }
    }

    // Puts the subtree rooted at `new` where `old` hangs. `old` keeps its own links.
    fn transplant(&mut self, old: NodeId, new: Option<NodeId>) {
        let parent = self.node(old).parent;
        self.replace_child(parent, old, new);
        if let Some(new) = new {
            self.node_mut(new).parent = parent;
        }
    }

    fn link(&mut self, id: NodeId, slot: Option<(NodeId, Side)>) {
        match slot {
            None => self.root = Some(id),
            Some((parent, side)) => *self.node_mut(parent).child_mut(side) = Some(id),
        }
        self.len += 1;
        self.insert_fixup(id);
    }

    fn insert_fixup(&mut self, mut id: NodeId) {
        while let Some(parent) = self.node(id).parent {
            if self.node(parent).color == Color::Black {
                break;
            }
            let grandparent = self
                .node(parent)
                .parent
                .expect("Expected a red node to have a parent.");
            let side = self.side_of(parent, grandparent);
            let uncle = self.node(grandparent).child(side.opposite());

            match uncle {
                Some(uncle) if self.node(uncle).color == Color::Red => {
                    self.set_color(parent, Color::Black);
                    self.set_color(uncle, Color::Black);
                    self.set_color(grandparent, Color::Red);
                    id = grandparent;
                },
                _ => {
                    // an inner grandchild is first rotated into the outer position
                    let top = if self.side_of(id, parent) != side {
                        self.rotate(parent, side);
                        id
                    } else {
                        parent
                    };
                    self.set_color(top, Color::Black);
                    self.set_color(grandparent, Color::Red);
                    self.rotate(grandparent, side.opposite());
                    break;
                },
            }
        }

        if let Some(root) = self.root {
            self.set_color(root, Color::Black);
        }
    }

    // `id` may be absent, so its parent is tracked separately.
    fn erase_fixup(&mut self, mut id: Option<NodeId>, mut parent: Option<NodeId>) {
        while let Some(parent_id) = parent {
            if self.is_red(id) {
                break;
            }
            let side = if self.node(parent_id).left == id {
                Side::Left
            } else {
                Side::Right
            };
            let mut sibling = self
                .node(parent_id)
                .child(side.opposite())
                .expect("Expected a doubly black node to have a sibling.");

            if self.node(sibling).color == Color::Red {
                self.set_color(sibling, Color::Black);
                self.set_color(parent_id, Color::Red);
                self.rotate(parent_id, side);
                sibling = self
                    .node(parent_id)
                    .child(side.opposite())
                    .expect("Expected a doubly black node to have a sibling.");
            }

            let near = self.node(sibling).child(side);
            let far = self.node(sibling).child(side.opposite());
            if !self.is_red(near) && !self.is_red(far) {
                self.set_color(sibling, Color::Red);
                id = Some(parent_id);
                parent = self.node(parent_id).parent;
                continue;
            }

            if !self.is_red(far) {
                if let Some(near) = near {
                    self.set_color(near, Color::Black);
                }
                self.set_color(sibling, Color::Red);
                self.rotate(sibling, side.opposite());
                sibling = self
                    .node(parent_id)
                    .child(side.opposite())
                    .expect("Expected a doubly black node to have a sibling.");
            }

            let parent_color = self.node(parent_id).color;
            self.set_color(sibling, parent_color);
            self.set_color(parent_id, Color::Black);
            if let Some(far) = self.node(sibling).child(side.opposite()) {
                self.set_color(far, Color::Black);
            }
            self.rotate(parent_id, side);
            id = self.root;
            break;
        }

        if let Some(id) = id {
            self.set_color(id, Color::Black);
        }
    }

    fn unlink(&mut self, id: NodeId) -> T {
        let (left, right, parent, color) = {
            let node = self.node(id);
            (node.left, node.right, node.parent, node.color)
        };

        let (removed_color, child, child_parent) = match (left, right) {
            (None, _) => {
                self.transplant(id, right);
                (color, right, parent)
            },
            (_, None) => {
                self.transplant(id, left);
                (color, left, parent)
            },
            (Some(left), Some(right)) => {
                let successor = self.extreme(right, Side::Left);
                let successor_color = self.node(successor).color;
                let child = self.node(successor).right;
                let child_parent = if self.node(successor).parent == Some(id) {
                    Some(successor)
                } else {
                    let successor_parent = self.node(successor).parent;
                    self.transplant(successor, child);
                    self.node_mut(successor).right = Some(right);
                    self.node_mut(right).parent = Some(successor);
                    successor_parent
                };
                self.transplant(id, Some(successor));
                self.node_mut(successor).left = Some(left);
                self.node_mut(left).parent = Some(successor);
                self.set_color(successor, color);
                (successor_color, child, child_parent)
            },
        };

        if removed_color == Color::Black {
            self.erase_fixup(child, child_parent);
        }

        self.len -= 1;
        self.arena.free(&id).value
    }

    /// Removes the element at `position` and returns it. Erasing the end position, a position
    /// whose element is already gone, or a position of another tree does nothing and returns
    /// `None`.
    ///
    /// Positions of every other element stay valid.
    ///
    /// # Examples
    ///
    /// ```
    /// use rb_collections::red_black_tree::RedBlackTree;
    ///
    /// let mut tree = RedBlackTree::new();
    /// let (one, _) = tree.insert(1);
    /// let (two, _) = tree.insert(2);
    ///
    /// assert_eq!(tree.erase(one), Some(1));
    /// assert_eq!(tree.erase(tree.end().position()), None);
    /// assert_eq!(tree.get(two), Some(&2));
    /// ```
    pub fn erase(&mut self, position: Position) -> Option<T> {
        let id = self.resolve(position)?;
        Some(self.unlink(id))
    }

    /// Clears the tree, removing all elements. Nodes are released by walking child links with an
    /// explicit stack, and the node storage is released afterwards. Every position handed out
    /// before the clear resolves to the end.
    ///
    /// # Examples
    ///
    /// ```
    /// use rb_collections::red_black_tree::RedBlackTree;
    ///
    /// let mut tree = RedBlackTree::new();
    /// tree.insert(1);
    /// tree.insert(2);
    /// tree.clear();
    /// assert!(tree.is_empty());
    /// assert!(tree.begin() == tree.end());
    /// ```
    pub fn clear(&mut self) {
        let mut stack: Vec<NodeId> = self.root.take().into_iter().collect();
        let mut freed = 0;
        while let Some(id) = stack.pop() {
            let node = self.arena.free(&id);
            stack.extend(node.left);
            stack.extend(node.right);
            freed += 1;
        }
        self.len = 0;
        self.arena = TypedArena::new(self.arena.chunk_size());
        // a fresh arena restarts block generations, so old positions must stop matching
        self.id = next_tree_id();
        debug!("Cleared {} nodes from red black tree.", freed);
    }

    /// Exchanges the contents of two trees, comparators included, in constant time.
    pub fn swap(&mut self, other: &mut Self) {
        mem::swap(self, other);
    }

    fn node_ids(&self) -> Vec<NodeId> {
        let mut ids = Vec::with_capacity(self.len);
        let mut curr = self.first();
        while let Some(id) = curr {
            ids.push(id);
            curr = self.step(id, Side::Right);
        }
        ids
    }

    // Removes every element and returns them in ascending order. The comparator is kept.
    fn drain_sorted(&mut self) -> Vec<T> {
        let ids = self.node_ids();
        self.root = None;
        self.len = 0;
        ids.iter().map(|id| self.arena.free(id).value).collect()
    }

    /// Returns an iterator over the tree. The iterator yields elements in ascending order and can
    /// also be walked from the back.
    ///
    /// # Examples
    ///
    /// ```
    /// use rb_collections::red_black_tree::RedBlackTree;
    ///
    /// let mut tree = RedBlackTree::new();
    /// tree.insert(1);
    /// tree.insert(3);
    /// tree.insert(2);
    ///
    /// let mut iterator = tree.iter();
    /// assert_eq!(iterator.next(), Some(&1));
    /// assert_eq!(iterator.next_back(), Some(&3));
    /// assert_eq!(iterator.next(), Some(&2));
    /// assert_eq!(iterator.next(), None);
    /// ```
    pub fn iter(&self) -> RedBlackTreeIter<'_, T, C> {
        RedBlackTreeIter {
            tree: self,
            front: self.first(),
            back: self.last(),
            remaining: self.len,
        }
    }

    // Ranks every block by its in-order position, then places each value in its rank's slot.
    pub(crate) fn iter_mut(&mut self) -> RedBlackTreeIterMut<'_, T> {
        let chunk_size = self.arena.chunk_size();
        let mut ranks = vec![0; self.arena.capacity()];
        for (rank, id) in self.node_ids().into_iter().enumerate() {
            ranks[id.flat_index(chunk_size)] = rank;
        }

        let mut values: Vec<Option<&mut T>> = Vec::with_capacity(self.len);
        values.resize_with(self.len, || None);
        for (id, node) in self.arena.iter_mut() {
            values[ranks[id.flat_index(chunk_size)]] = Some(&mut node.value);
        }
        RedBlackTreeIterMut {
            values: values.into_iter(),
        }
    }
}

impl<T, C> RedBlackTree<T, C>
where
    C: Compare<T>,
{
    // `order` reports how the searched key compares to the given element.
    pub(crate) fn search_by<F>(&self, mut order: F) -> Option<NodeId>
    where
        F: FnMut(&T) -> Ordering,
    {
        let mut curr = self.root;
        while let Some(id) = curr {
            let node = self.node(id);
            curr = match order(&node.value) {
                Ordering::Less => node.left,
                Ordering::Greater => node.right,
                Ordering::Equal => return Some(id),
            };
        }
        None
    }

    pub(crate) fn floor_by<F>(&self, mut order: F) -> Option<NodeId>
    where
        F: FnMut(&T) -> Ordering,
    {
        let mut curr = self.root;
        let mut ret = None;
        while let Some(id) = curr {
            let node = self.node(id);
            curr = match order(&node.value) {
                Ordering::Less => node.left,
                Ordering::Greater => {
                    ret = Some(id);
                    node.right
                },
                Ordering::Equal => return Some(id),
            };
        }
        ret
    }

    pub(crate) fn ceil_by<F>(&self, mut order: F) -> Option<NodeId>
    where
        F: FnMut(&T) -> Ordering,
    {
        let mut curr = self.root;
        let mut ret = None;
        while let Some(id) = curr {
            let node = self.node(id);
            curr = match order(&node.value) {
                Ordering::Less => {
                    ret = Some(id);
                    node.left
                },
                Ordering::Greater => node.right,
                Ordering::Equal => return Some(id),
            };
        }
        ret
    }

    fn locate(&self, value: &T) -> Slot {
        let mut curr = self.root;
        let mut slot = None;
        while let Some(id) = curr {
            let node = self.node(id);
            let side = match self.comparator.compare(value, &node.value) {
                Ordering::Less => Side::Left,
                Ordering::Greater => Side::Right,
                Ordering::Equal => return Slot::Occupied(id),
            };
            slot = Some((id, side));
            curr = node.child(side);
        }
        Slot::Vacant(slot)
    }

    /// Returns a cursor at the element equal to `key`, or the end cursor if there is none.
    ///
    /// # Examples
    ///
    /// ```
    /// use rb_collections::red_black_tree::RedBlackTree;
    ///
    /// let mut tree = RedBlackTree::new();
    /// tree.insert(1);
    /// assert_eq!(tree.find(&1).get(), Some(&1));
    /// assert!(tree.find(&2) == tree.end());
    /// ```
    pub fn find(&self, key: &T) -> Cursor<'_, T, C> {
        let node = self.search_by(|value| self.comparator.compare(key, value));
        Cursor::new(self, node)
    }

    /// Checks if an element equal to `key` exists in the tree.
    pub fn contains(&self, key: &T) -> bool {
        self.search_by(|value| self.comparator.compare(key, value)).is_some()
    }

    /// Inserts a value into the tree. Returns the position of the new element and `true`, or the
    /// position of the equal element already present and `false`, in which case `value` is
    /// dropped and the tree is unchanged.
    ///
    /// Failing to allocate the new node is fatal and reported through
    /// `std::alloc::handle_alloc_error`. Use `try_insert` to observe the failure instead.
    ///
    /// # Examples
    ///
    /// ```
    /// use rb_collections::red_black_tree::RedBlackTree;
    ///
    /// let mut tree = RedBlackTree::new();
    /// let (first, inserted) = tree.insert(1);
    /// assert!(inserted);
    ///
    /// let (second, inserted) = tree.insert(1);
    /// assert!(!inserted);
    /// assert_eq!(first, second);
    /// ```
    pub fn insert(&mut self, value: T) -> (Position, bool) {
        match self.try_insert(value) {
            Ok(ret) => ret,
            Err(_) => alloc::handle_alloc_error(Layout::new::<Node<T>>()),
        }
    }

    /// Inserts a value into the tree like `insert`, but reports `Error::AllocationFailure` when
    /// the new node cannot be allocated. A failed insert leaves the tree unchanged.
    ///
    /// # Examples
    ///
    /// ```
    /// use rb_collections::red_black_tree::RedBlackTree;
    ///
    /// let mut tree = RedBlackTree::new();
    /// let (position, inserted) = tree.try_insert(1).unwrap();
    /// assert!(inserted);
    /// assert_eq!(tree.get(position), Some(&1));
    /// ```
    pub fn try_insert(&mut self, value: T) -> Result<(Position, bool)> {
        match self.locate(&value) {
            Slot::Occupied(id) => Ok((self.position(Some(id)), false)),
            Slot::Vacant(slot) => {
                let parent = slot.map(|(parent, _)| parent);
                let id = self.arena.try_allocate(Node::new(value, parent))?;
                self.link(id, slot);
                Ok((self.position(Some(id)), true))
            },
        }
    }

    /// Removes the element equal to `key` and returns it. Returns `None` if there is no such
    /// element.
    pub fn remove(&mut self, key: &T) -> Option<T> {
        let id = self.search_by(|value| self.comparator.compare(key, value))?;
        Some(self.unlink(id))
    }

    /// Returns the largest element that is less than or equal to `key`. Returns `None` if such an
    /// element does not exist.
    pub fn floor(&self, key: &T) -> Option<&T> {
        self.floor_by(|value| self.comparator.compare(key, value))
            .map(|id| self.value(id))
    }

    /// Returns the smallest element that is greater than or equal to `key`. Returns `None` if
    /// such an element does not exist.
    pub fn ceil(&self, key: &T) -> Option<&T> {
        self.ceil_by(|value| self.comparator.compare(key, value))
            .map(|id| self.value(id))
    }

    /// Moves every element of `other` that is not already present into `self`, in ascending
    /// order. Afterwards `other` holds exactly the elements that collided.
    ///
    /// # Examples
    ///
    /// ```
    /// use rb_collections::red_black_tree::RedBlackTree;
    ///
    /// let mut tree: RedBlackTree<u32> = [1, 2, 3].iter().cloned().collect();
    /// let mut other: RedBlackTree<u32> = [3, 4, 5].iter().cloned().collect();
    /// tree.merge(&mut other);
    ///
    /// assert_eq!(tree.iter().cloned().collect::<Vec<u32>>(), vec![1, 2, 3, 4, 5]);
    /// assert_eq!(other.iter().cloned().collect::<Vec<u32>>(), vec![3]);
    /// ```
    pub fn merge(&mut self, other: &mut Self) {
        let values = other.drain_sorted();
        let total = values.len();
        for value in values {
            match self.locate(&value) {
                Slot::Vacant(slot) => {
                    let parent = slot.map(|(parent, _)| parent);
                    let id = self.arena.allocate(Node::new(value, parent));
                    self.link(id, slot);
                },
                Slot::Occupied(_) => {
                    other.insert(value);
                },
            }
        }
        debug!(
            "Merged {} of {} elements; {} collided.",
            total - other.len(),
            total,
            other.len(),
        );
    }

    /// Verifies every red-black property, every parent link, the element order and the element
    /// count. Returns the black height of the tree on success.
    ///
    /// A failure indicates a defect in the tree itself and is never expected.
    pub fn check_invariants(&self) -> Result<usize> {
        let violation = |message: String| Err(Error::InvariantViolation(message));

        let root = match self.root {
            None => {
                if self.len != 0 || !self.arena.is_empty() {
                    return violation(format!("empty tree reports {} elements", self.len));
                }
                return Ok(0);
            },
            Some(root) => root,
        };
        if self.node(root).color != Color::Black {
            return violation(String::from("root is red"));
        }
        if self.node(root).parent.is_some() {
            return violation(String::from("root has a parent"));
        }

        let mut black_height = None;
        let mut count = 0;
        let mut stack = vec![(root, 0)];
        while let Some((id, blacks_above)) = stack.pop() {
            count += 1;
            let node = self.node(id);
            let blacks = blacks_above + if node.color == Color::Black { 1 } else { 0 };
            for side in &[Side::Left, Side::Right] {
                match node.child(*side) {
                    Some(child) => {
                        if self.node(child).parent != Some(id) {
                            return violation(String::from("child does not link back to parent"));
                        }
                        if node.color == Color::Red && self.is_red(Some(child)) {
                            return violation(String::from("red node has a red child"));
                        }
                        stack.push((child, blacks));
                    },
                    None => {
                        let height = *black_height.get_or_insert(blacks);
                        if height != blacks {
                            return violation(format!(
                                "black heights {} and {} differ",
                                height, blacks,
                            ));
                        }
                    },
                }
            }
        }

        if count != self.len || count != self.arena.len() {
            return violation(format!(
                "{} reachable nodes, {} counted, {} allocated",
                count,
                self.len,
                self.arena.len(),
            ));
        }

        let mut iter = self.iter();
        if let Some(mut prev) = iter.next() {
            for value in iter {
                if self.comparator.compare(prev, value) != Ordering::Less {
                    return violation(String::from("in-order traversal is not strictly increasing"));
                }
                prev = value;
            }
        }

        Ok(black_height.unwrap_or(0))
    }
}

impl<T, C> Clone for RedBlackTree<T, C>
where
    T: Clone,
    C: Clone,
{
    // Copies values and colors in pre-order; the source shape is already balanced.
    fn clone(&self) -> Self {
        let mut tree = RedBlackTree::with_config(self.comparator.clone(), self.arena.chunk_size());
        let mut stack: Vec<(NodeId, Option<(NodeId, Side)>)> =
            self.root.map(|root| (root, None)).into_iter().collect();
        while let Some((source, slot)) = stack.pop() {
            let node = self.node(source);
            let mut copy = Node::new(node.value.clone(), slot.map(|(parent, _)| parent));
            copy.color = node.color;
            let id = tree.arena.allocate(copy);
            match slot {
                None => tree.root = Some(id),
                Some((parent, side)) => *tree.node_mut(parent).child_mut(side) = Some(id),
            }
            if let Some(right) = node.right {
                stack.push((right, Some((id, Side::Right))));
            }
            if let Some(left) = node.left {
                stack.push((left, Some((id, Side::Left))));
            }
        }
        tree.len = self.len;
        tree
    }
}

impl<T, C> Default for RedBlackTree<T, C>
where
    C: Default,
{
    fn default() -> Self {
        Self::with_comparator(C::default())
    }
}

impl<T, C> fmt::Debug for RedBlackTree<T, C>
where
    T: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<T, C> PartialEq for RedBlackTree<T, C>
where
    T: PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len && self.iter().eq(other.iter())
    }
}

impl<T, C> Eq for RedBlackTree<T, C> where T: Eq {}

impl<T, C> Extend<T> for RedBlackTree<T, C>
where
    C: Compare<T>,
{
    fn extend<I>(&mut self, iter: I)
    where
        I: IntoIterator<Item = T>,
    {
        for value in iter {
            self.insert(value);
        }
    }
}

impl<T, C> FromIterator<T> for RedBlackTree<T, C>
where
    C: Compare<T> + Default,
{
    fn from_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = T>,
    {
        let mut tree = Self::default();
        tree.extend(iter);
        tree
    }
}

impl<T, C> IntoIterator for RedBlackTree<T, C> {
    type IntoIter = RedBlackTreeIntoIter<T>;
    type Item = T;

    fn into_iter(mut self) -> Self::IntoIter {
        RedBlackTreeIntoIter {
            values: self.drain_sorted().into_iter(),
        }
    }
}

impl<'a, T, C> IntoIterator for &'a RedBlackTree<T, C>
where
    T: 'a,
{
    type IntoIter = RedBlackTreeIter<'a, T, C>;
    type Item = &'a T;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// An owning iterator for `RedBlackTree<T, C>`.
///
/// This iterator yields owned elements in ascending order.
pub struct RedBlackTreeIntoIter<T> {
    values: vec::IntoIter<T>,
}

impl<T> Iterator for RedBlackTreeIntoIter<T> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        self.values.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.values.size_hint()
    }
}

impl<T> DoubleEndedIterator for RedBlackTreeIntoIter<T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.values.next_back()
    }
}

/// An iterator for `RedBlackTree<T, C>`.
///
/// This iterator follows parent links, so it needs no stack. It yields immutable references in
/// ascending order from the front and descending order from the back.
pub struct RedBlackTreeIter<'a, T, C = Natural> {
    tree: &'a RedBlackTree<T, C>,
    front: Option<NodeId>,
    back: Option<NodeId>,
    remaining: usize,
}

impl<'a, T, C> Iterator for RedBlackTreeIter<'a, T, C>
where
    T: 'a,
{
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let id = self.front?;
        self.front = self.tree.successor(Some(id));
        self.remaining -= 1;
        Some(self.tree.value(id))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, T, C> DoubleEndedIterator for RedBlackTreeIter<'a, T, C>
where
    T: 'a,
{
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let id = self.back?;
        self.back = self.tree.predecessor(Some(id));
        self.remaining -= 1;
        Some(self.tree.value(id))
    }
}

impl<'a, T, C> ExactSizeIterator for RedBlackTreeIter<'a, T, C> where T: 'a {}

/// A mutable iterator over the elements of a tree in ascending order. Only the adaptors hand it
/// out, and only in a form that cannot change an element's ordering.
pub(crate) struct RedBlackTreeIterMut<'a, T> {
    values: vec::IntoIter<Option<&'a mut T>>,
}

impl<'a, T> Iterator for RedBlackTreeIterMut<'a, T>
where
    T: 'a,
{
    type Item = &'a mut T;

    fn next(&mut self) -> Option<Self::Item> {
        self.values.next().and_then(|value| value)
    }
}

#[cfg(test)]
mod tests {
    use super::RedBlackTree;
    use crate::error::Error;
    use crate::red_black_tree::compare::Natural;
    use crate::red_black_tree::node::Color;
    use std::mem;

    fn build(values: &[u32]) -> RedBlackTree<u32> {
        let mut tree = RedBlackTree::new();
        for value in values {
            tree.insert(*value);
            tree.check_invariants().unwrap();
        }
        tree
    }

    fn collect(tree: &RedBlackTree<u32>) -> Vec<u32> {
        tree.iter().cloned().collect()
    }

    #[test]
    fn test_len_empty() {
        let tree: RedBlackTree<u32> = RedBlackTree::new();
        assert_eq!(tree.len(), 0);
        assert!(tree.is_empty());
        assert_eq!(tree.check_invariants(), Ok(0));
    }

    #[test]
    fn test_min_max_empty() {
        let tree: RedBlackTree<u32> = RedBlackTree::new();
        assert_eq!(tree.min(), None);
        assert_eq!(tree.max(), None);
    }

    #[test]
    fn test_insert_ascending_is_balanced() {
        let values = (0..1024).collect::<Vec<u32>>();
        let tree = build(&values);
        let black_height = tree.check_invariants().unwrap();
        assert!(black_height <= 11);
        assert_eq!(collect(&tree), values);
    }

    #[test]
    fn test_insert_order() {
        let tree = build(&[4, 1, 5, 2, 3]);
        assert_eq!(collect(&tree), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_insert_duplicate() {
        let mut tree = RedBlackTree::new();
        let (first, inserted) = tree.insert(7);
        assert!(inserted);
        let (second, inserted) = tree.insert(7);
        assert!(!inserted);
        assert_eq!(first, second);
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn test_root_is_black() {
        let mut tree = RedBlackTree::new();
        tree.insert(1);
        let root = tree.root.unwrap();
        assert_eq!(tree.node(root).color, Color::Black);
    }

    #[test]
    fn test_erase_node_with_two_children() {
        let mut tree = build(&[10, 20, 15, 1, 22, 0, 12, 78, 11]);
        assert_eq!(tree.len(), 9);

        let position = tree.find(&11).position();
        assert_eq!(tree.erase(position), Some(11));
        tree.check_invariants().unwrap();

        assert!(!tree.contains(&11));
        assert_eq!(tree.len(), 8);
        assert_eq!(collect(&tree), vec![0, 1, 10, 12, 15, 20, 22, 78]);
    }

    #[test]
    fn test_erase_root_with_two_children() {
        let mut tree = build(&[10, 20, 15, 1, 22, 0, 12, 78, 11]);
        let root = tree.root.unwrap();
        let root_value = *tree.value(root);
        let (twelve, _) = tree.insert(12);

        assert_eq!(tree.remove(&root_value), Some(root_value));
        tree.check_invariants().unwrap();
        assert_eq!(tree.get(twelve), Some(&12));
        assert_eq!(tree.len(), 8);
    }

    #[test]
    fn test_erase_end_is_noop() {
        let mut tree = build(&[1, 2, 3]);
        let end = tree.end().position();
        assert_eq!(tree.erase(end), None);
        assert_eq!(tree.len(), 3);
    }

    #[test]
    fn test_erase_stale_position() {
        let mut tree = build(&[1, 2, 3]);
        let position = tree.find(&2).position();
        assert_eq!(tree.erase(position), Some(2));
        assert_eq!(tree.erase(position), None);
        assert_eq!(tree.get(position), None);
        tree.check_invariants().unwrap();
    }

    #[test]
    fn test_erase_position_of_other_tree() {
        let mut tree = build(&(0..10).collect::<Vec<u32>>());
        let mut other = RedBlackTree::new();
        let (position, _) = other.insert(999);

        assert_eq!(tree.erase(position), None);
        assert_eq!(tree.get(position), None);
        assert!(tree.cursor(position) == tree.end());
        assert_eq!(tree.len(), 10);
        assert_eq!(other.get(position), Some(&999));
    }

    #[test]
    fn test_erase_stale_position_after_reuse() {
        let mut tree = RedBlackTree::new();
        let (stale, _) = tree.insert(1);
        assert_eq!(tree.erase(stale), Some(1));
        let (fresh, _) = tree.insert(2);

        assert_eq!(tree.erase(stale), None);
        assert_eq!(tree.get(stale), None);
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.get(fresh), Some(&2));
    }

    #[test]
    fn test_swap_keeps_positions_with_elements() {
        let mut left = RedBlackTree::new();
        let (position, _) = left.insert(1);
        let mut right = build(&[5]);
        left.swap(&mut right);

        assert_eq!(left.get(position), None);
        assert_eq!(right.get(position), Some(&1));
        assert_eq!(right.erase(position), Some(1));
    }

    #[test]
    fn test_erase_all() {
        let values = (0..200).map(|i| (i * 37) % 200).collect::<Vec<u32>>();
        let mut tree = build(&values);
        for value in &values {
            assert_eq!(tree.remove(value), Some(*value));
            tree.check_invariants().unwrap();
        }
        assert!(tree.is_empty());
        assert!(tree.begin() == tree.end());
    }

    #[test]
    fn test_floor_ceil() {
        let tree = build(&[1, 3, 5]);

        assert_eq!(tree.floor(&0), None);
        assert_eq!(tree.floor(&2), Some(&1));
        assert_eq!(tree.floor(&4), Some(&3));
        assert_eq!(tree.floor(&6), Some(&5));

        assert_eq!(tree.ceil(&0), Some(&1));
        assert_eq!(tree.ceil(&2), Some(&3));
        assert_eq!(tree.ceil(&4), Some(&5));
        assert_eq!(tree.ceil(&6), None);
    }

    #[test]
    fn test_clear() {
        let mut tree = build(&[5, 3, 8, 1]);
        tree.clear();
        assert!(tree.is_empty());
        assert!(tree.arena.is_empty());
        assert_eq!(tree.arena.capacity(), 0);
        tree.check_invariants().unwrap();

        tree.insert(2);
        assert_eq!(collect(&tree), vec![2]);
    }

    #[test]
    fn test_clear_invalidates_positions() {
        let mut tree = RedBlackTree::new();
        let (position, _) = tree.insert(1);
        tree.clear();
        tree.insert(2);

        assert_eq!(tree.get(position), None);
        assert_eq!(tree.erase(position), None);
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn test_clone_keeps_shape() {
        let tree = build(&[8, 4, 12, 2, 6, 10, 14, 1]);
        let copy = tree.clone();
        copy.check_invariants().unwrap();
        assert_eq!(copy, tree);
        assert_eq!(copy.len(), tree.len());

        let root = tree.root.unwrap();
        let copy_root = copy.root.unwrap();
        assert_eq!(tree.value(root), copy.value(copy_root));
    }

    #[test]
    fn test_take_leaves_source_empty() {
        let mut tree = build(&[1, 2, 3]);
        let moved = mem::take(&mut tree);
        assert_eq!(collect(&moved), vec![1, 2, 3]);
        assert!(tree.is_empty());
        assert!(!tree.contains(&1));
    }

    #[test]
    fn test_swap() {
        let mut left = build(&[1, 2]);
        let mut right = build(&[3]);
        left.swap(&mut right);
        assert_eq!(collect(&left), vec![3]);
        assert_eq!(collect(&right), vec![1, 2]);
    }

    #[test]
    fn test_merge() {
        let mut tree = build(&[1, 2, 3]);
        let mut other = build(&[3, 4, 5]);
        tree.merge(&mut other);
        tree.check_invariants().unwrap();
        other.check_invariants().unwrap();
        assert_eq!(collect(&tree), vec![1, 2, 3, 4, 5]);
        assert_eq!(collect(&other), vec![3]);
    }

    #[test]
    fn test_merge_into_empty() {
        let mut tree = RedBlackTree::new();
        let mut other = build(&[3, 1, 2]);
        tree.merge(&mut other);
        assert_eq!(collect(&tree), vec![1, 2, 3]);
        assert!(other.is_empty());
    }

    #[test]
    fn test_try_insert_allocation_failure() {
        let mut tree = RedBlackTree::with_config(Natural, usize::max_value() / 2);
        assert_eq!(tree.try_insert(1u64), Err(Error::AllocationFailure));
        assert!(tree.is_empty());
        tree.check_invariants().unwrap();
    }

    #[test]
    fn test_max_size() {
        let small: RedBlackTree<u8> = RedBlackTree::new();
        let large: RedBlackTree<[u64; 16]> = RedBlackTree::new();
        assert!(small.max_size() > large.max_size());
        assert!(large.max_size() > 0);
    }

    #[test]
    fn test_iter_back_and_forth() {
        let tree = build(&[3, 1, 2, 5, 4]);
        assert_eq!(
            tree.iter().rev().cloned().collect::<Vec<u32>>(),
            vec![5, 4, 3, 2, 1],
        );
        assert_eq!(tree.iter().len(), 5);
    }

    #[test]
    fn test_iter_mut_in_order() {
        let mut tree = build(&[30, 10, 20]);
        let mut seen = Vec::new();
        for value in tree.iter_mut() {
            seen.push(*value);
        }
        assert_eq!(seen, vec![10, 20, 30]);
    }

    #[test]
    fn test_iter_mut_after_erase_across_chunks() {
        let mut tree = RedBlackTree::with_config(Natural, 3);
        for value in &[8, 2, 6, 4, 0, 9, 7, 5, 3, 1] {
            tree.insert(*value);
        }
        tree.remove(&6);
        tree.remove(&0);
        tree.insert(11);

        let seen = tree.iter_mut().map(|value| *value).collect::<Vec<u32>>();
        assert_eq!(seen, vec![1, 2, 3, 4, 5, 7, 8, 9, 11]);
    }

    #[test]
    fn test_into_iter() {
        let tree = build(&[2, 3, 1]);
        assert_eq!(tree.into_iter().collect::<Vec<u32>>(), vec![1, 2, 3]);
    }

    #[test]
    fn test_custom_comparator() {
        let mut tree = RedBlackTree::with_comparator(|left: &i32, right: &i32| right.cmp(left));
        for value in &[1, 5, 3] {
            tree.insert(*value);
        }
        tree.check_invariants().unwrap();
        assert_eq!(tree.iter().cloned().collect::<Vec<i32>>(), vec![5, 3, 1]);
        assert_eq!(tree.floor(&4), Some(&5));
    }
}
