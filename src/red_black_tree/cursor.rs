use crate::red_black_tree::compare::Natural;
use crate::red_black_tree::node::NodeId;
use crate::red_black_tree::tree::RedBlackTree;
use std::fmt;
use std::ptr;

/// A detached handle to an element of a tree, or to its end.
///
/// A `Position` does not borrow the tree, so it can be passed back to mutating operations such as
/// `erase`. It stays valid until its own element is erased. Positions of other elements are not
/// affected by an erase. A position remembers the tree it came from, so handing it to another
/// tree, or using it after its element was erased, resolves to the end.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Position {
    tree: usize,
    node: Option<NodeId>,
}

impl Position {
    pub(crate) fn new(tree: usize, node: Option<NodeId>) -> Self {
        Position { tree, node }
    }

    pub(crate) fn tree(self) -> usize {
        self.tree
    }

    pub(crate) fn node(self) -> Option<NodeId> {
        self.node
    }

    /// Returns `true` if this is the end position.
    pub fn is_end(self) -> bool {
        self.node.is_none()
    }
}

/// A bidirectional cursor over the elements of a `RedBlackTree`.
///
/// A cursor points either at an element or at the end of the tree, one past the largest element.
/// Moving forward from the largest element reaches the end. Moving backward from the end reaches
/// the largest element, or stays at the end if the tree is empty. Two cursors are equal when they
/// point at the same element of the same tree, or are both at its end.
///
/// # Examples
///
/// ```
/// use rb_collections::red_black_tree::RedBlackTree;
///
/// let tree: RedBlackTree<u32> = [1, 2, 3].iter().cloned().collect();
///
/// let mut cursor = tree.end();
/// cursor.move_prev();
/// assert_eq!(cursor.get(), Some(&3));
///
/// cursor.move_next();
/// assert!(cursor == tree.end());
/// assert_eq!(cursor.get(), None);
/// ```
pub struct Cursor<'a, T, C = Natural> {
    tree: &'a RedBlackTree<T, C>,
    node: Option<NodeId>,
}

impl<'a, T, C> Cursor<'a, T, C> {
    pub(crate) fn new(tree: &'a RedBlackTree<T, C>, node: Option<NodeId>) -> Self {
        Cursor { tree, node }
    }

    /// Returns the element under the cursor, or `None` at the end.
    pub fn get(&self) -> Option<&'a T> {
        let tree = self.tree;
        self.node.map(|id| tree.value(id))
    }

    /// Returns `true` if the cursor is at the end of the tree.
    pub fn is_end(&self) -> bool {
        self.node.is_none()
    }

    /// Returns a detached handle to the cursor's current position.
    pub fn position(&self) -> Position {
        self.tree.position(self.node)
    }

    /// Moves the cursor to the next element in order. At the end it stays at the end.
    pub fn move_next(&mut self) {
        self.node = self.tree.successor(self.node);
    }

    /// Moves the cursor to the previous element in order. From the end it moves to the largest
    /// element. At the smallest element it moves to the end.
    pub fn move_prev(&mut self) {
        self.node = self.tree.predecessor(self.node);
    }

    /// Returns a cursor at the next element, leaving this one in place.
    pub fn next_cursor(&self) -> Self {
        let mut ret = *self;
        ret.move_next();
        ret
    }

    /// Returns a cursor at the previous element, leaving this one in place.
    pub fn prev_cursor(&self) -> Self {
        let mut ret = *self;
        ret.move_prev();
        ret
    }
}

impl<'a, T, C> Clone for Cursor<'a, T, C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, T, C> Copy for Cursor<'a, T, C> {}

impl<'a, T, C> PartialEq for Cursor<'a, T, C> {
    fn eq(&self, other: &Self) -> bool {
        ptr::eq(self.tree, other.tree) && self.node == other.node
    }
}

impl<'a, T, C> Eq for Cursor<'a, T, C> {}

impl<'a, T, C> fmt::Debug for Cursor<'a, T, C>
where
    T: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Cursor").field(&self.get()).finish()
    }
}

#[cfg(test)]
mod tests {
    use crate::red_black_tree::tree::RedBlackTree;

    fn build(values: &[u32]) -> RedBlackTree<u32> {
        values.iter().cloned().collect()
    }

    #[test]
    fn test_prev_of_end_on_empty_tree() {
        let tree: RedBlackTree<u32> = RedBlackTree::new();
        let mut cursor = tree.end();
        cursor.move_prev();
        assert!(cursor.is_end());
        assert!(cursor == tree.begin());
    }

    #[test]
    fn test_next_of_end_stays_at_end() {
        let tree = build(&[1]);
        let mut cursor = tree.end();
        cursor.move_next();
        assert!(cursor == tree.end());
    }

    #[test]
    fn test_walk_forward() {
        let tree = build(&[4, 1, 5, 2, 3]);
        let mut cursor = tree.begin();
        let mut values = Vec::new();
        while cursor != tree.end() {
            values.push(*cursor.get().unwrap());
            cursor.move_next();
        }
        assert_eq!(values, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_walk_backward() {
        let tree = build(&[4, 1, 5, 2, 3]);
        let mut cursor = tree.end();
        let mut values = Vec::new();
        loop {
            cursor.move_prev();
            match cursor.get() {
                Some(value) => values.push(*value),
                None => break,
            }
        }
        assert_eq!(values, vec![5, 4, 3, 2, 1]);
    }

    #[test]
    fn test_symmetry() {
        let tree = build(&[8, 3, 10, 1, 6, 14, 4, 7, 13]);
        let mut cursor = tree.begin();
        while !cursor.is_end() {
            assert!(cursor.next_cursor().prev_cursor() == cursor);
            if cursor != tree.begin() {
                assert!(cursor.prev_cursor().next_cursor() == cursor);
            }
            cursor.move_next();
        }
    }

    #[test]
    fn test_cursors_of_different_trees_differ() {
        let left = build(&[]);
        let right = build(&[]);
        assert!(left.end() != right.end());
        assert!(left.end() == left.end());
    }

    #[test]
    fn test_position_round_trip() {
        let tree = build(&[2, 4, 6]);
        let position = tree.find(&4).position();
        assert!(!position.is_end());
        assert_eq!(tree.cursor(position).get(), Some(&4));
        assert!(tree.end().position().is_end());
    }
}
