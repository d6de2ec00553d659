use crate::error::Result;
use crate::red_black_tree::compare::{Compare, Natural};
use crate::red_black_tree::cursor::{Cursor, Position};
use crate::red_black_tree::tree::{RedBlackTree, RedBlackTreeIntoIter, RedBlackTreeIter};
use std::fmt;
use std::iter::FromIterator;

/// An ordered set implemented using a red black tree.
///
/// A red black tree is a self-balancing binary search tree that colors every node red or black so
/// that no path from the root to a missing child is more than twice as long as any other.
///
/// # Examples
///
/// ```
/// use rb_collections::red_black_tree::RedBlackSet;
///
/// let mut set = RedBlackSet::new();
/// set.insert(0);
/// set.insert(3);
///
/// assert_eq!(set.len(), 2);
///
/// assert_eq!(set.min(), Some(&0));
/// assert_eq!(set.ceil(&2), Some(&3));
///
/// assert_eq!(set.remove(&0), Some(0));
/// assert_eq!(set.remove(&1), None);
/// ```
pub struct RedBlackSet<T, C = Natural> {
    tree: RedBlackTree<T, C>,
}

impl<T> RedBlackSet<T, Natural> {
    /// Constructs a new, empty `RedBlackSet<T>`
    ///
    /// # Examples
    ///
    /// ```
    /// use rb_collections::red_black_tree::RedBlackSet;
    ///
    /// let set: RedBlackSet<u32> = RedBlackSet::new();
    /// ```
    pub fn new() -> Self {
        Self::with_comparator(Natural)
    }
}

impl<T, C> RedBlackSet<T, C> {
    /// Constructs a new, empty set ordered by `comparator`.
    pub fn with_comparator(comparator: C) -> Self {
        RedBlackSet {
            tree: RedBlackTree::with_comparator(comparator),
        }
    }

    /// Returns the number of elements in the set.
    ///
    /// # Examples
    ///
    /// ```
    /// use rb_collections::red_black_tree::RedBlackSet;
    ///
    /// let mut set = RedBlackSet::new();
    /// set.insert(1);
    /// assert_eq!(set.len(), 1);
    /// ```
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    /// Returns `true` if the set is empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use rb_collections::red_black_tree::RedBlackSet;
    ///
    /// let set: RedBlackSet<u32> = RedBlackSet::new();
    /// assert!(set.is_empty());
    /// ```
    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Returns the theoretical maximum number of elements the set can hold.
    pub fn max_size(&self) -> usize {
        self.tree.max_size()
    }

    /// Clears the set, removing all values.
    ///
    /// # Examples
    ///
    /// ```
    /// use rb_collections::red_black_tree::RedBlackSet;
    ///
    /// let mut set = RedBlackSet::new();
    /// set.insert(1);
    /// set.insert(2);
    /// set.clear();
    /// assert_eq!(set.is_empty(), true);
    /// ```
    pub fn clear(&mut self) {
        self.tree.clear();
    }

    /// Exchanges the contents of two sets in constant time.
    pub fn swap(&mut self, other: &mut Self) {
        self.tree.swap(&mut other.tree);
    }

    /// Removes the element at `position` and returns it. Does nothing for the end position.
    pub fn erase(&mut self, position: Position) -> Option<T> {
        self.tree.erase(position)
    }

    /// Returns a cursor at the smallest element, or the end cursor if the set is empty.
    pub fn begin(&self) -> Cursor<'_, T, C> {
        self.tree.begin()
    }

    /// Returns the end cursor of the set.
    pub fn end(&self) -> Cursor<'_, T, C> {
        self.tree.end()
    }

    /// Returns a cursor at `position`.
    pub fn cursor(&self, position: Position) -> Cursor<'_, T, C> {
        self.tree.cursor(position)
    }

    /// Returns the minimum key of the set. Returns `None` if the set is empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use rb_collections::red_black_tree::RedBlackSet;
    ///
    /// let mut set = RedBlackSet::new();
    /// set.insert(1);
    /// set.insert(3);
    /// assert_eq!(set.min(), Some(&1));
    /// ```
    pub fn min(&self) -> Option<&T> {
        self.tree.min()
    }

    /// Returns the maximum key of the set. Returns `None` if the set is empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use rb_collections::red_black_tree::RedBlackSet;
    ///
    /// let mut set = RedBlackSet::new();
    /// set.insert(1);
    /// set.insert(3);
    /// assert_eq!(set.max(), Some(&3));
    /// ```
    pub fn max(&self) -> Option<&T> {
        self.tree.max()
    }

    /// Returns an iterator over the set. The iterator will yield keys using in-order traversal.
    ///
    /// # Examples
    ///
    /// ```
    /// use rb_collections::red_black_tree::RedBlackSet;
    ///
    /// let mut set = RedBlackSet::new();
    /// set.insert(1);
    /// set.insert(3);
    ///
    /// let mut iterator = set.iter();
    /// assert_eq!(iterator.next(), Some(&1));
    /// assert_eq!(iterator.next(), Some(&3));
    /// assert_eq!(iterator.next(), None);
    /// ```
    pub fn iter(&self) -> RedBlackSetIter<'_, T, C> {
        RedBlackSetIter {
            inner: self.tree.iter(),
        }
    }
}

impl<T, C> RedBlackSet<T, C>
where
    C: Compare<T>,
{
    /// Inserts a key into the set. Returns the position of the key and whether it was newly
    /// inserted. If an equal key already exists, the set is left unchanged.
    ///
    /// # Examples
    ///
    /// ```
    /// use rb_collections::red_black_tree::RedBlackSet;
    ///
    /// let mut set = RedBlackSet::new();
    /// assert!(set.insert(1).1);
    /// assert!(set.contains(&1));
    /// assert!(!set.insert(1).1);
    /// ```
    pub fn insert(&mut self, key: T) -> (Position, bool) {
        self.tree.insert(key)
    }

    /// Inserts a key like `insert`, but reports `Error::AllocationFailure` instead of aborting
    /// when the key cannot be allocated.
    pub fn try_insert(&mut self, key: T) -> Result<(Position, bool)> {
        self.tree.try_insert(key)
    }

    /// Returns a cursor at `key`, or the end cursor if the key is absent.
    ///
    /// # Examples
    ///
    /// ```
    /// use rb_collections::red_black_tree::RedBlackSet;
    ///
    /// let mut set = RedBlackSet::new();
    /// set.insert(1);
    /// assert_eq!(set.find(&1).get(), Some(&1));
    /// assert!(set.find(&2) == set.end());
    /// ```
    pub fn find(&self, key: &T) -> Cursor<'_, T, C> {
        self.tree.find(key)
    }

    /// Removes a key from the set. If the key exists in the set, it will return the associated
    /// key. Otherwise it will return `None`.
    ///
    /// # Examples
    ///
    /// ```
    /// use rb_collections::red_black_tree::RedBlackSet;
    ///
    /// let mut set = RedBlackSet::new();
    /// set.insert(1);
    /// assert_eq!(set.remove(&1), Some(1));
    /// assert_eq!(set.remove(&1), None);
    /// ```
    pub fn remove(&mut self, key: &T) -> Option<T> {
        self.tree.remove(key)
    }

    /// Checks if a key exists in the set.
    ///
    /// # Examples
    ///
    /// ```
    /// use rb_collections::red_black_tree::RedBlackSet;
    ///
    /// let mut set = RedBlackSet::new();
    /// set.insert(1);
    /// assert!(!set.contains(&0));
    /// assert!(set.contains(&1));
    /// ```
    pub fn contains(&self, key: &T) -> bool {
        self.tree.contains(key)
    }

    /// Returns a key in the set that is less than or equal to a particular key. Returns `None` if
    /// such a key does not exist.
    ///
    /// # Examples
    ///
    /// ```
    /// use rb_collections::red_black_tree::RedBlackSet;
    ///
    /// let mut set = RedBlackSet::new();
    /// set.insert(1);
    /// assert_eq!(set.floor(&0), None);
    /// assert_eq!(set.floor(&2), Some(&1));
    /// ```
    pub fn floor(&self, key: &T) -> Option<&T> {
        self.tree.floor(key)
    }

    /// Returns a key in the set that is greater than or equal to a particular key. Returns `None`
    /// if such a key does not exist.
    ///
    /// # Examples
    ///
    /// ```
    /// use rb_collections::red_black_tree::RedBlackSet;
    ///
    /// let mut set = RedBlackSet::new();
    /// set.insert(1);
    /// assert_eq!(set.ceil(&0), Some(&1));
    /// assert_eq!(set.ceil(&2), None);
    /// ```
    pub fn ceil(&self, key: &T) -> Option<&T> {
        self.tree.ceil(key)
    }

    /// Moves every key of `other` that is not already present into `self`. Afterwards `other`
    /// holds exactly the keys that collided.
    ///
    /// # Examples
    ///
    /// ```
    /// use rb_collections::red_black_tree::RedBlackSet;
    ///
    /// let mut set: RedBlackSet<u32> = vec![1, 2, 3].into_iter().collect();
    /// let mut other: RedBlackSet<u32> = vec![3, 4, 5].into_iter().collect();
    /// set.merge(&mut other);
    ///
    /// assert_eq!(set.len(), 5);
    /// assert_eq!(other.iter().collect::<Vec<&u32>>(), vec![&3]);
    /// ```
    pub fn merge(&mut self, other: &mut Self) {
        self.tree.merge(&mut other.tree);
    }
}

impl<T, C> Clone for RedBlackSet<T, C>
where
    T: Clone,
    C: Clone,
{
    fn clone(&self) -> Self {
        RedBlackSet {
            tree: self.tree.clone(),
        }
    }
}

impl<T, C> fmt::Debug for RedBlackSet<T, C>
where
    T: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<T, C> PartialEq for RedBlackSet<T, C>
where
    T: PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        self.tree == other.tree
    }
}

impl<T, C> Eq for RedBlackSet<T, C> where T: Eq {}

impl<T, C> Extend<T> for RedBlackSet<T, C>
where
    C: Compare<T>,
{
    fn extend<I>(&mut self, iter: I)
    where
        I: IntoIterator<Item = T>,
    {
        self.tree.extend(iter);
    }
}

impl<T, C> FromIterator<T> for RedBlackSet<T, C>
where
    C: Compare<T> + Default,
{
    fn from_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = T>,
    {
        RedBlackSet {
            tree: RedBlackTree::from_iter(iter),
        }
    }
}

impl<T, C> IntoIterator for RedBlackSet<T, C> {
    type IntoIter = RedBlackSetIntoIter<T>;
    type Item = T;

    fn into_iter(self) -> Self::IntoIter {
        Self::IntoIter {
            inner: self.tree.into_iter(),
        }
    }
}

impl<'a, T, C> IntoIterator for &'a RedBlackSet<T, C>
where
    T: 'a,
{
    type IntoIter = RedBlackSetIter<'a, T, C>;
    type Item = &'a T;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// An owning iterator for `RedBlackSet<T, C>`.
///
/// This iterator traverses the elements of the set in-order and yields owned keys.
pub struct RedBlackSetIntoIter<T> {
    inner: RedBlackTreeIntoIter<T>,
}

impl<T> Iterator for RedBlackSetIntoIter<T> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }
}

/// An iterator for `RedBlackSet<T, C>`.
///
/// This iterator traverses the elements of the set in-order and yields immutable references.
pub struct RedBlackSetIter<'a, T, C = Natural> {
    inner: RedBlackTreeIter<'a, T, C>,
}

impl<'a, T, C> Iterator for RedBlackSetIter<'a, T, C>
where
    T: 'a,
{
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }
}

impl<'a, T, C> DoubleEndedIterator for RedBlackSetIter<'a, T, C>
where
    T: 'a,
{
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back()
    }
}

impl<T, C> Default for RedBlackSet<T, C>
where
    C: Default,
{
    fn default() -> Self {
        Self::with_comparator(C::default())
    }
}

#[cfg(test)]
mod tests {
    use super::RedBlackSet;

    #[test]
    fn test_len_empty() {
        let set: RedBlackSet<u32> = RedBlackSet::new();
        assert_eq!(set.len(), 0);
    }

    #[test]
    fn test_is_empty() {
        let set: RedBlackSet<u32> = RedBlackSet::new();
        assert!(set.is_empty());
    }

    #[test]
    fn test_min_max_empty() {
        let set: RedBlackSet<u32> = RedBlackSet::new();
        assert_eq!(set.min(), None);
        assert_eq!(set.max(), None);
    }

    #[test]
    fn test_insert() {
        let mut set = RedBlackSet::new();
        assert!(set.insert(1).1);
        assert!(set.contains(&1));
    }

    #[test]
    fn test_insert_existing() {
        let mut set = RedBlackSet::new();
        let (first, inserted) = set.insert(1);
        assert!(inserted);
        let (second, inserted) = set.insert(1);
        assert!(!inserted);
        assert_eq!(first, second);
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_remove() {
        let mut set = RedBlackSet::new();
        set.insert(1);
        assert_eq!(set.remove(&1), Some(1));
        assert!(!set.contains(&1));
    }

    #[test]
    fn test_find_and_erase() {
        let mut set: RedBlackSet<u32> = vec![5, 1, 9].into_iter().collect();
        let position = set.find(&5).position();
        assert_eq!(set.erase(position), Some(5));
        assert!(set.find(&5) == set.end());
        assert_eq!(set.iter().collect::<Vec<&u32>>(), vec![&1, &9]);
    }

    #[test]
    fn test_min_max() {
        let mut set = RedBlackSet::new();
        set.insert(1);
        set.insert(3);
        set.insert(5);

        assert_eq!(set.min(), Some(&1));
        assert_eq!(set.max(), Some(&5));
    }

    #[test]
    fn test_floor_ceil() {
        let mut set = RedBlackSet::new();
        set.insert(1);
        set.insert(3);
        set.insert(5);

        assert_eq!(set.floor(&0), None);
        assert_eq!(set.floor(&2), Some(&1));
        assert_eq!(set.floor(&4), Some(&3));
        assert_eq!(set.floor(&6), Some(&5));

        assert_eq!(set.ceil(&0), Some(&1));
        assert_eq!(set.ceil(&2), Some(&3));
        assert_eq!(set.ceil(&4), Some(&5));
        assert_eq!(set.ceil(&6), None);
    }

    #[test]
    fn test_clone_and_eq() {
        let set: RedBlackSet<u32> = vec![2, 1, 3].into_iter().collect();
        let mut copy = set.clone();
        assert_eq!(copy, set);
        copy.insert(4);
        assert_ne!(copy, set);
    }

    #[test]
    fn test_swap() {
        let mut set: RedBlackSet<u32> = vec![1, 2].into_iter().collect();
        let mut other: RedBlackSet<u32> = vec![9].into_iter().collect();
        set.swap(&mut other);
        assert_eq!(set.iter().collect::<Vec<&u32>>(), vec![&9]);
        assert_eq!(other.iter().collect::<Vec<&u32>>(), vec![&1, &2]);
    }

    #[test]
    fn test_max_size_positive() {
        let set: RedBlackSet<u32> = RedBlackSet::new();
        assert!(set.max_size() > 0);

        let reversed: RedBlackSet<u32, _> =
            RedBlackSet::with_comparator(|left: &u32, right: &u32| right.cmp(left));
        assert_eq!(reversed.max_size(), set.max_size());
    }

    #[test]
    fn test_into_iter() {
        let mut set = RedBlackSet::new();
        set.insert(1);
        set.insert(5);
        set.insert(3);

        assert_eq!(set.into_iter().collect::<Vec<u32>>(), vec![1, 3, 5]);
    }

    #[test]
    fn test_iter() {
        let mut set = RedBlackSet::new();
        set.insert(1);
        set.insert(5);
        set.insert(3);

        assert_eq!(set.iter().collect::<Vec<&u32>>(), vec![&1, &3, &5]);
        assert_eq!(set.iter().rev().collect::<Vec<&u32>>(), vec![&5, &3, &1]);
    }
}
