use crate::entry::Entry;
use crate::error::{Error, Result};
use crate::red_black_tree::compare::{ByKey, Compare, Natural};
use crate::red_black_tree::cursor::{Cursor, Position};
use crate::red_black_tree::tree::{
    RedBlackTree, RedBlackTreeIntoIter, RedBlackTreeIter, RedBlackTreeIterMut,
};
use std::fmt;
use std::iter::FromIterator;
use std::ops::{Index, IndexMut};

/// An ordered map implemented using a red black tree.
///
/// A red black tree is a self-balancing binary search tree that colors every node red or black.
/// No red node has a red child, and every path from a node down to a missing child crosses the
/// same number of black nodes. Together these keep the height logarithmic in the number of
/// entries.
///
/// Entries are ordered by key only, using the key comparator `C`. Inserting an existing key
/// never overwrites its value. `insert_or_assign` does.
///
/// # Examples
///
/// ```
/// use rb_collections::red_black_tree::RedBlackMap;
///
/// let mut map = RedBlackMap::new();
/// map.insert(0, 1);
/// map.insert(3, 4);
///
/// assert_eq!(map[&0], 1);
/// assert_eq!(map.get(&1), None);
/// assert_eq!(map.len(), 2);
///
/// assert_eq!(map.min(), Some(&0));
/// assert_eq!(map.ceil(&2), Some(&3));
///
/// map[&0] = 2;
/// assert_eq!(map.remove(&0), Some((0, 2)));
/// assert_eq!(map.remove(&1), None);
/// ```
pub struct RedBlackMap<K, V, C = Natural> {
    tree: RedBlackTree<Entry<K, V>, ByKey<C>>,
}

impl<K, V> RedBlackMap<K, V, Natural> {
    /// Constructs a new, empty `RedBlackMap<K, V>`.
    ///
    /// # Examples
    ///
    /// ```
    /// use rb_collections::red_black_tree::RedBlackMap;
    ///
    /// let map: RedBlackMap<u32, u32> = RedBlackMap::new();
    /// ```
    pub fn new() -> Self {
        Self::with_comparator(Natural)
    }
}

impl<K, V, C> RedBlackMap<K, V, C> {
    /// Constructs a new, empty map whose keys are ordered by `comparator`.
    ///
    /// # Examples
    ///
    /// ```
    /// use rb_collections::red_black_tree::RedBlackMap;
    ///
    /// let mut map = RedBlackMap::with_comparator(|left: &u32, right: &u32| right.cmp(left));
    /// map.insert(1, "one");
    /// map.insert(2, "two");
    /// assert_eq!(map.min(), Some(&2));
    /// ```
    pub fn with_comparator(comparator: C) -> Self {
        RedBlackMap {
            tree: RedBlackTree::with_comparator(ByKey::new(comparator)),
        }
    }

    /// Returns the number of entries in the map.
    ///
    /// # Examples
    ///
    /// ```
    /// use rb_collections::red_black_tree::RedBlackMap;
    ///
    /// let mut map = RedBlackMap::new();
    /// map.insert(1, 1);
    /// assert_eq!(map.len(), 1);
    /// ```
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    /// Returns `true` if the map is empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use rb_collections::red_black_tree::RedBlackMap;
    ///
    /// let map: RedBlackMap<u32, u32> = RedBlackMap::new();
    /// assert!(map.is_empty());
    /// ```
    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Returns the theoretical maximum number of entries the map can hold.
    pub fn max_size(&self) -> usize {
        self.tree.max_size()
    }

    /// Clears the map, removing all entries.
    ///
    /// # Examples
    ///
    /// ```
    /// use rb_collections::red_black_tree::RedBlackMap;
    ///
    /// let mut map = RedBlackMap::new();
    /// map.insert(1, 1);
    /// map.insert(2, 2);
    /// map.clear();
    /// assert_eq!(map.is_empty(), true);
    /// ```
    pub fn clear(&mut self) {
        self.tree.clear();
    }

    /// Exchanges the contents of two maps in constant time.
    pub fn swap(&mut self, other: &mut Self) {
        self.tree.swap(&mut other.tree);
    }

    /// Removes the entry at `position` and returns it. Does nothing for the end position.
    ///
    /// # Examples
    ///
    /// ```
    /// use rb_collections::red_black_tree::RedBlackMap;
    ///
    /// let mut map = RedBlackMap::new();
    /// let (position, _) = map.insert(1, "one");
    /// assert_eq!(map.erase(position), Some((1, "one")));
    /// assert!(map.is_empty());
    /// ```
    pub fn erase(&mut self, position: Position) -> Option<(K, V)> {
        self.tree.erase(position).map(Entry::into_pair)
    }

    /// Returns a cursor at the entry with the smallest key, or the end cursor if the map is empty.
    pub fn begin(&self) -> RedBlackMapCursor<'_, K, V, C> {
        RedBlackMapCursor {
            inner: self.tree.begin(),
        }
    }

    /// Returns the end cursor of the map.
    pub fn end(&self) -> RedBlackMapCursor<'_, K, V, C> {
        RedBlackMapCursor {
            inner: self.tree.end(),
        }
    }

    /// Returns a cursor at `position`.
    pub fn cursor(&self, position: Position) -> RedBlackMapCursor<'_, K, V, C> {
        RedBlackMapCursor {
            inner: self.tree.cursor(position),
        }
    }

    /// Returns the minimum key of the map. Returns `None` if the map is empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use rb_collections::red_black_tree::RedBlackMap;
    ///
    /// let mut map = RedBlackMap::new();
    /// map.insert(1, 1);
    /// map.insert(3, 3);
    /// assert_eq!(map.min(), Some(&1));
    /// ```
    pub fn min(&self) -> Option<&K> {
        self.tree.min().map(|entry| &entry.key)
    }

    /// Returns the maximum key of the map. Returns `None` if the map is empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use rb_collections::red_black_tree::RedBlackMap;
    ///
    /// let mut map = RedBlackMap::new();
    /// map.insert(1, 1);
    /// map.insert(3, 3);
    /// assert_eq!(map.max(), Some(&3));
    /// ```
    pub fn max(&self) -> Option<&K> {
        self.tree.max().map(|entry| &entry.key)
    }

    /// Returns an iterator over the map. The iterator will yield key-value pairs in ascending key
    /// order.
    ///
    /// # Examples
    ///
    /// ```
    /// use rb_collections::red_black_tree::RedBlackMap;
    ///
    /// let mut map = RedBlackMap::new();
    /// map.insert(1, 1);
    /// map.insert(2, 2);
    ///
    /// let mut iterator = map.iter();
    /// assert_eq!(iterator.next(), Some((&1, &1)));
    /// assert_eq!(iterator.next(), Some((&2, &2)));
    /// assert_eq!(iterator.next(), None);
    /// ```
    pub fn iter(&self) -> RedBlackMapIter<'_, K, V, C> {
        RedBlackMapIter {
            inner: self.tree.iter(),
        }
    }

    /// Returns a mutable iterator over the map. The iterator will yield key-value pairs in
    /// ascending key order. Only values can be modified.
    ///
    /// # Examples
    ///
    /// ```
    /// use rb_collections::red_black_tree::RedBlackMap;
    ///
    /// let mut map = RedBlackMap::new();
    /// map.insert(1, 1);
    /// map.insert(2, 2);
    ///
    /// for (key, value) in &mut map {
    ///     *value += 1;
    /// }
    ///
    /// let mut iterator = map.iter_mut();
    /// assert_eq!(iterator.next(), Some((&1, &mut 2)));
    /// assert_eq!(iterator.next(), Some((&2, &mut 3)));
    /// assert_eq!(iterator.next(), None);
    /// ```
    pub fn iter_mut(&mut self) -> RedBlackMapIterMut<'_, K, V> {
        RedBlackMapIterMut {
            inner: self.tree.iter_mut(),
        }
    }
}

impl<K, V, C> RedBlackMap<K, V, C>
where
    C: Compare<K>,
{
    fn search(&self, key: &K) -> Position {
        let order = self.tree.comparator();
        self.tree
            .position(self.tree.search_by(|entry| order.compare_key(key, entry)))
    }

    /// Inserts a key-value pair into the map. Returns the position of the entry with `key` and
    /// whether a new entry was created. An existing entry keeps its value.
    ///
    /// # Examples
    ///
    /// ```
    /// use rb_collections::red_black_tree::RedBlackMap;
    ///
    /// let mut map = RedBlackMap::new();
    /// assert!(map.insert("apple", 2).1);
    /// assert!(!map.insert("apple", 3).1);
    /// assert_eq!(map.get(&"apple"), Some(&2));
    /// ```
    pub fn insert(&mut self, key: K, value: V) -> (Position, bool) {
        self.tree.insert(Entry { key, value })
    }

    /// Inserts a key-value pair like `insert`, but reports `Error::AllocationFailure` instead of
    /// aborting when the entry cannot be allocated.
    pub fn try_insert(&mut self, key: K, value: V) -> Result<(Position, bool)> {
        self.tree.try_insert(Entry { key, value })
    }

    /// Inserts a key-value pair into the map, replacing the value of an existing entry. Returns
    /// the position of the entry and whether a new entry was created.
    ///
    /// # Examples
    ///
    /// ```
    /// use rb_collections::red_black_tree::RedBlackMap;
    ///
    /// let mut map = RedBlackMap::new();
    /// assert!(map.insert_or_assign(1, 1).1);
    /// assert!(!map.insert_or_assign(1, 2).1);
    /// assert_eq!(map.get(&1), Some(&2));
    /// ```
    pub fn insert_or_assign(&mut self, key: K, value: V) -> (Position, bool) {
        let position = self.search(&key);
        match self.tree.get_mut(position) {
            Some(entry) => {
                entry.value = value;
                (position, false)
            },
            None => self.insert(key, value),
        }
    }

    /// Removes a key-value pair from the map. If the key exists in the map, it will return the
    /// associated key-value pair. Otherwise it will return `None`.
    ///
    /// # Examples
    ///
    /// ```
    /// use rb_collections::red_black_tree::RedBlackMap;
    ///
    /// let mut map = RedBlackMap::new();
    /// map.insert(1, 1);
    /// assert_eq!(map.remove(&1), Some((1, 1)));
    /// assert_eq!(map.remove(&1), None);
    /// ```
    pub fn remove(&mut self, key: &K) -> Option<(K, V)> {
        let position = self.search(key);
        self.erase(position)
    }

    /// Checks if a key exists in the map.
    ///
    /// # Examples
    ///
    /// ```
    /// use rb_collections::red_black_tree::RedBlackMap;
    ///
    /// let mut map = RedBlackMap::new();
    /// map.insert(1, 1);
    /// assert!(!map.contains_key(&0));
    /// assert!(map.contains_key(&1));
    /// ```
    pub fn contains_key(&self, key: &K) -> bool {
        !self.search(key).is_end()
    }

    /// Returns an immutable reference to the value associated with a particular key. It will
    /// return `None` if the key does not exist in the map.
    ///
    /// # Examples
    ///
    /// ```
    /// use rb_collections::red_black_tree::RedBlackMap;
    ///
    /// let mut map = RedBlackMap::new();
    /// map.insert(1, 1);
    /// assert_eq!(map.get(&0), None);
    /// assert_eq!(map.get(&1), Some(&1));
    /// ```
    pub fn get(&self, key: &K) -> Option<&V> {
        self.tree.get(self.search(key)).map(|entry| &entry.value)
    }

    /// Returns a mutable reference to the value associated with a particular key. Returns `None`
    /// if such a key does not exist.
    ///
    /// # Examples
    ///
    /// ```
    /// use rb_collections::red_black_tree::RedBlackMap;
    ///
    /// let mut map = RedBlackMap::new();
    /// map.insert(1, 1);
    /// *map.get_mut(&1).unwrap() = 2;
    /// assert_eq!(map.get(&1), Some(&2));
    /// ```
    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let position = self.search(key);
        self.tree.get_mut(position).map(|entry| &mut entry.value)
    }

    /// Returns the value associated with `key`, or `Error::KeyNotFound` if there is none.
    ///
    /// # Examples
    ///
    /// ```
    /// use rb_collections::Error;
    /// use rb_collections::red_black_tree::RedBlackMap;
    ///
    /// let mut map = RedBlackMap::new();
    /// map.insert("apple", 2);
    /// assert_eq!(map.at(&"apple"), Ok(&2));
    /// assert_eq!(map.at(&"orange"), Err(Error::KeyNotFound));
    /// ```
    pub fn at(&self, key: &K) -> Result<&V> {
        self.get(key).ok_or(Error::KeyNotFound)
    }

    /// Returns a mutable reference to the value associated with `key`, or `Error::KeyNotFound` if
    /// there is none.
    pub fn at_mut(&mut self, key: &K) -> Result<&mut V> {
        self.get_mut(key).ok_or(Error::KeyNotFound)
    }

    /// Returns a mutable reference to the value associated with `key`, first inserting
    /// `V::default()` if the key is absent.
    ///
    /// # Examples
    ///
    /// ```
    /// use rb_collections::red_black_tree::RedBlackMap;
    ///
    /// let mut map: RedBlackMap<&str, u32> = RedBlackMap::new();
    /// assert_eq!(*map.get_or_insert_default("orange"), 0);
    /// *map.get_or_insert_default("orange") += 7;
    /// assert_eq!(map.get(&"orange"), Some(&7));
    /// ```
    pub fn get_or_insert_default(&mut self, key: K) -> &mut V
    where
        V: Default,
    {
        let (position, _) = self.insert(key, V::default());
        let entry = self
            .tree
            .get_mut(position)
            .expect("Expected an entry at the inserted position.");
        &mut entry.value
    }

    /// Returns a key in the map that is less than or equal to a particular key. Returns `None` if
    /// such a key does not exist.
    ///
    /// # Examples
    ///
    /// ```
    /// use rb_collections::red_black_tree::RedBlackMap;
    ///
    /// let mut map = RedBlackMap::new();
    /// map.insert(1, 1);
    /// assert_eq!(map.floor(&0), None);
    /// assert_eq!(map.floor(&2), Some(&1));
    /// ```
    pub fn floor(&self, key: &K) -> Option<&K> {
        let order = self.tree.comparator();
        self.tree
            .floor_by(|entry| order.compare_key(key, entry))
            .map(|id| &self.tree.value(id).key)
    }

    /// Returns a key in the map that is greater than or equal to a particular key. Returns `None`
    /// if such a key does not exist.
    ///
    /// # Examples
    ///
    /// ```
    /// use rb_collections::red_black_tree::RedBlackMap;
    ///
    /// let mut map = RedBlackMap::new();
    /// map.insert(1, 1);
    /// assert_eq!(map.ceil(&0), Some(&1));
    /// assert_eq!(map.ceil(&2), None);
    /// ```
    pub fn ceil(&self, key: &K) -> Option<&K> {
        let order = self.tree.comparator();
        self.tree
            .ceil_by(|entry| order.compare_key(key, entry))
            .map(|id| &self.tree.value(id).key)
    }

    /// Moves every entry of `other` whose key is not already present into `self`. Afterwards
    /// `other` holds exactly the entries whose keys collided.
    ///
    /// # Examples
    ///
    /// ```
    /// use rb_collections::red_black_tree::RedBlackMap;
    ///
    /// let mut map = RedBlackMap::new();
    /// map.insert(1, "a");
    /// let mut other = RedBlackMap::new();
    /// other.insert(1, "b");
    /// other.insert(2, "c");
    ///
    /// map.merge(&mut other);
    /// assert_eq!(map.get(&1), Some(&"a"));
    /// assert_eq!(map.get(&2), Some(&"c"));
    /// assert_eq!(other.get(&1), Some(&"b"));
    /// assert_eq!(other.len(), 1);
    /// ```
    pub fn merge(&mut self, other: &mut Self) {
        self.tree.merge(&mut other.tree);
    }
}

impl<K, V, C> Clone for RedBlackMap<K, V, C>
where
    K: Clone,
    V: Clone,
    C: Clone,
{
    fn clone(&self) -> Self {
        RedBlackMap {
            tree: self.tree.clone(),
        }
    }
}

impl<K, V, C> fmt::Debug for RedBlackMap<K, V, C>
where
    K: fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V, C> PartialEq for RedBlackMap<K, V, C>
where
    K: PartialEq,
    V: PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        self.tree == other.tree
    }
}

impl<K, V, C> Extend<(K, V)> for RedBlackMap<K, V, C>
where
    C: Compare<K>,
{
    fn extend<I>(&mut self, iter: I)
    where
        I: IntoIterator<Item = (K, V)>,
    {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<K, V, C> FromIterator<(K, V)> for RedBlackMap<K, V, C>
where
    C: Compare<K> + Default,
{
    fn from_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
    {
        let mut map = Self::default();
        map.extend(iter);
        map
    }
}

impl<K, V, C> IntoIterator for RedBlackMap<K, V, C> {
    type IntoIter = RedBlackMapIntoIter<K, V>;
    type Item = (K, V);

    fn into_iter(self) -> Self::IntoIter {
        RedBlackMapIntoIter {
            inner: self.tree.into_iter(),
        }
    }
}

impl<'a, K, V, C> IntoIterator for &'a RedBlackMap<K, V, C>
where
    K: 'a,
    V: 'a,
{
    type IntoIter = RedBlackMapIter<'a, K, V, C>;
    type Item = (&'a K, &'a V);

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, K, V, C> IntoIterator for &'a mut RedBlackMap<K, V, C>
where
    K: 'a,
    V: 'a,
{
    type IntoIter = RedBlackMapIterMut<'a, K, V>;
    type Item = (&'a K, &'a mut V);

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

/// A bidirectional cursor over the entries of a `RedBlackMap`.
///
/// The cursor yields keys and values immutably; values are changed through the map itself.
pub struct RedBlackMapCursor<'a, K, V, C = Natural> {
    inner: Cursor<'a, Entry<K, V>, ByKey<C>>,
}

impl<'a, K, V, C> RedBlackMapCursor<'a, K, V, C> {
    /// Returns the entry under the cursor, or `None` at the end.
    pub fn get(&self) -> Option<(&'a K, &'a V)> {
        self.inner.get().map(|entry| (&entry.key, &entry.value))
    }

    /// Returns `true` if the cursor is at the end of the map.
    pub fn is_end(&self) -> bool {
        self.inner.is_end()
    }

    /// Returns a detached handle to the cursor's current position.
    pub fn position(&self) -> Position {
        self.inner.position()
    }

    /// Moves the cursor to the entry with the next larger key, or to the end.
    pub fn move_next(&mut self) {
        self.inner.move_next();
    }

    /// Moves the cursor to the entry with the next smaller key. From the end it moves to the
    /// largest key.
    pub fn move_prev(&mut self) {
        self.inner.move_prev();
    }
}

impl<'a, K, V, C> Clone for RedBlackMapCursor<'a, K, V, C> {
    fn clone(&self) -> Self {
        RedBlackMapCursor { inner: self.inner }
    }
}

impl<'a, K, V, C> Copy for RedBlackMapCursor<'a, K, V, C> {}

impl<'a, K, V, C> PartialEq for RedBlackMapCursor<'a, K, V, C> {
    fn eq(&self, other: &Self) -> bool {
        self.inner == other.inner
    }
}

impl<'a, K, V, C> Eq for RedBlackMapCursor<'a, K, V, C> {}

/// An owning iterator for `RedBlackMap<K, V, C>`.
///
/// This iterator traverses the elements of the map in-order and yields owned entries.
pub struct RedBlackMapIntoIter<K, V> {
    inner: RedBlackTreeIntoIter<Entry<K, V>>,
}

impl<K, V> Iterator for RedBlackMapIntoIter<K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(Entry::into_pair)
    }
}

/// An iterator for `RedBlackMap<K, V, C>`.
///
/// This iterator traverses the elements of the map in-order and yields immutable references.
pub struct RedBlackMapIter<'a, K, V, C = Natural> {
    inner: RedBlackTreeIter<'a, Entry<K, V>, ByKey<C>>,
}

impl<'a, K, V, C> Iterator for RedBlackMapIter<'a, K, V, C>
where
    K: 'a,
    V: 'a,
{
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|entry| (&entry.key, &entry.value))
    }
}

impl<'a, K, V, C> DoubleEndedIterator for RedBlackMapIter<'a, K, V, C>
where
    K: 'a,
    V: 'a,
{
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|entry| (&entry.key, &entry.value))
    }
}

/// A mutable iterator for `RedBlackMap<K, V, C>`.
///
/// This iterator traverses the elements of the map in-order and yields immutable keys and mutable
/// values.
pub struct RedBlackMapIterMut<'a, K, V> {
    inner: RedBlackTreeIterMut<'a, Entry<K, V>>,
}

impl<'a, K, V> Iterator for RedBlackMapIterMut<'a, K, V>
where
    K: 'a,
    V: 'a,
{
    type Item = (&'a K, &'a mut V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|entry| {
            let Entry {
                ref key,
                ref mut value,
            } = *entry;
            (key, value)
        })
    }
}

impl<K, V, C> Default for RedBlackMap<K, V, C>
where
    C: Default,
{
    fn default() -> Self {
        Self::with_comparator(C::default())
    }
}

impl<'a, K, V, C> Index<&'a K> for RedBlackMap<K, V, C>
where
    C: Compare<K>,
{
    type Output = V;

    fn index(&self, key: &K) -> &Self::Output {
        self.get(key).expect("Error: key does not exist.")
    }
}

impl<'a, K, V, C> IndexMut<&'a K> for RedBlackMap<K, V, C>
where
    C: Compare<K>,
{
    fn index_mut(&mut self, key: &K) -> &mut Self::Output {
        self.get_mut(key).expect("Error: key does not exist.")
    }
}
