use crate::entry::Entry;
use std::cmp::Ordering;

/// A strict weak ordering over values of type `T`.
///
/// A tree fixes its comparator at construction. Two values for which `compare` returns
/// `Ordering::Equal` are considered the same key. Closures of type `Fn(&T, &T) -> Ordering` are
/// comparators too.
///
/// # Examples
///
/// ```
/// use rb_collections::red_black_tree::{Compare, RedBlackSet};
/// use std::cmp::Ordering;
///
/// struct Descending;
///
/// impl Compare<u32> for Descending {
///     fn compare(&self, left: &u32, right: &u32) -> Ordering {
///         right.cmp(left)
///     }
/// }
///
/// let mut set = RedBlackSet::with_comparator(Descending);
/// set.insert(1);
/// set.insert(3);
/// assert_eq!(set.iter().collect::<Vec<&u32>>(), vec![&3, &1]);
/// ```
pub trait Compare<T: ?Sized> {
    fn compare(&self, left: &T, right: &T) -> Ordering;
}

/// The comparator that uses the `Ord` implementation of the element type.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Natural;

impl<T> Compare<T> for Natural
where
    T: Ord + ?Sized,
{
    fn compare(&self, left: &T, right: &T) -> Ordering {
        left.cmp(right)
    }
}

impl<T, F> Compare<T> for F
where
    T: ?Sized,
    F: Fn(&T, &T) -> Ordering,
{
    fn compare(&self, left: &T, right: &T) -> Ordering {
        self(left, right)
    }
}

/// Orders map entries by their key using the key comparator `C`.
#[derive(Clone, Copy, Debug, Default)]
pub struct ByKey<C> {
    key_order: C,
}

impl<C> ByKey<C> {
    pub fn new(key_order: C) -> Self {
        ByKey { key_order }
    }

    /// Returns the comparator applied to keys.
    pub fn key_order(&self) -> &C {
        &self.key_order
    }

    pub(crate) fn compare_key<K, V>(&self, key: &K, entry: &Entry<K, V>) -> Ordering
    where
        C: Compare<K>,
    {
        self.key_order.compare(key, &entry.key)
    }
}

impl<K, V, C> Compare<Entry<K, V>> for ByKey<C>
where
    C: Compare<K>,
{
    fn compare(&self, left: &Entry<K, V>, right: &Entry<K, V>) -> Ordering {
        self.key_order.compare(&left.key, &right.key)
    }
}
