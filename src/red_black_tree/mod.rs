//! Self-balancing binary search tree that uses a color bit to ensure that the tree remains
//! approximately balanced during insertions and deletions.
//!
//! `RedBlackTree` is the engine. Every node keeps a link to its parent, so cursors can step to
//! the in-order successor or predecessor without an auxiliary stack. `RedBlackMap` and
//! `RedBlackSet` are thin adaptors over the engine.

mod compare;
mod cursor;
mod map;
mod node;
mod set;
mod tree;

pub use self::compare::{ByKey, Compare, Natural};
pub use self::cursor::{Cursor, Position};
pub use self::map::{
    RedBlackMap, RedBlackMapCursor, RedBlackMapIntoIter, RedBlackMapIter, RedBlackMapIterMut,
};
pub use self::set::{RedBlackSet, RedBlackSetIntoIter, RedBlackSetIter};
pub use self::tree::{RedBlackTree, RedBlackTreeIntoIter, RedBlackTreeIter, DEFAULT_CHUNK_SIZE};
