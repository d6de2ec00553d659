//! Ordered collections backed by a red black tree.
//!
//! The crate provides an arena-backed red black tree with parent links and bidirectional
//! cursors, together with ordered map and set adaptors built on top of it.
//!
//! # Examples
//!
//! ```
//! use rb_collections::red_black_tree::{RedBlackMap, RedBlackSet};
//! use rb_collections::Error;
//!
//! let mut map = RedBlackMap::new();
//! map.insert("apple", 1);
//! assert_eq!(map.at(&"pear"), Err(Error::KeyNotFound));
//!
//! let set: RedBlackSet<u32> = vec![3, 1, 2].into_iter().collect();
//! assert_eq!(set.iter().collect::<Vec<&u32>>(), vec![&1, &2, &3]);
//! ```

pub mod arena;
mod entry;
mod error;
pub mod red_black_tree;

pub use crate::error::{Error, Result};
