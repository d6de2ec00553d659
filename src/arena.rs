//! Chunked allocator that stores the nodes of a tree.

use crate::error::{Error, Result};
use log::{debug, error};
use std::alloc::{self, Layout};
use std::cmp;
use std::mem;
use std::ops::{Index, IndexMut};
use std::vec::Vec;

/// A handle to an object stored in a `TypedArena<T>`.
///
/// Handles are plain indices. Copying one never copies or owns the object it refers to, so they
/// can be used both for owning links and for navigational back-references.
///
/// Each handle also carries the generation of its block. Freeing a block bumps its generation, so
/// a handle to a freed object never matches the object that later reuses the block.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Entry {
    chunk_index: usize,
    block_index: usize,
    generation: usize,
}

impl Entry {
    // Index of the block when every chunk is laid end to end.
    pub(crate) fn flat_index(&self, chunk_size: usize) -> usize {
        self.chunk_index * chunk_size + self.block_index
    }
}

enum Block<T> {
    Occupied { generation: usize, value: T },
    // the free list link carries the generation the block gets when it is next allocated
    Vacant(Option<Entry>),
}

/// A fast, but limited allocator that only allocates a single type of object.
///
/// Objects are stored in fixed-size chunks. When every chunk is full a new chunk is reserved, so
/// existing objects are never moved. Freed blocks are threaded onto a free list and reused by
/// later allocations. All objects still inside the arena are dropped with it.
///
/// # Examples
///
/// ```
/// use rb_collections::arena::TypedArena;
///
/// let mut arena = TypedArena::new(1024);
///
/// let x = arena.allocate(1);
/// assert_eq!(arena[x], 1);
///
/// arena[x] += 1;
/// assert_eq!(arena[x], 2);
///
/// assert_eq!(arena.free(&x), 2);
/// assert!(arena.is_empty());
/// ```
pub struct TypedArena<T> {
    head: Option<Entry>,
    chunks: Vec<Vec<Block<T>>>,
    chunk_size: usize,
    size: usize,
    capacity: usize,
}

impl<T> TypedArena<T> {
    fn is_valid_entry(&self, entry: &Entry) -> bool {
        entry.chunk_index < self.chunks.len()
            && entry.block_index < self.chunks[entry.chunk_index].len()
    }

    fn block(&self, entry: &Entry) -> Option<&Block<T>> {
        if !self.is_valid_entry(entry) {
            return None;
        }
        Some(&self.chunks[entry.chunk_index][entry.block_index])
    }

    /// Constructs a new, empty `TypedArena<T>` with a specific number of objects per chunk. A
    /// chunk size of zero is treated as one.
    ///
    /// # Examples
    ///
    /// ```
    /// use rb_collections::arena::TypedArena;
    ///
    /// // creates a new TypedArena<T> that contains a maximum of 1024 u32's per chunk
    /// let arena: TypedArena<u32> = TypedArena::new(1024);
    /// assert_eq!(arena.chunk_size(), 1024);
    /// ```
    pub fn new(chunk_size: usize) -> Self {
        TypedArena {
            head: None,
            chunks: Vec::new(),
            chunk_size: cmp::max(chunk_size, 1),
            size: 0,
            capacity: 0,
        }
    }

    /// Returns the number of objects reserved per chunk.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Returns the number of live objects in the arena.
    pub fn len(&self) -> usize {
        self.size
    }

    /// Returns `true` if the arena holds no live objects.
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Returns the number of blocks reserved across all chunks.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the largest number of objects an arena of this type could address.
    ///
    /// # Examples
    ///
    /// ```
    /// use rb_collections::arena::TypedArena;
    ///
    /// assert!(TypedArena::<u64>::max_capacity() > 0);
    /// ```
    pub fn max_capacity() -> usize {
        isize::MAX as usize / cmp::max(mem::size_of::<Block<T>>(), 1)
    }

    fn grow(&mut self) -> Result<()> {
        let mut chunk = Vec::new();
        if chunk.try_reserve_exact(self.chunk_size).is_err() || self.chunks.try_reserve(1).is_err()
        {
            error!(
                "Unable to reserve an arena chunk of {} blocks.",
                self.chunk_size,
            );
            return Err(Error::AllocationFailure);
        }
        self.chunks.push(chunk);
        self.capacity += self.chunk_size;
        debug!(
            "Arena grew to {} chunks ({} blocks).",
            self.chunks.len(),
            self.capacity,
        );
        Ok(())
    }

    /// Allocates an object in the typed arena and returns an `Entry`, or
    /// `Error::AllocationFailure` if a new chunk could not be reserved. On failure the arena is
    /// left unchanged and `value` is dropped.
    ///
    /// # Examples
    ///
    /// ```
    /// use rb_collections::arena::TypedArena;
    ///
    /// let mut arena = TypedArena::new(1024);
    /// let x = arena.try_allocate(0).unwrap();
    /// assert_eq!(arena.get(&x), Some(&0));
    /// ```
    pub fn try_allocate(&mut self, value: T) -> Result<Entry> {
        if self.head.is_none() && self.size == self.capacity {
            self.grow()?;
        }
        self.size += 1;

        match self.head.take() {
            None => {
                let chunk_count = self.chunks.len();
                let last_chunk = &mut self.chunks[chunk_count - 1];
                last_chunk.push(Block::Occupied {
                    generation: 0,
                    value,
                });
                Ok(Entry {
                    chunk_index: chunk_count - 1,
                    block_index: last_chunk.len() - 1,
                    generation: 0,
                })
            },
            Some(entry) => {
                let vacant_block = mem::replace(
                    &mut self.chunks[entry.chunk_index][entry.block_index],
                    Block::Occupied {
                        generation: entry.generation,
                        value,
                    },
                );

                match vacant_block {
                    Block::Vacant(next_entry) => {
                        self.head = next_entry;
                        Ok(entry)
                    },
                    Block::Occupied { .. } => panic!("Expected a vacant block."),
                }
            },
        }
    }

    /// Allocates an object in the typed arena and returns an `Entry`. The `Entry` can later be
    /// used to retrieve mutable and immutable references to the object, and to deallocate it.
    ///
    /// Failing to reserve storage is fatal and reported through `std::alloc::handle_alloc_error`.
    ///
    /// # Examples
    ///
    /// ```
    /// use rb_collections::arena::TypedArena;
    ///
    /// let mut arena = TypedArena::new(1024);
    /// let x = arena.allocate(0);
    /// ```
    pub fn allocate(&mut self, value: T) -> Entry {
        match self.try_allocate(value) {
            Ok(entry) => entry,
            Err(_) => alloc::handle_alloc_error(Layout::new::<Block<T>>()),
        }
    }

    /// Deallocates an object in the typed arena and returns the object.
    ///
    /// # Panics
    ///
    /// Panics if entry corresponds to an invalid or vacant value, or to an object that has already
    /// been freed.
    ///
    /// # Examples
    ///
    /// ```
    /// use rb_collections::arena::TypedArena;
    ///
    /// let mut arena = TypedArena::new(1024);
    /// let x = arena.allocate(0);
    /// assert_eq!(arena.free(&x), 0);
    /// ```
    pub fn free(&mut self, entry: &Entry) -> T {
        match self.block(entry) {
            None => panic!("Error: attempting to free invalid block."),
            Some(Block::Occupied { generation, .. }) if *generation == entry.generation => {},
            Some(_) => panic!("Error: attempting to free vacant block."),
        }
        let old_block = mem::replace(
            &mut self.chunks[entry.chunk_index][entry.block_index],
            Block::Vacant(self.head),
        );
        match old_block {
            Block::Occupied { value, .. } => {
                self.size -= 1;
                self.head = Some(Entry {
                    generation: entry.generation.wrapping_add(1),
                    ..*entry
                });
                value
            },
            Block::Vacant(_) => unreachable!(),
        }
    }

    /// Returns an immutable reference to an object in the typed arena. Returns `None` if the entry
    /// does not correspond to a valid object.
    ///
    /// # Examples
    ///
    /// ```
    /// use rb_collections::arena::TypedArena;
    ///
    /// let mut arena = TypedArena::new(1024);
    /// let x = arena.allocate(0);
    /// assert_eq!(arena.get(&x), Some(&0));
    /// ```
    pub fn get(&self, entry: &Entry) -> Option<&T> {
        match self.block(entry)? {
            Block::Occupied { generation, value } if *generation == entry.generation => Some(value),
            _ => None,
        }
    }

    /// Returns a mutable reference to an object in the typed arena. Returns `None` if the entry
    /// does not correspond to a valid object.
    ///
    /// # Examples
    ///
    /// ```
    /// use rb_collections::arena::TypedArena;
    ///
    /// let mut arena = TypedArena::new(1024);
    /// let x = arena.allocate(0);
    /// assert_eq!(arena.get_mut(&x), Some(&mut 0));
    /// ```
    pub fn get_mut(&mut self, entry: &Entry) -> Option<&mut T> {
        if !self.is_valid_entry(entry) {
            return None;
        }
        match self.chunks[entry.chunk_index][entry.block_index] {
            Block::Occupied {
                generation,
                ref mut value,
            } if generation == entry.generation => Some(value),
            _ => None,
        }
    }

    /// Returns an iterator over every live object together with its entry, in storage order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Entry, &mut T)> {
        self.chunks
            .iter_mut()
            .enumerate()
            .flat_map(|(chunk_index, chunk)| {
                chunk
                    .iter_mut()
                    .enumerate()
                    .filter_map(move |(block_index, block)| match block {
                        Block::Occupied { generation, value } => Some((
                            Entry {
                                chunk_index,
                                block_index,
                                generation: *generation,
                            },
                            value,
                        )),
                        Block::Vacant(_) => None,
                    })
            })
    }
}

impl<T> Index<Entry> for TypedArena<T> {
    type Output = T;

    fn index(&self, entry: Entry) -> &Self::Output {
        self.get(&entry).expect("Error: entry out of bounds.")
    }
}

impl<T> IndexMut<Entry> for TypedArena<T> {
    fn index_mut(&mut self, entry: Entry) -> &mut Self::Output {
        self.get_mut(&entry).expect("Error: entry out of bounds.")
    }
}
