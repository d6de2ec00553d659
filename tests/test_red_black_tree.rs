use log::LevelFilter;
use rand::Rng;
use rb_collections::red_black_tree::{RedBlackMap, RedBlackSet, RedBlackTree};
use rb_collections::Error;
use simplelog::{Config, TestLogger};
use std::collections::{BTreeMap, BTreeSet};

const NUM_OF_OPERATIONS: usize = 10_000;

fn init_logger() {
    let _ = TestLogger::init(LevelFilter::Debug, Config::default());
}

#[test]
fn int_test_tree_against_btreeset() {
    init_logger();
    let mut rng: rand::XorShiftRng = rand::SeedableRng::from_seed([1, 1, 1, 1]);
    let mut tree = RedBlackTree::new();
    let mut expected = BTreeSet::new();

    for i in 0..NUM_OF_OPERATIONS {
        let key = rng.gen_range(0, 1000u32);
        if rng.gen::<bool>() {
            assert_eq!(tree.insert(key).1, expected.insert(key));
        } else {
            assert_eq!(tree.remove(&key), expected.take(&key));
        }

        if i % 500 == 0 {
            assert!(tree.check_invariants().is_ok());
        }
    }

    assert!(tree.check_invariants().is_ok());
    assert_eq!(tree.len(), expected.len());
    assert!(tree.iter().eq(expected.iter()));
    assert!(tree.iter().rev().eq(expected.iter().rev()));
}

#[test]
fn int_test_map_against_btreemap() {
    init_logger();
    let mut rng: rand::XorShiftRng = rand::SeedableRng::from_seed([1, 1, 1, 1]);
    let mut map = RedBlackMap::new();
    let mut expected = BTreeMap::new();

    for _ in 0..NUM_OF_OPERATIONS {
        let key = rng.gen_range(0, 500u32);
        let val = rng.next_u32();

        match rng.gen_range(0, 3) {
            0 => {
                map.insert_or_assign(key, val);
                expected.insert(key, val);
            },
            1 => {
                let inserted = map.insert(key, val).1;
                assert_eq!(inserted, !expected.contains_key(&key));
                expected.entry(key).or_insert(val);
            },
            _ => {
                assert_eq!(map.remove(&key), expected.remove(&key).map(|val| (key, val)));
            },
        }
    }

    assert_eq!(map.len(), expected.len());
    for (key, val) in &expected {
        assert_eq!(map.at(key), Ok(val));
    }
    assert!(map.iter().eq(expected.iter()));
}

#[test]
fn int_test_erase_by_position() {
    let mut rng: rand::XorShiftRng = rand::SeedableRng::from_seed([2, 2, 2, 2]);
    let mut tree = RedBlackTree::new();
    let mut positions = Vec::new();

    for key in 0..2000u32 {
        positions.push(tree.insert(key).0);
    }

    while !positions.is_empty() {
        let index = rng.gen_range(0, positions.len());
        let position = positions.swap_remove(index);
        assert!(tree.erase(position).is_some());
        assert!(tree.check_invariants().is_ok());

        // Surviving positions still resolve.
        for position in positions.iter().take(8) {
            assert!(tree.get(*position).is_some());
        }
    }

    assert!(tree.is_empty());
    assert!(tree.begin() == tree.end());
}

#[test]
fn int_test_cursor_symmetry() {
    let mut rng: rand::XorShiftRng = rand::SeedableRng::from_seed([3, 3, 3, 3]);
    let mut tree = RedBlackTree::new();
    for _ in 0..1000 {
        tree.insert(rng.next_u32());
    }

    let mut forward = Vec::new();
    let mut cursor = tree.begin();
    while cursor != tree.end() {
        forward.push(*cursor.get().unwrap());
        assert!(cursor.next_cursor().prev_cursor() == cursor);
        cursor.move_next();
    }

    let mut backward = Vec::new();
    let mut cursor = tree.end();
    loop {
        cursor.move_prev();
        match cursor.get() {
            Some(value) => backward.push(*value),
            None => break,
        }
    }

    backward.reverse();
    assert_eq!(forward.len(), tree.len());
    assert_eq!(forward, backward);
}

#[test]
fn int_test_sorted_round_trip() {
    let values = vec![15u32, 1, 22, 0, 11, 20, 78, 10, 12];
    let tree: RedBlackTree<u32> = values.iter().cloned().collect();

    let mut sorted = values.clone();
    sorted.sort();
    assert_eq!(tree.into_iter().collect::<Vec<u32>>(), sorted);
}

#[test]
fn int_test_erase_inner_node() {
    let mut tree: RedBlackTree<u32> = vec![15, 1, 22, 0, 11, 20, 78, 10, 12]
        .into_iter()
        .collect();
    assert_eq!(tree.len(), 9);

    let position = tree.find(&11).position();
    assert_eq!(tree.erase(position), Some(11));
    assert_eq!(tree.len(), 8);
    assert_eq!(
        tree.iter().cloned().collect::<Vec<u32>>(),
        vec![0, 1, 10, 12, 15, 20, 22, 78],
    );
    assert!(tree.check_invariants().is_ok());
}

#[test]
fn int_test_map_collision_keeps_first_value() {
    let mut map = RedBlackMap::new();
    assert!(map.insert("apple", 1).1);
    assert!(!map.insert("apple", 2).1);
    assert_eq!(map.len(), 1);
    assert_eq!(map.at(&"apple"), Ok(&1));
    assert_eq!(map.at(&"pear"), Err(Error::KeyNotFound));
}

#[test]
fn int_test_set_merge() {
    init_logger();
    let mut set: RedBlackSet<u32> = vec![1, 2, 3].into_iter().collect();
    let mut other: RedBlackSet<u32> = vec![3, 4, 5].into_iter().collect();

    set.merge(&mut other);

    assert_eq!(set.iter().cloned().collect::<Vec<u32>>(), vec![1, 2, 3, 4, 5]);
    assert_eq!(other.iter().cloned().collect::<Vec<u32>>(), vec![3]);
}

#[test]
fn int_test_large_clear_and_reuse() {
    init_logger();
    let mut set = RedBlackSet::new();
    for key in 0..NUM_OF_OPERATIONS {
        set.insert(key);
    }
    set.clear();
    assert!(set.is_empty());

    for key in (0..100).rev() {
        set.insert(key);
    }
    assert_eq!(set.len(), 100);
    assert_eq!(set.min(), Some(&0));
    assert_eq!(set.max(), Some(&99));
}
