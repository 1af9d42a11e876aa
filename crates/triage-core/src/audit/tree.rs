//! Pure Merkle tree computations over leaf hashes.
//!
//! Leaves are hex SHA-256 digests in insertion order. A parent is the hash of
//! its two children's hex strings concatenated; an unpaired node at the end of
//! a level is paired with itself.

use sha2::{Digest, Sha256};

use super::proof::{PathStep, Side};

/// SHA-256 of `data` as lowercase hex.
pub fn hash_data(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Parent hash of two sibling nodes.
pub fn hash_pair(left: &str, right: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(left.as_bytes());
    hasher.update(right.as_bytes());
    hex::encode(hasher.finalize())
}

fn parent_level(level: &[String]) -> Vec<String> {
    level
        .chunks(2)
        .map(|pair| {
            let left = &pair[0];
            let right = pair.get(1).unwrap_or(left);
            hash_pair(left, right)
        })
        .collect()
}

/// Root hash and height for a list of leaves. `None` for an empty log.
///
/// A single leaf is its own root at height 1.
pub fn compute_root(leaves: &[String]) -> Option<(String, u32)> {
    if leaves.is_empty() {
        return None;
    }

    let mut level = leaves.to_vec();
    let mut height = 1u32;
    while level.len() > 1 {
        level = parent_level(&level);
        height += 1;
    }
    level.pop().map(|root| (root, height))
}

/// Sibling path from the leaf at `index` up to the root.
///
/// Returns `None` if `index` is out of range.
pub fn audit_path(leaves: &[String], index: usize) -> Option<Vec<PathStep>> {
    if index >= leaves.len() {
        return None;
    }

    let mut path = Vec::new();
    let mut level = leaves.to_vec();
    let mut position = index;

    while level.len() > 1 {
        let (sibling, side) = if position % 2 == 0 {
            // Unpaired last node is its own sibling.
            let sibling = level.get(position + 1).unwrap_or(&level[position]);
            (sibling.clone(), Side::Right)
        } else {
            (level[position - 1].clone(), Side::Left)
        };
        path.push(PathStep { hash: sibling, position: side });

        level = parent_level(&level);
        position /= 2;
    }

    Some(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaves(n: usize) -> Vec<String> {
        (0..n).map(|i| hash_data(format!("leaf-{i}").as_bytes())).collect()
    }

    #[test]
    fn test_hash_is_hex_sha256() {
        let h = hash_data(b"abc");
        assert_eq!(
            h,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(hash_pair("a", "b"), hash_data(b"ab"));
    }

    #[test]
    fn test_root_heights() {
        assert!(compute_root(&[]).is_none());

        let one = leaves(1);
        assert_eq!(compute_root(&one), Some((one[0].clone(), 1)));

        assert_eq!(compute_root(&leaves(2)).unwrap().1, 2);
        assert_eq!(compute_root(&leaves(3)).unwrap().1, 3);
        assert_eq!(compute_root(&leaves(4)).unwrap().1, 3);
        assert_eq!(compute_root(&leaves(5)).unwrap().1, 4);
    }

    #[test]
    fn test_odd_leaf_paired_with_itself() {
        let l = leaves(3);
        let expected = hash_pair(&hash_pair(&l[0], &l[1]), &hash_pair(&l[2], &l[2]));
        assert_eq!(compute_root(&l).unwrap().0, expected);
    }

    #[test]
    fn test_audit_path_shape() {
        let l = leaves(5);
        let path = audit_path(&l, 4).unwrap();

        assert_eq!(path.len(), 3);
        assert_eq!(path[0].hash, l[4]);
        assert_eq!(path[0].position, Side::Right);
        assert!(audit_path(&l, 5).is_none());
    }
}
