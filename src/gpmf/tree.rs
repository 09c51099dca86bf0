//! Recursive projection of a KLV stream into a keyed tree.
//!
//! GPMF repeats the same FourCC freely within a parent (several `STRM` per
//! `DEVC`, several `DEVC` per blob), so a key maps to a single node or to
//! an ordered sequence of nodes, and a sequence may mix raw leaves with
//! sub-trees. Insertion order within a sequence is the on-wire order;
//! sibling order across different FourCCs is not preserved by the map and
//! is recovered, when it matters, by re-reading the KLV stream directly.

use std::collections::HashMap;

use crate::constants::{MAX_ITEM_COUNT, MAX_NESTING_DEPTH};
use crate::errors::GpmfError;

use super::fourcc::FourCC;
use super::klv::{read_klv, KlvItem};

/// A projected GPMF node.
#[derive(Debug, Clone)]
pub enum Node<'a> {
    /// Non-container item, payload uninterpreted.
    Leaf(KlvItem<'a>),
    /// Container item, payload projected recursively.
    Branch(Tree<'a>),
    /// The same FourCC repeated within one parent, in on-wire order.
    Sequence(Vec<Node<'a>>),
}

impl<'a> Node<'a> {
    pub fn leaf(&self) -> Option<&KlvItem<'a>> {
        match self {
            Self::Leaf(item) => Some(item),
            _ => None,
        }
    }

    pub fn branch(&self) -> Option<&Tree<'a>> {
        match self {
            Self::Branch(tree) => Some(tree),
            _ => None,
        }
    }

    /// Iterate this node's occurrences in on-wire order: a sequence yields
    /// its elements, anything else yields itself once.
    pub fn iter(&self) -> impl Iterator<Item = &Node<'a>> {
        match self {
            Self::Sequence(nodes) => nodes.iter(),
            single => std::slice::from_ref(single).iter(),
        }
    }
}

/// A projected GPMF (sub-)tree: FourCC -> node.
#[derive(Debug, Clone, Default)]
pub struct Tree<'a> {
    nodes: HashMap<FourCC, Node<'a>>,
}

impl<'a> Tree<'a> {
    /// Number of distinct FourCC keys at this level.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, key: &FourCC) -> Option<&Node<'a>> {
        self.nodes.get(key)
    }

    pub fn contains(&self, key: &FourCC) -> bool {
        self.nodes.contains_key(key)
    }

    /// First raw item under `key`, skipping sub-trees in a mixed sequence.
    pub fn find_leaf(&self, key: &FourCC) -> Option<&KlvItem<'a>> {
        self.get(key)?.iter().find_map(|node| node.leaf())
    }

    /// All sub-trees under `key` in on-wire order, skipping raw items in a
    /// mixed sequence.
    pub fn branches(&self, key: &FourCC) -> Vec<&Tree<'a>> {
        self.get(key)
            .map(|node| node.iter().filter_map(|n| n.branch()).collect())
            .unwrap_or_default()
    }

    /// Insert under `key`, promoting an occupied slot to a sequence.
    fn insert(&mut self, key: FourCC, node: Node<'a>) {
        match self.nodes.get_mut(&key) {
            None => {
                self.nodes.insert(key, node);
            }
            Some(Node::Sequence(nodes)) => nodes.push(node),
            Some(occupied) => {
                let first = std::mem::replace(occupied, Node::Sequence(Vec::new()));
                if let Node::Sequence(nodes) = occupied {
                    nodes.push(first);
                    nodes.push(node);
                }
            }
        }
    }
}

/// Project the KLV stream in `data` into a [`Tree`].
///
/// Format-level malformation never errors: truncation ends the walk and
/// unknown items are kept as opaque leaves. Only the defensive caps on
/// nesting depth and total item count fail, and only on input no camera
/// produces.
pub fn project_tree(data: &[u8]) -> Result<Tree<'_>, GpmfError> {
    let mut remaining_items = MAX_ITEM_COUNT;
    project_level(data, 0, &mut remaining_items)
}

fn project_level<'a>(
    data: &'a [u8],
    depth: usize,
    remaining_items: &mut usize,
) -> Result<Tree<'a>, GpmfError> {
    if depth > MAX_NESTING_DEPTH {
        return Err(GpmfError::MaxDepthExceeded {
            depth,
            max: MAX_NESTING_DEPTH,
        });
    }

    let mut tree = Tree::default();
    for item in read_klv(data) {
        // MP4 `udta` GPMF sections are zero padded; skip the padding
        // rather than projecting it as an empty container.
        if item.key.is_invalid() {
            continue;
        }

        *remaining_items = remaining_items
            .checked_sub(1)
            .ok_or(GpmfError::MaxItemsExceeded { max: MAX_ITEM_COUNT })?;

        let key = item.key.clone();
        let node = if item.is_container() {
            if item.raw_len() == 0 {
                Node::Branch(Tree::default())
            } else {
                Node::Branch(project_level(item.data(), depth + 1, remaining_items)?)
            }
        } else {
            Node::Leaf(item)
        };
        tree.insert(key, node);
    }

    Ok(tree)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpmf::klv::ceil4;
    use proptest::prelude::*;

    fn klv(key: &[u8; 4], typ: u8, size: u8, repeat: u16, payload: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(key);
        out.push(typ);
        out.push(size);
        out.extend_from_slice(&repeat.to_be_bytes());
        out.extend_from_slice(payload);
        out.resize(8 + ceil4(payload.len()), 0);
        out
    }

    fn container(key: &[u8; 4], children: &[u8]) -> Vec<u8> {
        // size 1 x repeat n keeps the repeat within u16 for test payloads
        klv(key, 0, 1, children.len() as u16, children)
    }

    #[test]
    fn sibling_repeats_become_an_ordered_sequence() {
        let mut children = Vec::new();
        for id in [10_u32, 20, 30] {
            let strm = klv(b"TSMP", b'L', 4, 1, &id.to_be_bytes());
            children.extend(container(b"STRM", &strm));
        }
        let buf = container(b"DEVC", &children);

        let tree = project_tree(&buf).unwrap();
        let devc = tree.branches(&FourCC::DEVC);
        assert_eq!(devc.len(), 1);

        let streams = devc[0].branches(&FourCC::STRM);
        assert_eq!(streams.len(), 3);
        let ids = streams
            .iter()
            .map(|s| s.find_leaf(&FourCC::TSMP).and_then(|i| i.first_u32()))
            .collect::<Vec<_>>();
        assert_eq!(ids, vec![Some(10), Some(20), Some(30)]);
    }

    #[test]
    fn mixed_leaf_and_branch_under_one_key_keeps_both() {
        // Same FourCC appearing first as a raw item, then as a container.
        let mut buf = klv(b"GPSA", b'c', 1, 4, b"MSLV");
        buf.extend(container(b"GPSA", &klv(b"TSMP", b'L', 4, 1, &[0, 0, 0, 1])));

        let tree = project_tree(&buf).unwrap();
        let node = tree.get(&FourCC::GPSA).unwrap();
        let occurrences = node.iter().collect::<Vec<_>>();
        assert_eq!(occurrences.len(), 2);
        assert!(occurrences[0].leaf().is_some());
        assert!(occurrences[1].branch().is_some());

        // Convenience accessors see through the mix.
        assert_eq!(tree.find_leaf(&FourCC::GPSA).unwrap().data(), b"MSLV");
        assert_eq!(tree.branches(&FourCC::GPSA).len(), 1);
    }

    #[test]
    fn empty_container_projects_as_empty_branch() {
        let buf = klv(b"STRM", 0, 0, 0, &[]);
        let tree = project_tree(&buf).unwrap();
        let strm = tree.get(&FourCC::STRM).unwrap();
        assert!(strm.branch().is_some_and(|t| t.is_empty()));
    }

    #[test]
    fn zero_padding_is_skipped() {
        let mut buf = klv(b"DVID", b'L', 4, 1, &[0, 0, 0, 1]);
        buf.extend_from_slice(&[0_u8; 16]);
        let tree = project_tree(&buf).unwrap();
        assert_eq!(tree.len(), 1);
        assert!(!tree.contains(&FourCC::Invalid));
    }

    #[test]
    fn nesting_past_the_cap_is_rejected() {
        let mut buf = klv(b"TSMP", b'L', 4, 1, &[0, 0, 0, 1]);
        for _ in 0..(MAX_NESTING_DEPTH + 1) {
            buf = container(b"STRM", &buf);
        }
        match project_tree(&buf) {
            Err(GpmfError::MaxDepthExceeded { .. }) => (),
            other => panic!("expected MaxDepthExceeded, got {other:?}"),
        }
    }

    proptest! {
        #[test]
        fn projection_never_panics(data in proptest::collection::vec(any::<u8>(), 0..4096)) {
            // Errors (depth/item caps) are acceptable, panics are not.
            let _ = project_tree(&data);
        }
    }
}
