use crate::{
    code::{generate_codes, CodeTable},
    error::{Error, Result},
};
use log::{debug, trace};
use std::{
    cmp::{Ordering, Reverse},
    collections::{BTreeMap, BinaryHeap},
    fmt::Debug,
    hash::Hash,
};

/// Node of a Huffman tree.
///
/// Every node carries the total weight of the leaves below it. Branches
/// always own exactly two children.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Node<T> {
    Leaf {
        weight: usize,
        symbol: T,
    },
    Node {
        weight: usize,
        left: Box<Node<T>>,
        right: Box<Node<T>>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct WeightedItem<T = u8> {
    pub weight: usize,
    pub item: T,
}

impl<T> From<(T, usize)> for WeightedItem<T> {
    fn from((item, weight): (T, usize)) -> Self {
        WeightedItem { weight, item }
    }
}

impl<T> Node<T> {
    pub fn weight(&self) -> usize {
        match self {
            Self::Leaf { weight, .. } | Self::Node { weight, .. } => *weight,
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, Self::Leaf { .. })
    }

    fn leaves(&self, depth: usize) -> Box<dyn Iterator<Item = (&T, usize, usize)> + '_> {
        match self {
            Self::Leaf { weight, symbol } => Box::new(std::iter::once((symbol, *weight, depth))),
            Self::Node { left, right, .. } => {
                Box::new(left.leaves(depth + 1).chain(right.leaves(depth + 1)))
            }
        }
    }
}

/// Entry of the merge queue, ordered by weight and then by creation order.
#[derive(Debug)]
struct Pending<T> {
    weight: usize,
    sequence: usize,
    node: Node<T>,
}

impl<T> Pending<T> {
    fn key(&self) -> (usize, usize) {
        (self.weight, self.sequence)
    }
}

impl<T> PartialEq for Pending<T> {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl<T> Eq for Pending<T> {}

impl<T> PartialOrd for Pending<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Pending<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

/// Huffman tree built from a symbol frequency table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tree<T> {
    root: Node<T>,
    alphabet_size: usize,
}

impl<T: Clone + Ord + Hash + Debug> Tree<T> {
    /// Builds the tree by repeatedly merging the two lightest nodes.
    ///
    /// Repeated symbols have their weights summed. Leaves enter the queue in
    /// ascending symbol order and ties are resolved by creation order, with
    /// the first node taken off the queue becoming the left child, so the
    /// same frequencies always produce the same tree.
    pub fn new<I, W>(items: I) -> Result<Self, T>
    where
        I: IntoIterator<Item = W>,
        W: Into<WeightedItem<T>>,
    {
        let mut weights: BTreeMap<T, usize> = BTreeMap::new();
        for item in items {
            let WeightedItem { weight, item } = item.into();
            let entry = weights.entry(item).or_default();
            *entry = entry.saturating_add(weight);
        }

        let alphabet_size = weights.len();
        let mut heap: BinaryHeap<Reverse<Pending<T>>> = weights
            .into_iter()
            .enumerate()
            .map(|(sequence, (symbol, weight))| {
                Reverse(Pending {
                    weight,
                    sequence,
                    node: Node::Leaf { weight, symbol },
                })
            })
            .collect();
        let mut sequence = alphabet_size;

        loop {
            let Reverse(left) = heap.pop().ok_or(Error::EmptyAlphabet)?;
            let Some(Reverse(right)) = heap.pop() else {
                debug!(
                    "built tree over {alphabet_size} symbols with total weight {}",
                    left.weight
                );
                return Ok(Tree {
                    root: left.node,
                    alphabet_size,
                });
            };

            trace!("merging weights {} and {}", left.weight, right.weight);
            // saturates only for totals beyond usize::MAX
            let weight = left.weight.saturating_add(right.weight);
            heap.push(Reverse(Pending {
                weight,
                sequence,
                node: Node::Node {
                    weight,
                    left: left.node.into(),
                    right: right.node.into(),
                },
            }));
            sequence += 1;
        }
    }

    /// Derives the code table for this tree.
    pub fn codes(&self) -> CodeTable<T> {
        generate_codes(&self.root)
    }
}

impl<T> Tree<T> {
    pub fn root(&self) -> &Node<T> {
        &self.root
    }

    pub fn into_root(self) -> Node<T> {
        self.root
    }

    /// Total weight of all symbols.
    pub fn weight(&self) -> usize {
        self.root.weight()
    }

    pub fn alphabet_size(&self) -> usize {
        self.alphabet_size
    }

    /// Leaves from left to right as `(symbol, weight, depth)`.
    pub fn leaves(&self) -> impl Iterator<Item = (&T, usize, usize)> + '_ {
        self.root.leaves(0)
    }

    /// Sum of weight times code length over all leaves.
    ///
    /// A tree made of a single leaf counts it with a length of one, since
    /// that is the length of the code it receives.
    pub fn weighted_path_length(&self) -> usize {
        self.leaves().fold(0usize, |total, (_, weight, depth)| {
            total.saturating_add(weight.saturating_mul(depth.max(1)))
        })
    }
}
