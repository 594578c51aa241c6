use crate::{
    bits::Encoded,
    error::{Error, Result},
    tree::{Node, Tree, WeightedItem},
};
use bitvec::prelude::*;
use hashbrown::HashMap;
use log::{debug, trace};
use std::{borrow::Borrow, fmt::Debug, hash::Hash};

fn walk<T>(node: &Node<T>, mut prefix: BitVec) -> Box<dyn Iterator<Item = (BitVec, &T)> + '_> {
    match node {
        Node::Leaf { symbol, .. } => Box::new(std::iter::once((prefix, symbol))),
        Node::Node { left, right, .. } => {
            prefix.push(false);
            let left = walk(left, prefix.clone());
            prefix.pop();
            prefix.push(true);
            let right = walk(right, prefix);
            Box::new(left.chain(right))
        }
    }
}

/// Derives the code of every leaf, appending `0` for each left step and `1`
/// for each right step on the way down from `root`.
///
/// A root that is itself a leaf gets the code `0`.
pub fn generate_codes<T: Clone + Ord + Hash + Debug>(root: &Node<T>) -> CodeTable<T> {
    let prefix = if root.is_leaf() {
        bitvec![0]
    } else {
        BitVec::new()
    };

    let codes: HashMap<T, BitBox> = walk(root, prefix)
        .map(|(bits, symbol)| (symbol.clone(), bits.into()))
        .collect();
    debug!("generated {} codes", codes.len());

    CodeTable { codes }
}

/// Prefix-free mapping from symbols to their codes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CodeTable<T: Eq + Hash> {
    codes: HashMap<T, BitBox>,
}

impl<T: Clone + Ord + Hash + Debug> CodeTable<T> {
    pub fn new(tree: &Tree<T>) -> Self {
        generate_codes(tree.root())
    }

    pub fn get(&self, symbol: &T) -> Option<&BitSlice> {
        self.codes.get(symbol).map(|code| code.as_bitslice())
    }

    pub fn contains(&self, symbol: &T) -> bool {
        self.codes.contains_key(symbol)
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// Entries in ascending symbol order.
    pub fn iter(&self) -> impl Iterator<Item = (&T, &BitSlice)> + '_ {
        let mut entries: Vec<(&T, &BitSlice)> = self
            .codes
            .iter()
            .map(|(symbol, code)| (symbol, code.as_bitslice()))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        entries.into_iter()
    }

    /// Concatenates the codes of `symbols` in order.
    ///
    /// Fails on the first symbol that has no code, without returning any of
    /// the bits produced so far.
    pub fn encode<I>(&self, symbols: I) -> Result<Encoded, T>
    where
        I: IntoIterator,
        I::Item: Borrow<T>,
    {
        let mut bits = BitVec::new();
        let mut count = 0usize;
        for symbol in symbols {
            let symbol: &T = symbol.borrow();
            let code = self
                .get(symbol)
                .ok_or_else(|| Error::UnknownSymbol(symbol.clone()))?;
            bits.extend_from_bitslice(code);
            count += 1;
        }
        trace!("encoded {count} symbols into {} bits", bits.len());
        Ok(bits.into())
    }

    /// Total encoded length of the given frequencies, in bits.
    pub fn weighted_length<I, W>(&self, items: I) -> Result<usize, T>
    where
        I: IntoIterator<Item = W>,
        W: Into<WeightedItem<T>>,
    {
        items
            .into_iter()
            .map(Into::<WeightedItem<T>>::into)
            .try_fold(0usize, |total, WeightedItem { weight, item }| -> Result<usize, T> {
                let length = self
                    .get(&item)
                    .map(|code| code.len())
                    .ok_or(Error::UnknownSymbol(item))?;
                Ok(total.saturating_add(weight.saturating_mul(length)))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::CodeTable;
    use crate::{
        error::Error,
        tree::{Node, Tree},
    };
    use bitvec::prelude::*;
    use proptest::{
        collection::{btree_map, vec},
        prelude::*,
    };
    use std::collections::BTreeMap;
    use test_strategy::proptest;

    fn classic() -> Vec<(char, usize)> {
        vec![
            ('a', 5),
            ('b', 9),
            ('c', 12),
            ('d', 13),
            ('e', 16),
            ('f', 45),
        ]
    }

    fn tally(text: &str) -> BTreeMap<char, usize> {
        let mut counts = BTreeMap::new();
        for c in text.chars() {
            *counts.entry(c).or_default() += 1;
        }
        counts
    }

    /// Walks the tree bit by bit, emitting a symbol at every leaf.
    fn decode<T: Clone>(root: &Node<T>, bits: &BitSlice) -> Vec<T> {
        if let Node::Leaf { symbol, .. } = root {
            return bits.iter().map(|_| symbol.clone()).collect();
        }

        let mut output = vec![];
        let mut node = root;
        for bit in bits.iter() {
            if let Node::Node { left, right, .. } = node {
                node = if *bit { right.as_ref() } else { left.as_ref() };
            }
            if let Node::Leaf { symbol, .. } = node {
                output.push(symbol.clone());
                node = root;
            }
        }
        assert!(std::ptr::eq(node, root), "trailing bits");
        output
    }

    fn is_prefix(a: &BitSlice, b: &BitSlice) -> bool {
        a.len() <= b.len() && a == &b[..a.len()]
    }

    #[test]
    fn test_classic_codes() {
        let table = Tree::new(classic()).unwrap().codes();
        assert_eq!(table.len(), 6);
        assert_eq!(table.get(&'f').unwrap().len(), 1);

        let longest = table.iter().map(|(_, code)| code.len()).max().unwrap();
        assert_eq!(table.get(&'a').unwrap().len(), longest);
        assert_eq!(table.get(&'b').unwrap().len(), longest);
        for (_, code) in table.iter() {
            assert!(!code.is_empty());
        }

        assert_eq!(table.weighted_length(classic()), Ok(224));
        assert_eq!(table.encode("abcdef".chars()).unwrap().len(), 18);
    }

    #[test]
    fn test_single_symbol_code() {
        let table = Tree::new([('A', 5usize)]).unwrap().codes();
        assert_eq!(table.get(&'A'), Some(bits![0]));

        let encoded = table.encode("AAA".chars()).unwrap();
        assert_eq!(encoded.to_string(), "000");
    }

    #[test]
    fn test_two_symbols() {
        let table = Tree::new([('x', 3usize), ('y', 1)]).unwrap().codes();
        assert_eq!(table.get(&'y'), Some(bits![0]));
        assert_eq!(table.get(&'x'), Some(bits![1]));
        assert_eq!(table.encode(['x', 'y', 'y']).unwrap().to_string(), "100");
    }

    #[test]
    fn test_unknown_symbol() {
        let table = Tree::new([('A', 1usize), ('B', 2)]).unwrap().codes();
        assert!(!table.contains(&'X'));
        assert_eq!(
            table.encode("ABXA".chars()),
            Err(Error::UnknownSymbol('X'))
        );
        assert_eq!(
            table.weighted_length([('Z', 4usize)]),
            Err(Error::UnknownSymbol('Z'))
        );
    }

    #[test]
    fn test_empty_input() {
        let table = Tree::new([('A', 1usize), ('B', 2)]).unwrap().codes();
        let encoded = table.encode(Vec::<char>::new()).unwrap();
        assert!(encoded.is_empty());
    }

    #[test]
    fn test_text_roundtrip() {
        let text = "WINTER IS NEARLY GONE. TIME FLOWS ON TO A SPRING OF LITTLE HOPE.";
        let tree = Tree::new(tally(text)).unwrap();
        let table = CodeTable::new(&tree);
        assert_eq!(table, tree.codes());

        let encoded = table.encode("ARAGORN".chars()).unwrap();
        let decoded: String = decode(tree.root(), encoded.as_bitslice())
            .into_iter()
            .collect();
        assert_eq!(decoded, "ARAGORN");
    }

    #[test]
    fn test_iter_sorted() {
        let table = Tree::new(classic()).unwrap().codes();
        let symbols: String = table.iter().map(|(symbol, _)| *symbol).collect();
        assert_eq!(symbols, "abcdef");
    }

    #[proptest]
    fn test_codes_total(
        #[strategy(btree_map(any::<u8>(), 1usize..10_000, 1..64))] items: BTreeMap<u8, usize>,
    ) {
        let table = Tree::new(items.clone()).unwrap().codes();
        prop_assert_eq!(table.len(), items.len());
        for byte in items.keys() {
            prop_assert!(table.get(byte).is_some_and(|code| !code.is_empty()));
        }
    }

    #[proptest]
    fn test_codes_prefix_free(
        #[strategy(btree_map(any::<u8>(), 1usize..10_000, 1..64))] items: BTreeMap<u8, usize>,
    ) {
        let table = Tree::new(items).unwrap().codes();
        for (a, code_a) in table.iter() {
            for (b, code_b) in table.iter() {
                if a != b {
                    prop_assert!(!is_prefix(code_a, code_b));
                }
            }
        }
    }

    #[proptest]
    fn test_weighted_length_matches_tree(
        #[strategy(btree_map(any::<u8>(), 1usize..10_000, 1..64))] items: BTreeMap<u8, usize>,
    ) {
        let tree = Tree::new(items.clone()).unwrap();
        let table = tree.codes();
        prop_assert_eq!(table.weighted_length(items), Ok(tree.weighted_path_length()));
    }

    #[proptest]
    fn test_encode_roundtrip(
        #[strategy(btree_map(any::<u8>(), 1usize..1_000, 1..32))] items: BTreeMap<u8, usize>,
        #[strategy(vec(any::<prop::sample::Index>(), 0..256))] picks: Vec<prop::sample::Index>,
    ) {
        let tree = Tree::new(items.clone()).unwrap();
        let table = tree.codes();
        let alphabet: Vec<u8> = items.keys().copied().collect();
        let input: Vec<u8> = picks.iter().map(|index| *index.get(&alphabet)).collect();

        let encoded = table.encode(&input).unwrap();
        let expected: usize = input.iter().map(|b| table.get(b).unwrap().len()).sum();
        prop_assert_eq!(encoded.len(), expected);
        prop_assert_eq!(decode(tree.root(), encoded.as_bitslice()), input);
    }

    #[proptest]
    fn test_encode_unknown(
        #[strategy(btree_map(0u8..128, 1usize..1_000, 1..32))] items: BTreeMap<u8, usize>,
        #[strategy(128u8..)] unknown: u8,
    ) {
        let table = Tree::new(items.clone()).unwrap().codes();
        let mut input: Vec<u8> = items.keys().copied().collect();
        input.push(unknown);
        prop_assert_eq!(table.encode(&input), Err(Error::UnknownSymbol(unknown)));
    }
}
