pub mod bits;
pub mod code;
pub mod error;
pub mod tree;

pub use self::{
    bits::Encoded,
    code::{generate_codes, CodeTable},
    error::{Error, Result},
    tree::{Node, Tree, WeightedItem},
};
