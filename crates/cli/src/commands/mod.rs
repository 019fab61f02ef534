pub mod dump;
pub mod select;
pub mod tree;
