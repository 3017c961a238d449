pub mod operations;
pub mod preview;
pub mod tree;
