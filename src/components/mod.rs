pub mod flatten;
pub mod preview;
pub mod status_bar;
pub mod tree;
pub mod viewport;
