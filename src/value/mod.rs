pub mod path;
pub mod tree;

pub use path::{AttrPath, PathStep};
pub use tree::{Value, ValueError};
