pub mod traits;
pub mod types;
pub mod ui_tree;
