pub mod ops_import;
pub mod ops_move;
pub mod ops_provision;
pub mod ops_remove;
pub mod project_tree;
