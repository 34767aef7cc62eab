//! TUI pane rendering modules
//!
//! # Pane Modules
//!
//! - [`tree`]: Pre-order parse tree with the selected node and diagnostics
//!   highlighted
//! - [`source`]: Source text with syntax highlighting and the selected
//!   node's line marked
//! - [`status`]: Status bar with counts, parse status and keybindings
//!
//! Each pane module exports a primary `render_*` function. Scroll offsets
//! live in the app and are passed in by mutable reference.

pub mod source;
pub mod status;
pub mod tree;

pub use source::render_source_pane;
pub use status::{render_status_bar, StatusRenderData};
pub use tree::{render_tree_pane, TreeRow};
