//! UI panels: tree, properties, toolbar, status bar.

pub mod properties;
pub mod status_bar;
pub mod toolbar;
pub mod tree_panel;
