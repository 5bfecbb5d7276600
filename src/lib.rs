pub mod assets;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod geometry;
pub mod ir;
pub mod layout;
pub mod layout_dump;
pub mod parser;
pub mod render;
pub mod text_metrics;
pub mod theme;

#[cfg(feature = "cli")]
pub use cli::run;
pub use config::Config;
pub use layout::{compute_layout, Diagram};
pub use render::{layout_and_render, render_diagram};
