pub mod classify;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod feed;
pub mod graph;
pub mod ir;
pub mod layout;
pub mod layout_dump;
pub mod render;
pub mod scheduler;
pub mod session;
pub mod store;
pub mod text_metrics;
pub mod theme;
pub mod view;
pub mod zones;

#[cfg(feature = "cli")]
pub use cli::run;
pub use classify::{classify, classify_graph};
pub use graph::{GraphInputs, QuestGraph, ZoneFilter, build_graph};
pub use layout::{QuestLayout, compute_layout};
