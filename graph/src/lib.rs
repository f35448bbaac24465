pub mod config;
pub mod core;
pub mod decor;
pub mod error;
pub mod export;
pub mod git_backend;
pub mod layout;
pub mod pipeline;
pub mod render;

pub use config::GitvizConfig;
pub use core::{CommitNode, Dag, DagStats, Edge, EdgeType};
pub use error::{GraphError, Result};
pub use git_backend::{ExtractMode, GitWalker};
pub use layout::{LaneLayout, Layout, PositionedEdge, PositionedNode};
pub use render::FigureBuilder;
