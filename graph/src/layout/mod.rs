pub mod lanes;
pub mod order;

pub use lanes::{lane_height, Lane, LaneLayout, Layout, Point, PositionedEdge, PositionedNode};
pub use order::chronological_order;
