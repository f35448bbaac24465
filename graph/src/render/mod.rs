pub mod figure;

pub use figure::{edge_gradient, FigureBuilder, Rgb};
