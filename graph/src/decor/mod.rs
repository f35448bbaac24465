pub mod refs;

pub use refs::{Decoration, RefDecorator, HEAD_LABEL};
