pub mod walker;

pub use walker::{ExtractMode, GitWalker};
