pub mod entropy_coding;
pub mod helpers;
pub mod macros;
pub mod models;

mod history;
mod tree;

pub use debug_unreachable::debug_unreachable;
