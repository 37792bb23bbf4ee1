pub mod config;
pub mod error;
pub mod ir;
pub mod parse;
pub mod transform;

pub use transform::{Generated, generate, generate_with_source};
