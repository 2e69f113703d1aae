//! Form state module

mod forms;
mod viewer;

pub use forms::*;
pub use viewer::*;
