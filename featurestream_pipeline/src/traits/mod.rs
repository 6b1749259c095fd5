mod factory;
mod writer;

pub use factory::*;
pub use writer::*;
