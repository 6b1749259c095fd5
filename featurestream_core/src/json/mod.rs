//! Streaming JSON output.
//!
//! [`JsonWrite`] is the structured write interface. [`JsonStreamWriter`] writes straight into an
//! [`std::io::Write`] sink, [`JsonRecorder`] captures the same calls for a later [`JsonRecorder::replay`].

mod recorder;
mod scalar;
mod stringify;
mod writer;

pub use recorder::*;
pub use scalar::*;
pub use stringify::*;
pub use writer::*;
