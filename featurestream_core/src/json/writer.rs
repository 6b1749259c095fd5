//! Structured JSON writing.
//!
//! # Examples
//!
//! ```rust
//! use featurestream_core::json::{JsonState, JsonWrite};
//! use anyhow::Result;
//!
//! fn main() -> Result<()> {
//!     let mut buffer: Vec<u8> = Vec::new();
//!     let mut state = JsonState::new(false);
//!     let mut writer = state.writer(&mut buffer);
//!
//!     writer.start_object()?;
//!     writer.string_field("type", "CityJSON")?;
//!     writer.start_array_field("vertices")?;
//!     writer.end_array()?;
//!     writer.end_object()?;
//!
//!     assert_eq!(String::from_utf8(buffer)?, r#"{"type":"CityJSON","vertices":[]}"#);
//!     Ok(())
//! }
//! ```

use super::{JsonScalar, escape_json_string};
use anyhow::{Result, bail};
use std::io::Write;

/// Interface for writing JSON token by token.
///
/// Implementors only provide the six primitive operations, everything else is derived.
pub trait JsonWrite {
	fn start_object(&mut self) -> Result<()>;
	fn end_object(&mut self) -> Result<()>;
	fn start_array(&mut self) -> Result<()>;
	fn end_array(&mut self) -> Result<()>;

	/// Writes an object key. The next call must write its value.
	fn field(&mut self, name: &str) -> Result<()>;

	fn scalar(&mut self, value: &JsonScalar) -> Result<()>;

	fn string(&mut self, value: &str) -> Result<()> {
		self.scalar(&JsonScalar::from(value))
	}

	fn number(&mut self, value: f64) -> Result<()> {
		self.scalar(&JsonScalar::Number(value))
	}

	fn integer(&mut self, value: i64) -> Result<()> {
		self.scalar(&JsonScalar::Integer(value))
	}

	fn boolean(&mut self, value: bool) -> Result<()> {
		self.scalar(&JsonScalar::Bool(value))
	}

	fn null(&mut self) -> Result<()> {
		self.scalar(&JsonScalar::Null)
	}

	fn start_object_field(&mut self, name: &str) -> Result<()> {
		self.field(name)?;
		self.start_object()
	}

	fn start_array_field(&mut self, name: &str) -> Result<()> {
		self.field(name)?;
		self.start_array()
	}

	fn string_field(&mut self, name: &str, value: &str) -> Result<()> {
		self.field(name)?;
		self.string(value)
	}

	fn scalar_field(&mut self, name: &str, value: &JsonScalar) -> Result<()> {
		self.field(name)?;
		self.scalar(value)
	}
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Container {
	Object,
	Array,
}

#[derive(Clone, Debug)]
struct Frame {
	container: Container,
	count: usize,
}

/// Nesting state of a JSON document that is written in several steps.
///
/// The state outlives the individual [`JsonStreamWriter`]s, so an encoder can keep it
/// between events while borrowing the output sink only for the duration of one event.
#[derive(Clone, Debug, Default)]
pub struct JsonState {
	stack: Vec<Frame>,
	after_field: bool,
	pretty: bool,
	sequence: bool,
	root_values: usize,
}

impl JsonState {
	#[must_use]
	pub fn new(pretty: bool) -> Self {
		Self {
			pretty,
			..Self::default()
		}
	}

	/// A state for newline-delimited JSON: several root values, each terminated by `\n`.
	#[must_use]
	pub fn new_sequence() -> Self {
		Self {
			sequence: true,
			..Self::default()
		}
	}

	pub fn writer<'w>(&'w mut self, out: &'w mut dyn Write) -> JsonStreamWriter<'w> {
		JsonStreamWriter { out, state: self }
	}

	/// Current nesting depth, `0` between root values.
	#[must_use]
	pub fn depth(&self) -> usize {
		self.stack.len()
	}
}

/// Writes JSON tokens directly into a sink, inserting separators and indentation.
pub struct JsonStreamWriter<'w> {
	out: &'w mut dyn Write,
	state: &'w mut JsonState,
}

impl JsonStreamWriter<'_> {
	fn indent(&mut self, depth: usize) -> Result<()> {
		if self.state.pretty {
			write!(self.out, "\n{}", "  ".repeat(depth))?;
		}
		Ok(())
	}

	fn before_value(&mut self) -> Result<()> {
		if self.state.after_field {
			self.state.after_field = false;
			return Ok(());
		}
		let depth = self.state.stack.len();
		match self.state.stack.last_mut() {
			Some(frame) if frame.container == Container::Array => {
				frame.count += 1;
				if frame.count > 1 {
					self.out.write_all(b",")?;
				}
				self.indent(depth)?;
			}
			Some(_) => bail!("a value inside an object needs a field name"),
			None => {
				if self.state.root_values > 0 && !self.state.sequence {
					bail!("a JSON document can only have one root value");
				}
				self.state.root_values += 1;
			}
		}
		Ok(())
	}

	fn after_value(&mut self) -> Result<()> {
		if self.state.stack.is_empty() && self.state.sequence {
			self.out.write_all(b"\n")?;
		}
		Ok(())
	}

	fn close(&mut self, container: Container, bracket: &[u8]) -> Result<()> {
		if self.state.after_field {
			bail!("field name without value");
		}
		let count = match self.state.stack.last() {
			Some(frame) if frame.container == container => frame.count,
			Some(frame) => bail!("cannot close {container:?}, innermost container is {:?}", frame.container),
			None => bail!("cannot close {container:?} at root level"),
		};
		self.state.stack.pop();
		if count > 0 {
			let depth = self.state.stack.len();
			self.indent(depth)?;
		}
		self.out.write_all(bracket)?;
		self.after_value()
	}
}

impl JsonWrite for JsonStreamWriter<'_> {
	fn start_object(&mut self) -> Result<()> {
		self.before_value()?;
		self.out.write_all(b"{")?;
		self.state.stack.push(Frame {
			container: Container::Object,
			count: 0,
		});
		Ok(())
	}

	fn end_object(&mut self) -> Result<()> {
		self.close(Container::Object, b"}")
	}

	fn start_array(&mut self) -> Result<()> {
		self.before_value()?;
		self.out.write_all(b"[")?;
		self.state.stack.push(Frame {
			container: Container::Array,
			count: 0,
		});
		Ok(())
	}

	fn end_array(&mut self) -> Result<()> {
		self.close(Container::Array, b"]")
	}

	fn field(&mut self, name: &str) -> Result<()> {
		if self.state.after_field {
			bail!("field name '{name}' follows a field name without value");
		}
		let depth = self.state.stack.len();
		let Some(frame) = self.state.stack.last_mut() else {
			bail!("field name '{name}' outside of an object");
		};
		if frame.container != Container::Object {
			bail!("field name '{name}' inside an array");
		}
		frame.count += 1;
		if frame.count > 1 {
			self.out.write_all(b",")?;
		}
		self.indent(depth)?;
		write!(self.out, "\"{}\":", escape_json_string(name))?;
		if self.state.pretty {
			self.out.write_all(b" ")?;
		}
		self.state.after_field = true;
		Ok(())
	}

	fn scalar(&mut self, value: &JsonScalar) -> Result<()> {
		self.before_value()?;
		self.out.write_all(value.stringify().as_bytes())?;
		self.after_value()
	}
}
