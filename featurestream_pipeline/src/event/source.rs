use super::FeatureEvent;
use anyhow::{Context, Result};
use log::trace;
use std::{
	collections::VecDeque,
	fs::File,
	io::{BufRead, BufReader},
	path::Path,
};

/// Pull interface of a backend delivering feature events.
pub trait EventSource {
	/// The next event, or `None` once the source is exhausted.
	fn next_event(&mut self) -> Result<Option<FeatureEvent>>;
}

/// Serves events from memory.
#[derive(Debug, Default)]
pub struct VecEventSource {
	events: VecDeque<FeatureEvent>,
}

impl VecEventSource {
	#[must_use]
	pub fn new(events: Vec<FeatureEvent>) -> Self {
		Self { events: events.into() }
	}
}

impl EventSource for VecEventSource {
	fn next_event(&mut self) -> Result<Option<FeatureEvent>> {
		Ok(self.events.pop_front())
	}
}

/// Reads one JSON encoded event per line.
///
/// Empty lines and lines starting with `#` are skipped.
#[derive(Debug)]
pub struct JsonLinesEventSource<R: BufRead> {
	reader: R,
	line: String,
	line_number: usize,
}

impl<R: BufRead> JsonLinesEventSource<R> {
	pub fn new(reader: R) -> Self {
		Self {
			reader,
			line: String::new(),
			line_number: 0,
		}
	}
}

impl JsonLinesEventSource<BufReader<File>> {
	pub fn from_path(path: &Path) -> Result<Self> {
		let file = File::open(path).with_context(|| format!("failed to open event file {path:?}"))?;
		Ok(Self::new(BufReader::new(file)))
	}
}

impl<R: BufRead> EventSource for JsonLinesEventSource<R> {
	fn next_event(&mut self) -> Result<Option<FeatureEvent>> {
		loop {
			self.line.clear();
			let read = self
				.reader
				.read_line(&mut self.line)
				.with_context(|| format!("failed to read line {}", self.line_number + 1))?;
			if read == 0 {
				return Ok(None);
			}
			self.line_number += 1;

			let line = self.line.trim();
			if line.is_empty() || line.starts_with('#') {
				continue;
			}

			let event: FeatureEvent =
				serde_json::from_str(line).with_context(|| format!("invalid event in line {}", self.line_number))?;
			trace!("line {}: {:?}", self.line_number, event.kind());
			return Ok(Some(event));
		}
	}
}
