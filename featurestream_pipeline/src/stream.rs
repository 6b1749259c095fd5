//! Dispatches feature events through the writer chain.

use crate::{
	event::{EventKind, EventSource, FeatureEvent, RequestContext, TransformationContext},
	schema::PropertyPath,
	traits::{FeatureWriter, Propagation},
};
use anyhow::{Context, Result};
use featurestream_core::EventOrderError;
use itertools::Itertools;
use log::{debug, trace};
use std::{io::Write, sync::Arc};

/// Tracks the position in the event grammar:
/// `start (feature-start (property | coordinates+ geometry-end)* feature-end)* end`.
#[derive(Debug, Default)]
struct EventOrder {
	started: bool,
	ended: bool,
	in_feature: bool,
	geometry: Option<(PropertyPath, Vec<usize>)>,
}

impl EventOrder {
	/// Validates `event`; for `geometry-end` returns the location of the closed geometry.
	fn check(&mut self, event: &FeatureEvent) -> Result<Option<(PropertyPath, Vec<usize>)>, EventOrderError> {
		use EventOrderError::*;

		if self.ended {
			return Err(AfterEnd);
		}
		if !self.started && !matches!(event, FeatureEvent::Start { .. }) {
			return Err(if matches!(event, FeatureEvent::End) {
				UnexpectedEnd
			} else {
				UnexpectedStart
			});
		}

		match event {
			FeatureEvent::Start { .. } => {
				if self.started {
					return Err(UnexpectedStart);
				}
				self.started = true;
			}
			FeatureEvent::End => {
				if self.in_feature {
					return Err(UnclosedFeature);
				}
				self.ended = true;
			}
			FeatureEvent::FeatureStart => {
				if self.in_feature {
					return Err(NestedFeature);
				}
				self.in_feature = true;
			}
			FeatureEvent::FeatureEnd => {
				if !self.in_feature {
					return Err(UnbalancedFeatureEnd);
				}
				if self.geometry.is_some() {
					return Err(GeometryNotClosed("feature-end"));
				}
				self.in_feature = false;
			}
			FeatureEvent::Property { .. } => {
				if !self.in_feature {
					return Err(OutsideFeature("property"));
				}
				if self.geometry.is_some() {
					return Err(GeometryNotClosed("property"));
				}
			}
			FeatureEvent::CoordinateChunk { path, multiplicity, .. } => {
				if !self.in_feature {
					return Err(OutsideFeature("coordinates"));
				}
				match &self.geometry {
					Some((open_path, open_multiplicity)) => {
						if open_path != path || open_multiplicity != multiplicity {
							return Err(GeometryNotClosed("coordinates of another geometry"));
						}
					}
					None => self.geometry = Some((path.clone(), multiplicity.clone())),
				}
			}
			FeatureEvent::GeometryEnd => {
				if !self.in_feature {
					return Err(OutsideFeature("geometry-end"));
				}
				return self.geometry.take().map(Some).ok_or(GeometryEndWithoutCoordinates);
			}
		}
		Ok(None)
	}

	fn finish(&self) -> Result<(), EventOrderError> {
		if self.in_feature {
			Err(EventOrderError::UnclosedFeature)
		} else if !self.ended {
			Err(EventOrderError::MissingEnd)
		} else {
			Ok(())
		}
	}
}

/// Runs one response: validates every event, moves the cursor and hands the event to the
/// writers in priority order until one of them stops it.
pub struct FeatureStream<'a> {
	ctx: TransformationContext<'a>,
	writers: Vec<Box<dyn FeatureWriter>>,
	order: EventOrder,
}

impl<'a> FeatureStream<'a> {
	pub fn new(request: Arc<RequestContext>, mut writers: Vec<Box<dyn FeatureWriter>>, output: &'a mut dyn Write) -> Self {
		writers.sort_by_key(|w| w.sort_priority());
		debug!(
			"writer chain: {}",
			writers
				.iter()
				.map(|w| format!("{} ({})", w.name(), w.sort_priority()))
				.join(", ")
		);
		Self {
			ctx: TransformationContext::new(request, output),
			writers,
			order: EventOrder::default(),
		}
	}

	pub fn writer_names(&self) -> Vec<&str> {
		self.writers.iter().map(|w| w.name()).collect()
	}

	pub fn push(&mut self, event: FeatureEvent) -> Result<()> {
		let kind = event.kind();
		let geometry = self.order.check(&event)?;

		let schema = self.ctx.request.schema.clone();
		self.ctx.cursor.advance(event, &schema);
		if let Some((path, multiplicity)) = geometry {
			self.ctx.cursor.locate(path, multiplicity, &schema);
		}

		// writers may swap the request for the writers after them, but only for this event
		let request = self.ctx.request.clone();
		let result = self.dispatch(kind);
		self.ctx.request = request;
		result?;

		if kind == EventKind::End {
			self.ctx.output.flush().context("failed to flush output")?;
		}
		Ok(())
	}

	fn dispatch(&mut self, kind: EventKind) -> Result<()> {
		let ctx = &mut self.ctx;
		for writer in &mut self.writers {
			let propagation = match kind {
				EventKind::Start => writer.on_start(ctx),
				EventKind::End => writer.on_end(ctx),
				EventKind::FeatureStart => writer.on_feature_start(ctx),
				EventKind::FeatureEnd => writer.on_feature_end(ctx),
				EventKind::Property => writer.on_property(ctx),
				EventKind::CoordinateChunk => writer.on_coordinates(ctx),
				EventKind::GeometryEnd => writer.on_geometry_end(ctx),
			}
			.with_context(|| format!("writer '{}' failed on {kind}", writer.name()))?;

			if propagation == Propagation::Stop {
				trace!("{kind} at '{}' stopped by '{}'", ctx.cursor.path, writer.name());
				break;
			}
		}
		Ok(())
	}

	/// Pushes all events of `source` and checks that the response was complete.
	pub fn run(&mut self, source: &mut dyn EventSource) -> Result<()> {
		while let Some(event) = source.next_event()? {
			self.push(event)?;
		}
		self.order.finish()?;
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{event::VecEventSource, schema::FeatureSchema};
	use featurestream_core::is_event_order_error;
	use pretty_assertions::assert_eq;
	use rstest::rstest;
	use std::{cell::RefCell, rc::Rc};

	type Log = Rc<RefCell<Vec<String>>>;

	#[derive(Debug)]
	struct Recorder {
		name: String,
		priority: i32,
		log: Log,
		stop_properties: bool,
		replace_service_url: bool,
	}

	impl Recorder {
		fn boxed(name: &str, priority: i32, log: &Log) -> Box<Self> {
			Box::new(Self {
				name: name.to_string(),
				priority,
				log: log.clone(),
				stop_properties: false,
				replace_service_url: false,
			})
		}

		fn record(&self, ctx: &TransformationContext, event: &str) {
			self.log.borrow_mut().push(format!(
				"{}:{event}:{}:{}",
				self.name, ctx.cursor.path, ctx.request.service_url
			));
		}
	}

	impl FeatureWriter for Recorder {
		fn name(&self) -> &str {
			&self.name
		}

		fn sort_priority(&self) -> i32 {
			self.priority
		}

		fn on_start(&mut self, ctx: &mut TransformationContext) -> Result<Propagation> {
			self.record(ctx, "start");
			if self.replace_service_url {
				let mut request = (*ctx.request).clone();
				request.service_url = String::from("replaced");
				ctx.request = Arc::new(request);
			}
			Ok(Propagation::Continue)
		}

		fn on_property(&mut self, ctx: &mut TransformationContext) -> Result<Propagation> {
			self.record(ctx, "property");
			Ok(if self.stop_properties {
				Propagation::Stop
			} else {
				Propagation::Continue
			})
		}

		fn on_geometry_end(&mut self, ctx: &mut TransformationContext) -> Result<Propagation> {
			self.record(ctx, "geometry-end");
			Ok(Propagation::Continue)
		}
	}

	fn request() -> Arc<RequestContext> {
		let mut request = RequestContext::new(FeatureSchema::default());
		request.service_url = String::from("orig");
		Arc::new(request)
	}

	#[test]
	fn writers_run_in_priority_order() -> Result<()> {
		let log = Log::default();
		let writers: Vec<Box<dyn FeatureWriter>> = vec![
			Recorder::boxed("encoder", 1000, &log),
			Recorder::boxed("first", 100, &log),
			Recorder::boxed("second", 100, &log),
		];
		let mut output = Vec::new();
		let mut stream = FeatureStream::new(request(), writers, &mut output);
		assert_eq!(stream.writer_names(), ["first", "second", "encoder"]);
		stream.push(FeatureEvent::start())?;
		assert_eq!(
			*log.borrow(),
			["first:start::orig", "second:start::orig", "encoder:start::orig"]
		);
		Ok(())
	}

	#[test]
	fn stop_hides_event_from_later_writers() -> Result<()> {
		let log = Log::default();
		let mut filter = Recorder::boxed("filter", 1, &log);
		filter.stop_properties = true;
		let writers: Vec<Box<dyn FeatureWriter>> = vec![filter, Recorder::boxed("encoder", 2, &log)];
		let mut output = Vec::new();
		let mut stream = FeatureStream::new(request(), writers, &mut output);
		stream.push(FeatureEvent::start())?;
		stream.push(FeatureEvent::FeatureStart)?;
		stream.push(FeatureEvent::property("name", &[], "x"))?;
		assert_eq!(
			log.borrow().last().map(String::as_str),
			Some("filter:property:name:orig")
		);
		Ok(())
	}

	#[test]
	fn replaced_request_is_scoped_to_the_event() -> Result<()> {
		let log = Log::default();
		let mut links = Recorder::boxed("links", 1, &log);
		links.replace_service_url = true;
		let writers: Vec<Box<dyn FeatureWriter>> = vec![links, Recorder::boxed("encoder", 2, &log)];
		let mut output = Vec::new();
		let mut stream = FeatureStream::new(request(), writers, &mut output);
		stream.push(FeatureEvent::start())?;
		stream.push(FeatureEvent::FeatureStart)?;
		stream.push(FeatureEvent::property("name", &[], "x"))?;
		assert_eq!(
			*log.borrow(),
			[
				"links:start::orig",
				"encoder:start::replaced",
				"links:property:name:orig",
				"encoder:property:name:orig"
			]
		);
		Ok(())
	}

	#[test]
	fn geometry_end_carries_geometry_path() -> Result<()> {
		let log = Log::default();
		let writers: Vec<Box<dyn FeatureWriter>> = vec![Recorder::boxed("w", 1, &log)];
		let mut output = Vec::new();
		let mut stream = FeatureStream::new(request(), writers, &mut output);
		let mut source = VecEventSource::new(vec![
			FeatureEvent::start(),
			FeatureEvent::FeatureStart,
			FeatureEvent::coordinates("geom", &[], &[], "1 2"),
			FeatureEvent::GeometryEnd,
			FeatureEvent::FeatureEnd,
			FeatureEvent::End,
		]);
		stream.run(&mut source)?;
		assert_eq!(
			log.borrow().last().map(String::as_str),
			Some("w:geometry-end:geom:orig")
		);
		Ok(())
	}

	fn run(events: Vec<FeatureEvent>) -> Result<()> {
		let mut output = Vec::new();
		let mut stream = FeatureStream::new(request(), vec![], &mut output);
		stream.run(&mut VecEventSource::new(events))
	}

	#[rstest]
	#[case(vec![FeatureEvent::FeatureStart], EventOrderError::UnexpectedStart)]
	#[case(vec![FeatureEvent::End], EventOrderError::UnexpectedEnd)]
	#[case(vec![FeatureEvent::start(), FeatureEvent::start()], EventOrderError::UnexpectedStart)]
	#[case(vec![FeatureEvent::start(), FeatureEvent::End, FeatureEvent::End], EventOrderError::AfterEnd)]
	#[case(vec![FeatureEvent::start(), FeatureEvent::FeatureStart, FeatureEvent::FeatureStart], EventOrderError::NestedFeature)]
	#[case(vec![FeatureEvent::start(), FeatureEvent::FeatureEnd], EventOrderError::UnbalancedFeatureEnd)]
	#[case(vec![FeatureEvent::start(), FeatureEvent::property("a", &[], "b")], EventOrderError::OutsideFeature("property"))]
	#[case(vec![FeatureEvent::start(), FeatureEvent::FeatureStart, FeatureEvent::GeometryEnd], EventOrderError::GeometryEndWithoutCoordinates)]
	#[case(
		vec![FeatureEvent::start(), FeatureEvent::FeatureStart, FeatureEvent::coordinates("g", &[], &[], "1 2"), FeatureEvent::property("a", &[], "b")],
		EventOrderError::GeometryNotClosed("property")
	)]
	#[case(
		vec![FeatureEvent::start(), FeatureEvent::FeatureStart, FeatureEvent::coordinates("g", &[], &[], "1 2"), FeatureEvent::coordinates("h", &[], &[], "1 2")],
		EventOrderError::GeometryNotClosed("coordinates of another geometry")
	)]
	#[case(vec![FeatureEvent::start(), FeatureEvent::FeatureStart, FeatureEvent::End], EventOrderError::UnclosedFeature)]
	#[case(vec![FeatureEvent::start(), FeatureEvent::FeatureStart], EventOrderError::UnclosedFeature)]
	#[case(vec![FeatureEvent::start()], EventOrderError::MissingEnd)]
	fn invalid_order(#[case] events: Vec<FeatureEvent>, #[case] expected: EventOrderError) {
		let error = run(events).unwrap_err();
		assert!(is_event_order_error(&error));
		assert_eq!(error.downcast_ref::<EventOrderError>(), Some(&expected));
	}

	#[test]
	fn valid_order() -> Result<()> {
		run(vec![
			FeatureEvent::start(),
			FeatureEvent::FeatureStart,
			FeatureEvent::property("a", &[], "b"),
			FeatureEvent::coordinates("g", &[], &[0], "1 2"),
			FeatureEvent::coordinates("g", &[], &[1], "3 4"),
			FeatureEvent::GeometryEnd,
			FeatureEvent::FeatureEnd,
			FeatureEvent::FeatureStart,
			FeatureEvent::FeatureEnd,
			FeatureEvent::End,
		])
	}
}
