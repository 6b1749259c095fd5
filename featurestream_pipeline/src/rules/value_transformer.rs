use super::{CodelistLookup, RuleTable, TransformationRule};
use crate::{event::RequestContext, schema::PropertyPath};
use anyhow::{Result, anyhow};
use lazy_static::lazy_static;
use log::warn;
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use regex::{Captures, Regex};
use std::{collections::HashMap, sync::Arc};
use time::{
	Date, OffsetDateTime, PrimitiveDateTime,
	format_description::{self, OwnedFormatItem, well_known::Rfc3339},
	macros::format_description as fd,
};

#[derive(Debug)]
enum ValueOp {
	DateFormat {
		source: Option<OwnedFormatItem>,
		target: OwnedFormatItem,
	},
	StringFormat(String),
	Codelist {
		id: String,
		fallback: Option<String>,
	},
}

enum ParsedDate {
	Offset(OffsetDateTime),
	Primitive(PrimitiveDateTime),
	Date(Date),
}

impl ParsedDate {
	fn parse(value: &str, source: Option<&OwnedFormatItem>) -> Result<Self> {
		if let Some(format) = source {
			return OffsetDateTime::parse(value, format)
				.map(ParsedDate::Offset)
				.or_else(|_| PrimitiveDateTime::parse(value, format).map(ParsedDate::Primitive))
				.or_else(|_| Date::parse(value, format).map(ParsedDate::Date))
				.map_err(|e| anyhow!("'{value}' does not match the source format: {e}"));
		}

		OffsetDateTime::parse(value, &Rfc3339)
			.map(ParsedDate::Offset)
			.or_else(|_| PrimitiveDateTime::parse(value, fd!("[year]-[month]-[day]T[hour]:[minute]:[second]")).map(ParsedDate::Primitive))
			.or_else(|_| Date::parse(value, fd!("[year]-[month]-[day]")).map(ParsedDate::Date))
			.map_err(|e| anyhow!("'{value}' is neither an RFC 3339 timestamp nor an ISO date: {e}"))
	}

	fn format(&self, target: &OwnedFormatItem) -> Result<String> {
		Ok(match self {
			ParsedDate::Offset(v) => v.format(target)?,
			ParsedDate::Primitive(v) => v.format(target)?,
			ParsedDate::Date(v) => v.format(target)?,
		})
	}
}

/// Applies the value-level rules (`dateFormat`, `stringFormat`, `codelist`) to emitted values.
///
/// Rules are compiled once per source path and kept for the rest of the response. Values a
/// rule cannot handle are passed on unchanged.
#[derive(Debug)]
pub struct ValueTransformer {
	rules: Arc<RuleTable>,
	codelists: Arc<dyn CodelistLookup>,
	service_url: String,
	compiled: HashMap<PropertyPath, Arc<Vec<ValueOp>>>,
}

impl ValueTransformer {
	#[must_use]
	pub fn new(request: &RequestContext) -> Self {
		Self {
			rules: request.rules.clone(),
			codelists: request.codelists.clone(),
			service_url: request.service_url.clone(),
			compiled: HashMap::new(),
		}
	}

	/// Whether any value rule applies to `source`.
	pub fn has_rules(&mut self, source: &PropertyPath) -> bool {
		!self.ops_for(source).is_empty()
	}

	pub fn transform(&mut self, source: &PropertyPath, value: String) -> String {
		let ops = self.ops_for(source);
		ops.iter().fold(value, |value, op| self.apply(op, source, value))
	}

	fn ops_for(&mut self, source: &PropertyPath) -> Arc<Vec<ValueOp>> {
		if let Some(ops) = self.compiled.get(source) {
			return ops.clone();
		}
		let ops = Arc::new(self.compile(source));
		self.compiled.insert(source.clone(), ops.clone());
		ops
	}

	fn compile(&self, source: &PropertyPath) -> Vec<ValueOp> {
		let mut ops = Vec::new();
		for rule in self.rules.rules_for(&source.to_string()) {
			match rule {
				TransformationRule::DateFormat(rule) => {
					let source_format = rule.source.as_deref().map(parse_format).transpose();
					match (source_format, parse_format(&rule.target)) {
						(Ok(source_format), Ok(target)) => ops.push(ValueOp::DateFormat {
							source: source_format,
							target,
						}),
						(Err(e), _) | (_, Err(e)) => warn!("ignoring dateFormat of '{source}': {e}"),
					}
				}
				TransformationRule::StringFormat(template) => ops.push(ValueOp::StringFormat(template.clone())),
				TransformationRule::Codelist(rule) => {
					if !self.codelists.contains(&rule.id) {
						warn!("codelist '{}' used by '{source}' is unknown", rule.id);
					}
					ops.push(ValueOp::Codelist {
						id: rule.id.clone(),
						fallback: rule.fallback.clone(),
					});
				}
				TransformationRule::Rename(_) | TransformationRule::Remove(_) => {}
			}
		}
		ops
	}

	fn apply(&self, op: &ValueOp, source: &PropertyPath, value: String) -> String {
		match op {
			ValueOp::DateFormat {
				source: source_format,
				target,
			} => match ParsedDate::parse(&value, source_format.as_ref()).and_then(|date| date.format(target)) {
				Ok(formatted) => formatted,
				Err(e) => {
					warn!("cannot reformat date of '{source}': {e}");
					value
				}
			},
			ValueOp::StringFormat(template) => render_template(template, &value, &self.service_url),
			ValueOp::Codelist { id, fallback } => self
				.codelists
				.lookup(id, &value)
				.or_else(|| fallback.clone())
				.unwrap_or(value),
		}
	}
}

fn parse_format(description: &str) -> Result<OwnedFormatItem> {
	format_description::parse_owned::<2>(description)
		.map_err(|e| anyhow!("invalid format description '{description}': {e}"))
}

/// Fills `{{value}}` and `{{serviceUrl}}` placeholders, optionally piped through
/// `urlEncode`, `toUpper` or `toLower`.
fn render_template(template: &str, value: &str, service_url: &str) -> String {
	lazy_static! {
		static ref PLACEHOLDER: Regex = Regex::new(r"\{\{\s*(\w+)\s*(?:\|\s*(\w+)\s*)?\}\}").unwrap();
	}

	PLACEHOLDER
		.replace_all(template, |caps: &Captures| {
			let raw = match &caps[1] {
				"value" => value,
				"serviceUrl" => service_url,
				_ => return caps[0].to_string(),
			};
			match caps.get(2).map(|m| m.as_str()) {
				None => raw.to_string(),
				Some("urlEncode") => utf8_percent_encode(raw, NON_ALPHANUMERIC).to_string(),
				Some("toUpper") => raw.to_uppercase(),
				Some("toLower") => raw.to_lowercase(),
				Some(filter) => {
					warn!("unknown template filter '{filter}'");
					raw.to_string()
				}
			}
		})
		.into_owned()
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{
		rules::{CodelistRule, Codelists, DateFormatRule},
		schema::FeatureSchema,
	};
	use pretty_assertions::assert_eq;
	use rstest::rstest;

	fn transformer(rules: RuleTable) -> ValueTransformer {
		let mut codelists = Codelists::default();
		codelists.insert("functions", "1000", "residential");
		let mut request = RequestContext::new(FeatureSchema::default());
		request.rules = Arc::new(rules);
		request.codelists = Arc::new(codelists);
		request.service_url = String::from("https://example.org/api");
		ValueTransformer::new(&request)
	}

	fn date(source: Option<&str>, target: &str) -> TransformationRule {
		TransformationRule::DateFormat(DateFormatRule {
			source: source.map(String::from),
			target: target.to_string(),
		})
	}

	fn apply(rule: TransformationRule, value: &str) -> String {
		let mut transformer = transformer(RuleTable::new().with("p", vec![rule]));
		transformer.transform(&PropertyPath::from("p"), value.to_string())
	}

	#[rstest]
	#[case(None, "[day].[month].[year]", "2024-03-07", "07.03.2024")]
	#[case(None, "[year]/[month]", "2024-03-07T10:15:00Z", "2024/03")]
	#[case(None, "[hour]:[minute]", "2024-03-07T10:15:30", "10:15")]
	#[case(Some("[year][month][day]"), "[year]-[month]-[day]", "20240307", "2024-03-07")]
	#[case(None, "[day].[month].[year]", "not a date", "not a date")]
	#[case(None, "[hour]", "2024-03-07", "2024-03-07")]
	fn date_format(#[case] source: Option<&str>, #[case] target: &str, #[case] value: &str, #[case] expected: &str) {
		assert_eq!(apply(date(source, target), value), expected);
	}

	#[test]
	fn invalid_format_description_is_ignored() {
		assert_eq!(apply(date(None, "[nonsense"), "2024-03-07"), "2024-03-07");
	}

	#[rstest]
	#[case("{{value}} m", "12", "12 m")]
	#[case("{{serviceUrl}}/items/{{ value | urlEncode }}", "a b/c", "https://example.org/api/items/a%20b%2Fc")]
	#[case("{{value|toUpper}}", "abc", "ABC")]
	#[case("{{value | toLower}}", "ABC", "abc")]
	#[case("{{other}}-{{value}}", "x", "{{other}}-x")]
	#[case("{{value | reverse}}", "x", "x")]
	fn string_format(#[case] template: &str, #[case] value: &str, #[case] expected: &str) {
		assert_eq!(
			apply(TransformationRule::StringFormat(template.to_string()), value),
			expected
		);
	}

	#[rstest]
	#[case("1000", None, "residential")]
	#[case("2000", None, "2000")]
	#[case("2000", Some("unknown"), "unknown")]
	fn codelist(#[case] value: &str, #[case] fallback: Option<&str>, #[case] expected: &str) {
		let rule = TransformationRule::Codelist(CodelistRule {
			id: String::from("functions"),
			fallback: fallback.map(String::from),
		});
		assert_eq!(apply(rule, value), expected);
	}

	#[test]
	fn rules_apply_in_order() {
		let rules = RuleTable::new().with(
			"function",
			vec![
				TransformationRule::Codelist(CodelistRule {
					id: String::from("functions"),
					fallback: None,
				}),
				TransformationRule::StringFormat(String::from("{{value | toUpper}}")),
				TransformationRule::Rename(String::from("ignored")),
			],
		);
		let mut transformer = transformer(rules);
		let path = PropertyPath::from("function");
		assert!(transformer.has_rules(&path));
		assert!(!transformer.has_rules(&PropertyPath::from("other")));
		assert_eq!(transformer.transform(&path, String::from("1000")), "RESIDENTIAL");
	}
}
