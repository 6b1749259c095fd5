use crate::event::Representation;
use serde::Deserialize;

/// When a `remove` rule takes effect.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RemoveScope {
	Always,
	Overview,
	Never,
}

impl RemoveScope {
	#[must_use]
	pub fn applies(self, representation: Representation) -> bool {
		match self {
			RemoveScope::Always => true,
			RemoveScope::Overview => representation == Representation::Overview,
			RemoveScope::Never => false,
		}
	}
}

/// Reformats date values. `source` defaults to RFC 3339 or ISO 8601 dates.
///
/// Formats use the `time` format description syntax, e.g. `[day].[month].[year]`.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(from = "DateFormatRepr")]
pub struct DateFormatRule {
	pub source: Option<String>,
	pub target: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DateFormatRepr {
	Target(String),
	Full {
		#[serde(default)]
		source: Option<String>,
		target: String,
	},
}

impl From<DateFormatRepr> for DateFormatRule {
	fn from(value: DateFormatRepr) -> Self {
		match value {
			DateFormatRepr::Target(target) => Self { source: None, target },
			DateFormatRepr::Full { source, target } => Self { source, target },
		}
	}
}

/// Replaces codes with the values of a codelist.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(from = "CodelistRepr")]
pub struct CodelistRule {
	pub id: String,
	/// Emitted for codes missing in the codelist, the code itself when `None`.
	pub fallback: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CodelistRepr {
	Id(String),
	Full {
		id: String,
		#[serde(default)]
		fallback: Option<String>,
	},
}

impl From<CodelistRepr> for CodelistRule {
	fn from(value: CodelistRepr) -> Self {
		match value {
			CodelistRepr::Id(id) => Self { id, fallback: None },
			CodelistRepr::Full { id, fallback } => Self { id, fallback },
		}
	}
}

/// One rule, written as a single-key map such as `rename: label`.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(try_from = "RuleRepr")]
pub enum TransformationRule {
	Rename(String),
	Remove(RemoveScope),
	DateFormat(DateFormatRule),
	/// Template with `{{value}}` and `{{serviceUrl}}` placeholders.
	StringFormat(String),
	Codelist(CodelistRule),
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
struct RuleRepr {
	rename: Option<String>,
	remove: Option<RemoveScope>,
	date_format: Option<DateFormatRule>,
	string_format: Option<String>,
	codelist: Option<CodelistRule>,
}

impl TryFrom<RuleRepr> for TransformationRule {
	type Error = String;

	fn try_from(value: RuleRepr) -> Result<Self, Self::Error> {
		let RuleRepr {
			rename,
			remove,
			date_format,
			string_format,
			codelist,
		} = value;
		let mut rules: Vec<TransformationRule> = [
			rename.map(TransformationRule::Rename),
			remove.map(TransformationRule::Remove),
			date_format.map(TransformationRule::DateFormat),
			string_format.map(TransformationRule::StringFormat),
			codelist.map(TransformationRule::Codelist),
		]
		.into_iter()
		.flatten()
		.collect();
		match rules.len() {
			1 => Ok(rules.remove(0)),
			0 => Err(String::from("a rule needs one of rename, remove, dateFormat, stringFormat, codelist")),
			_ => Err(String::from("a rule must have exactly one key, list several rules instead")),
		}
	}
}
