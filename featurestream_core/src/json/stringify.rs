use std::fmt::Write;

/// Escapes a string for use inside JSON quotes.
#[must_use]
pub fn escape_json_string(input: &str) -> String {
	let mut escaped = String::with_capacity(input.len());
	for c in input.chars() {
		match c {
			'"' => escaped.push_str("\\\""),
			'\\' => escaped.push_str("\\\\"),
			'\n' => escaped.push_str("\\n"),
			'\r' => escaped.push_str("\\r"),
			'\t' => escaped.push_str("\\t"),
			'\u{08}' => escaped.push_str("\\b"),
			'\u{0c}' => escaped.push_str("\\f"),
			c if c.is_control() => {
				let _ = write!(escaped, "\\u{:04x}", c as u32);
			}
			c => escaped.push(c),
		}
	}
	escaped
}

/// Formats a float as a JSON number. Non-finite values have no JSON representation and become `null`.
#[must_use]
pub fn format_json_number(value: f64) -> String {
	if value.is_finite() {
		// `-0` is valid JSON but surprises most consumers
		if value == 0.0 {
			return String::from("0");
		}
		value.to_string()
	} else {
		String::from("null")
	}
}

/// Rounds a value to the given number of decimal places.
#[must_use]
pub fn round_to_precision(value: f64, precision: u8) -> f64 {
	let factor = 10f64.powi(i32::from(precision));
	(value * factor).round() / factor
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[test]
	fn escape_special_characters() {
		assert_eq!(
			escape_json_string("Line1\nLine2\rTab\tBackslash\\"),
			"Line1\\nLine2\\rTab\\tBackslash\\\\"
		);
		assert_eq!(escape_json_string("Hello \"World\""), "Hello \\\"World\\\"");
	}

	#[test]
	fn escape_control_characters() {
		assert_eq!(escape_json_string("Control:\x01\x02"), "Control:\\u0001\\u0002");
	}

	#[test]
	fn escape_backspace_and_form_feed() {
		assert_eq!(escape_json_string("a\u{08}b\u{0c}c"), "a\\bb\\fc");
	}

	#[test]
	fn escape_keeps_unicode() {
		assert_eq!(escape_json_string("Straße 😊"), "Straße 😊");
	}

	#[rstest]
	#[case(1.0, "1")]
	#[case(-0.0, "0")]
	#[case(3.25, "3.25")]
	#[case(-12.5, "-12.5")]
	#[case(f64::NAN, "null")]
	#[case(f64::INFINITY, "null")]
	fn numbers(#[case] value: f64, #[case] expected: &str) {
		assert_eq!(format_json_number(value), expected);
	}

	#[rstest]
	#[case(0, 1.0)]
	#[case(1, 1.2)]
	#[case(3, 1.235)]
	fn precision(#[case] prec: u8, #[case] expected: f64) {
		assert_eq!(round_to_precision(1.23456, prec), expected);
	}
}
