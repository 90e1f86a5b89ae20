//! Identifier case conversion with acronym awareness.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, de::Error as _};

pub const DEFAULT_ACRONYMS: [&str; 17] = [
	"api", "url", "sdk", "id", "ui", "io", "db", "css", "html", "http", "https", "json", "xml",
	"sql", "uri", "uuid", "jwt",
];

static DEFAULT_CASING: Lazy<Casing> = Lazy::new(|| {
	Casing::new(DEFAULT_ACRONYMS.iter().copied()).expect("Expected operation to succeed.")
});

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Case {
	/// `apiClient`
	Camel,
	/// `APIClient`
	Pascal,
	/// `API_CLIENT`
	Snake,
	/// `APICLIENT`
	Upper,
}
impl Case {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Camel => "camel",
			Self::Pascal => "pascal",
			Self::Snake => "snake",
			Self::Upper => "upper",
		}
	}
}

/// Converter holding the compiled acronym list.
#[derive(Clone, Debug)]
pub struct Casing {
	acronyms: Option<Regex>,
}
impl Casing {
	/// Compiles `acronyms` into one anchored alternation; the first alternative that matches a
	/// whole word wins.
	pub fn new<'a>(acronyms: impl IntoIterator<Item = &'a str>) -> Result<Self, regex::Error> {
		let alternatives = acronyms.into_iter().map(|acronym| format!("({acronym})")).collect::<Vec<_>>();

		if alternatives.is_empty() {
			return Ok(Self { acronyms: None });
		}

		let acronyms = Regex::new(&format!("^(?i:{})$", alternatives.join("|")))?;

		Ok(Self { acronyms: Some(acronyms) })
	}

	pub fn is_acronym(&self, word: &str) -> bool {
		self.acronyms.as_ref().is_some_and(|acronyms| acronyms.is_match(word))
	}

	pub fn convert(&self, input: &str, case: Case) -> String {
		let words = split_words(input);
		let mut out = String::new();

		for (idx, word) in words.iter().enumerate() {
			match case {
				Case::Camel if idx == 0 => out.push_str(word),
				Case::Camel | Case::Pascal if self.is_acronym(word) => out.push_str(&word.to_uppercase()),
				Case::Camel | Case::Pascal => out.push_str(&capitalize(word)),
				Case::Snake => {
					if idx > 0 {
						out.push('_');
					}

					out.push_str(&word.to_uppercase());
				},
				Case::Upper => out.push_str(&word.to_uppercase()),
			}
		}

		out
	}

	/// Whether `name` is already written in `case`.
	pub fn matches(&self, name: &str, case: Case) -> bool {
		self.convert(name, case) == name
	}
}
impl Default for Casing {
	fn default() -> Self {
		DEFAULT_CASING.clone()
	}
}
/// Deserializes from a list of acronym patterns.
impl<'de> Deserialize<'de> for Casing {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		let acronyms = Vec::<String>::deserialize(deserializer)?;

		Self::new(acronyms.iter().map(String::as_str)).map_err(D::Error::custom)
	}
}

/// Converts with the default acronym list.
pub fn convert(input: &str, case: Case) -> String {
	DEFAULT_CASING.convert(input, case)
}

/// Lower-cased words of `input`.
///
/// Splits on `-`, `_`, `.`, and whitespace, at lower-to-upper humps, before the last capital
/// of an upper-case run that is followed by a lower-case letter (`HTMLParser`), and at
/// letter/digit boundaries.
pub fn split_words(input: &str) -> Vec<String> {
	let mut words = Vec::new();

	for piece in input.split(|ch: char| ch == '-' || ch == '_' || ch == '.' || ch.is_whitespace()) {
		let chars = piece.chars().collect::<Vec<_>>();
		let mut current = String::new();

		for (idx, ch) in chars.iter().enumerate() {
			let prev = idx.checked_sub(1).map(|prev| chars[prev]);
			let next = chars.get(idx + 1);
			let boundary = match prev {
				Some(prev) =>
					(prev.is_lowercase() && ch.is_uppercase())
						|| (prev.is_uppercase()
							&& ch.is_uppercase()
							&& next.is_some_and(|next| next.is_lowercase()))
						|| (prev.is_alphabetic() && ch.is_ascii_digit())
						|| (prev.is_ascii_digit() && ch.is_alphabetic()),
				None => false,
			};

			if boundary && !current.is_empty() {
				words.push(std::mem::take(&mut current));
			}

			current.extend(ch.to_lowercase());
		}

		if !current.is_empty() {
			words.push(current);
		}
	}

	words
}

fn capitalize(word: &str) -> String {
	let mut chars = word.chars();

	match chars.next() {
		Some(first) => first.to_uppercase().chain(chars).collect(),
		None => String::new(),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn words_split_on_separators_humps_and_digits() {
		assert_eq!(split_words("HTMLParser"), vec!["html", "parser"]);
		assert_eq!(split_words("fooBar-baz_qux.v2"), vec!["foo", "bar", "baz", "qux", "v", "2"]);
		assert_eq!(split_words("  "), Vec::<String>::new());
	}

	#[test]
	fn acronyms_stay_upper_case() {
		assert_eq!(convert("api-client", Case::Pascal), "APIClient");
		assert_eq!(convert("api-client", Case::Camel), "apiClient");
		assert_eq!(convert("user-id", Case::Camel), "userID");
		assert_eq!(convert("my-url-parser", Case::Pascal), "MyURLParser");
	}

	#[test]
	fn snake_and_upper_styles() {
		assert_eq!(convert("apiClient", Case::Snake), "API_CLIENT");
		assert_eq!(convert("api-client", Case::Upper), "APICLIENT");
	}

	#[test]
	fn custom_acronym_lists_replace_the_default() {
		let casing = Casing::new(["gql"]).expect("valid acronyms");

		assert_eq!(casing.convert("gql-api", Case::Pascal), "GQLApi");
		assert!(casing.matches("gqlApi", Case::Camel));
	}
}
