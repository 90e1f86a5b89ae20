//! `jstyle.json`: the parser command and per-rule options.

use std::{
	collections::{BTreeMap, HashMap},
	fs,
	path::Path,
};

use serde::Deserialize;
use serde_json::Value;

use crate::{engine::RuleEntry, prelude::*, rules};

pub const CONFIG_FILE: &str = "jstyle.json";

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
	/// Command printing the ESTree JSON of the file path appended to it. Empty means every
	/// file has a `<file>.ast.json` sidecar.
	pub parser: Vec<String>,
	/// Keyed by rule name or id. Rules left out run with their default options.
	pub rules: BTreeMap<String, RuleSetting>,
}
impl Config {
	/// Reads `path`, or `jstyle.json` in the working directory when no path is given and
	/// that file exists.
	pub fn load(path: Option<&Path>) -> Result<Self> {
		let path = match path {
			Some(path) => path,
			None if Path::new(CONFIG_FILE).is_file() => Path::new(CONFIG_FILE),
			None => return Ok(Self::default()),
		};
		let text = fs::read_to_string(path)
			.map_err(|err| eyre::eyre!("Failed to read {}: {err}.", path.display()))?;

		Self::parse(&text).map_err(|err| eyre::eyre!("Failed to parse {}: {err}.", path.display()))
	}

	pub fn parse(text: &str) -> serde_json::Result<Self> {
		serde_json::from_str(text)
	}

	/// Resolves the rules to run, or every configuration error at once.
	pub fn validate(&self) -> Result<Vec<ActiveRule>, Vec<String>> {
		let mut errors = Vec::new();
		let mut settings = HashMap::<&'static str, (&str, &RuleSetting)>::new();

		for (key, setting) in &self.rules {
			let Some(entry) = rules::find_rule(key) else {
				errors.push(format!("Unknown rule \"{key}\"."));

				continue;
			};

			if let Some((previous, _)) = settings.insert(entry.meta.id, (key.as_str(), setting)) {
				errors.push(format!(
					"Rule {} is configured twice, as \"{previous}\" and \"{key}\".",
					entry.meta.id
				));
			}

			let validation = match setting {
				RuleSetting::Options(options) => (entry.validate)(options),
				RuleSetting::Enabled(_) => Ok(()),
			};

			if let Err(err) = validation {
				errors.push(format!("Invalid options for rule \"{key}\": {err}."));
			}
		}

		if self.parser.first().is_some_and(|program| program.trim().is_empty()) {
			errors.push("The parser command must name a program.".to_owned());
		}
		if !errors.is_empty() {
			return Err(errors);
		}

		let active = rules::registry()
			.into_iter()
			.filter_map(|entry| match settings.get(entry.meta.id).map(|(_, setting)| *setting) {
				Some(RuleSetting::Enabled(false)) => None,
				Some(RuleSetting::Options(options)) =>
					Some(ActiveRule { entry, options: Some(options.clone()) }),
				_ => Some(ActiveRule { entry, options: None }),
			})
			.collect();

		Ok(active)
	}
}

#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum RuleSetting {
	/// `false` turns the rule off; `true` keeps the defaults.
	Enabled(bool),
	Options(Value),
}

/// A rule selected for a run, with its configured options.
#[derive(Clone, Debug)]
pub struct ActiveRule {
	pub entry: RuleEntry,
	pub options: Option<Value>,
}

#[cfg(test)]
mod tests {
	use super::*;

	fn names(active: &[ActiveRule]) -> Vec<&'static str> {
		active.iter().map(|rule| rule.entry.meta.name).collect()
	}

	#[test]
	fn rules_are_enabled_by_default_and_can_be_turned_off() {
		let config = Config::parse(
			r#"{ "rules": { "comment-style": false, "JS-STYLE-ORDER-001": { "order": ["id", "*"] } } }"#,
		)
		.expect("config parses");
		let active = config.validate().expect("config is valid");

		assert_eq!(active.len(), rules::registry().len() - 1);
		assert!(!names(&active).contains(&"comment-style"));
		assert!(active.iter().any(|rule| rule.entry.meta.name == "prop-order" && rule.options.is_some()));
		assert!(Config::default().validate().is_ok_and(|active| active.len() == rules::registry().len()));
	}

	#[test]
	fn every_error_is_reported() {
		let config = Config::parse(
			r#"{
				"parser": [" "],
				"rules": {
					"no-such-rule": true,
					"bluebird-map-concurrency": { "concurrency": "many" },
					"import-order": true,
					"JS-STYLE-ORDER-002": false
				}
			}"#,
		)
		.expect("config parses");
		let errors = config.validate().expect_err("config is invalid");

		assert_eq!(errors.len(), 4);
		assert!(errors.iter().any(|error| error == "Unknown rule \"no-such-rule\"."));
		assert!(errors.iter().any(|error| error.starts_with("Invalid options for rule \"bluebird-map-concurrency\"")));
		assert!(errors.iter().any(|error| error.contains("configured twice")));
	}

	#[test]
	fn unknown_top_level_keys_are_rejected() {
		assert!(Config::parse(r#"{ "rule": {} }"#).is_err());
	}
}
