// Capability categories and the enabled-category configuration parser

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Coarse grouping used to enable or disable whole sets of capabilities
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
	Wiki,
	Project,
	Messenger,
	Calendar,
	Drive,
}

impl Category {
	pub const ALL: [Category; 5] = [
		Category::Wiki,
		Category::Project,
		Category::Messenger,
		Category::Calendar,
		Category::Drive,
	];

	pub fn all() -> BTreeSet<Category> {
		Self::ALL.into_iter().collect()
	}

	pub fn as_str(&self) -> &'static str {
		match self {
			Category::Wiki => "WIKI",
			Category::Project => "PROJECT",
			Category::Messenger => "MESSENGER",
			Category::Calendar => "CALENDAR",
			Category::Drive => "DRIVE",
		}
	}
}

impl fmt::Display for Category {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownCategory(pub String);

impl fmt::Display for UnknownCategory {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "unknown category '{}'", self.0)
	}
}

impl std::error::Error for UnknownCategory {}

impl FromStr for Category {
	type Err = UnknownCategory;

	/// Case-insensitive. `STORAGE` is accepted as another name for `DRIVE`.
	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_ascii_uppercase().as_str() {
			"WIKI" => Ok(Category::Wiki),
			"PROJECT" => Ok(Category::Project),
			"MESSENGER" => Ok(Category::Messenger),
			"CALENDAR" => Ok(Category::Calendar),
			"DRIVE" | "STORAGE" => Ok(Category::Drive),
			other => Err(UnknownCategory(other.to_string())),
		}
	}
}

/// Outcome of parsing the enabled-category setting, kept for startup diagnostics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryFilterReport {
	pub enabled: BTreeSet<Category>,
	/// Tokens that matched no category, uppercased
	pub rejected: Vec<String>,
	/// True when every category was enabled because nothing valid was configured
	pub fell_back: bool,
}

/// Parse a comma separated category list into the set of enabled categories.
///
/// An absent or blank value enables everything. Unknown tokens are dropped one
/// by one with a warning; if nothing valid remains every category is enabled.
pub fn parse_enabled_categories(raw: Option<&str>) -> BTreeSet<Category> {
	parse_with_report(raw).enabled
}

pub fn parse_with_report(raw: Option<&str>) -> CategoryFilterReport {
	let Some(raw) = raw.filter(|r| !r.trim().is_empty()) else {
		return CategoryFilterReport {
			enabled: Category::all(),
			rejected: Vec::new(),
			fell_back: false,
		};
	};

	let mut enabled = BTreeSet::new();
	let mut rejected = Vec::new();
	for token in raw.split(',').map(|t| t.trim().to_ascii_uppercase()) {
		if token.is_empty() {
			continue;
		}
		match token.parse::<Category>() {
			Ok(category) => {
				enabled.insert(category);
			},
			Err(_) => {
				warn!(target: "dooray::category", token = %token, "ignoring unknown category");
				rejected.push(token);
			},
		}
	}

	if enabled.is_empty() {
		warn!(
			target: "dooray::category",
			raw = %raw,
			"no valid categories configured, enabling all categories"
		);
		return CategoryFilterReport {
			enabled: Category::all(),
			rejected,
			fell_back: true,
		};
	}

	CategoryFilterReport {
		enabled,
		rejected,
		fell_back: false,
	}
}
