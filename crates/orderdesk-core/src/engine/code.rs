//! Order code generation.

use chrono::NaiveDate;
use rand::Rng;

/// Draws candidate order codes of the form `<prefix><YYYYMMDD><NNN>`.
///
/// The three-digit suffix is random, so codes are not unique by construction;
/// callers check each candidate against the repository.
#[derive(Debug, Clone)]
pub struct OrderCodeGenerator {
	prefix: String,
}

impl OrderCodeGenerator {
	/// Number of distinct suffixes per day.
	pub const SUFFIX_SPACE: u32 = 1000;

	pub fn new(prefix: impl Into<String>) -> Self {
		Self {
			prefix: prefix.into(),
		}
	}

	/// Draws a random candidate for `day`.
	pub fn candidate(&self, day: NaiveDate) -> String {
		let suffix = rand::thread_rng().gen_range(0..Self::SUFFIX_SPACE);
		self.format(day, suffix)
	}

	pub(crate) fn format(&self, day: NaiveDate, suffix: u32) -> String {
		format!("{}{}{:03}", self.prefix, day.format("%Y%m%d"), suffix)
	}
}

impl Default for OrderCodeGenerator {
	fn default() -> Self {
		Self::new("ORD")
	}
}
