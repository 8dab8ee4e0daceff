//! Zoom level requests such as `0`, `-2`, `+1` or `=5`.
//!
//! A request is a list of tokens, resolved against the levels an archive actually contains:
//!
//! | token      | meaning                                     |
//! |------------|---------------------------------------------|
//! | `0`        | every existing level                        |
//! | `-N`       | `N` levels below the lowest existing level  |
//! | `+N`       | `N` levels above the highest existing level |
//! | `N`, `=N`  | level `N` itself                            |
//!
//! ```
//! use mbtiler_core::ZoomLevelSpec;
//! use std::collections::BTreeSet;
//!
//! let available = BTreeSet::from([3, 4, 5]);
//! let spec = ZoomLevelSpec::parse(["-1,0", "+2"]).unwrap();
//! assert_eq!(spec.resolve(&available).unwrap(), vec![2, 3, 4, 5, 7]);
//! ```

use crate::{MAX_LEVEL, MBTilesError};
use anyhow::{Result, bail, ensure};
use itertools::Itertools;
use std::{
	collections::BTreeSet,
	fmt::{self, Display},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LevelToken {
	Existing,
	BelowMin(u8),
	AboveMax(u8),
	Absolute(u8),
}

impl LevelToken {
	pub fn parse(token: &str) -> Result<LevelToken> {
		let token = token.trim();
		let invalid = |reason: &str| MBTilesError::InvalidLevelSpec {
			token: token.to_string(),
			reason: reason.to_string(),
		};
		let number = |digits: &str| -> Result<u8> {
			ensure!(
				!digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()),
				invalid("expected a number")
			);
			digits.parse::<u8>().map_err(|_| invalid("number is too large").into())
		};

		Ok(if let Some(rest) = token.strip_prefix('-') {
			LevelToken::BelowMin(number(rest)?)
		} else if let Some(rest) = token.strip_prefix('+') {
			LevelToken::AboveMax(number(rest)?)
		} else if let Some(rest) = token.strip_prefix('=') {
			LevelToken::Absolute(number(rest)?)
		} else {
			match number(token)? {
				0 => LevelToken::Existing,
				level => LevelToken::Absolute(level),
			}
		})
	}
}

impl Display for LevelToken {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			LevelToken::Existing => write!(f, "0"),
			LevelToken::BelowMin(n) => write!(f, "-{n}"),
			LevelToken::AboveMax(n) => write!(f, "+{n}"),
			LevelToken::Absolute(n) => write!(f, "={n}"),
		}
	}
}

/// An ordered list of [`LevelToken`]s. An empty list means "one level below the minimum".
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ZoomLevelSpec {
	tokens: Vec<LevelToken>,
}

impl ZoomLevelSpec {
	/// Parses tokens; each argument may itself hold several comma separated tokens.
	pub fn parse<I, S>(args: I) -> Result<ZoomLevelSpec>
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		let mut tokens = Vec::new();
		for arg in args {
			for part in arg.as_ref().split(',').filter(|p| !p.trim().is_empty()) {
				tokens.push(LevelToken::parse(part)?);
			}
		}
		Ok(ZoomLevelSpec { tokens })
	}

	pub fn copy_existing() -> ZoomLevelSpec {
		ZoomLevelSpec {
			tokens: vec![LevelToken::Existing],
		}
	}

	pub fn tokens(&self) -> &[LevelToken] {
		&self.tokens
	}

	/// Resolves the tokens against the levels present in an archive.
	///
	/// The result keeps the order of first mention and contains every level once.
	pub fn resolve(&self, available: &BTreeSet<u8>) -> Result<Vec<u8>> {
		let (Some(&min), Some(&max)) = (available.first(), available.last()) else {
			bail!("can not resolve zoom levels without any existing level");
		};

		let out_of_range = |token: LevelToken, reason: String| MBTilesError::InvalidLevelSpec {
			token: token.to_string(),
			reason,
		};

		let tokens = if self.tokens.is_empty() {
			vec![LevelToken::BelowMin(1)]
		} else {
			self.tokens.clone()
		};

		let mut levels = Vec::new();
		for token in tokens {
			match token {
				LevelToken::Existing => levels.extend(available.iter().copied()),
				LevelToken::BelowMin(n) => match min.checked_sub(n) {
					Some(level) => levels.push(level),
					None => bail!(out_of_range(token, format!("lowest existing level is {min}"))),
				},
				LevelToken::AboveMax(n) => {
					let level = u16::from(max) + u16::from(n);
					ensure!(
						level <= u16::from(MAX_LEVEL),
						out_of_range(token, format!("level {level} exceeds {MAX_LEVEL}"))
					);
					levels.push(level as u8);
				}
				LevelToken::Absolute(level) => {
					ensure!(
						level <= MAX_LEVEL,
						out_of_range(token, format!("level {level} exceeds {MAX_LEVEL}"))
					);
					levels.push(level);
				}
			}
		}

		Ok(levels.into_iter().unique().collect())
	}
}

impl Display for ZoomLevelSpec {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.tokens.iter().join(","))
	}
}
