use std::fmt;
use std::str::FromStr;

use crate::blend::{BlendError, Result};

/// One navigation step in a [`FieldPath`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathStep {
	/// Named struct field.
	Field(Box<str>),
	/// Zero-based element of an inline array or of the block a pointer lands in.
	Index(usize),
}

/// Ordered field-name segments such as `r.sfra` or `mat[2].name`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldPath {
	steps: Vec<PathStep>,
}

impl FieldPath {
	/// Parse dotted syntax with optional `[index]` selectors.
	pub fn parse(input: &str) -> Result<Self> {
		let invalid = || BlendError::InvalidFieldPath { path: input.to_owned() };
		let mut steps = Vec::new();

		for segment in input.split('.') {
			let (ident, mut rest) = match segment.find('[') {
				Some(at) => segment.split_at(at),
				None => (segment, ""),
			};
			if !is_ident(ident) {
				return Err(invalid());
			}
			steps.push(PathStep::Field(ident.into()));

			while !rest.is_empty() {
				let inner = rest.strip_prefix('[').ok_or_else(invalid)?;
				let close = inner.find(']').ok_or_else(invalid)?;
				let digits = &inner[..close];
				if digits.is_empty() || !digits.bytes().all(|byte| byte.is_ascii_digit()) {
					return Err(invalid());
				}
				steps.push(PathStep::Index(digits.parse().map_err(|_| invalid())?));
				rest = &inner[close + 1..];
			}
		}

		Ok(Self { steps })
	}

	/// Build a path from plain field names, e.g. `["r", "sfra"]`.
	pub fn from_segments<S: AsRef<str>>(segments: &[S]) -> Result<Self> {
		if segments.is_empty() {
			return Err(BlendError::InvalidFieldPath { path: String::new() });
		}

		let mut steps = Vec::with_capacity(segments.len());
		for segment in segments {
			let segment = segment.as_ref();
			if !is_ident(segment) {
				return Err(BlendError::InvalidFieldPath { path: segment.to_owned() });
			}
			steps.push(PathStep::Field(segment.into()));
		}
		Ok(Self { steps })
	}

	/// Parsed steps in order.
	pub fn steps(&self) -> &[PathStep] {
		&self.steps
	}
}

impl FromStr for FieldPath {
	type Err = BlendError;

	fn from_str(input: &str) -> Result<Self> {
		Self::parse(input)
	}
}

impl fmt::Display for FieldPath {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		for (idx, step) in self.steps.iter().enumerate() {
			match step {
				PathStep::Field(name) if idx == 0 => write!(f, "{name}")?,
				PathStep::Field(name) => write!(f, ".{name}")?,
				PathStep::Index(index) => write!(f, "[{index}]")?,
			}
		}
		Ok(())
	}
}

impl fmt::Display for PathStep {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Field(name) => f.write_str(name),
			Self::Index(index) => write!(f, "[{index}]"),
		}
	}
}

fn is_ident(text: &str) -> bool {
	!text.is_empty() && text.bytes().all(|byte| byte.is_ascii_alphanumeric() || byte == b'_')
}
