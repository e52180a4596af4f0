/// Field declarator as stored in the DNA name table (`*next`, `name[64]`, `(*func)()`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Declarator<'a> {
	/// Bare identifier.
	pub ident: &'a str,
	/// Number of `*` levels.
	pub ptr_depth: u8,
	/// Product of all `[N]` dimensions; `1` when there are none.
	pub array_len: usize,
	/// `(*name)(...)` style function pointer.
	pub is_func_ptr: bool,
}

impl Declarator<'_> {
	/// Whether the field stores an address rather than inline data.
	pub fn is_pointer(&self) -> bool {
		self.ptr_depth > 0 || self.is_func_ptr
	}
}

/// Split a declarator into identifier, pointer depth and flattened array length.
pub(crate) fn parse_declarator(raw: &str) -> Declarator<'_> {
	let text = raw.trim();

	if let Some(rest) = text.strip_prefix('(') {
		// Function pointer or parenthesized pointer: `(*name)(args)` / `(**name)`.
		let inner = rest.split(')').next().unwrap_or(rest);
		let stars = inner.bytes().take_while(|byte| *byte == b'*').count();
		let ident = inner[stars..].trim();
		return Declarator {
			ident: if ident.is_empty() { text } else { ident },
			ptr_depth: stars.max(1).min(usize::from(u8::MAX)) as u8,
			array_len: 1,
			is_func_ptr: true,
		};
	}

	let stars = text.bytes().take_while(|byte| *byte == b'*').count();
	let body = &text[stars..];
	let (ident, dims) = match body.find('[') {
		Some(at) => (body[..at].trim(), &body[at..]),
		None => (body.trim(), ""),
	};

	let array_len = dims
		.split('[')
		.filter_map(|dim| dim.split(']').next())
		.filter(|dim| !dim.is_empty())
		.map(|dim| dim.trim().parse::<usize>().unwrap_or(1))
		.fold(1_usize, usize::saturating_mul);

	Declarator {
		ident: if ident.is_empty() { text } else { ident },
		ptr_depth: stars.min(usize::from(u8::MAX)) as u8,
		array_len,
		is_func_ptr: false,
	}
}
