use proc_macro2::{Span, TokenStream as TokenStream2};
use syn::{
	Error, Token,
	parse::{Parse, ParseStream, Result},
};

/// Arguments of `#[context(...)]`: an optional leading `move,` followed by `format!` arguments.
#[derive(Debug)]
pub struct ContextArgs {
	pub capture: Option<Token![move]>,
	pub message: TokenStream2,
}

impl Parse for ContextArgs {
	fn parse(input: ParseStream<'_>) -> Result<Self> {
		let capture = if input.peek(Token![move]) {
			let capture = input.parse()?;
			input.parse::<Token![,]>()?;
			Some(capture)
		} else {
			None
		};
		let message: TokenStream2 = input.parse()?;
		if message.is_empty() {
			return Err(Error::new(Span::call_site(), "expected a context message"));
		}
		Ok(Self { capture, message })
	}
}

#[cfg(test)]
mod tests {
	use super::ContextArgs;
	use syn::parse_str;

	#[test]
	fn plain_message() {
		let args: ContextArgs = parse_str(r#""reading tile {}", x"#).unwrap();
		assert!(args.capture.is_none());
		assert_eq!(args.message.to_string(), r#""reading tile {}" , x"#);
	}

	#[test]
	fn leading_move() {
		let args: ContextArgs = parse_str(r#"move, "level {level}""#).unwrap();
		assert!(args.capture.is_some());
		assert_eq!(args.message.to_string(), r#""level {level}""#);
	}

	#[test]
	fn move_needs_comma() {
		let err = parse_str::<ContextArgs>(r#"move "x""#).unwrap_err();
		assert!(err.to_string().contains(','), "unexpected error: {err}");
	}

	#[test]
	fn empty_message_is_rejected() {
		for input in ["", "move,"] {
			let err = parse_str::<ContextArgs>(input).unwrap_err();
			assert_eq!(err.to_string(), "expected a context message");
		}
	}
}
