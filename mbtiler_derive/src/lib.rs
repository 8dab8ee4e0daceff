//! Procedural macros shared by the mbtiler crates.
//!
//! The only macro is [`macro@context`], which attaches a formatted `anyhow` context to every error a
//! function returns, so call sites do not have to repeat `.with_context(...)` on each `?`.

mod args;

use args::ContextArgs;
use proc_macro::TokenStream;
use proc_macro2::{Span, TokenStream as TokenStream2};
use quote::{ToTokens, quote};
use syn::{Ident, ItemFn, ReturnType, parse_macro_input};

/// Wraps the body of a function returning `anyhow::Result<T>` and adds a context message to its error.
///
/// ```ignore
/// #[context("reading level {level} from '{}'", self.name)]
/// fn read_level(&self, level: u8) -> Result<TileMap> { ... }
/// ```
///
/// A leading `move,` moves captured arguments into the wrapping closure.
#[proc_macro_attribute]
pub fn context(args: TokenStream, input: TokenStream) -> TokenStream {
	let args = parse_macro_input!(args as ContextArgs);
	let item = parse_macro_input!(input as ItemFn);
	expand(&args, item).into()
}

fn expand(args: &ContextArgs, mut item: ItemFn) -> TokenStream2 {
	let return_type = match &item.sig.output {
		ReturnType::Type(_, ty) => ty.clone(),
		ReturnType::Default => {
			return syn::Error::new_spanned(&item.sig, "#[context] requires a function returning Result").to_compile_error();
		}
	};
	if item.sig.asyncness.is_some() {
		return syn::Error::new_spanned(&item.sig, "#[context] does not support async functions").to_compile_error();
	}

	let ContextArgs { capture, message } = args;
	let body = &item.block;
	let err = Ident::new("err", Span::mixed_site());
	let once = Ident::new("once", Span::mixed_site());

	// The unit iterator is moved into the closure so it is always `FnOnce`.
	let wrapped = quote! {
		let #once = ::core::iter::empty::<()>();
		(#capture || -> #return_type {
			::core::mem::drop(#once);
			#body
		})()
		.map_err(|#err| #err.context(format!(#message)).into())
	};
	item.block.stmts = vec![syn::Stmt::Expr(syn::Expr::Verbatim(wrapped), None)];
	item.into_token_stream()
}

#[cfg(test)]
mod tests {
	use super::*;
	use syn::parse_str;

	fn expand_str(args: &str, item: &str) -> String {
		let args: ContextArgs = parse_str(args).unwrap();
		let item: ItemFn = parse_str(item).unwrap();
		expand(&args, item).to_string()
	}

	#[test]
	fn wraps_body_in_closure() {
		let out = expand_str(r#""loading {}", path"#, "fn load(path: &str) -> Result<u8> { Ok(1) }");
		assert!(out.starts_with("fn load (path : & str) -> Result < u8 >"));
		assert!(out.contains("(|| -> Result < u8 > {"));
		assert!(out.contains(r#"context (format ! ("loading {}" , path))"#));
	}

	#[test]
	fn move_is_forwarded() {
		let out = expand_str(r#"move, "x""#, "fn f(v: String) -> Result<()> { Ok(()) }");
		assert!(out.contains("(move || -> Result < () > {"));
	}

	#[test]
	fn missing_return_type() {
		let out = expand_str(r#""x""#, "fn f() {}");
		assert!(out.contains("compile_error"));
		assert!(out.contains("requires a function returning Result"));
	}

	#[test]
	fn async_is_rejected() {
		let out = expand_str(r#""x""#, "async fn f() -> Result<()> { Ok(()) }");
		assert!(out.contains("does not support async functions"));
	}
}
