//! Procedural macros for switchyard
//!
//! This crate provides the `#[module]` attribute macro, which registers a module
//! factory under a registry path at compile time.

use darling::{FromMeta, ast::NestedMeta};
use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{FnArg, ItemFn, parse_macro_input};

/// Arguments for the `#[module]` attribute
#[derive(Debug, FromMeta)]
struct ModuleArgs {
    /// Registry path (e.g., "/api/users" or "/ACLs/admin")
    path: String,
}

/// Register a module factory with the switchyard module registry.
///
/// The annotated function is kept as-is and additionally submitted to the
/// registry through `inventory`, so `ModuleRegistry::register_all_auto` picks it
/// up without an explicit `register` call.
///
/// # Example
///
/// ```ignore
/// #[switchyard::module(path = "/api/users")]
/// fn users(ctx: &SharedContext) -> anyhow::Result<ModuleExport> {
///     let handlers = HandlerMap::new()
///         .on("GET", list_users)?
///         .on("GET /:id", get_user)?;
///     Ok(ModuleExport::Handlers(handlers))
/// }
/// ```
#[proc_macro_attribute]
pub fn module(attr: TokenStream, item: TokenStream) -> TokenStream {
    let attr_args = match NestedMeta::parse_meta_list(attr.into()) {
        Ok(v) => v,
        Err(e) => return TokenStream::from(e.to_compile_error()),
    };

    let args = match ModuleArgs::from_list(&attr_args) {
        Ok(v) => v,
        Err(e) => return TokenStream::from(e.write_errors()),
    };

    let input = parse_macro_input!(item as ItemFn);
    let expanded = impl_module(&args, &input);

    TokenStream::from(expanded)
}

fn impl_module(args: &ModuleArgs, input: &ItemFn) -> TokenStream2 {
    let path = &args.path;

    if !path.starts_with('/') {
        return syn::Error::new_spanned(
            &input.sig,
            format!("module path must start with '/', got: {}", path),
        )
        .to_compile_error();
    }

    if input.sig.asyncness.is_some() {
        return syn::Error::new_spanned(&input.sig, "module factories must not be async")
            .to_compile_error();
    }

    let typed_inputs = input
        .sig
        .inputs
        .iter()
        .filter(|arg| matches!(arg, FnArg::Typed(_)))
        .count();
    if typed_inputs != 1 || input.sig.inputs.len() != 1 {
        return syn::Error::new_spanned(
            &input.sig,
            "module factories take exactly one argument: &SharedContext",
        )
        .to_compile_error();
    }

    let fn_name = &input.sig.ident;

    quote! {
        #input

        ::switchyard::inventory::submit! {
            ::switchyard::modules::ModuleRegistration {
                path: #path,
                factory: #fn_name,
            }
        }
    }
}
