//! `#[derive(BindParams)]` for brrtbind parameter structs.
//!
//! ```rust,ignore
//! #[derive(Default, BindParams)]
//! #[bind(success = "201")]
//! struct CreatePost {
//!     #[bind(path = "user_id")]
//!     user_id: u64,
//!     #[bind(query = "draft")]
//!     draft: Option<bool>,
//!     #[bind(body)]
//!     post: NewPost,
//! }
//! ```
//!
//! Expands to a `BindParams::describe` that registers one binder per annotated field, in
//! declaration order. Fields without `#[bind]` keep their `Default` value. Body fields
//! whose concrete type implements `Validate` get validated after decoding.

use proc_macro::TokenStream;
use proc_macro2::{Span, TokenStream as TokenStream2};
use quote::quote;
use syn::ext::IdentExt;
use syn::meta::ParseNestedMeta;
use syn::{parse_macro_input, Data, DeriveInput, Fields, Lit, LitStr, Result as SynResult};

enum Source {
    Path(LitStr),
    Query(LitStr),
    Body,
}

#[derive(Default)]
struct FieldBind {
    source: Option<Source>,
    validate: Option<syn::Path>,
    success: Option<String>,
}

fn lit_value(meta: &ParseNestedMeta<'_>) -> SynResult<LitStr> {
    meta.value()?.parse()
}

/// Success codes may be written as `"201"` or `201`; the value is checked at
/// registration, not here.
fn success_value(meta: &ParseNestedMeta<'_>) -> SynResult<String> {
    match meta.value()?.parse::<Lit>()? {
        Lit::Str(s) => Ok(s.value()),
        Lit::Int(i) => Ok(i.base10_digits().to_string()),
        other => Err(syn::Error::new_spanned(other, "expected a status code literal")),
    }
}

fn set_source(bind: &mut FieldBind, meta: &ParseNestedMeta<'_>, source: Source) -> SynResult<()> {
    if bind.source.is_some() {
        return Err(syn::Error::new_spanned(
            &meta.path,
            "a field can only be bound from one source",
        ));
    }
    bind.source = Some(source);
    Ok(())
}

fn body_format(meta: &ParseNestedMeta<'_>) -> SynResult<()> {
    if meta.input.peek(syn::Token![=]) {
        let format = lit_value(meta)?;
        if format.value() != "json" {
            return Err(syn::Error::new_spanned(
                format,
                "unsupported body format, only \"json\" is supported",
            ));
        }
    }
    Ok(())
}

fn parse_field(field: &syn::Field) -> SynResult<FieldBind> {
    let mut bind = FieldBind::default();
    for attr in field.attrs.iter().filter(|a| a.path().is_ident("bind")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("path") {
                let key = lit_value(&meta)?;
                set_source(&mut bind, &meta, Source::Path(key))
            } else if meta.path.is_ident("query") {
                let key = lit_value(&meta)?;
                set_source(&mut bind, &meta, Source::Query(key))
            } else if meta.path.is_ident("body") || meta.path.is_ident("request") {
                body_format(&meta)?;
                set_source(&mut bind, &meta, Source::Body)
            } else if meta.path.is_ident("validate") {
                bind.validate = Some(meta.path.clone());
                Ok(())
            } else if meta.path.is_ident("success") {
                bind.success = Some(success_value(&meta)?);
                Ok(())
            } else {
                Err(syn::Error::new_spanned(
                    &meta.path,
                    "unknown bind option, expected `path`, `query`, `body`, `request`, `validate` or `success`",
                ))
            }
        })?;
    }

    if let Some(path) = &bind.validate {
        if !matches!(bind.source, Some(Source::Body)) {
            return Err(syn::Error::new_spanned(
                path,
                "`validate` only applies to body bindings",
            ));
        }
    }
    Ok(bind)
}

fn parse_struct_success(input: &DeriveInput) -> SynResult<Vec<String>> {
    let mut codes = Vec::new();
    for attr in input.attrs.iter().filter(|a| a.path().is_ident("bind")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("success") {
                codes.push(success_value(&meta)?);
                Ok(())
            } else {
                Err(syn::Error::new_spanned(
                    &meta.path,
                    "only `success` is allowed on the struct",
                ))
            }
        })?;
    }
    Ok(codes)
}

fn expand(input: &DeriveInput) -> SynResult<TokenStream2> {
    let name = &input.ident;
    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => &named.named,
            Fields::Unit => {
                return Err(syn::Error::new_spanned(
                    name,
                    "BindParams needs a struct with named fields; use `()` for handlers without parameters",
                ))
            }
            Fields::Unnamed(_) => {
                return Err(syn::Error::new_spanned(
                    name,
                    "BindParams can only be derived for structs with named fields",
                ))
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                name,
                "BindParams can only be derived for structs",
            ))
        }
    };

    let mut steps = Vec::new();
    for code in parse_struct_success(input)? {
        steps.push(quote! { plan.success(#code); });
    }

    for field in fields {
        let Some(ident) = &field.ident else {
            return Err(syn::Error::new_spanned(field, "all fields must have names"));
        };
        let field_name = LitStr::new(&ident.unraw().to_string(), Span::call_site());
        let bind = parse_field(field)?;

        let slot = quote! { |p: &mut Self| &mut p.#ident };
        match bind.source {
            Some(Source::Path(key)) => steps.push(quote! { plan.path(#key, #field_name, #slot); }),
            Some(Source::Query(key)) => steps.push(quote! { plan.query(#key, #field_name, #slot); }),
            Some(Source::Body) if bind.validate.is_some() => {
                steps.push(quote! { plan.validated_body(#field_name, #slot); })
            }
            Some(Source::Body) => {
                let ty = &field.ty;
                steps.push(quote! {
                    plan.body_with(#field_name, #slot, {
                        #[allow(unused_imports)]
                        use ::brrtbind::bind::__private::{ViaNothing as _, ViaValidate as _};
                        (&::brrtbind::bind::__private::ValidatorOf::<#ty>::new()).validator()
                    });
                });
            }
            None => {}
        }
        if let Some(code) = bind.success {
            steps.push(quote! { plan.success(#code); });
        }
    }

    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    Ok(quote! {
        impl #impl_generics ::brrtbind::bind::BindParams for #name #ty_generics #where_clause {
            fn describe(plan: &mut ::brrtbind::bind::PlanBuilder<Self>) {
                #(#steps)*
            }
        }
    })
}

/// Derive `brrtbind::bind::BindParams`.
///
/// Field options (inside `#[bind(...)]`):
/// - `path = "name"` / `query = "name"` - bind from a path segment or query parameter
/// - `body`, `body = "json"`, `request = "json"` - decode the whole JSON body
/// - `validate` - require the body type to implement `Validate` (it runs either way)
/// - `success = "201"` - status written on success (also allowed on the struct)
#[proc_macro_derive(BindParams, attributes(bind))]
pub fn derive_bind_params(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}
