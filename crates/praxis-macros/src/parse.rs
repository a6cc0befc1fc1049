//! Parsing for the `#[actions]` macro.
//!
//! Reads the macro arguments, the action markers on each method and the
//! slot annotations on each parameter. Every recognised attribute is removed
//! from the item so the re-emitted impl block compiles without them.

use proc_macro2::Span;
use syn::{
    parse::{Parse, ParseStream},
    punctuated::Punctuated,
    spanned::Spanned,
    Attribute, Expr, ExprLit, FnArg, ImplItemFn, Lit, LitStr, Meta, Path, Token,
    Type,
};

/// Arguments of `#[actions(...)]`.
#[derive(Debug)]
pub struct ActionsAttrs {
    /// Resource name of the router.
    pub resource: LitStr,
    /// Path of the dispatch crate in generated code.
    pub krate: Path,
}

impl Parse for ActionsAttrs {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let mut resource = None;
        let mut krate = None;

        let meta_list: Punctuated<Meta, Token![,]> = Punctuated::parse_terminated(input)?;

        for meta in meta_list {
            let Meta::NameValue(nv) = meta else {
                return Err(syn::Error::new(meta.span(), "expected name = value"));
            };
            let ident = nv
                .path
                .get_ident()
                .map(ToString::to_string)
                .ok_or_else(|| syn::Error::new(nv.path.span(), "expected identifier"))?;
            let value = string_literal(&nv.value)?;

            match ident.as_str() {
                "resource" => {
                    if value.value().trim().is_empty() {
                        return Err(syn::Error::new(value.span(), "resource must not be empty"));
                    }
                    resource = Some(value);
                }
                "crate" => krate = Some(value.parse::<Path>()?),
                _ => {
                    return Err(syn::Error::new(
                        nv.path.span(),
                        format!("unknown attribute: {ident}"),
                    ))
                }
            }
        }

        let resource = resource.ok_or_else(|| {
            syn::Error::new(Span::call_site(), "missing required attribute: resource")
        })?;
        let krate = krate.unwrap_or_else(|| syn::parse_quote!(::praxis_dispatch));

        Ok(Self { resource, krate })
    }
}

fn string_literal(expr: &Expr) -> syn::Result<LitStr> {
    match expr {
        Expr::Lit(ExprLit {
            lit: Lit::Str(s), ..
        }) => Ok(s.clone()),
        _ => Err(syn::Error::new(expr.span(), "expected string literal")),
    }
}

/// The verb and optional custom name a method is marked with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marker {
    /// Verb as written, or the alias' default verb.
    pub verb: String,
    /// Custom action name.
    pub name: Option<String>,
}

impl Marker {
    /// Reads a marker attribute, if `attr` is one.
    fn from_attr(attr: &Attribute) -> syn::Result<Option<Self>> {
        let alias = ["retrieve", "create", "update", "remove"]
            .into_iter()
            .zip(["GET", "POST", "PUT", "DELETE"])
            .find(|(alias, _)| attr.path().is_ident(alias));

        if let Some((_, verb)) = alias {
            let name = match &attr.meta {
                Meta::Path(_) => None,
                Meta::List(_) => marker_args(attr)?.1,
                Meta::NameValue(nv) => {
                    return Err(syn::Error::new(nv.span(), "expected `name = \"...\"` in parentheses"))
                }
            };
            return Ok(Some(Self {
                verb: verb.to_string(),
                name,
            }));
        }

        if attr.path().is_ident("action") {
            let (verb, name) = marker_args(attr)?;
            let verb = verb.ok_or_else(|| {
                syn::Error::new(attr.span(), "#[action] requires `verb = \"...\"`")
            })?;
            return Ok(Some(Self { verb, name }));
        }

        Ok(None)
    }
}

fn marker_args(attr: &Attribute) -> syn::Result<(Option<String>, Option<String>)> {
    let mut verb = None;
    let mut name = None;
    attr.parse_nested_meta(|meta| {
        let value: LitStr = meta.value()?.parse()?;
        if meta.path.is_ident("verb") {
            let raw = value.value();
            if raw.trim().is_empty() {
                return Err(meta.error("verb must not be empty"));
            }
            verb = Some(raw);
        } else if meta.path.is_ident("name") {
            name = Some(value.value());
        } else {
            return Err(meta.error("expected `verb` or `name`"));
        }
        Ok(())
    })?;
    Ok((verb, name))
}

/// What a parameter is bound from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotKind {
    /// `#[id]`
    Identifier,
    /// `#[parent_id]`
    ParentIdentifier,
    /// `#[body]`
    Body,
    /// Anything unannotated is supplied by a capability provider.
    Capability,
}

impl SlotKind {
    fn from_attr(attr: &Attribute) -> Option<Self> {
        let path = attr.path();
        if path.is_ident("id") {
            Some(Self::Identifier)
        } else if path.is_ident("parent_id") {
            Some(Self::ParentIdentifier)
        } else if path.is_ident("body") {
            Some(Self::Body)
        } else {
            None
        }
    }
}

/// A typed parameter of an action method.
#[derive(Debug)]
pub struct ActionParam {
    /// Parameter name used in the descriptor.
    pub name: String,
    /// Declared type.
    pub ty: Type,
    /// Slot kind.
    pub kind: SlotKind,
}

/// How the method is called.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Receiver {
    /// `&self`
    Shared,
    /// No receiver; called as `Self::method`.
    Associated,
}

/// A method of the impl block, with its marker and parameters.
#[derive(Debug)]
pub struct ActionMethod {
    /// Marker, if the method is an action.
    pub marker: Option<Marker>,
    /// Typed parameters in declaration order.
    pub params: Vec<ActionParam>,
    /// Receiver kind.
    pub receiver: Receiver,
}

impl ActionMethod {
    /// Parses a method and strips the action attributes from it.
    ///
    /// Methods without a marker are still described so that introspection
    /// can count them as skipped; their signatures are not inspected.
    pub fn parse(item: &mut ImplItemFn) -> syn::Result<Self> {
        let mut marker = None;
        let mut kept = Vec::with_capacity(item.attrs.len());
        for attr in item.attrs.drain(..) {
            match Marker::from_attr(&attr)? {
                Some(found) if marker.is_some() => {
                    return Err(syn::Error::new(
                        attr.span(),
                        format!("duplicate action marker `{}`", found.verb),
                    ))
                }
                Some(found) => marker = Some(found),
                None => kept.push(attr),
            }
        }
        item.attrs = kept;

        let mut params = Vec::new();
        let mut receiver = Receiver::Associated;
        for input in &mut item.sig.inputs {
            match input {
                FnArg::Receiver(recv) => {
                    let shared = recv.reference.is_some() && recv.mutability.is_none();
                    if marker.is_some() && !shared {
                        return Err(syn::Error::new(
                            recv.span(),
                            "action methods must take `&self`",
                        ));
                    }
                    receiver = Receiver::Shared;
                }
                FnArg::Typed(pat_type) => {
                    let mut kind = None;
                    let mut kept = Vec::with_capacity(pat_type.attrs.len());
                    for attr in pat_type.attrs.drain(..) {
                        match SlotKind::from_attr(&attr) {
                            Some(_) if kind.is_some() => {
                                return Err(syn::Error::new(
                                    attr.span(),
                                    "a parameter takes at most one of #[id], #[parent_id], #[body]",
                                ))
                            }
                            Some(found) => kind = Some(found),
                            None => kept.push(attr),
                        }
                    }
                    pat_type.attrs = kept;

                    if marker.is_none() {
                        continue;
                    }
                    if matches!(*pat_type.ty, Type::Reference(_)) {
                        return Err(syn::Error::new(
                            pat_type.ty.span(),
                            "action parameters must be owned types",
                        ));
                    }
                    params.push(ActionParam {
                        name: param_name(&pat_type.pat, params.len()),
                        ty: (*pat_type.ty).clone(),
                        kind: kind.unwrap_or(SlotKind::Capability),
                    });
                }
            }
        }

        Ok(Self {
            marker,
            params,
            receiver,
        })
    }
}

fn param_name(pat: &syn::Pat, position: usize) -> String {
    match pat {
        syn::Pat::Ident(ident) => ident.ident.to_string(),
        syn::Pat::TupleStruct(ts) => match ts.elems.first() {
            Some(syn::Pat::Ident(inner)) => inner.ident.to_string(),
            _ => format!("arg{position}"),
        },
        _ => format!("arg{position}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    #[test]
    fn test_parse_actions_attrs() {
        let attrs: ActionsAttrs = parse_quote!(resource = "widgets");
        assert_eq!(attrs.resource.value(), "widgets");
        let expected: Path = parse_quote!(::praxis_dispatch);
        assert_eq!(attrs.krate, expected);
    }

    #[test]
    fn test_parse_actions_attrs_with_crate() {
        let attrs: ActionsAttrs = parse_quote!(resource = "widgets", crate = "::praxis::dispatch");
        let expected: Path = parse_quote!(::praxis::dispatch);
        assert_eq!(attrs.krate, expected);
    }

    #[test]
    fn test_missing_resource_rejected() {
        let result: syn::Result<ActionsAttrs> = syn::parse2(quote::quote!(crate = "x"));
        assert!(result.is_err());
    }

    #[test]
    fn test_alias_markers() {
        let mut item: ImplItemFn = parse_quote! {
            #[retrieve(name = "search")]
            async fn search(&self) -> Vec<u8> { todo!() }
        };
        let method = ActionMethod::parse(&mut item).unwrap();
        assert_eq!(
            method.marker,
            Some(Marker {
                verb: "GET".into(),
                name: Some("search".into())
            })
        );
        assert!(item.attrs.is_empty());
    }

    #[test]
    fn test_action_marker_requires_verb() {
        let mut item: ImplItemFn = parse_quote! {
            #[action(name = "greet")]
            fn greet(&self) {}
        };
        assert!(ActionMethod::parse(&mut item).is_err());
    }

    #[test]
    fn test_duplicate_markers_rejected() {
        let mut item: ImplItemFn = parse_quote! {
            #[retrieve]
            #[create]
            fn both(&self) {}
        };
        assert!(ActionMethod::parse(&mut item).is_err());
    }

    #[test]
    fn test_param_kinds_and_stripping() {
        let mut item: ImplItemFn = parse_quote! {
            #[update]
            async fn rename(
                &self,
                #[parent_id] account: AccountId,
                #[id] id: u64,
                #[body] Json(body): Json<Rename>,
                clock: Clock,
            ) -> Result<(), Error> { todo!() }
        };
        let method = ActionMethod::parse(&mut item).unwrap();
        let kinds: Vec<_> = method.params.iter().map(|p| p.kind).collect();
        assert_eq!(
            kinds,
            vec![
                SlotKind::ParentIdentifier,
                SlotKind::Identifier,
                SlotKind::Body,
                SlotKind::Capability
            ]
        );
        assert_eq!(method.params[2].name, "body");
        assert_eq!(method.receiver, Receiver::Shared);

        for input in &item.sig.inputs {
            if let FnArg::Typed(pat_type) = input {
                assert!(pat_type.attrs.is_empty());
            }
        }
    }

    #[test]
    fn test_borrowed_params_rejected() {
        let mut item: ImplItemFn = parse_quote! {
            #[retrieve]
            fn get(&self, #[id] id: &str) {}
        };
        assert!(ActionMethod::parse(&mut item).is_err());
    }

    #[test]
    fn test_unmarked_methods_are_left_alone() {
        let mut item: ImplItemFn = parse_quote! {
            fn helper(&mut self, value: &str) -> usize { value.len() }
        };
        let method = ActionMethod::parse(&mut item).unwrap();
        assert!(method.marker.is_none());
        assert!(method.params.is_empty());
    }
}
