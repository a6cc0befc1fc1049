//! Expansion of the `#[actions]` attribute.
//!
//! The impl block is re-emitted with the action attributes stripped, followed
//! by an `ActionRouter` impl whose `actions` returns one descriptor per
//! method. Marked methods get a parameter list and an invoker that reads
//! each slot from `Arguments` and calls the method.

use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::{spanned::Spanned, ImplItem, ItemImpl, Path};

use crate::parse::{ActionMethod, ActionParam, ActionsAttrs, Marker, Receiver, SlotKind};

/// Expands `#[actions(resource = "...")]` on an inherent impl block.
pub fn expand_actions(attr: TokenStream, item: TokenStream) -> syn::Result<TokenStream> {
    let attrs: ActionsAttrs = syn::parse2(attr)?;
    let mut item: ItemImpl = syn::parse2(item)?;

    if let Some((_, path, _)) = &item.trait_ {
        return Err(syn::Error::new(
            path.span(),
            "#[actions] goes on an inherent impl block",
        ));
    }

    let mut descriptors = Vec::new();
    for impl_item in &mut item.items {
        if let ImplItem::Fn(method) = impl_item {
            let ident = method.sig.ident.clone();
            let is_async = method.sig.asyncness.is_some();
            let parsed = ActionMethod::parse(method)?;
            descriptors.push(generate_descriptor(
                &attrs.krate,
                &ident,
                is_async,
                &parsed,
            ));
        }
    }

    let krate = &attrs.krate;
    let resource = &attrs.resource;
    let self_ty = &item.self_ty;
    let (impl_generics, _, where_clause) = item.generics.split_for_impl();

    Ok(quote! {
        #item

        impl #impl_generics #krate::ActionRouter for #self_ty #where_clause {
            fn resource(&self) -> &str {
                #resource
            }

            fn actions(
                self: ::std::sync::Arc<Self>,
            ) -> ::std::vec::Vec<#krate::ActionDescriptor> {
                ::std::vec![#(#descriptors),*]
            }
        }
    })
}

/// Generates the descriptor expression for one method.
fn generate_descriptor(
    krate: &Path,
    ident: &syn::Ident,
    is_async: bool,
    method: &ActionMethod,
) -> TokenStream {
    let method_name = ident.to_string();

    let Some(marker) = &method.marker else {
        return quote! {
            #krate::ActionDescriptor::new(
                #method_name,
                ::core::option::Option::<#krate::ActionMarker>::None,
            )
        };
    };

    let marker = marker_expr(krate, marker);
    let params = method.params.iter().map(|param| param_expr(krate, param));
    let (bindings, call_args) = generate_bindings(&method.params);

    let call = match method.receiver {
        Receiver::Shared => quote! { __router.#ident(#(#call_args),*) },
        Receiver::Associated => quote! { Self::#ident(#(#call_args),*) },
    };
    let call = if is_async {
        quote! { #call.await }
    } else {
        call
    };
    let finish = quote! {
        use #krate::__private::{FallibleReturn as _, PlainReturn as _};
        (&#krate::__private::Returned::new(__output)).into_action_result()
    };
    let capture = match method.receiver {
        Receiver::Shared => quote! { let __router = ::std::sync::Arc::clone(&__router); },
        Receiver::Associated => quote! {},
    };

    quote! {
        {
            let __router = ::std::sync::Arc::clone(&self);
            #krate::ActionDescriptor::new(#method_name, #marker)
                #(.param(#params))*
                .invoker(move |__args: #krate::Arguments| {
                    #capture
                    async move {
                        #(#bindings)*
                        let __output = #call;
                        #finish
                    }
                })
        }
    }
}

fn marker_expr(krate: &Path, marker: &Marker) -> TokenStream {
    let verb = &marker.verb;
    match &marker.name {
        Some(name) => quote! { #krate::ActionMarker::new(#verb).named(#name) },
        None => quote! { #krate::ActionMarker::new(#verb) },
    }
}

fn param_expr(krate: &Path, param: &ActionParam) -> TokenStream {
    let name = &param.name;
    let ty = &param.ty;
    match param.kind {
        SlotKind::Identifier => quote! { #krate::ParamDescriptor::id(#name) },
        SlotKind::ParentIdentifier => quote! { #krate::ParamDescriptor::parent_id::<#ty>(#name) },
        SlotKind::Body => quote! { #krate::ParamDescriptor::body(#name) },
        SlotKind::Capability => quote! { #krate::ParamDescriptor::capability::<#ty>(#name) },
    }
}

/// Generates one `let` per slot and the matching call arguments.
fn generate_bindings(params: &[ActionParam]) -> (Vec<TokenStream>, Vec<syn::Ident>) {
    let mut bindings = Vec::with_capacity(params.len());
    let mut call_args = Vec::with_capacity(params.len());

    for (slot, param) in params.iter().enumerate() {
        let var = format_ident!("__arg{}", slot);
        let ty = &param.ty;
        let accessor = match param.kind {
            SlotKind::Identifier => quote! { identifier },
            SlotKind::ParentIdentifier => quote! { parent_identifier },
            SlotKind::Body => quote! { body },
            SlotKind::Capability => quote! { capability },
        };
        bindings.push(quote! {
            let #var: #ty = __args.#accessor::<#ty>(#slot)?;
        });
        call_args.push(var);
    }

    (bindings, call_args)
}
