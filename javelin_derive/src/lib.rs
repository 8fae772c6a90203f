extern crate proc_macro;

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::{
    parse_macro_input, Error, FnArg, GenericParam, Ident, ItemTrait, Pat, PathArguments,
    ReturnType, TraitItem, Type,
};

/// Marks a trait as a remote service contract.
///
/// Emits, next to the trait itself: a `<Trait>Contract` marker type, a
/// `ServiceContract` implementation describing the trait's method table
/// (tokens in declaration order), and a forwarding implementation of the
/// trait for `Proxy<<Trait>Contract>` that packs every call into an
/// invocation record and hands it to the dispatcher entry point matching
/// the method's declared return shape:
///
/// - `fn m(&self, ...) -> Result<T>` — synchronous value call
/// - `async fn m(&self, ...) -> Result<()>` — asynchronous, no value
/// - `async fn m(&self, ...) -> Result<T>` — asynchronous, typed value
///
/// Generic methods carry their own bounds; type parameters need at least
/// `Send + 'static` so their identity can travel with the record.
///
/// The expansion refers to `Proxy`, `ServiceContract`, descriptor types and
/// `async_trait` by bare name; contract modules import them from the
/// facade crate (`use javelin::*`).
#[proc_macro_attribute]
pub fn service_contract(_attr: TokenStream, input: TokenStream) -> TokenStream {
    let item = parse_macro_input!(input as ItemTrait);
    match expand(&item) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

enum Shape {
    Value,
    AsyncUnit,
    AsyncTyped,
}

struct ContractMethod<'a> {
    sig: &'a syn::Signature,
    token: u32,
    shape: Shape,
    ok: Type,
    arg_names: Vec<&'a Ident>,
    type_params: Vec<&'a Ident>,
}

fn expand(item: &ItemTrait) -> syn::Result<TokenStream2> {
    if !item.generics.params.is_empty() {
        return Err(Error::new_spanned(
            &item.generics,
            "service contract traits cannot take generic parameters",
        ));
    }

    let mut methods: Vec<ContractMethod> = Vec::new();
    let mut has_async = false;
    for trait_item in &item.items {
        let method = match trait_item {
            TraitItem::Method(method) => method,
            other => {
                return Err(Error::new_spanned(
                    other,
                    "service contracts may only declare methods",
                ))
            }
        };
        if method.default.is_some() {
            return Err(Error::new_spanned(
                method,
                "service contract methods cannot have default bodies",
            ));
        }
        let sig = &method.sig;
        match sig.inputs.first() {
            Some(FnArg::Receiver(receiver))
                if receiver.reference.is_some() && receiver.mutability.is_none() => {}
            _ => {
                return Err(Error::new_spanned(
                    sig,
                    "service contract methods take `&self`",
                ))
            }
        }

        let mut arg_names = Vec::new();
        for input in sig.inputs.iter().skip(1) {
            let arg = match input {
                FnArg::Typed(arg) => arg,
                FnArg::Receiver(_) => {
                    return Err(Error::new_spanned(input, "unexpected receiver"))
                }
            };
            match &*arg.pat {
                Pat::Ident(pat) => arg_names.push(&pat.ident),
                _ => {
                    return Err(Error::new_spanned(
                        arg,
                        "service contract arguments must be named",
                    ))
                }
            }
        }

        let mut type_params = Vec::new();
        for param in &sig.generics.params {
            match param {
                GenericParam::Type(param) => type_params.push(&param.ident),
                other => {
                    return Err(Error::new_spanned(
                        other,
                        "only type parameters are supported on contract methods",
                    ))
                }
            }
        }

        let ok = result_ok_type(&sig.output)?;
        let is_async = sig.asyncness.is_some();
        has_async |= is_async;
        let shape = if is_async {
            if is_unit(&ok) {
                Shape::AsyncUnit
            } else {
                Shape::AsyncTyped
            }
        } else {
            Shape::Value
        };

        methods.push(ContractMethod {
            sig,
            token: methods.len() as u32,
            shape,
            ok,
            arg_names,
            type_params,
        });
    }

    let trait_ident = &item.ident;
    let vis = &item.vis;
    let marker = format_ident!("{}Contract", trait_ident);
    let trait_name = trait_ident.to_string();

    let descriptors = methods.iter().map(|m| {
        let token = m.token;
        let name = m.sig.ident.to_string();
        let arity = m.arg_names.len();
        let generic_arity = m.type_params.len();
        let shape = match m.shape {
            Shape::Value => quote!(ReturnShape::Value),
            Shape::AsyncUnit => quote!(ReturnShape::AsyncUnit),
            Shape::AsyncTyped => quote!(ReturnShape::AsyncTyped),
        };
        quote! {
            MethodDescriptor {
                token: MethodToken(#token),
                name: #name,
                arity: #arity,
                generic_arity: #generic_arity,
                shape: #shape,
            }
        }
    });

    let forwards = methods.iter().map(|m| {
        let sig = m.sig;
        let token = m.token;
        let ok = &m.ok;
        let tags = m.type_params.iter().map(|p| quote!(TypeTag::of::<#p>()));
        let packed = m.arg_names.iter().map(|a| quote!(Box::new(#a) as ArgValue));
        let body = match m.shape {
            Shape::Value => quote! {
                self.invoke_value::<#ok>(MethodToken(#token), vec![#(#tags),*], vec![#(#packed),*])
            },
            Shape::AsyncUnit => quote! {
                self.invoke_async(MethodToken(#token), vec![#(#tags),*], vec![#(#packed),*]).await
            },
            Shape::AsyncTyped => quote! {
                self.invoke_async_typed::<#ok>(MethodToken(#token), vec![#(#tags),*], vec![#(#packed),*]).await
            },
        };
        quote! { #sig { #body } }
    });

    let async_attr = if has_async {
        quote!(#[async_trait])
    } else {
        quote!()
    };

    Ok(quote! {
        #async_attr
        #item

        #vis struct #marker;

        impl ServiceContract for #marker {
            fn descriptor() -> ContractDescriptor {
                ContractDescriptor {
                    id: ::std::any::TypeId::of::<#marker>(),
                    name: #trait_name,
                    shape: ContractShape::Interface,
                    methods: vec![#(#descriptors),*],
                    extends: vec![],
                }
            }
        }

        #async_attr
        impl #trait_ident for Proxy<#marker> {
            #(#forwards)*
        }
    })
}

/// every contract method must return `Result<T>`; pulls out `T`.
fn result_ok_type(output: &ReturnType) -> syn::Result<Type> {
    let ty = match output {
        ReturnType::Type(_, ty) => &**ty,
        ReturnType::Default => {
            return Err(Error::new_spanned(
                output,
                "service contract methods must return `Result<T>`",
            ))
        }
    };
    if let Type::Path(path) = ty {
        if let Some(segment) = path.path.segments.last() {
            if segment.ident == "Result" {
                if let PathArguments::AngleBracketed(args) = &segment.arguments {
                    if let Some(syn::GenericArgument::Type(ok)) = args.args.first() {
                        return Ok(ok.clone());
                    }
                }
            }
        }
    }
    Err(Error::new_spanned(
        ty,
        "service contract methods must return `Result<T>`",
    ))
}

fn is_unit(ty: &Type) -> bool {
    match ty {
        Type::Tuple(tuple) => tuple.elems.is_empty(),
        _ => false,
    }
}
