use fxhash::FxHashSet;
use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::{Attribute, Data, DeriveInput, Field, Fields, Ident, Result, Type};

const CONTEXT_TYPES: [&str; 2] =
    ["Option<Cow<'static,str>>", "Option<std::borrow::Cow<'static,str>>"];

struct ErrorVariant {
    ident: Ident,
    source: Option<(Ident, Type)>,
    has_context: bool,
    cfgs: Vec<Attribute>,
}

impl ErrorVariant {
    fn parse(variant: &syn::Variant) -> Result<Self> {
        let Fields::Named(fields) = &variant.fields else {
            return Err(syn::Error::new_spanned(
                variant,
                "accounts_error variants must use named fields",
            ));
        };

        let mut has_context = false;
        let mut source = None;
        for field in &fields.named {
            let Some(ident) = &field.ident else { continue };
            if ident == "context" {
                if !is_context_type(&field.ty) {
                    return Err(syn::Error::new_spanned(
                        &field.ty,
                        "context field must be Option<Cow<'static, str>>",
                    ));
                }
                has_context = true;
            } else if is_source(ident, field) && source.is_none() {
                source = Some((ident.clone(), field.ty.clone()));
            }
        }

        if source.is_some() && !has_context {
            return Err(syn::Error::new_spanned(
                &variant.ident,
                "variants wrapping a source need `context: Option<Cow<'static, str>>`",
            ));
        }

        Ok(Self {
            ident: variant.ident.clone(),
            source,
            has_context,
            cfgs: variant.attrs.iter().filter(|a| a.path().is_ident("cfg")).cloned().collect(),
        })
    }

    fn is_internal(&self) -> bool {
        self.ident == "Internal"
    }
}

pub fn expand(input: DeriveInput) -> Result<TokenStream> {
    let Data::Enum(data) = &input.data else {
        return Err(syn::Error::new_spanned(&input.ident, "accounts_error expects an enum"));
    };
    let variants = data.variants.iter().map(ErrorVariant::parse).collect::<Result<Vec<_>>>()?;

    let name = &input.ident;
    let ext = format_ident!("{name}Ext");

    let derives = missing_derives(&input.attrs);
    let context_arms = variants.iter().filter(|v| v.has_context).map(|v| {
        let (ident, cfgs) = (&v.ident, &v.cfgs);
        quote! { #(#cfgs)* #name::#ident { context, .. } => *context = Some(value.into()), }
    });
    let source_impls = variants.iter().filter(|v| !v.is_internal()).filter_map(|v| {
        let (field, ty) = v.source.as_ref()?;
        let (ident, cfgs) = (&v.ident, &v.cfgs);
        Some(quote! {
            #(#cfgs)*
            #[automatically_derived]
            impl From<#ty> for #name {
                #[inline]
                fn from(#field: #ty) -> Self {
                    Self::#ident { #field, context: None }
                }
            }

            #(#cfgs)*
            impl<T> #ext<T> for ::std::result::Result<T, #ty> {
                #[inline]
                fn context(
                    self,
                    value: impl Into<::std::borrow::Cow<'static, str>>,
                ) -> ::std::result::Result<T, #name> {
                    self.map_err(|#field| #name::#ident { #field, context: Some(value.into()) })
                }
            }
        })
    });
    let internal_impls = variants.iter().find(|v| v.is_internal()).map(|v| {
        let cfgs = &v.cfgs;
        quote! {
            #(#cfgs)*
            impl From<&'static str> for #name {
                #[inline]
                fn from(message: &'static str) -> Self {
                    Self::Internal { message: ::std::borrow::Cow::Borrowed(message), context: None }
                }
            }

            #(#cfgs)*
            impl From<String> for #name {
                #[inline]
                fn from(message: String) -> Self {
                    Self::Internal { message: ::std::borrow::Cow::Owned(message), context: None }
                }
            }
        }
    });

    Ok(quote! {
        #derives
        #input

        /// Attaches a human readable context to an error.
        pub trait #ext<T> {
            fn context(
                self,
                value: impl Into<::std::borrow::Cow<'static, str>>,
            ) -> ::std::result::Result<T, #name>;
        }

        #[automatically_derived]
        impl<T> #ext<T> for ::std::result::Result<T, #name> {
            #[inline]
            fn context(self, value: impl Into<::std::borrow::Cow<'static, str>>) -> Self {
                self.map_err(|mut err| {
                    #[allow(unreachable_patterns)]
                    match &mut err {
                        #(#context_arms)*
                        _ => {}
                    }
                    err
                })
            }
        }

        #(#source_impls)*
        #internal_impls

        #[allow(dead_code)]
        fn format_context(
            context: &Option<::std::borrow::Cow<'static, str>>,
        ) -> ::std::borrow::Cow<'static, str> {
            context.as_ref().map_or(::std::borrow::Cow::Borrowed(""), |c| {
                ::std::borrow::Cow::Owned(format!(" ({c})"))
            })
        }
    })
}

fn missing_derives(attrs: &[Attribute]) -> TokenStream {
    let mut present = FxHashSet::default();
    for attr in attrs.iter().filter(|a| a.path().is_ident("derive")) {
        let _ = attr.parse_nested_meta(|meta| {
            if let Some(segment) = meta.path.segments.last() {
                present.insert(segment.ident.to_string());
            }
            Ok(())
        });
    }

    let mut derives = Vec::new();
    if !present.contains("Debug") {
        derives.push(quote! { Debug });
    }
    if !present.contains("Error") {
        derives.push(quote! { ::thiserror::Error });
    }
    if derives.is_empty() { quote! {} } else { quote! { #[derive(#(#derives),*)] } }
}

fn is_source(ident: &Ident, field: &Field) -> bool {
    ident == "source"
        || field.attrs.iter().any(|a| a.path().is_ident("source") || a.path().is_ident("from"))
}

fn is_context_type(ty: &Type) -> bool {
    let rendered: String = quote!(#ty).to_string().chars().filter(|c| !c.is_whitespace()).collect();
    CONTEXT_TYPES.contains(&rendered.as_str())
}
