use proc_macro::TokenStream;
use quote::{quote, quote_spanned};
use syn::{parse_macro_input, spanned::Spanned, Data, DeriveInput, Fields, Index};

/// Derives `crate::positions::ClearSpans` by clearing every field in turn.
///
/// Spans become `Span::NONE`; ids, list references and symbols are left alone
/// by their own (no-op) impls.
#[proc_macro_derive(ClearSpans)]
pub fn derive_clear_spans(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let name = &input.ident;
    let span = input.span();

    let body = match generate_clear_body(&input.data) {
        Ok(body) => body,
        Err(err) => return err.into_compile_error().into(),
    };

    let expanded = quote_spanned! {span =>
        impl crate::positions::ClearSpans for #name {
            #[inline]
            fn clear_spans(&mut self) {
                #body
            }
        }
    };

    expanded.into()
}

fn generate_clear_body(data: &Data) -> syn::Result<proc_macro2::TokenStream> {
    match data {
        Data::Struct(data_struct) => Ok(generate_fields_clear(&data_struct.fields)),
        Data::Enum(data_enum) => {
            let arms = data_enum
                .variants
                .iter()
                .map(|variant| generate_variant_arm(&variant.ident, &variant.fields))
                .collect::<Vec<_>>();

            Ok(quote! {
                match self {
                    #(#arms)*
                }
            })
        }
        Data::Union(u) => Err(syn::Error::new_spanned(
            u.union_token,
            "ClearSpans cannot be derived for unions",
        )),
    }
}

fn generate_fields_clear(fields: &Fields) -> proc_macro2::TokenStream {
    let calls = fields.iter().enumerate().map(|(i, field)| {
        let access = match &field.ident {
            Some(ident) => quote! { &mut self.#ident },
            None => {
                let index = Index::from(i);
                quote! { &mut self.#index }
            }
        };
        quote! { crate::positions::ClearSpans::clear_spans(#access); }
    });

    quote! { #(#calls)* }
}

fn generate_variant_arm(variant_name: &syn::Ident, fields: &Fields) -> proc_macro2::TokenStream {
    match fields {
        Fields::Unit => quote! { Self::#variant_name => {} },
        Fields::Named(named) => {
            let bindings: Vec<_> = named.named.iter().filter_map(|f| f.ident.as_ref()).collect();
            quote! {
                Self::#variant_name { #(#bindings),* } => {
                    #(crate::positions::ClearSpans::clear_spans(#bindings);)*
                }
            }
        }
        Fields::Unnamed(unnamed) => {
            let bindings: Vec<_> = (0..unnamed.unnamed.len())
                .map(|i| quote::format_ident!("f{}", i))
                .collect();
            quote! {
                Self::#variant_name(#(#bindings),*) => {
                    #(crate::positions::ClearSpans::clear_spans(#bindings);)*
                }
            }
        }
    }
}
