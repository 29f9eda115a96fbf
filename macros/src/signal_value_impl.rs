use proc_macro2::{Span, TokenStream};
use quote::{format_ident, quote};
use syn::{parse2, parse_quote, Data, DeriveInput, Fields, Ident, Index, Member, Result};

pub fn derive_signal_value(input: TokenStream) -> Result<TokenStream> {
    let mut input: DeriveInput = parse2(input)?;
    let type_params: Vec<Ident> = input
        .generics
        .type_params()
        .map(|p| p.ident.clone())
        .collect();
    let where_clause = input.generics.make_where_clause();
    for ident in type_params {
        where_clause
            .predicates
            .push(parse_quote!(#ident: ::nth_signals::SignalValue));
    }
    let name = &input.ident;
    let (body, wrap) = match &input.data {
        Data::Struct(data) => {
            let members = members(&data.fields);
            let wrap = if members.is_empty() {
                quote!(self)
            } else {
                quote!(Self { #(#members: ::nth_signals::SignalValue::wrap(self.#members)),* })
            };
            (
                quote! {
                    true #(&& ::nth_signals::SignalValue::same_value(&self.#members, &other.#members))*
                },
                wrap,
            )
        }
        Data::Enum(data) => {
            let mut arms = Vec::new();
            let mut wrap_arms = Vec::new();
            for variant in &data.variants {
                let ident = &variant.ident;
                let members = members(&variant.fields);
                let this = bindings("__self", members.len());
                let other = bindings("__other", members.len());
                let (this_pat, other_pat) = match &variant.fields {
                    Fields::Named(_) => (
                        quote!(Self::#ident { #(#members: #this),* }),
                        quote!(Self::#ident { #(#members: #other),* }),
                    ),
                    Fields::Unnamed(_) => (
                        quote!(Self::#ident(#(#this),*)),
                        quote!(Self::#ident(#(#other),*)),
                    ),
                    Fields::Unit => (quote!(Self::#ident), quote!(Self::#ident)),
                };
                let wrapped = match &variant.fields {
                    Fields::Named(_) => {
                        quote!(Self::#ident { #(#members: ::nth_signals::SignalValue::wrap(#this)),* })
                    }
                    Fields::Unnamed(_) => {
                        quote!(Self::#ident(#(::nth_signals::SignalValue::wrap(#this)),*))
                    }
                    Fields::Unit => quote!(Self::#ident),
                };
                wrap_arms.push(quote!(#this_pat => #wrapped,));
                arms.push(quote! {
                    (#this_pat, #other_pat) => {
                        true #(&& ::nth_signals::SignalValue::same_value(#this, #other))*
                    }
                });
            }
            (
                quote! {
                    #[allow(unreachable_patterns)]
                    match (self, other) {
                        #(#arms)*
                        _ => false,
                    }
                },
                quote! {
                    match self {
                        #(#wrap_arms)*
                    }
                },
            )
        }
        Data::Union(_) => bail!(Span::call_site(), "`SignalValue` cannot be derived for unions"),
    };
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    Ok(quote! {
        #[automatically_derived]
        impl #impl_generics ::nth_signals::SignalValue for #name #ty_generics #where_clause {
            fn same_value(&self, other: &Self) -> bool {
                #body
            }
            fn wrap(self) -> Self {
                #wrap
            }
        }
    })
}

fn members(fields: &Fields) -> Vec<Member> {
    fields
        .iter()
        .enumerate()
        .map(|(index, field)| match &field.ident {
            Some(ident) => Member::Named(ident.clone()),
            None => Member::Unnamed(Index::from(index)),
        })
        .collect()
}

fn bindings(prefix: &str, len: usize) -> Vec<Ident> {
    (0..len).map(|i| format_ident!("{prefix}_{i}")).collect()
}
