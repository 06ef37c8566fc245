use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, DeriveInput};

/// Derives `RuleName` from the struct identifier, so `Rule002MethodSpacing`
/// is configured under `[Rule002MethodSpacing]`.
#[proc_macro_derive(RuleName)]
pub fn rule_name_derive(input: TokenStream) -> TokenStream {
    let ast = parse_macro_input!(input as DeriveInput);
    impl_rule_name_macro(&ast)
}

fn impl_rule_name_macro(ast: &DeriveInput) -> TokenStream {
    let name = &ast.ident;
    let (impl_generics, ty_generics, where_clause) = ast.generics.split_for_impl();
    let gen = quote! {
        impl #impl_generics crate::rules::RuleName for #name #ty_generics #where_clause {
            fn name(&self) -> &'static str {
                stringify!(#name)
            }
        }
    };
    gen.into()
}
