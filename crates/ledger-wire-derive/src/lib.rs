// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

extern crate proc_macro;

use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, Data, DeriveInput, Fields, LitStr};

/// Container options from `#[ledger(...)]`.
#[derive(Default)]
struct Options {
    name: Option<String>,
    always_serializable: bool,
    structural_only: bool,
    legacy: Option<syn::Path>,
    transforms: Option<syn::Path>,
    implements: Vec<String>,
}

impl Options {
    fn parse(input: &DeriveInput) -> syn::Result<Self> {
        let mut options = Self::default();
        for attr in input.attrs.iter().filter(|a| a.path().is_ident("ledger")) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("name") {
                    options.name = Some(meta.value()?.parse::<LitStr>()?.value());
                } else if meta.path.is_ident("always_serializable") {
                    options.always_serializable = true;
                } else if meta.path.is_ident("structural_only") {
                    options.structural_only = true;
                } else if meta.path.is_ident("legacy") {
                    options.legacy = Some(meta.value()?.parse::<LitStr>()?.parse()?);
                } else if meta.path.is_ident("transforms") {
                    options.transforms = Some(meta.value()?.parse::<LitStr>()?.parse()?);
                } else if meta.path.is_ident("implements") {
                    options.implements.push(meta.value()?.parse::<LitStr>()?.value());
                } else {
                    return Err(meta.error("unknown ledger option"));
                }
                Ok(())
            })?;
        }
        Ok(options)
    }

    /// Builder calls shared by structs and enums.
    fn markers(&self) -> proc_macro2::TokenStream {
        let always = self
            .always_serializable
            .then(|| quote! { .always_serializable() });
        let structural = self.structural_only.then(|| quote! { .structural_only() });
        let supertypes = self.implements.iter().map(|name| {
            quote! { .supertype(::ledger_wire::model::TypeIdentifier::named(#name)) }
        });
        quote! { #always #structural #(#supertypes)* }
    }

    /// Declare referenced interfaces nobody has declared yet.
    fn interface_declarations(&self) -> proc_macro2::TokenStream {
        let names = &self.implements;
        quote! {
            #(
                if !registry.contains(#names) {
                    registry.register(::ledger_wire::model::TypeDeclaration::interface(#names))?;
                }
            )*
        }
    }
}

/// `#[derive(Serializable)]`: declaration plus `Value` conversion.
///
/// Supports structs with named fields (composite types, one constructor
/// property per field, `Option` fields nullable) and enums whose variants
/// carry no data (constants in declaration order).
///
/// Options, all under `#[ledger(...)]`:
/// - `name = "wire.Name"`: wire name (defaults to the Rust identifier)
/// - `always_serializable`: bypass the type whitelist
/// - `structural_only`: refuse custom serializers
/// - `legacy = "path"`: `fn() -> Vec<LegacyConstructor>` (structs)
/// - `transforms = "path"`: `fn() -> Vec<EnumTransform>` (enums)
/// - `implements = "Name"`: a supertype, repeatable
///
/// Example:
/// ```ignore
/// use ledger_wire::Serializable;
///
/// #[derive(Serializable)]
/// #[ledger(name = "demo.Trade", implements = "demo.Priced")]
/// struct Trade {
///     price: i64,
///     venue: Option<String>,
/// }
/// ```
#[proc_macro_derive(Serializable, attributes(ledger))]
pub fn derive_serializable(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn expand(input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "generic types must be declared by hand",
        ));
    }
    let options = Options::parse(input)?;
    match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => Ok(expand_struct(input, &options, fields)),
            _ => Err(syn::Error::new_spanned(input, "only named fields are supported")),
        },
        Data::Enum(data) => expand_enum(input, &options, data),
        Data::Union(_) => Err(syn::Error::new_spanned(input, "unions are not supported")),
    }
}

fn expand_struct(
    input: &DeriveInput,
    options: &Options,
    fields: &syn::FieldsNamed,
) -> proc_macro2::TokenStream {
    let ident = &input.ident;
    let wire_name = options.name.clone().unwrap_or_else(|| ident.to_string());
    let markers = options.markers();
    let interfaces = options.interface_declarations();
    let legacy = options
        .legacy
        .as_ref()
        .map(|path| quote! { .legacy_constructors(#path()) });

    let idents: Vec<_> = fields.named.iter().filter_map(|f| f.ident.as_ref()).collect();
    let names: Vec<String> = idents
        .iter()
        .map(|i| i.to_string().trim_start_matches("r#").to_string())
        .collect();
    let types: Vec<_> = fields.named.iter().map(|f| &f.ty).collect();

    quote! {
        impl ::ledger_wire::traits::Serializable for #ident {
            fn type_identifier() -> ::ledger_wire::model::TypeIdentifier {
                ::ledger_wire::model::TypeIdentifier::named(#wire_name)
            }

            fn declare(
                registry: &::ledger_wire::model::TypeRegistry,
            ) -> ::ledger_wire::error::Result<()> {
                if registry.contains(#wire_name) {
                    return Ok(());
                }
                let declaration = ::ledger_wire::model::TypeDeclaration::composite(#wire_name)
                    #(
                        .property_with(
                            #names,
                            <#types as ::ledger_wire::traits::Serializable>::type_identifier(),
                            !<#types as ::ledger_wire::traits::Serializable>::nullable(),
                        )
                    )*
                    #markers
                    #legacy;
                registry.register(declaration)?;
                #interfaces
                #( <#types as ::ledger_wire::traits::Serializable>::declare(registry)?; )*
                Ok(())
            }

            fn to_value(
                &self,
                writer: &mut ::ledger_wire::traits::ValueWriter,
            ) -> ::ledger_wire::error::Result<::ledger_wire::value::Value> {
                let mut record = ::ledger_wire::value::Record::new(
                    <Self as ::ledger_wire::traits::Serializable>::type_identifier(),
                );
                #( record.insert(#names, writer.write(&self.#idents)?); )*
                Ok(record.into_value())
            }

            fn from_value(
                value: &::ledger_wire::value::Value,
                reader: &mut ::ledger_wire::traits::ValueReader,
            ) -> ::ledger_wire::error::Result<Self> {
                let record = reader.record::<Self>(value)?;
                Ok(Self {
                    #( #idents: reader.field(record, #names)?, )*
                })
            }
        }
    }
}

fn expand_enum(
    input: &DeriveInput,
    options: &Options,
    data: &syn::DataEnum,
) -> syn::Result<proc_macro2::TokenStream> {
    let ident = &input.ident;
    let wire_name = options.name.clone().unwrap_or_else(|| ident.to_string());
    if options.legacy.is_some() {
        return Err(syn::Error::new_spanned(input, "legacy constructors apply to structs"));
    }
    for variant in &data.variants {
        if !matches!(variant.fields, Fields::Unit) {
            return Err(syn::Error::new_spanned(
                variant,
                "only variants without fields are supported",
            ));
        }
    }
    let markers = options.markers();
    let interfaces = options.interface_declarations();
    let transforms = options
        .transforms
        .as_ref()
        .map(|path| quote! { .transforms(#path()) });

    let variants: Vec<_> = data.variants.iter().map(|v| &v.ident).collect();
    let constants: Vec<String> = variants.iter().map(|v| v.to_string()).collect();
    let ordinals = 0..variants.len() as u32;

    Ok(quote! {
        impl ::ledger_wire::traits::Serializable for #ident {
            fn type_identifier() -> ::ledger_wire::model::TypeIdentifier {
                ::ledger_wire::model::TypeIdentifier::named(#wire_name)
            }

            fn declare(
                registry: &::ledger_wire::model::TypeRegistry,
            ) -> ::ledger_wire::error::Result<()> {
                if registry.contains(#wire_name) {
                    return Ok(());
                }
                registry.register(
                    ::ledger_wire::model::TypeDeclaration::enumeration(#wire_name, [#(#constants),*])
                        #markers
                        #transforms,
                )?;
                #interfaces
                Ok(())
            }

            fn to_value(
                &self,
                _writer: &mut ::ledger_wire::traits::ValueWriter,
            ) -> ::ledger_wire::error::Result<::ledger_wire::value::Value> {
                let (name, ordinal) = match self {
                    #( Self::#variants => (#constants, #ordinals), )*
                };
                Ok(::ledger_wire::value::Value::Enum(::ledger_wire::value::EnumValue::new(
                    <Self as ::ledger_wire::traits::Serializable>::type_identifier(),
                    name,
                    ordinal,
                )))
            }

            fn from_value(
                value: &::ledger_wire::value::Value,
                reader: &mut ::ledger_wire::traits::ValueReader,
            ) -> ::ledger_wire::error::Result<Self> {
                let constant = reader.enum_constant::<Self>(value)?;
                match constant.name.as_str() {
                    #( #constants => Ok(Self::#variants), )*
                    other => Err(::ledger_wire::error::Error::not_serializable(format!(
                        "{} is not a constant of {}",
                        other, #wire_name
                    ))),
                }
            }
        }
    })
}
