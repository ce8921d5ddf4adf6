//! Procedural macros for the recordlayer project.
//!
//! Provides `#[derive(Record)]`, which implements the record contract for a struct
//! carrying the well-known identity, audit and soft-delete fields.

#[allow(unused_extern_crates)]
extern crate self as recordlayer_macros;

use proc_macro::TokenStream;
use proc_macro2::Span;
use quote::quote;
use syn::{Data, DeriveInput, Fields, LitStr, parse_macro_input, spanned::Spanned};

/// Fields a record struct must declare, with the types they must have.
const REQUIRED_FIELDS: [(&str, &str); 8] = [
    ("id", "Option<Uuid>"),
    ("created_at", "Option<DateTime>"),
    ("created_by", "Option<String>"),
    ("updated_at", "Option<DateTime>"),
    ("updated_by", "Option<String>"),
    ("removed_at", "Option<DateTime>"),
    ("removed_by", "Option<String>"),
    ("is_removed", "bool"),
];

/// Derives `recordlayer::record::Record`.
///
/// The struct must have named fields `id: Option<Uuid>`, `created_at`, `updated_at`
/// and `removed_at` as `Option<DateTime>`, `created_by`, `updated_by` and `removed_by`
/// as `Option<String>`, and `is_removed: bool`. A missing field is reported by name.
///
/// Optional attributes:
///
/// - `#[record(name = "...")]` - model name written to change-log entries
///   (defaults to the struct name)
/// - `#[record(collection = "...")]` - collection name (defaults to the model name)
///
/// ```ignore
/// #[derive(Debug, Clone, Default, Serialize, Deserialize, Record)]
/// #[record(collection = "customers")]
/// pub struct Customer {
///     pub id: Option<Uuid>,
///     pub name: String,
///     pub created_at: Option<DateTime>,
///     pub created_by: Option<String>,
///     pub updated_at: Option<DateTime>,
///     pub updated_by: Option<String>,
///     pub removed_at: Option<DateTime>,
///     pub removed_by: Option<String>,
///     #[serde(default)]
///     pub is_removed: bool,
/// }
/// ```
#[proc_macro_derive(Record, attributes(record))]
pub fn derive_record(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    expand_record(input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn expand_record(input: DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let ident = &input.ident;

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => fields,
            other => {
                return Err(syn::Error::new(
                    other.span(),
                    "Record can only be derived for structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new(
                ident.span(),
                "Record can only be derived for structs",
            ));
        }
    };

    let missing = REQUIRED_FIELDS
        .iter()
        .filter(|(name, _)| {
            !fields
                .named
                .iter()
                .any(|field| field.ident.as_ref().is_some_and(|ident| ident == name))
        })
        .map(|(name, ty)| format!("`{name}: {ty}`"))
        .collect::<Vec<_>>();

    if !missing.is_empty() {
        return Err(syn::Error::new(
            ident.span(),
            format!("Record requires missing field(s): {}", missing.join(", ")),
        ));
    }

    let mut model_name = LitStr::new(&ident.to_string(), Span::call_site());
    let mut collection_name: Option<LitStr> = None;

    for attr in input.attrs.iter().filter(|attr| attr.path().is_ident("record")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("name") {
                model_name = meta.value()?.parse()?;
                Ok(())
            } else if meta.path.is_ident("collection") {
                collection_name = Some(meta.value()?.parse()?);
                Ok(())
            } else {
                Err(meta.error("expected `name` or `collection`"))
            }
        })?;
    }

    let collection_fn = collection_name.map(|collection| {
        quote! {
            fn collection_name() -> &'static str {
                #collection
            }
        }
    });

    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics ::recordlayer::record::Record for #ident #ty_generics #where_clause {
            fn model_name() -> &'static str {
                #model_name
            }

            #collection_fn

            fn id(&self) -> ::core::option::Option<::recordlayer::bson::Uuid> {
                self.id
            }

            fn set_id(&mut self, id: ::recordlayer::bson::Uuid) {
                self.id = ::core::option::Option::Some(id);
            }

            fn created_at(&self) -> ::core::option::Option<::recordlayer::bson::DateTime> {
                self.created_at
            }

            fn set_created_at(&mut self, at: ::recordlayer::bson::DateTime) {
                self.created_at = ::core::option::Option::Some(at);
            }

            fn created_by(&self) -> ::core::option::Option<&str> {
                self.created_by.as_deref()
            }

            fn set_created_by(&mut self, by: ::std::string::String) {
                self.created_by = ::core::option::Option::Some(by);
            }

            fn updated_at(&self) -> ::core::option::Option<::recordlayer::bson::DateTime> {
                self.updated_at
            }

            fn set_updated_at(&mut self, at: ::recordlayer::bson::DateTime) {
                self.updated_at = ::core::option::Option::Some(at);
            }

            fn updated_by(&self) -> ::core::option::Option<&str> {
                self.updated_by.as_deref()
            }

            fn set_updated_by(&mut self, by: ::std::string::String) {
                self.updated_by = ::core::option::Option::Some(by);
            }

            fn removed_at(&self) -> ::core::option::Option<::recordlayer::bson::DateTime> {
                self.removed_at
            }

            fn set_removed_at(&mut self, at: ::recordlayer::bson::DateTime) {
                self.removed_at = ::core::option::Option::Some(at);
            }

            fn removed_by(&self) -> ::core::option::Option<&str> {
                self.removed_by.as_deref()
            }

            fn set_removed_by(&mut self, by: ::std::string::String) {
                self.removed_by = ::core::option::Option::Some(by);
            }

            fn is_removed(&self) -> bool {
                self.is_removed
            }

            fn set_removed(&mut self, removed: bool) {
                self.is_removed = removed;
            }
        }
    })
}
