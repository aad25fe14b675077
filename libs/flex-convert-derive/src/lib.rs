use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::ext::IdentExt;
use syn::{Data, DeriveInput, Field, Fields, GenericParam, parse_macro_input};

/// Derive macro for convertible records.
///
/// Implements `flex_convert::Reflect` for a struct with named fields:
///
/// - `type_desc()` — record descriptor, fields in declaration order.
/// - `to_value(&self)` — dynamic view, one entry per field.
/// - `from_value(Value)` — rebuilds the struct from a dynamic record.
///
/// Every field type must implement `Reflect`. Generic parameters get a
/// `Reflect` bound.
///
/// # Example
///
/// ```ignore
/// #[derive(Record, Default)]
/// pub struct UserDto {
///     pub id: i64,
///     pub disabled: NullBool,
///     pub referer: Option<Box<UserDto>>,
///
///     #[record(skip)]
///     pub cached_hash: u64,
/// }
/// ```
///
/// `#[record(skip)]` hides a field from matching; it is rebuilt with
/// `Default::default()`.
#[proc_macro_derive(Record, attributes(record))]
pub fn derive_record(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match derive_impl(&input) {
        Ok(tokens) => tokens.into(),
        Err(e) => e.to_compile_error().into(),
    }
}

fn derive_impl(input: &DeriveInput) -> Result<TokenStream2, syn::Error> {
    let name = &input.ident;
    let name_str = name.unraw().to_string();

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    name,
                    "Record only supports structs with named fields",
                ));
            }
        },
        _ => return Err(syn::Error::new_spanned(name, "Record only supports structs")),
    };

    let mut desc_tokens = Vec::new();
    let mut to_value_tokens = Vec::new();
    let mut from_value_tokens = Vec::new();

    for field in fields {
        let field_ident = field
            .ident
            .as_ref()
            .ok_or_else(|| syn::Error::new_spanned(field, "expected named field"))?;

        if is_skipped(field)? {
            from_value_tokens.push(quote! {
                #field_ident: ::std::default::Default::default(),
            });
            continue;
        }

        let field_name_str = field_ident.unraw().to_string();
        let field_ty = &field.ty;
        let context = format!("{name_str}.{field_name_str}");

        desc_tokens.push(quote! {
            ::flex_convert::FieldDesc {
                name: #field_name_str,
                ty: <#field_ty as ::flex_convert::Reflect>::type_desc,
            }
        });

        to_value_tokens.push(quote! {
            __record.push(#field_name_str, ::flex_convert::Reflect::to_value(&self.#field_ident));
        });

        from_value_tokens.push(quote! {
            #field_ident: <#field_ty as ::flex_convert::Reflect>::from_value(
                __record.take(#name_str, #field_name_str)?,
            )
            .map_err(|e| e.with_context(#context))?,
        });
    }

    let field_count = desc_tokens.len();

    let bounds: Vec<TokenStream2> = input
        .generics
        .params
        .iter()
        .filter_map(|param| match param {
            GenericParam::Type(ty) => {
                let ident = &ty.ident;
                Some(quote! { #ident: ::flex_convert::Reflect })
            }
            _ => None,
        })
        .collect();

    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    let where_clause = where_clause_with_bounds(where_clause, &bounds);

    Ok(quote! {
        impl #impl_generics ::flex_convert::Reflect for #name #ty_generics #where_clause {
            fn type_desc() -> ::flex_convert::TypeDesc {
                ::flex_convert::TypeDesc::Record(::flex_convert::RecordDesc {
                    name: #name_str,
                    path: ::std::any::type_name::<Self>(),
                    fields: ::std::vec![
                        #(#desc_tokens),*
                    ],
                })
            }

            fn to_value(&self) -> ::flex_convert::Value {
                let mut __record = ::flex_convert::RecordValue::with_capacity(#field_count);
                #(#to_value_tokens)*
                ::flex_convert::Value::Record(__record)
            }

            #[allow(unused_mut)]
            fn from_value(
                __value: ::flex_convert::Value,
            ) -> ::std::result::Result<Self, ::flex_convert::ConvertError> {
                let mut __record = __value.into_record(#name_str)?;
                ::std::result::Result::Ok(Self {
                    #(#from_value_tokens)*
                })
            }
        }
    })
}

/// `true` when the field carries `#[record(skip)]`.
fn is_skipped(field: &Field) -> Result<bool, syn::Error> {
    let mut skip = false;
    for attr in &field.attrs {
        if !attr.path().is_ident("record") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("skip") {
                skip = true;
                Ok(())
            } else {
                Err(meta.error("unknown record attribute (expected `skip`)"))
            }
        })?;
    }
    Ok(skip)
}

fn where_clause_with_bounds(
    where_clause: Option<&syn::WhereClause>,
    bounds: &[TokenStream2],
) -> TokenStream2 {
    if bounds.is_empty() {
        return quote!(#where_clause);
    }

    match where_clause {
        Some(wc) => {
            let preds = wc.predicates.iter();
            quote!(where #(#preds,)* #(#bounds),*)
        }
        None => quote!(where #(#bounds),*),
    }
}
