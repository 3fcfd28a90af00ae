use proc_macro::TokenStream;
use quote::quote;
use syn::meta::ParseNestedMeta;
use syn::{
    parse_macro_input, Attribute, Data, DeriveInput, Fields, GenericArgument, LitStr,
    PathArguments, Result as SynResult, Token, Type,
};

/// Derive `webframe::coerce::FormObject` for a struct with named fields.
///
/// Every field is listed under its serde wire name. `String`, `i32`, `f32` and `f64`
/// (optionally wrapped in `Option`) bind as scalars, `Vec<T>` binds as a list and any
/// other type is reported as a nested field that is left at its default.
#[proc_macro_derive(FormObject)]
pub fn derive_form_object(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand(&input) {
        Ok(tokens) => tokens.into(),
        Err(e) => e.to_compile_error().into(),
    }
}

fn expand(input: &DeriveInput) -> SynResult<proc_macro2::TokenStream> {
    let ident = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => &named.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    ident,
                    "FormObject requires a struct with named fields",
                ))
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                ident,
                "FormObject can only be derived for structs",
            ))
        }
    };

    let container = SerdeAttrs::parse(&input.attrs)?;

    let mut specs = Vec::new();
    for field in fields {
        let attrs = SerdeAttrs::parse(&field.attrs)?;
        if attrs.skip {
            continue;
        }
        let Some(field_ident) = &field.ident else {
            continue;
        };
        let raw = field_ident.to_string();
        let raw = raw.trim_start_matches("r#");
        let name = match (attrs.rename, &container.rename_all) {
            (Some(rename), _) => rename,
            (None, Some(rule)) => apply_rename_all(raw, rule),
            (None, None) => raw.to_string(),
        };
        let ty = field_type(&field.ty);
        specs.push(quote! {
            ::webframe::coerce::FieldSpec::new(#name, #ty)
        });
    }

    Ok(quote! {
        impl #impl_generics ::webframe::coerce::FormObject for #ident #ty_generics #where_clause {
            fn form_fields() -> ::std::vec::Vec<::webframe::coerce::FieldSpec> {
                ::std::vec![#(#specs),*]
            }
        }
    })
}

#[derive(Default)]
struct SerdeAttrs {
    rename: Option<String>,
    rename_all: Option<String>,
    skip: bool,
}

impl SerdeAttrs {
    fn parse(attrs: &[Attribute]) -> SynResult<Self> {
        let mut out = SerdeAttrs::default();
        for attr in attrs.iter().filter(|a| a.path().is_ident("serde")) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("rename") && meta.input.peek(Token![=]) {
                    let lit: LitStr = meta.value()?.parse()?;
                    out.rename = Some(lit.value());
                } else if meta.path.is_ident("rename_all") && meta.input.peek(Token![=]) {
                    let lit: LitStr = meta.value()?.parse()?;
                    out.rename_all = Some(lit.value());
                } else if meta.path.is_ident("skip")
                    || meta.path.is_ident("skip_deserializing")
                    || meta.path.is_ident("flatten")
                {
                    out.skip = true;
                } else {
                    skip_meta(&meta)?;
                }
                Ok(())
            })?;
        }
        Ok(out)
    }
}

// Consume serde options this derive does not care about.
fn skip_meta(meta: &ParseNestedMeta<'_>) -> SynResult<()> {
    if meta.input.peek(Token![=]) {
        meta.value()?.parse::<syn::Expr>()?;
    } else if meta.input.peek(syn::token::Paren) {
        meta.parse_nested_meta(|inner| skip_meta(&inner))?;
    }
    Ok(())
}

fn apply_rename_all(field: &str, rule: &str) -> String {
    let words: Vec<&str> = field.split('_').filter(|w| !w.is_empty()).collect();
    let capitalize = |w: &str| {
        let mut chars = w.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
            None => String::new(),
        }
    };
    match rule {
        "lowercase" => field.to_lowercase(),
        "UPPERCASE" => field.to_uppercase(),
        "PascalCase" => words.iter().map(|w| capitalize(w)).collect(),
        "camelCase" => words
            .iter()
            .enumerate()
            .map(|(i, w)| if i == 0 { (*w).to_string() } else { capitalize(w) })
            .collect(),
        "SCREAMING_SNAKE_CASE" => field.to_uppercase(),
        "kebab-case" => field.replace('_', "-"),
        "SCREAMING-KEBAB-CASE" => field.replace('_', "-").to_uppercase(),
        _ => field.to_string(),
    }
}

fn last_segment(ty: &Type) -> Option<&syn::PathSegment> {
    match ty {
        Type::Path(p) if p.qself.is_none() => p.path.segments.last(),
        _ => None,
    }
}

fn single_generic<'a>(ty: &'a Type, wrapper: &str) -> Option<&'a Type> {
    let seg = last_segment(ty)?;
    if seg.ident != wrapper {
        return None;
    }
    let PathArguments::AngleBracketed(args) = &seg.arguments else {
        return None;
    };
    match args.args.first() {
        Some(GenericArgument::Type(inner)) if args.args.len() == 1 => Some(inner),
        _ => None,
    }
}

fn scalar_type(ty: &Type) -> Option<proc_macro2::TokenStream> {
    let ty = single_generic(ty, "Option").unwrap_or(ty);
    let seg = last_segment(ty)?;
    if !seg.arguments.is_empty() {
        return None;
    }
    let scalar = match seg.ident.to_string().as_str() {
        "String" => quote!(Text),
        "i32" => quote!(Integer),
        "f32" => quote!(Float),
        "f64" => quote!(Double),
        _ => return None,
    };
    Some(quote!(::webframe::coerce::ScalarType::#scalar))
}

fn field_type(ty: &Type) -> proc_macro2::TokenStream {
    if let Some(scalar) = scalar_type(ty) {
        return quote!(::webframe::coerce::FieldType::Scalar(#scalar));
    }
    if let Some(element) = single_generic(ty, "Vec") {
        return match scalar_type(element) {
            Some(scalar) => {
                quote!(::webframe::coerce::FieldType::List(::std::option::Option::Some(#scalar)))
            }
            None => quote!(::webframe::coerce::FieldType::List(::std::option::Option::None)),
        };
    }
    quote!(::webframe::coerce::FieldType::Nested)
}
