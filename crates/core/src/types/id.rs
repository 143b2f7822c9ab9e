//! Newtype IDs for type-safe entity references.
//!
//! Use the `define_id!` macro to create type-safe ID wrappers that prevent
//! accidentally mixing IDs from different entity types.

/// Macro to define a type-safe string ID wrapper.
///
/// The backend issues opaque string identifiers (e.g. `"KCRwjF7lN97HnEaY"`),
/// so the wrapper holds a `String` and creates:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`
/// - Conversion methods: `new()`, `as_str()`, `into_inner()`
/// - `From<&str>` and `From<String>` implementations
///
/// # Example
///
/// ```rust
/// # use qkart_core::define_id;
/// define_id!(ProductId);
/// define_id!(OrderId);
///
/// let product_id = ProductId::new("KCRwjF7lN97HnEaY");
/// let order_id = OrderId::new("KCRwjF7lN97HnEaY");
///
/// // These are different types, so this won't compile:
/// // let _: ProductId = order_id;
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new ID from anything string-like.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get the ID as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the ID and return the inner string.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_id!(ProductId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_id_roundtrips_through_json_as_plain_string() {
        let id = ProductId::new("BW0jAAeDJmlZCF8i");
        let json = serde_json::to_string(&id).unwrap_or_default();
        assert_eq!(json, "\"BW0jAAeDJmlZCF8i\"");
    }

    #[test]
    fn test_product_id_display() {
        let id: ProductId = "KCRwjF7lN97HnEaY".into();
        assert_eq!(id.to_string(), "KCRwjF7lN97HnEaY");
        assert_eq!(id.as_str(), "KCRwjF7lN97HnEaY");
    }

    #[test]
    fn test_product_id_equality() {
        assert_eq!(ProductId::new("a"), ProductId::from(String::from("a")));
        assert_ne!(ProductId::new("a"), ProductId::new("b"));
    }
}
