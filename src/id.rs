//! Code for handling the string keys that label curve and weight tables.
//!
//! Keys are cheap-to-clone wrappers around reference-counted strings, so that tables and results
//! can share labels without copying the underlying text.

/// Define a newtype wrapping an `Arc<str>` for use as a table label.
macro_rules! define_id_type {
    ($name:ident) => {
        /// A string key labelling one row or column of a table
        #[derive(
            Clone, std::hash::Hash, PartialEq, Eq, serde::Deserialize, Debug, serde::Serialize,
        )]
        pub struct $name(pub std::sync::Arc<str>);

        impl std::borrow::Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                $name(std::sync::Arc::from(s))
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                $name(std::sync::Arc::from(s))
            }
        }

        impl $name {
            /// Create a new ID from a string slice
            pub fn new(id: &str) -> Self {
                $name(std::sync::Arc::from(id))
            }
        }
    };
}

define_id_type! {NodeID}
define_id_type! {ProductKey}
define_id_type! {CategoryID}
