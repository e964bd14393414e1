//! Code for handling IDs
use anyhow::{Context, Result};
use indexmap::{IndexMap, IndexSet};
use std::borrow::Borrow;
use std::fmt::Display;
use std::hash::Hash;

/// Define a string ID type backed by an `Rc<str>`.
///
/// The generated type can be used as a component index value in the optimisation model.
macro_rules! define_id_type {
    ($name:ident) => {
        #[derive(
            Clone, std::hash::Hash, PartialEq, Eq, PartialOrd, Ord, Debug, serde::Deserialize,
        )]
        /// An ID type (e.g. `ProjectID`, `LoadZoneID`, etc.)
        pub struct $name(pub std::rc::Rc<str>);

        impl std::borrow::Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                $name(std::rc::Rc::from(s))
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                $name(std::rc::Rc::from(s))
            }
        }

        impl From<&$name> for $crate::optimisation::IndexValue {
            fn from(id: &$name) -> Self {
                $crate::optimisation::IndexValue::Name(std::rc::Rc::clone(&id.0))
            }
        }

        impl $name {
            /// Create a new ID from a string slice
            pub fn new(id: &str) -> Self {
                $name(std::rc::Rc::from(id))
            }
        }
    };
}
pub(crate) use define_id_type;

/// A collection of IDs, used to check that an ID read from an input file is known
pub trait IDCollection<ID: Eq + Hash + Borrow<str> + Display> {
    /// Get the ID from the collection by its string representation.
    ///
    /// # Returns
    ///
    /// A copy of the ID in `self`, or an error if not found.
    fn get_id(&self, id: &str) -> Result<&ID>;
}

impl<ID: Eq + Hash + Borrow<str> + Display> IDCollection<ID> for IndexSet<ID> {
    fn get_id(&self, id: &str) -> Result<&ID> {
        self.get(id).with_context(|| format!("Unknown ID {id} found"))
    }
}

impl<ID: Eq + Hash + Borrow<str> + Display, V> IDCollection<ID> for IndexMap<ID, V> {
    fn get_id(&self, id: &str) -> Result<&ID> {
        self.get_key_value(id)
            .map(|(id, _)| id)
            .with_context(|| format!("Unknown ID {id} found"))
    }
}
