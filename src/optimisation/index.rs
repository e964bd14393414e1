//! Indices for the members of indexed model components.
use itertools::Itertools;
use std::fmt;
use std::rc::Rc;

/// One element of a [`ComponentIndex`], e.g. a project ID or a timepoint
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IndexValue {
    /// A named set member (project, load zone, balancing area...)
    Name(Rc<str>),
    /// A numbered set member (period, timepoint, horizon...)
    Number(u32),
}

impl From<u32> for IndexValue {
    fn from(value: u32) -> Self {
        IndexValue::Number(value)
    }
}

impl From<&str> for IndexValue {
    fn from(value: &str) -> Self {
        IndexValue::Name(Rc::from(value))
    }
}

impl fmt::Display for IndexValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexValue::Name(name) => write!(f, "{name}"),
            IndexValue::Number(number) => write!(f, "{number}"),
        }
    }
}

/// The index of one member of an indexed component.
///
/// Scalar components have an empty index.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentIndex(pub Vec<IndexValue>);

impl ComponentIndex {
    /// The index of a scalar component
    pub fn scalar() -> Self {
        Self(Vec::new())
    }

    /// Iterate over the values making up the index
    pub fn iter(&self) -> impl Iterator<Item = &IndexValue> {
        self.0.iter()
    }

    /// The number of dimensions of the index
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether this is the index of a scalar component
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ComponentIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({})", self.0.iter().join(", "))
    }
}

/// Build a [`ComponentIndex`] from a list of values convertible to [`IndexValue`]
#[macro_export]
macro_rules! idx {
    () => {
        $crate::optimisation::ComponentIndex::scalar()
    };
    ($($value:expr),+ $(,)?) => {
        $crate::optimisation::ComponentIndex(vec![
            $($crate::optimisation::IndexValue::from($value)),+
        ])
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn component_index_display() {
        assert_eq!(crate::idx![].to_string(), "()");
        assert_eq!(crate::idx!["wind", 20300101].to_string(), "(wind, 20300101)");
    }

    #[test]
    fn component_index_ordering_follows_values() {
        let a = crate::idx!["a", 2];
        let b = crate::idx!["a", 10];
        assert!(a < b);
    }
}
