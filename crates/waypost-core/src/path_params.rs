//! Extracted path parameters
//!
//! Parameters keep the order in which their placeholders are declared in the
//! route pattern. Storage is inline for the common case of four or fewer.

use smallvec::SmallVec;
use std::collections::HashMap;

/// Maximum number of path parameters to store on the stack.
pub const STACK_PARAMS_CAPACITY: usize = 4;

/// Path parameters with stack-optimized storage.
///
/// Values are the raw substrings of the request path; an `int`-constrained
/// value is guaranteed to be digits but is still a string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathParams {
    inner: SmallVec<[(String, String); STACK_PARAMS_CAPACITY]>,
}

impl PathParams {
    /// Create a new empty path params collection.
    #[inline]
    pub fn new() -> Self {
        Self {
            inner: SmallVec::new(),
        }
    }

    /// Create path params with pre-allocated capacity.
    #[inline]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: SmallVec::with_capacity(capacity),
        }
    }

    /// Append a key-value pair.
    #[inline]
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.inner.push((key.into(), value.into()));
    }

    /// Get a value by key.
    #[inline]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.inner
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Check if a key exists.
    #[inline]
    pub fn contains_key(&self, key: &str) -> bool {
        self.inner.iter().any(|(k, _)| k == key)
    }

    /// Check if the collection is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Get the number of parameters.
    #[inline]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Iterate over key-value pairs in declared order.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.inner.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Parameter names in declared order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.inner.iter().map(|(k, _)| k.as_str())
    }

    /// Convert to a HashMap.
    pub fn to_hashmap(&self) -> HashMap<String, String> {
        self.inner.iter().cloned().collect()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for PathParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Self::new();
        for (k, v) in iter {
            params.insert(k, v);
        }
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_declared_order() {
        let params: PathParams = [("user_id", "7"), ("post_id", "hello")].into_iter().collect();
        assert_eq!(params.names().collect::<Vec<_>>(), vec!["user_id", "post_id"]);
        assert_eq!(params.get("post_id"), Some("hello"));
        assert_eq!(params.get("missing"), None);
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn spills_past_inline_capacity() {
        let mut params = PathParams::new();
        for i in 0..(STACK_PARAMS_CAPACITY + 3) {
            params.insert(format!("p{i}"), i.to_string());
        }
        assert_eq!(params.len(), STACK_PARAMS_CAPACITY + 3);
        assert_eq!(params.get("p6"), Some("6"));
        assert_eq!(params.to_hashmap().len(), STACK_PARAMS_CAPACITY + 3);
    }
}
