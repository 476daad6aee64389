//! Local vs remote data computation.

use std::fmt;

use crate::query::QueryCallback;

/// Where rows are filtered, sorted and paginated.
///
/// Decided once when a table is built and never re-derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Everything is computed in memory over the full row set.
    Local,
    /// State is forwarded as a [`QueryDescriptor`](crate::query::QueryDescriptor)
    /// and the host supplies the current page plus its totals.
    Remote,
}

impl Mode {
    /// Remote when the host supplied a query callback, local otherwise.
    pub fn resolve(on_query_change: Option<&QueryCallback>) -> Self {
        match on_query_change {
            Some(_) => Mode::Remote,
            None => Mode::Local,
        }
    }

    pub fn is_local(self) -> bool {
        self == Mode::Local
    }

    pub fn is_remote(self) -> bool {
        self == Mode::Remote
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Local => write!(f, "local"),
            Mode::Remote => write!(f, "remote"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[test]
    fn test_resolve() {
        assert_eq!(Mode::resolve(None), Mode::Local);

        let callback: QueryCallback = Arc::new(|_| {});
        assert_eq!(Mode::resolve(Some(&callback)), Mode::Remote);
    }
}
