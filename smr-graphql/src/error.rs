use std::{error::Error, fmt, sync::Arc};

/// The error returned by the client and passed between exchanges.
///
/// It wraps whatever error an exchange produced and is cheap to clone, so one failure can be
/// handed to every watcher of an operation.
#[derive(Clone, Debug)]
pub struct QueryError {
    inner: Arc<Box<dyn Error + Send + Sync>>
}

#[derive(Debug)]
pub struct QueryErrorCompat(QueryError);

impl Error for QueryErrorCompat {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.0.source()
    }
}

impl fmt::Display for QueryErrorCompat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl QueryError {
    pub fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.inner.source()
    }

    /// The wrapped error, if it is of type `E`.
    pub fn downcast_ref<E: Error + 'static>(&self) -> Option<&E> {
        (**self.inner).downcast_ref::<E>()
    }

    /// Turn this into something that implements `std::error::Error`.
    pub fn compat(self) -> QueryErrorCompat {
        QueryErrorCompat(self)
    }
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.inner)
    }
}

impl<T: Error + Send + Sync + 'static> From<T> for QueryError {
    fn from(e: T) -> Self {
        QueryError {
            inner: Arc::new(Box::new(e))
        }
    }
}
