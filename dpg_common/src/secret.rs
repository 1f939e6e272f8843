use std::{
    fmt,
    fmt::{Debug, Display},
};

/// Wrapper that keeps credentials out of logs.
///
/// `Debug` and `Display` both print a fixed mask, so a `Secret` can sit inside config structs that
/// derive `Debug` without leaking. Access goes through [`Secret::reveal`], which keeps every use of
/// the raw value easy to grep for.
#[derive(Clone, Default)]
pub struct Secret<T>
where T: Clone + Default
{
    inner: T,
}

impl<T: Clone + Default> Secret<T> {
    pub fn new(inner: T) -> Self {
        Self { inner }
    }

    pub fn reveal(&self) -> &T {
        &self.inner
    }
}

impl<T: Clone + Default> Debug for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("****")
    }
}

impl<T: Clone + Default> Display for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("****")
    }
}
