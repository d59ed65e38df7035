//! Nilable reply wrapper

/// A typed answer that may be legitimately absent
///
/// An absent reply always carries the shape's zero value (`T::default()`),
/// built fresh by the constructor that produced it. The value of an absent
/// reply is not meaningful and accessors that return `Option` hide it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Reply<T> {
    value: T,
    absent: bool,
}

impl<T> Reply<T> {
    /// A reply holding a real value
    pub fn present(value: T) -> Self {
        Reply {
            value,
            absent: false,
        }
    }

    /// True when the engine answered "no value"
    pub fn is_absent(&self) -> bool {
        self.absent
    }

    /// The held value, the zero value when absent
    pub fn value(&self) -> &T {
        &self.value
    }

    /// Consume and return the held value, the zero value when absent
    pub fn into_value(self) -> T {
        self.value
    }

    /// `None` when absent
    pub fn as_option(&self) -> Option<&T> {
        if self.absent {
            None
        } else {
            Some(&self.value)
        }
    }

    /// `None` when absent
    pub fn into_option(self) -> Option<T> {
        if self.absent {
            None
        } else {
            Some(self.value)
        }
    }
}

impl<T: Default> Reply<T> {
    /// A reply for a legitimately missing value
    pub fn absent() -> Self {
        Reply {
            value: T::default(),
            absent: true,
        }
    }

    /// Transform a present value, absence is preserved
    pub fn map<U: Default, F: FnOnce(T) -> U>(self, f: F) -> Reply<U> {
        if self.absent {
            Reply::absent()
        } else {
            Reply::present(f(self.value))
        }
    }
}

impl<T: Default> Default for Reply<T> {
    fn default() -> Self {
        Reply::absent()
    }
}

impl<T: Default> From<Option<T>> for Reply<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Reply::present(v),
            None => Reply::absent(),
        }
    }
}

impl From<&str> for Reply<String> {
    fn from(value: &str) -> Self {
        Reply::present(value.to_string())
    }
}
