//! In-memory password holder.

use std::fmt;

use zeroize::Zeroizing;

/// A password that is wiped from memory when dropped and never printed.
pub struct Password(Zeroizing<String>);

impl Password {
    /// Take ownership of `value` without copying it.
    pub fn new(value: String) -> Self {
        Self(Zeroizing::new(value))
    }

    /// Borrow the clear text. Only the authentication request should call this.
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(***)")
    }
}
