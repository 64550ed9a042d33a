//! Capability token — unforgeable marker gating the internal constructor path
//!
//! A token is a unique host symbol issued once per (class, environment).
//! Script code can see a token value flow past (it never does in practice)
//! but cannot produce one that compares identity-equal to it, so possession
//! of the token proves the call came from native code holding the class
//! binding.

use crate::env::HostEnv;
use crate::error::BindResult;
use crate::value::HostValue;

/// Identity-compared capability marker for one class in one environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapabilityToken(HostValue);

impl CapabilityToken {
    /// Issue a fresh token backed by a unique symbol.
    ///
    /// Fails only if the runtime cannot allocate the symbol, which is fatal
    /// to binding creation.
    pub fn issue(env: &dyn HostEnv, label: &str) -> BindResult<Self> {
        Ok(CapabilityToken(env.create_symbol(label)?))
    }

    /// Identity comparison against a call argument. Never structural.
    pub fn matches(&self, value: HostValue) -> bool {
        self.0 == value
    }

    /// The underlying symbol handle, for passing as a call argument
    pub fn value(&self) -> HostValue {
        self.0
    }
}
