//! HostValue — tagged handle for values crossing the binding boundary
//!
//! The binding layer never inspects host objects directly; it traffics in
//! `HostValue` handles handed out by the environment. Primitives (null, bool,
//! i32, f64) are stored inline so trivial return values need no environment
//! round-trip. Everything heap-allocated on the host side (objects,
//! functions, symbols, externals) is an opaque handle whose payload is an
//! environment-assigned slot id.
//!
//! # Identity
//!
//! The environment guarantees one canonical handle per heap value, so `==`
//! on two handle-tagged `HostValue`s is an identity comparison. The
//! capability-token check in the constructor dispatcher relies on this.

/// A value passed between the host runtime and native code.
#[repr(C)]
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct HostValue {
    tag: u8,
    data: u64,
}

// Value type tags
const TAG_NULL: u8 = 0;
const TAG_BOOL: u8 = 1;
const TAG_I32: u8 = 2;
const TAG_F64: u8 = 3;
const TAG_HANDLE: u8 = 4; // Opaque environment-assigned slot id

impl HostValue {
    /// Create a null value
    pub const fn null() -> Self {
        HostValue {
            tag: TAG_NULL,
            data: 0,
        }
    }

    /// Create a boolean value
    pub const fn bool(b: bool) -> Self {
        HostValue {
            tag: TAG_BOOL,
            data: b as u64,
        }
    }

    /// Create a 32-bit integer value
    pub const fn i32(i: i32) -> Self {
        HostValue {
            tag: TAG_I32,
            data: i as u32 as u64,
        }
    }

    /// Create a 64-bit float value
    pub fn f64(f: f64) -> Self {
        HostValue {
            tag: TAG_F64,
            data: f.to_bits(),
        }
    }

    /// Create an opaque handle from an environment slot id.
    ///
    /// Only environments mint these; native code receives and returns them
    /// without interpreting the id.
    pub const fn handle(id: u64) -> Self {
        HostValue {
            tag: TAG_HANDLE,
            data: id,
        }
    }

    /// Check if this is a null value
    pub const fn is_null(&self) -> bool {
        self.tag == TAG_NULL
    }

    /// Check if this is an opaque handle
    pub const fn is_handle(&self) -> bool {
        self.tag == TAG_HANDLE
    }

    /// Get as boolean if this is a bool
    pub const fn as_bool(&self) -> Option<bool> {
        if self.tag == TAG_BOOL {
            Some(self.data != 0)
        } else {
            None
        }
    }

    /// Get as i32 if this is an i32
    pub const fn as_i32(&self) -> Option<i32> {
        if self.tag == TAG_I32 {
            Some(self.data as u32 as i32)
        } else {
            None
        }
    }

    /// Get as f64 if this is an f64
    pub fn as_f64(&self) -> Option<f64> {
        if self.tag == TAG_F64 {
            Some(f64::from_bits(self.data))
        } else {
            None
        }
    }

    /// Get the slot id if this is an opaque handle
    pub const fn handle_id(&self) -> Option<u64> {
        if self.tag == TAG_HANDLE {
            Some(self.data)
        } else {
            None
        }
    }

    /// Get type name for diagnostics
    pub const fn type_name(&self) -> &'static str {
        match self.tag {
            TAG_NULL => "null",
            TAG_BOOL => "bool",
            TAG_I32 => "i32",
            TAG_F64 => "f64",
            TAG_HANDLE => "handle",
            _ => "unknown",
        }
    }
}

impl Default for HostValue {
    fn default() -> Self {
        Self::null()
    }
}

impl std::fmt::Debug for HostValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.tag {
            TAG_NULL => write!(f, "HostValue::Null"),
            TAG_BOOL => write!(f, "HostValue::Bool({})", self.data != 0),
            TAG_I32 => write!(f, "HostValue::I32({})", self.data as u32 as i32),
            TAG_F64 => write!(f, "HostValue::F64({})", f64::from_bits(self.data)),
            TAG_HANDLE => write!(f, "HostValue::Handle({:#x})", self.data),
            _ => write!(f, "HostValue::Unknown(tag={}, data={})", self.tag, self.data),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primitives() {
        let null = HostValue::null();
        assert!(null.is_null());
        assert!(!null.is_handle());

        let t = HostValue::bool(true);
        let f = HostValue::bool(false);
        assert_eq!(t.as_bool(), Some(true));
        assert_eq!(f.as_bool(), Some(false));

        let i = HostValue::i32(-42);
        assert_eq!(i.as_i32(), Some(-42));
        assert_eq!(i.as_bool(), None);

        let f = HostValue::f64(3.14159);
        assert!((f.as_f64().unwrap() - 3.14159).abs() < 1e-10);
    }

    #[test]
    fn test_handle_identity() {
        let a = HostValue::handle(7);
        let b = HostValue::handle(7);
        let c = HostValue::handle(8);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.handle_id(), Some(7));
        assert_eq!(HostValue::null().handle_id(), None);
    }

    #[test]
    fn test_handles_never_equal_primitives() {
        // An i32 whose payload collides with a slot id must not compare
        // equal to the handle. Token forgery via primitives depends on this.
        let h = HostValue::handle(1);
        assert_ne!(h, HostValue::i32(1));
        assert_ne!(h, HostValue::bool(true));
    }

    #[test]
    fn test_type_names() {
        assert_eq!(HostValue::null().type_name(), "null");
        assert_eq!(HostValue::i32(0).type_name(), "i32");
        assert_eq!(HostValue::handle(0).type_name(), "handle");
    }
}
