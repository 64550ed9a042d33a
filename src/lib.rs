//! hostbind — class binding SDK for embedded script runtimes
//!
//! Projects native Rust types into a dynamic host runtime's class system.
//! Instances created on either side share a single runtime-GC-managed host
//! object that releases its native counterpart on collection; declared
//! methods and computed properties become native property descriptors that
//! dispatch back into Rust with typed `this` recovery.
//!
//! The crate never talks to a runtime directly: a concrete environment
//! implements the [`HostEnv`] trait, and everything else — registration,
//! memoization, constructor dispatch, wrapping, finalization — is built on
//! that narrow seam. [`MockEnv`] provides an in-memory environment for
//! tests and prototyping.
//!
//! # Example
//!
//! ```ignore
//! use hostbind::{BindResult, CallContext, HostEnv, HostValue, PropertyList, ScriptClass};
//!
//! struct Counter {
//!     value: i32,
//! }
//!
//! impl ScriptClass for Counter {
//!     fn properties() -> PropertyList<Self> {
//!         PropertyList::new()
//!             .method("increment", |c: &mut Counter, _env, _call| {
//!                 c.value += 1;
//!                 Ok(HostValue::i32(c.value))
//!             })
//!             .getter("value", |c, _env| Ok(HostValue::i32(c.value)))
//!     }
//!
//!     fn construct(_env: &dyn HostEnv, call: &CallContext<'_>) -> BindResult<Self> {
//!         let start = call.get(0).and_then(|v| v.as_i32()).unwrap_or(0);
//!         Ok(Counter { value: start })
//!     }
//! }
//!
//! // Script side: `new Counter(5)` then `.increment()` -> 6, 7, ...
//! // Native side: hostbind::wrap_existing(&env, Counter { value: 10 })
//! ```

#![warn(missing_docs)]

mod class;
mod env;
mod error;
pub mod mock;
mod property;
mod token;
mod value;
mod wrap;

pub use class::{binding_for, constructor_of, ClassBinding, ClassId, ScriptClass};
pub use env::{CallContext, ConstructorFn, FinalizerFn, HostEnv};
pub use error::{BindError, BindResult, ErrorKind};
pub use mock::MockEnv;
pub use property::{
    translate, Attributes, GetterFn, MethodFn, PropertyCallback, PropertyDescriptor, PropertyList,
    PropertySpec, SetterFn,
};
pub use token::CapabilityToken;
pub use value::HostValue;
pub use wrap::{attach, lookup, this_instance, unwrap, wrap_existing, Wrapped};
