//! HostEnv trait — abstract host runtime environment
//!
//! Defines the narrow interface the binding layer consumes. A concrete host
//! runtime (or [`MockEnv`](crate::mock::MockEnv) in tests) implements this
//! trait; the class registry, constructor dispatcher, and lifecycle manager
//! program against it without depending on runtime internals.
//!
//! All operations are synchronous and run to completion on the environment's
//! single execution context. An environment is never shared across threads;
//! distinct environments are fully partitioned and may live on different
//! threads independently. The trait is deliberately not `Send`/`Sync`.

use std::any::Any;
use std::rc::Rc;

use crate::class::{ClassBinding, ClassId};
use crate::error::BindResult;
use crate::property::PropertyDescriptor;
use crate::value::HostValue;

// ============================================================================
// Call plumbing
// ============================================================================

/// Arguments of one native call as delivered by the host runtime.
pub struct CallContext<'a> {
    /// The `this` receiver, when the runtime bound one
    pub this: Option<HostValue>,
    /// Positional arguments in call order
    pub args: &'a [HostValue],
}

impl<'a> CallContext<'a> {
    /// Build a call context from receiver and arguments
    pub fn new(this: Option<HostValue>, args: &'a [HostValue]) -> Self {
        Self { this, args }
    }

    /// Number of positional arguments
    pub fn len(&self) -> usize {
        self.args.len()
    }

    /// Check if the call carried no arguments
    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    /// Argument at `index`, if present
    pub fn get(&self, index: usize) -> Option<HostValue> {
        self.args.get(index).copied()
    }
}

/// Constructor trampoline invoked by the host runtime for every `new`
/// application of a registered class.
///
/// A single monomorphic entry point is registered per class; `data` is the
/// opaque value supplied at registration, from which the trampoline recovers
/// the class's token and declared construction logic. On success the
/// trampoline has attached a native instance to the call's receiver.
pub type ConstructorFn = fn(&dyn HostEnv, &CallContext<'_>, &dyn Any) -> BindResult<()>;

/// Release callback run by the environment when a host object is collected.
///
/// The environment invokes it exactly once, passing itself back in so the
/// callback can clear per-object storage.
pub type FinalizerFn = Box<dyn FnOnce(&dyn HostEnv)>;

// ============================================================================
// HostEnv
// ============================================================================

/// One isolated instance of the host runtime, as seen by the binding layer.
pub trait HostEnv {
    // ------------------------------------------------------------------
    // Runtime allocation
    // ------------------------------------------------------------------

    /// Create a unique symbol with a human-readable debug label.
    ///
    /// The returned handle compares equal only to itself; script code can
    /// observe the symbol's identity but never mint an equal one.
    fn create_symbol(&self, label: &str) -> BindResult<HostValue>;

    /// Register a native class and return its constructor function handle.
    ///
    /// The environment retains `data` and `descriptors` (including their
    /// callbacks) for as long as the constructor function is alive, and
    /// preserves descriptor order in own-property enumeration.
    fn define_class(
        &self,
        name: &str,
        constructor: ConstructorFn,
        data: Rc<dyn Any>,
        descriptors: Vec<PropertyDescriptor>,
    ) -> BindResult<HostValue>;

    /// Wrap an opaque native payload in a host external value
    fn create_external(&self, payload: Rc<dyn Any>) -> BindResult<HostValue>;

    /// Read the payload back out of an external value.
    ///
    /// Returns `None` if `value` is not an external.
    fn read_external(&self, value: HostValue) -> Option<Rc<dyn Any>>;

    /// Apply `new` to a constructor function, yielding the created object
    fn construct(&self, constructor: HostValue, args: &[HostValue]) -> BindResult<HostValue>;

    // ------------------------------------------------------------------
    // Environment-scoped instance data
    // ------------------------------------------------------------------

    /// Cached class binding for `key`, if one was stored
    fn instance_data(&self, key: ClassId) -> Option<Rc<ClassBinding>>;

    /// Store the class binding for `key`. Lifetime = environment lifetime.
    fn set_instance_data(&self, key: ClassId, binding: Rc<ClassBinding>);

    // ------------------------------------------------------------------
    // Per-object wrap slots
    // ------------------------------------------------------------------

    /// Native instance attached to `object` under `key`, if any
    fn wrap_slot(&self, object: HostValue, key: ClassId) -> Option<Rc<dyn Any>>;

    /// Attach a native instance to `object` under `key`.
    ///
    /// Occupancy is checked by the lifecycle manager before calling this;
    /// the environment stores unconditionally.
    fn set_wrap_slot(&self, object: HostValue, key: ClassId, instance: Rc<dyn Any>);

    /// Remove and drop the instance attached to `object` under `key`
    fn clear_wrap_slot(&self, object: HostValue, key: ClassId);

    // ------------------------------------------------------------------
    // Finalization
    // ------------------------------------------------------------------

    /// Run `release` exactly once when the collector reclaims `object`
    fn register_finalizer(&self, object: HostValue, release: FinalizerFn);
}
