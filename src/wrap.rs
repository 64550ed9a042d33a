//! Wrapped-object lifecycle management
//!
//! Maintains the 1:1 association between a host object and its native
//! instance: attach at construction time, typed lookup for `this` recovery
//! and unwrapping, the wrap-existing path for projecting pre-built native
//! instances, and finalizer registration so the instance is released exactly
//! once when the collector reclaims the host object.
//!
//! Lookup fails closed: an absent slot or a dynamic-type mismatch is a
//! catchable "not correctly wrapped" error, never a garbage value.

use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

use crate::class::{binding_for, ClassId, ScriptClass, SpecialConstruct};
use crate::env::{CallContext, HostEnv};
use crate::error::{BindError, BindResult};
use crate::value::HostValue;

/// Shared handle to an attached native instance.
///
/// Clones observe the same instance; the last one dropped (usually the
/// environment's wrap slot, at finalization) releases it.
pub type Wrapped<T> = Rc<RefCell<T>>;

/// Attach a native instance to a host object under `T`'s class identity.
///
/// Registers the release finalizer with the environment. Exactly one
/// instance may ever be attached per (object, class); a second attach is a
/// bug in the binding code and panics.
pub fn attach<T: ScriptClass>(env: &dyn HostEnv, object: HostValue, instance: T) {
    let id = ClassId::of::<T>();
    if env.wrap_slot(object, id).is_some() {
        panic!(
            "native instance already attached to object for class '{}'",
            T::name()
        );
    }
    env.set_wrap_slot(object, id, Rc::new(RefCell::new(instance)));
    env.register_finalizer(object, Box::new(move |env| env.clear_wrap_slot(object, id)));
}

/// Recover the native instance attached to `object` for class `T`.
pub fn lookup<T: ScriptClass>(env: &dyn HostEnv, object: HostValue) -> BindResult<Wrapped<T>> {
    let slot = env
        .wrap_slot(object, ClassId::of::<T>())
        .ok_or(BindError::NotWrapped { class: T::name() })?;
    slot.downcast::<RefCell<T>>()
        .map_err(|_| BindError::NotWrapped { class: T::name() })
}

/// Recover the native instance behind a call's `this` receiver.
///
/// This is how every translated method, getter, and setter finds its
/// instance; receivers that were not constructed through `T`'s class path
/// (e.g. `Function.prototype.call` tricks) fail with a catchable error.
pub fn this_instance<T: ScriptClass>(
    env: &dyn HostEnv,
    call: &CallContext<'_>,
) -> BindResult<Wrapped<T>> {
    let this = call.this.ok_or(BindError::MissingReceiver { class: T::name() })?;
    lookup::<T>(env, this)
}

/// Unwrap a host object back into its native instance.
///
/// The public counterpart of [`wrap_existing`]; fails with a "not correctly
/// wrapped" error when `object` does not carry an instance of `T`.
pub fn unwrap<T: ScriptClass>(env: &dyn HostEnv, object: HostValue) -> BindResult<Wrapped<T>> {
    lookup::<T>(env, object)
}

/// Produce a fresh host object for an already-existing native instance,
/// bypassing the public constructor.
///
/// Invokes the registered constructor function with the class's capability
/// token and the instance smuggled through an opaque external value; the
/// dispatcher recognizes the token and takes the wrap-existing path.
pub fn wrap_existing<T: ScriptClass>(env: &dyn HostEnv, instance: T) -> BindResult<HostValue> {
    let binding = binding_for::<T>(env)?;
    let payload: Rc<dyn Any> = Rc::new(SpecialConstruct::wrap(instance));
    let external = env.create_external(payload)?;
    env.construct(binding.constructor, &[binding.token.value(), external])
}
