//! Class registration, memoization, and constructor dispatch
//!
//! The registry builds one [`ClassBinding`] per (class, environment): it
//! translates the declared property list, issues the class's capability
//! token, registers the constructor trampoline with the runtime, and caches
//! the result in environment-scoped storage. Registration happens at most
//! once per environment; failures cache nothing and may be retried.
//!
//! Every `new` application of a registered class lands in
//! `construct_dispatch`, which decides between the public construction path
//! and the token-gated wrap-existing path, then attaches the resulting
//! native instance to the receiver.

use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::marker::PhantomData;
use std::rc::Rc;

use crate::env::{CallContext, HostEnv};
use crate::error::{BindError, BindResult};
use crate::property::{translate, PropertyList};
use crate::token::CapabilityToken;
use crate::value::HostValue;
use crate::wrap::attach;

// ============================================================================
// Class identity
// ============================================================================

/// Stable per-type class identity. One per declared class, independent of
/// environment; the registry key and the wrap-slot key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClassId(TypeId);

impl ClassId {
    /// Identity of the class implemented by `T`
    pub fn of<T: 'static>() -> Self {
        ClassId(TypeId::of::<T>())
    }
}

// ============================================================================
// Declaration surface
// ============================================================================

/// A native type projected into the host runtime's class system.
///
/// Implementors declare a display name, an ordered property list, and
/// optionally a public constructor. Classes without a constructor can still
/// be handed to script code via [`wrap_existing`](crate::wrap::wrap_existing).
pub trait ScriptClass: Sized + 'static {
    /// Ordered list of methods and computed properties exposed to script code
    fn properties() -> PropertyList<Self>;

    /// Display name of the class. Defaults to the Rust type name without
    /// its module path.
    fn name() -> &'static str {
        let full = std::any::type_name::<Self>();
        match full.rsplit("::").next() {
            Some(last) => last,
            None => full,
        }
    }

    /// Public constructor body, invoked for `new` calls from script code.
    ///
    /// The default refuses construction, for classes that are only ever
    /// wrapped from the native side.
    fn construct(env: &dyn HostEnv, call: &CallContext<'_>) -> BindResult<Self> {
        let _ = (env, call);
        Err(BindError::NotConstructible { class: Self::name() })
    }
}

// ============================================================================
// Class binding
// ============================================================================

/// Memoized per-(class, environment) registration result.
///
/// Created lazily, exactly once per environment; every caller observes the
/// same constructor-function identity and the same token identity.
#[derive(Debug)]
pub struct ClassBinding {
    /// Handle of the registered constructor function
    pub constructor: HostValue,
    /// Capability token gating the wrap-existing construction path
    pub token: CapabilityToken,
}

/// Opaque data registered alongside the constructor trampoline. The
/// dispatcher recovers the class's token (and, through `T`, its declared
/// construction logic) from it.
struct ClassData<T> {
    token: CapabilityToken,
    _marker: PhantomData<fn() -> T>,
}

/// Transient wrap-existing request, smuggled through an external value.
///
/// Constructed only by the lifecycle manager, consumed at most once by the
/// dispatcher, never observable from script code as a distinct type.
pub(crate) struct SpecialConstruct<T> {
    cell: RefCell<Option<T>>,
}

impl<T> SpecialConstruct<T> {
    pub(crate) fn wrap(instance: T) -> Self {
        SpecialConstruct {
            cell: RefCell::new(Some(instance)),
        }
    }

    fn take(&self) -> Option<T> {
        self.cell.borrow_mut().take()
    }
}

// ============================================================================
// Registry
// ============================================================================

/// Get or create the class binding for `T` in `env`.
///
/// The first call for a given (class, environment) pair performs full
/// registration; subsequent calls return the cached binding with no side
/// effects. If any step fails, nothing is cached and a later call
/// re-attempts full construction — a half-initialized binding is never
/// observable.
pub fn binding_for<T: ScriptClass>(env: &dyn HostEnv) -> BindResult<Rc<ClassBinding>> {
    let id = ClassId::of::<T>();
    if let Some(binding) = env.instance_data(id) {
        return Ok(binding);
    }

    let name = T::name();
    if name.is_empty() || name.contains('\0') {
        return Err(BindError::InvalidClassName {
            name: name.to_string(),
        });
    }

    // Declaration errors surface here, before any runtime allocation.
    let descriptors = translate(T::properties())?;

    let token = CapabilityToken::issue(
        env,
        &format!("internal constructor marker for class '{name}'"),
    )?;
    let data: Rc<dyn Any> = Rc::new(ClassData::<T> {
        token,
        _marker: PhantomData,
    });
    let constructor = env.define_class(name, construct_dispatch::<T>, data, descriptors)?;

    let binding = Rc::new(ClassBinding { constructor, token });
    env.set_instance_data(id, Rc::clone(&binding));
    Ok(binding)
}

/// Constructor function handle for `T`, for exposing the class in
/// script-visible module exports.
pub fn constructor_of<T: ScriptClass>(env: &dyn HostEnv) -> BindResult<HostValue> {
    Ok(binding_for::<T>(env)?.constructor)
}

// ============================================================================
// Constructor dispatcher
// ============================================================================

/// Native entry point for every `new` application of `T`'s constructor.
fn construct_dispatch<T: ScriptClass>(
    env: &dyn HostEnv,
    call: &CallContext<'_>,
    data: &dyn Any,
) -> BindResult<()> {
    let data = data.downcast_ref::<ClassData<T>>().unwrap_or_else(|| {
        panic!(
            "constructor data registered for '{}' has a mismatched type",
            T::name()
        )
    });
    let this = call.this.ok_or(BindError::MissingReceiver { class: T::name() })?;

    let instance = if call.len() == 2 && data.token.matches(call.args[0]) {
        // Wrap-existing path. A call that presents the token but carries an
        // unreadable payload is tampering or a corrupted internal call; it
        // must not fall through to public construction.
        take_special::<T>(env, call.args[1]).ok_or(BindError::InvalidInternalCall {
            class: T::name(),
        })?
    } else {
        T::construct(env, call)?
    };

    attach(env, this, instance);
    Ok(())
}

fn take_special<T: ScriptClass>(env: &dyn HostEnv, external: HostValue) -> Option<T> {
    let payload = env.read_external(external)?;
    let special = payload.downcast_ref::<SpecialConstruct<T>>()?;
    special.take()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockEnv;
    use crate::value::HostValue;

    struct Widget {
        size: i32,
    }

    impl ScriptClass for Widget {
        fn properties() -> PropertyList<Self> {
            PropertyList::new().getter("size", |w: &Widget, _| Ok(HostValue::i32(w.size)))
        }

        fn construct(_env: &dyn HostEnv, call: &CallContext<'_>) -> BindResult<Self> {
            let size = call
                .get(0)
                .and_then(|v| v.as_i32())
                .ok_or_else(|| BindError::Argument("expected integer size".into()))?;
            Ok(Widget { size })
        }
    }

    struct Broken;

    impl ScriptClass for Broken {
        fn properties() -> PropertyList<Self> {
            PropertyList::new()
                .method("go", |_, _, _| Ok(HostValue::null()))
                .method("go", |_, _, _| Ok(HostValue::null()))
        }
    }

    #[test]
    fn test_binding_memoized() {
        let env = MockEnv::new();
        let first = binding_for::<Widget>(&env).unwrap();
        let second = binding_for::<Widget>(&env).unwrap();
        assert_eq!(first.constructor, second.constructor);
        assert!(first.token.matches(second.token.value()));
        assert!(Rc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_declaration_error_caches_nothing() {
        let env = MockEnv::new();
        let err = binding_for::<Broken>(&env).unwrap_err();
        assert!(matches!(err, BindError::DuplicateProperty { .. }));
        assert!(env.instance_data(ClassId::of::<Broken>()).is_none());

        // Retry re-attempts full construction and fails the same way.
        let err = binding_for::<Broken>(&env).unwrap_err();
        assert!(matches!(err, BindError::DuplicateProperty { .. }));
    }

    #[test]
    fn test_registration_failure_is_retryable() {
        let env = MockEnv::new();
        env.fail_next_define_class("out of memory");
        let err = binding_for::<Widget>(&env).unwrap_err();
        assert!(matches!(err, BindError::Registration(_)));
        assert!(env.instance_data(ClassId::of::<Widget>()).is_none());

        // Transient condition cleared; the retry performs full registration.
        let binding = binding_for::<Widget>(&env).unwrap();
        assert!(binding.constructor.is_handle());
    }

    #[test]
    fn test_class_ids_distinct() {
        assert_ne!(ClassId::of::<Widget>(), ClassId::of::<Broken>());
        assert_eq!(ClassId::of::<Widget>(), ClassId::of::<Widget>());
    }

    #[test]
    fn test_default_name_strips_path() {
        assert_eq!(Widget::name(), "Widget");
    }
}
