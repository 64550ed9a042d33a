//! End-to-end tests of class registration, construction, and dispatch
//! against the in-memory environment.

use std::rc::Rc;

use hostbind::{
    binding_for, constructor_of, translate, unwrap, wrap_existing, BindError, BindResult,
    CallContext, ClassId, ErrorKind, HostEnv, HostValue, MockEnv, PropertyList, ScriptClass,
};

#[derive(Debug)]
struct Counter {
    value: i32,
}

impl ScriptClass for Counter {
    fn properties() -> PropertyList<Self> {
        PropertyList::new()
            .method("increment", |c: &mut Counter, _env, _call| {
                c.value += 1;
                Ok(HostValue::i32(c.value))
            })
            .accessor(
                "value",
                |c, _env| Ok(HostValue::i32(c.value)),
                |c, _env, v| {
                    c.value = v.as_i32().ok_or_else(|| BindError::TypeMismatch {
                        expected: "i32".to_string(),
                        got: v.type_name(),
                    })?;
                    Ok(())
                },
            )
    }

    fn construct(_env: &dyn HostEnv, call: &CallContext<'_>) -> BindResult<Self> {
        if call.len() != 1 {
            return Err(BindError::Argument(format!(
                "expected 1 argument, got {}",
                call.len()
            )));
        }
        let start = call.args[0].as_i32().ok_or_else(|| BindError::TypeMismatch {
            expected: "i32".to_string(),
            got: call.args[0].type_name(),
        })?;
        Ok(Counter { value: start })
    }
}

struct Other;

impl ScriptClass for Other {
    fn properties() -> PropertyList<Self> {
        PropertyList::new().method("poke", |_, _, _| Ok(HostValue::bool(true)))
    }

    fn construct(_env: &dyn HostEnv, _call: &CallContext<'_>) -> BindResult<Self> {
        Ok(Other)
    }
}

/// Only ever handed to script code from the native side.
struct Session {
    id: i32,
}

impl ScriptClass for Session {
    fn properties() -> PropertyList<Self> {
        PropertyList::new().getter("id", |s: &Session, _| Ok(HostValue::i32(s.id)))
    }
}

#[test]
fn counter_scenario() {
    let env = MockEnv::new();
    let ctor = constructor_of::<Counter>(&env).unwrap();

    let counter = env.construct(ctor, &[HostValue::i32(5)]).unwrap();
    assert_eq!(
        env.call_member(counter, "increment", &[]).unwrap(),
        HostValue::i32(6)
    );
    assert_eq!(
        env.call_member(counter, "increment", &[]).unwrap(),
        HostValue::i32(7)
    );
    assert_eq!(
        env.get_property(counter, "value").unwrap(),
        HostValue::i32(7)
    );

    env.set_property(counter, "value", HostValue::i32(100)).unwrap();
    assert_eq!(
        env.get_property(counter, "value").unwrap(),
        HostValue::i32(100)
    );
}

#[test]
fn registry_idempotence() {
    let env = MockEnv::new();
    let first = binding_for::<Counter>(&env).unwrap();
    for _ in 0..8 {
        let again = binding_for::<Counter>(&env).unwrap();
        assert_eq!(again.constructor, first.constructor);
        assert!(again.token.matches(first.token.value()));
    }
    assert_eq!(constructor_of::<Counter>(&env).unwrap(), first.constructor);
}

#[test]
fn environments_do_not_share_bindings() {
    let env_a = MockEnv::new();
    let env_b = MockEnv::new();

    let a = binding_for::<Counter>(&env_a).unwrap();
    // Registration in one environment leaves the other untouched.
    assert!(env_b.instance_data(ClassId::of::<Counter>()).is_none());

    let b = binding_for::<Counter>(&env_b).unwrap();
    assert!(!Rc::ptr_eq(&a, &b));
}

#[test]
fn capability_token_cannot_be_forged() {
    let env = MockEnv::new();
    let ctor = constructor_of::<Counter>(&env).unwrap();

    // Script code can mint its own symbols and externals, but never one
    // identity-equal to the class token, so the call lands on the public
    // constructor and fails its ordinary argument validation.
    let forged = env
        .create_symbol("internal constructor marker for class 'Counter'")
        .unwrap();
    let smuggled = env.create_external(Rc::new(Counter { value: 0 })).unwrap();
    let err = env.construct(ctor, &[forged, smuggled]).unwrap_err();
    assert!(matches!(err, BindError::Argument(_)));
    assert!(!matches!(err, BindError::InvalidInternalCall { .. }));
}

#[test]
fn token_with_bad_payload_never_falls_through() {
    let env = MockEnv::new();
    let binding = binding_for::<Counter>(&env).unwrap();
    let token = binding.token.value();

    // Real token, payload of the wrong type.
    let garbage = env.create_external(Rc::new("garbage")).unwrap();
    let err = env.construct(binding.constructor, &[token, garbage]).unwrap_err();
    assert!(matches!(err, BindError::InvalidInternalCall { class: "Counter" }));

    // Real token, second argument not an external at all.
    let err = env
        .construct(binding.constructor, &[token, HostValue::i32(1)])
        .unwrap_err();
    assert!(matches!(err, BindError::InvalidInternalCall { class: "Counter" }));
    assert_eq!(err.kind(), ErrorKind::Invocation);
}

#[test]
fn wrap_round_trip() {
    let env = MockEnv::new();
    let object = wrap_existing(&env, Counter { value: 33 }).unwrap();

    let cell = unwrap::<Counter>(&env, object).unwrap();
    assert_eq!(cell.borrow().value, 33);

    // The wrapped object is fully functional: methods dispatch into the
    // same instance.
    assert_eq!(
        env.call_member(object, "increment", &[]).unwrap(),
        HostValue::i32(34)
    );
    assert_eq!(cell.borrow().value, 34);
}

#[test]
fn wrap_existing_bypasses_public_constructor() {
    let env = MockEnv::new();

    // Session declares no public constructor: `new Session()` fails...
    let ctor = constructor_of::<Session>(&env).unwrap();
    let err = env.construct(ctor, &[]).unwrap_err();
    assert!(matches!(err, BindError::NotConstructible { class: "Session" }));

    // ...but the native side can still project an existing instance.
    let object = wrap_existing(&env, Session { id: 7 }).unwrap();
    assert_eq!(env.get_property(object, "id").unwrap(), HostValue::i32(7));
}

#[test]
fn descriptor_order_is_declaration_order() {
    let env = MockEnv::new();
    let ctor = constructor_of::<Counter>(&env).unwrap();
    assert_eq!(env.property_names(ctor), ["increment", "value"]);
}

#[test]
fn method_called_through_foreign_object_fails_closed() {
    let env = MockEnv::new();
    let other_ctor = constructor_of::<Other>(&env).unwrap();
    let other = env.construct(other_ctor, &[]).unwrap();

    // `Function.prototype.call`-style trick: Counter's own increment
    // callback invoked with an Other-wrapped receiver.
    let descriptors = translate(Counter::properties()).unwrap();
    let increment = descriptors[0].method.as_ref().unwrap();
    let err = increment(&env, &CallContext::new(Some(other), &[])).unwrap_err();
    assert!(matches!(err, BindError::NotWrapped { class: "Counter" }));
    assert_eq!(err.kind(), ErrorKind::Invocation);

    // And unwrapping to the wrong type fails the same way.
    let err = unwrap::<Counter>(&env, other).unwrap_err();
    assert!(matches!(err, BindError::NotWrapped { class: "Counter" }));
}

#[test]
fn method_without_receiver_is_a_catchable_error() {
    let env = MockEnv::new();
    let descriptors = translate(Counter::properties()).unwrap();
    let increment = descriptors[0].method.as_ref().unwrap();
    let err = increment(&env, &CallContext::new(None, &[])).unwrap_err();
    assert!(matches!(err, BindError::MissingReceiver { class: "Counter" }));
}

#[test]
fn setter_requires_exactly_one_argument() {
    let env = MockEnv::new();
    let descriptors = translate(Counter::properties()).unwrap();
    let setter = descriptors[1].setter.as_ref().unwrap();

    let ctor = constructor_of::<Counter>(&env).unwrap();
    let counter = env.construct(ctor, &[HostValue::i32(0)]).unwrap();

    let err = setter(&env, &CallContext::new(Some(counter), &[])).unwrap_err();
    assert!(matches!(err, BindError::Argument(_)));

    let two = [HostValue::i32(1), HostValue::i32(2)];
    let err = setter(&env, &CallContext::new(Some(counter), &two)).unwrap_err();
    assert!(matches!(err, BindError::Argument(_)));
}

#[test]
fn setter_type_errors_are_catchable() {
    let env = MockEnv::new();
    let ctor = constructor_of::<Counter>(&env).unwrap();
    let counter = env.construct(ctor, &[HostValue::i32(0)]).unwrap();

    let err = env
        .set_property(counter, "value", HostValue::bool(true))
        .unwrap_err();
    assert!(matches!(err, BindError::TypeMismatch { .. }));
    assert_eq!(err.kind(), ErrorKind::Invocation);
}

#[test]
fn construction_errors_propagate_to_caller() {
    let env = MockEnv::new();
    let ctor = constructor_of::<Counter>(&env).unwrap();

    let err = env.construct(ctor, &[]).unwrap_err();
    assert!(matches!(err, BindError::Argument(_)));

    let err = env.construct(ctor, &[HostValue::bool(true)]).unwrap_err();
    assert!(matches!(err, BindError::TypeMismatch { .. }));
}

#[test]
fn token_label_names_the_class() {
    let env = MockEnv::new();
    let binding = binding_for::<Counter>(&env).unwrap();
    let label = env.symbol_label(binding.token.value()).unwrap();
    assert!(label.contains("Counter"));
}
