//! MockEnv — in-memory host environment for tests and binding prototypes
//!
//! A small, single-threaded model of the host runtime: it mints canonical
//! handles for symbols, externals, classes, and objects, applies `new` by
//! invoking the registered constructor trampoline, dispatches member calls
//! and property accesses through the stored descriptor tables, and runs
//! finalizers when told an object was collected.
//!
//! This is not a script engine. It exists so the binding layer can be
//! exercised end to end — construction, dispatch, wrapping, finalization —
//! without embedding a real VM.

use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::class::{ClassBinding, ClassId};
use crate::env::{CallContext, ConstructorFn, FinalizerFn, HostEnv};
use crate::error::{BindError, BindResult};
use crate::property::{PropertyCallback, PropertyDescriptor};
use crate::value::HostValue;

struct ClassRecord {
    name: String,
    constructor: ConstructorFn,
    data: Rc<dyn Any>,
    descriptors: Vec<PropertyDescriptor>,
}

struct ObjectRecord {
    /// Constructor-function handle id of the class that built this object;
    /// `None` for bare objects.
    class: Option<u64>,
    wrapped: FxHashMap<ClassId, Rc<dyn Any>>,
    finalizers: Vec<FinalizerFn>,
}

#[derive(Default)]
struct State {
    next_id: u64,
    symbols: FxHashMap<u64, String>,
    externals: FxHashMap<u64, Rc<dyn Any>>,
    classes: FxHashMap<u64, Rc<ClassRecord>>,
    objects: FxHashMap<u64, ObjectRecord>,
    bindings: FxHashMap<ClassId, Rc<ClassBinding>>,
    fail_next_define: Option<String>,
}

/// In-memory, single-threaded implementation of [`HostEnv`].
#[derive(Default)]
pub struct MockEnv {
    state: RefCell<State>,
}

impl MockEnv {
    /// Create an empty environment
    pub fn new() -> Self {
        Self::default()
    }

    fn alloc_id(state: &mut State) -> u64 {
        state.next_id += 1;
        state.next_id
    }

    /// Make the next `define_class` call fail with a registration error,
    /// simulating a transient runtime condition such as resource exhaustion.
    pub fn fail_next_define_class(&self, message: &str) {
        self.state.borrow_mut().fail_next_define = Some(message.to_string());
    }

    /// Allocate a plain object with no class, for direct attach/lookup tests
    pub fn alloc_bare_object(&self) -> HostValue {
        let mut state = self.state.borrow_mut();
        let id = Self::alloc_id(&mut state);
        state.objects.insert(
            id,
            ObjectRecord {
                class: None,
                wrapped: FxHashMap::default(),
                finalizers: Vec::new(),
            },
        );
        HostValue::handle(id)
    }

    /// Debug label of a symbol handle, if `value` is one
    pub fn symbol_label(&self, value: HostValue) -> Option<String> {
        let id = value.handle_id()?;
        self.state.borrow().symbols.get(&id).cloned()
    }

    /// Check whether an object handle has not been collected
    pub fn is_live(&self, object: HostValue) -> bool {
        match object.handle_id() {
            Some(id) => self.state.borrow().objects.contains_key(&id),
            None => false,
        }
    }

    /// Property names of a registered class, in descriptor order
    pub fn property_names(&self, constructor: HostValue) -> Vec<String> {
        let state = self.state.borrow();
        let record = constructor
            .handle_id()
            .and_then(|id| state.classes.get(&id));
        match record {
            Some(record) => record.descriptors.iter().map(|d| d.name.clone()).collect(),
            None => Vec::new(),
        }
    }

    /// Simulate a script-side method call: `object.name(args...)`
    pub fn call_member(
        &self,
        object: HostValue,
        name: &str,
        args: &[HostValue],
    ) -> BindResult<HostValue> {
        let callback = self.member_slot(object, name, |d| d.method.clone())?;
        callback(self, &CallContext::new(Some(object), args))
    }

    /// Simulate a script-side property read: `object.name`
    pub fn get_property(&self, object: HostValue, name: &str) -> BindResult<HostValue> {
        let callback = self.member_slot(object, name, |d| d.getter.clone())?;
        callback(self, &CallContext::new(Some(object), &[]))
    }

    /// Simulate a script-side property write: `object.name = value`
    pub fn set_property(
        &self,
        object: HostValue,
        name: &str,
        value: HostValue,
    ) -> BindResult<()> {
        let callback = self.member_slot(object, name, |d| d.setter.clone())?;
        callback(self, &CallContext::new(Some(object), &[value]))?;
        Ok(())
    }

    /// Run the object's finalizers and reclaim its handle, as the collector
    /// would once the object becomes unreachable. Each object is collected
    /// exactly once.
    pub fn collect(&self, object: HostValue) {
        let id = object
            .handle_id()
            .expect("collect of a non-object value");
        let finalizers = {
            let mut state = self.state.borrow_mut();
            let record = state
                .objects
                .get_mut(&id)
                .expect("collect of an unknown or already collected object");
            std::mem::take(&mut record.finalizers)
        };
        for release in finalizers {
            release(self);
        }
        self.state.borrow_mut().objects.remove(&id);
    }

    fn member_slot(
        &self,
        object: HostValue,
        name: &str,
        pick: impl Fn(&PropertyDescriptor) -> Option<PropertyCallback>,
    ) -> BindResult<PropertyCallback> {
        let record = {
            let state = self.state.borrow();
            object
                .handle_id()
                .and_then(|id| state.objects.get(&id))
                .and_then(|object| object.class)
                .and_then(|class| state.classes.get(&class))
                .cloned()
        };
        let record = record
            .ok_or_else(|| BindError::Argument(format!("'{name}' called on a classless value")))?;
        let descriptor = record
            .descriptors
            .iter()
            .find(|d| d.name == name)
            .ok_or_else(|| {
                BindError::Argument(format!("no property '{name}' on class '{}'", record.name))
            })?;
        pick(descriptor).ok_or_else(|| {
            BindError::Argument(format!(
                "property '{name}' on class '{}' does not support this access",
                record.name
            ))
        })
    }
}

impl HostEnv for MockEnv {
    fn create_symbol(&self, label: &str) -> BindResult<HostValue> {
        let mut state = self.state.borrow_mut();
        let id = Self::alloc_id(&mut state);
        state.symbols.insert(id, label.to_string());
        Ok(HostValue::handle(id))
    }

    fn define_class(
        &self,
        name: &str,
        constructor: ConstructorFn,
        data: Rc<dyn Any>,
        descriptors: Vec<PropertyDescriptor>,
    ) -> BindResult<HostValue> {
        let mut state = self.state.borrow_mut();
        if let Some(message) = state.fail_next_define.take() {
            return Err(BindError::Registration(message));
        }
        if name.is_empty() || name.contains('\0') {
            return Err(BindError::Registration(format!(
                "runtime rejected class name '{name}'"
            )));
        }
        let id = Self::alloc_id(&mut state);
        state.classes.insert(
            id,
            Rc::new(ClassRecord {
                name: name.to_string(),
                constructor,
                data,
                descriptors,
            }),
        );
        Ok(HostValue::handle(id))
    }

    fn create_external(&self, payload: Rc<dyn Any>) -> BindResult<HostValue> {
        let mut state = self.state.borrow_mut();
        let id = Self::alloc_id(&mut state);
        state.externals.insert(id, payload);
        Ok(HostValue::handle(id))
    }

    fn read_external(&self, value: HostValue) -> Option<Rc<dyn Any>> {
        let id = value.handle_id()?;
        self.state.borrow().externals.get(&id).cloned()
    }

    fn construct(&self, constructor: HostValue, args: &[HostValue]) -> BindResult<HostValue> {
        let (class_id, record) = {
            let state = self.state.borrow();
            let id = constructor
                .handle_id()
                .ok_or_else(|| BindError::Argument("value is not a constructor".into()))?;
            let record = state
                .classes
                .get(&id)
                .cloned()
                .ok_or_else(|| BindError::Argument("value is not a constructor".into()))?;
            (id, record)
        };

        let object_id = {
            let mut state = self.state.borrow_mut();
            let id = Self::alloc_id(&mut state);
            state.objects.insert(
                id,
                ObjectRecord {
                    class: Some(class_id),
                    wrapped: FxHashMap::default(),
                    finalizers: Vec::new(),
                },
            );
            id
        };
        let object = HostValue::handle(object_id);

        let call = CallContext::new(Some(object), args);
        match (record.constructor)(self, &call, record.data.as_ref()) {
            Ok(()) => Ok(object),
            Err(err) => {
                // A failed construction never escapes as a live object.
                self.state.borrow_mut().objects.remove(&object_id);
                Err(err)
            }
        }
    }

    fn instance_data(&self, key: ClassId) -> Option<Rc<ClassBinding>> {
        self.state.borrow().bindings.get(&key).cloned()
    }

    fn set_instance_data(&self, key: ClassId, binding: Rc<ClassBinding>) {
        self.state.borrow_mut().bindings.insert(key, binding);
    }

    fn wrap_slot(&self, object: HostValue, key: ClassId) -> Option<Rc<dyn Any>> {
        let id = object.handle_id()?;
        let state = self.state.borrow();
        state.objects.get(&id)?.wrapped.get(&key).cloned()
    }

    fn set_wrap_slot(&self, object: HostValue, key: ClassId, instance: Rc<dyn Any>) {
        let id = object.handle_id().expect("wrap target is not an object");
        let mut state = self.state.borrow_mut();
        let record = state
            .objects
            .get_mut(&id)
            .expect("wrap target is an unknown object handle");
        record.wrapped.insert(key, instance);
    }

    fn clear_wrap_slot(&self, object: HostValue, key: ClassId) {
        if let Some(id) = object.handle_id() {
            let mut state = self.state.borrow_mut();
            if let Some(record) = state.objects.get_mut(&id) {
                record.wrapped.remove(&key);
            }
        }
    }

    fn register_finalizer(&self, object: HostValue, release: FinalizerFn) {
        let id = object
            .handle_id()
            .expect("finalizer target is not an object");
        let mut state = self.state.borrow_mut();
        let record = state
            .objects
            .get_mut(&id)
            .expect("finalizer target is an unknown object handle");
        record.finalizers.push(release);
    }
}
