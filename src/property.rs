//! Property descriptor translation
//!
//! Turns a class's declarative, ordered list of methods and computed
//! properties into the host runtime's descriptor records. Each descriptor
//! carries a dispatch closure that recovers the typed native instance from
//! the call's `this` receiver before invoking the declared Rust callback, so
//! calling a method through a foreign or unwrapped object fails closed with
//! a catchable error.
//!
//! Translation is a pure function of its input: descriptor order matches
//! declaration order (observable through own-property enumeration), and
//! duplicate names are rejected before any registration side effect.

use std::rc::Rc;

use rustc_hash::FxHashSet;

use crate::class::ScriptClass;
use crate::env::{CallContext, HostEnv};
use crate::error::{BindError, BindResult};
use crate::value::HostValue;
use crate::wrap::this_instance;

// ============================================================================
// Attributes
// ============================================================================

/// Property attribute flags in the host runtime's descriptor model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attributes {
    /// Shows up in own-property enumeration
    pub enumerable: bool,
    /// Value slot may be reassigned by script code
    pub writable: bool,
    /// Descriptor may be redefined or deleted by script code
    pub configurable: bool,
}

impl Attributes {
    /// Default attributes for methods: writable and configurable, hidden
    /// from enumeration.
    pub const METHOD: Attributes = Attributes {
        enumerable: false,
        writable: true,
        configurable: true,
    };

    /// Default attributes for computed properties: enumerable, writable,
    /// configurable.
    pub const PROPERTY: Attributes = Attributes {
        enumerable: true,
        writable: true,
        configurable: true,
    };
}

// ============================================================================
// Declared property specs
// ============================================================================

/// Declared method body: receives the recovered instance, the environment,
/// and the full call.
pub type MethodFn<T> = Rc<dyn Fn(&mut T, &dyn HostEnv, &CallContext<'_>) -> BindResult<HostValue>>;

/// Declared getter body
pub type GetterFn<T> = Rc<dyn Fn(&T, &dyn HostEnv) -> BindResult<HostValue>>;

/// Declared setter body: receives the single assigned value
pub type SetterFn<T> = Rc<dyn Fn(&mut T, &dyn HostEnv, HostValue) -> BindResult<()>>;

enum PropertyKind<T> {
    Method(MethodFn<T>),
    Computed {
        get: GetterFn<T>,
        set: Option<SetterFn<T>>,
    },
}

/// One declared property of a class. Immutable once declared.
pub struct PropertySpec<T> {
    attributes: Attributes,
    kind: PropertyKind<T>,
}

impl<T: ScriptClass> PropertySpec<T> {
    /// Declare a method
    pub fn method(
        f: impl Fn(&mut T, &dyn HostEnv, &CallContext<'_>) -> BindResult<HostValue> + 'static,
    ) -> Self {
        PropertySpec {
            attributes: Attributes::METHOD,
            kind: PropertyKind::Method(Rc::new(f)),
        }
    }

    /// Declare a read-only computed property
    pub fn getter(f: impl Fn(&T, &dyn HostEnv) -> BindResult<HostValue> + 'static) -> Self {
        PropertySpec {
            attributes: Attributes::PROPERTY,
            kind: PropertyKind::Computed {
                get: Rc::new(f),
                set: None,
            },
        }
    }

    /// Declare a computed property with getter and setter
    pub fn accessor(
        get: impl Fn(&T, &dyn HostEnv) -> BindResult<HostValue> + 'static,
        set: impl Fn(&mut T, &dyn HostEnv, HostValue) -> BindResult<()> + 'static,
    ) -> Self {
        PropertySpec {
            attributes: Attributes::PROPERTY,
            kind: PropertyKind::Computed {
                get: Rc::new(get),
                set: Some(Rc::new(set)),
            },
        }
    }

    /// Override the default attributes
    pub fn with_attributes(mut self, attributes: Attributes) -> Self {
        self.attributes = attributes;
        self
    }
}

/// Ordered `name -> spec` declaration list for one class.
///
/// Order is preserved through translation and registration; it is what
/// script code observes when enumerating the prototype.
pub struct PropertyList<T> {
    entries: Vec<(String, PropertySpec<T>)>,
}

impl<T: ScriptClass> PropertyList<T> {
    /// Create an empty list
    pub fn new() -> Self {
        PropertyList {
            entries: Vec::new(),
        }
    }

    /// Append a named spec
    pub fn push(mut self, name: impl Into<String>, spec: PropertySpec<T>) -> Self {
        self.entries.push((name.into(), spec));
        self
    }

    /// Append a method with default attributes
    pub fn method(
        self,
        name: impl Into<String>,
        f: impl Fn(&mut T, &dyn HostEnv, &CallContext<'_>) -> BindResult<HostValue> + 'static,
    ) -> Self {
        self.push(name, PropertySpec::method(f))
    }

    /// Append a read-only computed property with default attributes
    pub fn getter(
        self,
        name: impl Into<String>,
        f: impl Fn(&T, &dyn HostEnv) -> BindResult<HostValue> + 'static,
    ) -> Self {
        self.push(name, PropertySpec::getter(f))
    }

    /// Append a computed property with getter and setter
    pub fn accessor(
        self,
        name: impl Into<String>,
        get: impl Fn(&T, &dyn HostEnv) -> BindResult<HostValue> + 'static,
        set: impl Fn(&mut T, &dyn HostEnv, HostValue) -> BindResult<()> + 'static,
    ) -> Self {
        self.push(name, PropertySpec::accessor(get, set))
    }

    /// Number of declared properties
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if no properties are declared
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T: ScriptClass> Default for PropertyList<T> {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Translated descriptors
// ============================================================================

/// Dispatch closure embedded in a descriptor. The environment invokes it for
/// method calls and property accesses, passing the receiver in the call.
pub type PropertyCallback = Rc<dyn Fn(&dyn HostEnv, &CallContext<'_>) -> BindResult<HostValue>>;

/// The host runtime's native record for one property slot.
///
/// Owns its callbacks: the environment retains the descriptor table for the
/// life of the class's constructor function, which keeps every closure
/// alive for as long as script code can reach the slot.
pub struct PropertyDescriptor {
    /// Property name
    pub name: String,
    /// Attribute flags
    pub attributes: Attributes,
    /// Callable slot (methods)
    pub method: Option<PropertyCallback>,
    /// Getter slot (computed properties)
    pub getter: Option<PropertyCallback>,
    /// Setter slot (computed properties that declared one)
    pub setter: Option<PropertyCallback>,
}

impl std::fmt::Debug for PropertyDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PropertyDescriptor")
            .field("name", &self.name)
            .field("attributes", &self.attributes)
            .field("method", &self.method.is_some())
            .field("getter", &self.getter.is_some())
            .field("setter", &self.setter.is_some())
            .finish()
    }
}

/// Translate a declaration list into the runtime's descriptor records.
///
/// Fails with [`BindError::DuplicateProperty`] before producing anything if
/// a name repeats.
pub fn translate<T: ScriptClass>(list: PropertyList<T>) -> BindResult<Vec<PropertyDescriptor>> {
    let mut seen = FxHashSet::default();
    for (name, _) in &list.entries {
        if !seen.insert(name.clone()) {
            return Err(BindError::DuplicateProperty {
                class: T::name(),
                name: name.clone(),
            });
        }
    }

    let mut descriptors = Vec::with_capacity(list.entries.len());
    for (name, spec) in list.entries {
        let descriptor = match spec.kind {
            PropertyKind::Method(f) => PropertyDescriptor {
                name,
                attributes: spec.attributes,
                method: Some(bind_method::<T>(f)),
                getter: None,
                setter: None,
            },
            PropertyKind::Computed { get, set } => PropertyDescriptor {
                name,
                attributes: spec.attributes,
                method: None,
                getter: Some(bind_getter::<T>(get)),
                setter: set.map(bind_setter::<T>),
            },
        };
        descriptors.push(descriptor);
    }
    Ok(descriptors)
}

fn bind_method<T: ScriptClass>(f: MethodFn<T>) -> PropertyCallback {
    Rc::new(move |env, call| {
        let cell = this_instance::<T>(env, call)?;
        let mut instance = cell
            .try_borrow_mut()
            .map_err(|_| BindError::InstanceBorrowed { class: T::name() })?;
        f(&mut instance, env, call)
    })
}

fn bind_getter<T: ScriptClass>(f: GetterFn<T>) -> PropertyCallback {
    Rc::new(move |env, call| {
        let cell = this_instance::<T>(env, call)?;
        let instance = cell
            .try_borrow()
            .map_err(|_| BindError::InstanceBorrowed { class: T::name() })?;
        f(&instance, env)
    })
}

fn bind_setter<T: ScriptClass>(f: SetterFn<T>) -> PropertyCallback {
    Rc::new(move |env, call| {
        if call.len() != 1 {
            return Err(BindError::Argument(format!(
                "expected 1 argument to setter, got {}",
                call.len()
            )));
        }
        let cell = this_instance::<T>(env, call)?;
        let mut instance = cell
            .try_borrow_mut()
            .map_err(|_| BindError::InstanceBorrowed { class: T::name() })?;
        f(&mut instance, env, call.args[0])?;
        Ok(HostValue::null())
    })
}
