//! Evaluation context: scoped bindings, resources and viewport metrics.
//!
//! A context chains to its parent, so a lookup walks outwards until a binding is found.
//! Bindings come in three kinds. Constants are inlined into expressions at parse time.
//! Writeable bindings are referenced through [`BoundSymbol`]s and changing them
//! recalculates the [`Dependant`](crate::dependant::Dependant)s registered on the context
//! that owns the binding.

use crate::Error;
use crate::dependant::{Dependant, DependantTable};
use crate::dimension::Metrics;
use crate::functions;
use crate::node::BoundSymbol;
use crate::object::{Object, ObjectType};
use crate::objectdata::ObjectData;
use std::any::Any;
use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::rc::{Rc, Weak};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingKind {
    /// Fixed for the lifetime of the context; inlined at parse time
    Constant,
    /// Changed through [`Context::user_write`]
    UserWriteable,
    /// Changed by the runtime through [`Context::system_write`]
    SystemWriteable,
}

struct Binding {
    value: Object,
    kind: BindingKind,
}

/// Settings for a root context that do not come from the viewport
#[derive(Debug, Clone, PartialEq)]
pub struct RootConfig {
    pub agent_name: String,
    pub agent_version: String,
    /// Milliseconds since the Unix epoch
    pub utc_time: f64,
    /// Milliseconds added to `utc_time` to get local time
    pub local_time_adjustment: f64,
    pub disallow_video: bool,
    pub reduce_motion: bool,
}

impl Default for RootConfig {
    fn default() -> Self {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_millis() as f64)
            .unwrap_or(0.0);
        RootConfig {
            agent_name: "Unknown".to_string(),
            agent_version: "1.0".to_string(),
            utc_time: now,
            local_time_adjustment: 0.0,
            disallow_video: false,
            reduce_motion: false,
        }
    }
}

pub struct Context {
    parent: Option<Rc<Context>>,
    bindings: RefCell<HashMap<String, Binding>>,
    metrics: Rc<Metrics>,
    config: Rc<RootConfig>,
    dependants: RefCell<DependantTable>,
}

impl Context {
    /// Root context with the viewport, environment, time and builtin library bindings
    pub fn create_root(metrics: Metrics, config: RootConfig) -> Rc<Context> {
        let context = Rc::new(Context {
            parent: None,
            bindings: RefCell::new(HashMap::new()),
            metrics: Rc::new(metrics),
            config: Rc::new(config),
            dependants: RefCell::new(DependantTable::default()),
        });
        context.put_constant("viewport", viewport_object(&context.metrics));
        context.put_constant("environment", environment_object(&context.config));
        context.put_constant("utcTime", Object::from(context.config.utc_time));
        context.put_constant(
            "localTime",
            Object::from(context.config.utc_time + context.config.local_time_adjustment),
        );
        functions::install(&context);
        context
    }

    /// Root context for a 1024x800 viewport at 160 dpi
    pub fn create_test_context() -> Rc<Context> {
        let config = RootConfig {
            utc_time: 0.0,
            ..RootConfig::default()
        };
        Context::create_root(Metrics::default(), config)
    }

    pub fn create_child(parent: &Rc<Context>) -> Rc<Context> {
        Rc::new(Context {
            parent: Some(Rc::clone(parent)),
            bindings: RefCell::new(HashMap::new()),
            metrics: Rc::clone(&parent.metrics),
            config: Rc::clone(&parent.config),
            dependants: RefCell::new(DependantTable::default()),
        })
    }

    pub fn parent(&self) -> Option<&Rc<Context>> {
        self.parent.as_ref()
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn config(&self) -> &RootConfig {
        &self.config
    }

    fn put(&self, name: &str, value: Object, kind: BindingKind) {
        self.bindings
            .borrow_mut()
            .insert(name.to_string(), Binding { value, kind });
    }

    pub fn put_constant(&self, name: &str, value: Object) {
        self.put(name, value, BindingKind::Constant);
    }

    pub fn put_user_writeable(&self, name: &str, value: Object) {
        self.put(name, value, BindingKind::UserWriteable);
    }

    pub fn put_system_writeable(&self, name: &str, value: Object) {
        self.put(name, value, BindingKind::SystemWriteable);
    }

    /// Resources are constants referenced as `@name`
    pub fn put_resource(&self, name: &str, value: Object) {
        self.put_constant(&format!("@{}", name), value);
    }

    /// The nearest context in the chain that binds `name`
    fn owner(&self, name: &str) -> Option<&Context> {
        let mut current = self;
        loop {
            if current.bindings.borrow().contains_key(name) {
                return Some(current);
            }
            current = current.parent.as_deref()?;
        }
    }

    pub fn has(&self, name: &str) -> bool {
        self.owner(name).is_some()
    }

    pub fn get(&self, name: &str) -> Option<Object> {
        let owner = self.owner(name)?;
        owner
            .bindings
            .borrow()
            .get(name)
            .map(|binding| binding.value.clone())
    }

    /// Value of `name`, or null when nothing binds it
    pub fn opt(&self, name: &str) -> Object {
        self.get(name).unwrap_or_default()
    }

    /// Value of `name`, failing when nothing in the chain binds it
    pub fn require(&self, name: &str) -> Result<Object, Error> {
        self.get(name)
            .ok_or_else(|| Error::UnknownBinding(name.to_string()))
    }

    pub fn kind(&self, name: &str) -> Option<BindingKind> {
        let owner = self.owner(name)?;
        owner.bindings.borrow().get(name).map(|binding| binding.kind)
    }

    /// Parse-time view of a symbol: constants become their value, writeable bindings become
    /// a [`BoundSymbol`] on the owning context, unknown names become null
    pub fn resolve_symbol(self: &Rc<Self>, name: &str) -> Object {
        let mut current = self;
        loop {
            let kind = current.bindings.borrow().get(name).map(|binding| binding.kind);
            match kind {
                Some(BindingKind::Constant) => return current.opt(name),
                Some(_) => return BoundSymbol::create(current, name),
                None => match &current.parent {
                    Some(parent) => current = parent,
                    None => {
                        debug!("Unknown symbol '{}'", name);
                        return Object::Null;
                    }
                },
            }
        }
    }

    /// The context whose dependants should hear about changes to `name`
    pub fn owning_context(self: &Rc<Self>, name: &str) -> Rc<Context> {
        let mut current = self;
        while !current.bindings.borrow().contains_key(name) {
            match &current.parent {
                Some(parent) => current = parent,
                None => return Rc::clone(self),
            }
        }
        Rc::clone(current)
    }

    fn write(&self, name: &str, value: Object, allowed: &[BindingKind]) -> bool {
        let Some(owner) = self.owner(name) else {
            debug!("Write to unknown binding '{}'", name);
            return false;
        };
        {
            let mut bindings = owner.bindings.borrow_mut();
            let Some(binding) = bindings.get_mut(name) else {
                return false;
            };
            if !allowed.contains(&binding.kind) {
                debug!("Binding '{}' is {:?} and cannot be written", name, binding.kind);
                return false;
            }
            if binding.value == value {
                return true;
            }
            binding.value = value;
        }
        owner.notify(name);
        true
    }

    /// Change a user-writeable binding. Returns false when `name` is missing or not
    /// user-writeable.
    pub fn user_write(&self, name: &str, value: Object) -> bool {
        self.write(name, value, &[BindingKind::UserWriteable])
    }

    /// Change any writeable binding
    pub fn system_write(&self, name: &str, value: Object) -> bool {
        self.write(
            name,
            value,
            &[BindingKind::UserWriteable, BindingKind::SystemWriteable],
        )
    }

    pub fn add_dependant(&self, name: &str, dependant: &Rc<Dependant>) {
        self.dependants.borrow_mut().add(name, dependant);
    }

    /// Live dependants registered on this context
    pub fn dependant_count(&self) -> usize {
        self.dependants.borrow().len()
    }

    fn notify(&self, name: &str) {
        // Recalculation reads bindings, so the table must not stay borrowed
        let live = self.dependants.borrow_mut().live_dependants(name);
        for dependant in live {
            dependant.recalculate();
        }
    }

    /// Every visible binding name, innermost shadowing outermost
    pub fn names(&self) -> BTreeSet<String> {
        let mut names = BTreeSet::new();
        let mut current = Some(self);
        while let Some(context) = current {
            names.extend(context.bindings.borrow().keys().cloned());
            current = context.parent.as_deref();
        }
        names
    }

    /// Wrap the context as a map-like object
    pub fn as_object(self: &Rc<Self>) -> Object {
        Object::from_data(
            ObjectType::Context,
            Rc::new(ContextHandle {
                context: Rc::downgrade(self),
            }),
        )
    }
}

fn viewport_object(metrics: &Metrics) -> Object {
    let mut viewport = BTreeMap::new();
    viewport.insert("width".to_string(), Object::from(metrics.width_dp()));
    viewport.insert("height".to_string(), Object::from(metrics.height_dp()));
    viewport.insert("pixelWidth".to_string(), Object::from(metrics.width));
    viewport.insert("pixelHeight".to_string(), Object::from(metrics.height));
    viewport.insert("dpi".to_string(), Object::from(metrics.dpi));
    viewport.insert("shape".to_string(), Object::from(metrics.shape.as_str()));
    viewport.insert("theme".to_string(), Object::from(metrics.theme.as_str()));
    viewport.insert("mode".to_string(), Object::from(metrics.mode.as_str()));
    Object::map(viewport)
}

fn environment_object(config: &RootConfig) -> Object {
    let mut environment = BTreeMap::new();
    environment.insert("agentName".to_string(), Object::from(config.agent_name.as_str()));
    environment.insert(
        "agentVersion".to_string(),
        Object::from(config.agent_version.as_str()),
    );
    environment.insert("disallowVideo".to_string(), Object::from(config.disallow_video));
    environment.insert("reduceMotion".to_string(), Object::from(config.reduce_motion));
    Object::map(environment)
}

/// Context payload; holds the context weakly
struct ContextHandle {
    context: Weak<Context>,
}

impl ObjectData for ContextHandle {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn get(&self, key: &str) -> Object {
        self.context
            .upgrade()
            .map(|context| context.opt(key))
            .unwrap_or_default()
    }

    fn has(&self, key: &str) -> bool {
        self.context
            .upgrade()
            .is_some_and(|context| context.has(key))
    }

    fn keys(&self) -> Vec<String> {
        self.context
            .upgrade()
            .map(|context| context.names().into_iter().collect())
            .unwrap_or_default()
    }

    fn size(&self) -> usize {
        self.keys().len()
    }

    fn debug_string(&self) -> String {
        match self.context.upgrade() {
            Some(context) => format!("Context<{} bindings>", context.names().len()),
            None => "Context<released>".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_require() {
        let context = Context::create_test_context();
        context.put_constant("answer", Object::from(42));
        assert_eq!(context.require("answer"), Ok(Object::from(42)));
        assert_eq!(
            context.require("question"),
            Err(Error::UnknownBinding("question".to_string()))
        );
    }

    #[test]
    fn test_child_lookup_and_shadowing() {
        let root = Context::create_test_context();
        root.put_constant("a", Object::from(1));
        root.put_constant("b", Object::from(2));
        let child = Context::create_child(&root);
        child.put_constant("b", Object::from(20));

        assert_eq!(child.opt("a"), Object::from(1));
        assert_eq!(child.opt("b"), Object::from(20));
        assert_eq!(root.opt("b"), Object::from(2));
        assert_eq!(child.opt("missing"), Object::Null);
        assert_eq!(child.get("missing"), None);
        assert!(child.has("Math"));
        assert_eq!(child.metrics().width, 1024.0);
    }

    #[test]
    fn test_resolve_symbol() {
        let root = Context::create_test_context();
        root.put_constant("fixed", Object::from(5));
        root.put_user_writeable("live", Object::from(6));
        let child = Context::create_child(&root);

        assert_eq!(child.resolve_symbol("fixed"), Object::from(5));
        let live = child.resolve_symbol("live");
        assert!(live.is_bound_symbol());
        assert_eq!(live.eval(), Object::from(6));
        assert_eq!(child.resolve_symbol("nothing"), Object::Null);
        assert!(Rc::ptr_eq(&child.owning_context("live"), &root));
        assert!(Rc::ptr_eq(&child.owning_context("nothing"), &child));
    }

    #[test]
    fn test_write_permissions() {
        let context = Context::create_test_context();
        context.put_constant("c", Object::from(1));
        context.put_user_writeable("u", Object::from(1));
        context.put_system_writeable("s", Object::from(1));

        assert!(!context.user_write("c", Object::from(2)));
        assert!(context.user_write("u", Object::from(2)));
        assert!(!context.user_write("s", Object::from(2)));
        assert!(context.system_write("s", Object::from(3)));
        assert!(!context.user_write("unknown", Object::from(2)));

        assert_eq!(context.opt("c"), Object::from(1));
        assert_eq!(context.opt("u"), Object::from(2));
        assert_eq!(context.opt("s"), Object::from(3));
        assert_eq!(context.kind("s"), Some(BindingKind::SystemWriteable));
    }

    #[test]
    fn test_child_writes_reach_owner() {
        let root = Context::create_test_context();
        root.put_user_writeable("count", Object::from(0));
        let child = Context::create_child(&root);
        assert!(child.user_write("count", Object::from(7)));
        assert_eq!(root.opt("count"), Object::from(7));
    }

    #[test]
    fn test_viewport_and_environment() {
        let metrics = Metrics::new(1280.0, 800.0, 320.0).with_theme("light");
        let config = RootConfig {
            agent_name: "tests".to_string(),
            utc_time: 1000.0,
            local_time_adjustment: 3600000.0,
            ..RootConfig::default()
        };
        let context = Context::create_root(metrics, config);
        let viewport = context.opt("viewport");
        assert_eq!(viewport.get("width"), Object::from(640.0));
        assert_eq!(viewport.get("pixelWidth"), Object::from(1280.0));
        assert_eq!(viewport.get("theme"), Object::from("light"));
        assert_eq!(viewport.get("shape"), Object::from("rectangle"));
        assert_eq!(context.opt("environment").get("agentName"), Object::from("tests"));
        assert_eq!(context.opt("environment").get("agentVersion"), Object::from("1.0"));
        assert_eq!(context.opt("utcTime"), Object::from(1000.0));
        assert_eq!(context.opt("localTime"), Object::from(3601000.0));
    }

    #[test]
    fn test_resources() {
        let context = Context::create_test_context();
        context.put_resource("accent", Object::from("red"));
        assert_eq!(context.opt("@accent"), Object::from("red"));
        assert_eq!(context.resolve_symbol("@accent"), Object::from("red"));
    }

    #[test]
    fn test_context_as_object() {
        let root = Context::create_test_context();
        root.put_constant("name", Object::from("Fred"));
        let object = root.as_object();
        assert!(object.is_map());
        assert_eq!(object.get("name"), Object::from("Fred"));
        assert!(object.has("viewport"));
        assert!(object.keys().contains(&"name".to_string()));
        assert_eq!(object, object.clone());
        assert_ne!(object, root.as_object());
    }
}
