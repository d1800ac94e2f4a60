//! Evaluable and callable payloads: expression-tree nodes, bound symbols and native functions.

use crate::Context;
use crate::builtinops::{ARRAY_ACCESS, BuiltinOp, FIELD_ACCESS};
use crate::object::{Object, ObjectType, Visitor};
use crate::objectdata::ObjectData;
use std::any::Any;
use std::rc::{Rc, Weak};
use tracing::{debug, trace};

/// An operator applied to its operands. Re-applies the operator on every `eval`, so operands
/// that are themselves evaluable contribute their current value.
pub struct Node {
    op: &'static BuiltinOp,
    operands: Vec<Object>,
}

/// Finds the first evaluable object in a tree
#[derive(Default)]
struct EvaluableFinder {
    found: bool,
}

impl Visitor for EvaluableFinder {
    fn visit(&mut self, object: &Object) {
        if object.is_evaluable() {
            self.found = true;
        }
    }

    fn is_aborted(&self) -> bool {
        self.found
    }
}

/// True when applying `op` to `operands` would always give the same result.
/// Selecting from a container never calls what it holds, so access ignores purity.
fn is_constant(op: &BuiltinOp, operands: &[Object]) -> bool {
    let selects = *op == FIELD_ACCESS || *op == ARRAY_ACCESS;
    if !selects && !operands.iter().all(Object::is_pure) {
        return false;
    }
    let mut finder = EvaluableFinder::default();
    for operand in operands {
        operand.accept(&mut finder);
        if finder.found {
            return false;
        }
    }
    true
}

impl Node {
    /// Build a node for `op`, or compute the value right away when the operands are constant
    pub fn create(op: &'static BuiltinOp, operands: Vec<Object>) -> Object {
        if is_constant(op, &operands) {
            let value = op.apply(&operands);
            trace!("Folded '{}' to {:?}", op.name, value);
            return value;
        }
        Object::from_data(ObjectType::Node, Rc::new(Node { op, operands }))
    }

    pub fn op(&self) -> &'static BuiltinOp {
        self.op
    }

    pub fn operands(&self) -> &[Object] {
        &self.operands
    }
}

impl ObjectData for Node {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn eval(&self) -> Object {
        self.op.apply(&self.operands)
    }

    fn is_pure(&self) -> bool {
        self.operands.iter().all(Object::is_pure)
    }

    fn accept_children(&self, visitor: &mut dyn Visitor) {
        for operand in &self.operands {
            operand.accept(visitor);
            if visitor.is_aborted() {
                break;
            }
        }
    }

    fn debug_string(&self) -> String {
        let body: String = self
            .operands
            .iter()
            .map(|operand| format!("{}, ", operand.to_debug_string()))
            .collect();
        format!("Node<{}>[{}]", self.op.name, body)
    }
}

type NativeFn = dyn Fn(&[Object]) -> Object;

/// A named native function. Impure functions (random numbers, clocks) are never folded.
pub struct Function {
    name: String,
    func: Box<NativeFn>,
    pure: bool,
}

impl Function {
    pub fn create(
        name: &str,
        func: impl Fn(&[Object]) -> Object + 'static,
        pure: bool,
    ) -> Object {
        Object::from_data(
            ObjectType::Function,
            Rc::new(Function {
                name: name.to_string(),
                func: Box::new(func),
                pure,
            }),
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl ObjectData for Function {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn call(&self, args: &[Object]) -> Object {
        (self.func)(args)
    }

    fn is_pure(&self) -> bool {
        self.pure
    }

    fn debug_string(&self) -> String {
        format!("Function<{}>", self.name)
    }
}

/// Reference to a writeable binding, read from its context on every `eval`.
/// Holds the context weakly; once the context is gone the symbol evaluates to null.
pub struct BoundSymbol {
    context: Weak<Context>,
    name: String,
}

impl BoundSymbol {
    pub fn create(context: &Rc<Context>, name: &str) -> Object {
        Object::from_data(
            ObjectType::BoundSymbol,
            Rc::new(BoundSymbol {
                context: Rc::downgrade(context),
                name: name.to_string(),
            }),
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The symbol name of a bound-symbol object
    pub fn name_of(object: &Object) -> Option<&str> {
        if !object.is_bound_symbol() {
            return None;
        }
        object
            .get_data()
            .as_any()
            .downcast_ref::<BoundSymbol>()
            .map(BoundSymbol::name)
    }
}

impl ObjectData for BoundSymbol {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn eval(&self) -> Object {
        match self.context.upgrade() {
            Some(context) => context.opt(&self.name),
            None => {
                debug!("Context for bound symbol '{}' no longer exists", self.name);
                Object::Null
            }
        }
    }

    fn debug_string(&self) -> String {
        format!("BoundSymbol<{}>", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtinops::{ADD, ARRAY_LITERAL, FUNCTION_CALL, MULTIPLY};
    use std::cell::Cell;

    #[test]
    fn test_constant_operands_fold() {
        let value = Node::create(&ADD, vec![Object::from(1), Object::from(2)]);
        assert!(!value.is_node());
        assert_eq!(value, Object::from(3));
    }

    #[test]
    fn test_bound_symbol_prevents_folding() {
        let context = Context::create_test_context();
        context.put_user_writeable("x", Object::from(4));
        let x = BoundSymbol::create(&context, "x");
        let node = Node::create(&MULTIPLY, vec![x, Object::from(2)]);
        assert!(node.is_node());
        assert_eq!(node.eval(), Object::from(8));

        context.user_write("x", Object::from(5));
        assert_eq!(node.eval(), Object::from(10));
    }

    #[test]
    fn test_nested_evaluable_prevents_folding() {
        let context = Context::create_test_context();
        context.put_user_writeable("x", Object::from(1));
        let list = Object::array(vec![Object::from(0), BoundSymbol::create(&context, "x")]);
        let node = Node::create(&ADD, vec![list, Object::from("!")]);
        assert!(node.is_node());
    }

    #[test]
    fn test_impure_call_is_not_folded() {
        let counter = Rc::new(Cell::new(0));
        let shared = Rc::clone(&counter);
        let tick = Function::create(
            "tick",
            move |_| {
                shared.set(shared.get() + 1);
                Object::from(shared.get())
            },
            false,
        );
        let node = Node::create(&FUNCTION_CALL, vec![tick, Object::empty_array()]);
        assert!(node.is_node());
        assert!(!node.is_pure());
        assert_eq!(node.eval(), Object::from(1));
        assert_eq!(node.eval(), Object::from(2));
        assert_eq!(counter.get(), 2);
    }

    #[test]
    fn test_container_of_impure_function_is_impure() {
        let tick = Function::create("tick", |_| Object::from(1), false);
        let list = Object::array(vec![Object::from(0), tick.clone()]);
        assert!(!list.is_pure());
        assert!(Object::array(vec![Object::from(0)]).is_pure());

        let mut entries = std::collections::BTreeMap::new();
        entries.insert("tick".to_string(), tick.clone());
        let library = Object::map(entries);
        assert!(!library.is_pure());

        // The literal holding the function stays a node
        let literal = Node::create(&ARRAY_LITERAL, vec![tick]);
        assert!(literal.is_node());

        // Selecting the function still folds; calling it does not
        let selected = Node::create(&FIELD_ACCESS, vec![library, Object::from("tick")]);
        assert!(selected.is_callable());
        let call = Node::create(&FUNCTION_CALL, vec![selected, Object::empty_array()]);
        assert!(call.is_node());
    }

    #[test]
    fn test_pure_call_folds() {
        let double = Function::create("double", |args| Object::from(args[0].as_number() * 2.0), true);
        let value = Node::create(
            &FUNCTION_CALL,
            vec![double, Object::array(vec![Object::from(21)])],
        );
        assert_eq!(value, Object::from(42));
    }

    #[test]
    fn test_nodes_compare_by_identity() {
        let context = Context::create_test_context();
        context.put_user_writeable("x", Object::from(1));
        let build = || Node::create(&ADD, vec![BoundSymbol::create(&context, "x"), Object::from(1)]);
        let a = build();
        let b = build();
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
        assert_eq!(a.eval(), b.eval());
    }

    #[test]
    fn test_bound_symbol_outlives_context() {
        let context = Context::create_test_context();
        context.put_user_writeable("x", Object::from(1));
        let symbol = BoundSymbol::create(&context, "x");
        assert_eq!(BoundSymbol::name_of(&symbol), Some("x"));
        drop(context);
        assert_eq!(symbol.eval(), Object::Null);
    }

    #[test]
    fn test_debug_strings() {
        let context = Context::create_test_context();
        context.put_user_writeable("x", Object::from(1));
        let node = Node::create(&ADD, vec![BoundSymbol::create(&context, "x"), Object::from(1)]);
        assert_eq!(node.to_debug_string(), "Node<+>[BoundSymbol<x>, 1.000000, ]");
        let f = Function::create("f", |_| Object::Null, true);
        assert_eq!(f.to_debug_string(), "Function<f>");
        assert_eq!(f.serialize(), serde_json::json!("UNABLE TO SERIALIZE"));
    }
}
