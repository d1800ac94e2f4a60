//! Deferred operator-precedence reduction.
//!
//! The grammar pushes values and operators as it recognizes them and calls one of the
//! reductions once a precedence level is complete:
//!
//! - [`Stack::reduce_lr`] folds the trailing run of same-order binary operators left to right
//! - [`Stack::reduce_unary`] folds trailing prefix operators, innermost first
//! - [`Stack::reduce_binary`] folds only the most recent operator (right-associative chains)
//! - [`Stack::reduce_ternary`] folds the `?`/`:` marker pair with its three operands
//!
//! [`Stacks`] keeps one [`Stack`] per region (quoted string, group, bracket, argument list).
//! Closing a region combines its values into one object that lands in the parent region, so
//! the region boundary is what delimits a variable-length argument list.

use crate::builtinops::{ARRAY_LITERAL, BuiltinOp, MERGE, Order, TERNARY};
use crate::node::Node;
use crate::object::Object;
use tracing::trace;

/// How a closed region turns its values into one object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CombineMode {
    /// Whole binding string: one value passes through untouched, several are merged
    TopString,
    /// Quoted string inside an expression; same rules as `TopString`
    EmbeddedString,
    /// Comma list: all values become one array
    Vector,
    /// Group or index: exactly one value
    Single,
}

/// Value and operator stacks of one region
#[derive(Default)]
pub struct Stack {
    objects: Vec<Object>,
    ops: Vec<&'static BuiltinOp>,
}

impl Stack {
    pub fn push_object(&mut self, object: Object) {
        trace!("push {:?}", object);
        self.objects.push(object);
    }

    pub fn push_op(&mut self, op: &'static BuiltinOp) {
        trace!("push op '{}'", op.name);
        self.ops.push(op);
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn pending_ops(&self) -> usize {
        self.ops.len()
    }

    fn pop_object(&mut self) -> Object {
        match self.objects.pop() {
            Some(object) => object,
            None => panic!("stack underflow: missing operand"),
        }
    }

    fn top_order(&self) -> Option<Order> {
        self.ops.last().map(|op| op.order)
    }

    /// Fold the trailing run of operators at `order` left to right
    pub fn reduce_lr(&mut self, order: Order) {
        let run = self.ops.iter().rev().take_while(|op| op.order == order).count();
        if run == 0 {
            return;
        }
        assert!(
            self.objects.len() > run,
            "stack underflow: {} operators at {:?} with {} operands",
            run,
            order,
            self.objects.len()
        );
        trace!("reduce_lr {:?} x{}", order, run);
        let right = self.objects.split_off(self.objects.len() - run);
        let ops = self.ops.split_off(self.ops.len() - run);
        let left = self.pop_object();
        let result = ops
            .into_iter()
            .zip(right)
            .fold(left, |acc, (op, operand)| Node::create(op, vec![acc, operand]));
        self.objects.push(result);
    }

    /// Fold trailing prefix operators at `order`, the one nearest the operand first
    pub fn reduce_unary(&mut self, order: Order) {
        while self.top_order() == Some(order) {
            let Some(op) = self.ops.pop() else { break };
            trace!("reduce_unary '{}'", op.name);
            let operand = self.pop_object();
            self.objects.push(Node::create(op, vec![operand]));
        }
    }

    /// Fold the most recent operator if it is at `order`. Returns true when it folded.
    pub fn reduce_binary(&mut self, order: Order) -> bool {
        if self.top_order() != Some(order) {
            return false;
        }
        let Some(op) = self.ops.pop() else {
            return false;
        };
        trace!("reduce_binary '{}'", op.name);
        let right = self.pop_object();
        let left = self.pop_object();
        self.objects.push(Node::create(op, vec![left, right]));
        true
    }

    /// Fold `condition ? then : else`. Both markers must be the top two operators.
    pub fn reduce_ternary(&mut self, order: Order) {
        let len = self.ops.len();
        assert!(
            len >= 2 && self.ops[len - 2].order == order && self.ops[len - 1].order == order,
            "ternary reduction without its two markers"
        );
        self.ops.truncate(len - 2);
        let else_branch = self.pop_object();
        let then_branch = self.pop_object();
        let condition = self.pop_object();
        trace!("reduce_ternary");
        self.objects.push(Node::create(
            &TERNARY,
            vec![condition, then_branch, else_branch],
        ));
    }

    /// Collapse the region into one object
    pub fn combine(mut self, mode: CombineMode) -> Object {
        assert!(
            self.ops.is_empty(),
            "{} unreduced operators at region close",
            self.ops.len()
        );
        trace!("combine {:?} with {} values", mode, self.objects.len());
        match mode {
            CombineMode::TopString | CombineMode::EmbeddedString => match self.objects.len() {
                0 => Object::from(""),
                1 => self.pop_object(),
                _ => Node::create(&MERGE, self.objects),
            },
            CombineMode::Vector => Node::create(&ARRAY_LITERAL, self.objects),
            CombineMode::Single => {
                assert_eq!(
                    self.objects.len(),
                    1,
                    "single-value region holds {} values",
                    self.objects.len()
                );
                self.pop_object()
            }
        }
    }
}

/// Stack of regions. Always holds at least the outermost region.
pub struct Stacks {
    regions: Vec<Stack>,
}

impl Default for Stacks {
    fn default() -> Self {
        Self::new()
    }
}

impl Stacks {
    pub fn new() -> Self {
        Stacks {
            regions: vec![Stack::default()],
        }
    }

    pub fn depth(&self) -> usize {
        self.regions.len()
    }

    fn current(&mut self) -> &mut Stack {
        match self.regions.last_mut() {
            Some(stack) => stack,
            None => panic!("no open region"),
        }
    }

    pub fn open(&mut self) {
        trace!("open region {}", self.regions.len());
        self.regions.push(Stack::default());
    }

    /// Combine the innermost region and push the result into its parent
    pub fn close(&mut self, mode: CombineMode) {
        assert!(self.regions.len() > 1, "close without a matching open");
        let Some(region) = self.regions.pop() else {
            return;
        };
        let value = region.combine(mode);
        self.current().push_object(value);
    }

    /// Combine the outermost region into the final value
    pub fn finish(mut self) -> Object {
        assert_eq!(self.regions.len(), 1, "regions left open at end of input");
        match self.regions.pop() {
            Some(region) => region.combine(CombineMode::TopString),
            None => Object::from(""),
        }
    }

    pub fn push_object(&mut self, object: Object) {
        self.current().push_object(object);
    }

    pub fn push_op(&mut self, op: &'static BuiltinOp) {
        self.current().push_op(op);
    }

    pub fn reduce_lr(&mut self, order: Order) {
        self.current().reduce_lr(order);
    }

    pub fn reduce_unary(&mut self, order: Order) {
        self.current().reduce_unary(order);
    }

    pub fn reduce_binary(&mut self, order: Order) -> bool {
        self.current().reduce_binary(order)
    }

    pub fn reduce_ternary(&mut self, order: Order) {
        self.current().reduce_ternary(order);
    }
}
