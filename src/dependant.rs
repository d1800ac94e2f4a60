//! Live recalculation of data-bound expressions.
//!
//! A [`Dependant`] owns a parsed expression and its last value. Contexts keep a
//! [`DependantTable`] from binding name to weak handles, so dropping a dependant is enough
//! to stop its updates; dead handles are compacted away the next time the table is walked.

use crate::Error;
use crate::context::Context;
use crate::evaluator::{collect_symbols, parse_data_binding};
use crate::object::Object;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::{Rc, Weak};
use tracing::trace;

pub struct Dependant {
    expression: Object,
    value: RefCell<Object>,
    recalculations: Cell<usize>,
}

impl Dependant {
    pub fn new(expression: Object) -> Self {
        let value = expression.eval();
        Dependant {
            expression,
            value: RefCell::new(value),
            recalculations: Cell::new(0),
        }
    }

    pub fn expression(&self) -> &Object {
        &self.expression
    }

    /// Value as of the last recalculation
    pub fn value(&self) -> Object {
        self.value.borrow().clone()
    }

    /// Number of recalculations that changed the value
    pub fn recalculations(&self) -> usize {
        self.recalculations.get()
    }

    /// Re-evaluate the expression. Returns true when the value changed.
    pub fn recalculate(&self) -> bool {
        let updated = self.expression.eval();
        if *self.value.borrow() == updated {
            return false;
        }
        trace!("Dependant changed to {:?}", updated);
        self.value.replace(updated);
        self.recalculations.set(self.recalculations.get() + 1);
        true
    }
}

/// Parse `template` in `context` and register the result on every binding it reads
pub fn watch(context: &Rc<Context>, template: &str) -> Result<Rc<Dependant>, Error> {
    let expression = parse_data_binding(context, template)?;
    let dependant = Rc::new(Dependant::new(expression));
    for name in collect_symbols(dependant.expression()) {
        context
            .owning_context(&name)
            .add_dependant(&name, &dependant);
    }
    Ok(dependant)
}

/// Binding name to the dependants that read it
#[derive(Default)]
pub struct DependantTable {
    entries: HashMap<String, Vec<Weak<Dependant>>>,
}

impl DependantTable {
    pub fn add(&mut self, name: &str, dependant: &Rc<Dependant>) {
        self.entries
            .entry(name.to_string())
            .or_default()
            .push(Rc::downgrade(dependant));
    }

    /// Compact the handles for `name` and return the ones still alive
    pub fn live_dependants(&mut self, name: &str) -> Vec<Rc<Dependant>> {
        let Some(handles) = self.entries.get_mut(name) else {
            return Vec::new();
        };
        handles.retain(|handle| handle.strong_count() > 0);
        let live: Vec<Rc<Dependant>> = handles.iter().filter_map(Weak::upgrade).collect();
        if handles.is_empty() {
            self.entries.remove(name);
        }
        live
    }

    /// Recalculate every live dependant of `name`. Returns how many were recalculated.
    pub fn notify(&mut self, name: &str) -> usize {
        let live = self.live_dependants(name);
        for dependant in &live {
            dependant.recalculate();
        }
        live.len()
    }

    /// Drop every dead handle. Returns how many were removed.
    pub fn prune(&mut self) -> usize {
        let mut removed = 0;
        self.entries.retain(|_, handles| {
            let before = handles.len();
            handles.retain(|handle| handle.strong_count() > 0);
            removed += before - handles.len();
            !handles.is_empty()
        });
        removed
    }

    /// Live handles across all names
    pub fn len(&self) -> usize {
        self.entries
            .values()
            .flatten()
            .filter(|handle| handle.strong_count() > 0)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
