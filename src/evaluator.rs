//! Template layer: turning property strings into values.

use crate::Error;
use crate::context::Context;
use crate::node::BoundSymbol;
use crate::object::{Object, Visitor};
use crate::parser::parse;
use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;
use tracing::warn;

/// True when `source` contains at least one `${` marker
pub fn is_data_binding(source: &str) -> bool {
    source.contains("${")
}

/// Parse a property string without evaluating it.
///
/// Plain text comes back as a string. A string that is exactly one `${...}` keeps the
/// expression's own type; anything mixed becomes a string-valued node or constant.
pub fn parse_data_binding(context: &Rc<Context>, source: &str) -> Result<Object, Error> {
    if !is_data_binding(source) {
        return Ok(Object::from(source));
    }
    Ok(parse(context, source)?)
}

/// Parse and evaluate a property string.
///
/// A string that fails to parse is logged and returned unchanged.
pub fn evaluate(context: &Rc<Context>, source: &str) -> Object {
    match parse_data_binding(context, source) {
        Ok(value) => value.eval(),
        Err(err) => {
            warn!("Unable to parse '{}': {}", source, err);
            Object::from(source)
        }
    }
}

/// Evaluate strings as templates, descending into arrays and maps
pub fn evaluate_recursive(context: &Rc<Context>, value: &Object) -> Object {
    if value.is_string() {
        return evaluate(context, value.get_string());
    }
    if value.is_array() {
        let items = value
            .get_array()
            .iter()
            .map(|item| evaluate_recursive(context, item))
            .collect();
        return Object::array(items);
    }
    if value.is_map() {
        let entries: BTreeMap<String, Object> = value
            .keys()
            .into_iter()
            .map(|key| {
                let child = evaluate_recursive(context, &value.get(&key));
                (key, child)
            })
            .collect();
        return Object::map(entries);
    }
    value.clone()
}

#[derive(Default)]
struct SymbolCollector {
    names: BTreeSet<String>,
}

impl Visitor for SymbolCollector {
    fn visit(&mut self, object: &Object) {
        if let Some(name) = BoundSymbol::name_of(object) {
            self.names.insert(name.to_string());
        }
    }
}

/// Names of every bound symbol referenced by `expression`
pub fn collect_symbols(expression: &Object) -> BTreeSet<String> {
    let mut collector = SymbolCollector::default();
    expression.accept(&mut collector);
    collector.names
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_plain_strings_skip_the_parser() {
        let context = Context::create_test_context();
        // Unbalanced braces are fine without a marker
        assert_eq!(evaluate(&context, "a } b ) c"), Object::from("a } b ) c"));
        assert!(!is_data_binding("$ {x}"));
        assert!(is_data_binding("x${"));
    }

    #[test]
    fn test_single_binding_keeps_type() {
        let context = Context::create_test_context();
        context.put_user_writeable("width", Object::from(120));
        assert_eq!(evaluate(&context, "${width}"), Object::from(120));
        assert_eq!(evaluate(&context, "${width > 100}"), Object::from(true));
        assert_eq!(evaluate(&context, "${[width]}").size(), 1);
    }

    #[test]
    fn test_mixed_content_is_a_string() {
        let context = Context::create_test_context();
        context.put_user_writeable("width", Object::from(120));
        assert_eq!(evaluate(&context, "w=${width}"), Object::from("w=120"));
        assert_eq!(
            evaluate(&context, "${width}${width / 100}"),
            Object::from("1201.2")
        );
        assert_eq!(evaluate(&context, " ${true}"), Object::from(" true"));
    }

    #[test]
    fn test_parse_failure_falls_back_to_literal() {
        let context = Context::create_test_context();
        assert_eq!(evaluate(&context, "${1 +}"), Object::from("${1 +}"));
        assert!(parse_data_binding(&context, "${1 +}").is_err());
    }

    #[test]
    fn test_evaluate_recursive() {
        let context = Context::create_test_context();
        context.put_constant("name", Object::from("Ann"));
        let input = crate::json::parse_json(
            r#"{"title": "Hi ${name}", "items": ["${1 + 1}", 3, {"nested": "${name}"}]}"#,
        )
        .unwrap();
        let output = evaluate_recursive(&context, &input);
        assert_eq!(output.get("title"), Object::from("Hi Ann"));
        let items = output.get("items");
        assert_eq!(items.at(0), Object::from(2));
        assert_eq!(items.at(1), Object::from(3));
        assert_eq!(items.at(2).get("nested"), Object::from("Ann"));
    }

    #[test]
    fn test_collect_symbols() {
        let context = Context::create_test_context();
        context.put_user_writeable("a", Object::from(1));
        context.put_user_writeable("b", Object::from(2));
        context.put_constant("c", Object::from(3));
        let expression =
            parse_data_binding(&context, "${a + c} and ${[b, {'k': a}]}").unwrap();
        let names: Vec<String> = collect_symbols(&expression).into_iter().collect();
        assert_eq!(names, vec!["a".to_string(), "b".to_string()]);
        assert!(collect_symbols(&Object::from(1)).is_empty());
    }
}
