//! Turns a query document plus variables into the field tree the store walks.

use crate::{store::StoreError, types::FnvMap};
use graphql_parser::query::{
    Definition, Directive, Document, FragmentDefinition, OperationDefinition, Selection,
    SelectionSet, TypeCondition, Value as GqlValue
};
use parking_lot::RwLock;
use serde_json::{Map, Value};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct FieldNode {
    /// The alias if there is one, otherwise the name. This is the key in the result.
    pub response_key: String,
    pub name: String,
    pub arguments: Map<String, Value>,
    /// The key the field is stored under, `name` followed by its arguments.
    pub field_key: String,
    /// `None` for scalar fields.
    pub selection: Option<Vec<SelectionNode>>
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum SelectionNode {
    Field(FieldNode),
    Fragment {
        type_condition: Option<String>,
        selection: Vec<SelectionNode>
    }
}

/// The store key for a field. Arguments are serialized with sorted keys so the same call always
/// produces the same key.
pub(crate) fn field_key(name: &str, arguments: &Map<String, Value>) -> String {
    if arguments.is_empty() {
        name.to_string()
    } else {
        let args = Value::Object(arguments.clone()).to_string();
        format!("{}({})", name, args)
    }
}

/// Parsed query documents, keyed by their text.
#[derive(Default)]
pub(crate) struct DocumentCache {
    documents: RwLock<FnvMap<&'static str, Arc<Document>>>
}

impl DocumentCache {
    pub fn get(&self, query: &'static str) -> Result<Arc<Document>, StoreError> {
        if let Some(document) = self.documents.read().get(query) {
            return Ok(document.clone());
        }

        let document = graphql_parser::parse_query(query)
            .map(Arc::new)
            .map_err(|e| StoreError::Parse(e.to_string()))?;
        self.documents.write().insert(query, document.clone());
        Ok(document)
    }
}

struct Planner<'a> {
    fragments: FnvMap<&'a str, &'a FragmentDefinition>,
    variables: Map<String, Value>,
    visiting: Vec<&'a str>
}

/// Resolve the selection of `operation_name` in `document` against `variables`.
pub(crate) fn plan_operation(
    document: &Document,
    operation_name: &str,
    variables: &Value
) -> Result<Vec<SelectionNode>, StoreError> {
    let mut operations = Vec::new();
    let mut fragments = FnvMap::default();
    for definition in &document.definitions {
        match definition {
            Definition::Operation(operation) => operations.push(operation),
            Definition::Fragment(fragment) => {
                fragments.insert(fragment.name.as_str(), fragment);
            }
        }
    }

    let operation = operations
        .iter()
        .find(|operation| operation_name_of(operation) == Some(operation_name))
        .copied()
        .or_else(|| {
            if operations.len() == 1 {
                operations.first().copied()
            } else {
                None
            }
        })
        .ok_or_else(|| StoreError::OperationNotFound(operation_name.to_string()))?;

    let (definitions, selection_set) = match operation {
        OperationDefinition::SelectionSet(set) => (None, set),
        OperationDefinition::Query(query) => (Some(&query.variable_definitions), &query.selection_set),
        OperationDefinition::Mutation(mutation) => {
            (Some(&mutation.variable_definitions), &mutation.selection_set)
        }
        OperationDefinition::Subscription(subscription) => (
            Some(&subscription.variable_definitions),
            &subscription.selection_set
        )
    };

    let mut resolved = match variables {
        Value::Object(variables) => variables.clone(),
        _ => Map::new()
    };
    for definition in definitions.into_iter().flatten() {
        if !resolved.contains_key(&definition.name) {
            if let Some(default) = &definition.default_value {
                let default = resolve_value(default, &Map::new());
                resolved.insert(definition.name.clone(), default);
            }
        }
    }

    let mut planner = Planner {
        fragments,
        variables: resolved,
        visiting: Vec::new()
    };
    planner.plan(selection_set)
}

fn operation_name_of(operation: &OperationDefinition) -> Option<&str> {
    match operation {
        OperationDefinition::SelectionSet(_) => None,
        OperationDefinition::Query(query) => query.name.as_deref(),
        OperationDefinition::Mutation(mutation) => mutation.name.as_deref(),
        OperationDefinition::Subscription(subscription) => subscription.name.as_deref()
    }
}

fn resolve_value(value: &GqlValue, variables: &Map<String, Value>) -> Value {
    match value {
        GqlValue::Variable(name) => variables.get(name).cloned().unwrap_or(Value::Null),
        GqlValue::Int(number) => number.as_i64().map(Value::from).unwrap_or(Value::Null),
        GqlValue::Float(number) => serde_json::Number::from_f64(*number)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        GqlValue::String(string) => Value::String(string.clone()),
        GqlValue::Boolean(boolean) => Value::Bool(*boolean),
        GqlValue::Null => Value::Null,
        GqlValue::Enum(name) => Value::String(name.clone()),
        GqlValue::List(items) => Value::Array(
            items
                .iter()
                .map(|item| resolve_value(item, variables))
                .collect()
        ),
        GqlValue::Object(fields) => Value::Object(
            fields
                .iter()
                .map(|(name, value)| (name.clone(), resolve_value(value, variables)))
                .collect()
        )
    }
}

impl<'a> Planner<'a> {
    fn plan(&mut self, selection_set: &'a SelectionSet) -> Result<Vec<SelectionNode>, StoreError> {
        let mut nodes = Vec::with_capacity(selection_set.items.len());
        for item in &selection_set.items {
            match item {
                Selection::Field(field) => {
                    if !self.is_included(&field.directives) {
                        continue;
                    }
                    let mut arguments = Map::new();
                    for (name, value) in &field.arguments {
                        let value = resolve_value(value, &self.variables);
                        if !value.is_null() {
                            arguments.insert(name.clone(), value);
                        }
                    }
                    let selection = if field.selection_set.items.is_empty() {
                        None
                    } else {
                        Some(self.plan(&field.selection_set)?)
                    };
                    nodes.push(SelectionNode::Field(FieldNode {
                        response_key: field.alias.clone().unwrap_or_else(|| field.name.clone()),
                        name: field.name.clone(),
                        field_key: field_key(&field.name, &arguments),
                        arguments,
                        selection
                    }));
                }
                Selection::InlineFragment(fragment) => {
                    if !self.is_included(&fragment.directives) {
                        continue;
                    }
                    let type_condition = fragment
                        .type_condition
                        .as_ref()
                        .map(|TypeCondition::On(name)| name.clone());
                    nodes.push(SelectionNode::Fragment {
                        type_condition,
                        selection: self.plan(&fragment.selection_set)?
                    });
                }
                Selection::FragmentSpread(spread) => {
                    if !self.is_included(&spread.directives) {
                        continue;
                    }
                    let name = spread.fragment_name.as_str();
                    let fragment = *self
                        .fragments
                        .get(name)
                        .ok_or_else(|| StoreError::FragmentNotFound(name.to_string()))?;
                    if self.visiting.contains(&name) {
                        return Err(StoreError::FragmentCycle(name.to_string()));
                    }
                    self.visiting.push(name);
                    let selection = self.plan(&fragment.selection_set)?;
                    self.visiting.pop();

                    let TypeCondition::On(type_condition) = &fragment.type_condition;
                    nodes.push(SelectionNode::Fragment {
                        type_condition: Some(type_condition.clone()),
                        selection
                    });
                }
            }
        }
        Ok(nodes)
    }

    /// Evaluates `@skip` and `@include`.
    fn is_included(&self, directives: &[Directive]) -> bool {
        directives.iter().all(|directive| {
            let condition = directive
                .arguments
                .iter()
                .find(|(name, _)| name == "if")
                .map(|(_, value)| resolve_value(value, &self.variables))
                .and_then(|value| value.as_bool());
            match (directive.name.as_str(), condition) {
                ("skip", Some(skip)) => !skip,
                ("include", Some(include)) => include,
                _ => true
            }
        })
    }
}
