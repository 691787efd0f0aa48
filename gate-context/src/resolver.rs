//! Field-path resolution over launch contexts.

use serde_json::{Map, Value};

use crate::{FieldPath, LaunchContext, Location, PathSegment, Step};

/// A value selected by a [`FieldPath`], together with where it was found.
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedValue<'a> {
    location: Location,
    value: &'a Value,
    parent: Option<&'a Map<String, Value>>,
}

impl<'a> ResolvedValue<'a> {
    fn root(value: &'a Value) -> Self {
        Self {
            location: Location::root(),
            value,
            parent: None,
        }
    }

    /// Returns the selected value.
    #[must_use]
    pub fn value(&self) -> &'a Value {
        self.value
    }

    /// Returns the concrete location of the value.
    #[must_use]
    pub fn location(&self) -> &Location {
        &self.location
    }

    /// Returns the key the value was found under, skipping sequence indices.
    #[must_use]
    pub fn key(&self) -> Option<&str> {
        self.location.nearest_key()
    }

    /// Returns a sibling field on the mapping that holds this value.
    ///
    /// `None` when the value does not live in a mapping or the sibling is absent.
    #[must_use]
    pub fn sibling(&self, key: &str) -> Option<&'a Value> {
        self.parent.and_then(|parent| parent.get(key))
    }
}

/// Resolves `path` against a launch context.
///
/// Returns every matching value in document order. Absent fields and type
/// mismatches (a key applied to a non-mapping, a wildcard applied to a
/// non-sequence) produce no match rather than an error; a field that is present
/// with a `null` value is a match.
#[must_use]
pub fn resolve<'a>(context: &'a LaunchContext, path: &FieldPath) -> Vec<ResolvedValue<'a>> {
    resolve_value(context.as_value(), path)
}

/// Resolves `path` against an arbitrary JSON value.
#[must_use]
pub fn resolve_value<'a>(root: &'a Value, path: &FieldPath) -> Vec<ResolvedValue<'a>> {
    let mut frontier = vec![ResolvedValue::root(root)];

    for segment in path.segments() {
        let mut next = Vec::new();
        for candidate in &frontier {
            match (segment, candidate.value) {
                (PathSegment::Key(key), Value::Object(map)) => {
                    if let Some(child) = map.get(key) {
                        next.push(ResolvedValue {
                            location: candidate.location.push(Step::Key(key.clone())),
                            value: child,
                            parent: Some(map),
                        });
                    }
                }
                (PathSegment::Wildcard, Value::Array(items)) => {
                    next.extend(items.iter().enumerate().map(|(idx, item)| ResolvedValue {
                        location: candidate.location.push(Step::Index(idx)),
                        value: item,
                        parent: None,
                    }));
                }
                _ => {}
            }
        }

        if next.is_empty() {
            return next;
        }
        frontier = next;
    }

    frontier
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn path(text: &str) -> FieldPath {
        text.parse().unwrap()
    }

    fn context(value: Value) -> LaunchContext {
        LaunchContext::try_from(value).unwrap()
    }

    #[test]
    fn resolves_nested_key() {
        let ctx = context(json!({"extra_vars": {"extra_var_key": "allowed_value1"}}));
        let resolved = resolve(&ctx, &path("extra_vars.extra_var_key"));

        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].value(), &json!("allowed_value1"));
        assert_eq!(resolved[0].key(), Some("extra_var_key"));
        assert_eq!(resolved[0].location().to_string(), "extra_vars.extra_var_key");
    }

    #[test]
    fn absent_fields_resolve_to_nothing() {
        let ctx = context(json!({"credentials": []}));
        assert!(resolve(&ctx, &path("extra_vars.extra_var_key")).is_empty());
        assert!(resolve(&ctx, &path("credentials[*].organization")).is_empty());
    }

    #[test]
    fn null_is_a_match_but_missing_is_not() {
        let ctx = context(json!({
            "credentials": [
                {"name": "a", "organization": null},
                {"name": "b"}
            ]
        }));
        let resolved = resolve(&ctx, &path("credentials[*].organization"));

        assert_eq!(resolved.len(), 1);
        assert!(resolved[0].value().is_null());
        assert_eq!(resolved[0].sibling("name"), Some(&json!("a")));
        assert_eq!(resolved[0].location().to_string(), "credentials[0].organization");
    }

    #[test]
    fn type_mismatch_is_no_match() {
        let ctx = context(json!({"extra_vars": "oops", "credentials": {"name": "x"}}));
        assert!(resolve(&ctx, &path("extra_vars.key")).is_empty());
        assert!(resolve(&ctx, &path("credentials[*].name")).is_empty());
    }

    #[test]
    fn wildcard_preserves_element_order() {
        let ctx = context(json!({"credentials": [
            {"name": "first"}, {"name": "second"}, {"name": "third"}
        ]}));
        let names: Vec<_> = resolve(&ctx, &path("credentials[*].name"))
            .into_iter()
            .map(|resolved| resolved.value().clone())
            .collect();
        assert_eq!(names, [json!("first"), json!("second"), json!("third")]);
    }

    #[test]
    fn terminal_wildcard_selects_elements() {
        let ctx = context(json!({"tags": ["a", "b"]}));
        let resolved = resolve(&ctx, &path("tags[*]"));
        assert_eq!(resolved.len(), 2);
        assert_eq!(resolved[1].location().to_string(), "tags[1]");
        assert_eq!(resolved[1].key(), Some("tags"));
        assert_eq!(resolved[1].sibling("name"), None);
    }

    #[test]
    fn nested_wildcards_flatten_in_order() {
        let root = json!([{"hosts": ["h1", "h2"]}, {"hosts": ["h3"]}]);
        let values: Vec<_> = resolve_value(&root, &path("[*].hosts[*]"))
            .into_iter()
            .map(|resolved| resolved.value().as_str().unwrap().to_owned())
            .collect();
        assert_eq!(values, ["h1", "h2", "h3"]);
    }
}
