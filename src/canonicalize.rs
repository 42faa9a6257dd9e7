//! Deterministic canonicalization of JSON-LD documents.
//!
//! A document is expanded against its `@context` (resolved through the
//! injected [`DocumentLoader`]) into a set of RDF quads, blank nodes are
//! relabeled canonically, and the result is serialized as sorted
//! canonical N-Quads — the exact byte sequence the ECDSA suites hash and
//! sign. Identical input and loader responses produce byte-identical
//! output on every platform, independent of object-key iteration order.

mod context;
mod labeling;
mod nquads;

use serde_json::{Map, Number, Value};
use std::collections::{HashMap, HashSet};
use tracing::debug;

use crate::error::{Error, Result};
use crate::loader::DocumentLoader;

pub(crate) use context::is_absolute_iri;
use context::{ActiveContext, KeyClass, TermDefinition, TypeMapping};
use nquads::{Literal, Quad, Term};
use nquads::{RDF_LANGSTRING, RDF_TYPE, XSD_BOOLEAN, XSD_DOUBLE, XSD_INTEGER, XSD_STRING};

/// Options for [`canonize`]
pub struct CanonizeOptions<'a> {
    /// Resolves `@context` URLs referenced by the document
    pub document_loader: &'a dyn DocumentLoader,
}

/// Canonicalize a JSON-LD document to sorted canonical N-Quads.
///
/// # Errors
///
/// - [`Error::LoaderResolution`] when a referenced context cannot be
///   resolved
/// - [`Error::UndefinedTerm`] when a property term is not resolvable
///   under the active context
/// - [`Error::InvalidDocument`] when the document cannot be expanded
pub fn canonize(document: &Value, options: &CanonizeOptions<'_>) -> Result<String> {
    let mut quads = to_rdf(document, options.document_loader)?;

    // The expanded document is a dataset: drop duplicate statements
    // before hashing.
    let mut seen = HashSet::new();
    quads.retain(|quad| seen.insert(quad.serialize()));

    let labels = labeling::canonical_labels(&quads);
    let mut lines: Vec<String> = quads
        .iter()
        .map(|quad| {
            quad.serialize_with(|label| {
                labels
                    .get(label)
                    .cloned()
                    .unwrap_or_else(|| label.to_string())
            })
        })
        .collect();
    lines.sort();

    debug!(statements = lines.len(), "canonicalized document");
    Ok(lines.concat())
}

/// Expand a document into RDF quads with input-order blank-node labels
fn to_rdf(document: &Value, loader: &dyn DocumentLoader) -> Result<Vec<Quad>> {
    let Value::Object(root) = document else {
        return Err(Error::InvalidDocument(
            "document root must be a JSON object".to_string(),
        ));
    };

    let mut expander = Expander {
        loader,
        quads: Vec::new(),
        blank_labels: HashMap::new(),
        blank_counter: 0,
    };
    let active = ActiveContext::default();
    expander.expand_node(root, &active, &None, true)?;
    Ok(expander.quads)
}

struct Expander<'a> {
    loader: &'a dyn DocumentLoader,
    quads: Vec<Quad>,
    blank_labels: HashMap<String, String>,
    blank_counter: usize,
}

impl Expander<'_> {
    fn fresh_blank(&mut self) -> Term {
        let label = format!("b{}", self.blank_counter);
        self.blank_counter += 1;
        Term::Blank(label)
    }

    /// Map a document-supplied blank node label (`_:name`) to a label in
    /// the generated space, so it cannot collide with anonymous nodes
    fn named_blank(&mut self, label: &str) -> Term {
        if let Some(issued) = self.blank_labels.get(label) {
            return Term::Blank(issued.clone());
        }
        let issued = format!("b{}", self.blank_counter);
        self.blank_counter += 1;
        self.blank_labels.insert(label.to_string(), issued.clone());
        Term::Blank(issued)
    }

    /// Expand one node object, emitting its quads and returning its
    /// subject term
    fn expand_node(
        &mut self,
        node: &Map<String, Value>,
        active: &ActiveContext,
        graph: &Option<Term>,
        is_root: bool,
    ) -> Result<Term> {
        let active = match node.get("@context") {
            Some(context) => active.process(context, self.loader)?,
            None => active.clone(),
        };

        // Locate the node identifier first; every emitted quad needs it.
        let mut subject = None;
        let mut has_explicit_id = false;
        for (key, value) in node {
            if let KeyClass::Id = active.expand_key(key) {
                let Value::String(id) = value else {
                    return Err(Error::InvalidDocument(format!(
                        "node identifier '{key}' must be a string"
                    )));
                };
                subject = Some(self.node_reference(id));
                has_explicit_id = true;
                break;
            }
        }
        let subject = match subject {
            Some(subject) => subject,
            None => self.fresh_blank(),
        };

        for (key, value) in node {
            match active.expand_key(key) {
                KeyClass::Id | KeyClass::OtherKeyword => {}
                KeyClass::Type => {
                    for entry in value_entries(value) {
                        let Value::String(type_name) = entry else {
                            return Err(Error::InvalidDocument(format!(
                                "value of '{key}' must be a string"
                            )));
                        };
                        let iri = active
                            .expand_vocab_iri(type_name)
                            .ok_or_else(|| Error::UndefinedTerm(type_name.clone()))?;
                        self.quads.push(Quad {
                            subject: subject.clone(),
                            predicate: RDF_TYPE.to_string(),
                            object: Term::Iri(iri),
                            graph: graph.clone(),
                        });
                    }
                }
                KeyClass::Graph => {
                    let child_graph = if is_root && !has_explicit_id {
                        graph.clone()
                    } else {
                        Some(subject.clone())
                    };
                    for entry in value_entries(value) {
                        let Value::Object(child) = entry else {
                            return Err(Error::InvalidDocument(
                                "@graph entries must be node objects".to_string(),
                            ));
                        };
                        self.expand_node(child, &active, &child_graph, false)?;
                    }
                }
                KeyClass::Property(predicate, definition) => {
                    for entry in value_entries(value) {
                        self.expand_property_value(
                            &subject,
                            &predicate,
                            definition.as_ref(),
                            entry,
                            &active,
                            graph,
                        )?;
                    }
                }
                KeyClass::Undefined => {
                    return Err(Error::UndefinedTerm(key.clone()));
                }
            }
        }

        Ok(subject)
    }

    /// Emit the quad for one value of one property
    fn expand_property_value(
        &mut self,
        subject: &Term,
        predicate: &str,
        definition: Option<&TermDefinition>,
        value: &Value,
        active: &ActiveContext,
        graph: &Option<Term>,
    ) -> Result<()> {
        let object = match value {
            Value::Null => return Ok(()),
            Value::String(s) => match definition.and_then(|d| d.type_mapping.as_ref()) {
                Some(TypeMapping::Id) => self.node_reference(s),
                Some(TypeMapping::Vocab) => Term::Iri(
                    active
                        .expand_vocab_iri(s)
                        .ok_or_else(|| Error::UndefinedTerm(s.clone()))?,
                ),
                Some(TypeMapping::Datatype(datatype)) => Term::Literal(Literal {
                    value: s.clone(),
                    datatype: datatype.clone(),
                    language: None,
                }),
                None => Term::Literal(string_literal(s, active.language_for(definition))),
            },
            Value::Bool(b) => {
                let datatype = match definition.and_then(|d| d.type_mapping.as_ref()) {
                    Some(TypeMapping::Datatype(datatype)) => datatype.clone(),
                    _ => XSD_BOOLEAN.to_string(),
                };
                Term::Literal(Literal {
                    value: b.to_string(),
                    datatype,
                    language: None,
                })
            }
            Value::Number(n) => {
                let datatype = match definition.and_then(|d| d.type_mapping.as_ref()) {
                    Some(TypeMapping::Datatype(datatype)) => Some(datatype.as_str()),
                    _ => None,
                };
                Term::Literal(number_literal(n, datatype))
            }
            Value::Object(object) => {
                if object.contains_key("@value") {
                    self.value_object(object, definition, active)?
                } else if object.contains_key("@list") {
                    return Err(Error::InvalidDocument(
                        "@list values are not supported".to_string(),
                    ));
                } else {
                    self.expand_node(object, active, graph, false)?
                }
            }
            Value::Array(_) => {
                return Err(Error::InvalidDocument(
                    "nested arrays are not valid JSON-LD".to_string(),
                ));
            }
        };

        self.quads.push(Quad {
            subject: subject.clone(),
            predicate: predicate.to_string(),
            object,
            graph: graph.clone(),
        });
        Ok(())
    }

    /// Expand an explicit `@value` object into a literal
    fn value_object(
        &mut self,
        object: &Map<String, Value>,
        definition: Option<&TermDefinition>,
        active: &ActiveContext,
    ) -> Result<Term> {
        let datatype = match object.get("@type") {
            Some(Value::String(t)) => Some(
                active
                    .expand_vocab_iri(t)
                    .ok_or_else(|| Error::UndefinedTerm(t.clone()))?,
            ),
            Some(_) => {
                return Err(Error::InvalidDocument(
                    "@type of a value object must be a string".to_string(),
                ))
            }
            None => match definition.and_then(|d| d.type_mapping.as_ref()) {
                Some(TypeMapping::Datatype(datatype)) => Some(datatype.clone()),
                _ => None,
            },
        };

        let language = match object.get("@language") {
            Some(Value::String(language)) => Some(language.clone()),
            Some(Value::Null) | None => None,
            Some(_) => {
                return Err(Error::InvalidDocument(
                    "@language of a value object must be a string".to_string(),
                ))
            }
        };

        let literal = match object.get("@value") {
            Some(Value::String(s)) => match (datatype, language) {
                (Some(datatype), _) => Literal {
                    value: s.clone(),
                    datatype,
                    language: None,
                },
                (None, Some(language)) => Literal {
                    value: s.clone(),
                    datatype: RDF_LANGSTRING.to_string(),
                    language: Some(language),
                },
                (None, None) => string_literal(s, active.language_for(definition)),
            },
            Some(Value::Bool(b)) => Literal {
                value: b.to_string(),
                datatype: datatype.unwrap_or_else(|| XSD_BOOLEAN.to_string()),
                language: None,
            },
            Some(Value::Number(n)) => number_literal(n, datatype.as_deref()),
            _ => {
                return Err(Error::InvalidDocument(
                    "@value must be a string, number, or boolean".to_string(),
                ))
            }
        };

        Ok(Term::Literal(literal))
    }

    /// A string in node-reference position: a blank node label or an IRI
    fn node_reference(&mut self, value: &str) -> Term {
        match value.strip_prefix("_:") {
            Some(label) => self.named_blank(label),
            None => Term::Iri(value.to_string()),
        }
    }
}

fn string_literal(value: &str, language: Option<String>) -> Literal {
    match language {
        Some(language) => Literal {
            value: value.to_string(),
            datatype: RDF_LANGSTRING.to_string(),
            language: Some(language),
        },
        None => Literal {
            value: value.to_string(),
            datatype: XSD_STRING.to_string(),
            language: None,
        },
    }
}

/// The canonical lexical form of a JSON number
fn number_literal(number: &Number, datatype: Option<&str>) -> Literal {
    if let Some(integer) = number.as_i64() {
        match datatype {
            None | Some(XSD_INTEGER) => {
                return Literal {
                    value: integer.to_string(),
                    datatype: XSD_INTEGER.to_string(),
                    language: None,
                }
            }
            Some(XSD_DOUBLE) => {
                return Literal {
                    value: canonical_double(integer as f64),
                    datatype: XSD_DOUBLE.to_string(),
                    language: None,
                }
            }
            Some(datatype) => {
                return Literal {
                    value: integer.to_string(),
                    datatype: datatype.to_string(),
                    language: None,
                }
            }
        }
    }

    let float = number.as_f64().unwrap_or_default();
    Literal {
        value: canonical_double(float),
        datatype: datatype.unwrap_or(XSD_DOUBLE).to_string(),
        language: None,
    }
}

/// Canonical `xsd:double` form: mantissa with an explicit fraction and a
/// bare exponent, e.g. `5.3E0`, `1.0E1`, `-1.0E-2`
fn canonical_double(value: f64) -> String {
    let formatted = format!("{value:E}");
    match formatted.split_once('E') {
        Some((mantissa, exponent)) if !mantissa.contains('.') => {
            format!("{mantissa}.0E{exponent}")
        }
        _ => formatted,
    }
}

/// Iterate a JSON-LD value position: arrays flatten one level, anything
/// else is a single entry
fn value_entries(value: &Value) -> impl Iterator<Item = &Value> {
    match value {
        Value::Array(entries) => entries.iter(),
        other => std::slice::from_ref(other).iter(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::StaticLoader;
    use serde_json::json;

    fn options(loader: &StaticLoader) -> CanonizeOptions<'_> {
        CanonizeOptions {
            document_loader: loader,
        }
    }

    #[test]
    fn canonical_double_forms() {
        assert_eq!(canonical_double(5.3), "5.3E0");
        assert_eq!(canonical_double(10.0), "1.0E1");
        assert_eq!(canonical_double(0.0), "0.0E0");
        assert_eq!(canonical_double(-0.01), "-1.0E-2");
    }

    #[test]
    fn expands_inline_context() {
        let loader = StaticLoader::new();
        let doc = json!({
            "@context": {"name": "https://schema.org#name"},
            "@id": "https://example.org/s",
            "name": "Alice"
        });

        let canonical = canonize(&doc, &options(&loader)).expect("canonize");
        assert_eq!(
            canonical,
            "<https://example.org/s> <https://schema.org#name> \"Alice\" .\n"
        );
    }

    #[test]
    fn anonymous_nodes_get_canonical_labels() {
        let loader = StaticLoader::new();
        let doc = json!({
            "@context": {"name": "https://schema.org#name"},
            "name": "Alice"
        });

        let canonical = canonize(&doc, &options(&loader)).expect("canonize");
        assert_eq!(canonical, "_:c14n0 <https://schema.org#name> \"Alice\" .\n");
    }

    #[test]
    fn duplicate_statements_collapse() {
        let loader = StaticLoader::new();
        let doc = json!({
            "@context": {"name": "https://schema.org#name"},
            "@id": "https://example.org/s",
            "name": ["Alice", "Alice"]
        });

        let canonical = canonize(&doc, &options(&loader)).expect("canonize");
        assert_eq!(canonical.lines().count(), 1);
    }

    #[test]
    fn typed_values_and_references() {
        let loader = StaticLoader::new();
        let doc = json!({
            "@context": {
                "knows": {"@id": "https://schema.org#knows", "@type": "@id"},
                "age": {"@id": "https://schema.org#age"}
            },
            "@id": "https://example.org/alice",
            "knows": "https://example.org/bob",
            "age": 42
        });

        let canonical = canonize(&doc, &options(&loader)).expect("canonize");
        assert_eq!(
            canonical,
            "<https://example.org/alice> <https://schema.org#age> \"42\"^^<http://www.w3.org/2001/XMLSchema#integer> .\n\
             <https://example.org/alice> <https://schema.org#knows> <https://example.org/bob> .\n"
        );
    }

    #[test]
    fn undefined_property_term_fails() {
        let loader = StaticLoader::new();
        let doc = json!({
            "@context": {"name": "https://schema.org#name"},
            "@id": "https://example.org/s",
            "undefinedTerm": "oops"
        });

        let err = canonize(&doc, &options(&loader)).unwrap_err();
        assert!(matches!(err, Error::UndefinedTerm(term) if term == "undefinedTerm"));
    }

    #[test]
    fn key_order_does_not_change_output() {
        let loader = StaticLoader::new();
        let a = json!({
            "@context": {"name": "https://schema.org#name", "note": "https://schema.org#note"},
            "@id": "https://example.org/s",
            "name": "Alice",
            "note": "n"
        });
        let b: Value = serde_json::from_str(
            r#"{"note": "n", "name": "Alice", "@id": "https://example.org/s",
                "@context": {"note": "https://schema.org#note", "name": "https://schema.org#name"}}"#,
        )
        .expect("parse");

        assert_eq!(
            canonize(&a, &options(&loader)).expect("canonize a"),
            canonize(&b, &options(&loader)).expect("canonize b")
        );
    }
}
