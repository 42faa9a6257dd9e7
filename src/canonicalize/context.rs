//! JSON-LD context processing.
//!
//! Builds the active context — the term definitions in force while a node
//! is expanded — from inline context objects, arrays, and remote context
//! URLs resolved through the injected document loader.

use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};

use crate::error::{Error, Result};
use crate::loader::DocumentLoader;

/// Remote contexts may chain; bound the recursion so a cyclic loader
/// response cannot hang canonicalization.
const MAX_CONTEXT_DEPTH: usize = 8;

/// How a term's values are interpreted
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum TypeMapping {
    /// `"@type": "@id"` — string values are IRI references
    Id,
    /// `"@type": "@vocab"` — string values are vocabulary terms
    Vocab,
    /// A datatype IRI for typed literals
    Datatype(String),
}

/// A single term definition from the active context
#[derive(Clone, Debug)]
pub(crate) struct TermDefinition {
    /// The expanded IRI, or a keyword (`@id`, `@type`, ...) for aliases
    pub iri: String,
    pub type_mapping: Option<TypeMapping>,
    /// Term-scoped language: `Some(None)` clears the default language
    pub language: Option<Option<String>>,
}

/// How a node-object key expands under the active context
#[derive(Clone, Debug)]
pub(crate) enum KeyClass {
    /// The node identifier (`@id` or an alias)
    Id,
    /// The node type (`@type` or an alias)
    Type,
    /// A named graph (`@graph`)
    Graph,
    /// `@context` and any other keyword handled elsewhere
    OtherKeyword,
    /// A property with its expanded predicate IRI and the term definition
    /// it expanded through (if any)
    Property(String, Option<TermDefinition>),
    /// Not resolvable under the active context
    Undefined,
}

/// The set of term definitions in force during node expansion
#[derive(Clone, Debug, Default)]
pub(crate) struct ActiveContext {
    terms: HashMap<String, TermDefinition>,
    vocab: Option<String>,
    language: Option<String>,
}

impl ActiveContext {
    /// Produce a new active context by processing a `@context` value on
    /// top of this one
    pub(crate) fn process(
        &self,
        value: &Value,
        loader: &dyn DocumentLoader,
    ) -> Result<ActiveContext> {
        let mut ctx = self.clone();
        ctx.process_in_place(value, loader, 0)?;
        Ok(ctx)
    }

    fn process_in_place(
        &mut self,
        value: &Value,
        loader: &dyn DocumentLoader,
        depth: usize,
    ) -> Result<()> {
        if depth > MAX_CONTEXT_DEPTH {
            return Err(Error::InvalidDocument(
                "context nesting exceeds the supported depth".to_string(),
            ));
        }

        match value {
            Value::Null => {
                *self = ActiveContext::default();
                Ok(())
            }
            Value::String(url) => {
                let remote = loader.load(url)?;
                let context = remote.document.get("@context").ok_or_else(|| {
                    Error::InvalidDocument(format!("remote context {url} has no @context entry"))
                })?;
                self.process_in_place(context, loader, depth + 1)
            }
            Value::Array(entries) => {
                for entry in entries {
                    self.process_in_place(entry, loader, depth)?;
                }
                Ok(())
            }
            Value::Object(map) => self.process_object(map),
            _ => Err(Error::InvalidDocument(
                "@context entries must be null, a string, an array, or an object".to_string(),
            )),
        }
    }

    fn process_object(&mut self, map: &Map<String, Value>) -> Result<()> {
        match map.get("@vocab") {
            Some(Value::String(vocab)) => self.vocab = Some(vocab.clone()),
            Some(Value::Null) => self.vocab = None,
            Some(_) => {
                return Err(Error::InvalidDocument(
                    "@vocab must be a string or null".to_string(),
                ))
            }
            None => {}
        }

        match map.get("@language") {
            Some(Value::String(language)) => self.language = Some(language.clone()),
            Some(Value::Null) => self.language = None,
            Some(_) => {
                return Err(Error::InvalidDocument(
                    "@language must be a string or null".to_string(),
                ))
            }
            None => {}
        }

        let mut defining = HashSet::new();
        for term in map.keys() {
            if !term.starts_with('@') {
                self.define_term(term, map, &mut defining)?;
            }
        }
        Ok(())
    }

    /// Create one term definition, recursing into the same local context
    /// for prefixes that have not been defined yet
    fn define_term(
        &mut self,
        term: &str,
        local: &Map<String, Value>,
        defining: &mut HashSet<String>,
    ) -> Result<()> {
        if defining.contains(term) {
            return Err(Error::InvalidDocument(format!(
                "cyclic IRI mapping for term '{term}'"
            )));
        }
        defining.insert(term.to_string());

        let value = match local.get(term) {
            Some(value) => value,
            // Only called for keys of `local`; recursion guards the rest.
            None => {
                defining.remove(term);
                return Ok(());
            }
        };

        match value {
            Value::Null => {
                self.terms.remove(term);
            }
            Value::String(iri) => {
                let iri = self.expand_definition_iri(iri, local, defining)?;
                self.terms.insert(
                    term.to_string(),
                    TermDefinition {
                        iri,
                        type_mapping: None,
                        language: None,
                    },
                );
            }
            Value::Object(def) => {
                let iri = match def.get("@id") {
                    Some(Value::String(iri)) => {
                        self.expand_definition_iri(iri, local, defining)?
                    }
                    Some(_) => {
                        return Err(Error::InvalidDocument(format!(
                            "@id of term '{term}' must be a string"
                        )))
                    }
                    None => match &self.vocab {
                        Some(vocab) => format!("{vocab}{term}"),
                        None => {
                            return Err(Error::InvalidDocument(format!(
                                "term '{term}' has no @id and no @vocab is in scope"
                            )))
                        }
                    },
                };

                let type_mapping = match def.get("@type") {
                    Some(Value::String(t)) if t == "@id" => Some(TypeMapping::Id),
                    Some(Value::String(t)) if t == "@vocab" => Some(TypeMapping::Vocab),
                    Some(Value::String(t)) => Some(TypeMapping::Datatype(
                        self.expand_definition_iri(t, local, defining)?,
                    )),
                    Some(_) => {
                        return Err(Error::InvalidDocument(format!(
                            "@type of term '{term}' must be a string"
                        )))
                    }
                    None => None,
                };

                let language = match def.get("@language") {
                    Some(Value::String(language)) => Some(Some(language.clone())),
                    Some(Value::Null) => Some(None),
                    Some(_) => {
                        return Err(Error::InvalidDocument(format!(
                            "@language of term '{term}' must be a string or null"
                        )))
                    }
                    None => None,
                };

                self.terms.insert(
                    term.to_string(),
                    TermDefinition {
                        iri,
                        type_mapping,
                        language,
                    },
                );
            }
            _ => {
                return Err(Error::InvalidDocument(format!(
                    "definition of term '{term}' must be null, a string, or an object"
                )))
            }
        }

        defining.remove(term);
        Ok(())
    }

    /// Expand an IRI that appears inside a term definition (an `@id` or a
    /// datatype). Keywords pass through; compact IRIs expand against
    /// already- or not-yet-defined prefixes of the same local context.
    fn expand_definition_iri(
        &mut self,
        value: &str,
        local: &Map<String, Value>,
        defining: &mut HashSet<String>,
    ) -> Result<String> {
        if value.starts_with('@') {
            return Ok(value.to_string());
        }

        if let Some((prefix, suffix)) = split_compact_iri(value) {
            if !self.terms.contains_key(prefix) && local.contains_key(prefix) {
                self.define_term(prefix, local, defining)?;
            }
            if let Some(def) = self.terms.get(prefix) {
                return Ok(format!("{}{suffix}", def.iri));
            }
            // An unregistered prefix: the value is already an IRI with a
            // scheme, keep it as-is.
            return Ok(value.to_string());
        }
        if value.contains(':') {
            return Ok(value.to_string());
        }

        if let Some(def) = self.terms.get(value) {
            return Ok(def.iri.clone());
        }
        if let Some(vocab) = &self.vocab {
            return Ok(format!("{vocab}{value}"));
        }

        Err(Error::InvalidDocument(format!(
            "cannot expand '{value}' to an IRI in a term definition"
        )))
    }

    /// Classify a node-object key under this context
    pub(crate) fn expand_key(&self, key: &str) -> KeyClass {
        match key {
            "@id" => return KeyClass::Id,
            "@type" => return KeyClass::Type,
            "@graph" => return KeyClass::Graph,
            _ if key.starts_with('@') => return KeyClass::OtherKeyword,
            _ => {}
        }

        if let Some(def) = self.terms.get(key) {
            return match def.iri.as_str() {
                "@id" => KeyClass::Id,
                "@type" => KeyClass::Type,
                "@graph" => KeyClass::Graph,
                iri if iri.starts_with('@') => KeyClass::OtherKeyword,
                _ => KeyClass::Property(def.iri.clone(), Some(def.clone())),
            };
        }

        if let Some((prefix, suffix)) = split_compact_iri(key) {
            if let Some(def) = self.terms.get(prefix) {
                return KeyClass::Property(format!("{}{suffix}", def.iri), None);
            }
            return KeyClass::Property(key.to_string(), None);
        }
        if key.contains(':') {
            // A full IRI used directly as a key.
            return KeyClass::Property(key.to_string(), None);
        }

        if let Some(vocab) = &self.vocab {
            return KeyClass::Property(format!("{vocab}{key}"), None);
        }

        KeyClass::Undefined
    }

    /// Expand a value in vocabulary space (`@type` values and values of
    /// `@vocab`-coerced terms)
    pub(crate) fn expand_vocab_iri(&self, value: &str) -> Option<String> {
        if let Some(def) = self.terms.get(value) {
            if !def.iri.starts_with('@') {
                return Some(def.iri.clone());
            }
            return None;
        }

        if let Some((prefix, suffix)) = split_compact_iri(value) {
            if let Some(def) = self.terms.get(prefix) {
                return Some(format!("{}{suffix}", def.iri));
            }
            return Some(value.to_string());
        }
        if value.contains(':') {
            return Some(value.to_string());
        }

        if let Some(vocab) = &self.vocab {
            return Some(format!("{vocab}{value}"));
        }

        None
    }

    /// The default language for plain string values of `term`, taking a
    /// term-scoped `@language` override into account
    pub(crate) fn language_for(&self, def: Option<&TermDefinition>) -> Option<String> {
        match def.and_then(|d| d.language.as_ref()) {
            Some(override_) => override_.clone(),
            None => self.language.clone(),
        }
    }
}

/// Split a potential compact IRI into (prefix, suffix). Values whose
/// suffix starts with `//` (scheme-relative, e.g. `https://...`) are
/// absolute IRIs, not compact ones.
fn split_compact_iri(value: &str) -> Option<(&str, &str)> {
    let (prefix, suffix) = value.split_once(':')?;
    if prefix.is_empty() || suffix.starts_with("//") {
        return None;
    }
    Some((prefix, suffix))
}

/// Whether a string is an absolute IRI (has a scheme)
pub(crate) fn is_absolute_iri(value: &str) -> bool {
    match value.split_once(':') {
        Some((scheme, _)) => {
            !scheme.is_empty()
                && scheme.chars().next().is_some_and(|c| c.is_ascii_alphabetic())
                && scheme
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        }
        None => false,
    }
}
