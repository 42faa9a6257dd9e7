//! RDF terms, quads, and canonical N-Quads serialization.

pub(crate) const RDF_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";
pub(crate) const RDF_LANGSTRING: &str =
    "http://www.w3.org/1999/02/22-rdf-syntax-ns#langString";
pub(crate) const XSD_STRING: &str = "http://www.w3.org/2001/XMLSchema#string";
pub(crate) const XSD_BOOLEAN: &str = "http://www.w3.org/2001/XMLSchema#boolean";
pub(crate) const XSD_INTEGER: &str = "http://www.w3.org/2001/XMLSchema#integer";
pub(crate) const XSD_DOUBLE: &str = "http://www.w3.org/2001/XMLSchema#double";

/// A literal with datatype and (for `rdf:langString`) a language tag
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Literal {
    pub value: String,
    pub datatype: String,
    pub language: Option<String>,
}

/// A single RDF term in subject, object, or graph position
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Term {
    /// A full IRI
    Iri(String),
    /// A blank node label, without the `_:` prefix
    Blank(String),
    /// A literal (object position only)
    Literal(Literal),
}

impl Term {
    pub(crate) fn blank_label(&self) -> Option<&str> {
        match self {
            Self::Blank(label) => Some(label),
            _ => None,
        }
    }
}

/// An RDF statement: subject, predicate, object, optional graph label
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Quad {
    pub subject: Term,
    pub predicate: String,
    pub object: Term,
    pub graph: Option<Term>,
}

impl Quad {
    /// Serialize to a canonical N-Quads line, including the terminating
    /// ` .\n`, with blank-node labels rewritten through `label`
    pub(crate) fn serialize_with<F>(&self, label: F) -> String
    where
        F: Fn(&str) -> String,
    {
        let mut line = String::new();
        write_term(&mut line, &self.subject, &label);
        line.push(' ');
        line.push('<');
        line.push_str(&self.predicate);
        line.push('>');
        line.push(' ');
        write_term(&mut line, &self.object, &label);
        if let Some(graph) = &self.graph {
            line.push(' ');
            write_term(&mut line, graph, &label);
        }
        line.push_str(" .\n");
        line
    }

    /// Serialize to a canonical N-Quads line with labels as-is
    pub(crate) fn serialize(&self) -> String {
        self.serialize_with(|label| label.to_string())
    }
}

fn write_term<F>(out: &mut String, term: &Term, label: &F)
where
    F: Fn(&str) -> String,
{
    match term {
        Term::Iri(iri) => {
            out.push('<');
            out.push_str(iri);
            out.push('>');
        }
        Term::Blank(name) => {
            out.push_str("_:");
            out.push_str(&label(name));
        }
        Term::Literal(literal) => {
            out.push('"');
            escape_into(out, &literal.value);
            out.push('"');
            if let Some(language) = &literal.language {
                out.push('@');
                out.push_str(language);
            } else if literal.datatype != XSD_STRING {
                out.push_str("^^<");
                out.push_str(&literal.datatype);
                out.push('>');
            }
        }
    }
}

/// Escape a literal value per canonical N-Quads: `ECHAR` for quote,
/// backslash, tab, LF and CR; `\u00XX` for other control characters
fn escape_into(out: &mut String, value: &str) {
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            c if (c as u32) < 0x20 || c as u32 == 0x7f => {
                out.push_str(&format!("\\u{:04X}", c as u32));
            }
            c => out.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn literal(value: &str) -> Term {
        Term::Literal(Literal {
            value: value.to_string(),
            datatype: XSD_STRING.to_string(),
            language: None,
        })
    }

    #[test]
    fn serializes_plain_statement() {
        let quad = Quad {
            subject: Term::Iri("https://example.edu/students/alice".to_string()),
            predicate: "https://schema.org#alumniOf".to_string(),
            object: literal("Example University"),
            graph: None,
        };
        assert_eq!(
            quad.serialize(),
            "<https://example.edu/students/alice> <https://schema.org#alumniOf> \"Example University\" .\n"
        );
    }

    #[test]
    fn serializes_typed_literal_and_graph() {
        let quad = Quad {
            subject: Term::Blank("b0".to_string()),
            predicate: "https://schema.org#age".to_string(),
            object: Term::Literal(Literal {
                value: "42".to_string(),
                datatype: XSD_INTEGER.to_string(),
                language: None,
            }),
            graph: Some(Term::Iri("https://example.org/graph".to_string())),
        };
        assert_eq!(
            quad.serialize(),
            "_:b0 <https://schema.org#age> \"42\"^^<http://www.w3.org/2001/XMLSchema#integer> <https://example.org/graph> .\n"
        );
    }

    #[test]
    fn serializes_language_tagged_literal() {
        let quad = Quad {
            subject: Term::Iri("https://example.org/s".to_string()),
            predicate: "https://schema.org#name".to_string(),
            object: Term::Literal(Literal {
                value: "Universit\u{e9}".to_string(),
                datatype: RDF_LANGSTRING.to_string(),
                language: Some("fr".to_string()),
            }),
            graph: None,
        };
        assert_eq!(
            quad.serialize(),
            "<https://example.org/s> <https://schema.org#name> \"Universit\u{e9}\"@fr .\n"
        );
    }

    #[test]
    fn escapes_control_characters() {
        let quad = Quad {
            subject: Term::Iri("https://example.org/s".to_string()),
            predicate: "https://schema.org#note".to_string(),
            object: literal("line\nbreak \"quoted\" tab\there \\ bell\u{7}"),
            graph: None,
        };
        assert_eq!(
            quad.serialize(),
            "<https://example.org/s> <https://schema.org#note> \"line\\nbreak \\\"quoted\\\" tab\\there \\\\ bell\\u0007\" .\n"
        );
    }
}
