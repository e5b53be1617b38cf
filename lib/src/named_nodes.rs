use oxigraph::model::NamedNodeRef;

const SH: &str = "http://www.w3.org/ns/shacl#";

/// SHACL vocabulary terms used by the SPARQL execution language.
#[derive(Debug, Clone, Copy)]
pub struct SHACL {
    // severities
    pub info: NamedNodeRef<'static>,
    pub warning: NamedNodeRef<'static>,
    pub violation: NamedNodeRef<'static>,
    pub error: NamedNodeRef<'static>,
    pub fatal_error: NamedNodeRef<'static>,
    // result properties
    pub source: NamedNodeRef<'static>,
    pub message: NamedNodeRef<'static>,
    pub predicate: NamedNodeRef<'static>,
    pub subject: NamedNodeRef<'static>,
    pub object: NamedNodeRef<'static>,
    pub root: NamedNodeRef<'static>,
    // constraint and template properties
    pub sparql: NamedNodeRef<'static>,
    pub sparql_entailment: NamedNodeRef<'static>,
    pub scope_shape: NamedNodeRef<'static>,
    pub severity: NamedNodeRef<'static>,
    pub argument: NamedNodeRef<'static>,
    pub optional: NamedNodeRef<'static>,
    pub optional_when_inherited: NamedNodeRef<'static>,
    pub default_value: NamedNodeRef<'static>,
    // functions
    pub has_shape: NamedNodeRef<'static>,
}

impl SHACL {
    pub const fn new() -> Self {
        SHACL {
            info: NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#Info"),
            warning: NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#Warning"),
            violation: NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#Violation"),
            error: NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#Error"),
            fatal_error: NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#FatalError"),
            source: NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#source"),
            message: NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#message"),
            predicate: NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#predicate"),
            subject: NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#subject"),
            object: NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#object"),
            root: NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#root"),
            sparql: NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#sparql"),
            sparql_entailment: NamedNodeRef::new_unchecked(
                "http://www.w3.org/ns/shacl#sparqlEntailment",
            ),
            scope_shape: NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#scopeShape"),
            severity: NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#severity"),
            argument: NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#argument"),
            optional: NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#optional"),
            optional_when_inherited: NamedNodeRef::new_unchecked(
                "http://www.w3.org/ns/shacl#optionalWhenInherited",
            ),
            default_value: NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#defaultValue"),
            has_shape: NamedNodeRef::new_unchecked("http://www.w3.org/ns/shacl#hasShape"),
        }
    }

    /// The `sh:` prefix namespace.
    pub const fn namespace() -> &'static str {
        SH
    }
}

impl Default for SHACL {
    fn default() -> Self {
        Self::new()
    }
}

/// Entailment regime identifiers understood by the bundled reasoners.
pub mod entailment {
    use oxigraph::model::NamedNodeRef;

    pub const SIMPLE: NamedNodeRef<'static> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/entailment/Simple");
    pub const RDFS: NamedNodeRef<'static> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/entailment/RDFS");
}

/// Names of the variables the execution language pre-binds or reads back from result rows.
pub mod vars {
    pub const THIS: &str = "this";
    pub const CURRENT_SHAPE: &str = "currentShape";
    pub const SHAPES_GRAPH: &str = "shapesGraph";
    pub const SCOPE_PREFIX: &str = "scope";
    pub const TYPE_CLASS: &str = "typeClass";

    pub const MESSAGE: &str = "message";
    pub const PREDICATE: &str = "predicate";
    pub const PATH: &str = "path";
    pub const OBJECT: &str = "object";
    pub const SUBJECT: &str = "subject";
    pub const ROOT: &str = "root";

    /// Name of the `index`th scope-shape variable (`scope0`, `scope1`, ...).
    pub fn scope(index: usize) -> String {
        format!("{SCOPE_PREFIX}{index}")
    }
}
