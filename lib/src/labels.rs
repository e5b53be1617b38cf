use oxigraph::model::vocab::rdfs;
use oxigraph::model::{NamedNode, NamedOrBlankNodeRef, Term};
use oxigraph::store::Store;

/// Computes human-readable labels for graph resources.
pub trait LabelProvider: Send + Sync {
    fn label_of(&self, node: &Term) -> String;
}

/// Returns the local part of an IRI: everything after the last `#`, else after
/// the last `/` (ignoring a trailing slash).
pub fn local_name(iri: &NamedNode) -> String {
    let iri_str = iri.as_str();
    if let Some(hash_idx) = iri_str.rfind('#') {
        iri_str[hash_idx + 1..].to_string()
    } else if let Some(slash_idx) = iri_str.rfind('/') {
        if slash_idx < iri_str.len() - 1 {
            iri_str[slash_idx + 1..].to_string()
        } else {
            // trailing slash
            let end = slash_idx;
            let mut start = slash_idx;
            if let Some(prev_slash) = iri_str[..end].rfind('/') {
                start = prev_slash + 1;
            }
            iri_str[start..end].to_string()
        }
    } else {
        iri_str.to_string()
    }
}

/// Labels computed from the term itself: local names for IRIs, `_:id` for blank
/// nodes, lexical forms for literals.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisplayLabels;

impl LabelProvider for DisplayLabels {
    fn label_of(&self, node: &Term) -> String {
        match node {
            Term::NamedNode(nn) => local_name(nn),
            Term::BlankNode(bn) => bn.to_string(),
            Term::Literal(lit) => lit.value().to_string(),
            #[allow(unreachable_patterns)]
            other => other.to_string(),
        }
    }
}

/// Prefers an `rdfs:label` found in the store, falling back to [`DisplayLabels`].
/// Lookups are cached per term.
pub struct StoreLabels {
    store: Store,
    cache: papaya::HashMap<Term, String>,
}

impl StoreLabels {
    pub fn new(store: Store) -> Self {
        StoreLabels {
            store,
            cache: papaya::HashMap::new(),
        }
    }

    fn lookup(&self, node: &Term) -> Option<String> {
        let subject: NamedOrBlankNodeRef<'_> = match node {
            Term::NamedNode(nn) => nn.as_ref().into(),
            Term::BlankNode(bn) => bn.as_ref().into(),
            _ => return None,
        };
        self.store
            .quads_for_pattern(Some(subject), Some(rdfs::LABEL), None, None)
            .filter_map(Result::ok)
            .find_map(|quad| match quad.object {
                Term::Literal(lit) => Some(lit.value().to_string()),
                _ => None,
            })
    }
}

impl LabelProvider for StoreLabels {
    fn label_of(&self, node: &Term) -> String {
        let cache = self.cache.pin();
        if let Some(label) = cache.get(node) {
            return label.clone();
        }
        let label = self
            .lookup(node)
            .unwrap_or_else(|| DisplayLabels.label_of(node));
        cache.insert(node.clone(), label.clone());
        label
    }
}
