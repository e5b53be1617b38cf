use crate::labels::LabelProvider;
use crate::runtime::engine::Row;
use oxigraph::model::{Literal, Term};

/// Replaces every `{?name}` in `template` with the row's value for `name`.
///
/// Nodes are replaced by their label, literals by their lexical form, and
/// unbound variables by nothing. Text from an unterminated `{?` to the end is
/// dropped. The language tag of `template` is carried over.
pub fn substitute(template: &Literal, row: &Row, labels: &dyn LabelProvider) -> Literal {
    let text = expand(template.value(), row, labels);
    match template.language() {
        Some(lang) => Literal::new_language_tagged_literal_unchecked(text, lang),
        None => Literal::new_simple_literal(text),
    }
}

fn expand(text: &str, row: &Row, labels: &dyn LabelProvider) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find("{?") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            return out;
        };
        let name = &after[..end];
        match row.get(name) {
            Some(Term::Literal(lit)) => out.push_str(lit.value()),
            Some(node) => out.push_str(&labels.label_of(node)),
            None => {}
        }
        rest = &after[end + 1..];
    }
    out.push_str(rest);
    out
}
