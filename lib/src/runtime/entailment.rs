use crate::error::EngineError;
use crate::named_nodes::entailment;
use oxigraph::model::NamedNode;
use std::borrow::Cow;
use std::marker::PhantomData;

/// Applies an entailment regime to a dataset.
///
/// `Ok(None)` means the regime is not supported. `Ok(Some(dataset))` is a view
/// with the regime's inferences visible.
pub trait EntailmentReasoner<D>: Send + Sync {
    fn apply(&self, dataset: &D, regime: &NamedNode) -> Result<Option<D>, EngineError>;
}

/// Outcome of routing a dataset through the requested regime.
#[derive(Debug)]
pub enum Entailed<'a, D: Clone> {
    Dataset(Cow<'a, D>),
    Unsupported(NamedNode),
}

/// Decides which dataset a constraint's query runs against.
pub struct EntailmentGate<'r, D> {
    reasoner: &'r dyn EntailmentReasoner<D>,
}

impl<'r, D: Clone> EntailmentGate<'r, D> {
    pub fn new(reasoner: &'r dyn EntailmentReasoner<D>) -> Self {
        EntailmentGate { reasoner }
    }

    /// Without a regime `dataset` is borrowed unchanged. An unsupported regime is
    /// reported, not raised.
    pub fn apply<'a>(
        &self,
        dataset: &'a D,
        regime: Option<&NamedNode>,
    ) -> Result<Entailed<'a, D>, EngineError> {
        let Some(regime) = regime else {
            return Ok(Entailed::Dataset(Cow::Borrowed(dataset)));
        };
        match self.reasoner.apply(dataset, regime)? {
            Some(entailed) => Ok(Entailed::Dataset(Cow::Owned(entailed))),
            None => {
                log::warn!("Unsupported SPARQL entailment {regime}");
                Ok(Entailed::Unsupported(regime.clone()))
            }
        }
    }
}

/// Supports only simple entailment, which leaves any dataset unchanged.
pub struct SimpleEntailment<D> {
    _dataset: PhantomData<fn() -> D>,
}

impl<D> SimpleEntailment<D> {
    pub fn new() -> Self {
        SimpleEntailment {
            _dataset: PhantomData,
        }
    }
}

impl<D> Default for SimpleEntailment<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: Clone> EntailmentReasoner<D> for SimpleEntailment<D> {
    fn apply(&self, dataset: &D, regime: &NamedNode) -> Result<Option<D>, EngineError> {
        if regime.as_ref() == entailment::SIMPLE {
            Ok(Some(dataset.clone()))
        } else {
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_regime_borrows_the_dataset() {
        let reasoner = SimpleEntailment::<Vec<u8>>::new();
        let gate = EntailmentGate::new(&reasoner);
        let data = vec![1, 2, 3];
        match gate.apply(&data, None).unwrap() {
            Entailed::Dataset(Cow::Borrowed(view)) => assert!(std::ptr::eq(view, &data)),
            other => panic!("expected borrowed dataset, got {other:?}"),
        }
    }

    #[test]
    fn simple_regime_is_supported() {
        let reasoner = SimpleEntailment::<Vec<u8>>::new();
        let gate = EntailmentGate::new(&reasoner);
        let data = vec![1, 2, 3];
        let simple = entailment::SIMPLE.into_owned();
        match gate.apply(&data, Some(&simple)).unwrap() {
            Entailed::Dataset(view) => assert_eq!(*view, data),
            other => panic!("expected dataset, got {other:?}"),
        }
    }

    #[test]
    fn unknown_regime_is_reported_unsupported() {
        let reasoner = SimpleEntailment::<Vec<u8>>::new();
        let gate = EntailmentGate::new(&reasoner);
        let owl = NamedNode::new_unchecked("http://www.w3.org/ns/entailment/OWL-Direct");
        match gate.apply(&vec![0u8], Some(&owl)).unwrap() {
            Entailed::Unsupported(regime) => assert_eq!(regime, owl),
            other => panic!("expected unsupported, got {other:?}"),
        }
    }
}
