use minidom::Element;

use crate::descriptor::ErasedCollector;
use crate::instance::{DescId, StanzaData};

/// Captures every child element no other descriptor on the class claims, as
/// literal [`minidom::Element`] subtrees, in the order they were
/// encountered. At most one `Collector` is reachable per class.
#[derive(Debug, Default)]
pub struct Collector {
    id: DescId,
}

impl Collector {
    pub fn new() -> Self {
        Self { id: DescId::new() }
    }

    pub fn id(&self) -> DescId {
        self.id
    }

    pub fn get<'a>(&self, data: &'a StanzaData) -> &'a [Element] {
        data.get::<Vec<Element>>(self.id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

impl ErasedCollector for Collector {
    fn id(&self) -> DescId {
        self.id
    }

    fn push(&self, data: &mut StanzaData, element: Element) {
        data.get_or_insert_with(self.id, Vec::new).push(element);
    }

    fn serialize(&self, data: &StanzaData) -> Vec<Element> {
        self.get(data).to_vec()
    }
}
