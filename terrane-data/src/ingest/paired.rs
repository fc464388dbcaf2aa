use std::fmt;
use std::iter::Peekable;

/// Which stream still had records when its partner ran dry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnpairedStream {
    /// Geometry records were left over.
    Geometries,
    /// Attribute records were left over.
    Attributes,
}

impl fmt::Display for UnpairedStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Geometries => "geometry",
            Self::Attributes => "attribute",
        })
    }
}

/// Lock-step iteration over a geometry stream and an attribute stream.
///
/// Each call to [`Iterator::next`] takes exactly one record from each side or
/// nothing at all, so the streams can never drift apart.
///
/// # Examples
///
/// ```
/// use terrane_data::{PairedRecords, UnpairedStream};
///
/// let mut pairs = PairedRecords::new(1..=3, ["a", "b"].into_iter());
/// assert_eq!(pairs.by_ref().collect::<Vec<_>>(), [(1, "a"), (2, "b")]);
/// assert_eq!(pairs.unpaired(), Some(UnpairedStream::Geometries));
/// ```
pub struct PairedRecords<G, A>
where
    G: Iterator,
    A: Iterator,
{
    geometries: Peekable<G>,
    attributes: Peekable<A>,
}

impl<G, A> PairedRecords<G, A>
where
    G: Iterator,
    A: Iterator,
{
    /// Pair `geometries` with `attributes`.
    pub fn new(geometries: G, attributes: A) -> Self {
        Self {
            geometries: geometries.peekable(),
            attributes: attributes.peekable(),
        }
    }

    /// Report whether both streams still have a record.
    pub fn has_next(&mut self) -> bool {
        self.geometries.peek().is_some() && self.attributes.peek().is_some()
    }

    /// The stream that still holds records, once pairing has stopped.
    ///
    /// Returns `None` while pairs remain or when both streams are exhausted.
    pub fn unpaired(&mut self) -> Option<UnpairedStream> {
        match (
            self.geometries.peek().is_some(),
            self.attributes.peek().is_some(),
        ) {
            (true, false) => Some(UnpairedStream::Geometries),
            (false, true) => Some(UnpairedStream::Attributes),
            _ => None,
        }
    }
}

impl<G, A> Iterator for PairedRecords<G, A>
where
    G: Iterator,
    A: Iterator,
{
    type Item = (G::Item, A::Item);

    fn next(&mut self) -> Option<Self::Item> {
        if !self.has_next() {
            return None;
        }
        let geometry = self.geometries.next()?;
        let attributes = self.attributes.next()?;
        Some((geometry, attributes))
    }
}
