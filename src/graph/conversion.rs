use super::description::GraphDescription;
use crate::error::GraphConversionError;

/// A trait for custom editor data models that can be converted into a kairo
/// [`GraphDescription`].
///
/// This is the extension point that keeps the engine format-agnostic: the
/// bundled [`GraphDocument`](super::document::GraphDocument) covers the
/// reference JSON shape, and any other persistence layer implements this
/// trait to provide its own translation.
pub trait IntoGraph {
    /// Consumes the object and converts it into a canonical function graph.
    fn into_graph(self) -> Result<GraphDescription, GraphConversionError>;
}
