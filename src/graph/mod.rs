pub mod artifact;
pub mod conversion;
pub mod description;
pub mod document;
pub mod pin;

pub use conversion::*;
pub use description::*;
pub use document::*;
pub use pin::*;
