//! Bidirectional Dingo <-> Go source position mapping.
//!
//! A [`SourceMap`] is an ordered collection of independent [`Mapping`]
//! records between a `.dingo` file and the `.go` file generated from it.
//! Maps compose: chaining a preprocessor pass's Dingo->Mid map with a
//! later pass's Mid->Go map (or the emitter's Mid->Go map) yields a
//! single Dingo->Go map via [`SourceMap::compose`].

mod map;
mod mapping;
mod position;
mod serde_format;

pub use map::{ComposeError, LookupResult, SourceMap};
pub use mapping::Mapping;
pub use position::Position;
pub use serde_format::{ParseError, SerializedMap, CURRENT_VERSION};
