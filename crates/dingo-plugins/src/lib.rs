//! The four Discover/Transform/Inject plugins that lower `Result`/`Option`
//! generics, exhaustiveness-check `match`, and resolve bare `None`.
//! Run in the canonical order `ResultType -> OptionType -> PatternMatch ->
//! NoneContext`; each later plugin's `dependencies()` encodes that it
//! needs the earlier ones' output already in the tree.

mod none_context;
mod option_type;
mod pattern_match;
mod result_type;
mod sumtype;

pub use none_context::NoneContextPlugin;
pub use option_type::OptionTypePlugin;
pub use pattern_match::PatternMatchPlugin;
pub use result_type::ResultTypePlugin;
