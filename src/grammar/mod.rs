//! The grammar engine.
//!
//! A [`Grammar`] is an arena of [`Symbol`]s: terminals reading the raw text or an
//! attached layer, and combinators joining their children's match streams by
//! position. Evaluating a symbol yields [`Match`]es; a [`ConflictResolver`] picks the
//! survivors, and [`Grammar::annotate`] writes them back as layers.

mod eval;
mod matches;
mod projection;
mod resolver;
mod symbol;

pub use eval::EvalCache;
pub use matches::Match;
pub use projection::project;
pub use resolver::{maximal_coverage, ConflictResolver, KeepAll, MaximalCoverage, ResolverKind};
pub use symbol::{
    Grammar, Symbol, SymbolId, TokenSet, LEMMA_ATTRIBUTE, MORPH_LAYER, TAG_ATTRIBUTE,
};
