//! Annotation configuration.

use serde::{Deserialize, Serialize};

use crate::error::{GrammarError, GrammarResult};
use crate::grammar::ResolverKind;

/// Layer receiving matches of unnamed symbols, unless configured otherwise.
pub const DEFAULT_LAYER: &str = "grammar";

/// How [`Grammar::annotate`](crate::grammar::Grammar::annotate) resolves and projects
/// matches.
///
/// Loadable from RON; omitted fields take their defaults:
///
/// ```
/// use layered_text::{AnnotateConfig, grammar::ResolverKind};
///
/// let config = AnnotateConfig::from_ron("(resolver: keep_all)").unwrap();
/// assert_eq!(config.resolver, ResolverKind::KeepAll);
/// assert_eq!(config.default_layer, "grammar");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnotateConfig {
    pub resolver: ResolverKind,
    /// Layer name for matches without a name.
    pub default_layer: String,
    /// Also project named sub-matches of each surviving match.
    pub project_parts: bool,
}

impl AnnotateConfig {
    pub fn with_resolver(resolver: ResolverKind) -> Self {
        Self {
            resolver,
            ..Self::default()
        }
    }

    pub fn from_ron(input: &str) -> GrammarResult<Self> {
        ron::from_str(input).map_err(|e| GrammarError::Config(e.to_string()))
    }
}

impl Default for AnnotateConfig {
    fn default() -> Self {
        Self {
            resolver: ResolverKind::MaximalCoverage,
            default_layer: DEFAULT_LAYER.to_string(),
            project_parts: false,
        }
    }
}
