//! Task-type classification against the template registry.

use crate::templates::{TaskTemplate, TemplateRegistry};

/// Confidence when a template keyword matched.
pub const MATCHED_CONFIDENCE: f64 = 0.8;
/// Confidence when nothing matched and the fallback template was chosen.
pub const DEFAULT_CONFIDENCE: f64 = 0.5;

/// Result of classifying text against the registry.
#[derive(Debug, Clone, Copy)]
pub struct Classification {
    pub template: &'static TaskTemplate,
    pub confidence: f64,
    /// False when the fallback template was returned because nothing matched.
    pub matched: bool,
}

/// Pick the first template (registry order) with a keyword in `text`.
///
/// Registry order decides ties: a later template with more keyword hits
/// never beats an earlier one with a single hit.
pub fn classify(registry: &'static TemplateRegistry, text: &str) -> Classification {
    let lowered = text.to_lowercase();

    match registry.templates().iter().find(|t| t.matches(&lowered)) {
        Some(template) => Classification {
            template,
            confidence: MATCHED_CONFIDENCE,
            matched: true,
        },
        None => Classification {
            template: registry.fallback(),
            confidence: DEFAULT_CONFIDENCE,
            matched: false,
        },
    }
}
