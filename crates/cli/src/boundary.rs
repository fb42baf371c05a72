//! Request validation and response shaping for callers of the search core.

use medsearch_core::config::SearchConfig;
use medsearch_core::error::ValidationError;
use medsearch_core::models::ResultRecord;
use medsearch_core::search::{normalize_category, SearchOutcome, SearchRequest};
use serde::Serialize;

/// Raw search input as a caller supplies it.
#[derive(Debug, Clone, Default)]
pub struct SearchParams {
    pub query: Option<String>,
    pub classifier_type: Option<String>,
    pub category: Option<String>,
    pub top_k: Option<usize>,
}

/// Rejects a missing or blank query, fills in the configured `top_k` and
/// turns the "all categories" label into no filter.
pub fn build_request(
    params: SearchParams,
    cfg: &SearchConfig,
) -> Result<SearchRequest, ValidationError> {
    let query = params.query.ok_or(ValidationError::EmptyQuery)?;
    let classifier = params.classifier_type.filter(|c| !c.trim().is_empty());
    let category = normalize_category(params.category.as_deref(), &cfg.all_categories_label);
    SearchRequest::new(query)?
        .with_classifier(classifier)
        .with_category(category)
        .with_top_k(params.top_k.unwrap_or(cfg.default_top_k))
}

/// JSON body for a search response.
///
/// `degraded` is set when the search failed internally; `results` is then
/// empty rather than missing.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
    pub results: Vec<ResultRecord>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub degraded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<SearchOutcome> for SearchResponse {
    fn from(outcome: SearchOutcome) -> Self {
        match outcome {
            SearchOutcome::Ranked(results) => Self {
                results,
                degraded: false,
                error: None,
            },
            SearchOutcome::Failed(_) => Self {
                results: Vec::new(),
                degraded: true,
                error: Some("An error occurred during search".to_string()),
            },
        }
    }
}

/// JSON body for a rejected request.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl From<&ValidationError> for ErrorResponse {
    fn from(err: &ValidationError) -> Self {
        Self {
            error: err.to_string(),
        }
    }
}

/// One line per hit: score, code, category and description.
pub fn render_results(results: &[ResultRecord]) -> String {
    if results.is_empty() {
        return "no matching codes".to_string();
    }
    results
        .iter()
        .enumerate()
        .map(|(i, r)| {
            format!(
                "{:>2}. {:.4}  {:<8} [{} / {}] {}",
                i + 1,
                r.score,
                r.code,
                r.classifier_type,
                r.category,
                r.description
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
