use cli::boundary::{build_request, render_results, ErrorResponse, SearchParams};
use medsearch_core::config::SearchConfig;
use medsearch_core::error::ValidationError;
use medsearch_core::models::ResultRecord;

#[test]
fn missing_or_blank_query_is_rejected() {
    let cfg = SearchConfig::default();
    assert_eq!(
        build_request(SearchParams::default(), &cfg).unwrap_err(),
        ValidationError::EmptyQuery
    );
    let blank = SearchParams {
        query: Some("  ".to_string()),
        ..SearchParams::default()
    };
    let err = build_request(blank, &cfg).unwrap_err();
    assert_eq!(ErrorResponse::from(&err).error, "no search query provided");
}

#[test]
fn defaults_and_normalization() {
    let cfg = SearchConfig {
        default_top_k: 7,
        all_categories_label: "Any".to_string(),
    };
    let params = SearchParams {
        query: Some("fever".to_string()),
        classifier_type: Some(String::new()),
        category: Some("Any".to_string()),
        top_k: None,
    };
    let request = build_request(params, &cfg).unwrap();
    assert_eq!(request.top_k().get(), 7);
    assert_eq!(request.category(), None);
    assert_eq!(request.classifier_type(), None);

    let params = SearchParams {
        query: Some("fever".to_string()),
        classifier_type: Some("ICD-10".to_string()),
        category: Some("All".to_string()),
        top_k: Some(0),
    };
    assert_eq!(build_request(params, &cfg).unwrap_err(), ValidationError::ZeroTopK);
}

#[test]
fn categories_pass_through_untouched() {
    let params = SearchParams {
        query: Some("fever".to_string()),
        category: Some("neoplasms ".to_string()),
        ..SearchParams::default()
    };
    let request = build_request(params, &SearchConfig::default()).unwrap();
    assert_eq!(request.category(), Some("neoplasms "));
}

#[test]
fn render_lists_hits_in_order() {
    assert_eq!(render_results(&[]), "no matching codes");
    let hits = vec![
        ResultRecord {
            code: "A00.9".to_string(),
            description: "Cholera, unspecified".to_string(),
            category: "Infectious diseases".to_string(),
            classifier_type: "ICD-10".to_string(),
            score: 0.91,
        },
        ResultRecord {
            code: "A00.0".to_string(),
            description: "Cholera due to Vibrio cholerae 01, biovar cholerae".to_string(),
            category: "Infectious diseases".to_string(),
            classifier_type: "ICD-10".to_string(),
            score: 0.5,
        },
    ];
    let out = render_results(&hits);
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with(" 1. 0.9100  A00.9"));
    assert!(lines[1].contains("Cholera due to Vibrio"));
}
