use medsearch_core::error::DataAccessError;
use medsearch_core::models::Entry;
use medsearch_core::ranker::{rank, VectorMatrix};
use std::num::NonZeroUsize;

fn entry(code: &str, category: &str, vector: Vec<f32>) -> Entry {
    Entry {
        code: code.to_string(),
        description: format!("description of {code}"),
        category: category.to_string(),
        classifier_type: "ICD-10".to_string(),
        vector,
    }
}

fn k(n: usize) -> NonZeroUsize {
    NonZeroUsize::new(n).unwrap()
}

fn corpus() -> Vec<Entry> {
    vec![
        entry("X1", "C", vec![1.0, 0.0]),
        entry("X2", "C", vec![0.0, 1.0]),
        entry("X3", "C", vec![0.9, 0.1]),
    ]
}

fn codes(ranked: &[medsearch_core::ranker::Ranked<'_>]) -> Vec<String> {
    ranked.iter().map(|r| r.entry.code.clone()).collect()
}

#[test]
fn nearest_two_of_three() {
    let entries = corpus();
    let matrix = VectorMatrix::from_entries(2, &entries).unwrap();
    let ranked = rank(&[1.0, 0.0], &entries, &matrix, None, k(2)).unwrap();
    assert_eq!(codes(&ranked), vec!["X1", "X3"]);
    assert!((ranked[0].score - 1.0).abs() < 1e-6);
    assert!((ranked[1].score - 0.9939).abs() < 1e-3);
}

#[test]
fn unmatched_category_is_empty() {
    let entries = corpus();
    let matrix = VectorMatrix::from_entries(2, &entries).unwrap();
    let ranked = rank(&[1.0, 0.0], &entries, &matrix, Some("Nope"), k(5)).unwrap();
    assert!(ranked.is_empty());
}

#[test]
fn top_k_larger_than_scope_returns_all() {
    let entries = corpus();
    let matrix = VectorMatrix::from_entries(2, &entries).unwrap();
    let ranked = rank(&[1.0, 0.0], &entries, &matrix, None, k(10)).unwrap();
    assert_eq!(codes(&ranked), vec!["X1", "X3", "X2"]);
}

#[test]
fn category_filter_is_exact_and_after_scoring() {
    let entries = vec![
        entry("N1", "Neoplasms", vec![0.0, 1.0]),
        entry("I1", "Infectious diseases", vec![1.0, 0.0]),
        entry("N2", "neoplasms", vec![0.1, 1.0]),
        entry("N3", "Neoplasms", vec![1.0, 1.0]),
    ];
    let matrix = VectorMatrix::from_entries(2, &entries).unwrap();
    let ranked = rank(&[1.0, 0.0], &entries, &matrix, Some("Neoplasms"), k(5)).unwrap();
    assert_eq!(codes(&ranked), vec!["N3", "N1"]);
    assert!(ranked.iter().all(|r| r.entry.category == "Neoplasms"));
    // Scores are the same with or without the filter.
    let unfiltered = rank(&[1.0, 0.0], &entries, &matrix, None, k(5)).unwrap();
    let n3 = unfiltered.iter().find(|r| r.entry.code == "N3").unwrap();
    assert_eq!(n3.score, ranked[0].score);
}

#[test]
fn ties_keep_entry_order() {
    let entries = vec![
        entry("T1", "C", vec![0.0, 1.0]),
        entry("T2", "D", vec![2.0, 0.0]),
        entry("T3", "C", vec![0.0, 3.0]),
        entry("T4", "C", vec![1.0, 0.0]),
        entry("T5", "C", vec![0.0, 0.5]),
    ];
    let matrix = VectorMatrix::from_entries(2, &entries).unwrap();
    let ranked = rank(&[0.0, 1.0], &entries, &matrix, None, k(5)).unwrap();
    assert_eq!(codes(&ranked), vec!["T1", "T3", "T5", "T2", "T4"]);
    let filtered = rank(&[0.0, 1.0], &entries, &matrix, Some("C"), k(2)).unwrap();
    assert_eq!(codes(&filtered), vec!["T1", "T3"]);
}

#[test]
fn zero_vectors_score_zero() {
    let entries = vec![entry("Z", "C", vec![0.0, 0.0]), entry("Y", "C", vec![0.0, 1.0])];
    let matrix = VectorMatrix::from_entries(2, &entries).unwrap();

    let ranked = rank(&[0.0, 0.0], &entries, &matrix, None, k(2)).unwrap();
    assert!(ranked.iter().all(|r| r.score == 0.0));
    assert_eq!(codes(&ranked), vec!["Z", "Y"]);

    let ranked = rank(&[1.0, 0.0], &entries, &matrix, None, k(2)).unwrap();
    assert_eq!(ranked[0].score, 0.0);
    assert_eq!(ranked[1].score, 0.0);
}

#[test]
fn negative_scores_rank_last() {
    let entries = vec![entry("NEG", "C", vec![-1.0, 0.0]), entry("ZERO", "C", vec![0.0, 1.0])];
    let matrix = VectorMatrix::from_entries(2, &entries).unwrap();
    let ranked = rank(&[1.0, 0.0], &entries, &matrix, None, k(2)).unwrap();
    assert_eq!(codes(&ranked), vec!["ZERO", "NEG"]);
    assert!((ranked[1].score + 1.0).abs() < 1e-6);
}

#[test]
fn misaligned_inputs_are_rejected() {
    let entries = corpus();
    let matrix = VectorMatrix::from_entries(2, &entries[..2]).unwrap();
    assert!(matches!(
        rank(&[1.0, 0.0], &entries, &matrix, None, k(1)),
        Err(DataAccessError::Misaligned { entries: 3, rows: 2 })
    ));
    let matrix = VectorMatrix::from_entries(2, &entries).unwrap();
    assert!(matches!(
        rank(&[1.0, 0.0, 0.0], &entries, &matrix, None, k(1)),
        Err(DataAccessError::QueryDimension { expected: 2, got: 3 })
    ));
}

#[test]
fn empty_scope_ranks_nothing() {
    let matrix = VectorMatrix::empty(2);
    assert!(rank(&[1.0, 0.0], &[], &matrix, None, k(5)).unwrap().is_empty());
}

#[test]
fn non_finite_rows_are_rejected() {
    let entries = vec![
        entry("LOW", "C", vec![0.1, 1.0]),
        entry("BAD", "C", vec![f32::NAN, 0.0]),
        entry("HIGH", "C", vec![1.0, 0.0]),
    ];
    assert!(matches!(
        VectorMatrix::from_entries(2, &entries),
        Err(DataAccessError::NonFiniteVector { ref code, .. }) if code == "BAD"
    ));

    let inf = vec![entry("INF", "C", vec![f32::INFINITY, 0.0])];
    assert!(VectorMatrix::from_entries(2, &inf).is_err());

    // Without the bad row, the best match leads.
    let clean = vec![entries[0].clone(), entries[2].clone()];
    let matrix = VectorMatrix::from_entries(2, &clean).unwrap();
    let ranked = rank(&[1.0, 0.0], &clean, &matrix, None, k(3)).unwrap();
    assert_eq!(codes(&ranked), vec!["HIGH", "LOW"]);
}

#[test]
fn negative_zero_scores_tie_with_zero() {
    let entries = vec![
        entry("P", "C", vec![0.0, 1.0]),
        entry("N", "C", vec![0.0, -1.0]),
        entry("Z", "C", vec![0.0, 0.0]),
    ];
    let matrix = VectorMatrix::from_entries(2, &entries).unwrap();
    let ranked = rank(&[-1.0, 0.0], &entries, &matrix, None, k(3)).unwrap();
    assert_eq!(codes(&ranked), vec!["P", "N", "Z"]);
    assert!(ranked.iter().all(|r| r.score == 0.0 && r.score.is_sign_positive()));
}
