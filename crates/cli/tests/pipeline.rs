use cli::boundary::{build_request, SearchParams, SearchResponse};
use medsearch_core::config::{AppConfig, DatabaseConfig, EmbeddingConfig, SearchConfig, SeedConfig};
use medsearch_core::pipeline::SearchService;
use medsearch_core::seed;
use std::fs;
use tempfile::tempdir;

fn config(db: &str, corpus: Option<String>) -> AppConfig {
    AppConfig {
        database: DatabaseConfig {
            path: db.to_string(),
        },
        embeddings: EmbeddingConfig {
            provider: "hashed".to_string(),
            model: String::new(),
            dimensions: 256,
            batch_size: 4,
        },
        search: SearchConfig::default(),
        seed: SeedConfig {
            corpus,
            seed_on_startup: true,
        },
    }
}

fn params(query: &str) -> SearchParams {
    SearchParams {
        query: Some(query.to_string()),
        ..SearchParams::default()
    }
}

#[tokio::test]
async fn sample_corpus_end_to_end() {
    let cfg = config("sqlite://file:e2e_sample?mode=memory&cache=shared", None);
    let (service, summary) = SearchService::start(cfg.clone()).await.unwrap();
    assert_eq!(summary.seeded.unwrap().inserted, 9);
    assert_eq!(summary.embedded, 9);
    assert_eq!(summary.entries, 9);

    let pipeline = service.pipeline();
    assert_eq!(pipeline.list_classifier_types().unwrap(), vec!["ICD-10"]);
    assert_eq!(
        pipeline.list_categories(None).unwrap(),
        vec!["Infectious diseases", "Neoplasms", "Viral infections"]
    );

    let request = build_request(params("cholera"), &cfg.search).unwrap();
    let outcome = pipeline.search(&request).await;
    assert!(!outcome.is_failure());
    let results = outcome.results();
    assert_eq!(results.len(), 5);
    assert_eq!(results[0].category, "Infectious diseases");
    assert!(results[0].code.starts_with("A00"));
    assert!(results.windows(2).all(|w| w[0].score >= w[1].score));

    let mut filtered = params("malignant neoplasm of breast");
    filtered.category = Some("Neoplasms".to_string());
    filtered.top_k = Some(10);
    let request = build_request(filtered, &cfg.search).unwrap();
    let results = pipeline.search_or_empty(&request).await;
    assert_eq!(results.len(), 3);
    assert!(results.iter().all(|r| r.category == "Neoplasms"));

    // Restarting against the same database re-embeds nothing.
    let (_again, summary) = SearchService::start(cfg).await.unwrap();
    assert!(summary.seeded.is_none());
    assert_eq!(summary.embedded, 0);
}

#[tokio::test]
async fn all_label_is_no_filter() {
    let cfg = config("sqlite://file:e2e_all?mode=memory&cache=shared", None);
    let (service, _) = SearchService::start(cfg.clone()).await.unwrap();

    let mut with_all = params("varicella");
    with_all.category = Some("All".to_string());
    with_all.top_k = Some(9);
    let request = build_request(with_all, &cfg.search).unwrap();
    assert_eq!(request.category(), None);
    let results = service.pipeline().search_or_empty(&request).await;
    assert_eq!(results.len(), 9);
}

#[tokio::test]
async fn corpus_file_with_two_classifiers() {
    let temp = tempdir().unwrap();
    let corpus = temp.path().join("corpus.json");
    fs::write(
        &corpus,
        r#"[
            {"code": "001.0", "description": "Cholera due to vibrio cholerae", "category": "Intestinal infectious diseases", "classifier_type": "ICD-9"},
            {"code": "052.0", "description": "Postvaricella encephalitis", "category": "Viral diseases", "classifier_type": "ICD-9"},
            {"code": "A00.0", "description": "Cholera due to Vibrio cholerae 01, biovar cholerae", "category": "Infectious diseases"},
            {"code": "B01.1", "description": "Varicella encephalitis", "category": "Viral infections"}
        ]"#,
    )
    .unwrap();
    let db = temp.path().join("codes.db");
    let cfg = config(
        &db.to_string_lossy(),
        Some(corpus.to_string_lossy().into_owned()),
    );
    let (service, summary) = SearchService::start(cfg.clone()).await.unwrap();
    assert_eq!(summary.entries, 4);

    let pipeline = service.pipeline();
    assert_eq!(pipeline.list_classifier_types().unwrap(), vec!["ICD-10", "ICD-9"]);
    assert_eq!(
        pipeline.list_categories(Some("ICD-9")).unwrap(),
        vec!["Intestinal infectious diseases", "Viral diseases"]
    );
    assert!(pipeline.list_categories(Some("SNOMED")).unwrap().is_empty());

    let mut scoped = params("cholera");
    scoped.classifier_type = Some("ICD-9".to_string());
    let request = build_request(scoped, &cfg.search).unwrap();
    let results = pipeline.search_or_empty(&request).await;
    assert_eq!(results.len(), 2);
    assert!(results.iter().all(|r| r.classifier_type == "ICD-9"));
    assert_eq!(results[0].code, "001.0");

    // Editing a description re-embeds only that code.
    let mut entries = seed::load_corpus_file(&corpus).unwrap();
    entries[1].description = "Postvaricella encephalitis, acute".to_string();
    let seeded = seed::seed_corpus(service.pool(), &entries).await.unwrap();
    assert_eq!(seeded.updated, 1);
    assert_eq!(seeded.unchanged, 3);
    let (embedded, loaded) = service.reload().await.unwrap();
    assert_eq!(embedded, 1);
    assert_eq!(loaded, 4);
}

#[tokio::test]
async fn successful_search_omits_degraded_flag() {
    let cfg = config("sqlite://file:e2e_degraded?mode=memory&cache=shared", None);
    let (service, _) = SearchService::start(cfg.clone()).await.unwrap();
    let request = build_request(params("cholera"), &cfg.search).unwrap();

    let ok = SearchResponse::from(service.pipeline().search(&request).await);
    let body = serde_json::to_value(&ok).unwrap();
    assert!(body.get("degraded").is_none());
    assert_eq!(body["results"].as_array().unwrap().len(), 5);
}
