use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use telusur_core::analyzer::Analyzer;
use telusur_core::stopwords::StopwordList;
use telusur_core::{Document, EngineConfig, SearchEngine};
use telusur_server::{router, AppState};
use tempfile::tempdir;
use tower::ServiceExt;

const TOKEN: &str = "rahasia";

fn engine() -> SearchEngine {
    let stopwords = StopwordList::new(["yang", "di", "dan", "ke", "dari"]);
    SearchEngine::with_analyzer(Analyzer::new(stopwords), EngineConfig { parallel: false, ..EngineConfig::default() })
}

fn corpus() -> Vec<Document> {
    vec![
        Document::new("olahraga.txt", "Pemain sepakbola mencetak gol di babak kedua"),
        Document::new("politik.txt", "Partai politik menyiapkan kampanye pemilihan presiden"),
        Document::new("cuaca.txt", "Hujan deras dan angin kencang melanda kota\nsepanjang malam"),
    ]
}

/// Fit the tiny corpus and write it to `path`.
fn write_model(path: &Path, docs: Vec<Document>) {
    let e = engine();
    e.fit(docs, 15).unwrap();
    e.save(path).unwrap();
}

fn app(model: &Path, load: bool) -> Router {
    let engine = Arc::new(engine());
    if load {
        engine.load(model).unwrap();
    }
    router(AppState { engine, model_path: model.to_path_buf(), admin_token: Some(TOKEN.into()) })
}

async fn send(app: Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let body = resp.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&body).unwrap_or(Value::String(String::from_utf8_lossy(&body).into_owned()));
    (status, json)
}

async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
    send(app, Request::get(uri).body(Body::empty()).unwrap()).await
}

async fn reload(app: Router, token: Option<&str>) -> (StatusCode, Value) {
    let mut req = Request::post("/admin/reload");
    if let Some(t) = token {
        req = req.header("X-ADMIN-TOKEN", t);
    }
    send(app, req.body(Body::empty()).unwrap()).await
}

#[tokio::test]
async fn search_returns_ranked_results() {
    let dir = tempdir().unwrap();
    let model = dir.path().join("ir_model.bin");
    write_model(&model, corpus());

    let (status, json) = get(app(&model, true), "/search?q=sepakbola%20gol&k=2").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["query"], "sepakbola gol");
    assert_eq!(json["total_hits"], 3);
    let arr = json["results"].as_array().unwrap();
    assert_eq!(arr.len(), 2);
    assert_eq!(arr[0]["doc_id"], "olahraga.txt");
    assert_eq!(arr[0]["index"], 0);
    assert!(arr[0]["score"].as_f64().unwrap() > arr[1]["score"].as_f64().unwrap());
}

#[tokio::test]
async fn snippet_flattens_newlines() {
    let dir = tempdir().unwrap();
    let model = dir.path().join("ir_model.bin");
    write_model(&model, corpus());

    let (status, json) = get(app(&model, true), "/search?q=hujan&k=1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["results"][0]["snippet"], "Hujan deras dan angin kencang melanda kota sepanjang malam...");
}

#[tokio::test]
async fn k_is_clamped() {
    let dir = tempdir().unwrap();
    let model = dir.path().join("ir_model.bin");
    write_model(&model, corpus());

    let (_, json) = get(app(&model, true), "/search?q=hujan&k=0").await;
    assert_eq!(json["results"].as_array().unwrap().len(), 1);
    let (_, json) = get(app(&model, true), "/search?q=hujan&k=1000").await;
    assert_eq!(json["results"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn missing_k_uses_configured_top_n() {
    let dir = tempdir().unwrap();
    let model = dir.path().join("ir_model.bin");
    write_model(&model, corpus());

    let config = EngineConfig { parallel: false, top_n: 2, ..EngineConfig::default() };
    let engine = SearchEngine::with_analyzer(Analyzer::new(StopwordList::new(["dan"])), config);
    engine.load(&model).unwrap();
    let app = router(AppState { engine: Arc::new(engine), model_path: model.clone(), admin_token: None });

    let (status, json) = get(app.clone(), "/search?q=hujan").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["results"].as_array().unwrap().len(), 2);
    let (_, json) = get(app, "/search?q=hujan&k=3").await;
    assert_eq!(json["results"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn unfitted_engine_answers_503() {
    let dir = tempdir().unwrap();
    let model = dir.path().join("missing.bin");

    let (status, _) = get(app(&model, false), "/health").await;
    assert_eq!(status, StatusCode::OK);
    for uri in ["/search?q=gol", "/doc/0", "/stats"] {
        let (status, _) = get(app(&model, false), uri).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE, "{uri}");
    }
}

#[tokio::test]
async fn doc_and_stats_routes() {
    let dir = tempdir().unwrap();
    let model = dir.path().join("ir_model.bin");
    write_model(&model, corpus());

    let (status, json) = get(app(&model, true), "/doc/1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["doc_id"], "politik.txt");
    assert_eq!(json["text"], "Partai politik menyiapkan kampanye pemilihan presiden");

    let (status, _) = get(app(&model, true), "/doc/3").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, json) = get(app(&model, true), "/stats?limit=2").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["num_docs"], 3);
    assert_eq!(json["num_topics"], 3);
    assert_eq!(json["terms"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn reload_requires_token() {
    let dir = tempdir().unwrap();
    let model = dir.path().join("ir_model.bin");
    write_model(&model, corpus());

    let (status, _) = reload(app(&model, false), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = reload(app(&model, false), Some("salah")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn reload_swaps_in_new_model() {
    let dir = tempdir().unwrap();
    let model = dir.path().join("ir_model.bin");
    let app = app(&model, false);

    // nothing on disk yet: reload fails and the service stays unfitted
    let (status, _) = reload(app.clone(), Some(TOKEN)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let (status, _) = get(app.clone(), "/search?q=gol").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    write_model(&model, corpus());
    let (status, json) = reload(app.clone(), Some(TOKEN)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["num_docs"], 3);
    let (status, json) = get(app.clone(), "/search?q=kampanye").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["results"][0]["doc_id"], "politik.txt");

    // a corrupt artifact leaves the loaded model serving
    std::fs::write(&model, b"rusak").unwrap();
    let (status, _) = reload(app.clone(), Some(TOKEN)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let (status, json) = get(app, "/search?q=kampanye").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["results"][0]["doc_id"], "politik.txt");
}
