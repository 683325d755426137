
use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use opsboard::dashboard::{router, DashboardState};
use opsboard::jobs::{JobStatus, JobTable};
use test_harness::{job, sample_table, static_source};

fn create_test_app(table: JobTable) -> Router {
    router(DashboardState::new(static_source(table)))
}

async fn send(app: Router, method: Method, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
    send(app, Method::GET, uri).await
}

#[tokio::test]
async fn test_index_serves_html() {
    let app = create_test_app(sample_table());

    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    assert!(content_type.contains("text/html"));
}

#[tokio::test]
async fn test_index_renders_job_data_as_text() {
    let app = create_test_app(sample_table());

    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let page = String::from_utf8(body.to_vec()).unwrap();

    // Job values reach the DOM through textContent, never as markup.
    assert!(!page.contains("innerHTML"));
    assert!(!page.contains("insertAdjacentHTML"));
    assert!(page.contains("textContent"));
    // One query key per selected value.
    assert!(page.contains("params.append(f, v)"));
}

#[tokio::test]
async fn test_view_without_filters() {
    let (status, json) = get_json(create_test_app(sample_table()), "/api/view").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["total_rows"], 12);
    assert_eq!(json["rows"].as_array().unwrap().len(), 12);
    assert_eq!(
        json["options"]["projects"],
        serde_json::json!(["ADNI", "TAYLOR", "WOODWARD"])
    );
    assert_eq!(
        json["columns"],
        serde_json::json!(["LABEL", "STATUS", "LASTMOD", "WALLTIME", "JOBID"])
    );

    let charts = json["charts"].as_array().unwrap();
    assert_eq!(charts.len(), 3);
    assert_eq!(charts[1]["title"], "By PROJECT");
    assert_eq!(charts[1]["series"].as_array().unwrap().len(), 6);
    assert_eq!(charts[1]["series"][0]["status"], "UNKNOWN");
    assert_eq!(json["legend"].as_array().unwrap().len(), 6);
}

#[tokio::test]
async fn test_view_with_filters() {
    let (status, json) = get_json(
        create_test_app(sample_table()),
        "/api/view?project=ADNI&project=WOODWARD&user=bdboyd",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let rows = json["rows"].as_array().unwrap();
    assert_eq!(rows.len(), 4);
    assert!(rows.iter().all(|r| r["USER"] == "bdboyd"));

    // Options still list every value in the snapshot.
    assert_eq!(json["options"]["users"].as_array().unwrap().len(), 3);

    let by_project = &json["charts"][1];
    assert_eq!(by_project["categories"], serde_json::json!(["ADNI", "WOODWARD"]));
    let failed = &by_project["series"][JobStatus::Failed.index()];
    assert_eq!(failed["label"], "FAILED (2)");
    assert_eq!(failed["values"], serde_json::json!([1, 1]));
}

#[tokio::test]
async fn test_list_jobs_filters_rows() {
    let (status, json) = get_json(
        create_test_app(sample_table()),
        "/api/jobs?proctype=fmriqa_v4",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let rows = json.as_array().unwrap();
    assert_eq!(rows.len(), 4);
    assert_eq!(rows[0]["LABEL"], "TAYLOR-01-fmri");
    assert_eq!(rows[1]["STATUS"], "");
    assert_eq!(rows[1]["background"], "#ffffff");
}

#[tokio::test]
async fn test_filter_values_may_contain_commas_and_spaces() {
    let table = JobTable::new(vec![
        job("a", "Smith, J", "FS7_v1", "bdboyd", Some(JobStatus::Running)),
        job("b", "Other", "FS7_v1", "bdboyd", Some(JobStatus::Failed)),
        job("c", " Padded ", "FS7_v1", "bdboyd", Some(JobStatus::Pending)),
    ]);

    let (status, json) = get_json(
        create_test_app(table.clone()),
        "/api/jobs?project=Smith%2C%20J",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let rows = json.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["LABEL"], "a");

    let (_, json) = get_json(
        create_test_app(table.clone()),
        "/api/jobs?project=Smith%2C%20J&project=Other",
    )
    .await;
    assert_eq!(json.as_array().unwrap().len(), 2);

    let (_, json) = get_json(create_test_app(table), "/api/jobs?project=%20Padded%20").await;
    let rows = json.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["LABEL"], "c");
}

#[tokio::test]
async fn test_list_jobs_empty_table() {
    let (status, json) = get_json(create_test_app(JobTable::default()), "/api/jobs").await;

    assert_eq!(status, StatusCode::OK);
    assert!(json.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_summary_by_facet() {
    let (status, json) =
        get_json(create_test_app(sample_table()), "/api/summary/user").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["facet"], "user");
    assert_eq!(json["title"], "By USER");
    assert_eq!(json["categories"], serde_json::json!(["bdboyd", "kwang", "mlee"]));
    let running = &json["series"][JobStatus::Running.index()];
    assert_eq!(running["values"], serde_json::json!([2, 0, 1]));
}

#[tokio::test]
async fn test_summary_unknown_facet_is_bad_request() {
    let (status, json) =
        get_json(create_test_app(sample_table()), "/api/summary/status").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("status"));
}

#[tokio::test]
async fn test_refresh_replaces_snapshot() {
    let source = static_source(sample_table());
    let app = router(DashboardState::new(source.clone()));

    let (_, before) = get_json(app.clone(), "/api/jobs").await;
    assert_eq!(before.as_array().unwrap().len(), 12);

    source.fetcher().set_table(JobTable::new(vec![job(
        "NEW-01",
        "NEW",
        "FS7_v1",
        "kwang",
        Some(JobStatus::Waiting),
    )]));

    // Still served from the cached snapshot.
    let (_, cached) = get_json(app.clone(), "/api/jobs").await;
    assert_eq!(cached.as_array().unwrap().len(), 12);

    let (status, refreshed) = send(app.clone(), Method::POST, "/api/refresh").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(refreshed["rows"], 1);

    let (_, after) = get_json(app, "/api/jobs").await;
    assert_eq!(after.as_array().unwrap().len(), 1);
    assert_eq!(source.fetcher().fetches(), 2);
}

#[tokio::test]
async fn test_view_refresh_flag_refetches() {
    let source = static_source(sample_table());
    let app = router(DashboardState::new(source.clone()));

    get_json(app.clone(), "/api/view").await;
    get_json(app.clone(), "/api/view?refresh=true").await;

    assert_eq!(source.fetcher().fetches(), 2);
}

#[tokio::test]
async fn test_statuses_legend() {
    let (status, json) = get_json(create_test_app(sample_table()), "/api/statuses").await;

    assert_eq!(status, StatusCode::OK);
    let legend = json.as_array().unwrap();
    let statuses: Vec<&str> = legend.iter().map(|e| e["status"].as_str().unwrap()).collect();
    assert_eq!(
        statuses,
        vec!["UNKNOWN", "FAILED", "COMPLETE", "RUNNING", "PENDING", "WAITING"]
    );
    assert_eq!(
        legend[3]["description"],
        "job is currently running on the cluster"
    );
    assert!(legend[3]["hex"].as_str().unwrap().starts_with('#'));
}
