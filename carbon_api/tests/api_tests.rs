/// HTTP-level tests for the carbon API router
///
/// Run with: cargo test -p carbon_api --test api_tests -- --nocapture

use axum::body::Body;
use axum::http::{Request, StatusCode};
use carbon_api::model::{KMeans, Regressor, StandardScaler};
use carbon_api::{router, AppState, CarbonModel, HistoricalSeries, Sample, ServiceConfig, UserClusterer};
use chrono::{Duration, NaiveDate};
use serde_json::{json, Value};
use std::io::Write;
use tower::ServiceExt;

const K: usize = 4;

fn history(n: usize) -> HistoricalSeries {
    let start = NaiveDate::from_ymd_opt(2023, 3, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    HistoricalSeries::from_samples(
        (0..n)
            .map(|i| Sample {
                at: start + Duration::hours(i as i64),
                intensity: 200.0 + (i % 24) as f64 * 5.0,
            })
            .collect(),
    )
}

/// hour * 10 + lag_1 * 0.5 + 1.2345
fn carbon_model() -> CarbonModel {
    let mut coefficients = vec![0.0; 11];
    coefficients[0] = 10.0;
    coefficients[3] = 0.5;
    CarbonModel::new(Regressor::Linear {
        coefficients,
        intercept: 1.2345,
    })
    .unwrap()
}

fn clusterer() -> UserClusterer {
    // centroids along the arrival-hour axis in scaled space
    let centers = (0..K).map(|i| vec![i as f64, 0.0, 0.0]).collect();
    UserClusterer::new(
        StandardScaler::new(vec![0.0, 2.0, 40.0], vec![6.0, 1.0, 10.0]),
        KMeans::new(centers),
    )
    .unwrap()
}

fn state(n: usize) -> AppState {
    AppState::new(carbon_model(), clusterer(), history(n))
}

async fn post(state: AppState, uri: &str, body: Value) -> (StatusCode, Value) {
    let response = router(state)
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

#[tokio::test]
async fn test_predict_carbon_basic() {
    println!("\n=== Test: predict_carbon basic ===");
    let (status, body) = post(
        state(48),
        "/predict_carbon",
        json!({ "timestamp": "2024-06-03T14:00:00" }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["timestamp"], "2024-06-03T14:00:00");

    // last sample is i=47 -> 200 + 23 * 5 = 315
    let expected = 14.0 * 10.0 + 315.0 * 0.5 + 1.2345;
    let got = body["predicted_carbon_intensity"].as_f64().unwrap();
    println!("✓ predicted {:.3}", got);
    assert!(got.is_finite());
    assert!((got - expected).abs() < 1e-3);
    assert_eq!(got, format!("{:.3}", expected).parse::<f64>().unwrap());
}

#[tokio::test]
async fn test_predict_carbon_uses_wall_clock_hour() {
    let (status, body) = post(
        state(48),
        "/predict_carbon",
        json!({ "timestamp": "2024-06-03T05:00:00+09:00" }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["timestamp"], "2024-06-03T05:00:00+09:00");
    let got = body["predicted_carbon_intensity"].as_f64().unwrap();
    assert!((got - (50.0 + 157.5 + 1.2345)).abs() < 1e-3);
}

fn constant_model(value: f64) -> CarbonModel {
    CarbonModel::new(Regressor::Linear {
        coefficients: vec![0.0; 11],
        intercept: value,
    })
    .unwrap()
}

#[tokio::test]
async fn test_prediction_rounds_ties_to_even() {
    println!("\n=== Test: 3-decimal rounding on ties ===");
    for (value, expected) in [(312.0625, 312.062), (0.0625, 0.062), (450.1875, 450.188)] {
        let s = AppState::new(constant_model(value), clusterer(), history(48));
        let (status, body) = post(
            s,
            "/predict_carbon",
            json!({ "timestamp": "2024-06-03T14:00:00" }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["predicted_carbon_intensity"], expected, "value {value}");
        println!("✓ {value} -> {expected}");
    }
}

#[test]
fn test_feature_logging_does_not_change_prediction() {
    let at = NaiveDate::from_ymd_opt(2024, 6, 3)
        .unwrap()
        .and_hms_opt(14, 0, 0)
        .unwrap();
    let quiet = state(48);
    let logged = state(48).with_feature_logging(true);

    let expected = quiet.predict_carbon(at).unwrap();
    assert_eq!(logged.predict_carbon(at).unwrap(), expected);

    let short = AppState::new(carbon_model(), clusterer(), history(10)).with_feature_logging(true);
    assert!(short.predict_carbon(at).is_err());
}

#[tokio::test]
async fn test_predict_carbon_is_idempotent() {
    let s = state(72);
    let req = json!({ "timestamp": "2025-01-01T08:30:00Z" });
    let (_, first) = post(s.clone(), "/predict_carbon", req.clone()).await;
    let (_, second) = post(s, "/predict_carbon", req).await;
    assert_eq!(first, second);
    println!("✓ identical responses: {}", first);
}

#[tokio::test]
async fn test_predict_carbon_short_history_is_500() {
    println!("\n=== Test: insufficient history ===");
    let (status, body) = post(
        state(23),
        "/predict_carbon",
        json!({ "timestamp": "2024-06-03T14:00:00" }),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let msg = body["error"].as_str().unwrap();
    assert!(msg.contains("insufficient carbon history"), "got {msg}");
}

#[tokio::test]
async fn test_predict_carbon_rejects_bad_timestamp() {
    let (status, _) = post(state(48), "/predict_carbon", json!({ "timestamp": "soon" })).await;
    assert!(status.is_client_error(), "got {status}");

    let (status, _) = post(state(48), "/predict_carbon", json!({})).await;
    assert!(status.is_client_error(), "got {status}");
}

#[tokio::test]
async fn test_cluster_user_in_range() {
    println!("\n=== Test: cluster_user label range ===");
    let s = state(48);
    for (hour, duration, energy) in [
        (0.0, 1.0, 5.0),
        (6.0, 2.0, 40.0),
        (18.0, 2.0, 40.0),
        (23.0, 10.0, 100.0),
        (-500.0, 1e6, -3.0),
    ] {
        let (status, body) = post(
            s.clone(),
            "/cluster_user",
            json!({
                "arrival_hour": hour,
                "charging_duration": duration,
                "energy_consumed": energy,
            }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let label = body["user_cluster"].as_u64().unwrap() as usize;
        println!("  hour={hour} -> cluster {label}");
        assert!(label < K);
    }
}

#[tokio::test]
async fn test_cluster_user_nearest_centroid() {
    // hour 12 scales to 2.0 -> centroid 2; hour 60 scales to 10 -> last centroid
    let (_, body) = post(
        state(48),
        "/cluster_user",
        json!({ "arrival_hour": 12, "charging_duration": 2, "energy_consumed": 40 }),
    )
    .await;
    assert_eq!(body["user_cluster"], 2);

    let (_, body) = post(
        state(48),
        "/cluster_user",
        json!({ "arrival_hour": 60, "charging_duration": 2, "energy_consumed": 40 }),
    )
    .await;
    assert_eq!(body["user_cluster"], K - 1);
}

#[tokio::test]
async fn test_state_loads_from_disk() {
    println!("\n=== Test: load artifacts from disk ===");
    let dir = tempfile::tempdir().unwrap();

    let mut csv = String::from("Datetime (UTC),Carbon intensity gCO₂eq/kWh (direct)\n");
    let start = NaiveDate::from_ymd_opt(2024, 2, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    // written newest-first; the loader sorts
    for i in (0..30).rev() {
        let at = start + Duration::hours(i);
        csv.push_str(&format!("{},{}\n", at.format("%Y-%m-%d %H:%M:%S"), 100 + i));
    }

    let files = [
        ("history.csv", csv),
        (
            "carbon.json",
            json!({
                "kind": "tree_ensemble",
                "aggregation": "mean",
                "trees": [{
                    "children_left": [1, -1, -1],
                    "children_right": [2, -1, -1],
                    "feature": [3, -2, -2],
                    "threshold": [120.0, -2.0, -2.0],
                    "value": [0.0, 111.1, 222.2]
                }]
            })
            .to_string(),
        ),
        (
            "kmeans.json",
            json!({ "cluster_centers": [[0, 0, 0], [1, 1, 1], [-1, -1, -1]] }).to_string(),
        ),
        (
            "scaler.json",
            json!({ "mean": [12.0, 3.0, 30.0], "scale": [6.0, 2.0, 15.0] }).to_string(),
        ),
    ];
    for (name, content) in &files {
        let mut f = std::fs::File::create(dir.path().join(name)).unwrap();
        f.write_all(content.as_bytes()).unwrap();
    }

    let cfg = ServiceConfig {
        carbon_model_path: dir.path().join("carbon.json"),
        cluster_model_path: dir.path().join("kmeans.json"),
        cluster_scaler_path: dir.path().join("scaler.json"),
        history_path: dir.path().join("history.csv"),
        ..ServiceConfig::default()
    };
    let s = AppState::load(&cfg).unwrap();
    assert_eq!(s.history().len(), 30);
    assert_eq!(s.clusterer().n_clusters(), 3);

    // latest sample is 2024-02-02 05:00 with 129 > 120, so the right leaf
    let (status, body) = post(
        s.clone(),
        "/predict_carbon",
        json!({ "timestamp": "2024-02-03T10:00:00" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["predicted_carbon_intensity"], 222.2);

    let (_, body) = post(
        s,
        "/cluster_user",
        json!({ "arrival_hour": 18, "charging_duration": 5, "energy_consumed": 45 }),
    )
    .await;
    assert_eq!(body["user_cluster"], 1);
    println!("✓ loaded and served from disk");
}

#[test]
fn test_load_reports_missing_artifact() {
    let cfg = ServiceConfig {
        carbon_model_path: "/nonexistent/model.json".into(),
        ..ServiceConfig::default()
    };
    let err = AppState::load(&cfg).err().unwrap();
    assert!(format!("{err:#}").contains("failed to read carbon model"));
}
