mod common;

use anyhow::Result;
use common::*;
use reqwest::StatusCode;
use serde_json::{json, Value};

const AUDIT: &str = "/api/log/projectInventorySyncAudit";

fn ids(body: &Value) -> Vec<i64> {
    body.as_array().unwrap().iter().filter_map(|r| r["id"].as_i64()).collect()
}

#[tokio::test]
async fn audit_rows_expand_user_and_format_time() -> Result<()> {
    let app = spawn_app().await?;

    let (status, body) = app.get(AUDIT, Some(ADMIN)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&body), vec![1, 2, 3]);
    assert_eq!(
        body[0],
        json!({
            "id": 1,
            "time": "2024-03-01 08:00:00",
            "userId": {"id": 1, "first_name": "Ada", "last_name": "Tester", "email": "admin@fulcrum.test"},
            "projectId": 1,
            "status": "ok",
            "message": "first"
        })
    );
    assert_eq!(body[2]["time"], "2024-03-03 10:45:00");
    assert_eq!(body[2]["userId"], Value::Null);
    Ok(())
}

#[tokio::test]
async fn audit_filters() -> Result<()> {
    let app = spawn_app().await?;

    let (_, body) = app.get(&format!("{}?projectId=1", AUDIT), Some(ADMIN)).await?;
    assert_eq!(ids(&body), vec![1, 3]);

    let (_, body) = app.get(&format!("{}?onlyLastPerProject=true", AUDIT), Some(ADMIN)).await?;
    assert_eq!(ids(&body), vec![3, 2]);

    let (_, body) = app
        .get(&format!("{}?onlyLastPerProject=true&projectId=2", AUDIT), Some(ADMIN))
        .await?;
    assert_eq!(ids(&body), vec![2]);

    let (_, body) = app
        .get(&format!("{}?projectId=1&fields={}", AUDIT, fields_param(&["message"])), Some(ADMIN))
        .await?;
    assert_eq!(body, json!([{"id": 1, "message": "first"}, {"id": 3, "message": "latest"}]));

    assert_error(app.get(&format!("{}?projectId=one", AUDIT), Some(ADMIN)).await?, 400, "projectId should be a number");
    assert_error(app.get(AUDIT, Some(CHANNEL_OWNER)).await?, 401, "Unauthorized");
    Ok(())
}

#[tokio::test]
async fn gps_reports_country_in_header() -> Result<()> {
    let app = spawn_app().await?;
    app.geo.countries.lock().unwrap().insert("203.0.113.7".into(), "Thailand".into());

    let res = app
        .raw()
        .get(format!("{}/api/gps", app.base_url))
        .bearer_auth(app.token(CHANNEL_USER))
        .header("x-forwarded-for", "203.0.113.7, 10.0.0.1")
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers().get("x-country").and_then(|v| v.to_str().ok()), Some("Thailand"));
    assert_eq!(res.text().await?, "");
    Ok(())
}

#[tokio::test]
async fn gps_without_known_country_has_no_header() -> Result<()> {
    let app = spawn_app().await?;

    let res = app
        .raw()
        .get(format!("{}/api/gps", app.base_url))
        .bearer_auth(app.token(OFFICE_ADMIN))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.headers().get("x-country").is_none());
    assert_eq!(*app.geo.asked.lock().unwrap(), vec!["me".to_string()]);

    assert_error(app.get("/api/gps", None).await?, 401, "No authorization token was found");
    Ok(())
}
