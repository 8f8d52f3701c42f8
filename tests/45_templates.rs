mod common;

use anyhow::Result;
use common::*;
use fulcrum_api_rust::database::Table;
use reqwest::StatusCode;
use serde_json::{json, Value};

fn template(k: &str, tenant: &str, lang: &str) -> Value {
    json!({"k": k, "v": format!("{} body", k), "tenant": tenant, "lang": lang})
}

#[tokio::test]
async fn add_list_edit_delete() -> Result<()> {
    let app = spawn_app().await?;

    let (status, body) = app.post("/api/masterdata/addTemplate", Some(ADMIN), template("welcome", TENANT, "en")).await?;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body, json!({"ok": true, "id": 1}));
    app.post("/api/masterdata/addTemplate", Some(ADMIN), template("welcome", TENANT, "zh-HK")).await?;
    app.post("/api/masterdata/addTemplate", Some(ADMIN), template("welcome", "portal.test", "en")).await?;

    let (_, all) = app.get("/api/masterdata/getTemplate", Some(ADMIN)).await?;
    assert_eq!(all.as_array().unwrap().len(), 3);
    let (_, filtered) = app.get("/api/masterdata/getTemplate?tenant=portal.test", Some(ADMIN)).await?;
    assert_eq!(filtered.as_array().unwrap().len(), 1);
    assert_eq!(filtered[0]["id"], 3);
    let (_, filtered) = app.get(&format!("/api/masterdata/getTemplate?tenant={}&lang=zh-HK", TENANT), Some(ADMIN)).await?;
    assert_eq!(filtered[0]["id"], 2);

    let mut edit = template("farewell", TENANT, "en");
    edit["id"] = json!(1);
    let (status, body) = app.post("/api/masterdata/editTemplate", Some(ADMIN), edit).await?;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(app.row(Table::Template, 1).await.unwrap()["k"], "farewell");

    let (status, _) = app.post("/api/masterdata/deleteTemplate", Some(ADMIN), json!({"id": 3})).await?;
    assert_eq!(status, StatusCode::OK);
    assert!(app.row(Table::Template, 3).await.is_none());
    Ok(())
}

#[tokio::test]
async fn template_validation() -> Result<()> {
    let app = spawn_app().await?;
    app.post("/api/masterdata/addTemplate", Some(ADMIN), template("welcome", TENANT, "en")).await?;
    app.post("/api/masterdata/addTemplate", Some(ADMIN), template("reset", TENANT, "en")).await?;

    assert_error(app.post("/api/masterdata/addTemplate", Some(ADMIN), json!({})).await?, 400, "Please provide template details");
    assert_error(
        app.post("/api/masterdata/addTemplate", Some(ADMIN), json!({"k": "a", "v": "b", "lang": "en"})).await?,
        400,
        "must have required property 'tenant'",
    );
    assert_error(
        app.post("/api/masterdata/addTemplate", Some(ADMIN), json!({"k": "a", "v": 1, "tenant": TENANT, "lang": "en"})).await?,
        400,
        "must be string",
    );
    assert_error(
        app.post("/api/masterdata/addTemplate", Some(ADMIN), template("welcome", TENANT, "en")).await?,
        400,
        "Provided template details are already available",
    );

    assert_error(
        app.post("/api/masterdata/editTemplate", Some(ADMIN), template("x", TENANT, "en")).await?,
        400,
        "Please provide id to update template details",
    );
    let mut edit = template("x", TENANT, "en");
    edit["id"] = json!(9);
    assert_error(
        app.post("/api/masterdata/editTemplate", Some(ADMIN), edit).await?,
        400,
        "Provided template id is not available for update",
    );
    let mut clash = template("reset", TENANT, "en");
    clash["id"] = json!(1);
    assert_error(
        app.post("/api/masterdata/editTemplate", Some(ADMIN), clash).await?,
        400,
        "Provided template details are already available",
    );

    assert_error(
        app.post("/api/masterdata/deleteTemplate", Some(ADMIN), json!({"k": "welcome"})).await?,
        400,
        "Please provide id to delete from template",
    );
    assert_error(
        app.post("/api/masterdata/deleteTemplate", Some(ADMIN), json!({"id": 9})).await?,
        400,
        "Provided template id is not available for delete",
    );
    Ok(())
}

#[tokio::test]
async fn public_lookup_uses_host_tenant() -> Result<()> {
    let app = spawn_app().await?;
    app.post("/api/masterdata/addTemplate", Some(ADMIN), template("terms", TENANT, "en")).await?;
    app.post("/api/masterdata/addTemplate", Some(ADMIN), template("terms", TENANT, "zh-CN")).await?;
    app.post("/api/masterdata/addTemplate", Some(ADMIN), template("privacy", "portal.test", "en")).await?;

    let (status, body) = app.get("/api/masterdata/getTemplate/terms", None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["lang"], "en");

    let (_, body) = app.get("/api/masterdata/getTemplate/terms?lang=zh-CN", None).await?;
    assert_eq!(body[0]["v"], "terms body");
    assert_eq!(body[0]["lang"], "zh-CN");

    assert_error(app.get("/api/masterdata/getTemplate/privacy", None).await?, 400, "No such code/key available");
    assert_error(app.get("/api/masterdata/getTemplate/terms?lang=fr", None).await?, 400, "No such code/key available");
    Ok(())
}

#[tokio::test]
async fn management_is_admin_only() -> Result<()> {
    let app = spawn_app().await?;
    assert_error(app.get("/api/masterdata/getTemplate", Some(CHANNEL_OWNER)).await?, 401, "Unauthorized");
    assert_error(
        app.post("/api/masterdata/addTemplate", Some(OFFICE_ADMIN), template("x", TENANT, "en")).await?,
        401,
        "Unauthorized",
    );
    Ok(())
}
