mod common;

use anyhow::Result;
use common::*;
use fulcrum_api_rust::airtable::LOCAL_PROJECTS;
use fulcrum_api_rust::database::Table;
use reqwest::StatusCode;
use serde_json::{json, Value};

#[tokio::test]
async fn regions_list() -> Result<()> {
    let app = spawn_app().await?;
    let (status, body) = app.get("/api/masterdata/region", Some(ADMIN)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!([
            {"id": 1, "name": "UK", "currency": "GBP"},
            {"id": 2, "name": "Thailand", "currency": "THB"}
        ])
    );
    Ok(())
}

#[tokio::test]
async fn commission_schemes_round_trip_with_details() -> Result<()> {
    let app = spawn_app().await?;

    let (_, body) = app.get("/api/masterdata/commissionScheme", Some(ADMIN)).await?;
    assert_eq!(
        body,
        json!([{"id": 1, "name": "Standard", "scheme_details": [
            {"id": 1, "paymentPercent": 10, "commissionPercent": 2.5, "paymentDueDay": 30}
        ]}])
    );

    let list = json!({"list": [
        {"name": "Premium", "scheme_details": [{"paymentPercent": 20, "commissionPercent": 3, "paymentDueDay": 15}]},
        {"id": 1, "name": "Standard v2", "scheme_details": []}
    ]});
    let (status, body) = app.post("/api/masterdata/commissionScheme", Some(ADMIN), list).await?;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body, json!({"ok": true}));

    let (_, body) = app.get("/api/masterdata/commissionScheme", Some(ADMIN)).await?;
    assert_eq!(body[0]["name"], "Standard v2");
    assert_eq!(body[0]["scheme_details"], json!([]));
    assert_eq!(body[1]["name"], "Premium");
    assert_eq!(body[1]["scheme_details"][0]["paymentDueDay"], 15);
    Ok(())
}

#[tokio::test]
async fn commission_scheme_validation() -> Result<()> {
    let app = spawn_app().await?;
    let post = |body: Value| app.post("/api/masterdata/commissionScheme", Some(ADMIN), body);

    assert_error(post(json!({})).await?, 400, r#"Please provide the "list" data array"#);
    assert_error(
        post(json!({"list": [{"scheme_details": []}]})).await?,
        400,
        "Please provide name or scheme_details properly",
    );
    assert_error(
        post(json!({"list": [{"name": "X", "scheme_details": [{"paymentPercent": 1, "paymentDueDay": 1}]}]})).await?,
        400,
        "must have required property 'commissionPercent'",
    );
    assert_error(
        post(json!({"list": [{"name": "X", "scheme_details": [{"paymentPercent": "1", "commissionPercent": 1, "paymentDueDay": 1}]}]})).await?,
        400,
        "must be number",
    );
    assert_error(
        post(json!({"list": [{"name": "X", "scheme_details": [{"paymentPercent": 1, "commissionPercent": 1, "paymentDueDay": 1.5}]}]})).await?,
        400,
        "must be integer",
    );
    assert_error(
        post(json!({"list": [{"id": 9, "name": "X", "scheme_details": []}]})).await?,
        400,
        "Commission scheme does not exist",
    );
    assert_eq!(app.rows(Table::CommissionScheme).await.len(), 1);
    Ok(())
}

#[tokio::test]
async fn projects_expand_relations() -> Result<()> {
    let app = spawn_app().await?;

    let (status, body) = app.get("/api/masterdata/project", Some(ADMIN)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body[0],
        json!({
            "id": 1,
            "name": "Tower A",
            "isActive": true,
            "region": {"id": 2, "name": "Thailand", "currency": "THB"},
            "code": "TWA",
            "isCompleted": false,
            "commissionSchemeId": {"id": 1, "name": "Standard"},
            "airtableId": "recP1"
        })
    );
    assert_eq!(body[1]["commissionSchemeId"], Value::Null);

    let path = format!("/api/masterdata/project?id=1&fields={}", fields_param(&["name", "paymentScheduleId"]));
    let (_, body) = app.get(&path, Some(ADMIN)).await?;
    assert_eq!(
        body,
        json!({"id": 1, "name": "Tower A", "paymentScheduleId": {"id": 1, "projectId": 1, "isActive": true, "name": "Standard 10/90"}})
    );
    Ok(())
}

#[tokio::test]
async fn project_listing_errors() -> Result<()> {
    let app = spawn_app().await?;
    assert_error(app.get("/api/masterdata/project?id=99", Some(ADMIN)).await?, 404, "Project not found");
    assert_error(app.get("/api/masterdata/project?id=abc", Some(ADMIN)).await?, 404, "Project not found");
    assert_error(
        app.get("/api/masterdata/project?fields=name", Some(ADMIN)).await?,
        400,
        "Fields param should be array of string",
    );
    let path = format!("/api/masterdata/project?fields={}", fields_param(&["name", "password"]));
    assert_error(app.get(&path, Some(ADMIN)).await?, 400, "Fields param array of strings are not valid");
    Ok(())
}

#[tokio::test]
async fn save_project_creates_and_updates() -> Result<()> {
    let app = spawn_app().await?;
    let post = |body: Value| app.post("/api/masterdata/project", Some(ADMIN), body);

    assert_error(post(json!({})).await?, 400, "Project name is required");
    assert_error(post(json!({"name": "Sky"})).await?, 400, "Project code is required");
    assert_error(post(json!({"name": "Sky", "code": "SKY", "region": 9})).await?, 400, "Region does not exist");
    assert_error(
        post(json!({"name": "Sky", "code": "SKY", "commissionSchemeId": 9})).await?,
        400,
        "Commission scheme does not exist",
    );
    assert_error(post(json!({"id": 99, "name": "Nope"})).await?, 400, "Project does not exist");

    let (status, body) = post(json!({"name": "Sky", "code": "SKY", "region": 1})).await?;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body, json!({"ok": true, "id": 3}));
    let created = app.row(Table::Project, 3).await.unwrap();
    assert_eq!(created["isActive"], true);
    assert_eq!(created["isCompleted"], false);

    let (_, body) = post(json!({"id": 2, "name": "Garden Court II"})).await?;
    assert_eq!(body, json!({"ok": true, "id": 2}));
    let updated = app.row(Table::Project, 2).await.unwrap();
    assert_eq!(updated["name"], "Garden Court II");
    assert_eq!(updated["code"], "GDN");
    Ok(())
}

fn local_projects() -> Value {
    json!([
        {"id": "recP1", "fields": {"Project Name": "Tower A2", "Active": true, "Project Code": "TWA", "Region": ["UK"], "Completed": "yes"}},
        {"id": "recP9", "fields": {"Project Name": "New Heights", "Active": false, "Project Code": "NH", "Region": ["Thailand"]}}
    ])
}

#[tokio::test]
async fn sync_airtable_inserts_new_projects() -> Result<()> {
    let app = spawn_app().await?;
    app.airtable.set_table(LOCAL_PROJECTS, local_projects());

    let (status, body) = app
        .post("/api/masterdata/project/syncAirtable", Some(ADMIN), json!({"syncNew": true}))
        .await?;
    assert_eq!(status, StatusCode::OK, "{}", body);

    let created = app.row(Table::Project, 3).await.expect("synced project");
    assert_eq!(created["name"], "New Heights");
    assert_eq!(created["region"], 2);
    assert_eq!(created["isActive"], false);
    assert_eq!(created["airtableId"], "recP9");
    assert_eq!(app.row(Table::Project, 1).await.unwrap()["name"], "Tower A");
    Ok(())
}

#[tokio::test]
async fn sync_airtable_refreshes_linked_projects() -> Result<()> {
    let app = spawn_app().await?;
    app.airtable.set_table(LOCAL_PROJECTS, local_projects());

    let (status, _) = app
        .post("/api/masterdata/project/syncAirtable", Some(ADMIN), json!({"syncOne": 1}))
        .await?;
    assert_eq!(status, StatusCode::OK);

    let project = app.row(Table::Project, 1).await.unwrap();
    assert_eq!(project["name"], "Tower A2");
    assert_eq!(project["region"], 1);
    assert_eq!(project["isCompleted"], true);
    assert_eq!(app.rows(Table::Project).await.len(), 2);
    Ok(())
}

#[tokio::test]
async fn sync_airtable_errors() -> Result<()> {
    let app = spawn_app().await?;
    app.airtable.set_table(LOCAL_PROJECTS, local_projects());
    let post = |body: Value| app.post("/api/masterdata/project/syncAirtable", Some(ADMIN), body);

    assert_error(post(json!({})).await?, 400, "Please provide required parameter for syncAirtable");
    assert_error(post(json!({"syncOne": "one"})).await?, 400, "syncOne should be a number");
    assert_error(post(json!({"syncOne": 99})).await?, 400, "Provided syncOne / project id is not available");
    assert_error(post(json!({"syncOne": 2})).await?, 400, "Provided syncOne's airtable record not available");

    app.airtable.fail_table(LOCAL_PROJECTS);
    assert_error(post(json!({"syncExisting": true})).await?, 500, "Airtable query error");
    Ok(())
}

#[tokio::test]
async fn inventory_by_project_and_by_id() -> Result<()> {
    let app = spawn_app().await?;

    let (status, body) = app.get("/api/masterdata/projectInventory?projectId=1", Some(ADMIN)).await?;
    assert_eq!(status, StatusCode::OK);
    let rows = body.as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["paymentScheduleId"]["name"], "Standard 10/90");
    assert_eq!(rows[1]["paymentScheduleId"], Value::Null);
    assert!(!rows[0].as_object().unwrap().contains_key("total_area_sqm"));

    let path = format!(
        "/api/masterdata/projectInventory?id=1&fields={}",
        fields_param(&["unit_no", "total_area_sqm", "marketing_cmp_unitpage"])
    );
    let (_, body) = app.get(&path, Some(ADMIN)).await?;
    assert_eq!(body["unit_no"], "A-101");
    assert_eq!(body["total_area_sqm"].as_f64(), Some(55.75));
    assert_eq!(body["marketing_cmp_unitpage"]["gallery"][0]["id"], 10);
    assert_eq!(body["marketing_cmp_unitpage"]["gallery"][0]["fileId"]["tag"], "hero");
    Ok(())
}

#[tokio::test]
async fn inventory_errors() -> Result<()> {
    let app = spawn_app().await?;
    assert_error(app.get("/api/masterdata/projectInventory", Some(ADMIN)).await?, 400, "please provide id or projectId");
    assert_error(
        app.get("/api/masterdata/projectInventory?id=99", Some(ADMIN)).await?,
        404,
        "Project inventory not found",
    );
    Ok(())
}

fn marketing(project_id: i64, hero: i64) -> Value {
    json!({
        "projectId": project_id,
        "locationTagColor": "#ff0000",
        "sloganTransId": {"en": "Live high", "zh-CN": "高处生活", "zh-HK": "高處生活"},
        "sloganTextColor": "#ffffff",
        "heroBannerId": hero,
        "projectStatus": "Promotion",
        "lat": 13.75,
        "lon": 100.5
    })
}

#[tokio::test]
async fn marketing_saves_slogan_translation() -> Result<()> {
    let app = spawn_app().await?;

    let (status, body) = app.post("/api/masterdata/projectMarketing", Some(ADMIN), marketing(1, 10)).await?;
    assert_eq!(status, StatusCode::OK, "{}", body);

    let translation = app.row(Table::Translation, 1).await.expect("translation");
    assert_eq!(translation["parentTable"], "project_marketing.slogan");
    assert_eq!(translation["parentId"], 1);

    let (_, body) = app.get("/api/masterdata/projectMarketing?projectId=1", Some(ADMIN)).await?;
    let row = &body["data"][0];
    assert_eq!(row["projectStatus"], "Promotion");
    assert_eq!(row["isActive"], true);
    assert_eq!(row["sloganTransId"], json!({"id": 1, "en": "Live high", "zh-CN": "高处生活", "zh-HK": "高處生活"}));

    let mut update = marketing(1, 11);
    update["id"] = json!(1);
    update["sloganTransId"] = json!({"id": 1, "en": "Live higher", "zh-CN": "更高", "zh-HK": "更高"});
    let (status, _) = app.post("/api/masterdata/projectMarketing", Some(ADMIN), update).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.row(Table::Translation, 1).await.unwrap()["en"], "Live higher");
    assert_eq!(app.row(Table::ProjectMarketing, 1).await.unwrap()["heroBannerId"], 11);
    assert_eq!(app.rows(Table::Translation).await.len(), 1);

    let mut hide = marketing(1, 11);
    hide["id"] = json!(1);
    hide["isActive"] = json!(false);
    hide["sloganTransId"] = json!({"id": 1, "en": "Live higher", "zh-CN": "更高", "zh-HK": "更高"});
    app.post("/api/masterdata/projectMarketing", Some(ADMIN), hide).await?;
    assert_eq!(app.row(Table::ProjectMarketing, 1).await.unwrap()["isActive"], false);

    let path = format!("/api/masterdata/project?id=1&fields={}", fields_param(&["marketing"]));
    let (_, body) = app.get(&path, Some(ADMIN)).await?;
    assert_eq!(body["marketing"]["sloganTransId"]["en"], "Live higher");
    assert_eq!(body["marketing"]["heroBannerId"]["id"], 11);
    assert_eq!(body["marketing"]["heroBannerId"]["fileId"], Value::Null);
    Ok(())
}

#[tokio::test]
async fn marketing_validation() -> Result<()> {
    let app = spawn_app().await?;
    let post = |body: Value| app.post("/api/masterdata/projectMarketing", Some(ADMIN), body);

    assert_error(app.get("/api/masterdata/projectMarketing", Some(ADMIN)).await?, 400, "projectId required");

    let mut body = marketing(1, 10);
    body["projectStatus"] = json!("Launching");
    assert_error(post(body).await?, 400, "must be equal to one of the allowed values");

    let mut body = marketing(1, 10);
    body["sloganTransId"] = json!({"en": "x", "zh-CN": "y"});
    assert_error(post(body).await?, 400, "must have required property 'zh-HK'");

    let mut body = marketing(1, 10);
    body["lat"] = json!("north");
    assert_error(post(body).await?, 400, "must be number");

    assert_error(post(marketing(99, 10)).await?, 400, "Provided projectId does not exist");
    assert_error(post(marketing(1, 99)).await?, 400, "Provided heroBannerId does not exist");

    let mut body = marketing(1, 10);
    body["id"] = json!(42);
    assert_error(post(body).await?, 400, "Provided id does not exist");

    let mut body = marketing(1, 10);
    body["isActive"] = json!("yes");
    assert_error(post(body).await?, 400, "must be boolean");
    Ok(())
}

#[tokio::test]
async fn marketing_update_requires_known_slogan() -> Result<()> {
    let app = spawn_app().await?;
    app.post("/api/masterdata/projectMarketing", Some(ADMIN), marketing(1, 10)).await?;

    let mut update = marketing(1, 11);
    update["id"] = json!(1);
    update["sloganTransId"] = json!({"id": 42, "en": "Gone", "zh-CN": "无", "zh-HK": "無"});
    assert_error(
        app.post("/api/masterdata/projectMarketing", Some(ADMIN), update).await?,
        400,
        "Provided sloganTransId does not exist",
    );
    assert_eq!(app.row(Table::ProjectMarketing, 1).await.unwrap()["heroBannerId"], 10);
    assert_eq!(app.row(Table::Translation, 1).await.unwrap()["en"], "Live high");
    assert_eq!(app.rows(Table::Translation).await.len(), 1);
    Ok(())
}
