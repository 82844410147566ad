// tests/designs_api.rs

mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::TestApp;

#[tokio::test]
async fn anonymous_reads_follow_project_visibility() {
    let app = TestApp::new();
    let (owner, _) = app.register("Ana", "ana@example.com").await;
    let project = app.create_project(&owner, "Casa").await;
    let design = app.create_design(&owner, project, "Sala").await;
    let uri = format!("/api/designs/{design}");

    let (status, _) = app.get(&uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    app.put(&format!("/api/projects/{project}"), Some(&owner), json!({ "isPublic": true }))
        .await;

    let (status, body) = app.get(&uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "Sala");

    let (_, body) = app.get("/api/designs/public", None).await;
    assert_eq!(body["data"]["pagination"]["totalItems"], 1);

    // Leitura pública não libera escrita
    let (status, _) = app.put(&uri, None, json!({ "name": "Minha" })).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn furniture_items_are_addressed_by_id() {
    let app = TestApp::new();
    let (owner, _) = app.register("Ana", "ana@example.com").await;
    let project = app.create_project(&owner, "Casa").await;
    let design = app.create_design(&owner, project, "Sala").await;
    let items = format!("/api/designs/{design}/furniture");

    let (status, body) = app
        .post(&items, Some(&owner), json!({ "id": "sofa-1", "name": "Sofá", "price": 1500 }))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["data"]["metadata"]["furnitureCount"], 1);

    let (status, _) = app
        .post(&items, Some(&owner), json!({ "id": "sofa-1", "name": "Outro", "price": 10 }))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = app
        .put(&format!("{items}/sofa-1"), Some(&owner), json!({ "price": 1200 }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["metadata"]["totalCost"], 1200.0);

    let (status, _) = app
        .put(&format!("{items}/nao-existe"), Some(&owner), json!({ "price": 1 }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = app.delete(&format!("{items}/sofa-1"), Some(&owner)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["metadata"]["furnitureCount"], 0);
}

#[tokio::test]
async fn bulk_writes_reject_repeated_item_ids() {
    let app = TestApp::new();
    let (owner, _) = app.register("Ana", "ana@example.com").await;
    let project = app.create_project(&owner, "Casa").await;

    let twins = json!([
        { "id": "x", "name": "A", "price": 10 },
        { "id": "x", "name": "B", "price": 20 }
    ]);
    let (status, _) = app
        .post(
            "/api/designs",
            Some(&owner),
            json!({ "projectId": project, "name": "Sala", "furniture": twins }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, body) = app.get(&format!("/api/designs?projectId={project}"), Some(&owner)).await;
    assert_eq!(body["data"]["pagination"]["totalItems"], 0);
}

#[tokio::test]
async fn viewers_cannot_place_furniture() {
    let app = TestApp::new();
    let (owner, _) = app.register("Ana", "ana@example.com").await;
    let (viewer, viewer_id) = app.register("Bruno", "bruno@example.com").await;
    let project = app.create_project(&owner, "Casa").await;
    let design = app.create_design(&owner, project, "Sala").await;
    app.post(
        &format!("/api/projects/{project}/collaborators"),
        Some(&owner),
        json!({ "userId": viewer_id, "role": "viewer" }),
    )
    .await;

    let (status, _) = app.get(&format!("/api/designs/{design}"), Some(&viewer)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .post(
            &format!("/api/designs/{design}/furniture"),
            Some(&viewer),
            json!({ "name": "Sofá" }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn duplicated_design_gets_a_copy_suffix() {
    let app = TestApp::new();
    let (owner, _) = app.register("Ana", "ana@example.com").await;
    let project = app.create_project(&owner, "Casa").await;
    let design = app.create_design(&owner, project, "Sala").await;

    let (status, body) = app
        .post(&format!("/api/designs/{design}/duplicate"), Some(&owner), json!({}))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["data"]["name"], "Sala (Copy)");
    assert_eq!(body["data"]["version"], 1);
    assert_ne!(body["data"]["id"], json!(design));
}
