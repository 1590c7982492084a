//! Back office: access control, dashboard, orders, catalog and users.

use axum::http::StatusCode;
use serde_json::{Value, json};

use devgon_integration_tests::{TestApp, TestClient};

async fn place_order(client: &mut TestClient, medicine: &Value) -> Value {
    client
        .post_json("/cart/add", &json!({ "medicine_id": medicine }))
        .await;
    let response = client
        .post_json("/checkout", &json!({ "address": "14 FC Road, Pune" }))
        .await;
    assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
    response.body
}

#[tokio::test]
async fn test_admin_routes_require_admin() {
    let app = TestApp::new();
    let mut anonymous = app.client();
    let mut customer = app.customer("asha@devgon.in").await;

    for uri in ["/admin", "/admin/orders", "/admin/medicines", "/admin/users"] {
        let response = anonymous.get(uri).await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED, "{uri}");
        assert_eq!(response.body["login"], "/auth/login");

        assert_eq!(customer.get(uri).await.status, StatusCode::FORBIDDEN, "{uri}");
    }

    let advance = customer
        .post_json("/admin/orders/o1/advance", &json!({ "current_status": "placed" }))
        .await;
    assert_eq!(advance.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_demoted_admin_loses_access_mid_session() {
    let app = TestApp::new();
    let mut admin = app.admin("admin@devgon.in").await;
    assert_eq!(admin.get("/admin/orders").await.status, StatusCode::OK);

    app.demote("admin@devgon.in").await;
    let orders = admin.get("/admin/orders").await;
    assert_eq!(orders.status, StatusCode::FORBIDDEN);
    assert_eq!(orders.body["error"], "Administrator access required");
    let advance = admin
        .post_json("/admin/orders/o1/advance", &json!({ "current_status": "placed" }))
        .await;
    assert_eq!(advance.status, StatusCode::FORBIDDEN);

    // Still signed in as an ordinary customer.
    assert_eq!(admin.get("/orders").await.status, StatusCode::OK);

    app.promote("admin@devgon.in").await;
    assert_eq!(admin.get("/admin").await.status, StatusCode::OK);
}

#[tokio::test]
async fn test_suspended_admin_loses_access_mid_session() {
    let app = TestApp::new();
    let mut first = app.admin("first@devgon.in").await;
    let mut second = app.admin("second@devgon.in").await;
    let id = second.get("/auth/me").await.body["user"]["id"].clone();

    let suspended = first
        .post_json(
            &format!("/admin/users/{}/suspend", id.as_str().unwrap()),
            &json!({ "suspended": true }),
        )
        .await;
    assert_eq!(suspended.status, StatusCode::OK);

    let users = second.get("/admin/users").await;
    assert_eq!(users.status, StatusCode::FORBIDDEN);
    assert_eq!(users.body["error"], "This account has been suspended");
}

#[tokio::test]
async fn test_dashboard_counts() {
    let app = TestApp::new();
    let tulsi = app.seed_medicine("Tulsi Drops", 120).await;
    app.seed_medicine("Neem Capsules", 80).await;
    let mut customer = app.customer("asha@devgon.in").await;
    let mut admin = app.admin("admin@devgon.in").await;

    let order = place_order(&mut customer, &json!(tulsi)).await;
    place_order(&mut customer, &json!(tulsi)).await;
    admin
        .post_json(
            &format!("/admin/orders/{}/advance", order["id"].as_str().unwrap()),
            &json!({ "current_status": "placed" }),
        )
        .await;

    let dashboard = admin.get("/admin").await;
    assert_eq!(dashboard.status, StatusCode::OK);
    assert_eq!(dashboard.body["stats"]["medicines"], 2);
    assert_eq!(dashboard.body["stats"]["orders"], 2);
    assert_eq!(dashboard.body["stats"]["open_orders"], 2);
    assert_eq!(dashboard.body["stats"]["users"], 2);
    assert!(dashboard.body.get("notice").is_none());
}

#[tokio::test]
async fn test_order_list_filters_by_customer() {
    let app = TestApp::new();
    let tulsi = json!(app.seed_medicine("Tulsi Drops", 120).await);
    let mut asha = app.customer("asha@devgon.in").await;
    let mut ravi = app.customer("ravi@devgon.in").await;
    let mut admin = app.admin("admin@devgon.in").await;

    let first = place_order(&mut asha, &tulsi).await;
    place_order(&mut ravi, &tulsi).await;

    let all = admin.get("/admin/orders").await;
    assert_eq!(all.status, StatusCode::OK);
    assert_eq!(all.body["total"], 2);
    assert_eq!(all.body["open"], 2);
    assert_eq!(all.body["items"].as_array().unwrap().len(), 2);

    let ravi_only = admin.get("/admin/orders?q=RAVI@").await;
    let items = ravi_only.body["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["userEmail"], "ravi@devgon.in");
    assert_eq!(ravi_only.body["total"], 2);

    let by_id = admin
        .get(&format!("/admin/orders?q={}", first["id"].as_str().unwrap()))
        .await;
    assert_eq!(by_id.body["items"][0]["id"], first["id"]);

    let none = admin.get("/admin/orders?q=nobody").await;
    assert!(none.body["items"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_advance_walks_the_pipeline() {
    let app = TestApp::new();
    let tulsi = json!(app.seed_medicine("Tulsi Drops", 120).await);
    let mut customer = app.customer("asha@devgon.in").await;
    let mut admin = app.admin("admin@devgon.in").await;

    let order = place_order(&mut customer, &tulsi).await;
    let uri = format!("/admin/orders/{}/advance", order["id"].as_str().unwrap());

    for (from, to) in [
        ("placed", "processing"),
        ("processing", "shipped"),
        ("shipped", "delivered"),
    ] {
        let response = admin
            .post_json(&uri, &json!({ "current_status": from }))
            .await;
        assert_eq!(response.status, StatusCode::OK, "{}", response.body);
        assert_eq!(response.body["outcome"], "advanced");
        assert_eq!(response.body["to"], to);
    }

    let terminal = admin
        .post_json(&uri, &json!({ "current_status": "delivered" }))
        .await;
    assert_eq!(terminal.body["outcome"], "unchanged");

    let unknown = admin
        .post_json(&uri, &json!({ "current_status": "lost" }))
        .await;
    assert_eq!(unknown.status, StatusCode::OK);
    assert_eq!(unknown.body["outcome"], "unchanged");

    // The admin list reflects the change without waiting for the cache.
    let listed = admin.get("/admin/orders").await;
    assert_eq!(listed.body["items"][0]["status"], "delivered");
    assert!(listed.body["items"][0]["deliveredAt"].is_string());
    assert_eq!(listed.body["open"], 0);

    let history = customer.get("/orders").await;
    let timeline = history.body["items"][0]["timeline"].as_array().unwrap();
    assert!(timeline.iter().all(|step| step["reached"] == true));
}

#[tokio::test]
async fn test_stale_advance_conflicts() {
    let app = TestApp::new();
    let tulsi = json!(app.seed_medicine("Tulsi Drops", 120).await);
    let mut customer = app.customer("asha@devgon.in").await;
    let mut admin = app.admin("admin@devgon.in").await;

    let order = place_order(&mut customer, &tulsi).await;
    let uri = format!("/admin/orders/{}/advance", order["id"].as_str().unwrap());

    let first = admin
        .post_json(&uri, &json!({ "current_status": "placed" }))
        .await;
    assert_eq!(first.status, StatusCode::OK);

    let stale = admin
        .post_json(&uri, &json!({ "current_status": "placed" }))
        .await;
    assert_eq!(stale.status, StatusCode::CONFLICT);

    let missing = admin
        .post_json(
            "/admin/orders/no-such-order/advance",
            &json!({ "current_status": "placed" }),
        )
        .await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_medicine_create_update_delete() {
    let app = TestApp::new();
    let mut admin = app.admin("admin@devgon.in").await;

    let created = admin
        .post_multipart(
            "/admin/medicines",
            &[
                ("name", "Amla Juice"),
                ("description", "Vitamin C"),
                ("price", "150.50"),
            ],
            Some(("image", "amla juice.png", b"png-bytes")),
        )
        .await;
    assert_eq!(created.status, StatusCode::CREATED, "{}", created.body);
    assert_eq!(created.body["price"], 150.5);
    let image_url = created.body["imageUrl"].as_str().unwrap().to_owned();
    assert!(image_url.starts_with("memory://blobs/medicines/"));
    assert!(image_url.ends_with("_amla_juice.png"));
    assert_eq!(app.blobs.count().await, 1);

    let id = created.body["id"].as_str().unwrap().to_owned();
    let uri = format!("/admin/medicines/{id}");

    let updated = admin
        .post_multipart(
            &uri,
            &[
                ("name", "Amla Juice 1L"),
                ("description", "Vitamin C"),
                ("price", "199"),
            ],
            None,
        )
        .await;
    assert_eq!(updated.status, StatusCode::OK, "{}", updated.body);
    assert_eq!(updated.body["name"], "Amla Juice 1L");
    assert_eq!(updated.body["imageUrl"], image_url.as_str());

    let catalog = app.client().get("/medicines").await;
    assert_eq!(catalog.body["items"][0]["price"], 199.0);
    assert_eq!(catalog.body["items"][0]["imageUrl"], image_url.as_str());

    let deleted = admin.delete(&uri).await;
    assert_eq!(deleted.status, StatusCode::NO_CONTENT);
    assert_eq!(admin.delete(&uri).await.status, StatusCode::NOT_FOUND);
    assert!(
        app.client().get("/medicines").await.body["items"]
            .as_array()
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn test_medicine_form_validation() {
    let app = TestApp::new();
    let mut admin = app.admin("admin@devgon.in").await;

    let no_price = admin
        .post_multipart("/admin/medicines", &[("name", "Amla")], None)
        .await;
    assert_eq!(no_price.status, StatusCode::BAD_REQUEST);

    let bad_price = admin
        .post_multipart(
            "/admin/medicines",
            &[("name", "Amla"), ("price", "free")],
            None,
        )
        .await;
    assert_eq!(bad_price.status, StatusCode::BAD_REQUEST);

    let zero_price = admin
        .post_multipart("/admin/medicines", &[("name", "Amla"), ("price", "0")], None)
        .await;
    assert_eq!(zero_price.status, StatusCode::BAD_REQUEST);

    let no_name = admin
        .post_multipart("/admin/medicines", &[("name", " "), ("price", "10")], None)
        .await;
    assert_eq!(no_name.status, StatusCode::BAD_REQUEST);

    let missing = admin
        .post_multipart(
            "/admin/medicines/nope",
            &[("name", "Amla"), ("price", "10")],
            None,
        )
        .await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_users_list_and_suspension() {
    let app = TestApp::new();
    let tulsi = json!(app.seed_medicine("Tulsi Drops", 120).await);
    let mut customer = app.customer("asha@devgon.in").await;
    let mut admin = app.admin("admin@devgon.in").await;

    place_order(&mut customer, &tulsi).await;

    let users = admin.get("/admin/users").await;
    assert_eq!(users.status, StatusCode::OK);
    let items = users.body["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    let asha = items
        .iter()
        .find(|u| u["email"] == "asha@devgon.in")
        .unwrap();
    assert_eq!(asha["orders"].as_array().unwrap().len(), 1);
    let asha_id = asha["id"].as_str().unwrap().to_owned();

    let suspended = admin
        .post_json(
            &format!("/admin/users/{asha_id}/suspend"),
            &json!({ "suspended": true }),
        )
        .await;
    assert_eq!(suspended.status, StatusCode::OK);
    assert_eq!(suspended.body["suspended"], true);

    customer
        .post_json("/cart/add", &json!({ "medicine_id": tulsi }))
        .await;
    let blocked = customer
        .post_json("/checkout", &json!({ "address": "Pune" }))
        .await;
    assert_eq!(blocked.status, StatusCode::FORBIDDEN);
    assert_eq!(customer.get("/cart").await.body["itemCount"], 1);

    let reinstated = admin
        .post_json(
            &format!("/admin/users/{asha_id}/suspend"),
            &json!({ "suspended": false }),
        )
        .await;
    assert_eq!(reinstated.body["suspended"], false);
    let placed = customer
        .post_json("/checkout", &json!({ "address": "Pune" }))
        .await;
    assert_eq!(placed.status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_admin_cannot_suspend_self() {
    let app = TestApp::new();
    let mut admin = app.admin("admin@devgon.in").await;
    let id = admin.get("/auth/me").await.body["user"]["id"].clone();

    let response = admin
        .post_json(
            &format!("/admin/users/{}/suspend", id.as_str().unwrap()),
            &json!({ "suspended": true }),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let unknown = admin
        .post_json("/admin/users/ghost/suspend", &json!({ "suspended": true }))
        .await;
    assert_eq!(unknown.status, StatusCode::NOT_FOUND);
}
