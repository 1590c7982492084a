//! Registration, login, logout and the account page.

use axum::http::StatusCode;
use serde_json::json;

use devgon_integration_tests::{PASSWORD, TestApp};

#[tokio::test]
async fn test_register_signs_in() {
    let app = TestApp::new();
    let mut client = app.client();

    let response = client.register("asha@devgon.in").await;
    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.body["user"]["email"], "asha@devgon.in");
    assert_eq!(response.body["user"]["role"], "user");
    assert!(client.has_session());

    let me = client.get("/auth/me").await;
    assert_eq!(me.body["user"]["name"], "Asha Verma");

    let account = client.get("/account").await;
    assert_eq!(account.status, StatusCode::OK);
    assert_eq!(account.body["phone"], "9876543210");
    assert_eq!(account.body["address"], "14 FC Road, Pune");
    assert_eq!(account.body["suspended"], false);
}

#[tokio::test]
async fn test_anonymous_me_is_null() {
    let app = TestApp::new();
    let me = app.client().get("/auth/me").await;

    assert_eq!(me.status, StatusCode::OK);
    assert!(me.body["user"].is_null());
}

#[tokio::test]
async fn test_register_rejects_bad_input() {
    let app = TestApp::new();
    let mut client = app.client();

    let mismatch = client
        .post_json(
            "/auth/register",
            &json!({
                "name": "Asha",
                "email": "asha@devgon.in",
                "password": PASSWORD,
                "password_confirm": "something-else",
                "phone": "9876543210",
                "address": "Pune",
            }),
        )
        .await;
    assert_eq!(mismatch.status, StatusCode::BAD_REQUEST);

    let short = client
        .post_json(
            "/auth/register",
            &json!({
                "name": "Asha",
                "email": "asha@devgon.in",
                "password": "short",
                "password_confirm": "short",
                "phone": "9876543210",
                "address": "Pune",
            }),
        )
        .await;
    assert_eq!(short.status, StatusCode::BAD_REQUEST);

    let bad_email = client.register("not-an-email").await;
    assert_eq!(bad_email.status, StatusCode::BAD_REQUEST);
    assert!(!client.has_session());
}

#[tokio::test]
async fn test_duplicate_registration_conflicts() {
    let app = TestApp::new();
    app.customer("asha@devgon.in").await;

    let again = app.client().register("asha@devgon.in").await;
    assert_eq!(again.status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_login_and_logout() {
    let app = TestApp::new();
    let mut client = app.customer("asha@devgon.in").await;

    let logout = client.post_json("/auth/logout", &json!({})).await;
    assert_eq!(logout.status, StatusCode::NO_CONTENT);
    assert!(client.get("/auth/me").await.body["user"].is_null());
    assert_eq!(client.get("/account").await.status, StatusCode::UNAUTHORIZED);

    let wrong = client.login("asha@devgon.in", "not-the-password").await;
    assert_eq!(wrong.status, StatusCode::UNAUTHORIZED);

    let unknown = client.login("ravi@devgon.in", PASSWORD).await;
    assert_eq!(unknown.status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong.body["error"], unknown.body["error"]);

    let ok = client.login("asha@devgon.in", PASSWORD).await;
    assert_eq!(ok.status, StatusCode::OK);
    assert_eq!(ok.body["user"]["email"], "asha@devgon.in");
    assert_eq!(client.get("/account").await.status, StatusCode::OK);
}

#[tokio::test]
async fn test_logout_drops_cart() {
    let app = TestApp::new();
    let tulsi = app.seed_medicine("Tulsi Drops", 120).await;
    let mut client = app.customer("asha@devgon.in").await;

    client
        .post_json("/cart/add", &json!({ "medicine_id": tulsi }))
        .await;
    client.post_json("/auth/logout", &json!({})).await;

    assert_eq!(client.get("/cart").await.body["itemCount"], 0);
}

#[tokio::test]
async fn test_suspended_user_cannot_login() {
    let app = TestApp::new();
    let mut customer = app.customer("asha@devgon.in").await;
    let mut admin = app.admin("admin@devgon.in").await;

    let id = customer.get("/auth/me").await.body["user"]["id"].clone();
    let suspended = admin
        .post_json(
            &format!("/admin/users/{}/suspend", id.as_str().unwrap()),
            &json!({ "suspended": true }),
        )
        .await;
    assert_eq!(suspended.status, StatusCode::OK);

    customer.post_json("/auth/logout", &json!({})).await;
    let login = customer.login("asha@devgon.in", PASSWORD).await;
    assert_eq!(login.status, StatusCode::FORBIDDEN);
    assert!(customer.get("/auth/me").await.body["user"].is_null());
}

#[tokio::test]
async fn test_suspension_applies_to_open_session() {
    let app = TestApp::new();
    let mut customer = app.customer("asha@devgon.in").await;
    let mut admin = app.admin("admin@devgon.in").await;
    assert_eq!(customer.get("/account").await.status, StatusCode::OK);

    let id = customer.get("/auth/me").await.body["user"]["id"].clone();
    let uri = format!("/admin/users/{}/suspend", id.as_str().unwrap());
    admin.post_json(&uri, &json!({ "suspended": true })).await;

    for path in ["/account", "/orders"] {
        let response = customer.get(path).await;
        assert_eq!(response.status, StatusCode::FORBIDDEN, "{path}");
        assert_eq!(response.body["error"], "This account has been suspended");
    }

    admin.post_json(&uri, &json!({ "suspended": false })).await;
    assert_eq!(customer.get("/account").await.status, StatusCode::OK);
}

#[tokio::test]
async fn test_account_update_refreshes_session_name() {
    let app = TestApp::new();
    let mut client = app.customer("asha@devgon.in").await;

    let updated = client
        .post_json(
            "/account",
            &json!({
                "name": "Asha V.",
                "phone": "9123456780",
                "address": "221 MG Road, Nagpur",
            }),
        )
        .await;
    assert_eq!(updated.status, StatusCode::OK, "{}", updated.body);
    assert_eq!(updated.body["name"], "Asha V.");
    assert_eq!(updated.body["email"], "asha@devgon.in");

    assert_eq!(client.get("/auth/me").await.body["user"]["name"], "Asha V.");
    assert_eq!(
        client.get("/account").await.body["address"],
        "221 MG Road, Nagpur"
    );

    let bad_phone = client
        .post_json(
            "/account",
            &json!({ "name": "Asha", "phone": "12", "address": "Pune" }),
        )
        .await;
    assert_eq!(bad_phone.status, StatusCode::BAD_REQUEST);
}
