//! End-to-end tests for the order discount page.
//!
//! Each test runs the admin router against a fresh fake upstream.

use axum::http::StatusCode;
use shpfy_integration_tests::{
    DISCOUNT_TOKEN, FakeUpstream, STORE, UPLOADED_FILE_ID, UpstreamBehavior, banner_post,
    form_post, get, open_page, send, signed_launch_query, signed_launch_query_at, test_app,
};
use shpfy_admin::middleware::LAUNCH_MAX_AGE_SECS;

const ADMIN_DISCOUNTS_URL: &str = "https://admin.shopify.com/store/acme/discounts";

#[tokio::test]
async fn test_health() {
    let upstream = FakeUpstream::start().await;
    let app = test_app(&upstream, true);

    let response = send(&app, get("/health")).await;
    assert_eq!(response.status, StatusCode::OK);
}

// ============================================================================
// Launch
// ============================================================================

#[tokio::test]
async fn test_signed_launch_renders_page() {
    let upstream = FakeUpstream::start().await;
    let app = test_app(&upstream, true);

    let response = send(
        &app,
        get(&format!("/discounts/order/new?{}", signed_launch_query(STORE))),
    )
    .await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("Amount off order"));
    assert!(response.body.contains("Save discount"));
    assert!(response.body.contains("$10.00 off entire order"));
}

#[tokio::test]
async fn test_unsigned_launch_rejected_when_required() {
    let upstream = FakeUpstream::start().await;
    let app = test_app(&upstream, true);

    let response = send(&app, get("/discounts/order/new?shop=acme.myshopify.com")).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_tampered_launch_rejected() {
    let upstream = FakeUpstream::start().await;
    let app = test_app(&upstream, true);

    let query = signed_launch_query(STORE).replace("embedded=1", "embedded=0");
    let response = send(&app, get(&format!("/discounts/order/new?{query}"))).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_launch_for_other_store_rejected() {
    let upstream = FakeUpstream::start().await;
    let app = test_app(&upstream, true);

    let query = signed_launch_query("rival.myshopify.com");
    let response = send(&app, get(&format!("/discounts/order/new?{query}"))).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_replayed_old_launch_rejected() {
    let upstream = FakeUpstream::start().await;
    let app = test_app(&upstream, true);

    let issued_at = chrono::Utc::now().timestamp() - LAUNCH_MAX_AGE_SECS - 60;
    let query = signed_launch_query_at(STORE, issued_at);
    let response = send(&app, get(&format!("/discounts/order/new?{query}"))).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_unsigned_launch_allowed_when_not_required() {
    let upstream = FakeUpstream::start().await;
    let app = test_app(&upstream, false);

    let response = send(&app, get("/discounts/order/new")).await;
    assert_eq!(response.status, StatusCode::OK);
}

// ============================================================================
// Card events
// ============================================================================

#[tokio::test]
async fn test_card_events_update_summary() {
    let upstream = FakeUpstream::start().await;
    let app = test_app(&upstream, true);
    let draft = open_page(&app).await;

    let response = send(
        &app,
        form_post(
            &format!("/discounts/order/{draft}/title"),
            &[("title", "Fall sale"), ("description", "Whole store")],
            true,
        ),
    )
    .await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("Fall sale"));

    let response = send(
        &app,
        form_post(
            &format!("/discounts/order/{draft}/value"),
            &[("discount_type", "percentage"), ("value", "15")],
            true,
        ),
    )
    .await;
    assert!(response.body.contains("15% off entire order"));

    let response = send(
        &app,
        form_post(
            &format!("/discounts/order/{draft}/minimum"),
            &[("requirement", "quantity"), ("min_value", ""), ("min_qty", "3")],
            true,
        ),
    )
    .await;
    assert!(response.body.contains("Minimum purchase of 3 items"));

    let response = send(
        &app,
        form_post(&format!("/discounts/order/{draft}/usage-limit"), &[], true),
    )
    .await;
    assert!(response.body.contains("Unlimited uses per customer"));

    let response = send(
        &app,
        form_post(
            &format!("/discounts/order/{draft}/combinations"),
            &[("shipping_discounts", "on")],
            true,
        ),
    )
    .await;
    assert!(response.body.contains("Combines with shipping discounts"));

    let response = send(
        &app,
        form_post(
            &format!("/discounts/order/{draft}/active-dates"),
            &[("starts_at", "2026-11-01T00:00"), ("ends_at", "2026-11-30")],
            true,
        ),
    )
    .await;
    assert!(response.body.contains("Active from Nov 1, 2026 until Nov 30, 2026"));
}

#[tokio::test]
async fn test_bad_input_is_rejected() {
    let upstream = FakeUpstream::start().await;
    let app = test_app(&upstream, true);
    let draft = open_page(&app).await;

    let response = send(
        &app,
        form_post(
            &format!("/discounts/order/{draft}/value"),
            &[("value", "ten dollars")],
            true,
        ),
    )
    .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let response = send(
        &app,
        form_post(
            &format!("/discounts/order/{draft}/active-dates"),
            &[("starts_at", "tomorrow")],
            true,
        ),
    )
    .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let response = send(
        &app,
        banner_post(
            &format!("/discounts/order/{draft}/banner"),
            Some(("terms.pdf", "application/pdf", b"%PDF-1.7")),
            None,
        ),
    )
    .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_draft_is_not_found() {
    let upstream = FakeUpstream::start().await;
    let app = test_app(&upstream, true);

    let response = send(
        &app,
        form_post(
            "/discounts/order/6f1c1a2e-8a6b-4d53-9d55-2f4f2d1e9c10/title",
            &[("title", "Ghost")],
            true,
        ),
    )
    .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);

    let response = send(
        &app,
        form_post("/discounts/order/not-a-uuid/title", &[("title", "x")], true),
    )
    .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

// ============================================================================
// Submit
// ============================================================================

#[tokio::test]
async fn test_submit_with_defaults_posts_once_and_redirects() {
    let upstream = FakeUpstream::start().await;
    let app = test_app(&upstream, true);
    let draft = open_page(&app).await;

    send(
        &app,
        form_post(
            &format!("/discounts/order/{draft}/title"),
            &[("title", "Fall sale")],
            true,
        ),
    )
    .await;

    let response = send(
        &app,
        form_post(&format!("/discounts/order/{draft}/submit"), &[], true),
    )
    .await;
    assert_eq!(response.status, StatusCode::OK);
    let trigger: serde_json::Value =
        serde_json::from_str(response.header("HX-Trigger").unwrap()).unwrap();
    assert_eq!(trigger["adminRedirect"]["url"], ADMIN_DISCOUNTS_URL);

    let recorded = upstream.recorded();
    assert_eq!(recorded.discounts.len(), 1);
    assert!(recorded.graphql_operations.is_empty());

    let post = &recorded.discounts[0];
    assert_eq!(
        post.authorization.as_deref(),
        Some(format!("Bearer {DISCOUNT_TOKEN}").as_str())
    );
    assert_eq!(post.content_type.as_deref(), Some("application/json"));

    let body = &post.body;
    assert_eq!(body["title"], "Fall sale");
    assert!(body.get("endsAt").is_none());
    assert_eq!(body["metafields"]["type"], "order");
    assert_eq!(body["metafields"]["discountType"], "amount");
    assert_eq!(body["metafields"]["discountValue"], 10.0);
    assert_eq!(body["metafields"]["minValue"], 0.1);
    assert_eq!(body["metafields"]["minQty"], 0.1);
    assert_eq!(body["metafields"]["onePerUser"], true);
    assert_eq!(body["metafields"]["products"], serde_json::json!([]));
    assert_eq!(body["metafields"]["collections"], serde_json::json!([]));
    assert!(body["metafields"].get("bannerImage").is_none());
    assert_eq!(
        body["combinesWith"],
        serde_json::json!({
            "orderDiscounts": false,
            "productDiscounts": false,
            "shippingDiscounts": false
        })
    );

    // The draft is gone after a successful submit.
    let response = send(&app, get(&format!("/api/discounts/order/drafts/{draft}"))).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_plain_form_submit_gets_see_other() {
    let upstream = FakeUpstream::start().await;
    let app = test_app(&upstream, true);
    let draft = open_page(&app).await;

    send(
        &app,
        form_post(
            &format!("/discounts/order/{draft}/minimum"),
            &[("requirement", "subtotal"), ("min_value", "50")],
            true,
        ),
    )
    .await;

    let response = send(
        &app,
        form_post(&format!("/discounts/order/{draft}/submit"), &[], false),
    )
    .await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.header("location"), Some(ADMIN_DISCOUNTS_URL));

    let body = &upstream.recorded().discounts[0].body;
    assert_eq!(body["metafields"]["minValue"], 50.0);
    assert_eq!(body["metafields"]["minQty"], 0.0);
}

#[tokio::test]
async fn test_backend_failure_keeps_draft_and_does_not_redirect() {
    let upstream = FakeUpstream::start_with(UpstreamBehavior {
        discount_status: 500,
        ..UpstreamBehavior::default()
    })
    .await;
    let app = test_app(&upstream, true);
    let draft = open_page(&app).await;

    let response = send(
        &app,
        form_post(&format!("/discounts/order/{draft}/submit"), &[], true),
    )
    .await;
    assert_eq!(response.status, StatusCode::BAD_GATEWAY);
    assert!(response.header("HX-Trigger").is_none());
    assert!(response.body.contains("Discount not saved"));
    assert!(response.body.contains("500"));
    assert_eq!(upstream.recorded().discounts.len(), 1);

    let response = send(&app, get(&format!("/api/discounts/order/drafts/{draft}"))).await;
    assert_eq!(response.status, StatusCode::OK);

    // Save can be retried on the same draft.
    let response = send(
        &app,
        form_post(&format!("/discounts/order/{draft}/submit"), &[], true),
    )
    .await;
    assert_eq!(response.status, StatusCode::BAD_GATEWAY);
    assert_eq!(upstream.recorded().discounts.len(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_double_save_creates_one_discount() {
    let upstream = FakeUpstream::start().await;
    let app = test_app(&upstream, true);
    let draft = open_page(&app).await;
    let uri = format!("/discounts/order/{draft}/submit");

    let (first, second) = tokio::join!(
        send(&app, form_post(&uri, &[], true)),
        send(&app, form_post(&uri, &[], true)),
    );

    let mut statuses = [first.status, second.status];
    statuses.sort();
    assert_eq!(statuses, [StatusCode::OK, StatusCode::NOT_FOUND]);
    assert_eq!(upstream.recorded().discounts.len(), 1);
}

// ============================================================================
// Banner
// ============================================================================

#[tokio::test]
async fn test_banner_is_uploaded_before_discount_post() {
    let upstream = FakeUpstream::start().await;
    let app = test_app(&upstream, true);
    let draft = open_page(&app).await;

    let response = send(
        &app,
        banner_post(
            &format!("/discounts/order/{draft}/banner"),
            Some(("fall.png", "image/png", b"\x89PNG fake image bytes")),
            Some("20% off everything"),
        ),
    )
    .await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("Banner: fall.png"));

    let response = send(
        &app,
        form_post(&format!("/discounts/order/{draft}/submit"), &[], true),
    )
    .await;
    assert_eq!(response.status, StatusCode::OK);

    let recorded = upstream.recorded();
    assert_eq!(
        recorded.graphql_operations,
        vec!["StagedUploadsCreate".to_string(), "FileCreate".to_string()]
    );
    assert!(
        recorded
            .graphql_tokens
            .iter()
            .all(|t| t == shpfy_integration_tests::ADMIN_TOKEN)
    );
    assert_eq!(
        recorded.upload_fields,
        vec![vec![
            "key".to_string(),
            "policy".to_string(),
            "file".to_string()
        ]]
    );
    assert_eq!(recorded.uploaded_bytes, vec![21]);

    let metafields = &recorded.discounts[0].body["metafields"];
    assert_eq!(metafields["bannerImage"]["fileId"], UPLOADED_FILE_ID);
    assert_eq!(metafields["bannerImage"]["alt"], "20% off everything");
    assert_eq!(metafields["bannerDescription"], "20% off everything");
}

#[tokio::test]
async fn test_failed_banner_upload_still_creates_discount() {
    let upstream = FakeUpstream::start_with(UpstreamBehavior {
        upload_status: 403,
        ..UpstreamBehavior::default()
    })
    .await;
    let app = test_app(&upstream, true);
    let draft = open_page(&app).await;

    send(
        &app,
        banner_post(
            &format!("/discounts/order/{draft}/banner"),
            Some(("fall.png", "image/png", b"png")),
            None,
        ),
    )
    .await;

    let response = send(
        &app,
        form_post(&format!("/discounts/order/{draft}/submit"), &[], true),
    )
    .await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.header("HX-Trigger").is_some());

    let recorded = upstream.recorded();
    assert_eq!(recorded.graphql_operations, vec!["StagedUploadsCreate".to_string()]);
    assert_eq!(recorded.discounts.len(), 1);
    assert!(
        recorded.discounts[0].body["metafields"]
            .get("bannerImage")
            .is_none()
    );
}

#[tokio::test]
async fn test_empty_file_field_keeps_description_only() {
    let upstream = FakeUpstream::start().await;
    let app = test_app(&upstream, true);
    let draft = open_page(&app).await;

    let response = send(
        &app,
        banner_post(
            &format!("/discounts/order/{draft}/banner"),
            Some(("", "application/octet-stream", b"")),
            Some("Free gift over $50"),
        ),
    )
    .await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(!response.body.contains("Banner:"));

    send(
        &app,
        form_post(&format!("/discounts/order/{draft}/submit"), &[], true),
    )
    .await;

    let recorded = upstream.recorded();
    assert!(recorded.graphql_operations.is_empty());
    assert_eq!(
        recorded.discounts[0].body["metafields"]["bannerDescription"],
        "Free gift over $50"
    );
}
