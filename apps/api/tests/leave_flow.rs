//! Leave request workflow over HTTP: submission rules, manager decisions,
//! balance accrual and the admin balance tools.
//!
//! The clock is frozen on Monday 2025-03-03. The team policy grants 24
//! days over 240 working days, so every working day earns 0.1 day; 44
//! working days have elapsed since January 1st.

mod common;

use axum::http::{Method, StatusCode};
use serde_json::{json, Value};

use common::{date, id_of, token_for, TestApp};
use sgirp_api::domain::user::{Role, User};

struct Fixture {
    app: TestApp,
    admin: User,
    manager: User,
    other_manager: User,
    ana: User,
    bo: User,
}

async fn fixture() -> Fixture {
    let app = TestApp::on(date(2025, 3, 3));
    let admin = app.seed_user("admin@corp.test", Role::Admin).await;
    let manager = app.seed_user("mia@corp.test", Role::Manager).await;
    let other_manager = app.seed_user("leo@corp.test", Role::Manager).await;
    let ana = app.seed_user("ana@corp.test", Role::Employee).await;
    let bo = app.seed_user("bo@corp.test", Role::Employee).await;
    let team = app.seed_team("Core", &manager, &[&ana, &bo]).await;
    app.seed_team("Sales", &other_manager, &[]).await;

    let uri = format!("/api/manager/teams/{}/leave-policy", team.id());
    let (status, _) = app
        .put(&uri, &token_for(&manager), json!({"annual_days": 24, "annual_working_days": 240}))
        .await;
    assert_eq!(status, StatusCode::OK);

    Fixture {
        app,
        admin,
        manager,
        other_manager,
        ana,
        bo,
    }
}

fn number(value: &Value) -> f64 {
    value.as_f64().unwrap()
}

fn assert_close(actual: &Value, expected: f64) {
    let actual = number(actual);
    assert!((actual - expected).abs() < 1e-9, "expected {}, got {}", expected, actual);
}

async fn request_leave(f: &Fixture, user: &User, body: Value) -> (StatusCode, Value) {
    f.app.post("/api/leaves", &token_for(user), body).await
}

fn paid(start: &str, end: &str) -> Value {
    json!({"leave_type": "paid", "start_date": start, "end_date": end})
}

#[tokio::test]
async fn test_balance_accrues_with_worked_days() {
    let f = fixture().await;

    let (status, balance) = f.app.get("/api/leaves/balance", &token_for(&f.ana)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(balance["year"], 2025);
    assert_close(&balance["annual_entitlement"], 24.0);
    assert_close(&balance["balance"], 4.4);
    assert_close(&balance["remaining"], 4.4);
    assert_close(&balance["paid_taken"], 0.0);

    // Past years accrue in full, capped at the allowance
    let (_, next_year) = f
        .app
        .get("/api/leaves/balance?year=2026", &token_for(&f.ana))
        .await;
    assert_close(&next_year["balance"], 24.0);
}

#[tokio::test]
async fn test_submission_rules() {
    let f = fixture().await;

    let (status, _) = request_leave(&f, &f.ana, paid("2025-02-24", "2025-02-25")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "start in the past");

    let (status, _) = request_leave(&f, &f.ana, paid("2025-03-12", "2025-03-10")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "end before start");

    let (status, body) = request_leave(&f, &f.ana, paid("2025-03-08", "2025-03-09")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "The requested period contains no working day");

    let (status, _) = request_leave(
        &f,
        &f.ana,
        json!({"leave_type": "rtt", "start_date": "2025-03-10", "end_date": "2025-03-11", "half_day": true}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "half day over two dates");

    let (status, created) = request_leave(&f, &f.ana, paid("2025-03-10", "2025-03-12")).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["status"], "pending");

    let (status, body) = request_leave(&f, &f.ana, paid("2025-03-12", "2025-03-12")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("overlaps"));

    // 1.4 days left once the pending request is counted
    let (status, body) = request_leave(&f, &f.ana, paid("2025-03-17", "2025-03-18")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("Insufficient leave balance"));

    // Unpaid types do not touch the balance
    let (status, _) = request_leave(
        &f,
        &f.ana,
        json!({"leave_type": "sick", "start_date": "2025-03-17", "end_date": "2025-03-18"}),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, balance) = f.app.get("/api/leaves/balance", &token_for(&f.ana)).await;
    assert_close(&balance["pending_paid"], 3.0);
    assert_close(&balance["remaining"], 1.4);
}

#[tokio::test]
async fn test_requests_are_private_and_editable_while_pending() {
    let f = fixture().await;
    let (_, created) = request_leave(&f, &f.ana, paid("2025-03-10", "2025-03-10")).await;
    let uri = format!("/api/leaves/{}", id_of(&created));

    let (status, _) = f.app.get(&uri, &token_for(&f.bo)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, updated) = f
        .app
        .put(&uri, &token_for(&f.ana), paid("2025-03-11", "2025-03-11"))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["start_date"], "2025-03-11");

    // Editing does not count the request against itself
    let (status, _) = f
        .app
        .put(&uri, &token_for(&f.ana), paid("2025-03-11", "2025-03-14"))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, list) = f.app.get("/api/leaves", &token_for(&f.ana)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 1);

    let (status, _) = f
        .app
        .send(Method::DELETE, &uri, Some(&token_for(&f.ana)), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = f.app.get(&uri, &token_for(&f.ana)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_manager_approval_debits_balance() {
    let f = fixture().await;
    let (_, created) = request_leave(&f, &f.ana, paid("2025-03-10", "2025-03-12")).await;
    let request_id = id_of(&created);

    let (status, pending) = f
        .app
        .get("/api/manager/leaves/pending", &token_for(&f.manager))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(pending.as_array().unwrap().len(), 1);
    assert_eq!(pending[0]["employee"], "ana Test");

    let (_, other_pending) = f
        .app
        .get("/api/manager/leaves/pending", &token_for(&f.other_manager))
        .await;
    assert!(other_pending.as_array().unwrap().is_empty());

    let decision = format!("/api/manager/leaves/{}/decision", request_id);
    let (status, _) = f
        .app
        .post(&decision, &token_for(&f.bo), json!({"status": "approved"}))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = f
        .app
        .post(&decision, &token_for(&f.other_manager), json!({"status": "approved"}))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "You do not manage this employee");

    let (status, decided) = f
        .app
        .post(&decision, &token_for(&f.manager), json!({"status": "approved", "comment": "Enjoy"}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(decided["status"], "approved");
    assert_eq!(decided["decided_by"], f.manager.id.to_string());

    // A decided request cannot move again
    let (status, _) = f
        .app
        .post(&decision, &token_for(&f.manager), json!({"status": "rejected"}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, balance) = f.app.get("/api/leaves/balance", &token_for(&f.ana)).await;
    assert_close(&balance["paid_taken"], 3.0);
    assert_close(&balance["taken_this_month"], 3.0);
    assert_close(&balance["balance"], 1.4);
    assert_close(&balance["pending_paid"], 0.0);

    let history_uri = format!("/api/admin/balance-history?user_id={}", f.ana.id);
    let (status, history) = f.app.get(&history_uri, &token_for(&f.admin)).await;
    assert_eq!(status, StatusCode::OK);
    let entries = history.as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_close(&entries[0]["difference"], -3.0);
    assert_close(&entries[0]["balance"], 1.4);
    assert_eq!(entries[0]["leave_request_id"], request_id.to_string());

    let uri = format!("/api/leaves/{}", request_id);
    let (status, _) = f
        .app
        .send(Method::DELETE, &uri, Some(&token_for(&f.ana)), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_approved_half_day_debits_half_a_day() {
    let f = fixture().await;
    let (status, created) = request_leave(
        &f,
        &f.ana,
        json!({"leave_type": "paid", "start_date": "2025-03-11", "end_date": "2025-03-11", "half_day": true}),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["half_day"], true);

    let (_, balance) = f.app.get("/api/leaves/balance", &token_for(&f.ana)).await;
    assert_close(&balance["pending_paid"], 0.5);
    assert_close(&balance["remaining"], 3.9);

    let decision = format!("/api/manager/leaves/{}/decision", id_of(&created));
    let (status, _) = f
        .app
        .post(&decision, &token_for(&f.manager), json!({"status": "approved"}))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, balance) = f.app.get("/api/leaves/balance", &token_for(&f.ana)).await;
    assert_close(&balance["paid_taken"], 0.5);
    assert_close(&balance["balance"], 3.9);
    assert_close(&balance["pending_paid"], 0.0);

    let history_uri = format!("/api/admin/balance-history?user_id={}", f.ana.id);
    let (_, history) = f.app.get(&history_uri, &token_for(&f.admin)).await;
    let entries = history.as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_close(&entries[0]["difference"], -0.5);
    assert_close(&entries[0]["balance"], 3.9);
}

#[tokio::test]
async fn test_rejection_leaves_balance_untouched() {
    let f = fixture().await;
    let (_, created) = request_leave(&f, &f.ana, paid("2025-03-10", "2025-03-11")).await;

    let decision = format!("/api/manager/leaves/{}/decision", id_of(&created));
    let (status, decided) = f
        .app
        .post(&decision, &token_for(&f.manager), json!({"status": "rejected", "comment": "Busy week"}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(decided["comment"], "Busy week");

    let (_, balance) = f.app.get("/api/leaves/balance", &token_for(&f.ana)).await;
    assert_close(&balance["balance"], 4.4);
    assert_close(&balance["pending_paid"], 0.0);

    // Rejected requests no longer block their dates
    let (status, _) = request_leave(&f, &f.ana, paid("2025-03-10", "2025-03-10")).await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_request_spanning_new_year_is_charged_per_year() {
    let f = fixture().await;
    // Tue 30 and Wed 31 December, Thu 1 and Fri 2 January
    let (status, created) = request_leave(&f, &f.bo, paid("2025-12-30", "2026-01-02")).await;
    assert_eq!(status, StatusCode::CREATED);

    let decision = format!("/api/manager/leaves/{}/decision", id_of(&created));
    let (status, _) = f
        .app
        .post(&decision, &token_for(&f.manager), json!({"status": "approved"}))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, this_year) = f.app.get("/api/leaves/balance", &token_for(&f.bo)).await;
    assert_close(&this_year["paid_taken"], 2.0);
    let (_, next_year) = f
        .app
        .get("/api/leaves/balance?year=2026", &token_for(&f.bo))
        .await;
    assert_close(&next_year["paid_taken"], 2.0);
    assert_close(&next_year["balance"], 22.0);

    let history_uri = format!("/api/admin/balance-history?user_id={}", f.bo.id);
    let (_, history) = f.app.get(&history_uri, &token_for(&f.admin)).await;
    assert_eq!(history.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_admin_balance_adjustment() {
    let f = fixture().await;
    let admin_token = token_for(&f.admin);

    let (status, _) = f
        .app
        .post(
            "/api/admin/balance-adjustments",
            &token_for(&f.manager),
            json!({"user_id": f.ana.id, "difference": 2}),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = f
        .app
        .post(
            "/api/admin/balance-adjustments",
            &admin_token,
            json!({"user_id": f.ana.id, "difference": 0}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, entry) = f
        .app
        .post(
            "/api/admin/balance-adjustments",
            &admin_token,
            json!({"user_id": f.ana.id, "difference": 2}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_close(&entry["balance"], 6.4);
    assert_eq!(entry["note"], "Manual adjustment");
    assert!(entry["leave_request_id"].is_null());

    let (_, balance) = f.app.get("/api/leaves/balance", &token_for(&f.ana)).await;
    assert_close(&balance["adjustments"], 2.0);
    assert_close(&balance["balance"], 6.4);

    // The extra days now cover a longer request
    let (status, _) = request_leave(&f, &f.ana, paid("2025-03-10", "2025-03-14")).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, history) = f.app.get("/api/admin/balance-history", &admin_token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(history.as_array().unwrap().len(), 1);

    let (status, _) = f
        .app
        .get("/api/admin/balance-history", &token_for(&f.ana))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_leave_and_admin_dashboards() {
    let f = fixture().await;
    request_leave(&f, &f.ana, paid("2025-03-10", "2025-03-10")).await;
    request_leave(
        &f,
        &f.bo,
        json!({"leave_type": "unpaid", "start_date": "2025-03-20", "end_date": "2025-03-21"}),
    )
    .await;

    let (status, dashboard) = f.app.get("/api/leaves/dashboard", &token_for(&f.ana)).await;
    assert_eq!(status, StatusCode::OK);
    assert_close(&dashboard["balance"]["pending_paid"], 1.0);
    assert_eq!(dashboard["requests"].as_array().unwrap().len(), 1);

    let (status, _) = f.app.get("/api/admin/dashboard", &token_for(&f.manager)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, admin) = f.app.get("/api/admin/dashboard", &token_for(&f.admin)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(admin["total_users"], 5);
    assert_eq!(admin["users_by_role"]["manager"], 2);
    assert_eq!(admin["teams"], 2);
    assert_eq!(admin["pending_leave_requests"], 2);
    assert_eq!(admin["submitted_weeks"], 0);
}
