//! Storage-enforced invariant tests
//!
//! These run against a real Postgres because the invariants under test
//! live in SQL: the row-locked apply-success commit, the terminal
//! donation status trigger and the guarded level update.

mod helpers;

use helpers::database_helper::TestDatabase;
use rust_decimal::Decimal;
use serial_test::serial;

use AscentBot::config::settings::Settings;
use AscentBot::database::DatabaseService;
use AscentBot::models::{ApplyOutcome, DonationStatus};
use AscentBot::services::{DonationService, PaymentService};

fn donation_service(db: &DatabaseService) -> DonationService {
    let payment_config = Settings::default().payment;
    let payments = PaymentService::new(payment_config.clone()).expect("payment client");
    DonationService::new(db.clone(), payments, payment_config)
}

#[tokio::test]
#[serial]
async fn donation_success_applies_exactly_once() {
    let test_db = TestDatabase::new().await.expect("test database");
    test_db.cleanup().await.expect("cleanup");
    let db = DatabaseService::new(test_db.pool.clone());

    test_db.create_test_user(1001).await.expect("seed user");
    let donation = db
        .donations
        .create(1001, 3, Decimal::from(500), "RUB", "pay-apply-once")
        .await
        .expect("create donation");

    let donations = donation_service(&db);
    let first = donations.apply_success(donation.id).await.expect("first apply");
    let second = donations.apply_success(donation.id).await.expect("second apply");

    assert_eq!(first, ApplyOutcome::Applied);
    assert_eq!(second, ApplyOutcome::AlreadyApplied);

    let row = db
        .donations
        .find_by_payment_id("pay-apply-once")
        .await
        .expect("reload donation")
        .expect("donation exists");
    assert_eq!(row.status, DonationStatus::Succeeded);
    assert!(row.processed);
    assert!(row.donation_date.is_some());

    let completed = test_db
        .completed_task_count(1001, 3)
        .await
        .expect("count tasks");
    assert_eq!(completed, 1);
}

#[tokio::test]
#[serial]
async fn charity_success_creates_no_task() {
    let test_db = TestDatabase::new().await.expect("test database");
    test_db.cleanup().await.expect("cleanup");
    let db = DatabaseService::new(test_db.pool.clone());

    test_db.create_test_user(1002).await.expect("seed user");
    let donation = db
        .donations
        .create(1002, 0, Decimal::from(100), "RUB", "pay-charity")
        .await
        .expect("create donation");

    let donations = donation_service(&db);
    let outcome = donations.apply_success(donation.id).await.expect("apply");
    assert_eq!(outcome, ApplyOutcome::Applied);

    let completed = test_db
        .completed_task_count(1002, 0)
        .await
        .expect("count tasks");
    assert_eq!(completed, 0);
}

#[tokio::test]
#[serial]
async fn succeeded_donation_status_is_terminal() {
    let test_db = TestDatabase::new().await.expect("test database");
    test_db.cleanup().await.expect("cleanup");
    let db = DatabaseService::new(test_db.pool.clone());

    test_db.create_test_user(1003).await.expect("seed user");
    let donation = db
        .donations
        .create(1003, 5, Decimal::from(500), "RUB", "pay-terminal")
        .await
        .expect("create donation");

    let donations = donation_service(&db);
    donations.apply_success(donation.id).await.expect("apply");

    // The trigger rejects the downgrade outright
    let result = db.donations.mark_canceled(donation.id).await;
    assert!(result.is_err());

    let row = db
        .donations
        .find_by_payment_id("pay-terminal")
        .await
        .expect("reload donation")
        .expect("donation exists");
    assert_eq!(row.status, DonationStatus::Succeeded);
    assert!(row.processed);
}

#[tokio::test]
#[serial]
async fn donation_date_is_stamped_once() {
    let test_db = TestDatabase::new().await.expect("test database");
    test_db.cleanup().await.expect("cleanup");
    let db = DatabaseService::new(test_db.pool.clone());

    test_db.create_test_user(1004).await.expect("seed user");
    let donation = db
        .donations
        .create(1004, 7, Decimal::from(500), "RUB", "pay-date-once")
        .await
        .expect("create donation");

    let mut tx = db.begin().await.expect("begin");
    db.donations
        .mark_succeeded_tx(&mut tx, donation.id)
        .await
        .expect("first mark");
    tx.commit().await.expect("commit");

    let first_date = db
        .donations
        .find_by_payment_id("pay-date-once")
        .await
        .expect("reload donation")
        .expect("donation exists")
        .donation_date
        .expect("date stamped");

    let mut tx = db.begin().await.expect("begin");
    db.donations
        .mark_succeeded_tx(&mut tx, donation.id)
        .await
        .expect("second mark");
    tx.commit().await.expect("commit");

    let second_date = db
        .donations
        .find_by_payment_id("pay-date-once")
        .await
        .expect("reload donation")
        .expect("donation exists")
        .donation_date
        .expect("date stamped");

    assert_eq!(second_date, first_date);
}

#[tokio::test]
#[serial]
async fn level_updates_reject_regressions_and_cap_overruns() {
    let test_db = TestDatabase::new().await.expect("test database");
    test_db.cleanup().await.expect("cleanup");
    let db = DatabaseService::new(test_db.pool.clone());

    test_db.create_test_user(1005).await.expect("seed user");

    assert!(db.users.update_level(1005, 2, 21).await.expect("bump to 2"));
    assert!(!db.users.update_level(1005, 2, 21).await.expect("rewrite"));
    assert!(!db.users.update_level(1005, 1, 21).await.expect("regression"));
    assert!(!db.users.update_level(1005, 22, 21).await.expect("past cap"));

    let user = db.users.get_required(1005).await.expect("reload user");
    assert_eq!(user.current_level, 2);
}
