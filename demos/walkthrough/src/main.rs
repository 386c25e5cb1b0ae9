//! Campus Events Engine - Walkthrough
//!
//! Drives the registration engine end-to-end:
//! - Event creation and capacity accounting
//! - The last-seat contest between two students
//! - Payment confirmation and cancellation with seat release
//! - Free events confirming on claim
//! - The background expiry sweeper
//!
//! # Usage
//!
//! ```bash
//! cargo run -p walkthrough
//! ```

use campus_events_engine::{
    CancellationActor, Capacity, CatalogStore, ClaimOptions, EngineConfig, EngineError,
    ExpirySweeper, Money, NewEvent, RegistrationLedger, RegistrationService, StudentId,
};
use chrono::{Duration, Utc};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,campus_events_engine=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    println!("\n🎟  ============================================");
    println!("   Campus Events Engine - Walkthrough");
    println!("============================================\n");

    let config = EngineConfig::from_env();
    let catalog = Arc::new(CatalogStore::new());
    let ledger = Arc::new(RegistrationLedger::new());
    let service = Arc::new(RegistrationService::new(catalog, ledger, config));
    let queries = service.queries();
    campus_events_engine::metrics::register_engine_metrics();

    let sweeper = ExpirySweeper::spawn(Arc::clone(&service));

    // Step 1: publish a paid event with a single seat.
    println!("1️⃣  Creating a paid event with 1 seat...");
    let symposium = service.create_event(NewEvent {
        title: "AI Research Symposium".to_string(),
        description: "Talks from visiting faculty".to_string(),
        location: "Main auditorium".to_string(),
        category: "Technical".to_string(),
        organizer: "CS department".to_string(),
        tags: vec!["research".to_string(), "ai".to_string()],
        starts_at: Utc::now() + Duration::days(7),
        duration_hours: 6,
        capacity: Capacity::new(1),
        price: Money::from_rupees(500),
    })?;
    let symposium_id = symposium.event.id;
    println!("   ✓ {} ({symposium_id})", symposium.event.title);
    println!("   ✓ Capacity: {}, price: {}\n", symposium.capacity, symposium.event.price);

    // Step 2: two students race for the last seat.
    println!("2️⃣  Two students race for the seat...");
    let asha = StudentId::new("1RV22CS001");
    let bharat = StudentId::new("1RV22CS002");

    let claim = service.claim(asha.clone(), symposium_id, ClaimOptions::default())?;
    println!("   ✓ {asha} claimed: state={}, due={}", claim.state, claim.amount_due);

    match service.claim(bharat.clone(), symposium_id, ClaimOptions::default()) {
        Err(EngineError::EventFull) => println!("   ✓ {bharat} rejected: event full"),
        other => anyhow::bail!("expected EventFull, got {other:?}"),
    }

    // Step 3: payment lands.
    println!("\n3️⃣  Recording the captured payment...");
    let confirmed = service.confirm_payment(claim.id, Money::from_rupees(500))?;
    println!(
        "   ✓ Confirmed: paid={}, txn={}",
        confirmed.amount_paid.map_or_else(|| "-".to_string(), |amount| amount.to_string()),
        confirmed.transaction_id.as_deref().unwrap_or("-")
    );

    // Step 4: a cancellation frees the seat for the other student.
    println!("\n4️⃣  Cancelling and re-claiming the seat...");
    service.cancel(claim.id, CancellationActor::Student)?;
    let snapshot = queries.get_event(symposium_id)?;
    println!("   ✓ Cancelled; available again: {}", snapshot.available_spots());

    let reclaim = service.claim(bharat, symposium_id, ClaimOptions::default())?;
    println!("   ✓ Second student now holds the seat: state={}", reclaim.state);

    // Step 5: free events skip the payment leg entirely.
    println!("\n5️⃣  Free events confirm on claim...");
    let orientation = service.create_event(NewEvent {
        title: "Library Orientation".to_string(),
        description: "Intro to the digital library".to_string(),
        location: "Central library".to_string(),
        category: "Orientation".to_string(),
        organizer: "Library staff".to_string(),
        tags: vec![],
        starts_at: Utc::now() + Duration::days(2),
        duration_hours: 1,
        capacity: Capacity::new(100),
        price: Money::ZERO,
    })?;
    let free_claim = service.claim(asha, orientation.event.id, ClaimOptions::default())?;
    println!(
        "   ✓ Claimed free event: state={}, paid={}",
        free_claim.state,
        free_claim.amount_paid.map_or_else(|| "-".to_string(), |amount| amount.to_string())
    );

    // Step 6: read-side summary.
    println!("\n6️⃣  Dashboard summary...");
    let summary = queries.dashboard_summary()?;
    println!(
        "   events={}, registrations={} (live={}), revenue={}, upcoming={}",
        summary.total_events,
        summary.total_registrations,
        summary.live_registrations,
        summary.confirmed_revenue,
        summary.upcoming_events
    );
    for event in queries.list_events_with_availability()? {
        println!(
            "   - {:<24} {:>3}/{:<3} seats free  [{}]",
            event.event.title, event.available_spots, event.capacity, event.status
        );
    }

    sweeper.shutdown().await;
    println!("\n✅ Walkthrough complete\n");
    Ok(())
}
