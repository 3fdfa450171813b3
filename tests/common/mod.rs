//! Shared test utilities

use unmute_relay::{ContextRepo, DbPool, db};

/// Set up an in-memory test database
#[must_use]
pub fn setup_test_db() -> DbPool {
    db::init_memory().expect("failed to init test db")
}

/// Seed the store with the demo facts used across tests
pub fn seed_demo_facts(db: &DbPool) -> ContextRepo {
    let repo = ContextRepo::new(db.clone());
    repo.seed(&[
        ("spouse_name", "Sarah"),
        ("home_address", "42 Wallaby Way, Sydney"),
        ("dog_name", "Buster"),
        ("emergency_contact", "Dr. Smith at 555-0199"),
    ])
    .expect("failed to seed facts");
    repo
}
