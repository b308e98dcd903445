//! `veridian seed`: Write the test user and a sample audit to the file store.

use std::path::PathBuf;

use chrono::Utc;
use veridian_config::AppConfig;
use veridian_core::record::Record;
use veridian_core::store::AuditRecord;
use veridian_store::FileStore;

pub const TEST_USER: &str = "test-user";

fn test_profile() -> Record {
    Record::new()
        .with("email", "test@veridian.com")
        .with("location", "CA, 90210")
        .with("home_size_sqft", 2000i64)
        .with("family_size", 4i64)
        .with("annual_income", 80000i64)
        .with("monthly_energy_bill", 150i64)
}

fn sample_audit() -> AuditRecord {
    AuditRecord {
        user_id: TEST_USER.into(),
        timestamp: Utc::now(),
        answers: Record::new()
            .with("fridge_age", "medium")
            .with("has_dryer", true)
            .with("has_dishwasher", true)
            .with("insulation", "average")
            .with("hvac_age", "old")
            .with("water_heater", "gas_storage")
            .with("window_type", "double")
            .with("has_solar", false),
    }
}

pub fn seed(store: &FileStore) -> Result<PathBuf, veridian_core::StoreError> {
    store.put_profile(TEST_USER, &test_profile())?;
    store.add_audit(&sample_audit())
}

pub async fn run(dir: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let root = match dir {
        Some(dir) => dir,
        None => {
            let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
            config.store.resolved_path()
        }
    };

    println!("🌱 Seeding {}", root.display());
    let store = FileStore::new(root);
    let audit_path = tokio::task::spawn_blocking(move || seed(&store)).await??;
    println!("   - Seeded {TEST_USER}");
    println!("   - Seeded audit {}", audit_path.display());
    println!();
    println!("✅ Test data seeded successfully!");

    Ok(())
}
