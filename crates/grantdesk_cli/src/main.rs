//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `grantdesk_core` linkage.
//! - Keep output deterministic for quick local sanity checks.

fn main() {
    println!("grantdesk_core ping={}", grantdesk_core::ping());
    println!("grantdesk_core version={}", grantdesk_core::core_version());
    println!(
        "grantdesk_core schema_version={}",
        grantdesk_core::db::migrations::latest_version()
    );
}
