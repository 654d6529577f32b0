//! # Observability & Tracing
//!
//! [`setup_tracing`] installs a compact `tracing-subscriber` formatter driven by
//! `RUST_LOG`. The crate logs with structured fields (`resource_type`, `id`,
//! `size`, `error`) rather than interpolated strings, so lines stay short and
//! filterable.
//!
//! ## What Gets Traced
//!
//! - **Store lifecycle**: `Store started` / `Shutdown` per resource type (info)
//! - **Commits**: `Created`, `Updated`, `Relationship replaced`, ... (info)
//! - **Requests and no-ops**: every store request, service entry with payload (debug)
//! - **Rejections**: constraint, concurrency and cancellation outcomes (warn)
//! - **Cache**: hits and invalidations (trace)
//!
//! ```bash
//! RUST_LOG=info cargo run
//! RUST_LOG=debug cargo run
//! RUST_LOG=jsonapi_write::store=trace cargo run
//! ```
//!
//! **With `RUST_LOG=info`**:
//!
//! ```text
//! INFO Store started resource_type="articles" versioned=true
//! INFO Created resource_type="tags" id=1 size=1
//! INFO create:Created resource_type="articles" id=1 size=1
//! WARN Rejected resource_type="articles" id=1 error=Concurrency conflict on articles 1: expected version 2, found 3
//! ```
//!
//! Service methods are `#[instrument]`ed, so store lines emitted while a
//! service call is in flight appear under its span (`create:`, `update:`).

/// Initializes the global subscriber. Call once, at startup.
pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false) // resource_type carries the context
        .compact()
        .init();
}
