// handlers/mod.rs - Three handler tiers
//
// Public (no session) → Protected (JWT session) → Cron (shared secret).
// Routes are wired in `app::build_router`.

pub mod cron;
pub mod protected;
pub mod public;
