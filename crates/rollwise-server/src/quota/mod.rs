//! Daily usage quota for AI-generation calls.
//!
//! The ledger is the single authority for "may this user generate
//! alternatives now"; premium users bypass the gate entirely.

mod ledger;

pub use ledger::{QuotaDecision, QuotaError, QuotaLedger, QuotaStatus};
