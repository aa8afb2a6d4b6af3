// ============================================================================
// Care-box order configurator
// ============================================================================
//
// - catalog: validated product list loaded at startup
// - domain: wizard state, budget engine and step gates
// - submission: order creation and per-kind artifact downloads
// - backend: the HTTP boundary behind the OrderBackend trait
//
// ============================================================================

pub mod backend;
pub mod catalog;
pub mod config;
pub mod domain;
pub mod draft;
pub mod metrics;
pub mod models;
pub mod state_machine;
pub mod submission;
