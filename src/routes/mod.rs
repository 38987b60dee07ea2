//! Route gateway: merges every subrouter and attaches the shared state.
//!
//! `main.rs` only ever calls [`router`]; individual endpoints stay private
//! to their sibling modules.

use axum::Router;

use crate::AppState;

mod backend;
mod health;
mod history;
mod pages;

// ---

pub fn router(state: AppState) -> Router {
    // ---
    Router::new()
        .merge(pages::router())
        .merge(history::router())
        .merge(backend::router())
        .merge(health::router())
        .with_state(state)
}
