use axum::{Router, routing::get};

pub mod barcodes;
pub mod budgets;
pub mod grocery;
pub mod inventory;
pub mod iot;
pub mod reports;
pub mod system;
pub mod users;

/// Router for all authenticated (household-scoped) endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .route("/stream", get(system::stream))
        .nest("/users", users::router())
        .nest("/inventory", inventory::router())
        .nest("/barcodes", barcodes::router())
        .nest("/grocery", grocery::router())
        .merge(budgets::router())
        .nest("/iot", iot::router())
        .nest("/reports", reports::router())
}
