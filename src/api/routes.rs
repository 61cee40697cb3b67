use actix_web::web;

use super::handlers;

/// Configures the API routes
///
/// # Arguments
///
/// * `cfg` - The service configuration
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/blockchain", web::get().to(handlers::get_blockchain))
            .route("/transaction", web::post().to(handlers::add_transaction))
            .route("/mine", web::post().to(handlers::mine_block))
            .route("/search", web::get().to(handlers::search_data))
            .route("/validate", web::get().to(handlers::validate_chain))
            .route("/stats", web::get().to(handlers::get_stats))
            .route("/difficulty", web::post().to(handlers::set_difficulty))
    );
}
