use std::io;

use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use log::{error, info};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod api;
mod blockchain;
mod config;

use config::Config;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::handlers::get_blockchain,
        api::handlers::add_transaction,
        api::handlers::mine_block,
        api::handlers::search_data,
        api::handlers::validate_chain,
        api::handlers::get_stats,
        api::handlers::set_difficulty
    ),
    components(
        schemas(
            blockchain::Block,
            blockchain::Transaction,
            blockchain::ChainSnapshot,
            blockchain::ChainStats,
            blockchain::SearchResult,
            api::handlers::TransactionRequest,
            api::handlers::TransactionResponse,
            api::handlers::MineResponse,
            api::handlers::SearchResponse,
            api::handlers::ValidateResponse,
            api::handlers::DifficultyRequest,
            api::handlers::DifficultyResponse
        )
    ),
    tags(
        (name = "ledger", description = "Proof-of-work ledger API endpoints")
    ),
    info(
        title = "Ledger API",
        version = "1.0.0",
        description = "An in-memory proof-of-work ledger",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    )
)]
struct ApiDoc;

fn invalid_input<E>(err: E) -> io::Error
where
    E: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    io::Error::new(io::ErrorKind::InvalidInput, err)
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = Config::from_env().map_err(|err| {
        error!("Invalid configuration: {}", err);
        invalid_input(err)
    })?;

    // The genesis block is mined before the server starts accepting requests
    let blockchain =
        blockchain::Blockchain::with_difficulty(config.difficulty).map_err(invalid_input)?;
    info!("Blockchain initialized with genesis block (difficulty {})", config.difficulty);
    let blockchain = web::Data::new(blockchain);

    info!("Starting HTTP server at http://{}:{}", config.host, config.port);

    let allowed_origin = config.allowed_origin.clone();

    HttpServer::new(move || {
        let cors = Cors::default()
            .allowed_origin(&allowed_origin)
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
            .allow_any_header()
            .max_age(3600);

        let openapi = ApiDoc::openapi();

        App::new()
            .wrap(middleware::Logger::default())
            .wrap(cors)
            .app_data(blockchain.clone())
            // API routes
            .configure(api::configure_routes)
            // Swagger UI
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", openapi.clone())
            )
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}
