use actix_web::{web, HttpResponse, Responder};
use log::error;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::blockchain::{Block, Blockchain, SearchResult};

/// Data structure for the blockchain state
pub type BlockchainData = web::Data<Blockchain>;

fn bad_request(message: &str) -> HttpResponse {
    HttpResponse::BadRequest().json(serde_json::json!({ "error": message }))
}

/// Runs a ledger operation on the blocking thread pool
///
/// Mining holds the ledger's write lock for as long as it runs, so every
/// ledger access is kept off the async workers.
///
/// # Returns
///
/// The operation's result, or a 500 response if the task could not complete
async fn run_on_ledger<F, R>(blockchain: &BlockchainData, operation: F) -> Result<R, HttpResponse>
where
    F: FnOnce(Blockchain) -> R + Send + 'static,
    R: Send + 'static,
{
    let blockchain = blockchain.get_ref().clone();

    web::block(move || operation(blockchain)).await.map_err(|err| {
        error!("Ledger task failed: {}", err);
        HttpResponse::InternalServerError().json(serde_json::json!({
            "error": format!("Ledger task failed: {}", err)
        }))
    })
}

/// Request for the transaction endpoint
#[derive(Serialize, Deserialize, ToSchema)]
pub struct TransactionRequest {
    /// The transaction payload
    pub data: String,
}

/// Response for the transaction endpoint
#[derive(Serialize, Deserialize, ToSchema)]
pub struct TransactionResponse {
    pub success: bool,
    pub message: String,

    /// Size of the pending pool after the insert
    pub pending_transactions: usize,
}

/// Response for the mine endpoint
#[derive(Serialize, Deserialize, ToSchema)]
pub struct MineResponse {
    pub success: bool,
    pub message: String,

    /// The newly mined block
    pub block: Block,
}

/// Query for the search endpoint
#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchQuery {
    /// Text to look for, case-insensitive
    pub q: Option<String>,
}

/// Response for the search endpoint
#[derive(Serialize, Deserialize, ToSchema)]
pub struct SearchResponse {
    pub success: bool,
    pub query: String,
    pub results: Vec<SearchResult>,
}

/// Response for the validate endpoint
#[derive(Serialize, Deserialize, ToSchema)]
pub struct ValidateResponse {
    pub success: bool,
    pub valid: bool,
    pub message: String,
}

/// Request for the difficulty endpoint
#[derive(Serialize, Deserialize, ToSchema)]
pub struct DifficultyRequest {
    /// Number of leading zero hex characters, 1 to 6
    pub difficulty: u8,
}

/// Response for the difficulty endpoint
#[derive(Serialize, Deserialize, ToSchema)]
pub struct DifficultyResponse {
    pub success: bool,
    pub message: String,
    pub difficulty: u8,
}

/// Get the full blockchain
///
/// Returns the chain, the current difficulty and the pending pool
#[utoipa::path(
    get,
    path = "/api/blockchain",
    responses(
        (status = 200, description = "Blockchain retrieved successfully",
            body = crate::blockchain::ChainSnapshot)
    )
)]
pub async fn get_blockchain(blockchain: BlockchainData) -> impl Responder {
    match run_on_ledger(&blockchain, |ledger| ledger.snapshot()).await {
        Ok(snapshot) => HttpResponse::Ok().json(snapshot),
        Err(response) => response,
    }
}

/// Add a transaction
///
/// Adds a new transaction to the pending pool
#[utoipa::path(
    post,
    path = "/api/transaction",
    request_body = TransactionRequest,
    responses(
        (status = 200, description = "Transaction added to pending pool",
            body = TransactionResponse),
        (status = 400, description = "Invalid transaction data")
    )
)]
pub async fn add_transaction(
    blockchain: BlockchainData,
    transaction_req: web::Json<TransactionRequest>,
) -> impl Responder {
    let data = transaction_req.into_inner().data;

    if data.is_empty() {
        return bad_request("Transaction data cannot be empty");
    }

    match run_on_ledger(&blockchain, move |ledger| ledger.add_transaction(data)).await {
        Ok(pending_transactions) => HttpResponse::Ok().json(TransactionResponse {
            success: true,
            message: "Transaction added to pending pool".to_string(),
            pending_transactions,
        }),
        Err(response) => response,
    }
}

/// Mine a new block
///
/// Seals all pending transactions into a new block. Mining runs on the
/// blocking thread pool and can take a long time at high difficulty.
#[utoipa::path(
    post,
    path = "/api/mine",
    responses(
        (status = 200, description = "Block mined successfully", body = MineResponse),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn mine_block(blockchain: BlockchainData) -> impl Responder {
    match run_on_ledger(&blockchain, |ledger| ledger.mine_block()).await {
        Ok(block) => HttpResponse::Ok().json(MineResponse {
            success: true,
            message: "Block mined successfully".to_string(),
            block,
        }),
        Err(response) => response,
    }
}

/// Search transactions
///
/// Case-insensitive substring search over every mined transaction
#[utoipa::path(
    get,
    path = "/api/search",
    params(SearchQuery),
    responses(
        (status = 200, description = "Search completed", body = SearchResponse),
        (status = 400, description = "Missing query")
    )
)]
pub async fn search_data(
    blockchain: BlockchainData,
    query: web::Query<SearchQuery>,
) -> impl Responder {
    let query = match query.into_inner().q {
        Some(q) if !q.is_empty() => q,
        _ => return bad_request("Query parameter 'q' is required"),
    };

    let needle = query.clone();
    match run_on_ledger(&blockchain, move |ledger| ledger.search(&needle)).await {
        Ok(results) => HttpResponse::Ok().json(SearchResponse {
            success: true,
            query,
            results,
        }),
        Err(response) => response,
    }
}

/// Check if the blockchain is valid
///
/// Validates the entire blockchain
#[utoipa::path(
    get,
    path = "/api/validate",
    responses(
        (status = 200, description = "Blockchain validation status", body = ValidateResponse)
    )
)]
pub async fn validate_chain(blockchain: BlockchainData) -> impl Responder {
    match run_on_ledger(&blockchain, |ledger| ledger.is_valid()).await {
        Ok(valid) => HttpResponse::Ok().json(ValidateResponse {
            success: true,
            valid,
            message: format!("Blockchain is valid: {}", valid),
        }),
        Err(response) => response,
    }
}

/// Get blockchain statistics
#[utoipa::path(
    get,
    path = "/api/stats",
    responses(
        (status = 200, description = "Statistics retrieved successfully",
            body = crate::blockchain::ChainStats)
    )
)]
pub async fn get_stats(blockchain: BlockchainData) -> impl Responder {
    match run_on_ledger(&blockchain, |ledger| ledger.stats()).await {
        Ok(stats) => HttpResponse::Ok().json(stats),
        Err(response) => response,
    }
}

/// Set mining difficulty
///
/// Applies to blocks mined from now on
#[utoipa::path(
    post,
    path = "/api/difficulty",
    request_body = DifficultyRequest,
    responses(
        (status = 200, description = "Difficulty updated", body = DifficultyResponse),
        (status = 400, description = "Difficulty out of range")
    )
)]
pub async fn set_difficulty(
    blockchain: BlockchainData,
    difficulty_req: web::Json<DifficultyRequest>,
) -> impl Responder {
    let requested = difficulty_req.difficulty;

    match run_on_ledger(&blockchain, move |ledger| ledger.set_difficulty(requested)).await {
        Ok(Ok(difficulty)) => HttpResponse::Ok().json(DifficultyResponse {
            success: true,
            message: "Difficulty updated".to_string(),
            difficulty,
        }),
        Ok(Err(err)) => bad_request(&err.to_string()),
        Err(response) => response,
    }
}
