use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Represents a transaction in the ledger
///
/// A transaction is an opaque text payload with no identity beyond its content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Transaction {
    /// The transaction payload
    #[schema(example = "Alice sends 10 coins to Bob")]
    pub data: String,
}

impl Transaction {
    /// Creates a new transaction from its payload
    pub fn new(data: impl Into<String>) -> Self {
        Transaction { data: data.into() }
    }
}

/// Concatenates the payloads of all transactions, in order, without a separator
pub fn concat_payloads(transactions: &[Transaction]) -> String {
    transactions.iter().map(|tx| tx.data.as_str()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_transaction() {
        let transaction = Transaction::new("hello");
        assert_eq!(transaction.data, "hello");
        assert_eq!(transaction, Transaction::new(String::from("hello")));
    }

    #[test]
    fn test_concat_payloads() {
        let transactions = vec![Transaction::new("ab"), Transaction::new("cd")];
        assert_eq!(concat_payloads(&transactions), "abcd");
        assert_eq!(concat_payloads(&[]), "");
    }

    #[test]
    fn test_serialized_shape() {
        let json = serde_json::to_value(Transaction::new("x")).unwrap();
        assert_eq!(json, serde_json::json!({ "data": "x" }));
    }
}
