//! Wallet API.

use serde_json::Value;

use crate::client::CampusRideClient;
use crate::error::{Error, Result};
use crate::money::{validate_top_up, validate_withdrawal, Vnd};
use crate::request::ApiRequest;
use crate::types::{TopUpRequest, TopUpSession, TransactionPage, Wallet, WithdrawRequest};

/// Default page size for transaction history.
const DEFAULT_PAGE_SIZE: u32 = 20;

/// Wallet API client.
pub struct WalletApi {
    client: CampusRideClient,
}

impl WalletApi {
    pub(crate) fn new(client: CampusRideClient) -> Self {
        Self { client }
    }

    /// Current balance.
    pub async fn balance(&self) -> Result<Wallet> {
        self.client
            .request(&ApiRequest::get("wallet"))
            .await?
            .decode_data()
    }

    /// Start a top-up; the user completes payment on the returned checkout page.
    ///
    /// Amounts outside the gateway bounds are rejected without a request.
    pub async fn top_up(&self, amount: Vnd, return_url: Option<&str>) -> Result<TopUpSession> {
        validate_top_up(amount)?;
        let body = TopUpRequest {
            amount,
            return_url: return_url.map(str::to_owned),
        };
        self.client
            .request(&ApiRequest::post("wallet/topup").json(&body)?)
            .await?
            .decode_data()
    }

    /// Withdraw to a bank account.
    ///
    /// `known_balance`, when given, is checked locally before sending.
    pub async fn withdraw(
        &self,
        request: &WithdrawRequest,
        known_balance: Option<Vnd>,
    ) -> Result<Value> {
        validate_withdrawal(request.amount, known_balance)?;
        if request.account_number.trim().is_empty() || request.bank_code.trim().is_empty() {
            return Err(Error::Validation(
                "Bank code and account number are required".to_string(),
            ));
        }
        Ok(self
            .client
            .request(&ApiRequest::post("wallet/withdraw").json(request)?)
            .await?
            .into_data())
    }

    /// One page of transaction history (1-based).
    pub async fn transactions(&self, page: u32) -> Result<TransactionPage> {
        let request = ApiRequest::get("wallet/transactions")
            .query("page", page.max(1))
            .query("limit", DEFAULT_PAGE_SIZE);
        let body = self.client.request(&request).await?.into_json();
        transaction_page_from_value(body)
    }
}

/// History arrives as a page object, a `data` envelope, or a bare array.
fn transaction_page_from_value(value: Value) -> Result<TransactionPage> {
    match value {
        Value::Array(_) => Ok(TransactionPage {
            items: serde_json::from_value(value).map_err(Error::Decode)?,
            ..Default::default()
        }),
        Value::Null => Ok(TransactionPage::default()),
        other => serde_json::from_value(other).map_err(Error::Decode),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_transaction_page_from_array() {
        let page = transaction_page_from_value(json!([
            {"id": "t1", "kind": "ride_payment", "amount": 25000}
        ]))
        .unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].amount, Vnd(25_000));
    }

    #[test]
    fn test_transaction_page_from_envelope() {
        let page = transaction_page_from_value(json!({
            "data": [{"id": 2, "type": "withdraw", "amount": 100000}],
            "total": 1
        }))
        .unwrap();
        assert_eq!(page.items[0].kind, "withdraw");
        assert_eq!(page.total, Some(1));
    }

    #[test]
    fn test_transaction_page_from_empty() {
        let page = transaction_page_from_value(Value::Null).unwrap();
        assert!(page.items.is_empty());
    }
}
