//! Bank directory API.

use crate::client::CampusRideClient;
use crate::error::Result;
use crate::request::ApiRequest;
use crate::types::Bank;

/// Bank directory client.
///
/// Used to pick the destination bank for withdrawals.
pub struct BanksApi {
    client: CampusRideClient,
}

impl BanksApi {
    pub(crate) fn new(client: CampusRideClient) -> Self {
        Self { client }
    }

    /// List supported banks.
    pub async fn list(&self) -> Result<Vec<Bank>> {
        self.client
            .request(&ApiRequest::get("banks"))
            .await?
            .decode_data()
    }

    /// Find a bank by code or short name, case-insensitively.
    pub async fn find(&self, code: &str) -> Result<Option<Bank>> {
        Ok(find_bank(self.list().await?, code))
    }
}

fn find_bank(banks: Vec<Bank>, code: &str) -> Option<Bank> {
    banks.into_iter().find(|bank| {
        bank.code.eq_ignore_ascii_case(code)
            || bank
                .short_name
                .as_deref()
                .is_some_and(|s| s.eq_ignore_ascii_case(code))
    })
}
