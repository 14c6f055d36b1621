//! API endpoint implementations.

mod auth;
mod banks;
mod profile;
mod verification;
mod wallet;

pub use auth::AuthApi;
pub use banks::BanksApi;
pub use profile::ProfileApi;
pub use verification::VerificationApi;
pub use wallet::WalletApi;
