//! Authenticated HTTP client for the Campus Ride API.
//!
//! This crate wraps the ride-hailing REST API with bearer-token
//! authentication, one-shot refresh-and-retry on 401, and structured errors.
//!
//! # Example
//!
//! ```no_run
//! use campus_ride_client::{CampusRideClient, FileStorage, LoginRequest, ProfileMode, Result};
//!
//! # async fn example() -> Result<()> {
//! let client = CampusRideClient::builder()
//!     .base_url("https://api.campusride.vn")
//!     .storage(FileStorage::new("/tmp/campus-ride"))
//!     .build()?;
//! client.tokens().load().await;
//!
//! // Log in; the profile is re-fetched and cached
//! let session = client
//!     .auth()
//!     .login(&LoginRequest::phone("0901234567", "secret"))
//!     .await?;
//! println!("Logged in as {:?}", session.profile.map(|p| p.full_name));
//!
//! // Switch to driver mode
//! let switched = client.profile().switch_profile(ProfileMode::Driver).await?;
//! assert_eq!(switched.mode, Some(ProfileMode::Driver));
//!
//! // Any call may fail with an expired session
//! match client.wallet().balance().await {
//!     Ok(wallet) => println!("Balance: {}", wallet.balance),
//!     Err(e) if e.requires_login() => println!("Please log in again"),
//!     Err(e) => return Err(e),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # API Coverage
//!
//! - **Auth**: login, register, OTP verification, logout
//! - **Profile**: current profile (cached), rider/driver switch, avatar
//! - **Wallet**: balance, gateway top-up, withdrawal, history
//! - **Verification**: document upload and review status
//! - **Banks**: bank directory for withdrawals

pub mod api;
pub mod client;
pub mod error;
pub mod money;
mod refresh;
pub mod request;
pub mod response;
pub mod session;
pub mod storage;
pub mod token_store;
pub mod types;

pub use client::{CampusRideClient, ClientBuilder};
pub use error::{Error, RefreshFailure, Result};
pub use money::Vnd;
pub use request::{ApiRequest, FilePart, RequestBody, Upload};
pub use response::Payload;
pub use session::{ReconciledSession, SessionManager};
pub use storage::{FileStorage, MemoryStorage, SharedStorage, StorageBackend, StorageError};
pub use token_store::TokenStore;
pub use types::*;
