pub mod contract;
#[cfg(test)]
pub mod fake;

use super::post::{Post, PostId};
use async_trait::async_trait;
use ethers::types::{Address, TxHash};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GatewayError {
    /// No wallet endpoint is available at all
    #[error("no web3 provider detected")]
    NoProvider,

    #[error("user rejected the request")]
    UserRejected,

    #[error("wallet provider error: {0}")]
    Provider(String),

    #[error("wallet has no selected account")]
    NoAccount,

    #[error("contract call failed: {0}")]
    Call(String),

    #[error("transaction dropped before confirmation")]
    Unconfirmed,

    #[error("transaction {0:?} reverted")]
    Reverted(TxHash),

    #[error("invalid contract interface: {0}")]
    InvalidAbi(String),
}

/// Async boundary to the wallet and the posts contract.
///
/// Mutating calls resolve once the remote side confirmed them and return
/// nothing; their effect is only observable through a later `list_posts`.
#[async_trait]
pub trait RemoteDataGateway: Send + Sync {
    /// Asks the wallet for authorization, returns the first account
    async fn request_identity(&self) -> Result<Address, GatewayError>;

    /// All posts of `author`, in whatever order the contract keeps them
    async fn list_posts(&self, author: Address) -> Result<Vec<Post>, GatewayError>;

    async fn create_post(&self, author: Address, content: &str) -> Result<(), GatewayError>;

    async fn like_post(&self, author: Address, id: PostId) -> Result<(), GatewayError>;
}
