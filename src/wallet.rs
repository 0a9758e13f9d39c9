use super::network::GatewayError;
use ethers::{
    providers::{JsonRpcClient, Middleware, Provider, ProviderError, RpcError},
    types::Address,
};
use log::{debug, warn};
use std::sync::Arc;

/// JSON-RPC error code a wallet answers with when the user declines a request
pub const USER_REJECTED_CODE: i64 = 4001;

/// Identity side of the remote boundary: asks the wallet behind the
/// JSON-RPC endpoint which account is authorized.
pub struct Wallet<P> {
    /// `None` when no endpoint was configured, the equivalent of a browser
    /// without a wallet extension
    provider: Option<Arc<Provider<P>>>,
}

impl<P: JsonRpcClient> Wallet<P> {
    pub fn new(provider: Option<Arc<Provider<P>>>) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> Result<&Arc<Provider<P>>, GatewayError> {
        self.provider.as_ref().ok_or(GatewayError::NoProvider)
    }

    /// Requests account access and returns the first authorized account
    pub async fn request_identity(&self) -> Result<Address, GatewayError> {
        let provider = self.provider()?;
        let accounts: Vec<Address> = provider
            .request("eth_requestAccounts", ())
            .await
            .map_err(provider_error)?;
        debug!("(wallet) authorized accounts {:?}", accounts);

        accounts
            .into_iter()
            .next()
            .ok_or_else(|| GatewayError::Provider("wallet authorized no accounts".to_owned()))
    }

    /// Account currently selected in the wallet, used as the sender of
    /// transactions that are not tied to a specific author
    pub async fn current_account(&self) -> Result<Address, GatewayError> {
        let provider = self.provider()?;
        let accounts = provider.get_accounts().await.map_err(provider_error)?;
        match accounts.first() {
            Some(account) => Ok(*account),
            None => {
                warn!("(wallet) no account is selected");
                Err(GatewayError::NoAccount)
            }
        }
    }
}

/// Maps a provider failure onto the gateway taxonomy, singling out the
/// user-declined code
pub fn provider_error(err: ProviderError) -> GatewayError {
    match err.as_error_response() {
        Some(response) if response.code == USER_REJECTED_CODE => GatewayError::UserRejected,
        _ => GatewayError::Provider(err.to_string()),
    }
}
