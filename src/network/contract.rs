use super::{GatewayError, RemoteDataGateway};
use crate::post::{Post, PostId, RawPost};
use crate::wallet::{provider_error, Wallet};
use async_trait::async_trait;
use ethers::{
    abi::{Abi, Tokenize},
    contract::Contract,
    providers::{JsonRpcClient, Provider},
    types::{Address, U64},
};
use log::{debug, info};

/// Address the client talks to unless configured otherwise
pub const DEFAULT_CONTRACT_ADDRESS: &str = "0x46178E5DF9AEFccEA1ac552112650A3A7d81b0Fc";

/// Interface descriptor of the posts contract shipped with the client
pub const BUNDLED_ABI: &str = include_str!("../../abi/tweets.json");

const CREATE_POST: &str = "createTweet";
const LIST_POSTS: &str = "getAllTweets";
const LIKE_POST: &str = "likeTweet";

pub fn parse_abi(json: &str) -> Result<Abi, GatewayError> {
    serde_json::from_str(json).map_err(|e| GatewayError::InvalidAbi(e.to_string()))
}

/// `RemoteDataGateway` backed by a deployed contract reached through the
/// wallet's JSON-RPC provider
pub struct ContractGateway<P> {
    wallet: Wallet<P>,
    address: Address,
    abi: Abi,
    /// Blocks to wait for after the transaction got mined
    confirmations: usize,
    /// Send pre-EIP-1559 transactions priced with `eth_gasPrice`
    legacy: bool,
}

impl<P: JsonRpcClient + 'static> ContractGateway<P> {
    pub fn new(wallet: Wallet<P>, address: Address, abi: Abi) -> Self {
        Self {
            wallet,
            address,
            abi,
            confirmations: 1,
            legacy: false,
        }
    }

    pub fn confirmations(mut self, confirmations: usize) -> Self {
        self.confirmations = confirmations;
        self
    }

    pub fn legacy(mut self, legacy: bool) -> Self {
        self.legacy = legacy;
        self
    }

    fn contract(&self) -> Result<Contract<Provider<P>>, GatewayError> {
        let provider = self.wallet.provider()?;
        Ok(Contract::new(self.address, self.abi.clone(), provider.clone()))
    }

    /// Sends a state changing call from `from` and waits for its receipt
    async fn send<T: Tokenize + Send>(
        &self,
        method: &str,
        from: Address,
        args: T,
    ) -> Result<(), GatewayError> {
        let contract = self.contract()?;
        let call = contract
            .method::<_, ()>(method, args)
            .map_err(|e| GatewayError::InvalidAbi(e.to_string()))?
            .from(from);
        let call = if self.legacy { call.legacy() } else { call };

        let pending = call
            .send()
            .await
            .map_err(|e| GatewayError::Call(e.to_string()))?;
        let tx_hash = *pending;
        info!("(contract) {} sent as {:?}", method, tx_hash);

        let receipt = pending
            .confirmations(self.confirmations)
            .await
            .map_err(provider_error)?;

        match receipt {
            None => Err(GatewayError::Unconfirmed),
            Some(receipt) if receipt.status == Some(U64::zero()) => {
                Err(GatewayError::Reverted(tx_hash))
            }
            Some(receipt) => {
                debug!(
                    "(contract) {:?} confirmed in block {:?}",
                    tx_hash, receipt.block_number
                );
                Ok(())
            }
        }
    }
}

#[async_trait]
impl<P: JsonRpcClient + 'static> RemoteDataGateway for ContractGateway<P> {
    async fn request_identity(&self) -> Result<Address, GatewayError> {
        self.wallet.request_identity().await
    }

    async fn list_posts(&self, author: Address) -> Result<Vec<Post>, GatewayError> {
        let contract = self.contract()?;
        let raw: Vec<RawPost> = contract
            .method::<_, Vec<RawPost>>(LIST_POSTS, author)
            .map_err(|e| GatewayError::InvalidAbi(e.to_string()))?
            .call()
            .await
            .map_err(|e| GatewayError::Call(e.to_string()))?;

        debug!("(contract) {} posts for {:?}", raw.len(), author);
        Ok(raw.into_iter().map(Post::from).collect())
    }

    async fn create_post(&self, author: Address, content: &str) -> Result<(), GatewayError> {
        self.send(CREATE_POST, author, content.to_owned()).await
    }

    async fn like_post(&self, author: Address, id: PostId) -> Result<(), GatewayError> {
        let from = self.wallet.current_account().await?;
        self.send(LIKE_POST, from, (author, id)).await
    }
}
