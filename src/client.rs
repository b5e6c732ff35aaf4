use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Map, Value};
use solana_commitment_config::CommitmentLevel;

use crate::address::{validate_address, validate_signature};
use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::models::{
    BalanceResult, TokenAccountsByOwnerResult, TokenAccountsResult, TransactionResult,
};
use crate::transport::{HttpTransport, RpcTransport};

pub const TOKEN_PROGRAM_ID: &str = "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA";

const GET_TOKEN_ACCOUNTS: &str = "getTokenAccounts";
const GET_TRANSACTION: &str = "getTransaction";
const GET_BALANCE: &str = "getBalance";
const GET_TOKEN_ACCOUNTS_BY_OWNER: &str = "getTokenAccountsByOwner";

/// Response encodings understood by the node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Encoding {
    #[default]
    Json,
    JsonParsed,
    Base58,
    Base64,
}

impl Encoding {
    pub fn as_str(&self) -> &'static str {
        match self {
            Encoding::Json => "json",
            Encoding::JsonParsed => "jsonParsed",
            Encoding::Base58 => "base58",
            Encoding::Base64 => "base64",
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Encoding {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "json" => Ok(Encoding::Json),
            "jsonParsed" => Ok(Encoding::JsonParsed),
            "base58" => Ok(Encoding::Base58),
            "base64" => Ok(Encoding::Base64),
            other => Err(format!("unknown encoding: {other}")),
        }
    }
}

pub fn commitment_as_str(commitment: CommitmentLevel) -> &'static str {
    match commitment {
        CommitmentLevel::Processed => "processed",
        CommitmentLevel::Confirmed => "confirmed",
        CommitmentLevel::Finalized => "finalized",
    }
}

pub fn parse_commitment(s: &str) -> Option<CommitmentLevel> {
    match s {
        "processed" => Some(CommitmentLevel::Processed),
        "confirmed" => Some(CommitmentLevel::Confirmed),
        "finalized" => Some(CommitmentLevel::Finalized),
        _ => None,
    }
}

/// Options for [`SolanaClient::get_token_accounts`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenAccountsOptions {
    /// Only return accounts of this mint.
    pub mint: Option<String>,
    pub show_zero_balance: bool,
    pub limit: u32,
}

impl Default for TokenAccountsOptions {
    fn default() -> Self {
        Self {
            mint: None,
            show_zero_balance: false,
            limit: 10,
        }
    }
}

impl TokenAccountsOptions {
    pub fn mint(mut self, mint: impl Into<String>) -> Self {
        self.mint = Some(mint.into());
        self
    }

    pub fn show_zero_balance(mut self, show: bool) -> Self {
        self.show_zero_balance = show;
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }
}

/// Options for [`SolanaClient::get_transaction`].
///
/// `commitment` falls back to the client's default when `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionOptions {
    pub encoding: Encoding,
    pub commitment: Option<CommitmentLevel>,
    /// Sender whose outgoing lamports should be computed.
    pub from_pk: Option<String>,
    /// Receiver whose incoming lamports should be computed.
    pub to_pk: Option<String>,
}

impl TransactionOptions {
    pub fn encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn commitment(mut self, commitment: CommitmentLevel) -> Self {
        self.commitment = Some(commitment);
        self
    }

    pub fn from_pk(mut self, from_pk: impl Into<String>) -> Self {
        self.from_pk = Some(from_pk.into());
        self
    }

    pub fn to_pk(mut self, to_pk: impl Into<String>) -> Self {
        self.to_pk = Some(to_pk.into());
        self
    }
}

/// Options for [`SolanaClient::get_token_accounts_by_owner`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenAccountsByOwnerOptions {
    pub mint: Option<String>,
    pub commitment: Option<CommitmentLevel>,
    pub encoding: Encoding,
}

impl Default for TokenAccountsByOwnerOptions {
    fn default() -> Self {
        Self {
            mint: None,
            commitment: None,
            encoding: Encoding::JsonParsed,
        }
    }
}

impl TokenAccountsByOwnerOptions {
    pub fn mint(mut self, mint: impl Into<String>) -> Self {
        self.mint = Some(mint.into());
        self
    }

    pub fn commitment(mut self, commitment: CommitmentLevel) -> Self {
        self.commitment = Some(commitment);
        self
    }

    pub fn encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }
}

/// Typed access to a handful of Solana RPC methods.
///
/// Cloning is cheap and clones share the transport; the client keeps no
/// per-call state, so concurrent calls are independent.
#[derive(Clone)]
pub struct SolanaClient {
    transport: Arc<dyn RpcTransport>,
    commitment: CommitmentLevel,
}

impl SolanaClient {
    /// Connect over HTTP with the default timeout and `finalized` commitment.
    pub fn new(rpc_url: &str) -> Result<Self> {
        let transport = HttpTransport::new(rpc_url)?;
        Ok(Self::with_transport(Arc::new(transport)))
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        let transport =
            HttpTransport::with_timeout(config.rpc_url.as_str(), Duration::from_secs(config.timeout_secs))?;
        log::info!("🌐 RPC endpoint: {} (timeout {}s)", transport.url(), config.timeout_secs);
        let mut client = Self::with_transport(Arc::new(transport));
        if let Some(commitment) = config.commitment.as_deref().and_then(parse_commitment) {
            client.commitment = commitment;
        }
        Ok(client)
    }

    pub fn with_transport(transport: Arc<dyn RpcTransport>) -> Self {
        Self {
            transport,
            commitment: CommitmentLevel::Finalized,
        }
    }

    /// Default commitment for calls that do not specify one.
    pub fn with_commitment(mut self, commitment: CommitmentLevel) -> Self {
        self.commitment = commitment;
        self
    }

    pub fn commitment(&self) -> CommitmentLevel {
        self.commitment
    }

    /// Fetch the token accounts owned by `owner`.
    ///
    /// Zero-balance accounts are dropped unless `show_zero_balance` is set,
    /// and at most `limit` accounts are returned. `total` is counted after
    /// both steps.
    pub async fn get_token_accounts(
        &self,
        owner: &str,
        options: TokenAccountsOptions,
    ) -> Result<TokenAccountsResult> {
        let owner = validate_address(owner)?;
        let mint = options.mint.as_deref().map(validate_address).transpose()?;
        if options.limit == 0 {
            return Err(Error::InvalidLimit);
        }

        let mut params = Map::new();
        params.insert("owner".into(), json!(owner.to_string()));
        params.insert("limit".into(), json!(options.limit));
        params.insert(
            "options".into(),
            json!({ "showZeroBalance": options.show_zero_balance }),
        );
        if let Some(mint) = mint {
            params.insert("mint".into(), json!(mint.to_string()));
        }

        log::debug!("📡 {} owner={} limit={}", GET_TOKEN_ACCOUNTS, owner, options.limit);
        let result = self
            .transport
            .invoke(GET_TOKEN_ACCOUNTS, Value::Object(params))
            .await?;

        TokenAccountsResult::from_rpc(result, options.show_zero_balance, options.limit)
    }

    /// Fetch a transaction by signature.
    ///
    /// When `from_pk` / `to_pk` are given, the lamports they sent / received
    /// are computed from the balance deltas.
    pub async fn get_transaction(
        &self,
        signature: &str,
        options: TransactionOptions,
    ) -> Result<TransactionResult> {
        let signature = validate_signature(signature)?;
        let from_pk = options.from_pk.as_deref().map(validate_address).transpose()?;
        let to_pk = options.to_pk.as_deref().map(validate_address).transpose()?;
        let commitment = options.commitment.unwrap_or(self.commitment);

        let params = json!([
            signature.to_string(),
            {
                "commitment": commitment_as_str(commitment),
                "encoding": options.encoding.as_str(),
                "maxSupportedTransactionVersion": 0,
            }
        ]);

        log::debug!("📡 {} {} ({})", GET_TRANSACTION, signature, options.encoding);
        let result = self.transport.invoke(GET_TRANSACTION, params).await?;
        if result.is_null() {
            return Err(Error::TransactionNotFound(signature.to_string()));
        }

        TransactionResult::from_rpc(result, from_pk, to_pk)
    }

    /// Fetch the lamport balance of an account.
    pub async fn get_balance(
        &self,
        pubkey: &str,
        commitment: Option<CommitmentLevel>,
    ) -> Result<BalanceResult> {
        let pubkey = validate_address(pubkey)?;
        let commitment = commitment.unwrap_or(self.commitment);

        let params = json!([
            pubkey.to_string(),
            { "commitment": commitment_as_str(commitment) }
        ]);

        log::debug!("📡 {} {}", GET_BALANCE, pubkey);
        let result = self.transport.invoke(GET_BALANCE, params).await?;
        BalanceResult::from_rpc(result)
    }

    /// Fetch SPL token accounts owned by `owner`, optionally for one mint.
    pub async fn get_token_accounts_by_owner(
        &self,
        owner: &str,
        options: TokenAccountsByOwnerOptions,
    ) -> Result<TokenAccountsByOwnerResult> {
        let owner = validate_address(owner)?;
        let mint = options.mint.as_deref().map(validate_address).transpose()?;
        let commitment = options.commitment.unwrap_or(self.commitment);

        // The node rejects an empty filter.
        let filter = match mint {
            Some(mint) => json!({ "mint": mint.to_string() }),
            None => json!({ "programId": TOKEN_PROGRAM_ID }),
        };
        let params = json!([
            owner.to_string(),
            filter,
            {
                "commitment": commitment_as_str(commitment),
                "encoding": options.encoding.as_str(),
            }
        ]);

        log::debug!("📡 {} {}", GET_TOKEN_ACCOUNTS_BY_OWNER, owner);
        let result = self
            .transport
            .invoke(GET_TOKEN_ACCOUNTS_BY_OWNER, params)
            .await?;
        TokenAccountsByOwnerResult::from_rpc(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encoding_strings() {
        for encoding in [
            Encoding::Json,
            Encoding::JsonParsed,
            Encoding::Base58,
            Encoding::Base64,
        ] {
            assert_eq!(encoding.as_str().parse::<Encoding>().unwrap(), encoding);
        }
        assert_eq!(Encoding::default(), Encoding::Json);
        assert!("binary".parse::<Encoding>().is_err());
    }

    #[test]
    fn commitment_strings() {
        for level in [
            CommitmentLevel::Processed,
            CommitmentLevel::Confirmed,
            CommitmentLevel::Finalized,
        ] {
            assert_eq!(parse_commitment(commitment_as_str(level)), Some(level));
        }
        assert_eq!(parse_commitment("max"), None);
    }

    #[test]
    fn option_defaults() {
        let options = TokenAccountsOptions::default();
        assert_eq!(options.limit, 10);
        assert!(!options.show_zero_balance);
        assert_eq!(options.mint, None);

        let options = TransactionOptions::default();
        assert_eq!(options.encoding, Encoding::Json);
        assert_eq!(options.commitment, None);

        assert_eq!(
            TokenAccountsByOwnerOptions::default().encoding,
            Encoding::JsonParsed
        );
    }

    #[test]
    fn client_defaults_to_finalized() {
        let client = SolanaClient::new("https://api.devnet.solana.com").unwrap();
        assert_eq!(client.commitment(), CommitmentLevel::Finalized);
        let client = client.with_commitment(CommitmentLevel::Confirmed);
        assert_eq!(client.commitment(), CommitmentLevel::Confirmed);
    }

    #[test]
    fn client_from_config_uses_configured_commitment() {
        let config = ClientConfig {
            commitment: Some("processed".into()),
            ..ClientConfig::default()
        };
        let client = SolanaClient::from_config(&config).unwrap();
        assert_eq!(client.commitment(), CommitmentLevel::Processed);
    }
}
