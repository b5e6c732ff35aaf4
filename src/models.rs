//! Typed results of the RPC calls.
//!
//! Raw responses are first deserialized into private wire structs that list
//! every field the node is documented to send (`deny_unknown_fields`), then
//! converted into the public models with every address and signature
//! validated. A model is either built in full or not at all.
//!
//! The public models serialize back to JSON with addresses and signatures
//! rendered as base58 strings.

use std::fmt::Display;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_sdk::transaction::TransactionVersion;
use solana_transaction_status::{EncodedTransaction, TransactionBinaryEncoding};

use crate::address::{validate_address, validate_signature};
use crate::error::{Error, Result, TransportError};
use crate::transfer::{balance_deltas, transfer_amounts};

// ---------------------------------------------------------------------------
// getTokenAccounts
// ---------------------------------------------------------------------------

/// Snapshot of one SPL token account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenAccount {
    #[serde(serialize_with = "display")]
    pub address: Pubkey,
    #[serde(serialize_with = "display")]
    pub mint: Pubkey,
    #[serde(serialize_with = "display")]
    pub owner: Pubkey,
    /// Balance in the token's smallest unit.
    pub amount: u64,
    pub delegated_amount: u64,
    pub frozen: bool,
}

/// One page of token accounts owned by a wallet.
///
/// `total` counts the accounts actually returned, after zero-balance
/// filtering and truncation to `limit`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenAccountsResult {
    pub total: usize,
    pub limit: u32,
    /// Opaque pagination cursor, if the node reported more results.
    pub cursor: Option<String>,
    pub token_accounts: Vec<TokenAccount>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawTokenAccountsPage {
    #[allow(dead_code)]
    total: u64,
    #[allow(dead_code)]
    limit: u64,
    #[serde(default)]
    #[allow(dead_code)]
    page: Option<u64>,
    #[serde(default)]
    cursor: Option<String>,
    #[serde(default)]
    #[allow(dead_code)]
    last_indexed_slot: Option<u64>,
    token_accounts: Vec<RawTokenAccount>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawTokenAccount {
    address: String,
    mint: String,
    owner: String,
    amount: u64,
    delegated_amount: u64,
    frozen: bool,
    #[serde(default)]
    #[allow(dead_code)]
    delegate: Option<String>,
    #[serde(default)]
    #[allow(dead_code)]
    close_authority: Option<String>,
    #[serde(default)]
    #[allow(dead_code)]
    token_extensions: Option<Value>,
}

impl TryFrom<RawTokenAccount> for TokenAccount {
    type Error = Error;

    fn try_from(raw: RawTokenAccount) -> Result<Self> {
        Ok(Self {
            address: response_address("address", &raw.address)?,
            mint: response_address("mint", &raw.mint)?,
            owner: response_address("owner", &raw.owner)?,
            amount: raw.amount,
            delegated_amount: raw.delegated_amount,
            frozen: raw.frozen,
        })
    }
}

impl TokenAccountsResult {
    pub(crate) fn from_rpc(result: Value, show_zero_balance: bool, limit: u32) -> Result<Self> {
        let page: RawTokenAccountsPage = decode(result)?;
        let mut token_accounts = page
            .token_accounts
            .into_iter()
            .map(TokenAccount::try_from)
            .collect::<Result<Vec<_>>>()?;

        if !show_zero_balance {
            let before = token_accounts.len();
            token_accounts.retain(|account| account.amount > 0);
            log::debug!(
                "Dropped {} zero-balance token accounts",
                before - token_accounts.len()
            );
        }
        token_accounts.truncate(limit as usize);

        Ok(Self {
            total: token_accounts.len(),
            limit,
            cursor: page.cursor,
            token_accounts,
        })
    }
}

// ---------------------------------------------------------------------------
// getTransaction
// ---------------------------------------------------------------------------

/// Balance changes recorded for a transaction.
///
/// All vectors are aligned with [`Transaction::account_keys`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionMeta {
    pub fee: u64,
    /// Execution error as reported by the node, `None` on success.
    pub err: Option<Value>,
    pub pre_balances: Vec<u64>,
    pub post_balances: Vec<u64>,
    /// `post_balances[i] - pre_balances[i]`
    pub delta_balances: Vec<i64>,
    pub log_messages: Vec<String>,
}

/// Instruction payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum InstructionData {
    /// `json` / `jsonParsed` instructions, kept as returned.
    Json(Value),
    /// Instructions decoded from a `base58` / `base64` payload.
    Compiled(Vec<CompiledInstruction>),
}

/// An instruction addressing accounts by index into the message keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompiledInstruction {
    pub program_id_index: u8,
    pub accounts: Vec<u8>,
    pub data: Vec<u8>,
}

impl From<&solana_sdk::message::compiled_instruction::CompiledInstruction> for CompiledInstruction {
    fn from(ix: &solana_sdk::message::compiled_instruction::CompiledInstruction) -> Self {
        Self {
            program_id_index: ix.program_id_index,
            accounts: ix.accounts.clone(),
            data: ix.data.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transaction {
    #[serde(serialize_with = "display_seq")]
    pub signatures: Vec<Signature>,
    /// `None` for legacy transactions.
    pub version: Option<u8>,
    /// Static keys followed by keys loaded from address lookup tables.
    #[serde(serialize_with = "display_seq")]
    pub account_keys: Vec<Pubkey>,
    pub instructions: InstructionData,
    pub meta: TransactionMeta,
}

/// A fetched transaction plus the SOL amounts derived for the requested
/// sender and receiver.
///
/// The amounts are computed once, when the result is built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionResult {
    slot: u64,
    block_time: Option<i64>,
    transaction: Transaction,
    #[serde(serialize_with = "display_opt")]
    from_pk: Option<Pubkey>,
    #[serde(serialize_with = "display_opt")]
    to_pk: Option<Pubkey>,
    sol_amount: Option<u64>,
    send_sol_amount: Option<u64>,
}

impl TransactionResult {
    pub(crate) fn from_rpc(
        result: Value,
        from_pk: Option<Pubkey>,
        to_pk: Option<Pubkey>,
    ) -> Result<Self> {
        let raw: RawConfirmedTransaction = serde_json::from_value(result)
            .map_err(|e| Error::MalformedTransaction(e.to_string()))?;
        let raw_meta = raw
            .meta
            .ok_or_else(|| Error::MalformedTransaction("transaction meta is missing".into()))?;

        let transaction = Transaction::from_raw(raw.transaction, raw.version, raw_meta)?;
        let amounts = transfer_amounts(
            &transaction.account_keys,
            &transaction.meta.pre_balances,
            &transaction.meta.post_balances,
            from_pk.as_ref(),
            to_pk.as_ref(),
        )?;

        Ok(Self {
            slot: raw.slot,
            block_time: raw.block_time,
            transaction,
            from_pk,
            to_pk,
            sol_amount: amounts.received,
            send_sol_amount: amounts.sent,
        })
    }

    pub fn slot(&self) -> u64 {
        self.slot
    }

    /// Unix timestamp of the block, when the node knows it.
    pub fn block_time(&self) -> Option<i64> {
        self.block_time
    }

    pub fn block_datetime(&self) -> Option<DateTime<Utc>> {
        self.block_time
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
    }

    pub fn transaction(&self) -> &Transaction {
        &self.transaction
    }

    pub fn meta(&self) -> &TransactionMeta {
        &self.transaction.meta
    }

    pub fn from_pk(&self) -> Option<&Pubkey> {
        self.from_pk.as_ref()
    }

    pub fn to_pk(&self) -> Option<&Pubkey> {
        self.to_pk.as_ref()
    }

    /// Lamports received by `to_pk`.
    pub fn sol_amount(&self) -> Option<u64> {
        self.sol_amount
    }

    /// Lamports sent from `from_pk`.
    pub fn send_sol_amount(&self) -> Option<u64> {
        self.send_sol_amount
    }

}

impl Transaction {
    fn from_raw(
        raw: RawEncodedTransaction,
        version: Option<RawVersion>,
        raw_meta: RawTransactionMeta,
    ) -> Result<Self> {
        let meta = TransactionMeta::from_raw(&raw_meta)?;
        let version = match version {
            None => None,
            Some(RawVersion::Number(v)) => Some(v),
            Some(RawVersion::Tag(tag)) if tag == "legacy" => None,
            Some(RawVersion::Tag(tag)) => {
                return Err(Error::MalformedTransaction(format!(
                    "unknown transaction version {tag:?}"
                )))
            }
        };

        let (signatures, mut account_keys, instructions, keys_complete) = match raw {
            RawEncodedTransaction::Binary(payload, encoding) => {
                let decoded = EncodedTransaction::Binary(payload, encoding)
                    .decode()
                    .ok_or_else(|| {
                        Error::MalformedTransaction("binary transaction payload does not decode".into())
                    })?;

                let decoded_version = match decoded.version() {
                    TransactionVersion::Legacy(_) => None,
                    TransactionVersion::Number(n) => Some(n),
                };
                if decoded_version != version {
                    return Err(Error::MalformedTransaction(format!(
                        "payload is version {decoded_version:?}, response says {version:?}"
                    )));
                }

                let instructions = decoded
                    .message
                    .instructions()
                    .iter()
                    .map(CompiledInstruction::from)
                    .collect();
                (
                    decoded.signatures,
                    decoded.message.static_account_keys().to_vec(),
                    InstructionData::Compiled(instructions),
                    false,
                )
            }
            RawEncodedTransaction::Json(ui) => {
                let signatures = ui
                    .signatures
                    .iter()
                    .map(|s| {
                        validate_signature(s).map_err(|e| {
                            Error::MalformedTransaction(format!("signature {s:?}: {e}"))
                        })
                    })
                    .collect::<Result<Vec<_>>>()?;

                // jsonParsed keys already include lookup-table keys.
                let parsed = ui
                    .message
                    .account_keys
                    .iter()
                    .any(|key| matches!(key, RawAccountKey::Parsed(_)));
                let account_keys = ui
                    .message
                    .account_keys
                    .iter()
                    .map(|key| transaction_address(key.pubkey()))
                    .collect::<Result<Vec<_>>>()?;

                (
                    signatures,
                    account_keys,
                    InstructionData::Json(ui.message.instructions),
                    parsed,
                )
            }
        };

        if !keys_complete {
            if let Some(loaded) = &raw_meta.loaded_addresses {
                for key in loaded.writable.iter().chain(&loaded.readonly) {
                    account_keys.push(transaction_address(key)?);
                }
            }
        }

        Ok(Self {
            signatures,
            version,
            account_keys,
            instructions,
            meta,
        })
    }
}

impl TransactionMeta {
    fn from_raw(raw: &RawTransactionMeta) -> Result<Self> {
        Ok(Self {
            fee: raw.fee,
            err: raw.err.clone(),
            delta_balances: balance_deltas(&raw.pre_balances, &raw.post_balances)?,
            pre_balances: raw.pre_balances.clone(),
            post_balances: raw.post_balances.clone(),
            log_messages: raw.log_messages.clone().unwrap_or_default(),
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct RawConfirmedTransaction {
    slot: u64,
    #[serde(default)]
    block_time: Option<i64>,
    #[serde(default)]
    version: Option<RawVersion>,
    #[serde(default)]
    meta: Option<RawTransactionMeta>,
    transaction: RawEncodedTransaction,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawVersion {
    Number(u8),
    Tag(String),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct RawTransactionMeta {
    #[serde(default)]
    err: Option<Value>,
    #[serde(default)]
    #[allow(dead_code)]
    status: Option<Value>,
    fee: u64,
    pre_balances: Vec<u64>,
    post_balances: Vec<u64>,
    #[serde(default)]
    #[allow(dead_code)]
    inner_instructions: Option<Value>,
    #[serde(default)]
    log_messages: Option<Vec<String>>,
    #[serde(default)]
    #[allow(dead_code)]
    pre_token_balances: Option<Value>,
    #[serde(default)]
    #[allow(dead_code)]
    post_token_balances: Option<Value>,
    #[serde(default)]
    #[allow(dead_code)]
    rewards: Option<Value>,
    #[serde(default)]
    loaded_addresses: Option<RawLoadedAddresses>,
    #[serde(default)]
    #[allow(dead_code)]
    return_data: Option<Value>,
    #[serde(default)]
    #[allow(dead_code)]
    compute_units_consumed: Option<u64>,
    #[serde(default)]
    #[allow(dead_code)]
    cost_units: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawLoadedAddresses {
    writable: Vec<String>,
    readonly: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawEncodedTransaction {
    /// `[payload, "base58" | "base64"]`
    Binary(String, TransactionBinaryEncoding),
    Json(RawUiTransaction),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawUiTransaction {
    signatures: Vec<String>,
    message: RawUiMessage,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct RawUiMessage {
    account_keys: Vec<RawAccountKey>,
    #[serde(default)]
    #[allow(dead_code)]
    header: Option<Value>,
    #[allow(dead_code)]
    recent_blockhash: String,
    instructions: Value,
    #[serde(default)]
    #[allow(dead_code)]
    address_table_lookups: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawAccountKey {
    Plain(String),
    Parsed(RawParsedAccountKey),
}

impl RawAccountKey {
    fn pubkey(&self) -> &str {
        match self {
            RawAccountKey::Plain(key) => key,
            RawAccountKey::Parsed(parsed) => &parsed.pubkey,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawParsedAccountKey {
    pubkey: String,
    #[allow(dead_code)]
    signer: bool,
    #[allow(dead_code)]
    writable: bool,
    #[serde(default)]
    #[allow(dead_code)]
    source: Option<String>,
}

// ---------------------------------------------------------------------------
// getBalance / getTokenAccountsByOwner
// ---------------------------------------------------------------------------

/// Lamport balance of one account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BalanceResult {
    pub slot: u64,
    pub lamports: u64,
}

impl BalanceResult {
    pub(crate) fn from_rpc(result: Value) -> Result<Self> {
        let response: RawContextResponse<u64> = decode(result)?;
        Ok(Self {
            slot: response.context.slot,
            lamports: response.value,
        })
    }
}

/// Account data as returned for the requested encoding.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AccountData {
    /// `jsonParsed` program-specific layout.
    Parsed(Value),
    /// `(payload, encoding)` for binary encodings.
    Encoded { data: String, encoding: String },
}

/// An account together with its address.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeyedAccount {
    #[serde(serialize_with = "display")]
    pub pubkey: Pubkey,
    pub lamports: u64,
    /// Owning program.
    #[serde(serialize_with = "display")]
    pub owner: Pubkey,
    pub data: AccountData,
    pub executable: bool,
    pub rent_epoch: u64,
    pub space: Option<u64>,
}

impl KeyedAccount {
    fn parsed_token_info(&self) -> Option<&Value> {
        match &self.data {
            AccountData::Parsed(value) => value.pointer("/parsed/info"),
            AccountData::Encoded { .. } => None,
        }
    }

    /// Raw token amount, available for `jsonParsed` SPL token accounts.
    pub fn token_amount(&self) -> Option<u64> {
        self.parsed_token_info()?
            .pointer("/tokenAmount/amount")?
            .as_str()?
            .parse()
            .ok()
    }

    pub fn token_mint(&self) -> Option<Pubkey> {
        let mint = self.parsed_token_info()?.get("mint")?.as_str()?;
        validate_address(mint).ok()
    }

    /// Raw account bytes for `base58` / `base64` data.
    pub fn data_bytes(&self) -> Option<Vec<u8>> {
        match &self.data {
            AccountData::Encoded { data, encoding } => match encoding.as_str() {
                "base64" => BASE64.decode(data).ok(),
                "base58" => bs58::decode(data).into_vec().ok(),
                _ => None,
            },
            AccountData::Parsed(_) => None,
        }
    }
}

/// Token accounts owned by a wallet, as reported by `getTokenAccountsByOwner`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TokenAccountsByOwnerResult {
    pub slot: u64,
    pub accounts: Vec<KeyedAccount>,
}

impl TokenAccountsByOwnerResult {
    pub(crate) fn from_rpc(result: Value) -> Result<Self> {
        let response: RawContextResponse<Vec<RawKeyedAccount>> = decode(result)?;
        let accounts = response
            .value
            .into_iter()
            .map(KeyedAccount::try_from)
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            slot: response.context.slot,
            accounts,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawContextResponse<T> {
    context: RawContext,
    value: T,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct RawContext {
    slot: u64,
    #[serde(default)]
    #[allow(dead_code)]
    api_version: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawKeyedAccount {
    pubkey: String,
    account: RawAccount,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct RawAccount {
    lamports: u64,
    owner: String,
    data: RawAccountData,
    executable: bool,
    rent_epoch: u64,
    #[serde(default)]
    space: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawAccountData {
    Encoded(String, String),
    Parsed(Value),
}

impl TryFrom<RawKeyedAccount> for KeyedAccount {
    type Error = Error;

    fn try_from(raw: RawKeyedAccount) -> Result<Self> {
        let data = match raw.account.data {
            RawAccountData::Encoded(data, encoding) => AccountData::Encoded { data, encoding },
            RawAccountData::Parsed(value) => AccountData::Parsed(value),
        };

        Ok(Self {
            pubkey: response_address("pubkey", &raw.pubkey)?,
            lamports: raw.account.lamports,
            owner: response_address("owner", &raw.account.owner)?,
            data,
            executable: raw.account.executable,
            rent_epoch: raw.account.rent_epoch,
            space: raw.account.space,
        })
    }
}

// ---------------------------------------------------------------------------
// helpers
// ---------------------------------------------------------------------------

fn decode<T: DeserializeOwned>(value: Value) -> Result<T> {
    serde_json::from_value(value).map_err(|e| {
        log::warn!("⚠️ Unexpected RPC response shape: {}", e);
        Error::Rpc(TransportError::Decode(e.to_string()))
    })
}

/// Addresses inside a non-transaction response; a bad one is a transport problem.
fn response_address(field: &str, value: &str) -> Result<Pubkey> {
    validate_address(value)
        .map_err(|e| Error::Rpc(TransportError::Decode(format!("{field}: {e}"))))
}

fn transaction_address(value: &str) -> Result<Pubkey> {
    validate_address(value)
        .map_err(|e| Error::MalformedTransaction(format!("account key {value:?}: {e}")))
}

fn display<T: Display, S: Serializer>(value: &T, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_str(value)
}

fn display_opt<T: Display, S: Serializer>(
    value: &Option<T>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    match value {
        Some(value) => serializer.collect_str(value),
        None => serializer.serialize_none(),
    }
}

#[allow(clippy::ptr_arg)]
fn display_seq<T: Display, S: Serializer>(
    values: &Vec<T>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_seq(values.iter().map(ToString::to_string))
}
