//! Typed async client for a handful of Solana RPC methods.
//!
//! The client validates addresses and signatures before any request is
//! sent, maps responses into strict models, and derives how many lamports
//! moved between two accounts of a transaction. Transport is pluggable
//! through [`RpcTransport`]; [`HttpTransport`] speaks JSON-RPC over HTTP.

pub mod address;
pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod transfer;
pub mod transport;

pub use address::{validate_address, validate_signature};
pub use client::{
    Encoding, SolanaClient, TokenAccountsByOwnerOptions, TokenAccountsOptions,
    TransactionOptions,
};
pub use config::{load_config, ClientConfig, Cluster};
pub use error::{Error, Result, TransportError};
pub use models::{
    AccountData, BalanceResult, CompiledInstruction, InstructionData, KeyedAccount, TokenAccount,
    TokenAccountsByOwnerResult, TokenAccountsResult, Transaction, TransactionMeta,
    TransactionResult,
};
pub use solana_commitment_config::CommitmentLevel;
pub use transfer::{lamports_to_sol, sol_to_lamports, transfer_amounts, TransferAmounts};
pub use transport::{HttpTransport, RpcTransport};
