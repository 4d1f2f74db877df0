//! Access to the chain node required by the miner.
//!
//! ## Chain Gateway
//!
//! The [`ChainGateway`] trait is the miner's only view of the chain: account and
//! application queries, network parameters and atomic group submission.
//! [`AlgodClient`] implements it over the node's REST API.
//!
//! With the `memory` feature, [`memory::MemoryGateway`] provides an in-process
//! implementation for tests and dry runs.

#![deny(missing_docs)]
#![deny(unsafe_code)]

use core::{fmt, future::Future, pin::Pin};
use effort_types::{
    AccountInfo, Address, AppId, ApplicationInfo, Confirmation, NodeStatus, SignedTransaction,
    SuggestedParams,
};

pub use algod::{AlgodClient, AlgodEndpoint};
pub use error::GatewayError;

mod algod;
pub mod error;
#[cfg(feature = "memory")]
pub mod memory;

/// A boxed, sendable gateway future.
pub type BoxFuture<T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send + 'static>>;

/// Access to chain state and transaction submission.
///
/// Implementations are cheap to clone and shared between the scheduler and the
/// concurrently running submission tasks.
pub trait ChainGateway: Clone + Send + Sync + 'static {
    /// An error type describing any cases that might occur while talking to the node.
    type Error: fmt::Debug + fmt::Display + Send + Sync + 'static;

    /// The future type returned from every gateway method.
    ///
    /// ## Unpin
    ///
    /// The future must be `Unpin` and `Send` so that it can be awaited from
    /// spawned tasks without further pinning. Implementations that call
    /// `async` functions with anonymised return types will typically use
    /// [`BoxFuture`].
    type Future<T: Send + 'static>: Future<Output = Result<T, Self::Error>> + Send + Unpin;

    /// The node's view of the chain tip.
    fn status(&self) -> Self::Future<NodeStatus>;

    /// Balance, holdings and application local state of the given account.
    fn account_info(&self, address: &Address) -> Self::Future<AccountInfo>;

    /// Global state of the given application.
    fn application_info(&self, app_id: AppId) -> Self::Future<ApplicationInfo>;

    /// Parameters for building new transactions.
    fn suggested_params(&self) -> Self::Future<SuggestedParams>;

    /// Submit the signed transactions as one atomic group and wait up to
    /// `wait_rounds` rounds for the group to be confirmed.
    fn submit_group(
        &self,
        group: Vec<SignedTransaction>,
        wait_rounds: u64,
    ) -> Self::Future<Confirmation>;
}
