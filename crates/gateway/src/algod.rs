//! [`ChainGateway`] implementation over the node's REST API.

use crate::{error::GatewayResult, BoxFuture, ChainGateway, GatewayError};
use effort_types::{
    AccountInfo, Address, AppId, ApplicationInfo, Confirmation, Hash, NodeStatus, Round,
    SignedTransaction, SuggestedParams, TealKeyValue,
};
use reqwest::{header::CONTENT_TYPE, Method, RequestBuilder};
use serde::{de::DeserializeOwned, Deserialize};
use std::sync::Arc;

/// Header carrying the node API token.
pub const TOKEN_HEADER: &str = "X-Algod-API-Token";

/// Number of rounds a new transaction stays valid for.
pub const VALIDITY_WINDOW: Round = 1000;

/// Where to reach a node.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AlgodEndpoint {
    /// Server URL, e.g. `https://testnet-api.example.org`.
    pub server: String,
    /// Optional port appended to the server URL.
    pub port: Option<u16>,
    /// API token. Empty when the node does not require one.
    pub token: String,
}

/// A REST client for the node.
#[derive(Clone, Debug)]
pub struct AlgodClient {
    http: reqwest::Client,
    base: Arc<str>,
    token: Arc<str>,
}

#[derive(Deserialize)]
#[serde(rename_all = "kebab-case")]
struct ApplicationResponse {
    id: AppId,
    params: ApplicationParams,
}

#[derive(Deserialize)]
#[serde(rename_all = "kebab-case")]
struct ApplicationParams {
    #[serde(default)]
    global_state: Vec<TealKeyValue>,
}

#[derive(Deserialize)]
#[serde(rename_all = "kebab-case")]
struct ParamsResponse {
    fee: u64,
    min_fee: u64,
    genesis_id: String,
    #[serde(with = "effort_types::serde::bytes")]
    genesis_hash: Hash,
    last_round: Round,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubmitResponse {
    tx_id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "kebab-case")]
struct PendingResponse {
    #[serde(default)]
    confirmed_round: Round,
    #[serde(default)]
    pool_error: String,
}

impl AlgodEndpoint {
    /// The base URL requests are made against.
    pub fn base_url(&self) -> GatewayResult<String> {
        let server = self.server.trim_end_matches('/');
        if !(server.starts_with("http://") || server.starts_with("https://")) {
            return Err(GatewayError::InvalidEndpoint(self.server.clone()));
        }
        Ok(match self.port {
            Some(port) => format!("{server}:{port}"),
            None => server.to_string(),
        })
    }
}

impl From<ParamsResponse> for SuggestedParams {
    fn from(p: ParamsResponse) -> Self {
        SuggestedParams {
            fee: p.fee,
            min_fee: p.min_fee,
            flat_fee: false,
            first_valid: p.last_round,
            last_valid: p.last_round + VALIDITY_WINDOW,
            genesis_id: p.genesis_id,
            genesis_hash: p.genesis_hash,
        }
    }
}

impl From<ApplicationResponse> for ApplicationInfo {
    fn from(r: ApplicationResponse) -> Self {
        ApplicationInfo {
            id: r.id,
            global_state: r.params.global_state,
        }
    }
}

impl AlgodClient {
    /// Create a client for the given endpoint.
    pub fn new(endpoint: &AlgodEndpoint) -> GatewayResult<Self> {
        let http = reqwest::Client::builder().build()?;
        Ok(Self {
            http,
            base: endpoint.base_url()?.into(),
            token: endpoint.token.as_str().into(),
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let request = self.http.request(method, format!("{}{path}", self.base));
        if self.token.is_empty() {
            request
        } else {
            request.header(TOKEN_HEADER, &*self.token)
        }
    }

    async fn send<T: DeserializeOwned>(request: RequestBuilder) -> GatewayResult<T> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.bytes().await?;
        if !status.is_success() {
            return Err(GatewayError::Status {
                code: status.as_u16(),
                message: String::from_utf8_lossy(&body).into_owned(),
            });
        }
        Ok(serde_json::from_slice(&body)?)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> GatewayResult<T> {
        Self::send(self.request(Method::GET, path)).await
    }

    async fn application(&self, app_id: AppId) -> GatewayResult<ApplicationInfo> {
        let response: ApplicationResponse =
            self.get(&format!("/v2/applications/{app_id}")).await?;
        Ok(response.into())
    }

    async fn params(&self) -> GatewayResult<SuggestedParams> {
        let response: ParamsResponse = self.get("/v2/transactions/params").await?;
        Ok(response.into())
    }

    async fn submit(
        &self,
        group: Vec<SignedTransaction>,
        wait_rounds: u64,
    ) -> GatewayResult<Confirmation> {
        let tx_id = self.post_group(&group).await?;
        tracing::trace!(%tx_id, size = group.len(), "group accepted into pool");
        self.wait_for_confirmation(tx_id, wait_rounds).await
    }

    /// Submit the raw group and return the id of its first transaction.
    async fn post_group(&self, group: &[SignedTransaction]) -> GatewayResult<String> {
        if group.is_empty() {
            return Err(GatewayError::EmptyGroup);
        }
        let body: Vec<u8> = group.iter().flat_map(effort_hash::serialize).collect();
        let request = self
            .request(Method::POST, "/v2/transactions")
            .header(CONTENT_TYPE, "application/x-binary")
            .body(body);
        let response: SubmitResponse = Self::send(request).await?;
        Ok(response.tx_id)
    }

    /// Poll the pending transaction until it is confirmed, rejected, or
    /// `rounds` rounds have passed.
    async fn wait_for_confirmation(&self, tx_id: String, rounds: u64) -> GatewayResult<Confirmation> {
        let status: NodeStatus = self.get("/v2/status").await?;
        let start = status.last_round;
        let mut round = start;
        while round < start + rounds {
            let pending: PendingResponse =
                self.get(&format!("/v2/transactions/pending/{tx_id}")).await?;
            if pending.confirmed_round > 0 {
                return Ok(Confirmation {
                    tx_id,
                    confirmed_round: pending.confirmed_round,
                });
            }
            if !pending.pool_error.is_empty() {
                return Err(GatewayError::Rejected(pending.pool_error));
            }
            let _: NodeStatus = self
                .get(&format!("/v2/status/wait-for-block-after/{round}"))
                .await?;
            round += 1;
        }
        Err(GatewayError::Timeout { rounds })
    }
}

impl ChainGateway for AlgodClient {
    type Error = GatewayError;
    type Future<T: Send + 'static> = BoxFuture<T, GatewayError>;

    fn status(&self) -> Self::Future<NodeStatus> {
        let this = self.clone();
        Box::pin(async move { this.get::<NodeStatus>("/v2/status").await })
    }

    fn account_info(&self, address: &Address) -> Self::Future<AccountInfo> {
        let this = self.clone();
        let path = format!("/v2/accounts/{address}");
        Box::pin(async move { this.get::<AccountInfo>(&path).await })
    }

    fn application_info(&self, app_id: AppId) -> Self::Future<ApplicationInfo> {
        let this = self.clone();
        Box::pin(async move { this.application(app_id).await })
    }

    fn suggested_params(&self) -> Self::Future<SuggestedParams> {
        let this = self.clone();
        Box::pin(async move { this.params().await })
    }

    fn submit_group(
        &self,
        group: Vec<SignedTransaction>,
        wait_rounds: u64,
    ) -> Self::Future<Confirmation> {
        let this = self.clone();
        Box::pin(async move { this.submit(group, wait_rounds).await })
    }
}
