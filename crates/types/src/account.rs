//! Typed views of the node's account, application and network responses.

use crate::{Address, AppId, AssetId, Hash, MicroAlgos, Round, TealKeyValue};
use serde::{Deserialize, Serialize};

/// An account's balance, holdings and application local state.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct AccountInfo {
    /// The account address.
    pub address: Address,
    /// Total balance in micro-units.
    pub amount: MicroAlgos,
    /// The minimum balance the account must retain.
    #[serde(default)]
    pub min_balance: MicroAlgos,
    /// Assets the account has opted into.
    #[serde(default)]
    pub assets: Vec<AssetHolding>,
    /// Applications the account has opted into, with their local state.
    #[serde(default)]
    pub apps_local_state: Vec<AppLocalState>,
}

/// An account's holding of a single asset.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct AssetHolding {
    /// The asset.
    pub asset_id: AssetId,
    /// The amount held.
    #[serde(default)]
    pub amount: u64,
}

/// An account's local state for one application.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct AppLocalState {
    /// The application.
    pub id: AppId,
    /// The local key-value state.
    #[serde(default)]
    pub key_value: Vec<TealKeyValue>,
}

/// A deployed application and its global state.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ApplicationInfo {
    /// The application.
    pub id: AppId,
    /// The global key-value state.
    pub global_state: Vec<TealKeyValue>,
}

/// The node's view of the chain tip.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct NodeStatus {
    /// The last committed round.
    pub last_round: Round,
}

/// Network parameters used to build transactions.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SuggestedParams {
    /// The fee. Per byte unless `flat_fee` is set, in which case it is the
    /// fee of the whole transaction.
    pub fee: MicroAlgos,
    /// The minimum fee per transaction.
    pub min_fee: MicroAlgos,
    /// Whether `fee` is used as is rather than scaled by size.
    pub flat_fee: bool,
    /// First round the transaction is valid in.
    pub first_valid: Round,
    /// Last round the transaction is valid in.
    pub last_valid: Round,
    /// The genesis id of the network.
    pub genesis_id: String,
    /// The genesis hash of the network.
    pub genesis_hash: Hash,
}

/// A confirmed transaction group.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Confirmation {
    /// The id of the first transaction in the group.
    pub tx_id: String,
    /// The round the group was committed in.
    pub confirmed_round: Round,
}

impl AccountInfo {
    /// Balance left after subtracting the minimum balance, saturating at zero.
    pub fn spendable(&self) -> MicroAlgos {
        self.amount.saturating_sub(self.min_balance)
    }

    /// The local state for the given application, if the account opted in.
    pub fn local_state(&self, app_id: AppId) -> Option<&[TealKeyValue]> {
        self.apps_local_state
            .iter()
            .find(|app| app.id == app_id)
            .map(|app| &app.key_value[..])
    }

    /// Whether the account holds (has opted into) the given asset.
    pub fn holds_asset(&self, asset_id: AssetId) -> bool {
        self.assets.iter().any(|a| a.asset_id == asset_id)
    }
}

impl SuggestedParams {
    /// Use the given fee per transaction, regardless of size.
    pub fn with_flat_fee(mut self, fee: MicroAlgos) -> Self {
        self.fee = fee;
        self.flat_fee = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StateValue;

    const ACCOUNT_JSON: &str = r#"{
        "address": "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAY5HFKQ",
        "amount": 5000000,
        "min-balance": 328500,
        "assets": [{"asset-id": 77, "amount": 10, "is-frozen": false}],
        "apps-local-state": [
            {"id": 12, "key-value": [{"key": "ZWZmb3J0", "value": {"type": 2, "uint": 9}}]}
        ],
        "status": "Offline"
    }"#;

    #[test]
    fn decode_account() {
        let info: AccountInfo = serde_json::from_str(ACCOUNT_JSON).unwrap();
        assert_eq!(info.address, Address::ZERO);
        assert_eq!(info.spendable(), 5000000 - 328500);
        assert!(info.holds_asset(77));
        assert!(!info.holds_asset(78));
        let local = info.local_state(12).unwrap();
        assert_eq!(
            crate::state::lookup(local, "effort"),
            Some(&StateValue::Uint(9))
        );
        assert!(info.local_state(13).is_none());
    }

    #[test]
    fn spendable_saturates() {
        let info = AccountInfo {
            amount: 100,
            min_balance: 200,
            ..Default::default()
        };
        assert_eq!(info.spendable(), 0);
    }

    #[test]
    fn missing_optional_sections() {
        let json = r#"{"address": "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAY5HFKQ", "amount": 0}"#;
        let info: AccountInfo = serde_json::from_str(json).unwrap();
        assert!(info.assets.is_empty());
        assert!(info.apps_local_state.is_empty());
    }
}
