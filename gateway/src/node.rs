//! subxt-backed node connection.
//!
//! [`SubxtChain`] implements [`ChainState`] with dynamic storage queries
//! against the relay chain and turns the client's block subscriptions
//! into the exporter's [`ChainFeeds`]. Raw SCALE values are handed to the
//! decoders in `exporter::types`, so this module only deals with RPC
//! plumbing.

use std::fmt::Display;

use async_trait::async_trait;
use futures::StreamExt;
use serde_json::{Map, Value as JsonValue};
use subxt::backend::legacy::LegacyRpcMethods;
use subxt::backend::rpc::RpcClient;
use subxt::dynamic::Value;
use subxt::events::Events;
use subxt::utils::H256;
use subxt::{OnlineClient, PolkadotConfig};

use exporter::{
    BlockHash, BlockNumber, ChainEvent, ChainFeeds, ChainState, EraIndex, EventBatch, Forcing,
    HeadData, LeaseOccupant, ParaId, RelayHead, SessionIndex, SourceError, decode_leases,
    decode_u32,
};

type Config = PolkadotConfig;

fn rpc_error(e: impl Display) -> SourceError {
    SourceError::Rpc(e.to_string())
}

/// Relay-chain node connection.
pub struct SubxtChain {
    api: OnlineClient<Config>,
    rpc: LegacyRpcMethods<Config>,
    lease_period: BlockNumber,
}

impl SubxtChain {
    /// Connects to the node at `url` and reads the lease period constant.
    ///
    /// Plain `ws://` endpoints are accepted; the operator picks the URL.
    pub async fn connect(url: &str) -> Result<Self, SourceError> {
        let client = RpcClient::from_insecure_url(url)
            .await
            .map_err(rpc_error)?;
        let api = OnlineClient::<Config>::from_rpc_client(client.clone())
            .await
            .map_err(rpc_error)?;
        let rpc = LegacyRpcMethods::<Config>::new(client);

        let lease_period = api
            .constants()
            .at(&subxt::dynamic::constant("Slots", "LeasePeriod"))
            .map_err(rpc_error)?;
        let lease_period = decode_u32("Slots.LeasePeriod", lease_period.encoded())?;

        Ok(Self {
            api,
            rpc,
            lease_period,
        })
    }

    /// Human-readable chain name, e.g. `Polkadot`.
    pub async fn chain_name(&self) -> Result<String, SourceError> {
        self.rpc.system_chain().await.map_err(rpc_error)
    }

    /// Decimals of the native token.
    pub async fn token_decimals(&self) -> Result<u32, SourceError> {
        let properties = self.rpc.system_properties().await.map_err(rpc_error)?;
        Ok(token_decimals(&properties))
    }

    /// Subscribes to best heads, finalized heads and best-block events.
    pub async fn feeds(&self) -> Result<ChainFeeds, SourceError> {
        let blocks = self.api.blocks();

        let best_heads = blocks
            .subscribe_best()
            .await
            .map_err(rpc_error)?
            .map(|block| block.map(|b| b.header().number).map_err(rpc_error))
            .boxed();

        let finalized_heads = blocks
            .subscribe_finalized()
            .await
            .map_err(rpc_error)?
            .map(|block| block.map(|b| b.header().number).map_err(rpc_error))
            .boxed();

        let events = blocks
            .subscribe_best()
            .await
            .map_err(rpc_error)?
            .then(|block| async move {
                let block = block.map_err(rpc_error)?;
                let head = RelayHead {
                    number: block.header().number,
                    hash: BlockHash(block.hash().0),
                };

                let fetched = block
                    .events()
                    .await
                    .map(|events| classify_events(head.number, &events));
                Ok::<_, SourceError>(EventBatch::from_fetch(head, fetched))
            })
            .boxed();

        Ok(ChainFeeds {
            best_heads,
            finalized_heads,
            events,
        })
    }

    /// Raw SCALE value of a storage entry as of block `at`.
    async fn fetch_at(
        &self,
        at: &RelayHead,
        pallet: &str,
        entry: &str,
        keys: Vec<Value>,
    ) -> Result<Option<Vec<u8>>, SourceError> {
        let address = subxt::dynamic::storage(pallet, entry, keys);
        let value = self
            .api
            .storage()
            .at(H256(at.hash.0))
            .fetch(&address)
            .await
            .map_err(rpc_error)?;
        Ok(value.map(|v| v.encoded().to_vec()))
    }
}

/// Classifies a block's events in on-chain order.
fn classify_events(number: BlockNumber, events: &Events<Config>) -> Vec<ChainEvent> {
    let mut classified = Vec::new();
    for event in events.iter() {
        match event {
            Ok(event) => classified.push(ChainEvent::from_raw(
                event.pallet_name(),
                event.variant_name(),
                event.field_bytes(),
            )),
            // Later events cannot be located once one fails.
            Err(e) => {
                tracing::warn!(number, error = %e, "failed to read block events");
                break;
            }
        }
    }
    classified
}

/// Reads `tokenDecimals` from the node's system properties. Multi-token
/// chains report an array whose first entry is the native token.
pub fn token_decimals(properties: &Map<String, JsonValue>) -> u32 {
    let decimals = match properties.get("tokenDecimals") {
        Some(JsonValue::Number(n)) => n.as_u64(),
        Some(JsonValue::Array(values)) => values.first().and_then(JsonValue::as_u64),
        _ => None,
    };
    decimals.and_then(|d| u32::try_from(d).ok()).unwrap_or(0)
}

#[async_trait]
impl ChainState for SubxtChain {
    fn lease_period_length(&self) -> BlockNumber {
        self.lease_period
    }

    async fn current_era(&self, at: &RelayHead) -> Result<Option<EraIndex>, SourceError> {
        let value = self.fetch_at(at, "Staking", "CurrentEra", vec![]).await?;
        Ok(value
            .map(|bytes| decode_u32("Staking.CurrentEra", &bytes))
            .transpose()?)
    }

    async fn eras_start_session_index(
        &self,
        at: &RelayHead,
        era: EraIndex,
    ) -> Result<Option<SessionIndex>, SourceError> {
        let value = self
            .fetch_at(
                at,
                "Staking",
                "ErasStartSessionIndex",
                vec![Value::u128(u128::from(era))],
            )
            .await?;
        Ok(value
            .map(|bytes| decode_u32("Staking.ErasStartSessionIndex", &bytes))
            .transpose()?)
    }

    async fn force_era(&self, at: &RelayHead) -> Result<Forcing, SourceError> {
        let value = self.fetch_at(at, "Staking", "ForceEra", vec![]).await?;
        match value {
            Some(bytes) => Ok(Forcing::decode_from(&bytes)?),
            None => Ok(Forcing::default()),
        }
    }

    async fn best_head(&self) -> Result<RelayHead, SourceError> {
        let hash = self
            .rpc
            .chain_get_block_hash(None)
            .await
            .map_err(rpc_error)?
            .ok_or_else(|| SourceError::Rpc("node returned no best block hash".into()))?;
        let header = self
            .rpc
            .chain_get_header(Some(hash))
            .await
            .map_err(rpc_error)?
            .ok_or_else(|| SourceError::Rpc(format!("no header for best block {hash:?}")))?;

        Ok(RelayHead {
            number: header.number,
            hash: BlockHash(hash.0),
        })
    }

    async fn leases_at(
        &self,
        at: &RelayHead,
        para_id: ParaId,
    ) -> Result<Vec<Option<LeaseOccupant>>, SourceError> {
        let value = self
            .fetch_at(
                at,
                "Slots",
                "Leases",
                vec![Value::u128(u128::from(para_id.0))],
            )
            .await?;

        match value {
            Some(bytes) => Ok(decode_leases(&bytes)?),
            None => Ok(Vec::new()),
        }
    }

    async fn para_head(
        &self,
        at: &RelayHead,
        para_id: ParaId,
    ) -> Result<Option<HeadData>, SourceError> {
        let value = self
            .fetch_at(
                at,
                "Paras",
                "Heads",
                vec![Value::u128(u128::from(para_id.0))],
            )
            .await?;
        Ok(value
            .map(|bytes| HeadData::decode_from(&bytes))
            .transpose()?)
    }
}
