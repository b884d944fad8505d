//! Event source definitions.
//!
//! A source binds one contract address to the decoder chain for the events it
//! emits. Source ids embed the lowercase address so moving a contract to a new
//! deployment naturally starts a fresh checkpoint.

use alloy::primitives::B256;

use crate::config::{ContractSettings, ContractsSettings};
use crate::ledger::RawLog;
use crate::utils::normalize_address;
use crate::worker::decoder::{DecodedEvent, EventDecoder};

pub struct EventSource {
    pub source_id: String,
    /// Contract address, lowercase.
    pub address: String,
    pub deploy_block: u64,
    decoders: Vec<EventDecoder>,
    /// When true and a topic-filtered fetch of a window comes back empty,
    /// the window is refetched without a topic filter and run through the
    /// decoder chain anyway. Needed for the badge contract, whose early
    /// deployments emitted the legacy signature from proxies that mangle
    /// topic filtering on some RPC providers.
    pub unfiltered_fallback: bool,
}

impl EventSource {
    fn new(
        kind: &str,
        contract: &ContractSettings,
        decoders: Vec<EventDecoder>,
        unfiltered_fallback: bool,
    ) -> Self {
        let address = normalize_address(&contract.address);
        Self {
            source_id: format!("{}:{}", kind, address),
            address,
            deploy_block: contract.deploy_block,
            decoders,
            unfiltered_fallback,
        }
    }

    pub fn badge(contract: &ContractSettings) -> Self {
        Self::new(
            "badge",
            contract,
            vec![EventDecoder::BadgeMinted, EventDecoder::BadgeMintedLegacy],
            true,
        )
    }

    pub fn checkin(contract: &ContractSettings) -> Self {
        Self::new("checkin", contract, vec![EventDecoder::CheckIn], false)
    }

    pub fn profile(contract: &ContractSettings) -> Self {
        Self::new("profile", contract, vec![EventDecoder::UsernameSet], false)
    }

    pub fn rewards(contract: &ContractSettings) -> Self {
        Self::new(
            "rewards",
            contract,
            vec![
                EventDecoder::ReferralRecorded,
                EventDecoder::RewardAdded,
                EventDecoder::RewardClaimed,
            ],
            false,
        )
    }

    /// All configured sources in processing order. Badges come first so a
    /// fresh database sees tiers before check-ins reference them.
    pub fn all(contracts: &ContractsSettings) -> Vec<EventSource> {
        vec![
            Self::badge(&contracts.badge),
            Self::checkin(&contracts.checkin),
            Self::profile(&contracts.profile),
            Self::rewards(&contracts.rewards),
        ]
    }

    /// topic0 filter for log fetches.
    pub fn topics(&self) -> Vec<B256> {
        self.decoders.iter().map(|d| d.topic0()).collect()
    }

    /// Run the decoder chain; first claim wins.
    pub fn decode(&self, raw: &RawLog) -> Option<DecodedEvent> {
        self.decoders.iter().find_map(|d| d.decode(raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contract(addr: &str, deploy_block: u64) -> ContractSettings {
        ContractSettings {
            address: addr.to_string(),
            deploy_block,
        }
    }

    #[test]
    fn source_id_embeds_lowercase_address() {
        let src = EventSource::badge(&contract("0xABCDEF0000000000000000000000000000000001", 500));
        assert_eq!(
            src.source_id,
            "badge:0xabcdef0000000000000000000000000000000001"
        );
        assert_eq!(src.deploy_block, 500);
    }

    #[test]
    fn badge_source_filters_both_signatures() {
        let src = EventSource::badge(&contract("0xaa", 1));
        let topics = src.topics();
        assert_eq!(topics.len(), 2);
        assert!(topics.contains(&EventDecoder::BadgeMinted.topic0()));
        assert!(topics.contains(&EventDecoder::BadgeMintedLegacy.topic0()));
        assert!(src.unfiltered_fallback);
    }

    #[test]
    fn only_badge_source_uses_unfiltered_fallback() {
        assert!(!EventSource::checkin(&contract("0xaa", 1)).unfiltered_fallback);
        assert!(!EventSource::profile(&contract("0xaa", 1)).unfiltered_fallback);
        assert!(!EventSource::rewards(&contract("0xaa", 1)).unfiltered_fallback);
    }
}
