//! Typed decoding of raw ledger logs.
//!
//! Each event source carries an ordered chain of decoders. A decoder returns
//! `None` for logs that are not its event (topic0 mismatch or an ABI shape it
//! cannot decode), so the chain tries candidates in priority order and the
//! first hit wins. Logs no decoder claims are skipped, not errors; contracts
//! emit plenty of events the indexer does not care about.

use alloy::primitives::B256;
use alloy::sol_types::SolEvent;
use chrono::{DateTime, Utc};

use crate::abis;
use crate::ledger::RawLog;
use crate::utils::{address_to_string, is_zero_address};

/// Positioning metadata carried alongside every decoded event.
#[derive(Debug, Clone)]
pub struct LogMeta {
    pub block_number: u64,
    pub tx_hash: String,
    pub log_index: u32,
    pub timestamp: DateTime<Utc>,
}

/// A fully decoded domain event, addresses lowercased and integers narrowed
/// to storage width.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedEvent {
    BadgeMinted {
        owner: String,
        token_id: i64,
        tier: i16,
        /// None when the contract emitted the zero address or the event
        /// predates the referrer argument.
        referrer: Option<String>,
    },
    CheckIn {
        account: String,
        checkin_number: i64,
        message: Option<String>,
    },
    UsernameSet {
        account: String,
        username: String,
    },
    ReferralRecorded {
        referrer: String,
        referee: String,
    },
    RewardAdded {
        referrer: String,
        amount: i64,
    },
    RewardClaimed {
        referrer: String,
        amount: i64,
    },
}

/// One candidate event signature a source knows how to decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventDecoder {
    BadgeMinted,
    BadgeMintedLegacy,
    CheckIn,
    UsernameSet,
    ReferralRecorded,
    RewardAdded,
    RewardClaimed,
}

impl EventDecoder {
    pub fn topic0(&self) -> B256 {
        match self {
            Self::BadgeMinted => abis::BadgeMinted::SIGNATURE_HASH,
            Self::BadgeMintedLegacy => abis::BadgeMintedLegacy::SIGNATURE_HASH,
            Self::CheckIn => abis::CheckIn::SIGNATURE_HASH,
            Self::UsernameSet => abis::UsernameSet::SIGNATURE_HASH,
            Self::ReferralRecorded => abis::ReferralRecorded::SIGNATURE_HASH,
            Self::RewardAdded => abis::RewardAdded::SIGNATURE_HASH,
            Self::RewardClaimed => abis::RewardClaimed::SIGNATURE_HASH,
        }
    }

    /// Decode `raw` if it is this decoder's event; `None` means "not mine".
    pub fn decode(&self, raw: &RawLog) -> Option<DecodedEvent> {
        if raw.topic0() != Some(&self.topic0()) {
            return None;
        }
        let data = raw.log_data();

        match self {
            Self::BadgeMinted => {
                let ev = abis::BadgeMinted::decode_log_data(&data).ok()?;
                let referrer = address_to_string(&ev.referrer);
                Some(DecodedEvent::BadgeMinted {
                    owner: address_to_string(&ev.owner),
                    token_id: i64::try_from(ev.tokenId).ok()?,
                    tier: ev.tier as i16,
                    referrer: (!is_zero_address(&referrer)).then_some(referrer),
                })
            },
            Self::BadgeMintedLegacy => {
                let ev = abis::BadgeMintedLegacy::decode_log_data(&data).ok()?;
                Some(DecodedEvent::BadgeMinted {
                    owner: address_to_string(&ev.owner),
                    token_id: i64::try_from(ev.tokenId).ok()?,
                    tier: i16::try_from(ev.tier).ok()?,
                    referrer: None,
                })
            },
            Self::CheckIn => {
                let ev = abis::CheckIn::decode_log_data(&data).ok()?;
                let message = ev.message.trim().to_string();
                Some(DecodedEvent::CheckIn {
                    account: address_to_string(&ev.account),
                    checkin_number: i64::try_from(ev.checkinNumber).ok()?,
                    message: (!message.is_empty()).then_some(message),
                })
            },
            Self::UsernameSet => {
                let ev = abis::UsernameSet::decode_log_data(&data).ok()?;
                Some(DecodedEvent::UsernameSet {
                    account: address_to_string(&ev.account),
                    username: ev.username.trim().to_string(),
                })
            },
            Self::ReferralRecorded => {
                let ev = abis::ReferralRecorded::decode_log_data(&data).ok()?;
                Some(DecodedEvent::ReferralRecorded {
                    referrer: address_to_string(&ev.referrer),
                    referee: address_to_string(&ev.referee),
                })
            },
            Self::RewardAdded => {
                let ev = abis::RewardAdded::decode_log_data(&data).ok()?;
                Some(DecodedEvent::RewardAdded {
                    referrer: address_to_string(&ev.referrer),
                    amount: i64::try_from(ev.amount).unwrap_or(i64::MAX),
                })
            },
            Self::RewardClaimed => {
                let ev = abis::RewardClaimed::decode_log_data(&data).ok()?;
                Some(DecodedEvent::RewardClaimed {
                    referrer: address_to_string(&ev.referrer),
                    amount: i64::try_from(ev.amount).unwrap_or(i64::MAX),
                })
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use alloy::primitives::{Address, U256};

    use super::*;

    fn raw_from_event<E: SolEvent>(ev: &E) -> RawLog {
        let data = ev.encode_log_data();
        RawLog {
            address: "0x00000000000000000000000000000000000000aa".to_string(),
            topics: data.topics().to_vec(),
            data: data.data,
            block_number: 100,
            tx_hash: "0xdead".to_string(),
            log_index: 0,
        }
    }

    #[test]
    fn decodes_current_badge_event() {
        let raw = raw_from_event(&abis::BadgeMinted {
            owner: Address::repeat_byte(0x11),
            tokenId: U256::from(7),
            tier: 3,
            referrer: Address::repeat_byte(0x22),
        });

        let decoded = EventDecoder::BadgeMinted.decode(&raw).unwrap();
        assert_eq!(
            decoded,
            DecodedEvent::BadgeMinted {
                owner: "0x1111111111111111111111111111111111111111".to_string(),
                token_id: 7,
                tier: 3,
                referrer: Some("0x2222222222222222222222222222222222222222".to_string()),
            }
        );
    }

    #[test]
    fn zero_referrer_becomes_none() {
        let raw = raw_from_event(&abis::BadgeMinted {
            owner: Address::repeat_byte(0x11),
            tokenId: U256::from(7),
            tier: 0,
            referrer: Address::ZERO,
        });

        match EventDecoder::BadgeMinted.decode(&raw).unwrap() {
            DecodedEvent::BadgeMinted {
                referrer, ..
            } => assert!(referrer.is_none()),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn legacy_badge_has_distinct_topic_and_no_referrer() {
        let raw = raw_from_event(&abis::BadgeMintedLegacy {
            owner: Address::repeat_byte(0x33),
            tokenId: U256::from(42),
            tier: U256::from(2),
        });

        // The current-signature decoder must not claim a legacy log.
        assert!(EventDecoder::BadgeMinted.decode(&raw).is_none());

        let decoded = EventDecoder::BadgeMintedLegacy.decode(&raw).unwrap();
        assert_eq!(
            decoded,
            DecodedEvent::BadgeMinted {
                owner: "0x3333333333333333333333333333333333333333".to_string(),
                token_id: 42,
                tier: 2,
                referrer: None,
            }
        );
    }

    #[test]
    fn blank_checkin_message_becomes_none() {
        let raw = raw_from_event(&abis::CheckIn {
            account: Address::repeat_byte(0x44),
            checkinNumber: U256::from(12),
            message: "   ".to_string(),
        });

        match EventDecoder::CheckIn.decode(&raw).unwrap() {
            DecodedEvent::CheckIn {
                checkin_number,
                message,
                ..
            } => {
                assert_eq!(checkin_number, 12);
                assert!(message.is_none());
            },
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn unrelated_log_is_not_claimed() {
        let raw = raw_from_event(&abis::UsernameSet {
            account: Address::repeat_byte(0x55),
            username: "alice".to_string(),
        });

        assert!(EventDecoder::CheckIn.decode(&raw).is_none());
        assert!(EventDecoder::RewardAdded.decode(&raw).is_none());
        assert!(EventDecoder::UsernameSet.decode(&raw).is_some());
    }
}
