mod config;

pub use config::{
    ContractSettings, ContractsSettings, IndexerSettings, LedgerSettings, PostgresSettings,
    RedpandaSettings, Settings,
};
