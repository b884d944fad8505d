pub mod index_sources;
pub mod refresh_ranks;
