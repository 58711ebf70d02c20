pub mod enrichment_flow;
pub mod search_ctx;

pub use enrichment_flow::EnrichmentFlow;
pub use search_ctx::SearchRequest;
