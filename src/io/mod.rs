/// CSV export of the dispatch trace.
pub mod export;
