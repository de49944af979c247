pub mod fetcher;

pub use fetcher::{ClientConfig, HttpPageFetcher};
