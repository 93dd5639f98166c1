pub mod bybit_client;
pub mod position_response;
pub mod ticker_response;
pub mod wallet_response;

pub use bybit_client::BybitClient;
pub use position_response::{PositionEntry, PositionList};
pub use ticker_response::{TickerEntry, TickerList};
pub use wallet_response::{WalletEntry, WalletList};
