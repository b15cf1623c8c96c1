pub mod exchange;

pub use exchange::{ExchangeOutcome, ExchangedUser, IssuerPolicy, TokenExchangeService};
