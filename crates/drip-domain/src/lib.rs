mod amount;
mod challenge;
mod environment;
mod epoch;

pub use amount::{TokenAmountError, format_token_amount, whole_tokens_to_units};
pub use challenge::Challenge;
pub use environment::EnvironmentKey;
pub use epoch::EpochInfo;
