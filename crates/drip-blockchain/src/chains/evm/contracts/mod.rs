pub mod challenge_manager;
pub mod drip_token;
pub mod profile;

pub use challenge_manager::ChallengeManager;
pub use drip_token::DripToken;
pub use profile::DripProfile;
