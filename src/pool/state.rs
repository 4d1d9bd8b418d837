use drip_blockchain::FailureKind;

/// Claim state shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum ClaimStatus {
    #[default]
    Idle,
    Claiming,
    Claimed,
    Failed(FailureKind),
}

impl std::fmt::Display for ClaimStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClaimStatus::Idle => f.write_str("idle"),
            ClaimStatus::Claiming => f.write_str("claiming"),
            ClaimStatus::Claimed => f.write_str("claimed"),
            ClaimStatus::Failed(kind) => write!(f, "failed ({kind})"),
        }
    }
}
