use alloy::sol;

sol! {
    #[derive(Debug)]
    interface ChallengeManager {
        struct EpochInfo {
            uint256 epoch;
            string description;
            uint256 participantCount;
            uint256 totalStakedAmount;
            uint64 startTime;
            uint64 endTime;
        }

        error EpochNotStarted();

        function getEpochInfo() external view returns (EpochInfo memory);
    }
}
