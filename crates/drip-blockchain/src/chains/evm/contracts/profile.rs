use alloy::sol;

sol! {
    #[derive(Debug)]
    interface DripProfile {
        struct Challenge {
            uint256 id;
            address creator;
            string description;
            uint256 stakeAmount;
            uint64 startTime;
            uint64 endTime;
            uint256 participantCount;
        }

        error ProfileNotFound(address account);

        function getChallenges(address account) external view returns (Challenge[] memory);
    }
}
