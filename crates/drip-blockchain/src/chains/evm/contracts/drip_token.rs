use alloy::sol;

sol! {
    /// ERC20 reward token with an owner-gated `setBalance` used to credit rewards.
    #[derive(Debug)]
    interface DripToken {
        error ERC20InsufficientBalance(address sender, uint256 balance, uint256 needed);
        error ERC20InsufficientAllowance(address spender, uint256 allowance, uint256 needed);
        error ERC20InvalidApprover(address approver);
        error ERC20InvalidSpender(address spender);
        error OwnableUnauthorizedAccount(address account);

        function symbol() external view returns (string);
        function decimals() external view returns (uint8);
        function balanceOf(address account) external view returns (uint256);
        function allowance(address owner, address spender) external view returns (uint256);
        function approve(address spender, uint256 value) external returns (bool);
        function setBalance(address account, uint256 amount) external;
    }
}
