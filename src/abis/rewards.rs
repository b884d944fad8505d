use alloy::sol;

sol! {
    event RewardAdded(address indexed referrer, uint256 amount);
    event RewardClaimed(address indexed referrer, uint256 amount);
}
