use alloy::sol;

sol! {
    event CheckIn(address indexed account, uint256 indexed checkinNumber, string message);
}
