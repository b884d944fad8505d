use alloy::sol;

sol! {
    event ReferralRecorded(address indexed referrer, address indexed referee);
}
