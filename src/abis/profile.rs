use alloy::sol;

sol! {
    event UsernameSet(address indexed account, string username);
}
