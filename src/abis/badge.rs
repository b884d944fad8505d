use alloy::sol;

sol! {
    event BadgeMinted(address indexed owner, uint256 indexed tokenId, uint8 tier, address referrer);
}

/// Pre-upgrade badge contract. Same event name, but tier was emitted as a
/// uint256 and there was no referrer argument, so the topic0 differs.
pub mod legacy {
    use alloy::sol;

    sol! {
        event BadgeMinted(address indexed owner, uint256 indexed tokenId, uint256 tier);
    }
}
