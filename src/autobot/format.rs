//! Display helpers for addresses and transaction links.

const SOLSCAN_TX_URL: &str = "https://solscan.io/tx";

/// Shorten an address to its first and last `n` characters joined by an ellipsis.
///
/// Strings of `2n` characters or fewer come back unchanged.
pub fn short(address: &str, n: usize) -> String {
    let chars: Vec<char> = address.chars().collect();
    if chars.len() <= n * 2 {
        return address.to_string();
    }
    let head: String = chars[..n].iter().collect();
    let tail: String = chars[chars.len() - n..].iter().collect();
    format!("{head}…{tail}")
}

/// Solscan link for a transaction signature on mainnet
pub fn solscan_tx(signature: &str) -> String {
    format!("{SOLSCAN_TX_URL}/{signature}?cluster=mainnet")
}
