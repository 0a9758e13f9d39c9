use ethers::{types::Address, utils::to_checksum};

pub const DEFAULT_START: usize = 6;
pub const DEFAULT_END: usize = 4;

/// Shortens `address` to `{first start chars}...{last end chars}`.
///
/// Works on chars, so any identifier string is accepted. When the input is
/// shorter than `start + end` the two halves overlap. An `end` of zero
/// counts as "from the very start", so the tail is the whole string.
pub fn short_address(address: &str, start: usize, end: usize) -> String {
    let chars: Vec<char> = address.chars().collect();
    let head: String = chars.iter().take(start).collect();
    let tail_start = match end {
        0 => 0,
        end => chars.len().saturating_sub(end),
    };
    let tail: String = chars[tail_start..].iter().collect();
    format!("{}...{}", head, tail)
}

/// EIP-55 checksummed form of `address`, the way wallets display it
pub fn display_address(address: &Address) -> String {
    to_checksum(address, None)
}
