use sbm_core::derive_substream_seed;

/// Derives the deterministic seed used for a specific chain.
pub fn chain_seed(master_seed: u64, chain_index: usize) -> u64 {
    derive_substream_seed(master_seed, chain_index as u64)
}

/// Deterministic seed for the exchange proposals of one ladder round.
pub fn exchange_seed(master_seed: u64, round: usize) -> u64 {
    derive_substream_seed(master_seed ^ 0xA5A5_A5A5_A5A5_A5A5, round as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_and_exchange_streams_differ() {
        assert_eq!(chain_seed(7, 3), chain_seed(7, 3));
        assert_ne!(chain_seed(7, 0), chain_seed(7, 1));
        assert_ne!(chain_seed(7, 0), exchange_seed(7, 0));
    }
}
