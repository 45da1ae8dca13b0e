//! # Commitment Binding
//!
//! A reveal is accepted exactly when hash(value ‖ salt) equals the stored
//! commitment, whatever the order of other participants' submissions.

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use shared_types::{commitment_hash, Address, Hash, RevealValue, Round};
    use std::collections::BTreeMap;
    use xcr_02_commit_reveal::{
        AlwaysEligible, CommitRevealApi, CommitRevealConfig, CommitRevealEngine,
        CommitRevealError,
    };

    const MINER: Address = [0x11; 20];
    const OTHER: Address = [0x12; 20];

    fn engine() -> CommitRevealEngine {
        let mut engine = CommitRevealEngine::new(CommitRevealConfig::default());
        let eligible: BTreeMap<Address, u128> = [(MINER, 100), (OTHER, 100)].into_iter().collect();
        engine.open_round(1, Round::Miner, eligible, 1_000).unwrap();
        engine
    }

    proptest! {
        #[test]
        fn prop_reveal_succeeds_iff_hash_matches(
            value in any::<[u8; 32]>(),
            salt in proptest::collection::vec(any::<u8>(), 0..48),
            tampered in any::<Hash>(),
            use_tampered in any::<bool>(),
        ) {
            let reveal = RevealValue::from_hash(value);
            let honest = commitment_hash(&reveal, &salt);
            let committed = if use_tampered { tampered } else { honest };

            let mut engine = engine();
            engine.submit_commitment(&AlwaysEligible, MINER, 1, Round::Miner, committed, 1_001).unwrap();
            engine.submit_commitment(&AlwaysEligible, OTHER, 1, Round::Miner, [0u8; 32], 1_002).unwrap();

            let result = engine.submit_reveal(MINER, 1, Round::Miner, reveal, &salt, 1_003);
            if committed == honest {
                prop_assert!(result.is_ok());
                prop_assert_eq!(engine.aggregate(1, Round::Miner).unwrap().valid_reveals, 1);
            } else {
                prop_assert!(
                    matches!(result, Err(CommitRevealError::HashMismatch { .. })),
                    "expected HashMismatch, got {:?}",
                    result
                );
                prop_assert_eq!(engine.aggregate(1, Round::Miner).unwrap().valid_reveals, 0);
            }
        }

        #[test]
        fn prop_other_salt_never_opens_commitment(
            value in any::<[u8; 32]>(),
            salt in proptest::collection::vec(any::<u8>(), 1..32),
            wrong in proptest::collection::vec(any::<u8>(), 1..32),
        ) {
            prop_assume!(salt != wrong);
            let reveal = RevealValue::from_hash(value);

            let mut engine = engine();
            engine
                .submit_commitment(&AlwaysEligible, MINER, 1, Round::Miner, commitment_hash(&reveal, &salt), 1_001)
                .unwrap();
            engine.submit_commitment(&AlwaysEligible, OTHER, 1, Round::Miner, [0u8; 32], 1_002).unwrap();

            let result = engine.submit_reveal(MINER, 1, Round::Miner, reveal, &wrong, 1_003);
            prop_assert!(
                matches!(result, Err(CommitRevealError::HashMismatch { .. })),
                "expected HashMismatch, got {:?}",
                result
            );
        }
    }
}
