//! # Relay Ordering
//!
//! The bridge is at-least-once and unordered. Whatever order and however
//! many copies arrive, the destination applies each nonce exactly once and
//! in sequence.

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use shared_types::{ChainId, SharedSecret, StaticKeyProvider};
    use std::sync::Arc;
    use xcr_01_participant_registry::ValidatorSetChange;
    use xcr_04_cross_chain_relay::{
        CrossChainMessage, CrossChainRelay, HmacAuthenticator, InMemoryBridge, MirrorSink,
        RelayApi, RelayConfig, RelayError, RelayPayload,
    };

    use crate::integration::fixtures::{L1, L2, SECRET};

    type Relay = CrossChainRelay<InMemoryBridge, HmacAuthenticator>;

    #[derive(Default)]
    struct CountingSink {
        applied: usize,
    }

    impl MirrorSink for CountingSink {
        fn apply(&mut self, _origin: ChainId, _payload: RelayPayload) -> Result<bool, String> {
            self.applied += 1;
            Ok(true)
        }
    }

    fn relay(local: ChainId, counterparty: ChainId, bridge: &Arc<InMemoryBridge>) -> Relay {
        let keys =
            StaticKeyProvider::new().with_pair(local, counterparty, SharedSecret::new(SECRET));
        CrossChainRelay::new(
            RelayConfig::new(local, counterparty),
            bridge.clone(),
            HmacAuthenticator::new(keys),
        )
    }

    /// `count` validator-set messages from L2 to L1, in nonce order.
    fn sent_messages(count: u64) -> Vec<CrossChainMessage> {
        let bridge = Arc::new(InMemoryBridge::new());
        let mut origin = relay(L2, L1, &bridge);
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        runtime.block_on(async {
            for i in 0..count {
                let change = ValidatorSetChange::Upsert {
                    validator: [i as u8; 20],
                    stake: 50,
                };
                origin.send_validator_set(L1, vec![change]).await.unwrap();
            }
        });
        let mut messages = bridge.take_delivered(L1);
        messages.sort_by_key(|m| m.nonce);
        messages
    }

    fn deliveries() -> impl Strategy<Value = (u64, Vec<u64>)> {
        (1u64..=12).prop_flat_map(|count| {
            let order = Just((1..=count).collect::<Vec<u64>>()).prop_shuffle();
            let duplicates = proptest::collection::vec((1..=count, any::<prop::sample::Index>()), 0..8);
            (Just(count), order, duplicates).prop_map(|(count, mut order, duplicates)| {
                for (nonce, position) in duplicates {
                    let at = position.index(order.len() + 1);
                    order.insert(at, nonce);
                }
                (count, order)
            })
        })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_nonces_applied_once_and_in_order((count, order) in deliveries()) {
            let messages = sent_messages(count);
            let bridge = Arc::new(InMemoryBridge::new());
            let mut destination = relay(L1, L2, &bridge);
            let mut sink = CountingSink::default();
            let mut applied = Vec::new();

            for (at, nonce) in order.iter().enumerate() {
                let message = messages[(*nonce - 1) as usize].clone();
                match destination.receive(message, &mut sink, 5_000 + at as u64) {
                    Ok(batch) => applied.extend(batch.into_iter().map(|a| a.nonce)),
                    Err(err) => prop_assert!(
                        matches!(err, RelayError::ReplayedNonce { .. }),
                        "unexpected rejection {:?}",
                        err
                    ),
                }
            }

            let expected: Vec<u64> = (1..=count).collect();
            prop_assert_eq!(applied, expected);
            prop_assert_eq!(sink.applied as u64, count);
            prop_assert_eq!(destination.state().last_applied(L2), count);
            prop_assert!(destination.state().buffered(L2).is_empty());
        }

        #[test]
        fn prop_tampered_messages_never_applied(flip in 0usize..32, nonce in 1u64..=3) {
            let messages = sent_messages(3);
            let bridge = Arc::new(InMemoryBridge::new());
            let mut destination = relay(L1, L2, &bridge);
            let mut sink = CountingSink::default();

            let mut tampered = messages[(nonce - 1) as usize].clone();
            tampered.proof[flip] ^= 0x01;
            let err = destination.receive(tampered, &mut sink, 5_000).unwrap_err();
            prop_assert!(matches!(err, RelayError::InvalidProof { .. }), "expected InvalidProof, got {:?}", err);
            prop_assert_eq!(sink.applied, 0);
            prop_assert_eq!(destination.state().last_applied(L2), 0);
        }
    }

    #[test]
    fn test_wrong_key_rejected_as_invalid_proof() {
        let messages = sent_messages(1);
        let bridge = Arc::new(InMemoryBridge::new());
        let keys = StaticKeyProvider::new().with_pair(L1, L2, SharedSecret::new([0x01; 32]));
        let mut destination = CrossChainRelay::new(
            RelayConfig::new(L1, L2),
            bridge,
            HmacAuthenticator::new(keys),
        );

        let err = destination
            .receive(messages[0].clone(), &mut CountingSink::default(), 5_000)
            .unwrap_err();
        assert!(matches!(err, RelayError::InvalidProof { .. }));
        assert_eq!(destination.state().last_applied(L2), 0);
    }
}
