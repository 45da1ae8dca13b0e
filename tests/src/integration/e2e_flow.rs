//! # End-to-End Flow
//!
//! register protocol and participants → create → miner commit/reveal → validator score commit/reveal
//! → finalize → propagate → destination applies the mirrored outcome.

#[cfg(test)]
mod tests {
    use shared_types::{ErrorKind, Role};
    use xcr_03_proposal_store::ProposalStatus;
    use xcr_04_cross_chain_relay::ApplyOutcome;
    use xcr_05_orchestrator::{ChainNode, FileLedger, StepOutcome};

    use crate::integration::fixtures::*;

    #[tokio::test]
    async fn test_score_propagates_and_mirrors() {
        let mut pair = Pair::new();
        pair.register_participants();
        let l2 = &mut pair.l2;

        let (p1, _) = l2.create_proposal(GOV, M, [0xAA; 32], 1_010).unwrap();
        assert_eq!(p1, 1);

        l2.commit(M, p1, content_commitment(content_a(), b"saltA"), 1_020)
            .unwrap();
        l2.reveal(M, p1, content_a(), b"saltA", 1_030).unwrap();
        assert_eq!(l2.proposal(p1).unwrap().content, Some(content_a()));

        l2.score_commit(V1, p1, score_commitment(80, b"s1"), 1_040)
            .unwrap();
        l2.score_commit(V2, p1, score_commitment(90, b"s2"), 1_041)
            .unwrap();
        l2.score_reveal(V1, p1, 80, b"s1", 1_050).unwrap();
        l2.score_reveal(V2, p1, 90, b"s2", 1_051).unwrap();

        let proposal = l2.proposal(p1).unwrap();
        assert_eq!(proposal.status, ProposalStatus::Scored);
        assert_eq!(proposal.final_score(), Some(85));

        l2.finalize(p1, 1_060).unwrap();
        l2.propagate(p1).await.unwrap();

        let delivered = pair.bridge.take_delivered(L1);
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].nonce, 1);

        let applied = pair.l1.receive(delivered[0].clone(), 2_000).unwrap();
        assert_eq!(applied[0].outcome, ApplyOutcome::Applied);

        let mirrored = pair.l1.mirrored(L2, p1).unwrap();
        assert_eq!(mirrored.status, ProposalStatus::Finalized);
        assert_eq!(mirrored.final_score(), Some(85));
        assert_eq!(mirrored.content, Some(content_a()));
        assert_eq!(mirrored.protocol, GOV);

        // Replay of nonce 1
        let before = pair.l1.status();
        let err = pair.l1.receive(delivered[0].clone(), 2_001).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ReplayedNonce);
        assert_eq!(pair.l1.status(), before);
    }

    #[tokio::test]
    async fn test_every_step_is_idempotent() {
        let mut pair = Pair::new();
        pair.register_participants();
        let l2 = &mut pair.l2;

        let again = StepOutcome::AlreadyApplied;
        assert_eq!(l2.register(V1, Role::Validator, 50, 1_001).unwrap(), again);
        assert_eq!(l2.register_protocol(GOV, 1_001).unwrap(), again);

        let (p1, _) = l2.create_proposal(GOV, M, [0xAA; 32], 1_010).unwrap();
        assert_eq!(l2.create_proposal(GOV, M, [0xAA; 32], 1_011).unwrap(), (p1, again));

        let commitment = content_commitment(content_a(), b"saltA");
        l2.commit(M, p1, commitment, 1_020).unwrap();
        assert_eq!(l2.commit(M, p1, commitment, 1_021).unwrap(), again);
        l2.reveal(M, p1, content_a(), b"saltA", 1_030).unwrap();
        assert_eq!(l2.reveal(M, p1, content_a(), b"saltA", 1_031).unwrap(), again);

        l2.score_commit(V1, p1, score_commitment(70, b"s1"), 1_040)
            .unwrap();
        assert_eq!(
            l2.score_commit(V1, p1, score_commitment(70, b"s1"), 1_041)
                .unwrap(),
            again
        );
        l2.score_commit(V2, p1, score_commitment(70, b"s2"), 1_042)
            .unwrap();
        l2.score_reveal(V1, p1, 70, b"s1", 1_050).unwrap();
        assert_eq!(l2.score_reveal(V1, p1, 70, b"s1", 1_051).unwrap(), again);
        l2.score_reveal(V2, p1, 70, b"s2", 1_052).unwrap();

        l2.finalize(p1, 1_060).unwrap();
        assert_eq!(l2.finalize(p1, 1_061).unwrap(), again);
        l2.propagate(p1).await.unwrap();
        assert_eq!(l2.propagate(p1).await.unwrap(), again);
        assert_eq!(pair.bridge.pending(L1), 1);
    }

    #[test]
    fn test_reveal_after_window_fails_even_with_matching_hash() {
        let mut pair = Pair::new();
        pair.register_participants();
        let l2 = &mut pair.l2;

        let (p1, _) = l2.create_proposal(GOV, M, [0xAA; 32], 1_010).unwrap();
        l2.commit(M, p1, content_commitment(content_a(), b"saltA"), 1_020)
            .unwrap();
        l2.reveal(M, p1, content_a(), b"saltA", 1_030).unwrap();
        l2.score_commit(V1, p1, score_commitment(80, b"s1"), 1_040)
            .unwrap();
        l2.score_commit(V2, p1, score_commitment(90, b"s2"), 1_041)
            .unwrap();
        l2.score_reveal(V1, p1, 80, b"s1", 1_050).unwrap();

        // Reveal window opened at 1041 and lasts 600s
        let err = l2.score_reveal(V2, p1, 90, b"s2", 1_641).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PhaseNotOpen);
        assert_eq!(l2.proposal(p1).unwrap().final_score(), Some(80));
    }

    #[tokio::test]
    async fn test_node_survives_restart_mid_flow() {
        let path = std::env::temp_dir().join(format!("xcr-e2e-{}.json", uuid::Uuid::new_v4()));
        let mut pair = Pair::new();

        {
            let mut l2 = node_on(L2, L1, FileLedger::open(&path).unwrap(), &pair.bridge);
            l2.register_protocol(GOV, 1_000).unwrap();
            l2.register(M, Role::Miner, 100, 1_000).unwrap();
            l2.register(V1, Role::Validator, 50, 1_000).unwrap();
            let (p1, _) = l2.create_proposal(GOV, M, [0xAA; 32], 1_010).unwrap();
            l2.commit(M, p1, content_commitment(content_a(), b"saltA"), 1_020)
                .unwrap();
        }

        let mut l2 = ChainNode::restore(
            node_config(L2, L1),
            FileLedger::open(&path).unwrap(),
            pair.bridge.clone(),
        )
        .unwrap();
        l2.reveal(M, 1, content_a(), b"saltA", 1_030).unwrap();
        l2.score_commit(V1, 1, score_commitment(60, b"s1"), 1_040)
            .unwrap();
        l2.score_reveal(V1, 1, 60, b"s1", 1_050).unwrap();
        l2.finalize(1, 1_060).unwrap();
        l2.propagate(1).await.unwrap();

        pair.deliver_to_l1(2_000);
        assert_eq!(pair.l1.mirrored(L2, 1).unwrap().final_score(), Some(60));
        std::fs::remove_file(&path).unwrap();
    }

    #[tokio::test]
    async fn test_bridge_outage_then_recovery() {
        let mut pair = Pair::new();
        pair.register_participants();

        pair.l2.propagate_validator_set().await.unwrap();
        pair.bridge.fail_next(3);
        pair.l2.register([0x23; 20], Role::Validator, 60, 1_100).unwrap();
        let err = pair.l2.propagate_validator_set().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PropagationFailed);
        assert!(err.kind().is_retryable());

        let receipts = pair.l2.resubmit_pending().await.unwrap();
        assert_eq!(receipts.len(), 1);
        assert_eq!(receipts[0].nonce, 2);

        pair.deliver_to_l1(1_200);
        let remote = pair.l1.registry().remote_validators(L2, 1_200);
        assert_eq!(remote.len(), 3);
        assert_eq!(pair.l1.status().last_applied, 2);
    }
}
