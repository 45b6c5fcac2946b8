//! Replication Module Tests
//!
//! ## Test Scopes
//! - **Tracker**: Id allocation, response counting, stale replies, timeout sweep.
//! - **Quorum**: Commit on two successes, failure on three responses without.
//! - **Protocol**: JSON shape of requests and replies.
//! - **Stabilizer**: Re-replication fires once per successor change.

#[cfg(test)]
mod tests {
    use crate::clock::RoundClock;
    use crate::error::KvError;
    use crate::replication::{
        Coordinator, Message, MessageBody, Stabilizer, TransactionTracker, TxnId, Verdict,
    };
    use crate::ring::{Address, HashRing, ReplicaRole};
    use crate::storage::{LocalStore, OpKind, OutcomeJournal, OutcomeScope};
    use crate::transport::{InMemoryNetwork, Transport};
    use std::sync::Arc;

    fn addr(s: &str) -> Address {
        Address::new(s)
    }

    fn five_node_ring() -> HashRing {
        HashRing::from_positions(vec![
            (addr("n1"), 100),
            (addr("n2"), 200),
            (addr("n3"), 300),
            (addr("n4"), 400),
            (addr("n5"), 450),
        ])
    }

    struct Fixture {
        net: Arc<InMemoryNetwork>,
        journal: Arc<OutcomeJournal>,
        clock: Arc<RoundClock>,
        coordinator: Coordinator,
    }

    fn fixture(local: &str) -> Fixture {
        let net = InMemoryNetwork::new();
        let journal = OutcomeJournal::new();
        let clock = RoundClock::new();
        let coordinator = Coordinator::new(addr(local), net.clone(), journal.clone(), clock.clone());
        Fixture {
            net,
            journal,
            clock,
            coordinator,
        }
    }

    fn drain(net: &InMemoryNetwork, at: &str) -> Vec<Message> {
        net.receive(&addr(at))
            .iter()
            .map(|raw| Message::decode(raw).unwrap())
            .collect()
    }

    // ============================================================
    // TRACKER
    // ============================================================

    #[test]
    fn test_tracker_allocates_increasing_ids() {
        let mut tracker = TransactionTracker::default();
        let a = tracker.begin(OpKind::Create, "a", Some("1"), 0);
        let b = tracker.begin(OpKind::Read, "b", None, 0);

        assert_eq!(a, TxnId(1));
        assert_eq!(b, TxnId(2));
        assert_eq!(tracker.len(), 2);
        assert_eq!(tracker.next_id(), TxnId(3));

        let txn = tracker.get(a).unwrap();
        assert_eq!(txn.total_responses, 0);
        assert_eq!(txn.success_responses, 0);
        assert_eq!(txn.value.as_deref(), Some("1"));
    }

    #[test]
    fn test_tracker_counts_never_exceed_replication_factor() {
        let mut tracker = TransactionTracker::new(7);
        let id = tracker.begin(OpKind::Update, "k", Some("v"), 0);

        for _ in 0..5 {
            tracker.record_response(id, true, None).unwrap();
        }

        let txn = tracker.get(id).unwrap();
        assert_eq!(txn.total_responses, 3);
        assert_eq!(txn.success_responses, 3);
        assert!(txn.success_responses <= txn.total_responses);
    }

    #[test]
    fn test_tracker_rejects_unknown_transaction() {
        let mut tracker = TransactionTracker::default();
        let err = tracker.record_response(TxnId(42), true, None).unwrap_err();
        assert_eq!(err, KvError::StaleTransaction(TxnId(42)));
        assert!(tracker.is_empty());
    }

    #[test]
    fn test_tracker_keeps_value_from_successful_read_only() {
        let mut tracker = TransactionTracker::default();
        let id = tracker.begin(OpKind::Read, "k", None, 0);

        tracker.record_response(id, false, None).unwrap();
        assert_eq!(tracker.get(id).unwrap().value, None);

        tracker
            .record_response(id, true, Some("found".to_string()))
            .unwrap();
        assert_eq!(tracker.get(id).unwrap().value.as_deref(), Some("found"));
    }

    #[test]
    fn test_sweep_saturates_overdue_transactions() {
        let mut tracker = TransactionTracker::default();
        let old = tracker.begin(OpKind::Read, "old", None, 0);
        let fresh = tracker.begin(OpKind::Read, "fresh", None, 2);
        tracker.record_response(old, true, Some("v".to_string())).unwrap();

        // 4 - 0 > 3, but 4 - 2 is not
        let swept = tracker.sweep_timeouts(4, 3);
        assert_eq!(swept, vec![old]);

        let txn = tracker.get(old).unwrap();
        assert_eq!(txn.total_responses, 3);
        assert_eq!(txn.success_responses, 1);
        assert_eq!(txn.verdict(), Verdict::Failed);
        assert_eq!(tracker.get(fresh).unwrap().total_responses, 0);
    }

    #[test]
    fn test_verdict_boundaries() {
        let mut tracker = TransactionTracker::default();
        let id = tracker.begin(OpKind::Delete, "k", None, 0);

        tracker.record_response(id, true, None).unwrap();
        assert_eq!(tracker.get(id).unwrap().verdict(), Verdict::Pending);

        tracker.record_response(id, false, None).unwrap();
        assert_eq!(tracker.get(id).unwrap().verdict(), Verdict::Pending);

        tracker.record_response(id, true, None).unwrap();
        assert_eq!(tracker.get(id).unwrap().verdict(), Verdict::Committed);
    }

    // ============================================================
    // QUORUM
    // ============================================================

    #[test]
    fn test_submit_fans_out_to_replica_triple() {
        let mut f = fixture("n1");
        let ring = five_node_ring();

        // Position 250 belongs to n3, followed by n4 and n5.
        let key = (0..100_000)
            .map(|i| format!("key-{}", i))
            .find(|k| {
                let p = crate::ring::position_of(k);
                p > 200 && p <= 300
            })
            .unwrap();

        let txn = f
            .coordinator
            .submit(&ring, OpKind::Create, &key, Some("v"))
            .unwrap();

        for (node, role) in [
            ("n3", ReplicaRole::Primary),
            ("n4", ReplicaRole::Secondary),
            ("n5", ReplicaRole::Tertiary),
        ] {
            let messages = drain(&f.net, node);
            assert_eq!(messages.len(), 1, "{} should get exactly one request", node);
            assert_eq!(messages[0].txn, txn);
            assert_eq!(messages[0].from, addr("n1"));
            assert_eq!(
                messages[0].body,
                MessageBody::Create {
                    key: key.clone(),
                    value: "v".to_string(),
                    role
                }
            );
        }
        assert!(drain(&f.net, "n1").is_empty());
        assert!(drain(&f.net, "n2").is_empty());
        assert!(f.coordinator.is_pending(txn));
    }

    #[test]
    fn test_submit_refused_on_small_ring() {
        let mut f = fixture("n1");
        let ring = HashRing::from_positions(vec![(addr("n1"), 10), (addr("n2"), 20)]);

        let err = f
            .coordinator
            .submit(&ring, OpKind::Read, "k", None)
            .unwrap_err();
        assert_eq!(
            err,
            KvError::UnderReplicated {
                members: 2,
                required: 3
            }
        );
        assert_eq!(f.coordinator.pending(), 0);
        assert_eq!(f.net.stats().sent, 0);
    }

    #[test]
    fn test_two_successes_commit_and_log_once() {
        let mut f = fixture("n1");
        let txn = f
            .coordinator
            .submit(&five_node_ring(), OpKind::Update, "k", Some("new"))
            .unwrap();

        assert_eq!(f.coordinator.on_reply(txn, true, None), Some(Verdict::Pending));
        assert_eq!(f.coordinator.on_reply(txn, true, None), Some(Verdict::Committed));
        assert!(!f.coordinator.is_pending(txn));

        // Late third reply is stale.
        assert_eq!(f.coordinator.on_reply(txn, false, None), None);

        let quorum = f.journal.matching(OutcomeScope::Quorum, OpKind::Update, true);
        assert_eq!(quorum.len(), 1);
        assert_eq!(quorum[0].txn, txn);
        assert_eq!(quorum[0].value.as_deref(), Some("new"));
        assert_eq!(f.journal.len(), 1);
    }

    #[test]
    fn test_three_responses_without_quorum_fail() {
        let mut f = fixture("n1");
        let txn = f
            .coordinator
            .submit(&five_node_ring(), OpKind::Create, "k", Some("v"))
            .unwrap();

        assert_eq!(f.coordinator.on_reply(txn, true, None), Some(Verdict::Pending));
        assert_eq!(f.coordinator.on_reply(txn, false, None), Some(Verdict::Pending));
        assert_eq!(f.coordinator.on_reply(txn, false, None), Some(Verdict::Failed));

        let outcome = f.journal.quorum_outcome(&addr("n1"), txn).unwrap();
        assert!(!outcome.success);
        assert_eq!(outcome.op, OpKind::Create);
    }

    #[test]
    fn test_read_commit_carries_replica_value() {
        let mut f = fixture("n1");
        let txn = f
            .coordinator
            .submit(&five_node_ring(), OpKind::Read, "k", None)
            .unwrap();

        f.coordinator.on_reply(txn, false, None);
        f.coordinator.on_reply(txn, true, Some("v".to_string()));
        assert_eq!(
            f.coordinator.on_reply(txn, true, Some("v".to_string())),
            Some(Verdict::Committed)
        );

        let outcome = f.journal.quorum_outcome(&addr("n1"), txn).unwrap();
        assert!(outcome.success);
        assert_eq!(outcome.value.as_deref(), Some("v"));
    }

    #[test]
    fn test_sweep_fails_transaction_with_single_response() {
        let mut f = fixture("n1");
        let txn = f
            .coordinator
            .submit(&five_node_ring(), OpKind::Read, "k", None)
            .unwrap();
        f.coordinator.on_reply(txn, true, Some("v".to_string()));

        f.clock.set(3);
        assert!(f.coordinator.sweep(3).is_empty());

        f.clock.set(4);
        assert_eq!(f.coordinator.sweep(3), vec![(txn, Verdict::Failed)]);
        assert_eq!(f.coordinator.pending(), 0);

        let outcome = f.journal.quorum_outcome(&addr("n1"), txn).unwrap();
        assert!(!outcome.success);
        assert_eq!(outcome.value, None, "Failed reads report no value");
    }

    #[test]
    fn test_sweep_fails_every_overdue_transaction() {
        let mut f = fixture("n1");
        let ring = five_node_ring();
        let a = f.coordinator.submit(&ring, OpKind::Delete, "a", None).unwrap();
        let b = f.coordinator.submit(&ring, OpKind::Delete, "b", None).unwrap();
        f.coordinator.on_reply(a, true, None);

        f.clock.set(10);
        let verdicts = f.coordinator.sweep(3);
        assert_eq!(verdicts, vec![(a, Verdict::Failed), (b, Verdict::Failed)]);
        assert_eq!(
            f.journal.count(OutcomeScope::Quorum, OpKind::Delete, false),
            2
        );
    }

    #[test]
    fn test_serve_replies_to_origin() {
        let f = fixture("n2");
        let mut store = LocalStore::new(addr("n2"), f.journal.clone());

        f.coordinator
            .serve_create(&mut store, &addr("n1"), TxnId(5), "k", "v");
        f.coordinator.serve_read(&store, &addr("n1"), TxnId(6), "k");
        f.coordinator.serve_read(&store, &addr("n1"), TxnId(7), "missing");
        f.coordinator
            .serve_update(&mut store, &addr("n1"), TxnId(8), "missing", "v");
        f.coordinator
            .serve_delete(&mut store, &addr("n1"), TxnId(9), "k");

        let bodies: Vec<(TxnId, MessageBody)> = drain(&f.net, "n1")
            .into_iter()
            .map(|m| (m.txn, m.body))
            .collect();
        assert_eq!(
            bodies,
            vec![
                (TxnId(5), MessageBody::Reply { success: true }),
                (
                    TxnId(6),
                    MessageBody::ReadReply {
                        value: Some("v".to_string())
                    }
                ),
                (TxnId(7), MessageBody::ReadReply { value: None }),
                (TxnId(8), MessageBody::Reply { success: false }),
                (TxnId(9), MessageBody::Reply { success: true }),
            ]
        );
        assert!(store.is_empty());
        assert_eq!(f.journal.len(), 5, "Each served request logs a replica outcome");
    }

    // ============================================================
    // PROTOCOL
    // ============================================================

    #[test]
    fn test_message_json_shape() {
        let message = Message::new(
            TxnId(3),
            addr("10.0.0.1:5000"),
            MessageBody::request(OpKind::Update, "k", Some("v"), ReplicaRole::Secondary),
        );
        let json: serde_json::Value = serde_json::from_str(&message.encode().unwrap()).unwrap();

        assert_eq!(json["type"], "UPDATE");
        assert_eq!(json["txn"], 3);
        assert_eq!(json["from"], "10.0.0.1:5000");
        assert_eq!(json["key"], "k");
        assert_eq!(json["value"], "v");
        assert_eq!(json["role"], "SECONDARY");
    }

    #[test]
    fn test_read_reply_without_value_decodes_as_miss() {
        let raw = br#"{"type":"READREPLY","txn":1,"from":"n2"}"#;
        let message = Message::decode(raw).unwrap();
        assert_eq!(message.body, MessageBody::ReadReply { value: None });
        assert!(message.body.is_reply());
    }

    #[test]
    fn test_request_helper_drops_value_for_read_and_delete() {
        let read = MessageBody::request(OpKind::Read, "k", Some("ignored"), ReplicaRole::Primary);
        assert_eq!(
            read,
            MessageBody::Read {
                key: "k".to_string(),
                role: ReplicaRole::Primary
            }
        );
        assert_eq!(read.op(), Some(OpKind::Read));
        assert_eq!(MessageBody::Reply { success: true }.op(), None);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(
            Message::decode(b"{\"type\":\"PING\"}"),
            Err(KvError::Codec(_))
        ));
        assert!(Message::decode(b"").is_err());
    }

    // ============================================================
    // STABILIZER
    // ============================================================

    #[test]
    fn test_stabilizer_replicates_once_per_successor_change() {
        let mut f = fixture("n1");
        let mut store = LocalStore::new(addr("n1"), f.journal.clone());
        store.create(TxnId(0), "a", "1").unwrap();
        store.create(TxnId(0), "b", "2").unwrap();

        let mut stabilizer = Stabilizer::new();
        let mut ring = five_node_ring();

        assert_eq!(
            stabilizer.on_ring_refresh(&ring, &addr("n1"), &store, &mut f.coordinator),
            2
        );
        assert_eq!(stabilizer.replicas(), Some(&[addr("n2"), addr("n3")]));
        assert_eq!(f.coordinator.pending(), 2);

        // Same successors: nothing to do.
        assert_eq!(
            stabilizer.on_ring_refresh(&ring, &addr("n1"), &store, &mut f.coordinator),
            0
        );

        // n2 leaves, so n3 and n4 become the successors.
        ring = HashRing::from_positions(vec![
            (addr("n1"), 100),
            (addr("n3"), 300),
            (addr("n4"), 400),
            (addr("n5"), 450),
        ]);
        assert_eq!(
            stabilizer.on_ring_refresh(&ring, &addr("n1"), &store, &mut f.coordinator),
            2
        );
        assert_eq!(stabilizer.replicas(), Some(&[addr("n3"), addr("n4")]));
        assert_eq!(f.coordinator.pending(), 4);
    }

    #[test]
    fn test_stabilizer_skips_small_ring_and_absent_self() {
        let mut f = fixture("n9");
        let mut store = LocalStore::new(addr("n9"), f.journal.clone());
        store.create(TxnId(0), "a", "1").unwrap();
        let mut stabilizer = Stabilizer::new();

        let small = HashRing::from_positions(vec![(addr("n9"), 1), (addr("n2"), 2)]);
        assert_eq!(
            stabilizer.on_ring_refresh(&small, &addr("n9"), &store, &mut f.coordinator),
            0
        );
        assert_eq!(stabilizer.replicas(), None);

        assert_eq!(
            stabilizer.on_ring_refresh(&five_node_ring(), &addr("n9"), &store, &mut f.coordinator),
            0
        );
        assert_eq!(stabilizer.replicas(), None);
    }

    #[test]
    fn test_stabilizer_with_empty_store_records_successors() {
        let mut f = fixture("n5");
        let store = LocalStore::new(addr("n5"), f.journal.clone());
        let mut stabilizer = Stabilizer::new();

        assert_eq!(
            stabilizer.on_ring_refresh(&five_node_ring(), &addr("n5"), &store, &mut f.coordinator),
            0
        );
        // Successors of the last member wrap around to the start.
        assert_eq!(stabilizer.replicas(), Some(&[addr("n1"), addr("n2")]));
    }
}
