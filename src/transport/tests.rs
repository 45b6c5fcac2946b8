//! Transport Module Tests
//!
//! ## Test Scopes
//! - **InMemoryNetwork**: FIFO delivery, failure injection, random loss and counters.
//! - **UdpTransport**: Real datagrams between two sockets on loopback.

#[cfg(test)]
mod tests {
    use crate::ring::types::Address;
    use crate::transport::{InMemoryNetwork, NetworkStats, Transport, UdpTransport};
    use std::time::Duration;

    fn addr(s: &str) -> Address {
        Address::new(s)
    }

    // ============================================================
    // IN-MEMORY NETWORK
    // ============================================================

    #[test]
    fn test_memory_network_delivers_in_fifo_order() {
        let net = InMemoryNetwork::new();
        let (a, b) = (addr("a"), addr("b"));

        for i in 0..5 {
            net.send(&a, &b, format!("msg-{}", i)).unwrap();
        }

        let received: Vec<String> = net
            .receive(&b)
            .into_iter()
            .map(|raw| String::from_utf8(raw).unwrap())
            .collect();

        assert_eq!(received, vec!["msg-0", "msg-1", "msg-2", "msg-3", "msg-4"]);
        assert!(net.receive(&b).is_empty(), "Queue should be drained");
        assert!(net.receive(&a).is_empty());
    }

    #[test]
    fn test_memory_network_drops_traffic_of_failed_node() {
        let net = InMemoryNetwork::new();
        let (a, b, c) = (addr("a"), addr("b"), addr("c"));

        net.send(&a, &c, "queued-before-failure".to_string()).unwrap();
        net.fail(&c);

        net.send(&a, &c, "to-failed".to_string()).unwrap();
        net.send(&c, &b, "from-failed".to_string()).unwrap();
        net.send(&a, &b, "healthy".to_string()).unwrap();

        assert!(net.receive(&c).is_empty());
        assert_eq!(net.receive(&b).len(), 1);
        assert_eq!(
            net.stats(),
            NetworkStats {
                sent: 4,
                delivered: 1,
                dropped: 3
            }
        );
    }

    #[test]
    fn test_memory_network_recover() {
        let net = InMemoryNetwork::new();
        let (a, b) = (addr("a"), addr("b"));

        net.fail(&b);
        assert!(net.is_failed(&b));
        net.recover(&b);
        assert!(!net.is_failed(&b));

        net.send(&a, &b, "hello".to_string()).unwrap();
        assert_eq!(net.queued(&b), 1);
        assert_eq!(net.receive(&b).len(), 1);
    }

    #[test]
    fn test_memory_network_drop_probability() {
        let net = InMemoryNetwork::new();
        let (a, b) = (addr("a"), addr("b"));

        net.set_drop_probability(1.0);
        for _ in 0..20 {
            net.send(&a, &b, "lost".to_string()).unwrap();
        }
        assert!(net.receive(&b).is_empty());
        assert_eq!(net.stats().dropped, 20);

        net.set_drop_probability(0.0);
        net.send(&a, &b, "kept".to_string()).unwrap();
        assert_eq!(net.receive(&b).len(), 1);
    }

    // ============================================================
    // UDP TRANSPORT
    // ============================================================

    #[tokio::test]
    async fn test_udp_transport_roundtrip() {
        let a = UdpTransport::bind("127.0.0.1:0".parse().unwrap()).await.unwrap();
        let b = UdpTransport::bind("127.0.0.1:0".parse().unwrap()).await.unwrap();

        let a_addr = Address::new(a.local_addr().unwrap().to_string());
        let b_addr = Address::new(b.local_addr().unwrap().to_string());

        a.send(&a_addr, &b_addr, "ping".to_string()).unwrap();

        let mut received = Vec::new();
        for _ in 0..50 {
            received.extend(b.receive(&b_addr));
            if !received.is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }

        assert_eq!(received, vec![b"ping".to_vec()]);
        assert!(a.receive(&a_addr).is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_udp_transport_delivers_burst_sent_right_after_bind() {
        let a = UdpTransport::bind("127.0.0.1:0".parse().unwrap()).await.unwrap();
        let b = UdpTransport::bind("127.0.0.1:0".parse().unwrap()).await.unwrap();

        let a_addr = Address::new(a.local_addr().unwrap().to_string());
        let b_addr = Address::new(b.local_addr().unwrap().to_string());

        for i in 0..20 {
            a.send(&a_addr, &b_addr, format!("msg-{}", i)).unwrap();
        }

        let mut received = Vec::new();
        for _ in 0..100 {
            received.extend(b.receive(&b_addr));
            if received.len() == 20 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }

        assert_eq!(received.len(), 20, "Every queued datagram should arrive");
        assert!(received.contains(&b"msg-0".to_vec()));
    }

    #[tokio::test]
    async fn test_udp_transport_rejects_non_socket_address() {
        let a = UdpTransport::bind("127.0.0.1:0".parse().unwrap()).await.unwrap();
        let a_addr = Address::new(a.local_addr().unwrap().to_string());

        let result = a.send(&a_addr, &addr("not-an-address"), "x".to_string());
        assert!(result.is_err());
    }
}
