use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::Arc;
use std::thread;
use stun_binding::transaction::{TransactionState, TransactionTracker};
use stun_binding::Error;

#[test]
pub fn test_match_exactly_once() {
    let tracker = TransactionTracker::new();
    let trans_id = tracker.begin_transaction().unwrap();

    assert_eq!(tracker.state(&trans_id), Some(TransactionState::Pending));
    assert!(tracker.match_response(&trans_id));
    assert!(!tracker.match_response(&trans_id));
    assert_eq!(tracker.state(&trans_id), Some(TransactionState::Matched));
}

#[test]
pub fn test_never_issued_id() {
    let tracker = TransactionTracker::new();
    let _ = tracker.begin_transaction().unwrap();

    assert!(!tracker.match_response(&[0_u8; 12]));
    assert!(!tracker.expire(&[0_u8; 12]));
    assert_eq!(tracker.state(&[0_u8; 12]), None);
}

#[test]
pub fn test_terminal_states_are_final() {
    let tracker = TransactionTracker::new();

    let matched = tracker.begin_transaction().unwrap();
    assert!(tracker.match_response(&matched));
    assert!(!tracker.expire(&matched));
    assert_eq!(tracker.state(&matched), Some(TransactionState::Matched));

    let expired = tracker.begin_transaction().unwrap();
    assert!(tracker.expire(&expired));
    assert!(!tracker.match_response(&expired));
    assert_eq!(tracker.state(&expired), Some(TransactionState::Expired));

    assert_eq!(tracker.pending_count(), 0);
}

#[test]
pub fn test_purge() {
    let tracker = TransactionTracker::new();
    let a = tracker.begin_transaction().unwrap();
    let b = tracker.begin_transaction().unwrap();
    let c = tracker.begin_transaction().unwrap();

    tracker.match_response(&a);
    tracker.expire(&b);

    assert_eq!(tracker.len(), 3);
    assert_eq!(tracker.purge(), 2);
    assert_eq!(tracker.len(), 1);
    assert_eq!(tracker.state(&a), None);
    assert_eq!(tracker.state(&c), Some(TransactionState::Pending));
}

#[test]
pub fn test_bound() {
    let tracker = TransactionTracker::with_max_pending(Some(2));
    let a = tracker.begin_transaction().unwrap();
    let _b = tracker.begin_transaction().unwrap();

    assert_eq!(tracker.begin_transaction(), Err(Error::TrackerExhausted(2)));

    tracker.match_response(&a);
    assert!(tracker.begin_transaction().is_ok());
}

#[test]
pub fn test_expected_peer() {
    let server: SocketAddr = "198.51.100.1:3478".parse().unwrap();
    let other: SocketAddr = "198.51.100.2:3478".parse().unwrap();

    let tracker = TransactionTracker::new();
    let trans_id = tracker.begin_transaction_to(server).unwrap();

    assert!(!tracker.match_response_from(&trans_id, other));
    assert_eq!(tracker.state(&trans_id), Some(TransactionState::Pending));
    assert!(tracker.match_response_from(&trans_id, server));

    // 没有记录 peer 时任何来源都接受
    let any = tracker.begin_transaction().unwrap();
    assert!(tracker.match_response_from(&any, other));
}

#[test]
pub fn test_concurrent_use() {
    let tracker = Arc::new(TransactionTracker::new());
    let mut handles = vec![];

    for _ in 0..8 {
        let tracker = tracker.clone();
        handles.push(thread::spawn(move || {
            let mut ids = vec![];
            for i in 0..200 {
                let id = tracker.begin_transaction().unwrap();
                if i % 2 == 0 {
                    assert!(tracker.match_response(&id));
                } else {
                    assert!(tracker.expire(&id));
                }
                ids.push(id);
            }
            ids
        }));
    }

    let mut all = HashSet::new();
    for h in handles {
        for id in h.join().unwrap() {
            assert!(all.insert(id));
        }
    }

    assert_eq!(all.len(), 1600);
    assert_eq!(tracker.pending_count(), 0);
    assert_eq!(tracker.len(), 1600);
}
