#![allow(clippy::len_without_is_empty)]

//! Transaction bookkeeping for outstanding requests.
//!
//! Every request gets a fresh random 96-bit id registered as `Pending`. A
//! response moves it to `Matched`, the caller's timer moves it to `Expired`;
//! both are terminal. Terminal entries stay visible through [`TransactionTracker::state`]
//! until [`TransactionTracker::purge`] drops them; a `BindingSession` purges
//! before each new request.
//!
//! The tracker owns no clock. All operations take one lock over the whole
//! table and are O(1), so a single tracker may be shared across threads
//! (`Arc<TransactionTracker>`) by many sessions.

use crate::constants::TRANS_ID_LEN;
use crate::error::{Error, Result};
use crate::header::TransId;
use crate::util::print_bytes;
use log::{debug, trace};
use rand::prelude::*;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Mutex, MutexGuard};
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    Pending,
    Matched,
    Expired,
}

impl TransactionState {
    pub fn is_terminal(self) -> bool {
        !matches!(self, TransactionState::Pending)
    }
}

#[derive(Debug, Clone)]
pub struct Transaction {
    pub trans_id: TransId,
    // 创建顺序
    pub seq: u64,
    pub created: Instant,
    // 期望的响应来源
    pub peer: Option<SocketAddr>,
    pub state: TransactionState,
}

#[derive(Debug, Default)]
struct Table {
    entries: HashMap<TransId, Transaction>,
    next_seq: u64,
    pending: usize,
}

#[derive(Debug, Default)]
pub struct TransactionTracker {
    table: Mutex<Table>,
    // None: 不限制
    max_pending: Option<usize>,
}

pub fn new_trans_id() -> TransId {
    let mut trans_id = [0u8; TRANS_ID_LEN];
    rand::thread_rng().fill_bytes(&mut trans_id);
    trans_id
}

impl TransactionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_pending(max_pending: Option<usize>) -> Self {
        Self {
            table: Mutex::default(),
            max_pending,
        }
    }

    pub fn max_pending(&self) -> Option<usize> {
        self.max_pending
    }

    // 表里的数据在任何一步都不会处于中间状态, poison 之后照常使用
    fn lock(&self) -> MutexGuard<'_, Table> {
        self.table.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn begin_transaction(&self) -> Result<TransId> {
        self.begin(None)
    }

    /// Like `begin_transaction`, but `match_response_from` will only accept
    /// a response coming from `peer`.
    pub fn begin_transaction_to(&self, peer: SocketAddr) -> Result<TransId> {
        self.begin(Some(peer))
    }

    fn begin(&self, peer: Option<SocketAddr>) -> Result<TransId> {
        let mut table = self.lock();

        if let Some(max) = self.max_pending {
            if table.pending >= max {
                debug!("tracker exhausted, pending: {}", table.pending);
                return Err(Error::TrackerExhausted(max));
            }
        }

        let trans_id = loop {
            let id = new_trans_id();
            if !table.entries.contains_key(&id) {
                break id;
            }
        };

        let seq = table.next_seq;
        table.next_seq += 1;
        table.pending += 1;
        table.entries.insert(
            trans_id,
            Transaction {
                trans_id,
                seq,
                created: Instant::now(),
                peer,
                state: TransactionState::Pending,
            },
        );

        trace!("begin transaction #{}: {}", seq, print_bytes(&trans_id, "", 16));
        Ok(trans_id)
    }

    pub fn match_response(&self, trans_id: &TransId) -> bool {
        self.transition(trans_id, None, TransactionState::Matched)
    }

    pub fn match_response_from(&self, trans_id: &TransId, source: SocketAddr) -> bool {
        self.transition(trans_id, Some(source), TransactionState::Matched)
    }

    /// Returns whether a pending transaction was expired; terminal or unknown
    /// ids are left alone.
    pub fn expire(&self, trans_id: &TransId) -> bool {
        self.transition(trans_id, None, TransactionState::Expired)
    }

    /// Expires every pending transaction created before `deadline`.
    pub fn expire_before(&self, deadline: Instant) -> Vec<TransId> {
        let mut table = self.lock();
        let mut expired = vec![];

        for v in table.entries.values_mut() {
            if v.state == TransactionState::Pending && v.created < deadline {
                v.state = TransactionState::Expired;
                expired.push(v.trans_id);
            }
        }
        table.pending -= expired.len();

        if !expired.is_empty() {
            debug!("expired {} transactions", expired.len());
        }
        expired
    }

    fn transition(
        &self,
        trans_id: &TransId,
        source: Option<SocketAddr>,
        to: TransactionState,
    ) -> bool {
        let mut table = self.lock();

        let entry = match table.entries.get_mut(trans_id) {
            Some(v) if v.state == TransactionState::Pending => v,
            _ => return false,
        };

        if let (Some(peer), Some(source)) = (entry.peer, source) {
            if peer != source {
                debug!("transaction #{} expects {}, got {}", entry.seq, peer, source);
                return false;
            }
        }

        entry.state = to;
        trace!("transaction #{} -> {:?}", entry.seq, to);
        table.pending -= 1;
        true
    }

    pub fn state(&self, trans_id: &TransId) -> Option<TransactionState> {
        self.lock().entries.get(trans_id).map(|x| x.state)
    }

    pub fn get(&self, trans_id: &TransId) -> Option<Transaction> {
        self.lock().entries.get(trans_id).cloned()
    }

    pub fn pending_count(&self) -> usize {
        self.lock().pending
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    /// Drops matched and expired entries, returning how many went.
    pub fn purge(&self) -> usize {
        let mut table = self.lock();
        let before = table.entries.len();
        if before == table.pending {
            return 0;
        }
        table.entries.retain(|_, v| !v.state.is_terminal());
        before - table.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_distinct() {
        let tracker = TransactionTracker::new();
        let a = tracker.begin_transaction().unwrap();
        let b = tracker.begin_transaction().unwrap();
        assert_ne!(a, b);
        assert_eq!(tracker.pending_count(), 2);
        assert_eq!(tracker.get(&a).unwrap().seq, 0);
        assert_eq!(tracker.get(&b).unwrap().seq, 1);
    }

    #[test]
    fn test_expire_before() {
        let tracker = TransactionTracker::new();
        let a = tracker.begin_transaction().unwrap();
        let b = tracker.begin_transaction().unwrap();
        assert!(tracker.match_response(&b));

        let expired = tracker.expire_before(Instant::now() + std::time::Duration::from_secs(1));
        assert_eq!(expired, vec![a]);
        assert_eq!(tracker.state(&a), Some(TransactionState::Expired));
        assert_eq!(tracker.state(&b), Some(TransactionState::Matched));
        assert_eq!(tracker.pending_count(), 0);
    }
}
