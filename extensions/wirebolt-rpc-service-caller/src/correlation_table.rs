use crate::RpcCallerError;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::time::Instant;
use wirebolt::rpc::RpcResponse;

pub type PendingResult = Result<RpcResponse, RpcCallerError>;

#[derive(Debug)]
struct PendingEntry {
    generation: u64,
    sender: oneshot::Sender<PendingResult>,
    deadline: Instant,
    timeout: Duration,
}

/// Maps in-flight request ids to the callers waiting on them.
///
/// Removing a row is the only way to resolve it, and every resolution path
/// (response, deadline, connection loss, cancellation) goes through a
/// `DashMap` removal. Whichever path removes the row resolves the caller, so
/// each caller is resolved at most once and a row never outlives its call.
#[derive(Debug, Default)]
pub struct CorrelationTable {
    entries: DashMap<String, PendingEntry>,
    next_generation: AtomicU64,
}

impl CorrelationTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a row for `request_id` that expires at `deadline`.
    pub fn register(
        &self,
        request_id: &str,
        deadline: Instant,
    ) -> Result<oneshot::Receiver<PendingResult>, RpcCallerError> {
        self.register_row(request_id, deadline)
            .map(|(_, receiver)| receiver)
    }

    /// Like [`register`](Self::register), also returning the row's generation.
    ///
    /// A request id can be reused once its row is gone; the generation tells
    /// the new row apart from the old one in [`remove_row`](Self::remove_row)
    /// and [`expire_row`](Self::expire_row).
    pub fn register_row(
        &self,
        request_id: &str,
        deadline: Instant,
    ) -> Result<(u64, oneshot::Receiver<PendingResult>), RpcCallerError> {
        match self.entries.entry(request_id.to_string()) {
            Entry::Occupied(_) => Err(RpcCallerError::DuplicateRequestId(request_id.to_string())),
            Entry::Vacant(entry) => {
                let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
                let (sender, receiver) = oneshot::channel();
                entry.insert(PendingEntry {
                    generation,
                    sender,
                    deadline,
                    timeout: deadline.saturating_duration_since(Instant::now()),
                });
                Ok((generation, receiver))
            }
        }
    }

    /// Resolves the row matching `response.request_id`. A response with no
    /// row (late, duplicate or unknown) is dropped.
    pub fn complete(&self, response: RpcResponse) -> bool {
        match self.entries.remove(&response.request_id) {
            Some((_, entry)) => {
                let _ = entry.sender.send(Ok(response));
                true
            }
            None => {
                tracing::debug!(
                    "Dropping response for unknown or expired request {}",
                    response.request_id
                );
                false
            }
        }
    }

    pub fn fail(&self, request_id: &str, error: RpcCallerError) -> bool {
        match self.entries.remove(request_id) {
            Some((_, entry)) => {
                let _ = entry.sender.send(Err(error));
                true
            }
            None => false,
        }
    }

    /// Resolves the row with a timeout failure if it is still pending.
    pub fn expire(&self, request_id: &str) -> bool {
        match self.entries.remove(request_id) {
            Some((id, entry)) => {
                let _ = entry.sender.send(Err(RpcCallerError::Timeout {
                    request_id: id,
                    timeout: entry.timeout,
                }));
                true
            }
            None => false,
        }
    }

    /// Expires the row only if it is still the one registered as `generation`.
    pub fn expire_row(&self, request_id: &str, generation: u64) -> bool {
        match self
            .entries
            .remove_if(request_id, |_, entry| entry.generation == generation)
        {
            Some((id, entry)) => {
                let _ = entry.sender.send(Err(RpcCallerError::Timeout {
                    request_id: id,
                    timeout: entry.timeout,
                }));
                true
            }
            None => false,
        }
    }

    /// Removes the row without resolving it, e.g. after a failed write.
    pub fn remove(&self, request_id: &str) -> bool {
        self.entries.remove(request_id).is_some()
    }

    /// Removes the row only if it is still the one registered as `generation`.
    pub fn remove_row(&self, request_id: &str, generation: u64) -> bool {
        self.entries
            .remove_if(request_id, |_, entry| entry.generation == generation)
            .is_some()
    }

    /// Expires every row whose deadline is at or before `now`.
    pub fn sweep_expired(&self, now: Instant) -> usize {
        let expired: Vec<String> = self
            .entries
            .iter()
            .filter(|entry| entry.deadline <= now)
            .map(|entry| entry.key().clone())
            .collect();

        let mut count = 0;
        for request_id in expired {
            if let Some((id, entry)) = self
                .entries
                .remove_if(&request_id, |_, entry| entry.deadline <= now)
            {
                let _ = entry.sender.send(Err(RpcCallerError::Timeout {
                    request_id: id,
                    timeout: entry.timeout,
                }));
                count += 1;
            }
        }
        count
    }

    /// Resolves every pending row with the error built by `make_error`.
    pub fn fail_all<F>(&self, make_error: F) -> usize
    where
        F: Fn(&str) -> RpcCallerError,
    {
        let request_ids: Vec<String> = self
            .entries
            .iter()
            .map(|entry| entry.key().clone())
            .collect();

        let mut count = 0;
        for request_id in request_ids {
            if let Some((id, entry)) = self.entries.remove(&request_id) {
                let _ = entry.sender.send(Err(make_error(&id)));
                count += 1;
            }
        }
        count
    }

    pub fn contains(&self, request_id: &str) -> bool {
        self.entries.contains_key(request_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
