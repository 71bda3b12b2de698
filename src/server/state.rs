use crate::common::data::{CannedResponse, CapturedRequest};
use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard, PoisonError},
};

/// The two independent keyspaces of the mock server. A GET key and a POST key never collide,
/// even when their text is identical.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Keyspace {
    Get,
    Post,
}

#[derive(Default)]
pub(crate) struct MockServerState {
    get_requests: HashMap<String, Vec<CapturedRequest>>,
    get_responses: HashMap<String, CannedResponse>,
    post_requests: HashMap<String, Vec<CapturedRequest>>,
    post_responses: HashMap<String, CannedResponse>,
}

impl MockServerState {
    pub fn new() -> Self {
        Self::default()
    }

    fn requests_mut(&mut self, keyspace: Keyspace) -> &mut HashMap<String, Vec<CapturedRequest>> {
        match keyspace {
            Keyspace::Get => &mut self.get_requests,
            Keyspace::Post => &mut self.post_requests,
        }
    }

    fn requests(&self, keyspace: Keyspace) -> &HashMap<String, Vec<CapturedRequest>> {
        match keyspace {
            Keyspace::Get => &self.get_requests,
            Keyspace::Post => &self.post_requests,
        }
    }

    fn responses(&self, keyspace: Keyspace) -> &HashMap<String, CannedResponse> {
        match keyspace {
            Keyspace::Get => &self.get_responses,
            Keyspace::Post => &self.post_responses,
        }
    }

    fn responses_mut(&mut self, keyspace: Keyspace) -> &mut HashMap<String, CannedResponse> {
        match keyspace {
            Keyspace::Get => &mut self.get_responses,
            Keyspace::Post => &mut self.post_responses,
        }
    }
}

pub(crate) trait StateManager {
    fn reset(&self);

    fn set_response(&self, keyspace: Keyspace, key: String, response: CannedResponse);

    fn requests(&self, keyspace: Keyspace, key: &str) -> Vec<CapturedRequest>;

    /// Appends `req` to the captured requests of `key` and returns the response registered
    /// for `key`, if any. Both happen under the same lock.
    fn record(
        &self,
        keyspace: Keyspace,
        key: String,
        req: CapturedRequest,
    ) -> Option<CannedResponse>;
}

pub(crate) struct KeyedStateManager {
    state: Mutex<MockServerState>,
}

impl KeyedStateManager {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockServerState::new()),
        }
    }

    // A panic while holding the lock cannot leave the maps half-updated (every mutation is a
    // single insert or push), so a poisoned lock is still safe to use.
    fn lock(&self) -> MutexGuard<'_, MockServerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for KeyedStateManager {
    fn default() -> Self {
        KeyedStateManager::new()
    }
}

impl StateManager for KeyedStateManager {
    fn reset(&self) {
        let mut state = self.lock();
        *state = MockServerState::new();

        tracing::debug!("Cleared all registered responses and captured requests");
    }

    fn set_response(&self, keyspace: Keyspace, key: String, response: CannedResponse) {
        let mut state = self.lock();

        tracing::debug!(
            "Registering {:?} response with status {} for key '{}'",
            keyspace,
            response.status,
            key
        );

        state.responses_mut(keyspace).insert(key, response);
    }

    fn requests(&self, keyspace: Keyspace, key: &str) -> Vec<CapturedRequest> {
        let state = self.lock();
        state
            .requests(keyspace)
            .get(key)
            .cloned()
            .unwrap_or_default()
    }

    fn record(
        &self,
        keyspace: Keyspace,
        key: String,
        req: CapturedRequest,
    ) -> Option<CannedResponse> {
        let mut state = self.lock();

        let response = state.responses(keyspace).get(&key).cloned();

        tracing::debug!(
            "Captured {:?} request for key '{}' (response registered: {})",
            keyspace,
            key,
            response.is_some()
        );

        state.requests_mut(keyspace).entry(key).or_default().push(req);

        response
    }
}
