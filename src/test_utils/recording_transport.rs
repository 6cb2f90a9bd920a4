//! In-memory transport recording every request it is asked to send.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use crate::splunk_handler::{HecRequest, Transport, TransportError};

/// Transport answering from a scripted list of responses.
///
/// Once the script runs out every request succeeds with `200`.
#[derive(Debug, Default)]
pub struct RecordingTransport {
    state: Mutex<State>,
    arrived: Condvar,
}

#[derive(Debug, Default)]
struct State {
    requests: Vec<HecRequest>,
    responses: VecDeque<Result<u16, TransportError>>,
}

impl RecordingTransport {
    pub fn with_responses(
        responses: impl IntoIterator<Item = Result<u16, TransportError>>,
    ) -> Self {
        Self {
            state: Mutex::new(State {
                requests: Vec::new(),
                responses: responses.into_iter().collect(),
            }),
            arrived: Condvar::new(),
        }
    }

    pub fn requests(&self) -> Vec<HecRequest> {
        self.state.lock().requests.clone()
    }

    pub fn request_count(&self) -> usize {
        self.state.lock().requests.len()
    }

    /// Block until at least `count` requests were recorded or `timeout`
    /// elapses. Returns whether the count was reached.
    pub fn wait_for_requests(&self, count: usize, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut state = self.state.lock();
        while state.requests.len() < count {
            if self.arrived.wait_until(&mut state, deadline).timed_out() {
                return state.requests.len() >= count;
            }
        }
        true
    }
}

impl Transport for RecordingTransport {
    fn post(&self, request: &HecRequest) -> Result<u16, TransportError> {
        let mut state = self.state.lock();
        state.requests.push(request.clone());
        let response = state.responses.pop_front().unwrap_or(Ok(200));
        self.arrived.notify_all();
        response
    }
}
