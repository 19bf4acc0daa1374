//! Shared mocks for integration tests

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::broadcast;

use callbridge_call_core::{
    CallStatusInfo, CallerIdDirectory, CallerIdPreference, ChannelEvent, ControllerErrorInfo,
    ControllerEventHandler, InitiateCallRequest, InitiateCallResponse, ProviderCallStatus,
    RealtimeChannel, TelephonyProvider, TranscriptSegment, VerifiedCallerId,
};

pub fn verified(number: &str) -> VerifiedCallerId {
    VerifiedCallerId {
        phone_number: number.to_string(),
        verified: true,
    }
}

pub fn unverified(number: &str) -> VerifiedCallerId {
    VerifiedCallerId {
        phone_number: number.to_string(),
        verified: false,
    }
}

/// Scriptable telephony provider
pub struct MockProvider {
    pub initiate_result: Mutex<Result<InitiateCallResponse, String>>,
    pub terminate_error: Mutex<Option<String>>,
    pub initiate_count: AtomicUsize,
    pub terminate_calls: Mutex<Vec<String>>,
    pub initiate_requests: Mutex<Vec<InitiateCallRequest>>,
}

impl MockProvider {
    pub fn returning(response: InitiateCallResponse) -> Self {
        Self {
            initiate_result: Mutex::new(Ok(response)),
            terminate_error: Mutex::new(None),
            initiate_count: AtomicUsize::new(0),
            terminate_calls: Mutex::new(Vec::new()),
            initiate_requests: Mutex::new(Vec::new()),
        }
    }

    pub fn rejecting(reason: &str) -> Self {
        Self {
            initiate_result: Mutex::new(Err(reason.to_string())),
            terminate_error: Mutex::new(None),
            initiate_count: AtomicUsize::new(0),
            terminate_calls: Mutex::new(Vec::new()),
            initiate_requests: Mutex::new(Vec::new()),
        }
    }

    pub fn initiations(&self) -> usize {
        self.initiate_count.load(Ordering::SeqCst)
    }

    pub fn terminations(&self) -> Vec<String> {
        self.terminate_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl TelephonyProvider for MockProvider {
    async fn initiate_call(
        &self,
        request: InitiateCallRequest,
    ) -> Result<InitiateCallResponse, anyhow::Error> {
        self.initiate_count.fetch_add(1, Ordering::SeqCst);
        self.initiate_requests.lock().unwrap().push(request);
        self.initiate_result
            .lock()
            .unwrap()
            .clone()
            .map_err(anyhow::Error::msg)
    }

    async fn terminate_call(&self, call_id: &str) -> Result<(), anyhow::Error> {
        self.terminate_calls
            .lock()
            .unwrap()
            .push(call_id.to_string());
        match self.terminate_error.lock().unwrap().clone() {
            Some(reason) => Err(anyhow::Error::msg(reason)),
            None => Ok(()),
        }
    }

    async fn call_status(&self, call_id: &str) -> Result<ProviderCallStatus, anyhow::Error> {
        Ok(ProviderCallStatus {
            call_id: call_id.to_string(),
            state: "in-progress".to_string(),
            duration_secs: Some(12),
        })
    }
}

/// Fixed snapshot of the account's caller-ID state
pub struct MockDirectory {
    pub verified_ids: Vec<VerifiedCallerId>,
    pub preference: CallerIdPreference,
}

impl MockDirectory {
    pub fn with_ids(verified_ids: Vec<VerifiedCallerId>) -> Self {
        Self {
            verified_ids,
            preference: CallerIdPreference::default(),
        }
    }

    pub fn with_preference(mut self, caller_id: &str) -> Self {
        self.preference = CallerIdPreference {
            caller_id: Some(caller_id.to_string()),
        };
        self
    }
}

#[async_trait]
impl CallerIdDirectory for MockDirectory {
    async fn verified_caller_ids(&self) -> Result<Vec<VerifiedCallerId>, anyhow::Error> {
        Ok(self.verified_ids.clone())
    }

    async fn caller_id_preference(&self) -> Result<CallerIdPreference, anyhow::Error> {
        Ok(self.preference.clone())
    }
}

/// Scriptable realtime channel service with an injectable event stream
pub struct MockChannel {
    pub join_error: Mutex<Option<String>>,
    pub leave_error: Mutex<Option<String>>,
    pub join_delay: Mutex<Option<Duration>>,
    pub join_calls: Mutex<Vec<(String, String)>>,
    pub leave_calls: Mutex<Vec<(String, String)>>,
    pub sender: broadcast::Sender<ChannelEvent>,
}

impl MockChannel {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(64);
        Self {
            join_error: Mutex::new(None),
            leave_error: Mutex::new(None),
            join_delay: Mutex::new(None),
            join_calls: Mutex::new(Vec::new()),
            leave_calls: Mutex::new(Vec::new()),
            sender,
        }
    }

    pub fn failing_join(reason: &str) -> Self {
        let channel = Self::new();
        *channel.join_error.lock().unwrap() = Some(reason.to_string());
        channel
    }

    pub fn failing_leave(reason: &str) -> Self {
        let channel = Self::new();
        *channel.leave_error.lock().unwrap() = Some(reason.to_string());
        channel
    }

    pub fn joins(&self) -> Vec<(String, String)> {
        self.join_calls.lock().unwrap().clone()
    }

    pub fn leaves(&self) -> Vec<(String, String)> {
        self.leave_calls.lock().unwrap().clone()
    }

    /// Publish an event on the account-global stream
    pub fn publish(&self, event: ChannelEvent) {
        let _ = self.sender.send(event);
    }
}

#[async_trait]
impl RealtimeChannel for MockChannel {
    async fn join_room(&self, call_id: &str, session_id: &str) -> Result<(), anyhow::Error> {
        let delay = *self.join_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.join_calls
            .lock()
            .unwrap()
            .push((call_id.to_string(), session_id.to_string()));
        match self.join_error.lock().unwrap().clone() {
            Some(reason) => Err(anyhow::Error::msg(reason)),
            None => Ok(()),
        }
    }

    async fn leave_room(&self, call_id: &str, session_id: &str) -> Result<(), anyhow::Error> {
        self.leave_calls
            .lock()
            .unwrap()
            .push((call_id.to_string(), session_id.to_string()));
        match self.leave_error.lock().unwrap().clone() {
            Some(reason) => Err(anyhow::Error::msg(reason)),
            None => Ok(()),
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<ChannelEvent> {
        self.sender.subscribe()
    }
}

/// Handler that records everything it receives
#[derive(Default)]
pub struct RecordingHandler {
    pub state_changes: Mutex<Vec<CallStatusInfo>>,
    pub transcripts: Mutex<Vec<TranscriptSegment>>,
    pub errors: Mutex<Vec<ControllerErrorInfo>>,
}

impl RecordingHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn statuses(&self) -> Vec<callbridge_call_core::CallStatus> {
        self.state_changes
            .lock()
            .unwrap()
            .iter()
            .map(|info| info.new_status)
            .collect()
    }

    pub fn transcript_texts(&self) -> Vec<String> {
        self.transcripts
            .lock()
            .unwrap()
            .iter()
            .map(|segment| segment.text.clone())
            .collect()
    }

    pub fn error_messages(&self) -> Vec<String> {
        self.errors
            .lock()
            .unwrap()
            .iter()
            .map(|error| error.message.clone())
            .collect()
    }
}

#[async_trait]
impl ControllerEventHandler for RecordingHandler {
    async fn on_call_state_changed(&self, info: CallStatusInfo) {
        self.state_changes.lock().unwrap().push(info);
    }

    async fn on_transcript(&self, segment: TranscriptSegment) {
        self.transcripts.lock().unwrap().push(segment);
    }

    async fn on_error(&self, error: ControllerErrorInfo) {
        self.errors.lock().unwrap().push(error);
    }
}
