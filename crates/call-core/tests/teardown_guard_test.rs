//! Lifecycle guard teardown guarantees

mod common;

use std::sync::Arc;
use std::time::Duration;

use callbridge_call_core::{
    CallController, CallStatus, ControllerConfig, InitiateCallResponse, StartCallOptions,
};

use common::{verified, MockChannel, MockDirectory, MockProvider};

fn options() -> StartCallOptions {
    StartCallOptions {
        recipients: vec!["+15551234567".to_string()],
        caller_id: None,
        mode: Default::default(),
        notes: None,
    }
}

fn controller_with_provider(channel: Arc<MockChannel>) -> (Arc<CallController>, Arc<MockProvider>) {
    let provider = Arc::new(MockProvider::returning(InitiateCallResponse {
        call_id: "abc123".to_string(),
        session_id: None,
        mock: false,
    }));
    let directory = Arc::new(MockDirectory::with_ids(vec![verified("+15550009999")]));
    let controller = Arc::new(CallController::new(
        ControllerConfig::default(),
        provider.clone(),
        directory,
        channel,
    ));
    (controller, provider)
}

fn connected_controller(channel: Arc<MockChannel>) -> Arc<CallController> {
    controller_with_provider(channel).0
}

#[tokio::test]
async fn release_leaves_the_room_exactly_once() {
    let channel = Arc::new(MockChannel::new());
    let controller = connected_controller(channel.clone());
    let guard = controller.lifecycle_guard();

    controller.start_call(options()).await.unwrap();
    assert_eq!(controller.status().await, CallStatus::Connected);

    guard.release().await;
    guard.release().await;

    assert_eq!(
        channel.leaves(),
        vec![("abc123".to_string(), "abc123".to_string())]
    );
    assert!(controller.session().await.is_none());
    assert!(guard.is_released());
}

#[tokio::test]
async fn dropping_an_armed_guard_tears_down_in_the_background() {
    let channel = Arc::new(MockChannel::new());
    let controller = connected_controller(channel.clone());

    controller.start_call(options()).await.unwrap();
    {
        let _guard = controller.lifecycle_guard();
        // guard dropped here while the call is still connected
    }

    // teardown is spawned, give it a moment
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(
        channel.leaves(),
        vec![("abc123".to_string(), "abc123".to_string())]
    );
    assert!(controller.session().await.is_none());
}

#[tokio::test]
async fn release_mid_call_terminates_at_provider() {
    let channel = Arc::new(MockChannel::new());
    let (controller, provider) = controller_with_provider(channel.clone());
    let guard = controller.lifecycle_guard();

    controller.start_call(options()).await.unwrap();
    assert_eq!(controller.status().await, CallStatus::Connected);

    guard.release().await;

    // the live call must be hung up at the provider, not just abandoned
    assert_eq!(provider.terminations(), vec!["abc123".to_string()]);
    assert_eq!(channel.leaves().len(), 1);
    assert!(controller.session().await.is_none());
}

#[tokio::test]
async fn dropping_an_armed_guard_terminates_at_provider() {
    let channel = Arc::new(MockChannel::new());
    let (controller, provider) = controller_with_provider(channel.clone());

    controller.start_call(options()).await.unwrap();
    {
        let _guard = controller.lifecycle_guard();
    }

    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(provider.terminations(), vec!["abc123".to_string()]);
    assert_eq!(channel.leaves().len(), 1);
}

#[tokio::test]
async fn teardown_swallows_terminate_failures() {
    let channel = Arc::new(MockChannel::new());
    let (controller, provider) = controller_with_provider(channel.clone());
    let guard = controller.lifecycle_guard();

    controller.start_call(options()).await.unwrap();
    *provider.terminate_error.lock().unwrap() = Some("provider unreachable".to_string());

    // must not panic or propagate; the room is still left and state cleared
    guard.release().await;

    assert_eq!(provider.terminations(), vec!["abc123".to_string()]);
    assert_eq!(channel.leaves().len(), 1);
    assert!(controller.session().await.is_none());
}

#[tokio::test]
async fn teardown_swallows_leave_failures() {
    let channel = Arc::new(MockChannel::failing_leave("socket closed"));
    let controller = connected_controller(channel.clone());
    let guard = controller.lifecycle_guard();

    controller.start_call(options()).await.unwrap();
    // must not panic or propagate even though leave_room rejects
    guard.release().await;

    assert_eq!(channel.leaves().len(), 1);
    assert!(controller.session().await.is_none());
}

#[tokio::test]
async fn release_after_clean_hangup_does_not_leave_again() {
    let channel = Arc::new(MockChannel::new());
    let controller = connected_controller(channel.clone());
    let guard = controller.lifecycle_guard();

    controller.start_call(options()).await.unwrap();
    controller.end_call().await.unwrap();
    guard.release().await;

    // the normal end path already left; teardown must not repeat it
    assert_eq!(channel.leaves().len(), 1);
}

#[tokio::test]
async fn release_without_a_session_is_a_no_op() {
    let channel = Arc::new(MockChannel::new());
    let controller = connected_controller(channel.clone());
    let guard = controller.lifecycle_guard();

    guard.release().await;

    assert!(channel.leaves().is_empty());
    assert_eq!(controller.status().await, CallStatus::Idle);
}

#[tokio::test]
async fn concurrent_hangup_and_teardown_leave_once() {
    let channel = Arc::new(MockChannel::new());
    let controller = connected_controller(channel.clone());
    let guard = controller.lifecycle_guard();

    controller.start_call(options()).await.unwrap();

    // Race the normal end path against forced teardown; the room must
    // still only be left once.
    let (end_result, _) = futures::future::join(controller.end_call(), guard.release()).await;
    end_result.unwrap();

    assert_eq!(channel.leaves().len(), 1);
    assert!(controller.session().await.is_none());
}

#[tokio::test]
async fn teardown_mid_call_marks_the_session_ended_first() {
    let channel = Arc::new(MockChannel::new());
    let controller = connected_controller(channel.clone());
    let guard = controller.lifecycle_guard();

    controller.start_call(options()).await.unwrap();

    let mut stream = controller.subscribe();
    guard.release().await;

    // the forced path reports Ended like a clean shutdown would
    use tokio_stream::StreamExt;
    let event = tokio::time::timeout(Duration::from_millis(200), stream.next())
        .await
        .expect("event expected");
    match event {
        Some(Ok(callbridge_call_core::ControllerEvent::CallStateChanged(info))) => {
            assert_eq!(info.new_status, CallStatus::Ended);
        }
        other => panic!("unexpected event: {:?}", other.map(|r| r.is_ok())),
    }
}
