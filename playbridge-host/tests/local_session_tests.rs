//! End-to-end local sessions: guest calls in through the view, results come
//! back on the content's message bus.

mod common;

use common::*;
use playbridge_host::*;
use playbridge_types::*;
use pretty_assertions::assert_eq;
use serde_json::json;

fn start(id: ContentId, session: &str, handler: bool) -> InboundEnvelope {
    call(
        id,
        "coe",
        ExternalCall::StartSession(StartSessionParams {
            session_id: session.into(),
            application: "quiz".into(),
            local: true,
            message_handler: handler,
        }),
    )
}

fn exit(id: ContentId, session: &str, needs_result: Option<bool>) -> InboundEnvelope {
    call(
        id,
        "coe",
        ExternalCall::ExitSession(ExitSessionParams {
            session_id: session.into(),
            parameters: needs_result.map(|needs_result| ExitParameters { needs_result }),
        }),
    )
}

fn mounted() -> (GameView, ContentHandle) {
    let journal = Journal::default();
    let mut view = view(&journal);
    let mut c = content();
    c.register_plugin(LocalSessionPlugin::new("coe")).unwrap();
    let handle = view.add_content(c).unwrap();
    (view, handle)
}

#[test]
fn exit_with_result_reports_score_at_exit() {
    let (mut view, mut handle) = mounted();
    let id = handle.id;

    view.deliver(CONTENT_ORIGIN, InboundEnvelope::new(id, GuestMessage::score(10)));
    view.deliver(CONTENT_ORIGIN, start(id, "s1", true));
    view.deliver(CONTENT_ORIGIN, InboundEnvelope::new(id, GuestMessage::score(75)));
    view.deliver(CONTENT_ORIGIN, exit(id, "s1", Some(true)));

    let message = handle.outbound.try_recv().unwrap();
    assert_eq!(
        message,
        BusMessage::Session {
            plugin: "coe".into(),
            message: SessionMessage::End {
                session_id: "s1".into(),
                result: 75,
            },
        }
    );
    assert_eq!(
        serde_json::to_value(&message).unwrap(),
        json!({
            "type": "session",
            "plugin": "coe",
            "message": { "type": "end", "sessionId": "s1", "result": 75 }
        })
    );
    assert!(handle.outbound.try_recv().is_err());
}

#[test]
fn raw_guest_json_drives_a_session() {
    let (mut view, mut handle) = mounted();
    let id = handle.id;

    let send = |view: &mut GameView, message: serde_json::Value| {
        view.deliver_raw(
            CONTENT_ORIGIN,
            &json!({ "content": id, "message": message }).to_string(),
        );
    };
    send(
        &mut view,
        json!({ "type": "call", "plugin": "coe", "call": {
            "method": "startSession",
            "params": { "sessionId": "raw", "application": "quiz", "local": true, "messageHandler": true }
        }}),
    );
    send(&mut view, json!({ "type": "state", "score": 7 }));
    send(
        &mut view,
        json!({ "type": "call", "plugin": "coe", "call": {
            "method": "exitSession",
            "params": { "sessionId": "raw", "parameters": { "needsResult": true } }
        }}),
    );

    match handle.outbound.try_recv().unwrap() {
        BusMessage::Session { message, .. } => {
            assert_eq!(message.session_id().as_str(), "raw");
            assert_eq!(message, SessionMessage::End { session_id: "raw".into(), result: 7 });
        }
        other => panic!("unexpected bus message: {other:?}"),
    }
}

#[test]
fn exit_without_result_or_handler_posts_nothing() {
    let (mut view, mut handle) = mounted();
    let id = handle.id;

    view.deliver(CONTENT_ORIGIN, start(id, "quiet", true));
    view.deliver(CONTENT_ORIGIN, exit(id, "quiet", Some(false)));

    view.deliver(CONTENT_ORIGIN, start(id, "no-handler", false));
    view.deliver(CONTENT_ORIGIN, exit(id, "no-handler", Some(true)));

    view.deliver(CONTENT_ORIGIN, start(id, "no-params", true));
    view.deliver(CONTENT_ORIGIN, exit(id, "no-params", None));

    view.deliver(CONTENT_ORIGIN, exit(id, "never-started", Some(true)));

    assert!(handle.outbound.try_recv().is_err());
}

#[test]
fn non_local_and_unsupported_calls_are_ignored() {
    let (mut view, mut handle) = mounted();
    let id = handle.id;

    view.deliver(
        CONTENT_ORIGIN,
        call(
            id,
            "coe",
            ExternalCall::StartSession(StartSessionParams {
                session_id: "remote".into(),
                application: "quiz".into(),
                local: false,
                message_handler: true,
            }),
        ),
    );
    view.deliver(
        CONTENT_ORIGIN,
        call(id, "coe", ExternalCall::SendLocalEvents(vec![json!({ "e": 1 })])),
    );
    view.deliver(CONTENT_ORIGIN, exit(id, "remote", Some(true)));

    assert!(handle.outbound.try_recv().is_err());
}

#[test]
fn restart_replaces_the_earlier_handler() {
    let (mut view, mut handle) = mounted();
    let id = handle.id;

    view.deliver(CONTENT_ORIGIN, start(id, "s1", false));
    view.deliver(CONTENT_ORIGIN, start(id, "s1", true));
    view.deliver(CONTENT_ORIGIN, InboundEnvelope::new(id, GuestMessage::score(3)));
    view.deliver(CONTENT_ORIGIN, exit(id, "s1", Some(true)));

    assert!(matches!(
        handle.outbound.try_recv().unwrap(),
        BusMessage::Session { message: SessionMessage::End { result: 3, .. }, .. }
    ));
}

#[test]
fn removed_content_closes_its_bus() {
    let (mut view, mut handle) = mounted();
    let id = handle.id;

    view.deliver(CONTENT_ORIGIN, start(id, "s1", true));
    view.remove_content(id).unwrap();
    view.deliver(CONTENT_ORIGIN, exit(id, "s1", Some(true)));

    assert!(handle.outbound.try_recv().is_err());
}
