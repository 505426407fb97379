use db::repositories::AttendanceRepository;
use db::test_utils::seed_class;
use futures_util::SinkExt;
use serde_json::json;
use tokio_tungstenite::tungstenite::{Error, Message};
use util::identity::Role;

use crate::helpers::{
    connect_ws, make_test_app, next_event, send_event, spawn_server, token_for,
    wait_for_connections,
};

const ROSTER: [&str; 10] = ["s1", "s2", "s3", "s4", "s5", "s6", "s7", "s8", "s9", "s10"];

#[tokio::test]
async fn unauthenticated_upgrade_is_rejected() {
    let (app, _state) = make_test_app().await;
    let addr = spawn_server(app).await;

    match connect_ws(&addr, "not-a-token").await {
        Ok(_) => panic!("upgrade without a valid token should fail"),
        Err(Error::Http(resp)) => assert_eq!(resp.status(), 401),
        Err(e) => panic!("unexpected error: {e:?}"),
    }
}

#[tokio::test]
async fn live_session_from_marks_to_done() {
    let (app, state) = make_test_app().await;
    let class = seed_class(state.db(), "COS 301", "t1", &ROSTER).await;
    let addr = spawn_server(app).await;
    state.session().start(class.id).await;

    let (mut teacher, _) = connect_ws(&addr, &token_for("t1", Role::Teacher)).await.unwrap();
    let (mut student, _) = connect_ws(&addr, &token_for("s1", Role::Student)).await.unwrap();
    wait_for_connections(&state, 2).await;

    let marks = [
        ("s1", "present"),
        ("s2", "present"),
        ("s3", "present"),
        ("s4", "absent"),
        ("s5", "absent"),
    ];
    for (id, status) in marks {
        send_event(
            &mut teacher,
            json!({ "event": "ATTENDANCE_MARKED", "data": { "studentID": id, "status": status } }),
        )
        .await;
        let expected = json!({ "event": "ATTENDANCE_MARKED", "data": { "studentID": id, "status": status } });
        assert_eq!(next_event(&mut teacher).await, expected);
        assert_eq!(next_event(&mut student).await, expected);
    }

    send_event(&mut teacher, json!({ "event": "TODAY_SUMMARY" })).await;
    let summary = json!({ "event": "TODAY_SUMMARY", "data": { "present": 3, "absent": 2, "total": 5 } });
    assert_eq!(next_event(&mut teacher).await, summary);
    assert_eq!(next_event(&mut student).await, summary);

    send_event(&mut student, json!({ "event": "MY_ATTENDANCE", "data": {} })).await;
    assert_eq!(
        next_event(&mut student).await,
        json!({ "event": "MY_ATTENDANCE", "data": { "status": "present" } })
    );

    send_event(&mut teacher, json!({ "event": "DONE", "data": {} })).await;
    for ws in [&mut teacher, &mut student] {
        let done = next_event(ws).await;
        assert_eq!(done["event"], "DONE");
        assert_eq!(done["data"]["present"], 3);
        assert_eq!(done["data"]["absent"], 7);
        assert_eq!(done["data"]["total"], 10);
        assert!(done["data"]["message"].is_string());
    }

    let records = AttendanceRepository::new(state.db().clone())
        .records_for_class(class.id)
        .await
        .unwrap();
    assert_eq!(records.len(), 10);
    assert!(state.session().info().await.is_none());

    send_event(&mut student, json!({ "event": "MY_ATTENDANCE" })).await;
    assert_eq!(
        next_event(&mut student).await,
        json!({ "event": "ERROR", "data": { "message": "No active attendance session" } })
    );
}

#[tokio::test]
async fn student_mark_is_refused_privately() {
    let (app, state) = make_test_app().await;
    let class = seed_class(state.db(), "COS 301", "t1", &["s1"]).await;
    let addr = spawn_server(app).await;
    state.session().start(class.id).await;

    let (mut student, _) = connect_ws(&addr, &token_for("s1", Role::Student)).await.unwrap();
    wait_for_connections(&state, 1).await;

    send_event(
        &mut student,
        json!({ "event": "ATTENDANCE_MARKED", "data": { "studentID": "s1", "status": "present" } }),
    )
    .await;

    assert_eq!(
        next_event(&mut student).await,
        json!({ "event": "ERROR", "data": { "message": "Forbidden, teacher event only" } })
    );
    assert_eq!(state.session().lookup("s1").await.unwrap(), None);
}

#[tokio::test]
async fn malformed_frame_keeps_connection_open() {
    let (app, state) = make_test_app().await;
    let addr = spawn_server(app).await;
    state.session().start(1).await;

    let (mut student, _) = connect_ws(&addr, &token_for("s9", Role::Student)).await.unwrap();

    student.send(Message::Text("definitely not json".into())).await.unwrap();
    assert_eq!(
        next_event(&mut student).await,
        json!({ "event": "ERROR", "data": { "message": "Invalid message format" } })
    );

    send_event(&mut student, json!({ "event": "MY_ATTENDANCE" })).await;
    assert_eq!(
        next_event(&mut student).await,
        json!({ "event": "MY_ATTENDANCE", "data": { "status": "not yet updated" } })
    );
}

#[tokio::test]
async fn unknown_event_is_answered_with_error() {
    let (app, state) = make_test_app().await;
    let addr = spawn_server(app).await;

    let (mut teacher, _) = connect_ws(&addr, &token_for("t1", Role::Teacher)).await.unwrap();
    wait_for_connections(&state, 1).await;

    send_event(&mut teacher, json!({ "event": "SHUFFLE_SEATS", "data": {} })).await;
    assert_eq!(
        next_event(&mut teacher).await,
        json!({ "event": "ERROR", "data": { "message": "Unrecognized event: SHUFFLE_SEATS" } })
    );
}

#[tokio::test]
async fn closing_the_socket_unregisters_it() {
    let (app, state) = make_test_app().await;
    let addr = spawn_server(app).await;

    let (mut student, _) = connect_ws(&addr, &token_for("s1", Role::Student)).await.unwrap();
    wait_for_connections(&state, 1).await;

    student.close(None).await.unwrap();
    wait_for_connections(&state, 0).await;
}
