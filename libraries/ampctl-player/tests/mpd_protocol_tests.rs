//! MPD protocol tests against a loopback fake server.

use ampctl_core::{PlayerCommand, PlayerState};
use ampctl_player::{MpdConnector, PlayerConnection, PlayerConnector, PlayerError};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

const GREETING: &str = "OK MPD 0.23.5\n";

/// Accept one client, greet it, then answer each request with the scripted
/// reply. Returns the requests seen.
async fn fake_mpd(
    greeting: &'static str,
    replies: Vec<&'static str>,
) -> (MpdConnector, JoinHandle<Vec<String>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let (reader, mut writer) = stream.into_split();
        let mut lines = BufReader::new(reader).lines();
        writer.write_all(greeting.as_bytes()).await.unwrap();

        let mut requests = Vec::new();
        for reply in replies {
            let Some(request) = lines.next_line().await.unwrap() else {
                break;
            };
            requests.push(request);
            writer.write_all(reply.as_bytes()).await.unwrap();
        }
        requests
    });

    let connector = MpdConnector::new("127.0.0.1", port, Duration::from_secs(5));
    (connector, server)
}

#[tokio::test]
async fn test_greeting_announces_version() {
    let (connector, server) = fake_mpd(GREETING, vec![]).await;

    let connection = connector.open().await.unwrap();

    assert_eq!(connection.version(), "0.23.5");
    drop(connection);
    assert!(server.await.unwrap().is_empty());
}

#[tokio::test]
async fn test_transport_commands_on_the_wire() {
    let (connector, server) = fake_mpd(GREETING, vec!["OK\n"; 6]).await;
    let mut connection = connector.connect().await.unwrap();

    for command in [
        PlayerCommand::Stop,
        PlayerCommand::Play,
        PlayerCommand::Pause(true),
        PlayerCommand::Pause(false),
        PlayerCommand::ChangeVolume(-1),
        PlayerCommand::NextTrack,
    ] {
        connection.run_command(command).await.unwrap();
    }

    drop(connection);
    assert_eq!(
        server.await.unwrap(),
        vec!["stop", "play", "pause 1", "pause 0", "volume -1", "next"]
    );
}

#[tokio::test]
async fn test_ack_is_reported_as_rejection() {
    let (connector, server) =
        fake_mpd(GREETING, vec!["ACK [2@0] {play} Bad song index\n"]).await;
    let mut connection = connector.connect().await.unwrap();

    let err = connection.run_command(PlayerCommand::Play).await.unwrap_err();

    match err {
        PlayerError::Ack(message) => assert!(message.contains("Bad song index")),
        other => panic!("expected Ack, got {other:?}"),
    }
    assert!(!PlayerError::Ack(String::new()).is_transport());
    drop(connection);
    server.await.unwrap();
}

#[tokio::test]
async fn test_status_state_is_parsed() {
    let reply = "volume: 40\nrepeat: 0\nstate: pause\nsong: 3\nOK\n";
    let (connector, server) = fake_mpd(GREETING, vec![reply]).await;
    let mut connection = connector.connect().await.unwrap();

    assert_eq!(connection.current_state().await.unwrap(), PlayerState::Paused);

    drop(connection);
    assert_eq!(server.await.unwrap(), vec!["status"]);
}

#[tokio::test]
async fn test_idle_then_status() {
    let replies = vec!["changed: player\nOK\n", "state: play\nOK\n"];
    let (connector, server) = fake_mpd(GREETING, replies).await;
    let mut connection = connector.connect().await.unwrap();

    assert_eq!(
        connection.wait_state_change().await.unwrap(),
        PlayerState::Playing
    );

    drop(connection);
    assert_eq!(server.await.unwrap(), vec!["idle player", "status"]);
}

#[tokio::test]
async fn test_unexpected_greeting_is_protocol_error() {
    let (connector, server) = fake_mpd("HELLO\n", vec![]).await;

    let err = connector.open().await.unwrap_err();

    assert!(matches!(err, PlayerError::Protocol(_)));
    server.await.unwrap();
}

#[tokio::test]
async fn test_server_hangup_is_transport_failure() {
    let (connector, server) = fake_mpd(GREETING, vec![]).await;
    let mut connection = connector.connect().await.unwrap();
    server.await.unwrap();

    let err = connection.run_command(PlayerCommand::Stop).await.unwrap_err();

    assert!(err.is_transport());
    assert!(!err.is_fatal());
}

#[tokio::test]
async fn test_refused_connection_is_io_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    let connector = MpdConnector::new("127.0.0.1", port, Duration::from_secs(5));

    let err = connector.open().await.unwrap_err();

    assert!(matches!(err, PlayerError::Io(_)));
}
