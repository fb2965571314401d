mod support;

use std::io::Read;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

const TAG_UNCOMPRESSED: u8 = b'0';
const TAG_COMPRESSED: u8 = b'1';

type WsStream =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

async fn next_binary(socket: &mut WsStream) -> Vec<u8> {
    loop {
        let msg = tokio::time::timeout(Duration::from_secs(5), socket.next())
            .await
            .expect("frame before timeout")
            .expect("stream still open")
            .expect("websocket read");
        match msg {
            Message::Binary(data) => return data.into(),
            Message::Ping(_) | Message::Pong(_) => continue,
            other => panic!("unexpected non-binary message: {other:?}"),
        }
    }
}

fn inflate(frame: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    flate2::read::ZlibDecoder::new(&frame[..frame.len() - 1])
        .read_to_end(&mut out)
        .expect("valid zlib stream");
    out
}

#[tokio::test]
async fn connect_snapshot_and_movement_flow() {
    let base_url = support::ensure_server();
    let host = base_url.strip_prefix("http://").unwrap();
    let (mut socket, _) = connect_async(format!("ws://{host}/ws?name=tester"))
        .await
        .expect("websocket connect");

    // First frame: the plain-tagged connect ack with our id and the arena.
    let frame = next_binary(&mut socket).await;
    assert_eq!(*frame.last().unwrap(), TAG_UNCOMPRESSED);
    let ack: serde_json::Value = serde_json::from_slice(&frame[..frame.len() - 1]).unwrap();
    assert_eq!(ack["type"], "connected");
    let client_id = ack["data"]["clientId"].as_u64().expect("client id");
    assert_eq!(ack["data"]["gameBoundsDimensions"]["width"], 2500.0);
    assert_eq!(ack["data"]["spatialGridDimensions"]["rows"], 10);
    let walls = ack["data"]["unwalkableCells"].as_array().unwrap();
    assert!(!walls.is_empty());
    // Each wall is a raw [xStart, yStart, xEnd, yEnd] span.
    assert!(walls.iter().all(|w| w.as_array().unwrap().len() == 4));

    // Soon after: a high-score greeting plus a compressed snapshot that
    // contains our freshly spawned tank.
    let mut saw_high_score = false;
    let mut own_x = None;
    while !saw_high_score || own_x.is_none() {
        let frame = next_binary(&mut socket).await;
        match *frame.last().unwrap() {
            TAG_UNCOMPRESSED => {
                let event: serde_json::Value =
                    serde_json::from_slice(&frame[..frame.len() - 1]).unwrap();
                if event["type"] == "highScore" {
                    assert!(event["data"]["highScore"].is_number());
                    saw_high_score = true;
                }
            }
            TAG_COMPRESSED => {
                let event: serde_json::Value =
                    serde_json::from_slice(&inflate(&frame)).unwrap();
                assert_eq!(event["type"], "model");
                let rows = event["data"].as_array().unwrap();
                // The arena is pre-populated, never just us.
                assert!(rows.len() > 1);
                if let Some(row) = rows.iter().find(|r| r[0] == client_id) {
                    assert_eq!(row[1], "tester");
                    assert_eq!(row[10], "player");
                    own_x = Some(row[4].as_f64().unwrap());
                }
            }
            tag => panic!("unknown frame tag {tag}"),
        }
    }

    // Steer away from the nearest wall and watch our x change.
    let start_x = own_x.unwrap();
    let command = if start_x < 1250.0 { "right" } else { "left" };
    socket
        .send(Message::Text(
            format!(r#"{{"type":"action","data":"{command}"}}"#).into(),
        ))
        .await
        .expect("send movement command");

    let mut moved = false;
    for _ in 0..50 {
        let frame = next_binary(&mut socket).await;
        if *frame.last().unwrap() != TAG_COMPRESSED {
            continue;
        }
        let event: serde_json::Value = serde_json::from_slice(&inflate(&frame)).unwrap();
        let rows = event["data"].as_array().unwrap();
        if let Some(row) = rows.iter().find(|r| r[0] == client_id) {
            if (row[4].as_f64().unwrap() - start_x).abs() > 1.0 {
                moved = true;
                break;
            }
        }
    }
    assert!(moved, "movement command had no effect on position");

    socket.close(None).await.ok();
}

#[tokio::test]
async fn snapshot_rows_arrive_sorted_by_color() {
    let base_url = support::ensure_server();
    let host = base_url.strip_prefix("http://").unwrap();
    let (mut socket, _) = connect_async(format!("ws://{host}/ws"))
        .await
        .expect("websocket connect");

    loop {
        let frame = next_binary(&mut socket).await;
        if *frame.last().unwrap() != TAG_COMPRESSED {
            continue;
        }
        let event: serde_json::Value = serde_json::from_slice(&inflate(&frame)).unwrap();
        let colors: Vec<&str> = event["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r[6].as_str().unwrap())
            .collect();
        let mut sorted = colors.clone();
        sorted.sort();
        assert_eq!(colors, sorted);
        break;
    }

    socket.close(None).await.ok();
}
