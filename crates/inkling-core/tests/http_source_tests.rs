use futures::StreamExt;
use inkling_core::{
    CompletionRequest, CompletionSource, HttpCompletionSource, RequestContext, StreamEvent,
};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;

/// Read one HTTP request and return (head, body).
async fn read_request(socket: &mut TcpStream) -> (String, String) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        let n = socket.read(&mut chunk).await.unwrap();
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
        let Some(split) = buf.windows(4).position(|w| w == b"\r\n\r\n") else {
            continue;
        };
        let head = String::from_utf8_lossy(&buf[..split]).to_string();
        let length = head
            .lines()
            .find_map(|l| {
                let (name, value) = l.split_once(':')?;
                name.eq_ignore_ascii_case("content-length")
                    .then(|| value.trim().parse::<usize>().ok())
                    .flatten()
            })
            .unwrap_or(0);
        let body_start = split + 4;
        if buf.len() >= body_start + length {
            let body = String::from_utf8_lossy(&buf[body_start..body_start + length]).to_string();
            return (head, body);
        }
    }
    panic!("connection closed before a full request arrived");
}

/// Serve exactly one connection: answer with `status` and write `chunks`
/// one by one. The request is handed back through the returned channel.
async fn serve_once(
    status: &'static str,
    chunks: Vec<&'static str>,
) -> (String, oneshot::Receiver<(String, String)>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}/api/complete", listener.local_addr().unwrap());
    let (tx, rx) = oneshot::channel();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let request = read_request(&mut socket).await;
        let _ = tx.send(request);

        let head = format!(
            "HTTP/1.1 {status}\r\nContent-Type: text/event-stream\r\nConnection: close\r\n\r\n"
        );
        socket.write_all(head.as_bytes()).await.unwrap();
        // The client may hang up early once it has seen the end marker.
        for chunk in chunks {
            if socket.write_all(chunk.as_bytes()).await.is_err() {
                return;
            }
            let _ = socket.flush().await;
            tokio::task::yield_now().await;
        }
        let _ = socket.shutdown().await;
    });

    (url, rx)
}

async fn collect(source: &HttpCompletionSource, request: &CompletionRequest) -> Vec<StreamEvent> {
    let rx = source.stream(request).await.unwrap();
    rx.collect().await
}

#[tokio::test]
async fn test_streams_deltas_until_done() {
    let (url, request_rx) = serve_once(
        "200 OK",
        vec![
            "data: {\"choices\":[{\"delta\":{\"content\":\"Golden\"}}]}\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\" li",
            "ght\"}}]}\n\ndata: [DONE]\n\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"ignored\"}}]}\n\n",
        ],
    )
    .await;

    let source = HttpCompletionSource::new(url).with_api_key("secret");
    let request = CompletionRequest::new(
        "The sun was setting",
        RequestContext::default().with_session("s-1"),
    );
    let events = collect(&source, &request).await;
    assert_eq!(
        events,
        vec![
            StreamEvent::TextDelta("Golden".into()),
            StreamEvent::TextDelta(" light".into()),
            StreamEvent::Done,
        ]
    );

    let (head, body) = request_rx.await.unwrap();
    let head = head.to_ascii_lowercase();
    assert!(head.starts_with("post /api/complete"));
    assert!(head.contains("authorization: bearer secret"));
    assert!(head.contains("accept: text/event-stream"));
    let body: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(
        body,
        serde_json::json!({"text": "The sun was setting", "session_id": "s-1"})
    );
}

#[tokio::test]
async fn test_close_without_sentinel_flushes_last_frame() {
    let (url, _request_rx) = serve_once(
        "200 OK",
        vec!["data: {\"choices\":[{\"delta\":{\"content\":\"héllo\"}}]}"],
    )
    .await;

    let source = HttpCompletionSource::new(url);
    let events = collect(&source, &CompletionRequest::new("text", RequestContext::default())).await;
    assert_eq!(
        events,
        vec![StreamEvent::TextDelta("héllo".into()), StreamEvent::Done]
    );
}

#[tokio::test]
async fn test_error_status_is_reported() {
    let (url, _request_rx) = serve_once("500 Internal Server Error", vec!["boom"]).await;

    let source = HttpCompletionSource::new(url);
    let err = source
        .stream(&CompletionRequest::new("text", RequestContext::default()))
        .await
        .unwrap_err();
    let message = err.to_string();
    assert!(message.contains("500"), "unexpected error: {message}");
    assert!(message.contains("boom"), "unexpected error: {message}");
}
