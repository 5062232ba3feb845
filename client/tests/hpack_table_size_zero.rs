//! Boundary scenario: HPACK dynamic table size 0 (§4.5) — a peer that
//! advertises `SETTINGS_HEADER_TABLE_SIZE=0` must still round-trip a request
//! correctly; header compression just never gets to reuse a dynamic-table
//! entry across frames.

use aperture_client::{h2_handshake, H2Connection};
use aperture_http::{HeaderStore, Method, Status};
use tokio::net::{TcpListener, TcpStream};

#[tokio::test]
async fn request_round_trips_with_a_zero_size_dynamic_table() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = tokio::spawn(async move {
        let (socket, _) = listener.accept().await.unwrap();
        let mut connection =
            h2::server::Builder::new().header_table_size(0).handshake::<_, bytes::Bytes>(socket).await.unwrap();

        let (request, mut respond) = connection.accept().await.expect("one request").unwrap();
        assert_eq!(request.method(), http::Method::GET);
        assert_eq!(request.headers().get("x-client"), Some(&http::HeaderValue::from_static("test")));

        let response = http::Response::builder().status(200).header("x-server", "ok").body(()).unwrap();
        let mut send = respond.send_response(response, false).unwrap();
        send.send_data(bytes::Bytes::from_static(b"hello from h2"), true).unwrap();
    });

    let stream = TcpStream::connect(addr).await.unwrap();
    let mut connection: H2Connection = h2_handshake(stream).await.unwrap();

    let mut headers = HeaderStore::new();
    headers.append(aperture_http::HeaderName::parse("x-client").unwrap(), aperture_http::HeaderValue::new(b"test".as_slice()).unwrap());

    let response = connection.send(Method::Get, "https://test.local/", &headers, None).await.unwrap();

    assert_eq!(response.status, Status::Ok);
    assert_eq!(response.body, b"hello from h2");

    server.await.unwrap();
}
