//! Remote fetch integration tests against a local mock server.

mod common;

use common::{Item, write_zip};
use datafetch::{Error, FetchFailure, Fetcher, extract};
use std::fs;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn body_is_written_on_200() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/files/data.bin"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"0123456789".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let tmp = TempDir::new().unwrap();
    let dest = tmp.path().join("downloads/data.bin");
    let url = format!("{}/files/data.bin", server.uri());

    let written = Fetcher::new().unwrap().fetch(&url, &dest).await.unwrap();

    assert_eq!(written, 10);
    assert_eq!(fs::read(&dest).unwrap(), b"0123456789");
}

#[tokio::test]
async fn existing_file_is_truncated() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"new".to_vec()))
        .mount(&server)
        .await;

    let tmp = TempDir::new().unwrap();
    let dest = tmp.path().join("data.bin");
    fs::write(&dest, b"an older and much longer download").unwrap();

    Fetcher::new()
        .unwrap()
        .fetch(&server.uri(), &dest)
        .await
        .unwrap();

    assert_eq!(fs::read(&dest).unwrap(), b"new");
}

#[tokio::test]
async fn non_200_status_is_fetch_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing.zip"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/partial.zip"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let tmp = TempDir::new().unwrap();
    let fetcher = Fetcher::new().unwrap();

    for (name, status) in [("missing.zip", 404u16), ("partial.zip", 204)] {
        let url = format!("{}/{name}", server.uri());
        let dest = tmp.path().join(name);

        let err = fetcher.fetch(&url, &dest).await.unwrap_err();

        match err {
            Error::HttpFetch {
                url: failed,
                source: FetchFailure::Status(code),
            } => {
                assert_eq!(failed, url);
                assert_eq!(code.as_u16(), status);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(!dest.exists(), "nothing is written for a failed status");
    }
}

#[tokio::test]
async fn unreachable_server_is_transport_error() {
    // Bind then release a port so nothing is listening on it
    let port = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();
    let url = format!("http://127.0.0.1:{port}/data.zip");

    let tmp = TempDir::new().unwrap();
    let err = Fetcher::new()
        .unwrap()
        .fetch(&url, &tmp.path().join("data.zip"))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        Error::HttpFetch {
            source: FetchFailure::Transport(_),
            ..
        }
    ));
}

#[tokio::test]
async fn unwritable_target_is_download_write_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"data".to_vec()))
        .mount(&server)
        .await;

    let tmp = TempDir::new().unwrap();
    // The target's parent is a regular file
    let blocker = tmp.path().join("blocker");
    fs::write(&blocker, b"").unwrap();

    let err = Fetcher::new()
        .unwrap()
        .fetch(&server.uri(), &blocker.join("data.zip"))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::DownloadWrite { .. }));
}

#[tokio::test]
async fn downloaded_archive_extracts() {
    let tmp = TempDir::new().unwrap();
    let fixture = tmp.path().join("fixture.zip");
    write_zip(&fixture, &[Item::Dir("a/"), Item::File("a/b.txt", b"hi")]);

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/dataset.zip"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(fs::read(&fixture).unwrap()))
        .mount(&server)
        .await;

    let archive = tmp.path().join("dataset.zip");
    let out = tmp.path().join("out");
    Fetcher::new()
        .unwrap()
        .fetch(&format!("{}/dataset.zip", server.uri()), &archive)
        .await
        .unwrap();

    let paths = extract(&archive, &out).unwrap();

    assert_eq!(paths, vec![out.join("a"), out.join("a/b.txt")]);
    assert_eq!(fs::read_to_string(out.join("a/b.txt")).unwrap(), "hi");
}
