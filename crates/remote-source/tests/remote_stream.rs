mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{InputBehavior, MemoryServer, init_tracing, sample_bytes, video_url};
use remote_source::{
    ClientError, Credentials, DataRequest, DataSource, NoCredentials, ReadOutcome,
    RemoteFileStream, RemoteSourceConfig, SourceError, TransferStats,
};
use rstest::rstest;

fn stream_for(server: &MemoryServer) -> RemoteFileStream {
    RemoteFileStream::new(
        Arc::new(server.clone()),
        Arc::new(Credentials::new("alice", "secret")),
        RemoteSourceConfig::default(),
    )
}

/// Read until end of input, returning everything delivered.
async fn drain(stream: &mut RemoteFileStream, buf_size: usize) -> Vec<u8> {
    let mut out = Vec::new();
    let mut buf = vec![0u8; buf_size];
    loop {
        match stream.read(&mut buf).await.unwrap() {
            ReadOutcome::Read(n) => {
                assert!(n > 0 && n <= buf_size);
                out.extend_from_slice(&buf[..n]);
            }
            ReadOutcome::EndOfInput => return out,
        }
    }
}

#[tokio::test]
async fn test_reads_whole_resource_then_end_of_input() {
    init_tracing();
    let data = sample_bytes(10_000);
    let server = MemoryServer::new(data.clone()).with_chunk(1000);
    let mut stream = stream_for(&server);

    let length = stream.open(&DataRequest::new(video_url())).await.unwrap();
    assert_eq!(length, Some(10_000));

    let delivered = drain(&mut stream, 4096).await;
    assert_eq!(delivered, data.to_vec());
    assert_eq!(stream.handle().unwrap().remaining(), Some(0));

    // Stays at end of input.
    let mut buf = [0u8; 16];
    assert_eq!(stream.read(&mut buf).await.unwrap(), ReadOutcome::EndOfInput);

    stream.close().unwrap();
    assert_eq!(server.close_count(), 1);
}

#[rstest]
#[case::start(0, 1000)]
#[case::middle(400, 600)]
#[case::last_byte(999, 1)]
#[case::exactly_at_end(1000, 0)]
#[tokio::test]
async fn test_open_at_offset(#[case] position: u64, #[case] expected_len: usize) {
    init_tracing();
    let data = sample_bytes(1000);
    let server = MemoryServer::new(data.clone()).with_chunk(128);
    let mut stream = stream_for(&server);

    let length = stream
        .open(&DataRequest::at(video_url(), position))
        .await
        .unwrap();
    // The reported length is the whole resource, not the remainder.
    assert_eq!(length, Some(1000));
    assert_eq!(stream.handle().unwrap().cursor(), position);

    let delivered = drain(&mut stream, 256).await;
    assert_eq!(delivered.len(), expected_len);
    assert_eq!(&delivered[..], &data[position as usize..]);
}

#[tokio::test]
async fn test_open_past_end_is_truncated() {
    init_tracing();
    let server = MemoryServer::new(sample_bytes(1000));
    let mut stream = stream_for(&server);

    let err = stream
        .open(&DataRequest::at(video_url(), 1001))
        .await
        .unwrap_err();
    match err {
        SourceError::TruncatedStream {
            delivered,
            expected,
            ..
        } => {
            assert_eq!(delivered, 1000);
            assert_eq!(expected, Some(1000));
        }
        other => panic!("unexpected error: {other:?}"),
    }

    assert!(!stream.is_open());
    // Rejected before any stream was requested.
    assert_eq!(server.close_count(), 0);
}

#[tokio::test]
async fn test_offset_past_stale_length_is_truncated() {
    init_tracing();
    // The server serves more than it reports.
    let server = MemoryServer::new(sample_bytes(2000)).with_reported_length(Some(1000));
    let mut stream = stream_for(&server);

    let err = stream
        .open(&DataRequest::at(video_url(), 1500))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        SourceError::TruncatedStream {
            delivered: 1000,
            expected: Some(1000),
            source: None,
            ..
        }
    ));
    assert!(!stream.is_open());
    assert!(stream.handle().is_none());
}

#[tokio::test]
async fn test_short_skip_with_unknown_length_is_truncated() {
    let server = MemoryServer::new(sample_bytes(1000)).with_reported_length(None);
    let mut stream = stream_for(&server);

    let err = stream
        .open(&DataRequest::at(video_url(), 1001))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        SourceError::TruncatedStream {
            delivered: 1000,
            expected: None,
            ..
        }
    ));
    // The partially skipped input was still released.
    assert_eq!(server.close_count(), 1);
}

#[tokio::test]
async fn test_zero_length_read() {
    let server = MemoryServer::new(sample_bytes(100));
    let mut stream = stream_for(&server);
    stream.open(&DataRequest::new(video_url())).await.unwrap();

    let mut empty: [u8; 0] = [];
    assert_eq!(stream.read(&mut empty).await.unwrap(), ReadOutcome::Read(0));
    assert_eq!(stream.handle().unwrap().cursor(), 0);
}

#[tokio::test]
async fn test_unknown_length_ends_naturally() {
    init_tracing();
    let data = sample_bytes(2500);
    let server = MemoryServer::new(data.clone()).with_reported_length(None);
    let mut stream = stream_for(&server);

    let length = stream.open(&DataRequest::new(video_url())).await.unwrap();
    assert_eq!(length, None);
    assert_eq!(stream.handle().unwrap().remaining(), None);

    let delivered = drain(&mut stream, 700).await;
    assert_eq!(delivered, data.to_vec());
}

#[tokio::test]
async fn test_reads_are_clamped_to_reported_length() {
    let data = sample_bytes(200);
    let server = MemoryServer::new(data.clone()).with_reported_length(Some(100));
    let mut stream = stream_for(&server);
    stream.open(&DataRequest::new(video_url())).await.unwrap();

    let delivered = drain(&mut stream, 64).await;
    assert_eq!(delivered, data[..100].to_vec());
}

#[tokio::test]
async fn test_early_close_by_server_is_truncated() {
    init_tracing();
    let server = MemoryServer::new(sample_bytes(1500)).with_reported_length(Some(2000));
    let mut stream = stream_for(&server);
    stream.open(&DataRequest::new(video_url())).await.unwrap();

    let mut buf = vec![0u8; 1000];
    let mut delivered = 0;
    let err = loop {
        match stream.read(&mut buf).await {
            Ok(ReadOutcome::Read(n)) => delivered += n,
            Ok(ReadOutcome::EndOfInput) => panic!("end of input before the reported length"),
            Err(e) => break e,
        }
    };

    assert_eq!(delivered, 1500);
    assert!(err.is_truncated());
    assert!(matches!(
        err,
        SourceError::TruncatedStream {
            delivered: 1500,
            expected: Some(2000),
            source: None,
            ..
        }
    ));
}

#[tokio::test]
async fn test_connection_reset_is_truncated() {
    let server = MemoryServer::new(sample_bytes(5000))
        .with_chunk(1000)
        .with_behavior(InputBehavior::ResetAfter(2000));
    let mut stream = stream_for(&server);
    stream.open(&DataRequest::new(video_url())).await.unwrap();

    let mut buf = vec![0u8; 1000];
    assert_eq!(stream.read(&mut buf).await.unwrap(), ReadOutcome::Read(1000));
    assert_eq!(stream.read(&mut buf).await.unwrap(), ReadOutcome::Read(1000));

    let err = stream.read(&mut buf).await.unwrap_err();
    match err {
        SourceError::TruncatedStream {
            delivered,
            source: Some(source),
            ..
        } => {
            assert_eq!(delivered, 2000);
            assert_eq!(source.kind(), std::io::ErrorKind::ConnectionReset);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn test_stalled_read_times_out() {
    let server = MemoryServer::new(sample_bytes(100)).with_behavior(InputBehavior::Stall);
    let mut stream = RemoteFileStream::new(
        Arc::new(server.clone()),
        Arc::new(NoCredentials),
        RemoteSourceConfig::default().with_read_timeout(Duration::from_millis(500)),
    );
    stream.open(&DataRequest::new(video_url())).await.unwrap();

    let mut buf = [0u8; 32];
    let err = stream.read(&mut buf).await.unwrap_err();
    match err {
        SourceError::TruncatedStream {
            source: Some(source),
            ..
        } => assert_eq!(source.kind(), std::io::ErrorKind::TimedOut),
        other => panic!("unexpected error: {other:?}"),
    }

    stream.close().unwrap();
}

#[tokio::test]
async fn test_metadata_failure_is_unavailable() {
    let server = MemoryServer::new(sample_bytes(10)).failing_metadata();
    let mut stream = stream_for(&server);

    let err = stream
        .open(&DataRequest::new(video_url()))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        SourceError::ResourceUnavailable {
            source: ClientError::Unauthorized { .. },
            ..
        }
    ));
    assert!(!stream.is_open());
}

#[tokio::test]
async fn test_stream_failure_is_unavailable() {
    let server = MemoryServer::new(sample_bytes(10)).failing_stream();
    let mut stream = stream_for(&server);

    let err = stream
        .open(&DataRequest::new(video_url()))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        SourceError::ResourceUnavailable {
            source: ClientError::NotFound { .. },
            ..
        }
    ));
}

#[tokio::test]
async fn test_read_before_open() {
    let server = MemoryServer::new(sample_bytes(10));
    let mut stream = stream_for(&server);

    let mut buf = [0u8; 4];
    assert!(matches!(
        stream.read(&mut buf).await,
        Err(SourceError::NotOpen)
    ));
    assert!(stream.uri().is_none());
}

#[tokio::test]
async fn test_second_open_is_rejected() {
    let server = MemoryServer::new(sample_bytes(10));
    let mut stream = stream_for(&server);
    stream.open(&DataRequest::new(video_url())).await.unwrap();

    let err = stream
        .open(&DataRequest::new(video_url()))
        .await
        .unwrap_err();
    assert!(matches!(err, SourceError::AlreadyOpen { .. }));
    // The first session is untouched.
    assert!(stream.is_open());
    assert_eq!(server.close_count(), 0);
}

#[tokio::test]
async fn test_close_is_idempotent() {
    let server = MemoryServer::new(sample_bytes(10));
    let mut stream = stream_for(&server);

    // Before open.
    stream.close().unwrap();

    stream.open(&DataRequest::new(video_url())).await.unwrap();
    stream.close().unwrap();
    stream.close().unwrap();

    assert_eq!(server.close_count(), 1);
    assert!(!stream.is_open());
    assert_eq!(stream.uri(), Some(&video_url()));

    let mut buf = [0u8; 4];
    assert!(matches!(
        stream.read(&mut buf).await,
        Err(SourceError::NotOpen)
    ));
}

#[tokio::test]
async fn test_close_failure_still_resets_state() {
    let server = MemoryServer::new(sample_bytes(10)).with_behavior(InputBehavior::FailOnClose);
    let mut stream = stream_for(&server);
    stream.open(&DataRequest::new(video_url())).await.unwrap();

    let err = stream.close().unwrap_err();
    assert!(matches!(err, SourceError::Close { .. }));
    assert!(!stream.is_open());
    assert!(!stream.has_client());

    // A second close has nothing left to release.
    stream.close().unwrap();
    assert_eq!(server.close_count(), 1);
}

#[tokio::test]
async fn test_client_rebuilt_after_close() {
    init_tracing();
    let server = MemoryServer::new(sample_bytes(3000));
    let mut stream = stream_for(&server);
    assert!(!stream.has_client());

    stream.open(&DataRequest::new(video_url())).await.unwrap();
    assert!(stream.has_client());
    assert_eq!(server.connect_count(), 1);

    stream.close().unwrap();
    assert!(!stream.has_client());

    stream
        .open(&DataRequest::at(video_url(), 2000))
        .await
        .unwrap();
    assert_eq!(server.connect_count(), 2);
    assert_eq!(drain(&mut stream, 512).await.len(), 1000);

    // Credentials are applied once per client.
    let seen = server.credentials_seen.lock().unwrap();
    assert_eq!(seen.len(), 2);
    assert!(seen.iter().all(|c| c.username == "alice"));
}

#[tokio::test]
async fn test_failed_open_keeps_client_for_retry() {
    let server = MemoryServer::new(sample_bytes(10));
    let mut stream = stream_for(&server);

    assert!(
        stream
            .open(&DataRequest::at(video_url(), 50))
            .await
            .is_err()
    );
    stream.open(&DataRequest::new(video_url())).await.unwrap();
    assert_eq!(server.connect_count(), 1);
}

#[tokio::test]
async fn test_anonymous_access_sets_no_credentials() {
    let server = MemoryServer::new(sample_bytes(10));
    let mut stream = RemoteFileStream::new(
        Arc::new(server.clone()),
        Arc::new(NoCredentials),
        RemoteSourceConfig::default(),
    );
    stream.open(&DataRequest::new(video_url())).await.unwrap();
    assert!(server.credentials_seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_transfer_events() {
    let stats = Arc::new(TransferStats::new());
    let server = MemoryServer::new(sample_bytes(4000)).with_chunk(1500);
    let mut stream = stream_for(&server).with_listener(stats.clone());

    stream
        .open(&DataRequest::at(video_url(), 1000))
        .await
        .unwrap();
    assert_eq!(stats.active_transfers(), 1);

    // Skipped bytes are not counted as transferred.
    let delivered = drain(&mut stream, 2048).await;
    assert_eq!(delivered.len(), 3000);
    stream.close().unwrap();

    let snapshot = stats.snapshot();
    assert_eq!(snapshot.transfers_initializing, 1);
    assert_eq!(snapshot.transfers_started, 1);
    assert_eq!(snapshot.transfers_ended, 1);
    assert_eq!(snapshot.bytes_transferred, 3000);
    assert_eq!(stats.active_transfers(), 0);
}

#[tokio::test]
async fn test_drop_releases_open_input() {
    let server = MemoryServer::new(sample_bytes(10));
    {
        let mut stream = stream_for(&server);
        stream.open(&DataRequest::new(video_url())).await.unwrap();
    }
    assert_eq!(server.close_count(), 1);
}
