// Tests for the HTTP speech-to-text client and the transcription invoker
//
// Each test starts a throwaway axum server standing in for an
// OpenAI-compatible transcription endpoint.

use anyhow::Result;
use axum::{
    body::Bytes,
    http::{HeaderMap, StatusCode},
    routing::post,
    Router,
};
use loqa_stream::config::TranscriptionConfig;
use loqa_stream::{
    AudioFragment, BatchJob, HttpSpeechToText, SpeechToText, TranscriptionError,
    TranscriptionInvoker,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

#[derive(Default)]
struct Captured {
    authorization: Option<String>,
    body: Vec<u8>,
}

async fn mock_server(
    status: StatusCode,
    response: &'static str,
    delay: Duration,
) -> Result<(String, Arc<Mutex<Captured>>)> {
    let captured = Arc::new(Mutex::new(Captured::default()));
    let sink = Arc::clone(&captured);

    let app = Router::new().route(
        "/v1/audio/transcriptions",
        post(move |headers: HeaderMap, body: Bytes| {
            let sink = Arc::clone(&sink);
            async move {
                {
                    let mut captured = sink.lock().unwrap();
                    captured.authorization = headers
                        .get("authorization")
                        .and_then(|v| v.to_str().ok())
                        .map(str::to_string);
                    captured.body = body.to_vec();
                }
                tokio::time::sleep(delay).await;
                (status, response.to_string())
            }
        }),
    );

    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    Ok((
        format!("http://{}/v1/audio/transcriptions", addr),
        captured,
    ))
}

fn transcription_config(endpoint: String) -> TranscriptionConfig {
    TranscriptionConfig {
        endpoint,
        model: "whisper-1".to_string(),
        language: "de".to_string(),
        api_key: Some("test-key".to_string()),
        timeout_secs: 1,
        file_name: "audio.webm".to_string(),
        mime_type: "audio/webm".to_string(),
    }
}

const VERBOSE_RESPONSE: &str = r#"{
    "task": "transcribe",
    "language": "german",
    "duration": 2.5,
    "text": " Guten Morgen zusammen ",
    "segments": [
        {"id": 0, "start": 0.0, "end": 1.0, "text": " Guten Morgen", "avg_logprob": 0.0},
        {"id": 1, "start": 1.0, "end": 2.5, "text": " zusammen", "avg_logprob": -0.6931471805599453}
    ]
}"#;

#[tokio::test]
async fn test_request_carries_audio_model_and_language() -> Result<()> {
    let (endpoint, captured) =
        mock_server(StatusCode::OK, VERBOSE_RESPONSE, Duration::ZERO).await?;
    let client = HttpSpeechToText::new(&transcription_config(endpoint))?;

    let response = client.transcribe(b"OPUS-BLOB".to_vec(), "de").await?;
    assert_eq!(response.text, " Guten Morgen zusammen ");
    assert_eq!(response.segments.as_ref().map(Vec::len), Some(2));

    let captured = captured.lock().unwrap();
    assert_eq!(captured.authorization.as_deref(), Some("Bearer test-key"));

    let body = String::from_utf8_lossy(&captured.body);
    assert!(body.contains("OPUS-BLOB"));
    assert!(body.contains("whisper-1"));
    assert!(body.contains("verbose_json"));
    assert!(body.contains("name=\"language\""));
    assert!(body.contains("filename=\"audio.webm\""));

    Ok(())
}

#[tokio::test]
async fn test_invoker_maps_response_to_result() -> Result<()> {
    let (endpoint, _captured) =
        mock_server(StatusCode::OK, VERBOSE_RESPONSE, Duration::ZERO).await?;
    let backend = Arc::new(HttpSpeechToText::new(&transcription_config(endpoint))?);
    let invoker = TranscriptionInvoker::new(backend, "de");

    let job = BatchJob::finalize(vec![AudioFragment::new(0, b"audio".to_vec())]);
    let result = invoker.invoke(&job).await?.expect("should produce a transcript");

    assert_eq!(result.text, "Guten Morgen zusammen");
    assert!(result.is_final);

    let segments = result.segments.expect("segments present");
    assert_eq!(segments.len(), 2);
    assert_eq!(segments[1].text, "zusammen");
    assert_eq!(segments[1].end, 2.5);

    // mean(exp(0), exp(ln 0.5)) = 0.75
    assert!((result.confidence - 0.75).abs() < 1e-4);

    Ok(())
}

#[tokio::test]
async fn test_blank_text_is_no_result() -> Result<()> {
    let (endpoint, _captured) =
        mock_server(StatusCode::OK, r#"{"text": "  \n "}"#, Duration::ZERO).await?;
    let backend = Arc::new(HttpSpeechToText::new(&transcription_config(endpoint))?);
    let invoker = TranscriptionInvoker::new(backend, "de");

    let job = BatchJob::timer(vec![AudioFragment::new(0, b"silence".to_vec())]);
    assert_eq!(invoker.invoke(&job).await?, None);

    Ok(())
}

#[tokio::test]
async fn test_plain_json_response_has_full_confidence() -> Result<()> {
    let (endpoint, _captured) =
        mock_server(StatusCode::OK, r#"{"text": "hello"}"#, Duration::ZERO).await?;
    let backend = Arc::new(HttpSpeechToText::new(&transcription_config(endpoint))?);
    let invoker = TranscriptionInvoker::new(backend, "en");

    let job = BatchJob::timer(vec![AudioFragment::new(0, b"x".to_vec())]);
    let result = invoker.invoke(&job).await?.expect("should produce a transcript");
    assert_eq!(result.confidence, 1.0);
    assert!(result.segments.is_none());
    assert!(!result.is_final);

    Ok(())
}

#[tokio::test]
async fn test_rate_limit_maps_to_rate_limited() -> Result<()> {
    let (endpoint, _captured) =
        mock_server(StatusCode::TOO_MANY_REQUESTS, "slow down", Duration::ZERO).await?;
    let client = HttpSpeechToText::new(&transcription_config(endpoint))?;

    let err = client.transcribe(b"x".to_vec(), "en").await.unwrap_err();
    assert_eq!(err, TranscriptionError::RateLimited);

    Ok(())
}

#[tokio::test]
async fn test_server_error_message_is_extracted() -> Result<()> {
    let (endpoint, _captured) = mock_server(
        StatusCode::BAD_REQUEST,
        r#"{"error": {"message": "Invalid file format.", "type": "invalid_request_error"}}"#,
        Duration::ZERO,
    )
    .await?;
    let client = HttpSpeechToText::new(&transcription_config(endpoint))?;

    let err = client.transcribe(b"x".to_vec(), "en").await.unwrap_err();
    assert_eq!(
        err,
        TranscriptionError::Status {
            status: 400,
            message: "Invalid file format.".to_string(),
        }
    );

    Ok(())
}

#[tokio::test]
async fn test_malformed_body_is_reported() -> Result<()> {
    let (endpoint, _captured) =
        mock_server(StatusCode::OK, "<html>oops</html>", Duration::ZERO).await?;
    let client = HttpSpeechToText::new(&transcription_config(endpoint))?;

    let err = client.transcribe(b"x".to_vec(), "en").await.unwrap_err();
    assert!(matches!(err, TranscriptionError::MalformedResponse(_)));

    Ok(())
}

#[tokio::test]
async fn test_slow_backend_times_out() -> Result<()> {
    let (endpoint, _captured) =
        mock_server(StatusCode::OK, r#"{"text": "late"}"#, Duration::from_secs(5)).await?;
    let client = HttpSpeechToText::new(&transcription_config(endpoint))?;

    let err = client.transcribe(b"x".to_vec(), "en").await.unwrap_err();
    assert_eq!(err, TranscriptionError::Timeout);

    Ok(())
}

#[tokio::test]
async fn test_unreachable_backend_is_transport_error() -> Result<()> {
    // Bind then drop to get a port nobody listens on
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    drop(listener);

    let endpoint = format!("http://{}/v1/audio/transcriptions", addr);
    let client = HttpSpeechToText::new(&transcription_config(endpoint))?;

    let err = client.transcribe(b"x".to_vec(), "en").await.unwrap_err();
    assert!(matches!(err, TranscriptionError::Transport(_)), "got {:?}", err);

    Ok(())
}
