// Length-prefixed JSON chunk streaming
use crate::application::stats_service::StatsMessage;
use crate::infrastructure::json_renderer::message_to_json;
use async_compression::tokio::bufread::BrotliEncoder;
use axum::body::Body;
use axum::http::{header, Response, StatusCode};
use axum::response::IntoResponse;
use bytes::{BufMut, Bytes, BytesMut};
use futures::stream::Stream;
use futures::StreamExt;
use tokio::io::AsyncReadExt;

/// Create a chunked streaming response, one frame per message
pub async fn chunked_json_stream<S>(stream: S, compress: bool) -> Result<Response<Body>, StatusCode>
where
    S: Stream<Item = StatsMessage> + Send + 'static,
{
    let byte_stream = stream.then(move |msg| async move { serialize_chunk(msg, compress).await });

    let body = Body::from_stream(byte_stream);

    // Frames are compressed individually, so no Content-Encoding on the response
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/x-ndjson-framed")
        .header(header::TRANSFER_ENCODING, "chunked")
        .body(body)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}

/// Frame layout: 4-byte big-endian payload length, then the payload
pub async fn serialize_chunk(msg: StatsMessage, compress: bool) -> Result<Bytes, std::io::Error> {
    let buffer = serde_json::to_vec(&message_to_json(&msg))?;

    let payload = if compress {
        let mut encoder = BrotliEncoder::new(std::io::Cursor::new(buffer));
        let mut compressed = Vec::new();
        encoder.read_to_end(&mut compressed).await?;
        compressed
    } else {
        buffer
    };

    let mut chunk = BytesMut::with_capacity(4 + payload.len());
    chunk.put_u32(payload.len() as u32);
    chunk.put_slice(&payload);

    Ok(chunk.freeze())
}

pub async fn stream_from_receiver(
    mut rx: tokio::sync::mpsc::Receiver<StatsMessage>,
    compress: bool,
) -> impl IntoResponse {
    let stream = async_stream::stream! {
        while let Some(msg) = rx.recv().await {
            yield msg;
        }
    };

    match chunked_json_stream(stream, compress).await {
        Ok(response) => response,
        Err(status) => status.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_uncompressed_frame_has_length_prefix() {
        let msg = StatsMessage::Complete {
            panels: 0,
            dropped_rows: 0,
            duration_ms: 3,
        };

        let chunk = serialize_chunk(msg, false).await.unwrap();

        let len = u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]) as usize;
        assert_eq!(len, chunk.len() - 4);
        let body: serde_json::Value = serde_json::from_slice(&chunk[4..]).unwrap();
        assert_eq!(body["type"], "complete");
    }
}
