use std::collections::VecDeque;

use futures::stream::{self, BoxStream, Stream, StreamExt};
use reqwest::header::{ACCEPT, CACHE_CONTROL, CONTENT_TYPE};
use reqwest::{Client, Response};
use url::Url;

use crate::error::{AppError, Context, Result};

use super::decode::SseDecoder;

pub const EVENT_STREAM_MIME: &str = "text/event-stream";

/// Ordered payloads of one server-push connection. Dropping it closes the connection.
pub type FrameStream = BoxStream<'static, Result<String>>;

/// Open the progress stream and return its frame payloads.
pub async fn open_event_stream(client: &Client, url: Url) -> Result<FrameStream> {
    log::info!("Opening export stream at {}", url);

    let response = client
        .get(url.clone())
        .header(ACCEPT, EVENT_STREAM_MIME)
        .header(CACHE_CONTROL, "no-cache")
        .send()
        .await
        .with_context(|| format!("Export stream request to {} failed", url))?;

    let status = response.status();
    if !status.is_success() {
        return Err(AppError::message(format!(
            "Export stream request returned {}",
            status
        )));
    }

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    if !content_type.starts_with(EVENT_STREAM_MIME) {
        log::warn!(
            "Export stream answered with content type `{}`; decoding anyway",
            content_type
        );
    }

    Ok(decode_frames(response_chunks(response)))
}

fn response_chunks(response: Response) -> impl Stream<Item = Result<Vec<u8>>> + Send + 'static {
    stream::unfold(Some(response), |state| async move {
        let mut response = state?;
        match response.chunk().await {
            Ok(Some(bytes)) => Some((Ok(bytes.to_vec()), Some(response))),
            Ok(None) => None,
            Err(err) => Some((Err(AppError::from(err)), None)),
        }
    })
}

/// Turn a stream of raw body chunks into a stream of event payloads. A chunk
/// error is yielded once and ends the stream.
pub fn decode_frames<S, B>(chunks: S) -> FrameStream
where
    S: Stream<Item = Result<B>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
{
    struct State<S> {
        chunks: S,
        decoder: SseDecoder,
        ready: VecDeque<String>,
        finished: bool,
    }

    let state = State {
        chunks: Box::pin(chunks),
        decoder: SseDecoder::new(),
        ready: VecDeque::new(),
        finished: false,
    };

    stream::unfold(state, |mut state| async move {
        loop {
            if let Some(payload) = state.ready.pop_front() {
                return Some((Ok(payload), state));
            }
            if state.finished {
                return None;
            }
            match state.chunks.next().await {
                Some(Ok(chunk)) => {
                    let events = state.decoder.push(chunk.as_ref());
                    state.ready.extend(events);
                }
                Some(Err(err)) => {
                    state.finished = true;
                    return Some((Err(err), state));
                }
                None => state.finished = true,
            }
        }
    })
    .boxed()
}
