use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::stream::Stream;

use augur_core::error::{AugurError, Result};

/// Parse a raw SSE byte stream into individual events.
/// SSE format: `event: <type>\ndata: <json>\n\n`
#[derive(Default)]
pub struct SseParser {
    buffer: String,
}

/// A parsed SSE event.
#[derive(Debug, Clone)]
pub struct SseEvent {
    pub event_type: Option<String>,
    pub data: String,
}

impl SseParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed text into the parser and extract complete events.
    pub fn feed(&mut self, chunk: &str) -> Vec<SseEvent> {
        // Some servers frame events with CRLF
        self.buffer.push_str(&chunk.replace("\r\n", "\n"));
        let mut events = Vec::new();

        while let Some(pos) = self.buffer.find("\n\n") {
            let block: String = self.buffer.drain(..pos + 2).collect();

            let mut event_type = None;
            let mut data_lines = Vec::new();

            for line in block.lines() {
                if let Some(val) = line.strip_prefix("event:") {
                    event_type = Some(val.trim_start().to_string());
                } else if let Some(val) = line.strip_prefix("data:") {
                    data_lines.push(val.strip_prefix(' ').unwrap_or(val).to_string());
                }
            }

            if !data_lines.is_empty() {
                events.push(SseEvent {
                    event_type,
                    data: data_lines.join("\n"),
                });
            }
        }

        events
    }
}

/// A stream of SSE events from raw bytes.
///
/// Bytes are buffered until they form valid UTF-8, so a multi-byte
/// character split across network chunks is not lost. Invalid bytes are
/// replaced rather than buffered. A transport error ends the stream with an
/// `LlmStream` error.
pub struct SseStream<S> {
    inner: S,
    parser: SseParser,
    pending: VecDeque<SseEvent>,
    partial: Vec<u8>,
    failed: bool,
}

impl<S> SseStream<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            parser: SseParser::new(),
            pending: VecDeque::new(),
            partial: Vec::new(),
            failed: false,
        }
    }
}

/// Take the decodable prefix of `buf`, leaving only an incomplete trailing
/// character behind.
fn take_utf8(buf: &mut Vec<u8>) -> String {
    let mut text = String::new();
    loop {
        match std::str::from_utf8(buf) {
            Ok(s) => {
                text.push_str(s);
                buf.clear();
                return text;
            }
            Err(e) => {
                let valid = e.valid_up_to();
                text.push_str(&String::from_utf8_lossy(&buf[..valid]));
                match e.error_len() {
                    Some(bad) => {
                        text.push(char::REPLACEMENT_CHARACTER);
                        buf.drain(..valid + bad);
                    }
                    None => {
                        buf.drain(..valid);
                        return text;
                    }
                }
            }
        }
    }
}

impl<S, E> Stream for SseStream<S>
where
    S: Stream<Item = std::result::Result<bytes::Bytes, E>> + Unpin,
    E: std::fmt::Display,
{
    type Item = Result<SseEvent>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        loop {
            if let Some(event) = this.pending.pop_front() {
                return Poll::Ready(Some(Ok(event)));
            }
            if this.failed {
                return Poll::Ready(None);
            }

            match Pin::new(&mut this.inner).poll_next(cx) {
                Poll::Ready(Some(Ok(bytes))) => {
                    this.partial.extend_from_slice(&bytes);
                    let text = take_utf8(&mut this.partial);
                    if !text.is_empty() {
                        this.pending.extend(this.parser.feed(&text));
                    }
                }
                Poll::Ready(Some(Err(e))) => {
                    this.failed = true;
                    return Poll::Ready(Some(Err(AugurError::LlmStream(e.to_string()))));
                }
                Poll::Ready(None) => return Poll::Ready(None),
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[test]
    fn test_sse_parser_basic() {
        let mut parser = SseParser::new();
        let events = parser.feed("event: message\ndata: {\"x\":1}\n\n");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type.as_deref(), Some("message"));
        assert_eq!(events[0].data, "{\"x\":1}");
    }

    #[test]
    fn test_sse_parser_chunked() {
        let mut parser = SseParser::new();
        let events = parser.feed("data: {\"x\":");
        assert_eq!(events.len(), 0);
        let events = parser.feed("1}\n\ndata: [DONE]\n\n");
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].data, "{\"x\":1}");
        assert_eq!(events[1].data, "[DONE]");
    }

    #[test]
    fn test_sse_parser_crlf_and_no_space() {
        let mut parser = SseParser::new();
        let events = parser.feed("data:{\"y\":2}\r\n\r\n");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].data, "{\"y\":2}");
    }

    #[tokio::test]
    async fn test_stream_keeps_split_utf8() {
        let text = "data: 乾为天\n\n".as_bytes().to_vec();
        // Split inside the first multi-byte character
        let chunks: Vec<std::result::Result<bytes::Bytes, std::io::Error>> = vec![
            Ok(bytes::Bytes::copy_from_slice(&text[..7])),
            Ok(bytes::Bytes::copy_from_slice(&text[7..])),
        ];
        let events: Vec<SseEvent> = SseStream::new(futures::stream::iter(chunks))
            .map(|e| e.unwrap())
            .collect()
            .await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].data, "乾为天");
    }

    #[tokio::test]
    async fn test_transport_error_surfaces_after_events() {
        let chunks: Vec<std::result::Result<bytes::Bytes, std::io::Error>> = vec![
            Ok(bytes::Bytes::from_static("data: 乾\n\n".as_bytes())),
            Err(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "connection reset",
            )),
            Ok(bytes::Bytes::from_static(b"data: never\n\n")),
        ];
        let items: Vec<Result<SseEvent>> = SseStream::new(futures::stream::iter(chunks))
            .collect()
            .await;
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].as_ref().unwrap().data, "乾");
        assert!(
            matches!(&items[1], Err(AugurError::LlmStream(m)) if m.contains("connection reset"))
        );
    }

    #[tokio::test]
    async fn test_invalid_byte_does_not_stall_stream() {
        let chunks: Vec<std::result::Result<bytes::Bytes, std::io::Error>> = vec![
            Ok(bytes::Bytes::from_static(b"data: a\xff\n\n")),
            Ok(bytes::Bytes::from_static(b"data: second\n\ndata: third\n\n")),
        ];
        let events: Vec<SseEvent> = SseStream::new(futures::stream::iter(chunks))
            .map(|e| e.unwrap())
            .collect()
            .await;
        let data: Vec<&str> = events.iter().map(|e| e.data.as_str()).collect();
        assert_eq!(data, vec!["a\u{FFFD}", "second", "third"]);
    }

    #[test]
    fn test_take_utf8_keeps_incomplete_tail() {
        let mut buf = "乾".as_bytes()[..2].to_vec();
        assert_eq!(take_utf8(&mut buf), "");
        assert_eq!(buf.len(), 2);

        let mut buf = b"ok\xffgo".to_vec();
        assert_eq!(take_utf8(&mut buf), "ok\u{FFFD}go");
        assert!(buf.is_empty());
    }
}
