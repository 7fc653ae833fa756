//! Incremental server-sent event parser
//!
//! Fed raw byte chunks as they arrive; yields complete `(event, data)` pairs.
//! Bytes are buffered until a full line is present, so a multi-byte character
//! split across chunks is decoded intact. Comment lines (keep-alives) and
//! events without data are dropped.

/// One complete SSE event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseFrame {
    pub event: String,
    pub data: String,
}

#[derive(Debug, Default)]
pub struct SseParser {
    buffer: Vec<u8>,
    event: Option<String>,
    data: Vec<String>,
}

impl SseParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk and return every event it completed
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<SseFrame> {
        self.buffer.extend_from_slice(chunk);
        let mut frames = Vec::new();

        while let Some(newline) = self.buffer.iter().position(|&b| b == b'\n') {
            let raw: Vec<u8> = self.buffer.drain(..=newline).collect();
            let line = String::from_utf8_lossy(&raw);
            let line = line.trim_end_matches(['\n', '\r']);

            if line.is_empty() {
                if let Some(frame) = self.dispatch() {
                    frames.push(frame);
                }
            } else if line.starts_with(':') {
                continue;
            } else {
                let (field, value) = line.split_once(':').unwrap_or((line, ""));
                let value = value.strip_prefix(' ').unwrap_or(value);
                match field {
                    "event" => self.event = Some(value.to_string()),
                    "data" => self.data.push(value.to_string()),
                    _ => {}
                }
            }
        }
        frames
    }

    fn dispatch(&mut self) -> Option<SseFrame> {
        let event = self.event.take();
        if self.data.is_empty() {
            return None;
        }
        let data = std::mem::take(&mut self.data).join("\n");
        Some(SseFrame {
            event: event.unwrap_or_else(|| "message".to_string()),
            data,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_split_chunks() {
        let mut parser = SseParser::new();
        assert!(parser.feed(b"event: ended\nda").is_empty());
        let frames = parser.feed(b"ta: {\"seq\":3}\n\n");
        assert_eq!(
            frames,
            vec![SseFrame {
                event: "ended".to_string(),
                data: "{\"seq\":3}".to_string(),
            }]
        );
    }

    #[test]
    fn test_skips_keep_alive_comments() {
        let mut parser = SseParser::new();
        let frames = parser.feed(b":keep-alive\n\nevent: status\ndata: {}\n\n");
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].event, "status");
    }

    #[test]
    fn test_multiple_events_and_crlf() {
        let mut parser = SseParser::new();
        let frames = parser.feed(b"event: a\r\ndata: 1\r\n\r\nevent: b\ndata: 2\ndata: 3\n\n");
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[1].data, "2\n3");
    }

    #[test]
    fn test_multibyte_character_split_across_chunks() {
        let payload = "event: added\ndata: {\"title\":\"Björk\"}\n\n".as_bytes();
        let split = payload.iter().position(|&b| b == 0xC3).unwrap() + 1;

        let mut parser = SseParser::new();
        assert!(parser.feed(&payload[..split]).is_empty());
        let frames = parser.feed(&payload[split..]);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].data, "{\"title\":\"Björk\"}");
    }
}
