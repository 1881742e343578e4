//! Server-Sent Events framing for the import progress stream
//!
//! `SseDecoder` plugs into `tokio_util::codec::FramedRead`; each blank line
//! terminates a frame and consecutive `data:` lines are joined with `\n`.

use std::io;

use tokio_util::bytes::BytesMut;
use tokio_util::codec::Decoder;

/// One dispatched event
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SseFrame {
    pub event: Option<String>,
    pub id: Option<String>,
    pub data: String,
}

#[derive(Debug, Default)]
pub struct SseDecoder {
    event: Option<String>,
    id: Option<String>,
    data: Vec<String>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    fn push_line(&mut self, line: &str) {
        // comment / keep-alive
        if line.starts_with(':') {
            return;
        }
        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };
        match field {
            "data" => self.data.push(value.to_string()),
            "event" => self.event = Some(value.to_string()),
            "id" => self.id = Some(value.to_string()),
            _ => {}
        }
    }

    fn take_frame(&mut self) -> Option<SseFrame> {
        if self.data.is_empty() {
            self.event = None;
            return None;
        }
        Some(SseFrame {
            event: self.event.take(),
            id: self.id.clone(),
            data: std::mem::take(&mut self.data).join("\n"),
        })
    }
}

impl Decoder for SseDecoder {
    type Item = SseFrame;
    type Error = io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        while let Some(pos) = src.iter().position(|b| *b == b'\n') {
            let raw = src.split_to(pos + 1);
            let line = std::str::from_utf8(&raw).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
            let line = line.trim_end_matches(['\n', '\r']);

            if line.is_empty() {
                if let Some(frame) = self.take_frame() {
                    return Ok(Some(frame));
                }
            } else {
                self.push_line(line);
            }
        }
        Ok(None)
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(frame) = self.decode(src)? {
            return Ok(Some(frame));
        }
        if !src.is_empty() {
            let rest = src.split();
            let line = std::str::from_utf8(&rest).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
            let line = line.trim_end_matches('\r');
            if !line.is_empty() {
                self.push_line(line);
            }
        }
        Ok(self.take_frame())
    }
}
