//! Captions: download a timed-text XML document and flatten it to lines.
//!
//! YouTube serves captions as
//!
//! ```xml
//! <transcript>
//!   <text start="0.0" dur="2.1">so today we&amp;#39;re looking at</text>
//!   <text start="2.1" dur="3.0">the borrow checker</text>
//! </transcript>
//! ```
//!
//! Every failure mode (404, other status, non-text body, broken XML, no
//! `<text>` elements) degrades to `None`; whether that is fatal is the
//! orchestrator's decision.

use crate::config::GenerationConfig;
use crate::output::CaptionLine;
use async_trait::async_trait;
use quick_xml::events::Event;
use quick_xml::Reader;
use reqwest::StatusCode;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Source of caption lines for a captions URL.
#[async_trait]
pub trait CaptionsSource: Send + Sync {
    /// `None` when the captions are absent or unusable. Never fails.
    async fn parse(&self, url: &str) -> Option<Vec<CaptionLine>>;
}

/// Downloads captions over HTTP with a bounded timeout.
pub struct HttpCaptions {
    client: reqwest::Client,
}

impl HttpCaptions {
    pub fn from_config(config: &GenerationConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.captions_timeout_secs))
            .build()?;
        Ok(Self { client })
    }

    async fn download(&self, url: &str) -> Result<Option<String>, reqwest::Error> {
        let response = self.client.get(url).send().await?;

        match classify_status(response.status()) {
            StatusClass::Missing => {
                info!("Captions URL returned 404, treating as no captions");
                return Ok(None);
            }
            StatusClass::Unexpected(status) => {
                warn!("Unexpected status {} while fetching captions", status);
                return Ok(None);
            }
            StatusClass::Ok => {}
        }

        let is_json = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.contains("json"));
        if is_json {
            warn!("Captions endpoint returned JSON instead of XML");
            return Ok(None);
        }

        let bytes = response.bytes().await?;
        match String::from_utf8(bytes.to_vec()) {
            Ok(body) if !body.trim().is_empty() => Ok(Some(body)),
            _ => {
                warn!("Captions body is empty or not valid UTF-8");
                Ok(None)
            }
        }
    }
}

#[async_trait]
impl CaptionsSource for HttpCaptions {
    async fn parse(&self, url: &str) -> Option<Vec<CaptionLine>> {
        let body = match self.download(url).await {
            Ok(Some(body)) => body,
            Ok(None) => return None,
            Err(e) => {
                warn!("Captions download failed — {}", e);
                return None;
            }
        };
        parse_timed_text(&body)
    }
}

/// How a captions response status is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    Ok,
    /// 404: the video has no captions at that URL.
    Missing,
    Unexpected(StatusCode),
}

pub fn classify_status(status: StatusCode) -> StatusClass {
    match status {
        StatusCode::OK => StatusClass::Ok,
        StatusCode::NOT_FOUND => StatusClass::Missing,
        other => StatusClass::Unexpected(other),
    }
}

/// Extract the text content of every `<text>` element, in document order.
///
/// Text nested inside child elements (e.g. `<font>`) is included. Returns
/// `None` if the XML is malformed or contains no `<text>` elements.
pub fn parse_timed_text(xml: &str) -> Option<Vec<CaptionLine>> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(false);

    let mut lines = Vec::new();
    // Nesting depth inside the current <text>; 0 when outside.
    let mut depth = 0usize;
    let mut current = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                if depth > 0 {
                    depth += 1;
                } else if e.local_name().as_ref() == b"text" {
                    depth = 1;
                    current.clear();
                }
            }
            Ok(Event::End(_)) if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    lines.push(CaptionLine {
                        text: std::mem::take(&mut current),
                    });
                }
            }
            Ok(Event::Empty(e)) => {
                if depth == 0 && e.local_name().as_ref() == b"text" {
                    lines.push(CaptionLine {
                        text: String::new(),
                    });
                }
            }
            Ok(Event::Text(t)) if depth > 0 => match t.unescape() {
                Ok(s) => current.push_str(&s),
                Err(_) => current.push_str(&String::from_utf8_lossy(&t)),
            },
            Ok(Event::CData(c)) if depth > 0 => {
                current.push_str(&String::from_utf8_lossy(&c));
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                warn!(
                    "Captions XML parse error at byte {}: {}",
                    reader.buffer_position(),
                    e
                );
                return None;
            }
            _ => {}
        }
    }

    if depth > 0 {
        warn!("Captions XML ended inside a <text> element");
        return None;
    }

    debug!("Parsed {} caption lines", lines.len());
    if lines.is_empty() {
        None
    } else {
        Some(lines)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// One-shot HTTP server answering a single request with a canned response.
    async fn serve_once(
        status: &'static str,
        content_type: &'static str,
        body: &'static str,
    ) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            if let Ok((mut socket, _)) = listener.accept().await {
                let mut buf = [0u8; 4096];
                let _ = socket.read(&mut buf).await;
                let response = format!(
                    "HTTP/1.1 {status}\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });
        format!("http://{addr}/api/timedtext")
    }

    /// Accepts the connection and never answers.
    async fn serve_silence() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            if let Ok((socket, _)) = listener.accept().await {
                tokio::time::sleep(Duration::from_secs(30)).await;
                drop(socket);
            }
        });
        format!("http://{addr}/api/timedtext")
    }

    fn http_captions() -> HttpCaptions {
        let config = GenerationConfig::builder()
            .captions_timeout_secs(1)
            .build()
            .unwrap();
        HttpCaptions::from_config(&config).unwrap()
    }

    fn texts(lines: &[CaptionLine]) -> Vec<&str> {
        lines.iter().map(|l| l.text.as_str()).collect()
    }

    #[test]
    fn extracts_text_elements_in_order() {
        let xml = r#"<?xml version="1.0" encoding="utf-8" ?>
<transcript>
  <text start="0.0" dur="2.1">so today we are looking at</text>
  <text start="2.1" dur="3.0">the borrow checker</text>
  <text start="5.1" dur="1.0">and lifetimes</text>
</transcript>"#;
        let lines = parse_timed_text(xml).expect("captions");
        assert_eq!(
            texts(&lines),
            vec!["so today we are looking at", "the borrow checker", "and lifetimes"]
        );
    }

    #[test]
    fn unescapes_entities() {
        let xml = r#"<transcript><text start="0">Tom &amp; Jerry &lt;3</text></transcript>"#;
        let lines = parse_timed_text(xml).unwrap();
        assert_eq!(lines[0].text, "Tom & Jerry <3");
    }

    #[test]
    fn includes_nested_descendant_text() {
        let xml = r#"<transcript><text>hello <font color="red">bright</font> world</text></transcript>"#;
        let lines = parse_timed_text(xml).unwrap();
        assert_eq!(texts(&lines), vec!["hello bright world"]);
    }

    #[test]
    fn empty_text_elements_are_kept() {
        let xml = r#"<transcript><text/><text>after</text><text></text></transcript>"#;
        let lines = parse_timed_text(xml).unwrap();
        assert_eq!(texts(&lines), vec!["", "after", ""]);
    }

    #[test]
    fn no_text_elements_is_none() {
        assert_eq!(parse_timed_text("<transcript></transcript>"), None);
        assert_eq!(parse_timed_text(r#"<timedtext format="3"><body/></timedtext>"#), None);
        assert_eq!(parse_timed_text(""), None);
    }

    #[test]
    fn malformed_xml_is_none() {
        assert_eq!(
            parse_timed_text("<transcript><text>unclosed</transcript>"),
            None
        );
        assert_eq!(parse_timed_text("<transcript><text>dangling"), None);
    }

    #[test]
    fn status_classification() {
        assert_eq!(classify_status(StatusCode::OK), StatusClass::Ok);
        assert_eq!(classify_status(StatusCode::NOT_FOUND), StatusClass::Missing);
        assert_eq!(
            classify_status(StatusCode::FORBIDDEN),
            StatusClass::Unexpected(StatusCode::FORBIDDEN)
        );
        assert_eq!(
            classify_status(StatusCode::NO_CONTENT),
            StatusClass::Unexpected(StatusCode::NO_CONTENT)
        );
    }

    #[tokio::test]
    async fn downloads_and_parses_xml() {
        let url = serve_once(
            "200 OK",
            "text/xml; charset=UTF-8",
            r#"<transcript><text start="0">first line</text><text start="1">second line</text></transcript>"#,
        )
        .await;
        let lines = http_captions().parse(&url).await.expect("captions");
        assert_eq!(texts(&lines), vec!["first line", "second line"]);
    }

    #[tokio::test]
    async fn not_found_is_none() {
        let url = serve_once("404 Not Found", "text/plain", "Not Found").await;
        assert_eq!(http_captions().parse(&url).await, None);
    }

    #[tokio::test]
    async fn server_error_is_none() {
        let url = serve_once("500 Internal Server Error", "text/plain", "boom").await;
        assert_eq!(http_captions().parse(&url).await, None);
    }

    #[tokio::test]
    async fn json_body_is_none() {
        let url = serve_once("200 OK", "application/json", r#"{"error":"no captions"}"#).await;
        assert_eq!(http_captions().parse(&url).await, None);
    }

    #[tokio::test]
    async fn empty_body_is_none() {
        let url = serve_once("200 OK", "text/xml", "").await;
        assert_eq!(http_captions().parse(&url).await, None);
    }

    #[tokio::test]
    async fn silent_server_times_out_to_none() {
        let url = serve_silence().await;
        let started = Instant::now();
        assert_eq!(http_captions().parse(&url).await, None);
        assert!(
            started.elapsed() < Duration::from_secs(3),
            "took {:?}",
            started.elapsed()
        );
    }
}
