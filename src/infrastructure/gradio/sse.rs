//! Server-sent-event parsing for Gradio `/call/{api}/{event_id}` streams.

use crate::domain::tryon::errors::TryOnError;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    pub event: String,
    pub data: String,
}

pub fn parse_events(body: &str) -> Vec<SseEvent> {
    let mut events = Vec::new();
    let mut event = String::new();
    let mut data: Vec<&str> = Vec::new();

    for line in body.lines().chain(std::iter::once("")) {
        if line.is_empty() {
            if !event.is_empty() || !data.is_empty() {
                events.push(SseEvent {
                    event: if event.is_empty() {
                        "message".to_string()
                    } else {
                        std::mem::take(&mut event)
                    },
                    data: data.join("\n"),
                });
                data.clear();
            }
        } else if let Some(rest) = line.strip_prefix("event:") {
            event = rest.trim().to_string();
        } else if let Some(rest) = line.strip_prefix("data:") {
            data.push(rest.trim());
        }
    }
    events
}

/// Output payload of the `complete` event, or the failure the stream reported.
pub fn completion(body: &str) -> Result<Value, TryOnError> {
    for event in parse_events(body) {
        match event.event.as_str() {
            "complete" => {
                if event.data.is_empty() || event.data == "null" {
                    return Err(TryOnError::Remote(
                        "Server returned no result. The AI service may be unavailable.".into(),
                    ));
                }
                return serde_json::from_str(&event.data).map_err(|e| {
                    TryOnError::Decode(format!("Malformed completion payload: {}", e))
                });
            }
            "error" => return Err(TryOnError::remote(error_message(&event.data))),
            _ => {}
        }
    }
    Err(TryOnError::Remote(
        "Result stream ended without a completion event".into(),
    ))
}

fn error_message(data: &str) -> String {
    match serde_json::from_str::<Value>(data) {
        Ok(Value::String(message)) => message,
        Ok(Value::Null) | Err(_) if data.is_empty() || data == "null" => {
            "The remote service reported an error".to_string()
        }
        Ok(Value::Object(map)) => map
            .get("error")
            .or_else(|| map.get("message"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| data.to_string()),
        _ => data.to_string(),
    }
}
