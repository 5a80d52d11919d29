// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Request/response/notification shapes (spec §4.2 "JSON-RPC framing
//! contract"): a request carries `id`+`method`, a response carries `id`
//! without `method`, a notification carries `method` without `id`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::WireError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    pub id: i64,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl Request {
    pub fn new(id: i64, method: impl Into<String>, params: Option<Value>) -> Self {
        Self { id, method: method.into(), params }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

impl Response {
    pub fn ok(id: i64, result: Value) -> Self {
        Self { id, result: Some(result), error: None }
    }

    pub fn err(id: i64, code: i64, message: impl Into<String>) -> Self {
        Self { id, result: None, error: Some(RpcError { code, message: message.into(), data: None }) }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

/// One decoded line of the wire protocol.
#[derive(Debug, Clone)]
pub enum Message {
    Request(Request),
    Response(Response),
    Notification(Notification),
}

impl Message {
    pub fn parse(line: &str) -> Result<Self, WireError> {
        let value: Value = serde_json::from_str(line)?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self, WireError> {
        let obj = value
            .as_object()
            .ok_or_else(|| WireError::Decode("message is not a JSON object".to_string()))?;
        let has_method = obj.contains_key("method");
        let has_id = obj.contains_key("id");
        match (has_method, has_id) {
            (true, true) => Ok(Message::Request(serde_json::from_value(value)?)),
            (true, false) => Ok(Message::Notification(serde_json::from_value(value)?)),
            (false, true) => Ok(Message::Response(serde_json::from_value(value)?)),
            (false, false) => {
                Err(WireError::Decode("message has neither `method` nor `id`".to_string()))
            }
        }
    }

    pub fn to_line(&self) -> Result<String, WireError> {
        let mut s = match self {
            Self::Request(r) => serde_json::to_string(r)?,
            Self::Response(r) => serde_json::to_string(r)?,
            Self::Notification(n) => serde_json::to_string(n)?,
        };
        s.push('\n');
        Ok(s)
    }
}

#[cfg(test)]
#[path = "message_tests.rs"]
mod tests;
