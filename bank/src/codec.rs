//! Datagram codec.
//!
//! One message is one datagram. Both directions are UTF-8 JSON objects that
//! carry the protocol version next to the message fields:
//!
//! ```text
//! request:  {"version":1,"id":7,"command":"DEPOSIT","argument":"100"}
//! response: {"version":1,"id":7,"success":true,"payload":100}
//!           {"version":1,"id":8,"success":false,"payload":"Unknown command: FOO"}
//! ```
//!
//! `id` and `argument` are left out when there is none. The server copies the
//! request `id` into its reply so the client can match a reply to the request
//! it is waiting on and skip late answers to earlier ones. Only the two message
//! shapes are ever deserialized.

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

use crate::error::CodecError;
use crate::messages::{Payload, Request, Response};

pub const PROTOCOL_VERSION: u8 = 1;

/// Largest payload either side will send or accept.
pub const MAX_DATAGRAM_SIZE: usize = 1024;

/// Chosen by the client, echoed by the server.
pub type RequestId = u64;

#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct RequestFrame<S> {
    version: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<RequestId>,
    command: S,
    #[serde(skip_serializing_if = "Option::is_none")]
    argument: Option<S>,
}

#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct ResponseFrame<P> {
    version: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<RequestId>,
    success: bool,
    payload: P,
}

pub fn encode_request(request: &Request) -> Result<Vec<u8>, CodecError> {
    encode_tagged_request(None, request)
}

pub fn encode_tagged_request(
    id: Option<RequestId>,
    request: &Request,
) -> Result<Vec<u8>, CodecError> {
    encode(&RequestFrame {
        version: PROTOCOL_VERSION,
        id,
        command: request.command.as_str(),
        argument: request.argument.as_deref(),
    })
}

pub fn decode_request(bytes: &[u8]) -> Result<Request, CodecError> {
    decode_tagged_request(bytes).map(|(_id, request)| request)
}

pub fn decode_tagged_request(bytes: &[u8]) -> Result<(Option<RequestId>, Request), CodecError> {
    let frame: RequestFrame<String> = decode(bytes)?;
    let request = Request {
        command: frame.command,
        argument: frame.argument,
    };
    Ok((frame.id, request))
}

pub fn encode_response(response: &Response) -> Result<Vec<u8>, CodecError> {
    encode_tagged_response(None, response)
}

pub fn encode_tagged_response(
    id: Option<RequestId>,
    response: &Response,
) -> Result<Vec<u8>, CodecError> {
    encode(&ResponseFrame {
        version: PROTOCOL_VERSION,
        id,
        success: response.success,
        payload: &response.payload,
    })
}

pub fn decode_response(bytes: &[u8]) -> Result<Response, CodecError> {
    decode_tagged_response(bytes).map(|(_id, response)| response)
}

pub fn decode_tagged_response(
    bytes: &[u8],
) -> Result<(Option<RequestId>, Response), CodecError> {
    let frame: ResponseFrame<Payload> = decode(bytes)?;
    let response = Response {
        success: frame.success,
        payload: frame.payload,
    };
    Ok((frame.id, response))
}

/// Best-effort read of the `id` of a request that failed to decode, so the
/// failure reply can still carry it.
pub fn request_id(bytes: &[u8]) -> Option<RequestId> {
    if bytes.len() > MAX_DATAGRAM_SIZE {
        return None;
    }
    let value: Value = serde_json::from_slice(bytes).ok()?;
    value.get("id")?.as_u64()
}

fn encode<T: Serialize>(frame: &T) -> Result<Vec<u8>, CodecError> {
    let bytes = serde_json::to_vec(frame)?;
    if bytes.len() > MAX_DATAGRAM_SIZE {
        return Err(CodecError::Oversized {
            size: bytes.len(),
            limit: MAX_DATAGRAM_SIZE,
        });
    }
    Ok(bytes)
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, CodecError> {
    if bytes.is_empty() {
        return Err(CodecError::Unreadable("empty datagram".to_string()));
    }
    // A receive buffer one byte over the limit cuts longer datagrams short, so
    // their text cannot be trusted to parse.
    if bytes.len() > MAX_DATAGRAM_SIZE {
        return Err(oversized_datagram());
    }
    let text =
        std::str::from_utf8(bytes).map_err(|error| CodecError::Unreadable(error.to_string()))?;
    let value: Value =
        serde_json::from_str(text).map_err(|error| CodecError::Unreadable(error.to_string()))?;

    // Checked before the shape, a future version may change the fields.
    match value.get("version").and_then(Value::as_u64) {
        Some(version) if version == u64::from(PROTOCOL_VERSION) => {}
        Some(version) => return Err(CodecError::UnsupportedVersion(version)),
        None => {
            return Err(CodecError::Malformed(
                "missing or invalid protocol version".to_string(),
            ))
        }
    }

    serde_json::from_value(value).map_err(|error| CodecError::Malformed(error.to_string()))
}

pub fn oversized_datagram() -> CodecError {
    CodecError::Malformed(format!("datagram exceeds {MAX_DATAGRAM_SIZE} bytes"))
}
