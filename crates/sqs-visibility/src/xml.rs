//! Parsing of SQS Query API XML responses.

use crate::error::SqsError;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::collections::HashMap;

/// Parse a `GetQueueAttributes` response into name/value pairs
pub(crate) fn parse_attributes(xml: &str) -> Result<HashMap<String, String>, SqsError> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut attributes = HashMap::new();
    let mut in_attribute = false;
    let mut in_name = false;
    let mut in_value = false;
    let mut current_name: Option<String> = None;
    let mut current_value: Option<String> = None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.name().as_ref() {
                b"Attribute" => {
                    in_attribute = true;
                    current_name = None;
                    current_value = None;
                }
                b"Name" if in_attribute => in_name = true,
                b"Value" if in_attribute => in_value = true,
                _ => {}
            },
            Ok(Event::Text(e)) => {
                let text = e.unescape().map(|s| s.into_owned()).map_err(|e| {
                    SqsError::Serialization(format!("Failed to parse XML: {}", e))
                })?;
                if in_name {
                    current_name = Some(text);
                } else if in_value {
                    current_value = Some(text);
                }
            }
            Ok(Event::End(ref e)) => match e.name().as_ref() {
                b"Name" => in_name = false,
                b"Value" => in_value = false,
                b"Attribute" => {
                    in_attribute = false;
                    if let Some(name) = current_name.take() {
                        attributes.insert(name, current_value.take().unwrap_or_default());
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(SqsError::Serialization(format!(
                    "XML parsing error: {}",
                    e
                )))
            }
            _ => {}
        }
        buf.clear();
    }

    Ok(attributes)
}

/// Extract `ResponseMetadata/RequestId`, if present
pub(crate) fn parse_request_id(xml: &str) -> Option<String> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut in_request_id = false;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) if e.name().as_ref() == b"RequestId" => {
                in_request_id = true;
            }
            Ok(Event::Text(e)) if in_request_id => {
                return e.unescape().ok().map(|s| s.into_owned());
            }
            Ok(Event::Eof) | Err(_) => return None,
            _ => {}
        }
        buf.clear();
    }
}

/// `Error/Code` and `Error/Message` of an `ErrorResponse` body
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct ErrorBody {
    pub code: Option<String>,
    pub message: Option<String>,
}

/// Read the `Error` element of a Query API error body
///
/// Bodies that are not XML (proxies, load balancers) yield an empty
/// [`ErrorBody`].
pub(crate) fn parse_error_body(xml: &str) -> ErrorBody {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut body = ErrorBody::default();
    let mut path: Vec<Vec<u8>> = Vec::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => path.push(e.name().as_ref().to_vec()),
            Ok(Event::End(_)) => {
                path.pop();
            }
            Ok(Event::Text(e)) => {
                if let [.., parent, leaf] = path.as_slice() {
                    if parent.as_slice() == b"Error" {
                        let text = e.unescape().ok().map(|s| s.into_owned());
                        match leaf.as_slice() {
                            b"Code" => body.code = text,
                            b"Message" => body.message = text,
                            _ => {}
                        }
                    }
                }
            }
            Ok(Event::Eof) | Err(_) => break,
            _ => {}
        }
        buf.clear();
    }

    body
}

/// Map an error response body and HTTP status to an [`SqsError`]
///
/// Server-side (5xx) and throttled answers are classified by status first so
/// that [`SqsError::is_transient`] holds for them whatever code they carry.
pub(crate) fn parse_error_response(xml: &str, status: u16) -> SqsError {
    let ErrorBody { code, message } = parse_error_body(xml);
    let message = message.unwrap_or_else(|| format!("HTTP status {}", status));
    let code = code.unwrap_or_else(|| "Unknown".to_string());

    if status >= 500 {
        return SqsError::Service {
            code,
            message,
            status,
        };
    }

    match code.as_str() {
        "Throttling" | "ThrottlingException" | "RequestThrottled" => {
            SqsError::Throttled(format!("{}: {}", code, message))
        }
        _ if status == 429 => SqsError::Throttled(format!("{}: {}", code, message)),
        "AWS.SimpleQueueService.NonExistentQueue" | "QueueDoesNotExist" => {
            SqsError::QueueNotFound(message)
        }
        "ReceiptHandleIsInvalid" | "InvalidReceiptHandle" => SqsError::InvalidReceipt(message),
        "InvalidClientTokenId"
        | "UnrecognizedClientException"
        | "SignatureDoesNotMatch"
        | "MissingAuthenticationToken"
        | "ExpiredToken" => SqsError::Authentication(format!("{}: {}", code, message)),
        _ if status == 401 || status == 403 => {
            SqsError::Authentication(format!("{}: {}", code, message))
        }
        _ => SqsError::Service {
            code,
            message,
            status,
        },
    }
}

#[cfg(test)]
#[path = "xml_tests.rs"]
mod tests;
