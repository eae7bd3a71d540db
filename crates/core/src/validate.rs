//! Request validation for the `/api` endpoint.
//!
//! Checks run in a fixed order and stop at the first failure. Nothing here
//! touches the backend, so a rejected request never has side effects.

use http::header::CONTENT_TYPE;
use http::{HeaderMap, Method};
use serde_json::{Map, Number, Value};
use thiserror::Error;

use crate::command::{address, truncate_u16, truncate_u8, Command, EncodedCommand, RawCommand};
use crate::protocol::{Protocol, RAW_SELECTOR};

pub const APPLICATION_JSON: &str = "application/json";

pub const FIELD_PROTOCOL: &str = "protocolo";
pub const FIELD_PIN: &str = "led";
pub const FIELD_FREQUENCY: &str = "frequencia";
pub const FIELD_PULSES: &str = "dados";
pub const FIELD_DEVICE: &str = "device";
pub const FIELD_SUBDEVICE: &str = "subdevice";
pub const FIELD_FUNCTION: &str = "function";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("method not allowed")]
    MethodNotAllowed,
    #[error("method not implemented")]
    MethodNotImplemented,
    #[error("unsupported content type")]
    UnsupportedContentType,
    #[error("malformed JSON body")]
    MalformedJson,
    #[error("missing field `{0}`")]
    MissingField(&'static str),
    #[error("invalid type for field `{0}`")]
    InvalidFieldType(&'static str),
    #[error("unsupported protocol")]
    UnsupportedProtocol,
}

pub fn validate(method: &Method, headers: &HeaderMap, body: &[u8]) -> Result<Command, ValidationError> {
    check_request(method, headers)?;
    validate_body(body)
}

/// Method and content-type checks. These need no body, so the HTTP layer runs
/// them before reading one.
pub fn check_request(method: &Method, headers: &HeaderMap) -> Result<(), ValidationError> {
    check_method(method)?;
    check_content_type(headers)
}

pub fn validate_body(body: &[u8]) -> Result<Command, ValidationError> {
    let json = parse_body(body)?;
    parse_command(&json)
}

fn check_method(method: &Method) -> Result<(), ValidationError> {
    if *method == Method::POST {
        Ok(())
    } else if *method == Method::GET {
        Err(ValidationError::MethodNotAllowed)
    } else {
        Err(ValidationError::MethodNotImplemented)
    }
}

fn check_content_type(headers: &HeaderMap) -> Result<(), ValidationError> {
    match headers.get(CONTENT_TYPE) {
        Some(v) if v.as_bytes() == APPLICATION_JSON.as_bytes() => Ok(()),
        _ => Err(ValidationError::UnsupportedContentType),
    }
}

fn parse_body(body: &[u8]) -> Result<Value, ValidationError> {
    serde_json::from_slice(body).map_err(|_| ValidationError::MalformedJson)
}

/// Turns a parsed JSON document into a [`Command`].
///
/// A document that is not an object has no fields at all, so it is reported
/// as missing `protocolo`.
pub fn parse_command(json: &Value) -> Result<Command, ValidationError> {
    let empty = Map::new();
    let fields = json.as_object().unwrap_or(&empty);

    let selector = string_field(fields, FIELD_PROTOCOL)?;
    let pin = truncate_u8(number_field(fields, FIELD_PIN)?);

    if selector == RAW_SELECTOR {
        parse_raw(fields, pin)
    } else {
        parse_encoded(fields, pin, selector)
    }
}

fn parse_raw(fields: &Map<String, Value>, pin: u8) -> Result<Command, ValidationError> {
    require(fields, &[FIELD_FREQUENCY, FIELD_PULSES])?;
    let frequency = number_field(fields, FIELD_FREQUENCY)?;
    let pulses = array_field(fields, FIELD_PULSES)?;

    // Elements are not type-checked; anything non-numeric becomes 0.
    let pulses = pulses
        .iter()
        .map(|v| v.as_number().map(truncate_u16).unwrap_or(0))
        .collect();

    Ok(Command::Raw(RawCommand {
        pin,
        frequency_khz: truncate_u8(frequency),
        pulses,
    }))
}

fn parse_encoded(fields: &Map<String, Value>, pin: u8, selector: &str) -> Result<Command, ValidationError> {
    require(fields, &[FIELD_DEVICE, FIELD_SUBDEVICE, FIELD_FUNCTION])?;
    let device = number_field(fields, FIELD_DEVICE)?;
    let subdevice = number_field(fields, FIELD_SUBDEVICE)?;
    let function = number_field(fields, FIELD_FUNCTION)?;

    let protocol = Protocol::from_name(selector).ok_or(ValidationError::UnsupportedProtocol)?;

    Ok(Command::Encoded(EncodedCommand {
        pin,
        protocol,
        address: address(truncate_u8(device), truncate_u8(subdevice)),
        function: truncate_u16(function),
    }))
}

// Presence of every mode field is checked before any of their types.
fn require(fields: &Map<String, Value>, names: &[&'static str]) -> Result<(), ValidationError> {
    match names.iter().find(|n| !fields.contains_key(**n)) {
        Some(missing) => Err(ValidationError::MissingField(*missing)),
        None => Ok(()),
    }
}

fn field<'a>(fields: &'a Map<String, Value>, name: &'static str) -> Result<&'a Value, ValidationError> {
    fields.get(name).ok_or(ValidationError::MissingField(name))
}

fn string_field<'a>(fields: &'a Map<String, Value>, name: &'static str) -> Result<&'a str, ValidationError> {
    field(fields, name)?.as_str().ok_or(ValidationError::InvalidFieldType(name))
}

fn number_field<'a>(fields: &'a Map<String, Value>, name: &'static str) -> Result<&'a Number, ValidationError> {
    field(fields, name)?.as_number().ok_or(ValidationError::InvalidFieldType(name))
}

fn array_field<'a>(fields: &'a Map<String, Value>, name: &'static str) -> Result<&'a Vec<Value>, ValidationError> {
    field(fields, name)?.as_array().ok_or(ValidationError::InvalidFieldType(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;
    use rstest::rstest;

    fn json_headers() -> HeaderMap {
        let mut h = HeaderMap::new();
        h.insert(CONTENT_TYPE, HeaderValue::from_static(APPLICATION_JSON));
        h
    }

    fn post(body: &str) -> Result<Command, ValidationError> {
        validate(&Method::POST, &json_headers(), body.as_bytes())
    }

    #[test]
    fn get_is_not_allowed() {
        assert_eq!(
            validate(&Method::GET, &json_headers(), b"{}"),
            Err(ValidationError::MethodNotAllowed)
        );
    }

    #[rstest]
    #[case(Method::PUT)]
    #[case(Method::DELETE)]
    #[case(Method::PATCH)]
    #[case(Method::HEAD)]
    #[case(Method::OPTIONS)]
    fn other_methods_not_implemented(#[case] method: Method) {
        assert_eq!(
            validate(&method, &json_headers(), b"{}"),
            Err(ValidationError::MethodNotImplemented)
        );
    }

    #[test]
    fn method_checked_before_content_type() {
        assert_eq!(
            validate(&Method::GET, &HeaderMap::new(), b"{bad"),
            Err(ValidationError::MethodNotAllowed)
        );
    }

    #[test]
    fn request_checks_need_no_body() {
        assert_eq!(check_request(&Method::GET, &HeaderMap::new()), Err(ValidationError::MethodNotAllowed));
        assert_eq!(check_request(&Method::PUT, &HeaderMap::new()), Err(ValidationError::MethodNotImplemented));
        assert_eq!(check_request(&Method::POST, &HeaderMap::new()), Err(ValidationError::UnsupportedContentType));
        assert_eq!(check_request(&Method::POST, &json_headers()), Ok(()));
    }

    #[rstest]
    #[case(None)]
    #[case(Some("text/plain"))]
    #[case(Some("application/json; charset=utf-8"))]
    #[case(Some("Application/JSON"))]
    fn content_type_must_be_exact(#[case] value: Option<&'static str>) {
        let mut headers = HeaderMap::new();
        if let Some(v) = value {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static(v));
        }
        let body = br#"{"protocolo":"NEC","led":4,"device":4,"subdevice":2,"function":8}"#;
        assert_eq!(
            validate(&Method::POST, &headers, body),
            Err(ValidationError::UnsupportedContentType)
        );
    }

    #[rstest]
    #[case("")]
    #[case("{bad json")]
    #[case("{\"protocolo\":")]
    fn unparsable_body_is_malformed(#[case] body: &str) {
        assert_eq!(post(body), Err(ValidationError::MalformedJson));
    }

    #[rstest]
    #[case("{}", ValidationError::MissingField("protocolo"))]
    #[case("[]", ValidationError::MissingField("protocolo"))]
    #[case("5", ValidationError::MissingField("protocolo"))]
    #[case(r#"{"protocolo":1,"led":4}"#, ValidationError::InvalidFieldType("protocolo"))]
    #[case(r#"{"protocolo":"raw"}"#, ValidationError::MissingField("led"))]
    #[case(r#"{"protocolo":"raw","led":"4"}"#, ValidationError::InvalidFieldType("led"))]
    #[case(r#"{"protocolo":"raw","led":4}"#, ValidationError::MissingField("frequencia"))]
    #[case(r#"{"protocolo":"raw","led":4,"frequencia":38}"#, ValidationError::MissingField("dados"))]
    #[case(r#"{"protocolo":"raw","led":4,"frequencia":"x"}"#, ValidationError::MissingField("dados"))]
    #[case(r#"{"protocolo":"raw","led":4,"frequencia":"38","dados":[]}"#, ValidationError::InvalidFieldType("frequencia"))]
    #[case(r#"{"protocolo":"raw","led":4,"frequencia":38,"dados":{}}"#, ValidationError::InvalidFieldType("dados"))]
    #[case(r#"{"protocolo":"NEC","led":4}"#, ValidationError::MissingField("device"))]
    #[case(r#"{"protocolo":"NEC","led":4,"device":1}"#, ValidationError::MissingField("subdevice"))]
    #[case(r#"{"protocolo":"NEC","led":4,"device":1,"subdevice":1}"#, ValidationError::MissingField("function"))]
    #[case(r#"{"protocolo":"NEC","led":4,"device":"1","subdevice":1}"#, ValidationError::MissingField("function"))]
    #[case(r#"{"protocolo":"NEC","led":4,"device":null,"subdevice":1,"function":1}"#, ValidationError::InvalidFieldType("device"))]
    #[case(r#"{"protocolo":"NEC","led":4,"device":1,"subdevice":[],"function":1}"#, ValidationError::InvalidFieldType("subdevice"))]
    #[case(r#"{"protocolo":"NEC","led":4,"device":1,"subdevice":1,"function":true}"#, ValidationError::InvalidFieldType("function"))]
    #[case(r#"{"protocolo":"XYZ","led":4,"device":1,"subdevice":1,"function":1}"#, ValidationError::UnsupportedProtocol)]
    #[case(r#"{"protocolo":"XYZ","led":4}"#, ValidationError::MissingField("device"))]
    #[case(r#"{"protocolo":"nec","led":4,"device":1,"subdevice":1,"function":1}"#, ValidationError::UnsupportedProtocol)]
    fn field_errors_in_order(#[case] body: &str, #[case] expected: ValidationError) {
        assert_eq!(post(body), Err(expected));
    }

    #[test]
    fn raw_command_is_built() {
        let cmd = post(r#"{"protocolo":"raw","led":4,"frequencia":38,"dados":[9000,4500,560,560]}"#).unwrap();
        assert_eq!(
            cmd,
            Command::Raw(RawCommand {
                pin: 4,
                frequency_khz: 38,
                pulses: vec![9000, 4500, 560, 560],
            })
        );
    }

    #[test]
    fn raw_accepts_empty_pulses() {
        let cmd = post(r#"{"protocolo":"raw","led":2,"frequencia":36,"dados":[]}"#).unwrap();
        assert_eq!(
            cmd,
            Command::Raw(RawCommand { pin: 2, frequency_khz: 36, pulses: vec![] })
        );
    }

    #[test]
    fn raw_pulses_are_truncated_not_rejected() {
        let cmd = post(r#"{"protocolo":"raw","led":260,"frequencia":38.7,"dados":[70000,1.9,"x",null,-1]}"#).unwrap();
        assert_eq!(
            cmd,
            Command::Raw(RawCommand {
                pin: 4,
                frequency_khz: 38,
                pulses: vec![4464, 1, 0, 0, 65535],
            })
        );
    }

    #[test]
    fn encoded_command_packs_address() {
        let cmd = post(r#"{"protocolo":"NEC","led":4,"device":4,"subdevice":2,"function":8}"#).unwrap();
        assert_eq!(
            cmd,
            Command::Encoded(EncodedCommand {
                pin: 4,
                protocol: Protocol::Nec,
                address: 0x0402,
                function: 8,
            })
        );
    }

    #[test]
    fn encoded_fields_are_truncated() {
        let cmd = post(r#"{"protocolo":"RC6","led":4,"device":257,"subdevice":2.9,"function":4294967295}"#).unwrap();
        assert_eq!(
            cmd,
            Command::Encoded(EncodedCommand {
                pin: 4,
                protocol: Protocol::Rc6,
                address: 0x0102,
                function: 0xffff,
            })
        );
    }

    #[test]
    fn extra_fields_are_ignored() {
        let cmd = post(r#"{"protocolo":"Panasonic","led":4,"device":1,"subdevice":0,"function":3,"dados":"ignored"}"#).unwrap();
        assert!(matches!(cmd, Command::Encoded(EncodedCommand { protocol: Protocol::Panasonic, .. })));
    }
}
