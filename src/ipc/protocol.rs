//! Wire format of the control socket.
//!
//! One JSON object per line. A client writes a single [`Request`] and reads a
//! single [`Response`]:
//!
//! ```text
//! → {"command":"change_theme","theme":"Dark"}
//! ← {"status":"ok","config":{"automatic_switching":false,...}}
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::gateway::{CommandGateway, ConfigView};
use crate::geo::Coordinate;
use crate::state::StoreError;
use crate::theme::Theme;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Request {
    GetConfig,
    ChangeTheme { theme: Theme },
    ChangeSunsetOption { activated: bool },
    ChangeLocation { latitude: f64, longitude: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Persistence,
    CorruptState,
    InvalidRequest,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ErrorKind::Persistence => "persistence",
            ErrorKind::CorruptState => "corrupt_state",
            ErrorKind::InvalidRequest => "invalid_request",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Response {
    Ok { config: ConfigView },
    Error { kind: ErrorKind, message: String },
}

impl Response {
    fn invalid(message: impl Into<String>) -> Self {
        Response::Error {
            kind: ErrorKind::InvalidRequest,
            message: message.into(),
        }
    }
}

impl From<StoreError> for Response {
    fn from(error: StoreError) -> Self {
        let kind = match error {
            StoreError::CorruptState(_) => ErrorKind::CorruptState,
            StoreError::Persistence(_) => ErrorKind::Persistence,
        };
        Response::Error {
            kind,
            message: error.to_string(),
        }
    }
}

/// Execute one request against the gateway.
pub fn handle_request(gateway: &CommandGateway, request: Request) -> Response {
    let result = match request {
        Request::GetConfig => Ok(()),
        Request::ChangeTheme { theme } => gateway.change_theme(theme),
        Request::ChangeSunsetOption { activated } => gateway.change_sunset_option(activated),
        Request::ChangeLocation {
            latitude,
            longitude,
        } => match Coordinate::new(latitude, longitude) {
            Ok(coordinate) => gateway.change_location(coordinate),
            Err(e) => return Response::invalid(e.to_string()),
        },
    };

    match result {
        Ok(()) => Response::Ok {
            config: gateway.view(),
        },
        Err(e) => e.into(),
    }
}

/// Parse and execute one request line.
pub fn handle_line(gateway: &CommandGateway, line: &str) -> Response {
    match serde_json::from_str::<Request>(line.trim()) {
        Ok(request) => handle_request(gateway, request),
        Err(e) => Response::invalid(format!("malformed request: {e}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_wire_names() {
        let request: Request = serde_json::from_str(r#"{"command":"get_config"}"#).unwrap();
        assert_eq!(request, Request::GetConfig);

        let request: Request =
            serde_json::from_str(r#"{"command":"change_theme","theme":"Dark"}"#).unwrap();
        assert_eq!(request, Request::ChangeTheme { theme: Theme::Dark });

        let request: Request =
            serde_json::from_str(r#"{"command":"change_sunset_option","activated":true}"#)
                .unwrap();
        assert_eq!(request, Request::ChangeSunsetOption { activated: true });

        assert_eq!(
            serde_json::to_string(&Request::ChangeLocation {
                latitude: 1.5,
                longitude: 2.5
            })
            .unwrap(),
            r#"{"command":"change_location","latitude":1.5,"longitude":2.5}"#
        );
    }

    #[test]
    fn test_error_response_shape() {
        let response: Response = StoreError::Persistence("disk full".to_string()).into();
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["kind"], "persistence");
        assert!(json["message"].as_str().unwrap().contains("disk full"));
    }

    #[test]
    fn test_unknown_command_is_rejected() {
        assert!(serde_json::from_str::<Request>(r#"{"command":"reboot"}"#).is_err());
        assert!(
            serde_json::from_str::<Request>(r#"{"command":"change_theme","theme":"Sepia"}"#)
                .is_err()
        );
    }
}
