use http::StatusCode;
use serde::{Deserialize, Serialize};

use crate::backend::BackendError;
use crate::validate::ValidationError;

pub const MSG_SENT: &str = "Comando enviado.";
pub const MSG_NOT_FOUND: &str = "Não encontrado";

// JSON body of every /api response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiResponse {
    pub erro: bool,
    pub mensagem: String,
}

impl ApiResponse {
    pub fn ok(mensagem: impl Into<String>) -> Self {
        Self { erro: false, mensagem: mensagem.into() }
    }

    pub fn error(mensagem: impl Into<String>) -> Self {
        Self { erro: true, mensagem: mensagem.into() }
    }
}

/// Status code plus envelope, ready to be written by the HTTP layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub status: StatusCode,
    pub body: ApiResponse,
}

impl Reply {
    pub fn sent() -> Self {
        Self { status: StatusCode::OK, body: ApiResponse::ok(MSG_SENT) }
    }

    pub fn rejected(err: &ValidationError) -> Self {
        Self {
            status: validation_status(err),
            body: ApiResponse::error(validation_message(err)),
        }
    }

    // Body exceeded the configured limit. Only reached once method and
    // content type have been accepted.
    pub fn too_large() -> Self {
        Self {
            status: StatusCode::PAYLOAD_TOO_LARGE,
            body: ApiResponse::error("Mensagem muito grande."),
        }
    }

    pub fn failed(_err: &BackendError) -> Self {
        Self {
            status: StatusCode::BAD_GATEWAY,
            body: ApiResponse::error("Falha no envio do comando."),
        }
    }
}

pub fn validation_status(err: &ValidationError) -> StatusCode {
    match err {
        ValidationError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
        ValidationError::MethodNotImplemented => StatusCode::NOT_IMPLEMENTED,
        ValidationError::UnsupportedContentType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
        ValidationError::MalformedJson => StatusCode::BAD_REQUEST,
        ValidationError::MissingField(_)
        | ValidationError::InvalidFieldType(_)
        | ValidationError::UnsupportedProtocol => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

pub fn validation_message(err: &ValidationError) -> String {
    match err {
        ValidationError::MethodNotAllowed => "Método não permitido.".to_string(),
        ValidationError::MethodNotImplemented => "Método não implementado.".to_string(),
        ValidationError::UnsupportedContentType => "Formato não suportado.".to_string(),
        ValidationError::MalformedJson => "Erro de formatação JSON.".to_string(),
        ValidationError::MissingField(name) => format!("Parâmetro \"{}\" ausente.", name),
        ValidationError::InvalidFieldType(name) => format!("Erro de definição de parâmetro: \"{}\".", name),
        ValidationError::UnsupportedProtocol => "Protocolo não suportado.".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn success_envelope_serializes_exactly() {
        let body = serde_json::to_string(&Reply::sent().body).unwrap();
        assert_eq!(body, r#"{"erro":false,"mensagem":"Comando enviado."}"#);
    }

    #[rstest]
    #[case(ValidationError::MethodNotAllowed, 405, "Método não permitido.")]
    #[case(ValidationError::MethodNotImplemented, 501, "Método não implementado.")]
    #[case(ValidationError::UnsupportedContentType, 415, "Formato não suportado.")]
    #[case(ValidationError::MalformedJson, 400, "Erro de formatação JSON.")]
    #[case(ValidationError::MissingField("led"), 422, "Parâmetro \"led\" ausente.")]
    #[case(ValidationError::InvalidFieldType("dados"), 422, "Erro de definição de parâmetro: \"dados\".")]
    #[case(ValidationError::UnsupportedProtocol, 422, "Protocolo não suportado.")]
    fn validation_errors_map_to_status_and_message(
        #[case] err: ValidationError,
        #[case] status: u16,
        #[case] message: &str,
    ) {
        let reply = Reply::rejected(&err);
        assert_eq!(reply.status.as_u16(), status);
        assert!(reply.body.erro);
        assert_eq!(reply.body.mensagem, message);
    }

    #[test]
    fn backend_failure_is_bad_gateway() {
        let reply = Reply::failed(&BackendError::Unavailable);
        assert_eq!(reply.status, StatusCode::BAD_GATEWAY);
        assert_eq!(reply.body, ApiResponse::error("Falha no envio do comando."));
    }

    #[test]
    fn oversized_body_is_413() {
        let reply = Reply::too_large();
        assert_eq!(reply.status, StatusCode::PAYLOAD_TOO_LARGE);
        assert!(reply.body.erro);
    }
}
