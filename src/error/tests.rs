//! # 错误处理测试

use crate::error::{
    ClassifiedError, ClientError, Context, ErrorKind, PARSE_ERROR_MESSAGE, classify, classify_dyn,
};
use rstest::rstest;
use std::error::Error;

#[test]
fn test_config_error_creation() {
    let err = ClientError::config("测试配置错误");
    assert!(matches!(err, ClientError::Config { .. }));
    assert_eq!(err.to_string(), "配置错误: 测试配置错误");
}

#[test]
fn test_config_error_with_source() {
    let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "文件不存在");
    let err = ClientError::config_with_source("配置文件加载失败", io_err);

    assert!(err.to_string().contains("配置错误: 配置文件加载失败"));
    assert!(err.source().is_some());
}

#[test]
fn test_api_error_display() {
    let err = ClientError::api(404, "not found");
    assert_eq!(err.to_string(), "API错误 (404): not found");
    assert_eq!(err.status(), Some(404));
    assert!(!err.is_network());
}

#[test]
fn test_context_wraps_and_root_unwraps() {
    let result: Result<(), ClientError> = Err(ClientError::api(500, "boom"));
    let err = result.context("加载用户失败").unwrap_err();

    assert!(matches!(err, ClientError::Context { .. }));
    assert!(err.to_string().starts_with("加载用户失败"));
    assert!(matches!(err.root(), ClientError::Api { status: 500, .. }));
    assert_eq!(err.status(), Some(500));
}

#[test]
fn test_auto_conversion_from_toml_error() {
    let toml_err = toml::from_str::<toml::Value>("invalid = toml = syntax").unwrap_err();
    let err: ClientError = toml_err.into();

    assert!(matches!(err, ClientError::Config { .. }));
    assert!(err.to_string().contains("TOML解析失败"));
}

#[test]
fn test_auto_conversion_from_json_error() {
    let json_err = serde_json::from_str::<serde_json::Value>("{oops").unwrap_err();
    let err: ClientError = json_err.into();
    assert!(matches!(err, ClientError::Serialization { .. }));
}

#[rstest]
#[case(ClientError::api(404, "not found"), ErrorKind::ApiError, Some(404), "not found")]
#[case(ClientError::api(503, "down"), ErrorKind::ApiError, Some(503), "down")]
#[case(ClientError::parse(200, "expected array"), ErrorKind::ApiError, Some(200), PARSE_ERROR_MESSAGE)]
#[case(ClientError::config("bad url"), ErrorKind::Unknown, None, "配置错误: bad url")]
#[case(ClientError::not_synced("no user"), ErrorKind::Unknown, None, "身份未同步: no user")]
fn test_classify(
    #[case] err: ClientError,
    #[case] kind: ErrorKind,
    #[case] status: Option<u16>,
    #[case] message: &str,
) {
    let classified = classify(&err);
    assert_eq!(classified, ClassifiedError::new(kind, status, message));
}

#[test]
fn test_classify_sees_through_context() {
    let err = ClientError::Context {
        context: "同步失败".into(),
        source: Box::new(ClientError::api(409, "exists")),
    };
    let classified = classify(&err);
    assert!(classified.is_conflict());
    assert_eq!(classified.message, "exists");
}

#[test]
fn test_classify_dyn_finds_client_error_in_chain() {
    let inner = ClientError::api(401, "unauthorized");
    let wrapped = anyhow::Error::new(inner).context("outer");
    let classified = classify_dyn(wrapped.as_ref());
    assert_eq!(classified.kind, ErrorKind::ApiError);
    assert_eq!(classified.status, Some(401));
}

#[test]
fn test_classify_dyn_unknown_for_foreign_errors() {
    let io_err = std::io::Error::other("disk on fire");
    let classified = classify_dyn(&io_err);
    assert_eq!(classified.kind, ErrorKind::Unknown);
    assert_eq!(classified.message, "disk on fire");
}

#[rstest]
#[case(Some(404), true, false, true)]
#[case(Some(422), false, false, true)]
#[case(Some(500), false, true, false)]
#[case(None, false, false, false)]
fn test_classified_predicates(
    #[case] status: Option<u16>,
    #[case] not_found: bool,
    #[case] server: bool,
    #[case] client: bool,
) {
    let classified = ClassifiedError::new(ErrorKind::ApiError, status, "x");
    assert_eq!(classified.is_not_found(), not_found);
    assert_eq!(classified.is_server_error(), server);
    assert_eq!(classified.is_client_error(), client);
}

#[test]
fn test_validation_macro_sets_field() {
    let err = crate::validation_error!("amount", "must be positive, got {}", -1);
    match err {
        ClientError::Validation { field, message } => {
            assert_eq!(field.as_deref(), Some("amount"));
            assert_eq!(message, "must be positive, got -1");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}
