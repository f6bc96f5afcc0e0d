use std::path::PathBuf;

use axum::Router;
use overcommit_webhook::{
    WebhookServer,
    config::{Config, PolicyKind},
};

pub(crate) fn default_test_config(policy: PolicyKind) -> Config {
    Config {
        addr: ([127, 0, 0, 1], 0).into(),
        tls_config: None,
        policy,
        log_level: "info".to_owned(),
        log_fmt: "text".to_owned(),
        log_no_color: true,
    }
}

pub(crate) async fn app(policy: PolicyKind) -> Router {
    let server = WebhookServer::new_from_config(default_test_config(policy))
        .await
        .unwrap();

    server.router()
}

pub(crate) fn load_request_data(name: &str) -> Vec<u8> {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
        .join(name);
    std::fs::read(&path).unwrap_or_else(|e| panic!("cannot read {}: {e}", path.display()))
}
