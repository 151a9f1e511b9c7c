use augur_core::config::GatewayConfig;

/// Result of a successful authentication.
#[derive(Debug, Clone)]
pub struct AuthResult {
    pub name: String,
}

/// Full validation: Bearer header -> api_keys -> token -> query token -> anonymous.
///
/// Returns `Some(AuthResult)` on success, `None` on auth failure.
pub fn validate_auth(
    config: &GatewayConfig,
    bearer: Option<&str>,
    query_token: Option<&str>,
) -> Option<AuthResult> {
    if let Some(bearer_val) = bearer {
        if let Some(ak) = config.api_keys.iter().find(|ak| ak.key == bearer_val) {
            return Some(AuthResult {
                name: ak.name.clone(),
            });
        }
        if config.token.as_deref() == Some(bearer_val) {
            return Some(AuthResult {
                name: "token".into(),
            });
        }
        return None; // Bearer provided but no match
    }

    // EventSource clients cannot set headers
    if let Some(expected) = &config.token {
        if query_token == Some(expected.as_str()) {
            return Some(AuthResult {
                name: "token".into(),
            });
        }
        return None;
    }

    if config.api_keys.is_empty() {
        Some(AuthResult {
            name: "anonymous".into(),
        })
    } else {
        None
    }
}

/// Extract token from the query string (?token=...).
pub fn extract_token_from_query(query: &str) -> Option<&str> {
    query.split('&').find_map(|pair| pair.strip_prefix("token="))
}
