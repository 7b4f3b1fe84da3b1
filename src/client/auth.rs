use base64::Engine;

/// Credentials for the search index
#[derive(Clone, PartialEq, Eq)]
pub enum Auth {
    /// Use an API key authentication via headers
    Apikey(String),
    /// Use username and password authentication via Basic Auth headers
    Basic(String, String),
    /// Don't use any authentication
    None,
}

impl Auth {
    /// Value for the `Authorization` header, if any
    pub fn header_value(&self) -> Option<String> {
        match self {
            Self::Apikey(apikey) => Some(format!("ApiKey {}", apikey)),
            Self::Basic(username, password) => {
                let credentials = base64::engine::general_purpose::STANDARD
                    .encode(format!("{}:{}", username, password));
                Some(format!("Basic {}", credentials))
            }
            Self::None => None,
        }
    }
}

impl std::fmt::Display for Auth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Apikey(_) => write!(f, "Apikey"),
            Self::Basic(_, _) => write!(f, "Basic"),
            Self::None => write!(f, "None"),
        }
    }
}

// Secrets stay out of debug output
impl std::fmt::Debug for Auth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Basic(username, _) => write!(f, "Basic({})", username),
            other => write!(f, "{}", other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_values() {
        assert_eq!(
            Auth::Basic("elastic".to_string(), "changeme".to_string()).header_value(),
            Some("Basic ZWxhc3RpYzpjaGFuZ2VtZQ==".to_string())
        );
        assert_eq!(
            Auth::Apikey("abc123".to_string()).header_value(),
            Some("ApiKey abc123".to_string())
        );
        assert_eq!(Auth::None.header_value(), None);
    }

    #[test]
    fn test_debug_hides_secrets() {
        let basic = Auth::Basic("elastic".to_string(), "changeme".to_string());
        assert!(!format!("{:?}", basic).contains("changeme"));
        let apikey = Auth::Apikey("abc123".to_string());
        assert!(!format!("{:?}", apikey).contains("abc123"));
    }
}
