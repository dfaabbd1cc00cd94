use {
    crate::Error,
    serde::Deserialize,
    std::{collections::HashMap, fmt},
};

/// A string that must never end up in logs.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SECRET")
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SECRET")
    }
}

/// A configuration value which is either written down literally or read from
/// an environment variable:
///
/// ```toml
/// rpc-url = "http://127.0.0.1:8545"
/// rpc-url = { env = "ALCHEMY_MUMBAI_URL" }
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Setting {
    Env { env: String },
    Literal(String),
}

impl Setting {
    pub fn env(variable: impl Into<String>) -> Self {
        Self::Env {
            env: variable.into(),
        }
    }

    pub fn literal(value: impl Into<String>) -> Self {
        Self::Literal(value.into())
    }

    /// Returns the value of the setting. Unset and blank values are errors,
    /// they are never passed on as empty strings.
    pub fn resolve(&self, field: &str, env: &impl Environment) -> Result<String, Error> {
        let (value, origin) = match self {
            Self::Literal(value) => (Some(value.clone()), "empty value".to_string()),
            Self::Env { env: variable } => (
                env.var(variable),
                format!("environment variable {variable}"),
            ),
        };
        match value {
            Some(value) if !value.trim().is_empty() => Ok(value),
            _ => Err(Error::Missing {
                field: field.to_string(),
                origin,
            }),
        }
    }

    pub fn resolve_secret(&self, field: &str, env: &impl Environment) -> Result<Secret, Error> {
        self.resolve(field, env).map(Secret)
    }
}

/// Shows where a value comes from without looking it up. Literals can embed
/// credentials (e.g. API keys in node URLs), so only the origin of a URL is
/// shown and anything else is redacted.
impl fmt::Display for Setting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Env { env } => write!(f, "${env}"),
            Self::Literal(value) => match url::Url::parse(value) {
                Ok(url) if url.has_host() => f.write_str(&url.origin().ascii_serialization()),
                _ => f.write_str("SECRET"),
            },
        }
    }
}

/// Source of environment variables.
pub trait Environment {
    fn var(&self, name: &str) -> Option<String>;
}

/// The environment of the current process.
#[derive(Clone, Copy, Debug, Default)]
pub struct ProcessEnv;

impl Environment for ProcessEnv {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

impl Environment for HashMap<String, String> {
    fn var(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn resolves_literals_and_variables() {
        let env = env(&[("NODE_URL", "http://localhost:8545")]);
        assert_eq!(
            Setting::literal("abc").resolve("field", &env).unwrap(),
            "abc"
        );
        assert_eq!(
            Setting::env("NODE_URL").resolve("field", &env).unwrap(),
            "http://localhost:8545"
        );
    }

    #[test]
    fn missing_and_blank_values_are_errors() {
        let env = env(&[("BLANK", "  ")]);
        for setting in [
            Setting::env("UNSET"),
            Setting::env("BLANK"),
            Setting::literal(""),
        ] {
            let err = setting.resolve("rpc-url", &env).unwrap_err();
            assert!(matches!(err, Error::Missing { ref field, .. } if field == "rpc-url"));
        }
    }

    #[test]
    fn error_names_the_variable() {
        let err = Setting::env("PRIVATE_KEY")
            .resolve("accounts[0]", &HashMap::new())
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "accounts[0] is not set (environment variable PRIVATE_KEY)"
        );
    }

    #[test]
    fn secrets_are_redacted() {
        let secret = Secret::new("0xdeadbeef");
        assert_eq!(format!("{secret:?}"), "SECRET");
        assert_eq!(secret.to_string(), "SECRET");
        assert_eq!(secret.expose(), "0xdeadbeef");
    }

    #[test]
    fn deserializes_both_forms() {
        #[derive(Deserialize)]
        struct Wrapper {
            a: Setting,
            b: Setting,
        }

        let wrapper: Wrapper = toml::from_str(
            r#"
            a = "literal"
            b = { env = "VARIABLE" }
            "#,
        )
        .unwrap();
        assert_eq!(wrapper.a, Setting::literal("literal"));
        assert_eq!(wrapper.b, Setting::env("VARIABLE"));
    }

    #[test]
    fn displays_the_source_of_a_value() {
        assert_eq!(
            Setting::env("ALCHEMY_MUMBAI_URL").to_string(),
            "$ALCHEMY_MUMBAI_URL"
        );
        assert_eq!(
            Setting::literal("http://127.0.0.1:8545").to_string(),
            "http://127.0.0.1:8545"
        );
    }

    #[test]
    fn displayed_literals_hide_credentials() {
        let url = Setting::literal("https://polygon-mumbai.g.alchemy.com/v2/TOPSECRETKEY");
        assert_eq!(url.to_string(), "https://polygon-mumbai.g.alchemy.com");
        let key =
            Setting::literal("0x59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d");
        assert_eq!(key.to_string(), "SECRET");
    }
}
