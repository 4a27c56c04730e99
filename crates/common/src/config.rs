use std::env;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
        }
    }

    pub fn from_env() -> Self {
        match env::var("ENVIRONMENT")
            .unwrap_or_else(|_| "development".to_string())
            .to_lowercase()
            .as_str()
        {
            "production" | "prod" => Environment::Production,
            _ => Environment::Development,
        }
    }
}

/// Read and parse an environment variable, falling back to `default` when the
/// variable is unset or does not parse.
pub fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

/// Read a string environment variable with a default.
pub fn env_string(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn environment_defaults_to_development() {
        unsafe { env::remove_var("ENVIRONMENT") };
        assert_eq!(Environment::from_env(), Environment::Development);
    }

    #[test]
    #[serial]
    fn environment_accepts_prod_alias() {
        unsafe { env::set_var("ENVIRONMENT", "PROD") };
        assert_eq!(Environment::from_env(), Environment::Production);
        unsafe { env::remove_var("ENVIRONMENT") };
    }

    #[test]
    #[serial]
    fn env_or_falls_back_on_garbage() {
        unsafe { env::set_var("COMMON_TEST_NUMBER", "not-a-number") };
        assert_eq!(env_or("COMMON_TEST_NUMBER", 42u32), 42);

        unsafe { env::set_var("COMMON_TEST_NUMBER", " 7 ") };
        assert_eq!(env_or("COMMON_TEST_NUMBER", 42u32), 7);

        unsafe { env::remove_var("COMMON_TEST_NUMBER") };
        assert_eq!(env_or("COMMON_TEST_NUMBER", 0.25f32), 0.25);
    }

    #[test]
    #[serial]
    fn env_string_uses_default_when_unset() {
        unsafe { env::remove_var("COMMON_TEST_PATH") };
        assert_eq!(env_string("COMMON_TEST_PATH", "a.json"), "a.json");
    }
}
