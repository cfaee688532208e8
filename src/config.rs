use std::env;

/// Process configuration, read from the environment
///
/// `DB_URL` names the data source a deployment points clients at. The
/// engine itself is in-memory and never dereferences it; the shell logs it
/// at startup so a misconfigured environment is easy to spot.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Config {
    pub db_url: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            db_url: env::var("DB_URL").ok().filter(|url| !url.is_empty()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Config;

    #[test]
    fn test_from_env() {
        // one test for all cases: the process environment is global state
        unsafe { std::env::remove_var("DB_URL") };
        assert_eq!(Config::from_env().db_url, None);

        unsafe { std::env::set_var("DB_URL", "") };
        assert_eq!(Config::from_env().db_url, None);

        unsafe { std::env::set_var("DB_URL", "postgres://localhost:5432/app") };
        assert_eq!(
            Config::from_env().db_url.as_deref(),
            Some("postgres://localhost:5432/app")
        );

        unsafe { std::env::remove_var("DB_URL") };
    }
}
