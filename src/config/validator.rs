//! Config validation.

use crate::config::AppConfig;
use crate::error::ConfigError;

pub fn validate(config: &AppConfig) -> Result<(), ConfigError> {
    let db = &config.db;
    if db.user.trim().is_empty() {
        return Err(ConfigError::Validation("db.user must not be empty".into()));
    }
    if db.database.trim().is_empty() {
        return Err(ConfigError::Validation("db.database must not be empty".into()));
    }
    if db.port == 0 || config.server.port == 0 {
        return Err(ConfigError::Validation("ports must be non-zero".into()));
    }
    if db.max_size == 0 || db.min_size > db.max_size {
        return Err(ConfigError::Validation(format!(
            "pool size: min {} max {}",
            db.min_size, db.max_size
        )));
    }
    let charset = db.charset.to_ascii_lowercase().replace('-', "");
    if charset != "utf8" && charset != "utf8mb4" {
        return Err(ConfigError::Validation(format!("unsupported charset: {}", db.charset)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(validate(&AppConfig::default()).is_ok());
    }

    #[test]
    fn pool_bounds_and_charset_are_checked() {
        let mut c = AppConfig::default();
        c.db.min_size = 5;
        c.db.max_size = 2;
        assert!(validate(&c).is_err());

        let mut c = AppConfig::default();
        c.db.charset = "UTF-8".into();
        assert!(validate(&c).is_ok());
        c.db.charset = "latin1".into();
        assert!(validate(&c).is_err());
    }
}
