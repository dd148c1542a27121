//! Gateway configuration

use config::{Config, Environment};
use serde::Deserialize;

use crate::error::GatewayResult;

/// How the per-role writes of create and update are issued
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleWriteMode {
    /// One statement at a time, in role order. The first failure stops the
    /// loop and every earlier role stays written.
    #[default]
    Sequential,
    /// One future per role, all polled together. Which roles land before a
    /// failure is not deterministic.
    Concurrent,
}

/// Gateway options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub struct GatewayOptions {
    /// Maintain the `role_users` mirror of every link
    pub track_inverse_links: bool,
    pub role_writes: RoleWriteMode,
}

impl GatewayOptions {
    /// Create new GatewayOptions from environment variables
    ///
    /// # Environment Variables
    /// - `USERROLE_TRACK_INVERSE_LINKS`: "true" or "false" (default: false)
    /// - `USERROLE_ROLE_WRITES`: "sequential" or "concurrent" (default: sequential)
    pub fn from_env() -> GatewayResult<Self> {
        let options = Config::builder()
            .set_default("track_inverse_links", false)?
            .set_default("role_writes", "sequential")?
            .add_source(Environment::with_prefix("USERROLE").try_parsing(true))
            .build()?
            .try_deserialize()?;

        Ok(options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_gateway_options_from_env() {
        let options = GatewayOptions::from_env().unwrap();
        assert_eq!(options, GatewayOptions::default());
        assert_eq!(options.role_writes, RoleWriteMode::Sequential);
    }

    #[test]
    #[serial]
    fn test_gateway_options_from_env_with_custom_values() {
        unsafe {
            std::env::set_var("USERROLE_TRACK_INVERSE_LINKS", "true");
            std::env::set_var("USERROLE_ROLE_WRITES", "concurrent");
        }

        let options = GatewayOptions::from_env().unwrap();
        assert!(options.track_inverse_links);
        assert_eq!(options.role_writes, RoleWriteMode::Concurrent);

        unsafe {
            std::env::remove_var("USERROLE_TRACK_INVERSE_LINKS");
            std::env::remove_var("USERROLE_ROLE_WRITES");
        }
    }

    #[test]
    #[serial]
    fn test_gateway_options_reject_unknown_mode() {
        unsafe {
            std::env::set_var("USERROLE_ROLE_WRITES", "batched");
        }

        assert!(GatewayOptions::from_env().is_err());

        unsafe {
            std::env::remove_var("USERROLE_ROLE_WRITES");
        }
    }
}
