use std::sync::Arc;

use tracing::info;
use warrant_config::WarrantConfig;
use warrant_rbac::PermissionPolicy;
use warrant_sharing::{CapabilityTokenService, SharingPorts, SharingSettings, TokenSigner};
use warrant_types::Clock;

use crate::Result;

/// A configured sharing service and the policy it authorizes with.
pub struct AccessCore {
    policy: PermissionPolicy,
    sharing: CapabilityTokenService,
}

impl AccessCore {
    /// Validates `config` and wires it to `ports`.
    ///
    /// Fails on any configuration problem, including a missing or weak
    /// signing secret.
    pub fn from_config(config: &WarrantConfig, ports: SharingPorts) -> Result<Self> {
        config.validate()?;

        let signer = TokenSigner::from_secret(&config.sharing.signing_secret)?;
        let settings = SharingSettings::new(config.sharing.host(), config.sharing.cache_ttl())?;
        let policy = PermissionPolicy::standard();

        info!(
            environment = ?config.environment,
            host = settings.host(),
            cache_ttl_secs = config.sharing.cache_ttl_secs,
            "Access core configured"
        );

        let sharing = CapabilityTokenService::new(ports, signer, settings).with_policy(policy.clone());
        Ok(Self { policy, sharing })
    }

    /// Replaces the policy used here and by the sharing service.
    pub fn with_policy(mut self, policy: PermissionPolicy) -> Self {
        self.sharing = self.sharing.with_policy(policy.clone());
        self.policy = policy;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.sharing = self.sharing.with_clock(clock);
        self
    }

    pub fn policy(&self) -> &PermissionPolicy {
        &self.policy
    }

    pub fn sharing(&self) -> &CapabilityTokenService {
        &self.sharing
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::WarrantError;
    use warrant_config::{Environment, SharingConfig};

    fn config(environment: Environment, secret: &str) -> WarrantConfig {
        WarrantConfig {
            environment,
            sharing: SharingConfig {
                signing_secret: secret.to_string(),
                base_domain: "https://app.example".to_string(),
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_from_config_builds_service() {
        let core = AccessCore::from_config(
            &config(Environment::Production, "0123456789abcdef0123456789abcdef"),
            SharingPorts::in_memory(),
        )
        .unwrap();
        assert_eq!(core.sharing().settings().host(), "app.example");
    }

    #[test]
    fn test_from_config_rejects_weak_secret() {
        let result = AccessCore::from_config(
            &config(Environment::Production, "changeme"),
            SharingPorts::in_memory(),
        );
        assert!(matches!(result, Err(WarrantError::Config(_))));
    }

    #[test]
    fn test_from_config_rejects_missing_secret_in_tests_too() {
        let result =
            AccessCore::from_config(&config(Environment::Test, ""), SharingPorts::in_memory());
        assert!(matches!(result, Err(WarrantError::Config(_))));
    }
}
