//! The license-verification protocol client.
//!
//! One request shape, one response shape: the client asks the license server
//! `GET {endpoint}/?item_id=…&key=…&domain=…` and interprets the JSON object
//! that comes back. Every public operation is a pure function of the stored
//! credentials plus at most one network round trip; nothing is cached across
//! calls, so concurrent invocations are safe as long as the collaborators
//! are.

use anyhow::Result;

use crate::config::{CredentialStore, StoredCredentials};
use crate::error::{ApiError, ConfigError};
use crate::lookup::InstallLookup;
use crate::models::{InstallKind, LicenseIdentity, LicenseInfo, UpdateDescriptor};
use crate::transport::Transport;
use crate::version;

pub struct LicenseClient {
    identity: LicenseIdentity,
    endpoint: String,
    store: Box<dyn CredentialStore>,
    transport: Box<dyn Transport>,
    lookup: Box<dyn InstallLookup>,
}

impl LicenseClient {
    /// Build a client for one installed product.
    ///
    /// Fails fast when `kind` is [`InstallKind::Plugin`] and the identity
    /// carries no plugin file path: without it the version comparison step
    /// could never proceed, so the misconfiguration must not wait for a call.
    pub fn new(
        identity: LicenseIdentity,
        endpoint: &str,
        store: Box<dyn CredentialStore>,
        transport: Box<dyn Transport>,
        lookup: Box<dyn InstallLookup>,
    ) -> Result<Self, ConfigError> {
        if identity.kind == InstallKind::Plugin && identity.plugin_file.is_none() {
            return Err(ConfigError::MissingPluginFile);
        }

        Ok(Self {
            identity,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            store,
            transport,
            lookup,
        })
    }

    pub fn identity(&self) -> &LicenseIdentity {
        &self.identity
    }

    /// True when both credentials are saved in the store.
    pub fn is_configured(&self) -> bool {
        StoredCredentials::load(self.store.as_ref()).is_some()
    }

    /// Query the license server for the current product.
    ///
    /// Returns `Ok(None)` when the order id or domain is not saved yet — an
    /// unconfigured installation should not generate network traffic, so this
    /// short-circuits before any request is made. Transport failures,
    /// non-success statuses, unparseable bodies, and bodies carrying an
    /// `error` field all normalize to [`ApiError`].
    pub async fn fetch_license_info(&self) -> Result<Option<LicenseInfo>, ApiError> {
        let Some(creds) = StoredCredentials::load(self.store.as_ref()) else {
            return Ok(None);
        };

        let url = format!("{}/", self.endpoint);
        let query = [
            ("item_id", self.identity.product_id.as_str()),
            ("key", creds.order_id.as_str()),
            ("domain", creds.domain.as_str()),
        ];

        let response = self.transport.get(&url, &query).await?;
        if !(200..300).contains(&response.status) {
            return Err(ApiError::Status(response.status));
        }

        let value: serde_json::Value = serde_json::from_str(&response.body)
            .map_err(|e| ApiError::Malformed(e.to_string()))?;
        if !value.is_object() {
            return Err(ApiError::Malformed(
                "response is not a JSON object".to_string(),
            ));
        }

        // The server's application-level error wins over its HTTP success.
        if let Some(err) = value.get("error") {
            let msg = err
                .as_str()
                .map(str::to_string)
                .unwrap_or_else(|| err.to_string());
            return Err(ApiError::Server(msg));
        }

        let info: LicenseInfo =
            serde_json::from_value(value).map_err(|e| ApiError::Malformed(e.to_string()))?;
        Ok(Some(info))
    }

    /// Check whether the server offers a newer version than the one installed.
    ///
    /// An unconfigured installation, any [`ApiError`], a response without a
    /// version, and a remote version at or below the local one all yield
    /// `Ok(None)`. `Err` is reserved for local faults (an unreadable artifact
    /// manifest): those are host-environment problems, not protocol outcomes.
    pub async fn is_update_available(&self) -> Result<Option<LicenseInfo>> {
        let info = match self.fetch_license_info().await {
            Ok(Some(info)) => info,
            Ok(None) | Err(_) => return Ok(None),
        };

        let Some(remote) = info.version.as_deref() else {
            return Ok(None);
        };

        let local = self.lookup.installed_version()?;
        if version::is_newer(remote, &local) {
            Ok(Some(info))
        } else {
            Ok(None)
        }
    }

    /// Resolve the data a host update mechanism needs to offer the package.
    ///
    /// `Ok(None)` when no update should be offered (the caller must leave its
    /// update registry untouched). The client never mutates any shared
    /// structure itself; merging the descriptor is the host's job.
    pub async fn resolve_update_descriptor(&self) -> Result<Option<UpdateDescriptor>> {
        let Some(info) = self.is_update_available().await? else {
            return Ok(None);
        };

        // `version` presence is guaranteed by is_update_available; an offer
        // without a package URL is not actionable.
        let Some(new_version) = info.version else {
            return Ok(None);
        };
        let Some(package_url) = info.package_url else {
            return Ok(None);
        };

        let slug = self.lookup.target_slug()?;
        Ok(Some(UpdateDescriptor {
            slug,
            new_version,
            package_url,
        }))
    }

    /// Whether the host should render a persistent configuration reminder.
    ///
    /// True when credentials are missing or the server does not report the
    /// license as active; every failure mode degrades to "show the warning".
    /// Composing and rendering the actual notice is the host's job.
    pub async fn needs_configuration_warning(&self) -> bool {
        match self.fetch_license_info().await {
            Ok(Some(info)) => !info.is_active(),
            Ok(None) | Err(_) => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use async_trait::async_trait;

    use super::*;
    use crate::transport::{HttpResponse, TransportError};

    struct MapStore(HashMap<String, String>);

    impl CredentialStore for MapStore {
        fn read(&self, key: &str) -> Option<String> {
            self.0.get(key).cloned()
        }
    }

    fn full_store() -> Box<dyn CredentialStore> {
        Box::new(MapStore(HashMap::from([
            ("license_order_id".to_string(), "ORD-1".to_string()),
            ("license_domain".to_string(), "example.com".to_string()),
        ])))
    }

    fn partial_store(key: &str) -> Box<dyn CredentialStore> {
        Box::new(MapStore(HashMap::from([(
            key.to_string(),
            "value".to_string(),
        )])))
    }

    enum Reply {
        Body(u16, &'static str),
        Timeout,
        ConnectionRefused,
    }

    struct FakeTransport {
        reply: Reply,
        calls: AtomicUsize,
    }

    impl FakeTransport {
        fn new(reply: Reply) -> Arc<Self> {
            Arc::new(Self {
                reply,
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Transport for Arc<FakeTransport> {
        async fn get(
            &self,
            _url: &str,
            _query: &[(&str, &str)],
        ) -> Result<HttpResponse, TransportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.reply {
                Reply::Body(status, body) => Ok(HttpResponse {
                    status: *status,
                    body: (*body).to_string(),
                }),
                Reply::Timeout => Err(TransportError::Timeout),
                Reply::ConnectionRefused => {
                    Err(TransportError::Other("connection refused".to_string()))
                }
            }
        }
    }

    struct FakeLookup {
        version: &'static str,
        slug: &'static str,
    }

    impl InstallLookup for FakeLookup {
        fn installed_version(&self) -> Result<String> {
            Ok(self.version.to_string())
        }

        fn target_slug(&self) -> Result<String> {
            Ok(self.slug.to_string())
        }
    }

    fn plugin_identity() -> LicenseIdentity {
        LicenseIdentity {
            product_id: "post-subdomain-pro".to_string(),
            product_name: "Post Subdomain Pro".to_string(),
            kind: InstallKind::Plugin,
            locale: None,
            plugin_file: Some(PathBuf::from("post-subdomain-pro/main.php")),
        }
    }

    fn theme_identity() -> LicenseIdentity {
        LicenseIdentity {
            product_id: "my-theme".to_string(),
            product_name: "My Theme".to_string(),
            kind: InstallKind::Theme,
            locale: None,
            plugin_file: None,
        }
    }

    fn client(
        identity: LicenseIdentity,
        store: Box<dyn CredentialStore>,
        transport: Arc<FakeTransport>,
        local_version: &'static str,
    ) -> LicenseClient {
        let slug = match identity.kind {
            InstallKind::Theme => "my-theme-template",
            InstallKind::Plugin => "post-subdomain-pro",
        };
        LicenseClient::new(
            identity,
            "https://license.example.com",
            store,
            Box::new(transport),
            Box::new(FakeLookup {
                version: local_version,
                slug,
            }),
        )
        .unwrap()
    }

    const ACTIVE_UPDATE: &str =
        r#"{"status":"active","version":"2.0.0","package_url":"https://x/pkg.zip"}"#;

    #[test]
    fn test_plugin_without_file_fails_construction() {
        let mut identity = plugin_identity();
        identity.plugin_file = None;
        let result = LicenseClient::new(
            identity,
            "https://license.example.com",
            full_store(),
            Box::new(FakeTransport::new(Reply::Timeout)),
            Box::new(FakeLookup {
                version: "1.0",
                slug: "x",
            }),
        );
        assert!(matches!(result, Err(ConfigError::MissingPluginFile)));
    }

    #[test]
    fn test_theme_without_file_constructs() {
        let result = LicenseClient::new(
            theme_identity(),
            "https://license.example.com",
            full_store(),
            Box::new(FakeTransport::new(Reply::Timeout)),
            Box::new(FakeLookup {
                version: "1.0",
                slug: "x",
            }),
        );
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_missing_credentials_short_circuit() {
        for store in [
            partial_store("license_order_id"),
            partial_store("license_domain"),
            Box::new(MapStore(HashMap::new())) as Box<dyn CredentialStore>,
        ] {
            let transport = FakeTransport::new(Reply::Body(200, ACTIVE_UPDATE));
            let c = client(plugin_identity(), store, transport.clone(), "1.5.0");

            assert!(c.fetch_license_info().await.unwrap().is_none());
            // No network traffic from an unconfigured installation.
            assert_eq!(transport.calls(), 0);
            assert!(!c.is_configured());
        }
    }

    #[tokio::test]
    async fn test_update_available_when_remote_newer() {
        let transport = FakeTransport::new(Reply::Body(200, ACTIVE_UPDATE));
        let c = client(plugin_identity(), full_store(), transport, "1.5.0");

        let info = c.is_update_available().await.unwrap().unwrap();
        assert_eq!(info.version.as_deref(), Some("2.0.0"));
        assert_eq!(info.package_url.as_deref(), Some("https://x/pkg.zip"));
    }

    #[tokio::test]
    async fn test_equal_versions_are_not_an_update() {
        let transport = FakeTransport::new(Reply::Body(200, ACTIVE_UPDATE));
        let c = client(plugin_identity(), full_store(), transport, "2.0.0");

        assert!(c.is_update_available().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_local_newer_is_not_an_update() {
        let transport = FakeTransport::new(Reply::Body(200, ACTIVE_UPDATE));
        let c = client(plugin_identity(), full_store(), transport, "2.1.0");

        assert!(c.is_update_available().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_server_error_field_is_api_error() {
        let transport = FakeTransport::new(Reply::Body(200, r#"{"error":"invalid key"}"#));
        let c = client(plugin_identity(), full_store(), transport, "1.5.0");

        let err = c.fetch_license_info().await.unwrap_err();
        assert!(matches!(err, ApiError::Server(ref msg) if msg == "invalid key"));
        assert!(c.is_update_available().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_non_success_status_is_api_error() {
        let transport = FakeTransport::new(Reply::Body(503, "busy"));
        let c = client(plugin_identity(), full_store(), transport, "1.5.0");

        let err = c.fetch_license_info().await.unwrap_err();
        assert!(matches!(err, ApiError::Status(503)));
    }

    #[tokio::test]
    async fn test_malformed_bodies_are_api_errors() {
        for body in ["not json at all", "[1, 2, 3]", "\"just a string\""] {
            let transport = FakeTransport::new(Reply::Body(200, body));
            let c = client(plugin_identity(), full_store(), transport, "1.5.0");

            let err = c.fetch_license_info().await.unwrap_err();
            assert!(matches!(err, ApiError::Malformed(_)), "body: {body}");
        }
    }

    #[tokio::test]
    async fn test_timeout_normalizes_and_descriptor_degrades() {
        let transport = FakeTransport::new(Reply::Timeout);
        let c = client(plugin_identity(), full_store(), transport, "1.5.0");

        let err = c.fetch_license_info().await.unwrap_err();
        assert!(matches!(err, ApiError::Timeout));
        assert!(c.resolve_update_descriptor().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_connection_failure_normalizes() {
        let transport = FakeTransport::new(Reply::ConnectionRefused);
        let c = client(plugin_identity(), full_store(), transport, "1.5.0");

        let err = c.fetch_license_info().await.unwrap_err();
        assert!(matches!(err, ApiError::Transport(_)));
    }

    #[tokio::test]
    async fn test_plugin_descriptor_uses_basename() {
        let transport = FakeTransport::new(Reply::Body(200, ACTIVE_UPDATE));
        let c = client(plugin_identity(), full_store(), transport, "1.5.0");

        let descriptor = c.resolve_update_descriptor().await.unwrap().unwrap();
        assert_eq!(
            descriptor,
            UpdateDescriptor {
                slug: "post-subdomain-pro".to_string(),
                new_version: "2.0.0".to_string(),
                package_url: "https://x/pkg.zip".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_theme_descriptor_uses_template_slug() {
        let transport = FakeTransport::new(Reply::Body(200, ACTIVE_UPDATE));
        let c = client(theme_identity(), full_store(), transport, "1.5.0");

        let descriptor = c.resolve_update_descriptor().await.unwrap().unwrap();
        assert_eq!(descriptor.slug, "my-theme-template");
    }

    #[tokio::test]
    async fn test_update_without_package_url_not_offered() {
        let transport =
            FakeTransport::new(Reply::Body(200, r#"{"status":"active","version":"2.0.0"}"#));
        let c = client(plugin_identity(), full_store(), transport, "1.5.0");

        assert!(c.resolve_update_descriptor().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_response_without_version_is_no_update() {
        let transport = FakeTransport::new(Reply::Body(200, r#"{"status":"active"}"#));
        let c = client(plugin_identity(), full_store(), transport, "1.5.0");

        assert!(c.is_update_available().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_fetch_is_idempotent() {
        let transport = FakeTransport::new(Reply::Body(200, ACTIVE_UPDATE));
        let c = client(plugin_identity(), full_store(), transport.clone(), "1.5.0");

        let first = c.fetch_license_info().await.unwrap();
        let second = c.fetch_license_info().await.unwrap();
        assert_eq!(first, second);
        assert_eq!(transport.calls(), 2);
    }

    #[tokio::test]
    async fn test_warning_decision() {
        // Unconfigured: warn.
        let transport = FakeTransport::new(Reply::Body(200, ACTIVE_UPDATE));
        let c = client(
            plugin_identity(),
            Box::new(MapStore(HashMap::new())),
            transport,
            "1.5.0",
        );
        assert!(c.needs_configuration_warning().await);

        // Active: no warning.
        let transport = FakeTransport::new(Reply::Body(200, ACTIVE_UPDATE));
        let c = client(plugin_identity(), full_store(), transport, "1.5.0");
        assert!(!c.needs_configuration_warning().await);

        // Non-active status: warn.
        let transport = FakeTransport::new(Reply::Body(200, r#"{"status":"expired"}"#));
        let c = client(plugin_identity(), full_store(), transport, "1.5.0");
        assert!(c.needs_configuration_warning().await);

        // API failure: warn.
        let transport = FakeTransport::new(Reply::Timeout);
        let c = client(plugin_identity(), full_store(), transport, "1.5.0");
        assert!(c.needs_configuration_warning().await);
    }

    #[tokio::test]
    async fn test_local_lookup_failure_surfaces() {
        struct BrokenLookup;

        impl InstallLookup for BrokenLookup {
            fn installed_version(&self) -> Result<String> {
                anyhow::bail!("manifest unreadable")
            }

            fn target_slug(&self) -> Result<String> {
                anyhow::bail!("manifest unreadable")
            }
        }

        let c = LicenseClient::new(
            plugin_identity(),
            "https://license.example.com",
            full_store(),
            Box::new(FakeTransport::new(Reply::Body(200, ACTIVE_UPDATE))),
            Box::new(BrokenLookup),
        )
        .unwrap();

        assert!(c.is_update_available().await.is_err());
    }
}
