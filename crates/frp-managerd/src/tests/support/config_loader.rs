//! Test configuration loaders for scenarios covering success and failure paths.

use std::ffi::OsString;
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use frp_manager_config::{AuditBackend, Config};
use ortho_config::{OrthoConfig, OrthoError};
use tempfile::TempDir;

use crate::bootstrap::ConfigLoader;

/// Loader that keeps every audit artefact under a temporary directory and
/// listens on an ephemeral loopback port.
#[derive(Clone)]
pub struct TestConfigLoader {
    root: Arc<TempDir>,
    backend: AuditBackend,
    listen_address: SocketAddr,
}

impl TestConfigLoader {
    #[must_use]
    pub fn new() -> Self {
        Self::with_backend(AuditBackend::File)
    }

    #[must_use]
    pub fn with_backend(backend: AuditBackend) -> Self {
        let root = TempDir::new().expect("failed to create temporary audit directory");
        Self {
            root: Arc::new(root),
            backend,
            listen_address: SocketAddr::from((Ipv4Addr::LOCALHOST, 0)),
        }
    }

    /// Overrides the listen address.
    #[must_use]
    pub fn listening_on(mut self, address: SocketAddr) -> Self {
        self.listen_address = address;
        self
    }

    pub fn root(&self) -> Utf8PathBuf {
        Utf8Path::from_path(self.root.path())
            .expect("temporary directory was not valid UTF-8")
            .to_owned()
    }

    /// Configuration handed to the daemon.
    #[must_use]
    pub fn config(&self) -> Config {
        let root = self.root();
        Config {
            listen_address: self.listen_address,
            log_filter: "warn".to_owned(),
            audit_backend: self.backend,
            audit_dir: root.join("audit"),
            audit_database: root.join("audit.db"),
            ..Config::default()
        }
    }
}

impl ConfigLoader for TestConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Ok(self.config())
    }
}

/// Loader that intentionally fails by passing invalid CLI arguments.
#[derive(Debug, Clone, Copy)]
pub struct FailingConfigLoader;

impl ConfigLoader for FailingConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        let args = vec![
            OsString::from("frp-managerd"),
            OsString::from("--audit-backend"),
            OsString::from("tape"),
        ];
        Config::load_from_iter(args)
    }
}
