use serde::{Deserialize, Serialize};

use crate::errors::{DonnaError, DonnaResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstalledApp {
    /// Display label as shown in the app drawer, e.g. `WhatsApp`.
    pub label: String,
    pub package: String,
}

/// Enumerates installed applications and starts them.
pub trait AppRegistry: Send {
    fn installed_apps(&self) -> Vec<InstalledApp>;

    /// Returns whether the launch entry point was started.
    fn launch(&mut self, app: &InstalledApp) -> bool;
}

pub struct AppLauncher {
    registry: Box<dyn AppRegistry>,
}

impl AppLauncher {
    pub fn new(registry: Box<dyn AppRegistry>) -> Self {
        Self { registry }
    }

    /// Exact label match (ignoring case) first, then the first label that
    /// contains the spoken name.
    pub fn resolve(&self, name: &str) -> Option<InstalledApp> {
        let wanted = name.trim().to_lowercase();
        if wanted.is_empty() {
            return None;
        }
        let apps = self.registry.installed_apps();
        apps.iter()
            .find(|a| a.label.to_lowercase() == wanted)
            .or_else(|| apps.iter().find(|a| a.label.to_lowercase().contains(&wanted)))
            .cloned()
    }

    pub fn open(&mut self, name: &str) -> DonnaResult<InstalledApp> {
        let app = self
            .resolve(name)
            .ok_or_else(|| DonnaError::AppNotInstalled(name.to_string()))?;
        if !self.registry.launch(&app) {
            return Err(DonnaError::ActionRejected(format!("launch of {}", app.package)));
        }
        tracing::info!(spoken = name, label = %app.label, package = %app.package, "app launched");
        Ok(app)
    }
}
