//! Peer panel configuration from TOML (`[panel]` section)

use conformity_domain::{ConfigIssue, ConfigIssueCode, PeerPanel};
use serde::{Deserialize, Serialize};

/// Overrides for the synthetic peer panel
///
/// Empty lists keep the built-in names and templates.
///
/// # Example
///
/// ```toml
/// [panel]
/// names = ["Ana", "Ben", "Cleo"]
/// templates = ["I pick {choice}", "Clearly {choice}"]
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FilePanelConfig {
    pub names: Vec<String>,
    pub templates: Vec<String>,
}

impl FilePanelConfig {
    pub fn parse_panel(&self) -> (PeerPanel, Vec<ConfigIssue>) {
        let defaults = PeerPanel::default();
        let names = if self.names.is_empty() {
            defaults.names().to_vec()
        } else {
            self.names.clone()
        };
        let templates = if self.templates.is_empty() {
            defaults.templates().to_vec()
        } else {
            self.templates.clone()
        };

        match PeerPanel::new(names, templates) {
            Ok(panel) => (panel, vec![]),
            Err(e) => (
                defaults,
                vec![ConfigIssue::error(
                    ConfigIssueCode::InvalidPanel,
                    format!("panel: {}", e),
                )],
            ),
        }
    }
}
