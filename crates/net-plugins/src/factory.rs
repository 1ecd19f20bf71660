//! Network plugin factory
//!
//! Builds the policy composition selected by the configured plugin kind

use std::path::Path;
use std::sync::Arc;

use crate::base::BasePlugin;
use share_net_core::{
    AllocationStore, NetworkError, NetworkPlugin, PluginConfig, PluginKind, ProviderConnector,
    Result,
};

/// Network plugin factory
pub struct NetworkPluginFactory;

impl NetworkPluginFactory {
    /// Create a plugin from configuration, running the provider checks of
    /// every configured policy.
    pub async fn create_plugin(
        config: &PluginConfig,
        connector: Arc<dyn ProviderConnector>,
        store: Arc<dyn AllocationStore>,
    ) -> Result<Arc<dyn NetworkPlugin>> {
        config
            .validate()
            .map_err(|e| NetworkError::configuration(e.to_string()))?;

        let label = config.label;
        let plugin = match config.plugin {
            PluginKind::Neutron => Ok(BasePlugin::new(connector, store, label)),
            PluginKind::NeutronSingleNetwork => {
                BasePlugin::single_network(connector, store, label, &config.single_network).await
            }
            PluginKind::NeutronBind => {
                BasePlugin::bind(connector, store, label, &config.bind).await
            }
            PluginKind::NeutronBindSingleNetwork => {
                BasePlugin::bind_single_network(
                    connector,
                    store,
                    label,
                    &config.single_network,
                    &config.bind,
                )
                .await
            }
        };

        let plugin = match plugin {
            Ok(plugin) => plugin,
            Err(e) => {
                log::error!("Failed to create {} network plugin: {}", config.plugin, e);
                return Err(e);
            }
        };

        log::info!(
            "Created {} network plugin (label: {}, policies: {:?})",
            config.plugin,
            label,
            plugin.policy_names()
        );
        Ok(Arc::new(plugin))
    }

    /// Load configuration from `path` and create the plugin it describes.
    pub async fn create_from_file<P: AsRef<Path>>(
        path: P,
        connector: Arc<dyn ProviderConnector>,
        store: Arc<dyn AllocationStore>,
    ) -> Result<Arc<dyn NetworkPlugin>> {
        let config = PluginConfig::load_from_file(path)
            .map_err(|e| NetworkError::configuration(e.to_string()))?;
        Self::create_plugin(&config, connector, store).await
    }
}
