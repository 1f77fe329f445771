//! Catalog plus rule set fixture
//!
//! The catalog holds:
//! - workspace `topp` with store `states_shapefile` publishing `states`,
//!   `roads` and `landmarks`
//! - workspace `nurc` with store `arcGridSample` publishing `arcgrid`
//! - a global `polygon` style and a `topp_style` style in `topp`
//!
//! Layer groups are added per test through [`SecurityFixture::add_group`].

use geosecure::catalog::{
    LayerGroupInfo, LayerGroupMode, LayerInfo, MemoryCatalog, ResourceKind, StoreKind,
};
use geosecure::rules::{
    AccessRule, DataAccessRuleDao, PropertyList, RestAccessRuleDao, ServiceAccessRuleDao,
};
use geosecure::{
    DefaultResourceAccessManager, GeoSecurity, LayerGroupVisibility, SecureCatalog,
    SecurityConfig,
};
use std::sync::Arc;

/// Rules granting everything to everybody but administration
pub const WIDE_OPEN: &str = "*.*.r=*\n*.*.w=*\n";

/// Anonymous users read everything, authenticated users write, nurc is
/// military only
pub const MILITARY_NURC: &str = "\
*.*.r=*
*.*.w=ROLE_AUTHENTICATED
nurc.*.r=MILITARY
nurc.*.w=MILITARY
";

pub struct SecurityFixture {
    pub catalog: Arc<MemoryCatalog>,
    pub security: GeoSecurity,
    pub states: LayerInfo,
    pub roads: LayerInfo,
    pub landmarks: LayerInfo,
    pub arcgrid: LayerInfo,
}

impl SecurityFixture {
    /// Fixture guarded by `rules`, given in the property file format
    pub fn new(rules: &str) -> Result<Self, Box<dyn std::error::Error>> {
        Self::with_config(rules, SecurityConfig::default())
    }

    /// Fixture hiding layer groups emptied by security filtering
    pub fn hiding_empty_groups(rules: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let config = SecurityConfig {
            layer_group_visibility: LayerGroupVisibility::HideEmpty,
            ..SecurityConfig::default()
        };
        Self::with_config(rules, config)
    }

    pub fn with_config(
        rules: &str,
        config: SecurityConfig,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let _ = env_logger::builder().is_test(true).try_init();

        let catalog = Arc::new(MemoryCatalog::new());
        catalog.add_workspace("topp")?;
        catalog.add_workspace("nurc")?;
        catalog.add_store("topp", "states_shapefile", StoreKind::DataStore)?;
        catalog.add_store("nurc", "arcGridSample", StoreKind::CoverageStore)?;
        let states = catalog.add_layer("topp", "states_shapefile", "states", ResourceKind::FeatureType)?;
        let roads = catalog.add_layer("topp", "states_shapefile", "roads", ResourceKind::FeatureType)?;
        let landmarks =
            catalog.add_layer("topp", "states_shapefile", "landmarks", ResourceKind::FeatureType)?;
        let arcgrid = catalog.add_layer("nurc", "arcGridSample", "arcgrid", ResourceKind::Coverage)?;
        catalog.add_style(None, "polygon")?;
        catalog.add_style(Some("topp"), "topp_style")?;

        let data_rules = DataAccessRuleDao::from_properties(&PropertyList::parse(rules));
        let security = GeoSecurity::with_rules(
            config,
            catalog.clone(),
            data_rules,
            ServiceAccessRuleDao::with_defaults(),
            RestAccessRuleDao::with_defaults(),
        );
        log::debug!("Created security fixture with {} data rules", security.data_rules().snapshot().len());

        Ok(Self {
            catalog,
            security,
            states,
            roads,
            landmarks,
            arcgrid,
        })
    }

    pub fn manager(&self) -> &DefaultResourceAccessManager {
        self.security.access_manager()
    }

    pub fn secure(&self) -> &SecureCatalog {
        self.security.catalog()
    }

    /// Add a layer group listing `layers` in order
    pub fn add_group(
        &self,
        name: &str,
        workspace: Option<&str>,
        mode: LayerGroupMode,
        layers: &[&LayerInfo],
    ) -> LayerGroupInfo {
        let group = layers
            .iter()
            .fold(LayerGroupInfo::new(name, workspace, mode), |group, layer| {
                group.with_layer(layer)
            });
        self.catalog
            .add_layer_group(group)
            .expect("Failed to add layer group")
    }

    /// Add a group in a layer group mode that nests `children`
    pub fn add_nesting_group(
        &self,
        name: &str,
        mode: LayerGroupMode,
        children: &[&LayerGroupInfo],
    ) -> LayerGroupInfo {
        let group = children
            .iter()
            .fold(LayerGroupInfo::new(name, None, mode), |group, child| {
                group.with_group(child)
            });
        self.catalog
            .add_layer_group(group)
            .expect("Failed to add layer group")
    }

    /// Replace the data rules, as an administrator editing the rule file would
    pub fn set_rules(&self, rules: &str) {
        let parsed = PropertyList::parse(rules)
            .iter()
            .filter_map(|(key, value)| geosecure::rules::DataAccessRule::parse(key, value).ok())
            .collect();
        self.security.data_rules().set_rules(parsed);
    }
}
