// context.rs

use std::sync::Arc;

use tracing::info;

use crate::config::DashboardConfig;
use crate::dataset::{self, AssetTable, BoundaryTable};
use crate::error::Result;

/// Owns the configuration and the load-once asset and boundary tables.
///
/// Tables are read on first access and shared afterwards; [`AppContext::invalidate`]
/// forces the next access to read the files again.
#[derive(Debug)]
pub struct AppContext {
    config: DashboardConfig,
    assets: Option<Arc<AssetTable>>,
    boundaries: Option<Arc<BoundaryTable>>,
}

impl AppContext {
    pub fn new(config: DashboardConfig) -> Self {
        Self {
            config,
            assets: None,
            boundaries: None,
        }
    }

    /// Context over tables that are already in memory.
    pub fn preloaded(config: DashboardConfig, assets: AssetTable, boundaries: BoundaryTable) -> Self {
        Self {
            config,
            assets: Some(Arc::new(assets)),
            boundaries: Some(Arc::new(boundaries)),
        }
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    pub fn assets(&mut self) -> Result<Arc<AssetTable>> {
        if let Some(assets) = &self.assets {
            return Ok(Arc::clone(assets));
        }
        let assets = Arc::new(dataset::load_assets(&self.config.assets_path)?);
        self.assets = Some(Arc::clone(&assets));
        Ok(assets)
    }

    pub fn boundaries(&mut self) -> Result<Arc<BoundaryTable>> {
        if let Some(boundaries) = &self.boundaries {
            return Ok(Arc::clone(boundaries));
        }
        let boundaries = Arc::new(dataset::load_boundaries(
            &self.config.boundaries_path,
            &self.config.boundary_schema(),
        )?);
        self.boundaries = Some(Arc::clone(&boundaries));
        Ok(boundaries)
    }

    /// Loads both tables, failing on the first unreadable file.
    pub fn load(&mut self) -> Result<(Arc<AssetTable>, Arc<BoundaryTable>)> {
        Ok((self.assets()?, self.boundaries()?))
    }

    pub fn is_loaded(&self) -> bool {
        self.assets.is_some() && self.boundaries.is_some()
    }

    pub fn invalidate(&mut self) {
        info!("dataset cache cleared");
        self.assets = None;
        self.boundaries = None;
    }
}
