// SPDX-License-Identifier: CEPL-1.0
use std::{fs, io, path::Path};

use anyhow::{bail, Context, Result};
use prism_gfx::{BackendId, Options};
use serde::Deserialize;
use tracing::info;

/// Contents of `prism.toml`.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct AppCfg {
    #[serde(default = "default_clear")]
    pub clear_color: [f32; 4],
    /// `[graphics]` as written; laid over each backend's own defaults.
    #[serde(default)]
    graphics: toml::Table,
}

impl Default for AppCfg {
    fn default() -> Self {
        Self {
            clear_color: default_clear(),
            graphics: toml::Table::new(),
        }
    }
}

fn default_clear() -> [f32; 4] {
    [0.02, 0.02, 0.04, 1.0]
}

/// Recursive overlay: tables merge key by key, anything else replaces.
fn merge(base: &mut toml::Table, overlay: &toml::Table) {
    for (key, value) in overlay {
        match (base.get_mut(key), value) {
            (Some(toml::Value::Table(base)), toml::Value::Table(overlay)) => merge(base, overlay),
            _ => {
                base.insert(key.clone(), value.clone());
            }
        }
    }
}

impl AppCfg {
    pub fn from_toml_str(src: &str) -> Result<Self> {
        let cfg: AppCfg = toml::from_str(src)?;
        for id in BackendId::ALL {
            cfg.options_for(id)?;
        }
        Ok(cfg)
    }

    /// Reads `path`; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        match fs::read_to_string(path) {
            Ok(src) => Self::from_toml_str(&src).with_context(|| format!("{}", path.display())),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!("{} not found, using defaults", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(e).with_context(|| format!("reading {}", path.display())),
        }
    }

    /// `Options::defaults_for(id)` with the file's `[graphics]` keys on top.
    pub fn options_for(&self, id: BackendId) -> Result<Options> {
        let toml::Value::Table(mut table) = toml::Value::try_from(Options::defaults_for(id))?
        else {
            bail!("graphics defaults are not a table");
        };
        merge(&mut table, &self.graphics);
        let options: Options = toml::Value::Table(table)
            .try_into()
            .context("[graphics]")?;
        options.validate()?;
        Ok(options)
    }
}
