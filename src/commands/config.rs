// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell

use super::Output;
use crate::config::{self, Config};
use anyhow::Result;

/// Print the effective configuration, or one key of it
pub fn run(config: &Config, key: Option<&str>, out: Output) -> Result<()> {
    let Some(key) = key else {
        if out.json {
            return out.print_json(config);
        }
        if let Some(path) = config::default_config_path() {
            println!("{}", out.dim(&format!("# default file: {}", path.display())));
        }
        print!("{}", config.to_toml()?);
        return Ok(());
    };

    let value = serde_json::to_value(config)?;
    let found = key
        .split('.')
        .try_fold(&value, |v, part| v.get(part))
        .ok_or_else(|| anyhow::anyhow!("Unknown configuration key: {key}"))?;
    match found {
        serde_json::Value::String(s) => println!("{s}"),
        other => println!("{other}"),
    }
    Ok(())
}
