// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use super::Context;
use crate::config::config_path;
use crate::error::Result;

pub fn run(ctx: &Context) -> Result<()> {
    print!("{}", render(ctx)?);
    Ok(())
}

pub(crate) fn render(ctx: &Context) -> Result<String> {
    let path = config_path(&ctx.data_dir);
    let source = if path.exists() {
        path.display().to_string()
    } else {
        format!("{} (not found, using defaults)", path.display())
    };
    Ok(format!(
        "# data dir: {}\n# config: {}\n{}",
        ctx.data_dir.display(),
        source,
        ctx.config.to_display_toml()?
    ))
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
