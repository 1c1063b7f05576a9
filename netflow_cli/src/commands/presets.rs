use anyhow::Result;
use netflow_lib::Preset;

use crate::output::{print_presets, OutputFormat};

pub fn run(presets: &[Preset], format: &OutputFormat) -> Result<()> {
    print_presets(presets, format)?;
    if matches!(format, OutputFormat::Table | OutputFormat::Text) {
        eprintln!("* amounts estimated from lots x close price");
    }
    Ok(())
}
