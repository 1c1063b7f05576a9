use anyhow::Result;
use clap::Args;
use netflow_lib::{
    build_report, fetch_sources, find_preset, taipei_today, validation, FlowClient, Preset,
};

use crate::output::{print_json, print_overlap, OutputFormat};

#[derive(Args)]
pub struct OverlapArgs {
    /// Preset supplying the sources (see `netflow presets`)
    #[arg(long)]
    pub preset: String,

    /// Lookback window in trading days (1-60)
    #[arg(long, default_value = "1")]
    pub day: u32,

    /// Membership policy: all, at-least, max. Defaults to the preset's
    #[arg(long)]
    pub mode: Option<String>,

    /// Minimum number of sources for at-least mode
    #[arg(long)]
    pub min_appear: Option<usize>,

    /// Sort: sum or first. Defaults to the preset's
    #[arg(long)]
    pub sort: Option<String>,

    /// Direction for every source: buy or sell. Defaults to each source's own
    #[arg(long)]
    pub direction: Option<String>,
}

/// Applies command-line overrides on top of the named preset.
fn resolve_preset(args: &OverlapArgs, presets: &[Preset]) -> Result<Preset> {
    let name = validation::validate_preset_name(&args.preset)?;
    let mut preset = find_preset(presets, &name)?.clone();

    if let Some(mode) = &args.mode {
        preset.overlap.mode = validation::validate_mode(mode)?;
    }
    if let Some(min_appear) = args.min_appear {
        preset.overlap.min_appear = validation::validate_min_appear(min_appear)?;
    }
    if let Some(sort) = &args.sort {
        preset.overlap.sort_by = validation::validate_sort(sort)?;
    }
    if let Some(direction) = &args.direction {
        let direction = validation::validate_direction(direction)?;
        for source in &mut preset.sources {
            source.direction = direction;
        }
    }
    Ok(preset)
}

pub async fn run(
    args: &OverlapArgs,
    presets: &[Preset],
    client: &FlowClient,
    format: &OutputFormat,
) -> Result<()> {
    let preset = resolve_preset(args, presets)?;
    let day = validation::validate_day(args.day)?;

    let lists = fetch_sources(client, &preset, day, taipei_today()).await?;
    let report = build_report(&preset, day, &lists);

    match format {
        OutputFormat::Text => println!("{}", report.render()),
        OutputFormat::Json => print_json(&report),
        _ => {
            match report.date {
                Some(date) => eprintln!(
                    "{} ({} day, mode {}) as of {}: {} codes",
                    preset.title,
                    day,
                    preset.overlap.mode,
                    date,
                    report.results.len()
                ),
                None => eprintln!(
                    "{} ({} day, mode {}): data not yet updated",
                    preset.title, day, preset.overlap.mode
                ),
            }
            print_overlap(&report.results, format)?;
        }
    }
    Ok(())
}
