//! Shared composite pipeline used by the library API and the `udf compose` command.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! load (×3) -> normalize (×3) -> reconcile shapes -> compose
//!
//! Load + normalize of the three channels fan out on rayon when
//! `config.parallel` is set; the result is identical to the sequential order.

use chrono::Utc;
use log::{debug, info, warn};

use crate::composite::{ChannelNormalizer, GridResampler, NormalizeStats, compose, reconcile};
use crate::domain::{
    Channel, ChannelReport, ChannelSources, CompositeConfig, CompositeImage, NormalizedGrid, RunSummary, Shape,
    Stage,
};
use crate::error::PipelineError;
use crate::io::loader::GridLoader;

/// All computed outputs of a single composite run.
#[derive(Debug, Clone)]
pub struct CompositeRun {
    pub image: CompositeImage,
    pub target: Shape,
    /// One report per channel, in (red, green, blue) order.
    pub reports: Vec<ChannelReport>,
}

impl CompositeRun {
    /// Snapshot of this run for JSON export / terminal reports.
    pub fn summary(&self, config: &CompositeConfig) -> RunSummary {
        RunSummary {
            tool: "udf".to_string(),
            generated_at: Utc::now(),
            config: config.clone(),
            target_shape: self.target,
            channels: self.reports.clone(),
            png: None,
            overlay_points: None,
        }
    }
}

/// A loaded and normalized channel, before shape reconciliation.
struct Prepared {
    grid: NormalizedGrid,
    stats: NormalizeStats,
}

/// Build a composite from three sources.
///
/// Failures carry the stage and, where one applies, the channel.
pub fn build_composite<L>(
    loader: &L,
    sources: &ChannelSources,
    config: &CompositeConfig,
) -> Result<CompositeImage, PipelineError>
where
    L: GridLoader + Sync + ?Sized,
{
    run_composite(loader, sources, config).map(|run| run.image)
}

/// Build a composite and keep the per-channel facts gathered on the way.
pub fn run_composite<L>(
    loader: &L,
    sources: &ChannelSources,
    config: &CompositeConfig,
) -> Result<CompositeRun, PipelineError>
where
    L: GridLoader + Sync + ?Sized,
{
    // 1) Validate configuration before touching any source.
    let normalizer = ChannelNormalizer::new(config.fill_value)
        .map_err(|e| PipelineError::new(Stage::Configure, None, e))?;

    // 2) Load + normalize each channel.
    let prepare = |channel: Channel| prepare_channel(loader, sources, channel, &normalizer);
    let [red, green, blue] = if config.parallel {
        let (red, (green, blue)) = rayon::join(
            || prepare(Channel::Red),
            || rayon::join(|| prepare(Channel::Green), || prepare(Channel::Blue)),
        );
        [red, green, blue]
    } else {
        Channel::ALL.map(prepare)
    };
    // Report the first failure in (red, green, blue) order.
    let prepared = [red?, green?, blue?];

    let input_shapes = prepared.each_ref().map(|p| p.grid.shape());
    let stats = prepared.each_ref().map(|p| p.stats);
    let grids = prepared.map(|p| p.grid);

    // 3) Bring every channel onto the target shape.
    let resampler = GridResampler::new(config.interpolation, config.anti_alias);
    let reconciled = reconcile(grids, config, &resampler)?;
    let target = reconciled.target;

    let reports = Channel::ALL
        .iter()
        .map(|&channel| {
            let k = channel.index();
            ChannelReport {
                channel,
                source: sources.get(channel).to_string(),
                input_shape: input_shapes[k],
                output_shape: target,
                finite_min: stats[k].lo,
                finite_max: stats[k].hi,
                undefined_cells: stats[k].undefined_cells,
                resampled: reconciled.resampled[k],
            }
        })
        .collect();

    // 4) Stack.
    let [red, green, blue] = reconciled.grids;
    let image = compose(red, green, blue).map_err(|e| PipelineError::new(Stage::Compose, None, e))?;
    let (rows, cols, depth) = image.dims();
    info!("composite ready: {rows}x{cols}x{depth}");

    Ok(CompositeRun { image, target, reports })
}

fn prepare_channel<L>(
    loader: &L,
    sources: &ChannelSources,
    channel: Channel,
    normalizer: &ChannelNormalizer,
) -> Result<Prepared, PipelineError>
where
    L: GridLoader + ?Sized,
{
    let source = sources.get(channel);
    let raw = loader
        .load(source)
        .map_err(|e| PipelineError::for_channel(Stage::Load, channel, e))?;
    debug!("loaded {channel} channel from '{source}' ({})", raw.shape());

    let (grid, stats) = normalizer
        .normalize_with_stats(&raw)
        .map_err(|e| PipelineError::for_channel(Stage::Normalize, channel, e))?;
    if stats.undefined_cells > 0 {
        warn!(
            "{channel} channel: {} undefined cells filled with {}",
            stats.undefined_cells,
            normalizer.fill_value()
        );
    }
    Ok(Prepared { grid, stats })
}
