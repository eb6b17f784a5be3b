//! Shape reconciliation: pick the target shape and bring every channel onto it.
//!
//! The target is the shape of the *normalized* reference channel unless the
//! configuration names an explicit shape. Channels already at the target are
//! passed through untouched.

use log::{debug, info};

use crate::composite::GridResampler;
use crate::domain::{Channel, CompositeConfig, NormalizedGrid, Shape, Stage};
use crate::error::{CompositeError, PipelineError};

/// Three channels sharing one shape, in (red, green, blue) order.
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciled {
    pub grids: [NormalizedGrid; 3],
    pub target: Shape,
    /// Whether each channel went through the resampler.
    pub resampled: [bool; 3],
}

/// Resolve the target shape from the normalized channels.
pub fn target_shape(grids: &[NormalizedGrid; 3], config: &CompositeConfig) -> Result<Shape, PipelineError> {
    match config.target_shape {
        Some(shape) if !shape.is_valid() => Err(PipelineError::new(
            Stage::Resample,
            None,
            CompositeError::InvalidShape {
                rows: shape.rows,
                cols: shape.cols,
            },
        )),
        Some(shape) => Ok(shape),
        None => Ok(grids[config.reference.index()].shape()),
    }
}

/// Resample every channel whose shape differs from the target.
pub fn reconcile(
    grids: [NormalizedGrid; 3],
    config: &CompositeConfig,
    resampler: &GridResampler,
) -> Result<Reconciled, PipelineError> {
    let target = target_shape(&grids, config)?;
    match config.target_shape {
        Some(_) => info!("target shape {target} (explicit override)"),
        None => info!("target shape {target} (from {} channel)", config.reference),
    }

    let mut resampled = [false; 3];
    let mut fit = |channel: Channel, grid: NormalizedGrid| -> Result<NormalizedGrid, PipelineError> {
        if grid.shape() == target {
            return Ok(grid);
        }
        debug!("resampling {channel} channel {} -> {target}", grid.shape());
        let grid = resampler
            .resample(&grid, target)
            .map_err(|e| PipelineError::for_channel(Stage::Resample, channel, e))?;
        resampled[channel.index()] = true;
        Ok(grid)
    };

    let [red, green, blue] = grids;
    let grids = [
        fit(Channel::Red, red)?,
        fit(Channel::Green, green)?,
        fit(Channel::Blue, blue)?,
    ];
    Ok(Reconciled {
        grids,
        target,
        resampled,
    })
}
