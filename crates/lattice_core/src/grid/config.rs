//! # Grid Configuration
//!
//! World extent, cell counts and the fixed entity count. Validated once; a
//! different configuration means a new optimizer.

use crate::error::{GridError, GridResult};

/// Shape of a uniform grid over `[0, range)` plus the entity count it serves.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridConfig<const D: usize> {
    /// Number of entities sorted every frame.
    pub entity_count: usize,
    /// World extent along each axis.
    pub range: [f32; D],
    /// Cell count along each axis.
    pub grid_dim: [u32; D],
}

/// 2D grid configuration.
pub type GridConfig2D = GridConfig<2>;
/// 3D grid configuration.
pub type GridConfig3D = GridConfig<3>;

impl<const D: usize> GridConfig<D> {
    /// Creates a configuration. Call [`GridConfig::validate`] before use.
    #[must_use]
    pub const fn new(entity_count: usize, range: [f32; D], grid_dim: [u32; D]) -> Self {
        Self {
            entity_count,
            range,
            grid_dim,
        }
    }

    /// Checks every field and returns the total cell count `G`.
    ///
    /// # Errors
    ///
    /// - [`GridError::InvalidEntityCount`] if `entity_count` is 0 or above `u32::MAX`
    /// - [`GridError::InvalidGridDimension`] if an axis has no cells
    /// - [`GridError::InvalidRange`] if an extent is not finite and positive
    /// - [`GridError::CellCountOverflow`] if `G` does not fit in `u32`
    pub fn validate(&self) -> GridResult<u32> {
        if self.entity_count == 0 || u32::try_from(self.entity_count).is_err() {
            return Err(GridError::InvalidEntityCount(self.entity_count));
        }
        validate_shape(&self.range, &self.grid_dim)
    }

    /// Size of one cell along each axis.
    #[must_use]
    pub fn cell_size(&self) -> [f32; D] {
        std::array::from_fn(|axis| self.range[axis] / self.grid_dim[axis] as f32)
    }

    /// Total cell count, or `None` on overflow.
    #[must_use]
    pub fn cell_count(&self) -> Option<u32> {
        self.grid_dim
            .iter()
            .try_fold(1u32, |acc, &dim| acc.checked_mul(dim))
    }
}

/// Validates range and dimensions, returning the cell count.
pub(crate) fn validate_shape<const D: usize>(range: &[f32; D], grid_dim: &[u32; D]) -> GridResult<u32> {
    if D == 0 {
        return Err(GridError::InvalidGridDimension { axis: 0, value: 0 });
    }
    for (axis, &value) in grid_dim.iter().enumerate() {
        if value == 0 {
            return Err(GridError::InvalidGridDimension { axis, value });
        }
    }
    for (axis, &value) in range.iter().enumerate() {
        if !value.is_finite() || value <= 0.0 {
            return Err(GridError::InvalidRange { axis, value });
        }
    }
    grid_dim
        .iter()
        .try_fold(1u32, |acc, &dim| acc.checked_mul(dim))
        .ok_or_else(|| GridError::CellCountOverflow(grid_dim.to_vec()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_config() {
        let config = GridConfig2D::new(8192, [128.0, 128.0], [16, 16]);
        assert_eq!(config.validate(), Ok(256));
        assert_eq!(config.cell_size(), [8.0, 8.0]);
    }

    #[test]
    fn test_zero_entities_rejected() {
        let config = GridConfig2D::new(0, [4.0, 4.0], [2, 2]);
        assert_eq!(config.validate(), Err(GridError::InvalidEntityCount(0)));
    }

    #[test]
    fn test_zero_dimension_rejected() {
        let config = GridConfig3D::new(10, [4.0, 4.0, 4.0], [2, 0, 2]);
        assert_eq!(
            config.validate(),
            Err(GridError::InvalidGridDimension { axis: 1, value: 0 })
        );
    }

    #[test]
    fn test_bad_range_rejected() {
        let config = GridConfig2D::new(10, [4.0, -1.0], [2, 2]);
        assert!(matches!(config.validate(), Err(GridError::InvalidRange { axis: 1, .. })));

        let config = GridConfig2D::new(10, [f32::NAN, 4.0], [2, 2]);
        assert!(matches!(config.validate(), Err(GridError::InvalidRange { axis: 0, .. })));
    }

    #[test]
    fn test_cell_count_overflow() {
        let config = GridConfig3D::new(10, [1.0; 3], [65_536, 65_536, 2]);
        assert!(matches!(config.validate(), Err(GridError::CellCountOverflow(_))));
        assert_eq!(config.cell_count(), None);
    }
}
