//! Tile layout for a scene.

use std::ops::Range;

use crate::config::Tiling;
use crate::error::{Result, ScmiError};

/// Tile layout of one scene. Created once per product and never modified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileGeometry {
    /// (rows, columns) of the scene
    pub scene_shape: (usize, usize),
    /// (rows, columns) of every tile
    pub tile_shape: (usize, usize),
    /// Number of tiles (rows, columns)
    pub tile_count: (usize, usize),
    /// Tile index of this scene's first tile in a larger mosaic
    pub tile_offset: (usize, usize),
}

impl TileGeometry {
    /// Plan tiles for a scene.
    ///
    /// With [`Tiling::Size`] the tile shape is clipped to the scene and edge
    /// tiles may overhang it. With [`Tiling::Count`] the tile shape is the
    /// floor of scene / count, so an uneven remainder of rows or columns is
    /// not covered by any tile.
    pub fn plan(scene_shape: (usize, usize), tiling: Tiling, tile_offset: (usize, usize)) -> Result<Self> {
        let (rows, cols) = scene_shape;
        if rows == 0 || cols == 0 {
            return Err(ScmiError::invalid_product("scene has no pixels"));
        }

        let (tile_shape, tile_count) = match tiling {
            Tiling::Size { height, width } => {
                if height == 0 || width == 0 {
                    return Err(ScmiError::config("tile size must be positive"));
                }
                let shape = (height.min(rows), width.min(cols));
                let count = (rows.div_ceil(shape.0), cols.div_ceil(shape.1));
                (shape, count)
            }
            Tiling::Count { rows: ny, cols: nx } => {
                if ny == 0 || nx == 0 {
                    return Err(ScmiError::config("tile count must be positive"));
                }
                if ny > rows || nx > cols {
                    return Err(ScmiError::config(format!(
                        "tile count {}x{} exceeds scene shape {}x{}",
                        ny, nx, rows, cols
                    )));
                }
                ((rows / ny, cols / nx), (ny, nx))
            }
        };

        Ok(Self {
            scene_shape,
            tile_shape,
            tile_count,
            tile_offset,
        })
    }

    /// Shape covered by all tiles together, which may exceed the scene.
    pub fn tiled_shape(&self) -> (usize, usize) {
        (
            self.tile_shape.0 * self.tile_count.0,
            self.tile_shape.1 * self.tile_count.1,
        )
    }

    /// Total number of tiles in the layout, skipped or not.
    pub fn number_of_tiles(&self) -> usize {
        self.tile_count.0 * self.tile_count.1
    }

    /// Tiles in row-major order.
    pub fn tiles(&self) -> impl Iterator<Item = Tile> + '_ {
        let (ny, nx) = self.tile_count;
        (0..ny).flat_map(move |ty| (0..nx).map(move |tx| Tile::new(self, ty, tx)))
    }
}

/// One tile of a [`TileGeometry`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tile {
    /// Tile index within this scene (row, column)
    pub index: (usize, usize),
    /// Tile index within the mosaic, including the tile offset
    pub mosaic_index: (usize, usize),
    /// 1-based, row-major tile number within the mosaic
    pub tile_number: usize,
    /// Row range of the tile in scene pixels (may overhang the scene)
    pub rows: Range<usize>,
    /// Column range of the tile in scene pixels (may overhang the scene)
    pub cols: Range<usize>,
}

impl Tile {
    fn new(geometry: &TileGeometry, ty: usize, tx: usize) -> Self {
        let (h, w) = geometry.tile_shape;
        let mosaic_index = (ty + geometry.tile_offset.0, tx + geometry.tile_offset.1);
        Self {
            index: (ty, tx),
            mosaic_index,
            tile_number: mosaic_index.0 * geometry.tile_count.1 + mosaic_index.1 + 1,
            rows: ty * h..(ty + 1) * h,
            cols: tx * w..(tx + 1) * w,
        }
    }

    /// Pixel offset (row, column) of the tile in the mosaic.
    pub fn pixel_offset(&self, geometry: &TileGeometry) -> (usize, usize) {
        (
            self.mosaic_index.0 * geometry.tile_shape.0,
            self.mosaic_index.1 * geometry.tile_shape.1,
        )
    }

    /// Row and column ranges clipped to the scene.
    pub fn scene_window(&self, geometry: &TileGeometry) -> (Range<usize>, Range<usize>) {
        let (rows, cols) = geometry.scene_shape;
        (
            self.rows.start.min(rows)..self.rows.end.min(rows),
            self.cols.start.min(cols)..self.cols.end.min(cols),
        )
    }
}
