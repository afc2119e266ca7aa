//! Tile grid geometry.
//!
//! The grid is fully determined by `(image_width, image_height, tile_size)`:
//! `ceil(W / tile_size)` columns by `ceil(H / tile_size)` rows, with the last
//! column and row possibly narrower than `tile_size`.
//!
//! Visibility is half-open: a viewport `[x, x + width)` touches tile column `tx`
//! when `tx * tile_size < x + width` and `(tx + 1) * tile_size > x`. A viewport
//! ending exactly on a tile boundary therefore does not pull in the next column.

use serde::Serialize;
use tile_common::{PixelRegion, TileCoord, Viewport};

/// One tile of the grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tile {
    coord: TileCoord,
    region: PixelRegion,
    texture_key: String,
    loaded: bool,
    generation: u64,
}

impl Tile {
    fn new(grid_id: u64, coord: TileCoord, region: PixelRegion) -> Self {
        Self {
            texture_key: format!("g{grid_id}:tile_{}_{}", coord.tx, coord.ty),
            coord,
            region,
            loaded: false,
            generation: 0,
        }
    }

    pub fn coord(&self) -> TileCoord {
        self.coord
    }

    /// Pixel rectangle of this tile in the full image.
    pub fn region(&self) -> PixelRegion {
        self.region
    }

    pub fn x0(&self) -> u32 {
        self.region.x
    }

    pub fn y0(&self) -> u32 {
        self.region.y
    }

    pub fn width(&self) -> u32 {
        self.region.width
    }

    pub fn height(&self) -> u32 {
        self.region.height
    }

    /// Texture cache key, unique for the lifetime of the grid.
    pub fn texture_key(&self) -> &str {
        &self.texture_key
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Render generation the loaded texture was built at.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Bytes of the tile's RGBA texture.
    pub fn byte_size(&self) -> usize {
        self.region.len() * 4
    }

    pub(crate) fn mark_loaded(&mut self, generation: u64) {
        self.loaded = true;
        self.generation = generation;
    }

    pub(crate) fn mark_unloaded(&mut self) {
        self.loaded = false;
    }
}

/// Half-open range of tile columns and rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileSpan {
    pub tx_start: u32,
    pub tx_end: u32,
    pub ty_start: u32,
    pub ty_end: u32,
}

impl TileSpan {
    pub fn is_empty(&self) -> bool {
        self.tx_start >= self.tx_end || self.ty_start >= self.ty_end
    }

    pub fn contains(&self, coord: TileCoord) -> bool {
        (self.tx_start..self.tx_end).contains(&coord.tx)
            && (self.ty_start..self.ty_end).contains(&coord.ty)
    }

    /// Grow by `margin` tiles on every side, clamped to a `tiles_x` x `tiles_y` grid.
    pub fn expanded(&self, margin: u32, tiles_x: u32, tiles_y: u32) -> Self {
        Self {
            tx_start: self.tx_start.saturating_sub(margin),
            tx_end: self.tx_end.saturating_add(margin).min(tiles_x),
            ty_start: self.ty_start.saturating_sub(margin),
            ty_end: self.ty_end.saturating_add(margin).min(tiles_y),
        }
    }

    /// Row-major coordinates in the span.
    pub fn coords(self) -> impl Iterator<Item = TileCoord> {
        (self.ty_start..self.ty_end)
            .flat_map(move |ty| (self.tx_start..self.tx_end).map(move |tx| TileCoord::new(tx, ty)))
    }
}

/// The tiles of one attached image.
#[derive(Debug, Clone)]
pub struct TileGrid {
    grid_id: u64,
    image_width: u32,
    image_height: u32,
    tile_size: u32,
    tiles_x: u32,
    tiles_y: u32,
    tiles: Vec<Tile>,
}

impl TileGrid {
    /// Build the grid. `grid_id` namespaces the texture keys so tiles of a
    /// replaced image never alias the new ones.
    pub fn new(grid_id: u64, image_width: u32, image_height: u32, tile_size: u32) -> Self {
        let tile_size = tile_size.max(1);
        let tiles_x = image_width.div_ceil(tile_size);
        let tiles_y = image_height.div_ceil(tile_size);

        let mut tiles = Vec::with_capacity(tiles_x as usize * tiles_y as usize);
        for ty in 0..tiles_y {
            let y0 = ty * tile_size;
            let height = tile_size.min(image_height - y0);
            for tx in 0..tiles_x {
                let x0 = tx * tile_size;
                let width = tile_size.min(image_width - x0);
                tiles.push(Tile::new(
                    grid_id,
                    TileCoord::new(tx, ty),
                    PixelRegion::new(x0, y0, width, height),
                ));
            }
        }

        Self {
            grid_id,
            image_width,
            image_height,
            tile_size,
            tiles_x,
            tiles_y,
            tiles,
        }
    }

    pub fn grid_id(&self) -> u64 {
        self.grid_id
    }

    pub fn image_width(&self) -> u32 {
        self.image_width
    }

    pub fn image_height(&self) -> u32 {
        self.image_height
    }

    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }

    pub fn num_tiles_x(&self) -> u32 {
        self.tiles_x
    }

    pub fn num_tiles_y(&self) -> u32 {
        self.tiles_y
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    fn index(&self, coord: TileCoord) -> Option<usize> {
        (coord.tx < self.tiles_x && coord.ty < self.tiles_y)
            .then(|| coord.ty as usize * self.tiles_x as usize + coord.tx as usize)
    }

    pub fn tile(&self, tx: u32, ty: u32) -> Option<&Tile> {
        self.index(TileCoord::new(tx, ty)).map(|i| &self.tiles[i])
    }

    pub fn get(&self, coord: TileCoord) -> Option<&Tile> {
        self.index(coord).map(|i| &self.tiles[i])
    }

    pub(crate) fn get_mut(&mut self, coord: TileCoord) -> Option<&mut Tile> {
        self.index(coord).map(|i| &mut self.tiles[i])
    }

    /// Every tile in row-major order.
    pub fn iter_tiles(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.iter()
    }

    pub(crate) fn iter_tiles_mut(&mut self) -> impl Iterator<Item = &mut Tile> {
        self.tiles.iter_mut()
    }

    /// Tile columns and rows overlapped by the viewport, clamped to the grid.
    pub fn visible_span(&self, viewport: &Viewport) -> TileSpan {
        let empty = TileSpan {
            tx_start: 0,
            tx_end: 0,
            ty_start: 0,
            ty_end: 0,
        };
        if viewport.is_empty() || self.tiles.is_empty() {
            return empty;
        }

        let ts = self.tile_size as f64;
        let left = viewport.x.max(0.0);
        let top = viewport.y.max(0.0);
        let right = viewport.right().min(self.image_width as f64);
        let bottom = viewport.bottom().min(self.image_height as f64);
        if right <= left || bottom <= top {
            return empty;
        }

        TileSpan {
            tx_start: (left / ts).floor() as u32,
            tx_end: ((right / ts).ceil() as u32).min(self.tiles_x),
            ty_start: (top / ts).floor() as u32,
            ty_end: ((bottom / ts).ceil() as u32).min(self.tiles_y),
        }
    }

    /// Coordinates of the tiles whose pixel rectangle overlaps the viewport.
    pub fn visible_coords(&self, viewport: &Viewport) -> Vec<TileCoord> {
        self.visible_span(viewport).coords().collect()
    }

    /// The visible span grown by `margin`, minus visible and already-loaded tiles.
    pub fn prefetch_coords(&self, viewport: &Viewport, margin: u32) -> Vec<TileCoord> {
        let visible = self.visible_span(viewport);
        if visible.is_empty() {
            return Vec::new();
        }
        visible
            .expanded(margin, self.tiles_x, self.tiles_y)
            .coords()
            .filter(|c| !visible.contains(*c))
            .filter(|c| self.get(*c).is_some_and(|t| !t.loaded))
            .collect()
    }

    /// The tile under the viewport centre, clamped into the grid.
    pub fn center_tile(&self, viewport: &Viewport) -> Option<TileCoord> {
        if self.tiles.is_empty() {
            return None;
        }
        let (cx, cy) = viewport.center();
        if !cx.is_finite() || !cy.is_finite() {
            return None;
        }
        let ts = self.tile_size as f64;
        let tx = (cx / ts).floor().clamp(0.0, (self.tiles_x - 1) as f64) as u32;
        let ty = (cy / ts).floor().clamp(0.0, (self.tiles_y - 1) as f64) as u32;
        Some(TileCoord::new(tx, ty))
    }

    pub fn loaded_count(&self) -> usize {
        self.tiles.iter().filter(|t| t.loaded).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coords(list: &[(u32, u32)]) -> Vec<TileCoord> {
        list.iter().map(|&c| c.into()).collect()
    }

    #[test]
    fn test_grid_dimensions() {
        let grid = TileGrid::new(1, 1000, 600, 256);
        assert_eq!(grid.num_tiles_x(), 4);
        assert_eq!(grid.num_tiles_y(), 3);
        assert_eq!(grid.len(), 12);

        let edge = grid.tile(3, 2).unwrap();
        assert_eq!(edge.region(), PixelRegion::new(768, 512, 232, 88));
        assert_eq!(grid.tile(4, 0), None);
    }

    #[test]
    fn test_texture_keys_unique() {
        let grid = TileGrid::new(7, 300, 300, 100);
        let mut keys: Vec<&str> = grid.iter_tiles().map(|t| t.texture_key()).collect();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), 9);
        assert_eq!(grid.tile(2, 1).unwrap().texture_key(), "g7:tile_2_1");
    }

    #[test]
    fn test_two_by_two_scenario() {
        let grid = TileGrid::new(1, 512, 512, 256);
        let vp = Viewport::new(0.0, 0.0, 300.0, 300.0, 1.0);
        assert_eq!(
            grid.visible_coords(&vp),
            coords(&[(0, 0), (1, 0), (0, 1), (1, 1)])
        );
    }

    #[test]
    fn test_boundary_is_half_open() {
        let grid = TileGrid::new(1, 512, 512, 256);
        let vp = Viewport::new(0.0, 0.0, 256.0, 256.0, 1.0);
        assert_eq!(grid.visible_coords(&vp), coords(&[(0, 0)]));
    }

    #[test]
    fn test_viewport_outside_image() {
        let grid = TileGrid::new(1, 512, 512, 256);
        assert!(grid
            .visible_coords(&Viewport::new(600.0, 0.0, 100.0, 100.0, 1.0))
            .is_empty());
        assert!(grid
            .visible_coords(&Viewport::new(-200.0, -200.0, 100.0, 100.0, 1.0))
            .is_empty());
        assert_eq!(
            grid.visible_coords(&Viewport::new(-50.0, 400.0, 100.0, 500.0, 1.0)),
            coords(&[(0, 1)])
        );
    }

    #[test]
    fn test_prefetch_ring() {
        let mut grid = TileGrid::new(1, 1280, 1280, 256);
        let vp = Viewport::new(512.0, 512.0, 256.0, 256.0, 1.0);
        assert_eq!(grid.visible_coords(&vp), coords(&[(2, 2)]));

        let ring = grid.prefetch_coords(&vp, 1);
        assert_eq!(ring.len(), 8);
        assert!(!ring.contains(&TileCoord::new(2, 2)));

        grid.get_mut(TileCoord::new(1, 1)).unwrap().mark_loaded(0);
        assert_eq!(grid.prefetch_coords(&vp, 1).len(), 7);
        assert!(grid.prefetch_coords(&vp, 0).is_empty());
    }

    #[test]
    fn test_prefetch_clamped_at_edges() {
        let grid = TileGrid::new(1, 512, 512, 256);
        let vp = Viewport::new(0.0, 0.0, 10.0, 10.0, 1.0);
        assert_eq!(
            grid.prefetch_coords(&vp, 5),
            coords(&[(1, 0), (0, 1), (1, 1)])
        );
    }

    #[test]
    fn test_center_tile_clamped() {
        let grid = TileGrid::new(1, 1024, 1024, 256);
        let vp = Viewport::new(300.0, 300.0, 100.0, 100.0, 1.0);
        assert_eq!(grid.center_tile(&vp), Some(TileCoord::new(1, 1)));
        let far = Viewport::new(5000.0, -5000.0, 100.0, 100.0, 1.0);
        assert_eq!(grid.center_tile(&far), Some(TileCoord::new(3, 0)));
    }

    #[test]
    fn test_empty_image() {
        let grid = TileGrid::new(1, 0, 100, 64);
        assert!(grid.is_empty());
        assert!(grid
            .visible_coords(&Viewport::new(0.0, 0.0, 10.0, 10.0, 1.0))
            .is_empty());
        assert_eq!(grid.center_tile(&Viewport::new(0.0, 0.0, 10.0, 10.0, 1.0)), None);
    }
}
