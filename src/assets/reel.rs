use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use anyhow::Context;

use crate::{
    assets::decode::decode_image,
    foundation::error::{PixreelError, PixreelResult},
    render::surface::Surface,
    timeline::subroutine::{Reel, ReelSource, TileCoord},
};

/// Turns a [`ReelSource`] into pixels.
///
/// Implementations must not panic on missing data; every failure is an error
/// so the caller can keep the sub-routine unloaded.
pub trait ReelResolver {
    /// Resolve `source` into a reel.
    fn resolve(&self, source: &ReelSource) -> PixreelResult<Reel>;
}

/// Resolves only reels whose pixels travel with the animation.
#[derive(Clone, Copy, Debug, Default)]
pub struct EmbeddedReelResolver;

impl ReelResolver for EmbeddedReelResolver {
    fn resolve(&self, source: &ReelSource) -> PixreelResult<Reel> {
        match source {
            ReelSource::Embedded { frames } => Reel::new(frames.clone()),
            _ => Err(PixreelError::resource(
                "external reel needs a filesystem resolver",
            )),
        }
    }
}

/// Tile grid used by legacy tile reels.
#[derive(Clone, Debug, PartialEq)]
pub struct Tileset {
    /// Full tileset image.
    pub surface: Surface,
    /// Width of one tile.
    pub tile_width: u32,
    /// Height of one tile.
    pub tile_height: u32,
}

impl Tileset {
    /// Wrap a tileset image; tile size must be non-zero.
    pub fn new(surface: Surface, tile_width: u32, tile_height: u32) -> PixreelResult<Self> {
        if tile_width == 0 || tile_height == 0 {
            return Err(PixreelError::validation("tile size must be non-zero"));
        }
        Ok(Self {
            surface,
            tile_width,
            tile_height,
        })
    }

    /// Pixels of one tile.
    pub fn tile(&self, at: TileCoord) -> PixreelResult<Surface> {
        let x = at.col.checked_mul(self.tile_width);
        let y = at.row.checked_mul(self.tile_height);
        let (Some(x), Some(y)) = (x, y) else {
            return Err(PixreelError::resource(format!(
                "tile ({}, {}) is out of range",
                at.col, at.row
            )));
        };
        self.surface
            .crop(x, y, self.tile_width, self.tile_height)
            .map_err(|_| {
                PixreelError::resource(format!("tile ({}, {}) is outside the tileset", at.col, at.row))
            })
    }
}

/// Filesystem-backed resolver: sprite sheets relative to `root`, legacy
/// tiles from registered tilesets.
#[derive(Clone, Debug, Default)]
pub struct FsReelResolver {
    root: PathBuf,
    tilesets: HashMap<String, Tileset>,
}

impl FsReelResolver {
    /// Resolver reading sprite sheets below `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            tilesets: HashMap::new(),
        }
    }

    /// Root directory used for relative sprite sheet paths.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Make a tileset available to legacy tile reels.
    pub fn register_tileset(&mut self, name: impl Into<String>, tileset: Tileset) {
        self.tilesets.insert(name.into(), tileset);
    }

    fn read_sprite_sheet(&self, path: &Path, frame_count: u32) -> PixreelResult<Reel> {
        if frame_count == 0 {
            return Err(PixreelError::resource("sprite sheet declares zero frames"));
        }
        let rel = normalize_rel_path(path)?;
        let abs = self.root.join(rel);
        let bytes = std::fs::read(&abs)
            .with_context(|| format!("read sprite sheet from '{}'", abs.display()))?;
        let sheet = decode_image(&bytes)?;
        if sheet.width() % frame_count != 0 {
            return Err(PixreelError::resource(format!(
                "sprite sheet width {} is not divisible by {frame_count} frames",
                sheet.width()
            )));
        }
        let frame_width = sheet.width() / frame_count;
        let frames = (0..frame_count)
            .map(|i| sheet.crop(i * frame_width, 0, frame_width, sheet.height()))
            .collect::<PixreelResult<Vec<_>>>()?;
        Reel::new(frames)
    }
}

impl ReelResolver for FsReelResolver {
    #[tracing::instrument(skip(self, source), fields(kind = source_kind(source)))]
    fn resolve(&self, source: &ReelSource) -> PixreelResult<Reel> {
        match source {
            ReelSource::Embedded { frames } => Reel::new(frames.clone()),
            ReelSource::SpriteSheet { path, frame_count } => {
                self.read_sprite_sheet(path, *frame_count)
            }
            ReelSource::LegacyTiles { tileset, tiles, .. } => {
                let set = self.tilesets.get(tileset).ok_or_else(|| {
                    PixreelError::resource(format!("tileset '{tileset}' is not available"))
                })?;
                let frames = tiles
                    .iter()
                    .map(|t| set.tile(*t))
                    .collect::<PixreelResult<Vec<_>>>()?;
                Reel::new(frames)
            }
        }
    }
}

fn source_kind(source: &ReelSource) -> &'static str {
    match source {
        ReelSource::Embedded { .. } => "embedded",
        ReelSource::SpriteSheet { .. } => "sprite_sheet",
        ReelSource::LegacyTiles { .. } => "legacy_tiles",
    }
}

/// Normalize a reel path relative to the resolver root.
///
/// Absolute paths and parent traversals (`..`) are rejected.
pub fn normalize_rel_path(path: &Path) -> PixreelResult<String> {
    let s = path.to_string_lossy().replace('\\', "/");
    if s.starts_with('/') {
        return Err(PixreelError::validation("reel paths must be relative"));
    }
    let mut out = Vec::<&str>::new();
    for part in s.split('/') {
        if part.is_empty() || part == "." {
            continue;
        }
        if part == ".." {
            return Err(PixreelError::validation("reel paths must not contain '..'"));
        }
        out.push(part);
    }
    if out.is_empty() {
        return Err(PixreelError::validation("reel path must contain a file name"));
    }
    Ok(out.join("/"))
}

#[cfg(test)]
#[path = "../../tests/unit/assets/reel.rs"]
mod tests;
