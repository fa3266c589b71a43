use glam::Vec3;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum QuadtreeError {
    #[error("node size must be finite and positive (node_size: {node_size})")]
    InvalidNodeSize { node_size: f32 },
    #[error("node height must be finite and positive (node_height: {node_height})")]
    InvalidNodeHeight { node_height: f32 },
    #[error("origin must be finite (origin: {origin})")]
    NonFiniteOrigin { origin: Vec3 },
    #[error("root cell count must be at least 1")]
    NoRootCells,
    #[error(
        "grid of {root_cells} root cells at max lod {max_lod} exceeds the coordinate range"
    )]
    GridTooLarge { root_cells: u32, max_lod: u32 },
}

pub type QuadtreeResult<T> = Result<T, QuadtreeError>;
