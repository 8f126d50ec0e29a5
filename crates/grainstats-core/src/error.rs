/// Errors produced by the geometry routines.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum GeometryError {
    #[error("not enough points for a convex hull (got {got}, need {required})")]
    InsufficientPoints { got: usize, required: usize },
    #[error("hull has no edges")]
    NoHullEdges,
}
