use super::types::Orientation;

#[derive(Debug, thiserror::Error)]
pub enum LayoutError {
    #[error("cycle detected in box tree at node `{node}`")]
    Cycle { node: String },

    #[error("unknown compass direction: {value}")]
    UnknownDirection { value: String },

    #[error("unknown layout direction: {value} (expected horizontal or vertical)")]
    UnknownOrientation { value: String },

    #[error("alignment `{align}` is not valid for {orientation} layout")]
    UnknownAlignment { align: String, orientation: Orientation },

    #[error("`auto` compass position must be resolved before anchor lookup")]
    UnresolvedAuto,

    #[error("unknown arrowhead width: {value}")]
    UnknownArrowWidth { value: String },
}

pub type Result<T> = std::result::Result<T, LayoutError>;
