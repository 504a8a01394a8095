use crate::surface::ElementId;
use smartstring::alias::String as SmartString;
use thiserror::Error;

/// Failures reported by a live surface implementation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SurfaceError {
    #[error("unknown element {0:?}")]
    UnknownElement(ElementId),

    #[error("invalid tag name {0:?}")]
    InvalidTag(String),

    #[error("invalid attribute name {0:?}")]
    InvalidAttribute(String),

    #[error("element {0:?} has no parent")]
    Detached(ElementId),

    #[error("cannot insert {child:?} into {parent:?}")]
    HierarchyRequest { parent: ElementId, child: ElementId },

    #[error("native surface error: {0}")]
    Native(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PivotError {
    #[error("component {0:?} has already been registered")]
    AlreadyRegistered(SmartString),

    #[error("invalid prop {key:?}: {reason}")]
    InvalidProp { key: SmartString, reason: &'static str },

    #[error("<{0}> has not been rendered")]
    NotMounted(SmartString),

    #[error(transparent)]
    Surface(#[from] SurfaceError),
}

pub type Result<T> = std::result::Result<T, PivotError>;

pub type SurfaceResult<T> = std::result::Result<T, SurfaceError>;
