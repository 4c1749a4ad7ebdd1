//! Resource identity shared by the wire codec and the draw context.

use crate::DecodeError;

/// The kind of a browser-resident resource. Paired with a [`ResourceId`] this forms
/// the only handle the browser needs to look an object up in its own side tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Image = 0,
    ImageData = 1,
    Gradient = 2,
    Pattern = 3,
}

impl ResourceKind {
    pub const fn as_u8(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for ResourceKind {
    type Error = DecodeError;
    fn try_from(value: u8) -> Result<Self, DecodeError> {
        match value {
            0 => Ok(Self::Image),
            1 => Ok(Self::ImageData),
            2 => Ok(Self::Gradient),
            3 => Ok(Self::Pattern),
            other => Err(DecodeError::BadEnum {
                field: "ResourceKind",
                value: other,
            }),
        }
    }
}

/// A server-allocated, never-reused integer identifying one browser-resident object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId(pub u32);

impl ResourceId {
    pub const fn get(self) -> u32 {
        self.0
    }
}
