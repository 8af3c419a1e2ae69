// SPDX-License-Identifier: Apache-2.0

use crate::status::VERR_INVALID_PARAMETER;
use crate::Error;

use core::convert::TryFrom;

/// Shared folder service function code.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u32)]
pub enum Function {
    Create = 3,
    Close = 4,
    Read = 5,
    Write = 6,
    List = 8,
    Information = 9,
    Remove = 11,
    UnmapFolder = 13,
    Rename = 14,
    Flush = 15,
    MapFolder = 17,
    SetFileSize = 24,
}

impl Function {
    /// Number of parameters every request of this function carries.
    pub const fn parm_count(self) -> usize {
        match self {
            Self::UnmapFolder => 1,
            Self::Close | Self::Flush => 2,
            Self::Create | Self::Remove | Self::SetFileSize => 3,
            Self::Rename | Self::MapFolder => 4,
            Self::Read | Self::Write | Self::Information => 5,
            Self::List => 8,
        }
    }
}

impl TryFrom<u32> for Function {
    type Error = Error;

    #[inline]
    fn try_from(function: u32) -> Result<Self, Self::Error> {
        match function {
            function if function == Self::Create as _ => Ok(Self::Create),
            function if function == Self::Close as _ => Ok(Self::Close),
            function if function == Self::Read as _ => Ok(Self::Read),
            function if function == Self::Write as _ => Ok(Self::Write),
            function if function == Self::List as _ => Ok(Self::List),
            function if function == Self::Information as _ => Ok(Self::Information),
            function if function == Self::Remove as _ => Ok(Self::Remove),
            function if function == Self::UnmapFolder as _ => Ok(Self::UnmapFolder),
            function if function == Self::Rename as _ => Ok(Self::Rename),
            function if function == Self::Flush as _ => Ok(Self::Flush),
            function if function == Self::MapFolder as _ => Ok(Self::MapFolder),
            function if function == Self::SetFileSize as _ => Ok(Self::SetFileSize),
            _ => Err(VERR_INVALID_PARAMETER),
        }
    }
}
