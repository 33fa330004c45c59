// src/models/mod.rs

pub mod flags;
pub mod guid;
pub mod sid;
pub mod well_known;

// Re-exports

pub use flags::{
    AuthenticationFlags, EnumTable, FlagTable, GroupScope, GroupType, PropertyOperation,
    SamAccountType, SystemFlags, UserAccountControl,
};
pub use guid::ObjectGuid;
pub use sid::{SecurityIdentifier, SidError};
pub use well_known::WellKnownObject;
