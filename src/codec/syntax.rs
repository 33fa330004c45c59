// src/codec/syntax.rs

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::codec::CodecError;

/// attributeSyntax из схемы AD (2.5.5.x)
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AttributeSyntax {
    DnString,
    ObjectIdentifier,
    CaseExactString,
    CaseIgnoreString,
    PrintableString,
    NumericString,
    DnWithBinary,
    Boolean,
    Integer,
    OctetString,
    Time,
    Unicode,
    PresentationAddress,
    DnWithString,
    SecurityDescriptor,
    LargeInteger,
    Sid,
}

impl AttributeSyntax {
    pub const ALL: [AttributeSyntax; 17] = [
        Self::DnString,
        Self::ObjectIdentifier,
        Self::CaseExactString,
        Self::CaseIgnoreString,
        Self::PrintableString,
        Self::NumericString,
        Self::DnWithBinary,
        Self::Boolean,
        Self::Integer,
        Self::OctetString,
        Self::Time,
        Self::Unicode,
        Self::PresentationAddress,
        Self::DnWithString,
        Self::SecurityDescriptor,
        Self::LargeInteger,
        Self::Sid,
    ];

    pub fn oid(&self) -> &'static str {
        match self {
            Self::DnString => "2.5.5.1",
            Self::ObjectIdentifier => "2.5.5.2",
            Self::CaseExactString => "2.5.5.3",
            Self::CaseIgnoreString => "2.5.5.4",
            Self::PrintableString => "2.5.5.5",
            Self::NumericString => "2.5.5.6",
            Self::DnWithBinary => "2.5.5.7",
            Self::Boolean => "2.5.5.8",
            Self::Integer => "2.5.5.9",
            Self::OctetString => "2.5.5.10",
            Self::Time => "2.5.5.11",
            Self::Unicode => "2.5.5.12",
            Self::PresentationAddress => "2.5.5.13",
            Self::DnWithString => "2.5.5.14",
            Self::SecurityDescriptor => "2.5.5.15",
            Self::LargeInteger => "2.5.5.16",
            Self::Sid => "2.5.5.17",
        }
    }
}

impl fmt::Display for AttributeSyntax {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.oid())
    }
}

impl FromStr for AttributeSyntax {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|syntax| syntax.oid() == s)
            .ok_or_else(|| CodecError::UnknownSyntax(s.to_string()))
    }
}
