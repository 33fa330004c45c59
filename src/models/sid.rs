// src/models/sid.rs

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Максимум sub-authority в SID (SID_MAX_SUB_AUTHORITIES)
pub const MAX_SUB_AUTHORITIES: usize = 15;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SidError {
    #[error("SID is too short: {0} bytes")]
    TooShort(usize),
    #[error("SID declares {declared} sub-authorities but carries {actual} bytes")]
    LengthMismatch { declared: usize, actual: usize },
    #[error("SID has too many sub-authorities: {0}")]
    TooManySubAuthorities(usize),
    #[error("Invalid SID string: {0}")]
    InvalidString(String),
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
pub struct SecurityIdentifier {
    pub revision: u8,
    pub authority: [u8; 6],
    pub sub_authorities: Vec<u32>,
}

impl SecurityIdentifier {
    pub fn new_nt_authority(id: u32) -> Self {
        Self {
            revision: 1,
            authority: [0, 0, 0, 0, 0, 5], // SECURITY_NT_AUTHORITY
            sub_authorities: vec![id],
        }
    }

    pub fn new_from_parts(authority: [u8; 6], subs: Vec<u32>) -> Self {
        Self {
            revision: 1,
            authority,
            sub_authorities: subs,
        }
    }

    /// Разобрать бинарное представление (objectSid, tokenGroups)
    ///
    /// Формат: revision (1), число sub-authority (1), authority (6, big-endian),
    /// затем sub-authority по 4 байта little-endian.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SidError> {
        if bytes.len() < 8 {
            return Err(SidError::TooShort(bytes.len()));
        }
        let count = bytes[1] as usize;
        if count > MAX_SUB_AUTHORITIES {
            return Err(SidError::TooManySubAuthorities(count));
        }
        if bytes.len() != 8 + count * 4 {
            return Err(SidError::LengthMismatch {
                declared: count,
                actual: bytes.len(),
            });
        }

        let mut authority = [0u8; 6];
        authority.copy_from_slice(&bytes[2..8]);

        let sub_authorities = bytes[8..]
            .chunks_exact(4)
            .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();

        Ok(Self {
            revision: bytes[0],
            authority,
            sub_authorities,
        })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(8 + self.sub_authorities.len() * 4);
        out.push(self.revision);
        out.push(self.sub_authorities.len() as u8);
        out.extend_from_slice(&self.authority);
        for sub in &self.sub_authorities {
            out.extend_from_slice(&sub.to_le_bytes());
        }
        out
    }

    /// 48-битный identifier authority как число
    pub fn authority_value(&self) -> u64 {
        self.authority
            .iter()
            .fold(0u64, |acc, b| (acc << 8) | u64::from(*b))
    }

    /// Последний sub-authority (RID), например 512 = Domain Admins
    pub fn rid(&self) -> Option<u32> {
        self.sub_authorities.last().copied()
    }

    /// SID домена — всё, кроме RID
    pub fn domain(&self) -> Option<SecurityIdentifier> {
        if self.sub_authorities.len() < 2 {
            return None;
        }
        let mut sid = self.clone();
        sid.sub_authorities.pop();
        Some(sid)
    }
}

impl fmt::Display for SecurityIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let auth = self.authority_value();
        // Большие authority по MS-DTYP печатаются в hex
        if auth >= 1 << 32 {
            write!(f, "S-{}-0x{:012X}", self.revision, auth)?;
        } else {
            write!(f, "S-{}-{}", self.revision, auth)?;
        }
        for sub in &self.sub_authorities {
            write!(f, "-{}", sub)?;
        }
        Ok(())
    }
}

impl FromStr for SecurityIdentifier {
    type Err = SidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || SidError::InvalidString(s.to_string());

        let mut parts = s.split('-');
        match parts.next() {
            Some(p) if p.eq_ignore_ascii_case("S") => {}
            _ => return Err(invalid()),
        }
        let revision: u8 = parts.next().ok_or_else(invalid)?.parse().map_err(|_| invalid())?;

        let auth_str = parts.next().ok_or_else(invalid)?;
        let auth = match auth_str.strip_prefix("0x").or_else(|| auth_str.strip_prefix("0X")) {
            Some(hex) => u64::from_str_radix(hex, 16).map_err(|_| invalid())?,
            None => auth_str.parse::<u64>().map_err(|_| invalid())?,
        };
        if auth >= 1 << 48 {
            return Err(invalid());
        }
        let auth_bytes = auth.to_be_bytes();
        let mut authority = [0u8; 6];
        authority.copy_from_slice(&auth_bytes[2..]);

        let sub_authorities = parts
            .map(|p| p.parse::<u32>().map_err(|_| invalid()))
            .collect::<Result<Vec<_>, _>>()?;
        if sub_authorities.len() > MAX_SUB_AUTHORITIES {
            return Err(SidError::TooManySubAuthorities(sub_authorities.len()));
        }

        Ok(Self {
            revision,
            authority,
            sub_authorities,
        })
    }
}
