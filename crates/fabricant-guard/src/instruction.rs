//! Token-program instruction decoding
//!
//! Only the discriminators the detector cares about are decoded. Payload
//! layout for `SetAuthority`:
//!
//! ```text
//! [0]      discriminator (6)
//! [1]      authority type
//! [2]      COption tag: 0 = None, 1 = Some
//! [3..35]  new authority (raw, only when tag = 1)
//! ```

use fabricant_core::{AccountMeta, Instruction};
use std::fmt;
use thiserror::Error;

/// Legacy SPL Token program
pub const TOKEN_PROGRAM_ID: &str = "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA";

/// SPL Token-2022 (extensions) program
pub const TOKEN_2022_PROGRAM_ID: &str = "TokenzQdBNbLqP5VEhdkAS6EPFLC1PHnBqCXEpPxuEb";

pub const SET_AUTHORITY_DISCRIMINATOR: u8 = 6;
pub const CLOSE_ACCOUNT_DISCRIMINATOR: u8 = 9;

/// Account index of the account an instruction acts on
pub const PRIMARY_ACCOUNT_INDEX: usize = 0;

/// Account index carrying the incoming authority of a `SetAuthority`
pub const NEW_AUTHORITY_INDEX: usize = 1;

const SET_AUTHORITY_HEADER_LEN: usize = 3;
const AUTHORITY_KEY_LEN: usize = 32;

/// Whether `program_id` is one of the recognised token programs
pub fn is_token_program(program_id: &str) -> bool {
    program_id == TOKEN_PROGRAM_ID || program_id == TOKEN_2022_PROGRAM_ID
}

/// Malformed instruction payloads
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Empty instruction payload")]
    Empty,

    #[error("Truncated payload: need {needed} bytes, got {actual}")]
    Truncated { needed: usize, actual: usize },

    #[error("Invalid COption tag: {0}")]
    InvalidOptionTag(u8),
}

/// Authority selector of a `SetAuthority` instruction
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AuthorityType {
    MintTokens,
    FreezeAccount,
    AccountOwner,
    CloseAccount,
    Unknown(u8),
}

impl From<u8> for AuthorityType {
    fn from(value: u8) -> Self {
        match value {
            0 => AuthorityType::MintTokens,
            1 => AuthorityType::FreezeAccount,
            2 => AuthorityType::AccountOwner,
            3 => AuthorityType::CloseAccount,
            other => AuthorityType::Unknown(other),
        }
    }
}

impl fmt::Display for AuthorityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthorityType::MintTokens => write!(f, "mint"),
            AuthorityType::FreezeAccount => write!(f, "freeze"),
            AuthorityType::AccountOwner => write!(f, "owner"),
            AuthorityType::CloseAccount => write!(f, "close"),
            AuthorityType::Unknown(v) => write!(f, "unknown({})", v),
        }
    }
}

/// Target of a `SetAuthority`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NewAuthority {
    /// Authority removed for good
    Cleared,
    /// Authority handed over. The raw key is present only when the payload
    /// carries it; the account list is authoritative either way.
    Replaced(Option<[u8; 32]>),
}

/// Decoded token-program instruction
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenInstruction {
    SetAuthority {
        authority_type: AuthorityType,
        new_authority: NewAuthority,
    },
    CloseAccount,
    /// Any discriminator the guard does not inspect
    Other(u8),
}

impl TokenInstruction {
    pub fn decode(data: &[u8]) -> Result<Self, DecodeError> {
        let (&discriminator, rest) = data.split_first().ok_or(DecodeError::Empty)?;

        match discriminator {
            SET_AUTHORITY_DISCRIMINATOR => Self::decode_set_authority(data, rest),
            CLOSE_ACCOUNT_DISCRIMINATOR => Ok(TokenInstruction::CloseAccount),
            other => Ok(TokenInstruction::Other(other)),
        }
    }

    fn decode_set_authority(data: &[u8], rest: &[u8]) -> Result<Self, DecodeError> {
        if data.len() < SET_AUTHORITY_HEADER_LEN {
            return Err(DecodeError::Truncated {
                needed: SET_AUTHORITY_HEADER_LEN,
                actual: data.len(),
            });
        }

        let authority_type = AuthorityType::from(rest[0]);
        let new_authority = match rest[1] {
            0 => NewAuthority::Cleared,
            1 => {
                let key = rest[2..]
                    .get(..AUTHORITY_KEY_LEN)
                    .and_then(|bytes| <[u8; 32]>::try_from(bytes).ok());
                NewAuthority::Replaced(key)
            }
            tag => return Err(DecodeError::InvalidOptionTag(tag)),
        };

        Ok(TokenInstruction::SetAuthority {
            authority_type,
            new_authority,
        })
    }
}

impl fmt::Display for TokenInstruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenInstruction::SetAuthority {
                authority_type,
                new_authority: NewAuthority::Cleared,
            } => write!(f, "SetAuthority({} -> None)", authority_type),
            TokenInstruction::SetAuthority {
                authority_type,
                new_authority: NewAuthority::Replaced(key),
            } => match key {
                Some(key) => write!(f, "SetAuthority({} -> 0x{})", authority_type, hex::encode(key)),
                None => write!(f, "SetAuthority({} -> Some)", authority_type),
            },
            TokenInstruction::CloseAccount => write!(f, "CloseAccount"),
            TokenInstruction::Other(d) => write!(f, "Other({})", d),
        }
    }
}

/// Named view over an instruction's positional accounts
pub trait AccountRoles {
    /// Account the instruction acts on (mint or token account)
    fn primary_account(&self) -> Option<&AccountMeta>;

    /// Incoming authority of a `SetAuthority`
    fn new_authority_candidate(&self) -> Option<&AccountMeta>;
}

impl AccountRoles for Instruction {
    fn primary_account(&self) -> Option<&AccountMeta> {
        self.account(PRIMARY_ACCOUNT_INDEX)
    }

    fn new_authority_candidate(&self) -> Option<&AccountMeta> {
        self.account(NEW_AUTHORITY_INDEX)
    }
}
