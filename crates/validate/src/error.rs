use std::fmt;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ValidationError>;

/// Where a variable sits in a method signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarRole {
    Argument,
    Result,
}

impl fmt::Display for VarRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Argument => "argument",
            Self::Result => "result",
        })
    }
}

/// Why a type cannot cross a transport boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    GenericInstance,
    Channel,
    Function,
    UnsafePointer,
    Interface,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::GenericInstance => "generic instantiations are not supported",
            Self::Channel => "channels are not supported",
            Self::Function => "function values are not supported",
            Self::UnsafePointer => "unsafe pointers are not supported",
            Self::Interface => "only context, io and empty interfaces are supported",
        })
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Project module path is empty")]
    EmptyModulePath,

    #[error("Duplicate contract id {0}")]
    DuplicateContract(String),

    #[error("Contract {contract}: method {method}: {role} #{position} must be named")]
    UnnamedVariable {
        contract: String,
        method: String,
        role: VarRole,
        position: usize,
    },

    #[error("Contract {contract}: method {method}: {role} {name}: type {type_id}: {reason}")]
    UnsupportedType {
        contract: String,
        method: String,
        role: VarRole,
        name: String,
        /// The offending type, possibly reached through fields or aliases
        type_id: String,
        reason: Rejection,
    },

    #[error("Contract {contract}: method {method}: {type_id} is only supported with the http-server annotation")]
    StreamRequiresHttpServer {
        contract: String,
        method: String,
        type_id: String,
    },
}
