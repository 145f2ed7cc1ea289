use std::fmt;
use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserType {
    Recruiter,
    Applicant,
}

impl fmt::Display for UserType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserType::Recruiter => write!(f, "recruiter"),
            UserType::Applicant => write!(f, "applicant"),
        }
    }
}

impl FromStr for UserType {
    type Err = AccessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "recruiter" => Ok(UserType::Recruiter),
            "applicant" => Ok(UserType::Applicant),
            other => Err(AccessError::UnknownUserType(other.to_string())),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AccessError {
    #[error("This dashboard is only available for recruiters.")]
    Denied(UserType),
    #[error("unknown user type: {0}")]
    UnknownUserType(String),
}

/// Must pass before any snapshot is loaded or aggregated.
pub fn ensure_recruiter(user_type: UserType) -> Result<(), AccessError> {
    match user_type {
        UserType::Recruiter => Ok(()),
        other => Err(AccessError::Denied(other)),
    }
}
