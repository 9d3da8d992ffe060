//! External boundaries: wallet provider and chain read clients

pub mod clients;
pub mod provider;
