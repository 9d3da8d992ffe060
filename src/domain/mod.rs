//! Domain entities: networks, transactions, oracle nodes

pub mod network;
pub mod oracle;
pub mod transaction;
