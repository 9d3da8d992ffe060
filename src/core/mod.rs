//! Core coordination logic: session, stat sync, transactions, oracle

pub mod oracle;
pub mod session;
pub mod sync;
pub mod transactions;
