pub mod oracle;
pub mod session;
pub mod speech;
