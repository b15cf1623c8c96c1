pub mod claims;
pub mod inbound;
pub mod jwt;
pub mod subject;
