pub mod directory;
pub mod dn;
pub mod source;
