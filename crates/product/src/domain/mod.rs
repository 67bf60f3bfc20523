pub mod adjustment;
pub mod response;
