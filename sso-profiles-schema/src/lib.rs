pub mod grant;
pub mod token;
