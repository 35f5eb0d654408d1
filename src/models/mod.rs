pub mod driver;
pub mod request;
pub mod route;
pub mod stop;
