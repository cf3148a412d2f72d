pub mod reservation;
pub mod trip;
pub mod user;
pub mod vehicle;
