pub mod facility;
pub mod health;
pub mod reservation;
pub mod schedule;
pub mod v1;
