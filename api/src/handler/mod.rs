pub mod availability;
pub mod facility;
pub mod health;
pub mod reservation;
pub mod schedule;
