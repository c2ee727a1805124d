pub mod availability;
pub mod facility;
pub mod reservation;
pub mod schedule;
