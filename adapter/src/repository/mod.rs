pub mod facility;
pub mod health;
pub mod memory;
pub mod reservation;
pub mod schedule;
pub mod venue;
