pub mod facility;
pub mod reservation;
pub mod schedule;
pub mod venue;
