pub mod facility;
pub mod id;
pub mod payment;
pub mod reservation;
pub mod role;
pub mod schedule;
pub mod slot;
pub mod venue;
