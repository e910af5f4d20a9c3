pub mod bus;
pub mod route;
pub mod layout;
pub mod pricing;
pub mod inventory;
pub mod repository;

pub use bus::{Amenity, Bus, BusInput, BusType};
pub use route::{Route, RouteInput, StopPoint};
pub use layout::{Deck, LayoutKind, SeatLayout, SeatPosition, SeatSpec, SeatType};
pub use pricing::fare_total;
pub use inventory::SeatInventory;
pub use repository::{BusCatalog, RouteCatalog, SeatLayoutStore};
