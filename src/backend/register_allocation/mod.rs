pub mod allocation;
pub mod description;
pub mod register_allocators;
pub mod register_location;
pub mod register_use;
pub mod verify;
pub use self::allocation::*;
pub use self::description::*;
pub use self::register_location::*;
pub use self::register_use::*;
pub use self::verify::*;

pub use register_allocators::*;
