//! Domain types for the server.
//!
//! These are validated domain objects, separate from the database row types
//! the repositories deserialize into and from the request/response DTOs the
//! routes expose.

pub mod cart;
pub mod category;
pub mod order;
pub mod product;
pub mod session;
pub mod user;

pub use cart::{Cart, CartLine};
pub use category::Category;
pub use order::{Address, NewOrder, NewOrderItem, Order, OrderItem};
pub use product::{Product, ProductVariant};
pub use session::{CurrentAdmin, CurrentUser, session_keys};
pub use user::{AdminUser, User};
