//! Domain models for the storefront.
//!
//! Request bodies, domain objects and client-facing views. Database row
//! types live next to their queries in [`crate::db`].

pub mod cart;
pub mod catalog;
pub mod order;
pub mod user;

pub use cart::{AddToCart, CartLine, CartLineDetail, CartLineView, NewCartLine, UpdateCartLine};
pub use catalog::{
    Category, CategoryInput, CategorySummary, NewCategory, NewProduct, Product, ProductInput,
};
pub use order::{
    DeliveryDetails, DeliveryUpdate, DeliveryUpdateOutcome, NewOrder, Order, OrderItem,
    OrderItemRequest, OrderItemView, OrderStats, OrderView, PlaceOrderRequest, PlacedOrder,
    StatusTotals, StatusUpdate,
};
pub use user::{NewUser, ProfileUpdate, User};
