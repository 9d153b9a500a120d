//! Aggregates module
pub mod user;
pub mod product;
pub mod order;
pub mod cart;
pub mod review;

pub use user::{normalize_email, Credentials, NewUser, Role, User};
pub use product::{Category, NewCategory, NewProduct, Product, ProductPatch, StockCheck};
pub use order::{LineRequest, MAX_LINE_QUANTITY, NewOrder, Order, OrderError, OrderItem, OrderStatus, PricedLine, ShippingDetails, Shortfall, StockLevel, TransitionPlan};
pub use cart::{CartItem, CartLine, CartView, WishlistItem};
pub use review::{NewReview, Review};
