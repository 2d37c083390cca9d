//! Domain types and rules: cards, stock, carts, orders, roles.

pub mod card;
pub mod cart;
pub mod inventory;
pub mod order;
pub mod user;

pub use card::{Card, CardFace, CardFaces, FinishPrices};
pub use cart::{Cart, CartLine, LineKey, LineSnapshot};
pub use inventory::{Finish, StockLevels, StockView};
pub use order::{Buyer, Order, OrderStatus, GUEST_UID};
pub use user::{Profile, Role};
