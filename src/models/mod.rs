pub mod courier;
pub mod delivery;
pub mod order;
pub mod order_item;
pub mod payment;
pub mod promo;
pub mod variant;
