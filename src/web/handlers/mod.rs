pub mod courier_handlers;
pub mod delivery_handlers;
pub mod order_handlers;
pub mod payment_handlers;
pub mod variant_handlers;
