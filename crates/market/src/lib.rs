//! Marketplace gateway: listing search and trade history over the
//! Portal and MRKT REST APIs, merged behind one capability trait.

pub mod error;
pub mod gateway;
pub mod mrkt;
pub mod portal;

pub use error::{GatewayError, PurchaseError};
pub use gateway::{MarketplaceBuyer, MarketplaceGateway, MergedGateway, PurchaseExecutor};
pub use mrkt::MrktClient;
pub use portal::PortalClient;
