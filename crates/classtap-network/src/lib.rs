//! Network layer for classtap
//!
//! This crate delivers accepted scans to the attendance backend. The scanner
//! only sees the [`SubmissionGateway`] trait; [`HttpGateway`] is the
//! production implementation.
//!
//! # Example
//!
//! ```no_run
//! use classtap_core::RoomId;
//! use classtap_network::{HttpGateway, HttpGatewayConfig, SubmissionGateway};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let gateway = HttpGateway::new(HttpGatewayConfig::default())?;
//! let receipt = gateway.submit("04A1B2C3D4E5F6", RoomId::new(12)?).await?;
//! println!("Backend answered {}", receipt.status_code);
//! # Ok(())
//! # }
//! ```

mod gateway;

pub use gateway::{
    GatewayError, HttpGateway, HttpGatewayConfig, SubmissionGateway, SubmissionReceipt,
};
