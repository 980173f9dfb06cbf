pub mod tcp;
pub mod traits;
pub mod unix;

pub use tcp::{TcpConnector, TcpTransportStream};
pub use traits::{TransportConnector, TransportStream};
pub use unix::{UnixConnector, UnixTransportStream};
