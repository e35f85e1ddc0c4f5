//! Setting handlers for different configuration patterns.

pub mod boolean;
pub mod number;
pub mod recorder;
pub mod simple;
pub mod url;

pub use boolean::*;
pub use number::*;
pub use recorder::*;
pub use simple::*;
pub use url::*;
