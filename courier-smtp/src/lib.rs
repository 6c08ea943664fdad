pub mod codec;
pub mod command;
pub mod decoder;
pub mod error;
pub mod mime;
pub mod response;
pub mod session;
pub mod transaction;

pub use codec::SmtpCodec;
pub use command::{ClientCommand, CommandEncoder};
pub use decoder::ResponseDecoder;
pub use error::{Result, SmtpError};
pub use mime::{Composer, Segment};
pub use response::ServerResponse;
pub use session::{ClientSession, PendingReply};
pub use transaction::plan;
