pub mod claude;
pub mod error;
pub mod mistral;
pub mod schema;
pub mod traits;
pub mod util;

pub use claude::Claude;
pub use error::{AiError, Result};
pub use mistral::Mistral;
pub use schema::StructuredOutput;
pub use traits::{generate_typed, StructuredGenerator, StructuredRequest};
pub use util::strip_code_blocks;
