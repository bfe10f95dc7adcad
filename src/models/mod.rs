pub mod conversion;
pub mod password_reset_token;
pub mod user;

pub use conversion::{Conversion, ConversionStatus};
pub use password_reset_token::PasswordResetToken;
pub use user::{User, UserProfile};
