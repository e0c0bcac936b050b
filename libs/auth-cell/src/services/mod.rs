pub mod account;
pub mod login;
pub mod otp;
pub mod password;
pub mod recovery;
pub mod registration;
pub mod token;
pub mod verification;

pub use account::AccountService;
pub use login::LoginService;
pub use otp::OtpService;
pub use password::PasswordService;
pub use recovery::PasswordResetService;
pub use registration::RegistrationService;
pub use token::TokenService;
pub use verification::VerificationService;
