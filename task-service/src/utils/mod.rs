pub mod api_key;
pub mod password;
pub mod validation;

pub use api_key::{extract_api_key, generate_api_key, API_KEY_SCHEME};
pub use password::{
    hash_password, hash_password_blocking, verify_password, verify_password_blocking, Password,
    PasswordConfig, PasswordHashString,
};
pub use validation::ValidatedJson;
