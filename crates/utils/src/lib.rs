pub mod generate;

pub use generate::{generate_password, generate_passwords};
